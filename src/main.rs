// pcc: packrat C compiler command line

use clap::{ArgGroup, Parser, ValueEnum};
use log::LevelFilter;
use pcc::parser::{Associativity, CGrammar, GrammarOptions, ParseConfig};
use pcc::{codegen, CompileError, CompileOptions};
use std::fs;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(
    name = "pcc",
    version,
    about = "Compile a small C subset to AArch64-flavoured assembly"
)]
#[command(group(ArgGroup::new("input").required(true).args(["file", "string"])))]
struct Cli {
    /// Source file to compile
    file: Option<PathBuf>,

    /// Compile this source text instead of a file
    #[arg(short, long, value_name = "SOURCE")]
    string: Option<String>,

    /// Write output to this path instead of stdout
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// What to print
    #[arg(long, value_enum, default_value_t = Emit::Asm)]
    emit: Emit,

    /// Grouping of same-precedence operators
    #[arg(long, value_enum, default_value_t = AssocArg::Left)]
    associativity: AssocArg,

    /// Memo table entries per parse (0 disables memoization)
    #[arg(long, value_name = "N")]
    cache_capacity: Option<usize>,

    /// Maximum nesting of rule invocations
    #[arg(long, value_name = "N")]
    max_depth: Option<usize>,

    /// Log more (-v: debug, -vv: trace every rule attempt)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum Emit {
    Asm,
    Ast,
}

#[derive(Clone, Copy, ValueEnum)]
enum AssocArg {
    Left,
    Right,
}

impl Cli {
    fn options(&self) -> CompileOptions {
        let mut parse = ParseConfig::new();
        if let Some(capacity) = self.cache_capacity {
            parse = parse.with_cache_capacity(capacity);
        }
        if let Some(depth) = self.max_depth {
            parse = parse.with_max_depth(depth);
        }
        let associativity = match self.associativity {
            AssocArg::Left => Associativity::Left,
            AssocArg::Right => Associativity::Right,
        };
        CompileOptions {
            grammar: GrammarOptions { associativity },
            parse,
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();
}

fn run(cli: &Cli) -> Result<String, CompileError> {
    let source = match (&cli.string, &cli.file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => fs::read_to_string(path)?,
        (None, None) => String::new(),
    };
    let options = cli.options();

    let grammar = CGrammar::build(options.grammar)?;
    log::debug!("grammar built with {} nodes", grammar.grammar().len());

    let program = grammar.parse_program(&source, options.parse)?;
    log::debug!("parsed {} top-level item(s)", program.nodes.len());

    match cli.emit {
        Emit::Ast => Ok(format!("{:#?}\n", program)),
        Emit::Asm => Ok(codegen::emit_program(&program)?.to_string()),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let output = match run(&cli) {
        Ok(output) => output,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(e.exit_code());
        }
    };

    match &cli.output {
        Some(path) => {
            if let Err(e) = fs::write(path, output) {
                eprintln!("Error: cannot write '{}': {}", path.display(), e);
                process::exit(1);
            }
        }
        None => print!("{}", output),
    }
}
