//! Grammar for the C subset, wired from combinators
//!
//! | Rule         | Shape                                                        |
//! |--------------|--------------------------------------------------------------|
//! | `factor`     | `IDENT \| FLOATING \| INTEGER \| '(' expression ')' \| ('+'\|'-') factor` |
//! | `term`       | `factor` joined by `*`, `/`, `%`                             |
//! | `expression` | `term` joined by `+`, `-`                                    |
//! | `statement`  | `(definition \| assignment \| return \| expression) ';' \| ';' \| block` |
//! | `block`      | `'{' statement* '}'`                                         |
//! | `function`   | `type IDENT '(' parameters ')' block`                        |
//! | `top`        | `(function \| statement)* END`                               |
//!
//! Every rule that produces an AST node does so in a bind continuation. The
//! continuations are written against the shape the grammar has *after*
//! [`optimize`]: for example `function` sees the braces and statements of its
//! body spliced into its own sequence. [`CGrammar::build`] always optimizes.
//!
//! # Associativity
//!
//! With [`Associativity::Left`] each binary tier is `operand (op operand)*`
//! folded left, so `1 - 2 - 3` is `(1 - 2) - 3`. [`Associativity::Right`]
//! builds the recursive `Or(And(operand, op, self), operand)` form instead,
//! which groups to the right and leans on the memo table when the binary
//! attempt falls back to the bare operand.

use super::ast::{AstNode, BinOp, Literal, Parameter, Program, TypeName, UnOp};
use super::combinator::{Grammar, GrammarBuilder, Node, ParserId, Parsed};
use super::engine::ParseConfig;
use super::errors::{GrammarError, ParseError, ParseFault};
use super::lexer::{Lexeme, TokenKind};
use super::optimize::optimize;

/// Grouping of same-precedence binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Associativity {
    #[default]
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GrammarOptions {
    pub associativity: Associativity,
}

/// The optimized C grammar and its entry points
#[derive(Debug, Clone)]
pub struct CGrammar {
    grammar: Grammar,
    pub expression: ParserId,
    pub statement: ParserId,
    pub block: ParserId,
    pub function: ParserId,
    pub top: ParserId,
}

impl CGrammar {
    pub fn build(options: GrammarOptions) -> Result<Self, GrammarError> {
        let mut g = GrammarBuilder::new();

        let type_identifier = {
            let int = g.token(TokenKind::Int);
            let float = g.token(TokenKind::Float);
            let ty = g.or([int, float]);
            g.label(ty, "TYPE")
        };
        let ident = g.token(TokenKind::Identifier);
        let lparen = g.token(TokenKind::LParen);
        let rparen = g.token(TokenKind::RParen);
        let semicolon = g.token(TokenKind::Semicolon);

        // Expressions
        let expression = g.declare("expression");
        g.label(expression, "EXP");
        let factor = g.declare("factor");
        g.label(factor, "FACT");

        let variable = g.bind(ident, |value| {
            let name = into_lexeme("variable", value)?;
            yield_node(AstNode::Variable(name.text, name.location))
        });
        g.label(variable, "VAR");

        let number = {
            let floating = g.token(TokenKind::Floating);
            let integer = g.token(TokenKind::Integer);
            let literal = g.or([floating, integer]);
            g.bind(literal, |value| {
                let lexeme = into_lexeme("number", value)?;
                match parse_literal(&lexeme) {
                    Some(literal) => yield_node(AstNode::Constant(literal, lexeme.location)),
                    None => Ok(reject()),
                }
            })
        };
        g.label(number, "NUM");

        let parenthesized = {
            let group = g.and([lparen, expression, rparen]);
            g.bind(group, |value| {
                let [_, inner, _] = into_items("parenthesized", value)?;
                Ok(Node::Constant(inner))
            })
        };

        let unary = {
            let plus = g.token(TokenKind::Plus);
            let minus = g.token(TokenKind::Minus);
            let unary_op = g.or([plus, minus]);
            let prefixed = g.and([unary_op, factor]);
            g.bind(prefixed, |value| {
                let [op, operand] = into_items("unary", value)?;
                let op = into_lexeme("unary", op)?;
                let operand = into_node("unary", operand)?;
                let un_op = match op.kind {
                    TokenKind::Minus => UnOp::Neg,
                    _ => UnOp::Plus,
                };
                yield_node(AstNode::UnaryExpr {
                    op: un_op,
                    operand: Box::new(operand),
                    location: op.location,
                })
            })
        };
        g.label(unary, "UNARY");
        g.define(factor, Node::Or(vec![variable, number, parenthesized, unary]))?;

        let mul_op = {
            let star = g.token(TokenKind::Star);
            let slash = g.token(TokenKind::Slash);
            let percent = g.token(TokenKind::Percent);
            g.or([star, slash, percent])
        };
        let add_op = {
            let plus = g.token(TokenKind::Plus);
            let minus = g.token(TokenKind::Minus);
            g.or([plus, minus])
        };

        let term = match options.associativity {
            Associativity::Left => {
                let term = left_fold_tier(&mut g, factor, mul_op, "term");
                let body = left_fold_tier(&mut g, term, add_op, "expression");
                g.define_as(expression, body)?;
                g.name_rule("term", term)
            }
            Associativity::Right => {
                let term = g.declare("term");
                right_recursive_tier(&mut g, term, factor, mul_op, "term")?;
                right_recursive_tier(&mut g, expression, term, add_op, "expression")?;
                term
            }
        };
        g.label(term, "TERM");

        // Statements
        let statement = g.declare("statement");
        g.label(statement, "STMT");

        let assignment = {
            let equals = g.token(TokenKind::Equals);
            let parts = g.and([ident, equals, expression]);
            g.bind(parts, |value| {
                let [name, _, value] = into_items("assignment", value)?;
                let name = into_lexeme("assignment", name)?;
                let value = into_node("assignment", value)?;
                yield_node(AstNode::Assignment {
                    name: name.text,
                    value: Box::new(value),
                    location: name.location,
                })
            })
        };
        g.label(assignment, "ASSIGN");

        let definition = {
            let target = g.or([assignment, ident]);
            let parts = g.and([type_identifier, target]);
            g.bind(parts, |value| {
                let [ty, target] = into_items("definition", value)?;
                let ty = into_lexeme("definition", ty)?;
                let var_type = type_name("definition", &ty)?;
                let definition = match target {
                    Parsed::Node(AstNode::Assignment { name, value, .. }) => AstNode::Definition {
                        name,
                        var_type,
                        init: Some(value),
                        location: ty.location,
                    },
                    Parsed::Token(name) => AstNode::Definition {
                        name: name.text,
                        var_type,
                        init: None,
                        location: ty.location,
                    },
                    other => return Err(shape_error("definition", &other)),
                };
                yield_node(definition)
            })
        };
        g.label(definition, "DEF");

        let return_statement = {
            let keyword = g.token(TokenKind::Return);
            let parts = g.and([keyword, expression]);
            g.bind(parts, |value| {
                let [keyword, expr] = into_items("return", value)?;
                let keyword = into_lexeme("return", keyword)?;
                let expr = into_node("return", expr)?;
                yield_node(AstNode::Return {
                    expr: Box::new(expr),
                    location: keyword.location,
                })
            })
        };
        g.label(return_statement, "RET");

        let statement_body = g.or([definition, assignment, return_statement, expression]);
        g.label(statement_body, "BODY");

        let terminated = {
            let parts = g.and([statement_body, semicolon]);
            g.bind(parts, |value| {
                let [body, _] = into_items("statement", value)?;
                Ok(Node::Constant(body))
            })
        };
        let empty = g.bind(semicolon, |value| {
            let semicolon = into_lexeme("empty statement", value)?;
            yield_node(AstNode::EmptyStatement {
                location: semicolon.location,
            })
        });

        let block_body = {
            let lbrace = g.token(TokenKind::LBrace);
            let rbrace = g.token(TokenKind::RBrace);
            let statements = g.many(statement);
            g.and([lbrace, statements, rbrace])
        };
        let block = g.bind(block_body, |value| {
            let [lbrace, statements, _] = into_items("block", value)?;
            let lbrace = into_lexeme("block", lbrace)?;
            yield_node(AstNode::Block {
                statements: into_nodes("block", statements)?,
                location: lbrace.location,
            })
        });
        g.name_rule("block", block);
        g.label(block, "BLOCK");

        g.define(statement, Node::Or(vec![terminated, empty, block]))?;

        // Functions
        let parameter = {
            let parts = g.and([type_identifier, ident]);
            g.bind(parts, |value| {
                let [ty, name] = into_items("parameter", value)?;
                let ty = into_lexeme("parameter", ty)?;
                let name = into_lexeme("parameter", name)?;
                yield_node(AstNode::Parameter(Parameter {
                    name: name.text,
                    param_type: type_name("parameter", &ty)?,
                    location: ty.location,
                }))
            })
        };
        g.label(parameter, "PARAM");

        let parameter_list = {
            let comma = g.token(TokenKind::Comma);
            let next = g.and([comma, parameter]);
            let rest = g.many(next);
            let list = g.and([parameter, rest]);
            let collected = g.bind(list, |value| {
                let [first, rest] = into_items("parameter list", value)?;
                let mut params = vec![first];
                for pair in into_list("parameter list", rest)? {
                    let [_, param] = into_items("parameter list", pair)?;
                    params.push(param);
                }
                Ok(Node::Constant(Parsed::Seq(params)))
            });
            g.maybe(collected, Parsed::Seq(Vec::new()))
        };
        g.label(parameter_list, "PARAMS");

        // `block_body` is an And, so flattening splices its three parts in here
        let function = {
            let parts = g.and([type_identifier, ident, lparen, parameter_list, rparen, block_body]);
            g.bind(parts, |value| {
                let [ty, name, _, params, _, lbrace, statements, _] = into_items("function", value)?;
                let ty = into_lexeme("function", ty)?;
                let name = into_lexeme("function", name)?;
                let lbrace = into_lexeme("function", lbrace)?;

                let params = into_nodes("function", params)?
                    .into_iter()
                    .map(|node| match node {
                        AstNode::Parameter(param) => Ok(param),
                        other => Err(shape_error("function", &Parsed::Node(other))),
                    })
                    .collect::<Result<Vec<_>, _>>()?;

                yield_node(AstNode::Function {
                    name: name.text,
                    return_type: type_name("function", &ty)?,
                    params,
                    body: Box::new(AstNode::Block {
                        statements: into_nodes("function", statements)?,
                        location: lbrace.location,
                    }),
                    location: ty.location,
                })
            })
        };
        g.name_rule("function", function);
        g.label(function, "FUNC");

        let top = {
            let item = g.or([function, statement]);
            let items = g.many(item);
            let end = g.token(TokenKind::EndOfInput);
            let unit = g.and([items, end]);
            g.bind(unit, |value| {
                let [items, _] = into_items("top", value)?;
                Ok(Node::Constant(items))
            })
        };
        g.name_rule("top", top);
        g.label(top, "TOP");

        let raw = g.finish()?;
        Ok(Self {
            grammar: optimize(&raw),
            expression,
            statement,
            block,
            function,
            top,
        })
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// Parse a whole translation unit
    pub fn parse_program(&self, source: &str, config: ParseConfig) -> Result<Program, ParseError> {
        let value = self.grammar.parse_complete(self.top, source, config)?;
        Ok(Program {
            nodes: into_nodes("top", value)?,
        })
    }

    /// Parse a source text consisting of one expression
    pub fn parse_expression(&self, source: &str, config: ParseConfig) -> Result<AstNode, ParseError> {
        let value = self.grammar.parse_complete(self.expression, source, config)?;
        Ok(into_node("expression", value)?)
    }

    /// Parse a source text consisting of one statement
    pub fn parse_statement(&self, source: &str, config: ParseConfig) -> Result<AstNode, ParseError> {
        let value = self.grammar.parse_complete(self.statement, source, config)?;
        Ok(into_node("statement", value)?)
    }
}

/// `operand (op operand)*`, folded into left-nested binary expressions
fn left_fold_tier(
    g: &mut GrammarBuilder,
    operand: ParserId,
    op: ParserId,
    rule: &'static str,
) -> ParserId {
    let step = g.and([op, operand]);
    let steps = g.many(step);
    let chain = g.and([operand, steps]);
    g.bind(chain, move |value| {
        let [first, rest] = into_items(rule, value)?;
        let mut acc = into_node(rule, first)?;
        for step in into_list(rule, rest)? {
            let [op, operand] = into_items(rule, step)?;
            let right = into_node(rule, operand)?;
            acc = binary(rule, acc, op, right)?;
        }
        yield_node(acc)
    })
}

/// Defines `slot` as `Or(And(operand, op, slot), operand)`
fn right_recursive_tier(
    g: &mut GrammarBuilder,
    slot: ParserId,
    operand: ParserId,
    op: ParserId,
    rule: &'static str,
) -> Result<(), GrammarError> {
    let parts = g.and([operand, op, slot]);
    let binary_form = g.bind(parts, move |value| {
        let [left, op, right] = into_items(rule, value)?;
        let left = into_node(rule, left)?;
        let right = into_node(rule, right)?;
        yield_node(binary(rule, left, op, right)?)
    });
    g.define(slot, Node::Or(vec![binary_form, operand]))
}

fn binary(rule: &'static str, left: AstNode, op: Parsed, right: AstNode) -> Result<AstNode, ParseFault> {
    let op = into_lexeme(rule, op)?;
    let bin_op = match op.kind {
        TokenKind::Plus => BinOp::Add,
        TokenKind::Minus => BinOp::Sub,
        TokenKind::Star => BinOp::Mul,
        TokenKind::Slash => BinOp::Div,
        TokenKind::Percent => BinOp::Mod,
        _ => return Err(shape_error(rule, &Parsed::Token(op))),
    };
    let location = *left.location();
    Ok(AstNode::BinaryExpr {
        op: bin_op,
        left: Box::new(left),
        right: Box::new(right),
        location,
    })
}

fn parse_literal(lexeme: &Lexeme) -> Option<Literal> {
    match lexeme.kind {
        TokenKind::Integer => lexeme.text.parse().ok().map(Literal::Int),
        TokenKind::Floating => lexeme.text.parse().ok().map(Literal::Float),
        _ => None,
    }
}

fn type_name(rule: &'static str, lexeme: &Lexeme) -> Result<TypeName, ParseFault> {
    match lexeme.kind {
        TokenKind::Int => Ok(TypeName::Int),
        TokenKind::Float => Ok(TypeName::Float),
        _ => Err(shape_error(rule, &Parsed::Token(lexeme.clone()))),
    }
}

// ===== Continuation helpers =====

/// A parser that never matches; continuations use it to refuse a value
fn reject() -> Node {
    Node::Or(Vec::new())
}

fn yield_node(node: AstNode) -> Result<Node, ParseFault> {
    Ok(Node::Constant(Parsed::Node(node)))
}

fn shape_error(rule: &'static str, found: &Parsed) -> ParseFault {
    ParseFault::UnexpectedShape {
        rule,
        found: found.shape(),
    }
}

fn into_items<const N: usize>(rule: &'static str, value: Parsed) -> Result<[Parsed; N], ParseFault> {
    match value {
        Parsed::Seq(items) => items
            .try_into()
            .map_err(|items: Vec<Parsed>| shape_error(rule, &Parsed::Seq(items))),
        other => Err(shape_error(rule, &other)),
    }
}

fn into_list(rule: &'static str, value: Parsed) -> Result<Vec<Parsed>, ParseFault> {
    match value {
        Parsed::Seq(items) => Ok(items),
        other => Err(shape_error(rule, &other)),
    }
}

fn into_lexeme(rule: &'static str, value: Parsed) -> Result<Lexeme, ParseFault> {
    match value {
        Parsed::Token(lexeme) => Ok(lexeme),
        other => Err(shape_error(rule, &other)),
    }
}

fn into_node(rule: &'static str, value: Parsed) -> Result<AstNode, ParseFault> {
    match value {
        Parsed::Node(node) => Ok(node),
        other => Err(shape_error(rule, &other)),
    }
}

fn into_nodes(rule: &'static str, value: Parsed) -> Result<Vec<AstNode>, ParseFault> {
    into_list(rule, value)?
        .into_iter()
        .map(|item| into_node(rule, item))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::SourceLocation;

    fn grammar() -> CGrammar {
        CGrammar::build(GrammarOptions::default()).expect("C grammar builds")
    }

    fn int(value: i64) -> Literal {
        Literal::Int(value)
    }

    #[test]
    fn test_entry_points_are_named() {
        let c = grammar();
        for name in ["expression", "term", "factor", "statement", "block", "function", "top"] {
            assert!(c.grammar().rule(name).is_some(), "missing rule {}", name);
        }
        assert_eq!(c.grammar().rule("top"), Some(c.top));
    }

    #[test]
    fn test_definition_with_initializer() {
        let stmt = grammar()
            .parse_statement("int a = 1 + 2;", ParseConfig::new())
            .expect("parses");
        match stmt {
            AstNode::Definition {
                name,
                var_type,
                init: Some(init),
                location,
            } => {
                assert_eq!(name, "a");
                assert_eq!(var_type, TypeName::Int);
                assert_eq!(location, SourceLocation::new(1, 1));
                match *init {
                    AstNode::BinaryExpr { op, left, right, .. } => {
                        assert_eq!(op, BinOp::Add);
                        assert!(matches!(*left, AstNode::Constant(Literal::Int(1), _)));
                        assert!(matches!(*right, AstNode::Constant(Literal::Int(2), _)));
                    }
                    other => panic!("Expected BinaryExpr, got {:?}", other),
                }
            }
            other => panic!("Expected Definition, got {:?}", other),
        }
    }

    #[test]
    fn test_bare_definition() {
        let stmt = grammar()
            .parse_statement("float f;", ParseConfig::new())
            .expect("parses");
        assert!(matches!(
            stmt,
            AstNode::Definition { ref name, var_type: TypeName::Float, init: None, .. } if name == "f"
        ));
    }

    #[test]
    fn test_float_literal() {
        let expr = grammar()
            .parse_expression("2.5", ParseConfig::new())
            .expect("parses");
        assert!(matches!(expr, AstNode::Constant(Literal::Float(f), _) if f == 2.5));
    }

    #[test]
    fn test_integer_overflow_is_rejected() {
        let result = grammar().parse_expression("99999999999999999999", ParseConfig::new());
        assert!(matches!(result, Err(ParseError::NoMatch { .. })));
    }

    #[test]
    fn test_unary_binds_tighter_than_multiplication() {
        let expr = grammar()
            .parse_expression("-5*4", ParseConfig::new())
            .expect("parses");
        match expr {
            AstNode::BinaryExpr { op: BinOp::Mul, left, right, .. } => {
                assert!(matches!(*left, AstNode::UnaryExpr { op: UnOp::Neg, .. }));
                assert!(matches!(*right, AstNode::Constant(Literal::Int(4), _)));
            }
            other => panic!("Expected BinaryExpr, got {:?}", other),
        }
    }

    #[test]
    fn test_function_with_parameters() {
        let program = grammar()
            .parse_program("int add(int a, float b) { return a + b; }", ParseConfig::new())
            .expect("parses");
        assert_eq!(program.nodes.len(), 1);
        match &program.nodes[0] {
            AstNode::Function {
                name,
                return_type,
                params,
                body,
                ..
            } => {
                assert_eq!(name, "add");
                assert_eq!(*return_type, TypeName::Int);
                let names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
                assert_eq!(names, vec!["a", "b"]);
                assert_eq!(params[1].param_type, TypeName::Float);
                match body.as_ref() {
                    AstNode::Block { statements, .. } => {
                        assert!(matches!(statements[0], AstNode::Return { .. }))
                    }
                    other => panic!("Expected Block, got {:?}", other),
                }
            }
            other => panic!("Expected Function, got {:?}", other),
        }
    }

    #[test]
    fn test_parameter_list_trailing_comma_fails() {
        let result = grammar().parse_program("int f(int a,) { }", ParseConfig::new());
        assert!(matches!(result, Err(ParseError::NoMatch { .. })));
    }

    #[test]
    fn test_right_associativity_option() {
        let c = CGrammar::build(GrammarOptions {
            associativity: Associativity::Right,
        })
        .expect("C grammar builds");
        let expr = c.parse_expression("1 - 2 - 3", ParseConfig::new()).expect("parses");
        match expr {
            AstNode::BinaryExpr { left, right, .. } => {
                assert!(matches!(*left, AstNode::Constant(lit, _) if lit == int(1)));
                assert!(matches!(*right, AstNode::BinaryExpr { .. }));
            }
            other => panic!("Expected BinaryExpr, got {:?}", other),
        }
    }
}
