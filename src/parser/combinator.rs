//! Combinator algebra and the grammar arena
//!
//! A grammar is a flat arena of [`Node`]s; composite nodes refer to their
//! children by [`ParserId`]. Recursive rules are just indices that point back
//! up the graph, so cycles never involve shared mutable objects.
//!
//! # Building a recursive grammar
//!
//! ```
//! use pcc::parser::combinator::{GrammarBuilder, Node};
//! use pcc::parser::lexer::TokenKind;
//!
//! let mut g = GrammarBuilder::new();
//! let list = g.declare("list");
//! let item = g.token(TokenKind::Integer);
//! let comma = g.token(TokenKind::Comma);
//! let tail = g.and([comma, list]);
//! let more = g.and([item, tail]);
//! g.define(list, Node::Or(vec![more, item])).unwrap();
//! let grammar = g.finish().unwrap();
//! assert!(grammar.rule("list").is_some());
//! ```
//!
//! Rules can also be wired with an anonymous [`GrammarBuilder::reflection`]
//! placeholder that is swapped for the finished rule by
//! [`GrammarBuilder::substitute`].

use super::ast::AstNode;
use super::errors::{GrammarError, ParseFault};
use super::lexer::{Lexeme, Lexicon, TokenKind};
use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt;
use std::rc::Rc;

/// Index of a node in a grammar arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParserId(usize);

impl ParserId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ParserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Value produced by a successful match
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed {
    Token(Lexeme),
    Seq(Vec<Parsed>),
    Node(AstNode),
    Empty,
}

impl Parsed {
    /// Short description of the value's shape, for diagnostics
    pub fn shape(&self) -> String {
        match self {
            Parsed::Token(lexeme) => format!("{} '{}'", lexeme.kind, lexeme.text),
            Parsed::Seq(items) => {
                let inner: Vec<String> = items.iter().map(Parsed::shape).collect();
                format!("[{}]", inner.join(", "))
            }
            Parsed::Node(node) => node.kind().to_string(),
            Parsed::Empty => "nothing".to_string(),
        }
    }
}

/// Builds the parser to run after a [`Node::Bind`] child succeeds
pub type Continuation = Rc<dyn Fn(Parsed) -> Result<Node, ParseFault>>;

/// One combinator in the arena
#[derive(Clone)]
pub enum Node {
    /// One lexical unit, after skipping whitespace
    Token(TokenKind),
    /// Succeeds with the value without consuming input
    Constant(Parsed),
    /// Ordered choice: first child to match wins
    Or(Vec<ParserId>),
    /// Sequence; yields a [`Parsed::Seq`] of the children's values
    And(Vec<ParserId>),
    /// Zero or more repetitions; never fails
    Many(ParserId),
    /// Optional; yields the default when the child does not match
    Maybe(ParserId, Parsed),
    Bind(ParserId, Continuation),
    /// Forward reference that has not been filled in
    Placeholder(String),
}

impl Node {
    pub fn children(&self) -> &[ParserId] {
        match self {
            Node::Or(children) | Node::And(children) => children,
            Node::Many(child) | Node::Maybe(child, _) | Node::Bind(child, _) => {
                std::slice::from_ref(child)
            }
            Node::Token(_) | Node::Constant(_) | Node::Placeholder(_) => &[],
        }
    }

    pub fn children_mut(&mut self) -> &mut [ParserId] {
        match self {
            Node::Or(children) | Node::And(children) => children,
            Node::Many(child) | Node::Maybe(child, _) | Node::Bind(child, _) => {
                std::slice::from_mut(child)
            }
            Node::Token(_) | Node::Constant(_) | Node::Placeholder(_) => &mut [],
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Token(_) => "Token",
            Node::Constant(_) => "Constant",
            Node::Or(_) => "Or",
            Node::And(_) => "And",
            Node::Many(_) => "Many",
            Node::Maybe(..) => "Maybe",
            Node::Bind(..) => "Bind",
            Node::Placeholder(_) => "Placeholder",
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Token(kind) => write!(f, "Token({:?})", kind),
            Node::Constant(value) => write!(f, "Constant({})", value.shape()),
            Node::Or(children) => write!(f, "Or({:?})", children),
            Node::And(children) => write!(f, "And({:?})", children),
            Node::Many(child) => write!(f, "Many({:?})", child),
            Node::Maybe(child, default) => write!(f, "Maybe({:?}, {})", child, default.shape()),
            Node::Bind(child, _) => write!(f, "Bind({:?}, <continuation>)", child),
            Node::Placeholder(name) => write!(f, "Placeholder({})", name),
        }
    }
}

/// A finished grammar: the node arena plus its lexical table and named rules
#[derive(Debug, Clone)]
pub struct Grammar {
    pub(crate) nodes: Vec<Node>,
    pub(crate) labels: Vec<Option<String>>,
    pub(crate) rules: FxHashMap<String, ParserId>,
    pub(crate) lexicon: Lexicon,
}

impl Grammar {
    pub fn node(&self, id: ParserId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Trace label of a node, if one was given
    pub fn label(&self, id: ParserId) -> Option<&str> {
        self.labels.get(id.0).and_then(|label| label.as_deref())
    }

    /// Look up a rule registered with [`GrammarBuilder::declare`] or [`GrammarBuilder::name_rule`]
    pub fn rule(&self, name: &str) -> Option<ParserId> {
        self.rules.get(name).copied()
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Display name used in traces: the label, else the node kind
    pub fn describe(&self, id: ParserId) -> String {
        match (self.label(id), self.node(id)) {
            (Some(label), _) => label.to_string(),
            (None, Some(Node::Token(kind))) => kind.to_string(),
            (None, Some(node)) => format!("{}#{}", node.kind_name(), id),
            (None, None) => format!("#{}", id),
        }
    }
}

/// Incrementally assembles a [`Grammar`]
#[derive(Debug, Default)]
pub struct GrammarBuilder {
    nodes: Vec<Node>,
    labels: Vec<Option<String>>,
    rules: FxHashMap<String, ParserId>,
    tokens: FxHashMap<TokenKind, ParserId>,
}

impl GrammarBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node to the arena
    pub fn push(&mut self, node: Node) -> ParserId {
        let id = ParserId(self.nodes.len());
        self.nodes.push(node);
        self.labels.push(None);
        id
    }

    /// Token parsers are shared: asking twice for a kind returns the same node.
    pub fn token(&mut self, kind: TokenKind) -> ParserId {
        if let Some(id) = self.tokens.get(&kind) {
            return *id;
        }
        let id = self.push(Node::Token(kind));
        self.tokens.insert(kind, id);
        id
    }

    pub fn constant(&mut self, value: Parsed) -> ParserId {
        self.push(Node::Constant(value))
    }

    pub fn or(&mut self, children: impl IntoIterator<Item = ParserId>) -> ParserId {
        self.push(Node::Or(children.into_iter().collect()))
    }

    pub fn and(&mut self, children: impl IntoIterator<Item = ParserId>) -> ParserId {
        self.push(Node::And(children.into_iter().collect()))
    }

    pub fn many(&mut self, child: ParserId) -> ParserId {
        self.push(Node::Many(child))
    }

    pub fn maybe(&mut self, child: ParserId, default: Parsed) -> ParserId {
        self.push(Node::Maybe(child, default))
    }

    pub fn bind<F>(&mut self, child: ParserId, continuation: F) -> ParserId
    where
        F: Fn(Parsed) -> Result<Node, ParseFault> + 'static,
    {
        self.push(Node::Bind(child, Rc::new(continuation)))
    }

    /// Reserve a named rule to be filled in later with [`GrammarBuilder::define`]
    pub fn declare(&mut self, name: &str) -> ParserId {
        let id = self.push(Node::Placeholder(name.to_string()));
        self.labels[id.0] = Some(name.to_string());
        self.rules.insert(name.to_string(), id);
        id
    }

    /// Anonymous placeholder meaning "the rule this ends up inside of"
    pub fn reflection(&mut self) -> ParserId {
        self.push(Node::Placeholder("<reflection>".to_string()))
    }

    /// Fill a placeholder slot with its real node
    pub fn define(&mut self, id: ParserId, node: Node) -> Result<(), GrammarError> {
        let slot = self
            .nodes
            .get_mut(id.0)
            .ok_or(GrammarError::UnknownParser { id })?;
        if matches!(slot, Node::Placeholder(_)) {
            *slot = node;
            return Ok(());
        }
        Err(GrammarError::AlreadyDefined {
            name: self.labels[id.0]
                .clone()
                .unwrap_or_else(|| format!("#{}", id)),
        })
    }

    /// Fill a placeholder slot with a copy of an already-built node
    pub fn define_as(&mut self, id: ParserId, target: ParserId) -> Result<(), GrammarError> {
        let node = self
            .nodes
            .get(target.0)
            .cloned()
            .ok_or(GrammarError::UnknownParser { id: target })?;
        self.define(id, node)
    }

    /// Rewrite every reference to `placeholder` reachable from `root` into a
    /// reference to `root` itself. Returns how many references were rewritten.
    pub fn substitute(
        &mut self,
        root: ParserId,
        placeholder: ParserId,
    ) -> Result<usize, GrammarError> {
        for id in [root, placeholder] {
            if id.0 >= self.nodes.len() {
                return Err(GrammarError::UnknownParser { id });
            }
        }

        let mut visited = FxHashSet::default();
        let mut pending = vec![root];
        let mut rewritten = 0;

        while let Some(id) = pending.pop() {
            if !visited.insert(id) {
                continue;
            }
            for child in self.nodes[id.0].children_mut() {
                if *child == placeholder {
                    *child = root;
                    rewritten += 1;
                } else {
                    pending.push(*child);
                }
            }
        }

        Ok(rewritten)
    }

    /// Attach a trace label to a node
    pub fn label(&mut self, id: ParserId, label: &str) -> ParserId {
        if let Some(slot) = self.labels.get_mut(id.0) {
            *slot = Some(label.to_string());
        }
        id
    }

    /// Register an existing node as a named entry point
    pub fn name_rule(&mut self, name: &str, id: ParserId) -> ParserId {
        self.rules.insert(name.to_string(), id);
        self.label(id, name)
    }

    pub fn finish(self) -> Result<Grammar, GrammarError> {
        for (name, id) in &self.rules {
            if matches!(self.nodes.get(id.0), Some(Node::Placeholder(_)) | None) {
                return Err(GrammarError::UndefinedRule { name: name.clone() });
            }
        }

        Ok(Grammar {
            nodes: self.nodes,
            labels: self.labels,
            rules: self.rules,
            lexicon: Lexicon::new()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_shared() {
        let mut g = GrammarBuilder::new();
        let a = g.token(TokenKind::Plus);
        let b = g.token(TokenKind::Plus);
        let c = g.token(TokenKind::Minus);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_define_twice_is_rejected() {
        let mut g = GrammarBuilder::new();
        let rule = g.declare("rule");
        let int = g.token(TokenKind::Integer);
        g.define(rule, Node::Many(int)).expect("first definition");
        match g.define(rule, Node::Many(int)) {
            Err(GrammarError::AlreadyDefined { name }) => assert_eq!(name, "rule"),
            other => panic!("Expected AlreadyDefined, got {:?}", other),
        }
    }

    #[test]
    fn test_finish_requires_declared_rules() {
        let mut g = GrammarBuilder::new();
        g.declare("missing");
        match g.finish() {
            Err(GrammarError::UndefinedRule { name }) => assert_eq!(name, "missing"),
            other => panic!("Expected UndefinedRule, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_substitute_rewrites_reachable_references() {
        let mut g = GrammarBuilder::new();
        let me = g.reflection();
        let int = g.token(TokenKind::Integer);
        let minus = g.token(TokenKind::Minus);
        let negated = g.and([minus, me]);
        let root = g.or([negated, int]);

        let rewritten = g.substitute(root, me).expect("ids are valid");
        assert_eq!(rewritten, 1);

        let grammar = g.finish().expect("grammar builds");
        assert_eq!(grammar.node(negated).map(Node::children), Some(&[minus, root][..]));
    }

    #[test]
    fn test_describe_prefers_labels() {
        let mut g = GrammarBuilder::new();
        let int = g.token(TokenKind::Integer);
        let many = g.many(int);
        let named = g.or([int]);
        g.label(named, "NUMBER");
        let grammar = g.finish().expect("grammar builds");

        assert_eq!(grammar.describe(int), "int literal");
        assert_eq!(grammar.describe(many), format!("Many#{}", many));
        assert_eq!(grammar.describe(named), "NUMBER");
    }
}
