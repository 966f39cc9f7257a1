//! Associativity flattening
//!
//! `Or(Or(a, b), c)` and `Or(a, b, c)` accept the same inputs in the same
//! order, so nested choices are spliced into their parent. The same holds for
//! `And`, except that the result shape changes from nested sequences to one
//! flat sequence; bind continuations in the C grammar are written against the
//! flattened shape.
//!
//! The grammar graph is cyclic through rule references. Traversal is
//! post-order, and a node already on the current path is skipped, which
//! bounds the walk. The set of in-progress nodes lives in the traversal, not
//! in the nodes.
//!
//! Optimizing never touches its input: [`optimize`] returns a new grammar in
//! which every [`ParserId`] still names the same rule.

use super::combinator::{Grammar, Node, ParserId};
use log::debug;
use rustc_hash::FxHashSet;

/// Which composite kind to flatten
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flatten {
    Or,
    And,
}

impl Flatten {
    fn applies_to(self, node: &Node) -> bool {
        matches!(
            (self, node),
            (Flatten::Or, Node::Or(_)) | (Flatten::And, Node::And(_))
        )
    }
}

/// Flatten one kind of node reachable from `roots`, producing a new grammar
pub fn flatten(grammar: &Grammar, roots: &[ParserId], kind: Flatten) -> Grammar {
    let mut optimized = grammar.clone();
    let mut visiting = FxHashSet::default();
    let mut rewritten = 0;

    for &root in roots {
        rewritten += visit(&mut optimized.nodes, root, kind, &mut visiting);
    }

    debug!("flattened {} {:?} node(s)", rewritten, kind);
    optimized
}

/// Flatten `Or` and then `And` from every named rule of the grammar
pub fn optimize(grammar: &Grammar) -> Grammar {
    let mut roots: Vec<ParserId> = grammar.rules.values().copied().collect();
    roots.sort();

    let or_flat = flatten(grammar, &roots, Flatten::Or);
    flatten(&or_flat, &roots, Flatten::And)
}

fn visit(
    nodes: &mut [Node],
    id: ParserId,
    kind: Flatten,
    visiting: &mut FxHashSet<ParserId>,
) -> usize {
    let Some(node) = nodes.get(id.index()) else {
        return 0;
    };
    if !visiting.insert(id) {
        return 0;
    }

    let mut rewritten = 0;
    let children = node.children().to_vec();
    for &child in &children {
        rewritten += visit(nodes, child, kind, visiting);
    }

    if kind.applies_to(&nodes[id.index()]) {
        let spliced = splice(nodes, &children, kind);
        if spliced != children {
            rewritten += 1;
            if let Node::Or(slots) | Node::And(slots) = &mut nodes[id.index()] {
                *slots = spliced;
            }
        }
    }

    visiting.remove(&id);
    rewritten
}

/// Replace each child of the same kind with that child's own children
fn splice(nodes: &[Node], children: &[ParserId], kind: Flatten) -> Vec<ParserId> {
    let mut flat = Vec::with_capacity(children.len());
    for &child in children {
        match nodes.get(child.index()) {
            Some(node) if kind.applies_to(node) => flat.extend_from_slice(node.children()),
            _ => flat.push(child),
        }
    }
    flat
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::combinator::GrammarBuilder;
    use crate::parser::lexer::TokenKind;

    #[test]
    fn test_nested_or_is_spliced_in_order() {
        let mut g = GrammarBuilder::new();
        let a = g.token(TokenKind::Int);
        let b = g.token(TokenKind::Float);
        let c = g.token(TokenKind::Identifier);
        let inner = g.or([a, b]);
        let outer = g.or([inner, c]);
        let grammar = g.finish().expect("grammar builds");

        let flat = flatten(&grammar, &[outer], Flatten::Or);
        assert_eq!(flat.node(outer).map(Node::children), Some(&[a, b, c][..]));
        // The input grammar is untouched
        assert_eq!(grammar.node(outer).map(Node::children), Some(&[inner, c][..]));
    }

    #[test]
    fn test_flatten_leaves_other_kind_alone() {
        let mut g = GrammarBuilder::new();
        let a = g.token(TokenKind::Int);
        let b = g.token(TokenKind::Float);
        let inner = g.and([a, b]);
        let outer = g.or([inner, a]);
        let grammar = g.finish().expect("grammar builds");

        let flat = flatten(&grammar, &[outer], Flatten::Or);
        assert_eq!(flat.node(outer).map(Node::children), Some(&[inner, a][..]));
    }

    #[test]
    fn test_post_order_flattens_deep_nesting() {
        let mut g = GrammarBuilder::new();
        let a = g.token(TokenKind::Plus);
        let b = g.token(TokenKind::Minus);
        let c = g.token(TokenKind::Star);
        let d = g.token(TokenKind::Slash);
        let ab = g.and([a, b]);
        let abc = g.and([ab, c]);
        let abcd = g.and([abc, d]);
        let grammar = g.finish().expect("grammar builds");

        let flat = flatten(&grammar, &[abcd], Flatten::And);
        assert_eq!(flat.node(abcd).map(Node::children), Some(&[a, b, c, d][..]));
    }

    #[test]
    fn test_terminates_on_cycles() {
        let mut g = GrammarBuilder::new();
        let expr = g.declare("expr");
        let int = g.token(TokenKind::Integer);
        let plus = g.token(TokenKind::Plus);
        let tail = g.and([plus, expr]);
        let binary = g.and([int, tail]);
        g.define(expr, Node::Or(vec![binary, int])).expect("defines");
        let grammar = g.finish().expect("grammar builds");

        let flat = optimize(&grammar);
        assert_eq!(flat.node(binary).map(Node::children), Some(&[int, plus, expr][..]));
        assert_eq!(flat.len(), grammar.len());
    }
}
