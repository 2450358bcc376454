//! Test node resolution by identifier or 1-based index.
//!
//! Resolution runs in two stages over the same pre-order traversal:
//!
//! 1. Exact `nodeIdentifier` match, first hit in document order wins.
//! 2. If the key parses as a positive integer, the n-th "Test Case" in
//!    traversal order.
//!
//! The listing view numbers test cases with [`walk`], the same traversal
//! the index stage uses, so a printed index always resolves back to the node
//! it was printed next to.

use crate::error::find_similar_ids;
use crate::model::TestNode;
use serde::Serialize;
use tracing::debug;

/// One node visited by [`walk`].
#[derive(Debug, Clone, Copy)]
pub struct TreeEntry<'a> {
    /// Nesting depth; roots are 0.
    pub depth: usize,
    /// 1-based position among test cases, `None` for other node kinds.
    pub index: Option<usize>,
    pub node: &'a TestNode,
}

/// Pre-order, depth-first iterator over a forest.
///
/// Children are visited in document order after their parent. Uses an
/// explicit stack instead of recursion.
pub struct Walk<'a> {
    stack: Vec<(usize, &'a TestNode)>,
    next_index: usize,
}

impl<'a> Iterator for Walk<'a> {
    type Item = TreeEntry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        self.stack
            .extend(node.children.iter().rev().map(|child| (depth + 1, child)));

        let index = if node.is_test_case() {
            self.next_index += 1;
            Some(self.next_index)
        } else {
            None
        };

        Some(TreeEntry { depth, index, node })
    }
}

/// Walk a forest in the canonical resolution order.
#[must_use]
pub fn walk(roots: &[TestNode]) -> Walk<'_> {
    Walk {
        stack: roots.iter().rev().map(|root| (0, root)).collect(),
        next_index: 0,
    }
}

/// How a key matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum MatchType {
    /// `nodeIdentifier` equals the key.
    Identifier,
    /// The key was a 1-based test-case index.
    Index(usize),
}

/// Result of a successful resolution.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedNode<'a> {
    pub node: &'a TestNode,
    pub match_type: MatchType,
}

/// Resolves user-supplied keys against one loaded tree.
#[derive(Debug, Clone, Copy)]
pub struct NodeResolver<'a> {
    roots: &'a [TestNode],
}

impl<'a> NodeResolver<'a> {
    #[must_use]
    pub const fn new(roots: &'a [TestNode]) -> Self {
        Self { roots }
    }

    /// Resolve a key by exact identifier, then by positional index.
    ///
    /// Returns `None` when neither stage matches.
    #[must_use]
    pub fn resolve(&self, key: &str) -> Option<ResolvedNode<'a>> {
        let key = key.trim();
        if key.is_empty() {
            return None;
        }

        if let Some(node) = self.find_by_identifier(key) {
            debug!(key, "resolved by identifier");
            return Some(ResolvedNode {
                node,
                match_type: MatchType::Identifier,
            });
        }

        let index = parse_index(key)?;
        let resolved = self.find_by_index(index).map(|node| ResolvedNode {
            node,
            match_type: MatchType::Index(index),
        });
        debug!(key, index, found = resolved.is_some(), "index lookup");
        resolved
    }

    /// First node in pre-order whose identifier equals `identifier`.
    #[must_use]
    pub fn find_by_identifier(&self, identifier: &str) -> Option<&'a TestNode> {
        walk(self.roots)
            .find(|entry| entry.node.node_identifier.as_deref() == Some(identifier))
            .map(|entry| entry.node)
    }

    /// The test case with the given 1-based index.
    #[must_use]
    pub fn find_by_index(&self, index: usize) -> Option<&'a TestNode> {
        if index == 0 {
            return None;
        }
        walk(self.roots)
            .find(|entry| entry.index == Some(index))
            .map(|entry| entry.node)
    }

    /// Number of test cases reachable in the forest.
    #[must_use]
    pub fn test_case_count(&self) -> usize {
        walk(self.roots).filter(|entry| entry.index.is_some()).count()
    }

    /// Identifiers close to `key`, for "did you mean" guidance after a miss.
    #[must_use]
    pub fn similar_identifiers(&self, key: &str, max: usize) -> Vec<String> {
        find_similar_ids(
            key,
            walk(self.roots).filter_map(|entry| entry.node.node_identifier.as_deref()),
            max,
        )
    }
}

/// Parse a positive 1-based index; zero and non-numbers are rejected.
fn parse_index(key: &str) -> Option<usize> {
    key.parse::<usize>().ok().filter(|n| *n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::init_test_logging;
    use crate::model::NodeType;
    use tracing::info;

    fn case(name: &str) -> TestNode {
        TestNode {
            name: name.to_string(),
            node_type: NodeType::TestCase,
            result: Some("Passed".to_string()),
            node_identifier: Some(format!("Suite/{name}")),
            ..Default::default()
        }
    }

    fn group(name: &str, node_type: NodeType, children: Vec<TestNode>) -> TestNode {
        TestNode {
            name: name.to_string(),
            node_type,
            children,
            ..Default::default()
        }
    }

    fn sample_forest() -> Vec<TestNode> {
        vec![
            group(
                "AppTests",
                NodeType::UnitTestBundle,
                vec![group(
                    "Suite",
                    NodeType::TestSuite,
                    vec![case("A"), case("B")],
                )],
            ),
            group("UITests", NodeType::UiTestBundle, vec![case("C")]),
        ]
    }

    #[test]
    fn walk_is_preorder_in_document_order() {
        let forest = sample_forest();
        let names: Vec<(&str, usize, Option<usize>)> = walk(&forest)
            .map(|e| (e.node.name.as_str(), e.depth, e.index))
            .collect();
        assert_eq!(
            names,
            vec![
                ("AppTests", 0, None),
                ("Suite", 1, None),
                ("A", 2, Some(1)),
                ("B", 2, Some(2)),
                ("UITests", 0, None),
                ("C", 1, Some(3)),
            ]
        );
    }

    #[test]
    fn resolve_by_index_returns_second_case() {
        init_test_logging();
        info!("resolve_by_index_returns_second_case: starting");
        let forest = sample_forest();
        let resolver = NodeResolver::new(&forest);

        let resolved = resolver.resolve("2").expect("index 2");
        assert_eq!(resolved.node.name, "B");
        assert_eq!(resolved.match_type, MatchType::Index(2));

        assert!(resolver.resolve("99").is_none());
        assert!(resolver.resolve("0").is_none());
        assert!(resolver.resolve("-1").is_none());
        info!("resolve_by_index_returns_second_case: assertions passed");
    }

    #[test]
    fn identifier_match_wins_over_index() {
        let mut forest = sample_forest();
        // A node whose identifier looks like an index must still match exactly.
        forest[1].children[0].node_identifier = Some("1".to_string());
        let resolver = NodeResolver::new(&forest);

        let resolved = resolver.resolve("1").expect("identifier 1");
        assert_eq!(resolved.node.name, "C");
        assert_eq!(resolved.match_type, MatchType::Identifier);
    }

    #[test]
    fn first_identifier_in_document_order_wins() {
        let forest = vec![
            group("One", NodeType::TestSuite, vec![case("Dup")]),
            group("Two", NodeType::TestSuite, vec![case("Dup")]),
        ];
        let resolver = NodeResolver::new(&forest);
        let resolved = resolver.resolve("Suite/Dup").expect("dup");
        assert!(std::ptr::eq(resolved.node, &forest[0].children[0]));
    }

    #[test]
    fn unknown_key_is_not_found() {
        let forest = sample_forest();
        let resolver = NodeResolver::new(&forest);
        assert!(resolver.resolve("Suite/Missing").is_none());
        assert!(resolver.resolve("   ").is_none());
        assert_eq!(resolver.test_case_count(), 3);
    }

    #[test]
    fn listing_indices_round_trip() {
        let forest = sample_forest();
        let resolver = NodeResolver::new(&forest);
        for entry in walk(&forest) {
            if let Some(index) = entry.index {
                let resolved = resolver.resolve(&index.to_string()).expect("round trip");
                assert!(std::ptr::eq(resolved.node, entry.node));
            }
        }
    }

    #[test]
    fn similar_identifiers_suggest_close_matches() {
        let forest = sample_forest();
        let resolver = NodeResolver::new(&forest);
        let similar = resolver.similar_identifiers("Suite/X", 3);
        assert!(similar.contains(&"Suite/A".to_string()));
    }
}
