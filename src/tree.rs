//! Recursive, depth-bounded tree expansion.
//!
//! The tree is one recursive node type plus a pure expansion step,
//! materialized lazily through the resolver's cache — parents and children
//! are person-shaped nodes all the way down. Sibling branches resolve
//! concurrently and independently: one branch failing (or being cancelled)
//! never touches its siblings or its parent.

use crate::cancel::CancelToken;
use crate::error::KintreeError;
use crate::person::Person;
use crate::resolver::EntityResolver;
use futures_util::future::{join_all, BoxFuture};
use std::sync::Arc;

/// Depth bound for recursive expansion. Nodes at this depth still expose
/// relation counts, but no further fetches fire below them, bounding total
/// fetch volume against the branching factor.
pub const MAX_DEPTH: usize = 3;

/// Lifecycle of one node. Cancellation is terminal and distinct: a
/// cancelled node never becomes ready or failed.
#[derive(Debug, Clone)]
pub enum NodeStatus {
    Pending,
    Ready(Person),
    Failed(KintreeError),
    Cancelled,
}

/// One node of the family tree: an entity at a depth, with its expanded
/// parent and child subtrees (empty until expansion reaches it).
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub id: String,
    pub depth: usize,
    pub status: NodeStatus,
    pub parents: Vec<TreeNode>,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn pending(id: &str, depth: usize) -> Self {
        Self {
            id: id.to_string(),
            depth,
            status: NodeStatus::Pending,
            parents: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn person(&self) -> Option<&Person> {
        match &self.status {
            NodeStatus::Ready(person) => Some(person),
            _ => None,
        }
    }

    /// Number of known parents, available as soon as the node is ready —
    /// independent of whether the parent nodes were spawned.
    pub fn parent_count(&self) -> Option<usize> {
        self.person().map(|p| p.parent_ids.len())
    }

    /// Number of known children; same availability as [`parent_count`].
    ///
    /// [`parent_count`]: TreeNode::parent_count
    pub fn child_count(&self) -> Option<usize> {
        self.person().map(|p| p.child_ids.len())
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.status, NodeStatus::Ready(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, NodeStatus::Failed(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.status, NodeStatus::Cancelled)
    }
}

/// Expands entities into depth-bounded family trees through a shared
/// resolver.
pub struct TreeExpander {
    resolver: Arc<EntityResolver>,
    max_depth: usize,
}

impl TreeExpander {
    pub fn new(resolver: Arc<EntityResolver>) -> Self {
        Self::with_max_depth(resolver, MAX_DEPTH)
    }

    pub fn with_max_depth(resolver: Arc<EntityResolver>, max_depth: usize) -> Self {
        Self { resolver, max_depth }
    }

    /// Resolve a single node without touching its relations.
    pub async fn materialize(&self, id: &str, depth: usize, token: &CancelToken) -> TreeNode {
        let mut node = TreeNode::pending(id, depth);
        match self.resolver.resolve(id, token).await {
            Ok(person) => node.status = NodeStatus::Ready(person),
            Err(KintreeError::Cancelled) => node.status = NodeStatus::Cancelled,
            Err(error) => {
                log::debug!("Node {} at depth {} failed: {}", id, depth, error);
                node.status = NodeStatus::Failed(error);
            }
        }
        node
    }

    /// Expand one ready node a single level: spawn its parent and child
    /// nodes concurrently, without recursing into them. No-op for nodes at
    /// the depth bound (their counts stay visible, nothing is fetched), for
    /// non-ready nodes, and for nodes already expanded.
    pub async fn expand_node(&self, node: &mut TreeNode, token: &CancelToken) {
        if node.depth >= self.max_depth {
            return;
        }
        if !node.parents.is_empty() || !node.children.is_empty() {
            return;
        }
        let person = match node.person() {
            Some(person) => person.clone(),
            None => return,
        };

        let depth = node.depth + 1;
        let relation_ids: Vec<String> = person
            .parent_ids
            .iter()
            .chain(person.child_ids.iter())
            .cloned()
            .collect();
        let futures: Vec<_> = relation_ids
            .into_iter()
            .map(|relation_id| {
                let child_token = token.child();
                async move { self.materialize(&relation_id, depth, &child_token).await }
            })
            .collect();

        let mut nodes = join_all(futures).await;
        let children = nodes.split_off(person.parent_ids.len());
        node.parents = nodes;
        node.children = children;
    }

    /// Build the full tree below `root_id`, expanding every ready branch
    /// down to the depth bound.
    pub async fn expand(&self, root_id: &str, token: &CancelToken) -> TreeNode {
        self.expand_inner(root_id.to_string(), 0, token.clone()).await
    }

    fn expand_inner(
        &self,
        id: String,
        depth: usize,
        token: CancelToken,
    ) -> BoxFuture<'_, TreeNode> {
        Box::pin(async move {
            let mut node = self.materialize(&id, depth, &token).await;

            if depth < self.max_depth {
                if let NodeStatus::Ready(person) = &node.status {
                    let person = person.clone();
                    let relation_ids: Vec<String> = person
                        .parent_ids
                        .iter()
                        .chain(person.child_ids.iter())
                        .cloned()
                        .collect();
                    let futures: Vec<_> = relation_ids
                        .into_iter()
                        .map(|relation_id| {
                            self.expand_inner(relation_id, depth + 1, token.child())
                        })
                        .collect();

                    let mut nodes = join_all(futures).await;
                    let children = nodes.split_off(person.parent_ids.len());
                    node.parents = nodes;
                    node.children = children;
                }
            }

            node
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kb::MockKnowledgeBase;
    use serde_json::json;

    fn item_claim(id: &str) -> serde_json::Value {
        json!({
            "mainsnak": {
                "snaktype": "value",
                "datavalue": {"type": "wikibase-entityid", "value": {"id": id}}
            }
        })
    }

    fn register(kb: &MockKnowledgeBase, id: &str, fathers: &[&str], mothers: &[&str], kids: &[&str]) {
        let claims = json!({
            "P22": fathers.iter().map(|f| item_claim(f)).collect::<Vec<_>>(),
            "P25": mothers.iter().map(|m| item_claim(m)).collect::<Vec<_>>(),
            "P40": kids.iter().map(|c| item_claim(c)).collect::<Vec<_>>(),
        });
        kb.insert_entity(
            serde_json::from_value(json!({
                "id": id,
                "labels": {"en": {"language": "en", "value": id}},
                "claims": claims,
            }))
            .unwrap(),
        );
    }

    /// Root with two parents and three children; the father's line chains
    /// four generations up.
    fn family_kb() -> Arc<MockKnowledgeBase> {
        let kb = Arc::new(MockKnowledgeBase::new());
        register(&kb, "Q1", &["Q10"], &["Q11"], &["Q20", "Q21", "Q22"]);
        register(&kb, "Q10", &["Q100"], &[], &[]);
        register(&kb, "Q11", &[], &[], &[]);
        register(&kb, "Q20", &[], &[], &[]);
        register(&kb, "Q21", &[], &[], &[]);
        register(&kb, "Q22", &[], &[], &[]);
        register(&kb, "Q100", &["Q1000"], &[], &[]);
        register(&kb, "Q1000", &["Q10000"], &[], &[]);
        register(&kb, "Q10000", &[], &[], &[]);
        kb
    }

    fn expander(kb: Arc<MockKnowledgeBase>) -> TreeExpander {
        TreeExpander::new(Arc::new(EntityResolver::new(kb)))
    }

    #[tokio::test]
    async fn test_expand_builds_root_shape() {
        let kb = family_kb();
        let expander = expander(kb);

        let root = expander.expand("Q1", &CancelToken::new()).await;
        assert!(root.is_ready());
        assert_eq!(root.depth, 0);
        assert_eq!(root.parents.len(), 2);
        assert_eq!(root.children.len(), 3);
        assert_eq!(root.parent_count(), Some(2));
        assert_eq!(root.child_count(), Some(3));
    }

    #[tokio::test]
    async fn test_depth_bound_reports_counts_without_fetching() {
        let kb = family_kb();
        let expander = expander(kb.clone());

        let root = expander.expand("Q1", &CancelToken::new()).await;

        // Walk the father chain to the boundary: Q10 (1) -> Q100 (2) -> Q1000 (3)
        let father = &root.parents[0];
        let grandfather = &father.parents[0];
        let great_grandfather = &grandfather.parents[0];
        assert_eq!(great_grandfather.id, "Q1000");
        assert_eq!(great_grandfather.depth, MAX_DEPTH);
        assert!(great_grandfather.is_ready());

        // The further-ancestor count is visible, but nothing below was spawned
        assert_eq!(great_grandfather.parent_count(), Some(1));
        assert!(great_grandfather.parents.is_empty());

        // Every materialized node fetched exactly once; Q10000 never was
        assert_eq!(kb.fetch_calls(), 8);
    }

    #[tokio::test]
    async fn test_branch_failure_is_local() {
        let kb = Arc::new(MockKnowledgeBase::new());
        register(&kb, "Q1", &["Q10"], &[], &["Q20", "Q21"]);
        register(&kb, "Q10", &[], &[], &[]);
        register(&kb, "Q20", &[], &[], &[]);
        // Q21 is unknown to the knowledge base
        let expander = expander(kb);

        let root = expander.expand("Q1", &CancelToken::new()).await;
        assert!(root.is_ready());
        assert!(root.parents[0].is_ready());
        assert!(root.children[0].is_ready());
        assert!(root.children[1].is_failed());
    }

    #[tokio::test]
    async fn test_cancelled_expansion_is_cancelled_not_failed() {
        let kb = family_kb();
        let expander = expander(kb);

        let token = CancelToken::new();
        token.cancel();
        let root = expander.expand("Q1", &token).await;

        assert!(root.is_cancelled());
        assert!(!root.is_failed());
        assert!(root.parents.is_empty());
        assert!(root.children.is_empty());
    }

    #[tokio::test]
    async fn test_expand_node_single_level() {
        let kb = family_kb();
        let expander = expander(kb);
        let token = CancelToken::new();

        let mut root = expander.materialize("Q1", 0, &token).await;
        assert!(root.parents.is_empty());

        expander.expand_node(&mut root, &token).await;
        assert_eq!(root.parents.len(), 2);
        assert_eq!(root.children.len(), 3);
        // One level only: the father's own line is untouched
        assert!(root.parents[0].parents.is_empty());

        // Re-expanding an expanded node is a no-op
        expander.expand_node(&mut root, &token).await;
        assert_eq!(root.parents.len(), 2);
    }

    #[tokio::test]
    async fn test_expand_node_noop_at_depth_bound() {
        let kb = family_kb();
        let expander = expander(kb.clone());
        let token = CancelToken::new();

        let mut node = expander.materialize("Q1000", MAX_DEPTH, &token).await;
        assert_eq!(kb.fetch_calls(), 1);

        expander.expand_node(&mut node, &token).await;
        assert!(node.parents.is_empty());
        assert_eq!(node.parent_count(), Some(1));
        assert_eq!(kb.fetch_calls(), 1);
    }

    #[tokio::test]
    async fn test_expand_node_noop_for_failed_node() {
        let kb = Arc::new(MockKnowledgeBase::new());
        let expander = expander(kb.clone());
        let token = CancelToken::new();

        let mut node = expander.materialize("Q404", 0, &token).await;
        assert!(node.is_failed());

        expander.expand_node(&mut node, &token).await;
        assert!(node.parents.is_empty());
        assert!(node.children.is_empty());
        assert_eq!(kb.fetch_calls(), 1);
    }

    #[tokio::test]
    async fn test_shared_ancestors_resolved_once() {
        // Both children of Q1 point back to Q1 as father: the cycle is
        // depth-bounded and the cache absorbs repeated references.
        let kb = Arc::new(MockKnowledgeBase::new());
        register(&kb, "Q1", &[], &[], &["Q20", "Q21"]);
        register(&kb, "Q20", &["Q1"], &[], &[]);
        register(&kb, "Q21", &["Q1"], &[], &[]);
        let expander = expander(kb.clone());

        let root = expander.expand("Q1", &CancelToken::new()).await;
        assert!(root.is_ready());
        // Q1, Q20, Q21 each fetched exactly once despite the cycle
        assert_eq!(kb.fetch_calls(), 3);
    }
}
