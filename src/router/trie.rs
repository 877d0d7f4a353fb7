//! Arena-backed routing trie.
//!
//! Nodes live in a single `Vec` and refer to each other through [`NodeId`]
//! handles. Each node holds:
//!
//! - static children keyed by the literal segment
//! - at most one parametric child (`:name`)
//! - path-level middleware, which applies to every method at this node and
//!   every path below it
//! - a method table with one [`RouteEntry`] per HTTP method
//!
//! Mounting a sub-router moves every node of the consumed source arena into
//! this one. Handles never alias across arenas, so a mounted tree cannot be
//! reached from two live routers.

use http::Method;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

use crate::middleware::Step;

/// Prefix marking a parametric segment.
pub const PARAM_SIGIL: char = ':';

/// Stable handle to a node inside one [`Trie`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// The root node, present in every trie.
    pub const ROOT: NodeId = NodeId(0);

    /// Position of the node in its arena.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Route-level binding for one method at one node.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    /// Run after all path-level middleware, before the handler.
    pub middlewares: Vec<Step>,
    pub handler: Step,
}

#[derive(Debug, Default)]
pub(crate) struct TrieNode {
    pub(crate) children: HashMap<String, NodeId>,
    pub(crate) param_child: Option<NodeId>,
    /// Only set on parametric nodes.
    pub(crate) param_name: Option<Arc<str>>,
    pub(crate) middlewares: Vec<Step>,
    /// Registration order is kept so `Allow` lists are deterministic.
    pub(crate) routes: SmallVec<[(Method, RouteEntry); 4]>,
}

impl TrieNode {
    fn new_param(name: &str) -> Self {
        Self {
            param_name: Some(Arc::from(name)),
            ..Self::default()
        }
    }

    pub(crate) fn route(&self, method: &Method) -> Option<&RouteEntry> {
        self.routes
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, entry)| entry)
    }

    pub(crate) fn methods(&self) -> Vec<Method> {
        self.routes.iter().map(|(m, _)| m.clone()).collect()
    }
}

/// A method collision found while merging two tries.
///
/// `path` is relative to the merge point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MergeConflict {
    pub(crate) method: Method,
    pub(crate) path: String,
}

/// Split a path into its non-empty segments.
///
/// `"/a//b/"` yields `["a", "b"]`; `"/"` and `""` yield nothing.
pub fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

#[derive(Debug)]
pub(crate) struct Trie {
    nodes: Vec<TrieNode>,
}

impl Default for Trie {
    fn default() -> Self {
        Self::new()
    }
}

impl Trie {
    pub(crate) fn new() -> Self {
        Self {
            nodes: vec![TrieNode::default()],
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn node(&self, id: NodeId) -> &TrieNode {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut TrieNode {
        &mut self.nodes[id.0]
    }

    fn alloc(&mut self, node: TrieNode) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Get-or-create the node for `path`, starting at the root.
    ///
    /// A `:name` segment reuses the existing parametric child even when it was
    /// created under a different name; the first name registered at a position
    /// is the one that captures.
    pub(crate) fn insert_path(&mut self, path: &str) -> NodeId {
        let mut current = NodeId::ROOT;
        for segment in split_segments(path) {
            current = match segment.strip_prefix(PARAM_SIGIL) {
                Some(name) => match self.node(current).param_child {
                    Some(existing) => existing,
                    None => {
                        let child = self.alloc(TrieNode::new_param(name));
                        self.node_mut(current).param_child = Some(child);
                        child
                    }
                },
                None => match self.node(current).children.get(segment) {
                    Some(&existing) => existing,
                    None => {
                        let child = self.alloc(TrieNode::default());
                        self.node_mut(current)
                            .children
                            .insert(segment.to_owned(), child);
                        child
                    }
                },
            };
        }
        current
    }

    /// Merge `source` into the node at `target`, consuming `source`.
    ///
    /// Nothing is modified when a conflict is found.
    pub(crate) fn merge(&mut self, target: NodeId, source: Trie) -> Result<(), MergeConflict> {
        let mut prefix = Vec::new();
        self.check_merge(target, &source, NodeId::ROOT, &mut prefix)?;

        let mut slots: Vec<Option<TrieNode>> = source.nodes.into_iter().map(Some).collect();
        self.splice(target, NodeId::ROOT, &mut slots);
        Ok(())
    }

    fn check_merge(
        &self,
        target: NodeId,
        source: &Trie,
        src: NodeId,
        prefix: &mut Vec<String>,
    ) -> Result<(), MergeConflict> {
        let t = self.node(target);
        let s = source.node(src);

        if let Some((method, _)) = s.routes.iter().find(|(m, _)| t.route(m).is_some()) {
            return Err(MergeConflict {
                method: method.clone(),
                path: format!("/{}", prefix.join("/")),
            });
        }

        for (segment, &s_child) in &s.children {
            if let Some(&t_child) = t.children.get(segment) {
                prefix.push(segment.clone());
                self.check_merge(t_child, source, s_child, prefix)?;
                prefix.pop();
            }
        }

        if let (Some(t_param), Some(s_param)) = (t.param_child, s.param_child) {
            let name = self.node(t_param).param_name.as_deref().unwrap_or_default();
            prefix.push(format!("{PARAM_SIGIL}{name}"));
            self.check_merge(t_param, source, s_param, prefix)?;
            prefix.pop();
        }

        Ok(())
    }

    /// Move the source node at `src` into `target`. Must only run after
    /// `check_merge` succeeded.
    fn splice(&mut self, target: NodeId, src: NodeId, slots: &mut [Option<TrieNode>]) {
        let Some(source) = slots.get_mut(src.0).and_then(Option::take) else {
            return;
        };
        let TrieNode {
            children,
            param_child,
            param_name,
            middlewares,
            routes,
        } = source;

        let t = self.node_mut(target);
        if t.param_name.is_none() {
            t.param_name = param_name;
        } else if let (Some(kept), Some(dropped)) = (&t.param_name, &param_name) {
            if kept != dropped {
                // TODO: report a param-name mismatch as RouterError::Conflict.
                warn!(
                    kept = %kept,
                    dropped = %dropped,
                    "Merged parametric segments with different names; keeping the mount target's name"
                );
            }
        }
        t.middlewares.extend(middlewares);
        t.routes.extend(routes);

        for (segment, s_child) in children {
            match self.node(target).children.get(&segment).copied() {
                Some(t_child) => self.splice(t_child, s_child, slots),
                None => {
                    let moved = self.transplant(s_child, slots);
                    self.node_mut(target).children.insert(segment, moved);
                }
            }
        }

        if let Some(s_param) = param_child {
            match self.node(target).param_child {
                Some(t_param) => self.splice(t_param, s_param, slots),
                None => {
                    let moved = self.transplant(s_param, slots);
                    self.node_mut(target).param_child = Some(moved);
                }
            }
        }
    }

    fn transplant(&mut self, src: NodeId, slots: &mut [Option<TrieNode>]) -> NodeId {
        let id = self.alloc(TrieNode::default());
        self.splice(id, src, slots);
        id
    }
}
