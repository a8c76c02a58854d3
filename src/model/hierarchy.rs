//! Derived parent/child index over a flat element list.
//!
//! Containers never physically hold their children: the tree is rebuilt
//! from `parentId` whenever a nested view is needed. The index is built
//! from indices into the source slice so it works for both stored
//! [`Element`]s and wire-side [`FlatElement`](crate::flatten::FlatElement)s.

use std::collections::HashMap;

use super::Element;

/// What the hierarchy builder needs to know about an element.
pub trait HierarchyNode {
    fn node_id(&self) -> &str;
    fn parent_ref(&self) -> Option<&str>;
    fn is_container(&self) -> bool;
    /// Child ids in the container's declared order.
    fn child_order(&self) -> Vec<&str>;
}

impl HierarchyNode for Element {
    fn node_id(&self) -> &str {
        &self.id
    }

    fn parent_ref(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    fn is_container(&self) -> bool {
        Element::is_container(self)
    }

    fn child_order(&self) -> Vec<&str> {
        self.as_container()
            .map(|c| c.children.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

/// Effective parent/child relations, by index into the source slice.
///
/// A `parentId` only counts when it names an existing container and doesn't
/// close a cycle; otherwise the element is treated as top-level. When ids
/// repeat, the first occurrence wins lookups.
#[derive(Debug, Clone, Default)]
pub struct Hierarchy {
    parents: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    roots: Vec<usize>,
}

impl Hierarchy {
    pub fn build<N: HierarchyNode>(nodes: &[N]) -> Self {
        let mut by_id: HashMap<&str, usize> = HashMap::with_capacity(nodes.len());
        for (idx, node) in nodes.iter().enumerate() {
            by_id.entry(node.node_id()).or_insert(idx);
        }

        let mut parents: Vec<Option<usize>> = nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| {
                let parent = *by_id.get(node.parent_ref()?)?;
                (parent != idx && nodes[parent].is_container()).then_some(parent)
            })
            .collect();

        // Break cycles: walk up from each node; if the walk revisits the
        // start, cut the start loose.
        for start in 0..nodes.len() {
            let mut cur = parents[start];
            let mut steps = 0;
            while let Some(p) = cur {
                if p == start {
                    log::warn!(
                        "parent cycle through element '{}'; treating it as top-level",
                        nodes[start].node_id()
                    );
                    parents[start] = None;
                    break;
                }
                steps += 1;
                if steps > nodes.len() {
                    break;
                }
                cur = parents[p];
            }
        }

        let mut children = vec![Vec::new(); nodes.len()];
        let mut roots = Vec::new();
        for (idx, parent) in parents.iter().enumerate() {
            match parent {
                Some(p) => children[*p].push(idx),
                None => roots.push(idx),
            }
        }

        // Declared order first, then anything the container forgot to list
        // in insertion order.
        for (idx, kids) in children.iter_mut().enumerate() {
            if kids.len() < 2 {
                continue;
            }
            let declared = nodes[idx].child_order();
            let rank = |child: usize| {
                declared
                    .iter()
                    .position(|id| *id == nodes[child].node_id())
                    .unwrap_or(usize::MAX)
            };
            kids.sort_by_key(|&child| (rank(child), child));
        }

        Self { parents, children, roots }
    }

    pub fn parent_of(&self, idx: usize) -> Option<usize> {
        self.parents.get(idx).copied().flatten()
    }

    pub fn children_of(&self, idx: usize) -> &[usize] {
        self.children.get(idx).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Top-level elements in insertion order.
    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    /// Number of container ancestors above `idx`.
    pub fn depth(&self, idx: usize) -> usize {
        let mut depth = 0;
        let mut cur = self.parent_of(idx);
        while let Some(p) = cur {
            depth += 1;
            cur = self.parent_of(p);
        }
        depth
    }

    /// Parents before children, siblings in container order.
    pub fn preorder(&self) -> Vec<usize> {
        let mut out = Vec::with_capacity(self.parents.len());
        let mut stack: Vec<usize> = self.roots.iter().rev().copied().collect();
        while let Some(idx) = stack.pop() {
            out.push(idx);
            stack.extend(self.children_of(idx).iter().rev().copied());
        }
        out
    }
}
