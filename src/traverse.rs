//! Walking foreign linked lists and first-child/next-sibling trees.
//!
//! Accessors are followed until they return the null handle. Chains are
//! trusted to be finite and acyclic; no cycle detection is done.

use crate::engine::RawHandle;

/// Collect `first` and every handle reachable through `next`, in order.
pub(crate) fn collect_chain(
    first: RawHandle,
    mut next: impl FnMut(RawHandle) -> RawHandle,
) -> Vec<RawHandle> {
    let mut handles = Vec::new();
    let mut current = first;
    while current != 0 {
        handles.push(current);
        current = next(current);
    }
    handles
}

/// A node of a materialized foreign tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TreeNode {
    pub raw: RawHandle,
    pub children: Vec<TreeNode>,
}

/// Materialize the sibling chain starting at `first`, descending through `down`.
pub(crate) fn collect_tree<D, N>(first: RawHandle, down: &mut D, next: &mut N) -> Vec<TreeNode>
where
    D: FnMut(RawHandle) -> RawHandle,
    N: FnMut(RawHandle) -> RawHandle,
{
    let mut nodes = Vec::new();
    let mut current = first;
    while current != 0 {
        let child = down(current);
        let children = collect_tree(child, down, next);
        nodes.push(TreeNode {
            raw: current,
            children,
        });
        current = next(current);
    }
    nodes
}
