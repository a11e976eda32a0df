use serde::Serialize;

use super::model::{ChainNode, NodeResults};

/// Index of a node in the chain arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NodeId(pub usize);

/// Read access to block nodes and their cached results.
///
/// Consensus code only walks parent links, so it runs unchanged on the
/// full chain and on lightweight fixtures.
pub trait ChainContext {
    fn node(&self, id: NodeId) -> &ChainNode;

    fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    fn results(&self, id: NodeId) -> Option<&NodeResults> {
        self.node(id).results.as_ref()
    }

    /// `id` followed by its ancestors down to genesis.
    fn ancestors(&self, id: NodeId) -> Ancestors<'_, Self>
    where
        Self: Sized,
    {
        Ancestors {
            ctx: self,
            next: Some(id),
        }
    }

    /// The ancestor `depth` steps behind `id`, if the chain is that long.
    fn ancestor(&self, id: NodeId, depth: usize) -> Option<NodeId>
    where
        Self: Sized,
    {
        self.ancestors(id).nth(depth)
    }
}

pub struct Ancestors<'a, C> {
    ctx: &'a C,
    next: Option<NodeId>,
}

impl<C: ChainContext> Iterator for Ancestors<'_, C> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.ctx.parent(current);
        Some(current)
    }
}
