/// A directed reply edge packed into one integer, 32 bits per endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey(pub u64);

/// Largest node count the packed encoding can address.
pub const MAX_NODES: u64 = 1 << 32;

pub fn encode_edge(src: u32, tgt: u32) -> EdgeKey {
    EdgeKey((u64::from(src) << 32) | u64::from(tgt))
}

pub fn decode_edge(edge: EdgeKey) -> (u32, u32) {
    ((edge.0 >> 32) as u32, (edge.0 & 0xffff_ffff) as u32)
}

impl EdgeKey {
    /// Packs two dense node indices. Callers guarantee both are below [`MAX_NODES`],
    /// which [`crate::engine::ReplyGraph::build`] enforces.
    pub(crate) fn from_indices(src: usize, tgt: usize) -> Self {
        encode_edge(src as u32, tgt as u32)
    }

    pub fn endpoints(self) -> (usize, usize) {
        let (src, tgt) = decode_edge(self);
        (src as usize, tgt as usize)
    }
}
