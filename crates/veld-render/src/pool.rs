//! Append-only per-frame vertex storage.

use bytemuck::Pod;

/// A growable, append-only sequence of vertices of one format.
///
/// Pools are pure data: they grow monotonically during accumulation and
/// are wholly cleared by the flusher. Lifetime of every vertex is one
/// frame (or one mid-frame flush).
#[derive(Debug)]
pub struct VertexPool<V> {
    data: Vec<V>,
}

impl<V> Default for VertexPool<V> {
    fn default() -> Self {
        Self { data: Vec::new() }
    }
}

impl<V: Pod> VertexPool<V> {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }

    /// Current length in vertices; the cursor the next append lands at.
    #[inline]
    pub fn len(&self) -> u32 {
        self.data.len() as u32
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn push(&mut self, vertex: V) {
        self.data.push(vertex);
    }

    #[inline]
    pub fn extend_from_slice(&mut self, vertices: &[V]) {
        self.data.extend_from_slice(vertices);
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    pub fn as_slice(&self) -> &[V] {
        &self.data
    }

    /// The pool's contents as raw interleaved bytes for the driver.
    pub fn bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vertex::DepthVertex;

    #[test]
    fn pool_grows_and_clears() {
        let mut pool = VertexPool::<DepthVertex>::new();
        assert!(pool.is_empty());

        pool.push(DepthVertex {
            pos: [1.0, 2.0, 3.0],
            uv: [0.0, 1.0],
        });
        pool.extend_from_slice(&[DepthVertex {
            pos: [4.0, 5.0, 6.0],
            uv: [1.0, 0.0],
        }; 3]);

        assert_eq!(pool.len(), 4);
        assert_eq!(pool.bytes().len(), 4 * core::mem::size_of::<DepthVertex>());

        pool.clear();
        assert_eq!(pool.len(), 0);
        assert!(pool.bytes().is_empty());
    }
}
