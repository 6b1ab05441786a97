//! Append-only storage for recorded chunks

use bytes::Bytes;

use crate::errors::WebcamError;

/// Ordered chunks of one recording session.
///
/// Zero-length chunks are never stored, and the running byte total always
/// equals the sum of the stored chunk lengths.
#[derive(Debug, Clone, Default)]
pub struct ChunkBuffer {
    chunks: Vec<Bytes>,
    total_bytes: usize,
}

impl ChunkBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk. Returns `false` when the chunk was empty and dropped.
    pub fn push(&mut self, chunk: Bytes) -> bool {
        if chunk.is_empty() {
            return false;
        }
        self.total_bytes = self.total_bytes.saturating_add(chunk.len());
        self.chunks.push(chunk);
        true
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
        self.total_bytes = 0;
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    pub fn chunks(&self) -> &[Bytes] {
        &self.chunks
    }

    /// Concatenate every chunk, in arrival order, into one contiguous buffer
    pub fn concat(&self) -> Result<Bytes, WebcamError> {
        if self.chunks.len() == 1 {
            return Ok(self.chunks[0].clone());
        }

        let mut data: Vec<u8> = Vec::new();
        data.try_reserve_exact(self.total_bytes).map_err(|e| {
            WebcamError::Finalize(format!(
                "Failed to allocate {} bytes for recording: {}",
                self.total_bytes, e
            ))
        })?;
        for chunk in &self.chunks {
            data.extend_from_slice(chunk);
        }
        Ok(Bytes::from(data))
    }
}
