//! A CPU-only [`GpuBackend`] that records what a real backend would do.
//!
//! Used by the headless driver and by tests: it counts buffer allocations,
//! writes and draws, tracks how many buffers are alive, and keeps the draw
//! calls of the current frame for inspection.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use glam::DMat4;

use crate::gpu::{BufferUsage, DrawCall, DrawStyle, GpuBackend};

/// A buffer owned by [`HeadlessBackend`]. Dropping it lowers the live count.
#[derive(Debug)]
pub struct HeadlessBuffer {
    id: u64,
    usage: BufferUsage,
    size: u64,
    live: Arc<AtomicUsize>,
}

impl HeadlessBuffer {
    /// Unique id within the backend that created it.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

impl Drop for HeadlessBuffer {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Counters accumulated since the backend was created.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeadlessStats {
    pub buffers_created: u64,
    pub buffer_writes: u64,
    pub bytes_uploaded: u64,
    pub releases: u64,
    pub interior_draws: u64,
    pub outline_draws: u64,
}

impl HeadlessStats {
    pub fn draws(&self) -> u64 {
        self.interior_draws + self.outline_draws
    }
}

/// A draw call as recorded by [`HeadlessBackend`].
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedDraw {
    pub vertex_buffer: u64,
    pub index_buffer: u64,
    pub index_count: u32,
    pub model: DMat4,
    pub style: DrawStyle,
}

/// Records buffer traffic and draws without a GPU.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    next_id: u64,
    live: Arc<AtomicUsize>,
    stats: HeadlessStats,
    draws: Vec<RecordedDraw>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffers created by this backend that have not been dropped.
    pub fn live_buffers(&self) -> usize {
        self.live.load(Ordering::Relaxed)
    }

    pub fn stats(&self) -> HeadlessStats {
        self.stats
    }

    /// Draws recorded since the last [`take_draws`](Self::take_draws).
    pub fn draws(&self) -> &[RecordedDraw] {
        &self.draws
    }

    /// End the frame: return and clear the recorded draws.
    pub fn take_draws(&mut self) -> Vec<RecordedDraw> {
        std::mem::take(&mut self.draws)
    }
}

impl GpuBackend for HeadlessBackend {
    type Buffer = HeadlessBuffer;

    fn create_buffer(&mut self, usage: BufferUsage, label: &str, contents: &[u8]) -> HeadlessBuffer {
        self.next_id += 1;
        self.live.fetch_add(1, Ordering::Relaxed);
        self.stats.buffers_created += 1;
        self.stats.bytes_uploaded += contents.len() as u64;
        tracing::trace!(id = self.next_id, ?usage, label, bytes = contents.len(), "create buffer");
        HeadlessBuffer {
            id: self.next_id,
            usage,
            size: contents.len() as u64,
            live: Arc::clone(&self.live),
        }
    }

    fn write_buffer(&mut self, buffer: &HeadlessBuffer, contents: &[u8]) {
        debug_assert!(
            contents.len() as u64 <= buffer.size,
            "write of {} bytes into buffer of {}",
            contents.len(),
            buffer.size
        );
        self.stats.buffer_writes += 1;
        self.stats.bytes_uploaded += contents.len() as u64;
    }

    fn buffer_size(&self, buffer: &HeadlessBuffer) -> u64 {
        buffer.size
    }

    fn release(&mut self, buffer: HeadlessBuffer) {
        self.stats.releases += 1;
        drop(buffer);
    }

    fn draw(&mut self, call: DrawCall<'_, HeadlessBuffer>) {
        match call.style {
            DrawStyle::Interior { .. } => self.stats.interior_draws += 1,
            DrawStyle::Outline { .. } => self.stats.outline_draws += 1,
        }
        self.draws.push(RecordedDraw {
            vertex_buffer: call.vertex_buffer.id,
            index_buffer: call.index_buffer.id,
            index_count: call.index_count,
            model: call.model,
            style: call.style,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::Color;

    #[test]
    fn test_live_count_follows_drops() {
        let mut gpu = HeadlessBackend::new();
        let a = gpu.create_buffer(BufferUsage::Vertex, "a", &[0; 64]);
        let b = gpu.create_buffer(BufferUsage::Index, "b", &[0; 12]);
        assert_eq!(gpu.live_buffers(), 2);
        drop(a);
        assert_eq!(gpu.live_buffers(), 1);
        gpu.release(b);
        assert_eq!(gpu.live_buffers(), 0);
        assert_eq!(gpu.stats().releases, 1);
    }

    #[test]
    fn test_counts_uploads() {
        let mut gpu = HeadlessBackend::new();
        let buf = gpu.create_buffer(BufferUsage::Vertex, "v", &[1; 32]);
        gpu.write_buffer(&buf, &[2; 16]);
        let stats = gpu.stats();
        assert_eq!(stats.buffers_created, 1);
        assert_eq!(stats.buffer_writes, 1);
        assert_eq!(stats.bytes_uploaded, 48);
        assert_eq!(gpu.buffer_size(&buf), 32);
        assert_eq!(buf.usage(), BufferUsage::Vertex);
    }

    #[test]
    fn test_records_draws() {
        let mut gpu = HeadlessBackend::new();
        let v = gpu.create_buffer(BufferUsage::Vertex, "v", &[0; 32]);
        let i = gpu.create_buffer(BufferUsage::Index, "i", &[0; 12]);
        gpu.draw(DrawCall {
            vertex_buffer: &v,
            index_buffer: &i,
            index_count: 3,
            model: DMat4::IDENTITY,
            style: DrawStyle::Outline {
                color: Color::WHITE,
                width: 2.0,
            },
        });
        assert_eq!(gpu.stats().outline_draws, 1);
        let draws = gpu.take_draws();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].vertex_buffer, v.id());
        assert_eq!(draws[0].index_buffer, i.id());
        assert!(gpu.draws().is_empty());
    }
}
