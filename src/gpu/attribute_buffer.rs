//! Per-instance attribute GPU buffers with lazy creation and regrowth.
//!
//! Each divisor-1 vertex attribute gets its own buffer, created on the
//! first data assignment and re-uploaded in place on every later one.
//! Capacity grows 2x when data outgrows it (GPU buffers cannot be resized
//! in place) and never shrinks, so swapping per-instance data every frame
//! stays a plain `write_buffer` in the steady state.

use wgpu::util::DeviceExt;

/// A float vertex buffer that is created on first write.
pub struct AttributeBuffer {
    buffer: Option<wgpu::Buffer>,
    capacity: usize, // Capacity in bytes
    len: usize,      // Current data length in floats
    label: String,
}

impl AttributeBuffer {
    /// Empty buffer; no GPU allocation happens until the first [`write`].
    ///
    /// [`write`]: Self::write
    #[must_use]
    pub fn new(label: String) -> Self {
        Self {
            buffer: None,
            capacity: 0,
            len: 0,
            label,
        }
    }

    /// Upload `data`, allocating the buffer on first use and growing it
    /// when the data no longer fits.
    pub fn write(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        data: &[f32],
    ) {
        let data_bytes: &[u8] = bytemuck::cast_slice(data);
        let needed = data_bytes.len();

        if self.buffer.is_none() {
            self.buffer = Some(device.create_buffer_init(
                &wgpu::util::BufferInitDescriptor {
                    label: Some(&self.label),
                    contents: data_bytes,
                    usage: wgpu::BufferUsages::VERTEX
                        | wgpu::BufferUsages::COPY_DST,
                },
            ));
            self.capacity = needed;
            self.len = data.len();
            return;
        }

        if needed > self.capacity {
            // 2x growth, minimum 1KB
            let new_capacity = (needed * 2).max(self.capacity + 1024);
            self.buffer =
                Some(device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(&self.label),
                    size: new_capacity as u64,
                    usage: wgpu::BufferUsages::VERTEX
                        | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                }));
            self.capacity = new_capacity;
        }

        if needed > 0 {
            if let Some(buffer) = &self.buffer {
                queue.write_buffer(buffer, 0, data_bytes);
            }
        }
        self.len = data.len();
    }

    /// The underlying GPU buffer, if any data has been assigned yet.
    #[must_use]
    pub const fn buffer(&self) -> Option<&wgpu::Buffer> {
        self.buffer.as_ref()
    }

    /// Number of floats currently stored.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether no data has been assigned yet.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current capacity in bytes.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}
