//! Frame slots and the per-frame context handed to the render callback.

use ash::vk;
use presto_gpu::{FrameBackend, GpuError, Result};

/// Context for the frame being recorded.
///
/// `frame_index` selects the frame slot; `image_index` is whatever the
/// swapchain handed out. The two are unrelated even when the slot count
/// equals the image count.
#[derive(Debug, Clone, Copy)]
pub struct FrameContext {
    /// Frame slot being recorded, in `0..frame_count`.
    pub frame_index: usize,
    /// Index of the acquired swapchain image.
    pub image_index: u32,
    /// Command buffer for this frame slot, already recording.
    pub command_buffer: vk::CommandBuffer,
    /// The acquired swapchain image, in `PRESENT_SRC_KHR` layout on entry.
    pub image: vk::Image,
    /// Color view of the acquired image.
    pub image_view: vk::ImageView,
    pub extent: vk::Extent2D,
    pub format: vk::Format,
}

/// Recording and synchronization resources owned by one frame slot.
#[derive(Debug, Clone, Copy)]
pub struct FrameSlot {
    /// Pool owning exactly one command buffer, reset wholesale each frame.
    pub command_pool: vk::CommandPool,
    pub command_buffer: vk::CommandBuffer,
    /// Signaled by acquire, waited on by submit.
    pub image_available: vk::Semaphore,
    /// Signaled by submit, waited on by present.
    pub render_complete: vk::Semaphore,
    /// Signaled when this slot's last submission finished. Created signaled.
    pub in_flight: vk::Fence,
}

/// One [`FrameSlot`] per swapchain image, reused round-robin.
#[derive(Debug, Default)]
pub struct FrameSet {
    slots: Vec<FrameSlot>,
}

impl FrameSet {
    /// Allocate `count` frame slots on `queue_family`.
    ///
    /// Any failure is reported as [`GpuError::ResourceAllocationFailed`].
    /// Slots created before the failure are not released.
    ///
    /// # Safety
    /// `queue_family` must be a queue family of the backend's device.
    pub unsafe fn new<B: FrameBackend>(backend: &B, count: usize, queue_family: u32) -> Result<Self> {
        let mut slots = Vec::with_capacity(count);

        for index in 0..count {
            // SAFETY: caller guarantees `queue_family` belongs to the device
            let slot = unsafe {
                let command_pool = backend
                    .create_command_pool(queue_family)
                    .map_err(GpuError::allocation("command pool"))?;
                FrameSlot {
                    command_pool,
                    command_buffer: backend
                        .allocate_command_buffer(command_pool)
                        .map_err(GpuError::allocation("command buffer"))?,
                    image_available: backend
                        .create_semaphore()
                        .map_err(GpuError::allocation("image-available semaphore"))?,
                    render_complete: backend
                        .create_semaphore()
                        .map_err(GpuError::allocation("render-complete semaphore"))?,
                    in_flight: backend
                        .create_fence(true)
                        .map_err(GpuError::allocation("in-flight fence"))?,
                }
            };

            slots.push(slot);
            tracing::debug!(index, queue_family, "Frame slot created");
        }

        Ok(Self { slots })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot `index`. Panics if out of range.
    pub fn slot(&self, index: usize) -> &FrameSlot {
        &self.slots[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = &FrameSlot> {
        self.slots.iter()
    }

    /// Destroy every slot: its command pool (and with it the command
    /// buffer), both semaphores and the fence.
    ///
    /// # Safety
    /// The device must be idle.
    pub unsafe fn destroy<B: FrameBackend>(&mut self, backend: &B) {
        for slot in self.slots.drain(..) {
            // SAFETY: caller guarantees the device is idle
            unsafe {
                backend.destroy_command_pool(slot.command_pool);
                backend.destroy_semaphore(slot.image_available);
                backend.destroy_semaphore(slot.render_complete);
                backend.destroy_fence(slot.in_flight);
            }
        }
    }
}
