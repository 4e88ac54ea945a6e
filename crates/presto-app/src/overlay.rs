//! Overlay renderer integration.
//!
//! An overlay (typically an immediate-mode UI) draws on top of whatever the
//! render callback produced. The engine does not own one; the application
//! attaches it after reading the [`OverlayInfo`] it needs for its own setup.

use ash::vk;

use crate::frame::FrameContext;

/// A renderer composited over every frame.
///
/// Dropping the overlay must release its GPU-side state. The engine drops it
/// during teardown after the device has gone idle and before the swapchain
/// is destroyed.
pub trait Overlay {
    /// Called once per frame before the render callback, with the frame's
    /// command buffer already recording.
    fn on_frame_begin(&mut self) -> anyhow::Result<()>;

    /// Record draw commands into `frame.command_buffer`.
    ///
    /// Runs inside a dynamic rendering pass over the acquired image (color
    /// attachment layout, existing contents loaded) while the shared
    /// submission guard is held, so the overlay may submit its own work to
    /// the selected queue.
    fn on_frame_composite(&mut self, frame: &FrameContext) -> anyhow::Result<()>;
}

/// Device and frame-format identifiers supplied to an overlay at setup.
#[derive(Clone, Copy)]
pub struct OverlayInfo<'a> {
    pub instance: &'a ash::Instance,
    pub physical_device: vk::PhysicalDevice,
    pub device: &'a ash::Device,
    pub queue_family: u32,
    pub queue: vk::Queue,
    /// Format of the swap images the overlay renders into.
    pub format: vk::Format,
    pub image_count: u32,
    /// Pool sized for the configured number of overlay textures.
    pub descriptor_pool: vk::DescriptorPool,
}
