//! The presentation dispatcher: one frame per loop iteration.

use ash::vk;
use presto_gpu::{FrameBackend, GpuError, LayoutTransition, Swapchain};
use tracing::trace_span;

use crate::frame::{FrameContext, FrameSet};
use crate::guard::SubmissionGuard;
use crate::overlay::Overlay;
use crate::window::CloseSignal;

/// Drives the wait, acquire, record, composite, submit and present cycle over
/// a fixed swapchain.
///
/// Frame slots are created one per swapchain image and used round-robin.
/// Dropping a `Presenter` leaks its GPU objects; release them with
/// [`Presenter::destroy`].
pub struct Presenter<B: FrameBackend> {
    backend: B,
    swapchain: Swapchain,
    frames: FrameSet,
    current_frame_index: usize,
    frames_presented: u64,
    overlay: Option<Box<dyn Overlay>>,
    overlay_pool: vk::DescriptorPool,
    suboptimal_reported: bool,
}

impl<B: FrameBackend> Presenter<B> {
    /// Allocate one frame slot per swapchain image.
    ///
    /// Takes ownership of `swapchain` (including its views) and of
    /// `overlay_pool`, which may be null.
    ///
    /// # Safety
    /// The swapchain, its views and the pool must belong to the backend's
    /// device, and `queue_family` must be the family of the backend's queue.
    pub unsafe fn new(
        backend: B,
        swapchain: Swapchain,
        queue_family: u32,
        overlay_pool: vk::DescriptorPool,
    ) -> anyhow::Result<Self> {
        if swapchain.image_count() == 0 {
            return Err(GpuError::SwapchainCreationFailed("swapchain has no images".into()).into());
        }

        // SAFETY: caller guarantees the queue family matches the backend
        let frames = unsafe { FrameSet::new(&backend, swapchain.image_count(), queue_family)? };
        tracing::debug!(frame_count = frames.len(), "Frame set ready");

        Ok(Self {
            backend,
            swapchain,
            frames,
            current_frame_index: 0,
            frames_presented: 0,
            overlay: None,
            overlay_pool,
            suboptimal_reported: false,
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn swapchain(&self) -> &Swapchain {
        &self.swapchain
    }

    pub fn frames(&self) -> &FrameSet {
        &self.frames
    }

    /// Number of frame slots. Equal to the swapchain image count.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Slot the next frame will be recorded into.
    pub fn current_frame_index(&self) -> usize {
        self.current_frame_index
    }

    /// Frames successfully handed to the presentation engine so far.
    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    pub fn overlay_pool(&self) -> vk::DescriptorPool {
        self.overlay_pool
    }

    /// Install the overlay composited over every frame, returning the
    /// previous one.
    pub fn attach_overlay(&mut self, overlay: Box<dyn Overlay>) -> Option<Box<dyn Overlay>> {
        self.overlay.replace(overlay)
    }

    /// Render frames until `signal` reports a close request.
    ///
    /// The signal is polled once before each frame, never mid-frame. Any
    /// error from the device, the overlay or `render` ends the loop.
    pub fn run<S, F>(
        &mut self,
        signal: &mut S,
        guard: &SubmissionGuard,
        mut render: F,
    ) -> anyhow::Result<()>
    where
        S: CloseSignal + ?Sized,
        F: FnMut(&FrameContext) -> anyhow::Result<()>,
    {
        while !signal.close_requested() {
            self.render_frame(guard, &mut render)?;
        }
        Ok(())
    }

    /// Record, submit and present one frame.
    ///
    /// `render` receives the frame with its command buffer recording and the
    /// acquired image in `PRESENT_SRC_KHR` layout, and must leave it in that
    /// layout.
    pub fn render_frame<F>(&mut self, guard: &SubmissionGuard, render: &mut F) -> anyhow::Result<()>
    where
        F: FnMut(&FrameContext) -> anyhow::Result<()>,
    {
        let frame_index = self.current_frame_index;
        let slot = *self.frames.slot(frame_index);
        let backend = &self.backend;
        let cmd = slot.command_buffer;

        // Bound the CPU to `frame_count` frames ahead of the GPU
        {
            let _span = trace_span!("frame.wait_slot", frame_index).entered();
            unsafe {
                backend.wait_for_fence(slot.in_flight, u64::MAX)?;
                backend.reset_fence(slot.in_flight)?;
            }
        }

        let image_index = {
            let _span = trace_span!("frame.acquire", frame_index).entered();
            let (image_index, suboptimal) = unsafe {
                backend.acquire_next_image(self.swapchain.swapchain, slot.image_available, u64::MAX)?
            };
            if suboptimal {
                report_suboptimal(&mut self.suboptimal_reported, "acquire");
            }
            image_index
        };

        let (Some(&image), Some(&image_view)) = (
            self.swapchain.images.get(image_index as usize),
            self.swapchain.image_views.get(image_index as usize),
        ) else {
            anyhow::bail!(
                "acquired image index {image_index} out of range ({} images)",
                self.swapchain.image_count()
            );
        };

        let frame = FrameContext {
            frame_index,
            image_index,
            command_buffer: cmd,
            image,
            image_view,
            extent: self.swapchain.extent,
            format: self.swapchain.format,
        };

        {
            let _span = trace_span!("frame.record", frame_index, image_index).entered();
            unsafe {
                backend.reset_command_pool(slot.command_pool)?;
                backend.begin_command_buffer(cmd)?;
            }
            if let Some(overlay) = self.overlay.as_mut() {
                overlay.on_frame_begin()?;
            }
            render(&frame)?;
        }

        {
            let _span = trace_span!("frame.composite", frame_index, image_index).entered();
            unsafe {
                backend.cmd_transition(cmd, image, LayoutTransition::PresentToColorTarget);
                backend.cmd_begin_rendering(cmd, image_view, frame.extent);
            }
            {
                // The overlay may submit uploads to the same queue
                let _queue = guard.lock();
                if let Some(overlay) = self.overlay.as_mut() {
                    overlay.on_frame_composite(&frame)?;
                }
            }
            unsafe {
                backend.cmd_end_rendering(cmd);
                backend.cmd_transition(cmd, image, LayoutTransition::ColorTargetToPresent);
            }
        }

        {
            let _span = trace_span!("frame.submit", frame_index).entered();
            unsafe { backend.end_command_buffer(cmd)? };
            let _queue = guard.lock();
            unsafe {
                backend.submit(
                    cmd,
                    slot.image_available,
                    vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT,
                    slot.render_complete,
                    slot.in_flight,
                )?;
            }
        }

        {
            let _span = trace_span!("frame.present", frame_index, image_index).entered();
            let _queue = guard.lock();
            let suboptimal = unsafe {
                backend.present(self.swapchain.swapchain, image_index, slot.render_complete)?
            };
            if suboptimal {
                report_suboptimal(&mut self.suboptimal_reported, "present");
            }
        }

        self.current_frame_index = (frame_index + 1) % self.frames.len();
        self.frames_presented += 1;
        Ok(())
    }

    /// Release everything the presenter owns, in dependency order: wait for
    /// the device to go idle, destroy the image views, the frame slots, the
    /// overlay and its descriptor pool, then the swapchain.
    ///
    /// Consuming `self` guarantees the loop cannot run afterwards.
    pub fn destroy(self) {
        let Self {
            backend,
            swapchain,
            mut frames,
            overlay,
            overlay_pool,
            ..
        } = self;

        unsafe {
            if let Err(e) = backend.wait_idle() {
                tracing::error!("Failed to wait idle: {e}");
            }

            for &view in &swapchain.image_views {
                backend.destroy_image_view(view);
            }

            frames.destroy(&backend);

            drop(overlay);
            if overlay_pool != vk::DescriptorPool::null() {
                backend.destroy_descriptor_pool(overlay_pool);
            }

            backend.destroy_swapchain(swapchain.swapchain);
        }

        tracing::debug!("Presentation resources destroyed");
    }
}

fn report_suboptimal(reported: &mut bool, during: &str) {
    if !*reported {
        tracing::warn!(during, "Swapchain is suboptimal for the surface; continuing");
        *reported = true;
    }
}
