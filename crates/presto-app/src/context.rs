//! The graphics context aggregate.

use std::time::Instant;

use ash::vk;
use presto_gpu::{
    create_overlay_descriptor_pool, GpuContext, GpuContextBuilder, SurfaceContext, VulkanBackend,
};
use raw_window_handle::HasDisplayHandle;
use tracing::info;

use crate::config::Params;
use crate::frame::FrameContext;
use crate::guard::SubmissionGuard;
use crate::overlay::{Overlay, OverlayInfo};
use crate::presenter::Presenter;
use crate::window::AppWindow;

/// Everything needed to put frames on screen: window, device, surface,
/// swapchain, frame slots and the dispatcher driving them.
///
/// Created once, used for any number of [`dispatch`](Self::dispatch) calls,
/// then released with [`destroy`](Self::destroy). Dropping the context
/// without calling `destroy` leaks every GPU object it owns, device and
/// instance included.
pub struct GraphicsContext {
    presenter: Presenter<VulkanBackend>,
    surface: SurfaceContext,
    gpu: GpuContext,
    window: AppWindow,
    params: Params,
}

impl GraphicsContext {
    /// Open the window, select a device and build the swapchain and frame
    /// slots.
    ///
    /// Objects created before a failure are not rolled back; they are leaked
    /// as they are, with no parent destroyed ahead of its children.
    pub fn create(params: Params) -> anyhow::Result<Self> {
        info!("{} starting...", params.title);

        let window = AppWindow::new(&params.title, params.width, params.height)?;
        let display = window.display_handle()?.as_raw();

        let gpu = GpuContextBuilder::new()
            .app_name(&params.title)
            .validation(params.validation)
            .device_hint(params.device_hint.clone())
            .device_extensions(params.device_extensions.clone())
            .queue_family_policy(params.queue_family_policy)
            .build(display)?;

        // SAFETY: the window outlives the surface; teardown destroys the
        // surface before dropping the window
        let surface = unsafe { SurfaceContext::from_window(&gpu, &window)? };

        let (width, height) = window.inner_size();
        // SAFETY: the GPU context is valid
        let (swapchain, _) = unsafe {
            surface.create_swapchain(&gpu, params.format_policy, width.max(1), height.max(1))?
        };

        // SAFETY: the device is valid
        let overlay_pool =
            unsafe { create_overlay_descriptor_pool(gpu.device(), params.max_overlay_images)? };

        let backend = VulkanBackend::new(
            gpu.device().clone(),
            surface.swapchain_loader.clone(),
            gpu.selected_queue(),
        );
        // SAFETY: swapchain, pool and queue all come from `gpu`
        let presenter = unsafe {
            Presenter::new(backend, swapchain, gpu.selected_queue_family(), overlay_pool)?
        };

        info!(frame_count = presenter.frame_count(), "Graphics context ready");

        Ok(Self {
            presenter,
            surface,
            gpu,
            window,
            params,
        })
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn window(&self) -> &AppWindow {
        &self.window
    }

    pub fn gpu(&self) -> &GpuContext {
        &self.gpu
    }

    pub fn surface(&self) -> &SurfaceContext {
        &self.surface
    }

    /// Number of frame slots, equal to the number of swap images.
    pub fn frame_count(&self) -> usize {
        self.presenter.frame_count()
    }

    pub fn current_frame_index(&self) -> usize {
        self.presenter.current_frame_index()
    }

    pub fn frames_presented(&self) -> u64 {
        self.presenter.frames_presented()
    }

    pub fn extent(&self) -> vk::Extent2D {
        self.presenter.swapchain().extent
    }

    pub fn format(&self) -> vk::Format {
        self.presenter.swapchain().format
    }

    /// Identifiers an overlay renderer needs for its own setup.
    pub fn overlay_info(&self) -> OverlayInfo<'_> {
        OverlayInfo {
            instance: self.gpu.instance(),
            physical_device: self.gpu.physical_device(),
            device: self.gpu.device(),
            queue_family: self.gpu.selected_queue_family(),
            queue: self.gpu.selected_queue(),
            format: self.format(),
            image_count: self.frame_count() as u32,
            descriptor_pool: self.presenter.overlay_pool(),
        }
    }

    /// Composite `overlay` over every subsequent frame.
    pub fn attach_overlay(&mut self, overlay: Box<dyn Overlay>) {
        if self.presenter.attach_overlay(overlay).is_some() {
            tracing::debug!("Replaced previously attached overlay");
        }
    }

    /// Run the frame loop until the window is asked to close.
    ///
    /// `render` records into each frame's command buffer. When `guard` is
    /// `None` the selected queue is assumed to be used from this thread only.
    pub fn dispatch<F>(&mut self, guard: Option<&SubmissionGuard>, render: F) -> anyhow::Result<()>
    where
        F: FnMut(&FrameContext) -> anyhow::Result<()>,
    {
        let guard = guard.cloned().unwrap_or_default();
        let presented_before = self.presenter.frames_presented();
        let started = Instant::now();

        info!(
            frame_count = self.presenter.frame_count(),
            shared_guard = guard.is_shared(),
            "Entering frame loop"
        );

        let result = self.presenter.run(&mut self.window, &guard, render);

        let frames = self.presenter.frames_presented() - presented_before;
        if frames > 0 {
            let mean_ms = started.elapsed().as_secs_f64() * 1000.0 / frames as f64;
            info!(frames, "Frame loop finished ({mean_ms:.2} ms/frame)");
        } else {
            info!("Frame loop finished without presenting");
        }

        result
    }

    /// Tear everything down in dependency order.
    ///
    /// Waits for the device to go idle, releases views, frame slots, the
    /// overlay and its descriptor pool, the swapchain, the surface, the
    /// allocator, the device and the instance, and finally closes the window.
    pub fn destroy(self) {
        info!("Starting cleanup...");

        let Self {
            presenter,
            surface,
            gpu,
            window,
            ..
        } = self;

        presenter.destroy();

        // SAFETY: the swapchain is gone and the device is idle
        unsafe { surface.destroy() };

        // SAFETY: swapchain, frame objects, pool and surface are gone
        unsafe { gpu.destroy() };
        drop(window);

        info!("Cleanup complete");
    }
}
