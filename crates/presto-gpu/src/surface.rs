//! Surface management for windowed rendering.
//!
//! Hides the raw-window-handle plumbing needed to get a `VkSurfaceKHR` and
//! the extension loaders that go with it.

use crate::context::GpuContext;
use crate::error::{GpuError, Result};
use crate::swapchain::{FormatPolicy, Swapchain, SwapchainPlan};
use ash::vk;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

/// Surface context for windowed rendering.
pub struct SurfaceContext {
    /// The Vulkan surface handle.
    pub surface: vk::SurfaceKHR,
    /// Surface extension loader.
    pub surface_loader: ash::khr::surface::Instance,
    /// Swapchain extension loader.
    pub swapchain_loader: ash::khr::swapchain::Device,
}

impl SurfaceContext {
    /// Create a new surface context from a window.
    ///
    /// # Safety
    /// The GPU context must be valid and the window must outlive the surface.
    pub unsafe fn from_window<W>(gpu: &GpuContext, window: &W) -> Result<Self>
    where
        W: HasDisplayHandle + HasWindowHandle,
    {
        let display = window
            .display_handle()
            .map_err(|e| GpuError::SurfaceCreation(format!("Failed to get display handle: {e}")))?;
        let window_handle = window
            .window_handle()
            .map_err(|e| GpuError::SurfaceCreation(format!("Failed to get window handle: {e}")))?;

        let surface = ash_window::create_surface(
            gpu.entry(),
            gpu.instance(),
            display.as_raw(),
            window_handle.as_raw(),
            None,
        )
        .map_err(|e| GpuError::SurfaceCreation(e.to_string()))?;

        let surface_loader = ash::khr::surface::Instance::new(gpu.entry(), gpu.instance());
        let swapchain_loader = ash::khr::swapchain::Device::new(gpu.instance(), gpu.device());

        let presentable = surface_loader.get_physical_device_surface_support(
            gpu.physical_device(),
            gpu.selected_queue_family(),
            surface,
        )?;
        if !presentable {
            tracing::warn!(
                queue_family = gpu.selected_queue_family(),
                "Selected queue family reports no present support for this surface"
            );
        }

        Ok(Self {
            surface,
            surface_loader,
            swapchain_loader,
        })
    }

    /// Query surface capabilities.
    pub fn capabilities(&self, gpu: &GpuContext) -> Result<SurfaceCapabilities> {
        unsafe {
            let caps = self
                .surface_loader
                .get_physical_device_surface_capabilities(gpu.physical_device(), self.surface)?;

            let formats = self
                .surface_loader
                .get_physical_device_surface_formats(gpu.physical_device(), self.surface)?;

            let present_modes = self
                .surface_loader
                .get_physical_device_surface_present_modes(gpu.physical_device(), self.surface)?;

            Ok(SurfaceCapabilities {
                capabilities: caps,
                formats,
                present_modes,
            })
        }
    }

    /// Negotiate and create the swapchain for this surface.
    ///
    /// The capabilities are captured once here and never re-queried.
    ///
    /// # Safety
    /// The GPU context must be valid.
    pub unsafe fn create_swapchain(
        &self,
        gpu: &GpuContext,
        policy: FormatPolicy,
        width: u32,
        height: u32,
    ) -> Result<(Swapchain, SurfaceCapabilities)> {
        let caps = self.capabilities(gpu)?;
        let plan = SwapchainPlan::negotiate(&caps, policy, width, height)?;

        let swapchain = Swapchain::new(
            gpu.device(),
            &self.swapchain_loader,
            self.surface,
            &plan,
            gpu.selected_queue_family(),
        )?;

        Ok((swapchain, caps))
    }

    /// Destroy the surface.
    ///
    /// # Safety
    /// The swapchain built on this surface must already be destroyed.
    pub unsafe fn destroy(&self) {
        self.surface_loader.destroy_surface(self.surface, None);
        tracing::debug!("Surface destroyed");
    }
}

/// Surface capabilities query result.
#[derive(Debug, Clone)]
pub struct SurfaceCapabilities {
    /// Raw surface capabilities.
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    /// Supported surface formats.
    pub formats: Vec<vk::SurfaceFormatKHR>,
    /// Supported present modes.
    pub present_modes: Vec<vk::PresentModeKHR>,
}
