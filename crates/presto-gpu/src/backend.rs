//! The device operations a frame loop needs.
//!
//! [`FrameBackend`] is the seam between the presentation state machine and
//! the driver. [`VulkanBackend`] forwards to `ash`; tests substitute a
//! recording implementation.

use crate::command;
use crate::error::Result;
use crate::swapchain::{map_acquire_result, map_present_result};
use crate::sync::{self, LayoutTransition};
use ash::vk;

/// Per-frame GPU operations against a single device and queue.
///
/// # Safety
/// Every method is `unsafe`: handles passed in must have been created through
/// the same backend and must not have been destroyed. Destruction methods
/// additionally require that the GPU no longer uses the object.
pub trait FrameBackend {
    // Frame synchronization set
    unsafe fn create_command_pool(&self, queue_family: u32) -> Result<vk::CommandPool>;
    unsafe fn allocate_command_buffer(&self, pool: vk::CommandPool) -> Result<vk::CommandBuffer>;
    unsafe fn create_semaphore(&self) -> Result<vk::Semaphore>;
    unsafe fn create_fence(&self, signaled: bool) -> Result<vk::Fence>;
    unsafe fn fence_signaled(&self, fence: vk::Fence) -> Result<bool>;

    // Steady-state loop
    unsafe fn wait_for_fence(&self, fence: vk::Fence, timeout_ns: u64) -> Result<()>;
    unsafe fn reset_fence(&self, fence: vk::Fence) -> Result<()>;

    /// Returns `(image_index, suboptimal)`.
    unsafe fn acquire_next_image(
        &self,
        swapchain: vk::SwapchainKHR,
        signal: vk::Semaphore,
        timeout_ns: u64,
    ) -> Result<(u32, bool)>;

    unsafe fn reset_command_pool(&self, pool: vk::CommandPool) -> Result<()>;
    unsafe fn begin_command_buffer(&self, cmd: vk::CommandBuffer) -> Result<()>;
    unsafe fn end_command_buffer(&self, cmd: vk::CommandBuffer) -> Result<()>;
    unsafe fn cmd_transition(
        &self,
        cmd: vk::CommandBuffer,
        image: vk::Image,
        transition: LayoutTransition,
    );
    unsafe fn cmd_begin_rendering(
        &self,
        cmd: vk::CommandBuffer,
        view: vk::ImageView,
        extent: vk::Extent2D,
    );
    unsafe fn cmd_end_rendering(&self, cmd: vk::CommandBuffer);

    unsafe fn submit(
        &self,
        cmd: vk::CommandBuffer,
        wait: vk::Semaphore,
        wait_stage: vk::PipelineStageFlags2,
        signal: vk::Semaphore,
        fence: vk::Fence,
    ) -> Result<()>;

    /// Returns whether the swapchain was reported suboptimal.
    unsafe fn present(
        &self,
        swapchain: vk::SwapchainKHR,
        image_index: u32,
        wait: vk::Semaphore,
    ) -> Result<bool>;

    unsafe fn wait_idle(&self) -> Result<()>;

    // Teardown
    unsafe fn destroy_image_view(&self, view: vk::ImageView);
    unsafe fn destroy_command_pool(&self, pool: vk::CommandPool);
    unsafe fn destroy_semaphore(&self, semaphore: vk::Semaphore);
    unsafe fn destroy_fence(&self, fence: vk::Fence);
    unsafe fn destroy_descriptor_pool(&self, pool: vk::DescriptorPool);
    unsafe fn destroy_swapchain(&self, swapchain: vk::SwapchainKHR);
}

/// [`FrameBackend`] over a real device and its selected queue.
pub struct VulkanBackend {
    device: ash::Device,
    swapchain_loader: ash::khr::swapchain::Device,
    queue: vk::Queue,
}

impl VulkanBackend {
    /// Wrap a device, the swapchain loader built for it and the queue used
    /// for both submission and presentation.
    pub fn new(
        device: ash::Device,
        swapchain_loader: ash::khr::swapchain::Device,
        queue: vk::Queue,
    ) -> Self {
        Self {
            device,
            swapchain_loader,
            queue,
        }
    }

    /// The wrapped device.
    pub fn device(&self) -> &ash::Device {
        &self.device
    }

    /// The queue submissions and presents go to.
    pub fn queue(&self) -> vk::Queue {
        self.queue
    }
}

impl FrameBackend for VulkanBackend {
    unsafe fn create_command_pool(&self, queue_family: u32) -> Result<vk::CommandPool> {
        command::create_command_pool(&self.device, queue_family)
    }

    unsafe fn allocate_command_buffer(&self, pool: vk::CommandPool) -> Result<vk::CommandBuffer> {
        command::allocate_command_buffer(&self.device, pool)
    }

    unsafe fn create_semaphore(&self) -> Result<vk::Semaphore> {
        sync::create_semaphore(&self.device)
    }

    unsafe fn create_fence(&self, signaled: bool) -> Result<vk::Fence> {
        sync::create_fence(&self.device, signaled)
    }

    unsafe fn fence_signaled(&self, fence: vk::Fence) -> Result<bool> {
        Ok(self.device.get_fence_status(fence)?)
    }

    unsafe fn wait_for_fence(&self, fence: vk::Fence, timeout_ns: u64) -> Result<()> {
        sync::wait_for_fence(&self.device, fence, timeout_ns)
    }

    unsafe fn reset_fence(&self, fence: vk::Fence) -> Result<()> {
        sync::reset_fence(&self.device, fence)
    }

    unsafe fn acquire_next_image(
        &self,
        swapchain: vk::SwapchainKHR,
        signal: vk::Semaphore,
        timeout_ns: u64,
    ) -> Result<(u32, bool)> {
        map_acquire_result(self.swapchain_loader.acquire_next_image(
            swapchain,
            timeout_ns,
            signal,
            vk::Fence::null(),
        ))
    }

    unsafe fn reset_command_pool(&self, pool: vk::CommandPool) -> Result<()> {
        self.device
            .reset_command_pool(pool, vk::CommandPoolResetFlags::empty())?;
        Ok(())
    }

    unsafe fn begin_command_buffer(&self, cmd: vk::CommandBuffer) -> Result<()> {
        command::begin_command_buffer(&self.device, cmd)
    }

    unsafe fn end_command_buffer(&self, cmd: vk::CommandBuffer) -> Result<()> {
        command::end_command_buffer(&self.device, cmd)
    }

    unsafe fn cmd_transition(
        &self,
        cmd: vk::CommandBuffer,
        image: vk::Image,
        transition: LayoutTransition,
    ) {
        sync::cmd_transition(&self.device, cmd, image, transition);
    }

    unsafe fn cmd_begin_rendering(
        &self,
        cmd: vk::CommandBuffer,
        view: vk::ImageView,
        extent: vk::Extent2D,
    ) {
        command::begin_rendering(&self.device, cmd, view, extent);
    }

    unsafe fn cmd_end_rendering(&self, cmd: vk::CommandBuffer) {
        self.device.cmd_end_rendering(cmd);
    }

    unsafe fn submit(
        &self,
        cmd: vk::CommandBuffer,
        wait: vk::Semaphore,
        wait_stage: vk::PipelineStageFlags2,
        signal: vk::Semaphore,
        fence: vk::Fence,
    ) -> Result<()> {
        command::submit_command_buffer(
            &self.device,
            self.queue,
            cmd,
            wait,
            wait_stage,
            signal,
            fence,
        )
    }

    unsafe fn present(
        &self,
        swapchain: vk::SwapchainKHR,
        image_index: u32,
        wait: vk::Semaphore,
    ) -> Result<bool> {
        let wait_semaphores = [wait];
        let swapchains = [swapchain];
        let image_indices = [image_index];

        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        map_present_result(self.swapchain_loader.queue_present(self.queue, &present_info))
    }

    unsafe fn wait_idle(&self) -> Result<()> {
        self.device.device_wait_idle()?;
        Ok(())
    }

    unsafe fn destroy_image_view(&self, view: vk::ImageView) {
        self.device.destroy_image_view(view, None);
    }

    unsafe fn destroy_command_pool(&self, pool: vk::CommandPool) {
        self.device.destroy_command_pool(pool, None);
    }

    unsafe fn destroy_semaphore(&self, semaphore: vk::Semaphore) {
        self.device.destroy_semaphore(semaphore, None);
    }

    unsafe fn destroy_fence(&self, fence: vk::Fence) {
        self.device.destroy_fence(fence, None);
    }

    unsafe fn destroy_descriptor_pool(&self, pool: vk::DescriptorPool) {
        self.device.destroy_descriptor_pool(pool, None);
    }

    unsafe fn destroy_swapchain(&self, swapchain: vk::SwapchainKHR) {
        self.swapchain_loader.destroy_swapchain(swapchain, None);
    }
}
