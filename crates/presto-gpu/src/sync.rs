//! Synchronization primitives.

use crate::error::Result;
use crate::swapchain::color_subresource_range;
use ash::vk;

/// Create a semaphore.
///
/// # Safety
/// The device must be valid.
pub unsafe fn create_semaphore(device: &ash::Device) -> Result<vk::Semaphore> {
    let create_info = vk::SemaphoreCreateInfo::default();
    let semaphore = device.create_semaphore(&create_info, None)?;
    Ok(semaphore)
}

/// Create a fence.
///
/// # Safety
/// The device must be valid.
pub unsafe fn create_fence(device: &ash::Device, signaled: bool) -> Result<vk::Fence> {
    let flags = if signaled {
        vk::FenceCreateFlags::SIGNALED
    } else {
        vk::FenceCreateFlags::empty()
    };

    let create_info = vk::FenceCreateInfo::default().flags(flags);
    let fence = device.create_fence(&create_info, None)?;
    Ok(fence)
}

/// Wait for a fence to be signaled.
///
/// # Safety
/// The device and fence must be valid.
pub unsafe fn wait_for_fence(device: &ash::Device, fence: vk::Fence, timeout_ns: u64) -> Result<()> {
    device.wait_for_fences(&[fence], true, timeout_ns)?;
    Ok(())
}

/// Reset a fence to unsignaled state.
///
/// # Safety
/// The device and fence must be valid.
pub unsafe fn reset_fence(device: &ash::Device, fence: vk::Fence) -> Result<()> {
    device.reset_fences(&[fence])?;
    Ok(())
}

/// The two layout changes the presenter records around the overlay pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutTransition {
    /// `PRESENT_SRC_KHR` to `COLOR_ATTACHMENT_OPTIMAL`, keeping contents.
    PresentToColorTarget,
    /// `COLOR_ATTACHMENT_OPTIMAL` back to `PRESENT_SRC_KHR`.
    ColorTargetToPresent,
}

impl LayoutTransition {
    /// `(old, new)` layouts.
    pub fn layouts(self) -> (vk::ImageLayout, vk::ImageLayout) {
        match self {
            Self::PresentToColorTarget => (
                vk::ImageLayout::PRESENT_SRC_KHR,
                vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            ),
            Self::ColorTargetToPresent => (
                vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
                vk::ImageLayout::PRESENT_SRC_KHR,
            ),
        }
    }

    /// Synchronization2 barrier for the whole color subresource of `image`.
    pub fn barrier(self, image: vk::Image) -> vk::ImageMemoryBarrier2<'static> {
        let (old_layout, new_layout) = self.layouts();
        let barrier = vk::ImageMemoryBarrier2::default()
            .image(image)
            .old_layout(old_layout)
            .new_layout(new_layout)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .subresource_range(color_subresource_range());

        match self {
            // Orders after whatever the render callback recorded, and after
            // the acquire semaphore wait
            Self::PresentToColorTarget => barrier
                .src_stage_mask(vk::PipelineStageFlags2::ALL_COMMANDS)
                .src_access_mask(vk::AccessFlags2::MEMORY_WRITE)
                .dst_stage_mask(vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT)
                .dst_access_mask(
                    vk::AccessFlags2::COLOR_ATTACHMENT_READ
                        | vk::AccessFlags2::COLOR_ATTACHMENT_WRITE,
                ),
            Self::ColorTargetToPresent => barrier
                .src_stage_mask(vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT)
                .src_access_mask(vk::AccessFlags2::COLOR_ATTACHMENT_WRITE)
                .dst_stage_mask(vk::PipelineStageFlags2::BOTTOM_OF_PIPE)
                .dst_access_mask(vk::AccessFlags2::NONE),
        }
    }
}

/// Record a single layout transition.
///
/// # Safety
/// The command buffer must be recording and `image` must be valid.
pub unsafe fn cmd_transition(
    device: &ash::Device,
    cmd: vk::CommandBuffer,
    image: vk::Image,
    transition: LayoutTransition,
) {
    let barriers = [transition.barrier(image)];
    let dependency = vk::DependencyInfo::default().image_memory_barriers(&barriers);
    device.cmd_pipeline_barrier2(cmd, &dependency);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ash::vk::Handle;

    #[test]
    fn transitions_are_inverse() {
        let (a_old, a_new) = LayoutTransition::PresentToColorTarget.layouts();
        let (b_old, b_new) = LayoutTransition::ColorTargetToPresent.layouts();
        assert_eq!(a_old, b_new);
        assert_eq!(a_new, b_old);
        assert_eq!(a_old, vk::ImageLayout::PRESENT_SRC_KHR);
    }

    #[test]
    fn to_color_target_waits_on_prior_writes() {
        let image = vk::Image::from_raw(0xabc);
        let barrier = LayoutTransition::PresentToColorTarget.barrier(image);

        assert_eq!(barrier.image, image);
        assert_eq!(barrier.old_layout, vk::ImageLayout::PRESENT_SRC_KHR);
        assert_eq!(barrier.new_layout, vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);
        assert_eq!(barrier.src_stage_mask, vk::PipelineStageFlags2::ALL_COMMANDS);
        assert_eq!(barrier.src_access_mask, vk::AccessFlags2::MEMORY_WRITE);
        assert_eq!(
            barrier.dst_stage_mask,
            vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT
        );
        assert!(barrier
            .dst_access_mask
            .contains(vk::AccessFlags2::COLOR_ATTACHMENT_WRITE));
        assert_eq!(barrier.subresource_range.layer_count, 1);
    }

    #[test]
    fn to_present_flushes_color_writes() {
        let barrier = LayoutTransition::ColorTargetToPresent.barrier(vk::Image::null());
        assert_eq!(barrier.new_layout, vk::ImageLayout::PRESENT_SRC_KHR);
        assert_eq!(barrier.src_access_mask, vk::AccessFlags2::COLOR_ATTACHMENT_WRITE);
        assert_eq!(barrier.dst_stage_mask, vk::PipelineStageFlags2::BOTTOM_OF_PIPE);
    }
}
