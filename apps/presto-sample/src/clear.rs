//! Solid-color clear recorded inside the frame callback.

use ash::vk;
use presto_app::FrameContext;
use presto_gpu::swapchain::color_subresource_range;

/// Clears the acquired image and hands it back in `PRESENT_SRC_KHR` layout.
pub struct SolidClear {
    device: ash::Device,
    color: vk::ClearColorValue,
}

impl SolidClear {
    pub fn new(device: ash::Device, rgba: [f32; 4]) -> Self {
        Self {
            device,
            color: vk::ClearColorValue { float32: rgba },
        }
    }

    pub fn record(&self, frame: &FrameContext) {
        let [to_transfer, to_present] = clear_barriers(frame.image);
        let cmd = frame.command_buffer;

        unsafe {
            self.device.cmd_pipeline_barrier2(
                cmd,
                &vk::DependencyInfo::default()
                    .image_memory_barriers(std::slice::from_ref(&to_transfer)),
            );

            self.device.cmd_clear_color_image(
                cmd,
                frame.image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &self.color,
                &[color_subresource_range()],
            );

            self.device.cmd_pipeline_barrier2(
                cmd,
                &vk::DependencyInfo::default()
                    .image_memory_barriers(std::slice::from_ref(&to_present)),
            );
        }
    }
}

/// Barriers around the clear: the previous contents are discarded, and the
/// image ends up presentable again.
fn clear_barriers(image: vk::Image) -> [vk::ImageMemoryBarrier2<'static>; 2] {
    // Same stage the submit waits on the acquire semaphore
    let to_transfer = vk::ImageMemoryBarrier2::default()
        .src_stage_mask(vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT)
        .src_access_mask(vk::AccessFlags2::NONE)
        .dst_stage_mask(vk::PipelineStageFlags2::CLEAR)
        .dst_access_mask(vk::AccessFlags2::TRANSFER_WRITE)
        .old_layout(vk::ImageLayout::UNDEFINED)
        .new_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
        .image(image)
        .subresource_range(color_subresource_range());

    let to_present = vk::ImageMemoryBarrier2::default()
        .src_stage_mask(vk::PipelineStageFlags2::CLEAR)
        .src_access_mask(vk::AccessFlags2::TRANSFER_WRITE)
        .dst_stage_mask(vk::PipelineStageFlags2::BOTTOM_OF_PIPE)
        .dst_access_mask(vk::AccessFlags2::NONE)
        .old_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
        .new_layout(vk::ImageLayout::PRESENT_SRC_KHR)
        .image(image)
        .subresource_range(color_subresource_range());

    [to_transfer, to_present]
}
