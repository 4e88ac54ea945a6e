//! Command pool, command buffer and queue submission helpers.

use crate::error::Result;
use ash::vk;

/// Create a command pool for `queue_family`.
///
/// Pools are reset wholesale each frame, so no per-buffer reset flag is set.
///
/// # Safety
/// The device must be valid and the queue family must exist.
pub unsafe fn create_command_pool(device: &ash::Device, queue_family: u32) -> Result<vk::CommandPool> {
    let create_info = vk::CommandPoolCreateInfo::default()
        .queue_family_index(queue_family)
        .flags(vk::CommandPoolCreateFlags::TRANSIENT);

    let pool = device.create_command_pool(&create_info, None)?;
    Ok(pool)
}

/// Allocate a single primary command buffer.
///
/// # Safety
/// The device and pool must be valid.
pub unsafe fn allocate_command_buffer(
    device: &ash::Device,
    pool: vk::CommandPool,
) -> Result<vk::CommandBuffer> {
    let alloc_info = vk::CommandBufferAllocateInfo::default()
        .command_pool(pool)
        .level(vk::CommandBufferLevel::PRIMARY)
        .command_buffer_count(1);

    let buffers = device.allocate_command_buffers(&alloc_info)?;
    Ok(buffers[0])
}

/// Begin recording a one-time-submit command buffer.
///
/// # Safety
/// The device and command buffer must be valid.
pub unsafe fn begin_command_buffer(device: &ash::Device, cmd: vk::CommandBuffer) -> Result<()> {
    let begin_info =
        vk::CommandBufferBeginInfo::default().flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
    device.begin_command_buffer(cmd, &begin_info)?;
    Ok(())
}

/// End recording a command buffer.
///
/// # Safety
/// The device and command buffer must be valid.
pub unsafe fn end_command_buffer(device: &ash::Device, cmd: vk::CommandBuffer) -> Result<()> {
    device.end_command_buffer(cmd)?;
    Ok(())
}

/// Begin a dynamic rendering pass that draws on top of `view`.
///
/// # Safety
/// The command buffer must be recording and `view` must be in
/// `COLOR_ATTACHMENT_OPTIMAL` layout.
pub unsafe fn begin_rendering(
    device: &ash::Device,
    cmd: vk::CommandBuffer,
    view: vk::ImageView,
    extent: vk::Extent2D,
) {
    let color_attachments = [vk::RenderingAttachmentInfo::default()
        .image_view(view)
        .image_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
        .load_op(vk::AttachmentLoadOp::LOAD)
        .store_op(vk::AttachmentStoreOp::STORE)];

    let rendering_info = vk::RenderingInfo::default()
        .render_area(vk::Rect2D {
            offset: vk::Offset2D::default(),
            extent,
        })
        .layer_count(1)
        .color_attachments(&color_attachments);

    device.cmd_begin_rendering(cmd, &rendering_info);
}

/// Submit one command buffer, waiting on `wait` at `wait_stage` and
/// signalling `signal` plus `fence` when it completes.
///
/// # Safety
/// All handles must be valid and the command buffer must be executable.
pub unsafe fn submit_command_buffer(
    device: &ash::Device,
    queue: vk::Queue,
    cmd: vk::CommandBuffer,
    wait: vk::Semaphore,
    wait_stage: vk::PipelineStageFlags2,
    signal: vk::Semaphore,
    fence: vk::Fence,
) -> Result<()> {
    let wait_infos = [vk::SemaphoreSubmitInfo::default()
        .semaphore(wait)
        .stage_mask(wait_stage)];
    let signal_infos = [vk::SemaphoreSubmitInfo::default()
        .semaphore(signal)
        .stage_mask(vk::PipelineStageFlags2::ALL_COMMANDS)];
    let command_infos = [vk::CommandBufferSubmitInfo::default().command_buffer(cmd)];

    let submit_info = vk::SubmitInfo2::default()
        .wait_semaphore_infos(&wait_infos)
        .command_buffer_infos(&command_infos)
        .signal_semaphore_infos(&signal_infos);

    device.queue_submit2(queue, &[submit_info], fence)?;
    Ok(())
}
