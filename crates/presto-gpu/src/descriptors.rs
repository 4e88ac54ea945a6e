//! Descriptor pool handed to the overlay renderer.

use crate::error::{GpuError, Result};
use ash::vk;

/// Pool sizes for an overlay that binds up to `max_images` textures.
pub fn overlay_pool_sizes(max_images: u32) -> [vk::DescriptorPoolSize; 1] {
    [vk::DescriptorPoolSize::default()
        .ty(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
        .descriptor_count(max_images.max(1))]
}

/// Create the descriptor pool overlay textures are allocated from.
///
/// Sets may be freed individually since overlay textures come and go.
///
/// # Safety
/// The device must be valid.
pub unsafe fn create_overlay_descriptor_pool(
    device: &ash::Device,
    max_images: u32,
) -> Result<vk::DescriptorPool> {
    let pool_sizes = overlay_pool_sizes(max_images);
    let create_info = vk::DescriptorPoolCreateInfo::default()
        .max_sets(max_images.max(1))
        .pool_sizes(&pool_sizes)
        .flags(vk::DescriptorPoolCreateFlags::FREE_DESCRIPTOR_SET);

    let pool = device
        .create_descriptor_pool(&create_info, None)
        .map_err(|e| GpuError::ResourceAllocationFailed(format!("overlay descriptor pool: {e}")))?;

    tracing::debug!(max_images, "Overlay descriptor pool created");
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_sizes_follow_image_capacity() {
        let sizes = overlay_pool_sizes(512);
        assert_eq!(sizes[0].ty, vk::DescriptorType::COMBINED_IMAGE_SAMPLER);
        assert_eq!(sizes[0].descriptor_count, 512);
    }

    #[test]
    fn zero_capacity_still_yields_valid_pool() {
        assert_eq!(overlay_pool_sizes(0)[0].descriptor_count, 1);
    }
}
