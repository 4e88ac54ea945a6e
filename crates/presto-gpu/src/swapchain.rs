//! Swapchain negotiation and creation.

use crate::error::{GpuError, Result};
use crate::surface::SurfaceCapabilities;
use ash::prelude::VkResult;
use ash::vk;

/// How the swap image format is chosen from the surface's supported list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatPolicy {
    /// `B8G8R8A8_SRGB`, then `B8G8R8A8_UNORM` (both sRGB non-linear), then
    /// the first reported format.
    #[default]
    PreferSrgb,
    /// Whatever the surface lists first.
    FirstReported,
}

/// Everything needed to create a swapchain, decided up front.
#[derive(Debug, Clone, Copy)]
pub struct SwapchainPlan {
    pub format: vk::SurfaceFormatKHR,
    pub present_mode: vk::PresentModeKHR,
    pub extent: vk::Extent2D,
    pub min_image_count: u32,
    pub transform: vk::SurfaceTransformFlagsKHR,
}

impl SwapchainPlan {
    /// Negotiate a plan from the surface's capabilities.
    ///
    /// Present mode is always FIFO. Image count and transform are taken from
    /// the surface as reported.
    pub fn negotiate(
        surface: &SurfaceCapabilities,
        policy: FormatPolicy,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let format = select_surface_format(&surface.formats, policy).ok_or_else(|| {
            GpuError::SwapchainCreationFailed("surface reports no formats".to_string())
        })?;

        Ok(Self {
            format,
            present_mode: vk::PresentModeKHR::FIFO,
            extent: calculate_extent(&surface.capabilities, width, height),
            min_image_count: surface.capabilities.min_image_count,
            transform: surface.capabilities.current_transform,
        })
    }
}

/// Swapchain wrapper.
///
/// `images` and `image_views` are indexed by the image index returned from
/// acquire, not by frame slot.
#[derive(Debug, Clone)]
pub struct Swapchain {
    pub swapchain: vk::SwapchainKHR,
    pub images: Vec<vk::Image>,
    pub image_views: Vec<vk::ImageView>,
    pub format: vk::Format,
    pub extent: vk::Extent2D,
}

impl Swapchain {
    /// Create a new swapchain and one color view per image.
    ///
    /// # Safety
    /// All handles must be valid.
    pub unsafe fn new(
        device: &ash::Device,
        swapchain_loader: &ash::khr::swapchain::Device,
        surface: vk::SurfaceKHR,
        plan: &SwapchainPlan,
        queue_family: u32,
    ) -> Result<Self> {
        let queue_families = [queue_family];
        let create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(surface)
            .min_image_count(plan.min_image_count)
            .image_format(plan.format.format)
            .image_color_space(plan.format.color_space)
            .image_extent(plan.extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::TRANSFER_DST)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .queue_family_indices(&queue_families)
            .pre_transform(plan.transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(plan.present_mode)
            .clipped(true);

        let swapchain = swapchain_loader
            .create_swapchain(&create_info, None)
            .map_err(|e| GpuError::SwapchainCreationFailed(e.to_string()))?;

        let images = swapchain_loader.get_swapchain_images(swapchain)?;

        let image_views = images
            .iter()
            .map(|&image| {
                let view_info = color_view_info(image, plan.format.format);
                device.create_image_view(&view_info, None)
            })
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| GpuError::SwapchainCreationFailed(format!("image view: {e}")))?;

        tracing::info!(
            "Swapchain created: {}x{} {:?} ({} images, FIFO)",
            plan.extent.width,
            plan.extent.height,
            plan.format.format,
            images.len()
        );

        Ok(Self {
            swapchain,
            images,
            image_views,
            format: plan.format.format,
            extent: plan.extent,
        })
    }

    /// Number of swap images.
    pub fn image_count(&self) -> usize {
        self.images.len()
    }
}

/// 2D, single mip, single layer color view with identity swizzle.
pub fn color_view_info(image: vk::Image, format: vk::Format) -> vk::ImageViewCreateInfo<'static> {
    vk::ImageViewCreateInfo::default()
        .image(image)
        .view_type(vk::ImageViewType::TYPE_2D)
        .format(format)
        .components(vk::ComponentMapping::default())
        .subresource_range(color_subresource_range())
}

/// Full color subresource of a swap image.
pub fn color_subresource_range() -> vk::ImageSubresourceRange {
    vk::ImageSubresourceRange::default()
        .aspect_mask(vk::ImageAspectFlags::COLOR)
        .base_mip_level(0)
        .level_count(1)
        .base_array_layer(0)
        .layer_count(1)
}

/// Select the surface format according to `policy`.
pub fn select_surface_format(
    available: &[vk::SurfaceFormatKHR],
    policy: FormatPolicy,
) -> Option<vk::SurfaceFormatKHR> {
    if policy == FormatPolicy::PreferSrgb {
        for preferred in [vk::Format::B8G8R8A8_SRGB, vk::Format::B8G8R8A8_UNORM] {
            let found = available.iter().find(|f| {
                f.format == preferred && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
            });
            if let Some(format) = found {
                return Some(*format);
            }
        }
    }

    available.first().copied()
}

/// Calculate swapchain extent.
///
/// The surface's current extent wins unless it is the "window decides"
/// sentinel, in which case the requested size is clamped into range.
pub fn calculate_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    desired_width: u32,
    desired_height: u32,
) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        capabilities.current_extent
    } else {
        vk::Extent2D {
            width: desired_width.clamp(
                capabilities.min_image_extent.width,
                capabilities.max_image_extent.width,
            ),
            height: desired_height.clamp(
                capabilities.min_image_extent.height,
                capabilities.max_image_extent.height,
            ),
        }
    }
}

/// Translate a raw acquire result. `OUT_OF_DATE` means no image was acquired.
pub fn map_acquire_result(result: VkResult<(u32, bool)>) -> Result<(u32, bool)> {
    match result {
        Ok(acquired) => Ok(acquired),
        Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Err(GpuError::SurfaceInvalidated),
        Err(e) => Err(GpuError::from(e)),
    }
}

/// Translate a raw present result into "was it suboptimal".
pub fn map_present_result(result: VkResult<bool>) -> Result<bool> {
    match result {
        Ok(suboptimal) => Ok(suboptimal),
        Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Err(GpuError::SurfaceInvalidated),
        Err(e) => Err(GpuError::from(e)),
    }
}
