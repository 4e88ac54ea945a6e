//! GPU error types.

use ash::vk;
use thiserror::Error;

/// GPU-related errors.
///
/// Every variant is fatal for the context that produced it; nothing in this
/// crate retries.
#[derive(Error, Debug)]
pub enum GpuError {
    /// The Vulkan loader could not be found or initialised.
    #[error("Failed to load Vulkan: {0}")]
    Loading(String),

    /// No physical device was enumerated, or none has a graphics queue.
    #[error("No suitable GPU found")]
    NoDeviceFound,

    /// A requested device extension is not in the device's supported set.
    #[error("Required extension not supported: {0}")]
    UnsupportedExtension(String),

    /// Surface creation failed.
    #[error("Surface creation failed: {0}")]
    SurfaceCreation(String),

    /// The swapchain could not be created.
    #[error("Swapchain creation failed: {0}")]
    SwapchainCreationFailed(String),

    /// A startup allocation (allocator, command pool, sync object) failed.
    #[error("Resource allocation failed: {0}")]
    ResourceAllocationFailed(String),

    /// The surface no longer matches the swapchain (for example after a
    /// window resize). The swapchain would have to be recreated.
    #[error("Surface invalidated; swapchain is out of date")]
    SurfaceInvalidated,

    /// A driver call was rejected at runtime.
    #[error("Vulkan error: {0}")]
    DeviceOperationFailed(#[from] vk::Result),
}

impl GpuError {
    /// Re-label a failure that happened while allocating `what`.
    pub fn allocation(what: &str) -> impl FnOnce(Self) -> Self + '_ {
        move |e| Self::ResourceAllocationFailed(format!("{what}: {e}"))
    }
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, GpuError>;
