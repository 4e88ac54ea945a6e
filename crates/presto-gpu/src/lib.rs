//! Vulkan layer for the Presto presentation engine.
//!
//! This crate provides:
//! - Vulkan instance creation and device capability snapshots
//! - Device and queue family selection
//! - Logical device, per-family queues and the memory allocator
//! - Surface and swapchain negotiation
//! - Synchronization and command helpers
//! - The [`FrameBackend`] seam used by the frame loop

pub mod backend;
pub mod capabilities;
pub mod command;
pub mod context;
pub mod descriptors;
pub mod error;
pub mod instance;
pub mod memory;
pub mod selector;
pub mod surface;
pub mod swapchain;
pub mod sync;

pub use backend::{FrameBackend, VulkanBackend};
pub use capabilities::{DeviceCapabilities, GpuVendor};
pub use context::{GpuContext, GpuContextBuilder};
pub use descriptors::create_overlay_descriptor_pool;
pub use error::{GpuError, Result};
pub use memory::GpuAllocator;
pub use selector::{QueueFamilyPolicy, REQUIRED_DEVICE_EXTENSIONS};
pub use surface::{SurfaceCapabilities, SurfaceContext};
pub use swapchain::{FormatPolicy, Swapchain, SwapchainPlan};
pub use sync::LayoutTransition;
