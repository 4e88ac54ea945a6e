//! GPU memory allocator ownership.
//!
//! The presentation engine never allocates through this itself; it only owns
//! the allocator so applications get one with the right lifetime.

use crate::error::{GpuError, Result};
use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};

/// GPU memory allocator wrapper.
pub struct GpuAllocator {
    allocator: Option<Allocator>,
}

impl GpuAllocator {
    /// Create a new allocator.
    ///
    /// # Safety
    /// The instance, device, and physical device must be valid.
    pub unsafe fn new(
        instance: &ash::Instance,
        device: &ash::Device,
        physical_device: vk::PhysicalDevice,
    ) -> Result<Self> {
        let allocator = Allocator::new(&AllocatorCreateDesc {
            instance: instance.clone(),
            device: device.clone(),
            physical_device,
            debug_settings: gpu_allocator::AllocatorDebugSettings {
                log_memory_information: cfg!(debug_assertions),
                log_leaks_on_shutdown: true,
                store_stack_traces: false,
                log_allocations: false,
                log_frees: false,
                log_stack_traces: false,
            },
            buffer_device_address: false,
            allocation_sizes: Default::default(),
        })
        .map_err(|e| GpuError::ResourceAllocationFailed(format!("allocator: {e}")))?;

        Ok(Self {
            allocator: Some(allocator),
        })
    }

    /// Borrow the allocator for application allocations.
    ///
    /// Returns `None` once [`shutdown`](Self::shutdown) has run.
    pub fn get_mut(&mut self) -> Option<&mut Allocator> {
        self.allocator.as_mut()
    }

    /// Whether the allocator is still alive.
    pub fn is_active(&self) -> bool {
        self.allocator.is_some()
    }

    /// Shutdown the allocator, freeing all GPU memory.
    ///
    /// This must be called before the Vulkan device is destroyed.
    /// Any remaining allocations will be freed (and logged as leaks).
    pub fn shutdown(&mut self) {
        if let Some(allocator) = self.allocator.take() {
            drop(allocator);
            tracing::debug!("GPU allocator shut down");
        }
    }
}

impl Drop for GpuAllocator {
    fn drop(&mut self) {
        self.shutdown();
    }
}
