//! GPU context management.

use crate::capabilities::DeviceCapabilities;
use crate::error::{GpuError, Result};
use crate::instance::create_instance;
use crate::memory::GpuAllocator;
use crate::selector::{
    resolve_device_extensions, select_device, select_queue_family, QueueFamilyPolicy,
};
use ash::vk;
use raw_window_handle::RawDisplayHandle;
use std::collections::BTreeMap;
use std::ffi::c_char;

/// Main GPU context holding Vulkan resources.
///
/// Released with [`GpuContext::destroy`]. Dropping the context instead leaks
/// the device and instance, which keeps any child objects still alive valid.
pub struct GpuContext {
    pub(crate) entry: ash::Entry,
    pub(crate) instance: ash::Instance,
    pub(crate) physical_device: vk::PhysicalDevice,
    pub(crate) device: ash::Device,
    pub(crate) capabilities: DeviceCapabilities,
    pub(crate) allocator: GpuAllocator,

    // One queue per family; the selected family drives graphics and present
    pub(crate) queues: BTreeMap<u32, vk::Queue>,
    pub(crate) selected_queue_family: u32,
}

impl GpuContext {
    /// Get the Vulkan entry point.
    pub fn entry(&self) -> &ash::Entry {
        &self.entry
    }

    /// Get the Vulkan instance handle.
    pub fn instance(&self) -> &ash::Instance {
        &self.instance
    }

    /// Get the Vulkan device handle.
    pub fn device(&self) -> &ash::Device {
        &self.device
    }

    /// Get the physical device handle.
    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device
    }

    /// Capability snapshot taken when the device was selected.
    pub fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    /// Raw physical device properties.
    pub fn device_properties(&self) -> &vk::PhysicalDeviceProperties {
        &self.capabilities.properties
    }

    /// All queues, keyed by queue family index.
    pub fn queues(&self) -> &BTreeMap<u32, vk::Queue> {
        &self.queues
    }

    /// Queue family used for graphics work and presentation.
    pub fn selected_queue_family(&self) -> u32 {
        self.selected_queue_family
    }

    /// Queue of the selected family.
    pub fn selected_queue(&self) -> vk::Queue {
        self.queues
            .get(&self.selected_queue_family)
            .copied()
            .unwrap_or_default()
    }

    /// Get access to the GPU allocator.
    pub fn allocator(&mut self) -> &mut GpuAllocator {
        &mut self.allocator
    }

    /// Wait for device to be idle.
    pub fn wait_idle(&self) -> Result<()> {
        unsafe {
            self.device.device_wait_idle()?;
        }
        Ok(())
    }

    /// Shut the allocator down, then destroy the logical device and finally
    /// the instance.
    ///
    /// # Safety
    /// Every object created from the device or the instance, surfaces
    /// included, must already be destroyed.
    pub unsafe fn destroy(mut self) {
        // SAFETY: caller guarantees no child objects remain
        unsafe {
            let _ = self.device.device_wait_idle();

            // Frees all VkDeviceMemory before the device goes
            self.allocator.shutdown();

            self.device.destroy_device(None);
            tracing::debug!("Logical device destroyed");
            self.instance.destroy_instance(None);
            tracing::debug!("Vulkan instance destroyed");
        }
    }
}

/// Builder for creating a GPU context.
pub struct GpuContextBuilder {
    app_name: String,
    enable_validation: bool,
    device_hint: Option<String>,
    device_extensions: Vec<String>,
    queue_family_policy: QueueFamilyPolicy,
}

impl Default for GpuContextBuilder {
    fn default() -> Self {
        Self {
            app_name: "Presto".to_string(),
            enable_validation: cfg!(debug_assertions),
            device_hint: None,
            device_extensions: Vec::new(),
            queue_family_policy: QueueFamilyPolicy::default(),
        }
    }
}

impl GpuContextBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the application name.
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    /// Enable or disable validation layers.
    pub fn validation(mut self, enable: bool) -> Self {
        self.enable_validation = enable;
        self
    }

    /// Prefer the first device whose name contains `hint`.
    pub fn device_hint(mut self, hint: Option<String>) -> Self {
        self.device_hint = hint;
        self
    }

    /// Extra device extensions on top of the mandatory set.
    pub fn device_extensions(mut self, extensions: Vec<String>) -> Self {
        self.device_extensions = extensions;
        self
    }

    /// How to pick between several graphics-capable queue families.
    pub fn queue_family_policy(mut self, policy: QueueFamilyPolicy) -> Self {
        self.queue_family_policy = policy;
        self
    }

    /// Build the GPU context for a window living on `display`.
    pub fn build(self, display: RawDisplayHandle) -> Result<GpuContext> {
        // Load Vulkan entry point
        let entry =
            unsafe { ash::Entry::load() }.map_err(|e| GpuError::Loading(e.to_string()))?;

        let instance =
            unsafe { create_instance(&entry, &self.app_name, self.enable_validation, display) }?;

        let physical_devices = unsafe { instance.enumerate_physical_devices() }?;
        let candidates = physical_devices
            .iter()
            .map(|&pd| unsafe { DeviceCapabilities::query(&instance, pd) })
            .collect::<Result<Vec<_>>>()?;

        for (index, caps) in candidates.iter().enumerate() {
            tracing::debug!(index, "Found GPU: {}", caps.summary());
        }

        let selected = select_device(&candidates, self.device_hint.as_deref())?;
        let physical_device = physical_devices[selected];
        let capabilities = candidates[selected].clone();

        tracing::info!("Selected GPU: {}", capabilities.summary());

        let selected_queue_family =
            select_queue_family(&capabilities.queue_families, self.queue_family_policy)
                .ok_or(GpuError::NoDeviceFound)?;

        // Validate before anything device-side exists
        let extensions = resolve_device_extensions(&capabilities, &self.device_extensions)?;
        let extension_names: Vec<*const c_char> =
            extensions.iter().map(|ext| ext.as_ptr()).collect();

        let device = unsafe {
            create_device(
                &instance,
                physical_device,
                capabilities.queue_families.len() as u32,
                &extension_names,
            )?
        };

        let queues: BTreeMap<u32, vk::Queue> = (0..capabilities.queue_families.len() as u32)
            .map(|family| (family, unsafe { device.get_device_queue(family, 0) }))
            .collect();

        tracing::info!(
            queue_families = queues.len(),
            selected_queue_family,
            extensions = extensions.len(),
            "Logical device created"
        );

        let allocator = unsafe { GpuAllocator::new(&instance, &device, physical_device) }?;

        Ok(GpuContext {
            entry,
            instance,
            physical_device,
            device,
            capabilities,
            allocator,
            queues,
            selected_queue_family,
        })
    }
}

/// Create the logical device with one queue from every family.
///
/// # Safety
/// The instance and physical device must be valid.
unsafe fn create_device(
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
    queue_family_count: u32,
    extension_names: &[*const c_char],
) -> Result<ash::Device> {
    let queue_priority = 1.0_f32;
    let queue_create_infos: Vec<vk::DeviceQueueCreateInfo> = (0..queue_family_count)
        .map(|family| {
            vk::DeviceQueueCreateInfo::default()
                .queue_family_index(family)
                .queue_priorities(std::slice::from_ref(&queue_priority))
        })
        .collect();

    let mut vulkan_1_3_features = vk::PhysicalDeviceVulkan13Features::default()
        .dynamic_rendering(true)
        .synchronization2(true);

    let mut features2 =
        vk::PhysicalDeviceFeatures2::default().push_next(&mut vulkan_1_3_features);

    let device_create_info = vk::DeviceCreateInfo::default()
        .queue_create_infos(&queue_create_infos)
        .enabled_extension_names(extension_names)
        .push_next(&mut features2);

    let device = instance
        .create_device(physical_device, &device_create_info, None)
        .map_err(GpuError::from)?;

    Ok(device)
}
