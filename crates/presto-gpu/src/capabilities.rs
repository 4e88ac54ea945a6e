//! Physical device capability snapshot.

use crate::error::Result;
use ash::vk;
use std::collections::HashSet;
use std::ffi::CStr;

/// GPU vendor identification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpuVendor {
    Nvidia,
    Amd,
    Intel,
    Apple,
    Other(u32),
}

impl GpuVendor {
    /// Identify vendor from PCI vendor ID.
    pub fn from_vendor_id(id: u32) -> Self {
        match id {
            0x10DE => Self::Nvidia,
            0x1002 => Self::Amd,
            0x8086 => Self::Intel,
            0x106B => Self::Apple,
            other => Self::Other(other),
        }
    }
}

/// Read-only snapshot of everything the device selector needs to know about
/// one physical device.
#[derive(Debug, Clone)]
pub struct DeviceCapabilities {
    /// GPU vendor
    pub vendor: GpuVendor,
    /// Device name as reported by the driver
    pub device_name: String,
    /// Discrete, integrated, virtual, ...
    pub device_type: vk::PhysicalDeviceType,
    /// Vulkan API version
    pub api_version: u32,
    /// Driver version
    pub driver_version: u32,
    /// Raw properties, kept for callers that need limits.
    pub properties: vk::PhysicalDeviceProperties,
    /// Queue families in enumeration order.
    pub queue_families: Vec<vk::QueueFamilyProperties>,
    /// Supported device extension names.
    pub available_extensions: HashSet<String>,
}

impl DeviceCapabilities {
    /// Query capabilities from a physical device.
    ///
    /// # Safety
    /// The instance and physical device must be valid.
    pub unsafe fn query(
        instance: &ash::Instance,
        physical_device: vk::PhysicalDevice,
    ) -> Result<Self> {
        let properties = instance.get_physical_device_properties(physical_device);
        let queue_families = instance.get_physical_device_queue_family_properties(physical_device);

        let available_extensions: HashSet<String> = instance
            .enumerate_device_extension_properties(physical_device)?
            .iter()
            .filter_map(|ext| {
                CStr::from_ptr(ext.extension_name.as_ptr())
                    .to_str()
                    .ok()
                    .map(String::from)
            })
            .collect();

        let device_name = CStr::from_ptr(properties.device_name.as_ptr())
            .to_string_lossy()
            .into_owned();

        Ok(Self {
            vendor: GpuVendor::from_vendor_id(properties.vendor_id),
            device_name,
            device_type: properties.device_type,
            api_version: properties.api_version,
            driver_version: properties.driver_version,
            properties,
            queue_families,
            available_extensions,
        })
    }

    /// Whether the device reports `name` in its extension list.
    pub fn supports_extension(&self, name: &str) -> bool {
        self.available_extensions.contains(name)
    }

    /// Get a human-readable summary of capabilities.
    pub fn summary(&self) -> String {
        format!(
            "{} ({:?}, {:?}) - Vulkan {}.{}.{} - {} queue families",
            self.device_name,
            self.vendor,
            self.device_type,
            vk::api_version_major(self.api_version),
            vk::api_version_minor(self.api_version),
            vk::api_version_patch(self.api_version),
            self.queue_families.len(),
        )
    }
}
