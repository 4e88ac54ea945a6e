//! Physical device and queue family selection.
//!
//! Everything here works on plain capability snapshots so the policies can be
//! exercised without a driver.

use crate::capabilities::DeviceCapabilities;
use crate::error::{GpuError, Result};
use ash::vk;
use std::ffi::{CStr, CString};

/// Device extensions every presentation context needs: swap presentation,
/// dynamic rendering and synchronization2.
pub const REQUIRED_DEVICE_EXTENSIONS: [&CStr; 3] = [
    ash::khr::swapchain::NAME,
    ash::khr::dynamic_rendering::NAME,
    ash::khr::synchronization2::NAME,
];

/// Which graphics-capable queue family becomes the selected one when a
/// device exposes several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueueFamilyPolicy {
    /// Keep the last graphics-capable family in enumeration order.
    #[default]
    LastGraphics,
    /// Stop at the first graphics-capable family.
    FirstGraphics,
}

/// Pick a device index out of `candidates`.
///
/// With a hint, the first device whose name contains it wins. Without a hint,
/// or when nothing matches, the first enumerated device is used.
pub fn select_device(candidates: &[DeviceCapabilities], hint: Option<&str>) -> Result<usize> {
    if candidates.is_empty() {
        return Err(GpuError::NoDeviceFound);
    }

    if let Some(hint) = hint.filter(|h| !h.is_empty()) {
        if let Some(index) = candidates
            .iter()
            .position(|caps| caps.device_name.contains(hint))
        {
            return Ok(index);
        }
        tracing::warn!(
            hint,
            "No GPU name contains the device hint, using the first device"
        );
    }

    Ok(0)
}

/// Find the graphics queue family according to `policy`.
pub fn select_queue_family(
    families: &[vk::QueueFamilyProperties],
    policy: QueueFamilyPolicy,
) -> Option<u32> {
    let mut graphics = families
        .iter()
        .enumerate()
        .filter(|(_, family)| family.queue_flags.contains(vk::QueueFlags::GRAPHICS))
        .map(|(index, _)| index as u32);

    match policy {
        QueueFamilyPolicy::LastGraphics => graphics.last(),
        QueueFamilyPolicy::FirstGraphics => graphics.next(),
    }
}

/// Resolve the full device extension list: the mandatory set followed by the
/// caller's extras, without duplicates.
///
/// Fails on the first name the device does not support, before anything is
/// created. Portability implementations (MoltenVK) also get
/// `VK_KHR_portability_subset`, which they require to be enabled.
pub fn resolve_device_extensions(
    capabilities: &DeviceCapabilities,
    requested: &[String],
) -> Result<Vec<CString>> {
    let mut resolved: Vec<CString> = Vec::with_capacity(REQUIRED_DEVICE_EXTENSIONS.len() + requested.len());

    let mandatory = REQUIRED_DEVICE_EXTENSIONS.iter().map(|ext| ext.to_string_lossy().into_owned());
    for name in mandatory.chain(requested.iter().cloned()) {
        if !capabilities.supports_extension(&name) {
            return Err(GpuError::UnsupportedExtension(name));
        }

        let name = CString::new(name.as_str()).map_err(|_| GpuError::UnsupportedExtension(name))?;
        if !resolved.contains(&name) {
            resolved.push(name);
        }
    }

    let portability = ash::khr::portability_subset::NAME;
    if capabilities.supports_extension(&portability.to_string_lossy())
        && !resolved.iter().any(|name| name.as_c_str() == portability)
    {
        resolved.push(portability.to_owned());
    }

    Ok(resolved)
}
