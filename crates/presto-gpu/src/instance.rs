//! Vulkan instance creation.

use crate::error::Result;
use ash::vk;
use raw_window_handle::RawDisplayHandle;
use std::ffi::{c_char, CStr, CString};

/// Validation layers to enable in debug builds.
pub fn validation_layers() -> Vec<&'static CStr> {
    vec![c"VK_LAYER_KHRONOS_validation"]
}

/// Create a Vulkan 1.3 instance able to present to `display`.
///
/// # Safety
/// The entry must be a valid Vulkan entry point.
pub unsafe fn create_instance(
    entry: &ash::Entry,
    app_name: &str,
    enable_validation: bool,
    display: RawDisplayHandle,
) -> Result<ash::Instance> {
    let app_name = application_name(app_name);

    let app_info = vk::ApplicationInfo::default()
        .application_name(&app_name)
        .application_version(vk::make_api_version(0, 1, 0, 0))
        .engine_name(c"Presto")
        .engine_version(vk::make_api_version(0, 0, 1, 0))
        .api_version(vk::API_VERSION_1_3);

    // Surface extensions for whatever platform the window lives on
    #[allow(unused_mut)]
    let mut extension_names: Vec<*const c_char> =
        ash_window::enumerate_required_extensions(display)?.to_vec();

    #[cfg(target_os = "macos")]
    extension_names.push(ash::khr::portability_enumeration::NAME.as_ptr());

    let layers = if enable_validation {
        available_layers(entry, validation_layers())?
    } else {
        vec![]
    };
    let layer_names: Vec<*const c_char> = layers.iter().map(|l| l.as_ptr()).collect();

    // Required for MoltenVK on macOS
    #[cfg(target_os = "macos")]
    let create_flags = vk::InstanceCreateFlags::ENUMERATE_PORTABILITY_KHR;
    #[cfg(not(target_os = "macos"))]
    let create_flags = vk::InstanceCreateFlags::empty();

    let create_info = vk::InstanceCreateInfo::default()
        .application_info(&app_info)
        .enabled_extension_names(&extension_names)
        .enabled_layer_names(&layer_names)
        .flags(create_flags);

    let instance = entry.create_instance(&create_info, None)?;
    tracing::debug!(
        extensions = extension_names.len(),
        layers = layer_names.len(),
        "Vulkan instance created"
    );

    Ok(instance)
}

/// The window title as a C string, minus any interior NUL bytes.
fn application_name(title: &str) -> CString {
    let bytes: Vec<u8> = title.bytes().filter(|&b| b != 0).collect();
    // No NUL is left, so this cannot fail
    CString::new(bytes).unwrap_or_default()
}

/// Keep only the requested layers the loader actually provides.
unsafe fn available_layers(
    entry: &ash::Entry,
    requested: Vec<&'static CStr>,
) -> Result<Vec<&'static CStr>> {
    let available = entry.enumerate_instance_layer_properties()?;

    Ok(requested
        .into_iter()
        .filter(|layer| {
            let found = available
                .iter()
                .any(|props| CStr::from_ptr(props.layer_name.as_ptr()) == *layer);
            if !found {
                tracing::warn!("Validation layer {} not available", layer.to_string_lossy());
            }
            found
        })
        .collect())
}
