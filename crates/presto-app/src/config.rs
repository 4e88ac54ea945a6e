//! Context configuration.

use presto_gpu::{FormatPolicy, QueueFamilyPolicy};

/// Everything a [`GraphicsContext`](crate::GraphicsContext) is created from.
#[derive(Debug, Clone)]
pub struct Params {
    /// Window title, also used as the Vulkan application name.
    pub title: String,
    /// Initial window width.
    pub width: u32,
    /// Initial window height.
    pub height: u32,
    /// Prefer the first GPU whose name contains this substring.
    pub device_hint: Option<String>,
    /// Device extensions needed on top of the mandatory set.
    pub device_extensions: Vec<String>,
    /// Descriptor capacity reserved for overlay textures.
    pub max_overlay_images: u32,
    /// Enable Vulkan validation layers (default: debug builds only).
    pub validation: bool,
    /// Which graphics queue family to select when several exist.
    pub queue_family_policy: QueueFamilyPolicy,
    /// How the swap image format is picked.
    pub format_policy: FormatPolicy,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            title: "Presto".to_string(),
            width: 1280,
            height: 720,
            device_hint: None,
            device_extensions: Vec::new(),
            max_overlay_images: 512,
            validation: cfg!(debug_assertions),
            queue_family_policy: QueueFamilyPolicy::default(),
            format_policy: FormatPolicy::default(),
        }
    }
}

impl Params {
    /// Create a new config with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Set the window dimensions.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Prefer a GPU whose name contains `hint`.
    pub fn with_device_hint(mut self, hint: impl Into<String>) -> Self {
        self.device_hint = Some(hint.into());
        self
    }

    /// Request an additional device extension.
    pub fn with_device_extension(mut self, name: impl Into<String>) -> Self {
        self.device_extensions.push(name.into());
        self
    }

    /// Set the overlay texture capacity.
    pub fn with_max_overlay_images(mut self, count: u32) -> Self {
        self.max_overlay_images = count;
        self
    }

    /// Enable or disable validation layers.
    pub fn with_validation(mut self, validation: bool) -> Self {
        self.validation = validation;
        self
    }

    /// Choose the queue family policy.
    pub fn with_queue_family_policy(mut self, policy: QueueFamilyPolicy) -> Self {
        self.queue_family_policy = policy;
        self
    }

    /// Choose the swap format policy.
    pub fn with_format_policy(mut self, policy: FormatPolicy) -> Self {
        self.format_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let params = Params::default();
        assert_eq!((params.width, params.height), (1280, 720));
        assert_eq!(params.max_overlay_images, 512);
        assert!(params.device_hint.is_none());
        assert!(params.device_extensions.is_empty());
        assert_eq!(params.queue_family_policy, QueueFamilyPolicy::LastGraphics);
        assert_eq!(params.format_policy, FormatPolicy::PreferSrgb);
    }

    #[test]
    fn builder_accumulates_extensions() {
        let params = Params::new("Sample")
            .with_size(800, 600)
            .with_device_hint("NVIDIA")
            .with_device_extension("VK_KHR_push_descriptor")
            .with_device_extension("VK_EXT_mesh_shader");

        assert_eq!(params.title, "Sample");
        assert_eq!((params.width, params.height), (800, 600));
        assert_eq!(params.device_hint.as_deref(), Some("NVIDIA"));
        assert_eq!(
            params.device_extensions,
            ["VK_KHR_push_descriptor", "VK_EXT_mesh_shader"]
        );
    }
}
