//! Frame presentation engine for the Presto workspace.
//!
//! This crate turns a window into a stream of presented frames:
//! - Window creation and close-request polling
//! - GPU context, surface and swapchain setup from a [`Params`] record
//! - One frame slot (command pool, semaphores, fence) per swap image
//! - The per-frame dispatcher with an optional [`Overlay`] composited on top
//! - Ordered teardown
//!
//! # Example
//!
//! ```no_run
//! use presto_app::{init_logging, GraphicsContext, Params};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_logging();
//!
//!     let mut ctx = GraphicsContext::create(Params::new("Hello").with_size(1280, 720))?;
//!     let result = ctx.dispatch(None, |frame| {
//!         // Record into frame.command_buffer, leave frame.image presentable
//!         let _ = frame.image;
//!         Ok(())
//!     });
//!     ctx.destroy();
//!     result
//! }
//! ```

mod config;
mod context;
mod frame;
mod guard;
mod logging;
#[cfg(test)]
mod mock;
mod overlay;
mod presenter;
mod window;

pub use config::Params;
pub use context::GraphicsContext;
pub use frame::{FrameContext, FrameSet, FrameSlot};
pub use guard::SubmissionGuard;
pub use logging::init_logging;
pub use overlay::{Overlay, OverlayInfo};
pub use presenter::Presenter;
pub use window::{AppWindow, CloseSignal, WindowError};

// Re-export commonly used types for convenience
pub use presto_gpu::{FormatPolicy, GpuContext, GpuError, QueueFamilyPolicy};
