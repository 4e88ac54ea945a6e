//! Native window and close-request polling.
//!
//! The frame loop drives the window, not the other way around: events are
//! pumped without blocking once per iteration, and the only thing the loop
//! cares about is whether the user asked to close.

use std::time::Duration;

use raw_window_handle::{
    DisplayHandle, HandleError, HasDisplayHandle, HasWindowHandle, WindowHandle,
};
use thiserror::Error;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowAttributes, WindowId};

/// Window-layer errors.
#[derive(Error, Debug)]
pub enum WindowError {
    #[error("Event loop error: {0}")]
    EventLoop(#[from] EventLoopError),
    #[error("Window creation failed: {0}")]
    Creation(#[from] OsError),
    #[error("Event loop exited before the window was created")]
    ExitedEarly,
}

/// Source of the "please stop" signal polled at the top of every frame.
pub trait CloseSignal {
    /// Pump pending events and report whether a close was requested.
    fn close_requested(&mut self) -> bool;
}

/// An OS window plus the event loop that feeds it.
pub struct AppWindow {
    // Dropped before the event loop
    window: Window,
    events: CloseTracker,
    event_loop: EventLoop<()>,
}

impl AppWindow {
    /// Open a fixed-size window.
    ///
    /// The window is not resizable: the swapchain is sized once and never
    /// recreated.
    pub fn new(title: &str, width: u32, height: u32) -> Result<Self, WindowError> {
        let mut event_loop = EventLoop::new()?;

        let attributes = Window::default_attributes()
            .with_title(title)
            .with_inner_size(PhysicalSize::new(width, height))
            .with_resizable(false);
        let mut creator = WindowCreator {
            attributes,
            window: None,
        };

        // Windows can only be created once the platform resumes the loop
        let window = loop {
            if let PumpStatus::Exit(_) =
                event_loop.pump_app_events(Some(Duration::ZERO), &mut creator)
            {
                return Err(WindowError::ExitedEarly);
            }
            if let Some(window) = creator.window.take() {
                break window?;
            }
        };

        tracing::info!(title, width, height, "Window created");

        Ok(Self {
            window,
            events: CloseTracker::default(),
            event_loop,
        })
    }

    /// The underlying winit window.
    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Current drawable size in physical pixels.
    pub fn inner_size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }
}

impl CloseSignal for AppWindow {
    fn close_requested(&mut self) -> bool {
        let status = self
            .event_loop
            .pump_app_events(Some(Duration::ZERO), &mut self.events);
        self.events.close_requested || matches!(status, PumpStatus::Exit(_))
    }
}

impl HasWindowHandle for AppWindow {
    fn window_handle(&self) -> Result<WindowHandle<'_>, HandleError> {
        self.window.window_handle()
    }
}

impl HasDisplayHandle for AppWindow {
    fn display_handle(&self) -> Result<DisplayHandle<'_>, HandleError> {
        self.window.display_handle()
    }
}

/// Handler used only until the first `resumed`.
struct WindowCreator {
    attributes: WindowAttributes,
    window: Option<Result<Window, OsError>>,
}

impl ApplicationHandler for WindowCreator {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            self.window = Some(event_loop.create_window(self.attributes.clone()));
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, _event: WindowEvent) {}
}

/// Steady-state handler: remembers whether a close was ever requested.
#[derive(Default)]
struct CloseTracker {
    close_requested: bool,
}

impl ApplicationHandler for CloseTracker {
    fn resumed(&mut self, _event_loop: &ActiveEventLoop) {}

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if matches!(event, WindowEvent::CloseRequested | WindowEvent::Destroyed) {
            if !self.close_requested {
                tracing::info!("Close requested");
            }
            self.close_requested = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::CloseAfter;

    #[test]
    fn close_signal_is_sticky() {
        let mut signal = CloseAfter(2);
        assert!(!signal.close_requested());
        assert!(!signal.close_requested());
        assert!(signal.close_requested());
        assert!(signal.close_requested());
    }
}
