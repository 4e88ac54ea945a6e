//! Recording stand-ins for the GPU, the window and the overlay.
//!
//! The backend behaves like a device that finishes work instantly: submit
//! signals its fence right away. Every call is appended to a shared,
//! human-readable log so tests can assert on ordering.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::rc::Rc;
use std::sync::Arc;

use ash::vk::{self, Handle};
use parking_lot::Mutex;
use presto_gpu::swapchain::{map_acquire_result, map_present_result};
use presto_gpu::{FrameBackend, GpuError, LayoutTransition, Result, Swapchain};

use crate::frame::FrameContext;
use crate::overlay::Overlay;
use crate::window::CloseSignal;

pub type CallLog = Rc<RefCell<Vec<String>>>;

/// Raw handle values of [`mock_swapchain`].
pub const SWAPCHAIN: u64 = 100;
pub const FIRST_IMAGE: u64 = 200;
pub const FIRST_VIEW: u64 = 300;
pub const OVERLAY_POOL: u64 = 400;

/// A swapchain with fixed fake handles: images `200..`, views `300..`.
pub fn mock_swapchain(image_count: u32) -> Swapchain {
    let count = u64::from(image_count);
    Swapchain {
        swapchain: vk::SwapchainKHR::from_raw(SWAPCHAIN),
        images: (0..count).map(|i| vk::Image::from_raw(FIRST_IMAGE + i)).collect(),
        image_views: (0..count)
            .map(|i| vk::ImageView::from_raw(FIRST_VIEW + i))
            .collect(),
        format: vk::Format::B8G8R8A8_SRGB,
        extent: vk::Extent2D {
            width: 1280,
            height: 720,
        },
    }
}

pub struct MockBackend {
    log: CallLog,
    next_handle: Cell<u64>,
    image_count: u32,
    next_image: Cell<u32>,
    fences: RefCell<HashMap<u64, bool>>,
    pool_buffers: RefCell<HashMap<u64, usize>>,
    live: RefCell<BTreeMap<&'static str, usize>>,
    calls: RefCell<HashMap<&'static str, usize>>,
    failures: RefCell<Vec<(&'static str, usize)>>,
    acquire_script: RefCell<VecDeque<std::result::Result<(u32, bool), vk::Result>>>,
    present_script: RefCell<VecDeque<std::result::Result<bool, vk::Result>>>,
}

impl MockBackend {
    /// Handles start at 1 and increase by one per created object.
    pub fn new(image_count: u32) -> Self {
        Self {
            log: CallLog::default(),
            next_handle: Cell::new(1),
            image_count,
            next_image: Cell::new(0),
            fences: RefCell::default(),
            pool_buffers: RefCell::default(),
            live: RefCell::default(),
            calls: RefCell::default(),
            failures: RefCell::default(),
            acquire_script: RefCell::default(),
            present_script: RefCell::default(),
        }
    }

    /// Shared log, for overlays and callbacks that record into it too.
    pub fn call_log(&self) -> CallLog {
        Rc::clone(&self.log)
    }

    pub fn log(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    /// Number of objects of `kind` created and not yet destroyed.
    pub fn live(&self, kind: &str) -> usize {
        self.live.borrow().get(kind).copied().unwrap_or(0)
    }

    /// Make the `nth` (0-based) call of `op` fail with `ERROR_DEVICE_LOST`.
    pub fn fail_call(&self, op: &'static str, nth: usize) {
        self.failures.borrow_mut().push((op, nth));
    }

    /// Queue raw acquire results; once drained, images are handed out
    /// round-robin.
    pub fn script_acquire(
        &self,
        results: impl IntoIterator<Item = std::result::Result<(u32, bool), vk::Result>>,
    ) {
        self.acquire_script.borrow_mut().extend(results);
    }

    pub fn script_present(&self, results: impl IntoIterator<Item = std::result::Result<bool, vk::Result>>) {
        self.present_script.borrow_mut().extend(results);
    }

    fn record(&self, op: &'static str, detail: String) -> Result<()> {
        let nth = {
            let mut calls = self.calls.borrow_mut();
            let count = calls.entry(op).or_insert(0);
            *count += 1;
            *count - 1
        };
        self.log.borrow_mut().push(if detail.is_empty() {
            op.to_string()
        } else {
            format!("{op} {detail}")
        });

        if self.failures.borrow().contains(&(op, nth)) {
            return Err(GpuError::DeviceOperationFailed(vk::Result::ERROR_DEVICE_LOST));
        }
        Ok(())
    }

    fn alloc<T: Handle>(&self, kind: &'static str) -> T {
        let raw = self.next_handle.get();
        self.next_handle.set(raw + 1);
        *self.live.borrow_mut().entry(kind).or_insert(0) += 1;
        T::from_raw(raw)
    }

    fn release(&self, kind: &'static str, count: usize) {
        if let Some(live) = self.live.borrow_mut().get_mut(kind) {
            *live = live.saturating_sub(count);
        }
    }

    fn set_fence(&self, fence: vk::Fence, signaled: bool) {
        self.fences.borrow_mut().insert(fence.as_raw(), signaled);
    }
}

fn stage_name(stage: vk::PipelineStageFlags2) -> String {
    if stage == vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT {
        "color_attachment_output".to_string()
    } else {
        format!("{:#x}", stage.as_raw())
    }
}

impl FrameBackend for MockBackend {
    unsafe fn create_command_pool(&self, queue_family: u32) -> Result<vk::CommandPool> {
        self.record("create_command_pool", format!("family={queue_family}"))?;
        Ok(self.alloc("command_pool"))
    }

    unsafe fn allocate_command_buffer(&self, pool: vk::CommandPool) -> Result<vk::CommandBuffer> {
        self.record("allocate_command_buffer", format!("pool={}", pool.as_raw()))?;
        *self.pool_buffers.borrow_mut().entry(pool.as_raw()).or_insert(0) += 1;
        Ok(self.alloc("command_buffer"))
    }

    unsafe fn create_semaphore(&self) -> Result<vk::Semaphore> {
        self.record("create_semaphore", String::new())?;
        Ok(self.alloc("semaphore"))
    }

    unsafe fn create_fence(&self, signaled: bool) -> Result<vk::Fence> {
        self.record("create_fence", format!("signaled={signaled}"))?;
        let fence = self.alloc("fence");
        self.set_fence(fence, signaled);
        Ok(fence)
    }

    unsafe fn fence_signaled(&self, fence: vk::Fence) -> Result<bool> {
        Ok(self
            .fences
            .borrow()
            .get(&fence.as_raw())
            .copied()
            .unwrap_or(false))
    }

    unsafe fn wait_for_fence(&self, fence: vk::Fence, _timeout_ns: u64) -> Result<()> {
        self.record("wait_for_fence", format!("fence={}", fence.as_raw()))?;
        // Nothing would ever signal it: a real device would hang here
        if !unsafe { self.fence_signaled(fence)? } {
            return Err(GpuError::DeviceOperationFailed(vk::Result::TIMEOUT));
        }
        Ok(())
    }

    unsafe fn reset_fence(&self, fence: vk::Fence) -> Result<()> {
        self.record("reset_fence", format!("fence={}", fence.as_raw()))?;
        self.set_fence(fence, false);
        Ok(())
    }

    unsafe fn acquire_next_image(
        &self,
        swapchain: vk::SwapchainKHR,
        signal: vk::Semaphore,
        _timeout_ns: u64,
    ) -> Result<(u32, bool)> {
        let scripted = self.acquire_script.borrow_mut().pop_front();
        let raw = scripted.unwrap_or_else(|| {
            let index = self.next_image.get();
            self.next_image.set((index + 1) % self.image_count.max(1));
            Ok((index, false))
        });

        let outcome = match raw {
            Ok((index, _)) => format!("image={index}"),
            Err(e) => format!("error={e:?}"),
        };
        self.record(
            "acquire_next_image",
            format!(
                "swapchain={} signal={} {outcome}",
                swapchain.as_raw(),
                signal.as_raw()
            ),
        )?;
        map_acquire_result(raw)
    }

    unsafe fn reset_command_pool(&self, pool: vk::CommandPool) -> Result<()> {
        self.record("reset_command_pool", format!("pool={}", pool.as_raw()))
    }

    unsafe fn begin_command_buffer(&self, cmd: vk::CommandBuffer) -> Result<()> {
        self.record("begin_command_buffer", format!("cmd={}", cmd.as_raw()))
    }

    unsafe fn end_command_buffer(&self, cmd: vk::CommandBuffer) -> Result<()> {
        self.record("end_command_buffer", format!("cmd={}", cmd.as_raw()))
    }

    unsafe fn cmd_transition(
        &self,
        cmd: vk::CommandBuffer,
        image: vk::Image,
        transition: LayoutTransition,
    ) {
        let _ = self.record(
            "cmd_transition",
            format!("cmd={} image={} {transition:?}", cmd.as_raw(), image.as_raw()),
        );
    }

    unsafe fn cmd_begin_rendering(
        &self,
        cmd: vk::CommandBuffer,
        view: vk::ImageView,
        extent: vk::Extent2D,
    ) {
        let _ = self.record(
            "cmd_begin_rendering",
            format!(
                "cmd={} view={} extent={}x{}",
                cmd.as_raw(),
                view.as_raw(),
                extent.width,
                extent.height
            ),
        );
    }

    unsafe fn cmd_end_rendering(&self, cmd: vk::CommandBuffer) {
        let _ = self.record("cmd_end_rendering", format!("cmd={}", cmd.as_raw()));
    }

    unsafe fn submit(
        &self,
        cmd: vk::CommandBuffer,
        wait: vk::Semaphore,
        wait_stage: vk::PipelineStageFlags2,
        signal: vk::Semaphore,
        fence: vk::Fence,
    ) -> Result<()> {
        self.record(
            "submit",
            format!(
                "cmd={} wait={} stage={} signal={} fence={}",
                cmd.as_raw(),
                wait.as_raw(),
                stage_name(wait_stage),
                signal.as_raw(),
                fence.as_raw()
            ),
        )?;
        self.set_fence(fence, true);
        Ok(())
    }

    unsafe fn present(
        &self,
        swapchain: vk::SwapchainKHR,
        image_index: u32,
        wait: vk::Semaphore,
    ) -> Result<bool> {
        self.record(
            "present",
            format!(
                "swapchain={} image={image_index} wait={}",
                swapchain.as_raw(),
                wait.as_raw()
            ),
        )?;
        let raw = self.present_script.borrow_mut().pop_front().unwrap_or(Ok(false));
        map_present_result(raw)
    }

    unsafe fn wait_idle(&self) -> Result<()> {
        self.record("wait_idle", String::new())
    }

    unsafe fn destroy_image_view(&self, view: vk::ImageView) {
        let _ = self.record("destroy_image_view", format!("view={}", view.as_raw()));
    }

    unsafe fn destroy_command_pool(&self, pool: vk::CommandPool) {
        let _ = self.record("destroy_command_pool", format!("pool={}", pool.as_raw()));
        let buffers = self
            .pool_buffers
            .borrow_mut()
            .remove(&pool.as_raw())
            .unwrap_or(0);
        self.release("command_pool", 1);
        self.release("command_buffer", buffers);
    }

    unsafe fn destroy_semaphore(&self, semaphore: vk::Semaphore) {
        let _ = self.record("destroy_semaphore", format!("semaphore={}", semaphore.as_raw()));
        self.release("semaphore", 1);
    }

    unsafe fn destroy_fence(&self, fence: vk::Fence) {
        let _ = self.record("destroy_fence", format!("fence={}", fence.as_raw()));
        self.fences.borrow_mut().remove(&fence.as_raw());
        self.release("fence", 1);
    }

    unsafe fn destroy_descriptor_pool(&self, pool: vk::DescriptorPool) {
        let _ = self.record("destroy_descriptor_pool", format!("pool={}", pool.as_raw()));
    }

    unsafe fn destroy_swapchain(&self, swapchain: vk::SwapchainKHR) {
        let _ = self.record("destroy_swapchain", format!("swapchain={}", swapchain.as_raw()));
    }
}

/// Requests a close after a fixed number of polls.
pub struct CloseAfter(pub usize);

impl CloseSignal for CloseAfter {
    fn close_requested(&mut self) -> bool {
        if self.0 == 0 {
            return true;
        }
        self.0 -= 1;
        false
    }
}

/// Overlay that logs its hooks into the backend's call log.
pub struct RecordingOverlay {
    log: CallLog,
    /// When set, composite reports whether this lock was held.
    queue_probe: Option<Arc<Mutex<()>>>,
    fail_composite: bool,
}

impl RecordingOverlay {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            queue_probe: None,
            fail_composite: false,
        }
    }

    pub fn probing(mut self, lock: Arc<Mutex<()>>) -> Self {
        self.queue_probe = Some(lock);
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_composite = true;
        self
    }
}

impl Overlay for RecordingOverlay {
    fn on_frame_begin(&mut self) -> anyhow::Result<()> {
        self.log.borrow_mut().push("overlay.begin".to_string());
        Ok(())
    }

    fn on_frame_composite(&mut self, frame: &FrameContext) -> anyhow::Result<()> {
        let held = self
            .queue_probe
            .as_ref()
            .map(|lock| format!(" queue_locked={}", lock.is_locked()))
            .unwrap_or_default();
        self.log.borrow_mut().push(format!(
            "overlay.composite frame={} image={}{held}",
            frame.frame_index, frame.image_index
        ));
        if self.fail_composite {
            anyhow::bail!("overlay draw failed");
        }
        Ok(())
    }
}

impl Drop for RecordingOverlay {
    fn drop(&mut self) {
        self.log.borrow_mut().push("overlay.drop".to_string());
    }
}
