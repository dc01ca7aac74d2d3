//! Frame loop controller.
//!
//! This module provides [`FrameLoop`], which drives one logical frame at a
//! time through a [`FrameBackend`]:
//!
//! ```text
//! s = frame_counter % MAX_FRAMES_IN_FLIGHT
//!
//! 1. wait      slot s fence (no timeout; failure is fatal)
//! 2. update    iteration cap, FPS window
//! 3. acquire   signals slot s acquire semaphore      stale -> recovery, stop
//! 4. reset     slot s fence
//! 5. submit    record + submit on the compute queue
//! 6. present   waits slot s finish semaphore         stale -> recovery
//! 7. advance   frame_counter += 1, only if 3-6 ran without recovery
//! ```
//!
//! The fence is reset after a successful acquire, never before. A stale
//! acquire therefore leaves the fence signaled and the slot can be retried
//! without deadlocking on step 1.
//!
//! # Resize recovery
//!
//! When the swapchain goes stale or the window reports a resize, the loop
//! enters [`ResizeRecovery::Pending`]. Recovery waits for a non-zero
//! framebuffer (a minimized window reports zero), then idles the device,
//! recreates the swapchain and rebuilds the attachments, exactly once.
//! Waiting does not block: while the size is zero, [`FrameLoop::render_frame`]
//! returns [`FrameOutcome::Suspended`] and the caller goes back to the event
//! loop.

use tracing::{debug, info};

use fractal_rhi::RhiResult;
use fractal_rhi::sync::MAX_FRAMES_IN_FLIGHT;
use fractal_view::ParameterState;

use crate::diagnostics::FpsCounter;
use crate::fractal_pass::FractalPushConstants;

/// GPU operations the frame loop sequences.
///
/// Slot indices are in `0..MAX_FRAMES_IN_FLIGHT`. Image indices come from
/// [`acquire`](Self::acquire) and are unrelated to slot indices.
pub trait FrameBackend {
    /// Blocks until the last submission from `slot` has retired.
    fn wait_for_slot(&mut self, slot: usize) -> RhiResult<()>;

    /// Acquires a swapchain image, signaling the slot's acquire semaphore.
    ///
    /// Returns `None` if the swapchain is stale.
    fn acquire(&mut self, slot: usize) -> RhiResult<Option<u32>>;

    /// Unsignals the slot's fence ahead of a submission.
    fn reset_slot(&mut self, slot: usize) -> RhiResult<()>;

    /// Records the fractal pass into the slot's command buffer targeting
    /// `image_index` and submits it.
    fn record_and_submit(
        &mut self,
        slot: usize,
        image_index: u32,
        push_constants: &FractalPushConstants,
    ) -> RhiResult<()>;

    /// Presents `image_index` once the slot's finish semaphore signals.
    ///
    /// Returns `true` if the swapchain is stale.
    fn present(&mut self, slot: usize, image_index: u32) -> RhiResult<bool>;

    /// Waits until the device has no work in flight.
    fn wait_idle(&mut self) -> RhiResult<()>;

    /// Recreates the swapchain at `width`x`height` and rebuilds everything
    /// derived from its images. Called only after [`wait_idle`](Self::wait_idle).
    fn recreate_swapchain(&mut self, width: u32, height: u32) -> RhiResult<()>;
}

/// Whether the swapchain needs rebuilding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResizeRecovery {
    #[default]
    Idle,
    Pending,
}

/// What [`ResizeRecovery::poll`] asks the caller to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecoveryStep {
    /// No recovery requested.
    NotNeeded,
    /// Recovery requested but the framebuffer has zero area.
    Waiting,
    /// Rebuild at this size. Recovery is complete once the rebuild succeeds.
    Rebuild { width: u32, height: u32 },
}

impl ResizeRecovery {
    pub fn request(&mut self) {
        *self = Self::Pending;
    }

    pub fn is_pending(&self) -> bool {
        *self == Self::Pending
    }

    /// Advances recovery given the current framebuffer size.
    pub fn poll(&mut self, framebuffer_size: (u32, u32)) -> RecoveryStep {
        match *self {
            Self::Idle => RecoveryStep::NotNeeded,
            Self::Pending => {
                let (width, height) = framebuffer_size;
                if width == 0 || height == 0 {
                    return RecoveryStep::Waiting;
                }
                *self = Self::Idle;
                RecoveryStep::Rebuild { width, height }
            }
        }
    }
}

/// How a call to [`FrameLoop::render_frame`] ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The frame was submitted and presented; the counter advanced.
    Presented,
    /// Acquire or present reported a stale swapchain; recovery ran or is
    /// pending. The counter did not advance.
    Stale,
    /// A pending recovery rebuilt the swapchain; no frame was rendered.
    Recovered,
    /// Waiting for a non-zero framebuffer; no GPU work was done.
    Suspended,
}

/// Result of one frame, including diagnostics the user asked to see.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameReport {
    pub outcome: FrameOutcome,
    /// New iteration cap, if it changed and printing is on.
    pub iteration_cap: Option<u32>,
    /// Average FPS, if a window completed and printing is on.
    pub fps: Option<f32>,
}

impl FrameReport {
    fn bare(outcome: FrameOutcome) -> Self {
        Self {
            outcome,
            iteration_cap: None,
            fps: None,
        }
    }
}

/// Drives frames through a [`FrameBackend`].
pub struct FrameLoop<B: FrameBackend> {
    backend: B,
    frame_counter: u64,
    recovery: ResizeRecovery,
    fps: FpsCounter,
}

impl<B: FrameBackend> FrameLoop<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            frame_counter: 0,
            recovery: ResizeRecovery::Idle,
            fps: FpsCounter::new(),
        }
    }

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Number of frames presented without recovery.
    #[inline]
    pub fn frame_counter(&self) -> u64 {
        self.frame_counter
    }

    /// Slot the next frame will use.
    #[inline]
    pub fn current_slot(&self) -> usize {
        (self.frame_counter % MAX_FRAMES_IN_FLIGHT as u64) as usize
    }

    #[inline]
    pub fn recovery(&self) -> ResizeRecovery {
        self.recovery
    }

    /// Schedules a swapchain rebuild, e.g. after a window resize.
    pub fn request_recovery(&mut self) {
        if !self.recovery.is_pending() {
            debug!("Swapchain recovery requested");
        }
        self.recovery.request();
    }

    /// Runs one logical frame.
    ///
    /// `framebuffer_size` is the window's current size in pixels and
    /// `delta_secs` the time since the previous frame.
    ///
    /// # Errors
    ///
    /// Every error is fatal: fence wait failure, submission failure, device
    /// idle failure or swapchain recreation failure.
    pub fn render_frame(
        &mut self,
        params: &mut ParameterState,
        framebuffer_size: (u32, u32),
        delta_secs: f32,
    ) -> RhiResult<FrameReport> {
        match self.recover(framebuffer_size)? {
            RecoveryStep::NotNeeded => {}
            RecoveryStep::Waiting => return Ok(FrameReport::bare(FrameOutcome::Suspended)),
            RecoveryStep::Rebuild { .. } => {
                return Ok(FrameReport::bare(FrameOutcome::Recovered));
            }
        }

        let slot = self.current_slot();

        self.backend.wait_for_slot(slot)?;

        let mut report = FrameReport::bare(FrameOutcome::Presented);
        let changed_cap = params.update_iteration_cap();
        if params.print_iteration_count() {
            report.iteration_cap = changed_cap;
        }
        let fps = self.fps.record(delta_secs);
        if params.print_fps() {
            report.fps = fps;
        }

        let Some(image_index) = self.backend.acquire(slot)? else {
            debug!("Acquire on slot {} found a stale swapchain", slot);
            report.outcome = self.on_stale(framebuffer_size)?;
            return Ok(report);
        };

        self.backend.reset_slot(slot)?;

        let push_constants = FractalPushConstants::from_params(params);
        self.backend
            .record_and_submit(slot, image_index, &push_constants)?;

        if self.backend.present(slot, image_index)? {
            debug!("Present of image {} found a stale swapchain", image_index);
            report.outcome = self.on_stale(framebuffer_size)?;
            return Ok(report);
        }

        self.frame_counter += 1;
        Ok(report)
    }

    /// Idles the device so resources can be released.
    pub fn shutdown(&mut self) -> RhiResult<()> {
        self.backend.wait_idle()
    }

    fn on_stale(&mut self, framebuffer_size: (u32, u32)) -> RhiResult<FrameOutcome> {
        self.recovery.request();
        self.recover(framebuffer_size)?;
        Ok(FrameOutcome::Stale)
    }

    fn recover(&mut self, framebuffer_size: (u32, u32)) -> RhiResult<RecoveryStep> {
        let step = self.recovery.poll(framebuffer_size);
        if let RecoveryStep::Rebuild { width, height } = step {
            self.backend.wait_idle()?;
            self.backend.recreate_swapchain(width, height)?;
            info!("Swapchain rebuilt at {}x{}", width, height);
        }
        Ok(step)
    }
}
