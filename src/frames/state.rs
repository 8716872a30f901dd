//! Frame session state shared between the worker, the clock mapper and the
//! presentation layer.
//!
//! [`WorkerState`] drives the worker's state machine.  [`FrameState`] is the
//! single source of truth for one generation session: the prompt queue, the
//! order-aligned frame slots, the displayed index and the last error.
//!
//! [`SharedFrames`] is a type alias for `Arc<Mutex<FrameState>>`, cheap to
//! clone and safe to share across tasks.  Every session gets a fresh `session`
//! id; writers compare ids before mutating so results from an abandoned
//! session can never land in a newer one.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::api::Frame;
use crate::story::Prompt;

// ---------------------------------------------------------------------------
// WorkerState
// ---------------------------------------------------------------------------

/// States of the fetch queue worker.
///
/// ```text
/// Idle ──queue non-empty──▶ Fetching
///                             ├─ success  ──▶ Draining ──delay──▶ Fetching
///                             │               (or Idle when the queue is empty)
///                             ├─ failure  ──▶ RetryWait ──backoff──▶ Fetching
///                             ├─ exhausted ─▶ head abandoned, continue
///                             └─ disabled ──▶ Halted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkerState {
    /// Nothing to do: queue empty, drained, or no endpoint configured.
    #[default]
    Idle,
    /// Exactly one request is in flight.
    Fetching,
    /// Waiting out a backoff before retrying the queue head.
    RetryWait,
    /// Queue non-empty; waiting out the inter-request delay.
    Draining,
    /// Terminal: the service disabled frame generation.
    Halted,
}

impl WorkerState {
    /// Returns `true` while the worker still has work scheduled.
    ///
    /// ```
    /// use story_frames::frames::WorkerState;
    ///
    /// assert!(!WorkerState::Idle.is_busy());
    /// assert!(WorkerState::Fetching.is_busy());
    /// assert!(WorkerState::RetryWait.is_busy());
    /// assert!(WorkerState::Draining.is_busy());
    /// assert!(!WorkerState::Halted.is_busy());
    /// ```
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            WorkerState::Fetching | WorkerState::RetryWait | WorkerState::Draining
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            WorkerState::Idle => "Idle",
            WorkerState::Fetching => "Fetching",
            WorkerState::RetryWait => "Retrying",
            WorkerState::Draining => "Waiting",
            WorkerState::Halted => "Halted",
        }
    }
}

// ---------------------------------------------------------------------------
// FrameStatus
// ---------------------------------------------------------------------------

/// Loading / idle / error tri-state shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameStatus {
    #[default]
    Idle,
    Loading,
    Error,
}

// ---------------------------------------------------------------------------
// FrameSlot
// ---------------------------------------------------------------------------

/// One position in the order-aligned frame buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameSlot {
    /// Not fetched yet (or the session halted before reaching it).
    Pending,
    Ready(Frame),
    /// Retries exhausted; this sentence has no frame.
    Abandoned,
}

impl FrameSlot {
    pub fn frame(&self) -> Option<&Frame> {
        match self {
            FrameSlot::Ready(frame) => Some(frame),
            _ => None,
        }
    }
}

/// A prompt waiting in the queue, tagged with its slot index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedPrompt {
    pub slot: usize,
    pub prompt: Prompt,
}

// ---------------------------------------------------------------------------
// FrameState
// ---------------------------------------------------------------------------

/// Everything one generation session owns.
#[derive(Debug, Default)]
pub struct FrameState {
    /// Monotonic id; bumped by [`FrameState::reset`].
    pub session: u64,
    pub worker: WorkerState,
    pub status: FrameStatus,
    /// Prompts not yet settled.  Only the worker pops from it.
    pub queue: VecDeque<QueuedPrompt>,
    /// One slot per prompt, in story order.
    pub slots: Vec<FrameSlot>,
    /// Slot currently shown, committed by the clock mapper.
    pub displayed: Option<usize>,
    pub last_error: Option<String>,
}

impl FrameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the session with a fresh queue for `prompts`.
    ///
    /// Returns the new session id.  The previous queue, slots, displayed
    /// index and error are discarded.
    pub fn reset(&mut self, prompts: Vec<Prompt>) -> u64 {
        self.session += 1;
        self.slots = vec![FrameSlot::Pending; prompts.len()];
        self.queue = prompts
            .into_iter()
            .enumerate()
            .map(|(slot, prompt)| QueuedPrompt { slot, prompt })
            .collect();
        self.worker = WorkerState::Idle;
        self.status = FrameStatus::Idle;
        self.displayed = None;
        self.last_error = None;
        self.session
    }

    /// Number of slots holding a frame.
    pub fn ready_count(&self) -> usize {
        self.slots.iter().filter(|s| s.frame().is_some()).count()
    }

    pub fn frames(&self) -> impl Iterator<Item = (usize, &Frame)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.frame().map(|f| (i, f)))
    }

    /// Snapshot for the presentation layer.
    pub fn view(&self) -> FrameView {
        FrameView {
            status: self.status,
            displayed: self
                .displayed
                .and_then(|i| self.slots.get(i).and_then(FrameSlot::frame).map(|f| (i, f.clone()))),
            ready: self.ready_count(),
            total: self.slots.len(),
            last_error: self.last_error.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// FrameView
// ---------------------------------------------------------------------------

/// Immutable snapshot of what the presentation surface should show.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameView {
    pub status: FrameStatus,
    pub displayed: Option<(usize, Frame)>,
    pub ready: usize,
    pub total: usize,
    pub last_error: Option<String>,
}

impl FrameView {
    /// "Frame 2 of 5", or `None` when nothing is displayed.
    pub fn caption(&self) -> Option<String> {
        self.displayed
            .as_ref()
            .map(|(i, _)| format!("Frame {} of {}", i + 1, self.total))
    }
}

// ---------------------------------------------------------------------------
// SharedFrames
// ---------------------------------------------------------------------------

/// Thread-safe handle to [`FrameState`].
///
/// Lock for a short critical section; do **not** hold the lock across
/// `.await` points.
pub type SharedFrames = Arc<Mutex<FrameState>>;

pub fn new_shared_frames() -> SharedFrames {
    Arc::new(Mutex::new(FrameState::new()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn prompts(n: usize) -> Vec<Prompt> {
        (0..n).map(|i| Prompt::new(format!("prompt {i}"))).collect()
    }

    #[test]
    fn default_state_is_idle_and_empty() {
        let st = FrameState::new();
        assert_eq!(st.worker, WorkerState::Idle);
        assert_eq!(WorkerState::default(), WorkerState::Idle);
        assert_eq!(st.status, FrameStatus::Idle);
        assert!(st.slots.is_empty());
        assert!(st.view().displayed.is_none());
    }

    #[test]
    fn reset_aligns_queue_with_slots() {
        let mut st = FrameState::new();
        let id = st.reset(prompts(3));

        assert_eq!(id, 1);
        assert_eq!(st.slots, vec![FrameSlot::Pending; 3]);
        let slots: Vec<usize> = st.queue.iter().map(|q| q.slot).collect();
        assert_eq!(slots, vec![0, 1, 2]);
    }

    #[test]
    fn reset_discards_previous_session() {
        let mut st = FrameState::new();
        st.reset(prompts(2));
        st.slots[0] = FrameSlot::Ready(Frame::new("old"));
        st.displayed = Some(0);
        st.last_error = Some("boom".into());
        st.status = FrameStatus::Error;

        let id = st.reset(prompts(1));

        assert_eq!(id, 2);
        assert_eq!(st.ready_count(), 0);
        assert!(st.displayed.is_none());
        assert!(st.last_error.is_none());
        assert_eq!(st.status, FrameStatus::Idle);
    }

    #[test]
    fn view_reports_displayed_frame_and_caption() {
        let mut st = FrameState::new();
        st.reset(prompts(4));
        st.slots[1] = FrameSlot::Ready(Frame::new("img-1"));
        st.slots[2] = FrameSlot::Abandoned;
        st.displayed = Some(1);

        let view = st.view();
        assert_eq!(view.ready, 1);
        assert_eq!(view.total, 4);
        assert_eq!(view.displayed, Some((1, Frame::new("img-1"))));
        assert_eq!(view.caption().as_deref(), Some("Frame 2 of 4"));
    }

    #[test]
    fn labels() {
        assert_eq!(WorkerState::Idle.label(), "Idle");
        assert_eq!(WorkerState::RetryWait.label(), "Retrying");
        assert_eq!(WorkerState::Halted.label(), "Halted");
    }

    #[test]
    fn shared_frames_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SharedFrames>();
    }
}
