//! Playback clock mapper: narration position → displayed frame slot.
//!
//! The mapping itself is pure ([`frame_index`], [`resolve_slot`]).
//! [`FrameClock`] adds the presentation delay: every position update
//! re-arms a [`Debouncer`], and only the last update in a burst commits
//! `FrameState::displayed`.

use std::time::Duration;

use super::debounce::Debouncer;
use super::state::{FrameSlot, SharedFrames};

/// `floor(position / total * len)` clamped to `[0, len - 1]`.
///
/// `None` when there is nothing to index (`len == 0`) or the duration is not
/// a positive, finite number.
///
/// ```
/// use story_frames::frames::frame_index;
///
/// assert_eq!(frame_index(6.0, 10.0, 5), Some(3));
/// assert_eq!(frame_index(99.0, 10.0, 5), Some(4));
/// assert_eq!(frame_index(1.0, 10.0, 0), None);
/// assert_eq!(frame_index(1.0, 0.0, 5), None);
/// ```
pub fn frame_index(position: f64, total: f64, len: usize) -> Option<usize> {
    if len == 0 || !(total > 0.0) || !total.is_finite() {
        return None;
    }
    let last = len - 1;
    if position >= total {
        return Some(last);
    }
    // NaN and negative positions fall through to the first slot.
    let raw = (position.max(0.0) / total * len as f64).floor();
    Some(if raw >= last as f64 { last } else { raw as usize })
}

/// Pick the slot to show for `index`: the nearest ready slot at or before
/// it, otherwise the nearest ready slot after it.
pub fn resolve_slot(slots: &[FrameSlot], index: usize) -> Option<usize> {
    if slots.is_empty() {
        return None;
    }
    let index = index.min(slots.len() - 1);
    let is_ready = |i: &usize| slots[*i].frame().is_some();
    (0..=index)
        .rev()
        .find(is_ready)
        .or_else(|| (index + 1..slots.len()).find(is_ready))
}

/// Slot that should be displayed for `position` given the current slots.
pub fn displayed_slot(slots: &[FrameSlot], position: f64, total: f64) -> Option<usize> {
    frame_index(position, total, slots.len()).and_then(|i| resolve_slot(slots, i))
}

// ---------------------------------------------------------------------------
// FrameClock
// ---------------------------------------------------------------------------

/// Debounced committer of the displayed frame index.
pub struct FrameClock {
    state: SharedFrames,
    debouncer: Debouncer,
}

impl FrameClock {
    /// `delay` is usually `FrameConfig::commit_delay()` (one frame at the
    /// target fps).
    pub fn new(state: SharedFrames, delay: Duration) -> Self {
        Self {
            state,
            debouncer: Debouncer::new(delay),
        }
    }

    /// Feed a new narration position.  The index is computed when the delay
    /// elapses, against the slots present at that moment.
    ///
    /// Must be called from within a tokio runtime.
    pub fn on_time_update(&mut self, position: f64, total: f64) {
        let session = match self.state.lock() {
            Ok(st) => st.session,
            Err(_) => return,
        };
        let state = SharedFrames::clone(&self.state);
        self.debouncer.schedule(async move {
            let Ok(mut st) = state.lock() else {
                return;
            };
            if st.session != session {
                return;
            }
            let next = displayed_slot(&st.slots, position, total);
            if next != st.displayed {
                log::debug!("frames: displaying slot {next:?} at {position:.2}s");
                st.displayed = next;
            }
        });
    }

    /// Drop a pending commit, e.g. when narration stops.
    pub fn cancel(&mut self) {
        self.debouncer.cancel();
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
