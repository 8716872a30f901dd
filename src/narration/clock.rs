//! Simulated narration playback clock.
//!
//! Stands in for a speech engine's progress events: the position advances in
//! real (tokio) time while playing, holds still while paused, and never
//! leaves `[0, duration]`.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

// ---------------------------------------------------------------------------
// NarrationClock
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct NarrationClock {
    duration: Duration,
    /// Position accumulated before the current play run.
    offset: Duration,
    /// Start of the current play run; `None` while paused or stopped.
    started: Option<Instant>,
}

impl NarrationClock {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            offset: Duration::ZERO,
            started: None,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Current playback position, clamped to the duration.
    pub fn position(&self) -> Duration {
        let elapsed = self.started.map(|t| t.elapsed()).unwrap_or_default();
        (self.offset + elapsed).min(self.duration)
    }

    pub fn position_secs(&self) -> f64 {
        self.position().as_secs_f64()
    }

    /// Start or resume.  Playing a finished clock restarts it from zero.
    pub fn play(&mut self) {
        if self.is_finished() {
            self.offset = Duration::ZERO;
        }
        if self.started.is_none() {
            self.started = Some(Instant::now());
            log::debug!("narration: playing from {:.2}s", self.offset.as_secs_f64());
        }
    }

    pub fn pause(&mut self) {
        if self.started.is_some() {
            self.offset = self.position();
            self.started = None;
            log::debug!("narration: paused at {:.2}s", self.offset.as_secs_f64());
        }
    }

    /// Jump to `position`, keeping the play/pause state.
    pub fn seek(&mut self, position: Duration) {
        self.offset = position.min(self.duration);
        if self.started.is_some() {
            self.started = Some(Instant::now());
        }
    }

    /// Pause and rewind to the start.
    pub fn stop(&mut self) {
        self.offset = Duration::ZERO;
        self.started = None;
    }

    pub fn is_playing(&self) -> bool {
        self.started.is_some() && !self.is_finished()
    }

    pub fn is_finished(&self) -> bool {
        self.position() >= self.duration
    }
}

// ---------------------------------------------------------------------------
// Ticker
// ---------------------------------------------------------------------------

/// Publish the clock's position (seconds) every `tick` until it finishes.
///
/// The last value sent is the final position.  The task also stops once
/// every receiver is gone.
pub fn spawn_ticker(
    clock: Arc<Mutex<NarrationClock>>,
    tick: Duration,
) -> (watch::Receiver<f64>, JoinHandle<()>) {
    let initial = clock.lock().map(|c| c.position_secs()).unwrap_or(0.0);
    let (tx, rx) = watch::channel(initial);

    let handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(tick.max(Duration::from_millis(1)));
        loop {
            interval.tick().await;
            let (position, finished) = match clock.lock() {
                Ok(c) => (c.position_secs(), c.is_finished()),
                Err(e) => {
                    log::error!("narration: clock lock poisoned: {e}");
                    return;
                }
            };
            if tx.send(position).is_err() || finished {
                log::debug!("narration: ticker stopped at {position:.2}s");
                return;
            }
        }
    });

    (rx, handle)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    #[tokio::test(start_paused = true)]
    async fn advances_only_while_playing() {
        let mut clock = NarrationClock::new(Duration::from_secs(10));
        advance(Duration::from_secs(2)).await;
        assert_eq!(clock.position(), Duration::ZERO);

        clock.play();
        advance(Duration::from_secs(3)).await;
        assert_eq!(clock.position(), Duration::from_secs(3));
        assert!(clock.is_playing());

        clock.pause();
        advance(Duration::from_secs(5)).await;
        assert_eq!(clock.position(), Duration::from_secs(3));
        assert!(!clock.is_playing());

        clock.play();
        advance(Duration::from_secs(1)).await;
        assert_eq!(clock.position(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn clamps_at_duration_and_finishes() {
        let mut clock = NarrationClock::new(Duration::from_secs(4));
        clock.play();
        advance(Duration::from_secs(9)).await;

        assert_eq!(clock.position(), Duration::from_secs(4));
        assert!(clock.is_finished());
        assert!(!clock.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn seek_and_stop() {
        let mut clock = NarrationClock::new(Duration::from_secs(10));
        clock.seek(Duration::from_secs(7));
        assert_eq!(clock.position(), Duration::from_secs(7));

        clock.seek(Duration::from_secs(60));
        assert_eq!(clock.position(), Duration::from_secs(10));

        clock.play();
        clock.seek(Duration::from_secs(2));
        advance(Duration::from_secs(1)).await;
        assert_eq!(clock.position(), Duration::from_secs(3));

        clock.stop();
        assert_eq!(clock.position(), Duration::ZERO);
        assert!(!clock.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn replay_after_finish_restarts() {
        let mut clock = NarrationClock::new(Duration::from_secs(2));
        clock.play();
        advance(Duration::from_secs(3)).await;
        assert!(clock.is_finished());

        clock.pause();
        clock.play();
        assert_eq!(clock.position(), Duration::ZERO);
        assert!(clock.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_publishes_until_finished() {
        let clock = Arc::new(Mutex::new(NarrationClock::new(Duration::from_secs(1))));
        clock.lock().unwrap().play();

        let (mut rx, handle) = spawn_ticker(Arc::clone(&clock), Duration::from_millis(250));
        let mut seen = Vec::new();
        while rx.changed().await.is_ok() {
            seen.push(*rx.borrow_and_update());
        }
        handle.await.unwrap();

        assert!(seen.len() >= 4);
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(seen.last().copied(), Some(1.0));
    }
}
