//! Fetch queue worker: drains one session's prompt queue against a
//! [`FrameGenerator`], one request at a time.
//!
//! # Per-item flow
//!
//! ```text
//! peek head ──▶ Fetching ──▶ generate (bounded by request_timeout)
//!                   ├─ Ok            → slot = Ready, pop head
//!                   ├─ Err, Retry    → RetryWait, sleep(backoff), fetch again
//!                   ├─ Err, Abandon  → slot = Abandoned, pop head, last_error
//!                   └─ Err, Halt     → Halted, status = Error, queue left as is
//! queue empty? ──▶ Idle
//! otherwise    ──▶ Draining, sleep(inter-request delay), next head
//! ```
//!
//! All state writes go through [`FrameWorker::update`], which refuses to touch
//! [`FrameState`] once its session id has moved on.  A worker whose session
//! was replaced therefore exits at its next write without leaking a frame.

use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::api::{Frame, FrameError, FrameGenerator};
use crate::story::Prompt;

use super::policy::{FailureAction, RetryPolicy};
use super::state::{FrameSlot, FrameState, FrameStatus, QueuedPrompt, SharedFrames, WorkerState};

/// How one queue item ended.
enum Settled {
    Ready(Frame),
    Abandoned(FrameError),
}

// ---------------------------------------------------------------------------
// FrameWorker
// ---------------------------------------------------------------------------

/// Drains the queue of a single session.  Spawn [`run`](Self::run) as a task.
pub struct FrameWorker {
    state: SharedFrames,
    session: u64,
    generator: Arc<dyn FrameGenerator>,
    policy: RetryPolicy,
    /// Single permit shared by every worker so that at most one frame
    /// request is in flight across sessions.
    in_flight: Arc<Semaphore>,
}

impl FrameWorker {
    pub fn new(
        state: SharedFrames,
        session: u64,
        generator: Arc<dyn FrameGenerator>,
        policy: RetryPolicy,
        in_flight: Arc<Semaphore>,
    ) -> Self {
        Self {
            state,
            session,
            generator,
            policy,
            in_flight,
        }
    }

    /// Run until the queue is drained, the service halts us, or the session
    /// is replaced.
    pub async fn run(self) {
        log::debug!("frames: worker started for session {}", self.session);

        loop {
            let head = match self.update(|st| st.queue.front().cloned()) {
                Some(Some(head)) => head,
                Some(None) => {
                    self.finish();
                    return;
                }
                None => return,
            };

            let settled = match self.settle(&head).await {
                Some(settled) => settled,
                None => return,
            };

            let more = self.update(|st| {
                st.queue.pop_front();
                match settled {
                    Settled::Ready(frame) => {
                        log::info!("frames: frame {} ready", head.slot + 1);
                        st.slots[head.slot] = FrameSlot::Ready(frame);
                    }
                    Settled::Abandoned(err) => {
                        log::warn!("frames: giving up on frame {}: {err}", head.slot + 1);
                        st.slots[head.slot] = FrameSlot::Abandoned;
                        st.last_error = Some(format!("Frame {} failed: {err}", head.slot + 1));
                    }
                }
                let more = !st.queue.is_empty();
                if more {
                    st.worker = WorkerState::Draining;
                }
                more
            });

            match more {
                Some(true) => tokio::time::sleep(self.policy.inter_request_delay()).await,
                Some(false) => {
                    self.finish();
                    return;
                }
                None => return,
            }
        }
    }

    /// Fetch `head` until it succeeds or is abandoned.  `None` means stop
    /// (halted or session replaced).
    async fn settle(&self, head: &QueuedPrompt) -> Option<Settled> {
        let mut retries: u32 = 0;

        loop {
            self.update(|st| st.worker = WorkerState::Fetching)?;

            let error = match self.fetch(&head.prompt).await? {
                Ok(frame) => return Some(Settled::Ready(frame)),
                Err(error) => error,
            };

            match self.policy.on_failure(retries, &error) {
                FailureAction::Retry { delay, counts } => {
                    log::warn!(
                        "frames: frame {} attempt failed ({error}); retrying in {:.1}s",
                        head.slot + 1,
                        delay.as_secs_f64()
                    );
                    if counts {
                        retries += 1;
                    }
                    self.update(|st| st.worker = WorkerState::RetryWait)?;
                    tokio::time::sleep(delay).await;
                }
                FailureAction::Abandon => return Some(Settled::Abandoned(error)),
                FailureAction::Halt => {
                    log::error!("frames: service disabled frame generation: {error}");
                    self.update(|st| {
                        st.worker = WorkerState::Halted;
                        st.status = FrameStatus::Error;
                        st.last_error = Some(error.to_string());
                    });
                    return None;
                }
            }
        }
    }

    /// One bounded request while holding the in-flight permit.
    async fn fetch(&self, prompt: &Prompt) -> Option<Result<Frame, FrameError>> {
        let _permit = self.in_flight.acquire().await.ok()?;
        if !self.is_current() {
            return None;
        }
        let result = tokio::time::timeout(self.policy.request_timeout, self.generator.generate(prompt))
            .await
            .unwrap_or(Err(FrameError::Timeout));
        Some(result)
    }

    fn finish(&self) {
        self.update(|st| {
            st.worker = WorkerState::Idle;
            st.status = if st.ready_count() == 0 && st.last_error.is_some() {
                FrameStatus::Error
            } else {
                FrameStatus::Idle
            };
            log::info!(
                "frames: session {} finished with {}/{} frames",
                st.session,
                st.ready_count(),
                st.slots.len()
            );
        });
    }

    fn is_current(&self) -> bool {
        self.update(|_| ()).is_some()
    }

    /// Apply `f` to the state if this worker's session is still current.
    fn update<R>(&self, f: impl FnOnce(&mut FrameState) -> R) -> Option<R> {
        let mut st = self.state.lock().ok()?;
        if st.session != self.session {
            return None;
        }
        Some(f(&mut st))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::state::new_shared_frames;
    use crate::frames::testing::{ok, ScriptedGenerator};
    use std::time::Duration;

    fn prompts(n: usize) -> Vec<Prompt> {
        (0..n)
            .map(|i| Prompt::new(format!("The tower bell rang for the {i}th time.")))
            .collect()
    }

    async fn run_session(n: usize, generator: Arc<ScriptedGenerator>) -> SharedFrames {
        let state = new_shared_frames();
        let session = state.lock().unwrap().reset(prompts(n));
        let worker = FrameWorker::new(
            Arc::clone(&state),
            session,
            generator,
            RetryPolicy::default(),
            Arc::new(Semaphore::new(1)),
        );
        worker.run().await;
        state
    }

    #[tokio::test(start_paused = true)]
    async fn drains_queue_in_order() {
        let gen = Arc::new(ScriptedGenerator::always_ok());
        let state = run_session(3, Arc::clone(&gen)).await;

        let st = state.lock().unwrap();
        assert!(st.queue.is_empty());
        assert_eq!(st.ready_count(), 3);
        assert_eq!(st.worker, WorkerState::Idle);
        assert_eq!(st.status, FrameStatus::Idle);
        assert_eq!(gen.requests(), 3);
        assert_eq!(gen.prompts()[1], prompts(3)[1].as_str());
        assert_eq!(st.slots[2].frame().unwrap().image, format!("frame-for:{}", prompts(3)[2]));
    }

    #[tokio::test(start_paused = true)]
    async fn two_failures_then_success_appends_once() {
        let gen = Arc::new(ScriptedGenerator::new(vec![
            Err(FrameError::Timeout),
            Err(FrameError::Request("connection reset".into())),
            ok(),
        ]));
        let state = run_session(1, Arc::clone(&gen)).await;

        let st = state.lock().unwrap();
        assert_eq!(gen.requests(), 3);
        assert_eq!(st.ready_count(), 1);
        assert!(st.queue.is_empty());
        assert!(st.last_error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn four_failures_abandon_and_continue() {
        let failure = || -> Result<(), FrameError> {
            Err(FrameError::Http {
                status: 503,
                message: "overloaded".into(),
            })
        };
        let gen = Arc::new(ScriptedGenerator::new(vec![
            failure(),
            failure(),
            failure(),
            failure(),
            ok(),
        ]));
        let state = run_session(2, Arc::clone(&gen)).await;

        let st = state.lock().unwrap();
        assert_eq!(gen.requests(), 5);
        assert_eq!(st.slots[0], FrameSlot::Abandoned);
        assert!(st.slots[1].frame().is_some());
        assert!(st.queue.is_empty());
        assert!(st.last_error.as_deref().unwrap().contains("Frame 1 failed"));
        assert_eq!(st.status, FrameStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn all_abandoned_ends_in_error_status() {
        let gen = Arc::new(ScriptedGenerator::always(Err(FrameError::Malformed("no image".into()))));
        let state = run_session(1, Arc::clone(&gen)).await;

        let st = state.lock().unwrap();
        assert_eq!(gen.requests(), 4);
        assert_eq!(st.status, FrameStatus::Error);
        assert_eq!(st.worker, WorkerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn disable_flag_halts_without_draining() {
        let gen = Arc::new(ScriptedGenerator::new(vec![
            ok(),
            Err(FrameError::Disabled("credits exhausted".into())),
        ]));
        let state = run_session(4, Arc::clone(&gen)).await;

        let st = state.lock().unwrap();
        assert_eq!(gen.requests(), 2);
        assert_eq!(st.worker, WorkerState::Halted);
        assert_eq!(st.status, FrameStatus::Error);
        assert_eq!(st.ready_count(), 1);
        // Remaining items are left in place for inspection.
        let remaining: Vec<usize> = st.queue.iter().map(|q| q.slot).collect();
        assert_eq!(remaining, vec![1, 2, 3]);
        assert_eq!(st.slots[1], FrameSlot::Pending);
        assert!(st.last_error.as_deref().unwrap().contains("credits exhausted"));
    }

    #[tokio::test(start_paused = true)]
    async fn server_retry_after_is_not_counted() {
        let limited = || -> Result<(), FrameError> {
            Err(FrameError::RateLimited {
                retry_after: Some(Duration::from_secs(1)),
            })
        };
        let gen = Arc::new(ScriptedGenerator::new(vec![
            limited(),
            limited(),
            limited(),
            limited(),
            limited(),
            ok(),
        ]));
        let state = run_session(1, Arc::clone(&gen)).await;

        assert_eq!(gen.requests(), 6);
        assert_eq!(state.lock().unwrap().ready_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_generator_times_out_and_retries() {
        let gen = Arc::new(
            ScriptedGenerator::new(vec![ok(), ok()])
                .with_first_delay(Duration::from_secs(60)),
        );
        let state = run_session(1, Arc::clone(&gen)).await;

        // First attempt exceeds the 15 s request timeout, second succeeds.
        assert_eq!(gen.requests(), 2);
        assert_eq!(state.lock().unwrap().ready_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_session_writes_nothing() {
        let state = new_shared_frames();
        let session = state.lock().unwrap().reset(prompts(2));
        // A newer session replaces the one the worker was created for.
        state.lock().unwrap().reset(prompts(1));

        let gen = Arc::new(ScriptedGenerator::always_ok());
        FrameWorker::new(
            Arc::clone(&state),
            session,
            gen.clone(),
            RetryPolicy::default(),
            Arc::new(Semaphore::new(1)),
        )
        .run()
        .await;

        let st = state.lock().unwrap();
        assert_eq!(gen.requests(), 0);
        assert_eq!(st.slots, vec![FrameSlot::Pending]);
    }
}
