//! Frame pipeline controller: owns the session lifecycle.
//!
//! [`FramePipeline`] is the only place that creates sessions.  Every call to
//! [`set_story`](FramePipeline::set_story):
//!
//! 1. aborts the running worker task, dropping any pending backoff timer or
//!    in-flight request,
//! 2. segments the new text and resets [`FrameState`](super::FrameState)
//!    under a new session id,
//! 3. spawns a fresh [`FrameWorker`] when a generator is configured.
//!
//! Without a generator the queue is built but never drained; that is a
//! valid idle state, not an error.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::api::{FrameGenerator, HttpFrameGenerator};
use crate::config::AppConfig;
use crate::story::PromptSegmenter;

use super::policy::RetryPolicy;
use super::state::{new_shared_frames, FrameStatus, SharedFrames};
use super::worker::FrameWorker;

pub struct FramePipeline {
    state: SharedFrames,
    generator: Option<Arc<dyn FrameGenerator>>,
    segmenter: PromptSegmenter,
    policy: RetryPolicy,
    in_flight: Arc<Semaphore>,
    task: Option<JoinHandle<()>>,
}

impl FramePipeline {
    pub fn new(
        generator: Option<Arc<dyn FrameGenerator>>,
        segmenter: PromptSegmenter,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            state: new_shared_frames(),
            generator,
            segmenter,
            policy,
            in_flight: Arc::new(Semaphore::new(1)),
            task: None,
        }
    }

    /// Build from config, using the HTTP generator when a server URL is
    /// cached and frames are enabled.
    pub fn from_config(config: &AppConfig) -> Self {
        let generator: Option<Arc<dyn FrameGenerator>> = match &config.server.base_url {
            Some(url) if config.frames.enabled => {
                Some(Arc::new(HttpFrameGenerator::from_config(url, &config.frames)))
            }
            _ => None,
        };
        if generator.is_none() {
            log::info!("frames: no frame endpoint configured; frames will not be generated");
        }
        Self::new(
            generator,
            PromptSegmenter::from_config(&config.frames),
            RetryPolicy::from_config(&config.frames),
        )
    }

    /// Shared state handle for the clock mapper and the presentation layer.
    pub fn state(&self) -> SharedFrames {
        Arc::clone(&self.state)
    }

    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    /// Start a new session for `text`, discarding the previous one.
    ///
    /// Must be called from within a tokio runtime.  Returns the number of
    /// prompts queued.
    pub fn set_story(&mut self, text: &str) -> usize {
        self.cancel();

        let prompts = self.segmenter.segment(text);
        let count = prompts.len();

        let session = match self.state.lock() {
            Ok(mut st) => {
                let session = st.reset(prompts);
                if count > 0 && self.generator.is_some() {
                    st.status = FrameStatus::Loading;
                }
                session
            }
            Err(e) => {
                log::error!("frames: state lock poisoned: {e}");
                return 0;
            }
        };

        log::info!("frames: session {session} queued {count} prompt(s)");

        if let Some(generator) = &self.generator {
            if count > 0 {
                let worker = FrameWorker::new(
                    Arc::clone(&self.state),
                    session,
                    Arc::clone(generator),
                    self.policy.clone(),
                    Arc::clone(&self.in_flight),
                );
                self.task = Some(tokio::spawn(worker.run()));
            }
        }

        count
    }

    /// Abort the running worker, if any.  The session's state is left as is.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            if !task.is_finished() {
                log::debug!("frames: abandoning in-progress session");
            }
            task.abort();
        }
    }

    /// Wait for the current worker to stop (drained, halted or cancelled).
    pub async fn join(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    log::warn!("frames: worker task failed: {e}");
                }
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for FramePipeline {
    fn drop(&mut self) {
        self.cancel();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::FrameError;
    use crate::frames::state::WorkerState;
    use crate::frames::testing::ScriptedGenerator;
    use std::time::Duration;

    const STORY_A: &str = "The fox crept along the frozen riverbank. \
                           Snow muffled every careful step it took. \
                           A lantern glowed in the distant farmhouse.";
    const STORY_B: &str = "Captain Mara charted a course through the storm. \
                           Her crew lashed the sails against the gale.";

    fn pipeline(gen: Option<Arc<ScriptedGenerator>>) -> FramePipeline {
        FramePipeline::new(
            gen.map(|g| g as Arc<dyn FrameGenerator>),
            PromptSegmenter::new(8, 20, true),
            RetryPolicy::default(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn drains_story_into_frames() {
        let gen = Arc::new(ScriptedGenerator::always_ok());
        let mut p = pipeline(Some(Arc::clone(&gen)));

        assert_eq!(p.set_story(STORY_A), 3);
        assert_eq!(p.state().lock().unwrap().status, FrameStatus::Loading);
        p.join().await;

        let st = p.state();
        let st = st.lock().unwrap();
        assert_eq!(st.ready_count(), 3);
        assert_eq!(st.status, FrameStatus::Idle);
        assert_eq!(gen.max_in_flight(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn without_generator_queue_is_never_drained() {
        let mut p = pipeline(None);

        assert_eq!(p.set_story(STORY_A), 3);
        assert!(!p.is_running());
        p.join().await;

        let st = p.state();
        let st = st.lock().unwrap();
        assert_eq!(st.queue.len(), 3);
        assert_eq!(st.status, FrameStatus::Idle);
        assert_eq!(st.worker, WorkerState::Idle);
        assert!(st.last_error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn story_without_prompts_issues_no_requests() {
        let gen = Arc::new(ScriptedGenerator::always_ok());
        let mut p = pipeline(Some(Arc::clone(&gen)));

        assert_eq!(p.set_story("Hi. Ok. Bye!"), 0);
        p.join().await;

        assert_eq!(gen.requests(), 0);
        assert_eq!(p.state().lock().unwrap().status, FrameStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn switching_story_discards_previous_session() {
        let gen = Arc::new(ScriptedGenerator::always_ok().with_delay(Duration::from_secs(3)));
        let mut p = pipeline(Some(Arc::clone(&gen)));

        p.set_story(STORY_A);
        // First frame lands, second request is in flight.
        tokio::time::sleep(Duration::from_secs(12)).await;
        assert!(p.state().lock().unwrap().ready_count() >= 1);

        p.set_story(STORY_B);
        p.join().await;

        let st = p.state();
        let st = st.lock().unwrap();
        assert_eq!(st.slots.len(), 2);
        assert_eq!(st.ready_count(), 2);
        for (_, frame) in st.frames() {
            assert!(!frame.image.contains("fox") && !frame.image.contains("Snow"));
            assert!(!frame.image.contains("lantern"));
        }
        assert_eq!(gen.max_in_flight(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn switching_during_backoff_cancels_the_retry() {
        let gen = Arc::new(ScriptedGenerator::new(vec![Err(FrameError::Timeout)]));
        let mut p = pipeline(Some(Arc::clone(&gen)));

        p.set_story(STORY_A);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(p.state().lock().unwrap().worker, WorkerState::RetryWait);

        p.set_story(STORY_B);
        p.join().await;

        let prompts = gen.prompts();
        // One failed attempt for story A, then only story B prompts.
        assert_eq!(prompts.len(), 3);
        assert!(prompts[0].contains("fox"));
        assert!(prompts[1..].iter().all(|p| !p.contains("fox")));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_pipeline_stops_worker() {
        let gen = Arc::new(ScriptedGenerator::always_ok());
        let mut p = pipeline(Some(Arc::clone(&gen)));
        p.set_story(STORY_A);
        let state = p.state();
        drop(p);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(gen.requests(), 0);
        assert_eq!(state.lock().unwrap().ready_count(), 0);
    }

    #[test]
    fn from_config_without_url_has_no_generator() {
        let p = FramePipeline::from_config(&AppConfig::default());
        assert!(!p.has_generator());
    }

    #[test]
    fn from_config_with_url_builds_generator() {
        let mut config = AppConfig::default();
        config.server.base_url = Some("http://localhost:5000".into());
        assert!(FramePipeline::from_config(&config).has_generator());

        config.frames.enabled = false;
        assert!(!FramePipeline::from_config(&config).has_generator());
    }
}
