//! Test doubles for the frame pipeline.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::api::{Frame, FrameError, FrameGenerator};
use crate::story::Prompt;

/// Scripted success step: yields `frame-for:<prompt>`.
pub fn ok() -> Result<(), FrameError> {
    Ok(())
}

/// Replays a fixed script of outcomes, then repeats `fallback` forever.
///
/// Records every prompt it was asked for.  Tracks concurrent calls so tests
/// can assert the single-request-in-flight rule.
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Result<(), FrameError>>>,
    fallback: Result<(), FrameError>,
    prompts: Mutex<Vec<String>>,
    delay: Duration,
    first_delay: Option<Duration>,
    calls: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new(script: Vec<Result<(), FrameError>>) -> Self {
        Self::with_fallback(script, Ok(()))
    }

    pub fn always_ok() -> Self {
        Self::new(Vec::new())
    }

    pub fn always(outcome: Result<(), FrameError>) -> Self {
        Self::with_fallback(Vec::new(), outcome)
    }

    fn with_fallback(script: Vec<Result<(), FrameError>>, fallback: Result<(), FrameError>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            prompts: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
            first_delay: None,
            calls: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        }
    }

    /// Every call takes `delay` of (virtual) time.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Only the first call takes `delay`.
    pub fn with_first_delay(mut self, delay: Duration) -> Self {
        self.first_delay = Some(delay);
        self
    }

    pub fn requests(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FrameGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &Prompt) -> Result<Frame, FrameError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.as_str().to_string());

        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);
        let _guard = ActiveGuard(&self.active);

        let delay = match (call, self.first_delay) {
            (0, Some(first)) => first,
            _ => self.delay,
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        step.map(|()| Frame::new(format!("frame-for:{prompt}")))
    }
}

/// Decrements the in-flight counter even when the call is cancelled.
struct ActiveGuard<'a>(&'a AtomicUsize);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
