// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step state machine
//!
//! A step is the smallest trackable unit of migration work. Its `enabled`
//! flag is fixed at construction; a disabled step never changes state.
//! Enabled steps move `Waiting -> Running -> Done | Error` and never leave a
//! terminal state.
//!
//! Steps are mutated by the task that owns their pipeline and read
//! concurrently by the status presenter, so all mutable fields live behind
//! one mutex.

use crate::clock::{Clock, SystemClock};
use crate::log::MigrationLog;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Coarse lifecycle position of a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    Disabled,
    Waiting,
    Running,
    Done,
    Error,
}

/// Renderable status of a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Disabled,
    Waiting,
    Running { elapsed_secs: u64 },
    Done,
    Error,
}

impl StepStatus {
    pub fn state(self) -> StepState {
        match self {
            StepStatus::Disabled => StepState::Disabled,
            StepStatus::Waiting => StepState::Waiting,
            StepStatus::Running { .. } => StepState::Running,
            StepStatus::Done => StepState::Done,
            StepStatus::Error => StepState::Error,
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepStatus::Disabled => write!(f, "-"),
            StepStatus::Waiting => write!(f, "(waiting)"),
            StepStatus::Running { elapsed_secs } => write!(f, "running({}s)", elapsed_secs),
            StepStatus::Done => write!(f, "done"),
            StepStatus::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Default)]
struct StepInner {
    started_at: Option<Instant>,
    finished_at: Option<Instant>,
    done: bool,
    error: Option<String>,
}

/// A named, optionally disabled unit of work with timing and one error slot
pub struct Step<C: Clock = SystemClock> {
    label: String,
    enabled: bool,
    clock: C,
    log: Option<Arc<dyn MigrationLog>>,
    inner: Mutex<StepInner>,
}

impl<C: Clock> Step<C> {
    /// Create a step. `label` prefixes every log line the step writes.
    pub fn new(
        label: impl Into<String>,
        enabled: bool,
        clock: C,
        log: Option<Arc<dyn MigrationLog>>,
    ) -> Self {
        Self {
            label: label.into(),
            enabled,
            clock,
            log,
            inner: Mutex::new(StepInner::default()),
        }
    }

    /// A step that never runs
    pub fn disabled(label: impl Into<String>, clock: C) -> Self {
        Self::new(label, false, clock, None)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn lock(&self) -> MutexGuard<'_, StepInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn write_log(&self, message: fmt::Arguments<'_>) {
        if let Some(log) = &self.log {
            log.line(&message.to_string());
        }
    }

    /// Waiting -> Running. Records the start time.
    pub fn start(&self) {
        if !self.enabled {
            return;
        }
        {
            let mut inner = self.lock();
            if inner.started_at.is_some() || inner.done || inner.error.is_some() {
                return;
            }
            inner.started_at = Some(self.clock.now());
        }
        tracing::debug!(step = %self.label, "started");
        self.write_log(format_args!("{} started", self.label));
    }

    /// Mark the step done. Repeated calls are no-ops.
    pub fn finalize(&self) {
        if !self.enabled {
            return;
        }
        let elapsed = {
            let mut inner = self.lock();
            if inner.done {
                return;
            }
            let now = self.clock.now();
            inner.done = true;
            let finished = *inner.finished_at.get_or_insert(now);
            inner
                .started_at
                .map(|s| finished.saturating_duration_since(s))
                .unwrap_or_default()
        };
        tracing::debug!(step = %self.label, elapsed_secs = elapsed.as_secs(), "finished");
        self.write_log(format_args!(
            "{} finished (elapsed:{}s)",
            self.label,
            elapsed.as_secs()
        ));
    }

    /// Record the step's error. Only the first error is kept.
    pub fn set_error(&self, error: impl fmt::Display) {
        if !self.enabled {
            return;
        }
        let message = error.to_string();
        {
            let mut inner = self.lock();
            if inner.error.is_some() {
                return;
            }
            let now = self.clock.now();
            inner.finished_at.get_or_insert(now);
            inner.error = Some(message.clone());
        }
        tracing::warn!(step = %self.label, error = %message, "failed");
        self.write_log(format_args!("{} error: {}", self.label, message));
    }

    /// Current status; `Running` is recomputed against the clock on each call
    pub fn status(&self) -> StepStatus {
        if !self.enabled {
            return StepStatus::Disabled;
        }
        let inner = self.lock();
        if inner.error.is_some() {
            return StepStatus::Error;
        }
        if inner.done {
            return StepStatus::Done;
        }
        match inner.started_at {
            Some(started) => StepStatus::Running {
                elapsed_secs: self.clock.since(started).as_secs(),
            },
            None => StepStatus::Waiting,
        }
    }

    pub fn state(&self) -> StepState {
        self.status().state()
    }

    /// Time since start, frozen once the step finishes or fails
    pub fn elapsed(&self) -> Duration {
        let inner = self.lock();
        match (inner.started_at, inner.finished_at) {
            (Some(started), Some(finished)) => finished.saturating_duration_since(started),
            (Some(started), None) => self.clock.since(started),
            (None, _) => Duration::ZERO,
        }
    }

    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    pub fn is_started(&self) -> bool {
        self.lock().started_at.is_some()
    }

    pub fn is_done(&self) -> bool {
        self.lock().done
    }
}

impl<C: Clock> fmt::Debug for Step<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("label", &self.label)
            .field("status", &self.status())
            .finish()
    }
}

#[cfg(test)]
#[path = "step_tests.rs"]
mod tests;
