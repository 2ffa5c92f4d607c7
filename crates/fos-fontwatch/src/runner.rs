//! Font watch runner
//!
//! Polls the probe widths of one font until the font renders, or until the
//! timeout passes, then fires exactly one of the two callbacks.

use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::clock::{Clock, SystemClock};
use crate::config::WatchConfig;
use crate::font::Font;
use crate::probes::{BaselineWidths, CharacterProbes, CharacterState};
use crate::quirks::PlatformQuirks;
use crate::ruler::{DomHelper, FontRuler};
use crate::timers::TimerQueue;
use crate::{Result, WatchError};

/// Outcome callback, called with the watched font
pub type FontCallback = Box<dyn FnOnce(&Font)>;

/// Final decision for a watched font
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchOutcome {
    /// The font renders
    Active,
    /// The font failed to render before the timeout
    Inactive,
}

impl fmt::Display for WatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => f.write_str("active"),
            Self::Inactive => f.write_str("inactive"),
        }
    }
}

/// Runner lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchStatus {
    /// Probes inserted, not started
    Idle,
    /// Checking widths every poll interval
    Polling,
    /// Decision made, callback waiting for the next tick
    Finishing(WatchOutcome),
    /// Probes removed and callback fired
    Finished(WatchOutcome),
    /// Stopped without a decision
    Cancelled,
}

impl WatchStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished(_) | Self::Cancelled)
    }

    /// Outcome once the callback has fired
    pub fn outcome(&self) -> Option<WatchOutcome> {
        match self {
            Self::Finished(outcome) => Some(*outcome),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WatchTask {
    Check,
    Finish(WatchOutcome),
}

/// Watches a single font
pub struct FontWatchRunner<R: FontRuler, C: Clock = SystemClock> {
    font: Font,
    config: WatchConfig,
    timeout: Duration,
    quirks: Rc<dyn PlatformQuirks>,
    probes: Vec<CharacterProbes<R>>,
    clock: C,
    timers: TimerQueue<WatchTask>,
    started_at: Option<Instant>,
    status: WatchStatus,
    checks: u32,
    on_active: Option<FontCallback>,
    on_inactive: Option<FontCallback>,
}

impl<R: FontRuler> FontWatchRunner<R, SystemClock> {
    /// Create a runner on wall-clock time. Probes are inserted immediately.
    pub fn new<D>(dom: &D, font: Font, config: WatchConfig, quirks: Rc<dyn PlatformQuirks>) -> Result<Self>
    where
        D: DomHelper<Ruler = R> + ?Sized,
    {
        Self::with_clock(dom, font, config, quirks, SystemClock)
    }

    /// Start if needed and poll until a callback has fired
    pub async fn run(&mut self) -> Result<WatchOutcome> {
        if self.status == WatchStatus::Idle {
            self.start()?;
        }

        loop {
            self.poll();
            if let Some(result) = self.resolved() {
                return result;
            }
            let deadline = self.next_deadline().unwrap_or_else(Instant::now);
            smol::Timer::at(deadline).await;
        }
    }
}

impl<R: FontRuler, C: Clock> FontWatchRunner<R, C> {
    /// Create a runner on the given clock. Probes are inserted immediately.
    pub fn with_clock<D>(
        dom: &D,
        font: Font,
        config: WatchConfig,
        quirks: Rc<dyn PlatformQuirks>,
        clock: C,
    ) -> Result<Self>
    where
        D: DomHelper<Ruler = R> + ?Sized,
    {
        config.validate()?;

        let probes: Vec<_> = config.test_string
            .chars()
            .map(|ch| CharacterProbes::insert(dom, ch, &font))
            .collect();

        tracing::debug!(
            "Watching {} with {} probe characters, timeout {:?}",
            font,
            probes.len(),
            config.timeout()
        );

        Ok(Self {
            timeout: config.timeout(),
            font,
            config,
            quirks,
            probes,
            clock,
            timers: TimerQueue::new(),
            started_at: None,
            status: WatchStatus::Idle,
            checks: 0,
            on_active: None,
            on_inactive: None,
        })
    }

    /// Callback for a font that renders
    pub fn on_active(mut self, callback: impl FnOnce(&Font) + 'static) -> Self {
        self.on_active = Some(Box::new(callback));
        self
    }

    /// Callback for a font that timed out
    pub fn on_inactive(mut self, callback: impl FnOnce(&Font) + 'static) -> Self {
        self.on_inactive = Some(Box::new(callback));
        self
    }

    pub fn font(&self) -> &Font {
        &self.font
    }

    pub fn status(&self) -> WatchStatus {
        self.status
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    /// Number of check cycles run so far
    pub fn checks(&self) -> u32 {
        self.checks
    }

    /// Baselines captured at start, empty once probes are released
    pub fn baseline_widths(&self) -> Vec<BaselineWidths> {
        self.probes.iter().filter_map(|probes| probes.baseline()).collect()
    }

    /// Capture baseline widths and run the first check
    pub fn start(&mut self) -> Result<()> {
        match self.status {
            WatchStatus::Idle => {}
            WatchStatus::Cancelled => return Err(WatchError::Cancelled),
            _ => return Err(WatchError::AlreadyStarted),
        }

        for probes in &mut self.probes {
            probes.capture_baseline();
        }
        self.started_at = Some(self.clock.now());
        self.status = WatchStatus::Polling;
        tracing::debug!("Started watching {}", self.font);

        self.check();
        Ok(())
    }

    /// Run every timer due now
    pub fn poll(&mut self) -> WatchStatus {
        let now = self.clock.now();
        for timer in self.timers.take_ready(now) {
            match timer.task {
                WatchTask::Check if self.status == WatchStatus::Polling => self.check(),
                WatchTask::Finish(outcome) if self.status == WatchStatus::Finishing(outcome) => {
                    self.complete(outcome)
                }
                _ => {}
            }
        }
        self.status
    }

    /// When the next timer is due
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_due()
    }

    /// Stop without firing a callback and remove the probes
    pub fn cancel(&mut self) {
        if self.status.is_terminal() {
            return;
        }
        tracing::debug!("Cancelled watch for {} after {} checks", self.font, self.checks);

        self.timers.clear_all();
        self.release_probes();
        self.on_active = None;
        self.on_inactive = None;
        self.status = WatchStatus::Cancelled;
    }

    /// Start if needed and poll, sleeping on the clock, until a callback has fired
    pub fn run_to_completion(&mut self) -> Result<WatchOutcome> {
        if self.status == WatchStatus::Idle {
            self.start()?;
        }

        loop {
            self.poll();
            if let Some(result) = self.resolved() {
                return result;
            }
            if let Some(deadline) = self.next_deadline() {
                self.clock.sleep_until(deadline);
            }
        }
    }

    fn resolved(&self) -> Option<Result<WatchOutcome>> {
        match self.status {
            WatchStatus::Finished(outcome) => Some(Ok(outcome)),
            WatchStatus::Cancelled => Some(Err(WatchError::Cancelled)),
            _ => None,
        }
    }

    fn check(&mut self) {
        let Some(started_at) = self.started_at else {
            return;
        };
        let now = self.clock.now();
        let timed_out = now.saturating_duration_since(started_at) >= self.timeout;
        let fallback_bug = self.quirks.has_webkit_fallback_bug();
        let metric_compatible = self.config.is_metric_compatible(self.font.name());
        self.checks += 1;

        // Every probe is read each cycle; one pending character vetoes the
        // whole cycle unless it is exempt at timeout.
        let mut loaded = true;
        for probes in &self.probes {
            if let CharacterState::Pending { last_resort } = probes.check(fallback_bug) {
                if !(timed_out && last_resort && metric_compatible) {
                    loaded = false;
                }
                tracing::trace!("{}: {:?} pending (last resort: {})", self.font, probes.ch(), last_resort);
            }
        }

        if loaded {
            self.finish(WatchOutcome::Active, now);
        } else if timed_out {
            self.finish(WatchOutcome::Inactive, now);
        } else {
            self.timers.set_timeout(WatchTask::Check, self.config.poll_interval(), now);
        }
    }

    /// Defer removal and the callback by one tick so that several fonts
    /// finishing together do not force a layout each.
    fn finish(&mut self, outcome: WatchOutcome, now: Instant) {
        let elapsed = self.started_at.map(|at| now.saturating_duration_since(at)).unwrap_or_default();
        tracing::info!("Font {} {} after {:?} ({} checks)", self.font, outcome, elapsed, self.checks);

        self.status = WatchStatus::Finishing(outcome);
        self.timers.clear_all();
        self.timers.set_timeout(WatchTask::Finish(outcome), Duration::ZERO, now);
    }

    fn complete(&mut self, outcome: WatchOutcome) {
        self.release_probes();
        self.status = WatchStatus::Finished(outcome);

        let callback = match outcome {
            WatchOutcome::Active => self.on_active.take(),
            WatchOutcome::Inactive => self.on_inactive.take(),
        };
        self.on_active = None;
        self.on_inactive = None;

        if let Some(callback) = callback {
            callback(&self.font);
        }
    }

    fn release_probes(&mut self) {
        for probes in &mut self.probes {
            probes.dispose();
        }
        self.probes.clear();
    }
}

impl<R: FontRuler, C: Clock> Drop for FontWatchRunner<R, C> {
    fn drop(&mut self) {
        self.release_probes();
    }
}
