//! Scenario replay
//!
//! A scenario describes a headless document, a font that may become available
//! at some point, and the watch configuration. Replays run on a virtual clock.

use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};

use fos_fontwatch::{
    Clock, FamilyMetrics, Font, FontWatchRunner, GenericFamily, HeadlessDocument, ManualClock,
    UserAgentQuirks, WatchConfig, WatchOutcome, WatchStatus,
};

/// Scenario file contents
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub font: String,
    pub variation: String,
    pub user_agent: String,
    pub serif_width: u32,
    pub sans_serif_width: u32,
    pub font_width: u32,
    /// Virtual time at which the font becomes available (`None` = never)
    pub load_after_ms: Option<u64>,
    /// Simulated WebKit last-resort family
    pub last_resort: Option<GenericFamily>,
    pub watch: WatchConfig,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            font: String::new(),
            variation: "n4".to_string(),
            user_agent: String::new(),
            serif_width: 100,
            sans_serif_width: 110,
            font_width: 120,
            load_after_ms: Some(0),
            last_resort: None,
            watch: WatchConfig::default(),
        }
    }
}

impl Scenario {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let scenario: Scenario = serde_json::from_str(json).context("Invalid scenario JSON")?;
        if scenario.font.is_empty() {
            bail!("Scenario is missing a font name");
        }
        Ok(scenario)
    }
}

/// Replay result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub font: String,
    pub outcome: WatchOutcome,
    pub elapsed_ms: u64,
    pub checks: u32,
}

/// Run a scenario to its decision
pub fn replay(scenario: &Scenario) -> anyhow::Result<Report> {
    let font = Font::with_fvd(scenario.font.as_str(), &scenario.variation)
        .with_context(|| format!("Invalid variation for {}", scenario.font))?;

    let doc = HeadlessDocument::with_generic_metrics(
        FamilyMetrics::uniform(scenario.serif_width),
        FamilyMetrics::uniform(scenario.sans_serif_width),
    );
    doc.set_last_resort(scenario.last_resort);

    let clock = ManualClock::new();
    let quirks = Rc::new(UserAgentQuirks::new(scenario.user_agent.as_str()));
    let mut runner = FontWatchRunner::with_clock(&doc, font, scenario.watch.clone(), quirks, clock.clone())
        .context("Failed to create font watch")?
        .on_active(|font| tracing::info!("{} is active", font))
        .on_inactive(|font| tracing::warn!("{} is inactive", font));

    let mut pending_load = scenario.load_after_ms.map(Duration::from_millis);
    let load_font = |at: Duration| {
        clock.advance_to(at);
        doc.load_font(scenario.font.as_str(), FamilyMetrics::uniform(scenario.font_width));
    };

    // Fonts already available when the watch starts
    if let Some(at) = pending_load.filter(|at| at.is_zero()) {
        load_font(at);
        pending_load = None;
    }
    runner.start()?;

    let outcome = loop {
        match runner.poll() {
            WatchStatus::Finished(outcome) => break outcome,
            WatchStatus::Cancelled => bail!("Font watch was cancelled"),
            _ => {}
        }

        let Some(deadline) = runner.next_deadline() else {
            bail!("Font watch stalled without a pending check");
        };
        if let Some(at) = pending_load {
            if clock.origin() + at <= deadline {
                load_font(at);
                pending_load = None;
                continue;
            }
        }
        clock.sleep_until(deadline);
    };

    Ok(Report {
        font: scenario.font.clone(),
        outcome,
        elapsed_ms: clock.elapsed().as_millis() as u64,
        checks: runner.checks(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_scenario() {
        let scenario = Scenario::from_json(r#"{ "font": "Arimo" }"#).unwrap();
        assert_eq!(scenario.font, "Arimo");
        assert_eq!(scenario.variation, "n4");
        assert_eq!(scenario.load_after_ms, Some(0));
        assert_eq!(scenario.watch, WatchConfig::default());
    }

    #[test]
    fn test_parse_full_scenario() {
        let json = r#"{
            "font": "Droid Sans",
            "variation": "i7",
            "user_agent": "AppleWebKit/534.50",
            "load_after_ms": null,
            "last_resort": "sans-serif",
            "watch": { "timeout_ms": 500, "test_string": "Bs", "metric_compatible_fonts": ["Arimo"] }
        }"#;
        let scenario = Scenario::from_json(json).unwrap();

        assert_eq!(scenario.load_after_ms, None);
        assert_eq!(scenario.last_resort, Some(GenericFamily::SansSerif));
        assert_eq!(scenario.watch.timeout_ms, 500);
        assert_eq!(scenario.watch.poll_interval_ms, 50);
        assert!(!scenario.watch.is_metric_compatible("Droid Sans"));
    }

    #[test]
    fn test_missing_font_rejected() {
        assert!(Scenario::from_json("{}").is_err());
        assert!(Scenario::from_json("not json").is_err());
    }

    #[test]
    fn test_replay_loaded_font() {
        let scenario = Scenario::from_json(r#"{ "font": "Arimo" }"#).unwrap();
        let report = replay(&scenario).unwrap();

        assert_eq!(report.outcome, WatchOutcome::Active);
        assert_eq!(report.elapsed_ms, 0);
        assert_eq!(report.checks, 1);
    }

    #[test]
    fn test_replay_late_font() {
        let scenario = Scenario::from_json(r#"{ "font": "Arimo", "load_after_ms": 120 }"#).unwrap();
        let report = replay(&scenario).unwrap();

        // Checks at 0, 50, 100 and 150 ms
        assert_eq!(report.outcome, WatchOutcome::Active);
        assert_eq!(report.elapsed_ms, 150);
        assert_eq!(report.checks, 4);
    }

    #[test]
    fn test_replay_font_never_loads() {
        let json = r#"{ "font": "Arimo", "load_after_ms": null, "watch": { "timeout_ms": 300 } }"#;
        let report = replay(&Scenario::from_json(json).unwrap()).unwrap();

        assert_eq!(report.outcome, WatchOutcome::Inactive);
        assert_eq!(report.elapsed_ms, 300);
    }

    #[test]
    fn test_replay_font_loads_after_timeout() {
        let json = r#"{ "font": "Arimo", "load_after_ms": 5000, "watch": { "timeout_ms": 300 } }"#;
        let report = replay(&Scenario::from_json(json).unwrap()).unwrap();

        assert_eq!(report.outcome, WatchOutcome::Inactive);
        assert_eq!(report.elapsed_ms, 300);
    }

    #[test]
    fn test_replay_webkit_last_resort() {
        let json = r#"{
            "font": "Arimo",
            "user_agent": "Mozilla/5.0 AppleWebKit/534.50 (KHTML, like Gecko) Safari/534.50",
            "load_after_ms": null,
            "last_resort": "serif",
            "watch": { "timeout_ms": 200, "metric_compatible_fonts": ["Arimo"] }
        }"#;
        let report = replay(&Scenario::from_json(json).unwrap()).unwrap();

        assert_eq!(report.outcome, WatchOutcome::Active);
        assert_eq!(report.elapsed_ms, 200);
    }

    #[test]
    fn test_bundled_scenarios() {
        let late = Scenario::from_json(include_str!("../scenarios/late_font.json")).unwrap();
        let report = replay(&late).unwrap();
        assert_eq!(report.outcome, WatchOutcome::Active);
        assert_eq!(report.elapsed_ms, 400);

        let webkit = Scenario::from_json(include_str!("../scenarios/webkit_last_resort.json")).unwrap();
        let report = replay(&webkit).unwrap();
        assert_eq!(report.outcome, WatchOutcome::Active);
        assert_eq!(report.elapsed_ms, 3000);
    }

    #[test]
    fn test_replay_invalid_variation() {
        let scenario = Scenario::from_json(r#"{ "font": "Arimo", "variation": "x9" }"#).unwrap();
        assert!(replay(&scenario).is_err());
    }

    #[test]
    fn test_report_json() {
        let report = Report {
            font: "Arimo".into(),
            outcome: WatchOutcome::Inactive,
            elapsed_ms: 3000,
            checks: 61,
        };
        let json = serde_json::to_string(&report).unwrap();
        assert_eq!(json, r#"{"font":"Arimo","outcome":"inactive","elapsed_ms":3000,"checks":61}"#);
    }
}
