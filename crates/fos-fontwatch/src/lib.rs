//! fOS Font Watch - Web font load detection
//!
//! Decides whether a web font has finished loading by comparing the rendered
//! widths of probe characters against generic fallback families:
//! - Per-character probes in four font stacks (font + serif, font + sans-serif,
//!   serif, sans-serif)
//! - Polling loop with a fixed re-check interval and a finite timeout
//! - WebKit last-resort fallback and invalid-glyph workarounds
//! - Headless document for tests and offline replays
//!
//! # Example
//! ```rust,ignore
//! use std::rc::Rc;
//! use fos_fontwatch::{Font, FontWatchRunner, HeadlessDocument, UserAgentQuirks, WatchConfig};
//!
//! let doc = HeadlessDocument::new();
//! let quirks = Rc::new(UserAgentQuirks::new(user_agent));
//! let mut runner = FontWatchRunner::new(&doc, Font::named("Droid Sans"), WatchConfig::default(), quirks)?
//!     .on_active(|font| println!("{} active", font.name()))
//!     .on_inactive(|font| println!("{} inactive", font.name()));
//! let outcome = runner.run_to_completion()?;
//! ```

pub mod clock;
pub mod config;
pub mod font;
pub mod headless;
pub mod quirks;
pub mod ruler;
pub mod timers;

mod probes;
mod runner;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::WatchConfig;
pub use font::{Font, FontStack, FontStyle, FontVariation, FontWeight, GenericFamily};
pub use headless::{FamilyMetrics, HeadlessDocument, HeadlessRuler};
pub use probes::{BaselineWidths, INVALID_FONT_WIDTHS};
pub use quirks::{FixedQuirks, PlatformQuirks, UserAgentQuirks, WebKitVersion};
pub use ruler::{DomHelper, FontRuler};
pub use runner::{FontCallback, FontWatchRunner, WatchOutcome, WatchStatus};
pub use timers::{Timer, TimerId, TimerQueue};

/// Font watch error types
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("Font test string is empty")]
    EmptyTestString,

    #[error("Poll interval must be greater than zero")]
    InvalidPollInterval,

    #[error("Invalid font variation description: {0}")]
    InvalidVariation(String),

    #[error("Font watch already started")]
    AlreadyStarted,

    #[error("Font watch was cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, WatchError>;
