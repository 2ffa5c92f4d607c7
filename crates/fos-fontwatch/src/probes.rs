//! Per-character probes and width classification

use crate::font::{Font, FontStack, GenericFamily};
use crate::ruler::{DomHelper, FontRuler};

/// Widths of the placeholder boxes Safari draws for an invalid font
pub const INVALID_FONT_WIDTHS: [u32; 3] = [2410, 2411, 2412];

/// Generic family widths of one character, captured at start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaselineWidths {
    pub serif: u32,
    pub sans_serif: u32,
}

impl BaselineWidths {
    pub fn get(&self, family: GenericFamily) -> u32 {
        match family {
            GenericFamily::Serif => self.serif,
            GenericFamily::SansSerif => self.sans_serif,
        }
    }
}

/// Widths of the two watched-font probes of one character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CandidateWidths {
    /// Watched font + serif
    pub a: u32,
    /// Watched font + sans-serif
    pub b: u32,
}

impl CandidateWidths {
    /// Both probes still render in their own fallback family
    pub fn is_fallback(&self, baseline: &BaselineWidths) -> bool {
        self.a == baseline.serif && self.b == baseline.sans_serif
    }

    pub fn is_invalid(&self) -> bool {
        INVALID_FONT_WIDTHS.contains(&self.a) || INVALID_FONT_WIDTHS.contains(&self.b)
    }

    /// Both probes render at the width of the same generic family, whichever
    pub fn matches_any_baseline(&self, baseline: &BaselineWidths) -> bool {
        GenericFamily::ALL.iter().any(|&family| {
            let width = baseline.get(family);
            self.a == width && self.b == width
        })
    }

    pub fn classify(&self, baseline: &BaselineWidths, fallback_bug: bool) -> CharacterState {
        let last_resort = fallback_bug && self.matches_any_baseline(baseline);
        if last_resort || self.is_fallback(baseline) || self.is_invalid() {
            CharacterState::Pending { last_resort }
        } else {
            CharacterState::Rendered
        }
    }
}

/// Verdict for one character in one check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CharacterState {
    /// Rendered in the watched font
    Rendered,
    /// Still a fallback, last-resort or invalid-glyph width
    Pending { last_resort: bool },
}

/// The four rulers of one test character
pub(crate) struct CharacterProbes<R: FontRuler> {
    ch: char,
    candidate_serif: R,
    candidate_sans_serif: R,
    baseline_serif: R,
    baseline_sans_serif: R,
    baseline: Option<BaselineWidths>,
}

impl<R: FontRuler> CharacterProbes<R> {
    /// Create and insert the rulers for `ch`
    pub fn insert<D>(dom: &D, ch: char, font: &Font) -> Self
    where
        D: DomHelper<Ruler = R> + ?Sized,
    {
        let variation = font.variation();
        Self {
            ch,
            candidate_serif: dom.create_ruler(ch, &FontStack::with_fallback(font, GenericFamily::Serif)),
            candidate_sans_serif: dom.create_ruler(ch, &FontStack::with_fallback(font, GenericFamily::SansSerif)),
            baseline_serif: dom.create_ruler(ch, &FontStack::generic(GenericFamily::Serif, variation)),
            baseline_sans_serif: dom.create_ruler(ch, &FontStack::generic(GenericFamily::SansSerif, variation)),
            baseline: None,
        }
    }

    pub fn ch(&self) -> char {
        self.ch
    }

    pub fn capture_baseline(&mut self) -> BaselineWidths {
        let baseline = BaselineWidths {
            serif: self.baseline_serif.width(),
            sans_serif: self.baseline_sans_serif.width(),
        };
        self.baseline = Some(baseline);
        baseline
    }

    pub fn baseline(&self) -> Option<BaselineWidths> {
        self.baseline
    }

    pub fn candidate_widths(&self) -> CandidateWidths {
        CandidateWidths {
            a: self.candidate_serif.width(),
            b: self.candidate_sans_serif.width(),
        }
    }

    /// Read both candidates and classify against the captured baseline
    pub fn check(&self, fallback_bug: bool) -> CharacterState {
        let widths = self.candidate_widths();
        match &self.baseline {
            Some(baseline) => widths.classify(baseline, fallback_bug),
            None => CharacterState::Pending { last_resort: false },
        }
    }

    pub fn dispose(&mut self) {
        self.candidate_serif.dispose();
        self.candidate_sans_serif.dispose();
        self.baseline_serif.dispose();
        self.baseline_sans_serif.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASELINE: BaselineWidths = BaselineWidths { serif: 100, sans_serif: 110 };

    fn widths(a: u32, b: u32) -> CandidateWidths {
        CandidateWidths { a, b }
    }

    #[test]
    fn test_fallback_requires_family_pairing() {
        assert!(widths(100, 110).is_fallback(&BASELINE));
        assert!(!widths(110, 100).is_fallback(&BASELINE));
        assert!(!widths(100, 120).is_fallback(&BASELINE));
    }

    #[test]
    fn test_invalid_widths() {
        assert!(widths(2410, 50).is_invalid());
        assert!(widths(50, 2412).is_invalid());
        assert!(!widths(2409, 2413).is_invalid());
    }

    #[test]
    fn test_matches_any_baseline() {
        assert!(widths(100, 100).matches_any_baseline(&BASELINE));
        assert!(widths(110, 110).matches_any_baseline(&BASELINE));
        assert!(!widths(100, 110).matches_any_baseline(&BASELINE));
        assert!(!widths(120, 120).matches_any_baseline(&BASELINE));
    }

    #[test]
    fn test_classify() {
        assert_eq!(widths(120, 130).classify(&BASELINE, false), CharacterState::Rendered);
        assert_eq!(
            widths(100, 110).classify(&BASELINE, true),
            CharacterState::Pending { last_resort: false }
        );
        assert_eq!(
            widths(2411, 2411).classify(&BASELINE, true),
            CharacterState::Pending { last_resort: false }
        );
    }

    #[test]
    fn test_cross_family_match_only_pending_with_bug() {
        assert_eq!(widths(110, 110).classify(&BASELINE, false), CharacterState::Rendered);
        assert_eq!(
            widths(110, 110).classify(&BASELINE, true),
            CharacterState::Pending { last_resort: true }
        );
    }
}
