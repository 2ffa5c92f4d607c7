//! Font descriptions
//!
//! A watched [`Font`] is a family name plus a variation description (FVD)
//! such as `n4` (normal, 400) or `i7` (italic, 700). Probes receive a
//! [`FontStack`]: the family list actually applied to the probe element.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::WatchError;

/// Font weight (100-900)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FontWeight(pub u16);

impl FontWeight {
    pub const THIN: FontWeight = FontWeight(100);
    pub const EXTRA_LIGHT: FontWeight = FontWeight(200);
    pub const LIGHT: FontWeight = FontWeight(300);
    pub const NORMAL: FontWeight = FontWeight(400);
    pub const MEDIUM: FontWeight = FontWeight(500);
    pub const SEMI_BOLD: FontWeight = FontWeight(600);
    pub const BOLD: FontWeight = FontWeight(700);
    pub const EXTRA_BOLD: FontWeight = FontWeight(800);
    pub const BLACK: FontWeight = FontWeight(900);
}

impl Default for FontWeight {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl From<u16> for FontWeight {
    fn from(value: u16) -> Self {
        FontWeight(value.clamp(100, 900))
    }
}

/// Font style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
    Oblique,
}

impl FontStyle {
    pub fn to_css(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Italic => "italic",
            Self::Oblique => "oblique",
        }
    }

    fn fvd_char(&self) -> char {
        match self {
            Self::Normal => 'n',
            Self::Italic => 'i',
            Self::Oblique => 'o',
        }
    }
}

/// Style and weight of a font, written as a two character FVD (`n4`, `i7`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FontVariation {
    pub style: FontStyle,
    pub weight: FontWeight,
}

impl FontVariation {
    pub fn new(style: FontStyle, weight: FontWeight) -> Self {
        Self { style, weight }
    }

    /// CSS declarations for this variation
    pub fn to_css(&self) -> String {
        format!("font-style:{};font-weight:{};", self.style.to_css(), self.weight.0)
    }
}

impl FromStr for FontVariation {
    type Err = WatchError;

    fn from_str(fvd: &str) -> Result<Self, Self::Err> {
        let invalid = || WatchError::InvalidVariation(fvd.to_string());
        let mut chars = fvd.chars();

        let style = match chars.next() {
            Some('n') => FontStyle::Normal,
            Some('i') => FontStyle::Italic,
            Some('o') => FontStyle::Oblique,
            _ => return Err(invalid()),
        };
        let weight = chars
            .next()
            .and_then(|c| c.to_digit(10))
            .filter(|d| (1..=9).contains(d))
            .ok_or_else(invalid)?;
        if chars.next().is_some() {
            return Err(invalid());
        }

        Ok(Self::new(style, FontWeight(weight as u16 * 100)))
    }
}

impl fmt::Display for FontVariation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.style.fvd_char(), self.weight.0 / 100)
    }
}

/// Generic families used as last-resort fallbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GenericFamily {
    Serif,
    SansSerif,
}

impl GenericFamily {
    pub const ALL: [GenericFamily; 2] = [GenericFamily::Serif, GenericFamily::SansSerif];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Serif => "serif",
            Self::SansSerif => "sans-serif",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "serif" => Some(Self::Serif),
            "sans-serif" => Some(Self::SansSerif),
            _ => None,
        }
    }
}

impl fmt::Display for GenericFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A web font to watch
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Font {
    name: String,
    variation: FontVariation,
}

impl Font {
    pub fn new(name: impl Into<String>, variation: FontVariation) -> Self {
        Self { name: name.into(), variation }
    }

    /// Font with the default `n4` variation
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, FontVariation::default())
    }

    /// Font with a variation given as FVD text
    pub fn with_fvd(name: impl Into<String>, fvd: &str) -> crate::Result<Self> {
        Ok(Self::new(name, fvd.parse()?))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn variation(&self) -> FontVariation {
        self.variation
    }
}

impl fmt::Display for Font {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.variation)
    }
}

/// Ordered family list applied to a probe
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FontStack {
    families: Vec<String>,
    variation: FontVariation,
}

impl FontStack {
    pub fn new(families: Vec<String>, variation: FontVariation) -> Self {
        Self { families, variation }
    }

    /// A generic family on its own
    pub fn generic(family: GenericFamily, variation: FontVariation) -> Self {
        Self::new(vec![family.as_str().to_string()], variation)
    }

    /// The watched font followed by a generic fallback
    pub fn with_fallback(font: &Font, fallback: GenericFamily) -> Self {
        Self::new(
            vec![font.name().to_string(), fallback.as_str().to_string()],
            font.variation(),
        )
    }

    pub fn families(&self) -> &[String] {
        &self.families
    }

    pub fn variation(&self) -> FontVariation {
        self.variation
    }

    /// Full inline style for a probe element
    pub fn to_css(&self) -> String {
        format!("font-family:{};{}", self, self.variation.to_css())
    }
}

impl fmt::Display for FontStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, family) in self.families.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write_family(f, family)?;
        }
        Ok(())
    }
}

fn write_family(f: &mut fmt::Formatter<'_>, family: &str) -> fmt::Result {
    let family = family.trim().trim_matches(|c| c == '\'' || c == '"');
    let bare = !family.is_empty()
        && family.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if bare {
        f.write_str(family)
    } else {
        write!(f, "'{}'", family)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_variation() {
        let v: FontVariation = "i7".parse().unwrap();
        assert_eq!(v.style, FontStyle::Italic);
        assert_eq!(v.weight, FontWeight::BOLD);
        assert_eq!(v.to_string(), "i7");
        assert_eq!(v.to_css(), "font-style:italic;font-weight:700;");

        let v: FontVariation = "o1".parse().unwrap();
        assert_eq!(v.style, FontStyle::Oblique);
        assert_eq!(v.weight, FontWeight::THIN);
    }

    #[test]
    fn test_default_variation_is_n4() {
        assert_eq!(FontVariation::default().to_string(), "n4");
        assert_eq!(Font::named("Arimo").variation(), "n4".parse().unwrap());
    }

    #[test]
    fn test_invalid_variation() {
        for fvd in ["", "n", "x4", "n0", "nn", "n44"] {
            assert!(
                matches!(fvd.parse::<FontVariation>(), Err(WatchError::InvalidVariation(_))),
                "{fvd:?} should be rejected"
            );
        }
        assert!(Font::with_fvd("Arimo", "b4").is_err());
    }

    #[test]
    fn test_stack_display_quotes_names() {
        let font = Font::named("Droid Sans");
        let stack = FontStack::with_fallback(&font, GenericFamily::Serif);
        assert_eq!(stack.to_string(), "'Droid Sans',serif");

        let stack = FontStack::with_fallback(&Font::named("Arimo"), GenericFamily::SansSerif);
        assert_eq!(stack.to_string(), "Arimo,sans-serif");

        let stack = FontStack::generic(GenericFamily::Serif, FontVariation::default());
        assert_eq!(stack.to_css(), "font-family:serif;font-style:normal;font-weight:400;");
    }

    #[test]
    fn test_stack_strips_existing_quotes() {
        let stack = FontStack::new(vec!["\"Open Sans\"".into()], FontVariation::default());
        assert_eq!(stack.to_string(), "'Open Sans'");
    }

    #[test]
    fn test_generic_family_names() {
        for family in GenericFamily::ALL {
            assert_eq!(GenericFamily::from_name(family.as_str()), Some(family));
        }
        assert_eq!(GenericFamily::from_name("monospace"), None);
    }
}
