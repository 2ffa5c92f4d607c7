//! Probe contract
//!
//! The runner never touches a document directly. A [`DomHelper`] creates
//! rulers: invisible elements rendering a single character in a font stack,
//! inserted into the document as soon as they are created.

use crate::font::FontStack;

/// A single measurement probe
pub trait FontRuler {
    /// Current rendered width in pixels
    fn width(&self) -> u32;

    /// Replace the font stack applied to the probe
    fn set_font_stack(&mut self, stack: &FontStack);

    /// Remove the probe from the document. Called once by the owner.
    fn dispose(&mut self);
}

/// Creates probes in a document
pub trait DomHelper {
    type Ruler: FontRuler;

    /// Create a ruler rendering `ch` in `stack` and insert it
    fn create_ruler(&self, ch: char, stack: &FontStack) -> Self::Ruler;
}
