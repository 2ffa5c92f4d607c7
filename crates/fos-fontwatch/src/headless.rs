//! Headless document
//!
//! In-memory stand-in for a rendering context. Probes resolve their width
//! from per-family metrics: the first available family of the probe's stack
//! supplies the advance of its character. Web fonts become available when
//! loaded into the document.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use crate::font::{FontStack, GenericFamily};
use crate::ruler::{DomHelper, FontRuler};

/// Default advance of the serif family
pub const DEFAULT_SERIF_ADVANCE: u32 = 100;

/// Default advance of the sans-serif family
pub const DEFAULT_SANS_SERIF_ADVANCE: u32 = 110;

/// Character advances of one family
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyMetrics {
    default_advance: u32,
    advances: HashMap<char, u32>,
}

impl FamilyMetrics {
    /// Every character has the same advance
    pub fn uniform(advance: u32) -> Self {
        Self {
            default_advance: advance,
            advances: HashMap::new(),
        }
    }

    /// Override the advance of one character
    pub fn with_advance(mut self, ch: char, advance: u32) -> Self {
        self.advances.insert(ch, advance);
        self
    }

    pub fn advance(&self, ch: char) -> u32 {
        self.advances.get(&ch).copied().unwrap_or(self.default_advance)
    }
}

/// Probe identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProbeId(u32);

#[derive(Debug)]
struct ProbeNode {
    ch: char,
    stack: FontStack,
}

#[derive(Debug)]
struct DocumentState {
    /// Attached probes, in insertion order
    probes: BTreeMap<ProbeId, ProbeNode>,
    next_id: u32,
    serif: FamilyMetrics,
    sans_serif: FamilyMetrics,
    /// Loaded web fonts
    fonts: HashMap<String, FamilyMetrics>,
    /// Family substituted for any unavailable first family
    last_resort: Option<GenericFamily>,
    width_reads: u64,
}

impl DocumentState {
    fn generic(&self, family: GenericFamily) -> &FamilyMetrics {
        match family {
            GenericFamily::Serif => &self.serif,
            GenericFamily::SansSerif => &self.sans_serif,
        }
    }

    fn available(&self, family: &str) -> Option<&FamilyMetrics> {
        match GenericFamily::from_name(family) {
            Some(generic) => Some(self.generic(generic)),
            None => self.fonts.get(family),
        }
    }

    fn resolve(&self, stack: &FontStack) -> &FamilyMetrics {
        for (i, family) in stack.families().iter().enumerate() {
            if let Some(metrics) = self.available(family) {
                return metrics;
            }
            if i == 0 {
                if let Some(last_resort) = self.last_resort {
                    return self.generic(last_resort);
                }
            }
        }
        &self.serif
    }

    fn measure(&self, ch: char, stack: &FontStack) -> u32 {
        self.resolve(stack).advance(ch)
    }
}

/// Shared handle to an in-memory document
#[derive(Debug, Clone)]
pub struct HeadlessDocument {
    state: Rc<RefCell<DocumentState>>,
}

impl HeadlessDocument {
    /// Document with the default generic metrics
    pub fn new() -> Self {
        Self::with_generic_metrics(
            FamilyMetrics::uniform(DEFAULT_SERIF_ADVANCE),
            FamilyMetrics::uniform(DEFAULT_SANS_SERIF_ADVANCE),
        )
    }

    pub fn with_generic_metrics(serif: FamilyMetrics, sans_serif: FamilyMetrics) -> Self {
        Self {
            state: Rc::new(RefCell::new(DocumentState {
                probes: BTreeMap::new(),
                next_id: 0,
                serif,
                sans_serif,
                fonts: HashMap::new(),
                last_resort: None,
                width_reads: 0,
            })),
        }
    }

    /// Make a web font available
    pub fn load_font(&self, name: impl Into<String>, metrics: FamilyMetrics) {
        let name = name.into();
        tracing::debug!("Headless document loaded font {}", name);
        self.state.borrow_mut().fonts.insert(name, metrics);
    }

    pub fn unload_font(&self, name: &str) -> bool {
        self.state.borrow_mut().fonts.remove(name).is_some()
    }

    pub fn is_font_loaded(&self, name: &str) -> bool {
        self.state.borrow().fonts.contains_key(name)
    }

    /// Render unavailable fonts in `family` regardless of the requested stack
    pub fn set_last_resort(&self, family: Option<GenericFamily>) {
        self.state.borrow_mut().last_resort = family;
    }

    /// Width `ch` would render at in `stack`
    pub fn measure(&self, ch: char, stack: &FontStack) -> u32 {
        self.state.borrow().measure(ch, stack)
    }

    /// Number of attached probes
    pub fn probe_count(&self) -> usize {
        self.state.borrow().probes.len()
    }

    /// Character and CSS font stack of each attached probe
    pub fn probe_stacks(&self) -> Vec<(char, String)> {
        self.state
            .borrow()
            .probes
            .values()
            .map(|node| (node.ch, node.stack.to_string()))
            .collect()
    }

    /// Width reads served so far
    pub fn width_reads(&self) -> u64 {
        self.state.borrow().width_reads
    }

    fn insert(&self, ch: char, stack: &FontStack) -> ProbeId {
        let mut state = self.state.borrow_mut();
        let id = ProbeId(state.next_id);
        state.next_id += 1;
        state.probes.insert(id, ProbeNode { ch, stack: stack.clone() });
        id
    }

    fn remove(&self, id: ProbeId) {
        self.state.borrow_mut().probes.remove(&id);
    }

    fn probe_width(&self, id: ProbeId) -> u32 {
        let mut state = self.state.borrow_mut();
        state.width_reads += 1;
        match state.probes.get(&id) {
            Some(node) => state.measure(node.ch, &node.stack),
            None => 0,
        }
    }

    fn set_probe_stack(&self, id: ProbeId, stack: &FontStack) {
        if let Some(node) = self.state.borrow_mut().probes.get_mut(&id) {
            node.stack = stack.clone();
        }
    }
}

impl Default for HeadlessDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl DomHelper for HeadlessDocument {
    type Ruler = HeadlessRuler;

    fn create_ruler(&self, ch: char, stack: &FontStack) -> HeadlessRuler {
        HeadlessRuler {
            id: self.insert(ch, stack),
            document: self.clone(),
        }
    }
}

/// Probe attached to a [`HeadlessDocument`]
#[derive(Debug)]
pub struct HeadlessRuler {
    document: HeadlessDocument,
    id: ProbeId,
}

impl HeadlessRuler {
    pub fn id(&self) -> ProbeId {
        self.id
    }
}

impl FontRuler for HeadlessRuler {
    /// Detached probes have no layout and report zero
    fn width(&self) -> u32 {
        self.document.probe_width(self.id)
    }

    fn set_font_stack(&mut self, stack: &FontStack) {
        self.document.set_probe_stack(self.id, stack);
    }

    fn dispose(&mut self) {
        self.document.remove(self.id);
    }
}
