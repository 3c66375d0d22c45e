//! Component tree and shared simulation context
//!
//! Every component carries a stable dot-joined path and five phase hooks.
//! The default hook implementation recurses through the component's
//! children in insertion order; composites override a hook to add their
//! own behavior and are responsible for propagating to children first.
//!
//! The [`SimCtx`] is the single shared handle components keep: the CPU's
//! currently active phase (queried by controls and buses for their
//! legality checks) and the control registry populated during
//! construction, from which the root CPU builds its control catalog.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use irata2_core::TickPhase;

use crate::control::Control;

/// Join a parent path and a component name
///
/// The root CPU's path is empty, so its children have bare names.
pub fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}

/// Shared simulation context: current phase plus the construction-time
/// control registry
#[derive(Clone, Default)]
pub struct SimCtx {
    phase: Rc<Cell<TickPhase>>,
    controls: Rc<RefCell<Vec<Control>>>,
}

impl SimCtx {
    pub fn new() -> SimCtx {
        SimCtx::default()
    }

    /// The CPU's currently active tick phase
    pub fn phase(&self) -> TickPhase {
        self.phase.get()
    }

    /// Enter a phase. Driven by the CPU's tick loop; tests use it to
    /// exercise single phases in isolation.
    pub fn set_phase(&self, phase: TickPhase) {
        self.phase.set(phase);
    }

    /// Record a control during construction
    pub(crate) fn register_control(&self, control: Control) {
        self.controls.borrow_mut().push(control);
    }

    /// Drain the registry; called once by the root CPU after the tree is
    /// built
    pub(crate) fn take_controls(&self) -> Vec<Control> {
        std::mem::take(&mut self.controls.borrow_mut())
    }
}

/// A named node in the component tree with five phase hooks
pub trait Component {
    /// Stable dot-joined path from the root
    fn path(&self) -> &str;

    /// Visit direct children in insertion order
    fn for_each_child(&mut self, _f: &mut dyn FnMut(&mut dyn Component)) {}

    fn tick_control(&mut self) {
        self.for_each_child(&mut |child| child.tick_control());
    }

    fn tick_write(&mut self) {
        self.for_each_child(&mut |child| child.tick_write());
    }

    fn tick_read(&mut self) {
        self.for_each_child(&mut |child| child.tick_read());
    }

    fn tick_process(&mut self) {
        self.for_each_child(&mut |child| child.tick_process());
    }

    fn tick_clear(&mut self) {
        self.for_each_child(&mut |child| child.tick_clear());
    }
}
