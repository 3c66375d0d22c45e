//! Runtime control signals
//!
//! A control can only be asserted, cleared, or set while the CPU is in
//! Control phase, and its asserted state can only be observed during its
//! bound phase. This catches timing bugs that would be silent in real
//! hardware, where out-of-phase reads return stale or undefined values.
//!
//! Controls are cheap shared handles: the owning component holds one as a
//! tree node, the CPU's control catalog holds another, and the controller
//! asserts through the catalog's copies during microcode dispatch.

use std::cell::Cell;
use std::rc::Rc;

use irata2_core::TickPhase;
use irata2_hdl::ControlInfo;

use crate::component::{Component, SimCtx};

struct ControlState {
    info: ControlInfo,
    asserted: Cell<bool>,
    ctx: SimCtx,
}

/// A phase-typed boolean control line
#[derive(Clone)]
pub struct Control {
    state: Rc<ControlState>,
}

impl Control {
    /// Auto-reset control: cleared automatically during Clear phase
    pub fn new(ctx: &SimCtx, path: String, phase: TickPhase) -> Control {
        Control::build(ctx, path, phase, true)
    }

    /// Latched control: persists across ticks until explicitly cleared
    pub fn latched(ctx: &SimCtx, path: String, phase: TickPhase) -> Control {
        Control::build(ctx, path, phase, false)
    }

    fn build(ctx: &SimCtx, path: String, phase: TickPhase, auto_reset: bool) -> Control {
        let control = Control {
            state: Rc::new(ControlState {
                info: ControlInfo {
                    phase,
                    auto_reset,
                    path,
                },
                asserted: Cell::new(false),
                ctx: ctx.clone(),
            }),
        };
        ctx.register_control(control.clone());
        control
    }

    /// Control metadata: bound phase, reset behavior, path
    pub fn info(&self) -> &ControlInfo {
        &self.state.info
    }

    fn ensure_phase(&self, expected: TickPhase, action: &str) {
        let current = self.state.ctx.phase();
        if current != expected {
            panic!(
                "control {action} outside {expected} phase (in {current}): {}",
                self.state.info.path
            );
        }
    }

    /// Assert the control. Legal only during Control phase.
    pub fn assert(&self) {
        self.ensure_phase(TickPhase::Control, "assert");
        self.state.asserted.set(true);
    }

    /// Clear the control. Legal only during Control phase.
    pub fn clear(&self) {
        self.ensure_phase(TickPhase::Control, "clear");
        self.state.asserted.set(false);
    }

    /// Set the control to an explicit value. Legal only during Control
    /// phase.
    pub fn set(&self, asserted: bool) {
        self.ensure_phase(TickPhase::Control, "set");
        self.state.asserted.set(asserted);
    }

    /// Observe the control. Legal only during its bound phase.
    pub fn is_asserted(&self) -> bool {
        self.ensure_phase(self.state.info.phase, "read");
        self.state.asserted.get()
    }
}

impl Component for Control {
    fn path(&self) -> &str {
        &self.state.info.path
    }

    fn tick_clear(&mut self) {
        if self.state.info.auto_reset {
            self.state.asserted.set(false);
        }
    }
}
