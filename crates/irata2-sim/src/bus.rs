//! Shared buses with single-writer arbitration
//!
//! A bus holds at most one value per tick, together with the path of the
//! component that drove it. Writes are legal only during Write phase and
//! only once per tick; reads are legal only during Read phase and only
//! after a writer has driven the bus. Both constraints are enforced at
//! runtime because a violation is a microcode bug, not a recoverable
//! condition.

use std::cell::RefCell;
use std::rc::Rc;

use irata2_core::{Byte, TickPhase, Word};

use crate::component::{Component, SimCtx};

pub type ByteBus = Bus<Byte>;
pub type WordBus = Bus<Word>;

struct BusState<T> {
    value: Option<T>,
    writer: Option<String>,
}

impl<T> Default for BusState<T> {
    fn default() -> Self {
        BusState {
            value: None,
            writer: None,
        }
    }
}

/// A single-writer-per-tick bus carrying values of type `T`
#[derive(Clone)]
pub struct Bus<T: Copy> {
    path: String,
    ctx: SimCtx,
    state: Rc<RefCell<BusState<T>>>,
}

impl<T: Copy> Bus<T> {
    pub fn new(ctx: &SimCtx, path: String) -> Bus<T> {
        Bus {
            path,
            ctx: ctx.clone(),
            state: Rc::new(RefCell::new(BusState::default())),
        }
    }

    /// Does the bus carry a value this tick?
    pub fn has_value(&self) -> bool {
        self.state.borrow().value.is_some()
    }

    /// Drive the bus. Panics outside Write phase or when another
    /// component drove the bus earlier in the same tick.
    pub fn write(&self, value: T, writer_path: &str) {
        if self.ctx.phase() != TickPhase::Write {
            panic!("bus write outside Write phase: {} (by {writer_path})", self.path);
        }
        let mut state = self.state.borrow_mut();
        if let Some(existing) = &state.writer {
            panic!(
                "bus already written: {} (by {existing}, then {writer_path})",
                self.path
            );
        }
        state.value = Some(value);
        state.writer = Some(writer_path.to_string());
    }

    /// Sample the bus. Panics outside Read phase or when no component
    /// drove the bus this tick.
    pub fn read(&self, reader_path: &str) -> T {
        if self.ctx.phase() != TickPhase::Read {
            panic!("bus read outside Read phase: {} (by {reader_path})", self.path);
        }
        let state = self.state.borrow();
        match state.value {
            Some(value) => value,
            None => panic!("bus read before write: {} (by {reader_path})", self.path),
        }
    }
}

impl<T: Copy> Component for Bus<T> {
    fn path(&self) -> &str {
        &self.path
    }

    fn tick_clear(&mut self) {
        let mut state = self.state.borrow_mut();
        state.value = None;
        state.writer = None;
    }
}
