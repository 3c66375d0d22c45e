//! The IRATA instruction set, written against the HDL catalog
//!
//! Every instruction is declared as raw steps; the compiler prepends the
//! fetch preamble, inserts the step-counter sequencing, validates, and
//! optimizes. Stage numbers here are one per declared step.
//!
//! Conventions used throughout:
//! - `pc.write` + `memory.mar.read` points the MAR at the byte PC
//!   addresses; `pc.increment` in the same step advances past it.
//! - Zero-page operands land in `mar.low` with `mar.high.reset` forcing
//!   the zero page.
//! - Absolute operands assemble in `tmp` and transfer to the MAR (or the
//!   PC, for jumps) over the address bus.
//! - Stack addressing loads `mar.low` from `sp` with `mar.stack_page`
//!   forcing the 0x01 page. Pushes decrement `sp` afterwards; pulls
//!   increment it first.

use irata2_hdl::{Catalog, ControlId, Cpu as HdlCpu};
use irata2_isa::Opcode;

use crate::compiler::Compiler;
use crate::error::MicrocodeError;
use crate::ir::{Instruction, InstructionSet, InstructionVariant, Step};
use crate::program::MicrocodeProgram;

struct Dsl<'a> {
    catalog: &'a Catalog,
}

impl Dsl<'_> {
    fn ctl(&self, path: &str, context: &str) -> Result<ControlId, MicrocodeError> {
        Ok(self.catalog.require(path, context)?)
    }

    fn step(
        &self,
        stage: u32,
        paths: &[&str],
        context: &str,
    ) -> Result<Step, MicrocodeError> {
        let mut controls = Vec::with_capacity(paths.len());
        for path in paths {
            controls.push(self.ctl(path, context)?);
        }
        Ok(Step::new(stage, controls))
    }

    fn steps(&self, lists: &[&[&str]], context: &str) -> Result<Vec<Step>, MicrocodeError> {
        lists
            .iter()
            .enumerate()
            .map(|(stage, paths)| self.step(stage as u32, paths, context))
            .collect()
    }

    fn unconditional(
        &self,
        opcode: Opcode,
        lists: &[&[&str]],
    ) -> Result<Instruction, MicrocodeError> {
        let steps = self.steps(lists, &opcode.to_string())?;
        Ok(Instruction::new(
            opcode,
            vec![InstructionVariant::unconditional(steps)],
        ))
    }

    /// Relative branch: taken when `flag` equals `value`, otherwise the
    /// operand byte is skipped.
    fn branch(&self, opcode: Opcode, flag: &str, value: bool) -> Result<Instruction, MicrocodeError> {
        let context = opcode.to_string();
        let taken = self.steps(
            &[
                &["pc.write", "memory.mar.read", "pc.increment"],
                &[
                    "memory.write",
                    "pc.signed_offset.read",
                    "pc.add_signed_offset",
                ],
            ],
            &context,
        )?;
        let skipped = self.steps(&[&["pc.increment"]], &context)?;
        Ok(Instruction::new(
            opcode,
            vec![
                InstructionVariant::conditional(flag, value, taken),
                InstructionVariant::conditional(flag, !value, skipped),
            ],
        ))
    }
}

/// Build the full IRATA instruction set against a CPU descriptor
pub fn build_instruction_set(hdl: &HdlCpu) -> Result<InstructionSet, MicrocodeError> {
    let d = Dsl {
        catalog: hdl.catalog(),
    };

    let fetch_preamble = vec![
        d.step(0, &["pc.write", "memory.mar.read"], "fetch")?,
        d.step(
            0,
            &[
                "memory.write",
                "controller.ir.read",
                "pc.increment",
                "controller.instruction_start",
            ],
            "fetch",
        )?,
    ];

    let mut instructions = Vec::new();

    // System
    //
    // BRK is the reserved IRQ entry. It pushes the latched instruction
    // address (IPC) rather than the PC, because the injected fetch has
    // already advanced PC past the preempted instruction; RTI therefore
    // resumes exactly where execution was interrupted.
    instructions.push(d.unconditional(
        Opcode::Brk,
        &[
            &["sp.write", "memory.mar.low.read", "memory.mar.stack_page"],
            &["controller.ipc.high.write", "memory.read", "sp.decrement"],
            &["sp.write", "memory.mar.low.read", "memory.mar.stack_page"],
            &["controller.ipc.low.write", "memory.read", "sp.decrement"],
            &["sp.write", "memory.mar.low.read", "memory.mar.stack_page"],
            &["status.write", "memory.read", "sp.decrement"],
            &["memory.mar.irq_vector"],
            &["memory.write", "pc.low.read", "memory.mar.increment"],
            &["memory.write", "pc.high.read", "status.interrupt_disable.set"],
        ],
    )?);
    instructions.push(d.unconditional(Opcode::Nop, &[&[]])?);
    instructions.push(d.unconditional(Opcode::Hlt, &[&["halt"]])?);
    instructions.push(d.unconditional(Opcode::Crs, &[&["crash"]])?);

    // Flags
    instructions.push(d.unconditional(Opcode::Clc, &[&["status.carry.clear"]])?);
    instructions.push(d.unconditional(Opcode::Sec, &[&["status.carry.set"]])?);
    instructions.push(d.unconditional(Opcode::Cli, &[&["status.interrupt_disable.clear"]])?);
    instructions.push(d.unconditional(Opcode::Sei, &[&["status.interrupt_disable.set"]])?);

    // Jumps and returns
    instructions.push(d.unconditional(
        Opcode::JmpAbs,
        &[
            &["pc.write", "memory.mar.read"],
            &["memory.write", "tmp.low.read", "memory.mar.increment"],
            &["memory.write", "tmp.high.read"],
            &["tmp.write", "pc.read"],
        ],
    )?);
    instructions.push(d.unconditional(
        Opcode::JsrAbs,
        &[
            &["pc.write", "memory.mar.read", "pc.increment"],
            &[
                "memory.write",
                "tmp.low.read",
                "memory.mar.increment",
                "pc.increment",
            ],
            &["memory.write", "tmp.high.read"],
            &["sp.write", "memory.mar.low.read", "memory.mar.stack_page"],
            &["pc.high.write", "memory.read", "sp.decrement"],
            &["sp.write", "memory.mar.low.read", "memory.mar.stack_page"],
            &["pc.low.write", "memory.read", "sp.decrement"],
            &["tmp.write", "pc.read"],
        ],
    )?);
    instructions.push(d.unconditional(
        Opcode::Rts,
        &[
            &["sp.increment"],
            &["sp.write", "memory.mar.low.read", "memory.mar.stack_page"],
            &["memory.write", "pc.low.read", "sp.increment"],
            &["sp.write", "memory.mar.low.read", "memory.mar.stack_page"],
            &["memory.write", "pc.high.read"],
        ],
    )?);
    instructions.push(d.unconditional(
        Opcode::Rti,
        &[
            &["sp.increment"],
            &["sp.write", "memory.mar.low.read", "memory.mar.stack_page"],
            &["memory.write", "status.read", "sp.increment"],
            &["sp.write", "memory.mar.low.read", "memory.mar.stack_page"],
            &["memory.write", "pc.low.read", "sp.increment"],
            &["sp.write", "memory.mar.low.read", "memory.mar.stack_page"],
            &["memory.write", "pc.high.read"],
        ],
    )?);

    // Branches
    instructions.push(d.branch(Opcode::BeqRel, "zero", true)?);
    instructions.push(d.branch(Opcode::BneRel, "zero", false)?);
    instructions.push(d.branch(Opcode::BcsRel, "carry", true)?);
    instructions.push(d.branch(Opcode::BccRel, "carry", false)?);
    instructions.push(d.branch(Opcode::BmiRel, "negative", true)?);
    instructions.push(d.branch(Opcode::BplRel, "negative", false)?);

    // Arithmetic. ADC/SBC run the ALU against the accumulator; compares
    // run the same subtraction with a forced borrow-free carry and drop
    // the result on the floor (only the analyzer observes it).
    instructions.push(d.unconditional(
        Opcode::AdcImm,
        &[
            &["pc.write", "memory.mar.read", "pc.increment"],
            &["a.write", "alu.lhs.read"],
            &["memory.write", "alu.rhs.read", "alu.opcode_bit_0"],
            &["alu.result.write", "a.read", "status.analyzer.read"],
        ],
    )?);
    instructions.push(d.unconditional(
        Opcode::SbcImm,
        &[
            &["pc.write", "memory.mar.read", "pc.increment"],
            &["a.write", "alu.lhs.read"],
            &["memory.write", "alu.rhs.read", "alu.opcode_bit_1"],
            &["alu.result.write", "a.read", "status.analyzer.read"],
        ],
    )?);
    for (opcode, source) in [
        (Opcode::CmpImm, "a.write"),
        (Opcode::CpxImm, "x.write"),
        (Opcode::CpyImm, "y.write"),
    ] {
        instructions.push(d.unconditional(
            opcode,
            &[
                &["pc.write", "memory.mar.read", "pc.increment"],
                &[source, "alu.lhs.read", "status.carry.set"],
                &["memory.write", "alu.rhs.read", "alu.opcode_bit_1"],
                &["alu.result.write", "status.analyzer.read"],
            ],
        )?);
    }

    // Increments and decrements. Decrement is SUB with rhs reset to zero
    // and carry cleared, i.e. lhs - (0 + 1).
    for (opcode, source, sink) in [
        (Opcode::Inx, "x.write", "x.read"),
        (Opcode::Iny, "y.write", "y.read"),
    ] {
        instructions.push(d.unconditional(
            opcode,
            &[
                &[source, "alu.lhs.read", "alu.opcode_bit_0", "alu.opcode_bit_1"],
                &["alu.result.write", sink, "status.analyzer.read"],
            ],
        )?);
    }
    for (opcode, source, sink) in [
        (Opcode::Dex, "x.write", "x.read"),
        (Opcode::Dey, "y.write", "y.read"),
    ] {
        instructions.push(d.unconditional(
            opcode,
            &[
                &[source, "alu.lhs.read", "alu.rhs.reset", "status.carry.clear"],
                &["alu.opcode_bit_1"],
                &["alu.result.write", sink, "status.analyzer.read"],
            ],
        )?);
    }
    instructions.push(d.unconditional(
        Opcode::IncZpg,
        &[
            &["pc.write", "memory.mar.read", "pc.increment"],
            &["memory.write", "memory.mar.low.read", "memory.mar.high.reset"],
            &[
                "memory.write",
                "alu.lhs.read",
                "alu.opcode_bit_0",
                "alu.opcode_bit_1",
            ],
            &["alu.result.write", "memory.read", "status.analyzer.read"],
        ],
    )?);
    instructions.push(d.unconditional(
        Opcode::DecZpg,
        &[
            &["pc.write", "memory.mar.read", "pc.increment"],
            &["memory.write", "memory.mar.low.read", "memory.mar.high.reset"],
            &[
                "memory.write",
                "alu.lhs.read",
                "alu.rhs.reset",
                "status.carry.clear",
            ],
            &["alu.opcode_bit_1"],
            &["alu.result.write", "memory.read", "status.analyzer.read"],
        ],
    )?);

    // Stack
    instructions.push(d.unconditional(
        Opcode::Pha,
        &[
            &["sp.write", "memory.mar.low.read", "memory.mar.stack_page"],
            &["a.write", "memory.read", "sp.decrement"],
        ],
    )?);
    instructions.push(d.unconditional(
        Opcode::Pla,
        &[
            &["sp.increment"],
            &["sp.write", "memory.mar.low.read", "memory.mar.stack_page"],
            &["memory.write", "a.read", "status.analyzer.read"],
        ],
    )?);
    instructions.push(d.unconditional(Opcode::Txs, &[&["x.write", "sp.read"]])?);
    instructions.push(d.unconditional(
        Opcode::Tsx,
        &[&["sp.write", "x.read", "status.analyzer.read"]],
    )?);

    // Register transfers
    for (opcode, source, sink) in [
        (Opcode::Tax, "a.write", "x.read"),
        (Opcode::Txa, "x.write", "a.read"),
        (Opcode::Tay, "a.write", "y.read"),
        (Opcode::Tya, "y.write", "a.read"),
    ] {
        instructions.push(d.unconditional(
            opcode,
            &[&[source, sink, "status.analyzer.read"]],
        )?);
    }

    // Loads
    for (opcode, sink) in [
        (Opcode::LdaImm, "a.read"),
        (Opcode::LdxImm, "x.read"),
        (Opcode::LdyImm, "y.read"),
    ] {
        instructions.push(d.unconditional(
            opcode,
            &[
                &["pc.write", "memory.mar.read", "pc.increment"],
                &["memory.write", sink, "status.analyzer.read"],
            ],
        )?);
    }
    instructions.push(d.unconditional(
        Opcode::LdaZpg,
        &[
            &["pc.write", "memory.mar.read", "pc.increment"],
            &["memory.write", "memory.mar.low.read", "memory.mar.high.reset"],
            &["memory.write", "a.read", "status.analyzer.read"],
        ],
    )?);
    instructions.push(d.unconditional(
        Opcode::LdaAbs,
        &[
            &["pc.write", "memory.mar.read", "pc.increment"],
            &[
                "memory.write",
                "tmp.low.read",
                "memory.mar.increment",
                "pc.increment",
            ],
            &["memory.write", "tmp.high.read"],
            &["tmp.write", "memory.mar.read"],
            &["memory.write", "a.read", "status.analyzer.read"],
        ],
    )?);
    instructions.push(d.unconditional(
        Opcode::LdaZpx,
        &[
            &["pc.write", "memory.mar.read", "pc.increment"],
            &["memory.write", "memory.mar.low.read", "memory.mar.high.reset"],
            &["x.write", "memory.mar.offset.read", "memory.mar.add_offset"],
            &["memory.write", "a.read", "status.analyzer.read"],
        ],
    )?);

    // Stores
    for (opcode, source) in [
        (Opcode::StaZpg, "a.write"),
        (Opcode::StxZpg, "x.write"),
        (Opcode::StyZpg, "y.write"),
    ] {
        instructions.push(d.unconditional(
            opcode,
            &[
                &["pc.write", "memory.mar.read", "pc.increment"],
                &["memory.write", "memory.mar.low.read", "memory.mar.high.reset"],
                &[source, "memory.read"],
            ],
        )?);
    }
    instructions.push(d.unconditional(
        Opcode::StaAbs,
        &[
            &["pc.write", "memory.mar.read", "pc.increment"],
            &[
                "memory.write",
                "tmp.low.read",
                "memory.mar.increment",
                "pc.increment",
            ],
            &["memory.write", "tmp.high.read"],
            &["tmp.write", "memory.mar.read"],
            &["a.write", "memory.read"],
        ],
    )?);

    Ok(InstructionSet {
        fetch_preamble,
        instructions,
    })
}

/// Compile the IRATA instruction set for a CPU descriptor
pub fn compile(hdl: &HdlCpu) -> Result<MicrocodeProgram, MicrocodeError> {
    let compiler = Compiler::new(hdl)?;
    compiler.compile(build_instruction_set(hdl)?)
}
