//! IRATA2 Instruction Set Architecture
//!
//! Static tables describing the documented instruction set: opcodes,
//! addressing modes, affected status flags, and nominal cycle counts.
//! The microcode compiler checks its coverage against this table, and the
//! test suites use it to hand-assemble programs.

use std::fmt;

use bitflags::bitflags;

/// Addressing mode of an instruction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AddressingMode {
    /// No operand
    Implied,
    /// One-byte literal operand
    Immediate,
    /// One-byte zero-page address
    ZeroPage,
    /// One-byte zero-page address indexed by X
    ZeroPageX,
    /// Two-byte absolute address (little-endian)
    Absolute,
    /// One-byte signed displacement from the next instruction
    Relative,
}

impl AddressingMode {
    /// Number of operand bytes following the opcode
    pub fn operand_bytes(self) -> u8 {
        match self {
            AddressingMode::Implied => 0,
            AddressingMode::Immediate
            | AddressingMode::ZeroPage
            | AddressingMode::ZeroPageX
            | AddressingMode::Relative => 1,
            AddressingMode::Absolute => 2,
        }
    }

    /// Short assembler-style code (IMP, IMM, ...)
    pub fn code(self) -> &'static str {
        match self {
            AddressingMode::Implied => "IMP",
            AddressingMode::Immediate => "IMM",
            AddressingMode::ZeroPage => "ZPG",
            AddressingMode::ZeroPageX => "ZPX",
            AddressingMode::Absolute => "ABS",
            AddressingMode::Relative => "REL",
        }
    }
}

impl fmt::Display for AddressingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Broad instruction grouping, used for documentation and tooling
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InstructionCategory {
    System,
    Flag,
    Jump,
    Branch,
    Arithmetic,
    IncDec,
    Stack,
    Transfer,
    Load,
    Store,
}

bitflags! {
    /// Status flags an instruction may update
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct StatusFlags: u8 {
        const C = 1 << 0;
        const Z = 1 << 1;
        const I = 1 << 2;
        const V = 1 << 6;
        const N = 1 << 7;
    }
}

/// Documented instruction opcodes
///
/// Opcode 0x00 is the reserved IRQ entry: the instruction register
/// synthesizes it when an interrupt is taken, and its microcode performs
/// the interrupt sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Opcode {
    Brk = 0x00,
    Nop = 0x01,
    Hlt = 0x02,
    Crs = 0x03,
    Clc = 0x10,
    Sec = 0x11,
    Cli = 0x12,
    Sei = 0x13,
    JmpAbs = 0x20,
    JsrAbs = 0x21,
    Rts = 0x22,
    Rti = 0x23,
    BeqRel = 0x30,
    BneRel = 0x31,
    BcsRel = 0x32,
    BccRel = 0x33,
    BmiRel = 0x34,
    BplRel = 0x35,
    AdcImm = 0x40,
    SbcImm = 0x41,
    CmpImm = 0x42,
    CpxImm = 0x43,
    CpyImm = 0x44,
    Inx = 0x50,
    Dex = 0x51,
    Iny = 0x52,
    Dey = 0x53,
    IncZpg = 0x54,
    DecZpg = 0x55,
    Pha = 0x60,
    Pla = 0x61,
    Txs = 0x62,
    Tsx = 0x63,
    Tax = 0x70,
    Txa = 0x71,
    Tay = 0x72,
    Tya = 0x73,
    LdaImm = 0xA0,
    LdaZpg = 0xA1,
    LdaAbs = 0xA2,
    LdaZpx = 0xA3,
    LdxImm = 0xA8,
    LdyImm = 0xA9,
    StaZpg = 0xB0,
    StaAbs = 0xB1,
    StxZpg = 0xB2,
    StyZpg = 0xB3,
}

impl Opcode {
    /// Numeric opcode value
    #[inline]
    pub fn value(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match IsaInfo::instruction(*self) {
            Some(info) => write!(f, "{} {}", info.mnemonic, info.addressing_mode),
            None => write!(f, "0x{:02X}", self.value()),
        }
    }
}

/// Static description of one documented instruction
#[derive(Clone, Copy, Debug)]
pub struct InstructionInfo {
    pub opcode: Opcode,
    pub mnemonic: &'static str,
    pub addressing_mode: AddressingMode,
    pub category: InstructionCategory,
    /// Nominal tick count (fetch preamble included; branches count the
    /// taken path)
    pub cycles: u8,
    pub flags_affected: StatusFlags,
    pub description: &'static str,
}

use AddressingMode::*;
use InstructionCategory::*;

const fn zn() -> StatusFlags {
    StatusFlags::Z.union(StatusFlags::N)
}

const fn znc() -> StatusFlags {
    StatusFlags::Z.union(StatusFlags::N).union(StatusFlags::C)
}

static INSTRUCTIONS: &[InstructionInfo] = &[
    InstructionInfo {
        opcode: Opcode::Brk,
        mnemonic: "BRK",
        addressing_mode: Implied,
        category: System,
        cycles: 11,
        flags_affected: StatusFlags::I,
        description: "Interrupt entry: push IPC and status, vector through 0xFFFE",
    },
    InstructionInfo {
        opcode: Opcode::Nop,
        mnemonic: "NOP",
        addressing_mode: Implied,
        category: System,
        cycles: 3,
        flags_affected: StatusFlags::empty(),
        description: "No operation",
    },
    InstructionInfo {
        opcode: Opcode::Hlt,
        mnemonic: "HLT",
        addressing_mode: Implied,
        category: System,
        cycles: 3,
        flags_affected: StatusFlags::empty(),
        description: "Halt the CPU",
    },
    InstructionInfo {
        opcode: Opcode::Crs,
        mnemonic: "CRS",
        addressing_mode: Implied,
        category: System,
        cycles: 3,
        flags_affected: StatusFlags::empty(),
        description: "Crash the CPU (assertion failure)",
    },
    InstructionInfo {
        opcode: Opcode::Clc,
        mnemonic: "CLC",
        addressing_mode: Implied,
        category: Flag,
        cycles: 3,
        flags_affected: StatusFlags::C,
        description: "Clear carry flag",
    },
    InstructionInfo {
        opcode: Opcode::Sec,
        mnemonic: "SEC",
        addressing_mode: Implied,
        category: Flag,
        cycles: 3,
        flags_affected: StatusFlags::C,
        description: "Set carry flag",
    },
    InstructionInfo {
        opcode: Opcode::Cli,
        mnemonic: "CLI",
        addressing_mode: Implied,
        category: Flag,
        cycles: 3,
        flags_affected: StatusFlags::I,
        description: "Clear interrupt-disable flag",
    },
    InstructionInfo {
        opcode: Opcode::Sei,
        mnemonic: "SEI",
        addressing_mode: Implied,
        category: Flag,
        cycles: 3,
        flags_affected: StatusFlags::I,
        description: "Set interrupt-disable flag",
    },
    InstructionInfo {
        opcode: Opcode::JmpAbs,
        mnemonic: "JMP",
        addressing_mode: Absolute,
        category: Jump,
        cycles: 6,
        flags_affected: StatusFlags::empty(),
        description: "Jump to absolute address",
    },
    InstructionInfo {
        opcode: Opcode::JsrAbs,
        mnemonic: "JSR",
        addressing_mode: Absolute,
        category: Jump,
        cycles: 10,
        flags_affected: StatusFlags::empty(),
        description: "Jump to subroutine, pushing the return address",
    },
    InstructionInfo {
        opcode: Opcode::Rts,
        mnemonic: "RTS",
        addressing_mode: Implied,
        category: Jump,
        cycles: 7,
        flags_affected: StatusFlags::empty(),
        description: "Return from subroutine",
    },
    InstructionInfo {
        opcode: Opcode::Rti,
        mnemonic: "RTI",
        addressing_mode: Implied,
        category: Jump,
        cycles: 9,
        flags_affected: StatusFlags::all(),
        description: "Return from interrupt, restoring status and PC",
    },
    InstructionInfo {
        opcode: Opcode::BeqRel,
        mnemonic: "BEQ",
        addressing_mode: Relative,
        category: Branch,
        cycles: 4,
        flags_affected: StatusFlags::empty(),
        description: "Branch if zero flag set",
    },
    InstructionInfo {
        opcode: Opcode::BneRel,
        mnemonic: "BNE",
        addressing_mode: Relative,
        category: Branch,
        cycles: 4,
        flags_affected: StatusFlags::empty(),
        description: "Branch if zero flag clear",
    },
    InstructionInfo {
        opcode: Opcode::BcsRel,
        mnemonic: "BCS",
        addressing_mode: Relative,
        category: Branch,
        cycles: 4,
        flags_affected: StatusFlags::empty(),
        description: "Branch if carry flag set",
    },
    InstructionInfo {
        opcode: Opcode::BccRel,
        mnemonic: "BCC",
        addressing_mode: Relative,
        category: Branch,
        cycles: 4,
        flags_affected: StatusFlags::empty(),
        description: "Branch if carry flag clear",
    },
    InstructionInfo {
        opcode: Opcode::BmiRel,
        mnemonic: "BMI",
        addressing_mode: Relative,
        category: Branch,
        cycles: 4,
        flags_affected: StatusFlags::empty(),
        description: "Branch if negative flag set",
    },
    InstructionInfo {
        opcode: Opcode::BplRel,
        mnemonic: "BPL",
        addressing_mode: Relative,
        category: Branch,
        cycles: 4,
        flags_affected: StatusFlags::empty(),
        description: "Branch if negative flag clear",
    },
    InstructionInfo {
        opcode: Opcode::AdcImm,
        mnemonic: "ADC",
        addressing_mode: Immediate,
        category: Arithmetic,
        cycles: 6,
        flags_affected: znc().union(StatusFlags::V),
        description: "Add immediate to A with carry",
    },
    InstructionInfo {
        opcode: Opcode::SbcImm,
        mnemonic: "SBC",
        addressing_mode: Immediate,
        category: Arithmetic,
        cycles: 6,
        flags_affected: znc(),
        description: "Subtract immediate from A with borrow",
    },
    InstructionInfo {
        opcode: Opcode::CmpImm,
        mnemonic: "CMP",
        addressing_mode: Immediate,
        category: Arithmetic,
        cycles: 6,
        flags_affected: znc(),
        description: "Compare A with immediate",
    },
    InstructionInfo {
        opcode: Opcode::CpxImm,
        mnemonic: "CPX",
        addressing_mode: Immediate,
        category: Arithmetic,
        cycles: 6,
        flags_affected: znc(),
        description: "Compare X with immediate",
    },
    InstructionInfo {
        opcode: Opcode::CpyImm,
        mnemonic: "CPY",
        addressing_mode: Immediate,
        category: Arithmetic,
        cycles: 6,
        flags_affected: znc(),
        description: "Compare Y with immediate",
    },
    InstructionInfo {
        opcode: Opcode::Inx,
        mnemonic: "INX",
        addressing_mode: Implied,
        category: IncDec,
        cycles: 4,
        flags_affected: zn(),
        description: "Increment X",
    },
    InstructionInfo {
        opcode: Opcode::Dex,
        mnemonic: "DEX",
        addressing_mode: Implied,
        category: IncDec,
        cycles: 5,
        flags_affected: znc(),
        description: "Decrement X (routes through ALU SUB; carry is touched)",
    },
    InstructionInfo {
        opcode: Opcode::Iny,
        mnemonic: "INY",
        addressing_mode: Implied,
        category: IncDec,
        cycles: 4,
        flags_affected: zn(),
        description: "Increment Y",
    },
    InstructionInfo {
        opcode: Opcode::Dey,
        mnemonic: "DEY",
        addressing_mode: Implied,
        category: IncDec,
        cycles: 5,
        flags_affected: znc(),
        description: "Decrement Y (routes through ALU SUB; carry is touched)",
    },
    InstructionInfo {
        opcode: Opcode::IncZpg,
        mnemonic: "INC",
        addressing_mode: ZeroPage,
        category: IncDec,
        cycles: 6,
        flags_affected: zn(),
        description: "Increment zero-page memory",
    },
    InstructionInfo {
        opcode: Opcode::DecZpg,
        mnemonic: "DEC",
        addressing_mode: ZeroPage,
        category: IncDec,
        cycles: 7,
        flags_affected: znc(),
        description: "Decrement zero-page memory (carry is touched)",
    },
    InstructionInfo {
        opcode: Opcode::Pha,
        mnemonic: "PHA",
        addressing_mode: Implied,
        category: Stack,
        cycles: 4,
        flags_affected: StatusFlags::empty(),
        description: "Push A onto the stack",
    },
    InstructionInfo {
        opcode: Opcode::Pla,
        mnemonic: "PLA",
        addressing_mode: Implied,
        category: Stack,
        cycles: 5,
        flags_affected: zn(),
        description: "Pull A from the stack",
    },
    InstructionInfo {
        opcode: Opcode::Txs,
        mnemonic: "TXS",
        addressing_mode: Implied,
        category: Stack,
        cycles: 3,
        flags_affected: StatusFlags::empty(),
        description: "Transfer X to stack pointer",
    },
    InstructionInfo {
        opcode: Opcode::Tsx,
        mnemonic: "TSX",
        addressing_mode: Implied,
        category: Stack,
        cycles: 3,
        flags_affected: zn(),
        description: "Transfer stack pointer to X",
    },
    InstructionInfo {
        opcode: Opcode::Tax,
        mnemonic: "TAX",
        addressing_mode: Implied,
        category: Transfer,
        cycles: 3,
        flags_affected: zn(),
        description: "Transfer A to X",
    },
    InstructionInfo {
        opcode: Opcode::Txa,
        mnemonic: "TXA",
        addressing_mode: Implied,
        category: Transfer,
        cycles: 3,
        flags_affected: zn(),
        description: "Transfer X to A",
    },
    InstructionInfo {
        opcode: Opcode::Tay,
        mnemonic: "TAY",
        addressing_mode: Implied,
        category: Transfer,
        cycles: 3,
        flags_affected: zn(),
        description: "Transfer A to Y",
    },
    InstructionInfo {
        opcode: Opcode::Tya,
        mnemonic: "TYA",
        addressing_mode: Implied,
        category: Transfer,
        cycles: 3,
        flags_affected: zn(),
        description: "Transfer Y to A",
    },
    InstructionInfo {
        opcode: Opcode::LdaImm,
        mnemonic: "LDA",
        addressing_mode: Immediate,
        category: Load,
        cycles: 4,
        flags_affected: zn(),
        description: "Load A with immediate",
    },
    InstructionInfo {
        opcode: Opcode::LdaZpg,
        mnemonic: "LDA",
        addressing_mode: ZeroPage,
        category: Load,
        cycles: 5,
        flags_affected: zn(),
        description: "Load A from zero page",
    },
    InstructionInfo {
        opcode: Opcode::LdaAbs,
        mnemonic: "LDA",
        addressing_mode: Absolute,
        category: Load,
        cycles: 7,
        flags_affected: zn(),
        description: "Load A from absolute address",
    },
    InstructionInfo {
        opcode: Opcode::LdaZpx,
        mnemonic: "LDA",
        addressing_mode: ZeroPageX,
        category: Load,
        cycles: 6,
        flags_affected: zn(),
        description: "Load A from zero page indexed by X",
    },
    InstructionInfo {
        opcode: Opcode::LdxImm,
        mnemonic: "LDX",
        addressing_mode: Immediate,
        category: Load,
        cycles: 4,
        flags_affected: zn(),
        description: "Load X with immediate",
    },
    InstructionInfo {
        opcode: Opcode::LdyImm,
        mnemonic: "LDY",
        addressing_mode: Immediate,
        category: Load,
        cycles: 4,
        flags_affected: zn(),
        description: "Load Y with immediate",
    },
    InstructionInfo {
        opcode: Opcode::StaZpg,
        mnemonic: "STA",
        addressing_mode: ZeroPage,
        category: Store,
        cycles: 5,
        flags_affected: StatusFlags::empty(),
        description: "Store A to zero page",
    },
    InstructionInfo {
        opcode: Opcode::StaAbs,
        mnemonic: "STA",
        addressing_mode: Absolute,
        category: Store,
        cycles: 7,
        flags_affected: StatusFlags::empty(),
        description: "Store A to absolute address",
    },
    InstructionInfo {
        opcode: Opcode::StxZpg,
        mnemonic: "STX",
        addressing_mode: ZeroPage,
        category: Store,
        cycles: 5,
        flags_affected: StatusFlags::empty(),
        description: "Store X to zero page",
    },
    InstructionInfo {
        opcode: Opcode::StyZpg,
        mnemonic: "STY",
        addressing_mode: ZeroPage,
        category: Store,
        cycles: 5,
        flags_affected: StatusFlags::empty(),
        description: "Store Y to zero page",
    },
];

/// Lookup entry points for the ISA table
pub struct IsaInfo;

impl IsaInfo {
    /// All documented instructions
    pub fn instructions() -> &'static [InstructionInfo] {
        INSTRUCTIONS
    }

    /// Look up by opcode enum
    pub fn instruction(opcode: Opcode) -> Option<&'static InstructionInfo> {
        INSTRUCTIONS.iter().find(|info| info.opcode == opcode)
    }

    /// Look up by raw opcode value
    pub fn instruction_by_value(value: u8) -> Option<&'static InstructionInfo> {
        INSTRUCTIONS.iter().find(|info| info.opcode.value() == value)
    }

    /// All opcodes in table order
    pub fn opcodes() -> impl Iterator<Item = Opcode> {
        INSTRUCTIONS.iter().map(|info| info.opcode)
    }
}
