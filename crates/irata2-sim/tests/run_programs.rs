//! End-to-end program runs on the default CPU and microcode

mod common;

use common::{boot, ENTRY};
use irata2_core::{Byte, Word};
use irata2_isa::Opcode;
use irata2_sim::RunReason;

// Opcode bytes for hand-assembled programs.
const fn op(opcode: Opcode) -> u8 {
    opcode as u8
}

const HLT: u8 = op(Opcode::Hlt);

#[test]
fn hlt_halts_within_five_cycles() {
    let mut cpu = boot(&[op(Opcode::Hlt)]);
    let result = cpu.run_until_halt(10);
    assert_eq!(result.reason, RunReason::Halt);
    assert!(result.cycles <= 5, "took {} cycles", result.cycles);
}

#[test]
fn crs_crashes_within_five_cycles() {
    let mut cpu = boot(&[op(Opcode::Crs)]);
    let result = cpu.run_until_halt(10);
    assert_eq!(result.reason, RunReason::Crash);
    assert!(result.cycles <= 5);
    assert!(cpu.crashed());
}

#[test]
fn jmp_self_times_out_at_exactly_the_cap() {
    // JMP $8000 spins forever.
    let mut cpu = boot(&[op(Opcode::JmpAbs), 0x00, 0x80]);
    let result = cpu.run_until_halt(100);
    assert_eq!(result.reason, RunReason::Timeout);
    assert_eq!(result.cycles, 100);
}

#[test]
fn lda_immediate_loads_value() {
    let mut cpu = boot(&[op(Opcode::LdaImm), 0x42, op(Opcode::Hlt)]);
    let result = cpu.run_until_halt(50);
    assert_eq!(result.reason, RunReason::Halt);

    let state = result.state.unwrap();
    assert_eq!(state.a, Byte(0x42));
    assert!(!cpu.status().zero().get());
    assert!(!cpu.status().negative().get());
}

#[test]
fn lda_immediate_sets_negative_flag() {
    let mut cpu = boot(&[op(Opcode::LdaImm), 0x80, op(Opcode::Hlt)]);
    cpu.run_until_halt(50);
    assert_eq!(cpu.a().value(), Byte(0x80));
    assert!(!cpu.status().zero().get());
    assert!(cpu.status().negative().get());
}

#[test]
fn lda_immediate_sets_zero_flag() {
    let mut cpu = boot(&[op(Opcode::LdaImm), 0x00, op(Opcode::Hlt)]);
    cpu.run_until_halt(50);
    assert!(cpu.status().zero().get());
    assert!(!cpu.status().negative().get());
}

#[test]
fn adc_with_carry_out() {
    let mut cpu = boot(&[
        op(Opcode::LdaImm),
        0xFF,
        op(Opcode::AdcImm),
        0x01,
        op(Opcode::Hlt),
    ]);
    let result = cpu.run_until_halt(50);
    assert_eq!(result.reason, RunReason::Halt);

    assert_eq!(cpu.a().value(), Byte(0x00));
    assert!(cpu.status().zero().get());
    assert!(!cpu.status().negative().get());
    assert!(cpu.status().carry().get());
    assert!(!cpu.status().overflow().get());
}

#[test]
fn adc_with_signed_overflow() {
    let mut cpu = boot(&[
        op(Opcode::LdaImm),
        0x7F,
        op(Opcode::AdcImm),
        0x01,
        op(Opcode::Hlt),
    ]);
    cpu.run_until_halt(50);

    assert_eq!(cpu.a().value(), Byte(0x80));
    assert!(!cpu.status().zero().get());
    assert!(cpu.status().negative().get());
    assert!(!cpu.status().carry().get());
    assert!(cpu.status().overflow().get());
}

#[test]
fn branch_taken_backward_loop() {
    // LDX #$03; loop: DEX; BNE loop; LDA #$55; HLT
    let mut cpu = boot(&[
        op(Opcode::LdxImm),
        0x03,
        op(Opcode::Dex),
        op(Opcode::BneRel),
        0xFD, // back to the DEX
        op(Opcode::LdaImm),
        0x55,
        op(Opcode::Hlt),
    ]);
    let result = cpu.run_until_halt(400);
    assert_eq!(result.reason, RunReason::Halt);

    assert_eq!(cpu.a().value(), Byte(0x55));
    assert_eq!(cpu.x().value(), Byte(0x00));
    assert!(result.cycles >= 20, "took {} cycles", result.cycles);
    assert!(result.cycles <= 400);
}

#[test]
fn branch_not_taken_skips_operand() {
    // LDA #$01 clears Z, so BEQ falls through to the LDA #$77.
    let mut cpu = boot(&[
        op(Opcode::LdaImm),
        0x01,
        op(Opcode::BeqRel),
        0x10,
        op(Opcode::LdaImm),
        0x77,
        op(Opcode::Hlt),
    ]);
    let result = cpu.run_until_halt(100);
    assert_eq!(result.reason, RunReason::Halt);
    assert_eq!(cpu.a().value(), Byte(0x77));
}

#[test]
fn zero_page_store_and_load_roundtrip() {
    let mut cpu = boot(&[
        op(Opcode::LdaImm),
        0x42,
        op(Opcode::StaZpg),
        0x10,
        op(Opcode::LdaImm),
        0x00,
        op(Opcode::LdaZpg),
        0x10,
        op(Opcode::Hlt),
    ]);
    let result = cpu.run_until_halt(100);
    assert_eq!(result.reason, RunReason::Halt);

    assert_eq!(cpu.a().value(), Byte(0x42));
    assert_eq!(cpu.memory().read_at(Word(0x0010)), Byte(0x42));
}

#[test]
fn absolute_store_and_load_roundtrip() {
    let mut cpu = boot(&[
        op(Opcode::LdaImm),
        0x99,
        op(Opcode::StaAbs),
        0x00,
        0x02,
        op(Opcode::LdaImm),
        0x00,
        op(Opcode::LdaAbs),
        0x00,
        0x02,
        op(Opcode::Hlt),
    ]);
    let result = cpu.run_until_halt(100);
    assert_eq!(result.reason, RunReason::Halt);
    assert_eq!(cpu.a().value(), Byte(0x99));
    assert_eq!(cpu.memory().read_at(Word(0x0200)), Byte(0x99));
}

#[test]
fn zero_page_indexed_load() {
    // Store at $15, then read back via $10,X with X=5.
    let mut cpu = boot(&[
        op(Opcode::LdaImm),
        0x42,
        op(Opcode::StaZpg),
        0x15,
        op(Opcode::LdxImm),
        0x05,
        op(Opcode::LdaImm),
        0x00,
        op(Opcode::LdaZpx),
        0x10,
        op(Opcode::Hlt),
    ]);
    let result = cpu.run_until_halt(100);
    assert_eq!(result.reason, RunReason::Halt);
    assert_eq!(cpu.a().value(), Byte(0x42));
}

#[test]
fn cmp_sets_flags_for_equality() {
    let mut cpu = boot(&[
        op(Opcode::LdaImm),
        0x42,
        op(Opcode::CmpImm),
        0x42,
        op(Opcode::Hlt),
    ]);
    cpu.run_until_halt(100);

    // Equality: zero set, carry set (no borrow), accumulator untouched.
    assert!(cpu.status().zero().get());
    assert!(cpu.status().carry().get());
    assert_eq!(cpu.a().value(), Byte(0x42));
}

#[test]
fn cmp_less_than_clears_carry() {
    let mut cpu = boot(&[
        op(Opcode::LdaImm),
        0x10,
        op(Opcode::CmpImm),
        0x20,
        op(Opcode::Hlt),
    ]);
    cpu.run_until_halt(100);
    assert!(!cpu.status().zero().get());
    assert!(!cpu.status().carry().get());
    assert!(cpu.status().negative().get());
}

#[test]
fn transfers_and_increments() {
    // LDA #$41; TAX; INX; TXA; HLT
    let mut cpu = boot(&[
        op(Opcode::LdaImm),
        0x41,
        op(Opcode::Tax),
        op(Opcode::Inx),
        op(Opcode::Txa),
        op(Opcode::Hlt),
    ]);
    cpu.run_until_halt(100);
    assert_eq!(cpu.a().value(), Byte(0x42));
    assert_eq!(cpu.x().value(), Byte(0x42));
}

#[test]
fn stack_push_pull_roundtrip() {
    // PHA a value, overwrite A, PLA it back.
    let mut cpu = boot(&[
        op(Opcode::LdaImm),
        0x42,
        op(Opcode::Pha),
        op(Opcode::LdaImm),
        0x00,
        op(Opcode::Pla),
        op(Opcode::Hlt),
    ]);
    let result = cpu.run_until_halt(100);
    assert_eq!(result.reason, RunReason::Halt);

    assert_eq!(cpu.a().value(), Byte(0x42));
    // SP returns to the reset top of stack.
    assert_eq!(cpu.sp().value(), Byte(0xFF));
    // The pushed byte lives in the stack page.
    assert_eq!(cpu.memory().read_at(Word(0x01FF)), Byte(0x42));
}

#[test]
fn jsr_rts_roundtrip() {
    // JSR $8010; HLT ... subroutine: LDA #$42; RTS
    let mut cpu = boot(
        common::RomImage::new()
            .place(0x8000, &[op(Opcode::JsrAbs), 0x10, 0x80, op(Opcode::Hlt)])
            .place(0x8010, &[op(Opcode::LdaImm), 0x42, op(Opcode::Rts)])
            .bytes(),
    );
    let result = cpu.run_until_halt(200);
    assert_eq!(result.reason, RunReason::Halt);
    assert_eq!(cpu.a().value(), Byte(0x42));
    assert_eq!(cpu.sp().value(), Byte(0xFF));
}

#[test]
fn subroutine_uses_y_and_flags() {
    // SEC; LDY #$02; DEY; DEY; BEQ +1 (over CRS); HLT
    let mut cpu = boot(&[
        op(Opcode::Sec),
        op(Opcode::LdyImm),
        0x02,
        op(Opcode::Dey),
        op(Opcode::Dey),
        op(Opcode::BeqRel),
        0x01,
        op(Opcode::Crs),
        op(Opcode::Hlt),
    ]);
    let result = cpu.run_until_halt(200);
    assert_eq!(result.reason, RunReason::Halt);
    assert_eq!(cpu.y().value(), Byte(0x00));
}

#[test]
fn inc_and_dec_zero_page() {
    let mut cpu = boot(&[
        op(Opcode::LdaImm),
        0x10,
        op(Opcode::StaZpg),
        0x20,
        op(Opcode::IncZpg),
        0x20,
        op(Opcode::IncZpg),
        0x20,
        op(Opcode::DecZpg),
        0x20,
        op(Opcode::Hlt),
    ]);
    cpu.run_until_halt(200);
    assert_eq!(cpu.memory().read_at(Word(0x0020)), Byte(0x11));
}

#[test]
fn trace_records_instruction_boundaries() {
    let mut cpu = boot(&[op(Opcode::LdaImm), 0x42, op(Opcode::Hlt)]);
    cpu.enable_trace(16);
    cpu.run_until_halt(50);

    let entries: Vec<_> = cpu.trace().entries().collect();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].instruction_address, ENTRY);
    assert_eq!(entries[0].ir, Byte(Opcode::LdaImm as u8));
    assert_eq!(entries[1].instruction_address, Word(0x8002));
    assert_eq!(entries[1].ir, Byte(HLT));
}

#[test]
fn trace_drops_oldest_entries() {
    // Four instructions, buffer depth two.
    let mut cpu = boot(&[
        op(Opcode::Nop),
        op(Opcode::Nop),
        op(Opcode::Nop),
        op(Opcode::Hlt),
    ]);
    cpu.enable_trace(2);
    cpu.run_until_halt(50);

    let entries: Vec<_> = cpu.trace().entries().collect();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].instruction_address, Word(0x8002));
    assert_eq!(entries[1].instruction_address, Word(0x8003));
}
