//! Implemented operations for the LC 3.
//!
//! The program counter is incremented before any of these run, so PC relative addressing
//! starts at the instruction following the executed one.
use crate::emulator::instruction::Instruction;
use crate::errors::ExecutionError;
use crate::hardware::memory::Memory;
use crate::hardware::registers::{Registers, from_binary};

/// ADD: Mathematical addition in 2 variants
/// - DR is set with result of SR 1 + SR 2
/// ```text
///  15__12__11_9__8_6___5___4_3__2_0_
/// | 0001 |  DR | SR1 | 0 | 00 | SR2 |
///  ---------------------------------
/// ```
/// - DR is set with result of SR 1 + sign extended immediate
/// ```text
///  15__12__11_9__8_6___5___4___0_
/// | 0001 |  DR | SR1 | 1 |  IMM5 |
///  ------------------------------
/// ```
pub fn add(i: Instruction, r: &mut Registers) {
    let operand = if i.is_immediate() {
        i.get_immediate()
    } else {
        r.get(i.sr2_number()).as_binary()
    };
    r.set(
        i.dr_number(),
        from_binary(r.get(i.sr1_number()).as_binary().wrapping_add(operand)),
    );
}
/// AND: bit-wise AND in 2 variants
/// - DR is set with result of SR 1 AND SR 2
/// ```text
///  15__12__11_9__8_6___5___4_3__2_0_
/// | 0101 |  DR | SR1 | 0 | 00 | SR2 |
///  ---------------------------------
/// ```
/// - DR is set with result of SR 1 AND sign extended immediate
/// ```text
///  15__12__11_9__8_6___5___4___0_
/// | 0101 |  DR | SR1 | 1 |  IMM5 |
///  ------------------------------
/// ```
pub fn and(i: Instruction, r: &mut Registers) {
    let operand = if i.is_immediate() {
        i.get_immediate()
    } else {
        r.get(i.sr2_number()).as_binary()
    };
    r.set(
        i.dr_number(),
        from_binary(r.get(i.sr1_number()).as_binary() & operand),
    );
}

/// NOT: bit-wise complement of the value in SR 1
/// ```text
///  15__12__11_9__8_6___5___0_
/// | 1001 |  DR | SR1 | 11111 |
///  --------------------------
/// ```
pub fn not(i: Instruction, r: &mut Registers) {
    r.set(
        i.dr_number(),
        from_binary(!r.get(i.sr1_number()).as_binary()),
    );
}
/// BR: Conditional Branch
/// This opcode adds the value of the sign extended offset to PC if the current state of the
/// `ConditionFlag` matches a set bit of `n`, `z` or `p`. With none of them set it never branches.
/// ```text
///  15__12__11_9___8_______0_
/// | 0000 |  nzp | PCoffset9 |
///  -------------------------
/// ```
/// See [`crate::hardware::registers::ConditionFlag`]
pub fn br(i: Instruction, r: &mut Registers) {
    let cond = r.get_conditional_register() as u16;
    if i.nzp() & cond != 0 {
        r.set_pc(address_by_pc_offset(i, r, 9));
    }
}
/// JSR: Jump to Sub-Routine.
/// Two variants:
/// - JSR to `PCOffset11`
/// ```text
///  15__12__11_10_________0
/// | 0100 | 1 | PCOffset11 |
///  -----------------------
/// ```
/// - JSRR: JSR to location in `BaseR`
/// ```text
///  15__12__11_9__8___6___5____0_
/// | 0100 | 000 | BaseR | 000000 |
///  -----------------------------
/// ```
/// The former PC is saved in R7.
pub fn jsr(i: Instruction, r: &mut Registers) {
    let temp_pc = r.pc();
    // BaseR is read before R7 is overwritten, JSRR R7 must jump to the old R7
    let target = if i.get_bit(11) {
        address_by_pc_offset(i, r, 11)
    } else {
        r.get(i.base_r_number()).as_binary()
    };
    r.set(Registers::RETURN_ADDRESS, temp_pc);
    r.set_pc(target);
}
/// JMP or RET operation.
/// - JMP sets the PC to the value of register `BaseR`
/// ```text
///  15__12__11_9___8_6____5____0_
/// | 1100 | 000 | BaseR | 000000 |
///  -----------------------------
/// ```
/// - RET same as JMP, but special case for returning from JSR where former PC is saved in R7.
/// ```text
///  15__12__11_9__8_6___5____0_
/// | 1100 | 000 | 111 | 000000 |
///  ---------------------------
/// ```
pub fn jmp_or_ret(i: Instruction, r: &mut Registers) {
    r.set_pc(r.get(i.base_r_number()).as_binary());
}

/// LD: Loads content of memory address of PC + sign extended offset into DR.
/// ```text
///  15__12__11_9___8_______0_
/// | 0010 |  DR  | PCoffset9 |
///  -------------------------
/// ```
pub fn ld(i: Instruction, r: &mut Registers, memory: &mut Memory) -> Result<(), ExecutionError> {
    let value = memory.read(address_by_pc_offset(i, r, 9))?;
    r.set(i.dr_number(), from_binary(value));
    Ok(())
}

/// LDI: Load indirect.
/// Calculates memory address of PC + sign extended offset and reads another address from there,
/// the content of the memory at that indirectly loaded address is put into DR.
/// ```text
///  15__12__11_9___8_______0_
/// | 1010 |  DR  | PCoffset9 |
///  -------------------------
/// ```
pub fn ldi(i: Instruction, r: &mut Registers, memory: &mut Memory) -> Result<(), ExecutionError> {
    let address_address = address_by_pc_offset(i, r, 9);
    let value_address = memory.read(address_address)?;
    r.set(i.dr_number(), from_binary(memory.read(value_address)?));
    Ok(())
}
/// LDR: Load address from base register and adds sign extended offset to load the memory content
/// from there into DR.
/// ```text
///  15__12__11_9__8___6____5____0_
/// | 0110 |  DR | BaseR | offset6 |
///  ------------------------------
/// ```
pub fn ldr(i: Instruction, r: &mut Registers, memory: &mut Memory) -> Result<(), ExecutionError> {
    let value_address = address_by_baser_offset(i, r);
    r.set(i.dr_number(), from_binary(memory.read(value_address)?));
    Ok(())
}

fn address_by_pc_offset(i: Instruction, r: &Registers, len: u8) -> u16 {
    r.pc().as_binary().wrapping_add(i.pc_offset(len))
}
fn address_by_baser_offset(i: Instruction, r: &Registers) -> u16 {
    r.get(i.base_r_number())
        .as_binary()
        .wrapping_add(i.pc_offset(6))
}

/// LEA: Load Effective Address loads PC + sign extended offset into DR.
/// ```text
///  15__12__11_9___8_______0_
/// | 1110 |  DR  | PCoffset9 |
///  -------------------------
/// ```
pub fn lea(i: Instruction, r: &mut Registers) {
    r.set(i.dr_number(), from_binary(address_by_pc_offset(i, r, 9)));
}
/// ST: Store. The contents of the SR are written to memory address PC + sign extended offset.
/// ```text
///  15__12__11_9___8_______0_
/// | 0011 |  SR  | PCoffset9 |
///  -------------------------
/// ```
pub fn st(i: Instruction, r: &Registers, memory: &mut Memory) -> Result<(), ExecutionError> {
    let store_address = address_by_pc_offset(i, r, 9);
    memory.write(store_address, r.get(i.dr_number()).as_binary())
}
/// STI: Store Indirect. The contents of the SR are written to the address which is loaded from
/// memory address PC + sign extended offset.
/// ```text
///  15__12__11_9___8_______0_
/// | 1011 |  SR  | PCoffset9 |
///  -------------------------
/// ```
pub fn sti(i: Instruction, r: &Registers, memory: &mut Memory) -> Result<(), ExecutionError> {
    let address_of_store_address = address_by_pc_offset(i, r, 9);
    let store_address = memory.read(address_of_store_address)?;
    memory.write(store_address, r.get(i.dr_number()).as_binary())
}
/// STR: Store contents of SR to memory address of base register plus sign extended offset.
/// ```text
///  15__12__11_9__8___6____5____0_
/// | 0111 |  SR | BaseR | offset6 |
///  ------------------------------
/// ```
pub fn str(i: Instruction, r: &Registers, memory: &mut Memory) -> Result<(), ExecutionError> {
    let store_address = address_by_baser_offset(i, r);
    memory.write(store_address, r.get(i.dr_number()).as_binary())
}
/// RTI (`1000`) and the reserved opcode (`1101`).
/// Return from interrupt needs a supervisor stack, which does not exist without interrupts,
/// so both stop execution.
///
/// # Errors
/// - always [`ExecutionError::UnimplementedOpcode`] with the address of the instruction
pub fn unimplemented(i: Instruction, r: &Registers) -> Result<(), ExecutionError> {
    Err(ExecutionError::UnimplementedOpcode {
        operation: i.operation(),
        pc: r.pc().as_binary().wrapping_sub(1),
    })
}

#[expect(clippy::unusual_byte_groupings)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::emulator::instruction::Operation;
    use crate::hardware::memory::PROGRAM_SECTION_START;
    use crate::hardware::registers::{ConditionFlag, from_decimal};
    use googletest::prelude::*;

    fn create_memory(data: &[u16]) -> Memory {
        let mut mem = Memory::new(None);
        mem.load_program(PROGRAM_SECTION_START, data)
            .expect("Error loading program");
        mem
    }

    #[gtest]
    pub fn test_opcode_add() {
        let mut regs = Registers::new();
        regs.set(0, from_binary(22));
        regs.set(1, from_binary(128));
        // Add: DR: 2, SR1: 0: 22, Immediate: false, SR2: 1: 128 => R2: 150
        add(0b0001_010_000_0_00_001.into(), &mut regs);
        // Add: DR: 3, SR1: 2: 150, Immediate: true, imm5: 14 => R3: 164
        add(0b0001_011_010_1_01110.into(), &mut regs);
        expect_that!(regs.get(0), eq(from_binary(22)));
        expect_that!(regs.get(1), eq(from_binary(128)));
        expect_that!(regs.get(2), eq(from_binary(150)));
        expect_that!(regs.get(3), eq(from_binary(164)));
        expect_that!(regs.get_conditional_register(), eq(ConditionFlag::Pos));
    }
    #[gtest]
    pub fn test_opcode_add_immediate_negative() {
        let mut regs = Registers::new();
        regs.set(0, from_binary(5));
        // Add: DR: 1, SR1: 0: 5, Immediate: true, imm5: -3 => R1: 2
        add(0b0001_001_000_1_11101.into(), &mut regs);
        expect_that!(regs.get(1), eq(from_binary(2)));
        expect_that!(regs.get_conditional_register(), eq(ConditionFlag::Pos));
    }
    #[gtest]
    pub fn test_opcode_add_negative() {
        let mut regs = Registers::new();
        regs.set(0, from_binary(22));
        regs.set(1, from_decimal(-128));
        // Add: DR: 2, SR1: 0: 22, Immediate: false, SR2: 1: -128 => R2: -106
        add(0b0001_010_000_0_00_001.into(), &mut regs);
        // Add: DR: 3, SR1: 2: -106, Immediate: true, imm5: -2 => R3: -108
        add(0b0001_011_010_1_11110.into(), &mut regs);
        expect_that!(regs.get(1), eq(from_binary(0b1111_1111_1000_0000)));
        expect_that!(regs.get(2).as_decimal(), eq(-106));
        expect_that!(regs.get(3).as_decimal(), eq(-108));
        expect_that!(regs.get_conditional_register(), eq(ConditionFlag::Neg));
    }
    #[gtest]
    pub fn test_opcode_add_overflow() {
        let mut regs = Registers::new();
        regs.set(0, from_binary(0x7FFF)); // largest positive number in 2's complement
        regs.set(1, from_binary(1));
        // Add: DR: 2, SR1: 0, Immediate: false, SR2: 1 => R2: 32768
        add(0b0001_010_000_0_00_001.into(), &mut regs);
        expect_that!(regs.get(2), eq(from_binary(32768)));
        expect_that!(regs.get_conditional_register(), eq(ConditionFlag::Neg));
    }
    #[gtest]
    pub fn test_opcode_add_result_0() {
        let mut regs = Registers::new();
        regs.set(0, from_binary(0x7FFF));
        regs.set(1, from_binary(!0x7FFF + 1));
        regs.set(2, from_binary(1)); // to be sure opcode was executed
        // Add: DR: 2, SR1: 0, Immediate: false, SR2: 1 => R2: 0
        add(0b0001_010_000_0_00_001.into(), &mut regs);
        expect_that!(regs.get(2), eq(from_binary(0)));
        expect_that!(regs.get_conditional_register(), eq(ConditionFlag::Zero));
    }
    #[gtest]
    pub fn test_opcode_and() {
        let mut regs = Registers::new();
        regs.set(0, from_binary(0b1101_1001_0111_0101));
        regs.set(1, from_binary(0b0100_1010_0010_1001));
        // And: DR: 2, SR1: 0, Immediate: false, SR2: 1
        and(0b0101_010_000_0_00_001.into(), &mut regs);
        expect_that!(regs.get(2), eq(from_binary(0b0100_1000_0010_0001)));
        expect_that!(regs.get_conditional_register(), eq(ConditionFlag::Pos));
    }
    #[gtest]
    pub fn test_opcode_and_immediate() {
        let mut regs = Registers::new();
        regs.set(0, from_binary(0b1101_1001_0111_0101));
        // Immediate sign extended:           0b1111_1111_1111_0101
        and(0b0101_010_000_1_10101.into(), &mut regs);
        expect_that!(regs.get(2), eq(from_binary(0b1101_1001_0111_0101)));
        expect_that!(regs.get_conditional_register(), eq(ConditionFlag::Neg));
        // clearing a register: AND R2, R2, #0
        and(0b0101_010_010_1_00000.into(), &mut regs);
        expect_that!(regs.get(2), eq(from_binary(0)));
        expect_that!(regs.get_conditional_register(), eq(ConditionFlag::Zero));
    }
    #[gtest]
    pub fn test_opcode_not() {
        let mut regs = Registers::new();
        regs.set(0, from_binary(0x7FFF));
        // Not: DR: 1, SR1: 0 => R1: 0x8000
        super::not(0b1001_001_000_111111.into(), &mut regs);
        expect_that!(regs.get(0), eq(from_binary(0x7FFF)));
        expect_that!(regs.get(1), eq(from_binary(0x8000)));
        expect_that!(regs.get_conditional_register(), eq(ConditionFlag::Neg));
    }
    #[gtest]
    pub fn test_opcode_br_taken_per_flag() {
        for (value, nzp) in [(0xFFFFu16, 0b100u16), (0, 0b010), (1, 0b001)] {
            let mut regs = Registers::new();
            regs.set(0, from_binary(value));
            regs.set_pc(0x3010);
            // BR with only the matching flag, PC_OFFSET9: -0x10
            br((nzp << 9 | 0b1_1111_0000).into(), &mut regs);
            expect_that!(regs.pc().as_binary(), eq(0x3000), "nzp {nzp:03b}");
        }
    }
    #[gtest]
    pub fn test_opcode_br_not_taken() {
        let mut regs = Registers::new();
        regs.set(0, from_binary(1));
        regs.set_pc(0x3010);
        // BRnz with positive flag
        br(0b0000_110_000000101.into(), &mut regs);
        expect_that!(regs.pc().as_binary(), eq(0x3010));
    }
    #[gtest]
    pub fn test_opcode_br_without_flags_never_branches() {
        for value in [0u16, 1, 0x8000] {
            for offset in [0u16, 1, 0xFF, 0x100, 0x1FF] {
                let mut regs = Registers::new();
                regs.set(0, from_binary(value));
                regs.set_pc(0x3001);
                br(offset.into(), &mut regs);
                expect_that!(regs.pc().as_binary(), eq(0x3001));
            }
        }
    }
    #[gtest]
    pub fn test_opcode_lea() {
        let mut regs = Registers::new();
        regs.set_pc(0x3045);
        // Lea: DR: 3, PC_OFFSET9: 0x55
        lea(0b1110_011_0_0101_0101.into(), &mut regs);
        expect_that!(regs.get(3), eq(from_binary(0x3045 + 0b0_0101_0101)));
        expect_that!(regs.get_conditional_register(), eq(ConditionFlag::Pos));
    }
    #[gtest]
    pub fn test_opcode_ld() {
        let mut regs = Registers::new();
        regs.set_pc(0x3045);
        let raw = vec![4711u16, 815];
        let mut memory = create_memory(&raw);
        // LD - DR: 4, PC_OFFSET9: -0x44
        ld(0b0010_100_1_1011_1100.into(), &mut regs, &mut memory).unwrap();
        expect_that!(regs.get(4), eq(from_decimal(815)));
        expect_that!(regs.get_conditional_register(), eq(ConditionFlag::Pos));

        // LD - DR: 4, PC_OFFSET9: -0x45
        ld(0b0010_100_1_1011_1011.into(), &mut regs, &mut memory).unwrap();
        expect_that!(regs.get(4), eq(from_decimal(4711)));
    }
    #[gtest]
    pub fn test_opcode_ldr() {
        let mut regs = Registers::new();
        let mut raw = vec![0; 6];
        let mem_val = 0b1111_1111_1111_0110; // -10
        raw[5] = mem_val;
        let mut memory = create_memory(&raw);
        regs.set(6, from_binary(0x3025));
        // LDR - DR: 2, - BaseR: 6, OFFSET6: -32 = -0x20
        ldr(0b0110_010_110_100000.into(), &mut regs, &mut memory).unwrap();
        expect_that!(regs.get(2), eq(from_binary(mem_val)));
        expect_that!(regs.get_conditional_register(), eq(ConditionFlag::Neg));
    }
    #[gtest]
    pub fn test_opcode_ldi() {
        let mut regs = Registers::new();
        let mut raw = vec![0; 10];
        let val_to_load_in_register = 0b1111_1111_1111_0110; // -10
        raw[3] = val_to_load_in_register;
        raw[5] = 0x3003; // absolute address of value above
        let mut memory = create_memory(&raw);
        regs.set_pc(0x3065);
        // LDI - DR: 1, - PC_OFFSET9: -96 = -0x60
        ldi(0b1010_001_110100000.into(), &mut regs, &mut memory).unwrap();
        expect_that!(regs.get(1), eq(from_binary(val_to_load_in_register)));
        expect_that!(regs.get_conditional_register(), eq(ConditionFlag::Neg));
    }
    #[gtest]
    pub fn test_opcode_ld_wraps_around_address_space() {
        let mut regs = Registers::new();
        let mut memory = Memory::new(None);
        memory.write(0xFFFF, 99).unwrap();
        regs.set_pc(0x0001);
        // LD - DR: 0, PC_OFFSET9: -2
        ld(0b0010_000_1_1111_1110.into(), &mut regs, &mut memory).unwrap();
        expect_that!(regs.get(0), eq(from_binary(99)));
    }
    #[gtest]
    pub fn test_opcode_ldi_device_without_console() {
        let mut regs = Registers::new();
        let mut memory = create_memory(&[0xFE00]);
        regs.set_pc(0x3001);
        // LDI - DR: 0, PC_OFFSET9: -1 => KBSR
        let res = ldi(0b1010_000_1_1111_1111.into(), &mut regs, &mut memory);
        expect_that!(
            res,
            err(eq(&ExecutionError::UnimplementedDevice { address: 0xFE00 }))
        );
    }
    #[gtest]
    pub fn test_opcode_st() {
        let mut regs = Registers::new();
        let raw = vec![0; 0xC4];
        let mut memory = create_memory(&raw);
        regs.set(5, from_decimal(4760));
        regs.set_pc(0x3065);
        // ST - SR: 5, - PC_OFFSET9: -95 = -0x5F
        st(0b0011_101_110100001.into(), &regs, &mut memory).unwrap();
        expect_that!(memory.read(0x3006).unwrap(), eq(4760));
    }
    #[gtest]
    pub fn test_opcode_sti() {
        let mut regs = Registers::new();
        let raw = vec![0; 0xC4];
        let mut memory = create_memory(&raw);
        memory.write(0x300A, 0x3006).unwrap();
        regs.set(7, from_decimal(1234));
        regs.set_pc(0x3067);
        // STI - SR: 7, - PC_OFFSET9: -0x5D
        sti(0b1011_111_110100011.into(), &regs, &mut memory).unwrap();
        expect_that!(memory.read(0x3006).unwrap(), eq(1234));
    }
    #[gtest]
    pub fn test_opcode_str() {
        let mut regs = Registers::new();
        let raw = vec![0; 0xC4];
        let mut memory = create_memory(&raw);
        regs.set(2, from_decimal(2345));
        regs.set(6, from_binary(0x3005));
        // STR - SR: 2, - BaseR: 6, offset6: 0x1
        str(0b0111_010_110_000001.into(), &regs, &mut memory).unwrap();
        expect_that!(memory.read(0x3006).unwrap(), eq(2345));
    }
    #[gtest]
    pub fn test_opcode_lea_str_ldr_round_trip() {
        let mut regs = Registers::new();
        let mut memory = create_memory(&[0; 4]);
        regs.set_pc(0x3001);
        // LEA - DR: 1, PC_OFFSET9: 0
        lea(0b1110_001_000000000.into(), &mut regs);
        expect_that!(regs.get(1), eq(from_binary(0x3001)));
        regs.set(2, from_decimal(-1234));
        // STR - SR: 2, BaseR: 1, offset6: 2
        str(0b0111_010_001_000010.into(), &regs, &mut memory).unwrap();
        // LDR - DR: 3, BaseR: 1, offset6: 2
        ldr(0b0110_011_001_000010.into(), &mut regs, &mut memory).unwrap();
        expect_that!(regs.get(3), eq(from_decimal(-1234)));
        expect_that!(memory.read(0x3003).unwrap(), eq(from_decimal(-1234).as_binary()));
    }
    #[gtest]
    pub fn test_opcode_jsr() {
        let mut regs = Registers::new();
        regs.set_pc(0x3099);
        // JSR - PC_OFFSET11: 0x1A1
        jsr(0b0100_1_00110100001.into(), &mut regs);
        expect_that!(regs.pc(), eq(from_binary(0x323A)));
        expect_that!(regs.get(7), eq(from_binary(0x3099)));

        let mut regs = Registers::new();
        regs.set_pc(0x3100);
        regs.set(6, from_binary(0x3456));
        // JSRR - BaseR: 6
        jsr(0b0100_000_110_000000.into(), &mut regs);
        expect_that!(regs.pc(), eq(from_binary(0x3456)));
        expect_that!(regs.get(7), eq(from_binary(0x3100)));
    }
    #[gtest]
    pub fn test_opcode_jsrr_through_r7() {
        let mut regs = Registers::new();
        regs.set_pc(0x3100);
        regs.set(7, from_binary(0x4000));
        // JSRR - BaseR: 7
        jsr(0b0100_000_111_000000.into(), &mut regs);
        expect_that!(regs.pc(), eq(from_binary(0x4000)));
        expect_that!(regs.get(7), eq(from_binary(0x3100)));
    }
    #[gtest]
    pub fn test_opcode_ret() {
        let mut regs = Registers::new();
        regs.set_pc(0x3020);
        regs.set(1, from_binary(0x3022));
        // JMP - BaseR: 1
        jmp_or_ret(0b1100_000_001_000000.into(), &mut regs);
        expect_that!(regs.pc(), eq(from_binary(0x3022)));
    }
    #[gtest]
    pub fn test_opcode_rti_and_res_unimplemented() {
        let mut regs = Registers::new();
        regs.set_pc(0x3005);
        expect_that!(
            unimplemented(0b1000_000000000000.into(), &regs),
            err(eq(&ExecutionError::UnimplementedOpcode {
                operation: Operation::Rti,
                pc: 0x3004
            }))
        );
        expect_that!(
            unimplemented(0b1101_000000000000.into(), &regs),
            err(eq(&ExecutionError::UnimplementedOpcode {
                operation: Operation::Res,
                pc: 0x3004
            }))
        );
    }
}
