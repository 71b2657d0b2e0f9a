use crate::numbers::{bit_set, extract_field, extract_signed_field};
use std::fmt::{Debug, Formatter};

/// The 16 LC-3 opcodes, selected by the 4 highest bits of an instruction.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Br = 0b0000,
    Add = 0b0001,
    Ld = 0b0010,
    St = 0b0011,
    Jsr = 0b0100,
    And = 0b0101,
    Ldr = 0b0110,
    Str = 0b0111,
    Rti = 0b1000,
    Not = 0b1001,
    Ldi = 0b1010,
    Sti = 0b1011,
    JmpOrRet = 0b1100,
    Res = 0b1101,
    Lea = 0b1110,
    Trap = 0b1111,
}

impl Operation {
    /// Maps a 4-bit op code, higher bits are ignored.
    #[must_use]
    pub const fn from_op_code(op_code: u8) -> Self {
        match op_code & 0b1111 {
            0b0000 => Self::Br,
            0b0001 => Self::Add,
            0b0010 => Self::Ld,
            0b0011 => Self::St,
            0b0100 => Self::Jsr,
            0b0101 => Self::And,
            0b0110 => Self::Ldr,
            0b0111 => Self::Str,
            0b1000 => Self::Rti,
            0b1001 => Self::Not,
            0b1010 => Self::Ldi,
            0b1011 => Self::Sti,
            0b1100 => Self::JmpOrRet,
            0b1101 => Self::Res,
            0b1110 => Self::Lea,
            _ => Self::Trap,
        }
    }
}

/// Wrapper for LC-3 u16 instruction.
/// format is: `OOOO_DDD_P_PPPP_PPPP`
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Instruction(u16);

impl Instruction {
    /// Gives the value of only the specified bit range.
    ///
    /// # Parameters
    /// - `from`: starting index
    /// - `to`: end index (inclusive), must be greater or equal to `from`
    ///
    /// # Panics
    /// - asserts that to is greater or equal from and both are valid indexes
    #[must_use]
    pub fn get_bit_range(self, from: u8, to: u8) -> u16 {
        debug_assert!(
            to >= from,
            "wrong direction of from: {from:?} and to: {to:?}"
        );
        debug_assert!(
            (00..u16::BITS).contains(&u32::from(to)),
            "index: {to:?} to u16 is greater than maximum value {:?}",
            u16::BITS - 1
        );
        extract_field(self.0, from, to - from + 1)
    }
    /// Register number in bits `from..=from+2`.
    fn register_at(self, from: u8) -> u8 {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "3 bit field always fits"
        )]
        let r = extract_field(self.0, from, 3) as u8;
        r
    }
    #[must_use]
    pub const fn get_bit(self, index: u8) -> bool {
        bit_set(self.0, index)
    }
    #[must_use]
    pub fn op_code(self) -> u8 {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "4 bit field always fits"
        )]
        let op_code = extract_field(self.0, 12, 4) as u8;
        op_code
    }
    #[must_use]
    pub fn operation(self) -> Operation {
        Operation::from_op_code(self.op_code())
    }
    /// Destination register, also the source register of the store operations.
    #[must_use]
    pub fn dr_number(self) -> u8 {
        self.register_at(9)
    }
    #[must_use]
    pub fn sr1_number(self) -> u8 {
        self.register_at(6)
    }
    #[must_use]
    pub fn base_r_number(self) -> u8 {
        self.register_at(6)
    }
    #[must_use]
    pub fn sr2_number(self) -> u8 {
        self.register_at(0)
    }
    #[must_use]
    pub const fn is_immediate(self) -> bool {
        self.get_bit(5)
    }
    /// Sign extended `imm5`.
    #[must_use]
    pub fn get_immediate(self) -> u16 {
        extract_signed_field(self.0, 0, 5)
    }
    /// The `n`, `z` and `p` bits of BR, aligned like [`crate::hardware::registers::ConditionFlag`].
    #[must_use]
    pub fn nzp(self) -> u16 {
        extract_field(self.0, 9, 3)
    }
    /// Sign extended offset of `len` bits to add to program counter PC or a base register.
    /// Can be positive or negative.
    #[must_use]
    pub fn pc_offset(self, len: u8) -> u16 {
        extract_signed_field(self.0, 0, len)
    }
    #[must_use]
    pub fn trap_vector(self) -> u8 {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "8 bit field always fits"
        )]
        let vector = extract_field(self.0, 0, 8) as u8;
        vector
    }
}

impl Debug for Instruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:?} ({:#06X}), DR: {:03b}, PC_Off: {:09b}",
            self.operation(),
            self.0,
            self.dr_number(),
            self.get_bit_range(0, 8)
        )
    }
}

impl From<u16> for Instruction {
    fn from(bits: u16) -> Self {
        Self(bits)
    }
}
