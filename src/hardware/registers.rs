use crate::hardware::memory::PROGRAM_SECTION_START;
use std::fmt::{Display, Formatter};

/// Content of one 16-bit register.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct Register(u16);

impl Register {
    #[must_use]
    pub const fn from_binary(value: u16) -> Self {
        Self(value)
    }
    #[must_use]
    pub const fn from_decimal(value: i16) -> Self {
        Self(value.cast_unsigned())
    }
    #[must_use]
    pub const fn as_binary(self) -> u16 {
        self.0
    }
    #[must_use]
    pub const fn as_decimal(self) -> i16 {
        self.0.cast_signed()
    }
}

#[must_use]
pub const fn from_binary(value: u16) -> Register {
    Register::from_binary(value)
}
#[must_use]
pub const fn from_decimal(value: i16) -> Register {
    Register::from_decimal(value)
}

/// Condition flag set by every write to a general purpose register.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionFlag {
    Pos = 1 << 0, // Positive
    Zero = 1 << 1,
    Neg = 1 << 2, // Negative
}

impl From<u16> for ConditionFlag {
    fn from(value: u16) -> Self {
        if value == 0 {
            Self::Zero
        } else if value >> 15 == 1 {
            // leftmost bit is 1 for negative numbers
            Self::Neg
        } else {
            Self::Pos
        }
    }
}

/// Register file: R0 to R7, the program counter and the condition register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registers {
    general_purpose: [Register; 8],
    pc: Register,
    cond: ConditionFlag,
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

impl Registers {
    pub const GENERAL_PURPOSE_COUNT: u8 = 8;
    /// Subroutine and trap return address register.
    pub const RETURN_ADDRESS: u8 = 7;

    #[must_use]
    pub const fn new() -> Self {
        Self {
            general_purpose: [Register(0); 8],
            pc: Register(PROGRAM_SECTION_START),
            cond: ConditionFlag::Zero,
        }
    }
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// # Panics
    /// - index is not a general purpose register
    #[must_use]
    pub fn get(&self, r: u8) -> Register {
        assert!(
            r < Self::GENERAL_PURPOSE_COUNT,
            "Invalid general purpose register get: {r}"
        );
        self.general_purpose[usize::from(r)]
    }
    /// Writes the register and recomputes the condition flag from the value.
    ///
    /// # Panics
    /// - index is not a general purpose register
    pub fn set(&mut self, r: u8, value: Register) {
        assert!(
            r < Self::GENERAL_PURPOSE_COUNT,
            "Invalid general purpose register set: {r}"
        );
        self.general_purpose[usize::from(r)] = value;
        self.cond = ConditionFlag::from(value.as_binary());
    }

    #[must_use]
    pub const fn pc(&self) -> Register {
        self.pc
    }
    pub const fn set_pc(&mut self, value: u16) {
        self.pc = Register(value);
    }
    pub const fn increment_pc(&mut self) {
        self.pc = Register(self.pc.0.wrapping_add(1));
    }

    #[must_use]
    pub const fn get_conditional_register(&self) -> ConditionFlag {
        self.cond
    }
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.cond == ConditionFlag::Neg
    }
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.cond == ConditionFlag::Zero
    }
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.cond == ConditionFlag::Pos
    }
}

impl Display for Registers {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (idx, r) in self.general_purpose.iter().enumerate() {
            writeln!(f, "R{idx}:   {:016b} - {:#06X}", r.0, r.0)?;
        }
        writeln!(f, "PC:   {:016b} - {:#06X}", self.pc.0, self.pc.0)?;
        let cond = self.cond as u16;
        write!(f, "COND: {cond:016b} - {:?}", self.cond)
    }
}
