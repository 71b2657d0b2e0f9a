use crate::errors::{ExecutionError, LoadProgramError};
use crate::hardware::console::SharedConsole;
use std::fmt::{Debug, Formatter};

pub const PROGRAM_SECTION_START: u16 = 0x3000;
const MEMORY_SIZE_U16: usize = 1 << 16;

/// Memory regions mapped to IO functionality.
#[repr(u16)]
#[derive(enumn::N, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryMappedIOLocations {
    /// Keyboard Status Register
    Kbsr = 0xFE00,
    /// Keyboard Data Register
    Kbdr = 0xFE02,
    /// Display Status Register
    Dsr = 0xFE04,
    /// Display Data Register
    Ddr = 0xFE06,
    /// Machine Control Register
    Mcr = 0xFFFE,
}

/// An abstraction for the LC-3 memory including the memory mapped device registers
/// but excluding registers.
pub struct Memory {
    /// Index equals memory address
    data: Box<[u16]>,
    /// `None` leaves the device registers unimplemented.
    console: Option<SharedConsole>,
    keyboard_status_register: u16,
    keyboard_data_register: u16,
    machine_control_register: u16,
}

impl Debug for Memory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Memory {{ program section: {:?}, devices attached: {}, MCR: {:#06X} }}",
            &self.data[usize::from(PROGRAM_SECTION_START)..usize::from(PROGRAM_SECTION_START) + 16],
            self.console.is_some(),
            self.machine_control_register
        )
    }
}

impl Memory {
    const STATUS_REGISTER_SET: u16 = 1 << 15;
    const STATUS_REGISTER_UNSET: u16 = 0;

    #[must_use]
    pub fn new(console: Option<SharedConsole>) -> Self {
        Self {
            data: vec![0x0u16; MEMORY_SIZE_U16].into_boxed_slice(),
            console,
            keyboard_status_register: Self::STATUS_REGISTER_UNSET,
            keyboard_data_register: 0,
            machine_control_register: Self::STATUS_REGISTER_SET,
        }
    }

    /// Loads a program without an `.ORIG` header into memory starting at `origin`.
    /// Words landing on device registers are stored but stay shadowed by the devices.
    /// Nothing is written if the program does not fit.
    ///
    /// # Errors
    /// - Program runs past the last address `0xFFFF`
    pub fn load_program(&mut self, origin: u16, data: &[u16]) -> Result<(), LoadProgramError> {
        let maximum_instructions = MEMORY_SIZE_U16 - usize::from(origin);
        if data.len() > maximum_instructions {
            return Err(LoadProgramError::ProgramTooLong {
                actual_instructions: data.len(),
                maximum_instructions,
            });
        }
        let start = usize::from(origin);
        self.data[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Reads one word, device registers are served by the attached console.
    ///
    /// # Errors
    /// - device register accessed without console attached
    /// - console I/O failed
    pub fn read(&mut self, address: u16) -> Result<u16, ExecutionError> {
        let Some(location) = MemoryMappedIOLocations::n(address) else {
            return Ok(self.data[usize::from(address)]);
        };
        let console = self.device(address)?;
        match location {
            MemoryMappedIOLocations::Kbsr => {
                if self.keyboard_status_register == Self::STATUS_REGISTER_UNSET
                    && let Some(c) = console.borrow_mut().poll_char()?
                {
                    self.keyboard_status_register = Self::STATUS_REGISTER_SET;
                    self.keyboard_data_register = c & 0xFF;
                }
                Ok(self.keyboard_status_register)
            }
            MemoryMappedIOLocations::Kbdr => {
                self.keyboard_status_register = Self::STATUS_REGISTER_UNSET;
                Ok(std::mem::take(&mut self.keyboard_data_register))
            }
            MemoryMappedIOLocations::Dsr => Ok(Self::STATUS_REGISTER_SET),
            MemoryMappedIOLocations::Ddr => Ok(0),
            MemoryMappedIOLocations::Mcr => Ok(self.machine_control_register),
        }
    }

    /// Writes one word, device registers are served by the attached console.
    ///
    /// # Errors
    /// - device register accessed without console attached
    /// - console I/O failed
    pub fn write(&mut self, address: u16, value: u16) -> Result<(), ExecutionError> {
        let Some(location) = MemoryMappedIOLocations::n(address) else {
            self.data[usize::from(address)] = value;
            return Ok(());
        };
        let console = self.device(address)?;
        match location {
            MemoryMappedIOLocations::Ddr => {
                let mut console = console.borrow_mut();
                console.write_char(value & 0xFF)?;
                console.flush()?;
            }
            MemoryMappedIOLocations::Mcr => self.machine_control_register = value,
            // no interrupt support, status and keyboard data are read only
            MemoryMappedIOLocations::Kbsr
            | MemoryMappedIOLocations::Kbdr
            | MemoryMappedIOLocations::Dsr => {}
        }
        Ok(())
    }

    /// Hands a key latched by a KBSR poll to the trap routines and clears the status register,
    /// like a read of KBDR.
    pub fn take_latched_key(&mut self) -> Option<u16> {
        if self.keyboard_status_register == Self::STATUS_REGISTER_UNSET {
            return None;
        }
        self.keyboard_status_register = Self::STATUS_REGISTER_UNSET;
        Some(std::mem::take(&mut self.keyboard_data_register))
    }

    /// False once a program cleared bit 15 of the machine control register.
    #[must_use]
    pub const fn clock_running(&self) -> bool {
        self.machine_control_register & Self::STATUS_REGISTER_SET != 0
    }
    pub const fn restart_clock(&mut self) {
        self.machine_control_register = Self::STATUS_REGISTER_SET;
    }

    fn device(&self, address: u16) -> Result<SharedConsole, ExecutionError> {
        self.console
            .clone()
            .ok_or(ExecutionError::UnimplementedDevice { address })
    }
}
