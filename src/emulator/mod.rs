pub mod instruction;
pub mod opcodes;
pub mod trap_routines;

#[cfg(test)]
mod test_helpers;

use crate::errors::{ExecutionError, LoadProgramError};
use crate::hardware::console::SharedConsole;
use crate::hardware::memory::Memory;
use crate::hardware::registers::Registers;
use instruction::{Instruction, Operation};
use std::fmt::{Debug, Formatter};
use std::fs;
use std::ops::ControlFlow;
use std::path::Path;

/// Instructions executed between two looks at the console for CTRL-C.
const INTERRUPT_CHECK_INTERVAL: u32 = 1024;

/// Execution state, `Halted` is terminal until the registers are reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorState {
    Running,
    Halted,
}

/// The public facing emulator used to run LC-3 programs.
pub struct Emulator {
    registers: Registers,
    memory: Memory,
    console: SharedConsole,
    state: ProcessorState,
}

impl Debug for Emulator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emulator")
            .field("registers", &self.registers)
            .field("memory", &self.memory)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Reads a program image from file and loads it.
///
/// # Errors
/// See [`Emulator::load_image`], additionally if the file cannot be read.
pub fn from_program(
    path: impl AsRef<Path>,
    console: SharedConsole,
) -> Result<Emulator, LoadProgramError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| LoadProgramError::ProgramNotLoadable {
        file: path.display().to_string(),
        message: e.to_string(),
    })?;
    from_program_bytes(&bytes, console)
}

/// Loads a program image given as little endian bytes, origin first.
///
/// # Errors
/// See [`Emulator::load_image`]
pub fn from_program_bytes(
    bytes: &[u8],
    console: SharedConsole,
) -> Result<Emulator, LoadProgramError> {
    let mut emu = Emulator::new(console);
    emu.load_image(bytes)?;
    Ok(emu)
}

/// Loads a program given as words, origin first.
///
/// # Errors
/// See [`Emulator::load_image`]
pub fn from_program_words(
    program: &[u16],
    console: SharedConsole,
) -> Result<Emulator, LoadProgramError> {
    let mut emu = Emulator::new(console);
    emu.load_words(program)?;
    Ok(emu)
}

impl Emulator {
    /// Empty memory, registers in their initial state, PC at `0x3000`.
    #[must_use]
    pub fn new(console: SharedConsole) -> Self {
        Self {
            registers: Registers::new(),
            memory: Memory::new(Some(console.clone())),
            console,
            state: ProcessorState::Running,
        }
    }

    /// Loads a program image: a little endian origin address followed by little endian words
    /// which are put into memory starting at that origin. Memory is unchanged on error.
    ///
    /// # Errors
    /// - Program is missing the origin header
    /// - Program has an odd number of bytes
    /// - Program does not fit below the memory mapped IO section
    pub fn load_image(&mut self, bytes: &[u8]) -> Result<(), LoadProgramError> {
        if bytes.len() % 2 != 0 {
            return Err(LoadProgramError::ProgramTruncated {
                byte_count: bytes.len(),
            });
        }
        let words: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|w| u16::from_le_bytes([w[0], w[1]]))
            .collect();
        self.load_words(&words)
    }

    fn load_words(&mut self, program: &[u16]) -> Result<(), LoadProgramError> {
        let Some((origin, rest)) = program.split_first() else {
            return Err(LoadProgramError::ProgramMissingOrigHeader);
        };
        self.memory.load_program(*origin, rest)?;
        tracing::debug!(
            origin = format!("{origin:#06X}"),
            words = rest.len(),
            "program loaded"
        );
        Ok(())
    }

    #[must_use]
    pub const fn registers(&self) -> &Registers {
        &self.registers
    }
    pub const fn registers_mut(&mut self) -> &mut Registers {
        &mut self.registers
    }
    #[must_use]
    pub const fn memory(&self) -> &Memory {
        &self.memory
    }
    pub const fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }
    #[must_use]
    pub const fn state(&self) -> ProcessorState {
        self.state
    }
    /// Prepares another run of the loaded program, memory is kept.
    pub fn reset_registers(&mut self) {
        self.registers.reset();
        self.memory.restart_clock();
        self.state = ProcessorState::Running;
    }

    /// Runs until the program halts.
    ///
    /// # Errors
    /// - Unimplemented opcode, unrecognized trap vector or device register without device
    /// - I/O errors of the console
    /// - Interrupted by CTRL-C on the console
    pub fn execute(&mut self) -> Result<(), ExecutionError> {
        let mut steps: u32 = 0;
        loop {
            if steps % INTERRUPT_CHECK_INTERVAL == 0
                && self.console.borrow_mut().is_interrupted()
            {
                tracing::debug!("interrupted");
                self.state = ProcessorState::Halted;
                return Err(ExecutionError::Interrupted);
            }
            steps = steps.wrapping_add(1);
            if !self.memory.clock_running() {
                tracing::debug!("machine control register stopped the clock");
                self.state = ProcessorState::Halted;
            }
            if let ControlFlow::Break(res) = self.step() {
                match &res {
                    Ok(()) => tracing::debug!("program halted"),
                    Err(e) => tracing::debug!("execution stopped: {e}"),
                }
                return res;
            }
        }
    }

    /// Executes one instruction: fetch at PC, increment PC, dispatch.
    /// Breaks once halted, every fatal error halts as well.
    pub fn step(&mut self) -> ControlFlow<Result<(), ExecutionError>> {
        if self.state == ProcessorState::Halted {
            return ControlFlow::Break(Ok(()));
        }
        let res = self.execute_next_instruction();
        if res.is_break() {
            self.state = ProcessorState::Halted;
        }
        res
    }

    fn execute_next_instruction(&mut self) -> ControlFlow<Result<(), ExecutionError>> {
        let pc = self.registers.pc().as_binary();
        let i = match self.memory.read(pc) {
            Ok(bits) => Instruction::from(bits),
            Err(e) => return ControlFlow::Break(Err(e)),
        };
        tracing::trace!(pc = format!("{pc:#06X}"), instruction = ?i, "execute");
        self.registers.increment_pc();
        let r = &mut self.registers;
        let mem = &mut self.memory;
        let res = match i.operation() {
            Operation::Add => {
                opcodes::add(i, r);
                Ok(())
            }
            Operation::And => {
                opcodes::and(i, r);
                Ok(())
            }
            Operation::Not => {
                opcodes::not(i, r);
                Ok(())
            }
            Operation::Br => {
                opcodes::br(i, r);
                Ok(())
            }
            Operation::JmpOrRet => {
                opcodes::jmp_or_ret(i, r);
                Ok(())
            }
            Operation::Jsr => {
                opcodes::jsr(i, r);
                Ok(())
            }
            Operation::Lea => {
                opcodes::lea(i, r);
                Ok(())
            }
            Operation::Ld => opcodes::ld(i, r, mem),
            Operation::Ldi => opcodes::ldi(i, r, mem),
            Operation::Ldr => opcodes::ldr(i, r, mem),
            Operation::St => opcodes::st(i, r, mem),
            Operation::Sti => opcodes::sti(i, r, mem),
            Operation::Str => opcodes::str(i, r, mem),
            Operation::Rti | Operation::Res => opcodes::unimplemented(i, r),
            Operation::Trap => return trap_routines::trap(i, r, mem, &self.console),
        };
        match res {
            Ok(()) => ControlFlow::Continue(()),
            Err(e) => ControlFlow::Break(Err(e)),
        }
    }
}
