use crate::emulator;
use crate::emulator::Emulator;
use crate::hardware::console::{MemoryConsole, SharedConsole};
use crate::hardware::memory::{Memory, PROGRAM_SECTION_START};
use crate::hardware::registers::Registers;
use std::cell::RefCell;
use std::rc::Rc;

/// Emulator wired to a [`MemoryConsole`], program loaded at `0x3000`.
pub struct FakeEmulator {
    inner: Emulator,
    console: Rc<RefCell<MemoryConsole>>,
}
impl FakeEmulator {
    pub fn new(program_no_header: &[u16]) -> Self {
        let mut program = Vec::with_capacity(program_no_header.len() + 1);
        program.push(PROGRAM_SECTION_START);
        program.extend_from_slice(program_no_header);

        let console = MemoryConsole::shared(b"");
        let emu = emulator::from_program_words(program.as_slice(), console.clone()).unwrap();
        Self {
            inner: emu,
            console,
        }
    }
    pub fn add_stdin_input(&mut self, input: &[u8]) -> &mut Self {
        self.console.borrow_mut().add_input(input);
        self
    }
    pub fn interrupt(&mut self) {
        self.console.borrow_mut().interrupt();
    }
    pub fn emulator(&mut self) -> &mut Emulator {
        &mut self.inner
    }
    pub fn output(&self) -> String {
        self.console.borrow().get_string()
    }
    /// Registers, memory, the console as passed to the trap routines and the same console
    /// for inspecting the output.
    pub fn get_parts(
        &mut self,
    ) -> (
        &mut Registers,
        &mut Memory,
        SharedConsole,
        Rc<RefCell<MemoryConsole>>,
    ) {
        (
            &mut self.inner.registers,
            &mut self.inner.memory,
            self.console.clone(),
            self.console.clone(),
        )
    }
}
