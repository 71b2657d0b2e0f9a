//! # LC-3 Virtual Machine.
//!
//! `lc3-vm` runs programs for the LC-3 system.
//! Usage starts with loading a program image via `emulator::from_program` and continues with
//! `Emulator::execute` until the program halts.
//!
//!  # Example
//! ```
//! use lc3_vm::emulator;
//! use lc3_vm::hardware::console::MemoryConsole;
//!
//! let console = MemoryConsole::shared(b"");
//! // origin, LEA R0 #2, PUTS, HALT, "Hi"
//! let program = [0x3000, 0xE002, 0xF022, 0xF025, 0x48, 0x69, 0x00];
//! let mut emu = emulator::from_program_words(&program, console.clone()).unwrap();
//! emu.execute().unwrap();
//! assert_eq!(console.borrow().get_string(), "Hi\nProgram halted\n");
//! assert_eq!(emu.registers().get(7).as_binary(), 0x3003);
//! ```
//! # Errors
//! - Program is missing valid .ORIG header or is not made of whole u16 words
//! - Program runs past the end of memory at `0xFFFF`
//! - Execution stops on reserved opcodes, unknown trap vectors and console I/O errors

pub mod emulator;
pub mod errors;
pub mod hardware;
pub mod numbers;
pub(crate) mod terminal;
