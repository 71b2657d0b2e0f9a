use crate::emulator::instruction::Instruction;
use crate::errors::ExecutionError;
use crate::hardware::console::{Console, SharedConsole};
use crate::hardware::memory::Memory;
use crate::hardware::registers::{Registers, from_binary};
use std::io;
use std::ops::ControlFlow;

/// Trap vectors of the console routines.
#[repr(u8)]
#[derive(enumn::N, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapVector {
    GetC = 0x20,
    Out = 0x21,
    PutS = 0x22,
    In = 0x23,
    PutSp = 0x24,
    Halt = 0x25,
}

/// TRAP: saves the PC in R7 and calls the routine selected by `trapvect8`.
/// ```text
///  15__12__11__8___7_______0_
/// | 1111 | 0000 | trapvect8 |
///  -------------------------
/// ```
///
/// Breaks with `Ok(())` on HALT and with an error for unknown vectors and I/O errors.
pub fn trap(
    i: Instruction,
    regs: &mut Registers,
    mem: &mut Memory,
    console: &SharedConsole,
) -> ControlFlow<Result<(), ExecutionError>> {
    let pc = regs.pc();
    regs.set(Registers::RETURN_ADDRESS, pc);
    let Some(vector) = TrapVector::n(i.trap_vector()) else {
        return ControlFlow::Break(Err(ExecutionError::UnrecognizedTrapVector {
            vector: i.trap_vector(),
            pc: pc.as_binary().wrapping_sub(1),
        }));
    };
    tracing::trace!(?vector, "trap");
    match vector {
        TrapVector::GetC => get_c(regs, mem, &mut *console.borrow_mut()),
        TrapVector::Out => out(regs, &mut *console.borrow_mut()),
        TrapVector::PutS => put_s(regs, mem, console),
        TrapVector::In => in_trap(regs, mem, &mut *console.borrow_mut()),
        TrapVector::PutSp => put_sp(regs, mem, console),
        TrapVector::Halt => halt(&mut *console.borrow_mut()),
    }
}

/// A key already latched by polling KBSR comes first, otherwise blocks on the console.
fn read_character_from_console(
    regs: &mut Registers,
    mem: &mut Memory,
    console: &mut dyn Console,
) -> ControlFlow<Result<(), ExecutionError>, u16> {
    let c = match mem.take_latched_key() {
        Some(c) => c,
        None => match console.read_char() {
            Ok(c) => c,
            Err(e) => return wrap_io_error_in_cf(e),
        },
    };
    let c = c & 0xFF;
    regs.set(0, from_binary(c));
    ControlFlow::Continue(c)
}

/// GETC: Read a single character from the keyboard. The character is not echoed onto the console.
///
/// Its ASCII code is copied into R0. The high eight bits of R0 are cleared.
pub fn get_c(
    regs: &mut Registers,
    mem: &mut Memory,
    console: &mut dyn Console,
) -> ControlFlow<Result<(), ExecutionError>> {
    read_character_from_console(regs, mem, console)?;
    ControlFlow::Continue(())
}

/// IN: Print a prompt on the screen and read a single character echoed back from the keyboard.
///
/// Otherwise, like 0x20 GETC.
pub fn in_trap(
    regs: &mut Registers,
    mem: &mut Memory,
    console: &mut dyn Console,
) -> ControlFlow<Result<(), ExecutionError>> {
    write_str_out("Input: ", console)?;
    let c = read_character_from_console(regs, mem, console)?;
    write_chars_out(&[c], console)
}

/// OUT: Write a character in R0[7:0] to the console display.
pub fn out(regs: &Registers, console: &mut dyn Console) -> ControlFlow<Result<(), ExecutionError>> {
    write_chars_out(&[regs.get(0).as_binary() & 0xFF], console)
}

fn put_one_char_per_u16(input: u16, append_to: &mut Vec<u16>) {
    append_to.push(input & 0xFF);
}

fn put_two_chars_per_u16(input: u16, append_to: &mut Vec<u16>) {
    append_to.push(input & 0xFF);
    let c = input >> 8;
    if c != 0 {
        append_to.push(c);
    }
}

/// Reads the null terminated string starting at the address in R0.
fn collect_string(
    regs: &Registers,
    mem: &mut Memory,
    handle_char: fn(u16, &mut Vec<u16>),
) -> ControlFlow<Result<(), ExecutionError>, Vec<u16>> {
    let mut address = regs.get(0).as_binary();
    let mut s = Vec::with_capacity(120);
    loop {
        match mem.read(address) {
            Ok(0) => return ControlFlow::Continue(s),
            Ok(word) => handle_char(word, &mut s),
            Err(e) => return ControlFlow::Break(Err(e)),
        }
        address = address.wrapping_add(1);
    }
}

/// PUTS: print null-delimited char* from register 0's address
///
/// The string is read before the console is borrowed, it may contain memory mapped registers.
pub fn put_s(
    regs: &Registers,
    mem: &mut Memory,
    console: &SharedConsole,
) -> ControlFlow<Result<(), ExecutionError>> {
    let s = collect_string(regs, mem, put_one_char_per_u16)?;
    write_chars_out(&s, &mut *console.borrow_mut())
}

/// PUTSP: Packed version of PUTS
///
/// The ASCII code contained in bits [7:0] of a memory location is written to the console first.
/// The second character of the last memory location can be 0x00.
/// Writing terminates with a 0x000 char.
pub fn put_sp(
    regs: &Registers,
    mem: &mut Memory,
    console: &SharedConsole,
) -> ControlFlow<Result<(), ExecutionError>> {
    let s = collect_string(regs, mem, put_two_chars_per_u16)?;
    write_chars_out(&s, &mut *console.borrow_mut())
}

/// HALT: End program and print a message
pub fn halt(console: &mut dyn Console) -> ControlFlow<Result<(), ExecutionError>> {
    write_str_out("\nProgram halted\n", console)?;
    ControlFlow::Break(Ok(()))
}

fn write_str_out(message: &str, console: &mut dyn Console) -> ControlFlow<Result<(), ExecutionError>> {
    let chars: Vec<u16> = message.bytes().map(u16::from).collect();
    write_chars_out(&chars, console)
}

fn write_chars_out(chars: &[u16], console: &mut dyn Console) -> ControlFlow<Result<(), ExecutionError>> {
    match chars
        .iter()
        .try_for_each(|c| console.write_char(*c))
        .and_then(|()| console.flush())
    {
        Ok(()) => ControlFlow::Continue(()),
        Err(e) => wrap_io_error_in_cf(e),
    }
}

/// CTRL-C while waiting for input becomes [`ExecutionError::Interrupted`].
fn wrap_io_error_in_cf<T>(error: io::Error) -> ControlFlow<Result<(), ExecutionError>, T> {
    ControlFlow::Break(Err(error.into()))
}
