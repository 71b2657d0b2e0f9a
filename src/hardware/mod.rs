//! Registers, memory and the console attached to the memory mapped device registers.
pub mod console;
pub mod memory;
pub mod registers;
