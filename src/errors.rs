use crate::emulator::instruction::Operation;
use std::error::Error;
use std::io;

/// Errors while loading a program image into memory.
#[derive(Debug, displaydoc::Display, PartialEq, Eq)]
pub enum LoadProgramError {
    /// Program is missing valid .ORIG header
    ProgramMissingOrigHeader,
    /// Program is truncated, got {byte_count} bytes which is not a whole number of u16 words
    ProgramTruncated { byte_count: usize },
    /// Program too long, got {actual_instructions:?} u16 instructions while limit is {maximum_instructions:?}
    ProgramTooLong {
        actual_instructions: usize,
        maximum_instructions: usize,
    },
    /// Program {file} could not be loaded: {message}
    ProgramNotLoadable { file: String, message: String },
}
impl Error for LoadProgramError {}

/// Fatal conditions which stop the execution loop.
#[derive(Debug, displaydoc::Display, PartialEq, Eq)]
pub enum ExecutionError {
    /// Opcode {operation:?} at address {pc:#06X} is not implemented
    UnimplementedOpcode { operation: Operation, pc: u16 },
    /// Memory mapped device register {address:#06X} has no device attached
    UnimplementedDevice { address: u16 },
    /// Trap vector {vector:#04X} at address {pc:#06X} is not recognized
    UnrecognizedTrapVector { vector: u8, pc: u16 },
    /// Error during reading Stdin or writing program output to Stdout: {0}
    IOInputOutputError(String),
    /// Program execution was interrupted
    Interrupted,
}
impl Error for ExecutionError {}

impl ExecutionError {
    /// Process exit code to report this error with, distinct per kind.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::UnimplementedOpcode { .. } => 4,
            Self::UnimplementedDevice { .. } => 5,
            Self::UnrecognizedTrapVector { .. } => 6,
            Self::IOInputOutputError(_) => 7,
            Self::Interrupted => 130,
        }
    }
}

impl From<io::Error> for ExecutionError {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::Interrupted {
            Self::Interrupted
        } else {
            Self::IOInputOutputError(e.to_string())
        }
    }
}
