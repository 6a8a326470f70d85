//! Result and errors.
use std::fmt::{self, Display, Formatter};

use crate::constants::Address;

pub type Chip8Result<T> = std::result::Result<T, Chip8Error>;

#[derive(Debug)]
pub enum Chip8Error {
    /// Failed to read a ROM file.
    Io(std::io::Error),
    /// CALL with a full call stack. Only raised in strict mode.
    StackOverflow { pc: Address },
    /// RET with an empty call stack. Only raised in strict mode.
    StackUnderflow { pc: Address },
    /// Instruction touched memory past the end of RAM. Only raised in strict mode.
    MemoryOutOfBounds { pc: Address, address: usize },
}

impl Display for Chip8Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read rom: {}", err),
            Self::StackOverflow { pc } => write!(f, "call stack overflow at {:#05X}", pc),
            Self::StackUnderflow { pc } => write!(f, "call stack underflow at {:#05X}", pc),
            Self::MemoryOutOfBounds { pc, address } => write!(
                f,
                "memory access out of bounds at {:#05X}: address {:#06X}",
                pc, address
            ),
        }
    }
}

impl std::error::Error for Chip8Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Chip8Error {
    fn from(err: std::io::Error) -> Self {
        Chip8Error::Io(err)
    }
}
