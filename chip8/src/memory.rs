//! Main memory.
use std::fmt::{self, Write};

use crate::constants::*;

/// Flat byte addressable RAM.
///
/// Accessors take full width addresses and wrap them to 12 bits. Callers
/// that want to reject out of range addresses check with [`Memory::in_bounds`]
/// first.
#[derive(Clone)]
pub struct Memory {
    ram: Box<[u8; MEM_SIZE]>,
}

impl Default for Memory {
    fn default() -> Self {
        Self {
            ram: Box::new([0; MEM_SIZE]),
        }
    }
}

impl Memory {
    pub fn new() -> Self {
        Default::default()
    }

    /// Erase the contents of memory.
    pub fn clear(&mut self) {
        self.ram.fill(0);
    }

    /// Install the built-in hexadecimal font.
    pub fn load_font(&mut self) {
        let start = FONTSET_START as usize;
        self.ram[start..start + FONTSET_DATA_LENGTH].copy_from_slice(&FONTSET);
    }

    /// Copy a program into memory at the program start.
    ///
    /// Anything that doesn't fit is silently dropped. Returns the
    /// number of bytes copied.
    pub fn load_program(&mut self, bytecode: &[u8]) -> usize {
        let count = bytecode.len().min(MAX_PROGRAM_SIZE);
        self.ram[MEM_START..MEM_START + count].copy_from_slice(&bytecode[..count]);
        count
    }

    /// Whether `len` bytes starting at `address` lie inside RAM.
    #[inline]
    pub fn in_bounds(address: usize, len: usize) -> bool {
        address + len <= MEM_SIZE
    }

    #[inline(always)]
    pub fn read(&self, address: usize) -> u8 {
        self.ram[address & MEM_MASK]
    }

    #[inline(always)]
    pub fn write(&mut self, address: usize, value: u8) {
        self.ram[address & MEM_MASK] = value;
    }

    /// Read the big-endian instruction word at the given address.
    #[inline(always)]
    pub fn read_word(&self, address: usize) -> u16 {
        crate::opcode::word(self.read(address), self.read(address + 1))
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8; MEM_SIZE] {
        &self.ram
    }

    /// Hex dump of `count` bytes from `start`, 16 bytes per line.
    pub fn dump(&self, start: usize, count: usize) -> Result<String, fmt::Error> {
        let mut buf = String::new();
        let end = (start + count).min(MEM_SIZE);

        for (i, chunk) in self.ram[start.min(end)..end].chunks(16).enumerate() {
            write!(buf, "{:04X}:", start + i * 16)?;
            for byte in chunk {
                write!(buf, " {:02X}", byte)?;
            }
            writeln!(buf)?;
        }

        Ok(buf)
    }
}
