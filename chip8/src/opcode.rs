//! Instruction decoding.
//!
//! Every instruction is a 16-bit big-endian word. The word is split into
//! four nibbles, the first of which identifies the instruction family.
use std::fmt;

use crate::constants::Address;

/// Combine the two bytes of an instruction into a single word, high byte first.
#[inline(always)]
pub fn word(hi: u8, lo: u8) -> u16 {
    ((hi as u16) << 8) | lo as u16
}

/// Split an instruction word into its four nibbles, from most to least significant.
#[inline(always)]
pub fn nibbles(word: u16) -> [u8; 4] {
    [
        (word >> 12) as u8,
        ((word >> 8) & 0xF) as u8,
        ((word >> 4) & 0xF) as u8,
        (word & 0xF) as u8,
    ]
}

/// Extract operand NNN from the instruction word.
#[inline(always)]
pub fn op_nnn(word: u16) -> Address {
    word & 0x0FFF
}

/// Extract operand NN from the instruction word.
#[inline(always)]
pub fn op_nn(word: u16) -> u8 {
    (word & 0xFF) as u8
}

/// Decoded instruction.
///
/// Register operands `x` and `y` are register indices (0x0-0xF), not register values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    /// 00E0
    Cls,
    /// 00EE
    Ret,
    /// 1NNN
    Jp { nnn: Address },
    /// 2NNN
    Call { nnn: Address },
    /// 3XNN
    SeByte { x: u8, nn: u8 },
    /// 4XNN
    SneByte { x: u8, nn: u8 },
    /// 5XY0
    SeReg { x: u8, y: u8 },
    /// 6XNN
    LdByte { x: u8, nn: u8 },
    /// 7XNN
    AddByte { x: u8, nn: u8 },
    /// 8XY0
    LdReg { x: u8, y: u8 },
    /// 8XY1
    Or { x: u8, y: u8 },
    /// 8XY2
    And { x: u8, y: u8 },
    /// 8XY3
    Xor { x: u8, y: u8 },
    /// 8XY4
    AddReg { x: u8, y: u8 },
    /// 8XY5
    Sub { x: u8, y: u8 },
    /// 8XY6
    Shr { x: u8, y: u8 },
    /// 8XY7
    Subn { x: u8, y: u8 },
    /// 8XYE
    Shl { x: u8, y: u8 },
    /// 9XYN
    ///
    /// A non-zero last nibble is malformed, but the comparison is still performed.
    SneReg { x: u8, y: u8, malformed: bool },
    /// ANNN
    LdI { nnn: Address },
    /// BNNN
    JpV0 { nnn: Address },
    /// CXNN
    Rnd { x: u8, nn: u8 },
    /// DXYN
    Drw { x: u8, y: u8, n: u8 },
    /// EX9E
    Skp { x: u8 },
    /// EXA1
    Sknp { x: u8 },
    /// FX07
    LdVxDt { x: u8 },
    /// FX0A
    LdVxK { x: u8 },
    /// FX15
    LdDtVx { x: u8 },
    /// FX18
    LdStVx { x: u8 },
    /// FX1E
    AddIVx { x: u8 },
    /// FX29
    LdFVx { x: u8 },
    /// FX33
    LdBVx { x: u8 },
    /// FX55
    StoreRegs { x: u8 },
    /// FX65
    LoadRegs { x: u8 },
    /// Anything not covered above. Executes as a no-op.
    Unknown(u16),
}

impl Opcode {
    /// Decode an instruction word. Any word decodes, falling back to [`Opcode::Unknown`].
    pub fn decode(word: u16) -> Self {
        use Opcode::*;

        let [op, x, y, n] = nibbles(word);
        let nn = op_nn(word);
        let nnn = op_nnn(word);

        match op {
            0x0 => match word {
                0x00E0 => Cls,
                0x00EE => Ret,
                _ => Unknown(word),
            },
            0x1 => Jp { nnn },
            0x2 => Call { nnn },
            0x3 => SeByte { x, nn },
            0x4 => SneByte { x, nn },
            0x5 if n == 0 => SeReg { x, y },
            0x6 => LdByte { x, nn },
            0x7 => AddByte { x, nn },
            0x8 => match n {
                0x0 => LdReg { x, y },
                0x1 => Or { x, y },
                0x2 => And { x, y },
                0x3 => Xor { x, y },
                0x4 => AddReg { x, y },
                0x5 => Sub { x, y },
                0x6 => Shr { x, y },
                0x7 => Subn { x, y },
                0xE => Shl { x, y },
                _ => Unknown(word),
            },
            0x9 => SneReg {
                x,
                y,
                malformed: n != 0,
            },
            0xA => LdI { nnn },
            0xB => JpV0 { nnn },
            0xC => Rnd { x, nn },
            0xD => Drw { x, y, n },
            0xE => match nn {
                0x9E => Skp { x },
                0xA1 => Sknp { x },
                _ => Unknown(word),
            },
            0xF => match nn {
                0x07 => LdVxDt { x },
                0x0A => LdVxK { x },
                0x15 => LdDtVx { x },
                0x18 => LdStVx { x },
                0x1E => AddIVx { x },
                0x29 => LdFVx { x },
                0x33 => LdBVx { x },
                0x55 => StoreRegs { x },
                0x65 => LoadRegs { x },
                _ => Unknown(word),
            },
            _ => Unknown(word),
        }
    }
}

/// Assembly mnemonic, as used in instruction traces.
impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Opcode::*;

        match *self {
            Cls => write!(f, "CLS"),
            Ret => write!(f, "RET"),
            Jp { nnn } => write!(f, "JP {nnn:#05X}"),
            Call { nnn } => write!(f, "CALL {nnn:#05X}"),
            SeByte { x, nn } => write!(f, "SE V{x:X}, {nn:#04X}"),
            SneByte { x, nn } => write!(f, "SNE V{x:X}, {nn:#04X}"),
            SeReg { x, y } => write!(f, "SE V{x:X}, V{y:X}"),
            LdByte { x, nn } => write!(f, "LD V{x:X}, {nn:#04X}"),
            AddByte { x, nn } => write!(f, "ADD V{x:X}, {nn:#04X}"),
            LdReg { x, y } => write!(f, "LD V{x:X}, V{y:X}"),
            Or { x, y } => write!(f, "OR V{x:X}, V{y:X}"),
            And { x, y } => write!(f, "AND V{x:X}, V{y:X}"),
            Xor { x, y } => write!(f, "XOR V{x:X}, V{y:X}"),
            AddReg { x, y } => write!(f, "ADD V{x:X}, V{y:X}"),
            Sub { x, y } => write!(f, "SUB V{x:X}, V{y:X}"),
            Shr { x, y } => write!(f, "SHR V{x:X}, V{y:X}"),
            Subn { x, y } => write!(f, "SUBN V{x:X}, V{y:X}"),
            Shl { x, y } => write!(f, "SHL V{x:X}, V{y:X}"),
            SneReg { x, y, .. } => write!(f, "SNE V{x:X}, V{y:X}"),
            LdI { nnn } => write!(f, "LD I, {nnn:#05X}"),
            JpV0 { nnn } => write!(f, "JP V0, {nnn:#05X}"),
            Rnd { x, nn } => write!(f, "RND V{x:X}, {nn:#04X}"),
            Drw { x, y, n } => write!(f, "DRW V{x:X}, V{y:X}, {n}"),
            Skp { x } => write!(f, "SKP V{x:X}"),
            Sknp { x } => write!(f, "SKNP V{x:X}"),
            LdVxDt { x } => write!(f, "LD V{x:X}, DT"),
            LdVxK { x } => write!(f, "LD V{x:X}, K"),
            LdDtVx { x } => write!(f, "LD DT, V{x:X}"),
            LdStVx { x } => write!(f, "LD ST, V{x:X}"),
            AddIVx { x } => write!(f, "ADD I, V{x:X}"),
            LdFVx { x } => write!(f, "LD F, V{x:X}"),
            LdBVx { x } => write!(f, "LD B, V{x:X}"),
            StoreRegs { x } => write!(f, "LD [I], V{x:X}"),
            LoadRegs { x } => write!(f, "LD V{x:X}, [I]"),
            Unknown(word) => write!(f, "??? {word:04X}"),
        }
    }
}
