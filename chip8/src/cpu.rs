//! CPU register state.
use crate::constants::*;

/// Execution mode of the CPU.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum CpuMode {
    /// Fetching and executing instructions.
    #[default]
    Running,
    /// Suspended by `Fx0A` until any key is pressed. Holds the
    /// destination register for the key value.
    AwaitingKey(u8),
}

/// Core state for a chip8 interpreter.
#[derive(Debug, Clone)]
pub struct Chip8Cpu {
    // ------------------------------------------------------------------------
    // Registers
    /// Program counter pointing to the next instruction.
    pub(crate) pc: Address,
    /// Stack pointer, indicating the top of the stack.
    ///
    /// Incremented before a push, and read before a decrement on pop.
    pub(crate) sp: u8,
    /// General purpose registers for temporary values.
    ///
    /// Register 16 (VF) is used for either the carry flag or borrow switch depending on opcode.
    pub(crate) registers: [u8; REGISTER_COUNT],
    /// Pointer register used for temporarily storing an address. Only the lowest
    /// 12 bits address memory, but arithmetic on it is not masked.
    pub(crate) address: Address,
    /// (DT) Delay timer that counts down to 0.
    pub(crate) delay_timer: u8,
    /// (ST) Sound timer that counts down to 0. When it has a non-zero value, a beep is played.
    pub(crate) sound_timer: u8,
    /// Stack of return pointers used for jumping when a routine call finishes.
    pub(crate) stack: [Address; STACK_SIZE],

    // ------------------------------------------------------------------------
    // Control
    pub(crate) mode: CpuMode,
}

impl Default for Chip8Cpu {
    fn default() -> Self {
        Self {
            pc: MEM_START as Address,
            sp: 0,
            registers: [0; REGISTER_COUNT],
            address: 0,
            delay_timer: 0,
            sound_timer: 0,
            stack: [0; STACK_SIZE],
            mode: CpuMode::Running,
        }
    }
}

impl Chip8Cpu {
    pub fn new() -> Self {
        Default::default()
    }

    #[inline(always)]
    pub fn reg(&self, index: u8) -> u8 {
        self.registers[index as usize & 0xF]
    }

    #[inline(always)]
    pub fn set_reg(&mut self, index: u8, value: u8) {
        self.registers[index as usize & 0xF] = value;
    }

    #[inline(always)]
    pub fn set_flag(&mut self, flag: bool) {
        self.registers[FLAG_REGISTER] = flag as u8;
    }

    /// Whether a push would move past the top of the stack.
    #[inline]
    pub fn stack_full(&self) -> bool {
        self.sp as usize + 1 >= STACK_SIZE
    }

    #[inline]
    pub fn stack_empty(&self) -> bool {
        self.sp == 0
    }

    /// Push a return address. The pointer wraps within the stack.
    pub fn push(&mut self, address: Address) {
        self.sp = self.sp.wrapping_add(1);
        self.stack[self.sp as usize & STACK_MASK] = address;
    }

    /// Pop a return address. The pointer wraps within the stack.
    pub fn pop(&mut self) -> Address {
        let address = self.stack[self.sp as usize & STACK_MASK];
        self.sp = self.sp.wrapping_sub(1);
        address
    }

    /// Count down the delay timer.
    #[inline]
    pub fn tick_delay(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
    }

    #[inline]
    pub fn tick_sound(&mut self) {
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }
}
