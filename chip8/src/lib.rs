mod clock;
pub mod constants;
mod cpu;
mod display;
mod error;
mod keypad;
mod memory;
mod opcode;
mod vm;

pub use self::{
    clock::{Clock, TimerGovernor},
    cpu::CpuMode,
    display::Framebuffer,
    error::{Chip8Error, Chip8Result},
    keypad::{InvalidKeyCode, KeyCode, Keypad},
    memory::Memory,
    opcode::{nibbles, Opcode},
    vm::{Chip8Conf, Chip8Vm, Flow},
};

/// Version of this interpreter implementation.
pub const IMPL_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod prelude {
    pub use super::{
        error::{Chip8Error, Chip8Result},
        keypad::{KeyCode, Keypad},
        vm::{Chip8Conf, Chip8Vm, Flow},
    };
}
