//! Virtual machine.
use std::{
    fmt::{self, Write},
    path::Path,
};

use log::{debug, trace, warn};
use rand::prelude::*;

use crate::{
    clock::TimerGovernor,
    constants::*,
    cpu::{Chip8Cpu, CpuMode},
    display::Framebuffer,
    error::{Chip8Error, Chip8Result},
    keypad::{KeyCode, Keypad},
    memory::Memory,
    opcode::Opcode,
};

/// Owns the complete machine state. Memory, registers, display and
/// keypad latch are only ever mutated through this context.
pub struct Chip8Vm {
    cpu: Chip8Cpu,
    memory: Memory,
    display: Framebuffer,
    keys: Keypad,
    timer: TimerGovernor,
    rng: StdRng,
    /// Switch tracking whether the buzzer should be on or off.
    buzzer_state: bool,
    conf: Chip8Conf,
}

impl Chip8Vm {
    pub fn new(conf: Chip8Conf) -> Self {
        let rng = match conf.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut vm = Chip8Vm {
            cpu: Chip8Cpu::new(),
            memory: Memory::new(),
            display: Framebuffer::new(),
            keys: Keypad::new(),
            timer: TimerGovernor::new(),
            rng,
            buzzer_state: false,
            conf,
        };
        vm.memory.load_font();
        vm
    }

    /// Reset the machine and load a program.
    ///
    /// Programs larger than the available memory are truncated.
    /// Returns the number of bytes loaded.
    pub fn load_bytecode(&mut self, bytecode: &[u8]) -> usize {
        // Start with clean memory to avoid leaking previous program.
        self.memory.clear();
        self.memory.load_font();

        let count = self.memory.load_program(bytecode);
        if count < bytecode.len() {
            warn!(
                "program is {} bytes, truncated to {} bytes",
                bytecode.len(),
                count
            );
        }

        self.reset();

        if log::log_enabled!(log::Level::Debug) {
            match self.memory.dump(0, MEM_SIZE) {
                Ok(dump) => debug!("memory after load:\n{dump}"),
                Err(err) => debug!("memory dump failed: {err}"),
            }
        }

        count
    }

    /// Read a ROM file and load it as the current program.
    pub fn load_rom_file(&mut self, path: impl AsRef<Path>) -> Chip8Result<usize> {
        let bytecode = std::fs::read(path.as_ref())?;
        Ok(self.load_bytecode(&bytecode))
    }

    /// Clear internal state in preparation for a fresh startup.
    fn reset(&mut self) {
        self.cpu = Chip8Cpu::new();
        self.display.clear();
        self.keys.clear();
        self.timer.reset();
        self.buzzer_state = false;
    }

    pub fn display(&self) -> &Framebuffer {
        &self.display
    }

    pub fn registers(&self) -> &[u8; REGISTER_COUNT] {
        &self.cpu.registers
    }

    pub fn pc(&self) -> Address {
        self.cpu.pc
    }

    /// Index register `I`.
    pub fn index(&self) -> Address {
        self.cpu.address
    }

    pub fn delay_timer(&self) -> u8 {
        self.cpu.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.cpu.sound_timer
    }

    pub fn mode(&self) -> CpuMode {
        self.cpu.mode
    }

    pub fn keys(&self) -> Keypad {
        self.keys
    }

    /// Whether the sound timer is counting down.
    ///
    /// No audio device is attached. Hosts that want sound can poll this each frame.
    pub fn buzzer(&self) -> bool {
        self.cpu.sound_timer > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Flow {
    Ok,
    /// Program counter has jumped to a new address.
    ///
    /// This is returned when the interpreter encounters:
    ///
    /// - 00EE (`RET`)
    /// - 1nnn (`JP addr`)
    /// - 2nnn (`CALL addr`)
    /// - Bnnn (`JP V0, addr`)
    Jump,
    /// Display buffer was changed.
    Draw,
    /// Wait for a keypress.
    ///
    /// This is triggered by the opcode `Fx0A` (`LD Vx, K`), which stops
    /// execution until a key is pressed, and loads the key value into `Vx`.
    KeyWait,
}

/// VM Configuration Parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize), serde(default))]
pub struct Chip8Conf {
    /// `8xy1`, `8xy2` and `8xy3` reset VF to zero.
    pub logic_resets_flag: bool,
    /// Keep counting down the timers while `Fx0A` waits for a key.
    ///
    /// When off, elapsed time still accumulates during the wait,
    /// but is only applied once the wait is over.
    pub key_wait_timers: bool,
    /// Fail on stack overflow, stack underflow and out of range memory access,
    /// instead of wrapping around.
    pub strict: bool,
    /// Seed for `Cxnn` (`RND Vx, byte`). Seeded from the OS when absent.
    pub seed: Option<u64>,
}

impl Default for Chip8Conf {
    fn default() -> Self {
        Self {
            logic_resets_flag: true,
            key_wait_timers: false,
            strict: false,
            seed: None,
        }
    }
}

/// Interpreter
impl Chip8Vm {
    /// Sets the keyboard key input state.
    pub fn set_key(&mut self, key: KeyCode, pressed: bool) {
        self.keys.set(key.as_u8(), pressed);
    }

    /// Clear the keyboard input state, setting all keys to up.
    pub fn clear_keys(&mut self) {
        self.keys.clear()
    }

    /// Run one host frame.
    ///
    /// Latches the keypad state, executes a single instruction (or checks
    /// whether a pending key wait can be resolved), and advances the timers
    /// by the elapsed wall clock time. Rendering is left to the caller.
    pub fn frame(&mut self, keys: Keypad, elapsed_ms: f64) -> Chip8Result<Flow> {
        self.keys = keys;

        let flow = match self.cpu.mode {
            CpuMode::Running => self.step()?,
            CpuMode::AwaitingKey(vx) => self.resume_key_wait(vx),
        };

        self.tick_timers(elapsed_ms);

        Ok(flow)
    }

    /// Advance the delay and sound timers by the elapsed wall clock time.
    pub fn tick_timers(&mut self, elapsed_ms: f64) {
        self.timer.accumulate(elapsed_ms);

        if matches!(self.cpu.mode, CpuMode::AwaitingKey(_)) && !self.conf.key_wait_timers {
            return;
        }

        if self.timer.drain() {
            self.cpu.tick_delay();
            self.cpu.tick_sound();
            self.update_buzzer();
        }
    }

    /// Buzzer should be on while sound timer counts down,
    /// then turned off when the timer reaches zero.
    fn update_buzzer(&mut self) {
        if self.cpu.sound_timer > 0 && !self.buzzer_state {
            self.buzzer_state = true;
            debug!("buzzer on");
        } else if self.cpu.sound_timer == 0 && self.buzzer_state {
            self.buzzer_state = false;
            debug!("buzzer off");
        }
    }

    fn resume_key_wait(&mut self, vx: u8) -> Flow {
        match self.keys.first_pressed() {
            Some(key) => {
                debug!("key wait resolved with {key}");
                self.cpu.set_reg(vx, key.as_u8());
                self.cpu.mode = CpuMode::Running;
                Flow::Ok
            }
            None => Flow::KeyWait,
        }
    }

    /// Execute instructions until the step count is reached,
    /// or the machine starts waiting for a key.
    pub fn run_steps(&mut self, step_count: usize) -> Chip8Result<Flow> {
        let mut flow = Flow::Ok;

        for _ in 0..step_count {
            flow = self.step()?;
            if flow == Flow::KeyWait {
                break;
            }
        }

        Ok(flow)
    }

    /// Fetch, decode and execute the instruction at the program counter.
    pub fn step(&mut self) -> Chip8Result<Flow> {
        if let CpuMode::AwaitingKey(_) = self.cpu.mode {
            return Ok(Flow::KeyWait);
        }

        let pc = self.cpu.pc;
        if self.conf.strict && !Memory::in_bounds(pc as usize, 2) {
            return Err(Chip8Error::MemoryOutOfBounds {
                pc,
                address: pc as usize,
            });
        }

        let op = Opcode::decode(self.memory.read_word(pc as usize));
        trace!("{pc:04X}: {op}");

        self.execute(op)
    }

    /// Execute a decoded instruction against the current state.
    ///
    /// The program counter advances past the instruction unless
    /// the instruction jumped.
    pub fn execute(&mut self, op: Opcode) -> Chip8Result<Flow> {
        let flow = match op {
            Opcode::Cls
            | Opcode::Ret
            | Opcode::Jp { .. }
            | Opcode::Call { .. }
            | Opcode::JpV0 { .. } => self.exec_flow(op)?,
            Opcode::LdReg { .. }
            | Opcode::Or { .. }
            | Opcode::And { .. }
            | Opcode::Xor { .. }
            | Opcode::AddReg { .. }
            | Opcode::Sub { .. }
            | Opcode::Shr { .. }
            | Opcode::Subn { .. }
            | Opcode::Shl { .. } => self.exec_math(op),
            Opcode::Drw { .. }
            | Opcode::LdBVx { .. }
            | Opcode::StoreRegs { .. }
            | Opcode::LoadRegs { .. } => self.exec_memory(op)?,
            _ => self.exec_misc(op),
        };

        if flow != Flow::Jump {
            self.cpu.pc = self.cpu.pc.wrapping_add(2);
        }

        Ok(flow)
    }

    /// Execute an instruction that clears the screen or moves the program counter.
    fn exec_flow(&mut self, op: Opcode) -> Chip8Result<Flow> {
        let pc = self.cpu.pc;

        let flow = match op {
            // 00E0 (CLS)
            //
            // Clear display
            Opcode::Cls => {
                self.display.clear();
                Flow::Draw
            }
            // 00EE (RET)
            //
            // Return from a subroutine.
            // The stack holds the address of the CALL instruction itself,
            // so execution resumes at the instruction after it.
            Opcode::Ret => {
                if self.conf.strict && self.cpu.stack_empty() {
                    return Err(Chip8Error::StackUnderflow { pc });
                }

                trace!("stack pointer: {}", self.cpu.sp.wrapping_sub(1));
                self.cpu.pc = self.cpu.pop().wrapping_add(2);
                Flow::Jump
            }
            // 1NNN (JP addr)
            //
            // Jump to address.
            Opcode::Jp { nnn } => {
                self.cpu.pc = nnn;
                Flow::Jump
            }
            // 2NNN (CALL addr)
            //
            // Call subroutine at NNN.
            Opcode::Call { nnn } => {
                if self.conf.strict && self.cpu.stack_full() {
                    return Err(Chip8Error::StackOverflow { pc });
                }

                trace!("stack pointer: {}", self.cpu.sp.wrapping_add(1));
                self.cpu.push(pc);
                self.cpu.pc = nnn;
                Flow::Jump
            }
            // BNNN (JP V0, addr)
            //
            // Jump to address NNN offset by register V0.
            Opcode::JpV0 { nnn } => {
                self.cpu.pc = nnn.wrapping_add(self.cpu.reg(0) as Address);
                Flow::Jump
            }
            _ => unreachable!("not a flow instruction: {op:?}"),
        };

        Ok(flow)
    }

    /// Execute an arithmetic instruction
    ///
    /// Flag producing instructions clear VF before their operands are read,
    /// so `X` or `Y` naming VF observes the cleared or updated flag.
    fn exec_math(&mut self, op: Opcode) -> Flow {
        match op {
            // 8XY0 (LD Vx, Vy)
            //
            // Store the value of register VY in register VX.
            Opcode::LdReg { x, y } => {
                self.cpu.set_reg(x, self.cpu.reg(y));
            }
            // 8XY1 (OR Vx, Vy)
            //
            // Performs bitwise OR on VX and VY, and stores the result in VX.
            Opcode::Or { x, y } => {
                self.cpu.set_reg(x, self.cpu.reg(x) | self.cpu.reg(y));
                self.reset_logic_flag();
            }
            // 8XY2 (AND Vx, Vy)
            Opcode::And { x, y } => {
                self.cpu.set_reg(x, self.cpu.reg(x) & self.cpu.reg(y));
                self.reset_logic_flag();
            }
            // 8XY3 (XOR Vx, Vy)
            Opcode::Xor { x, y } => {
                self.cpu.set_reg(x, self.cpu.reg(x) ^ self.cpu.reg(y));
                self.reset_logic_flag();
            }
            // 8XY4 (ADD Vx, Vy)
            //
            // ADDs VY to VX, and stores the result in VX.
            // Overflow is wrapped, and detected as the sum being less than VY.
            Opcode::AddReg { x, y } => {
                self.cpu.set_reg(x, self.cpu.reg(x).wrapping_add(self.cpu.reg(y)));
                self.cpu.set_flag(false);
                let carry = self.cpu.reg(x) < self.cpu.reg(y);
                self.cpu.set_flag(carry);
            }
            // 8XY5 (SUB Vx, Vy)
            //
            // Subtracts VY from VX, and stores the result in VX.
            // VF is set to 1 when VX is strictly greater than VY.
            Opcode::Sub { x, y } => {
                self.cpu.set_flag(false);
                let no_borrow = self.cpu.reg(x) > self.cpu.reg(y);
                self.cpu.set_flag(no_borrow);
                self.cpu.set_reg(x, self.cpu.reg(x).wrapping_sub(self.cpu.reg(y)));
            }
            // 8XY6 (SHR Vx, Vy)
            //
            // Shift VY right by 1 and store the result in VX.
            // VF is set to the bit shifted out.
            Opcode::Shr { x, y } => {
                self.cpu.set_flag(false);
                let lsb = self.cpu.reg(y) & 1 == 1;
                self.cpu.set_flag(lsb);
                self.cpu.set_reg(x, self.cpu.reg(y) >> 1);
            }
            // 8XY7 (SUBN Vx, Vy)
            //
            // Subtracts VX from VY, and stores the result in VX.
            // VF is set to 1 when VY is strictly greater than VX.
            Opcode::Subn { x, y } => {
                self.cpu.set_flag(false);
                let no_borrow = self.cpu.reg(y) > self.cpu.reg(x);
                self.cpu.set_flag(no_borrow);
                self.cpu.set_reg(x, self.cpu.reg(y).wrapping_sub(self.cpu.reg(x)));
            }
            // 8XYE (SHL Vx, Vy)
            //
            // Shift VY left by 1 and store the result in VX.
            // VF is set to the bit shifted out.
            Opcode::Shl { x, y } => {
                self.cpu.set_flag(false);
                let msb = self.cpu.reg(y) >> 7 == 1;
                self.cpu.set_flag(msb);
                self.cpu.set_reg(x, self.cpu.reg(y) << 1);
            }
            _ => unreachable!("not a math instruction: {op:?}"),
        }

        Flow::Ok
    }

    #[inline]
    fn reset_logic_flag(&mut self) {
        if self.conf.logic_resets_flag {
            self.cpu.set_flag(false);
        }
    }

    /// Execute an instruction that reads or writes memory at address register I.
    fn exec_memory(&mut self, op: Opcode) -> Chip8Result<Flow> {
        let addr = self.cpu.address as usize;

        let flow = match op {
            // Dxyn (DRW Vx, Vy, nibble)
            //
            // Draw sprite to the display buffer, at coordinate as per registers Vx and Vy.
            // Sprite is encoded as 8 pixels wide, N pixels high, stored in bits located in
            // memory pointed to by address register I.
            //
            // The origin wraps around the display, the body is clipped at the edges.
            //
            // If any pixel under the sprite was already lit, register VF is set to
            // 1, otherwise 0. This is used for collision detection. VF is cleared
            // before the coordinates are read.
            Opcode::Drw { x, y, n } => {
                self.check_memory(addr, n as usize)?;

                self.cpu.set_flag(false);
                let (vx, vy) = (self.cpu.reg(x), self.cpu.reg(y));

                let mut rows = [0u8; 0xF];
                for (r, row) in rows.iter_mut().enumerate().take(n as usize) {
                    *row = self.memory.read(addr + r);
                }

                let collision = self.display.draw_sprite(vx, vy, &rows[..n as usize]);
                self.cpu.set_flag(collision);
                Flow::Draw
            }
            // Fx33 (LD B, Vx)
            //
            // Store the binary-coded decimal representation of Vx
            // in the memory locations I, I+1, and I+2.
            #[rustfmt::skip]
            Opcode::LdBVx { x } => {
                self.check_memory(addr, 3)?;

                let vx = self.cpu.reg(x);
                self.memory.write(addr,     vx / 100);
                self.memory.write(addr + 1, vx / 10 % 10);
                self.memory.write(addr + 2, vx % 10);
                Flow::Ok
            }
            // Fx55 (LD [I], Vx)
            //
            // Store registers V0 through Vx in memory starting at location I.
            // I is left pointing past the last stored byte.
            Opcode::StoreRegs { x } => {
                let count = x as usize + 1;
                self.check_memory(addr, count)?;

                for v in 0..count {
                    self.memory.write(addr + v, self.cpu.registers[v]);
                }
                self.cpu.address = self.cpu.address.wrapping_add(count as Address);
                Flow::Ok
            }
            // Fx65 (LD Vx, [I])
            //
            // Read registers V0 through Vx from memory starting at location I.
            // I is left pointing past the last loaded byte.
            Opcode::LoadRegs { x } => {
                let count = x as usize + 1;
                self.check_memory(addr, count)?;

                for v in 0..count {
                    self.cpu.registers[v] = self.memory.read(addr + v);
                }
                self.cpu.address = self.cpu.address.wrapping_add(count as Address);
                Flow::Ok
            }
            _ => unreachable!("not a memory instruction: {op:?}"),
        };

        Ok(flow)
    }

    /// In strict mode, reject accesses that run past the end of memory.
    #[inline]
    fn check_memory(&self, address: usize, len: usize) -> Chip8Result<()> {
        if self.conf.strict && !Memory::in_bounds(address, len) {
            Err(Chip8Error::MemoryOutOfBounds {
                pc: self.cpu.pc,
                address,
            })
        } else {
            Ok(())
        }
    }

    /// Execute a miscellaneous instruction
    fn exec_misc(&mut self, op: Opcode) -> Flow {
        match op {
            // 3XNN (SE Vx, byte)
            //
            // Skip the next instruction if register VX equals value NN.
            Opcode::SeByte { x, nn } => {
                if self.cpu.reg(x) == nn {
                    self.skip();
                }
            }
            // 4XNN (SNE Vx, byte)
            //
            // Skip the next instruction if register VX does not equal value NN.
            Opcode::SneByte { x, nn } => {
                if self.cpu.reg(x) != nn {
                    self.skip();
                }
            }
            // 5XY0 (SE Vx, Vy)
            //
            // Skip the next instruction if register VX equals value VY.
            Opcode::SeReg { x, y } => {
                if self.cpu.reg(x) == self.cpu.reg(y) {
                    self.skip();
                }
            }
            // 6XNN (LD Vx, byte)
            //
            // Set register VX to value NN.
            Opcode::LdByte { x, nn } => {
                self.cpu.set_reg(x, nn);
            }
            // 7xnn (ADD Vx, byte)
            //
            // Add value NN to register VX. Carry flag is not set.
            Opcode::AddByte { x, nn } => {
                self.cpu.set_reg(x, self.cpu.reg(x).wrapping_add(nn));
            }
            // 9xyn (SNE Vx, Vy)
            //
            // Skip next instruction if Vx != Vy.
            // A non-zero last nibble is reported, but the comparison still happens.
            Opcode::SneReg { x, y, malformed } => {
                if malformed {
                    self.unknown_instruction();
                }
                if self.cpu.reg(x) != self.cpu.reg(y) {
                    self.skip();
                }
            }
            // Annn (LD I, addr)
            //
            // Set address register I to value NNN.
            Opcode::LdI { nnn } => {
                self.cpu.address = nnn;
            }
            // CXNN (RND Vx, byte)
            //
            // Generate random number.
            // Set register VX to the result of bitwise AND between a random number and NN.
            Opcode::Rnd { x, nn } => {
                let value = self.rng.gen::<u8>() & nn;
                trace!("random number is {value}");
                self.cpu.set_reg(x, value);
            }
            // Ex9E (SKP Vx)
            //
            // Skip next instruction if the key with the value of Vx is pressed.
            Opcode::Skp { x } => {
                if self.keys.is_pressed(self.cpu.reg(x)) {
                    self.skip();
                }
            }
            // ExA1 (SKNP Vx)
            Opcode::Sknp { x } => {
                if !self.keys.is_pressed(self.cpu.reg(x)) {
                    self.skip();
                }
            }
            // Fx07 (LD Vx, DT)
            //
            // Set Vx = delay timer value.
            Opcode::LdVxDt { x } => {
                self.cpu.set_reg(x, self.cpu.delay_timer);
            }
            // Fx0A (LD Vx, K)
            //
            // Wait for a key press, store the value of the key in Vx.
            // When no key is down the machine is suspended. The host keeps running
            // frames, which resolve the wait once a key is latched.
            Opcode::LdVxK { x } => match self.keys.first_pressed() {
                Some(key) => self.cpu.set_reg(x, key.as_u8()),
                None => {
                    debug!("waiting for key into V{x:X}");
                    self.cpu.mode = CpuMode::AwaitingKey(x);
                    return Flow::KeyWait;
                }
            },
            // Fx15 (LD DT, Vx)
            Opcode::LdDtVx { x } => {
                self.cpu.delay_timer = self.cpu.reg(x);
            }
            // Fx18 (LD ST, Vx)
            Opcode::LdStVx { x } => {
                self.cpu.sound_timer = self.cpu.reg(x);
                self.update_buzzer();
            }
            // Fx1E (ADD I, Vx)
            //
            // Add Vx to I. The result is not masked to 12 bits.
            Opcode::AddIVx { x } => {
                self.cpu.address = self.cpu.address.wrapping_add(self.cpu.reg(x) as Address);
            }
            // Fx29 (LD F, Vx)
            //
            // Set I = location of sprite for digit Vx.
            Opcode::LdFVx { x } => {
                let vx = self.cpu.reg(x) as Address;
                self.cpu.address = FONTSET_START + vx * FONTSET_HEIGHT as Address;
            }
            Opcode::Unknown(_) => self.unknown_instruction(),
            _ => unreachable!("not a misc instruction: {op:?}"),
        }

        Flow::Ok
    }

    /// Skip the next instruction.
    #[inline(always)]
    fn skip(&mut self) {
        self.cpu.pc = self.cpu.pc.wrapping_add(2);
    }

    fn unknown_instruction(&self) {
        let pc = self.cpu.pc as usize;
        debug!(
            "unknown instruction {:04X} at {:03X}",
            self.memory.read_word(pc),
            pc
        );
    }
}

/// Troubleshooting
#[doc(hidden)]
impl Chip8Vm {
    /// Returns the program area of memory as a human readable string.
    pub fn dump_ram(&self, count: usize) -> Result<String, fmt::Error> {
        let iter = self
            .memory
            .as_slice()
            .iter()
            .enumerate()
            .skip(MEM_START)
            .take(count)
            .step_by(2);
        let mut buf = String::new();

        for (i, op) in iter {
            writeln!(buf, "{:04X}: {:02X}{:02X}", i, op, self.memory.read(i + 1))?;
        }

        Ok(buf)
    }

    pub fn dump_display(&self) -> Result<String, fmt::Error> {
        self.display.dump()
    }

    pub fn dump_keys(&self) -> Result<String, fmt::Error> {
        let mut buf = String::new();

        if self.keys.any() {
            write!(buf, "keys:")?;
            for key in self.keys.iter_pressed() {
                write!(buf, " {key}")?;
            }
        }

        Ok(buf)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn vm_with(program: &[u8]) -> Chip8Vm {
        let mut vm = Chip8Vm::new(Chip8Conf {
            seed: Some(1),
            ..Chip8Conf::default()
        });
        vm.load_bytecode(program);
        vm
    }

    fn strict_vm_with(program: &[u8]) -> Chip8Vm {
        let mut vm = Chip8Vm::new(Chip8Conf {
            strict: true,
            ..Chip8Conf::default()
        });
        vm.load_bytecode(program);
        vm
    }

    const START: Address = MEM_START as Address;

    #[test]
    #[rustfmt::skip]
    fn test_load_register() {
        for nn in [0x00, 0x01, 0x7F, 0xFF] {
            let mut vm = vm_with(&[0x6A, nn]);
            assert_eq!(vm.step().unwrap(), Flow::Ok);
            assert_eq!(vm.cpu.registers[0xA], nn);
            assert_eq!(vm.cpu.pc, START + 2);
        }
    }

    #[test]
    fn test_add_byte_wraps_without_flag() {
        let mut vm = vm_with(&[
            0x60, 0xFF, // LD V0, 0xFF
            0x6F, 0x07, // LD VF, 0x07
            0x70, 0x02, // ADD V0, 0x02
        ]);
        vm.run_steps(3).unwrap();
        assert_eq!(vm.cpu.registers[0], 0x01);
        assert_eq!(vm.cpu.registers[0xF], 0x07);
    }

    #[test]
    fn test_jump() {
        let mut vm = vm_with(&[0x1A, 0xBC]);
        assert_eq!(vm.step().unwrap(), Flow::Jump);
        assert_eq!(vm.cpu.pc, 0xABC);
    }

    #[test]
    #[rustfmt::skip]
    fn test_call_return() {
        let mut vm = vm_with(&[
            0x22, 0x06, // 0x200 CALL 0x206
            0x61, 0x01, // 0x202 LD V1, 1  ; after return
            0x12, 0x04, // 0x204 JP 0x204
            0x00, 0xEE, // 0x206 RET
        ]);

        assert_eq!(vm.step().unwrap(), Flow::Jump);
        assert_eq!(vm.cpu.pc, 0x206);
        assert_eq!(vm.cpu.sp, 1);

        assert_eq!(vm.step().unwrap(), Flow::Jump);
        assert_eq!(vm.cpu.pc, 0x202);
        assert_eq!(vm.cpu.sp, 0);

        vm.step().unwrap();
        assert_eq!(vm.cpu.registers[1], 1);
    }

    #[test]
    #[rustfmt::skip]
    fn test_skips() {
        let mut vm = vm_with(&[
            0x60, 0x05, // LD V0, 5
            0x30, 0x05, // SE V0, 5     ; skip
            0x00, 0x00,
            0x40, 0x05, // SNE V0, 5    ; no skip
            0x61, 0x05, // LD V1, 5
            0x50, 0x10, // SE V0, V1    ; skip
            0x00, 0x00,
            0x90, 0x10, // SNE V0, V1   ; no skip
        ]);

        vm.step().unwrap();
        vm.step().unwrap();
        assert_eq!(vm.cpu.pc, START + 6);
        vm.step().unwrap();
        assert_eq!(vm.cpu.pc, START + 8);
        vm.step().unwrap();
        vm.step().unwrap();
        assert_eq!(vm.cpu.pc, START + 14);
        vm.step().unwrap();
        assert_eq!(vm.cpu.pc, START + 16);
    }

    #[test]
    fn test_malformed_se_reg_is_noop() {
        // 5XY1 is unknown, registers equal but no skip happens
        let mut vm = vm_with(&[0x50, 0x11]);
        vm.step().unwrap();
        assert_eq!(vm.cpu.pc, START + 2);
    }

    #[test]
    fn test_malformed_sne_reg_still_skips() {
        let mut vm = vm_with(&[
            0x60, 0x01, // LD V0, 1
            0x90, 0x1F, // SNE V0, V1 with a non-zero tail
        ]);
        vm.run_steps(2).unwrap();
        assert_eq!(vm.cpu.pc, START + 6);
    }

    #[test]
    fn test_unknown_opcode_advances() {
        let mut vm = vm_with(&[0xFF, 0xFF, 0x01, 0x23]);
        assert_eq!(vm.step().unwrap(), Flow::Ok);
        assert_eq!(vm.step().unwrap(), Flow::Ok);
        assert_eq!(vm.cpu.pc, START + 4);
        assert!(vm.cpu.registers.iter().all(|v| *v == 0));
    }

    #[test]
    fn test_logic_resets_flag() {
        for (op, expected) in [(0x01, 0b1110), (0x02, 0b1000), (0x03, 0b0110)] {
            let mut vm = vm_with(&[
                0x60, 0b1100, // LD V0
                0x61, 0b1010, // LD V1
                0x6F, 0x01, // LD VF, 1
                0x80, 0x10 | op,
            ]);
            vm.run_steps(4).unwrap();
            assert_eq!(vm.cpu.registers[0], expected);
            assert_eq!(vm.cpu.registers[0xF], 0);
        }
    }

    #[test]
    fn test_logic_keeps_flag_when_configured() {
        let mut vm = Chip8Vm::new(Chip8Conf {
            logic_resets_flag: false,
            ..Chip8Conf::default()
        });
        vm.load_bytecode(&[
            0x6F, 0x01, // LD VF, 1
            0x80, 0x11, // OR V0, V1
        ]);
        vm.run_steps(2).unwrap();
        assert_eq!(vm.cpu.registers[0xF], 1);
    }

    #[test]
    fn test_add_reg_carry() {
        let mut vm = vm_with(&[0x60, 0xFF, 0x61, 0x01, 0x80, 0x14]);
        vm.run_steps(3).unwrap();
        assert_eq!(vm.cpu.registers[0], 0x00);
        assert_eq!(vm.cpu.registers[0xF], 1);

        let mut vm = vm_with(&[0x60, 0x01, 0x61, 0x01, 0x6F, 0x01, 0x80, 0x14]);
        vm.run_steps(4).unwrap();
        assert_eq!(vm.cpu.registers[0], 0x02);
        assert_eq!(vm.cpu.registers[0xF], 0);
    }

    #[test]
    fn test_sub_borrow() {
        // 5 - 3
        let mut vm = vm_with(&[0x60, 0x05, 0x61, 0x03, 0x80, 0x15]);
        vm.run_steps(3).unwrap();
        assert_eq!(vm.cpu.registers[0], 2);
        assert_eq!(vm.cpu.registers[0xF], 1);

        // 3 - 5
        let mut vm = vm_with(&[0x60, 0x03, 0x61, 0x05, 0x80, 0x15]);
        vm.run_steps(3).unwrap();
        assert_eq!(vm.cpu.registers[0], 0xFE);
        assert_eq!(vm.cpu.registers[0xF], 0);

        // equal values do not set the flag
        let mut vm = vm_with(&[0x60, 0x04, 0x61, 0x04, 0x80, 0x15]);
        vm.run_steps(3).unwrap();
        assert_eq!(vm.cpu.registers[0], 0);
        assert_eq!(vm.cpu.registers[0xF], 0);
    }

    #[test]
    fn test_subn() {
        // V0 := V1 - V0 = 5 - 3
        let mut vm = vm_with(&[0x60, 0x03, 0x61, 0x05, 0x80, 0x17]);
        vm.run_steps(3).unwrap();
        assert_eq!(vm.cpu.registers[0], 2);
        assert_eq!(vm.cpu.registers[0xF], 1);

        // V0 := V1 - V0 = 3 - 5
        let mut vm = vm_with(&[0x60, 0x05, 0x61, 0x03, 0x80, 0x17]);
        vm.run_steps(3).unwrap();
        assert_eq!(vm.cpu.registers[0], 0xFE);
        assert_eq!(vm.cpu.registers[0xF], 0);
    }

    #[test]
    fn test_shift_reads_vy() {
        // SHR V0, V1 with V1 = 0b11
        let mut vm = vm_with(&[0x60, 0xF0, 0x61, 0b11, 0x80, 0x16]);
        vm.run_steps(3).unwrap();
        assert_eq!(vm.cpu.registers[0], 0b1);
        assert_eq!(vm.cpu.registers[1], 0b11);
        assert_eq!(vm.cpu.registers[0xF], 1);

        // SHL V0, V1 with V1 = 0b1000_0001
        let mut vm = vm_with(&[0x61, 0x81, 0x80, 0x1E]);
        vm.run_steps(2).unwrap();
        assert_eq!(vm.cpu.registers[0], 0b10);
        assert_eq!(vm.cpu.registers[0xF], 1);

        // SHL without carry
        let mut vm = vm_with(&[0x61, 0x01, 0x6F, 0x01, 0x80, 0x1E]);
        vm.run_steps(3).unwrap();
        assert_eq!(vm.cpu.registers[0], 0b10);
        assert_eq!(vm.cpu.registers[0xF], 0);
    }

    #[test]
    fn test_add_reg_with_flag_operand() {
        // ADD VF, V1: sum lands in VF, then the carry check sees VF cleared
        let mut vm = vm_with(&[0x6F, 0x10, 0x61, 0x01, 0x8F, 0x14]);
        vm.run_steps(3).unwrap();
        assert_eq!(vm.cpu.registers[0xF], 1);

        // ADD V0, VF: 0x01 + 0xFF wraps, flag compared against cleared VF
        let mut vm = vm_with(&[0x60, 0x01, 0x6F, 0xFF, 0x80, 0xF4]);
        vm.run_steps(3).unwrap();
        assert_eq!(vm.cpu.registers[0], 0x00);
        assert_eq!(vm.cpu.registers[0xF], 0);
    }

    #[test]
    fn test_sub_with_flag_operand() {
        // SUB V0, VF: compares against cleared VF, subtracts the new flag
        let mut vm = vm_with(&[0x60, 0x05, 0x6F, 0x03, 0x80, 0xF5]);
        vm.run_steps(3).unwrap();
        assert_eq!(vm.cpu.registers[0], 4);
        assert_eq!(vm.cpu.registers[0xF], 1);

        // SUB VF, V1: result overwrites the flag
        let mut vm = vm_with(&[0x6F, 0x10, 0x61, 0x03, 0x8F, 0x15]);
        vm.run_steps(3).unwrap();
        assert_eq!(vm.cpu.registers[0xF], 0xFD);

        // SUBN V0, VF: 0 - 3
        let mut vm = vm_with(&[0x60, 0x03, 0x6F, 0x0A, 0x80, 0xF7]);
        vm.run_steps(3).unwrap();
        assert_eq!(vm.cpu.registers[0], 0xFD);
        assert_eq!(vm.cpu.registers[0xF], 0);
    }

    #[test]
    fn test_shift_with_flag_operand() {
        // SHR V0, VF shifts the cleared flag
        let mut vm = vm_with(&[0x60, 0xAA, 0x6F, 0x06, 0x80, 0xF6]);
        vm.run_steps(3).unwrap();
        assert_eq!(vm.cpu.registers[0], 0);
        assert_eq!(vm.cpu.registers[0xF], 0);

        // SHL V0, VF
        let mut vm = vm_with(&[0x60, 0xAA, 0x6F, 0x81, 0x80, 0xFE]);
        vm.run_steps(3).unwrap();
        assert_eq!(vm.cpu.registers[0], 0);
        assert_eq!(vm.cpu.registers[0xF], 0);
    }

    #[test]
    #[rustfmt::skip]
    fn test_draw_with_flag_coordinate() {
        let mut vm = vm_with(&[
            0x6F, 0x05, // LD VF, 5
            0x61, 0x00, // LD V1, 0
            0xA2, 0x0A, // LD I, 0x20A
            0xDF, 0x11, // DRW VF, V1, 1
            0x12, 0x08, // JP 0x208
            0x80, 0x00, // sprite
        ]);
        vm.run_steps(4).unwrap();

        // x is read after VF is cleared
        assert!(vm.display.get(0, 0));
        assert!(!vm.display.get(5, 0));
        assert_eq!(vm.cpu.registers[0xF], 0);
    }

    #[test]
    fn test_load_index_and_jump_offset() {
        let mut vm = vm_with(&[
            0xA1, 0x23, // LD I, 0x123
            0x60, 0x10, // LD V0, 0x10
            0xB3, 0x00, // JP V0, 0x300
        ]);
        vm.run_steps(3).unwrap();
        assert_eq!(vm.cpu.address, 0x123);
        assert_eq!(vm.cpu.pc, 0x310);
    }

    #[test]
    fn test_random_masked() {
        let mut vm = vm_with(&[0xC0, 0x00, 0xC1, 0x0F]);
        vm.run_steps(2).unwrap();
        assert_eq!(vm.cpu.registers[0], 0);
        assert_eq!(vm.cpu.registers[1] & 0xF0, 0);
    }

    #[test]
    fn test_random_seeded() {
        let program = [0xC0, 0xFF, 0xC1, 0xFF, 0xC2, 0xFF];
        let mut a = vm_with(&program);
        let mut b = vm_with(&program);
        a.run_steps(3).unwrap();
        b.run_steps(3).unwrap();
        assert_eq!(a.cpu.registers, b.cpu.registers);
    }

    #[test]
    #[rustfmt::skip]
    fn test_draw_twice_collides() {
        let mut vm = vm_with(&[
            0xA2, 0x08, // LD I, 0x208
            0xD0, 0x01, // DRW V0, V0, 1
            0xD0, 0x01, // DRW V0, V0, 1
            0x12, 0x06, // JP 0x206
            0xFF, 0x00, // sprite
        ]);

        vm.run_steps(2).unwrap();
        assert!((0..8).all(|x| vm.display.get(x, 0)));
        assert_eq!(vm.cpu.registers[0xF], 0);

        assert_eq!(vm.step().unwrap(), Flow::Draw);
        assert!(vm.display.as_slice().iter().all(|px| !px));
        assert_eq!(vm.cpu.registers[0xF], 1);
    }

    #[test]
    fn test_draw_font_glyph() {
        let mut vm = vm_with(&[
            0x60, 0x0A, // LD V0, 0xA
            0xF0, 0x29, // LD F, V0
            0x61, 0x00, // LD V1, 0
            0xD1, 0x15, // DRW V1, V1, 5
        ]);
        vm.run_steps(4).unwrap();

        assert_eq!(vm.cpu.address, 0x50 + 0xA * 5);
        let dump = vm.dump_display().unwrap();
        let rows: Vec<&str> = dump.lines().take(5).map(|l| &l[..4]).collect();
        assert_eq!(rows, vec!["####", "#..#", "####", "#..#", "#..#"]);
    }

    #[test]
    fn test_clear_screen() {
        let mut vm = vm_with(&[
            0xF0, 0x29, // LD F, V0
            0xD0, 0x05, // DRW V0, V0, 5
            0x00, 0xE0, // CLS
        ]);
        vm.run_steps(2).unwrap();
        assert!(vm.display.iter_lit().count() > 0);
        assert_eq!(vm.step().unwrap(), Flow::Draw);
        assert!(vm.display.as_slice().iter().all(|px| !px));
    }

    #[test]
    fn test_bcd() {
        for (value, digits) in [(255, [2, 5, 5]), (0, [0, 0, 0]), (109, [1, 0, 9])] {
            let mut vm = vm_with(&[
                0xA3, 0x00, // LD I, 0x300
                0x65, value, // LD V5, value
                0xF5, 0x33, // LD B, V5
            ]);
            vm.run_steps(3).unwrap();
            assert_eq!(vm.memory.read(0x300), digits[0]);
            assert_eq!(vm.memory.read(0x301), digits[1]);
            assert_eq!(vm.memory.read(0x302), digits[2]);
            assert_eq!(vm.cpu.address, 0x300);
        }
    }

    #[test]
    #[rustfmt::skip]
    fn test_store_and_load_registers() {
        let mut vm = vm_with(&[
            0x60, 0x11, // LD V0, 0x11
            0x61, 0x22, // LD V1, 0x22
            0x62, 0x33, // LD V2, 0x33
            0xA4, 0x00, // LD I, 0x400
            0xF2, 0x55, // LD [I], V2
        ]);
        vm.run_steps(5).unwrap();
        assert_eq!(&vm.memory.as_slice()[0x400..0x404], &[0x11, 0x22, 0x33, 0x00]);
        assert_eq!(vm.cpu.address, 0x403);

        let mut vm = vm_with(&[
            0xA2, 0x06, // LD I, 0x206
            0xF1, 0x65, // LD V1, [I]
            0x12, 0x04, // JP 0x204
            0xAB, 0xCD, // data
        ]);
        vm.run_steps(2).unwrap();
        assert_eq!(vm.cpu.registers[0], 0xAB);
        assert_eq!(vm.cpu.registers[1], 0xCD);
        assert_eq!(vm.cpu.address, 0x208);
    }

    #[test]
    fn test_add_index_unmasked() {
        let mut vm = vm_with(&[
            0xAF, 0xFF, // LD I, 0xFFF
            0x60, 0x02, // LD V0, 2
            0xF0, 0x1E, // ADD I, V0
        ]);
        vm.run_steps(3).unwrap();
        assert_eq!(vm.cpu.address, 0x1001);
    }

    #[test]
    fn test_timer_registers() {
        let mut vm = vm_with(&[
            0x60, 0x09, // LD V0, 9
            0xF0, 0x15, // LD DT, V0
            0xF0, 0x18, // LD ST, V0
            0xF1, 0x07, // LD V1, DT
        ]);
        vm.run_steps(4).unwrap();
        assert_eq!(vm.cpu.delay_timer, 9);
        assert_eq!(vm.cpu.sound_timer, 9);
        assert_eq!(vm.cpu.registers[1], 9);
        assert!(vm.buzzer());
    }

    #[test]
    fn test_key_skips() {
        let program = [
            0x60, 0x07, // LD V0, 7
            0xE0, 0x9E, // SKP V0
            0x00, 0x00, //
            0xE0, 0xA1, // SKNP V0
        ];

        let mut vm = vm_with(&program);
        vm.set_key(KeyCode::Key7, true);
        vm.run_steps(2).unwrap();
        assert_eq!(vm.cpu.pc, START + 6);
        vm.step().unwrap();
        assert_eq!(vm.cpu.pc, START + 8);

        let mut vm = vm_with(&program);
        vm.run_steps(2).unwrap();
        assert_eq!(vm.cpu.pc, START + 4);
        vm.step().unwrap();
        vm.step().unwrap();
        assert_eq!(vm.cpu.pc, START + 10);
    }

    /// Fx0A (LD Vx, K)
    ///
    /// Wait for a keypress, then store the key value in Vx.
    /// The VM must stall while waiting, and signal the state to the outer executer.
    #[test]
    #[rustfmt::skip]
    fn test_key_wait() {
        let mut vm = vm_with(&[
            0xF1, 0x0A, // LD v1, K
            0x62, 0x42  // LD v2, 0x42  ; sentinal
        ]);

        // machine must stall
        assert_eq!(vm.frame(Keypad::new(), 0.0).unwrap(), Flow::KeyWait);
        assert_eq!(vm.cpu.mode, CpuMode::AwaitingKey(1));
        for _ in 0..5 {
            assert_eq!(vm.frame(Keypad::new(), 0.0).unwrap(), Flow::KeyWait);
            assert_eq!(vm.step().unwrap(), Flow::KeyWait);
        }
        assert_eq!(vm.cpu.pc, START + 2);

        // the frame that sees the key resolves the wait without executing
        assert_eq!(vm.frame(KeyCode::Key5.into(), 0.0).unwrap(), Flow::Ok);
        assert_eq!(vm.cpu.mode, CpuMode::Running);
        assert_eq!(vm.cpu.registers[1], 0x05);
        assert_eq!(vm.cpu.pc, START + 2);

        // Ensure the machine is continuing
        vm.frame(Keypad::new(), 0.0).unwrap();
        assert_eq!(vm.cpu.pc, START + 4);
        assert_eq!(vm.cpu.registers[2], 0x42); // sentinal
    }

    #[test]
    fn test_key_wait_with_key_down() {
        let mut vm = vm_with(&[0xF3, 0x0A]);
        vm.set_key(KeyCode::KeyB, true);
        vm.set_key(KeyCode::KeyE, true);
        assert_eq!(vm.step().unwrap(), Flow::Ok);
        assert_eq!(vm.cpu.registers[3], 0xB);
        assert_eq!(vm.cpu.mode, CpuMode::Running);
    }

    #[test]
    fn test_timers_paused_during_key_wait() {
        let mut vm = vm_with(&[
            0x60, 0x05, // LD V0, 5
            0xF0, 0x15, // LD DT, V0
            0xF1, 0x0A, // LD V1, K
        ]);
        vm.frame(Keypad::new(), 0.0).unwrap();
        vm.frame(Keypad::new(), 0.0).unwrap();
        assert_eq!(vm.cpu.delay_timer, 5);

        assert_eq!(vm.frame(Keypad::new(), 0.0).unwrap(), Flow::KeyWait);
        for _ in 0..3 {
            vm.frame(Keypad::new(), TIMER_PERIOD_MS).unwrap();
        }
        assert_eq!(vm.cpu.delay_timer, 5);

        // time spent waiting is applied one period per frame afterwards
        vm.frame(KeyCode::Key0.into(), 0.0).unwrap();
        assert_eq!(vm.cpu.delay_timer, 4);
        vm.tick_timers(0.0);
        vm.tick_timers(0.0);
        assert_eq!(vm.cpu.delay_timer, 2);
        vm.tick_timers(0.0);
        assert_eq!(vm.cpu.delay_timer, 2);
    }

    #[test]
    fn test_timers_run_during_key_wait_when_configured() {
        let mut vm = Chip8Vm::new(Chip8Conf {
            key_wait_timers: true,
            ..Chip8Conf::default()
        });
        vm.load_bytecode(&[0x60, 0x05, 0xF0, 0x15, 0xF1, 0x0A]);
        vm.run_steps(3).unwrap();
        assert_eq!(vm.cpu.mode, CpuMode::AwaitingKey(1));

        vm.frame(Keypad::new(), TIMER_PERIOD_MS).unwrap();
        vm.frame(Keypad::new(), TIMER_PERIOD_MS).unwrap();
        assert_eq!(vm.cpu.delay_timer, 3);
    }

    #[test]
    fn test_sound_timer_counts_down() {
        let mut vm = vm_with(&[0x60, 0x02, 0xF0, 0x18]);
        vm.run_steps(2).unwrap();
        assert!(vm.buzzer());

        vm.tick_timers(TIMER_PERIOD_MS);
        vm.tick_timers(TIMER_PERIOD_MS);
        vm.tick_timers(TIMER_PERIOD_MS);
        assert_eq!(vm.cpu.sound_timer, 0);
        assert!(!vm.buzzer());
    }

    #[test]
    fn test_stack_wraps_by_default() {
        // CALL 0x200 recursively, 20 levels deep
        let mut vm = vm_with(&[0x22, 0x00]);
        vm.run_steps(20).unwrap();
        assert_eq!(vm.cpu.sp, 20);
        assert_eq!(vm.cpu.pc, START);

        // RET with an empty stack pops slot zero and wraps the pointer
        let mut vm = vm_with(&[0x00, 0xEE]);
        assert_eq!(vm.step().unwrap(), Flow::Jump);
        assert_eq!(vm.cpu.pc, 2);
        assert_eq!(vm.cpu.sp, 0xFF);
    }

    #[test]
    fn test_strict_stack_overflow() {
        let mut vm = strict_vm_with(&[0x22, 0x00]);
        vm.run_steps(15).unwrap();
        let err = vm.step().unwrap_err();
        assert!(matches!(err, Chip8Error::StackOverflow { pc: 0x200 }));
    }

    #[test]
    fn test_strict_stack_underflow() {
        let mut vm = strict_vm_with(&[0x00, 0xEE]);
        assert!(matches!(
            vm.step(),
            Err(Chip8Error::StackUnderflow { pc: 0x200 })
        ));
    }

    #[test]
    fn test_strict_memory_bounds() {
        let mut vm = strict_vm_with(&[
            0xAF, 0xFE, // LD I, 0xFFE
            0xF0, 0x33, // LD B, V0
        ]);
        vm.step().unwrap();
        assert!(matches!(
            vm.step(),
            Err(Chip8Error::MemoryOutOfBounds {
                address: 0xFFE,
                ..
            })
        ));

        // the same access wraps around in compatibility mode
        let mut vm = vm_with(&[0xAF, 0xFE, 0x60, 0x7B, 0xF0, 0x33]);
        vm.run_steps(3).unwrap();
        assert_eq!(vm.memory.read(0xFFE), 1);
        assert_eq!(vm.memory.read(0xFFF), 2);
        assert_eq!(vm.memory.read(0x000), 3);
    }

    #[test]
    fn test_strict_pc_bounds() {
        let mut vm = strict_vm_with(&[0x1F, 0xFF]);
        vm.step().unwrap();
        assert!(matches!(
            vm.step(),
            Err(Chip8Error::MemoryOutOfBounds { pc: 0xFFF, .. })
        ));
    }

    #[test]
    fn test_reload_resets_state() {
        let mut vm = vm_with(&[0x60, 0x05, 0xD0, 0x05]);
        vm.run_steps(2).unwrap();

        vm.load_bytecode(&[0x00, 0xE0]);
        assert_eq!(vm.cpu.pc, START);
        assert_eq!(vm.cpu.registers[0], 0);
        assert_eq!(vm.display.iter_lit().count(), 0);
        assert_eq!(vm.memory.read(0x202), 0);
        assert_eq!(vm.memory.read(0x50), 0xF0);
    }

    #[test]
    fn test_dumps() {
        let mut vm = vm_with(&[0x60, 0x05, 0x70, 0x03]);
        assert_eq!(vm.dump_ram(4).unwrap(), "0200: 6005\n0202: 7003\n");

        assert_eq!(vm.dump_keys().unwrap(), "");
        vm.set_key(KeyCode::Key1, true);
        vm.set_key(KeyCode::KeyF, true);
        assert_eq!(vm.dump_keys().unwrap(), "keys: k1 kf");

        vm.clear_keys();
        assert!(!vm.keys().any());
    }
}
