//! An implementation of the CHIP 8 interpreter in Rust
//!
//! # Interpreter
//! * 4096 (0x1000) bytes of memory
//! * the interpreter used to live in the first 512 (0x200) bytes, now it only
//! holds the hex font set
//! * programs are loaded at 0x200 and may run up to 0xFFF
//! * 16 8-bit registers: V0 - VF
//! * VF is the carry flag in addition operations, "no borrow" flag in subtraction,
//! the shifted out bit in shift operations and the pixel collision flag in the draw
//! operation
//! * the address register I is 16 bits wide
//! * the stack is only used to store return addresses when subroutines are called
//!
//! # Timers
//! * two timers counting down at 60 hertz
//!  - delay timer is used for events, it can be set and read
//!  - sound timer requests a tone when it runs out
//!
//! # Input
//! there is a 16 symbol hex keyboard with values 0 - F. There are 3 opcode that deal with handling input
//!  - one skips an instruction if a specific key is pressed
//!  - one skips an instruction if a specific key is NOT pressed
//!  - waits for a key press and stores it in a register once it detects it
//!
//! # Graphics
//! 64x32 pixels
use std::convert::TryFrom;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use slog::{debug, info, o, trace, warn, Logger};

pub mod config;
pub mod error;
pub mod graphics;
pub mod host;
pub mod keyboard;
pub mod logger;
pub mod op;
#[cfg(feature = "window")]
pub mod window;


pub use crate::config::{Args, Config};
pub use crate::error::{Chip8Error, Result};
pub use crate::graphics::{Graphics, HEIGHT, WIDTH};
pub use crate::host::{Due, Frontend, Pacer, RunStats, Runner};
pub use crate::keyboard::{AsKeyboard, Key, Keyboard};
pub use crate::op::Op;

use crate::graphics::{FONT_SET, NUM_BYTES_IN_FONT_CHAR};

pub const MEMORY_SIZE: usize = 4096;
/// programs are loaded here, and execution starts here
pub const STARTING_MEMORY_BYTE: usize = 0x200;
/// the largest program that fits between STARTING_MEMORY_BYTE and the end of memory
pub const MAX_ROM_SIZE: usize = MEMORY_SIZE - STARTING_MEMORY_BYTE;
pub const STACK_DEPTH: usize = 16;
pub const NUM_REGISTERS: usize = 16;
/// where the font set is installed
pub const FONT_START: usize = 0x000;
/// FX29 computes glyph addresses from here, so the font set is mirrored at this address
pub const FONT_SPRITE_BASE: u16 = 0x050;

const FLAG: usize = 0xF;

/// The CHIP-8 machine state along with the interpreter that runs on it
pub struct Emulator {
    pub(crate) memory: [u8; MEMORY_SIZE], // 4k of RAM

    pub(crate) stack: [u16; STACK_DEPTH], // return addresses of the active subroutine calls
    pub(crate) sp: usize,                 // number of used stack slots

    pub(crate) addr: u16, // address register I
    pub(crate) pc: u16,   // program counter

    // 16 8-bit registers. VF is used as a flag by several of the opcodes (see @Op)
    pub(crate) v: [u8; NUM_REGISTERS],

    pub(crate) graphics: Graphics, // 64x32 pixel monochrome screen
    pub(crate) redraw: bool,       // set when graphics changed since the last frame was taken

    pub(crate) delay_timer: u8, // 60 Hz timer that can be set and read
    pub(crate) sound_timer: u8, // 60 Hz timer that requests a tone when it runs out

    pub(crate) keyboard: Keyboard,

    rng: StdRng,
    logger: Logger,
}

impl Emulator {
    /// Create a freshly reset Emulator. With no logger, log records are dropped.
    /// The random number generator is seeded from the OS
    pub fn new(logger: Option<Logger>) -> Self {
        Emulator::with_rng(logger, StdRng::from_entropy())
    }

    /// Create an Emulator whose CXNN instruction produces a reproducible sequence
    pub fn with_seed(logger: Option<Logger>, seed: u64) -> Self {
        Emulator::with_rng(logger, StdRng::seed_from_u64(seed))
    }

    fn with_rng(logger: Option<Logger>, rng: StdRng) -> Self {
        let logger = logger.unwrap_or_else(crate::logger::discard);
        let mut emulator = Emulator {
            memory: [0; MEMORY_SIZE],
            stack: [0; STACK_DEPTH],
            sp: 0,
            addr: 0,
            pc: STARTING_MEMORY_BYTE as u16,
            v: [0; NUM_REGISTERS],
            graphics: Graphics::new(),
            redraw: true,
            delay_timer: 0,
            sound_timer: 0,
            keyboard: Keyboard::new(),
            rng,
            logger: logger.new(o!("component" => "interpreter")),
        };
        emulator.reset();
        emulator
    }

    /// Read the ROM at `path` and return a reset Emulator with that ROM loaded.
    /// At most one byte past the largest program is read from the file
    pub fn with_game_file<P: AsRef<Path>>(path: P, logger: Option<Logger>) -> Result<Self> {
        let path = path.as_ref();
        let unreadable = |source: std::io::Error| Chip8Error::RomUnreadable {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(unreadable)?;
        let size = file.metadata().map_err(unreadable)?.len();
        if size > MAX_ROM_SIZE as u64 {
            return Err(Chip8Error::RomTooLarge {
                size: size as usize,
                max: MAX_ROM_SIZE,
            });
        }

        // device files report a length of 0, so the read itself is bounded too
        let mut rom = Vec::with_capacity(MAX_ROM_SIZE);
        file.take(MAX_ROM_SIZE as u64 + 1)
            .read_to_end(&mut rom)
            .map_err(unreadable)?;

        let mut emulator = Emulator::new(logger);
        emulator.load_program(&rom)?;
        Ok(emulator)
    }

    /// Zero all machine state, install the font set and point the program counter
    /// at the start of program memory. The key states are left alone, they belong
    /// to the input side
    pub fn reset(&mut self) {
        self.memory = [0; MEMORY_SIZE];
        for base in &[FONT_START, FONT_SPRITE_BASE as usize] {
            for (i, glyph) in FONT_SET.iter().enumerate() {
                let start = base + i * NUM_BYTES_IN_FONT_CHAR as usize;
                self.memory[start..start + glyph.len()].copy_from_slice(glyph);
            }
        }

        self.stack = [0; STACK_DEPTH];
        self.sp = 0;
        self.addr = 0;
        self.pc = STARTING_MEMORY_BYTE as u16;
        self.v = [0; NUM_REGISTERS];
        self.graphics.clear();
        self.redraw = true;
        self.delay_timer = 0;
        self.sound_timer = 0;
    }

    /// Copy `rom` into program memory starting at 0x200. Nothing is written if
    /// the ROM is empty or doesn't fit
    pub fn load_program(&mut self, rom: &[u8]) -> Result<()> {
        if rom.is_empty() {
            return Err(Chip8Error::RomEmpty);
        }
        if rom.len() > MAX_ROM_SIZE {
            return Err(Chip8Error::RomTooLarge {
                size: rom.len(),
                max: MAX_ROM_SIZE,
            });
        }

        let end = STARTING_MEMORY_BYTE + rom.len();
        self.memory[STARTING_MEMORY_BYTE..end].copy_from_slice(rom);
        info!(self.logger, "loaded program"; "bytes" => rom.len());
        Ok(())
    }

    /// Run one fetch-decode-execute cycle and return the Op that ran.
    ///
    /// The program counter moves past the instruction before it executes. An
    /// instruction that can't be decoded, or a call/return that would overflow or
    /// underflow the stack, is skipped and reported as an error; the Emulator can
    /// keep stepping afterwards
    pub fn step(&mut self) -> Result<Op> {
        let pc = self.pc;
        let instr = self.fetch();
        self.pc = self.pc.wrapping_add(2);

        let op = match Op::try_from(instr) {
            Ok(op) => op,
            Err(e) => {
                warn!(self.logger, "skipping unknown instruction"; "pc" => pc, "opcode" => format!("{:#06X}", instr));
                return Err(e);
            }
        };
        trace!(self.logger, "execute"; "pc" => pc, "op" => %op);

        self.execute(op).map(|_| op)
    }

    /// The 16 bit instruction word at the program counter
    fn fetch(&self) -> u16 {
        let hi = u16::from(self.memory[mem_idx(self.pc)]);
        let lo = u16::from(self.memory[mem_idx(self.pc.wrapping_add(1))]);
        (hi << 8) | lo
    }

    /// Apply `op` to the machine state. Expects the program counter to already
    /// point past the instruction. Operands are masked to the widths an
    /// instruction word can encode
    pub fn execute(&mut self, op: Op) -> Result<()> {
        match op.masked() {
            Op::DispClear => {
                self.graphics.clear();
                self.redraw = true;
            }
            Op::Return => {
                if self.sp == 0 {
                    let pc = self.pc.wrapping_sub(2);
                    warn!(self.logger, "return with empty stack ignored"; "pc" => pc);
                    return Err(Chip8Error::StackUnderflow { pc });
                }
                self.sp -= 1;
                self.pc = self.stack[self.sp];
            }
            Op::Goto(addr) => self.pc = addr,
            Op::GotoSubRtn(addr) => {
                if self.sp == STACK_DEPTH {
                    let pc = self.pc.wrapping_sub(2);
                    warn!(self.logger, "call with full stack ignored"; "pc" => pc, "target" => addr);
                    return Err(Chip8Error::StackOverflow { pc });
                }
                self.stack[self.sp] = self.pc;
                self.sp += 1;
                self.pc = addr;
            }
            Op::CondVxEq(x, nn) => self.skip_if(self.v[x as usize] == nn),
            Op::CondVxNe(x, nn) => self.skip_if(self.v[x as usize] != nn),
            Op::CondVxVyEq(x, y) => self.skip_if(self.v[x as usize] == self.v[y as usize]),
            Op::ConstSetVx(x, nn) => self.v[x as usize] = nn,
            Op::ConstAddVx(x, nn) => {
                self.v[x as usize] = self.v[x as usize].wrapping_add(nn);
            }
            Op::AssignVyToVx(x, y) => self.v[x as usize] = self.v[y as usize],
            Op::BitOpOr(x, y) => {
                self.v[x as usize] |= self.v[y as usize];
                self.v[FLAG] = 0;
            }
            Op::BitOpAnd(x, y) => {
                self.v[x as usize] &= self.v[y as usize];
                self.v[FLAG] = 0;
            }
            Op::BitOpXor(x, y) => {
                self.v[x as usize] ^= self.v[y as usize];
                self.v[FLAG] = 0;
            }
            Op::MathVxAddVy(x, y) => {
                // the flag is written before the sum, so with X or Y = F the sum sees the new flag
                let (x, y) = (x as usize, y as usize);
                self.v[FLAG] = (self.v[y] > 0xFF - self.v[x]) as u8;
                self.v[x] = self.v[x].wrapping_add(self.v[y]);
            }
            Op::MathVxMinusVy(x, y) => {
                let (x, y) = (x as usize, y as usize);
                self.v[FLAG] = (self.v[x] >= self.v[y]) as u8;
                self.v[x] = self.v[x].wrapping_sub(self.v[y]);
            }
            Op::BitOpRtShift(x, y) => {
                // VF comes from the shifted value now in VX, not from the bit shifted out
                let (x, y) = (x as usize, y as usize);
                self.v[x] = self.v[y] >> 1;
                self.v[FLAG] = self.v[x] & 1;
            }
            Op::MathVyMinusVx(x, y) => {
                let (x, y) = (x as usize, y as usize);
                self.v[FLAG] = (self.v[y] > self.v[x]) as u8;
                self.v[x] = self.v[y].wrapping_sub(self.v[x]);
            }
            Op::BitOpLftShift(x, y) => {
                let (x, y) = (x as usize, y as usize);
                self.v[x] = self.v[y] << 1;
                self.v[FLAG] = self.v[x] >> 7;
            }
            Op::CondVxVyNe(x, y) => self.skip_if(self.v[x as usize] != self.v[y as usize]),
            Op::MemSetI(addr) => self.addr = addr,
            Op::GotoPlusV0(addr) => self.pc = u16::from(self.v[0]) + addr,
            Op::Rand(x, nn) => {
                let byte: u8 = self.rng.gen();
                self.v[x as usize] = byte & nn;
            }
            Op::DispDraw(x, y, n) => self.draw(x, y, n),
            Op::KeyOpEqVx(x) => {
                let key = self.v[x as usize] as usize;
                self.skip_if(self.keyboard.get_key_state(key));
            }
            Op::KeyOpNeVx(x) => {
                let key = self.v[x as usize] as usize;
                self.skip_if(!self.keyboard.get_key_state(key));
            }
            Op::DelayGet(x) => self.v[x as usize] = self.delay_timer,
            Op::KeyOpGet(x) => match self.keyboard.first_pressed() {
                Some(key) => self.v[x as usize] = key,
                // run this instruction again next cycle, timers and drawing keep going meanwhile
                None => self.pc = self.pc.wrapping_sub(2),
            },
            Op::DelaySet(x) => self.delay_timer = self.v[x as usize],
            Op::SoundSet(x) => self.sound_timer = self.v[x as usize],
            Op::MemIPlusEqVx(x) => {
                self.addr = self.addr.wrapping_add(u16::from(self.v[x as usize]));
            }
            Op::MemISetSprite(x) => {
                let glyph = u16::from(self.v[x as usize] & 0xF);
                self.addr = FONT_SPRITE_BASE + glyph * u16::from(NUM_BYTES_IN_FONT_CHAR);
            }
            Op::Bcd(x) => {
                let value = self.v[x as usize];
                let digits = [value / 100, (value / 10) % 10, value % 10];
                for (offset, digit) in digits.iter().enumerate() {
                    self.memory[mem_idx(self.addr.wrapping_add(offset as u16))] = *digit;
                }
            }
            Op::RegDump(x) => {
                for i in 0..=x as usize {
                    self.memory[mem_idx(self.addr.wrapping_add(i as u16))] = self.v[i];
                }
                self.addr = self.addr.wrapping_add(u16::from(x) + 1);
            }
            Op::RegLoad(x) => {
                for i in 0..=x as usize {
                    self.v[i] = self.memory[mem_idx(self.addr.wrapping_add(i as u16))];
                }
                self.addr = self.addr.wrapping_add(u16::from(x) + 1);
            }
        }

        Ok(())
    }

    fn skip_if(&mut self, cond: bool) {
        if cond {
            self.pc = self.pc.wrapping_add(2);
        }
    }

    /// DXYN: XOR the N byte sprite at I onto the screen at (VX, VY)
    fn draw(&mut self, x: u8, y: u8, n: u8) {
        let x_coord = self.v[x as usize];
        let y_coord = self.v[y as usize];
        self.v[FLAG] = 0;

        let mut sprite = [0u8; 15];
        for (row, byte) in sprite.iter_mut().enumerate().take(n as usize) {
            *byte = self.memory[mem_idx(self.addr.wrapping_add(row as u16))];
        }

        if self.graphics.draw_sprite(x_coord, y_coord, &sprite[..n as usize]) {
            self.v[FLAG] = 1;
        }
        self.redraw = true;
    }

    /// Count both timers down by one. Returns true when the sound timer ran out on
    /// this tick, meaning a tone should be played
    pub fn tick(&mut self) -> bool {
        if self.delay_timer > 0 {
            self.delay_timer -= 1;
        }

        let mut tone = false;
        if self.sound_timer > 0 {
            tone = self.sound_timer == 1;
            self.sound_timer -= 1;
        }
        if tone {
            debug!(self.logger, "tone requested");
        }
        tone
    }

    /// Sync the key states with the keys `keyboard` reports as held down
    pub fn handle_key_input<K: AsKeyboard + ?Sized>(&mut self, keyboard: &K) {
        let keys = keyboard.keys_down();
        self.keyboard.update_keyboard_with_vec(&keys);
    }

    pub fn key_down(&mut self, key: Key) {
        self.keyboard.handle_key_down(key);
    }

    pub fn key_up(&mut self, key: Key) {
        self.keyboard.handle_key_up(key);
    }

    pub fn is_key_down(&self, key: Key) -> bool {
        self.keyboard.get_key_state(key.index())
    }

    pub fn graphics(&self) -> &Graphics {
        &self.graphics
    }

    /// True if the screen changed since the last frame was taken
    pub fn needs_redraw(&self) -> bool {
        self.redraw
    }

    /// Hand the screen to the renderer if it changed, clearing the redraw flag
    pub fn take_frame(&mut self) -> Option<&Graphics> {
        if self.redraw {
            self.redraw = false;
            Some(&self.graphics)
        } else {
            None
        }
    }

    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    /// The value of register V`x`
    ///
    /// # Panics
    ///
    /// Panics if `x` is not a register index, i.e. above 0xF
    pub fn v(&self, x: usize) -> u8 {
        self.v[x]
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    /// The address register I
    pub fn index(&self) -> u16 {
        self.addr
    }

    pub fn sp(&self) -> usize {
        self.sp
    }

    /// The return addresses of the subroutine calls in progress, oldest first
    pub fn stack(&self) -> &[u16] {
        &self.stack[..self.sp]
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }
}

/// Memory is addressed modulo its size, so I and PC can point anywhere
fn mem_idx(addr: u16) -> usize {
    addr as usize % MEMORY_SIZE
}
