use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Chip8Error>;

/// Everything that can go wrong while loading or running a program.
///
/// `RomEmpty`, `RomTooLarge` and `RomUnreadable` abort a load and leave the
/// Emulator untouched. `StackOverflow`, `StackUnderflow` and `UnknownInstruction`
/// are reported by `Emulator::step` after the instruction has been skipped; the
/// Emulator is still in a runnable state when they are returned.
#[derive(Debug, Error)]
pub enum Chip8Error {
    #[error("ROM is empty")]
    RomEmpty,

    #[error("ROM is {size} bytes, but only {max} bytes of program memory are available")]
    RomTooLarge { size: usize, max: usize },

    #[error("failed to read ROM {}: {source}", .path.display())]
    RomUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("call at {pc:#05X} with a full call stack was ignored")]
    StackOverflow { pc: u16 },

    #[error("return at {pc:#05X} with an empty call stack was ignored")]
    StackUnderflow { pc: u16 },

    #[error("unknown instruction {opcode:#06X}")]
    UnknownInstruction { opcode: u16 },

    #[error("failed to read config {}: {source}", .path.display())]
    ConfigUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid setting: {0}")]
    Setting(String),

    #[error("failed to build logger: {0}")]
    Logger(#[from] sloggers::Error),

    #[error("frontend error: {0}")]
    Frontend(String),
}

impl Chip8Error {
    /// True for faults raised while executing an instruction. The host loop keeps
    /// going after these.
    pub fn is_runtime_fault(&self) -> bool {
        matches!(
            self,
            Chip8Error::StackOverflow { .. }
                | Chip8Error::StackUnderflow { .. }
                | Chip8Error::UnknownInstruction { .. }
        )
    }
}
