//! A minifb window that renders the framebuffer and reads the keypad from the
//! host keyboard
use minifb::{Key as MiniKey, Scale, ScaleMode, Window, WindowOptions};
use slog::{debug, Logger};

use crate::config::Config;
use crate::error::{Chip8Error, Result};
use crate::graphics::{Graphics, HEIGHT, WIDTH};
use crate::host::Frontend;
use crate::keyboard::{AsKeyboard, Key};

pub struct MiniFbFrontend {
    window: Window,
    buffer: Vec<u32>,
    foreground: u32,
    background: u32,
    logger: Logger,
}

impl MiniFbFrontend {
    pub fn new(title: &str, config: &Config, logger: Logger) -> Result<Self> {
        let mut window = Window::new(
            title,
            WIDTH,
            HEIGHT,
            WindowOptions {
                resize: true,
                scale: scale_for(config.scale),
                scale_mode: ScaleMode::UpperLeft,
                ..WindowOptions::default()
            },
        )
        .map_err(|e| Chip8Error::Frontend(e.to_string()))?;

        // the host loop paces itself, minifb must not block in update
        window.limit_update_rate(None);

        Ok(MiniFbFrontend {
            window,
            buffer: vec![config.background; WIDTH * HEIGHT],
            foreground: config.foreground,
            background: config.background,
            logger,
        })
    }

    /// We use the following mapping for the 16 bit hex keyboard
    /// Keypad                   Keyboard
    /// +-+-+-+-+                +-+-+-+-+
    /// |1|2|3|C|                |1|2|3|4|
    /// +-+-+-+-+                +-+-+-+-+
    /// |4|5|6|D|                |Q|W|E|R|
    /// +-+-+-+-+       =>       +-+-+-+-+
    /// |7|8|9|E|                |A|S|D|F|
    /// +-+-+-+-+                +-+-+-+-+
    /// |A|0|B|F|                |Z|X|C|V|
    /// +-+-+-+-+                +-+-+-+-+
    pub fn map_key(k: MiniKey) -> Option<Key> {
        match k {
            MiniKey::Key1 => Some(Key::Key1),
            MiniKey::Key2 => Some(Key::Key2),
            MiniKey::Key3 => Some(Key::Key3),
            MiniKey::Key4 => Some(Key::C),
            MiniKey::Q => Some(Key::Key4),
            MiniKey::W => Some(Key::Key5),
            MiniKey::E => Some(Key::Key6),
            MiniKey::R => Some(Key::D),
            MiniKey::A => Some(Key::Key7),
            MiniKey::S => Some(Key::Key8),
            MiniKey::D => Some(Key::Key9),
            MiniKey::F => Some(Key::E),
            MiniKey::Z => Some(Key::A),
            MiniKey::X => Some(Key::Key0),
            MiniKey::C => Some(Key::B),
            MiniKey::V => Some(Key::F),
            _ => None,
        }
    }
}

/// minifb only scales by powers of two, pick the largest one not above `scale`
fn scale_for(scale: usize) -> Scale {
    match scale {
        0..=1 => Scale::X1,
        2..=3 => Scale::X2,
        4..=7 => Scale::X4,
        8..=15 => Scale::X8,
        16..=31 => Scale::X16,
        _ => Scale::X32,
    }
}

impl AsKeyboard for MiniFbFrontend {
    fn keys_down(&self) -> Vec<Key> {
        self.window
            .get_keys()
            .unwrap_or_default()
            .into_iter()
            .filter_map(MiniFbFrontend::map_key)
            .collect()
    }
}

impl Frontend for MiniFbFrontend {
    fn is_open(&self) -> bool {
        self.window.is_open() && !self.window.is_key_down(MiniKey::Escape)
    }

    fn present(&mut self, frame: Option<&Graphics>) -> Result<()> {
        match frame {
            Some(graphics) => {
                self.buffer = graphics.to_argb(self.foreground, self.background);
                self.window
                    .update_with_buffer(&self.buffer, WIDTH, HEIGHT)
                    .map_err(|e| Chip8Error::Frontend(e.to_string()))
            }
            None => {
                self.window.update();
                Ok(())
            }
        }
    }

    fn tone(&mut self) {
        // no audio device, the tone is only logged
        debug!(self.logger, "beep");
    }
}
