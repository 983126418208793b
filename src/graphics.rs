//! A wrapper around the 64x32 monochrome framebuffer
use std::ops::Index;

pub const WIDTH: usize = 64;
pub const HEIGHT: usize = 32;

/// Each of the 16 hex digit glyphs is 5 bytes tall
pub const NUM_BYTES_IN_FONT_CHAR: u8 = 5;

/// The built in 4x5 pixel glyphs for the hex digits 0 - F
pub const FONT_SET: [[u8; NUM_BYTES_IN_FONT_CHAR as usize]; 16] = [
    [0xF0, 0x90, 0x90, 0x90, 0xF0], // 0
    [0x20, 0x60, 0x20, 0x20, 0x70], // 1
    [0xF0, 0x10, 0xF0, 0x80, 0xF0], // 2
    [0xF0, 0x10, 0xF0, 0x10, 0xF0], // 3
    [0x90, 0x90, 0xF0, 0x10, 0x10], // 4
    [0xF0, 0x80, 0xF0, 0x10, 0xF0], // 5
    [0xF0, 0x80, 0xF0, 0x90, 0xF0], // 6
    [0xF0, 0x10, 0x20, 0x40, 0x40], // 7
    [0xF0, 0x90, 0xF0, 0x90, 0xF0], // 8
    [0xF0, 0x90, 0xF0, 0x10, 0xF0], // 9
    [0xF0, 0x90, 0xF0, 0x90, 0x90], // A
    [0xE0, 0x90, 0xE0, 0x90, 0xE0], // B
    [0xF0, 0x80, 0x80, 0x80, 0xF0], // C
    [0xE0, 0x90, 0x90, 0x90, 0xE0], // D
    [0xF0, 0x80, 0xF0, 0x80, 0xF0], // E
    [0xF0, 0x80, 0xF0, 0x80, 0x80], // F
];

/// Row-major buffer of pixels, each one either 0 (off) or 1 (on)
#[derive(Clone, PartialEq)]
pub struct Graphics {
    buffer: [u8; WIDTH * HEIGHT],
}

impl Graphics {
    pub fn new() -> Self {
        Graphics {
            buffer: [0; WIDTH * HEIGHT],
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_blank(&self) -> bool {
        self.buffer.iter().all(|&p| p == 0)
    }

    /// Given x and y coordinate for a pixel in the buffer, return the corresponding
    /// index of that pixel in the buffer. Coordinates wrap around each axis
    pub fn get_graphics_idx(x: usize, y: usize) -> usize {
        let column = x % WIDTH;
        let row = y % HEIGHT;

        row * WIDTH + column
    }

    /// Turn every pixel off
    pub fn clear(&mut self) {
        self.buffer = [0; WIDTH * HEIGHT];
    }

    /// Return true if the pixel at (x, y) is on
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.buffer[Graphics::get_graphics_idx(x, y)] == 1
    }

    /// Flip the pixel at (x, y). Returns true if the pixel was on before the flip,
    /// which is what the draw instruction reports as a collision
    pub fn xor_set(&mut self, x: usize, y: usize) -> bool {
        let idx = Graphics::get_graphics_idx(x, y);
        let collision = self.buffer[idx] == 1;
        self.buffer[idx] ^= 1;
        collision
    }

    /// XOR an 8 pixel wide sprite onto the buffer with its top left corner at (x, y).
    /// Each byte of `sprite` is one row, most significant bit leftmost. Pixels that
    /// fall off the right or bottom edge wrap to the opposite side. Returns true if
    /// any pixel that was on got turned off
    pub fn draw_sprite(&mut self, x: u8, y: u8, sprite: &[u8]) -> bool {
        let mut collision = false;
        for (row, bits) in sprite.iter().enumerate() {
            for column in 0..8 {
                if bits & (0x80 >> column) != 0 {
                    let px = x as usize + column;
                    let py = y as usize + row;
                    collision |= self.xor_set(px, py);
                }
            }
        }
        collision
    }

    /// Convert the buffer into one 0RGB u32 per pixel, the layout windowing
    /// libraries like minifb expect
    pub fn to_argb(&self, foreground: u32, background: u32) -> Vec<u32> {
        self.buffer
            .iter()
            .map(|&p| if p == 1 { foreground } else { background })
            .collect()
    }

    /// The raw buffer, one byte per pixel
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }
}

impl Default for Graphics {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Graphics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.buffer.chunks(WIDTH) {
            let line: String = row.iter().map(|&p| if p == 1 { '#' } else { '.' }).collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

impl Index<usize> for Graphics {
    type Output = u8;

    #[inline]
    fn index(&self, idx: usize) -> &Self::Output {
        &self.buffer[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graphics_idx_wraps_each_axis() {
        assert_eq!(Graphics::get_graphics_idx(0, 0), 0);
        assert_eq!(Graphics::get_graphics_idx(63, 0), 63);
        assert_eq!(Graphics::get_graphics_idx(0, 1), 64);
        assert_eq!(Graphics::get_graphics_idx(64, 0), 0);
        assert_eq!(Graphics::get_graphics_idx(65, 32), 1);
    }

    #[test]
    fn xor_set_reports_collisions() {
        let mut graphics = Graphics::new();
        assert!(!graphics.xor_set(3, 4));
        assert!(graphics.pixel(3, 4));
        assert!(graphics.xor_set(3, 4));
        assert!(!graphics.pixel(3, 4));
    }

    #[test]
    fn draw_sprite_msb_is_leftmost() {
        let mut graphics = Graphics::new();
        let collision = graphics.draw_sprite(0, 0, &[0b1000_0001]);

        assert!(!collision);
        assert!(graphics.pixel(0, 0));
        assert!(graphics.pixel(7, 0));
        for x in 1..7 {
            assert!(!graphics.pixel(x, 0));
        }
    }

    #[test]
    fn clear_turns_everything_off() {
        let mut graphics = Graphics::new();
        graphics.draw_sprite(10, 10, &[0xFF, 0xFF]);
        assert!(!graphics.is_blank());

        graphics.clear();
        assert!(graphics.is_blank());
    }

    #[test]
    fn to_argb_maps_colours() {
        let mut graphics = Graphics::new();
        graphics.xor_set(1, 0);

        let pixels = graphics.to_argb(0xFFFFFF, 0x000000);
        assert_eq!(pixels.len(), WIDTH * HEIGHT);
        assert_eq!(pixels[0], 0x000000);
        assert_eq!(pixels[1], 0xFFFFFF);
    }
}
