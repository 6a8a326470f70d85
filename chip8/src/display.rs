//! Monochrome display buffer.
use std::fmt::{self, Write};

use crate::constants::*;

/// Screen buffer that sprites are drawn to.
///
/// Pixels are stored row major, so the pixel at `(x, y)`
/// lives at index `x + y * DISPLAY_WIDTH`.
#[derive(Clone)]
pub struct Framebuffer {
    pixels: Box<[bool; DISPLAY_BUFFER_SIZE]>,
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self {
            pixels: Box::new([false; DISPLAY_BUFFER_SIZE]),
        }
    }
}

impl Framebuffer {
    pub fn new() -> Self {
        Default::default()
    }

    /// Turn all pixels off.
    pub fn clear(&mut self) {
        self.pixels.fill(false);
    }

    /// Coordinates outside the display are always off.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        x < DISPLAY_WIDTH && y < DISPLAY_HEIGHT && self.pixels[x + y * DISPLAY_WIDTH]
    }

    #[inline]
    pub fn as_slice(&self) -> &[bool; DISPLAY_BUFFER_SIZE] {
        &self.pixels
    }

    /// Iterate the coordinates of all lit pixels.
    pub fn iter_lit(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.pixels
            .iter()
            .enumerate()
            .filter(|(_, on)| **on)
            .map(|(i, _)| (i % DISPLAY_WIDTH, i / DISPLAY_WIDTH))
    }

    /// XOR a sprite onto the display.
    ///
    /// The origin wraps around the display, but the sprite body is clipped
    /// at the right and bottom edges.
    ///
    /// Returns `true` when any pixel inside the clipped sprite area was already
    /// lit before drawing, which signals a collision.
    pub fn draw_sprite(&mut self, x: u8, y: u8, rows: &[u8]) -> bool {
        let x0 = x as usize % DISPLAY_WIDTH;
        let y0 = y as usize % DISPLAY_HEIGHT;
        let mut collision = false;

        for (r, row) in rows.iter().enumerate() {
            let py = y0 + r;
            if py >= DISPLAY_HEIGHT {
                break;
            }

            // Each row is 8 bits representing the 8 pixels of the sprite.
            for c in 0..SPRITE_WIDTH {
                let px = x0 + c;
                if px >= DISPLAY_WIDTH {
                    break;
                }

                let d = px + py * DISPLAY_WIDTH;
                let old_px = self.pixels[d];
                let new_px = (row >> (7 - c) & 1) != 0;

                collision |= old_px;
                self.pixels[d] = old_px ^ new_px;
            }
        }

        collision
    }

    /// Render the buffer as text, `#` for lit pixels and `.` for unlit.
    pub fn dump(&self) -> Result<String, fmt::Error> {
        let mut buf = String::with_capacity(DISPLAY_BUFFER_SIZE + DISPLAY_HEIGHT);

        for y in 0..DISPLAY_HEIGHT {
            for x in 0..DISPLAY_WIDTH {
                if self.pixels[x + y * DISPLAY_WIDTH] {
                    write!(buf, "#")?;
                } else {
                    write!(buf, ".")?;
                }
            }
            writeln!(buf)?;
        }

        Ok(buf)
    }
}
