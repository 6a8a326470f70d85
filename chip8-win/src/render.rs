use std::fmt;
use std::rc::Rc;

use chip8::{
    constants::{DISPLAY_HEIGHT, DISPLAY_WIDTH},
    Framebuffer,
};
use glow::{Context as GlowContext, HasContext};
use winit::dpi::PhysicalSize;

/// Two colour palette, as normalised RGB.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub background: [f32; 3],
    pub foreground: [f32; 3],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: [0.0, 0.0, 0.0],
            foreground: [1.0, 1.0, 1.0],
        }
    }
}

/// Paints the Chip8 display buffer.
///
/// Each lit pixel is filled as a scissored clear, so no shaders or
/// vertex buffers are needed.
pub struct Render {
    /// The interface to the loaded OpenGL function.
    gl: Rc<GlowContext>,
    info: OpenGLInfo,
    palette: Palette,
}

impl Render {
    pub fn new(gl: Rc<GlowContext>, palette: Palette) -> Self {
        let info = OpenGLInfo::new(&gl);
        Self { gl, info, palette }
    }

    pub fn clear_window(&self, [red, green, blue]: [f32; 3]) {
        unsafe {
            self.gl.clear_color(red, green, blue, 1.0);
            self.gl.clear(glow::COLOR_BUFFER_BIT);
        }
    }

    /// Draw the display buffer, scaling each logical pixel to a block that fills the surface.
    pub fn draw_display(&self, display: &Framebuffer, size: PhysicalSize<u32>) {
        let (width, height) = (size.width as i32, size.height as i32);
        let (block_w, block_h) = block_size(size);

        unsafe {
            self.gl.viewport(0, 0, width, height);
            self.gl.disable(glow::SCISSOR_TEST);
        }

        // Previous frame is always wiped first.
        self.clear_window(self.palette.background);

        unsafe {
            let [red, green, blue] = self.palette.foreground;
            self.gl.enable(glow::SCISSOR_TEST);
            self.gl.clear_color(red, green, blue, 1.0);

            for (x, y) in display.iter_lit() {
                // OpenGL window coordinates start at the bottom left.
                let px = x as i32 * block_w;
                let py = height - (y as i32 + 1) * block_h;
                self.gl.scissor(px, py, block_w, block_h);
                self.gl.clear(glow::COLOR_BUFFER_BIT);
            }

            self.gl.disable(glow::SCISSOR_TEST);
        }
    }

    pub fn opengl_info(&self) -> &OpenGLInfo {
        &self.info
    }
}

/// Size of one logical pixel on a surface, never smaller than a single physical pixel.
fn block_size(size: PhysicalSize<u32>) -> (i32, i32) {
    (
        (size.width as i32 / DISPLAY_WIDTH as i32).max(1),
        (size.height as i32 / DISPLAY_HEIGHT as i32).max(1),
    )
}

pub struct OpenGLInfo {
    pub version: String,
    pub renderer: String,
    pub vendor: String,
    pub shading_lang: String,
}

impl OpenGLInfo {
    pub fn new(gl: &GlowContext) -> Self {
        unsafe {
            Self {
                version: gl.get_parameter_string(glow::VERSION),
                renderer: gl.get_parameter_string(glow::RENDERER),
                vendor: gl.get_parameter_string(glow::VENDOR),
                shading_lang: gl.get_parameter_string(glow::SHADING_LANGUAGE_VERSION),
            }
        }
    }
}

impl fmt::Display for OpenGLInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let Self {
            version,
            renderer,
            vendor,
            shading_lang,
        } = self;
        writeln!(f, "OpenGL Version: {version}")?;
        writeln!(f, "Renderer: {renderer}")?;
        writeln!(f, "Vendor: {vendor}")?;
        writeln!(f, "Shading Language: {shading_lang}")?;
        Ok(())
    }
}
