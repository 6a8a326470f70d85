use std::num::NonZeroU32;
use std::rc::Rc;

use glutin::{
    config::{Config as GlConfig, ConfigTemplateBuilder, GlConfig as _},
    context::{
        ContextApi, ContextAttributesBuilder, GlProfile, NotCurrentContext,
        PossiblyCurrentContext, Version as GlVersion,
    },
    display::{Display as GlDisplay, GetGlDisplay, GlDisplay as _},
    prelude::*,
    surface::{Surface, SwapInterval, WindowSurface},
};
use glutin_winit::{ApiPrefence, DisplayBuilder, GlWindow};
use raw_window_handle::{HasRawWindowHandle, RawWindowHandle};
use winit::{
    dpi::{LogicalSize, PhysicalSize},
    window::{Window, WindowBuilder, WindowId},
};

use crate::{error::AppError, EventLoop};

/// Native window paired with the OpenGL context that draws into it.
pub struct WindowContext {
    window: Window,
    gl_context: PossiblyCurrentContext,
    gl_surface: Surface<WindowSurface>,
    pub(crate) gl: Rc<glow::Context>,
}

impl WindowContext {
    /// Open a resizable window and make an OpenGL context current on it.
    ///
    /// Depending on the platform the window is created either together
    /// with the GL display (Windows) or after it (Android).
    pub fn new(
        event_loop: &EventLoop,
        title: &str,
        inner_size: LogicalSize<u32>,
    ) -> Result<Self, AppError> {
        let window_builder = WindowBuilder::new()
            .with_title(title)
            .with_inner_size(inner_size)
            .with_resizable(true);

        let template = ConfigTemplateBuilder::new().prefer_hardware_accelerated(Some(true));

        let (window, gl_config) = DisplayBuilder::new()
            .with_preference(ApiPrefence::FallbackEgl)
            .with_window_builder(Some(window_builder.clone()))
            .build(event_loop, template, pick_config)
            .map_err(AppError::display)?;

        log::info!("using GL config with {} samples", gl_config.num_samples());

        let window = match window {
            Some(window) => window,
            None => glutin_winit::finalize_window(event_loop, window_builder, &gl_config)?,
        };

        let gl_display = gl_config.display();
        let not_current = create_context(&gl_display, &gl_config, window.raw_window_handle())?;

        let surface_attrs = window.build_surface_attributes(Default::default());
        let gl_surface = unsafe { gl_display.create_window_surface(&gl_config, &surface_attrs)? };
        let gl_context = not_current.make_current(&gl_surface)?;

        // VSync paces the frame loop.
        if let Err(err) = gl_surface.set_swap_interval(&gl_context, SwapInterval::Wait(NonZeroU32::MIN)) {
            log::warn!("vsync unavailable: {err}");
        }

        let gl = unsafe {
            glow::Context::from_loader_function_cstr(|symbol| gl_display.get_proc_address(symbol))
        };

        Ok(Self {
            window,
            gl_context,
            gl_surface,
            gl: Rc::new(gl),
        })
    }

    #[inline]
    pub fn window_id(&self) -> WindowId {
        self.window.id()
    }

    /// Size of the drawable area in physical pixels.
    #[inline]
    pub fn inner_size(&self) -> PhysicalSize<u32> {
        self.window.inner_size()
    }

    #[inline]
    pub fn request_redraw(&self) {
        self.window.request_redraw()
    }

    #[inline]
    pub fn swap_buffers(&self) -> glutin::error::Result<()> {
        self.gl_surface.swap_buffers(&self.gl_context)
    }

    #[inline]
    pub fn make_context_current(&self) -> glutin::error::Result<()> {
        self.gl_context.make_current(&self.gl_surface)
    }

    /// Match the GL surface to a resized window. Zero sized surfaces are ignored.
    pub fn resize_surface(&self, size: PhysicalSize<u32>) {
        if let (Some(width), Some(height)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height)) {
            self.gl_surface.resize(&self.gl_context, width, height);
        }
    }
}

/// Prefer the config with the most multisampling.
fn pick_config(configs: Box<dyn Iterator<Item = GlConfig> + '_>) -> GlConfig {
    configs
        .inspect(|c| log::debug!("GL config candidate: samples={}", c.num_samples()))
        .max_by_key(|c| c.num_samples())
        // glutin only invokes the picker with a non-empty set.
        .expect("GL display offered no configs")
}

/// Request an OpenGL 3.3 core context, falling back to GLES.
fn create_context(
    gl_display: &GlDisplay,
    gl_config: &GlConfig,
    raw_window_handle: RawWindowHandle,
) -> glutin::error::Result<NotCurrentContext> {
    let core = ContextAttributesBuilder::new()
        .with_context_api(ContextApi::OpenGl(Some(GlVersion::new(3, 3))))
        .with_profile(GlProfile::Core)
        .build(Some(raw_window_handle));
    let gles = ContextAttributesBuilder::new()
        .with_context_api(ContextApi::Gles(None))
        .build(Some(raw_window_handle));

    unsafe {
        gl_display.create_context(gl_config, &core).or_else(|err| {
            log::warn!("OpenGL core context unavailable ({err}), trying GLES");
            gl_display.create_context(gl_config, &gles)
        })
    }
}
