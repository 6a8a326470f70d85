use chip8::{
    constants::{DISPLAY_HEIGHT, DISPLAY_WIDTH},
    prelude::*,
    Clock,
};
use log::{error, info};
use winit::{
    dpi::LogicalSize,
    event::{Event as EV, WindowEvent as WE},
    event_loop::EventLoopBuilder,
    platform::run_return::EventLoopExtRunReturn,
};

use crate::{
    error::AppError,
    keymap::{Action, InputMap},
    render::{Palette, Render},
    window::WindowContext,
    EventLoop,
};

/// On-screen size of one Chip8 pixel, in logical pixels.
pub const WINDOW_SCALE: u32 = 16;

/// Chip8 Application
pub struct Chip8App {
    window: WindowContext,
    render: Render,
    vm: Chip8Vm,
    input_map: InputMap,
    clock: Clock,
}

impl Chip8App {
    /// Create the Chip8 window app around a VM with a program already loaded.
    pub fn new(event_loop: &EventLoop, vm: Chip8Vm) -> Result<Self, AppError> {
        let inner_size = LogicalSize::new(
            DISPLAY_WIDTH as u32 * WINDOW_SCALE,
            DISPLAY_HEIGHT as u32 * WINDOW_SCALE,
        );
        let window = WindowContext::new(event_loop, "Chip-8 Interpreter", inner_size)?;

        let render = Render::new(window.gl.clone(), Palette::default());
        info!("created OpenGL renderer:\n{}", render.opengl_info());

        Ok(Self {
            window,
            render,
            vm,
            input_map: InputMap::new(),
            clock: Clock::new(),
        })
    }

    pub fn create_event_loop() -> EventLoop {
        EventLoopBuilder::new().build()
    }

    fn redraw(&mut self) -> Result<(), AppError> {
        self.window.make_context_current()?;
        self.render
            .draw_display(self.vm.display(), self.window.inner_size());
        self.window.swap_buffers()?;
        Ok(())
    }
}

/// Event Loop.
impl Chip8App {
    /// Run frames until the window is closed.
    ///
    /// Each frame latches the keyboard, runs one VM cycle, counts down the
    /// timers and redraws the display. The quit signal is checked once per frame.
    pub fn run(&mut self, event_loop: &mut EventLoop) -> Result<(), AppError> {
        let main_window_id = self.window.window_id();
        let mut result = Ok(());

        self.clock.reset();

        event_loop.run_return(|event, _, control_flow| {
            control_flow.set_poll();

            match event {
                EV::MainEventsCleared => {
                    // Frame Update

                    if self.input_map.is_action_pressed(Action::Exit) {
                        info!("exit");
                        control_flow.set_exit();
                        return;
                    }

                    let keys = self.input_map.keypad();
                    let elapsed_ms = self.clock.lap();

                    if let Err(err) = self.vm.frame(keys, elapsed_ms) {
                        error!("{err}");
                        result = Err(err.into());
                        control_flow.set_exit();
                        return;
                    }

                    self.window.request_redraw();
                }
                EV::RedrawRequested(window_id) if window_id == main_window_id => {
                    if let Err(err) = self.redraw() {
                        error!("{err}");
                        result = Err(err);
                        control_flow.set_exit();
                    }
                }
                EV::WindowEvent { window_id, event } if window_id == main_window_id => {
                    match event {
                        WE::Resized(size) => self.window.resize_surface(size),
                        WE::KeyboardInput { input, .. } => {
                            if let Some(virtual_keycode) = input.virtual_keycode {
                                self.input_map.push_key(virtual_keycode, input.state);
                            }
                        }
                        WE::Focused(false) => self.input_map.clear_state(),
                        WE::CloseRequested => {
                            info!("window closed");
                            control_flow.set_exit();
                        }
                        _ => { /* blank */ }
                    }
                }
                _ => { /* blank */ }
            }
        });

        result
    }
}
