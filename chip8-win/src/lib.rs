mod app;
mod config;
mod error;
mod keymap;
mod render;
mod window;

pub use self::{
    app::Chip8App,
    config::AppConf,
    error::{AppError, ErrorKind},
    keymap::{Action, InputKind, InputMap},
    render::Palette,
};

pub type EventLoop = winit::event_loop::EventLoop<()>;
