//! Entrypoint for CLI
use std::env;

use chip8::{prelude::*, IMPL_VERSION};
use chip8_win::{AppConf, AppError, Chip8App};
use log::{error, info, LevelFilter};

static USAGE: &str = r#"
usage: chip8 [--config FILE] ROM

arguments:
    ROM             Raw Chip8 program, loaded at 0x200

options:
    --config FILE   YAML file with VM settings

keys:
    1 2 3 4
    Q W E R
    A S D F
    Z X C V         Escape quits

examples:
    chip8 breakout.ch8
    chip8 --config strict.yaml breakout.ch8
"#;

fn run(args: Args) -> Result<(), AppError> {
    let conf = match args.config {
        Some(ref filepath) => AppConf::from_file(filepath)?,
        None => AppConf::default(),
    };

    let mut vm = Chip8Vm::new(conf.vm);
    let count = vm.load_rom_file(&args.rom)?;
    info!("loaded rom {}: {} bytes", args.rom, count);

    let mut event_loop = Chip8App::create_event_loop();
    let mut app = Chip8App::new(&event_loop, vm)?;
    app.run(&mut event_loop)?;

    info!("done");

    Ok(())
}

fn main() {
    if let Err(err) = simple_logger::SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .env()
        .init()
    {
        eprintln!("failed to initialise logger: {err}");
    }

    let args = match parse_args(env::args().skip(1)) {
        Some(args) => args,
        None => {
            print_usage();
            // FreeBSD EX_USAGE (64)
            std::process::exit(64)
        }
    };

    if let Err(err) = run(args) {
        error!("{err}");
        std::process::exit(1);
    }
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Option<Args> {
    let mut config = None;
    let mut rom = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => config = Some(args.next()?),
            _ if arg.starts_with("--") => return None,
            _ if rom.is_none() => rom = Some(arg),
            _ => return None,
        }
    }

    Some(Args { rom: rom?, config })
}

fn print_usage() {
    println!("Chip8 v{IMPL_VERSION}");
    println!("{USAGE}");
}

#[derive(Debug, PartialEq, Eq)]
struct Args {
    /// ROM file to run
    rom: String,
    /// Optional settings file
    config: Option<String>,
}
