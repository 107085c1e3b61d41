use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use tracing::{debug, info};

use graybmp::config::RenderConfig;
use graybmp::logging;
use graybmp::render::Renderer;
use graybmp::util::{BlockTimer, FpsCounter};

const DEFAULT_FRAMES: usize = 10;

/// Command line options; render settings override the config file
#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    width: Option<u32>,
    height: Option<u32>,
    scale: Option<u32>,
    workers: Option<usize>,
    drawing: Option<PathBuf>,
    serial: bool,
    headless: bool,
    frames: Option<usize>,
    debug: bool,
}

fn print_help() {
    println!("Usage: graybmp [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --config FILE         Load render settings from a JSON file");
    println!("  --drawing FILE        Drawing to render (x0 y0 x1 y1 per line)");
    println!("  --width W, -w W       Display width (default: {})", graybmp::config::DEFAULT_WIDTH);
    println!("  --height H, -h H      Display height (default: {})", graybmp::config::DEFAULT_HEIGHT);
    println!("  --scale N, -s N       Supersample factor (default: {})", graybmp::config::DEFAULT_SCALE);
    println!("  --workers N           Parallel fill worker count");
    println!("  --serial              Fill on the main thread only");
    println!("  --headless            Render without opening a window");
    println!("  --frames N            Frames to render headless (default: {})", DEFAULT_FRAMES);
    println!("  --debug               Enable debug logging (honours RUST_LOG)");
    println!("  --help                Show this help message");
}

fn parse_value<T: std::str::FromStr>(args: &[String], i: &mut usize, flag: &str) -> Result<T> {
    *i += 1;
    let raw = args.get(*i).ok_or_else(|| anyhow!("{} needs a value", flag))?;
    raw.parse()
        .map_err(|_| anyhow!("invalid value {:?} for {}", raw, flag))
}

fn parse_args() -> Result<Args> {
    let args: Vec<String> = std::env::args().collect();
    let mut out = Args::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => out.config = Some(parse_value(&args, &mut i, "--config")?),
            "--drawing" => out.drawing = Some(parse_value(&args, &mut i, "--drawing")?),
            "--width" | "-w" => out.width = Some(parse_value(&args, &mut i, "--width")?),
            "--height" | "-h" => out.height = Some(parse_value(&args, &mut i, "--height")?),
            "--scale" | "-s" => out.scale = Some(parse_value(&args, &mut i, "--scale")?),
            "--workers" => out.workers = Some(parse_value(&args, &mut i, "--workers")?),
            "--frames" => out.frames = Some(parse_value(&args, &mut i, "--frames")?),
            "--serial" => out.serial = true,
            "--headless" => out.headless = true,
            "--debug" => out.debug = true,
            "--help" => {
                print_help();
                std::process::exit(0);
            },
            other => return Err(anyhow!("unknown option {:?} (see --help)", other)),
        }
        i += 1;
    }

    Ok(out)
}

fn build_config(args: &Args) -> Result<RenderConfig> {
    let mut config = match &args.config {
        Some(path) => RenderConfig::load(path)?,
        None => RenderConfig::default(),
    };
    if let Some(w) = args.width {
        config.width = w;
    }
    if let Some(h) = args.height {
        config.height = h;
    }
    if let Some(s) = args.scale {
        config.scale = s;
    }
    if args.workers.is_some() {
        config.workers = args.workers;
    }
    if args.drawing.is_some() {
        config.drawing.clone_from(&args.drawing);
    }
    if args.serial {
        config.parallel = false;
    }
    config.validate().context("invalid render settings")?;
    Ok(config)
}

fn run_headless(renderer: &mut Renderer, frames: usize) {
    let mut fps = FpsCounter::new(frames);
    for frame in 0..frames {
        let _t = BlockTimer::new("frame");
        renderer.render_frame();
        let (dt, avg_fps) = fps.tick();
        debug!(frame, dt_ms = dt * 1000.0, avg_fps, "frame timing");
    }
    info!(frames, avg_frame_ms = fps.avg_frame_time_ms(), "headless run finished");
}

#[cfg(feature = "display")]
fn run_window(renderer: &mut Renderer) -> Result<()> {
    use graybmp::display::{Display, InputEvent, RenderTarget};
    use sdl2::keyboard::Keycode;
    use std::time::{Duration, Instant};

    let (width, height) = (renderer.config().width, renderer.config().height);
    let interval = Duration::from_millis(renderer.config().frame_interval_ms);
    let (mut display, texture_creator) =
        Display::with_size("graybmp", width, height, true).map_err(|e| anyhow!(e))?;
    let mut target = RenderTarget::with_size(&texture_creator, width, height).map_err(|e| anyhow!(e))?;

    info!(width, height, interval_ms = interval.as_millis() as u64, "window open, Escape quits");
    let mut next_frame = Instant::now();
    'main: loop {
        for event in display.poll_events() {
            match event {
                InputEvent::Quit | InputEvent::KeyDown(Keycode::Escape) => break 'main,
                InputEvent::KeyDown(_) => {},
            }
        }
        if Instant::now() >= next_frame {
            let _t = BlockTimer::new("frame");
            renderer.render_frame();
            next_frame += interval;
        }
        display
            .present(&mut target, renderer.display_mut())
            .map_err(|e| anyhow!(e))?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = parse_args()?;
    logging::init(args.debug);

    let config = build_config(&args)?;
    let mut renderer = Renderer::from_config(config)?;

    run(&mut renderer, &args)
}

#[cfg(feature = "display")]
fn run(renderer: &mut Renderer, args: &Args) -> Result<()> {
    if args.headless {
        run_headless(renderer, args.frames.unwrap_or(DEFAULT_FRAMES));
        return Ok(());
    }
    run_window(renderer)
}

#[cfg(not(feature = "display"))]
fn run(renderer: &mut Renderer, args: &Args) -> Result<()> {
    if !args.headless {
        info!("built without the display feature, rendering headless");
    }
    run_headless(renderer, args.frames.unwrap_or(DEFAULT_FRAMES));
    Ok(())
}
