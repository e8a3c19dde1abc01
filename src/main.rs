// Copyright (c) 2026 rezky_nightky

mod cell;
mod charset;
mod config;
mod droplet;
mod field;
mod frame;
mod logging;
mod palette;
mod runtime;
mod scheduler;
mod settings;
mod surface;
mod terminal;

use std::env;
use std::time::{Duration, Instant};

#[cfg(unix)]
use std::thread;

use anyhow::Result;
use clap::builder::styling::{AnsiColor as ClapAnsiColor, Color as ClapColor};
use clap::builder::styling::{Effects as ClapEffects, Style as ClapStyle};
use clap::builder::Styles as ClapStyles;
use clap::{CommandFactory, FromArgMatches};
use crossterm::event::{Event, KeyCode, KeyEventKind};
use tracing::{debug, info, warn};

#[cfg(unix)]
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
#[cfg(unix)]
use signal_hook::iterator::Signals;

use crate::config::{
    color_enabled_stdout, default_params_usage_for_help, print_list_charsets, print_list_colors,
    print_live_keys, Args,
};
use crate::field::{DropField, DEFAULT_MAX_SIM_DELTA};
use crate::frame::Frame;
use crate::palette::ColorScheme;
use crate::runtime::ColorMode;
use crate::scheduler::FrameScheduler;
use crate::settings::{ColorValue, Settings};
use crate::surface::RenderSurface;
use crate::terminal::{restore_terminal_best_effort, Terminal};

const HELP_TEMPLATE_PLAIN: &str = "\
{before-help}{about-with-newline}
USAGE:
  {usage}

{all-args}{after-help}";

const HELP_TEMPLATE_COLOR: &str = "\
{before-help}{about-with-newline}
\x1b[1;36mUSAGE:\x1b[0m
  {usage}

{all-args}{after-help}";

/// Pool statistics are logged once per this many frames.
const STATS_EVERY_FRAMES: u64 = 600;

/// Poll interval while paused.
const PAUSED_POLL: Duration = Duration::from_millis(100);

fn build_info() -> &'static str {
    env!("GLYPHFALL_BUILD")
}

fn clap_styles() -> ClapStyles {
    ClapStyles::styled()
        .header(
            ClapStyle::new()
                .effects(ClapEffects::BOLD)
                .fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Cyan))),
        )
        .usage(
            ClapStyle::new()
                .effects(ClapEffects::BOLD)
                .fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Green))),
        )
        .literal(ClapStyle::new().fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Yellow))))
        .placeholder(ClapStyle::new().fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Magenta))))
}

fn detect_color_mode_auto() -> ColorMode {
    let colorterm = env::var("COLORTERM")
        .unwrap_or_default()
        .to_ascii_lowercase();
    if colorterm.contains("truecolor") || colorterm.contains("24bit") {
        return ColorMode::TrueColor;
    }

    let term = env::var("TERM").unwrap_or_default().to_ascii_lowercase();
    if term == "dumb" {
        return ColorMode::Mono;
    }
    if term.contains("256color") {
        return ColorMode::Color256;
    }

    ColorMode::Color16
}

fn detect_color_mode(args: &Args) -> ColorMode {
    match args.colormode {
        Some(0) => ColorMode::Mono,
        Some(16) => ColorMode::Color16,
        Some(256) => ColorMode::Color256,
        Some(_) => ColorMode::TrueColor,
        None => detect_color_mode_auto(),
    }
}

fn print_check_bitcolor(args: &Args) {
    let colorterm = env::var("COLORTERM").unwrap_or_default();
    let term = env::var("TERM").unwrap_or_default();
    let auto = detect_color_mode_auto();
    let effective = detect_color_mode(args);

    let or_unset = |s: &str| {
        if s.is_empty() {
            "(unset)".to_string()
        } else {
            s.to_string()
        }
    };
    println!("BITCOLOR CHECK:");
    println!("  COLORTERM: {}", or_unset(&colorterm));
    println!("  TERM: {}", or_unset(&term));
    println!("  auto_detected: {}", auto.label());
    if args.colormode.is_some() {
        println!("  forced: {}", effective.label());
    }
    println!("  effective: {}", effective.label());
}

fn load_settings(args: &Args) -> Result<Settings> {
    let base = match &args.settings {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    Ok(args.overlay(base))
}

/// Live key handling. Returns false when the program should quit.
fn handle_key(
    code: KeyCode,
    current: &mut Settings,
    field: &mut DropField,
    frame: &mut Frame,
    sched: &mut FrameScheduler,
) -> bool {
    let mut changed = true;
    match code {
        KeyCode::Esc | KeyCode::Char('q') => return false,
        KeyCode::Char('p') => {
            changed = false;
            let now = Instant::now();
            if field.is_running() {
                field.stop();
                sched.stop();
            } else {
                field.start();
                sched.start(now);
            }
        }
        KeyCode::Char(' ') => {
            changed = false;
            field.restart();
            frame.clear();
        }
        KeyCode::Up => current.speed = current.speed.faster(),
        KeyCode::Down => current.speed = current.speed.slower(),
        KeyCode::Char('+') | KeyCode::Char('=') => current.density = current.density.denser(),
        KeyCode::Char('-') => current.density = current.density.sparser(),
        KeyCode::Char(']') => {
            current.character_size = current.character_size.larger();
            current.font_size = None;
        }
        KeyCode::Char('[') => {
            current.character_size = current.character_size.smaller();
            current.font_size = None;
        }
        KeyCode::Char('c') => {
            current.color = match current.color {
                ColorValue::Scheme(s) => ColorValue::Scheme(s.next()),
                ColorValue::Hex(_) => ColorValue::Scheme(ColorScheme::Green),
            };
        }
        KeyCode::Char('g') => current.character_set = current.character_set.next(),
        _ => changed = false,
    }
    if changed {
        field.apply_settings(current.clone());
    }
    true
}

fn main() -> Result<()> {
    std::panic::set_hook(Box::new(|info| {
        restore_terminal_best_effort();
        eprintln!("{}", info);
    }));

    #[cfg(unix)]
    {
        if let Ok(mut signals) = Signals::new([SIGINT, SIGTERM, SIGHUP]) {
            thread::spawn(move || {
                if let Some(sig) = signals.forever().next() {
                    restore_terminal_best_effort();
                    std::process::exit(128 + sig);
                }
            });
        }
    }

    #[cfg(windows)]
    {
        if let Err(e) = ctrlc::set_handler(|| {
            restore_terminal_best_effort();
            std::process::exit(130);
        }) {
            eprintln!("failed to install Ctrl-C handler: {}", e);
        }
    }

    let mut cmd = Args::command();
    cmd = cmd.styles(clap_styles());
    cmd = cmd.before_help(default_params_usage_for_help());
    cmd = cmd.help_template(if color_enabled_stdout() {
        HELP_TEMPLATE_COLOR
    } else {
        HELP_TEMPLATE_PLAIN
    });
    cmd.build();
    if cmd.get_arguments().any(|a| a.get_id().as_str() == "help") {
        cmd = cmd.mut_arg("help", |a| a.help_heading("HELP"));
    }

    let matches = cmd.get_matches();
    let args = Args::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    if args.list_charsets {
        print_list_charsets();
        return Ok(());
    }
    if args.list_colors {
        print_list_colors();
        return Ok(());
    }
    if args.check_bitcolor {
        print_check_bitcolor(&args);
        return Ok(());
    }
    if args.version {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        return Ok(());
    }
    if args.info {
        println!("Version: v{}", env!("CARGO_PKG_VERSION"));
        println!("Build: {}", build_info());
        let sha = env!("GLYPHFALL_GIT_SHA");
        if !sha.is_empty() {
            println!("Commit: {}", sha);
        }
        println!("Copyright: (c) 2026 {}", env!("CARGO_PKG_AUTHORS"));
        println!("License: {}", env!("CARGO_PKG_LICENSE"));
        println!("Source: {}", env!("CARGO_PKG_REPOSITORY"));
        println!();
        print_live_keys();
        return Ok(());
    }

    let end_after = match args.duration {
        Some(s) if !s.is_finite() => {
            eprintln!("failed to apply --duration {} (must be a finite number)", s);
            std::process::exit(1);
        }
        Some(s) if s > 0.0 && !(0.1..=86400.0).contains(&s) => {
            eprintln!("failed to apply --duration {} (min 0.1 max 86400)", s);
            std::process::exit(1);
        }
        Some(s) if s > 0.0 => Some(Duration::from_secs_f64(s)),
        _ => None,
    };

    logging::init(args.log_file.as_deref())?;
    let mut current = load_settings(&args)?;
    let color_mode = detect_color_mode(&args);
    let seed = args.seed.unwrap_or_else(rand::random::<u64>);
    info!(
        seed,
        color_mode = color_mode.label(),
        fps = args.fps,
        cell_px = args.cell_px,
        "starting"
    );
    if let Ok(json) = current.to_json() {
        debug!(settings = %json, "effective settings");
    }

    let mut term = Terminal::new(color_mode)?;
    let (w, h) = term.size()?;
    let mut frame = Frame::new(w, h, args.cell_px);

    let mut field = DropField::new(current.clone(), seed);
    field.resize(frame.width(), frame.height());

    let start_time = Instant::now();
    let end_time = end_after.map(|d| start_time + d);
    let mut sched = FrameScheduler::new(args.fps, start_time);
    field.set_max_sim_delta(DEFAULT_MAX_SIM_DELTA.max(sched.period() * 2));

    let mut perf_drawn_frames: u64 = 0;
    let mut perf_work_sum_s: f64 = 0.0;
    let mut perf_work_max_s: f32 = 0.0;
    let mut perf_overshoot_frames: u64 = 0;

    let mut running = true;
    while running {
        if end_time.is_some_and(|end| Instant::now() >= end) {
            break;
        }
        let mut pending_resize: Option<(u16, u16)> = None;

        loop {
            while Terminal::poll_event(Duration::ZERO)? {
                match Terminal::read_event()? {
                    Event::Resize(nw, nh) => pending_resize = Some((nw, nh)),
                    Event::Key(k) if k.kind == KeyEventKind::Press => {
                        running = !args.screensaver
                            && handle_key(k.code, &mut current, &mut field, &mut frame, &mut sched);
                        if !running {
                            break;
                        }
                    }
                    _ => {}
                }
            }

            let now = Instant::now();
            if !running || pending_resize.is_some() || sched.is_due(now) {
                break;
            }

            let mut timeout = sched.until_next(now).unwrap_or(PAUSED_POLL);
            if let Some(end) = end_time {
                if now >= end {
                    break;
                }
                timeout = timeout.min(end - now);
            }
            let _ = Terminal::poll_event(timeout)?;
        }

        if !running {
            break;
        }

        if let Some((nw, nh)) = pending_resize {
            frame = Frame::new(nw, nh, args.cell_px);
            field.resize(frame.width(), frame.height());
        }

        let now = Instant::now();
        if !sched.is_due(now) {
            if pending_resize.is_some() && !field.is_running() {
                field.render(&mut frame);
                term.draw(&mut frame)?;
            }
            continue;
        }

        let dt = sched.begin_frame(now);
        let work_start = Instant::now();
        field.frame(dt, &mut frame);
        let did_draw = frame.is_dirty_all() || !frame.dirty_indices().is_empty();
        if did_draw {
            term.draw(&mut frame)?;
            perf_drawn_frames = perf_drawn_frames.saturating_add(1);
        }
        let work_s = work_start.elapsed().as_secs_f32();
        perf_work_sum_s += work_s as f64;
        perf_work_max_s = perf_work_max_s.max(work_s);
        if work_s > sched.period().as_secs_f32() {
            perf_overshoot_frames = perf_overshoot_frames.saturating_add(1);
        }

        if sched.frames() % STATS_EVERY_FRAMES == 0 {
            let st = field.stats();
            debug!(
                frames = sched.frames(),
                ticks = st.ticks,
                columns = st.columns,
                active = st.active,
                visible = st.visible,
                pooled = st.pooled,
                resets = st.resets,
                cell_px = field.derived().cell_px,
                pending = field.has_pending_settings(),
                "pool stats"
            );
            if st.active != st.target {
                warn!(active = st.active, target = st.target, "pool off target");
            }
        }
    }

    drop(term);
    let elapsed_s = start_time.elapsed().as_secs_f64().max(0.000_001);
    let st = field.stats();
    info!(
        elapsed_s,
        frames = sched.frames(),
        resets = st.resets,
        speed = field.settings().speed.name(),
        density = field.settings().density.name(),
        "stopped"
    );

    if args.perf_stats {
        let frames = sched.frames().max(1);
        println!("PERF STATS:");
        println!("  elapsed_s: {:.3}", elapsed_s);
        println!("  target_fps: {:.3}", args.fps);
        println!("  avg_fps: {:.3}", sched.frames() as f64 / elapsed_s);
        println!("  frames: {}", sched.frames());
        println!(
            "  drawn_frames: {} ({:.1}%)",
            perf_drawn_frames,
            perf_drawn_frames as f64 / frames as f64 * 100.0
        );
        println!(
            "  avg_work_ms: {:.3}",
            perf_work_sum_s / frames as f64 * 1000.0
        );
        println!("  max_work_ms: {:.3}", perf_work_max_s as f64 * 1000.0);
        println!(
            "  overshoot_frames: {} ({:.1}%)",
            perf_overshoot_frames,
            perf_overshoot_frames as f64 / frames as f64 * 100.0
        );
        println!(
            "  drops: {} active / {} target over {} columns",
            st.active, st.target, st.columns
        );
        println!("  resets: {}", st.resets);
        println!(
            "  cell_px: {} (terminal cell {} px)",
            frame.font_px(),
            frame.px_per_cell()
        );
    }

    Ok(())
}
