use anyhow::{bail, Context, Result};
use clap::Parser;
use cliplens_core::{
    init, ClipLens, Config, DisplayMode, InputEvent, KeyEvent, KeyKind, PointerEvent, PointerKind,
};
use rdev::{Button, EventType};
use std::sync::mpsc::{self, SyncSender};
use std::thread;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Overlay display mode: off, content, or content-type
    #[arg(long)]
    display_mode: Option<String>,

    /// Override the configured overlay frame rate
    #[arg(long)]
    fps: Option<u32>,

    /// Pin the preview to the screen origin instead of following the cursor
    #[arg(long, default_value_t = false)]
    pin: bool,

    /// Override the OCR service endpoint
    #[arg(long)]
    endpoint: Option<String>,

    /// Persist the effective settings back to disk
    #[arg(long, default_value_t = false)]
    save: bool,
}

fn main() -> Result<()> {
    // Setup
    let _ = dotenvy::dotenv();
    init();
    env_logger::init();
    let args = Args::parse();

    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(mode) = args.display_mode.as_deref() {
        config.display_mode = parse_display_mode(mode)?;
    }
    if let Some(fps) = args.fps {
        config.overlay_fps = fps;
    }
    if args.pin {
        config.follow_mouse = false;
    }
    if let Some(endpoint) = args.endpoint {
        config.ocr_endpoint = endpoint;
    }
    if args.save {
        config.save().context("Failed to save settings")?;
    }

    let app = ClipLens::with_config(config).context("Failed to initialize cliplens")?;

    // Bounded queue between the global hook and the gesture pump; the hook
    // callback must never block, so overflow drops events instead.
    let (tx, rx) = mpsc::sync_channel::<InputEvent>(256);
    app.spawn_input_pump(rx);
    spawn_hook_thread(tx);

    // The overlay owns the main thread until the window closes.
    app.run_overlay().context("Overlay failed")?;
    Ok(())
}

fn parse_display_mode(mode: &str) -> Result<DisplayMode> {
    match mode {
        "off" => Ok(DisplayMode::Off),
        "content" => Ok(DisplayMode::Content),
        "content-type" => Ok(DisplayMode::ContentType),
        other => bail!("Unknown display mode '{other}' (expected off, content, or content-type)"),
    }
}

/// Installs the global mouse/keyboard hook on its own thread and streams
/// normalized events into the core.
fn spawn_hook_thread(tx: SyncSender<InputEvent>) {
    thread::spawn(move || {
        // Button events carry no position, so remember the last move.
        let mut last_position = (0i32, 0i32);

        let outcome = rdev::listen(move |event| {
            if let Some(normalized) = normalize(&event, &mut last_position) {
                if tx.try_send(normalized).is_err() {
                    log::trace!("input queue full, dropping event");
                }
            }
        });

        if let Err(e) = outcome {
            log::error!("global input hook failed: {:?}", e);
        }
    });
}

fn normalize(event: &rdev::Event, last_position: &mut (i32, i32)) -> Option<InputEvent> {
    let pointer = |kind: PointerKind, position: (i32, i32), delta: i32| {
        InputEvent::Pointer(PointerEvent {
            kind,
            x: position.0,
            y: position.1,
            delta,
            timestamp: event.time,
        })
    };

    match event.event_type {
        EventType::MouseMove { x, y } => {
            *last_position = (x as i32, y as i32);
            Some(pointer(PointerKind::Move, *last_position, 0))
        }
        EventType::ButtonPress(Button::Left) => {
            Some(pointer(PointerKind::LeftDown, *last_position, 0))
        }
        EventType::ButtonRelease(Button::Left) => {
            Some(pointer(PointerKind::LeftUp, *last_position, 0))
        }
        EventType::ButtonPress(Button::Right) => {
            Some(pointer(PointerKind::RightDown, *last_position, 0))
        }
        EventType::ButtonRelease(Button::Right) => {
            Some(pointer(PointerKind::RightUp, *last_position, 0))
        }
        EventType::Wheel { delta_y, .. } => {
            Some(pointer(PointerKind::Wheel, *last_position, delta_y as i32))
        }
        EventType::KeyPress(key) => Some(InputEvent::Key(KeyEvent {
            virtual_key_code: virtual_key_code(key)?,
            kind: KeyKind::Down,
            timestamp: event.time,
        })),
        EventType::KeyRelease(key) => Some(InputEvent::Key(KeyEvent {
            virtual_key_code: virtual_key_code(key)?,
            kind: KeyKind::Up,
            timestamp: event.time,
        })),
        _ => None,
    }
}

/// Maps the modifier keys a gate can name onto their Win32 virtual-key
/// codes, which is what the configuration stores. Other keys are not
/// interesting to the gate and are dropped.
fn virtual_key_code(key: rdev::Key) -> Option<u32> {
    use rdev::Key;
    match key {
        Key::ShiftLeft => Some(0xA0),
        Key::ShiftRight => Some(0xA1),
        Key::ControlLeft => Some(0xA2),
        Key::ControlRight => Some(0xA3),
        Key::Alt => Some(0xA4),
        Key::AltGr => Some(0xA5),
        Key::MetaLeft => Some(0x5B),
        Key::MetaRight => Some(0x5C),
        _ => None,
    }
}
