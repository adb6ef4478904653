use std::path::PathBuf;

use anyhow::{Context, Result};
use sigil_engine::audio::KiraAudio;
use sigil_engine::backend::Desktop;
use sigil_engine::input::{Key, MouseButton};
use sigil_engine::logging::{LoggingConfig, init_logging};
use sigil_engine::{Sigil, TextAlign, WindowConfig};

const WIDTH: u32 = 800;
const HEIGHT: u32 = 600;

/// Optional assets: `sigil-demo [sprite.png] [sound.wav]`.
struct Args {
    sprite: Option<PathBuf>,
    sound: Option<PathBuf>,
}

impl Args {
    fn parse() -> Self {
        let mut args = std::env::args_os().skip(1).map(PathBuf::from);
        Self {
            sprite: args.next(),
            sound: args.next(),
        }
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());
    let args = Args::parse();

    let mut sl = Sigil::new(Desktop::new(), KiraAudio::new());
    sl.open(&WindowConfig::new("sigil demo", WIDTH, HEIGHT))
        .context("could not open the demo window")?;

    match find_font() {
        Some(path) => sl.set_font(&path, 24.0)?,
        None => log::warn!("no system font found; text will not be drawn"),
    }

    // Missing assets are not fatal; the demo just skips them.
    let sprite = args.sprite.and_then(|p| sl.load_texture(p).ok());
    let sound = args.sound.and_then(|p| sl.load_wav(p).ok());
    let music = sound.and_then(|s| sl.sound_loop(s).ok());

    let (w, h) = (WIDTH as f32, HEIGHT as f32);
    let mut angle = 0.0f32;
    let mut scroll = 0.0f32;
    let mut space_was_down = false;

    while !sl.should_close()? {
        if sl.key_down(Key::Escape) {
            break;
        }

        let dt = sl.delta_time();
        angle += 90.0 * dt;
        scroll += 0.25 * dt;

        // Space toggles the background loop.
        let space_down = sl.key_down(Key::Space);
        if let Some(voice) = music {
            if space_down && !space_was_down {
                if sl.sound_playing(voice) {
                    sl.sound_pause(voice)?;
                } else {
                    sl.sound_resume(voice)?;
                }
            }
        }
        space_was_down = space_down;

        sl.set_back_color(0.08, 0.08, 0.12);

        // Outlined and filled shapes under a spinning transform.
        sl.push()?;
        sl.translate(w * 0.25, h * 0.6);
        sl.rotate(angle);
        sl.set_fore_color(0.9, 0.3, 0.2, 1.0);
        sl.rectangle_fill(0.0, 0.0, 120.0, 80.0);
        sl.set_fore_color(1.0, 1.0, 1.0, 1.0);
        sl.rectangle_outline(0.0, 0.0, 140.0, 100.0);
        sl.pop()?;

        sl.set_fore_color(0.2, 0.8, 0.4, 1.0);
        sl.triangle_fill(w * 0.5, h * 0.6, 100.0, 100.0);
        sl.set_fore_color(0.9, 0.9, 0.2, 1.0);
        sl.triangle_outline(w * 0.5, h * 0.6, 120.0, 120.0);

        sl.set_fore_color(0.3, 0.5, 1.0, 1.0);
        sl.circle_fill(w * 0.75, h * 0.6, 50.0, 32);
        sl.circle_outline(w * 0.75, h * 0.6, 60.0, 6);

        // Additive glow dots around the cursor.
        let mouse = sl.mouse_position();
        sl.set_additive_blend(true);
        sl.set_fore_color(1.0, 0.6, 0.2, 0.35);
        for i in 0..12 {
            let a = (i as f32 * 30.0 + angle).to_radians();
            sl.circle_fill(mouse.x + 30.0 * a.cos(), mouse.y + 30.0 * a.sin(), 8.0, 12);
        }
        sl.set_additive_blend(false);

        // A grid of points and a fan of lines share their batches.
        sl.set_fore_color(0.7, 0.7, 0.7, 1.0);
        for x in (20..WIDTH).step_by(20) {
            sl.point(x as f32, 20.0);
        }
        for i in 0..16 {
            let t = i as f32 / 15.0;
            sl.line(w * 0.5, 40.0, w * t, h * 0.35);
        }

        if let Some(texture) = sprite {
            sl.set_sprite_tiling(2.0, 2.0);
            sl.set_sprite_scroll(scroll, 0.0);
            sl.set_fore_color(1.0, 1.0, 1.0, 1.0);
            sl.sprite(texture, w * 0.5, h * 0.25, 160.0, 96.0);
        }

        sl.set_fore_color(1.0, 1.0, 1.0, 1.0);
        sl.set_text_align(TextAlign::Left);
        sl.text(10.0, h - 30.0, "left");
        sl.set_text_align(TextAlign::Center);
        sl.text(w * 0.5, h - 30.0, "sigil demo");
        sl.set_text_align(TextAlign::Right);
        sl.text(w - 10.0, h - 30.0, &format!("{:.0} fps", 1.0 / dt));

        if sl.mouse_button_down(MouseButton::Left) {
            sl.set_text_align(TextAlign::Center);
            sl.text(mouse.x, mouse.y + 40.0, "click");
        }

        sl.render()?;
    }

    sl.sound_stop_all();
    sl.close()?;
    Ok(())
}

fn find_font() -> Option<PathBuf> {
    [
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/noto/NotoSans-Regular.ttf",
        "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
        "C:\\Windows\\Fonts\\arial.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
    ]
    .iter()
    .map(PathBuf::from)
    .find(|p| p.is_file())
}
