//! slate2d demo entry point.
//!
//! Builds a small scene (animated sprites from a sprite sheet, a caption and
//! a frame counter drawn with a bitmap font, a spinner animated outside the
//! ECS) and runs it:
//!
//! - headless by default, on the recording driver, logging how many draw
//!   calls and display list replays each frame cost;
//! - in a window through raylib's rlgl layer with `--window` (needs the
//!   `raylib` feature).
//!
//! # Running
//!
//! ```sh
//! cargo run --release -- --frames 240 --renderer immediate
//! RUST_LOG=debug cargo run --release
//! cargo run --release --features raylib -- --window
//! ```

use bevy_ecs::prelude::*;
use clap::Parser;
use std::path::PathBuf;

use slate2d::components::animation::{Animation, ManualClock};
use slate2d::components::dynamictext::DynamicText;
use slate2d::components::mapposition::MapPosition;
use slate2d::components::sprite::Sprite;
use slate2d::components::zindex::ZIndex;
use slate2d::error::EngineResult;
use slate2d::events::animation::AnimationFinished;
use slate2d::font::{BitmapFont, GlyphAtlas, GlyphDef};
use slate2d::image::{Image, Texture};
use slate2d::render::{
    Color, DrawCommand, GeometryBatch, Immediate, RecordingBackend, RenderBackend, RendererKind,
};
use slate2d::resources::animationstore::{AnimationDef, AnimationStore, FrameDef};
use slate2d::resources::fontstore::FontStore;
use slate2d::resources::renderconfig::RenderConfig;
use slate2d::resources::texturestore::{TextureFlags, TextureStore};
use slate2d::resources::worldtime::WorldTime;
use slate2d::spritesheet::SpriteSheet;
use slate2d::systems::animation::{animation, update_animation_messages};
use slate2d::systems::render::render_pass;
use slate2d::systems::time::update_world_time;

/// slate2d rendering core demo
#[derive(Parser)]
#[command(version, about = "Batched 2D rendering, sprite animation and cached bitmap text")]
struct Cli {
    /// INI configuration file.
    #[arg(long, value_name = "PATH", default_value = "./config.ini")]
    config: PathBuf,

    /// Frames to simulate in headless mode.
    #[arg(long, default_value_t = 120)]
    frames: u32,

    /// Renderer override: immediate or vertex_array.
    #[arg(long, value_name = "KIND")]
    renderer: Option<RendererKind>,

    /// Open a window instead of running headless.
    #[cfg(feature = "raylib")]
    #[arg(long)]
    window: bool,
}

/// Marks the text entity showing the frame number.
#[derive(Component)]
struct FrameCounter;

const SHEET_TEXTURE_ID: u32 = 1;
const FONT_TEXTURE_ID: u32 = 2;
const GLYPH_CELL: u32 = 8;

/// Glyphs for printable ASCII laid out 16 to a row in 8x8 cells.
fn demo_glyphs() -> Vec<GlyphDef> {
    (32u32..127)
        .map(|code| {
            let i = code - 32;
            GlyphDef {
                id: code,
                x: (i % 16) * GLYPH_CELL,
                y: (i / 16) * GLYPH_CELL,
                width: if code == ' ' as u32 { 0 } else { GLYPH_CELL - 1 },
                height: GLYPH_CELL,
                xoffset: 0,
                yoffset: 0,
                xadvance: GLYPH_CELL as i32,
                kerning: match code as u8 {
                    b'A' => vec![('V' as u32, -1), ('T' as u32, -1)],
                    b'T' => vec![('a' as u32, -1)],
                    _ => Vec::new(),
                },
            }
        })
        .collect()
}

fn walk_def() -> AnimationDef {
    AnimationDef {
        sheet: "hero".to_string(),
        frames: (0..4)
            .map(|col| FrameDef {
                col,
                row: 0,
                duration_ms: 120,
            })
            .collect(),
        looping: true,
        ping_pong: false,
        speed: 1.0,
        stop_at: None,
    }
}

/// Populate the world. `renderer` is only used to allocate font display lists.
fn build_scene(
    world: &mut World,
    config: &RenderConfig,
    sheet_texture: Texture,
    font_texture: Texture,
    renderer: &mut dyn RenderBackend,
) -> EngineResult<()> {
    world.insert_resource(WorldTime::default());
    world.init_resource::<Messages<AnimationFinished>>();

    let mut textures = TextureStore::new();
    textures.insert("hero", TextureFlags::NONE, sheet_texture);
    textures.insert("font", TextureFlags::NONE, font_texture);
    world.insert_resource(textures);

    let mut store = AnimationStore::new();
    store.add_sheet("hero", SpriteSheet::new(Image::new(sheet_texture), 16, 16)?);
    store.add("walk", walk_def());
    let mut once = walk_def();
    once.looping = false;
    once.ping_pong = true;
    store.add("wave", once);

    for i in 0..8 {
        let mut anim = store.build("walk")?;
        anim.set_speed(1.0 + i as f32 * 0.25);
        world.spawn((
            Sprite::new("hero", 32.0, 32.0).with_origin(16.0, 16.0),
            MapPosition::new(40.0 + i as f32 * 40.0, 100.0),
            ZIndex(i % 3),
            anim,
        ));
    }
    let mut flipped = Sprite::new("hero", 32.0, 32.0).with_tint(Color::new(1.0, 0.8, 0.8, 1.0));
    flipped.flip_h = true;
    world.spawn((flipped, MapPosition::new(200.0, 180.0), store.build("wave")?));
    world.insert_resource(store);

    let atlas = GlyphAtlas::new(Image::new(font_texture), &demo_glyphs());
    let font = match config.font_cache_size() {
        Some(size) => BitmapFont::with_display_lists(atlas, 10, renderer, size),
        None => BitmapFont::new(atlas, 10),
    };
    let mut fonts = FontStore::new();
    fonts.add("small", font);
    world.insert_resource(fonts);

    world.spawn((
        DynamicText::new("slate2d: AVATAR Table", "small", Color::WHITE),
        MapPosition::new(8.0, 8.0),
        ZIndex(10),
    ));
    world.spawn((
        DynamicText::new("", "small", Color::GREEN),
        MapPosition::new(8.0, 20.0),
        ZIndex(10),
        FrameCounter,
    ));
    Ok(())
}

fn update_frame_counter(time: Res<WorldTime>, mut query: Query<&mut DynamicText, With<FrameCounter>>) {
    for mut text in query.iter_mut() {
        // only a few distinct strings, so the font cache keeps hitting
        text.set_content(format!("frame {}", time.frame_count % 16));
    }
}

fn report_finished(mut reader: MessageReader<AnimationFinished>) {
    for msg in reader.read() {
        log::info!("Animation on {:?} finished at frame {}", msg.entity, msg.frame);
    }
}

fn build_schedule() -> Schedule {
    let mut update = Schedule::default();
    update.add_systems((animation, update_animation_messages, report_finished).chain());
    update.add_systems(update_frame_counter);
    update
}

/// Spinner drawn straight from an animation that times itself.
fn spinner(font_texture: Texture) -> EngineResult<Animation> {
    let page = Image::new(font_texture);
    let frames: Vec<Image> = ['|', '/', '-', '\\']
        .iter()
        .map(|&c| {
            let i = c as u32 - 32;
            page.sub_image((i % 16) * GLYPH_CELL, (i / 16) * GLYPH_CELL, GLYPH_CELL, GLYPH_CELL)
        })
        .collect();
    Animation::from_images(&frames, 100)
}

#[derive(Default)]
struct FrameTotals {
    draw_calls: usize,
    list_calls: usize,
    vertices: usize,
}

impl FrameTotals {
    fn add(&mut self, commands: &[DrawCommand]) {
        for cmd in commands {
            match cmd {
                DrawCommand::Begin(_) => self.draw_calls += 1,
                DrawCommand::DrawArrays { positions, .. } => {
                    self.draw_calls += 1;
                    self.vertices += positions.len();
                }
                DrawCommand::Vertex(_) => self.vertices += 1,
                DrawCommand::CallList(_) => self.list_calls += 1,
                _ => {}
            }
        }
    }
}

fn run_headless<R, F>(
    world: &mut World,
    renderer: &mut R,
    frames: u32,
    target_fps: u32,
    mut drain: F,
) -> EngineResult<FrameTotals>
where
    R: RenderBackend,
    F: FnMut(&mut R) -> Vec<DrawCommand>,
{
    let mut update = build_schedule();
    let dt = 1.0 / target_fps.max(1) as f32;
    let clock = ManualClock::new(0);
    let font_texture = world
        .resource::<TextureStore>()
        .get_plain("font")
        .copied()
        .unwrap_or(Texture::exact(FONT_TEXTURE_ID, 128, 64));
    let mut spin = spinner(font_texture)?;
    let mut totals = FrameTotals::default();

    for frame in 0..frames {
        update_world_time(world, dt);
        update.run(world);
        world.clear_trackers();

        let drawn = render_pass(world, renderer)?;
        spin.draw(renderer, &clock, 300.0, 8.0, Color::WHITE)?;
        renderer.flush();
        clock.advance((dt * 1000.0) as u64);

        let mut this_frame = FrameTotals::default();
        this_frame.add(&drain(renderer));
        log::debug!(
            "frame {}: {} items, {} draw calls, {} list calls, {} vertices",
            frame,
            drawn,
            this_frame.draw_calls,
            this_frame.list_calls,
            this_frame.vertices
        );
        totals.draw_calls += this_frame.draw_calls;
        totals.list_calls += this_frame.list_calls;
        totals.vertices += this_frame.vertices;
    }

    if let Some(mut fonts) = world.remove_resource::<FontStore>() {
        if let Some(cache) = fonts.get("small").and_then(|f| f.cache()) {
            let stats = cache.stats();
            log::info!(
                "Font cache: {} hits, {} misses, {} evictions",
                stats.hits,
                stats.misses,
                stats.evictions
            );
        }
        fonts.release(renderer);
    }
    Ok(totals)
}

fn headless(config: &RenderConfig, frames: u32) -> EngineResult<()> {
    let sheet_texture = Texture::new(SHEET_TEXTURE_ID, 64, 16);
    let font_texture = Texture::exact(FONT_TEXTURE_ID, 128, 64);
    let mut world = World::new();

    let totals = match config.renderer {
        RendererKind::VertexArray => {
            let mut renderer = GeometryBatch::new(RecordingBackend::new(), config.batch);
            build_scene(&mut world, config, sheet_texture, font_texture, &mut renderer)?;
            let totals = run_headless(&mut world, &mut renderer, frames, config.target_fps, |r| {
                r.driver_mut().take_commands()
            })?;
            let stats = renderer.stats();
            log::info!(
                "Batching: {} array draws, {} direct replays, {} splits, {} overflows",
                stats.batched_draws,
                stats.direct_replays,
                stats.splits,
                stats.overflows
            );
            totals
        }
        RendererKind::Immediate => {
            let mut renderer = Immediate::new(RecordingBackend::new());
            build_scene(&mut world, config, sheet_texture, font_texture, &mut renderer)?;
            run_headless(&mut world, &mut renderer, frames, config.target_fps, |r| {
                r.driver_mut().take_commands()
            })?
        }
    };

    log::info!(
        "{} frames: {} draw calls, {} list calls, {} vertices submitted",
        frames,
        totals.draw_calls,
        totals.list_calls,
        totals.vertices
    );
    Ok(())
}

#[cfg(feature = "raylib")]
fn windowed(config: &RenderConfig) -> Result<(), String> {
    use slate2d::components::animation::SystemClock;
    use slate2d::render::create_renderer;
    use slate2d::render::rlgl::RlglBackend;

    let (mut rl, thread) = raylib::init()
        .size(config.window_width as i32, config.window_height as i32)
        .title("slate2d")
        .build();
    rl.set_target_fps(config.target_fps);

    let checker = raylib::prelude::Image::gen_image_checked(
        64,
        16,
        4,
        1,
        raylib::prelude::Color::ORANGE,
        raylib::prelude::Color::DARKBLUE,
    );
    let sheet_tex = rl
        .load_texture_from_image(&thread, &checker)
        .map_err(|e| e.to_string())?;
    let glyphs = raylib::prelude::Image::gen_image_checked(
        128,
        64,
        16,
        8,
        raylib::prelude::Color::WHITE,
        raylib::prelude::Color::BLANK,
    );
    let font_tex = rl
        .load_texture_from_image(&thread, &glyphs)
        .map_err(|e| e.to_string())?;

    let sheet_texture = Texture::exact(sheet_tex.id, 64, 16);
    let font_texture = Texture::exact(font_tex.id, 128, 64);

    let mut world = World::new();
    let mut setup = RlglBackend::new();
    build_scene(&mut world, config, sheet_texture, font_texture, &mut setup)
        .map_err(|e| e.to_string())?;
    let mut update = build_schedule();
    let clock = SystemClock::new();
    let mut spin = spinner(font_texture).map_err(|e| e.to_string())?;

    while !rl.window_should_close() {
        let dt = rl.get_frame_time();
        update_world_time(&mut world, dt);
        update.run(&mut world);
        world.clear_trackers();

        let mut d = rl.begin_drawing(&thread);
        d.clear_background(raylib::prelude::Color::BLACK);
        let mut driver = RlglBackend::new();
        driver.set_drawing(true);
        let mut renderer = create_renderer(config.renderer, driver, config.batch);
        let frame = render_pass(&mut world, renderer.as_mut())
            .and_then(|_| spin.draw(renderer.as_mut(), &clock, 300.0, 8.0, Color::WHITE));
        renderer.flush();
        if let Err(e) = frame {
            log::error!("Frame aborted: {}", e);
        }
    }
    Ok(())
}

#[cfg(not(feature = "raylib"))]
fn windowed(_config: &RenderConfig) -> Result<(), String> {
    Err("built without the raylib feature".to_string())
}

#[cfg(feature = "raylib")]
fn wants_window(cli: &Cli) -> bool {
    cli.window
}

#[cfg(not(feature = "raylib"))]
fn wants_window(_cli: &Cli) -> bool {
    false
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = RenderConfig::with_path(cli.config.clone());
    if let Err(e) = config.load_from_file() {
        log::info!("{}; using defaults", e);
    }
    if let Some(kind) = cli.renderer {
        config.renderer = kind;
    }

    if wants_window(&cli) {
        if let Err(e) = windowed(&config) {
            log::error!("{}", e);
            std::process::exit(1);
        }
        return;
    }

    if let Err(e) = headless(&config, cli.frames) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
