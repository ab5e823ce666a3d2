//! Headless benchmark of the deferred multipass sample.
//!
//! Drives the sample over the recording backend and prints what each frame
//! recorded together with the paced frame time.
//!
//! ```bash
//! # Twelve geometry repetitions at 60 fps for 30 frames
//! cargo run --example headless_bench -- --geometry 12x --fps 60 --frames 30
//! ```

use std::time::Instant;

use clap::Parser;
use deferred_multipass::backend::dummy::{DummyDevice, DummySurface, RecordingRecorder};
use deferred_multipass::backend::{Extent2d, SurfaceProvider};
use deferred_multipass::scene::FixedAspectScene;
use deferred_multipass::{MultipassConfig, MultipassSample, OptionGroup, RuntimeState, Sample};

#[derive(Parser, Debug)]
#[command(
    name = "headless_bench",
    about = "Run the deferred multipass passes without a GPU"
)]
struct Args {
    /// Geometry pass repetitions
    #[arg(long, default_value = "1x", value_parser = ["1x", "4x", "8x", "12x"])]
    geometry: String,

    /// Lighting pass repetitions
    #[arg(long, default_value = "1x", value_parser = ["1x", "4x", "8x", "12x"])]
    lighting: String,

    /// Post-processing pass repetitions
    #[arg(long, default_value = "1x", value_parser = ["1x", "4x", "8x", "12x"])]
    post: String,

    /// Target frame rate
    #[arg(long, default_value = "20", value_parser = ["20", "30", "40", "60"])]
    fps: String,

    /// Number of frames to run
    #[arg(long, default_value = "10")]
    frames: u32,

    /// Surface width
    #[arg(long, default_value = "1280")]
    width: u32,

    /// Surface height
    #[arg(long, default_value = "720")]
    height: u32,
}

fn option_index(group: OptionGroup, label: &str) -> usize {
    group
        .options()
        .iter()
        .position(|option| *option == label)
        .unwrap_or_default()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let state = RuntimeState::new()
        .with_selection(
            OptionGroup::GeometryPassCount,
            option_index(OptionGroup::GeometryPassCount, &args.geometry),
        )
        .with_selection(
            OptionGroup::LightingPassCount,
            option_index(OptionGroup::LightingPassCount, &args.lighting),
        )
        .with_selection(
            OptionGroup::PostProcessingPassCount,
            option_index(OptionGroup::PostProcessingPassCount, &args.post),
        )
        .with_selection(OptionGroup::TargetFps, option_index(OptionGroup::TargetFps, &args.fps));

    let scene = FixedAspectScene {
        aspect_ratio: args.width as f32 / args.height.max(1) as f32,
    };
    let mut sample = MultipassSample::new(MultipassConfig::default(), Box::new(scene))?.with_state(state);

    let mut surface = DummySurface::new(Extent2d::new(args.width, args.height));
    let mut device = DummyDevice::new();
    sample.initialize(&mut surface)?;
    let image = surface.acquire_image()?;
    let mut target = sample.create_render_target(&mut device, image)?;

    let mut last = Instant::now();
    for frame in 0..args.frames {
        let mut recorder = RecordingRecorder::new();
        let measured = last.elapsed().as_secs_f32();
        let delta = sample.on_frame(measured)?;
        last = Instant::now();

        let stats = sample.render_frame(&mut recorder, &mut target, &mut surface)?;
        println!(
            "frame {frame:>4}: delta {:>7.2} ms | geometry {:>2} lighting {:>2} post {:>2} | draws {:>2} barriers {:>3} overlay {}",
            delta * 1000.0,
            stats.geometry.iterations,
            stats.lighting.iterations,
            stats.post_process.iterations,
            stats.draws(),
            stats.barriers(),
            stats.lighting.overlay_draws
        );
    }

    target.release(&mut device);
    log::info!("Presented {} frames", surface.presented().len());
    Ok(())
}
