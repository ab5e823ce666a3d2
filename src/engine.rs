//! Frame driver
//!
//! [`MultipassSample`] is the per-frame entry point the host loop calls:
//! [`Sample::on_frame`] applies option changes and paces, then
//! [`Sample::render_frame`] records geometry, lighting and post-processing and
//! presents the result.

use crate::backend::traits::*;
use crate::backend::types::TextureUsage;
use crate::config::{MultipassConfig, RuntimeState};
use crate::error::MultipassResult;
use crate::pacing::{FramePacer, Sleeper, ThreadSleeper};
use crate::pipeline::DeferredPipeline;
use crate::render_graph::{
    execute_batch, BarrierPolicy, BatchStats, PassBatch, PassRole, GBUFFER_ATTACHMENTS,
    POST_PROCESS_INPUTS,
};
use crate::resources::{RenderTarget, RenderTargetBuilder};
use crate::scene::SceneProvider;
use crate::ui;

/// Lifecycle of a sample driven by a host loop
pub trait Sample {
    /// Configure the surface before the first render target is built
    fn initialize(&mut self, surface: &mut dyn SurfaceProvider) -> MultipassResult<()>;

    /// Apply pending option changes and pace the frame. Returns the delta
    /// the rest of the frame should use.
    fn on_frame(&mut self, delta: f32) -> MultipassResult<f32>;

    /// Record one frame into `target` and present it
    fn render_frame(
        &mut self,
        recorder: &mut dyn CommandRecorder,
        target: &mut RenderTarget,
        surface: &mut dyn SurfaceProvider,
    ) -> MultipassResult<FrameStats>;

    /// Draw the sample's options window
    fn render_debug_ui(&mut self, ctx: &egui::Context);
}

/// What one frame recorded, per pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub geometry: BatchStats,
    pub lighting: BatchStats,
    pub post_process: BatchStats,
}

impl FrameStats {
    pub fn total(&self) -> BatchStats {
        let mut total = self.geometry;
        total += self.lighting;
        total += self.post_process;
        total
    }

    pub fn draws(&self) -> u32 {
        self.total().draws
    }

    pub fn barriers(&self) -> u32 {
        self.total().barriers
    }
}

/// Deferred pipeline with runtime-adjustable pass repetition
pub struct MultipassSample<S: Sleeper = ThreadSleeper> {
    config: MultipassConfig,
    pipeline: DeferredPipeline,
    state: RuntimeState,
    pacer: FramePacer<S>,
    scene: Box<dyn SceneProvider>,
}

impl MultipassSample<ThreadSleeper> {
    pub fn new(config: MultipassConfig, scene: Box<dyn SceneProvider>) -> MultipassResult<Self> {
        Self::with_pacer(config, scene, FramePacer::new())
    }
}

impl<S: Sleeper> MultipassSample<S> {
    pub fn with_pacer(
        config: MultipassConfig,
        scene: Box<dyn SceneProvider>,
        pacer: FramePacer<S>,
    ) -> MultipassResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            pipeline: DeferredPipeline::new()?,
            state: RuntimeState::new(),
            pacer,
            scene,
        })
    }

    /// Replace the runtime selections, e.g. with startup values
    pub fn with_state(mut self, state: RuntimeState) -> Self {
        self.state = state;
        self
    }

    pub fn config(&self) -> &MultipassConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &DeferredPipeline {
        &self.pipeline
    }

    pub fn state(&self) -> &RuntimeState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut RuntimeState {
        &mut self.state
    }

    pub fn pacer(&self) -> &FramePacer<S> {
        &self.pacer
    }

    /// Build the render target for the current surface configuration
    pub fn create_render_target(
        &self,
        device: &mut dyn GraphicsDevice,
        image: SurfaceImage,
    ) -> MultipassResult<RenderTarget> {
        RenderTargetBuilder::new(&self.config).build(device, image)
    }
}

impl<S: Sleeper> Sample for MultipassSample<S> {
    fn initialize(&mut self, surface: &mut dyn SurfaceProvider) -> MultipassResult<()> {
        let extent = surface.surface_extent();
        log::info!(
            "Initializing deferred multipass sample at {}x{}",
            extent.width,
            extent.height
        );
        surface.configure_usage(TextureUsage::COLOR_ATTACHMENT | TextureUsage::INPUT_ATTACHMENT)?;
        Ok(())
    }

    fn on_frame(&mut self, delta: f32) -> MultipassResult<f32> {
        self.state.apply_changes();
        Ok(self.pacer.pace(self.state.target_rate(), delta))
    }

    fn render_frame(
        &mut self,
        recorder: &mut dyn CommandRecorder,
        target: &mut RenderTarget,
        surface: &mut dyn SurfaceProvider,
    ) -> MultipassResult<FrameStats> {
        let iterations = self.state.iterations();

        let geometry = execute_batch(
            recorder,
            target,
            &PassBatch {
                pass: self.pipeline.get(PassRole::Geometry),
                iterations: iterations.geometry,
                barriers: BarrierPolicy::BetweenIterations(&GBUFFER_ATTACHMENTS),
                overlay: false,
            },
        )?;

        let lighting = execute_batch(
            recorder,
            target,
            &PassBatch {
                pass: self.pipeline.get(PassRole::Lighting),
                iterations: iterations.lighting,
                barriers: BarrierPolicy::BeforeEachIteration(&GBUFFER_ATTACHMENTS),
                overlay: self.config.ui_overlay,
            },
        )?;

        let post_process = execute_batch(
            recorder,
            target,
            &PassBatch {
                pass: self.pipeline.get(PassRole::PostProcess),
                iterations: iterations.post_process,
                barriers: BarrierPolicy::BeforeEachIteration(&POST_PROCESS_INPUTS),
                overlay: false,
            },
        )?;

        surface.present(target.presentable().texture())?;

        Ok(FrameStats {
            geometry,
            lighting,
            post_process,
        })
    }

    fn render_debug_ui(&mut self, ctx: &egui::Context) {
        let aspect_ratio = self.scene.camera_aspect_ratio();
        ui::show_options_window(ctx, &mut self.state, aspect_ratio);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::dummy::{DummyDevice, DummySurface, RecordingRecorder};
    use crate::backend::types::Extent2d;
    use crate::config::OptionGroup;
    use crate::scene::FixedAspectScene;
    use std::time::Duration;

    #[derive(Debug, Default)]
    struct NoSleep(Vec<Duration>);

    impl Sleeper for NoSleep {
        fn sleep(&mut self, duration: Duration) {
            self.0.push(duration);
        }
    }

    fn sample() -> MultipassSample<NoSleep> {
        MultipassSample::with_pacer(
            MultipassConfig::default(),
            Box::new(FixedAspectScene { aspect_ratio: 1.5 }),
            FramePacer::with_sleeper(NoSleep::default()),
        )
        .unwrap()
    }

    #[test]
    fn test_initialize_requests_input_attachment_usage() {
        let mut sample = sample();
        let mut surface = DummySurface::new(Extent2d::new(64, 64));
        sample.initialize(&mut surface).unwrap();
        assert!(surface
            .usage()
            .contains(TextureUsage::COLOR_ATTACHMENT | TextureUsage::INPUT_ATTACHMENT));
    }

    #[test]
    fn test_frame_presents_presentable_attachment() {
        let mut sample = sample();
        let mut surface = DummySurface::new(Extent2d::new(64, 64));
        let mut device = DummyDevice::new();
        let mut recorder = RecordingRecorder::new();
        sample.initialize(&mut surface).unwrap();
        let image = surface.acquire_image().unwrap();
        let mut target = sample.create_render_target(&mut device, image).unwrap();

        let stats = sample
            .render_frame(&mut recorder, &mut target, &mut surface)
            .unwrap();

        assert_eq!(stats.draws(), 3);
        assert_eq!(stats.barriers(), 5);
        assert_eq!(stats.lighting.overlay_draws, 1);
        assert_eq!(surface.presented(), &[target.presentable().texture()]);
    }

    #[test]
    fn test_overlay_can_be_disabled() {
        let config = MultipassConfig {
            ui_overlay: false,
            ..Default::default()
        };
        let mut sample = MultipassSample::with_pacer(
            config,
            Box::new(FixedAspectScene { aspect_ratio: 1.0 }),
            FramePacer::with_sleeper(NoSleep::default()),
        )
        .unwrap();
        let mut surface = DummySurface::new(Extent2d::new(8, 8));
        let mut device = DummyDevice::new();
        let mut recorder = RecordingRecorder::new();
        sample.initialize(&mut surface).unwrap();
        let image = surface.acquire_image().unwrap();
        let mut target = sample.create_render_target(&mut device, image).unwrap();

        sample
            .render_frame(&mut recorder, &mut target, &mut surface)
            .unwrap();
        assert_eq!(recorder.overlay_count(), 0);
    }

    #[test]
    fn test_on_frame_applies_rate_change_immediately() {
        let mut sample = sample();
        sample.state_mut().select(OptionGroup::TargetFps, 3);
        let delta = sample.on_frame(0.001).unwrap();
        assert_eq!(delta, 1.0 / 60.0);
        assert_eq!(sample.pacer().sleeper().0, vec![Duration::from_millis(15)]);
    }
}
