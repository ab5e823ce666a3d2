//! Repeated pass execution
//!
//! A [`PassBatch`] runs one pass definition a number of times over the same
//! render target, inserting read barriers either between iterations or
//! before each one.

use crate::backend::traits::*;
use crate::render_graph::barriers::{self, transition_for_read};
use crate::render_graph::pass::PassDefinition;
use crate::resources::RenderTarget;

/// Where a batch inserts its read barriers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarrierPolicy {
    /// After every iteration except the last
    BetweenIterations(&'static [usize]),
    /// Before every iteration, including the first
    BeforeEachIteration(&'static [usize]),
}

/// One pass repeated `iterations` times
#[derive(Debug, Clone, Copy)]
pub struct PassBatch<'a> {
    pub pass: &'a PassDefinition,
    pub iterations: u32,
    pub barriers: BarrierPolicy,
    /// Draw the UI overlay in the final iteration
    pub overlay: bool,
}

/// Counters of what a batch recorded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub iterations: u32,
    pub draws: u32,
    pub barriers: u32,
    pub overlay_draws: u32,
}

impl std::ops::AddAssign for BatchStats {
    fn add_assign(&mut self, rhs: Self) {
        self.iterations += rhs.iterations;
        self.draws += rhs.draws;
        self.barriers += rhs.barriers;
        self.overlay_draws += rhs.overlay_draws;
    }
}

/// Record every iteration of `batch`. The first recorder error aborts the
/// batch and is returned unchanged.
pub fn execute_batch<R: CommandRecorder + ?Sized>(
    recorder: &mut R,
    target: &mut RenderTarget,
    batch: &PassBatch<'_>,
) -> BackendResult<BatchStats> {
    let mut stats = BatchStats::default();

    for iteration in 0..batch.iterations {
        let last = iteration + 1 == batch.iterations;

        if let BarrierPolicy::BeforeEachIteration(attachments) = batch.barriers {
            stats.barriers += transition_for_read(recorder, target, attachments)? as u32;
        }

        log::trace!(
            "{} pass iteration {}/{}",
            batch.pass.name(),
            iteration + 1,
            batch.iterations
        );
        let overlay = batch.overlay && last;
        record_iteration(recorder, target, batch.pass, overlay)?;
        stats.iterations += 1;
        stats.draws += 1;
        if overlay {
            stats.overlay_draws += 1;
        }

        if let BarrierPolicy::BetweenIterations(attachments) = batch.barriers {
            if !last {
                stats.barriers += transition_for_read(recorder, target, attachments)? as u32;
            }
        }
    }

    Ok(stats)
}

/// Full-extent viewport and scissor, then one render pass instance
fn record_iteration<R: CommandRecorder + ?Sized>(
    recorder: &mut R,
    target: &mut RenderTarget,
    pass: &PassDefinition,
    overlay: bool,
) -> BackendResult<()> {
    let extent = target.extent();
    recorder.set_viewport(0.0, 0.0, extent.width as f32, extent.height as f32, 0.0, 1.0);
    recorder.set_scissor_rect(0, 0, extent.width, extent.height);

    // The recorder sees the layouts the attachments enter the pass in
    recorder.begin_render_pass(pass, target)?;
    barriers::begin_pass(pass, target);
    recorder.draw_pass(pass, target)?;
    if overlay {
        recorder.draw_overlay()?;
    }
    recorder.end_render_pass()?;
    barriers::end_pass(target);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::dummy::{DummyDevice, RecordedCommand, RecordingRecorder};
    use crate::backend::types::*;
    use crate::config::MultipassConfig;
    use crate::pipeline::DeferredPipeline;
    use crate::render_graph::barriers::{GBUFFER_ATTACHMENTS, POST_PROCESS_INPUTS};
    use crate::render_graph::PassRole;
    use crate::resources::RenderTargetBuilder;
    use rstest::rstest;

    fn target() -> RenderTarget {
        let config = MultipassConfig::default();
        let mut device = DummyDevice::new();
        let image = SurfaceImage::new(
            TextureHandle::from_raw(900),
            Extent2d::new(320, 240),
            TextureFormat::Bgra8Unorm,
            TextureUsage::COLOR_ATTACHMENT | TextureUsage::INPUT_ATTACHMENT,
        );
        RenderTargetBuilder::new(&config).build(&mut device, image).unwrap()
    }

    #[rstest]
    #[case::once(1, 0)]
    #[case::four(4, 9)]
    #[case::eight(8, 21)]
    #[case::twelve(12, 33)]
    fn test_geometry_barrier_count(#[case] iterations: u32, #[case] expected: u32) {
        let pipeline = DeferredPipeline::new().unwrap();
        let mut target = target();
        let mut recorder = RecordingRecorder::new();
        let batch = PassBatch {
            pass: pipeline.get(PassRole::Geometry),
            iterations,
            barriers: BarrierPolicy::BetweenIterations(&GBUFFER_ATTACHMENTS),
            overlay: false,
        };

        let stats = execute_batch(&mut recorder, &mut target, &batch).unwrap();
        assert_eq!(stats.barriers, expected);
        assert_eq!(stats.draws, iterations);
        assert_eq!(recorder.barrier_count() as u32, expected);
    }

    #[rstest]
    #[case::once(1)]
    #[case::eight(8)]
    fn test_lighting_overlay_only_on_last_iteration(#[case] iterations: u32) {
        let pipeline = DeferredPipeline::new().unwrap();
        let mut target = target();
        let mut recorder = RecordingRecorder::new();
        let geometry = PassBatch {
            pass: pipeline.get(PassRole::Geometry),
            iterations: 1,
            barriers: BarrierPolicy::BetweenIterations(&GBUFFER_ATTACHMENTS),
            overlay: false,
        };
        execute_batch(&mut recorder, &mut target, &geometry).unwrap();
        recorder.clear();

        let lighting = PassBatch {
            pass: pipeline.get(PassRole::Lighting),
            iterations,
            barriers: BarrierPolicy::BeforeEachIteration(&GBUFFER_ATTACHMENTS),
            overlay: true,
        };
        let stats = execute_batch(&mut recorder, &mut target, &lighting).unwrap();

        assert_eq!(stats.barriers, 3 * iterations);
        assert_eq!(stats.overlay_draws, 1);
        let commands = recorder.commands();
        let overlay_at = commands
            .iter()
            .position(|c| *c == RecordedCommand::DrawOverlay)
            .unwrap();
        assert_eq!(commands[overlay_at + 1], RecordedCommand::EndRenderPass);
        assert_eq!(commands.len(), overlay_at + 2);
    }

    #[test]
    fn test_post_process_barrier_order() {
        let pipeline = DeferredPipeline::new().unwrap();
        let mut target = target();
        let mut recorder = RecordingRecorder::new();
        barriers::begin_pass(pipeline.get(PassRole::Geometry), &mut target);
        barriers::end_pass(&mut target);
        let post = PassBatch {
            pass: pipeline.get(PassRole::PostProcess),
            iterations: 4,
            barriers: BarrierPolicy::BeforeEachIteration(&POST_PROCESS_INPUTS),
            overlay: false,
        };

        let stats = execute_batch(&mut recorder, &mut target, &post).unwrap();
        assert_eq!(stats.barriers, 8);
        assert_eq!(recorder.barrier_attachments(), [4, 1].repeat(4));
    }

    #[test]
    fn test_iteration_sets_full_viewport() {
        let pipeline = DeferredPipeline::new().unwrap();
        let mut target = target();
        let mut recorder = RecordingRecorder::new();
        let batch = PassBatch {
            pass: pipeline.get(PassRole::Geometry),
            iterations: 1,
            barriers: BarrierPolicy::BetweenIterations(&GBUFFER_ATTACHMENTS),
            overlay: false,
        };
        execute_batch(&mut recorder, &mut target, &batch).unwrap();

        assert_eq!(
            &recorder.commands()[..3],
            &[
                RecordedCommand::SetViewport {
                    width: 320.0,
                    height: 240.0
                },
                RecordedCommand::SetScissor {
                    width: 320,
                    height: 240
                },
                RecordedCommand::BeginRenderPass {
                    pass: PassRole::Geometry,
                    layouts: [ImageLayout::Undefined; 5],
                },
            ]
        );
    }

    #[test]
    fn test_repeated_geometry_begins_from_read_only_gbuffer() {
        let pipeline = DeferredPipeline::new().unwrap();
        let mut target = target();
        let mut recorder = RecordingRecorder::new();
        let batch = PassBatch {
            pass: pipeline.get(PassRole::Geometry),
            iterations: 4,
            barriers: BarrierPolicy::BetweenIterations(&GBUFFER_ATTACHMENTS),
            overlay: false,
        };
        execute_batch(&mut recorder, &mut target, &batch).unwrap();

        let begins = recorder.begin_layouts(PassRole::Geometry);
        assert_eq!(begins.len(), 4);
        assert_eq!(begins[0], [ImageLayout::Undefined; 5]);
        for layouts in &begins[1..] {
            assert_eq!(layouts[0], ImageLayout::ColorAttachmentOptimal);
            assert_eq!(layouts[1], ImageLayout::DepthStencilReadOnlyOptimal);
            assert_eq!(layouts[2], ImageLayout::ShaderReadOnlyOptimal);
            assert_eq!(layouts[3], ImageLayout::ShaderReadOnlyOptimal);
            assert_eq!(layouts[4], ImageLayout::ColorAttachmentOptimal);
        }
    }

    #[test]
    fn test_draw_error_aborts_batch() {
        let pipeline = DeferredPipeline::new().unwrap();
        let mut target = target();
        let mut recorder = RecordingRecorder::new().fail_on_draw(PassRole::Geometry, 2);
        let batch = PassBatch {
            pass: pipeline.get(PassRole::Geometry),
            iterations: 4,
            barriers: BarrierPolicy::BetweenIterations(&GBUFFER_ATTACHMENTS),
            overlay: false,
        };

        let err = execute_batch(&mut recorder, &mut target, &batch).unwrap_err();
        assert!(matches!(err, BackendError::DeviceLost));
        assert_eq!(recorder.draw_count(PassRole::Geometry), 1);
    }
}
