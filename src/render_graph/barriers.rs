//! Attachment layout transitions between passes
//!
//! The scheduler owns the per-attachment layout bookkeeping of a
//! [`RenderTarget`]. Render pass begin/end move attachments into their write
//! layouts; [`transition_for_read`] moves written attachments into their read
//! layouts so the next pass can consume them as input attachments.

use crate::backend::traits::*;
use crate::backend::types::*;
use crate::render_graph::pass::PassDefinition;
use crate::resources::{AttachmentRole, RenderTarget};

/// Depth, albedo and normal: written by geometry, read by lighting
pub const GBUFFER_ATTACHMENTS: [usize; 3] = [1, 2, 3];

/// Post-input then depth: read by post-processing
pub const POST_PROCESS_INPUTS: [usize; 2] = [4, 1];

/// Write-to-read transition for an attachment of the given role
pub fn read_barrier(role: AttachmentRole) -> ImageMemoryBarrier {
    if role.is_depth() {
        ImageMemoryBarrier {
            old_layout: ImageLayout::DepthStencilAttachmentOptimal,
            new_layout: ImageLayout::DepthStencilReadOnlyOptimal,
            src_stage_mask: PipelineStageFlags::EARLY_FRAGMENT_TESTS
                | PipelineStageFlags::LATE_FRAGMENT_TESTS,
            dst_stage_mask: PipelineStageFlags::FRAGMENT_SHADER,
            src_access_mask: AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            dst_access_mask: AccessFlags::INPUT_ATTACHMENT_READ,
        }
    } else {
        ImageMemoryBarrier {
            old_layout: ImageLayout::ColorAttachmentOptimal,
            new_layout: ImageLayout::ShaderReadOnlyOptimal,
            src_stage_mask: PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
            dst_stage_mask: PipelineStageFlags::FRAGMENT_SHADER,
            src_access_mask: AccessFlags::COLOR_ATTACHMENT_WRITE,
            dst_access_mask: AccessFlags::INPUT_ATTACHMENT_READ,
        }
    }
}

/// Record one read barrier per attachment index, in order, and track the
/// resulting layouts. Returns the number of barriers recorded.
///
/// Every attachment must currently sit in its write layout, which is where
/// the end of a render pass leaves it.
///
/// # Panics
///
/// Panics if an attachment is in any other layout, e.g. when it was already
/// transitioned since the last render pass ended.
pub fn transition_for_read<R: CommandRecorder + ?Sized>(
    recorder: &mut R,
    target: &mut RenderTarget,
    attachments: &[usize],
) -> BackendResult<usize> {
    for &index in attachments {
        let attachment = target.attachment(index);
        let barrier = read_barrier(attachment.role());
        assert_eq!(
            attachment.layout(),
            barrier.old_layout,
            "attachment {index} ({}) transitioned from an untracked layout",
            attachment.role()
        );

        log::trace!(
            "Barrier on attachment {index} ({}): {:?} -> {:?}",
            attachment.role(),
            barrier.old_layout,
            barrier.new_layout
        );
        recorder.image_memory_barrier(attachment, &barrier)?;
        target.attachment_mut(index).set_layout(barrier.new_layout);
    }
    Ok(attachments.len())
}

/// Layout bookkeeping for the start of a render pass.
///
/// # Panics
///
/// Panics if an attachment the pass reads from outside is not in its read
/// layout. That means a barrier is missing from the schedule.
pub fn begin_pass(pass: &PassDefinition, target: &mut RenderTarget) {
    let inputs = pass.external_inputs();
    for &index in &inputs {
        let attachment = target.attachment(index);
        assert_eq!(
            attachment.layout(),
            attachment.role().read_layout(),
            "{} pass reads attachment {index} ({}) without a barrier",
            pass.name(),
            attachment.role()
        );
    }

    for index in 0..target.attachments().len() {
        if !inputs.contains(&index) {
            let attachment = target.attachment_mut(index);
            let layout = attachment.role().write_layout();
            attachment.set_layout(layout);
        }
    }
}

/// Layout bookkeeping for the end of a render pass: every attachment returns
/// to its write layout
pub fn end_pass(target: &mut RenderTarget) {
    for index in 0..target.attachments().len() {
        let attachment = target.attachment_mut(index);
        let layout = attachment.role().write_layout();
        attachment.set_layout(layout);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::dummy::{DummyDevice, RecordingRecorder};
    use crate::config::MultipassConfig;
    use crate::pipeline::DeferredPipeline;
    use crate::render_graph::PassRole;
    use crate::resources::RenderTargetBuilder;

    fn target() -> RenderTarget {
        let config = MultipassConfig::default();
        let mut device = DummyDevice::new();
        let image = SurfaceImage::new(
            TextureHandle::from_raw(500),
            Extent2d::new(64, 64),
            TextureFormat::Bgra8Unorm,
            TextureUsage::COLOR_ATTACHMENT | TextureUsage::INPUT_ATTACHMENT,
        );
        RenderTargetBuilder::new(&config).build(&mut device, image).unwrap()
    }

    #[test]
    fn test_depth_barrier_fields() {
        let barrier = read_barrier(AttachmentRole::Depth);
        assert_eq!(barrier.old_layout, ImageLayout::DepthStencilAttachmentOptimal);
        assert_eq!(barrier.new_layout, ImageLayout::DepthStencilReadOnlyOptimal);
        assert!(barrier
            .src_stage_mask
            .contains(PipelineStageFlags::EARLY_FRAGMENT_TESTS | PipelineStageFlags::LATE_FRAGMENT_TESTS));
        assert_eq!(barrier.src_access_mask, AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE);
        assert_eq!(barrier.dst_stage_mask, PipelineStageFlags::FRAGMENT_SHADER);
        assert_eq!(barrier.dst_access_mask, AccessFlags::INPUT_ATTACHMENT_READ);
    }

    #[test]
    fn test_color_barrier_fields() {
        for role in [AttachmentRole::Albedo, AttachmentRole::Normal, AttachmentRole::PostInput] {
            let barrier = read_barrier(role);
            assert_eq!(barrier.old_layout, ImageLayout::ColorAttachmentOptimal);
            assert_eq!(barrier.new_layout, ImageLayout::ShaderReadOnlyOptimal);
            assert_eq!(barrier.src_stage_mask, PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT);
            assert_eq!(barrier.src_access_mask, AccessFlags::COLOR_ATTACHMENT_WRITE);
            assert_eq!(barrier.dst_access_mask, AccessFlags::INPUT_ATTACHMENT_READ);
        }
    }

    #[test]
    fn test_post_process_barriers_are_distinct() {
        let depth = read_barrier(AttachmentRole::Depth);
        let color = read_barrier(AttachmentRole::PostInput);
        assert_ne!(depth, color);
        assert_ne!(depth.new_layout, color.new_layout);
    }

    #[test]
    fn test_transition_tracks_layouts() {
        let pipeline = DeferredPipeline::new().unwrap();
        let mut target = target();
        let mut recorder = RecordingRecorder::new();

        begin_pass(pipeline.get(PassRole::Geometry), &mut target);
        end_pass(&mut target);
        let count = transition_for_read(&mut recorder, &mut target, &GBUFFER_ATTACHMENTS).unwrap();

        assert_eq!(count, 3);
        assert_eq!(recorder.barrier_attachments(), vec![1, 2, 3]);
        let layouts = target.layouts();
        assert_eq!(layouts[1], ImageLayout::DepthStencilReadOnlyOptimal);
        assert_eq!(layouts[2], ImageLayout::ShaderReadOnlyOptimal);
        assert_eq!(layouts[3], ImageLayout::ShaderReadOnlyOptimal);
        assert_eq!(layouts[4], ImageLayout::ColorAttachmentOptimal);
    }

    #[test]
    fn test_begin_pass_keeps_inputs_read_only() {
        let pipeline = DeferredPipeline::new().unwrap();
        let mut target = target();
        let mut recorder = RecordingRecorder::new();

        begin_pass(pipeline.get(PassRole::Geometry), &mut target);
        end_pass(&mut target);
        transition_for_read(&mut recorder, &mut target, &GBUFFER_ATTACHMENTS).unwrap();
        begin_pass(pipeline.get(PassRole::Lighting), &mut target);

        let layouts = target.layouts();
        assert!(layouts[1].is_read_only());
        assert!(layouts[2].is_read_only());
        assert!(layouts[3].is_read_only());
        assert_eq!(layouts[0], ImageLayout::ColorAttachmentOptimal);
        assert_eq!(layouts[4], ImageLayout::ColorAttachmentOptimal);
    }

    #[test]
    #[should_panic(expected = "untracked layout")]
    fn test_second_transition_panics() {
        let pipeline = DeferredPipeline::new().unwrap();
        let mut target = target();
        let mut recorder = RecordingRecorder::new();

        begin_pass(pipeline.get(PassRole::Geometry), &mut target);
        end_pass(&mut target);
        transition_for_read(&mut recorder, &mut target, &GBUFFER_ATTACHMENTS).unwrap();
        let _ = transition_for_read(&mut recorder, &mut target, &GBUFFER_ATTACHMENTS);
    }

    #[test]
    #[should_panic(expected = "without a barrier")]
    fn test_reading_without_barrier_panics() {
        let pipeline = DeferredPipeline::new().unwrap();
        let mut target = target();

        begin_pass(pipeline.get(PassRole::Geometry), &mut target);
        end_pass(&mut target);
        begin_pass(pipeline.get(PassRole::Lighting), &mut target);
    }
}
