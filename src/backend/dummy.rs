//! Dummy backend for testing and headless benchmarking.
//!
//! Nothing here touches a GPU. The device hands out sequential texture
//! handles, the recorder keeps a log of every command it was asked to record
//! and the surface keeps a log of presented images.

use std::collections::HashSet;

use crate::backend::traits::*;
use crate::backend::types::*;
use crate::render_graph::{PassDefinition, PassRole};
use crate::resources::{Attachment, RenderTarget, ATTACHMENT_COUNT};

/// Device that allocates nothing and tracks live texture handles
#[derive(Debug)]
pub struct DummyDevice {
    depth_formats: Vec<TextureFormat>,
    live: HashSet<TextureHandle>,
    next_handle: u64,
    created: usize,
    fail_after: Option<usize>,
}

impl Default for DummyDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl DummyDevice {
    /// Device that supports every depth format
    pub fn new() -> Self {
        Self::with_depth_formats(&[
            TextureFormat::Depth32Float,
            TextureFormat::Depth32FloatStencil8,
            TextureFormat::Depth24UnormStencil8,
            TextureFormat::Depth16Unorm,
        ])
    }

    /// Device that only supports the given depth formats
    pub fn with_depth_formats(formats: &[TextureFormat]) -> Self {
        Self {
            depth_formats: formats.to_vec(),
            live: HashSet::new(),
            next_handle: 1,
            created: 0,
            fail_after: None,
        }
    }

    /// Make texture creation fail with `OutOfMemory` once `count` textures
    /// have been created
    pub fn fail_after(mut self, count: usize) -> Self {
        self.fail_after = Some(count);
        self
    }

    /// Number of textures created and not yet destroyed
    pub fn live_textures(&self) -> usize {
        self.live.len()
    }
}

impl GraphicsDevice for DummyDevice {
    fn supports_depth_attachment(&self, format: TextureFormat) -> bool {
        self.depth_formats.contains(&format)
    }

    fn create_texture(&mut self, desc: &TextureDescriptor) -> BackendResult<TextureHandle> {
        if self.fail_after.is_some_and(|limit| self.created >= limit) {
            log::trace!("DummyDevice: refusing texture {:?}", desc.label);
            return Err(BackendError::OutOfMemory);
        }

        let handle = TextureHandle::from_raw(self.next_handle);
        self.next_handle += 1;
        self.created += 1;
        self.live.insert(handle);

        log::trace!(
            "DummyDevice: creating texture {:?} ({}x{}, {:?})",
            desc.label,
            desc.extent.width,
            desc.extent.height,
            desc.format
        );
        Ok(handle)
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        log::trace!("DummyDevice: destroying texture {}", texture.raw());
        self.live.remove(&texture);
    }
}

/// One command captured by [`RecordingRecorder`]
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCommand {
    SetViewport {
        width: f32,
        height: f32,
    },
    SetScissor {
        width: u32,
        height: u32,
    },
    /// A render pass start, with the layouts the attachments enter it in
    BeginRenderPass {
        pass: PassRole,
        layouts: [ImageLayout; ATTACHMENT_COUNT],
    },
    /// A pass body, with the attachment layouts seen when it was drawn
    Draw {
        pass: PassRole,
        layouts: [ImageLayout; ATTACHMENT_COUNT],
    },
    DrawOverlay,
    EndRenderPass,
    Barrier {
        attachment: usize,
        barrier: ImageMemoryBarrier,
    },
}

/// Recorder that logs commands instead of encoding them
#[derive(Debug, Default)]
pub struct RecordingRecorder {
    commands: Vec<RecordedCommand>,
    fail_on_draw: Option<(PassRole, usize)>,
    draws_per_pass: [usize; 3],
}

impl RecordingRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `DeviceLost` from the `nth` draw (1-based) of `pass`
    pub fn fail_on_draw(mut self, pass: PassRole, nth: usize) -> Self {
        self.fail_on_draw = Some((pass, nth));
        self
    }

    pub fn commands(&self) -> &[RecordedCommand] {
        &self.commands
    }

    /// Drop the recorded commands, keeping fault injection settings
    pub fn clear(&mut self) {
        self.commands.clear();
        self.draws_per_pass = [0; 3];
    }

    pub fn draw_count(&self, pass: PassRole) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, RecordedCommand::Draw { pass: p, .. } if *p == pass))
            .count()
    }

    pub fn barrier_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, RecordedCommand::Barrier { .. }))
            .count()
    }

    pub fn overlay_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, RecordedCommand::DrawOverlay))
            .count()
    }

    /// Entry layouts of every render pass of `pass`, in recording order
    pub fn begin_layouts(&self, pass: PassRole) -> Vec<[ImageLayout; ATTACHMENT_COUNT]> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                RecordedCommand::BeginRenderPass { pass: p, layouts } if *p == pass => Some(*layouts),
                _ => None,
            })
            .collect()
    }

    /// Attachment indices of the recorded barriers, in order
    pub fn barrier_attachments(&self) -> Vec<usize> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                RecordedCommand::Barrier { attachment, .. } => Some(*attachment),
                _ => None,
            })
            .collect()
    }
}

fn pass_slot(pass: PassRole) -> usize {
    match pass {
        PassRole::Geometry => 0,
        PassRole::Lighting => 1,
        PassRole::PostProcess => 2,
    }
}

impl CommandRecorder for RecordingRecorder {
    fn set_viewport(&mut self, _x: f32, _y: f32, width: f32, height: f32, _min: f32, _max: f32) {
        self.commands.push(RecordedCommand::SetViewport { width, height });
    }

    fn set_scissor_rect(&mut self, _x: u32, _y: u32, width: u32, height: u32) {
        self.commands.push(RecordedCommand::SetScissor { width, height });
    }

    fn begin_render_pass(&mut self, pass: &PassDefinition, target: &RenderTarget) -> BackendResult<()> {
        self.commands.push(RecordedCommand::BeginRenderPass {
            pass: pass.role(),
            layouts: target.layouts(),
        });
        Ok(())
    }

    fn draw_pass(&mut self, pass: &PassDefinition, target: &RenderTarget) -> BackendResult<()> {
        let slot = pass_slot(pass.role());
        self.draws_per_pass[slot] += 1;
        if self.fail_on_draw == Some((pass.role(), self.draws_per_pass[slot])) {
            log::trace!("RecordingRecorder: injecting device loss in {} pass", pass.role());
            return Err(BackendError::DeviceLost);
        }

        self.commands.push(RecordedCommand::Draw {
            pass: pass.role(),
            layouts: target.layouts(),
        });
        Ok(())
    }

    fn draw_overlay(&mut self) -> BackendResult<()> {
        self.commands.push(RecordedCommand::DrawOverlay);
        Ok(())
    }

    fn end_render_pass(&mut self) -> BackendResult<()> {
        self.commands.push(RecordedCommand::EndRenderPass);
        Ok(())
    }

    fn image_memory_barrier(
        &mut self,
        attachment: &Attachment,
        barrier: &ImageMemoryBarrier,
    ) -> BackendResult<()> {
        self.commands.push(RecordedCommand::Barrier {
            attachment: attachment.role().index(),
            barrier: *barrier,
        });
        Ok(())
    }
}

/// Surface images are numbered apart from device textures
const FIRST_SURFACE_HANDLE: u64 = 1 << 32;

/// Surface with a fixed extent that records what it presents
#[derive(Debug)]
pub struct DummySurface {
    extent: Extent2d,
    format: TextureFormat,
    usage: TextureUsage,
    next_handle: u64,
    presented: Vec<TextureHandle>,
}

impl DummySurface {
    pub fn new(extent: Extent2d) -> Self {
        Self {
            extent,
            format: TextureFormat::Bgra8Unorm,
            usage: TextureUsage::COLOR_ATTACHMENT,
            next_handle: FIRST_SURFACE_HANDLE,
            presented: Vec::new(),
        }
    }

    pub fn usage(&self) -> TextureUsage {
        self.usage
    }

    pub fn presented(&self) -> &[TextureHandle] {
        &self.presented
    }
}

impl SurfaceProvider for DummySurface {
    fn configure_usage(&mut self, usage: TextureUsage) -> BackendResult<()> {
        self.usage = self.usage | usage;
        Ok(())
    }

    fn surface_extent(&self) -> Extent2d {
        self.extent
    }

    fn acquire_image(&mut self) -> BackendResult<SurfaceImage> {
        let texture = TextureHandle::from_raw(self.next_handle);
        self.next_handle += 1;
        Ok(SurfaceImage::new(texture, self.extent, self.format, self.usage))
    }

    fn present(&mut self, texture: TextureHandle) -> BackendResult<()> {
        if !(FIRST_SURFACE_HANDLE..self.next_handle).contains(&texture.raw()) {
            return Err(BackendError::PresentFailed(format!(
                "texture {} was not acquired from this surface",
                texture.raw()
            )));
        }
        log::trace!("DummySurface: presenting texture {}", texture.raw());
        self.presented.push(texture);
        Ok(())
    }
}
