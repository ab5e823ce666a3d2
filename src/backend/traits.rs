//! Collaborator traits implemented by the host rendering framework
//!
//! The orchestrator never owns a device, a swapchain or a command buffer. It
//! talks to them through the traits below, which the Vulkan backend and the
//! dummy backend both implement.

use crate::backend::types::*;
use crate::render_graph::PassDefinition;
use crate::resources::{Attachment, RenderTarget};
use thiserror::Error;

/// Backend error type
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Failed to create texture: {0}")]
    TextureCreationFailed(String),
    #[error("Failed to record or submit commands: {0}")]
    SubmissionFailed(String),
    #[error("Failed to present: {0}")]
    PresentFailed(String),
    #[error("Out of memory")]
    OutOfMemory,
    #[error("Device lost")]
    DeviceLost,
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Handle to a GPU texture owned by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(u64);

impl TextureHandle {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// The renderable image handed out by the surface.
///
/// Move-only: building a render target consumes it and releasing the target
/// gives it back.
#[derive(Debug)]
pub struct SurfaceImage {
    texture: TextureHandle,
    extent: Extent2d,
    format: TextureFormat,
    usage: TextureUsage,
}

impl SurfaceImage {
    pub fn new(
        texture: TextureHandle,
        extent: Extent2d,
        format: TextureFormat,
        usage: TextureUsage,
    ) -> Self {
        Self {
            texture,
            extent,
            format,
            usage,
        }
    }

    pub fn texture(&self) -> TextureHandle {
        self.texture
    }

    pub fn extent(&self) -> Extent2d {
        self.extent
    }

    pub fn format(&self) -> TextureFormat {
        self.format
    }

    pub fn usage(&self) -> TextureUsage {
        self.usage
    }
}

/// Output surface: supplies renderable images and accepts the finished frame
pub trait SurfaceProvider {
    /// Request the usage every subsequently acquired image must support
    fn configure_usage(&mut self, usage: TextureUsage) -> BackendResult<()>;

    /// Current extent of the output surface
    fn surface_extent(&self) -> Extent2d;

    /// Acquire a renderable image for a new render target configuration
    fn acquire_image(&mut self) -> BackendResult<SurfaceImage>;

    /// Hand the composited image over for presentation
    fn present(&mut self, texture: TextureHandle) -> BackendResult<()>;
}

/// Device capabilities and texture allocation
pub trait GraphicsDevice {
    /// Whether `format` can back a depth/stencil attachment with optimal tiling
    fn supports_depth_attachment(&self, format: TextureFormat) -> bool;

    /// Create a texture
    fn create_texture(&mut self, desc: &TextureDescriptor) -> BackendResult<TextureHandle>;

    /// Destroy a texture
    fn destroy_texture(&mut self, texture: TextureHandle);
}

/// Command recording for one frame
pub trait CommandRecorder {
    /// Set viewport
    fn set_viewport(&mut self, x: f32, y: f32, width: f32, height: f32, min_depth: f32, max_depth: f32);

    /// Set scissor rect
    fn set_scissor_rect(&mut self, x: u32, y: u32, width: u32, height: u32);

    /// Begin the render pass described by `pass` over every attachment of
    /// `target`. The tracked layouts of `target` are the layouts the
    /// attachments are in when the pass starts.
    fn begin_render_pass(&mut self, pass: &PassDefinition, target: &RenderTarget) -> BackendResult<()>;

    /// Submit the draws of every subpass of `pass`
    fn draw_pass(&mut self, pass: &PassDefinition, target: &RenderTarget) -> BackendResult<()>;

    /// Draw the debug UI overlay into the current render pass
    fn draw_overlay(&mut self) -> BackendResult<()>;

    /// End the current render pass
    fn end_render_pass(&mut self) -> BackendResult<()>;

    /// Record a layout transition for one attachment
    fn image_memory_barrier(
        &mut self,
        attachment: &Attachment,
        barrier: &ImageMemoryBarrier,
    ) -> BackendResult<()>;
}
