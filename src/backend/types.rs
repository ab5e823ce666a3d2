//! Common types shared between the orchestrator and backends

use bitflags::bitflags;

/// Texture format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    Rgba8Unorm,
    Rgba8UnormSrgb,
    Bgra8Unorm,
    Bgra8UnormSrgb,
    /// 10-10-10-2 packed, alpha in the top bits
    A2b10g10r10UnormPack32,
    Rgba16Float,
    Depth32Float,
    Depth32FloatStencil8,
    Depth24UnormStencil8,
    Depth16Unorm,
}

impl TextureFormat {
    pub fn is_depth(&self) -> bool {
        matches!(
            self,
            TextureFormat::Depth32Float
                | TextureFormat::Depth32FloatStencil8
                | TextureFormat::Depth24UnormStencil8
                | TextureFormat::Depth16Unorm
        )
    }

    pub fn has_stencil(&self) -> bool {
        matches!(
            self,
            TextureFormat::Depth32FloatStencil8 | TextureFormat::Depth24UnormStencil8
        )
    }

    /// Storage cost of one pixel in bits
    pub fn bits_per_pixel(&self) -> u32 {
        match self {
            TextureFormat::Rgba8Unorm
            | TextureFormat::Rgba8UnormSrgb
            | TextureFormat::Bgra8Unorm
            | TextureFormat::Bgra8UnormSrgb
            | TextureFormat::A2b10g10r10UnormPack32
            | TextureFormat::Depth32Float
            | TextureFormat::Depth24UnormStencil8 => 32,
            TextureFormat::Depth16Unorm => 16,
            TextureFormat::Depth32FloatStencil8 => 40,
            TextureFormat::Rgba16Float => 64,
        }
    }
}

bitflags! {
    /// Texture usage flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TextureUsage: u32 {
        const COPY_SRC = 1 << 0;
        const COPY_DST = 1 << 1;
        const SAMPLED = 1 << 2;
        const COLOR_ATTACHMENT = 1 << 3;
        const DEPTH_STENCIL_ATTACHMENT = 1 << 4;
        const INPUT_ATTACHMENT = 1 << 5;
        /// Contents never leave tile memory; the driver may skip backing storage
        const TRANSIENT_ATTACHMENT = 1 << 6;
    }
}

bitflags! {
    /// Pipeline stages a read barrier synchronizes
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PipelineStageFlags: u32 {
        const EARLY_FRAGMENT_TESTS = 1 << 0;
        const LATE_FRAGMENT_TESTS = 1 << 1;
        const FRAGMENT_SHADER = 1 << 2;
        const COLOR_ATTACHMENT_OUTPUT = 1 << 3;
    }
}

bitflags! {
    /// Memory accesses a read barrier makes available and visible
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AccessFlags: u32 {
        const INPUT_ATTACHMENT_READ = 1 << 0;
        const COLOR_ATTACHMENT_WRITE = 1 << 1;
        const DEPTH_STENCIL_ATTACHMENT_WRITE = 1 << 2;
    }
}

/// Image layout states an attachment moves through during a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageLayout {
    /// Contents undefined, the state of freshly created images
    #[default]
    Undefined,
    ColorAttachmentOptimal,
    DepthStencilAttachmentOptimal,
    ShaderReadOnlyOptimal,
    DepthStencilReadOnlyOptimal,
}

impl ImageLayout {
    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            ImageLayout::ShaderReadOnlyOptimal | ImageLayout::DepthStencilReadOnlyOptimal
        )
    }
}

/// Two-dimensional extent in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Extent2d {
    pub width: u32,
    pub height: u32,
}

impl Extent2d {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Texture descriptor
#[derive(Debug, Clone)]
pub struct TextureDescriptor {
    pub label: Option<String>,
    pub extent: Extent2d,
    pub format: TextureFormat,
    pub usage: TextureUsage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOp {
    Clear,
    Load,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Store,
    Discard,
}

/// Load/store policy of one attachment within a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadStoreInfo {
    pub load_op: LoadOp,
    pub store_op: StoreOp,
}

impl LoadStoreInfo {
    pub const fn new(load_op: LoadOp, store_op: StoreOp) -> Self {
        Self { load_op, store_op }
    }

    pub const fn clear_store() -> Self {
        Self::new(LoadOp::Clear, StoreOp::Store)
    }

    pub const fn load_store() -> Self {
        Self::new(LoadOp::Load, StoreOp::Store)
    }
}

/// Value an attachment is cleared to when its load op is [`LoadOp::Clear`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClearValue {
    Color([f32; 4]),
    DepthStencil { depth: f32, stencil: u32 },
}

/// One image layout transition with its execution and memory dependencies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageMemoryBarrier {
    pub old_layout: ImageLayout,
    pub new_layout: ImageLayout,
    pub src_stage_mask: PipelineStageFlags,
    pub dst_stage_mask: PipelineStageFlags,
    pub src_access_mask: AccessFlags,
    pub dst_access_mask: AccessFlags,
}
