//! Render-target attachments and their roles

use crate::backend::traits::TextureHandle;
use crate::backend::types::*;
use std::fmt;

/// Semantic role of an attachment.
///
/// The discriminant is the attachment's index in the render target; every
/// pass definition addresses attachments by these indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentRole {
    /// Swapchain image receiving the final composited frame
    Presentable = 0,
    Depth = 1,
    Albedo = 2,
    Normal = 3,
    /// Lit radiance written by lighting and read by post-processing
    PostInput = 4,
}

impl AttachmentRole {
    /// All roles in attachment index order
    pub const ALL: [AttachmentRole; 5] = [
        AttachmentRole::Presentable,
        AttachmentRole::Depth,
        AttachmentRole::Albedo,
        AttachmentRole::Normal,
        AttachmentRole::PostInput,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            AttachmentRole::Presentable => "presentable",
            AttachmentRole::Depth => "depth",
            AttachmentRole::Albedo => "albedo",
            AttachmentRole::Normal => "normal",
            AttachmentRole::PostInput => "post-input",
        }
    }

    pub fn is_depth(self) -> bool {
        self == AttachmentRole::Depth
    }

    /// Layout the attachment is in while a subpass writes it
    pub fn write_layout(self) -> ImageLayout {
        if self.is_depth() {
            ImageLayout::DepthStencilAttachmentOptimal
        } else {
            ImageLayout::ColorAttachmentOptimal
        }
    }

    /// Layout the attachment must be in before a subpass reads it
    pub fn read_layout(self) -> ImageLayout {
        if self.is_depth() {
            ImageLayout::DepthStencilReadOnlyOptimal
        } else {
            ImageLayout::ShaderReadOnlyOptimal
        }
    }
}

impl fmt::Display for AttachmentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One GPU image bound into the render target
#[derive(Debug)]
pub struct Attachment {
    role: AttachmentRole,
    texture: TextureHandle,
    format: TextureFormat,
    extent: Extent2d,
    usage: TextureUsage,
    layout: ImageLayout,
}

impl Attachment {
    pub fn new(
        role: AttachmentRole,
        texture: TextureHandle,
        format: TextureFormat,
        extent: Extent2d,
        usage: TextureUsage,
    ) -> Self {
        Self {
            role,
            texture,
            format,
            extent,
            usage,
            layout: ImageLayout::Undefined,
        }
    }

    pub fn role(&self) -> AttachmentRole {
        self.role
    }

    pub fn texture(&self) -> TextureHandle {
        self.texture
    }

    pub fn format(&self) -> TextureFormat {
        self.format
    }

    pub fn extent(&self) -> Extent2d {
        self.extent
    }

    pub fn usage(&self) -> TextureUsage {
        self.usage
    }

    /// Layout as last tracked by the barrier scheduler
    pub fn layout(&self) -> ImageLayout {
        self.layout
    }

    pub(crate) fn set_layout(&mut self, layout: ImageLayout) {
        self.layout = layout;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_indices_are_stable() {
        for (index, role) in AttachmentRole::ALL.iter().enumerate() {
            assert_eq!(role.index(), index);
            assert_eq!(AttachmentRole::from_index(index), Some(*role));
        }
        assert_eq!(AttachmentRole::from_index(5), None);
    }

    #[test]
    fn test_depth_layouts() {
        assert_eq!(
            AttachmentRole::Depth.write_layout(),
            ImageLayout::DepthStencilAttachmentOptimal
        );
        assert_eq!(
            AttachmentRole::Depth.read_layout(),
            ImageLayout::DepthStencilReadOnlyOptimal
        );
        assert_eq!(
            AttachmentRole::Normal.read_layout(),
            ImageLayout::ShaderReadOnlyOptimal
        );
    }

    #[test]
    fn test_new_attachment_starts_undefined() {
        let attachment = Attachment::new(
            AttachmentRole::Albedo,
            TextureHandle::from_raw(1),
            TextureFormat::Rgba8Unorm,
            Extent2d::new(4, 4),
            TextureUsage::COLOR_ATTACHMENT,
        );
        assert_eq!(attachment.layout(), ImageLayout::Undefined);
    }
}
