//! Render-target resources

pub mod attachment;
pub mod render_target;

pub use attachment::{Attachment, AttachmentRole};
pub use render_target::{select_depth_format, RenderTarget, RenderTargetBuilder, ATTACHMENT_COUNT};
