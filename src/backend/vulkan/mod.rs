//! Vulkan backend using ash
//!
//! The host owns the instance, device, swapchain and command buffers. This
//! backend allocates the transient attachments through gpu-allocator, builds
//! render pass and framebuffer objects for each pass definition and records
//! barriers and render pass scopes.

mod conversion;
mod device;
mod recorder;

pub use conversion::*;
pub use device::VulkanDevice;
pub use recorder::{PassDrawer, VulkanRecorder};
