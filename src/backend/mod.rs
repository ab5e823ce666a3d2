//! Backend abstraction layer
//!
//! Provides the collaborator traits the orchestrator consumes, plus a dummy
//! backend for headless runs and a Vulkan backend built on ash.

pub mod dummy;
pub mod traits;
pub mod types;

// Vulkan backend is only available on native platforms
#[cfg(not(target_arch = "wasm32"))]
pub mod vulkan;

pub use traits::*;
pub use types::*;
