//! Deferred rendering pipeline
//!
//! This module declares the three passes over the shared render target:
//! 1. Geometry - renders the scene into depth, albedo and normal
//! 2. Lighting - fullscreen pass computing lit colour from the G-buffer
//! 3. Post-processing - screen-space fog onto the presentable image

pub mod gbuffer_pass;
pub mod lighting_pass;
pub mod postprocess;

pub use gbuffer_pass::geometry_pass;
pub use lighting_pass::lighting_pass;
pub use postprocess::fog_pass;

use crate::backend::types::ClearValue;
use crate::error::MultipassResult;
use crate::render_graph::{PassDefinition, PassRole};
use crate::resources::{AttachmentRole, ATTACHMENT_COUNT};

/// Clear values used by every pass: opaque black colour, depth 0 with all
/// stencil bits set
pub fn gbuffer_clear_values() -> [ClearValue; ATTACHMENT_COUNT] {
    AttachmentRole::ALL.map(|role| {
        if role.is_depth() {
            ClearValue::DepthStencil {
                depth: 0.0,
                stencil: !0,
            }
        } else {
            ClearValue::Color([0.0, 0.0, 0.0, 1.0])
        }
    })
}

/// The three validated pass definitions, built once at startup
#[derive(Debug, Clone)]
pub struct DeferredPipeline {
    geometry: PassDefinition,
    lighting: PassDefinition,
    post_process: PassDefinition,
}

impl DeferredPipeline {
    pub fn new() -> MultipassResult<Self> {
        Ok(Self {
            geometry: geometry_pass()?,
            lighting: lighting_pass()?,
            post_process: fog_pass()?,
        })
    }

    pub fn get(&self, role: PassRole) -> &PassDefinition {
        match role {
            PassRole::Geometry => &self.geometry,
            PassRole::Lighting => &self.lighting,
            PassRole::PostProcess => &self.post_process,
        }
    }
}
