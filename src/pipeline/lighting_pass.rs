//! Lighting pass
//!
//! Fullscreen pass that reads depth, albedo and normal as input attachments
//! and writes lit radiance into the post-input attachment.

use crate::backend::types::LoadStoreInfo;
use crate::error::MultipassResult;
use crate::render_graph::pass::*;
use crate::render_graph::GBUFFER_ATTACHMENTS;
use crate::resources::AttachmentRole;

pub const LIGHTING_VERTEX_SHADER: &str = "deferred/lighting.vert";
pub const LIGHTING_FRAGMENT_SHADER: &str = "deferred/lighting.frag";

/// Build the lighting pass definition
pub fn lighting_pass() -> MultipassResult<PassDefinition> {
    let subpass = SubpassSpec::new(
        "lighting",
        ShaderStages::new(LIGHTING_VERTEX_SHADER, LIGHTING_FRAGMENT_SHADER),
    )
    .with_inputs(&GBUFFER_ATTACHMENTS)
    .with_outputs(&[AttachmentRole::PostInput.index()]);

    // Normal is cleared along with the output even though it is read here
    let load_store = [
        LoadStoreInfo::load_store(),
        LoadStoreInfo::load_store(),
        LoadStoreInfo::load_store(),
        LoadStoreInfo::clear_store(),
        LoadStoreInfo::clear_store(),
    ];

    PassDefinition::new(PassRole::Lighting, vec![subpass], load_store, super::gbuffer_clear_values())
}
