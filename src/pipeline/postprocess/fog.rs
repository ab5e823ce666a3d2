//! Screen-space fog

use crate::backend::types::LoadStoreInfo;
use crate::error::MultipassResult;
use crate::render_graph::pass::*;
use crate::resources::AttachmentRole;

pub const FOG_VERTEX_SHADER: &str = "postprocessing/postprocessing.vert";
pub const FOG_FRAGMENT_SHADER: &str = "postprocessing/my_post.frag";

/// Sampler name of the depth input
pub const DEPTH_TEXTURE: &str = "DepthTexture";
/// Sampler name of the lit colour input
pub const COLOR_TEXTURE: &str = "ColorTexture";

/// Fog composited from depth and lit colour into the presentable image
pub fn fog_pass() -> MultipassResult<PassDefinition> {
    let depth = AttachmentRole::Depth.index();
    let color = AttachmentRole::PostInput.index();

    let subpass = SubpassSpec::new("fog", ShaderStages::new(FOG_VERTEX_SHADER, FOG_FRAGMENT_SHADER))
        .with_inputs(&[depth, color])
        .with_outputs(&[AttachmentRole::Presentable.index()])
        .bind_sampled_image(DEPTH_TEXTURE, depth)
        .bind_sampled_image(COLOR_TEXTURE, color);

    let load_store = [LoadStoreInfo::load_store(); 5];

    PassDefinition::new(
        PassRole::PostProcess,
        vec![subpass],
        load_store,
        crate::pipeline::gbuffer_clear_values(),
    )
}
