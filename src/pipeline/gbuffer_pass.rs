//! Geometry pass
//!
//! Renders the scene into the G-buffer:
//! - Depth (1)
//! - Albedo (2)
//! - Normal (3)
//!
//! The G-buffer is cleared every iteration; the presentable and post-input
//! attachments are carried through untouched.

use crate::backend::types::LoadStoreInfo;
use crate::error::MultipassResult;
use crate::render_graph::pass::*;
use crate::render_graph::GBUFFER_ATTACHMENTS;

pub const GEOMETRY_VERTEX_SHADER: &str = "deferred/geometry.vert";
pub const GEOMETRY_FRAGMENT_SHADER: &str = "deferred/geometry.frag";

/// Build the geometry pass definition
pub fn geometry_pass() -> MultipassResult<PassDefinition> {
    let subpass = SubpassSpec::new(
        "gbuffer",
        ShaderStages::new(GEOMETRY_VERTEX_SHADER, GEOMETRY_FRAGMENT_SHADER),
    )
    .with_outputs(&GBUFFER_ATTACHMENTS);

    let load_store = [
        LoadStoreInfo::load_store(),
        LoadStoreInfo::clear_store(),
        LoadStoreInfo::clear_store(),
        LoadStoreInfo::clear_store(),
        LoadStoreInfo::load_store(),
    ];

    PassDefinition::new(PassRole::Geometry, vec![subpass], load_store, super::gbuffer_clear_values())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::types::LoadOp;

    #[test]
    fn test_geometry_writes_gbuffer_only() {
        let pass = geometry_pass().unwrap();
        let subpass = &pass.subpasses()[0];
        assert_eq!(subpass.outputs(), &[1, 2, 3]);
        assert!(subpass.inputs().is_empty());
        assert!(pass.external_inputs().is_empty());
    }

    #[test]
    fn test_geometry_clears_gbuffer() {
        let pass = geometry_pass().unwrap();
        for index in GBUFFER_ATTACHMENTS {
            assert_eq!(pass.load_store(index).load_op, LoadOp::Clear);
        }
        assert_eq!(pass.load_store(0).load_op, LoadOp::Load);
        assert_eq!(pass.load_store(4).load_op, LoadOp::Load);
    }
}
