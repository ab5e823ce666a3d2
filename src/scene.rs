//! Scene collaborator

/// The scene and camera owned by the host framework.
///
/// The orchestrator never traverses the scene; pass drawing goes through the
/// recorder. It only needs the camera's aspect ratio to lay out the options
/// window.
pub trait SceneProvider {
    fn camera_aspect_ratio(&self) -> f32;
}

/// Scene with a fixed camera aspect ratio, for headless use
#[derive(Debug, Clone, Copy)]
pub struct FixedAspectScene {
    pub aspect_ratio: f32,
}

impl SceneProvider for FixedAspectScene {
    fn camera_aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }
}
