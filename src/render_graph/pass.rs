//! Render pass definitions
//!
//! A pass is an ordered list of subpasses over the five shared attachments.
//! Each subpass declares which attachment indices it reads as input
//! attachments and which it writes; the pass declares a load/store policy and
//! a clear value for every attachment.

use crate::backend::types::*;
use crate::error::{MultipassError, MultipassResult};
use crate::resources::ATTACHMENT_COUNT;
use std::fmt;

/// The three pass families of the deferred pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassRole {
    Geometry,
    Lighting,
    PostProcess,
}

impl PassRole {
    pub const ALL: [PassRole; 3] = [PassRole::Geometry, PassRole::Lighting, PassRole::PostProcess];

    pub fn name(self) -> &'static str {
        match self {
            PassRole::Geometry => "geometry",
            PassRole::Lighting => "lighting",
            PassRole::PostProcess => "post-process",
        }
    }
}

impl fmt::Display for PassRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Shader sources of a subpass, as paths resolved by the host's shader loader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderStages {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderStages {
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }
}

/// An input attachment also exposed to the shader under a sampler name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampledImage {
    pub name: String,
    pub attachment: usize,
}

/// One rendering step within a pass
#[derive(Debug, Clone)]
pub struct SubpassSpec {
    name: String,
    shaders: ShaderStages,
    inputs: Vec<usize>,
    outputs: Vec<usize>,
    sampled_images: Vec<SampledImage>,
}

impl SubpassSpec {
    pub fn new(name: impl Into<String>, shaders: ShaderStages) -> Self {
        Self {
            name: name.into(),
            shaders,
            inputs: Vec::new(),
            outputs: Vec::new(),
            sampled_images: Vec::new(),
        }
    }

    pub fn with_inputs(mut self, inputs: &[usize]) -> Self {
        self.inputs = inputs.to_vec();
        self
    }

    pub fn with_outputs(mut self, outputs: &[usize]) -> Self {
        self.outputs = outputs.to_vec();
        self
    }

    /// Expose an input attachment to the shader under `name`
    pub fn bind_sampled_image(mut self, name: impl Into<String>, attachment: usize) -> Self {
        self.sampled_images.push(SampledImage {
            name: name.into(),
            attachment,
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shaders(&self) -> &ShaderStages {
        &self.shaders
    }

    pub fn inputs(&self) -> &[usize] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[usize] {
        &self.outputs
    }

    pub fn sampled_images(&self) -> &[SampledImage] {
        &self.sampled_images
    }

    pub fn reads(&self, attachment: usize) -> bool {
        self.inputs.contains(&attachment)
    }

    pub fn writes(&self, attachment: usize) -> bool {
        self.outputs.contains(&attachment)
    }
}

/// A named pipeline stage over the shared render target. Immutable once built.
#[derive(Debug, Clone)]
pub struct PassDefinition {
    role: PassRole,
    subpasses: Vec<SubpassSpec>,
    load_store: [LoadStoreInfo; ATTACHMENT_COUNT],
    clear_values: [ClearValue; ATTACHMENT_COUNT],
}

impl PassDefinition {
    /// Build and validate a pass definition
    pub fn new(
        role: PassRole,
        subpasses: Vec<SubpassSpec>,
        load_store: [LoadStoreInfo; ATTACHMENT_COUNT],
        clear_values: [ClearValue; ATTACHMENT_COUNT],
    ) -> MultipassResult<Self> {
        let pass = Self {
            role,
            subpasses,
            load_store,
            clear_values,
        };
        pass.validate()?;
        Ok(pass)
    }

    pub fn role(&self) -> PassRole {
        self.role
    }

    pub fn name(&self) -> &'static str {
        self.role.name()
    }

    pub fn subpasses(&self) -> &[SubpassSpec] {
        &self.subpasses
    }

    pub fn load_store(&self, attachment: usize) -> LoadStoreInfo {
        self.load_store[attachment]
    }

    pub fn clear_value(&self, attachment: usize) -> ClearValue {
        self.clear_values[attachment]
    }

    /// Whether any subpass writes `attachment`
    pub fn writes(&self, attachment: usize) -> bool {
        self.subpasses.iter().any(|s| s.writes(attachment))
    }

    /// Attachments read by some subpass before any earlier subpass of this
    /// pass wrote them. These must already be in their read layout when the
    /// pass begins.
    pub fn external_inputs(&self) -> Vec<usize> {
        let mut external = Vec::new();
        for (k, subpass) in self.subpasses.iter().enumerate() {
            for &input in subpass.inputs() {
                let produced_here = self.subpasses[..k].iter().any(|s| s.writes(input));
                if !produced_here && !external.contains(&input) {
                    external.push(input);
                }
            }
        }
        external
    }

    /// Check attachment indices and the producer/consumer contract: anything a
    /// subpass samples, including its predecessor's outputs, must be one of
    /// its declared inputs
    pub fn validate(&self) -> MultipassResult<()> {
        let invalid = |reason: String| MultipassError::InvalidPass {
            pass: self.role,
            reason,
        };

        if self.subpasses.is_empty() {
            return Err(invalid("no subpasses".into()));
        }

        for subpass in &self.subpasses {
            let sampled = subpass.sampled_images.iter().map(|s| &s.attachment);
            for &index in subpass.inputs.iter().chain(&subpass.outputs).chain(sampled) {
                if index >= ATTACHMENT_COUNT {
                    return Err(invalid(format!(
                        "subpass '{}' references attachment {index}",
                        subpass.name
                    )));
                }
            }

            if let Some(&index) = subpass.inputs.iter().find(|&&i| subpass.writes(i)) {
                return Err(invalid(format!(
                    "subpass '{}' both reads and writes attachment {index}",
                    subpass.name
                )));
            }

            if let Some(image) = subpass
                .sampled_images
                .iter()
                .find(|s| !subpass.reads(s.attachment))
            {
                return Err(invalid(format!(
                    "subpass '{}' samples '{}' from attachment {} without declaring it as input",
                    subpass.name, image.name, image.attachment
                )));
            }
        }

        Ok(())
    }
}
