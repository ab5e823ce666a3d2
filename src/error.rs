//! Orchestrator error types.

use crate::backend::{BackendError, TextureFormat, TextureUsage};
use crate::render_graph::PassRole;
use crate::resources::AttachmentRole;
use thiserror::Error;

/// Errors raised while building or driving the multipass pipeline.
#[derive(Error, Debug)]
pub enum MultipassError {
    /// The device supports none of the candidate depth formats.
    #[error("no supported depth format among {candidates:?}")]
    UnsupportedFormat { candidates: Vec<TextureFormat> },
    /// A colour attachment would not fit in tile memory.
    #[error("{role} attachment uses {bits} bits per pixel, the tile budget is {budget}")]
    TileBudgetExceeded { role: AttachmentRole, bits: u32, budget: u32 },
    /// The surface image lacks a usage the passes depend on.
    #[error("{role} attachment is missing usage {usage:?}")]
    MissingUsage { role: AttachmentRole, usage: TextureUsage },
    /// A pass definition breaks its attachment contract.
    #[error("invalid {pass} pass: {reason}")]
    InvalidPass { pass: PassRole, reason: String },
    /// Attachments handed to a render target are out of order or mismatched.
    #[error("invalid render target: {0}")]
    InvalidRenderTarget(String),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

pub type MultipassResult<T> = Result<T, MultipassError>;
