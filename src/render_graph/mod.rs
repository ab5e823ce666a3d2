//! Pass orchestration
//!
//! Pass definitions over the shared render target, the barrier scheduler
//! that keeps attachment layouts consistent between passes, and the batch
//! executor that repeats passes.

pub mod barriers;
pub mod executor;
pub mod pass;

pub use barriers::{read_barrier, transition_for_read, GBUFFER_ATTACHMENTS, POST_PROCESS_INPUTS};
pub use executor::*;
pub use pass::*;
