//! Post-processing effects

mod fog;

pub use fog::{fog_pass, COLOR_TEXTURE, DEPTH_TEXTURE};
