pub mod project;

pub use crate::domain::configuration::{LocalBackends, MaskingConfig};
pub use project::load_masking_config;
