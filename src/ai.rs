//! HTTP collaborators: image analysis, image generation and module
//! refinement.

pub mod analyze;
pub mod common;
pub mod config;
pub mod generate;
pub mod refine;
pub mod types;

pub use common::{describe_status, BackendClient};
pub use config::ApiConfig;
pub use types::{AnalyzeResponse, GenerateRequest, RefineResponse};
