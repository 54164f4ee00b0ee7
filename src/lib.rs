pub mod config;
pub mod error;
pub mod insights;
pub mod model;
pub mod server;

pub use config::{AppConfig, ResponseMode, SamplingOptions};
pub use error::ServiceError;
pub use insights::{Insight, parse_insights};
pub use model::{OllamaClient, TextGenerator};
pub use server::{bind_with_fallback, build_router};
