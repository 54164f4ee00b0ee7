mod client;
mod stream;
mod types;

pub use client::{OllamaClient, TextGenerator};
pub use stream::{FragmentDecoder, aggregate_fragments};
pub use types::{GenerationFragment, GenerationRequest, PullRequest, VersionResponse};
