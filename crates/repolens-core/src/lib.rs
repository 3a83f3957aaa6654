pub mod analysis;
pub mod config;
pub mod doctor;
pub mod engine;
pub mod gemini;
pub mod github;
pub(crate) mod http;
pub mod prompts;
pub mod repo_ref;
pub mod source;
pub mod tree;
