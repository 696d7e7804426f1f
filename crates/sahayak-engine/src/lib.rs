//! Chat processing pipeline for Sahayak.
//!
//! Provides script-based language detection, knowledge-base auto-resolution,
//! industry inference, history aggregation, generative response production
//! with structured-output parsing, and the escalation policy that ties them
//! together into a single per-message pipeline.

pub mod client;
pub mod error;
pub mod generator;
pub mod history;
pub mod industry;
pub mod knowledge;
pub mod language;
pub mod pipeline;
pub mod policy;

pub use client::{GeminiClient, GenerativeClient, StaticClient};
pub use error::PipelineError;
pub use generator::{parse_generation, Generation};
pub use knowledge::KnowledgeBase;
pub use pipeline::{ChatOutcome, ChatPipeline};
pub use policy::Outcome;
