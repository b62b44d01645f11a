//! Synthetic survey generation
//!
//! Item catalog → persona factory → rating sampler + tool selector →
//! orchestrator. One [`SurveyRng`] is threaded through every step.

pub mod catalog;
pub mod orchestrator;
pub mod population;
pub mod rng;
pub mod sampler;
pub mod statistics;
pub mod tools;
pub mod types;

pub use catalog::SurveyCatalog;
pub use orchestrator::{generate, submit, SubmissionOptions, SubmissionReport};
pub use population::GenerationPlan;
pub use rng::SurveyRng;
