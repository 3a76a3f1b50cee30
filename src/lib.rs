//! Mender: ranked fix suggestions for detected source errors.
//!
//! A bounded-concurrency, multi-stage enrichment pipeline. Work items flow
//! through embedding, context retrieval, generative synthesis, and heuristic
//! augmentation stages under an admission-controlled concurrency cap, with
//! memoized embeddings, partial-failure isolation, and run-scoped telemetry.

pub mod admission;
pub mod cache;
pub mod config;
pub mod error;
pub mod item;
pub mod logging;
pub mod orchestrator;
pub mod parse;
pub mod pipeline;
pub mod provider;
pub mod ranker;
pub mod telemetry;
