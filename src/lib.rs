//! Fortell - Audiobook Generation
//!
//! A CLI tool and HTTP service that turns a short brief (topic, audience
//! expertise, target length) into a narrated audiobook file.
//!
//! The name "Fortell" comes from the Norwegian word for "tell" or "narrate."
//!
//! # Overview
//!
//! Fortell allows you to:
//! - Generate a full audiobook script from a topic brief via a sequence of LLM stages
//! - Plan chapters with an even time budget, or produce one continuous script
//! - Synthesize speech chunk by chunk and stitch the audio into a single file
//! - Serve generation and download over HTTP for frontend integration
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration and stage prompt management
//! - `documents` - Allow-listed source document fetching
//! - `stage` - LLM stage descriptors, typed outputs, and the stage runner
//! - `budget` - Duration-to-words and per-chapter time budgeting
//! - `chunking` - Splitting scripts into speech-API-safe chunks
//! - `speech` - Speech synthesis boundary and audio stitching
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use fortell::config::Settings;
//! use fortell::orchestrator::{GenerationRequest, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let request = GenerationRequest {
//!         topic: "Tulip Mania".to_string(),
//!         expertise: "undergraduate".to_string(),
//!         length_minutes: 15,
//!     };
//!     let handle = orchestrator.generate(&request).await;
//!     println!("Artifact {}: {}", handle.id, handle.status);
//!
//!     Ok(())
//! }
//! ```

pub mod budget;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod documents;
pub mod error;
pub mod openai;
pub mod orchestrator;
pub mod speech;
pub mod stage;

pub use error::{FortellError, Result};
