//! tubeqa - YouTube video summaries and question answering
//!
//! Loads a video's captions, summarizes them with a language model, and
//! answers questions about the video with retrieval over the transcript.
//!
//! # Overview
//!
//! A [`session::Session`] holds one loaded video at a time. The
//! [`orchestrator::Orchestrator`] drives it through three operations:
//! - `load_video` fetches and normalizes the transcript
//! - `summarize` renders the summary prompt over the whole transcript
//! - `ask_question` chunks and embeds the transcript on first use, retrieves
//!   the nearest chunks, and answers from them
//!
//! # Architecture
//!
//! - `config` - Settings, credentials, and prompt templates
//! - `transcript` - Caption sources and normalization
//! - `chunking` - Recursive character chunking
//! - `embedding` - Embedding generation
//! - `vector_store` - In-memory nearest-neighbour index
//! - `rag` - Indexing, retrieval, and context formatting
//! - `generation` - Text generation
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use tubeqa::config::{ServiceCredentials, Settings};
//! use tubeqa::orchestrator::Orchestrator;
//! use tubeqa::session::Session;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let credentials = ServiceCredentials::from_env(&settings)?;
//!     let orchestrator = Orchestrator::from_settings(&settings, &credentials)?;
//!
//!     let mut session = Session::new();
//!     orchestrator.load_video(&mut session, "https://youtu.be/dQw4w9WgXcQ").await?;
//!     println!("{}", orchestrator.summarize(&session).await?);
//!
//!     let answer = orchestrator.ask_question(&mut session, "What is the song about?").await?;
//!     println!("{}", answer.answer);
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod session;
pub mod transcript;
pub mod vector_store;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Result, TubeqaError};
