//! Rust client for the Khulnasoft inference API.
//!
//! Sends chat-completion requests to hosted models addressed as
//! `model@provider` and returns the assistant's reply, either whole or as a
//! stream of text deltas.
//!
//! # Quick start
//!
//! ```no_run
//! use khulnasoft::Client;
//!
//! # async fn run() -> Result<(), khulnasoft::Error> {
//! let client = Client::from_env()?;
//! let answer = client
//!     .generate("Why is the sky blue?")
//!     .system_prompt("Answer in one paragraph.")
//!     .send()
//!     .await?;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```
//!
//! # Streaming
//!
//! ```no_run
//! use futures_util::StreamExt;
//! use khulnasoft::Client;
//!
//! # async fn run() -> Result<(), khulnasoft::Error> {
//! let client = Client::from_env()?;
//! let mut deltas = client
//!     .generate("Tell me a story.")
//!     .model("llama-2-70b-chat")
//!     .stream()
//!     .await?;
//! while let Some(delta) = deltas.next().await {
//!     print!("{}", delta?);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Programs without an async runtime can use [`blocking::Client`] instead,
//! which exposes the same interface synchronously.

pub mod blocking;
pub mod client;
pub mod config;
pub mod error;
pub mod sse;
pub mod types;

mod wire;

// Re-export core types for easy usage
pub use client::{Client, ClientBuilder, CompletionStream, Generate};
pub use config::{API_KEY_ENV, DEFAULT_BASE_URL};
pub use error::Error;
pub use types::*;
