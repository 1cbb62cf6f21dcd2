//! Concordat backend server
//!
//! Orchestrates turn advancement, advisor Q&A, and diplomatic sessions on
//! top of `concordat-core`, driving an OpenAI-compatible text-generation
//! endpoint and exposing a thin REST/WebSocket layer.

pub mod config;
pub mod game;
pub mod http;
pub mod llm;
pub mod notify;

pub use config::{LlmConfig, ServerConfig};
pub use game::{GameService, ServiceError};
pub use llm::{GenerationError, Generator, LmClient, TurnOutcome};
pub use notify::{Notification, Notifier};
