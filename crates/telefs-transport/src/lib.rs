//! Channel transport for telefs.
//!
//! The channel is the only persistence substrate telefs has. It can send a
//! named document, report recent history, and return a document's bytes;
//! nothing else. This crate defines that interface and its implementations.
//!
//! # Modules
//!
//! - [`error`] -- [`TransportError`] and its retry classification
//! - [`context`] -- [`OpContext`], per-operation deadline and cancellation
//! - [`traits`] -- the [`ChannelTransport`] trait
//! - [`telegram`] -- [`TelegramTransport`], the Bot API client
//! - [`api`] -- Bot API wire types and status mapping
//! - [`memory`] -- [`InMemoryChannel`] for tests and embedding
//! - [`retry`] -- [`RetryingTransport`], backoff for retryable failures
//! - [`config`] -- [`TelegramConfig`] and [`RetryConfig`]

pub mod api;
pub mod config;
pub mod context;
pub mod error;
pub mod memory;
pub mod retry;
pub mod telegram;
pub mod traits;

pub use config::{RetryConfig, TelegramConfig, DEFAULT_API_BASE};
pub use context::OpContext;
pub use error::{TransportError, TransportResult};
pub use memory::{FaultKind, InMemoryChannel};
pub use retry::RetryingTransport;
pub use telegram::TelegramTransport;
pub use traits::{ChannelTransport, ScanResult};
