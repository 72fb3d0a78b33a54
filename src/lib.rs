//! Quizhub - resilient client for the Quiz Master server.
//!
//! This crate provides the request-orchestration layer any client of the
//! Quiz Master backend needs: authenticated HTTP dispatch with session
//! invalidation, and multi-endpoint fallback for notification intents
//! whose exact server route is not guaranteed to exist.
//!
//! # Architecture
//!
//! Requests flow through two layers:
//!
//! - **HttpClient** - every call gets the `Authorization` header injected
//!   (with `Bearer` prefix normalization), a URL-sensitive timeout, and
//!   401 handling that clears the stored session
//! - **NotificationDispatcher** - probes an ordered list of candidate
//!   routes per notification intent, strictly sequentially, and folds the
//!   attempts into one normalized outcome
//!
//! # Modules
//!
//! - [`client`] - HTTP client core and request/response stages
//! - [`auth`] - session invalidation guard and login/logout
//! - [`dispatch`] - notification intents and fallback dispatch
//! - [`session`] - durable session storage (keyring or file)
//! - [`config`] - configuration loading/saving

// Library modules
pub mod auth;
pub mod client;
pub mod config;
pub mod constants;
pub mod dispatch;
pub mod env;
pub mod session;

// Re-export commonly used types
pub use auth::{AuthGuard, CliLoginBoundary, LoginBoundary};
pub use client::{ApiRequest, HttpClient, RequestError};
pub use config::Config;
pub use dispatch::{
    AttemptRecord, BroadcastOptions, DispatchOutcome, NotificationDispatcher, NotificationIntent,
};
pub use session::{Session, SessionStore, UserType};
