//! # Application Layer
//!
//! Contains the core business logic and orchestration of the bot.
//! This includes event normalization, command routing, session state,
//! rate limiting, and the dispatch/outbound pipeline.

pub mod dispatcher;
pub mod normalizer;
pub mod outbound;
pub mod rate_limit;
pub mod router;
pub mod session;
