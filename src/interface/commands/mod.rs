//! # Command Handlers
//!
//! Concrete [`Handler`](crate::domain::traits::Handler) implementations for
//! each supported command, plus the greeting text handler. Registered with
//! the router at startup.

pub mod done;
pub mod greet;
pub mod help;
pub mod note;
pub mod status;
