//! # Interface Layer
//!
//! User-facing capabilities: the command and text handlers the router
//! dispatches to.

pub mod commands;
