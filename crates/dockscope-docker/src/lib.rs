//! Docker Engine client for dockscope
//!
//! This crate provides container discovery on a network, compose label
//! lookup and follow-mode log streams, behind the [`SourceProvider`] trait.

mod client;
mod error;
mod lines;
mod provider;

pub use client::DockerClient;
pub use error::SourceError;
pub use provider::{LineStream, SourceProvider};

// Re-export types that are used in our public API
pub use dockscope_types::{COMPOSE_SERVICE_LABEL, SourceInfo};
