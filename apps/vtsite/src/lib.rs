//! # vtsite
//!
//! The site server: HTTP surface, CLI, operator configuration, mail
//! delivery and the oEmbed client. Everything that renders or validates
//! lives in `vtsite-core`; this crate wires it to the network.
//!
//! The binary in `main.rs` is a thin wrapper; integration tests drive the
//! router through this library (`vtsite::api::*`).

pub mod api;
pub mod cli;
pub mod config;
pub mod mail;
pub mod oembed;
