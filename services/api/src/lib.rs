//! services/api/src/lib.rs
//!
//! The HTTP/WebSocket service around the shopping list core: adapters for the
//! core's ports, configuration, and the web layer.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
