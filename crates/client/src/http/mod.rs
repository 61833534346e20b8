//! HTTP transport
//!
//! Thin wrapper around `reqwest` that applies connect/read timeouts and maps
//! transport-level failures into [`davenport_domain::DavenportError`].

pub mod client;

pub use client::{HttpClient, HttpClientBuilder};
