//! `tablegate-gateway`: the tablegate runtime.
//!
//! This crate provides the concrete pieces behind the contracts defined in
//! `tablegate-kernel`:
//!
//! | Kernel contract | Implementation |
//! |----------------|----------------|
//! | [`RecordBackend`] | [`backend::AirtableBackend`], [`backend::InMemoryBackend`] |
//!
//! The [`server::GatewayServer`] wires a backend into an axum HTTP service;
//! [`respond`] turns domain values into JSON responses.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use tablegate_gateway::backend::AirtableBackend;
//! use tablegate_gateway::server::GatewayServer;
//! use tablegate_kernel::GatewaySettings;
//!
//! #[tokio::main]
//! async fn main() {
//!     let settings = GatewaySettings::load(None).unwrap();
//!     let backend = AirtableBackend::from_settings(&settings.remote).unwrap();
//!     GatewayServer::new(settings, backend).start().await.unwrap();
//! }
//! ```
//!
//! [`RecordBackend`]: tablegate_kernel::RecordBackend

pub mod backend;
pub mod error;
pub mod handlers;
pub mod respond;
pub mod server;
pub mod state;

// Re-export the kernel for convenience.
pub use tablegate_kernel as kernel;
