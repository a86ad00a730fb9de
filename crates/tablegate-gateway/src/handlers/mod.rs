//! Request handlers for the gateway API

pub mod health;
pub mod records;

pub use health::health_router;
pub use records::records_router;
