//! Backend module.

mod airtable;
mod memory;

pub use airtable::AirtableBackend;
pub use memory::InMemoryBackend;
