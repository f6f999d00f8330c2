//! # Domain Layer
//!
//! - `entities` - persisted records (`StoredBlock`, `DedupRecord`)
//! - `errors` - store and backend errors
//! - `keys` - key layout

pub mod entities;
pub mod errors;
pub mod keys;
