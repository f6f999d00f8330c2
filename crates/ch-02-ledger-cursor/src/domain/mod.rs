//! # Domain Layer
//!
//! - `cursor` - sequential, resumable block reader
//! - `extractor` - envelope to cross-chain message decoding
//! - `errors` - extraction errors

pub mod cursor;
pub mod errors;
pub mod extractor;
