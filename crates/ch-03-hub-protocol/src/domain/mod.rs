//! # Domain Layer

pub mod errors;
