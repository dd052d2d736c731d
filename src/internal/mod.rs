// Internal shared pieces: the crate-wide error type.

pub mod error;
