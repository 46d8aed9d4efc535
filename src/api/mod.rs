//! High-level request API.

pub mod ask;

pub use ask::AskRequestBuilder;
