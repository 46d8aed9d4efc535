//! Data model: request options, wire payloads, responses and stream units.

pub mod options;
pub mod request;
pub mod response;
pub mod stream;
