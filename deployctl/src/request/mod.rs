//! Deployment request construction

pub mod builder;
pub mod parse;

pub use builder::RequestBuilder;
