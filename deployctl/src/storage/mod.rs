//! On-disk configuration and state

pub mod job;
pub mod layout;
pub mod property_store;
pub mod settings;
