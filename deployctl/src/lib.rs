//! deployctl library
//!
//! Builds deployment requests from job files and drives them through a
//! deployment server: snapshot preparation, submission, status polling and
//! property harvest.

pub mod deploy;
pub mod errors;
pub mod filesys;
pub mod harvest;
pub mod http;
pub mod logs;
pub mod models;
pub mod request;
pub mod service;
pub mod snapshot;
pub mod storage;
pub mod utils;
pub mod vars;

#[cfg(any(test, feature = "test"))]
pub mod testing;
