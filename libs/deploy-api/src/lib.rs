//! Deployment server API models
//!
//! Serde representations of the request and response bodies exchanged with
//! the deployment server's `/cli`, `/rest` and `/property` endpoints.

pub mod models;
