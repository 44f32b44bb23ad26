//! Snapshot preparation

pub mod reconciler;

pub use reconciler::{ReconcileReport, SnapshotMutation, SnapshotReconciler};
