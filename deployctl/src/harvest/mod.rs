//! Post-deploy property harvest

pub mod propagator;

pub use propagator::PropertyPropagator;
