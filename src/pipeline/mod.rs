//! Snapshot production pipeline.
//!
//! A single periodic driver polls the upstream engine (or falls back to the
//! synthetic feed), enriches raw readings with rolling analytics and alerts,
//! and publishes the result to shared state and the broadcast hub.

pub mod driver;
pub mod state;

pub use driver::PipelineDriver;
pub use state::BridgeState;
