//! Rolling-window statistics and threshold alert detection.

pub mod alerts;
pub mod rolling;

pub use alerts::AlertDetector;
pub use rolling::{RollingTracker, WindowStats};
