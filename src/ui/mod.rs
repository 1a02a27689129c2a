//! User interface components (progress bars)

pub mod progress;
