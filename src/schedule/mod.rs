pub mod host;
pub mod runner;
pub mod smoothing;
