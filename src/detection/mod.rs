// src/detection/mod.rs
pub mod change_detector;

pub use change_detector::ChangeDetector;
