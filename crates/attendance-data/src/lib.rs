//! Data layer for zoom-attendance.
//!
//! Responsible for locating the meeting exports, reading the roster,
//! participants report and chat log, detecting question periods,
//! aggregating per-student attendance and running the top-level analysis
//! pipeline.

pub mod aggregator;
pub mod analysis;
pub mod discovery;
pub mod questions;
pub mod reader;
pub mod summary_csv;

pub use attendance_core as core;
