//! Terminal UI layer for zoom-attendance.
//!
//! Provides themes, the attendance timeline chart, the summary table, the
//! text and image plots, the console summary and the interactive event loop.
//! Everything on screen is built on top of [`ratatui`].

pub mod app;
pub mod chart;
pub mod components;
pub mod export;
pub mod plot_image;
pub mod summary;
pub mod table_view;
pub mod themes;

pub use attendance_core as core;
