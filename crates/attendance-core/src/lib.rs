//! Core types for the Zoom attendance tools.
//!
//! Holds the roster and session-window models, the error type, command-line
//! settings, time parsing, display-name clean-up and the roster name matcher
//! shared by the data and UI crates.

pub mod error;
pub mod formatting;
pub mod matcher;
pub mod models;
pub mod names;
pub mod settings;
pub mod time_utils;
