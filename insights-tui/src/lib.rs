//! Audio Insights - terminal dashboard for meeting recordings.
//!
//! Upload a recording, read its summary as it streams in, compare speaker
//! relevance, and lay the extracted action items out on a week timeline.

pub mod api;
pub mod app;
pub mod config;
pub mod dates;
pub mod error;
pub mod models;
pub mod requests;
pub mod summary;
pub mod theme;
pub mod timeline;
pub mod ui;
pub mod upload;
