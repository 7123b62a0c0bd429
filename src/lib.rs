//! BRSR report wizard
//!
//! Form core (nested path updates, form state, validation errors, save
//! lifecycle, section forms), the report API client, and the terminal UI
//! driven by `main`.

pub mod api;
pub mod app;
pub mod config;
pub mod state;
pub mod ui;
