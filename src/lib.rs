//! An embeddable spreadsheet-style grid for reconciling ledger entries.
//!
//! The [`grid`] module is the library proper: a headless state machine over
//! caller-owned row arrays, driven by [`grid::GridAction`]s and answering
//! with [`grid::GridEvent`]s. Everything else here is the terminal demo that
//! embeds it.

pub mod app;
pub mod fileio;
pub mod grid;
pub mod input;
pub mod style;
pub mod ui;
