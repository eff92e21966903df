//! Leptos components.

pub mod field;
