//! HTTP handlers for the dad-joke service.

pub mod joke;
