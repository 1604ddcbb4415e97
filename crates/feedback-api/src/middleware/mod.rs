//! HTTP middleware layers.

pub mod cors;
