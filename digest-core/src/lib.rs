//! Core types for the AI news digest
//!
//! This crate defines the shared data structures used across the digest,
//! including the raw upstream article and the display-ready record handed
//! to the rendering layer.

pub mod news;

pub use news::{DisplayItem, RawItem, SourceRef};
