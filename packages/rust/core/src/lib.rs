//! Core pipeline orchestration and domain logic for topicpress.
//!
//! This crate ties together topic tree loading, per-document markdown
//! transformation, title page assembly and combined document emission into
//! the end-to-end `build` workflow, and hands the result to the renderer.

pub mod emitter;
pub mod pipeline;
pub mod render;
pub mod title_page;
pub mod tree;
pub mod walker;
