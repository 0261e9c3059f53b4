//! # codesync-renderer
//!
//! Tera-based engine that renders the generated `<CodeGroup dynamic>`
//! container from segment references and their selected lines.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use codesync_renderer::{BlockContext, Renderer, SegmentCtx};
//! use codesync_core::types::SegmentReference;
//!
//! fn render(reference: &SegmentReference, lines: &[&str]) {
//!     if let Ok(renderer) = Renderer::new() {
//!         let ctx = BlockContext {
//!             segments: vec![SegmentCtx::new(reference, lines, "\t")],
//!         };
//!         if let Ok(block) = renderer.render(&ctx) {
//!             println!("{block}");
//!         }
//!     }
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;

pub use context::{language_for, BlockContext, SegmentCtx};
pub use engine::Renderer;
pub use error::RenderError;
