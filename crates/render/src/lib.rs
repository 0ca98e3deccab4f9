//! Rendering adapter: renderer-agnostic interface over a grid world.
//!
//! # Invariants
//! - Renderers read the world; they never mutate it.
//! - Output depends only on world state, the view, and the glyph table.

mod renderer;

pub use renderer::{DebugTextRenderer, GlyphTable, Renderer, SliceView};
