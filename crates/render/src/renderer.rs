use std::collections::BTreeMap;

use glam::IVec2;
use mechworks_common::{BlockPos, TypeId};
use mechworks_kernel::{Grid, TypeRegistry, World};

/// A horizontal slice of the grid: one layer `y`, spanning `min..=max`
/// on the x/z plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceView {
    pub y: i32,
    pub min: IVec2,
    pub max: IVec2,
}

impl SliceView {
    pub fn new(y: i32, min: IVec2, max: IVec2) -> Self {
        Self {
            y,
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// Slice centered on the origin column.
    pub fn around(y: i32, radius: i32) -> Self {
        Self::new(y, IVec2::splat(-radius), IVec2::splat(radius))
    }

    pub fn width(&self) -> usize {
        (self.max.x - self.min.x + 1) as usize
    }
}

impl Default for SliceView {
    fn default() -> Self {
        Self::around(0, 8)
    }
}

/// Characters used to draw each cell type.
#[derive(Debug, Clone)]
pub struct GlyphTable {
    glyphs: BTreeMap<TypeId, char>,
    empty: char,
    powered: char,
    unknown: char,
}

impl Default for GlyphTable {
    fn default() -> Self {
        Self {
            glyphs: BTreeMap::new(),
            empty: '.',
            powered: '*',
            unknown: '?',
        }
    }
}

impl GlyphTable {
    /// One glyph per registered type: the first letter of its name.
    pub fn from_registry(registry: &TypeRegistry) -> Self {
        let mut table = Self::default();
        for (id, props) in registry.iter() {
            if id.is_empty() {
                continue;
            }
            if let Some(c) = props.name.chars().next() {
                table.glyphs.insert(id, c);
            }
        }
        table
    }

    /// Override the glyph for one type.
    pub fn set(&mut self, id: TypeId, glyph: char) -> &mut Self {
        self.glyphs.insert(id, glyph);
        self
    }

    pub fn glyph(&self, id: TypeId) -> char {
        if id.is_empty() {
            return self.empty;
        }
        self.glyphs.get(&id).copied().unwrap_or(self.unknown)
    }
}

/// Renderer-agnostic interface. Renderers read world state and a view and
/// produce some output; they never write to the world.
pub trait Renderer {
    type Output;

    fn render(&self, world: &World, view: &SliceView) -> Self::Output;
}

/// Draws a slice as rows of characters, north at the top.
///
/// Empty cells carrying power are drawn with the power glyph so sources
/// show up next to the mechanisms they drive.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    glyphs: GlyphTable,
}

impl DebugTextRenderer {
    pub fn new(glyphs: GlyphTable) -> Self {
        Self { glyphs }
    }

    pub fn glyphs(&self) -> &GlyphTable {
        &self.glyphs
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, world: &World, view: &SliceView) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "=== y={} x={}..={} z={}..={} (tick={}, cells={}) ===\n",
            view.y,
            view.min.x,
            view.max.x,
            view.min.y,
            view.max.y,
            world.tick(),
            world.cell_count()
        ));
        for z in view.min.y..=view.max.y {
            let mut row = String::with_capacity(view.width());
            for x in view.min.x..=view.max.x {
                let pos = BlockPos::new(x, view.y, z);
                let id = world.type_id(pos);
                let c = if id.is_empty() && world.is_powered(pos) {
                    self.glyphs.powered
                } else {
                    self.glyphs.glyph(id)
                };
                row.push(c);
            }
            out.push_str(&row);
            out.push('\n');
        }
        tracing::trace!(y = view.y, bytes = out.len(), "slice rendered");
        out
    }
}
