pub mod compositor;

// Re-export main types
pub use compositor::{
    tile_grid, DrawCommand, Frame, GridCell, RenderStats, ResamplingQuality, ViewportCompositor,
};
