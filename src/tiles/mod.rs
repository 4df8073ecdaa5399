pub mod cache;
pub mod loader;
pub mod source;

// Re-exports for convenience
pub use cache::{TileCache, TileImage};
pub use loader::{HttpTileLoader, TileFetcher};
pub use source::{HttpProbe, ServerUnreachable, TileProbe, TileServer, TileServerRegistry};
