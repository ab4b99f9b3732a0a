pub mod compositor;
pub mod surface;
pub mod tiling;
