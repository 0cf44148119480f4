/// Export for lumiglyph: text/HTML/ANSI writers and PNG rasterization.
pub mod rasterizer;
pub mod writer;
