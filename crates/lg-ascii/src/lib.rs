/// Conversion engine for lumiglyph.
///
/// Frame → brightness samples → contrast → glyphs, with an optional color
/// path (palette reduction, per-cell colorization) and run-length markup.
pub mod colorize;
pub mod contrast;
pub mod glyph;
pub mod markup;
pub mod pipeline;
pub mod quantize;
pub mod sampler;

pub use pipeline::Converter;
