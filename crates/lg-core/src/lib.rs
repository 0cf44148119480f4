/// Shared types, configuration and error definitions for lumiglyph.
///
/// Every other crate of the workspace speaks in terms of these types:
/// a `FrameBuffer` goes in, a `ConversionResult` comes out.

pub mod charset;
pub mod color;
pub mod config;
pub mod error;
pub mod frame;
pub mod traits;

pub use charset::DensityRamp;
pub use color::{Palette, Rgb};
pub use config::{ColorMode, ConvertConfig, OutputConfig, Resample};
pub use error::CoreError;
pub use frame::{CellStyle, ConversionResult, FrameBuffer, LuminanceGrid};
