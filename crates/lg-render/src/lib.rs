/// Terminal rendering for lumiglyph.
///
/// Writes conversion results into ratatui buffers, status line, FPS tracking.
pub mod canvas;
pub mod fps;
pub mod ui;
