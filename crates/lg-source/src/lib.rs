/// Frame sources for lumiglyph (still image, video).

pub mod image;

#[cfg(feature = "video")]
pub mod video;
