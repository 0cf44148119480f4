use thiserror::Error;

/// Errors originating from the core module.
///
/// Only caller mistakes end up here. Degenerate inputs the pipeline can
/// recover from (zero-area source, flat histogram, fewer distinct colors
/// than requested) are normalized in place and never surface as errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Invalid configuration value or structure.
    #[error("Configuration invalide : {0}")]
    Config(String),

    /// The density ramp holds no character at all.
    #[error("Rampe de densité vide : au moins un caractère est requis")]
    EmptyDensityRamp,

    /// Invalid width/height dimensions.
    #[error("Dimensions invalides : {width}×{height}")]
    InvalidDimensions {
        /// Width value.
        width: u32,
        /// Height value.
        height: u32,
    },

    /// Pixel buffer length does not match `4 × width × height`.
    #[error("Taille de buffer incohérente : {actual} octets, {expected} attendus")]
    BufferSizeMismatch {
        /// Length implied by the declared dimensions.
        expected: usize,
        /// Length actually supplied.
        actual: usize,
    },
}
