use crate::error::CoreError;

/// 70 caractères (Paul Bourke), du plus dense au plus clair.
pub const RAMP_STANDARD: &str =
    "$@B%8&WM#*oahkbdpqwmZO0QLCJUYXzcvunxrjft/\\|()1{}[]?-_+~<>i!lI;:,\"^`'. ";

/// 10 caractères, compact, bon contraste.
pub const RAMP_COMPACT: &str = "@%#*+=-:. ";

/// Blocs Unicode : pseudo-pixels.
pub const RAMP_BLOCKS: &str = "█▓▒░ ";

/// Minimal : haut contraste.
pub const RAMP_MINIMAL: &str = "#. ";

/// Presets cycled by the interactive preview.
pub const PRESETS: &[&str] = &[RAMP_COMPACT, RAMP_STANDARD, RAMP_BLOCKS, RAMP_MINIMAL];

/// Ordered glyph set, darkest first.
///
/// Index 0 renders black, the last entry renders white. The last entry is
/// also the "empty" glyph used when there is nothing to sample.
///
/// # Example
/// ```
/// use lg_core::charset::DensityRamp;
/// let ramp = DensityRamp::new("#. ").unwrap();
/// assert_eq!(ramp.len(), 3);
/// assert_eq!(ramp.reversed().glyph(0), ' ');
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DensityRamp {
    chars: Vec<char>,
}

impl DensityRamp {
    /// Build a ramp from a string ordered darkest→lightest.
    ///
    /// # Errors
    /// Returns [`CoreError::EmptyDensityRamp`] if `ramp` is empty.
    pub fn new(ramp: &str) -> Result<Self, CoreError> {
        let chars: Vec<char> = ramp.chars().filter(|c| *c != '\n' && *c != '\r').collect();
        if chars.is_empty() {
            return Err(CoreError::EmptyDensityRamp);
        }
        Ok(Self { chars })
    }

    /// Même rampe, ordre inversé (fond clair).
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            chars: self.chars.iter().rev().copied().collect(),
        }
    }

    /// Nombre de glyphes (toujours ≥ 1).
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// Always `false`: construction rejects empty ramps.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Glyph at `index`, clamped to the last entry.
    #[inline(always)]
    #[must_use]
    pub fn glyph(&self, index: usize) -> char {
        self.chars[index.min(self.chars.len() - 1)]
    }

    /// Glyph shown for a zero-area source.
    #[inline]
    #[must_use]
    pub fn empty_glyph(&self) -> char {
        self.glyph(self.chars.len() - 1)
    }

    /// Glyphes dans l'ordre.
    #[inline]
    #[must_use]
    pub fn chars(&self) -> &[char] {
        &self.chars
    }
}
