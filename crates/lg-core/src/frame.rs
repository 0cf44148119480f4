use crate::color::Rgb;
use crate::error::CoreError;

/// Buffer de pixels RGBA, row-major, origine en haut à gauche.
///
/// Stocke les pixels en 4 bytes par pixel. Immuable pendant une conversion.
///
/// # Example
/// ```
/// use lg_core::frame::FrameBuffer;
/// let fb = FrameBuffer::new(10, 10);
/// assert_eq!(fb.data.len(), 400);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    /// Pixels RGBA, row-major, 4 bytes par pixel.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl FrameBuffer {
    /// Crée un buffer pré-alloué (noir transparent) aux dimensions données.
    ///
    /// # Example
    /// ```
    /// use lg_core::frame::FrameBuffer;
    /// let fb = FrameBuffer::new(100, 50);
    /// assert_eq!(fb.width, 100);
    /// assert_eq!(fb.height, 50);
    /// assert_eq!(fb.data.len(), 100 * 50 * 4);
    /// ```
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: vec![0u8; width as usize * height as usize * 4],
            width,
            height,
        }
    }

    /// Wraps an existing RGBA buffer, checking its length.
    ///
    /// # Errors
    /// Returns [`CoreError::BufferSizeMismatch`] when `data.len() != 4 × width × height`.
    ///
    /// # Example
    /// ```
    /// use lg_core::frame::FrameBuffer;
    /// assert!(FrameBuffer::from_rgba(2, 1, vec![0; 8]).is_ok());
    /// assert!(FrameBuffer::from_rgba(2, 1, vec![0; 7]).is_err());
    /// ```
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self, CoreError> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(CoreError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Buffer uniforme, pratique pour les tests et les fonds.
    ///
    /// # Example
    /// ```
    /// use lg_core::frame::FrameBuffer;
    /// let fb = FrameBuffer::filled(2, 2, (255, 0, 0));
    /// assert_eq!(fb.pixel(1, 1), (255, 0, 0, 255));
    /// ```
    #[must_use]
    pub fn filled(width: u32, height: u32, rgb: Rgb) -> Self {
        let mut fb = Self::new(width, height);
        for px in fb.data.chunks_exact_mut(4) {
            px.copy_from_slice(&[rgb.0, rgb.1, rgb.2, 255]);
        }
        fb
    }

    /// `true` if either dimension is zero.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Accès au pixel (x, y) → (r, g, b, a).
    ///
    /// # Example
    /// ```
    /// use lg_core::frame::FrameBuffer;
    /// let fb = FrameBuffer::new(10, 10);
    /// let (r, g, b, a) = fb.pixel(0, 0);
    /// assert_eq!((r, g, b, a), (0, 0, 0, 0));
    /// ```
    #[inline(always)]
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> (u8, u8, u8, u8) {
        debug_assert!(x < self.width && y < self.height, "pixel out of bounds");
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        if idx + 3 >= self.data.len() {
            return (0, 0, 0, 0);
        }
        (
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        )
    }

    /// Écrit le pixel (x, y). Hors limites : ignoré.
    #[inline(always)]
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: (u8, u8, u8, u8)) {
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        if x < self.width && idx + 3 < self.data.len() {
            self.data[idx..idx + 4].copy_from_slice(&[rgba.0, rgba.1, rgba.2, rgba.3]);
        }
    }
}

/// Luminance normalisée [0.0, 1.0], une valeur par cellule de sortie.
///
/// Les étages de contraste la modifient en place.
///
/// # Example
/// ```
/// use lg_core::frame::LuminanceGrid;
/// let grid = LuminanceGrid::new(4, 3);
/// assert_eq!(grid.values.len(), 12);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct LuminanceGrid {
    /// Row-major values in `[0, 1]`.
    pub values: Vec<f32>,
    /// Width in cells.
    pub width: u32,
    /// Height in cells.
    pub height: u32,
}

impl LuminanceGrid {
    /// Grille à zéro.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            values: vec![0.0; width as usize * height as usize],
            width,
            height,
        }
    }
}

/// Final color and opacity of one cell.
///
/// # Example
/// ```
/// use lg_core::frame::CellStyle;
/// let s = CellStyle::opaque((1, 2, 3));
/// assert_eq!(s.opacity, 1.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellStyle {
    /// Couleur RGB.
    pub rgb: Rgb,
    /// Opacité [0.0, 1.0].
    pub opacity: f32,
}

impl CellStyle {
    /// Style fully opaque.
    #[must_use]
    pub const fn opaque(rgb: Rgb) -> Self {
        Self { rgb, opacity: 1.0 }
    }

    /// Couleur pré-mélangée sur `background` selon l'opacité.
    ///
    /// # Example
    /// ```
    /// use lg_core::frame::CellStyle;
    /// let s = CellStyle { rgb: (200, 100, 0), opacity: 0.5 };
    /// assert_eq!(s.blend_over((0, 0, 0)), (100, 50, 0));
    /// ```
    #[must_use]
    pub fn blend_over(&self, background: Rgb) -> Rgb {
        let a = self.opacity.clamp(0.0, 1.0);
        let mix = |fg: u8, bg: u8| -> u8 {
            (f32::from(fg) * a + f32::from(bg) * (1.0 - a))
                .round()
                .clamp(0.0, 255.0) as u8
        };
        (
            mix(self.rgb.0, background.0),
            mix(self.rgb.1, background.1),
            mix(self.rgb.2, background.2),
        )
    }
}

/// Résultat d'une conversion : grille de caractères + styles optionnels.
///
/// Créé à chaque appel, la propriété passe à l'appelant.
///
/// # Example
/// ```
/// use lg_core::frame::ConversionResult;
/// let r = ConversionResult::new(vec!['a', 'b', 'c', 'd'], None, 2, 2);
/// assert_eq!(r.to_text(), "ab\ncd\n");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ConversionResult {
    /// `width × height` characters, row-major.
    pub chars: Vec<char>,
    /// One style per cell, absent in plain monochrome output.
    pub styles: Option<Vec<CellStyle>>,
    /// Width in characters.
    pub width: u32,
    /// Height in characters.
    pub height: u32,
}

impl ConversionResult {
    /// Assemble un résultat.
    #[must_use]
    pub fn new(chars: Vec<char>, styles: Option<Vec<CellStyle>>, width: u32, height: u32) -> Self {
        debug_assert_eq!(chars.len(), width as usize * height as usize);
        Self {
            chars,
            styles,
            width,
            height,
        }
    }

    /// `(width, height)` of the character grid.
    #[inline]
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Character at (x, y).
    #[inline(always)]
    #[must_use]
    pub fn char_at(&self, x: u32, y: u32) -> char {
        self.chars[y as usize * self.width as usize + x as usize]
    }

    /// Style at (x, y), if styles were computed.
    #[inline(always)]
    #[must_use]
    pub fn style_at(&self, x: u32, y: u32) -> Option<&CellStyle> {
        self.styles
            .as_ref()
            .map(|s| &s[y as usize * self.width as usize + x as usize])
    }

    /// Itère sur les lignes de la grille.
    pub fn rows(&self) -> impl Iterator<Item = &[char]> {
        self.chars.chunks(self.width.max(1) as usize)
    }

    /// Grille en texte brut, chaque ligne terminée par `\n`.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = String::with_capacity(self.chars.len() + self.height as usize);
        for row in self.rows() {
            out.extend(row.iter());
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_pixel_out_of_bounds_is_ignored() {
        let mut fb = FrameBuffer::new(2, 2);
        fb.set_pixel(5, 0, (1, 1, 1, 1));
        assert!(fb.data.iter().all(|&b| b == 0));
        fb.set_pixel(1, 1, (9, 8, 7, 6));
        assert_eq!(fb.pixel(1, 1), (9, 8, 7, 6));
    }

    #[test]
    fn rows_follow_width() {
        let r = ConversionResult::new("abcdef".chars().collect(), None, 3, 2);
        let rows: Vec<String> = r.rows().map(|row| row.iter().collect()).collect();
        assert_eq!(rows, vec!["abc".to_string(), "def".to_string()]);
        assert_eq!(r.char_at(2, 1), 'f');
        assert!(r.style_at(0, 0).is_none());
    }

    #[test]
    fn blend_full_opacity_keeps_color() {
        let s = CellStyle::opaque((12, 34, 56));
        assert_eq!(s.blend_over((255, 255, 255)), (12, 34, 56));
    }
}
