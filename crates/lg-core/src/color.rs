/// Couleur RGB 8 bits.
pub type Rgb = (u8, u8, u8);

/// Gris neutre utilisé quand aucune palette n'est disponible.
pub const MID_GRAY: Rgb = (128, 128, 128);

/// Luma BT.601 sur l'échelle [0, 255].
///
/// # Example
/// ```
/// use lg_core::color::luma;
/// assert!((luma(255, 255, 255) - 255.0).abs() < 1e-3);
/// ```
#[inline(always)]
#[must_use]
pub fn luma(r: u8, g: u8, b: u8) -> f32 {
    0.299 * f32::from(r) + 0.587 * f32::from(g) + 0.114 * f32::from(b)
}

/// Luminance normalisée [0.0, 1.0] : `(0.299R + 0.587G + 0.114B) / 255`.
///
/// # Example
/// ```
/// use lg_core::color::luminance;
/// assert_eq!(luminance(0, 0, 0), 0.0);
/// assert!((luminance(255, 255, 255) - 1.0).abs() < 1e-6);
/// ```
#[inline(always)]
#[must_use]
pub fn luminance(r: u8, g: u8, b: u8) -> f32 {
    (luma(r, g, b) / 255.0).clamp(0.0, 1.0)
}

/// Rapproche chaque canal de la luma : `round(gray + s × (c − gray))`, borné à [0, 255].
///
/// `s = 0` donne du gris, `s = 1` laisse la couleur intacte.
///
/// # Example
/// ```
/// use lg_core::color::saturate;
/// assert_eq!(saturate((200, 50, 50), 1.0), (200, 50, 50));
/// let (r, g, b) = saturate((200, 50, 50), 0.0);
/// assert!(r == g && g == b);
/// ```
#[inline]
#[must_use]
pub fn saturate(rgb: Rgb, saturation: f32) -> Rgb {
    if (saturation - 1.0).abs() < f32::EPSILON {
        return rgb;
    }
    let gray = luma(rgb.0, rgb.1, rgb.2);
    let ch = |c: u8| -> u8 { (gray + saturation * (f32::from(c) - gray)).round().clamp(0.0, 255.0) as u8 };
    (ch(rgb.0), ch(rgb.1), ch(rgb.2))
}

/// Squared Euclidean distance in RGB space.
#[inline(always)]
#[must_use]
pub fn distance_sq(a: Rgb, b: Rgb) -> u32 {
    let dr = i32::from(a.0) - i32::from(b.0);
    let dg = i32::from(a.1) - i32::from(b.1);
    let db = i32::from(a.2) - i32::from(b.2);
    (dr * dr + dg * dg + db * db) as u32
}

/// The 16 named ANSI colors (VGA-style values).
const ANSI_16: [Rgb; 16] = [
    (0, 0, 0),
    (128, 0, 0),
    (0, 128, 0),
    (128, 128, 0),
    (0, 0, 128),
    (128, 0, 128),
    (0, 128, 128),
    (192, 192, 192),
    (128, 128, 128),
    (255, 0, 0),
    (0, 255, 0),
    (255, 255, 0),
    (0, 0, 255),
    (255, 0, 255),
    (0, 255, 255),
    (255, 255, 255),
];

/// Couleur de l'entrée `index` de la palette terminal 256 couleurs.
///
/// 0–15 : couleurs nommées, 16–231 : cube 6×6×6 (`step = i ? i×40+55 : 0`),
/// 232–255 : rampe de gris (`v = i×10+8`).
///
/// # Example
/// ```
/// use lg_core::color::ansi256_color;
/// assert_eq!(ansi256_color(16), (0, 0, 0));
/// assert_eq!(ansi256_color(231), (255, 255, 255));
/// assert_eq!(ansi256_color(232), (8, 8, 8));
/// assert_eq!(ansi256_color(255), (238, 238, 238));
/// ```
#[must_use]
pub fn ansi256_color(index: u8) -> Rgb {
    let step = |i: u8| -> u8 { if i == 0 { 0 } else { i * 40 + 55 } };
    match index {
        0..=15 => ANSI_16[index as usize],
        16..=231 => {
            let i = index - 16;
            (step(i / 36), step((i / 6) % 6), step(i % 6))
        }
        232..=255 => {
            let v = (index - 232) * 10 + 8;
            (v, v, v)
        }
    }
}

/// Ordered color set used for nearest-color snapping.
///
/// Palettes built from sampled colors never hold duplicates. The fixed
/// terminal palette keeps all 256 entries so that positions stay aligned
/// with terminal color indices; lookups resolve ties to the lowest index.
///
/// # Example
/// ```
/// use lg_core::color::Palette;
/// let p = Palette::from_colors([(0, 0, 0), (255, 255, 255), (0, 0, 0)]);
/// assert_eq!(p.len(), 2);
/// assert_eq!(p.nearest((10, 10, 10)), (0, 0, 0));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Rgb>,
}

impl Palette {
    /// Build a palette, dropping repeated entries (first occurrence wins).
    pub fn from_colors(colors: impl IntoIterator<Item = Rgb>) -> Self {
        let mut out: Vec<Rgb> = Vec::new();
        for c in colors {
            if !out.contains(&c) {
                out.push(c);
            }
        }
        Self { colors: out }
    }

    /// Palette terminal standard 256 couleurs.
    ///
    /// # Example
    /// ```
    /// use lg_core::color::Palette;
    /// assert_eq!(Palette::ansi256().len(), 256);
    /// ```
    #[must_use]
    pub fn ansi256() -> Self {
        Self {
            colors: (0..=255u8).map(ansi256_color).collect(),
        }
    }

    /// Entries in order.
    #[inline]
    #[must_use]
    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    /// Nombre d'entrées.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// `true` si la palette est vide.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Index of the closest entry by squared distance; ties go to the first entry.
    #[must_use]
    pub fn nearest_index(&self, rgb: Rgb) -> Option<usize> {
        let mut best: Option<(usize, u32)> = None;
        for (i, &c) in self.colors.iter().enumerate() {
            let d = distance_sq(rgb, c);
            if best.is_none_or(|(_, bd)| d < bd) {
                best = Some((i, d));
                if d == 0 {
                    break;
                }
            }
        }
        best.map(|(i, _)| i)
    }

    /// Closest entry; an empty palette falls back to mid-gray.
    #[inline]
    #[must_use]
    pub fn nearest(&self, rgb: Rgb) -> Rgb {
        self.nearest_index(rgb)
            .map_or(MID_GRAY, |i| self.colors[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_steps_match_terminal_table() {
        assert_eq!(ansi256_color(16 + 36 + 6 + 1), (95, 95, 95));
        assert_eq!(ansi256_color(196), (255, 0, 0));
        assert_eq!(ansi256_color(21), (0, 0, 255));
    }

    #[test]
    fn nearest_prefers_first_on_tie() {
        let p = Palette::from_colors([(0, 0, 10), (0, 0, 30)]);
        assert_eq!(p.nearest((0, 0, 20)), (0, 0, 10));
    }

    #[test]
    fn nearest_black_white() {
        let p = Palette::from_colors([(0, 0, 0), (255, 255, 255)]);
        assert_eq!(p.nearest((10, 10, 10)), (0, 0, 0));
        assert_eq!(p.nearest((200, 200, 200)), (255, 255, 255));
    }

    #[test]
    fn empty_palette_gives_mid_gray() {
        let p = Palette::from_colors(std::iter::empty());
        assert!(p.is_empty());
        assert_eq!(p.nearest((1, 2, 3)), MID_GRAY);
    }

    #[test]
    fn ansi_duplicates_resolve_to_low_index() {
        let p = Palette::ansi256();
        assert_eq!(p.nearest_index((0, 0, 0)), Some(0));
        assert_eq!(p.nearest_index((255, 255, 255)), Some(15));
    }

    #[test]
    fn saturation_zero_is_gray() {
        let (r, g, b) = saturate((255, 0, 0), 0.0);
        assert_eq!((r, g, b), (76, 76, 76));
    }
}
