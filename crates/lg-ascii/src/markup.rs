//! Rendu texte compact : les cellules adjacentes de même style sont fusionnées en runs.

use std::fmt::Write as _;
use std::ops::Range;

use lg_core::color::Rgb;
use lg_core::frame::{CellStyle, ConversionResult};

/// Style d'un run : couleur + opacité quantifiée au centième.
///
/// La quantification ne sert qu'à fusionner davantage de cellules ; deux
/// opacités qui arrondissent au même centième partagent un run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RunStyle {
    /// Couleur.
    pub rgb: Rgb,
    /// Opacité en centièmes, 0..=100.
    pub opacity: u8,
}

impl From<&CellStyle> for RunStyle {
    /// Quantize a cell style.
    ///
    /// # Example
    /// ```
    /// use lg_ascii::markup::RunStyle;
    /// use lg_core::frame::CellStyle;
    /// let a = RunStyle::from(&CellStyle { rgb: (1, 2, 3), opacity: 0.501 });
    /// let b = RunStyle::from(&CellStyle { rgb: (1, 2, 3), opacity: 0.499 });
    /// assert_eq!(a, b);
    /// assert_eq!(a.opacity, 50);
    /// ```
    #[inline]
    fn from(style: &CellStyle) -> Self {
        Self {
            rgb: style.rgb,
            opacity: (style.opacity.clamp(0.0, 1.0) * 100.0).round() as u8,
        }
    }
}

impl RunStyle {
    /// Opacité sous forme `0.NN`.
    #[must_use]
    pub fn opacity_str(&self) -> String {
        format!("{}.{:02}", self.opacity / 100, self.opacity % 100)
    }

    /// Couleur pré-mélangée sur `background`.
    #[must_use]
    pub fn blend_over(&self, background: Rgb) -> Rgb {
        CellStyle {
            rgb: self.rgb,
            opacity: f32::from(self.opacity) / 100.0,
        }
        .blend_over(background)
    }
}

/// Iterator over the maximal runs of one row.
///
/// # Example
/// ```
/// use lg_ascii::markup::row_runs;
/// use lg_core::frame::CellStyle;
/// let styles = vec![CellStyle::opaque((9, 9, 9)); 5];
/// let runs: Vec<_> = row_runs(&styles).collect();
/// assert_eq!(runs.len(), 1);
/// assert_eq!(runs[0].1, 0..5);
/// ```
pub struct RowRuns<'a> {
    styles: &'a [CellStyle],
    pos: usize,
}

/// Découpe une ligne de styles en runs `(style, plage de colonnes)`.
#[must_use]
pub fn row_runs(styles: &[CellStyle]) -> RowRuns<'_> {
    RowRuns { styles, pos: 0 }
}

impl Iterator for RowRuns<'_> {
    type Item = (RunStyle, Range<usize>);

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.styles.get(self.pos)?;
        let key = RunStyle::from(first);
        let start = self.pos;
        self.pos += 1;
        while let Some(s) = self.styles.get(self.pos) {
            if RunStyle::from(s) != key {
                break;
            }
            self.pos += 1;
        }
        Some((key, start..self.pos))
    }
}

/// Échappe `& < > " '` pour le HTML.
///
/// # Example
/// ```
/// use lg_ascii::markup::push_escaped;
/// let mut s = String::new();
/// push_escaped(&mut s, &['<', 'a', '&', '\'']);
/// assert_eq!(s, "&lt;a&amp;&#39;");
/// ```
pub fn push_escaped(out: &mut String, chars: &[char]) {
    for &c in chars {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}

/// Renders the result as HTML spans, one span per run.
///
/// Without styles the plain character grid is returned, unescaped. Every
/// row ends with `\n`. Opacity is written only when below 1.
///
/// # Example
/// ```
/// use lg_ascii::markup::render_html;
/// use lg_core::frame::{CellStyle, ConversionResult};
/// let styles = vec![CellStyle::opaque((255, 0, 0)), CellStyle::opaque((255, 0, 0))];
/// let result = ConversionResult::new(vec!['<', '#'], Some(styles), 2, 1);
/// assert_eq!(render_html(&result), "<span style=\"color:rgb(255,0,0)\">&lt;#</span>\n");
/// ```
#[must_use]
pub fn render_html(result: &ConversionResult) -> String {
    let Some(styles) = result.styles.as_ref() else {
        return result.to_text();
    };
    let width = result.width.max(1) as usize;
    let mut out = String::with_capacity(result.chars.len() * 4);

    for (chars, row_styles) in result.chars.chunks(width).zip(styles.chunks(width)) {
        for (style, range) in row_runs(row_styles) {
            let (r, g, b) = style.rgb;
            let _ = write!(out, "<span style=\"color:rgb({r},{g},{b})");
            if style.opacity < 100 {
                let _ = write!(out, ";opacity:{}", style.opacity_str());
            }
            out.push_str("\">");
            push_escaped(&mut out, &chars[range]);
            out.push_str("</span>");
        }
        out.push('\n');
    }
    out
}

/// Renders the result with 24-bit ANSI foreground escapes, one escape per run.
///
/// Opacity is pre-blended against `background`. Rows end with a reset and
/// `\n`. Without styles the plain character grid is returned.
///
/// # Example
/// ```
/// use lg_ascii::markup::render_ansi;
/// use lg_core::frame::{CellStyle, ConversionResult};
/// let styles = vec![CellStyle { rgb: (200, 100, 0), opacity: 0.5 }];
/// let result = ConversionResult::new(vec!['#'], Some(styles), 1, 1);
/// assert_eq!(render_ansi(&result, (0, 0, 0)), "\x1b[38;2;100;50;0m#\x1b[0m\n");
/// ```
#[must_use]
pub fn render_ansi(result: &ConversionResult, background: Rgb) -> String {
    let Some(styles) = result.styles.as_ref() else {
        return result.to_text();
    };
    let width = result.width.max(1) as usize;
    let mut out = String::with_capacity(result.chars.len() * 8);

    for (chars, row_styles) in result.chars.chunks(width).zip(styles.chunks(width)) {
        let mut last: Option<Rgb> = None;
        for (style, range) in row_runs(row_styles) {
            let rgb = style.blend_over(background);
            // Deux runs peuvent donner la même couleur une fois mélangés.
            if last != Some(rgb) {
                let _ = write!(out, "\x1b[38;2;{};{};{}m", rgb.0, rgb.1, rgb.2);
                last = Some(rgb);
            }
            out.extend(chars[range].iter());
        }
        out.push_str("\x1b[0m\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with(chars: &str, styles: Vec<CellStyle>, width: u32) -> ConversionResult {
        let chars: Vec<char> = chars.chars().collect();
        let height = chars.len() as u32 / width;
        ConversionResult::new(chars, Some(styles), width, height)
    }

    #[test]
    fn five_identical_cells_make_one_run() {
        let styles = vec![CellStyle::opaque((1, 2, 3)); 5];
        let html = render_html(&result_with("#####", styles, 5));
        assert_eq!(html.matches("<span").count(), 1);
        assert!(html.contains(">#####</span>"));
    }

    #[test]
    fn style_change_splits_runs_and_rows_flush() {
        let a = CellStyle::opaque((1, 1, 1));
        let b = CellStyle::opaque((2, 2, 2));
        let html = render_html(&result_with("aabbaa", vec![a, a, b, a, a, a], 3));
        assert_eq!(
            html,
            "<span style=\"color:rgb(1,1,1)\">aa</span><span style=\"color:rgb(2,2,2)\">b</span>\n\
             <span style=\"color:rgb(1,1,1)\">baa</span>\n"
        );
    }

    #[test]
    fn opacity_is_written_with_two_decimals() {
        let s = CellStyle {
            rgb: (5, 6, 7),
            opacity: 0.254,
        };
        let html = render_html(&result_with("x", vec![s], 1));
        assert_eq!(html, "<span style=\"color:rgb(5,6,7);opacity:0.25\">x</span>\n");
    }

    #[test]
    fn every_special_char_is_escaped() {
        let s = CellStyle::opaque((0, 0, 0));
        let html = render_html(&result_with("&<>\"'", vec![s; 5], 5));
        assert!(html.contains(">&amp;&lt;&gt;&quot;&#39;</span>"));
    }

    #[test]
    fn plain_output_without_styles() {
        let r = ConversionResult::new("<#".chars().collect(), None, 1, 2);
        assert_eq!(render_html(&r), "<\n#\n");
        assert_eq!(render_ansi(&r, (0, 0, 0)), "<\n#\n");
    }

    #[test]
    fn ansi_merges_runs_and_resets_rows() {
        let a = CellStyle::opaque((10, 20, 30));
        let ansi = render_ansi(&result_with("abcd", vec![a; 4], 2), (0, 0, 0));
        assert_eq!(
            ansi,
            "\x1b[38;2;10;20;30mab\x1b[0m\n\x1b[38;2;10;20;30mcd\x1b[0m\n"
        );
    }
}
