//! Sérialisation d'un résultat : texte brut, HTML, ANSI, PNG.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use lg_ascii::markup::{render_ansi, render_html};
use lg_core::color::Rgb;
use lg_core::frame::{ConversionResult, FrameBuffer};

/// Format de sortie texte.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextFormat {
    /// Grille brute, sans couleur.
    #[default]
    Text,
    /// Spans HTML fusionnés par run.
    Html,
    /// Séquences SGR 24 bits.
    Ansi,
}

/// Met en forme `result` dans le format demandé.
///
/// # Example
/// ```
/// use lg_core::frame::ConversionResult;
/// use lg_export::writer::{format_result, TextFormat};
/// let r = ConversionResult::new(vec!['a', 'b'], None, 2, 1);
/// assert_eq!(format_result(&r, TextFormat::Text, (0, 0, 0)), "ab\n");
/// ```
#[must_use]
pub fn format_result(result: &ConversionResult, format: TextFormat, background: Rgb) -> String {
    match format {
        TextFormat::Text => result.to_text(),
        TextFormat::Html => render_html(result),
        TextFormat::Ansi => render_ansi(result, background),
    }
}

/// Page HTML autonome autour des spans (fond et police monospace).
///
/// # Example
/// ```
/// use lg_export::writer::html_document;
/// let page = html_document("<span>x</span>\n", (0, 0, 0));
/// assert!(page.starts_with("<!DOCTYPE html>"));
/// assert!(page.contains("background:rgb(0,0,0)"));
/// ```
#[must_use]
pub fn html_document(body: &str, background: Rgb) -> String {
    let (r, g, b) = background;
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n</head>\n\
         <body style=\"background:rgb({r},{g},{b});margin:0\">\n\
         <pre style=\"font-family:monospace;line-height:1;color:rgb(255,255,255)\">\n\
         {body}</pre>\n</body>\n</html>\n"
    )
}

/// Écrit `content` dans `path`, ou sur stdout si `path` est `None`.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn write_output(path: Option<&Path>, content: &str) -> Result<()> {
    if let Some(path) = path {
        std::fs::write(path, content)
            .with_context(|| format!("Impossible d'écrire {}", path.display()))?;
        log::info!("Export écrit : {}", path.display());
    } else {
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(content.as_bytes())
            .context("Écriture stdout")?;
        stdout.flush().context("Écriture stdout")?;
    }
    Ok(())
}

/// Enregistre un FrameBuffer RGBA en PNG.
///
/// # Errors
/// Returns an error if the buffer is inconsistent or the file cannot be written.
pub fn save_png(fb: &FrameBuffer, path: &Path) -> Result<()> {
    let img = image::RgbaImage::from_raw(fb.width, fb.height, fb.data.clone())
        .context("FrameBuffer incohérent avec ses dimensions")?;
    img.save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("Impossible d'écrire {}", path.display()))?;
    log::info!("PNG écrit : {}×{} — {}", fb.width, fb.height, path.display());
    Ok(())
}
