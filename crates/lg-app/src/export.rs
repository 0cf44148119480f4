//! Conversion unique : texte/HTML/ANSI, PNG optionnel.

use std::path::Path;

use anyhow::{Context, Result};
use lg_ascii::Converter;
use lg_core::config::{ConvertConfig, OutputConfig};
use lg_core::frame::{ConversionResult, FrameBuffer};
use lg_export::rasterizer::Rasterizer;
use lg_export::writer::{TextFormat, format_result, html_document, save_png, write_output};

/// Paramètres de sortie d'une conversion unique.
#[derive(Clone, Copy, Debug)]
pub struct ExportTarget<'a> {
    /// Format texte.
    pub format: TextFormat,
    /// Fichier texte (stdout si `None`).
    pub output: Option<&'a Path>,
    /// Page HTML complète.
    pub standalone: bool,
    /// Image PNG à produire.
    pub png: Option<&'a Path>,
    /// Police pour le PNG.
    pub font: Option<&'a Path>,
}

/// Convertit `frame` et écrit les sorties demandées.
///
/// # Errors
/// Returns an error on conversion failure, unreadable font or write failure.
pub fn run_oneshot(
    frame: &FrameBuffer,
    config: &ConvertConfig,
    output: &OutputConfig,
    target: &ExportTarget<'_>,
) -> Result<ConversionResult> {
    let mut converter = Converter::new();
    let result = converter.convert(frame, output.columns, config)?;
    log::info!(
        "Conversion {}×{} → {}×{} cellules",
        frame.width,
        frame.height,
        result.width,
        result.height
    );

    let text = render_text(&result, target.format, target.standalone, output);
    write_output(target.output, &text)?;

    if let Some(png) = target.png {
        let font_path = target.font.context("--png requiert --font")?;
        export_png(&result, config, output, font_path, png)?;
    }
    Ok(result)
}

/// Texte final, enveloppé dans une page HTML si `standalone`.
#[must_use]
pub fn render_text(
    result: &ConversionResult,
    format: TextFormat,
    standalone: bool,
    output: &OutputConfig,
) -> String {
    let body = format_result(result, format, output.background);
    if standalone && format == TextFormat::Html {
        html_document(&body, output.background)
    } else {
        body
    }
}

fn export_png(
    result: &ConversionResult,
    config: &ConvertConfig,
    output: &OutputConfig,
    font_path: &Path,
    png: &Path,
) -> Result<()> {
    let font = std::fs::read(font_path)
        .with_context(|| format!("Impossible de lire la police {}", font_path.display()))?;
    let ramp = config.effective_ramp()?;
    let rasterizer = Rasterizer::new(&font, output.font_size, ramp.chars())?;
    let (cw, ch) = rasterizer.cell_size();
    log::debug!("Cellule raster : {cw}×{ch} px");
    let fb = rasterizer.render_to_frame(result, output.background, config.foreground);
    save_png(&fb, png)
}
