use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::charset::{DensityRamp, RAMP_COMPACT};
use crate::color::Rgb;
use crate::error::CoreError;

/// Color handling mode.
///
/// # Example
/// ```
/// use lg_core::config::ColorMode;
/// assert_eq!(ColorMode::default(), ColorMode::Monochrome);
/// assert_eq!(ColorMode::Monochrome.next(), ColorMode::Truecolor);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum ColorMode {
    /// Pas de couleur par cellule.
    #[default]
    Monochrome,
    /// RGB direct du pixel échantillonné.
    Truecolor,
    /// Snap sur la palette terminal 256 couleurs.
    FixedPalette,
    /// Snap sur une palette median-cut de `palette_size` couleurs.
    Adaptive,
}

impl ColorMode {
    /// Mode suivant (cycle).
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::Monochrome => Self::Truecolor,
            Self::Truecolor => Self::FixedPalette,
            Self::FixedPalette => Self::Adaptive,
            Self::Adaptive => Self::Monochrome,
        }
    }
}

/// Resampling filter used by the brightness sampler.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum Resample {
    /// Plus proche voisin.
    Nearest,
    /// Moyenne de boîte.
    Box,
    /// Bilinéaire.
    #[default]
    Bilinear,
}

/// Paramètres complets de conversion. Chaque champ a une valeur par défaut.
///
/// # Example
/// ```
/// use lg_core::config::ConvertConfig;
/// let config = ConvertConfig::default();
/// assert_eq!(config.contrast, 1.0);
/// assert!(!config.histogram_eq);
/// ```
#[allow(clippy::struct_excessive_bools)]
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// Rampe de densité, du plus sombre au plus clair.
    pub density_ramp: String,
    /// Inverser la rampe (pour fond clair).
    pub invert: bool,
    /// Facteur de contraste linéaire autour de 0.5. 1.0 = neutre.
    pub contrast: f32,
    /// Égalisation d'histogramme avant le contraste.
    pub histogram_eq: bool,
    /// Méthode de couleur.
    pub color_mode: ColorMode,
    /// Nombre de couleurs de la palette adaptative.
    pub palette_size: u16,
    /// Saturation [0, ∞). 0 = gris, 1 = neutre.
    pub saturation: f32,
    /// Mélange de luminosité [0, 1]. 0.5 = neutre.
    pub brightness_blend: f32,
    /// Opacité de base [0, 1].
    pub base_opacity: f32,
    /// Opacité dérivée de la luminance.
    pub brightness_as_opacity: bool,
    /// Largeur÷hauteur d'une cellule de glyphe.
    pub aspect_ratio: f32,
    /// Miroir horizontal (webcam).
    pub mirror: bool,
    /// Filtre de rééchantillonnage.
    pub resample: Resample,
    /// Couleur des glyphes en monochrome avec opacité.
    pub foreground: Rgb,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            density_ramp: RAMP_COMPACT.to_string(),
            invert: false,
            contrast: 1.0,
            histogram_eq: false,
            color_mode: ColorMode::Monochrome,
            palette_size: 16,
            saturation: 1.0,
            brightness_blend: 0.5,
            base_opacity: 1.0,
            brightness_as_opacity: false,
            aspect_ratio: 0.5,
            mirror: false,
            resample: Resample::Bilinear,
            foreground: (255, 255, 255),
        }
    }
}

impl ConvertConfig {
    /// Clamp all numeric fields to their valid ranges.
    /// Called after TOML deserialization to prevent out-of-range values.
    pub fn clamp_all(&mut self) {
        self.contrast = self.contrast.clamp(0.0, 5.0);
        self.palette_size = self.palette_size.clamp(2, 256);
        self.saturation = self.saturation.clamp(0.0, 5.0);
        self.brightness_blend = self.brightness_blend.clamp(0.0, 1.0);
        self.base_opacity = self.base_opacity.clamp(0.0, 1.0);
        self.aspect_ratio = self.aspect_ratio.clamp(0.05, 4.0);
    }

    /// Parsed density ramp, reversed when `invert` is set.
    ///
    /// # Errors
    /// Returns [`CoreError::EmptyDensityRamp`] if the ramp is empty.
    pub fn effective_ramp(&self) -> Result<DensityRamp, CoreError> {
        let ramp = DensityRamp::new(&self.density_ramp)?;
        Ok(if self.invert { ramp.reversed() } else { ramp })
    }

    /// `true` when the contrast stage is a no-op.
    #[inline]
    #[must_use]
    pub fn contrast_is_identity(&self) -> bool {
        !self.histogram_eq && (self.contrast - 1.0).abs() < f32::EPSILON
    }

    /// `true` when the pipeline must produce per-cell styles.
    #[inline]
    #[must_use]
    pub fn wants_styles(&self) -> bool {
        self.color_mode != ColorMode::Monochrome || self.brightness_as_opacity
    }
}

/// Paramètres des collaborateurs de présentation et d'export.
///
/// # Example
/// ```
/// use lg_core::config::OutputConfig;
/// assert_eq!(OutputConfig::default().columns, 100);
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Nombre de colonnes de la grille.
    pub columns: u32,
    /// Couleur de fond (export PNG, ANSI pré-mélangé).
    pub background: Rgb,
    /// Taille de police en pixels pour l'export raster.
    pub font_size: f32,
    /// FPS cible du mode vidéo.
    pub target_fps: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            columns: 100,
            background: (0, 0, 0),
            font_size: 16.0,
            target_fps: 30,
        }
    }
}

impl OutputConfig {
    /// Clamp numeric fields.
    pub fn clamp_all(&mut self) {
        self.columns = self.columns.clamp(1, 2000);
        self.font_size = self.font_size.clamp(4.0, 128.0);
        self.target_fps = self.target_fps.clamp(1, 120);
    }
}

/// Structure TOML intermédiaire : chaque table est optionnelle.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    convert: ConvertConfig,
    output: OutputConfig,
}

/// Charge un fichier TOML ; les clés absentes prennent leur valeur par défaut.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed, or if the density ramp is empty.
///
/// # Example
/// ```no_run
/// use lg_core::config::load_config;
/// use std::path::Path;
/// let (convert, output) = load_config(Path::new("config/default.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<(ConvertConfig, OutputConfig)> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Erreur de configuration dans {}", path.display()))
}

/// Parse the TOML text of a config file.
///
/// # Errors
/// Returns an error on invalid TOML or an empty density ramp.
///
/// # Example
/// ```
/// use lg_core::config::{parse_config, ColorMode};
/// let (c, o) = parse_config("[convert]\ncolor_mode = \"Adaptive\"\n[output]\ncolumns = 80\n").unwrap();
/// assert_eq!(c.color_mode, ColorMode::Adaptive);
/// assert_eq!(o.columns, 80);
/// ```
pub fn parse_config(content: &str) -> Result<(ConvertConfig, OutputConfig)> {
    let file: ConfigFile =
        toml::from_str(content).map_err(|e| CoreError::Config(e.to_string()))?;
    let ConfigFile {
        mut convert,
        mut output,
    } = file;
    convert.clamp_all();
    output.clamp_all();
    if convert.density_ramp.is_empty() {
        return Err(CoreError::EmptyDensityRamp.into());
    }
    log::debug!(
        "Config : mode {:?}, rampe {} glyphes, {} colonnes",
        convert.color_mode,
        convert.density_ramp.chars().count(),
        output.columns
    );
    Ok((convert, output))
}
