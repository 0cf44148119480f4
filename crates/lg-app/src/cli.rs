use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use lg_core::charset::{RAMP_BLOCKS, RAMP_COMPACT, RAMP_MINIMAL, RAMP_STANDARD};
use lg_core::config::{ColorMode, ConvertConfig, OutputConfig, Resample};
use lg_export::writer::TextFormat;

/// lumiglyph : image and video to density-mapped text.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Source : chemin vers une image (PNG, JPEG, BMP, GIF).
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Source : chemin vers une vidéo. Requiert --features video.
    #[arg(long)]
    pub video: Option<PathBuf>,

    /// Fichier de configuration TOML. Défaut : config/default.toml.
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Prévisualisation interactive dans le terminal.
    #[arg(long, default_value_t = false)]
    pub preview: bool,

    /// Format de sortie texte.
    #[arg(long, value_enum, default_value_t = FormatArg::Text)]
    pub format: FormatArg,

    /// Fichier de sortie (stdout si absent).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Avec --format html : page HTML complète au lieu des seuls spans.
    #[arg(long, default_value_t = false)]
    pub standalone: bool,

    /// Rasterise aussi la grille en PNG (requiert --font).
    #[arg(long)]
    pub png: Option<PathBuf>,

    /// Police TrueType/OpenType pour --png.
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Nombre de colonnes.
    #[arg(long)]
    pub columns: Option<u32>,

    /// Rampe de densité personnalisée, du plus sombre au plus clair.
    #[arg(long)]
    pub ramp: Option<String>,

    /// Rampe prédéfinie (ignorée si --ramp est fourni).
    #[arg(long, value_enum)]
    pub ramp_preset: Option<RampArg>,

    /// Mode couleur.
    #[arg(long, value_enum)]
    pub color: Option<ColorArg>,

    /// Taille de la palette adaptative.
    #[arg(long)]
    pub palette_size: Option<u16>,

    /// Contraste (1.0 = neutre).
    #[arg(long)]
    pub contrast: Option<f32>,

    /// Égalisation d'histogramme.
    #[arg(long, default_value_t = false)]
    pub equalize: bool,

    /// Inverser la rampe.
    #[arg(long, default_value_t = false)]
    pub invert: bool,

    /// Saturation (1.0 = neutre).
    #[arg(long)]
    pub saturation: Option<f32>,

    /// Mélange de luminosité [0, 1], 0.5 = neutre.
    #[arg(long)]
    pub blend: Option<f32>,

    /// Opacité de base [0, 1].
    #[arg(long)]
    pub opacity: Option<f32>,

    /// Opacité dérivée de la luminance.
    #[arg(long, default_value_t = false)]
    pub brightness_opacity: bool,

    /// Ratio largeur/hauteur d'un glyphe.
    #[arg(long)]
    pub aspect: Option<f32>,

    /// Miroir horizontal.
    #[arg(long, default_value_t = false)]
    pub mirror: bool,

    /// Filtre de rééchantillonnage.
    #[arg(long, value_enum)]
    pub resample: Option<ResampleArg>,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

/// Format de sortie.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// Texte brut.
    Text,
    /// Spans HTML.
    Html,
    /// Échappements ANSI 24 bits.
    Ansi,
}

impl From<FormatArg> for TextFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Text => Self::Text,
            FormatArg::Html => Self::Html,
            FormatArg::Ansi => Self::Ansi,
        }
    }
}

/// Rampes prédéfinies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum RampArg {
    Standard,
    Compact,
    Blocks,
    Minimal,
}

impl RampArg {
    fn ramp(self) -> &'static str {
        match self {
            Self::Standard => RAMP_STANDARD,
            Self::Compact => RAMP_COMPACT,
            Self::Blocks => RAMP_BLOCKS,
            Self::Minimal => RAMP_MINIMAL,
        }
    }
}

/// Modes couleur.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorArg {
    Mono,
    Truecolor,
    Ansi256,
    Adaptive,
}

impl From<ColorArg> for ColorMode {
    fn from(c: ColorArg) -> Self {
        match c {
            ColorArg::Mono => Self::Monochrome,
            ColorArg::Truecolor => Self::Truecolor,
            ColorArg::Ansi256 => Self::FixedPalette,
            ColorArg::Adaptive => Self::Adaptive,
        }
    }
}

/// Filtres de rééchantillonnage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ResampleArg {
    Nearest,
    Box,
    Bilinear,
}

impl From<ResampleArg> for Resample {
    fn from(r: ResampleArg) -> Self {
        match r {
            ResampleArg::Nearest => Self::Nearest,
            ResampleArg::Box => Self::Box,
            ResampleArg::Bilinear => Self::Bilinear,
        }
    }
}

/// Surcharges CLI, réappliquées après chaque rechargement de config.
#[derive(Clone, Debug, Default, PartialEq)]
#[allow(clippy::struct_excessive_bools)]
pub struct Overrides {
    ramp: Option<String>,
    color: Option<ColorMode>,
    palette_size: Option<u16>,
    contrast: Option<f32>,
    equalize: bool,
    invert: bool,
    saturation: Option<f32>,
    blend: Option<f32>,
    opacity: Option<f32>,
    brightness_opacity: bool,
    aspect: Option<f32>,
    mirror: bool,
    resample: Option<Resample>,
    columns: Option<u32>,
}

impl Overrides {
    /// Applique les surcharges puis re-borne les valeurs.
    pub fn apply(&self, c: &mut ConvertConfig) {
        if let Some(ramp) = &self.ramp {
            c.density_ramp.clone_from(ramp);
        }
        if let Some(mode) = self.color {
            c.color_mode = mode;
        }
        if let Some(k) = self.palette_size {
            c.palette_size = k;
        }
        if let Some(v) = self.contrast {
            c.contrast = v;
        }
        if let Some(v) = self.saturation {
            c.saturation = v;
        }
        if let Some(v) = self.blend {
            c.brightness_blend = v;
        }
        if let Some(v) = self.opacity {
            c.base_opacity = v;
        }
        if let Some(v) = self.aspect {
            c.aspect_ratio = v;
        }
        if let Some(r) = self.resample {
            c.resample = r;
        }
        c.histogram_eq |= self.equalize;
        c.invert |= self.invert;
        c.brightness_as_opacity |= self.brightness_opacity;
        c.mirror |= self.mirror;
        c.clamp_all();
    }

    /// Surcharges de la config de sortie.
    pub fn apply_output(&self, o: &mut OutputConfig) {
        if let Some(cols) = self.columns {
            o.columns = cols;
        }
        o.clamp_all();
    }
}

impl Cli {
    /// Validate that exactly one source is provided.
    ///
    /// # Errors
    /// Returns an error if zero or more than one source is specified.
    pub fn validate_source(&self) -> anyhow::Result<()> {
        match (self.image.is_some(), self.video.is_some()) {
            (false, false) => anyhow::bail!("Aucune source spécifiée. Utilisez --image ou --video."),
            (true, true) => anyhow::bail!("Une seule source à la fois : --image OU --video."),
            _ => Ok(()),
        }
    }

    /// Validate output flags.
    ///
    /// # Errors
    /// Returns an error when --png is given without --font.
    pub fn validate_output(&self) -> anyhow::Result<()> {
        if self.png.is_some() && self.font.is_none() {
            anyhow::bail!("--png requiert --font <fichier .ttf/.otf>");
        }
        Ok(())
    }

    /// Surcharges de configuration portées par la ligne de commande.
    #[must_use]
    pub fn overrides(&self) -> Overrides {
        Overrides {
            ramp: self
                .ramp
                .clone()
                .or_else(|| self.ramp_preset.map(|p| p.ramp().to_string())),
            color: self.color.map(ColorMode::from),
            palette_size: self.palette_size,
            contrast: self.contrast,
            equalize: self.equalize,
            invert: self.invert,
            saturation: self.saturation,
            blend: self.blend,
            opacity: self.opacity,
            brightness_opacity: self.brightness_opacity,
            aspect: self.aspect,
            mirror: self.mirror,
            resample: self.resample.map(Resample::from),
            columns: self.columns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("lumiglyph").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn exactly_one_source_is_required() {
        assert!(parse(&[]).validate_source().is_err());
        assert!(parse(&["--image", "a.png", "--video", "b.mp4"]).validate_source().is_err());
        assert!(parse(&["--image", "a.png"]).validate_source().is_ok());
    }

    #[test]
    fn png_needs_font() {
        assert!(parse(&["--image", "a.png", "--png", "o.png"]).validate_output().is_err());
        assert!(
            parse(&["--image", "a.png", "--png", "o.png", "--font", "f.ttf"])
                .validate_output()
                .is_ok()
        );
    }

    #[test]
    fn overrides_are_applied_and_clamped() {
        let cli = parse(&[
            "--image", "a.png", "--color", "adaptive", "--palette-size", "999", "--invert",
            "--ramp-preset", "minimal", "--contrast", "9", "--columns", "40",
        ]);
        let mut c = ConvertConfig::default();
        let mut o = OutputConfig::default();
        let overrides = cli.overrides();
        overrides.apply(&mut c);
        overrides.apply_output(&mut o);
        assert_eq!(c.color_mode, ColorMode::Adaptive);
        assert_eq!(c.palette_size, 256);
        assert!(c.invert);
        assert_eq!(c.density_ramp, RAMP_MINIMAL);
        assert!((c.contrast - 5.0).abs() < f32::EPSILON);
        assert_eq!(o.columns, 40);
    }

    #[test]
    fn custom_ramp_beats_preset() {
        let cli = parse(&["--image", "a.png", "--ramp", "#- ", "--ramp-preset", "blocks"]);
        let mut c = ConvertConfig::default();
        cli.overrides().apply(&mut c);
        assert_eq!(c.density_ramp, "#- ");
    }

    #[test]
    fn flags_never_clear_file_settings() {
        let cli = parse(&["--image", "a.png"]);
        let mut c = ConvertConfig {
            invert: true,
            histogram_eq: true,
            ..ConvertConfig::default()
        };
        cli.overrides().apply(&mut c);
        assert!(c.invert && c.histogram_eq);
    }
}
