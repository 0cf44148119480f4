use std::sync::Arc;

use crate::frame::FrameBuffer;

/// Fournit des frames au pipeline de conversion.
///
/// Implémenté par : `ImageSource`, `VideoSource`.
///
/// # Example
/// ```
/// use lg_core::traits::Source;
/// use lg_core::frame::FrameBuffer;
/// use std::sync::Arc;
///
/// struct DummySource;
/// impl Source for DummySource {
///     fn next_frame(&mut self) -> Option<Arc<FrameBuffer>> { None }
///     fn native_size(&self) -> (u32, u32) { (0, 0) }
///     fn is_live(&self) -> bool { false }
/// }
/// ```
pub trait Source: Send + 'static {
    /// Retourne la prochaine frame disponible.
    ///
    /// Retourne `None` si la source est épuisée (fin de vidéo).
    /// Ne bloque pas : retourne la dernière frame connue si pas de nouvelle.
    fn next_frame(&mut self) -> Option<Arc<FrameBuffer>>;

    /// Dimensions natives de la source (avant resize).
    fn native_size(&self) -> (u32, u32);

    /// Indique si la source produit un flux (vidéo, webcam) ou une image fixe.
    fn is_live(&self) -> bool;

    /// Suspend ou reprend la production de frames. Sans effet sur une image fixe.
    fn set_paused(&mut self, _paused: bool) {}

    /// Déplace la lecture de `delta_secs` secondes. Sans effet sur une image fixe.
    fn seek(&mut self, _delta_secs: f64) {}
}
