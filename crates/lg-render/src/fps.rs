use std::collections::VecDeque;
use std::time::Instant;

/// Compteur FPS par fenêtre glissante (preview et flux vidéo).
///
/// # Example
/// ```
/// use lg_render::fps::FpsCounter;
/// let mut counter = FpsCounter::new(60);
/// counter.tick();
/// let fps = counter.fps();
/// assert!(fps >= 0.0);
/// ```
pub struct FpsCounter {
    /// Timestamps des dernières N frames.
    timestamps: VecDeque<Instant>,
    /// Taille de la fenêtre (nombre de frames à moyenner).
    window: usize,
    /// FPS calculé, mis à jour à chaque tick.
    fps: f64,
    /// Temps de la dernière frame en ms.
    pub frame_time_ms: f64,
}

impl FpsCounter {
    /// Create a new FPS counter with the given averaging window size.
    ///
    /// # Example
    /// ```
    /// use lg_render::fps::FpsCounter;
    /// let counter = FpsCounter::new(60);
    /// assert!(counter.fps().abs() < f64::EPSILON);
    /// ```
    #[must_use]
    pub fn new(window: usize) -> Self {
        Self {
            timestamps: VecDeque::with_capacity(window + 1),
            window,
            fps: 0.0,
            frame_time_ms: 0.0,
        }
    }

    /// Appeler une fois par frame affichée.
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    /// [`FpsCounter::tick`] avec un instant explicite.
    ///
    /// # Example
    /// ```
    /// use lg_render::fps::FpsCounter;
    /// use std::time::{Duration, Instant};
    /// let mut counter = FpsCounter::new(10);
    /// let t0 = Instant::now();
    /// for i in 0..5 {
    ///     counter.tick_at(t0 + Duration::from_millis(100 * i));
    /// }
    /// assert!((counter.fps() - 10.0).abs() < 1e-6);
    /// ```
    pub fn tick_at(&mut self, now: Instant) {
        if let Some(&last) = self.timestamps.back() {
            self.frame_time_ms = now.duration_since(last).as_secs_f64() * 1000.0;
        }
        self.timestamps.push_back(now);
        if self.timestamps.len() > self.window {
            self.timestamps.pop_front();
        }
        if self.timestamps.len() >= 2 {
            let first = self.timestamps.front().copied().unwrap_or(now);
            let secs = now.duration_since(first).as_secs_f64();
            if secs > 0.0 {
                self.fps = (self.timestamps.len() - 1) as f64 / secs;
            }
        }
    }

    /// FPS moyen sur la fenêtre.
    #[must_use]
    pub fn fps(&self) -> f64 {
        self.fps
    }
}
