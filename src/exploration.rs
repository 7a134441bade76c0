use ndarray::ArrayView1;
use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use statrs::distribution::Normal;

use crate::env::Action;
use crate::qtable::argmax;

/// Chooses an action from a row of action values.
pub trait Explorer {
    fn select(&mut self, values: ArrayView1<f64>, episode: usize) -> Action;
}

/// Greedy selection on top of decaying Gaussian noise.
///
/// Each action value gets an independent N(0, 1) draw scaled by
/// `1 / (episode + 1)` before the argmax is taken.
pub struct GaussianNoise<R: Rng> {
    rng: R,
    normal: Normal,
}

impl<R: Rng> GaussianNoise<R> {
    pub fn new(rng: R) -> GaussianNoise<R> {
        let normal = Normal::standard();
        GaussianNoise { rng, normal }
    }

    pub fn noise_scale(episode: usize) -> f64 {
        1.0 / (episode as f64 + 1.0)
    }

    /// Scaled noise vector for `n` actions.
    pub fn perturbation(&mut self, n: usize, episode: usize) -> Vec<f64> {
        let scale = Self::noise_scale(episode);
        (0..n)
            .map(|_| self.normal.sample(&mut self.rng) * scale)
            .collect()
    }
}

impl GaussianNoise<StdRng> {
    pub fn seeded(seed: u64) -> GaussianNoise<StdRng> {
        GaussianNoise::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> GaussianNoise<StdRng> {
        GaussianNoise::new(StdRng::from_entropy())
    }
}

impl<R: Rng> Explorer for GaussianNoise<R> {
    fn select(&mut self, values: ArrayView1<f64>, episode: usize) -> Action {
        let noise = self.perturbation(values.len(), episode);
        argmax(values.iter().zip(noise).map(|(q, n)| q + n))
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn noise_scale_decays() {
        let scales: Vec<f64> = (0..50).map(GaussianNoise::<StdRng>::noise_scale).collect();
        assert_eq!(scales[0], 1.0);
        for w in scales.windows(2) {
            assert!(w[1] < w[0]);
        }
    }

    #[test]
    fn late_noise_is_smaller_than_early_noise() {
        // Arrange
        let mut early = GaussianNoise::seeded(3);
        let mut late = GaussianNoise::seeded(3);
        // Act: same draws, different episode index
        let e: f64 = early.perturbation(1000, 0).iter().map(|x| x.abs()).sum();
        let l: f64 = late.perturbation(1000, 99).iter().map(|x| x.abs()).sum();
        // Assert
        assert!(l < e);
        approx::assert_abs_diff_eq!(l * 100.0, e, epsilon = 1e-9);
    }

    #[test]
    fn same_seed_same_choices() {
        let values = arr1(&[0.0, 0.0, 0.0, 0.0]);
        let mut a = GaussianNoise::seeded(42);
        let mut b = GaussianNoise::seeded(42);
        for episode in 0..100 {
            assert_eq!(a.select(values.view(), episode), b.select(values.view(), episode));
        }
    }

    #[test]
    fn dominant_value_wins_late_in_training() {
        let values = arr1(&[0.0, 0.0, 5.0, 0.0]);
        let mut noise = GaussianNoise::seeded(1);
        for _ in 0..200 {
            assert_eq!(noise.select(values.view(), 10_000), 2);
        }
    }

    #[test]
    fn early_noise_explores_all_actions() {
        let values = arr1(&[0.0, 0.0, 0.0, 0.0]);
        let mut noise = GaussianNoise::seeded(9);
        let mut counts = [0usize; 4];
        for _ in 0..400 {
            counts[noise.select(values.view(), 0)] += 1;
        }
        assert!(counts.iter().all(|&c| c > 0));
    }
}
