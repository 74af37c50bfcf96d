//! Monte Carlo shot sampling from a detector error model.
//!
//! For each shot, every error mechanism fires independently with its own
//! probability; fired mechanisms XOR their detectors into the syndrome and
//! their observables into the logical flip accumulator.

use rand::Rng;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use mobius_core::{DemTarget, DetectorErrorModel};

/// Pre-processed mechanism list plus RNG state.
pub struct DemSampler {
    probabilities: Vec<f64>,
    detector_targets: Vec<Vec<u64>>,
    obs_masks: Vec<u64>,
    num_detectors: usize,
    rng: Xoshiro256PlusPlus,
}

impl DemSampler {
    /// Creates a sampler over the model's flattened error mechanisms.
    pub fn new(dem: &DetectorErrorModel, seed: u64) -> Self {
        let mut probabilities = Vec::new();
        let mut detector_targets: Vec<Vec<u64>> = Vec::new();
        let mut obs_masks = Vec::new();
        dem.for_each_flattened_error(&mut |p, targets| {
            let mut dets = Vec::new();
            let mut mask = 0u64;
            for t in targets {
                match t {
                    DemTarget::Detector(d) => dets.push(*d),
                    DemTarget::Observable(o) if *o < 64 => mask ^= 1u64 << o,
                    _ => {}
                }
            }
            probabilities.push(p);
            detector_targets.push(dets);
            obs_masks.push(mask);
        });
        Self {
            probabilities,
            detector_targets,
            obs_masks,
            num_detectors: dem.count_detectors() as usize,
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
        }
    }

    /// Number of bytes per sampled detection record.
    pub fn bytes_per_shot(&self) -> usize {
        self.num_detectors.div_ceil(8)
    }

    /// Samples one shot, returning bit-packed detection events and the
    /// actually flipped observables.
    pub fn sample(&mut self) -> (Vec<u8>, u64) {
        let mut syndrome = vec![0u8; self.bytes_per_shot()];
        let mut obs_flips = 0u64;

        for (i, &prob) in self.probabilities.iter().enumerate() {
            if self.rng.random::<f64>() < prob {
                for &d in &self.detector_targets[i] {
                    syndrome[d as usize / 8] ^= 1 << (d % 8);
                }
                obs_flips ^= self.obs_masks[i];
            }
        }

        (syndrome, obs_flips)
    }
}
