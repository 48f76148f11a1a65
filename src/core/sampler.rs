use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::sync::{Mutex, PoisonError};

/// The lookup screen never shows more visited locations than this.
pub const MAX_DISPLAYED_VISITS: usize = 2;

/// Picks which visited locations make it onto the screen.
///
/// The random source is injected so tests (and `--seed`) get repeatable
/// picks. The lock is only ever held for the synchronous draw.
pub struct VisitSampler {
    rng: Mutex<Box<dyn RngCore + Send>>,
    limit: usize,
}

impl VisitSampler {
    pub fn with_rng<R: RngCore + Send + 'static>(rng: R) -> Self {
        Self {
            rng: Mutex::new(Box::new(rng)),
            limit: MAX_DISPLAYED_VISITS,
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn from_os_rng() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Seeded when a seed is configured, OS entropy otherwise.
    pub fn from_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_os_rng(),
        }
    }

    /// Returns `items` unchanged when it fits, otherwise exactly `limit`
    /// of them chosen uniformly without replacement. Survivors keep their
    /// original relative order.
    pub fn sample<T>(&self, items: Vec<T>) -> Vec<T> {
        if items.len() <= self.limit {
            return items;
        }

        let picked = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            rand::seq::index::sample(&mut **rng, items.len(), self.limit).into_vec()
        };

        items
            .into_iter()
            .enumerate()
            .filter(|(index, _)| picked.contains(index))
            .map(|(_, item)| item)
            .collect()
    }
}

impl Default for VisitSampler {
    fn default() -> Self {
        Self::from_os_rng()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_small_lists_pass_through() {
        let sampler = VisitSampler::seeded(1);
        assert_eq!(sampler.sample(Vec::<u32>::new()), Vec::<u32>::new());
        assert_eq!(sampler.sample(vec![7]), vec![7]);
        assert_eq!(sampler.sample(vec![7, 9]), vec![7, 9]);
    }

    #[test]
    fn test_large_lists_truncate_to_distinct_subset() {
        let sampler = VisitSampler::seeded(99);
        for n in 3..20 {
            let items: Vec<usize> = (0..n).collect();
            let picked = sampler.sample(items.clone());

            assert_eq!(picked.len(), MAX_DISPLAYED_VISITS);
            assert!(picked.iter().all(|p| items.contains(p)));
            assert_ne!(picked[0], picked[1]);
            assert!(picked[0] < picked[1], "original order is kept");
        }
    }

    #[test]
    fn test_same_seed_same_pick() {
        let a = VisitSampler::seeded(42);
        let b = VisitSampler::seeded(42);
        let items: Vec<u32> = (0..10).collect();
        assert_eq!(a.sample(items.clone()), b.sample(items));
    }

    #[test]
    fn test_every_pair_is_reachable() {
        let sampler = VisitSampler::seeded(7);
        let mut seen: HashMap<Vec<u8>, usize> = HashMap::new();

        for _ in 0..600 {
            *seen.entry(sampler.sample(vec![1u8, 2, 3, 4])).or_default() += 1;
        }

        // C(4, 2) = 6 subsets, each roughly 100 times
        assert_eq!(seen.len(), 6);
        assert!(seen.values().all(|&count| count > 50), "{:?}", seen);
    }
}
