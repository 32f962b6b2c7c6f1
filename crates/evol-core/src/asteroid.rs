use std::sync::Mutex;

use rand::Rng;
use rand_chacha::ChaCha12Rng;

use crate::lifeform::Lifeform;

struct Inner {
    residents: Vec<Lifeform>,
    capacity: usize,
    rng: ChaCha12Rng,
    launched: u64,
    landed: u64,
}

/// A fixed-capacity, thread-safe bag of lifeforms in transit between
/// engines. The only object in the simulation mutated by more than one
/// thread (spec.md §5); every operation is short and O(1) once a slot is
/// chosen.
pub struct Asteroid {
    inner: Mutex<Inner>,
}

impl Asteroid {
    pub fn new(capacity: usize, rng: ChaCha12Rng) -> Asteroid {
        Asteroid {
            inner: Mutex::new(Inner {
                residents: Vec::with_capacity(capacity),
                capacity,
                rng,
                launched: 0,
                landed: 0,
            }),
        }
    }

    /// Appends `lf` if there is room; otherwise overwrites a uniformly
    /// random resident, destroying it. Load-shedding, not a bug: panspermia
    /// is rare and noisy, so losing an occasional individual is acceptable.
    pub fn launch(&self, lf: Lifeform) {
        let mut inner = self.inner.lock().expect("asteroid mutex poisoned");
        if inner.residents.len() < inner.capacity {
            inner.residents.push(lf);
        } else if inner.capacity > 0 {
            let slot = inner.rng.random_range(0..inner.residents.len());
            inner.residents[slot] = lf;
        }
        inner.launched += 1;
    }

    /// Extracts a uniformly random resident, if any. Order is irrelevant so
    /// this is a swap-remove.
    pub fn land(&self) -> Option<Lifeform> {
        let mut inner = self.inner.lock().expect("asteroid mutex poisoned");
        if inner.residents.is_empty() {
            return None;
        }
        let slot = inner.rng.random_range(0..inner.residents.len());
        let lf = inner.residents.swap_remove(slot);
        inner.landed += 1;
        Some(lf)
    }

    pub fn num_waiting(&self) -> usize {
        self.inner.lock().expect("asteroid mutex poisoned").residents.len()
    }

    pub fn num_launched(&self) -> u64 {
        self.inner.lock().expect("asteroid mutex poisoned").launched
    }

    pub fn num_landed(&self) -> u64 {
        self.inner.lock().expect("asteroid mutex poisoned").landed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcode::OpCode;
    use std::sync::Once;

    static INIT: Once = Once::new();
    fn bounds() {
        INIT.call_once(|| crate::coord::set_global_bounds(4, 4));
    }

    fn rng(seed: u64) -> ChaCha12Rng {
        <ChaCha12Rng as rand::SeedableRng>::seed_from_u64(seed)
    }

    fn lf() -> Lifeform {
        Lifeform::seed(vec![OpCode::Nop], 1.0)
    }

    #[test]
    fn round_trip_launch_then_land() {
        bounds();
        let asteroid = Asteroid::new(1, rng(0));
        let known = lf();
        let known_id = known.id();
        asteroid.launch(known);
        assert_eq!(asteroid.num_waiting(), 1);
        assert_eq!(asteroid.num_launched(), 1);
        let landed = asteroid.land().expect("should have landed one");
        assert_eq!(landed.id(), known_id);
        assert_eq!(asteroid.num_waiting(), 0);
        assert_eq!(asteroid.num_landed(), 1);
    }

    #[test]
    fn land_on_empty_returns_none() {
        bounds();
        let asteroid = Asteroid::new(4, rng(0));
        assert!(asteroid.land().is_none());
    }

    #[test]
    fn overflow_overwrites_rather_than_growing() {
        bounds();
        let asteroid = Asteroid::new(1, rng(0));
        asteroid.launch(lf());
        asteroid.launch(lf());
        assert_eq!(asteroid.num_waiting(), 1);
        assert_eq!(asteroid.num_launched(), 2);
    }
}
