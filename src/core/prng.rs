// Per-neuron PRNG (no external crates).
//
// Not cryptographically secure. Drives the reinforcement lottery in LEARN so
// that a seeded brain replays identically, and each neuron owns its own stream
// so neurons can learn in parallel without sharing state.

#[derive(Debug, Clone)]
pub struct Prng {
    state: u64,
}

impl Prng {
    const NONZERO_SEED: u64 = 0x9E3779B97F4A7C15;

    pub fn new(seed: u64) -> Self {
        // xorshift has a fixed point at zero.
        let seed = if seed == 0 { Self::NONZERO_SEED } else { seed };
        Self { state: seed }
    }

    /// Derive an independent stream for one neuron from the brain seed and
    /// the neuron's coordinates.
    pub fn for_neuron(seed: u64, layer: usize, x: usize, y: usize) -> Self {
        let mut h = seed ^ Self::NONZERO_SEED;
        for part in [layer as u64, x as u64, y as u64] {
            h = splitmix64(h ^ part);
        }
        Self::new(h)
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        // xorshift64*
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    #[inline]
    pub fn next_f32_01(&mut self) -> f32 {
        let x = (self.next_u64() >> 40) as u32;
        (x as f32) / ((1u32 << 24) as f32)
    }

    /// True with probability `p` (clamped to [0, 1]).
    #[inline]
    pub fn chance(&mut self, p: f32) -> bool {
        if p <= 0.0 {
            return false;
        }
        self.next_f32_01() < p
    }
}

#[inline]
fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E3779B97F4A7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}
