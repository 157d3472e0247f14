//! Stochastic content generators for test variations
//!
//! Uses seeded RNG for reproducibility. Print seed on failure for replay.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use autoesc_core::{BinaryOutput, Marker, Output, ProdName, Side};

/// Seeded generator for reproducible stochastic tests
pub struct Gen {
    pub rng: StdRng,
    pub seed: u64,
}

impl Gen {
    /// Create with specific seed (for reproduction)
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    /// Create from environment or random seed
    pub fn from_env_or_random() -> Self {
        let seed = std::env::var("AUTOESC_TEST_SEED")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(rand::random);
        Self::new(seed)
    }

    /// Geometric distribution: count until rand > alpha
    pub fn geometric(&mut self, alpha: f64) -> usize {
        let mut n = 0;
        while self.rng.gen::<f64>() < alpha {
            n += 1;
        }
        n
    }

    /// Poisson-like count (simplified)
    pub fn poisson(&mut self, lambda: f64) -> usize {
        let l = (-lambda).exp();
        let mut k = 0;
        let mut p = 1.0;
        loop {
            k += 1;
            p *= self.rng.gen::<f64>();
            if p <= l {
                break;
            }
        }
        k - 1
    }

    /// Random boolean with probability p
    pub fn chance(&mut self, p: f64) -> bool {
        self.rng.gen::<f64>() < p
    }

    /// Uniform index in `0..=n`
    pub fn upto(&mut self, n: usize) -> usize {
        self.rng.gen_range(0..=n)
    }

    /// Random production name, sometimes dotted
    pub fn prod_name(&mut self) -> ProdName {
        let mut name = self.segment();
        if self.chance(0.3) {
            name.push('.');
            name.push_str(&self.segment());
        }
        ProdName::new(&name).unwrap_or_else(|e| panic!("generated bad name: {}", e))
    }

    fn segment(&mut self) -> String {
        let len = 1 + self.geometric(0.6);
        let mut s = String::with_capacity(len);
        s.push(self.rng.gen_range(b'A'..=b'Z') as char);
        let chars = b"abcdefghijklmnopqrstuvwxyz0123456789_";
        for _ in 1..len {
            s.push(chars[self.rng.gen_range(0..chars.len())] as char);
        }
        s
    }

    /// Random markup-ish text, possibly empty
    pub fn text(&mut self) -> String {
        let chars = ['<', '>', '&', '"', '\'', '=', '/', ' ', 'a', 'b', 'x', 'é'];
        let len = self.geometric(0.8);
        (0..len).map(|_| chars[self.rng.gen_range(0..chars.len())]).collect()
    }

    /// Well-bracketed speculative output with no branch markers in it,
    /// so rolling back to an enclosing branch marker discards all of it.
    pub fn speculative_output(&mut self, depth: usize) -> Vec<Output> {
        let mut out = Vec::new();
        let n = self.geometric(0.7);
        for _ in 0..n {
            match self.rng.gen_range(0..5) {
                0 if depth < 4 => {
                    let name = self.prod_name();
                    out.push(BinaryOutput::boundary(Side::Left, name.clone()).into());
                    out.extend(self.speculative_output(depth + 1));
                    out.push(BinaryOutput::boundary(Side::Right, name).into());
                }
                1 => out.push(Marker::Loop.into()),
                2 => out.push(Marker::Lookahead.into()),
                _ => {
                    let raw = self.text();
                    out.push(Output::text(&raw));
                }
            }
        }
        out
    }
}
