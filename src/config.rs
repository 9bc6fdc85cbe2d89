//! Run configuration shared by the benchmark binary and the driver.

/// Candidate sizes tried when none are given. All divisible by 1, 2, 4, 8 and
/// 16, so every power-of-two grid runs all of them.
pub const DEFAULT_SIZES: [usize; 3] = [256, 512, 1024];

/// Seed used when none is given, so repeated runs draw the same operands.
pub const DEFAULT_SEED: u64 = 0x5EED;

/// What to run: candidate sizes, the operand seed, and whether root checks
/// the gathered product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub sizes: Vec<usize>,
    pub seed: u64,
    pub verify: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            sizes: DEFAULT_SIZES.to_vec(),
            seed: DEFAULT_SEED,
            verify: false,
        }
    }
}

impl RunConfig {
    pub fn with_sizes(mut self, sizes: impl Into<Vec<usize>>) -> Self {
        self.sizes = sizes.into();
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = RunConfig::default();
        assert_eq!(cfg.sizes, vec![256, 512, 1024]);
        assert_eq!(cfg.seed, DEFAULT_SEED);
        assert!(!cfg.verify);
    }

    #[test]
    fn builders_override() {
        let cfg = RunConfig::default()
            .with_sizes([8, 100])
            .with_seed(3)
            .with_verify(true);
        assert_eq!(cfg, RunConfig { sizes: vec![8, 100], seed: 3, verify: true });
    }
}
