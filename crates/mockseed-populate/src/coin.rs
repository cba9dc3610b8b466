use rand::{Rng, RngCore};

/// Decides whether an optional field is left unset.
pub trait CoinToss: Send {
    /// `true` means skip the field.
    fn skip(&mut self, rng: &mut dyn RngCore) -> bool;
}

/// Fair coin drawn from the run's random source.
#[derive(Debug, Clone, Copy, Default)]
pub struct FairCoin;

impl CoinToss for FairCoin {
    fn skip(&mut self, rng: &mut dyn RngCore) -> bool {
        rng.random_bool(0.5)
    }
}

/// Coin that always lands the same way.
#[derive(Debug, Clone, Copy)]
pub struct FixedCoin(pub bool);

impl FixedCoin {
    pub fn always_skip() -> Self {
        Self(true)
    }

    pub fn never_skip() -> Self {
        Self(false)
    }
}

impl CoinToss for FixedCoin {
    fn skip(&mut self, _rng: &mut dyn RngCore) -> bool {
        self.0
    }
}
