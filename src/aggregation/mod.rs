use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::errors::{Error, Result};
use crate::utils::CancelToken;

pub mod skiplist;
pub use skiplist::SkipList;

pub mod aggregates;
pub mod window;

/// Owner of everything stateful an aggregation needs besides the skiplist:
/// the height RNG (never process-wide) and an optional cancellation token.
///
/// One context owns one aggregation; contexts are never shared.
#[derive(Debug)]
pub struct AggContext {
    rng: SmallRng,
    cancel: Option<CancelToken>,
}

impl AggContext {
    pub fn new() -> Self {
        Self { rng: SmallRng::from_entropy(), cancel: None }
    }

    /// Deterministic context for reproducible list shapes.
    pub fn with_seed(seed: u64) -> Self {
        Self { rng: SmallRng::seed_from_u64(seed), cancel: None }
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Simulates repeated coin flips without respinning the RNG: the
    /// node height is the position of the lowest zero bit of a random
    /// word, capped at the maximum level.
    pub(crate) fn random_level(&mut self) -> usize {
        let word: u64 = self.rng.gen();
        let masked = word & ((1u64 << skiplist::SKIPLIST_MAX_LEVEL) - 1);
        ((!masked).trailing_zeros() as usize + 1).min(skiplist::SKIPLIST_MAX_LEVEL)
    }

    /// Observes the cancellation token; `Cancelled` means the caller must
    /// discard the aggregation state.
    pub(crate) fn check_cancelled(&self) -> Result<()> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(Error::Cancelled),
            _ => Ok(()),
        }
    }
}

impl Default for AggContext {
    fn default() -> Self {
        Self::new()
    }
}
