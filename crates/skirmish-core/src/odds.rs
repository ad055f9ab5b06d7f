//! Success odds for checks.
//!
//! [`success_probability`] gives the exact chance that a d20 check meets a
//! DC. [`estimate_check`] measures the same thing by rolling, using rayon to
//! spread the trials across threads. Each chunk of trials gets its own
//! [`SeededDice`] derived from the caller's seed, so an estimate is
//! reproducible regardless of how rayon schedules the work.

use knucklebone::{RollMode, SeededDice, D20};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::attributes::AttributeProvider;
use crate::check::{resolve_check, Check, Situation};

/// Trials per parallel chunk.
const CHUNK_TRIALS: u32 = 1024;

/// Outcome of a Monte Carlo estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OddsEstimate {
    /// Checks rolled
    pub trials: u32,
    /// Checks that met the DC
    pub successes: u32,
}

impl OddsEstimate {
    /// Fraction of trials that succeeded.
    #[must_use]
    pub fn probability(&self) -> f64 {
        if self.trials == 0 {
            0.0
        } else {
            f64::from(self.successes) / f64::from(self.trials)
        }
    }
}

/// Exact probability that `d20 + modifier >= dc`.
#[must_use]
pub fn success_probability(modifier: i32, dc: i32, situation: Situation) -> f64 {
    if situation.auto_fail {
        return 0.0;
    }
    let faces = i32::try_from(D20).unwrap_or(20);
    let needed = (dc - modifier).clamp(1, faces + 1);
    let single = f64::from(faces + 1 - needed) / f64::from(faces);
    match situation.mode() {
        RollMode::Normal => single,
        RollMode::Advantage => 1.0 - (1.0 - single).powi(2),
        RollMode::Disadvantage => single.powi(2),
    }
}

/// Estimate the chance of `check` meeting `dc` by rolling it `trials` times.
pub fn estimate_check<A>(
    actor: &A,
    check: Check,
    dc: i32,
    situation: Situation,
    trials: u32,
    seed: u64,
) -> OddsEstimate
where
    A: AttributeProvider + Sync + ?Sized,
{
    let chunks = trials.div_ceil(CHUNK_TRIALS);
    let successes: u32 = (0..chunks)
        .into_par_iter()
        .map(|chunk| {
            let start = chunk * CHUNK_TRIALS;
            let count = CHUNK_TRIALS.min(trials - start);
            let mut dice = SeededDice::new(chunk_seed(seed, chunk));
            let mut hits = 0_u32;
            for _ in 0..count {
                if resolve_check(&mut dice, actor, check, Some(dc), situation).succeeded() {
                    hits += 1;
                }
            }
            hits
        })
        .sum();

    debug!(?check, dc, trials, successes, "odds estimated");
    OddsEstimate { trials, successes }
}

fn chunk_seed(seed: u64, chunk: u32) -> u64 {
    seed ^ (u64::from(chunk) + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}
