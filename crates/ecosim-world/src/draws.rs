//! Random draw context threaded through every behaviour call.
//!
//! The engine owns a single seeded generator and lends it to each organism in
//! turn, so the order of draws is part of the simulation's reproducibility.
//! Tests swap in the deterministic stubs below.

use rand::{Rng, RngCore};

pub trait Draws {
    /// Bernoulli trial succeeding with probability `p`.
    ///
    /// Certain outcomes (`p >= 1` or `p <= 0`) consume no randomness.
    fn chance(&mut self, p: f64) -> bool;

    /// Uniform integer in `[0, upper)`; zero when `upper` is zero
    fn below(&mut self, upper: u32) -> u32;

    /// Fair coin
    fn coin(&mut self) -> bool;
}

impl<R: RngCore> Draws for R {
    fn chance(&mut self, p: f64) -> bool {
        if p >= 1.0 {
            return true;
        }
        if p <= 0.0 {
            return false;
        }
        self.gen::<f64>() < p
    }

    fn below(&mut self, upper: u32) -> u32 {
        if upper == 0 {
            return 0;
        }
        self.gen_range(0..upper)
    }

    fn coin(&mut self) -> bool {
        self.gen::<bool>()
    }
}

/// Every trial succeeds and every range draw returns its maximum.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysSucceed;

impl Draws for AlwaysSucceed {
    fn chance(&mut self, _p: f64) -> bool {
        true
    }

    fn below(&mut self, upper: u32) -> u32 {
        upper.saturating_sub(1)
    }

    fn coin(&mut self) -> bool {
        true
    }
}

/// Every trial fails and every range draw returns zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysFail;

impl Draws for AlwaysFail {
    fn chance(&mut self, _p: f64) -> bool {
        false
    }

    fn below(&mut self, _upper: u32) -> u32 {
        0
    }

    fn coin(&mut self) -> bool {
        false
    }
}
