//! Probability plumbing shared by the genetic operators.
//!
//! Probabilities are stored as `u64` thresholds, so deciding whether an event happens is
//! a single comparison against a fresh `next_u64`.

use core::cmp::min;
use rand::{RngCore, SeedableRng};
use std::{
    fs::File,
    io::{self, Read},
    time::{SystemTime, UNIX_EPOCH},
};

#[derive(Debug, Clone, Copy)]
pub enum EvolutionEvent {
    /// A gene is swapped between two children during crossover
    SwapGene,
    /// A child gene receives a mutation delta
    MutateGene,
    /// A filler copy gene is perturbed while loading a snapshot
    PerturbLoaded,
}

pub const fn percent(x: u64) -> u64 {
    x * (u64::MAX / 100)
}

/// Threshold for a probability in `[0, 1]`. Values outside the range saturate.
pub fn chance(p: f64) -> u64 {
    if p.is_nan() || p <= 0. {
        0
    } else if p >= 1. {
        u64::MAX
    } else {
        (p * u64::MAX as f64) as u64
    }
}

pub trait Probabilities {
    type Update;
    fn probability(&self, evt: EvolutionEvent) -> u64;
    fn update(&mut self, stats: Self::Update);
}

pub trait Happens: RngCore + Probabilities {
    fn happens(&mut self, evt: EvolutionEvent) -> bool;
}

impl<T: RngCore + Probabilities> Happens for T {
    fn happens(&mut self, evt: EvolutionEvent) -> bool {
        // a roll is drawn even for certain events, so the stream doesn't depend on rates
        let roll = self.next_u64();
        match self.probability(evt) {
            u64::MAX => true,
            p => p > roll,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProbStatic {
    swap_gene: u64,
    mutate_gene: u64,
    perturb_loaded: u64,
}

impl ProbStatic {
    pub fn new(crossover_rate: f64, mutation_rate: f64) -> Self {
        Self {
            swap_gene: chance(crossover_rate),
            mutate_gene: chance(mutation_rate),
            ..Self::default()
        }
    }

    pub fn with_overrides(mut self, updates: &[(EvolutionEvent, u64)]) -> Self {
        for update in updates {
            self.update(*update);
        }
        self
    }
}

impl Default for ProbStatic {
    fn default() -> Self {
        use crate::constants::*;
        Self {
            swap_gene: chance(NEURODRIVE_CROSSOVER_RATE),
            mutate_gene: chance(NEURODRIVE_MUTATION_RATE),
            perturb_loaded: NEURODRIVE_LOAD_PERTURB_PROB,
        }
    }
}

impl Probabilities for ProbStatic {
    type Update = (EvolutionEvent, u64);
    fn probability(&self, evt: EvolutionEvent) -> u64 {
        match evt {
            EvolutionEvent::SwapGene => self.swap_gene,
            EvolutionEvent::MutateGene => self.mutate_gene,
            EvolutionEvent::PerturbLoaded => self.perturb_loaded,
        }
    }

    fn update(&mut self, (evt, v): Self::Update) {
        match evt {
            EvolutionEvent::SwapGene => self.swap_gene = v,
            EvolutionEvent::MutateGene => self.mutate_gene = v,
            EvolutionEvent::PerturbLoaded => self.perturb_loaded = v,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WyRng {
    state: u64,
}

impl WyRng {
    pub fn seeded(state: u64) -> Self {
        Self { state }
    }
}

impl RngCore for WyRng {
    fn next_u32(&mut self) -> u32 {
        self.next_u64() as u32
    }

    fn next_u64(&mut self) -> u64 {
        const WY_CONST_0: u64 = 0x2d35_8dcc_aa6c_78a5;
        const WY_CONST_1: u64 = 0x8bb8_4b93_962e_acc9;
        self.state = self.state.wrapping_add(WY_CONST_0);
        let t = u128::from(self.state) * u128::from(self.state ^ WY_CONST_1);
        (t as u64) ^ (t >> 64) as u64
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        let mut idx = 0;
        while idx < dst.len() {
            let lim = min(8, dst.len() - idx);
            dst[idx..idx + lim].copy_from_slice(&self.next_u64().to_ne_bytes()[..lim]);
            idx += lim;
        }
    }
}

impl SeedableRng for WyRng {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::seeded(u64::from_le_bytes(seed))
    }
}

#[derive(Debug, Clone)]
pub struct ProbBinding<P: Probabilities, R: RngCore> {
    p: P,
    r: R,
}

impl<P: Probabilities, R: RngCore> ProbBinding<P, R> {
    pub fn new(p: P, r: R) -> Self {
        Self { p, r }
    }
}

impl<P: Probabilities, R: RngCore> Probabilities for ProbBinding<P, R> {
    type Update = P::Update;
    fn probability(&self, evt: EvolutionEvent) -> u64 {
        self.p.probability(evt)
    }

    fn update(&mut self, stats: Self::Update) {
        self.p.update(stats);
    }
}

impl<P: Probabilities, R: RngCore> RngCore for ProbBinding<P, R> {
    fn next_u32(&mut self) -> u32 {
        self.r.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.r.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.r.fill_bytes(dest)
    }
}

pub fn seed_urandom() -> io::Result<u64> {
    let mut file = File::open("/dev/urandom")?;
    let mut buffer = [0u8; 8];
    file.read_exact(&mut buffer)?;
    Ok(u64::from_le_bytes(buffer))
}

pub fn seed_time() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// A [WyRng] seeded from the OS, falling back to the clock where `/dev/urandom` is missing
pub fn default_rng() -> WyRng {
    WyRng::seeded(seed_urandom().unwrap_or_else(|_| seed_time()))
}
