use crate::db::models::record_models::VitalsReading;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::RangeInclusive;
use std::sync::Mutex;

/// Chance that a synthetic reading uses the elevated profile
pub const ELEVATED_PROBABILITY: f64 = 0.2;

/// Source of vital-sign readings, one per scan.
///
/// The synthetic generator below stands in for a real rPPG pipeline; a
/// signal-processing implementation only needs to implement this trait.
pub trait VitalsSource: Send + Sync {
    fn generate_reading(&self) -> VitalsReading;
}

/// Profile picked for a single synthetic reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VitalsProfile {
    Normal,
    Elevated,
}

impl VitalsProfile {
    pub fn heart_rate_range(&self) -> RangeInclusive<u32> {
        match self {
            VitalsProfile::Normal => 60..=99,
            VitalsProfile::Elevated => 90..=129,
        }
    }

    pub fn stress_range(&self) -> RangeInclusive<u32> {
        match self {
            VitalsProfile::Normal => 10..=39,
            VitalsProfile::Elevated => 50..=99,
        }
    }
}

pub const RESPIRATION_RANGE: RangeInclusive<u32> = 12..=19;
pub const SPO2_RANGE: RangeInclusive<u32> = 95..=99;
pub const SYSTOLIC_RANGE: RangeInclusive<u32> = 110..=139;
pub const DIASTOLIC_RANGE: RangeInclusive<u32> = 70..=89;

/// Randomised readings with a fixed chance of an elevated profile
pub struct SyntheticVitalsGenerator {
    rng: Mutex<StdRng>,
}

impl SyntheticVitalsGenerator {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic generator for tests and replays
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn reading_from<R: Rng>(rng: &mut R) -> VitalsReading {
        let profile = if rng.gen_bool(ELEVATED_PROBABILITY) {
            VitalsProfile::Elevated
        } else {
            VitalsProfile::Normal
        };

        VitalsReading {
            heart_rate: rng.gen_range(profile.heart_rate_range()),
            respiration_rate: rng.gen_range(RESPIRATION_RANGE),
            spo2: rng.gen_range(SPO2_RANGE),
            blood_pressure_sys: rng.gen_range(SYSTOLIC_RANGE),
            blood_pressure_dia: rng.gen_range(DIASTOLIC_RANGE),
            stress_level: rng.gen_range(profile.stress_range()),
        }
    }
}

impl Default for SyntheticVitalsGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl VitalsSource for SyntheticVitalsGenerator {
    fn generate_reading(&self) -> VitalsReading {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Self::reading_from(&mut *rng)
    }
}

/// Always returns the same reading
pub struct FixedVitalsSource(pub VitalsReading);

impl VitalsSource for FixedVitalsSource {
    fn generate_reading(&self) -> VitalsReading {
        self.0
    }
}
