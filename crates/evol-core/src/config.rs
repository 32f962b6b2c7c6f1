use std::error::Error;
use std::fmt;

use crate::coord::Unit;

/// Mutation-rate constants controlling the Mutator (spec.md §4.5 / §6).
#[derive(Debug, Clone, Copy)]
pub struct MutationParams {
    /// R: die roll upper bound, inclusive.
    pub die_roll: u32,
    /// T1: roll threshold for a single mutation.
    pub one_mutation: u32,
    /// T2: roll threshold for a second mutation. Must exceed `one_mutation`.
    pub two_mutations: u32,
    /// L: maximum length of a single INSERT/DELETE/CHANGE/TRANSLATE edit.
    pub max_mutation_length: usize,
}

impl Default for MutationParams {
    fn default() -> Self {
        MutationParams {
            die_roll: 99,
            one_mutation: 93,
            two_mutations: 98,
            max_mutation_length: 9,
        }
    }
}

/// Runtime-overridable simulation parameters. Grounded on the teacher's
/// `SimConfig`/`try_new` pattern (`world/mod.rs`): public fields, a
/// `Default` impl matching spec.md §6's defaults, and a `validate()` entry
/// point returning a hand-rolled error (the teacher never reaches for
/// `thiserror`, so neither does this port).
#[derive(Debug, Clone)]
pub struct Config {
    pub width: Unit,
    pub height: Unit,
    pub starting_lifeforms: u32,
    /// 0 means autodetect available parallelism, floor 1.
    pub num_engines: u32,

    pub asteroid_size: usize,
    /// 0 disables launching entirely.
    pub lifeform_asteroid_launch_interval: u64,
    /// 0 disables landing entirely.
    pub lifeform_asteroid_land_interval: u64,

    pub cost_of_living: f64,
    pub cost_of_opcode: f64,
    pub meiosis_level: f64,
    pub meiosis_cost: f64,
    pub random_move_cost: f64,

    pub json_dump_interval_secs: u64,

    pub mutation: MutationParams,

    /// `None` seeds each engine's RNG from a non-deterministic source.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            width: 64,
            height: 64,
            starting_lifeforms: 10,
            num_engines: 0,
            asteroid_size: 128,
            lifeform_asteroid_launch_interval: 12_000,
            lifeform_asteroid_land_interval: 13_000,
            cost_of_living: 2.0,
            cost_of_opcode: 0.01,
            meiosis_level: 200.0,
            meiosis_cost: 25.0,
            random_move_cost: 1.0,
            json_dump_interval_secs: 60,
            mutation: MutationParams::default(),
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    NonPositiveDimension,
    MutationThresholdsOutOfOrder,
    AsteroidMigrationWithoutCapacity,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NonPositiveDimension => {
                write!(f, "arena width and height must both be positive")
            }
            ConfigError::MutationThresholdsOutOfOrder => {
                write!(f, "mutation.one_mutation must be <= mutation.two_mutations")
            }
            ConfigError::AsteroidMigrationWithoutCapacity => write!(
                f,
                "asteroid_size is 0 but a launch or land interval is nonzero"
            ),
        }
    }
}

impl Error for ConfigError {}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width <= 0 || self.height <= 0 {
            return Err(ConfigError::NonPositiveDimension);
        }
        if self.mutation.one_mutation > self.mutation.two_mutations {
            return Err(ConfigError::MutationThresholdsOutOfOrder);
        }
        let migration_enabled = self.lifeform_asteroid_launch_interval != 0
            || self.lifeform_asteroid_land_interval != 0;
        if self.asteroid_size == 0 && migration_enabled {
            return Err(ConfigError::AsteroidMigrationWithoutCapacity);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn zero_dimensions_rejected() {
        let mut c = Config::default();
        c.width = 0;
        assert_eq!(c.validate(), Err(ConfigError::NonPositiveDimension));
    }

    #[test]
    fn inverted_mutation_thresholds_rejected() {
        let mut c = Config::default();
        c.mutation.one_mutation = 99;
        c.mutation.two_mutations = 10;
        assert_eq!(c.validate(), Err(ConfigError::MutationThresholdsOutOfOrder));
    }

    #[test]
    fn zero_capacity_asteroid_with_migration_rejected() {
        let mut c = Config::default();
        c.asteroid_size = 0;
        assert_eq!(
            c.validate(),
            Err(ConfigError::AsteroidMigrationWithoutCapacity)
        );
    }

    #[test]
    fn zero_capacity_asteroid_without_migration_is_fine() {
        let mut c = Config::default();
        c.asteroid_size = 0;
        c.lifeform_asteroid_launch_interval = 0;
        c.lifeform_asteroid_land_interval = 0;
        assert!(c.validate().is_ok());
    }
}
