//! Configuration module for audioproof

mod settings;

pub use settings::{AcceptancePolicy, ConfigError, ProofConfig};
