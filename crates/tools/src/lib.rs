//! Shared plumbing for the command-line binaries: layout selection, config loading, logging.

use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::SeedableRng;
use tracing_subscriber::EnvFilter;
use undercroft_core::{
    GenerationError, Generator, GeneratorConfig, Level, LevelMap, ScatteredLayout,
    ThreeRoomsLayout,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LayoutArg {
    ThreeRooms,
    Scattered,
}

impl LayoutArg {
    pub fn name(self) -> &'static str {
        match self {
            LayoutArg::ThreeRooms => "three-rooms",
            LayoutArg::Scattered => "scattered",
        }
    }

    pub fn generate(
        self,
        size: usize,
        config: GeneratorConfig,
        seed: u64,
    ) -> Result<Level, GenerationError> {
        let rng = ChaCha8Rng::seed_from_u64(seed);
        match self {
            LayoutArg::ThreeRooms => {
                Generator::new(ThreeRoomsLayout::new(size), config).generate(rng)
            }
            LayoutArg::Scattered => Generator::new(ScatteredLayout::new(size), config).generate(rng),
        }
    }

    pub fn build_map(
        self,
        size: usize,
        config: GeneratorConfig,
        seed: u64,
    ) -> Result<LevelMap, GenerationError> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        match self {
            LayoutArg::ThreeRooms => {
                Generator::new(ThreeRoomsLayout::new(size), config).build_map(&mut rng)
            }
            LayoutArg::Scattered => {
                Generator::new(ScatteredLayout::new(size), config).build_map(&mut rng)
            }
        }
    }
}

/// Reads a TOML generator config, or the defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<GeneratorConfig> {
    let Some(path) = path else {
        return Ok(GeneratorConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: GeneratorConfig = toml::from_str(&text)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    config.validate().with_context(|| format!("Invalid config in {}", path.display()))?;
    Ok(config)
}

/// Logs go to stderr, filtered by `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init();
}
