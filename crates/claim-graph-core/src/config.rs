//! Configuration management for the claim-graph engine.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{CoreError, CoreResult};
use crate::types::DEFAULT_EMBEDDING_DIM;

/// Embedding provider settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    /// Fixed embedding dimension; every stored vector must match.
    pub dimension: usize,
    /// Deadline for a single embed call, in milliseconds.
    pub timeout_ms: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_EMBEDDING_DIM,
            timeout_ms: 30_000,
        }
    }
}

/// Durable storage settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Whether writes are synced to disk before returning.
    pub sync_writes: bool,
    /// Deadline for a single storage operation, in milliseconds.
    pub timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            sync_writes: true,
            timeout_ms: 10_000,
        }
    }
}

/// Lineage tracing settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LineageConfig {
    /// Default BFS depth bound; traversal never expands past it.
    pub max_depth: usize,
}

impl Default for LineageConfig {
    fn default() -> Self {
        Self { max_depth: 10 }
    }
}

/// Contradiction detection heuristics.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContradictionConfig {
    /// Confidence delta above which similar units are flagged.
    pub confidence_margin: f32,
    /// Number of similarity candidates to examine.
    pub semantic_k: usize,
}

impl Default for ContradictionConfig {
    fn default() -> Self {
        Self {
            confidence_margin: 0.25,
            semantic_k: 16,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// tracing filter directive, e.g. "info" or "claim_graph=debug".
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Main configuration structure for the engine.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Directory holding the unit store and ledger files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub lineage: LineageConfig,
    #[serde(default)]
    pub contradiction: ContradictionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            embedding: EmbeddingConfig::default(),
            storage: StorageConfig::default(),
            lineage: LineageConfig::default(),
            contradiction: ContradictionConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from files and environment.
    ///
    /// Sources are layered in order:
    /// 1. `config/default.toml` (base settings)
    /// 2. `config/{CLAIM_GRAPH_ENV}.toml` (environment-specific)
    /// 3. Environment variables with the `CLAIM_GRAPH_` prefix
    pub fn load() -> CoreResult<Self> {
        let env = std::env::var("CLAIM_GRAPH_ENV").unwrap_or_else(|_| "development".to_string());

        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            .add_source(config::Environment::with_prefix("CLAIM_GRAPH").separator("__"));

        let config: EngineConfig = builder
            .build()
            .map_err(|e| CoreError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| CoreError::Config(e.to_string()))?;
        config.validate()?;
        info!(
            environment = %env,
            data_dir = %config.data_dir.display(),
            "configuration loaded"
        );
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CoreError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: EngineConfig = toml::from_str(&content)
            .map_err(|e| CoreError::Config(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        debug!(path = %path.display(), "configuration loaded from file");
        Ok(config)
    }

    /// Configuration rooted at a specific data directory, defaults
    /// elsewhere. Intended for tests and embedded use.
    pub fn at_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Validate configuration invariants.
    pub fn validate(&self) -> CoreResult<()> {
        if self.embedding.dimension == 0 {
            return Err(CoreError::Config(
                "embedding.dimension must be positive".to_string(),
            ));
        }
        if self.lineage.max_depth == 0 {
            return Err(CoreError::Config(
                "lineage.max_depth must be at least 1".to_string(),
            ));
        }
        if self.contradiction.semantic_k == 0 {
            return Err(CoreError::Config(
                "contradiction.semantic_k must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.contradiction.confidence_margin) {
            return Err(CoreError::Config(
                "contradiction.confidence_margin must be within [0, 1]".to_string(),
            ));
        }
        Ok(())
    }
}
