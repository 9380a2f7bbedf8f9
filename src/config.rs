use crate::common::{BoardSize, DomainError, DomainResult};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base seed for every random stream; a fresh one is drawn when absent.
    pub seed: Option<u64>,
    pub board: BoardConfig,
    pub agents: AgentConfig,
    pub timing: TimingConfig,
    pub arbitration: ArbitrationConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub width: usize,
    pub height: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalkMode {
    /// A fresh uniformly random direction every step.
    Random,
    /// One direction per traveler, fixed for the whole walk.
    Heading,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub travelers: usize,
    pub wild_tenants: usize,
    pub traps: usize,
    pub min_steps: usize,
    pub max_steps: usize,
    pub walk: WalkMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    pub wild_tenant_lifetime_ms: u64,
    pub tenant_poll_ms: u64,
    pub placement_retry_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArbitrationConfig {
    /// Release the destination lock when a wild tenant cannot be evicted.
    pub release_on_eviction_failure: bool,
    pub tenant_placement_attempts: usize,
    pub cell_inbox_capacity: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputOrder {
    /// Batches are written as they reach the collector.
    Arrival,
    /// All records are buffered and written sorted by timestamp.
    Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub order: OutputOrder,
    pub queue_capacity: usize,
    pub log_file: Option<String>,
}

impl Config {
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Layered load: defaults, then the optional TOML file, then
    /// `GRIDLOCK__<SECTION>__<KEY>` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path).required(false));
        }
        let layered = builder
            .add_source(
                ::config::Environment::with_prefix("GRIDLOCK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(layered.try_deserialize()?)
    }

    pub fn board_size(&self) -> BoardSize {
        BoardSize::new(self.board.width, self.board.height)
    }

    /// Number of entities announced in the output header.
    pub fn entity_count(&self) -> usize {
        self.agents.travelers + self.agents.wild_tenants + self.agents.traps
    }

    pub fn validate(&self) -> DomainResult<()> {
        let invalid = |reason: &str| {
            Err(DomainError::InvalidConfiguration {
                reason: reason.to_string(),
            })
        };

        if self.board.width == 0 || self.board.height == 0 {
            return invalid("board dimensions must be positive");
        }
        if self.agents.min_steps > self.agents.max_steps {
            return invalid("min_steps must not exceed max_steps");
        }
        if self.timing.min_delay_ms > self.timing.max_delay_ms {
            return invalid("min_delay_ms must not exceed max_delay_ms");
        }
        if self.timing.max_delay_ms == 0 {
            return invalid("max_delay_ms must be positive, it bounds every lock request");
        }
        if self.timing.wild_tenant_lifetime_ms == 0 {
            return invalid("wild_tenant_lifetime_ms must be positive");
        }
        if self.agents.travelers + self.agents.traps > self.board_size().cell_count() {
            return invalid("travelers and traps do not fit on the board");
        }
        if self.arbitration.cell_inbox_capacity == 0 || self.output.queue_capacity == 0 {
            return invalid("channel capacities must be positive");
        }
        Ok(())
    }
}

impl TimingConfig {
    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// Deadline for bounded cell requests.
    pub fn lock_timeout(&self) -> Duration {
        self.max_delay() * 2
    }

    pub fn wild_tenant_lifetime(&self) -> Duration {
        Duration::from_millis(self.wild_tenant_lifetime_ms)
    }

    pub fn tenant_poll(&self) -> Duration {
        Duration::from_millis(self.tenant_poll_ms)
    }

    pub fn placement_retry(&self) -> Duration {
        Duration::from_millis(self.placement_retry_ms)
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            width: 15,
            height: 15,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            travelers: 15,
            wild_tenants: 10,
            traps: 10,
            min_steps: 10,
            max_steps: 100,
            walk: WalkMode::Random,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 10,
            max_delay_ms: 50,
            wild_tenant_lifetime_ms: 500,
            tenant_poll_ms: 10,
            placement_retry_ms: 1,
        }
    }
}

impl Default for ArbitrationConfig {
    fn default() -> Self {
        Self {
            release_on_eviction_failure: false,
            tenant_placement_attempts: 10,
            cell_inbox_capacity: 32,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            order: OutputOrder::Arrival,
            queue_capacity: 1000,
            log_file: None,
        }
    }
}
