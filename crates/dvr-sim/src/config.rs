//! Simulation configuration loading and management.

use dvr_core::{CoreError, LoopSuppression, RouterConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::SimError;

/// Full configuration of a simulation run: topology, router settings,
/// timing, and scripted events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Names of the routers.
    #[serde(default)]
    pub routers: Vec<String>,

    /// Names of the hosts.
    #[serde(default)]
    pub hosts: Vec<String>,

    /// Settings shared by every router.
    #[serde(default)]
    pub router: RouterConfig,

    /// Simulation timing.
    #[serde(default)]
    pub sim: SimSettings,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Links that are up when the simulation starts.
    #[serde(default)]
    pub links: Vec<LinkSpec>,

    /// Events applied while the simulation runs.
    #[serde(default)]
    pub events: Vec<ScriptedEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimSettings {
    /// Seconds between periodic ticks of every router.
    #[serde(default = "default_tick_interval")]
    pub tick_interval: u64,
    /// Simulated seconds to run.
    #[serde(default = "default_duration")]
    pub duration: u64,
    /// Packets visiting more nodes than this are dropped as looping.
    #[serde(default = "default_max_packet_hops")]
    pub max_packet_hops: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// A link between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSpec {
    pub a: String,
    pub b: String,
    /// One-way latency in seconds, also used as the link cost.
    #[serde(default = "default_link_latency")]
    pub latency: u64,
}

/// Something that happens at a given simulated second.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedEvent {
    /// Seconds since the start of the simulation.
    pub at: u64,
    #[serde(flatten)]
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Action {
    /// Bring a link up, creating it if it never existed.
    LinkUp {
        a: String,
        b: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        latency: Option<u64>,
    },
    /// Take a link down.
    LinkDown { a: String, b: String },
    /// Send a data packet from one host to another.
    Ping { from: String, to: String },
}

// Default value functions
fn default_tick_interval() -> u64 {
    5
}
fn default_duration() -> u64 {
    120
}
fn default_max_packet_hops() -> usize {
    64
}
fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "text".into()
}
fn default_link_latency() -> u64 {
    1
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            tick_interval: default_tick_interval(),
            duration: default_duration(),
            max_packet_hops: default_max_packet_hops(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LinkSpec {
    pub fn new(a: &str, b: &str, latency: u64) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
            latency,
        }
    }
}

impl ScriptedEvent {
    pub fn link_up(at: u64, a: &str, b: &str) -> Self {
        Self {
            at,
            action: Action::LinkUp {
                a: a.into(),
                b: b.into(),
                latency: None,
            },
        }
    }

    pub fn link_down(at: u64, a: &str, b: &str) -> Self {
        Self {
            at,
            action: Action::LinkDown {
                a: a.into(),
                b: b.into(),
            },
        }
    }

    pub fn ping(at: u64, from: &str, to: &str) -> Self {
        Self {
            at,
            action: Action::Ping {
                from: from.into(),
                to: to.into(),
            },
        }
    }
}

impl Default for SimConfig {
    /// Two hosts joined by a triangle of routers, with the direct
    /// router-to-router link failing and recovering mid-run.
    fn default() -> Self {
        Self {
            routers: vec!["r1".into(), "r2".into(), "r3".into()],
            hosts: vec!["h1".into(), "h2".into()],
            router: RouterConfig::default(),
            sim: SimSettings::default(),
            logging: LoggingConfig::default(),
            links: vec![
                LinkSpec::new("h1", "r1", 1),
                LinkSpec::new("r1", "r2", 1),
                LinkSpec::new("r2", "h2", 1),
                LinkSpec::new("r1", "r3", 2),
                LinkSpec::new("r3", "r2", 2),
            ],
            events: vec![
                ScriptedEvent::ping(30, "h1", "h2"),
                ScriptedEvent::link_down(40, "r1", "r2"),
                ScriptedEvent::ping(70, "h1", "h2"),
                ScriptedEvent::link_up(80, "r1", "r2"),
                ScriptedEvent::ping(110, "h1", "h2"),
            ],
        }
    }
}

impl SimConfig {
    /// Load config from a TOML file, falling back to defaults if the file
    /// does not exist.
    pub fn load(path: &Path) -> Result<Self, SimError> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: SimConfig = toml::from_str(&contents)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply the `--split-horizon` / `--poison-reverse` switches. Does
    /// nothing if neither is set. Returns the file's mode when the switches
    /// replaced a different one.
    pub fn override_loop_suppression(
        &mut self,
        split_horizon: bool,
        poison_reverse: bool,
    ) -> Result<Option<LoopSuppression>, CoreError> {
        if !split_horizon && !poison_reverse {
            return Ok(None);
        }
        let mode = LoopSuppression::from_flags(split_horizon, poison_reverse)?;
        let previous = self.router.loop_suppression;
        self.router.loop_suppression = mode;

        if previous == mode || previous == LoopSuppression::None {
            return Ok(None);
        }
        tracing::info!(
            configured = ?previous,
            override_with = ?mode,
            "command line overrides configured loop suppression"
        );
        Ok(Some(previous))
    }

    /// Save the current config to a TOML file.
    pub fn save(&self, path: &Path) -> Result<(), SimError> {
        let contents = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }
}
