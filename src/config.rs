//! Environment configuration

use crate::content::ContentTree;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_REVEAL_DELAY: Duration = Duration::from_millis(20);
pub const DEFAULT_TAG_DELAY: Duration = Duration::from_millis(1500);

/// Which stage is focused when a session starts
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DefaultStage {
    /// First stage of the content tree
    #[default]
    First,
    /// Nothing selected
    None,
    /// A specific stage id
    Id(String),
}

impl DefaultStage {
    /// Resolve against the loaded tree. An unknown id falls back to the first
    /// stage.
    pub fn resolve(&self, tree: &ContentTree) -> Option<String> {
        let first = || tree.first_stage().map(|s| s.id.clone());
        match self {
            DefaultStage::First => first(),
            DefaultStage::None => None,
            DefaultStage::Id(id) if tree.stage(id).is_some() => Some(id.clone()),
            DefaultStage::Id(id) => {
                tracing::warn!(stage_id = %id, "Configured default stage not found, using first stage");
                first()
            }
        }
    }

    fn parse(raw: &str) -> Self {
        match raw.trim() {
            "" | "first" => DefaultStage::First,
            "none" => DefaultStage::None,
            id => DefaultStage::Id(id.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// JSON content file; the built-in tree is used when unset
    pub content_path: Option<PathBuf>,
    pub default_stage: DefaultStage,
    /// Pause between revealed characters
    pub reveal_delay: Duration,
    /// Simulated tag generation latency
    pub tag_delay: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            content_path: None,
            default_stage: DefaultStage::First,
            reveal_delay: DEFAULT_REVEAL_DELAY,
            tag_delay: DEFAULT_TAG_DELAY,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unparsable values fall back to
    /// defaults with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            port: parse_or("REVIEW_PULSE_PORT", lookup("REVIEW_PULSE_PORT"), defaults.port),
            content_path: lookup("REVIEW_PULSE_CONTENT_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            default_stage: lookup("REVIEW_PULSE_DEFAULT_STAGE")
                .map(|raw| DefaultStage::parse(&raw))
                .unwrap_or_default(),
            reveal_delay: Duration::from_millis(parse_or(
                "REVIEW_PULSE_REVEAL_DELAY_MS",
                lookup("REVIEW_PULSE_REVEAL_DELAY_MS"),
                millis(defaults.reveal_delay),
            )),
            tag_delay: Duration::from_millis(parse_or(
                "REVIEW_PULSE_TAG_DELAY_MS",
                lookup("REVIEW_PULSE_TAG_DELAY_MS"),
                millis(defaults.tag_delay),
            )),
        }
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

fn parse_or<T: std::str::FromStr + Copy>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        None => default,
        Some(value) => value.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %value, "Ignoring unparsable setting");
            default
        }),
    }
}
