use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

const MIN_PROTECTION_RADIUS: f32 = 1.0;
const MAX_PROTECTION_RADIUS: f32 = 64.0;
const MIN_MAX_SPAN: i32 = 2;
const MAX_MAX_SPAN: i32 = 64;
const MAX_BUILD_SEARCH_RADIUS: i32 = 16;
const MAX_COOLDOWN_SECS: f32 = 60.0;
const MAX_RANDOM_RANGE: i32 = 1_000_000;
const MAX_RANDOM_TRIES: u32 = 64;
const MAX_FREE_CHECK_DEPTH: i32 = 32;
const MAX_EXIT_SPEED: f32 = 4.0;

/// Tunables for detection, protection and teleporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortalConfig {
    /// Protection queries only consider portals whose anchor is this close,
    /// though a portal always covers its own surface.
    #[serde(default = "default_protection_radius")]
    pub protection_radius: f32,
    /// Widest row and tallest stack the site detector accepts.
    #[serde(default = "default_max_span")]
    pub max_span: i32,
    #[serde(default = "default_build_search_radius")]
    pub build_search_radius: i32,
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: f32,
    #[serde(default = "default_random_range")]
    pub random_range: i32,
    #[serde(default = "default_random_max_tries")]
    pub random_max_tries: u32,
    #[serde(default = "default_free_check_depth")]
    pub free_check_depth: i32,
    #[serde(default = "default_exit_speed")]
    pub exit_speed: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rng_seed: Option<u64>,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            protection_radius: default_protection_radius(),
            max_span: default_max_span(),
            build_search_radius: default_build_search_radius(),
            cooldown_secs: default_cooldown_secs(),
            random_range: default_random_range(),
            random_max_tries: default_random_max_tries(),
            free_check_depth: default_free_check_depth(),
            exit_speed: default_exit_speed(),
            rng_seed: None,
        }
    }
}

impl PortalConfig {
    pub fn sanitize(mut self) -> Self {
        // `clamp` keeps NaN, and toml accepts `nan` and `inf`.
        let finite_or = |value: f32, default: f32| if value.is_finite() { value } else { default };
        self.protection_radius = finite_or(self.protection_radius, default_protection_radius());
        self.cooldown_secs = finite_or(self.cooldown_secs, default_cooldown_secs());
        self.exit_speed = finite_or(self.exit_speed, default_exit_speed());

        self.protection_radius = self
            .protection_radius
            .clamp(MIN_PROTECTION_RADIUS, MAX_PROTECTION_RADIUS);
        self.max_span = self.max_span.clamp(MIN_MAX_SPAN, MAX_MAX_SPAN);
        self.build_search_radius = self.build_search_radius.clamp(0, MAX_BUILD_SEARCH_RADIUS);
        self.cooldown_secs = self.cooldown_secs.clamp(0.0, MAX_COOLDOWN_SECS);
        self.random_range = self.random_range.clamp(1, MAX_RANDOM_RANGE);
        self.random_max_tries = self.random_max_tries.clamp(1, MAX_RANDOM_TRIES);
        self.free_check_depth = self.free_check_depth.clamp(1, MAX_FREE_CHECK_DEPTH);
        self.exit_speed = self.exit_speed.clamp(0.0, MAX_EXIT_SPEED);
        self
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs_f32(self.cooldown_secs.max(0.0))
    }

    pub fn load(path: &Path) -> io::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let parsed = toml::from_str::<Self>(&contents).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("failed to deserialize portal config: {e}"),
            )
        })?;
        Ok(parsed.sanitize())
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        let config = self.clone().sanitize();
        let serialized = toml::to_string_pretty(&config).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("failed to serialize portal config: {e}"),
            )
        })?;
        fs::write(path, serialized)
    }
}

fn default_protection_radius() -> f32 {
    16.0
}

fn default_max_span() -> i32 {
    16
}

fn default_build_search_radius() -> i32 {
    5
}

fn default_cooldown_secs() -> f32 {
    3.0
}

fn default_random_range() -> i32 {
    6000
}

fn default_random_max_tries() -> u32 {
    8
}

fn default_free_check_depth() -> i32 {
    5
}

fn default_exit_speed() -> f32 {
    0.7
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::PortalConfig;

    #[test]
    fn empty_file_uses_defaults() {
        let config: PortalConfig = toml::from_str("").expect("parse empty config");
        assert_eq!(config, PortalConfig::default());
        assert_eq!(config.cooldown(), Duration::from_secs(3));
        assert_eq!(config.random_max_tries, 8);
        assert_eq!(config.protection_radius, 16.0);
    }

    #[test]
    fn partial_file_overrides_and_sanitizes() {
        let config: PortalConfig =
            toml::from_str("max_span = 500\nrandom_range = 0\nrng_seed = 42\n").expect("parse");
        let config = config.sanitize();
        assert_eq!(config.max_span, 64);
        assert_eq!(config.random_range, 1);
        assert_eq!(config.rng_seed, Some(42));
        assert_eq!(config.free_check_depth, 5);
    }

    #[test]
    fn non_finite_floats_fall_back_to_defaults() {
        let config: PortalConfig =
            toml::from_str("protection_radius = nan\ncooldown_secs = inf\nexit_speed = -nan\n")
                .expect("parse");
        let config = config.sanitize();
        let defaults = PortalConfig::default();
        assert_eq!(config.protection_radius, defaults.protection_radius);
        assert_eq!(config.cooldown_secs, defaults.cooldown_secs);
        assert_eq!(config.exit_speed, defaults.exit_speed);
        assert_eq!(config.cooldown(), Duration::from_secs(3));
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("portals-config.toml");
        let config = PortalConfig {
            cooldown_secs: 1.5,
            rng_seed: Some(7),
            ..PortalConfig::default()
        };
        config.save(&path).expect("save config");
        assert_eq!(PortalConfig::load(&path).expect("load config"), config);
    }
}
