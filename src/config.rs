//! Match configuration
//!
//! Constants supplied when the match is constructed. Every field falls back
//! to the defaults in [`crate::consts`], so a config file only needs the
//! values it changes.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;

/// Target zone: button center plus the house around it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringZone {
    /// Button center, the point distances are measured from
    pub center: Vec2,
    /// Button radius (cosmetic, usually 0)
    pub button_radius: f32,
    /// Outer boundary of the house
    pub house_radius: f32,
}

impl Default for ScoringZone {
    fn default() -> Self {
        Self {
            center: Vec2::new(HOUSE_CENTER_X, HOUSE_CENTER_Y),
            button_radius: BUTTON_RADIUS,
            house_radius: HOUSE_RADIUS,
        }
    }
}

impl ScoringZone {
    /// Distance from the button center to `pos`
    #[inline]
    pub fn distance_to(&self, pos: Vec2) -> f32 {
        pos.distance(self.center)
    }

    /// Whether a stone of `stone_radius` at `pos` touches the house (inclusive)
    #[inline]
    pub fn contains(&self, pos: Vec2, stone_radius: f32) -> bool {
        self.distance_to(pos) <= self.house_radius + stone_radius
    }
}

/// Match tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    // === Match length ===
    /// Number of ends in a match
    pub total_ends: u32,
    /// Stones each team throws per end
    pub stones_per_team_per_end: u32,

    // === Sheet ===
    /// Where every new stone is placed
    pub spawn_point: Vec2,
    pub zone: ScoringZone,
    pub stone_radius: f32,
    pub stone_mass: f32,

    // === Settling ===
    /// Linear and angular speed below which a stone counts as stopped
    pub settle_epsilon: f32,

    // === Arcade collisions ===
    pub collision_force_multiplier: f32,
    pub retained_velocity_ratio: f32,
    pub super_strength_impulse: f32,

    // === Power-ups ===
    pub power_bank_capacity: usize,

    // === Launch ===
    pub max_launch_force: f32,
    pub launch_force_multiplier: f32,
    pub max_aim_angle_deg: f32,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            total_ends: DEFAULT_TOTAL_ENDS,
            stones_per_team_per_end: DEFAULT_STONES_PER_TEAM_PER_END,

            spawn_point: Vec2::new(SPAWN_X, SPAWN_Y),
            zone: ScoringZone::default(),
            stone_radius: STONE_RADIUS,
            stone_mass: STONE_MASS,

            settle_epsilon: SETTLE_EPSILON,

            collision_force_multiplier: COLLISION_FORCE_MULTIPLIER,
            retained_velocity_ratio: RETAINED_VELOCITY_RATIO,
            super_strength_impulse: SUPER_STRENGTH_IMPULSE,

            power_bank_capacity: POWER_BANK_CAPACITY,

            max_launch_force: MAX_LAUNCH_FORCE,
            launch_force_multiplier: LAUNCH_FORCE_MULTIPLIER,
            max_aim_angle_deg: MAX_AIM_ANGLE_DEG,
        }
    }
}

impl MatchConfig {
    /// Throws in one end, both teams combined
    #[inline]
    pub fn throws_per_end(&self) -> u32 {
        self.stones_per_team_per_end * 2
    }

    /// Parse a config from JSON text and validate it
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded match config from {}", path.display());
        Ok(config)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the match cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        at_least("total_ends", self.total_ends as f32, 1.0)?;
        within(
            "stones_per_team_per_end",
            self.stones_per_team_per_end as f32,
            1.0,
            MAX_STONES_PER_TEAM_PER_END as f32,
        )?;
        at_least(
            "power_bank_capacity",
            self.power_bank_capacity as f32,
            1.0,
        )?;

        finite("spawn_point.x", self.spawn_point.x)?;
        finite("spawn_point.y", self.spawn_point.y)?;
        finite("zone.center.x", self.zone.center.x)?;
        finite("zone.center.y", self.zone.center.y)?;

        at_least("zone.button_radius", self.zone.button_radius, 0.0)?;
        at_least("zone.house_radius", self.zone.house_radius, 0.0)?;
        at_least("stone_radius", self.stone_radius, 0.0)?;
        positive("stone_mass", self.stone_mass)?;
        positive("settle_epsilon", self.settle_epsilon)?;

        at_least(
            "collision_force_multiplier",
            self.collision_force_multiplier,
            0.0,
        )?;
        within(
            "retained_velocity_ratio",
            self.retained_velocity_ratio,
            0.0,
            1.0,
        )?;
        at_least("super_strength_impulse", self.super_strength_impulse, 0.0)?;

        positive("max_launch_force", self.max_launch_force)?;
        at_least("launch_force_multiplier", self.launch_force_multiplier, 0.0)?;
        within("max_aim_angle_deg", self.max_aim_angle_deg, 0.0, 180.0)?;

        Ok(())
    }
}

fn finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotFinite { field })
    }
}

fn at_least(field: &'static str, value: f32, min: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value < min {
        return Err(ConfigError::TooSmall { field, min, value });
    }
    Ok(())
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value <= 0.0 {
        return Err(ConfigError::NotPositive { field, value });
    }
    Ok(())
}

fn within(field: &'static str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value < min || value > max {
        return Err(ConfigError::OutOfRange {
            field,
            min,
            max,
            value,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::MatchStateMachine;

    #[test]
    fn test_default_config_is_valid() {
        let config = MatchConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.throws_per_end(), 8);
        assert_eq!(config.power_bank_capacity, 3);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "total_ends": 2, "zone": { "house_radius": 3.5 } }"#;
        let config = MatchConfig::from_json(json).unwrap();
        assert_eq!(config.total_ends, 2);
        assert_eq!(config.stones_per_team_per_end, DEFAULT_STONES_PER_TEAM_PER_END);
        assert_eq!(config.zone.house_radius, 3.5);
        assert_eq!(config.zone.center, Vec2::new(HOUSE_CENTER_X, HOUSE_CENTER_Y));
    }

    #[test]
    fn test_rejects_zero_ends() {
        let config = MatchConfig {
            total_ends: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TooSmall { field: "total_ends", .. })
        ));
    }

    #[test]
    fn test_rejects_huge_stone_count() {
        let config = MatchConfig {
            stones_per_team_per_end: 3_000_000_000,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange { field: "stones_per_team_per_end", .. })
        ));
        assert!(MatchStateMachine::headless(config).is_err());

        let config = MatchConfig {
            stones_per_team_per_end: MAX_STONES_PER_TEAM_PER_END,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.throws_per_end(), MAX_STONES_PER_TEAM_PER_END * 2);
    }

    #[test]
    fn test_rejects_bad_ratio_and_mass() {
        let config = MatchConfig {
            retained_velocity_ratio: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange { field: "retained_velocity_ratio", .. })
        ));

        let config = MatchConfig {
            stone_mass: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotPositive { field: "stone_mass", .. })
        ));

        let config = MatchConfig {
            settle_epsilon: f32::NAN,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotFinite { field: "settle_epsilon" })
        ));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        assert!(matches!(
            MatchConfig::from_json("{ total_ends: "),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = MatchConfig::load("/definitely/not/here/match.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("match.json"));
    }

    #[test]
    fn test_json_round_trip_preserves_config() {
        let config = MatchConfig {
            total_ends: 3,
            max_aim_angle_deg: 30.0,
            ..Default::default()
        };
        let json = config.to_json().unwrap();
        assert_eq!(MatchConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_zone_boundary_is_inclusive() {
        let zone = ScoringZone {
            center: Vec2::ZERO,
            button_radius: 0.0,
            house_radius: 2.0,
        };
        assert!(zone.contains(Vec2::new(2.5, 0.0), 0.5));
        assert!(!zone.contains(Vec2::new(2.51, 0.0), 0.5));
    }
}
