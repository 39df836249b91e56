//! Stone Slide - rules engine for a two-team stone-sliding game
//!
//! Core modules:
//! - `sim`: Deterministic match simulation (turns, settling, scoring, collisions)
//! - `config`: Data-driven match tuning
//! - `error`: Startup/configuration failures

pub mod config;
pub mod error;
pub mod sim;

pub use config::{MatchConfig, ScoringZone};
pub use error::ConfigError;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep used by the headless host (50 Hz)
    pub const SIM_DT: f32 = 1.0 / 50.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Match length
    pub const DEFAULT_TOTAL_ENDS: u32 = 8;
    pub const DEFAULT_STONES_PER_TEAM_PER_END: u32 = 4;
    /// Upper bound accepted from config files
    pub const MAX_STONES_PER_TEAM_PER_END: u32 = 64;

    /// Sheet layout (world units, sheet runs along +X)
    pub const SPAWN_X: f32 = 0.0;
    pub const SPAWN_Y: f32 = 0.0;
    pub const HOUSE_CENTER_X: f32 = 24.0;
    pub const HOUSE_CENTER_Y: f32 = 0.0;
    pub const HOUSE_RADIUS: f32 = 2.0;
    pub const BUTTON_RADIUS: f32 = 0.0;

    /// Stone defaults
    pub const STONE_RADIUS: f32 = 0.3;
    pub const STONE_MASS: f32 = 1.0;

    /// Below this linear and angular speed a stone is considered at rest
    pub const SETTLE_EPSILON: f32 = 0.1;

    /// Arcade collision response
    pub const COLLISION_FORCE_MULTIPLIER: f32 = 5.0;
    /// Fraction of velocity the striking stone keeps after a plain hit
    pub const RETAINED_VELOCITY_RATIO: f32 = 0.8;
    pub const SUPER_STRENGTH_IMPULSE: f32 = 3.0;

    /// Power-ups held per team
    pub const POWER_BANK_CAPACITY: usize = 3;

    /// Launch limits
    pub const MAX_LAUNCH_FORCE: f32 = 15.0;
    pub const LAUNCH_FORCE_MULTIPLIER: f32 = 1.0;
    /// Max deviation from +X, in degrees
    pub const MAX_AIM_ANGLE_DEG: f32 = 45.0;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Convert cartesian (x, y) to polar (r, theta)
#[inline]
pub fn cartesian_to_polar(pos: Vec2) -> (f32, f32) {
    (pos.length(), pos.y.atan2(pos.x))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_normalize_angle_wraps() {
        assert!((normalize_angle(3.0 * PI) - (-PI)).abs() < 1e-5);
        assert!((normalize_angle(-PI / 2.0) - (-PI / 2.0)).abs() < 1e-6);
        assert!((normalize_angle(2.0 * PI + 0.25) - 0.25).abs() < 1e-5);
    }

    #[test]
    fn test_polar_round_trip() {
        let p = polar_to_cartesian(2.0, PI / 4.0);
        let (r, theta) = cartesian_to_polar(p);
        assert!((r - 2.0).abs() < 1e-5);
        assert!((theta - PI / 4.0).abs() < 1e-5);
    }
}
