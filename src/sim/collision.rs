//! Arcade collision response between stones
//!
//! The host's rigid-body simulation detects contacts; this module decides
//! what a contact does. Only the active, launched stone pushes: it shoves
//! the stone it hits along the line between their centers and loses some
//! of its own speed. A held SuperStrength token replaces that with a dead
//! stop and a fixed, strong shove, then is used up.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::power::PowerUpKind;
use super::state::Stone;
use crate::config::MatchConfig;

/// Tuning for contact response
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactResponse {
    /// Impulse per unit of striker speed for a plain hit
    pub force_multiplier: f32,
    /// Fraction of velocity the striker keeps after a plain hit
    pub retained_velocity_ratio: f32,
    /// Impulse magnitude of a SuperStrength hit
    pub super_strength_impulse: f32,
    pub stone_mass: f32,
}

impl From<&MatchConfig> for ContactResponse {
    fn from(config: &MatchConfig) -> Self {
        Self {
            force_multiplier: config.collision_force_multiplier,
            retained_velocity_ratio: config.retained_velocity_ratio,
            super_strength_impulse: config.super_strength_impulse,
            stone_mass: config.stone_mass,
        }
    }
}

/// What a contact did
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ContactOutcome {
    /// No arcade response (not the active stone, wrong phase, repeat contact)
    Ignored,
    /// Plain hit: struck stone pushed proportionally to striker speed
    Push { impulse: Vec2 },
    /// SuperStrength hit: striker stopped, struck stone gets the fixed impulse
    SuperStrength { impulse: Vec2 },
}

impl ContactOutcome {
    pub fn impulse(&self) -> Option<Vec2> {
        match self {
            ContactOutcome::Ignored => None,
            ContactOutcome::Push { impulse } | ContactOutcome::SuperStrength { impulse } => {
                Some(*impulse)
            }
        }
    }
}

/// Unit vector from striker to struck (zero when the centers coincide)
#[inline]
pub fn push_direction(striker_pos: Vec2, struck_pos: Vec2) -> Vec2 {
    (struck_pos - striker_pos).normalize_or_zero()
}

/// Whether two equal-radius stones overlap (touching counts)
#[inline]
pub fn stones_overlap(a: Vec2, b: Vec2, stone_radius: f32) -> bool {
    let combined = stone_radius * 2.0;
    a.distance_squared(b) <= combined * combined
}

/// Apply the arcade response of `striker` hitting `struck`
pub fn resolve_contact(
    striker: &mut Stone,
    struck: &mut Stone,
    response: &ContactResponse,
) -> ContactOutcome {
    let dir = push_direction(striker.pos, struck.pos);

    if striker.take_power_up(PowerUpKind::SuperStrength) {
        striker.snap_to_rest();
        striker.settled = false;

        let impulse = dir * response.super_strength_impulse;
        struck.apply_impulse(impulse, response.stone_mass);
        return ContactOutcome::SuperStrength { impulse };
    }

    let impulse = dir * striker.speed() * response.force_multiplier;
    struck.apply_impulse(impulse, response.stone_mass);
    striker.vel *= response.retained_velocity_ratio;

    ContactOutcome::Push { impulse }
}

/// Two distinct stones borrowed mutably at once
pub fn stone_pair_mut(
    stones: &mut [Stone],
    i: usize,
    j: usize,
) -> Option<(&mut Stone, &mut Stone)> {
    if i == j || i >= stones.len() || j >= stones.len() {
        return None;
    }
    if i < j {
        let (left, right) = stones.split_at_mut(j);
        Some((&mut left[i], &mut right[0]))
    } else {
        let (left, right) = stones.split_at_mut(i);
        Some((&mut right[0], &mut left[j]))
    }
}
