//! End scoring
//!
//! Only stones touching the house count. The team with the stone nearest
//! the button scores one point for every stone it has closer than the
//! opponent's best stone. An opponent stone at exactly the same distance
//! blocks: comparison is strict.

use serde::{Deserialize, Serialize};

use super::state::{Stone, Team};
use crate::config::ScoringZone;

/// Points for one end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndScore {
    /// Owner of the closest in-house stone (None if the house is empty)
    pub scoring_team: Option<Team>,
    pub points: u32,
}

impl EndScore {
    pub const EMPTY: EndScore = EndScore {
        scoring_team: None,
        points: 0,
    };

    /// Points awarded to `team` this end
    pub fn points_for(&self, team: Team) -> u32 {
        if self.scoring_team == Some(team) {
            self.points
        } else {
            0
        }
    }
}

/// Stones touching the house with their distance to the button, nearest first
///
/// Equal distances keep the input order.
pub fn stones_in_house<'a>(
    stones: &'a [Stone],
    zone: &ScoringZone,
    stone_radius: f32,
) -> Vec<(&'a Stone, f32)> {
    let mut in_house: Vec<(&Stone, f32)> = stones
        .iter()
        .filter(|s| zone.contains(s.pos, stone_radius))
        .map(|s| (s, zone.distance_to(s.pos)))
        .collect();

    in_house.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    in_house
}

/// Count the points for an end. Pure: the same stones always give the same score.
pub fn score_end(stones: &[Stone], zone: &ScoringZone, stone_radius: f32) -> EndScore {
    let in_house = stones_in_house(stones, zone, stone_radius);

    let Some(&(closest, _)) = in_house.first() else {
        return EndScore::EMPTY;
    };
    let scoring_team = closest.team;

    let closest_opponent = in_house
        .iter()
        .find(|(s, _)| s.team != scoring_team)
        .map(|&(_, d)| d);

    let points = in_house
        .iter()
        .filter(|(s, _)| s.team == scoring_team)
        .filter(|&&(_, d)| closest_opponent.is_none_or(|opp| d < opp))
        .count() as u32;

    EndScore {
        scoring_team: Some(scoring_team),
        points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use proptest::prelude::*;

    fn zone(house_radius: f32) -> ScoringZone {
        ScoringZone {
            center: Vec2::ZERO,
            button_radius: 0.0,
            house_radius,
        }
    }

    fn stone(id: u32, team: Team, x: f32) -> Stone {
        Stone::new(id, team, 0, Vec2::new(x, 0.0))
    }

    #[test]
    fn test_single_stone_in_house_scores() {
        // Red at 1, Blue at 3 outside a radius-2 house
        let stones = [stone(1, Team::Red, 1.0), stone(2, Team::Blue, 3.0)];
        let score = score_end(&stones, &zone(2.0), 0.0);
        assert_eq!(score.scoring_team, Some(Team::Red));
        assert_eq!(score.points, 1);
        assert_eq!(score.points_for(Team::Blue), 0);
    }

    #[test]
    fn test_counts_stones_closer_than_best_opponent() {
        let stones = [
            stone(1, Team::Red, 0.5),
            stone(2, Team::Red, 1.0),
            stone(3, Team::Blue, 1.5),
        ];
        let score = score_end(&stones, &zone(2.0), 0.0);
        assert_eq!(score.scoring_team, Some(Team::Red));
        assert_eq!(score.points, 2);
    }

    #[test]
    fn test_opponent_splits_scoring_stones() {
        let stones = [
            stone(1, Team::Blue, 0.2),
            stone(2, Team::Red, 0.6),
            stone(3, Team::Blue, 0.9),
            stone(4, Team::Blue, 1.9),
        ];
        let score = score_end(&stones, &zone(2.0), 0.0);
        assert_eq!(score.scoring_team, Some(Team::Blue));
        assert_eq!(score.points, 1);
    }

    #[test]
    fn test_empty_house_scores_nothing() {
        let stones = [stone(1, Team::Red, 5.0), stone(2, Team::Blue, -4.0)];
        assert_eq!(score_end(&stones, &zone(2.0), 0.3), EndScore::EMPTY);
        assert_eq!(score_end(&[], &zone(2.0), 0.3), EndScore::EMPTY);
    }

    #[test]
    fn test_house_edge_is_inclusive_of_stone_radius() {
        let stones = [stone(1, Team::Blue, 2.5)];
        let score = score_end(&stones, &zone(2.0), 0.5);
        assert_eq!(score.points_for(Team::Blue), 1);

        let stones = [stone(1, Team::Blue, 2.5001)];
        assert_eq!(score_end(&stones, &zone(2.0), 0.5), EndScore::EMPTY);
    }

    #[test]
    fn test_equidistant_opponent_blocks() {
        // Red first in spawn order, Blue at the same distance on the other side
        let stones = [
            stone(1, Team::Red, 1.0),
            stone(2, Team::Blue, -1.0),
            stone(3, Team::Red, 1.5),
        ];
        let score = score_end(&stones, &zone(2.0), 0.0);
        assert_eq!(score.scoring_team, Some(Team::Red));
        assert_eq!(score.points, 0);
    }

    #[test]
    fn test_off_center_zone() {
        let zone = ScoringZone {
            center: Vec2::new(24.0, 0.0),
            button_radius: 0.0,
            house_radius: 2.0,
        };
        let stones = [
            Stone::new(1, Team::Red, 0, Vec2::new(24.0, 1.5)),
            Stone::new(2, Team::Blue, 0, Vec2::new(23.5, 0.0)),
        ];
        let score = score_end(&stones, &zone, 0.3);
        assert_eq!(score.scoring_team, Some(Team::Blue));
        assert_eq!(score.points, 1);
    }

    fn arb_stones() -> impl Strategy<Value = Vec<Stone>> {
        prop::collection::vec((any::<bool>(), -4.0f32..4.0, -4.0f32..4.0), 0..16).prop_map(|v| {
            v.into_iter()
                .enumerate()
                .map(|(i, (red, x, y))| {
                    let team = if red { Team::Red } else { Team::Blue };
                    Stone::new(i as u32 + 1, team, 0, Vec2::new(x, y))
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_scoring_is_idempotent(stones in arb_stones()) {
            let z = zone(2.0);
            prop_assert_eq!(score_end(&stones, &z, 0.3), score_end(&stones, &z, 0.3));
        }

        #[test]
        fn prop_points_never_exceed_scoring_team_in_house(stones in arb_stones()) {
            let z = zone(2.0);
            let score = score_end(&stones, &z, 0.3);
            let in_house = stones_in_house(&stones, &z, 0.3);
            match score.scoring_team {
                None => {
                    prop_assert!(in_house.is_empty());
                    prop_assert_eq!(score.points, 0);
                }
                Some(team) => {
                    let owned = in_house.iter().filter(|(s, _)| s.team == team).count() as u32;
                    prop_assert!(score.points <= owned);
                    prop_assert!(score.points >= 1 || in_house.len() > 1);
                }
            }
        }
    }
}
