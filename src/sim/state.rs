//! Match state and core simulation types
//!
//! Everything a host needs to snapshot or present a match lives here.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::power::{PowerUpKind, TeamBanks};

/// The two sides of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    Red,
    Blue,
}

impl Team {
    pub const ALL: [Team; 2] = [Team::Red, Team::Blue];

    /// The team that throws first in every end
    pub const STARTING: Team = Team::Red;

    pub fn other(self) -> Team {
        match self {
            Team::Red => Team::Blue,
            Team::Blue => Team::Red,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Team::Red => "Red",
            Team::Blue => "Blue",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "red" => Some(Team::Red),
            "blue" => Some(Team::Blue),
            _ => None,
        }
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current phase of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Match reset, first end not yet started
    BeforeGame,
    /// Active stone waiting to be thrown
    Aiming,
    /// At least one stone still sliding
    StoneMoving,
    /// All stones of the end thrown and at rest, points being counted
    EndScoring,
    /// End counted, waiting for the host to continue
    BetweenEnds,
    /// Last end counted
    GameOver,
}

/// A stone on the sheet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stone {
    pub id: u32,
    pub team: Team,
    /// Order of this stone among its team's throws this end (0-based)
    pub throw_index: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub angular_vel: f32,
    /// At rest as of the last settle check
    pub settled: bool,
    /// Thrown already (a stone is launched at most once)
    pub launched: bool,
    /// Power-ups attached to this stone, in activation order
    pub power_ups: Vec<PowerUpKind>,
}

impl Stone {
    pub fn new(id: u32, team: Team, throw_index: u32, pos: Vec2) -> Self {
        Self {
            id,
            team,
            throw_index,
            pos,
            vel: Vec2::ZERO,
            angular_vel: 0.0,
            settled: true,
            launched: false,
            power_ups: Vec::new(),
        }
    }

    /// Display name, e.g. `Blue_2`
    pub fn label(&self) -> String {
        format!("{}_{}", self.team, self.throw_index)
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.vel.length()
    }

    /// Both linear and angular speed under `epsilon`
    pub fn is_below(&self, epsilon: f32) -> bool {
        self.speed() < epsilon && self.angular_vel.abs() < epsilon
    }

    /// Zero all motion and mark settled
    pub fn snap_to_rest(&mut self) {
        self.vel = Vec2::ZERO;
        self.angular_vel = 0.0;
        self.settled = true;
    }

    /// Change velocity by `impulse / mass`
    pub fn apply_impulse(&mut self, impulse: Vec2, mass: f32) {
        self.vel += impulse / mass;
        self.settled = false;
    }

    pub fn has_power_up(&self, kind: PowerUpKind) -> bool {
        self.power_ups.contains(&kind)
    }

    /// Remove one token of `kind`; returns false if the stone held none
    pub fn take_power_up(&mut self, kind: PowerUpKind) -> bool {
        match self.power_ups.iter().position(|&p| p == kind) {
            Some(i) => {
                self.power_ups.remove(i);
                true
            }
            None => false,
        }
    }
}

/// Cumulative points per team
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scores {
    pub red: u32,
    pub blue: u32,
}

impl Scores {
    pub fn get(&self, team: Team) -> u32 {
        match team {
            Team::Red => self.red,
            Team::Blue => self.blue,
        }
    }

    pub fn add(&mut self, team: Team, points: u32) {
        match team {
            Team::Red => self.red += points,
            Team::Blue => self.blue += points,
        }
    }

    /// Team strictly ahead, or a tie
    pub fn outcome(&self) -> MatchOutcome {
        if self.red > self.blue {
            MatchOutcome::Winner(Team::Red)
        } else if self.blue > self.red {
            MatchOutcome::Winner(Team::Blue)
        } else {
            MatchOutcome::Tie
        }
    }
}

/// Final result of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchOutcome {
    Winner(Team),
    Tie,
}

/// Points awarded for one end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndResult {
    /// 1-based end number
    pub end: u32,
    /// Team owning the stone closest to the button (None if the house was empty)
    pub scoring_team: Option<Team>,
    pub points: u32,
}

/// Complete match state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchState {
    pub phase: GamePhase,
    /// Ticks are ignored while paused
    pub paused: bool,
    /// Current end (1-based; 0 before the first end starts)
    pub current_end: u32,
    pub current_team: Team,
    pub stones_thrown_this_end: u32,
    pub scores: Scores,
    /// Stones in play this end (sorted by id)
    pub stones: Vec<Stone>,
    /// The stone the current team controls
    pub active_stone: Option<u32>,
    pub banks: TeamBanks,
    /// One entry per scored end
    pub end_history: Vec<EndResult>,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Simulated seconds, summed from tick dt
    pub elapsed_secs: f32,
    /// Stone pairs already resolved during the current tick
    #[serde(skip)]
    pub(crate) contacts_this_tick: Vec<(u32, u32)>,
    /// Next entity ID
    next_id: u32,
}

impl MatchState {
    pub fn new(bank_capacity: usize) -> Self {
        Self {
            phase: GamePhase::BeforeGame,
            paused: false,
            current_end: 0,
            current_team: Team::STARTING,
            stones_thrown_this_end: 0,
            scores: Scores::default(),
            stones: Vec::new(),
            active_stone: None,
            banks: TeamBanks::new(bank_capacity),
            end_history: Vec::new(),
            time_ticks: 0,
            elapsed_secs: 0.0,
            contacts_this_tick: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn stone(&self, id: u32) -> Option<&Stone> {
        self.stones.iter().find(|s| s.id == id)
    }

    pub fn stone_mut(&mut self, id: u32) -> Option<&mut Stone> {
        self.stones.iter_mut().find(|s| s.id == id)
    }

    pub fn stone_index(&self, id: u32) -> Option<usize> {
        self.stones.iter().position(|s| s.id == id)
    }

    pub fn active_stone(&self) -> Option<&Stone> {
        self.active_stone.and_then(|id| self.stone(id))
    }

    pub fn active_stone_mut(&mut self) -> Option<&mut Stone> {
        let id = self.active_stone?;
        self.stone_mut(id)
    }

    /// Stones the given team has spawned this end
    pub fn team_stone_count(&self, team: Team) -> u32 {
        self.stones.iter().filter(|s| s.team == team).count() as u32
    }

    /// Remove every stone from the sheet
    pub fn clear_stones(&mut self) {
        self.stones.clear();
        self.active_stone = None;
    }

    /// Ensure stones are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.stones.sort_by_key(|s| s.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_alternation() {
        assert_eq!(Team::Red.other(), Team::Blue);
        assert_eq!(Team::Blue.other(), Team::Red);
        assert_eq!(Team::from_str("BLUE"), Some(Team::Blue));
        assert_eq!(Team::from_str("green"), None);
    }

    #[test]
    fn test_stone_label_and_rest() {
        let mut stone = Stone::new(7, Team::Blue, 2, Vec2::ZERO);
        assert_eq!(stone.label(), "Blue_2");
        assert!(stone.is_below(0.1));

        stone.apply_impulse(Vec2::new(2.0, 0.0), 2.0);
        assert!((stone.vel.x - 1.0).abs() < 1e-6);
        assert!(!stone.settled);
        assert!(!stone.is_below(0.1));

        stone.vel = Vec2::new(0.05, 0.0);
        stone.angular_vel = -0.2;
        assert!(!stone.is_below(0.1));

        stone.snap_to_rest();
        assert_eq!(stone.vel, Vec2::ZERO);
        assert_eq!(stone.angular_vel, 0.0);
        assert!(stone.settled);
    }

    #[test]
    fn test_take_power_up_removes_one() {
        let mut stone = Stone::new(1, Team::Red, 0, Vec2::ZERO);
        stone.power_ups = vec![PowerUpKind::SuperStrength, PowerUpKind::SuperStrength];
        assert!(stone.take_power_up(PowerUpKind::SuperStrength));
        assert_eq!(stone.power_ups.len(), 1);
        assert!(stone.take_power_up(PowerUpKind::SuperStrength));
        assert!(!stone.take_power_up(PowerUpKind::SuperStrength));
    }

    #[test]
    fn test_scores_outcome() {
        let mut scores = Scores::default();
        assert_eq!(scores.outcome(), MatchOutcome::Tie);
        scores.add(Team::Blue, 2);
        assert_eq!(scores.outcome(), MatchOutcome::Winner(Team::Blue));
        scores.add(Team::Red, 3);
        assert_eq!(scores.get(Team::Red), 3);
        assert_eq!(scores.outcome(), MatchOutcome::Winner(Team::Red));
    }

    #[test]
    fn test_entity_ids_are_unique() {
        let mut state = MatchState::new(3);
        let a = state.next_entity_id();
        let b = state.next_entity_id();
        assert_ne!(a, b);
        assert_eq!(state.phase, GamePhase::BeforeGame);
    }
}
