//! Match state machine
//!
//! Owns the match state and drives it through
//! `BeforeGame → Aiming ⇄ StoneMoving → EndScoring → BetweenEnds → … → GameOver`.
//! Requests that don't fit the current phase are ignored and reported
//! through the return value; they never fail.

use glam::Vec2;

use super::collision::{self, ContactOutcome, ContactResponse};
use super::events::{EventSink, MatchEvent, NullSink};
use super::power::{PowerUpKind, TeamPowerBank};
use super::scoring;
use super::state::{
    EndResult, GamePhase, MatchOutcome, MatchState, Scores, Stone, Team,
};
use crate::config::MatchConfig;
use crate::error::ConfigError;
use crate::{cartesian_to_polar, normalize_angle, polar_to_cartesian};

/// The rules engine for one match
#[derive(Debug)]
pub struct MatchStateMachine<S: EventSink = NullSink> {
    pub(crate) config: MatchConfig,
    pub(crate) state: MatchState,
    pub(crate) sink: S,
}

impl MatchStateMachine<NullSink> {
    /// Machine that publishes nowhere
    pub fn headless(config: MatchConfig) -> Result<Self, ConfigError> {
        Self::new(config, NullSink)
    }
}

impl<S: EventSink> MatchStateMachine<S> {
    /// Validate `config` and start the first end.
    ///
    /// A config the match can't run with is fatal here.
    pub fn new(config: MatchConfig, sink: S) -> Result<Self, ConfigError> {
        config.validate()?;
        let state = MatchState::new(config.power_bank_capacity);
        let mut machine = Self {
            config,
            state,
            sink,
        };
        machine.start_match();
        Ok(machine)
    }

    // === Queries ===

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Full serializable snapshot
    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn is_paused(&self) -> bool {
        self.state.paused
    }

    pub fn current_team(&self) -> Team {
        self.state.current_team
    }

    pub fn active_stone_id(&self) -> Option<u32> {
        self.state.active_stone
    }

    pub fn active_stone(&self) -> Option<&Stone> {
        self.state.active_stone()
    }

    pub fn stones(&self) -> &[Stone] {
        &self.state.stones
    }

    pub fn stone(&self, id: u32) -> Option<&Stone> {
        self.state.stone(id)
    }

    pub fn scores(&self) -> Scores {
        self.state.scores
    }

    pub fn current_end(&self) -> u32 {
        self.state.current_end
    }

    pub fn total_ends(&self) -> u32 {
        self.config.total_ends
    }

    pub fn stones_thrown_this_end(&self) -> u32 {
        self.state.stones_thrown_this_end
    }

    pub fn bank(&self, team: Team) -> &TeamPowerBank {
        self.state.banks.get(team)
    }

    pub fn end_history(&self) -> &[EndResult] {
        &self.state.end_history
    }

    /// Match result, only once the match is over
    pub fn winner(&self) -> Option<MatchOutcome> {
        (self.state.phase == GamePhase::GameOver).then(|| self.state.scores.outcome())
    }

    // === Match flow ===

    /// Reset scores, banks and stones, then start end 1
    pub fn start_match(&mut self) {
        self.state.scores = Scores::default();
        self.state.current_end = 0;
        self.state.stones_thrown_this_end = 0;
        self.state.banks.clear();
        self.state.end_history.clear();
        self.state.paused = false;
        self.state.clear_stones();
        self.set_phase(GamePhase::BeforeGame);

        log::info!(
            "Match started: {} ends, {} stones per team",
            self.config.total_ends,
            self.config.stones_per_team_per_end
        );
        self.publish(MatchEvent::MatchStarted);

        self.start_new_end();
    }

    /// Same as [`start_match`](Self::start_match)
    pub fn restart_match(&mut self) {
        self.start_match();
    }

    /// Begin the next end. The total-ends bound is enforced by
    /// [`advance_to_next_end`](Self::advance_to_next_end), not here.
    fn start_new_end(&mut self) {
        self.state.current_end += 1;
        self.state.stones_thrown_this_end = 0;
        self.state.current_team = Team::STARTING;
        self.state.clear_stones();

        log::info!(
            "End {}/{} started",
            self.state.current_end,
            self.config.total_ends
        );
        self.publish(MatchEvent::EndStarted {
            end: self.state.current_end,
        });

        self.set_phase(GamePhase::Aiming);
        self.spawn_stone();
    }

    /// Put a fresh stone for the current team at the spawn point and make it active
    fn spawn_stone(&mut self) {
        let team = self.state.current_team;
        let id = self.state.next_entity_id();
        let throw_index = self.state.team_stone_count(team);
        let stone = Stone::new(id, team, throw_index, self.config.spawn_point);

        log::debug!("Spawned {} (id {})", stone.label(), id);
        self.state.stones.push(stone);
        self.state.normalize_order();
        self.state.active_stone = Some(id);

        self.publish(MatchEvent::StoneSpawned { stone_id: id, team });
    }

    /// Whether the active stone may be thrown right now
    pub fn can_launch(&self) -> bool {
        self.state.phase == GamePhase::Aiming
            && !self.state.paused
            && self.state.active_stone().is_some_and(|s| !s.launched)
    }

    /// Throw the active stone.
    ///
    /// `force` is clamped to the configured maximum and the direction's
    /// angle from +X to the configured aim cone. Returns false (and changes
    /// nothing) when `stone_id` isn't the active stone, the phase is wrong,
    /// or the direction is degenerate.
    pub fn launch(&mut self, stone_id: u32, direction: Vec2, force: f32) -> bool {
        if self.state.active_stone != Some(stone_id) || !self.can_launch() {
            log::debug!("Launch of stone {stone_id} ignored in {:?}", self.state.phase);
            return false;
        }
        let Some(velocity) = self.launch_velocity(direction, force) else {
            log::debug!(
                "Launch of stone {stone_id} ignored: bad direction {direction} / force {force}"
            );
            return false;
        };

        if let Some(stone) = self.state.active_stone_mut() {
            stone.vel = velocity;
            stone.angular_vel = 0.0;
        }
        self.notify_launched()
    }

    /// Record that the host threw the active stone itself.
    ///
    /// Use this when the host's physics applies the launch impulse; use
    /// [`launch`](Self::launch) to let the engine set the velocity.
    pub fn notify_launched(&mut self) -> bool {
        if !self.can_launch() {
            log::debug!("Launch notification ignored in {:?}", self.state.phase);
            return false;
        }

        let team = self.state.current_team;
        let Some(stone) = self.state.active_stone_mut() else {
            return false;
        };
        stone.launched = true;
        stone.settled = false;
        let stone_id = stone.id;
        let velocity = stone.vel;

        self.state.stones_thrown_this_end += 1;
        log::debug!(
            "{team} threw stone {stone_id} ({}/{} this end)",
            self.state.stones_thrown_this_end,
            self.config.throws_per_end()
        );
        self.publish(MatchEvent::StoneLaunched {
            stone_id,
            team,
            velocity,
        });
        self.set_phase(GamePhase::StoneMoving);
        true
    }

    /// Launch velocity for a direction and force, after clamping
    pub fn launch_velocity(&self, direction: Vec2, force: f32) -> Option<Vec2> {
        if !force.is_finite() || !direction.is_finite() {
            return None;
        }
        let dir = direction.try_normalize()?;

        let (_, theta) = cartesian_to_polar(dir);
        let max_angle = self.config.max_aim_angle_deg.to_radians();
        let theta = normalize_angle(theta).clamp(-max_angle, max_angle);

        let force = force.clamp(0.0, self.config.max_launch_force);
        let speed = force * self.config.launch_force_multiplier / self.config.stone_mass;
        Some(polar_to_cartesian(speed, theta))
    }

    /// After every stone is at rest: next throw, or score the end
    pub(crate) fn check_end_condition(&mut self) {
        if self.state.stones_thrown_this_end < self.config.throws_per_end() {
            self.state.current_team = self.state.current_team.other();
            self.publish(MatchEvent::TurnChanged {
                team: self.state.current_team,
            });
            self.spawn_stone();
        } else {
            self.set_phase(GamePhase::EndScoring);
            self.score_current_end();
        }
    }

    fn score_current_end(&mut self) {
        let score = scoring::score_end(
            &self.state.stones,
            &self.config.zone,
            self.config.stone_radius,
        );
        if let Some(team) = score.scoring_team {
            self.state.scores.add(team, score.points);
        }

        let result = EndResult {
            end: self.state.current_end,
            scoring_team: score.scoring_team,
            points: score.points,
        };
        match result.scoring_team {
            Some(team) => log::info!(
                "End {} scored: {} +{} (Red {} - Blue {})",
                result.end,
                team,
                result.points,
                self.state.scores.red,
                self.state.scores.blue
            ),
            None => log::info!("End {} scored: no stones in the house", result.end),
        }

        self.state.end_history.push(result);
        self.state.active_stone = None;
        self.publish(MatchEvent::EndScored(result));
        self.set_phase(GamePhase::BetweenEnds);
    }

    /// Continue after an end has been scored: next end, or game over after the last.
    ///
    /// Ignored outside `BetweenEnds`.
    pub fn advance_to_next_end(&mut self) -> bool {
        if self.state.phase != GamePhase::BetweenEnds {
            log::debug!("Advance ignored in {:?}", self.state.phase);
            return false;
        }
        if self.state.current_end >= self.config.total_ends {
            self.game_over();
        } else {
            self.start_new_end();
        }
        true
    }

    fn game_over(&mut self) {
        self.set_phase(GamePhase::GameOver);
        let scores = self.state.scores;
        let outcome = scores.outcome();
        match outcome {
            MatchOutcome::Winner(team) => log::info!(
                "Game over: {team} wins {}-{}",
                scores.get(team),
                scores.get(team.other())
            ),
            MatchOutcome::Tie => log::info!("Game over: tie at {}", scores.red),
        }
        self.publish(MatchEvent::GameOver { outcome, scores });
    }

    /// Freeze or unfreeze the tick
    pub fn toggle_pause(&mut self) {
        self.state.paused = !self.state.paused;
        if self.state.paused {
            log::debug!("Paused");
            self.publish(MatchEvent::Paused);
        } else {
            log::debug!("Resumed");
            self.publish(MatchEvent::Resumed);
        }
    }

    // === Power-ups ===

    /// Bank a picked-up token for `team`, dropping its oldest if full
    pub fn collect_power_up(&mut self, kind: PowerUpKind, team: Team) {
        let evicted = self.state.banks.get_mut(team).add(kind);
        if let Some(old) = evicted {
            log::debug!("{team} bank full, dropped oldest {old}");
        }
        log::info!("{team} collected {kind}");
        self.publish(MatchEvent::PowerUpCollected {
            team,
            kind,
            evicted,
        });
    }

    /// Move the token in `slot` of `team`'s bank onto the active stone.
    ///
    /// Only while aiming. Returns the token, or `None` if nothing happened.
    pub fn activate_power_up(&mut self, team: Team, slot: usize) -> Option<PowerUpKind> {
        if self.state.phase != GamePhase::Aiming {
            log::debug!("Power-up activation ignored in {:?}", self.state.phase);
            return None;
        }
        let stone_id = self.state.active_stone?;

        let Some(kind) = self.state.banks.get_mut(team).activate_at(slot) else {
            log::info!("No power at slot {slot} for {team}");
            self.publish(MatchEvent::NoPowerAtSlot { team, slot });
            return None;
        };

        if let Some(stone) = self.state.stone_mut(stone_id) {
            stone.power_ups.push(kind);
        }
        log::info!("{team} activated {kind} on stone {stone_id}");
        self.publish(MatchEvent::PowerUpActivated {
            team,
            kind,
            stone_id,
        });
        Some(kind)
    }

    // === Contacts ===

    /// Start a new physics step: contacts may push again.
    ///
    /// [`tick`](Self::tick) and [`settle_check`](Self::settle_check) call
    /// this; hosts driving the per-event API between settle checks can too.
    pub fn begin_step(&mut self) {
        self.state.contacts_this_tick.clear();
    }

    /// Handle a stone-vs-stone contact reported by the host.
    ///
    /// Every contact is published for cosmetic effects. The arcade push is
    /// applied only while stones are moving, only when one of the pair is
    /// the launched active stone, and at most once per pair per physics step.
    pub fn notify_contact(&mut self, a: u32, b: u32, point: Vec2) -> ContactOutcome {
        if a == b {
            return ContactOutcome::Ignored;
        }
        let key = (a.min(b), a.max(b));
        if self.state.contacts_this_tick.contains(&key) {
            return ContactOutcome::Ignored;
        }
        self.state.contacts_this_tick.push(key);
        self.publish(MatchEvent::StonesCollided { a, b, point });

        if self.state.phase != GamePhase::StoneMoving {
            return ContactOutcome::Ignored;
        }
        let Some(active) = self.state.active_stone else {
            return ContactOutcome::Ignored;
        };
        let (striker_id, struck_id) = if a == active {
            (a, b)
        } else if b == active {
            (b, a)
        } else {
            return ContactOutcome::Ignored;
        };

        let (Some(i), Some(j)) = (
            self.state.stone_index(striker_id),
            self.state.stone_index(struck_id),
        ) else {
            return ContactOutcome::Ignored;
        };
        let response = ContactResponse::from(&self.config);
        let Some((striker, struck)) = collision::stone_pair_mut(&mut self.state.stones, i, j)
        else {
            return ContactOutcome::Ignored;
        };
        if !striker.launched {
            return ContactOutcome::Ignored;
        }

        let outcome = collision::resolve_contact(striker, struck, &response);
        if let Some(impulse) = outcome.impulse() {
            let super_strength = matches!(outcome, ContactOutcome::SuperStrength { .. });
            log::debug!(
                "Stone {striker_id} hit {struck_id}: impulse {impulse}{}",
                if super_strength { " (super strength)" } else { "" }
            );
            self.publish(MatchEvent::ArcadePush {
                striker: striker_id,
                struck: struck_id,
                impulse,
                super_strength,
            });
        }
        outcome
    }

    // === Internals ===

    pub(crate) fn set_phase(&mut self, to: GamePhase) {
        let from = self.state.phase;
        if from == to {
            return;
        }
        self.state.phase = to;
        log::debug!("Phase {from:?} -> {to:?}");
        self.publish(MatchEvent::PhaseChanged { from, to });
    }

    pub(crate) fn publish(&mut self, event: MatchEvent) {
        self.sink.publish(&event);
    }
}
