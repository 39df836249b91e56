//! Fixed timestep simulation tick
//!
//! The host steps its physics, then hands the engine one [`TickInput`] per
//! step. Within a tick the order is fixed:
//! restart → pause toggle → kinematic samples → contacts → commands → settle check.
//! A restart works while paused and un-pauses the match.
//!
//! After each tick the host should copy stone velocities back into its
//! bodies: launches and contacts change them.

use glam::Vec2;

use super::events::{EventSink, MatchEvent};
use super::machine::MatchStateMachine;
use super::power::PowerUpKind;
use super::state::{GamePhase, Team};

/// Post-step position and velocity of one stone, as measured by the host
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoneSample {
    pub stone_id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub angular_vel: f32,
}

/// Two stones touched during the physics step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub a: u32,
    pub b: u32,
    pub point: Vec2,
}

/// Throw request for the active stone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaunchCommand {
    pub stone_id: u32,
    pub direction: Vec2,
    pub force: f32,
}

/// Input for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Pause toggle
    pub pause: bool,
    /// Start the match over (rest of the input is dropped)
    pub restart: bool,
    /// Kinematic state of stones after the host's physics step
    pub samples: Vec<StoneSample>,
    /// Stone pairs that touched during the step
    pub contacts: Vec<Contact>,
    /// Continue after an end was scored
    pub advance_end: bool,
    /// Power-ups picked up from the field
    pub pickups: Vec<(PowerUpKind, Team)>,
    /// Activate a banked power-up: (team, slot)
    pub activate: Option<(Team, usize)>,
    /// Throw the active stone
    pub launch: Option<LaunchCommand>,
}

impl<S: EventSink> MatchStateMachine<S> {
    /// Advance the match by one fixed timestep
    pub fn tick(&mut self, input: &TickInput, dt: f32) {
        self.begin_step();

        if input.restart {
            self.restart_match();
            return;
        }

        if input.pause {
            self.toggle_pause();
        }
        if self.state.paused {
            return;
        }

        if self.state.phase == GamePhase::GameOver {
            return;
        }

        self.state.time_ticks += 1;
        self.state.elapsed_secs += dt;

        for sample in &input.samples {
            self.apply_sample(sample);
        }

        for contact in &input.contacts {
            self.notify_contact(contact.a, contact.b, contact.point);
        }

        if input.advance_end {
            self.advance_to_next_end();
        }
        for &(kind, team) in &input.pickups {
            self.collect_power_up(kind, team);
        }
        if let Some((team, slot)) = input.activate {
            self.activate_power_up(team, slot);
        }
        if let Some(cmd) = input.launch {
            self.launch(cmd.stone_id, cmd.direction, cmd.force);
        }

        if self.state.phase == GamePhase::StoneMoving {
            self.settle_check();
        }
    }

    /// Overwrite a stone's kinematics with the host's measurement
    pub fn apply_sample(&mut self, sample: &StoneSample) {
        if let Some(stone) = self.state.stone_mut(sample.stone_id) {
            stone.pos = sample.pos;
            stone.vel = sample.vel;
            stone.angular_vel = sample.angular_vel;
        }
    }

    /// Snap slow stones to rest; once nothing is moving, hand the turn on.
    ///
    /// Every stone is checked before the phase is allowed to change. Ends
    /// the current physics step for contact deduplication.
    pub fn settle_check(&mut self) {
        self.begin_step();
        if self.state.phase != GamePhase::StoneMoving {
            return;
        }

        let epsilon = self.config.settle_epsilon;
        let mut any_moving = false;
        for stone in &mut self.state.stones {
            if stone.is_below(epsilon) {
                stone.snap_to_rest();
            } else {
                stone.settled = false;
                any_moving = true;
            }
        }
        if any_moving {
            return;
        }

        log::debug!("All stones settled after {} ticks", self.state.time_ticks);
        self.publish(MatchEvent::StonesSettled);
        self.set_phase(GamePhase::Aiming);
        self.check_end_condition();
    }
}
