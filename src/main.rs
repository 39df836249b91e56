//! Stone Slide headless host
//!
//! Plays a full match with a seeded bot on a bare-bones kinematic sheet
//! (straight-line sliding with constant friction, overlap contacts) and
//! logs what the rules engine decides.
//!
//! Usage: `stone-slide [config.json] [seed]`

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use stone_slide::consts::*;
use stone_slide::sim::collision::stones_overlap;
use stone_slide::sim::{
    Channel, Contact, EventBus, GamePhase, LaunchCommand, MatchEvent, MatchOutcome,
    MatchStateMachine, PowerUpKind, StoneSample, TickInput,
};
use stone_slide::{ConfigError, MatchConfig};

/// Speed lost per second to sheet friction
const FRICTION_DECEL: f32 = 3.0;
/// Chance per throw that the thrower picks a power-up off the sheet
const PICKUP_CHANCE: f64 = 0.15;
/// Chance the bot spends a banked power-up on its throw
const ACTIVATE_CHANCE: f64 = 0.5;
/// Frame time the host pretends to render at
const FRAME_DT: f32 = 1.0 / 60.0;
/// Give up on a match that hasn't ended after this many frames
const MAX_FRAMES: u32 = 500_000;
const DEFAULT_SEED: u64 = 12345;

/// Host state: the engine plus everything the engine doesn't own
struct Game {
    machine: MatchStateMachine<EventBus>,
    rng: Pcg32,
    accumulator: f32,
    input: TickInput,
    /// Pairs overlapping after the previous step (contacts fire on first touch)
    touching: Vec<(u32, u32)>,
}

impl Game {
    fn new(config: MatchConfig, seed: u64) -> Result<Self, ConfigError> {
        let mut bus = EventBus::new();
        bus.subscribe(Channel::Scoring, 0, |event| {
            if let MatchEvent::EndScored(result) = event {
                log::info!(
                    "[hud] end {} -> {:?} +{}",
                    result.end,
                    result.scoring_team,
                    result.points
                );
            }
        });
        bus.subscribe(Channel::Collision, 0, |event| {
            if let MatchEvent::ArcadePush {
                striker,
                struck,
                super_strength,
                ..
            } = event
            {
                log::info!(
                    "[fx] stone {striker} hit stone {struck}{}",
                    if *super_strength { " with SUPER STRENGTH" } else { "" }
                );
            }
        });
        bus.subscribe(Channel::PowerUp, 0, |event| log::debug!("[hud] {event:?}"));

        Ok(Self {
            machine: MatchStateMachine::new(config, bus)?,
            rng: Pcg32::seed_from_u64(seed),
            accumulator: 0.0,
            input: TickInput::default(),
            touching: Vec::new(),
        })
    }

    /// Run simulation ticks for one frame
    fn update(&mut self, dt: f32) {
        let dt = dt.min(0.1);
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.drive_bot();

            let (samples, contacts) = self.step_sheet(SIM_DT);
            self.input.samples = samples;
            self.input.contacts = contacts;
            self.machine.tick(&self.input, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;

            // Clear one-shot inputs after processing
            self.input = TickInput::default();
        }
    }

    /// Queue the bot's commands for the next tick
    fn drive_bot(&mut self) {
        match self.machine.phase() {
            GamePhase::BetweenEnds => self.input.advance_end = true,
            GamePhase::Aiming if self.machine.can_launch() => {
                let Some(stone_id) = self.machine.active_stone_id() else {
                    return;
                };
                let team = self.machine.current_team();

                if self.rng.random_bool(PICKUP_CHANCE) {
                    self.input.pickups.push((PowerUpKind::SuperStrength, team));
                }
                let banked = self.machine.bank(team).len() + self.input.pickups.len();
                if banked > 0 && self.rng.random_bool(ACTIVATE_CHANCE) {
                    self.input.activate = Some((team, 0));
                }

                // Aim roughly at the button with a little wobble
                let config = self.machine.config();
                let to_house = config.zone.center - config.spawn_point;
                let wobble = self.rng.random_range(-0.04f32..0.04);
                let direction = Vec2::from_angle(wobble).rotate(to_house.normalize_or(Vec2::X));
                let force = self.rng.random_range(11.3f32..12.7);

                self.input.launch = Some(LaunchCommand {
                    stone_id,
                    direction,
                    force,
                });
            }
            _ => {}
        }
    }

    /// Move every stone one step and report contacts that just began
    fn step_sheet(&mut self, dt: f32) -> (Vec<StoneSample>, Vec<Contact>) {
        let samples: Vec<StoneSample> = self
            .machine
            .stones()
            .iter()
            .map(|stone| {
                let speed = stone.vel.length();
                let new_speed = (speed - FRICTION_DECEL * dt).max(0.0);
                let vel = stone.vel.normalize_or_zero() * new_speed;
                StoneSample {
                    stone_id: stone.id,
                    pos: stone.pos + stone.vel * dt,
                    vel,
                    angular_vel: 0.0,
                }
            })
            .collect();

        let radius = self.machine.config().stone_radius;
        let mut now_touching = Vec::new();
        let mut contacts = Vec::new();
        for (i, a) in samples.iter().enumerate() {
            for b in &samples[i + 1..] {
                if !stones_overlap(a.pos, b.pos, radius) {
                    continue;
                }
                let key = (a.stone_id.min(b.stone_id), a.stone_id.max(b.stone_id));
                if !self.touching.contains(&key) {
                    contacts.push(Contact {
                        a: a.stone_id,
                        b: b.stone_id,
                        point: (a.pos + b.pos) * 0.5,
                    });
                }
                now_touching.push(key);
            }
        }
        self.touching = now_touching;

        (samples, contacts)
    }
}

fn run() -> Result<(), ConfigError> {
    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => MatchConfig::load(path)?,
        None => MatchConfig::default(),
    };
    let seed = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_SEED);

    let mut game = Game::new(config, seed)?;
    log::info!("Match initialized with seed: {seed}");

    let mut frames = 0;
    while game.machine.phase() != GamePhase::GameOver && frames < MAX_FRAMES {
        game.update(FRAME_DT);
        frames += 1;
    }

    match game.machine.winner() {
        Some(MatchOutcome::Winner(team)) => log::info!("{team} wins after {frames} frames"),
        Some(MatchOutcome::Tie) => log::info!("Tie after {frames} frames"),
        None => log::warn!("Match still running after {frames} frames, stopping"),
    }

    match serde_json::to_string_pretty(game.machine.state()) {
        Ok(json) => println!("{json}"),
        Err(e) => log::warn!("Could not serialize final state: {e}"),
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Stone Slide (headless) starting...");

    if let Err(e) = run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}
