//! Per-agent engagement state machine.
//!
//! ```text
//!            candidate              close / reach roll
//!   Idle ──────────────▶ Engaging ─────────────────────▶ Attacking
//!    ▲                     │  ▲ ◀──── out of close range ───┘
//!    │                     │  └──── target stops attacking ──┐
//!    │     incoming attack │                                 │
//!    │     + block roll    └───────────────────────────────▶ Blocking
//!    │
//!    └── disengage timer ── Disengaging ◀── leash broken twice / low health
//! ```
//!
//! The machine is evaluated once per `evaluation_interval_secs`, not every
//! tick. The world feeds it a [`CombatContext`] built from memory, the
//! selector and the pawn state; the machine answers with [`Intent`]s for
//! the external combat and animation layer. Missing data never errors: a
//! vanished target or a dead pawn drops the machine back to `Idle`.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::CombatConfig;
use crate::schedule::{Scheduler, TimerHandle};
use crate::squad::{FormationSlot, TeamRole};
use crate::types::EntityId;

// ---------------------------------------------------------------------------
// States & intents
// ---------------------------------------------------------------------------

/// Engagement state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CombatState {
    /// No target.
    #[default]
    Idle,
    /// Target acquired, closing in.
    Engaging,
    /// Swinging or shooting.
    Attacking,
    /// Guarding against the target's attack.
    Blocking,
    /// Breaking off; returns to `Idle` when the disengage timer fires.
    Disengaging,
}

/// How an attack is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackStyle {
    /// Ordinary melee swing.
    Close,
    /// Slow swing that breaks a raised guard.
    Heavy,
    /// Running attack from outside close range.
    Charge,
    /// Shot or cast from range.
    Ranged,
}

/// Which way to dodge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DodgeDirection {
    /// Sidestep left.
    Left,
    /// Sidestep right.
    Right,
    /// Hop back.
    Back,
}

/// A high-level instruction for the combat/animation layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Intent {
    /// Move towards the target.
    Pursue {
        /// Who to chase.
        target: EntityId,
    },
    /// Attack the target.
    Attack {
        /// Who to hit.
        target: EntityId,
        /// How.
        style: AttackStyle,
    },
    /// Raise a guard against the target.
    Block {
        /// Whose attack to block.
        target: EntityId,
    },
    /// Evade an incoming attack.
    Dodge {
        /// Direction of the evasion.
        direction: DodgeDirection,
    },
    /// Circle to a formation wing around the target.
    Flank {
        /// Who to flank.
        target: EntityId,
        /// Which wing.
        side: FormationSlot,
    },
    /// Run away from the target.
    Flee {
        /// Who to run from.
        from: EntityId,
    },
    /// Stop chasing the target and head home.
    Disengage {
        /// Who was being chased.
        from: EntityId,
    },
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// What the agent currently observes about its target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetView {
    /// The target.
    pub entity: EntityId,
    /// Distance from the agent.
    pub distance: f32,
    /// Whether the target is mid-attack.
    pub is_attacking: bool,
    /// Whether the target is guarding.
    pub is_blocking: bool,
    /// How squarely the target faces the agent, in `[-1, 1]`.
    pub facing_alignment: f32,
}

/// Inputs for one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombatContext {
    /// What the selector would pick right now.
    pub candidate: Option<EntityId>,
    /// The current target as observed, `None` if it vanished.
    pub target: Option<TargetView>,
    /// Distance from the agent's home anchor, if it has one.
    pub home_distance: Option<f32>,
    /// The agent's own remaining health fraction.
    pub health_fraction: f32,
    /// Whether the agent's pawn is alive.
    pub alive: bool,
    /// The agent's formation slot.
    pub formation: Option<FormationSlot>,
}

impl Default for CombatContext {
    fn default() -> Self {
        Self {
            candidate: None,
            target: None,
            home_distance: None,
            health_fraction: 1.0,
            alive: true,
            formation: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Role profiles
// ---------------------------------------------------------------------------

/// Role-specific distances and attack odds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoleProfile {
    /// Distance under which a close attack is always chosen.
    pub close_range: f32,
    /// Maximum distance for the reach attack.
    pub reach: f32,
    /// Reach-attack chance right at close range; falls linearly to 0 at `reach`.
    pub reach_chance: f32,
    /// Style of the reach attack.
    pub reach_style: AttackStyle,
    /// Whether the role circles to its formation wing while closing in.
    pub flanks: bool,
}

impl RoleProfile {
    /// Stock profile for a team role.
    #[must_use]
    pub fn for_role(role: TeamRole) -> Self {
        match role {
            _ if role.is_ranged() => Self {
                close_range: 150.0,
                reach: 2000.0,
                reach_chance: 0.75,
                reach_style: AttackStyle::Ranged,
                flanks: role.is_flank(),
            },
            TeamRole::AttackMelee1h => Self::melee(150.0, 800.0, 0.35, false),
            TeamRole::AttackMelee2h => Self::melee(180.0, 800.0, 0.25, false),
            TeamRole::FlankMelee => Self::melee(150.0, 600.0, 0.2, true),
            _ => Self::melee(150.0, 500.0, 0.2, false),
        }
    }

    fn melee(close_range: f32, reach: f32, reach_chance: f32, flanks: bool) -> Self {
        Self { close_range, reach, reach_chance, reach_style: AttackStyle::Charge, flanks }
    }

    /// Chance of a reach attack at `distance`.
    #[must_use]
    pub fn reach_probability(&self, distance: f32) -> f32 {
        if distance <= self.close_range || distance >= self.reach {
            return 0.0;
        }
        let span = (self.reach - self.close_range).max(f32::EPSILON);
        (self.reach_chance * (1.0 - (distance - self.close_range) / span)).clamp(0.0, self.reach_chance)
    }
}

// ---------------------------------------------------------------------------
// Machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CombatTimer {
    DisengageDone,
    ReselectAllowed,
    RetargetAllowed,
}

/// Why the agent is breaking off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisengageCause {
    /// The target slipped the leash.
    Leash,
    /// The agent is too hurt to fight.
    Flight,
}

/// Per-agent engagement state.
#[derive(Debug, Clone)]
pub struct CombatMachine {
    state: CombatState,
    target: Option<EntityId>,
    profile: RoleProfile,
    config: CombatConfig,
    timers: Scheduler<CombatTimer>,
    since_evaluation: f32,
    leash_strikes: u32,
    disengage: Option<TimerHandle>,
    reselect_block: Option<TimerHandle>,
    retarget_lock: Option<TimerHandle>,
}

impl CombatMachine {
    /// An idle machine for an agent with the given role.
    #[must_use]
    pub fn new(role: TeamRole, config: CombatConfig) -> Self {
        Self {
            state: CombatState::Idle,
            target: None,
            profile: RoleProfile::for_role(role),
            config,
            timers: Scheduler::new(),
            since_evaluation: 0.0,
            leash_strikes: 0,
            disengage: None,
            reselect_block: None,
            retarget_lock: None,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> CombatState {
        self.state
    }

    /// Current target.
    #[must_use]
    pub fn target(&self) -> Option<EntityId> {
        self.target
    }

    /// Active role profile.
    #[must_use]
    pub fn profile(&self) -> &RoleProfile {
        &self.profile
    }

    /// Swap the role profile, e.g. after a role reassignment.
    pub fn set_role(&mut self, role: TeamRole) {
        self.profile = RoleProfile::for_role(role);
    }

    /// Whether the selector's answer would be used right now.
    #[must_use]
    pub fn wants_candidate(&self) -> bool {
        match self.state {
            CombatState::Idle => self.reselect_block.is_none(),
            CombatState::Disengaging => false,
            _ => self.retarget_lock.is_none(),
        }
    }

    /// Whether reselection is blocked after a disengage.
    #[must_use]
    pub fn on_cooldown(&self) -> bool {
        self.reselect_block.is_some()
    }

    /// Leash length for the given distance from home.
    #[must_use]
    pub fn leash(&self, home_distance: Option<f32>) -> f32 {
        match home_distance {
            Some(d) if d > self.config.far_home_distance => self.config.far_leash,
            Some(d) if d > self.config.mid_home_distance => self.config.sight_radius / 2.0,
            _ => self.config.sight_radius,
        }
    }

    /// Advance timers by `dt`. Returns `true` when an evaluation is due.
    pub fn advance(&mut self, dt: f32) -> bool {
        for (handle, timer) in self.timers.advance(dt) {
            match timer {
                CombatTimer::DisengageDone if self.disengage == Some(handle) => {
                    self.disengage = None;
                    self.target = None;
                    self.leash_strikes = 0;
                    self.set_state(CombatState::Idle);
                }
                CombatTimer::ReselectAllowed if self.reselect_block == Some(handle) => {
                    self.reselect_block = None;
                }
                CombatTimer::RetargetAllowed if self.retarget_lock == Some(handle) => {
                    self.retarget_lock = None;
                }
                _ => {}
            }
        }

        self.since_evaluation += dt.max(0.0);
        if self.since_evaluation >= self.config.evaluation_interval_secs {
            self.since_evaluation -= self.config.evaluation_interval_secs;
            true
        } else {
            false
        }
    }

    /// Re-evaluate the state and return intents for this round.
    pub fn evaluate(&mut self, ctx: &CombatContext, rng: &mut impl Rng) -> Vec<Intent> {
        if !ctx.alive {
            self.reset();
            return Vec::new();
        }
        match self.state {
            CombatState::Disengaging => Vec::new(),
            CombatState::Idle => match ctx.candidate {
                Some(candidate) if self.reselect_block.is_none() => {
                    self.engage(candidate);
                    vec![Intent::Pursue { target: candidate }]
                }
                _ => Vec::new(),
            },
            CombatState::Engaging | CombatState::Attacking | CombatState::Blocking => {
                self.evaluate_engaged(ctx, rng)
            }
        }
    }

    fn evaluate_engaged(&mut self, ctx: &CombatContext, rng: &mut impl Rng) -> Vec<Intent> {
        let Some(view) = ctx.target.filter(|v| Some(v.entity) == self.target) else {
            debug!(target = ?self.target, "Target data missing, dropping to idle");
            self.drop_target();
            return Vec::new();
        };
        let target = view.entity;

        if ctx.health_fraction <= self.config.flee_health_fraction {
            self.begin_disengage(DisengageCause::Flight);
            return vec![Intent::Flee { from: target }];
        }

        if let Some(candidate) = ctx.candidate {
            if candidate != target && self.retarget_lock.is_none() {
                debug!(from = %target, to = %candidate, "Retargeting");
                self.engage(candidate);
                return vec![Intent::Pursue { target: candidate }];
            }
        }

        if view.distance > self.leash(ctx.home_distance) {
            self.leash_strikes += 1;
            if self.leash_strikes >= self.config.leash_strikes {
                self.begin_disengage(DisengageCause::Leash);
                return vec![Intent::Disengage { from: target }];
            }
        } else {
            self.leash_strikes = 0;
        }

        let threatened = view.is_attacking && view.facing_alignment >= self.config.facing_threshold;
        if threatened {
            let roll: f32 = rng.gen_range(0.0..1.0);
            if roll < self.config.block_chance {
                self.set_state(CombatState::Blocking);
                return vec![Intent::Block { target }];
            }
            if roll < self.config.block_chance + self.config.dodge_chance {
                let direction = match rng.gen_range(0..3) {
                    0 => DodgeDirection::Left,
                    1 => DodgeDirection::Right,
                    _ => DodgeDirection::Back,
                };
                self.set_state(CombatState::Engaging);
                return vec![Intent::Dodge { direction }];
            }
        }

        if view.distance <= self.profile.close_range {
            self.set_state(CombatState::Attacking);
            let style = if view.is_blocking { AttackStyle::Heavy } else { AttackStyle::Close };
            return vec![Intent::Attack { target, style }];
        }

        let roll: f32 = rng.gen_range(0.0..1.0);
        if roll < self.profile.reach_probability(view.distance) {
            self.set_state(CombatState::Attacking);
            return vec![Intent::Attack { target, style: self.profile.reach_style }];
        }

        self.set_state(CombatState::Engaging);
        let mut intents = vec![Intent::Pursue { target }];
        if self.profile.flanks {
            if let Some(side) = ctx.formation {
                intents.push(Intent::Flank { target, side });
            }
        }
        intents
    }

    /// Engage `target` immediately, overriding cooldowns and any disengage.
    pub fn force_engage(&mut self, target: EntityId) -> Vec<Intent> {
        if let Some(h) = self.disengage.take() {
            self.timers.cancel(h);
        }
        if let Some(h) = self.reselect_block.take() {
            self.timers.cancel(h);
        }
        self.engage(target);
        vec![Intent::Pursue { target }]
    }

    /// Forget `entity` if it is the current target. Returns whether it was.
    pub fn on_target_lost(&mut self, entity: EntityId) -> bool {
        if self.target != Some(entity) {
            return false;
        }
        self.drop_target();
        true
    }

    /// Drop everything and go idle, e.g. on death.
    pub fn reset(&mut self) {
        self.timers.clear();
        self.disengage = None;
        self.reselect_block = None;
        self.retarget_lock = None;
        self.target = None;
        self.leash_strikes = 0;
        self.set_state(CombatState::Idle);
    }

    fn engage(&mut self, target: EntityId) {
        if let Some(h) = self.retarget_lock.take() {
            self.timers.cancel(h);
        }
        self.target = Some(target);
        self.leash_strikes = 0;
        self.retarget_lock = Some(self.timers.schedule(self.config.retarget_lock_secs, CombatTimer::RetargetAllowed));
        self.set_state(CombatState::Engaging);
    }

    fn drop_target(&mut self) {
        for h in [self.disengage.take(), self.retarget_lock.take()].into_iter().flatten() {
            self.timers.cancel(h);
        }
        self.target = None;
        self.leash_strikes = 0;
        self.set_state(CombatState::Idle);
    }

    fn begin_disengage(&mut self, cause: DisengageCause) {
        if let Some(h) = self.retarget_lock.take() {
            self.timers.cancel(h);
        }
        if let Some(h) = self.reselect_block.take() {
            self.timers.cancel(h);
        }
        let delay = match cause {
            DisengageCause::Leash => self.config.reselect_after_leash_secs,
            DisengageCause::Flight => self.config.reselect_after_flight_secs,
        };
        self.disengage = Some(self.timers.schedule(self.config.disengage_secs, CombatTimer::DisengageDone));
        self.reselect_block = Some(self.timers.schedule(delay, CombatTimer::ReselectAllowed));
        self.leash_strikes = 0;
        debug!(target = ?self.target, cause = ?cause, reselect_in = delay, "Disengaging");
        self.set_state(CombatState::Disengaging);
    }

    fn set_state(&mut self, next: CombatState) {
        if self.state != next {
            debug!(from = ?self.state, to = ?next, target = ?self.target, "Combat state change");
            self.state = next;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
