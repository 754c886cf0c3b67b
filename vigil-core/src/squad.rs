//! Squad membership, leadership and formation slots.
//!
//! Every agent carries a [`TeamMembership`]: its role, whether it leads,
//! its formation slot and a roster of teammates in join order. Rosters are
//! kept symmetric by the free functions in this module, which take any
//! [`Squad`] lookup (the world implements it over its agents; tests use a
//! plain `HashMap`).
//!
//! Joining merges whole teams: after `join(a, b)` every member of `a`'s
//! team lists every member of `b`'s team and vice versa.

use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::memory::EntitySnapshot;
use crate::types::{EntityId, Location};

// ---------------------------------------------------------------------------
// Roles & slots
// ---------------------------------------------------------------------------

/// What an agent does for its team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TeamRole {
    /// Not assigned.
    #[default]
    NoRole,
    /// Front-line one-handed melee.
    AttackMelee1h,
    /// Front-line two-handed melee.
    AttackMelee2h,
    /// Front-line archer or caster.
    AttackRanged,
    /// Melee on the wings.
    FlankMelee,
    /// Ranged on the wings.
    FlankRanged,
    /// Sets structures alight.
    Arsonist,
}

impl TeamRole {
    /// Only melee attackers may be elected leader.
    #[must_use]
    pub fn is_leader_eligible(self) -> bool {
        matches!(self, Self::AttackMelee1h | Self::AttackMelee2h)
    }

    /// Wing roles.
    #[must_use]
    pub fn is_flank(self) -> bool {
        matches!(self, Self::FlankMelee | Self::FlankRanged)
    }

    /// Front-line roles.
    #[must_use]
    pub fn is_attack(self) -> bool {
        matches!(self, Self::AttackMelee1h | Self::AttackMelee2h | Self::AttackRanged)
    }

    /// Roles that prefer to fight from range.
    #[must_use]
    pub fn is_ranged(self) -> bool {
        matches!(self, Self::AttackRanged | Self::FlankRanged)
    }
}

/// Position relative to the squad leader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormationSlot {
    /// Left wing.
    Left,
    /// Right wing.
    Right,
    /// Front, left of centre.
    CentreLeft,
    /// Front, right of centre.
    CentreRight,
}

/// Default role mix for a squad of `count`: even slots attack, odd slots flank.
#[must_use]
pub fn generate_team_roles(count: usize) -> Vec<TeamRole> {
    (0..count)
        .map(|i| if i % 2 == 0 { TeamRole::AttackMelee1h } else { TeamRole::FlankMelee })
        .collect()
}

// ---------------------------------------------------------------------------
// Membership
// ---------------------------------------------------------------------------

/// One agent's view of its team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMembership {
    member: EntityId,
    role: TeamRole,
    is_leader: bool,
    slot: Option<FormationSlot>,
    roster: Vec<EntityId>,
    position: Location,
    teammates: HashMap<EntityId, EntitySnapshot>,
}

impl TeamMembership {
    /// A teamless member with the given role.
    #[must_use]
    pub fn new(member: EntityId, role: TeamRole) -> Self {
        Self {
            member,
            role,
            is_leader: false,
            slot: None,
            roster: Vec::new(),
            position: Location::default(),
            teammates: HashMap::new(),
        }
    }

    /// The agent this membership belongs to.
    #[must_use]
    pub fn member(&self) -> EntityId {
        self.member
    }

    /// Current role.
    #[must_use]
    pub fn role(&self) -> TeamRole {
        self.role
    }

    /// Change role. Clears the formation slot, which depends on it.
    pub fn set_role(&mut self, role: TeamRole) {
        if self.role != role {
            self.role = role;
            self.slot = None;
        }
    }

    /// Whether this member leads its team.
    #[must_use]
    pub fn is_leader(&self) -> bool {
        self.is_leader
    }

    /// Assigned formation slot.
    #[must_use]
    pub fn slot(&self) -> Option<FormationSlot> {
        self.slot
    }

    /// Teammates in join order, excluding self.
    #[must_use]
    pub fn roster(&self) -> &[EntityId] {
        &self.roster
    }

    /// Whether `other` is a teammate.
    #[must_use]
    pub fn has_teammate(&self, other: EntityId) -> bool {
        self.roster.contains(&other)
    }

    /// Own last-known position.
    #[must_use]
    pub fn position(&self) -> Location {
        self.position
    }

    /// Update own position.
    pub fn set_position(&mut self, position: Location) {
        self.position = position;
    }

    /// Cache a teammate's pushed snapshot. Ignored for non-teammates.
    pub fn update_teammate(&mut self, snapshot: EntitySnapshot) -> bool {
        if !self.has_teammate(snapshot.entity) {
            return false;
        }
        self.teammates.insert(snapshot.entity, snapshot);
        true
    }

    /// Last-known snapshot of a teammate.
    #[must_use]
    pub fn teammate(&self, id: EntityId) -> Option<&EntitySnapshot> {
        self.teammates.get(&id)
    }

    fn link(&mut self, other: EntityId) -> bool {
        if other == self.member || self.roster.contains(&other) {
            return false;
        }
        self.roster.push(other);
        true
    }

    fn unlink(&mut self, other: EntityId) -> bool {
        self.teammates.remove(&other);
        let before = self.roster.len();
        self.roster.retain(|r| *r != other);
        before != self.roster.len()
    }
}

/// Lookup over every membership in the world.
pub trait Squad {
    /// Read a member's membership.
    fn membership(&self, id: EntityId) -> Option<&TeamMembership>;
    /// Mutate a member's membership.
    fn membership_mut(&mut self, id: EntityId) -> Option<&mut TeamMembership>;
}

impl Squad for HashMap<EntityId, TeamMembership> {
    fn membership(&self, id: EntityId) -> Option<&TeamMembership> {
        self.get(&id)
    }

    fn membership_mut(&mut self, id: EntityId) -> Option<&mut TeamMembership> {
        self.get_mut(&id)
    }
}

// ---------------------------------------------------------------------------
// Team protocol
// ---------------------------------------------------------------------------

/// `id` followed by its roster, or empty for unknown ids.
fn team_of(squad: &impl Squad, id: EntityId) -> Vec<EntityId> {
    squad
        .membership(id)
        .map(|m| std::iter::once(id).chain(m.roster.iter().copied()).collect())
        .unwrap_or_default()
}

fn leader_among(squad: &impl Squad, team: &[EntityId]) -> Option<EntityId> {
    team.iter()
        .copied()
        .find(|id| squad.membership(*id).is_some_and(TeamMembership::is_leader))
}

/// Link `a`'s team with `b`'s team. Returns whether any link was new.
///
/// If the merged team is leaderless the first eligible member (from `a`'s
/// side first) is elected. If both sides already had leaders, `b`'s keeps
/// the role.
pub fn join(squad: &mut impl Squad, a: EntityId, b: EntityId) -> bool {
    if a == b || squad.membership(a).is_none() || squad.membership(b).is_none() {
        return false;
    }
    let team_a = team_of(squad, a);
    let team_b = team_of(squad, b);

    let mut linked = false;
    for &x in &team_a {
        for &y in &team_b {
            if let Some(m) = squad.membership_mut(x) {
                linked |= m.link(y);
            }
            if let Some(m) = squad.membership_mut(y) {
                linked |= m.link(x);
            }
        }
    }

    let merged: Vec<EntityId> = team_a.iter().chain(team_b.iter()).copied().collect();
    match (leader_among(squad, &team_a), leader_among(squad, &team_b)) {
        (Some(la), Some(lb)) if la != lb => {
            if let Some(m) = squad.membership_mut(la) {
                m.is_leader = false;
            }
            info!(kept = %lb, stepped_down = %la, "Teams merged under one leader");
        }
        (None, None) => {
            let eligible = merged
                .iter()
                .copied()
                .find(|id| squad.membership(*id).is_some_and(|m| m.role.is_leader_eligible()));
            if let Some(leader) = eligible {
                if let Some(m) = squad.membership_mut(leader) {
                    m.is_leader = true;
                }
                info!(leader = %leader, "Team leader elected");
            }
        }
        _ => {}
    }
    linked
}

/// Break the link between `a` and `b` on both sides.
pub fn remove_teammate(squad: &mut impl Squad, a: EntityId, b: EntityId) -> bool {
    let mut removed = false;
    if let Some(m) = squad.membership_mut(a) {
        removed |= m.unlink(b);
    }
    if let Some(m) = squad.membership_mut(b) {
        removed |= m.unlink(a);
    }
    removed
}

/// Remove `a` from every teammate's roster and clear its own team state.
pub fn leave(squad: &mut impl Squad, a: EntityId) {
    let roster = squad.membership(a).map(|m| m.roster.clone()).unwrap_or_default();
    for other in roster {
        remove_teammate(squad, a, other);
    }
    if let Some(m) = squad.membership_mut(a) {
        if m.is_leader {
            info!(leader = %a, "Team leader left");
        }
        m.is_leader = false;
        m.slot = None;
    }
}

/// The leader of `a`'s team, possibly `a` itself.
#[must_use]
pub fn leader_of(squad: &impl Squad, a: EntityId) -> Option<EntityId> {
    leader_among(squad, &team_of(squad, a))
}

/// Whether anyone in `a`'s team leads it.
#[must_use]
pub fn team_has_leader(squad: &impl Squad, a: EntityId) -> bool {
    leader_of(squad, a).is_some()
}

/// Who becomes leader in [`set_leader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeaderPick {
    /// The caller.
    Caller,
    /// A uniformly random member of the caller's team.
    Random,
}

/// Make someone in `a`'s team leader.
///
/// Without `override_existing` this is a no-op when the team already has a
/// leader. With it, every member's flag is cleared first. Returns the new
/// leader.
pub fn set_leader(
    squad: &mut impl Squad,
    a: EntityId,
    override_existing: bool,
    pick: LeaderPick,
    rng: &mut impl Rng,
) -> Option<EntityId> {
    let team = team_of(squad, a);
    if team.is_empty() {
        return None;
    }
    if !override_existing && leader_among(squad, &team).is_some() {
        return None;
    }
    for id in &team {
        if let Some(m) = squad.membership_mut(*id) {
            m.is_leader = false;
        }
    }
    let leader = match pick {
        LeaderPick::Caller => a,
        LeaderPick::Random => team[rng.gen_range(0..team.len())],
    };
    if let Some(m) = squad.membership_mut(leader) {
        m.is_leader = true;
    }
    info!(leader = %leader, overridden = override_existing, "Team leader set");
    Some(leader)
}

/// Hand out formation slots. Only the leader may call this.
///
/// Walking the leader's roster in join order, flank roles alternate
/// Left/Right and attack roles alternate CentreLeft/CentreRight. Other
/// roles get no slot.
pub fn assign_formation_slots(squad: &mut impl Squad, leader: EntityId) -> Vec<(EntityId, FormationSlot)> {
    let Some(roster) = squad
        .membership(leader)
        .filter(|m| m.is_leader)
        .map(|m| m.roster.clone())
    else {
        return Vec::new();
    };

    let mut next_flank = FormationSlot::Left;
    let mut next_attack = FormationSlot::CentreLeft;
    let mut assigned = Vec::new();
    for id in roster {
        let Some(m) = squad.membership_mut(id) else { continue };
        m.slot = if m.role.is_flank() {
            let slot = next_flank;
            next_flank = if slot == FormationSlot::Left { FormationSlot::Right } else { FormationSlot::Left };
            Some(slot)
        } else if m.role.is_attack() {
            let slot = next_attack;
            next_attack = if slot == FormationSlot::CentreLeft {
                FormationSlot::CentreRight
            } else {
                FormationSlot::CentreLeft
            };
            Some(slot)
        } else {
            None
        };
        if let Some(slot) = m.slot {
            assigned.push((id, slot));
        }
    }
    assigned
}

/// The member of `a`'s team whose last-known position is nearest `point`.
#[must_use]
pub fn nearest_teammate_to(squad: &impl Squad, a: EntityId, point: &Location, include_self: bool) -> Option<EntityId> {
    let m = squad.membership(a)?;
    let own = include_self.then_some((a, m.position));
    let others = m
        .roster
        .iter()
        .filter_map(|id| m.teammates.get(id).map(|s| (*id, s.location)));

    own.into_iter()
        .chain(others)
        .min_by(|x, y| x.1.distance(point).total_cmp(&y.1.distance(point)))
        .map(|(id, _)| id)
}

/// Sum of teammates' last-known health.
#[must_use]
pub fn team_health(squad: &impl Squad, a: EntityId) -> f32 {
    squad
        .membership(a)
        .map_or(0.0, |m| m.teammates.values().fold(0.0, |sum, s| sum + s.remaining_health))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
