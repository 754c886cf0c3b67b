//! Whole-world scenarios: perception, provocation, death, squads and scans
//! driven through the public `World` API only.

use vigil_core::buildings::{BuildingRecord, Material};
use vigil_core::combat::{AttackStyle, CombatState, Intent};
use vigil_core::error::VigilError;
use vigil_core::selection::Personality;
use vigil_core::squad::TeamRole;
use vigil_core::threat::Provocation;
use vigil_core::types::{EntityId, Faction, Location};
use vigil_world::hooks::SpatialQuery;
use vigil_world::{AgentSpawn, Body, World, WorldEvent};

const ORCS: Faction = Faction(1);
const HUMANS: Faction = Faction(2);

fn id(raw: u128) -> EntityId {
    EntityId::from_raw(raw)
}

fn at(x: f32) -> Location {
    Location::new(x, 0.0, 0.0)
}

fn spawn(world: &mut World, raw: u128, faction: Faction, x: f32, role: TeamRole) -> EntityId {
    let agent = id(raw);
    world
        .spawn_agent(agent, AgentSpawn::new(Body::new(faction, at(x)), Personality::Goblin, role))
        .expect("spawn agent");
    agent
}

fn actor(world: &mut World, raw: u128, faction: Faction, x: f32, health: f32) -> EntityId {
    let actor = id(raw);
    world
        .register_actor(actor, Body::new(faction, at(x)).with_health(health, 100.0))
        .expect("register actor");
    actor
}

fn intents_for(events: &[WorldEvent], agent: EntityId) -> Vec<Intent> {
    events
        .iter()
        .filter_map(|e| match e {
            WorldEvent::Intent { agent: a, intent } if *a == agent => Some(*intent),
            _ => None,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Selection through perception
// ---------------------------------------------------------------------------

#[test]
fn goblin_goes_for_the_weak_close_enemy() {
    let mut world = World::default();
    let goblin = spawn(&mut world, 1, ORCS, 0.0, TeamRole::AttackMelee1h);
    let weak = actor(&mut world, 2, HUMANS, 300.0, 20.0);
    let strong = actor(&mut world, 3, HUMANS, 900.0, 90.0);

    world.report_visible_actors(goblin, &[weak, strong]).expect("perceive");
    world.step(1.0);

    assert_eq!(world.current_target(goblin), Some(weak));
    let events = world.drain_events();
    assert!(events.contains(&WorldEvent::StateChanged {
        agent: goblin,
        from: CombatState::Idle,
        to: CombatState::Engaging,
    }));
    assert!(intents_for(&events, goblin).contains(&Intent::Pursue { target: weak }));
}

#[test]
fn friendly_and_stale_ids_are_ignored() {
    let mut world = World::default();
    let goblin = spawn(&mut world, 1, ORCS, 0.0, TeamRole::AttackMelee1h);
    let friend = actor(&mut world, 2, ORCS, 50.0, 100.0);
    let enemy = actor(&mut world, 3, HUMANS, 50.0, 100.0);

    world
        .report_visible_actors(goblin, &[friend, id(77), goblin, enemy, enemy])
        .expect("perceive");
    let memory = world.agent(goblin).expect("agent").memory();
    assert_eq!(memory.len(), 1);
    assert!(memory.contains(enemy));

    world.report_visible_actors(goblin, &[]).expect("empty report");
    let memory = world.agent(goblin).expect("agent").memory();
    assert!(memory.records().iter().all(|r| !r.is_currently_perceived));
}

#[test]
fn memory_caps_at_ten() {
    let mut world = World::default();
    let goblin = spawn(&mut world, 1, ORCS, 0.0, TeamRole::AttackMelee1h);
    let crowd: Vec<EntityId> = (10..22)
        .map(|raw| actor(&mut world, raw, HUMANS, raw as f32 * 20.0, 100.0))
        .collect();

    world.report_visible_actors(goblin, &crowd).expect("perceive");
    assert_eq!(world.agent(goblin).expect("agent").memory().len(), 10);
}

#[test]
fn full_memory_evicts_what_went_out_of_sight() {
    let mut world = World::default();
    let goblin = spawn(&mut world, 1, ORCS, 0.0, TeamRole::AttackMelee1h);
    let crowd: Vec<EntityId> = (1..=10)
        .map(|i| actor(&mut world, 10 + i, HUMANS, i as f32 * 100.0, 100.0))
        .collect();
    world.report_visible_actors(goblin, &crowd).expect("perceive");
    world.step(1.0);

    let farthest = crowd[9];
    let newcomer = actor(&mut world, 50, HUMANS, 50.0, 100.0);
    world.report_visible_actors(goblin, &[farthest, newcomer]).expect("perceive");

    let memory = world.agent(goblin).expect("agent").memory();
    assert_eq!(memory.len(), 10);
    assert!(memory.contains(farthest));
    assert!(memory.contains(newcomer));
    assert!(!memory.contains(crowd[0]));
}

#[test]
fn combat_mode_entered_shortly_after_first_sighting() {
    let mut world = World::default();
    let goblin = spawn(&mut world, 1, ORCS, 0.0, TeamRole::AttackMelee1h);
    let enemy = actor(&mut world, 2, HUMANS, 400.0, 100.0);

    world.report_visible_actors(goblin, &[enemy]).expect("perceive");
    assert!(!world.agent(goblin).expect("agent").in_combat_mode());
    world.step(0.25);
    assert!(world.agent(goblin).expect("agent").in_combat_mode());
    assert!(world.drain_events().contains(&WorldEvent::CombatModeEntered { agent: goblin }));
}

// ---------------------------------------------------------------------------
// Decay & tethers
// ---------------------------------------------------------------------------

#[test]
fn unseen_enemy_forgotten_after_horizon_and_tether_dropped() {
    let mut world = World::default();
    let goblin = spawn(&mut world, 1, ORCS, 0.0, TeamRole::AttackMelee1h);
    let knight = spawn(&mut world, 2, HUMANS, 300.0, TeamRole::AttackMelee2h);

    world.report_visible_actors(goblin, &[knight]).expect("perceive");
    assert!(world.agent(knight).expect("agent").memory().is_tethered(goblin));
    world.report_visible_actors(goblin, &[]).expect("lost sight");

    for _ in 0..59 {
        world.step(1.0);
    }
    assert!(world.agent(goblin).expect("agent").memory().contains(knight));

    world.step(1.0);
    world.step(1.0);
    assert!(!world.agent(goblin).expect("agent").memory().contains(knight));
    assert!(!world.agent(knight).expect("agent").memory().is_tethered(goblin));
    assert_eq!(world.current_target(goblin), None);
}

#[test]
fn forgetting_an_enemy_keeps_pushing_to_it() {
    let mut world = World::default();
    let goblin = spawn(&mut world, 1, ORCS, 0.0, TeamRole::AttackMelee1h);
    let knight = spawn(&mut world, 2, HUMANS, 300.0, TeamRole::AttackMelee1h);

    world.report_visible_actors(goblin, &[knight]).expect("perceive");
    world.report_visible_actors(goblin, &[]).expect("lost sight");
    for _ in 0..30 {
        world.step(1.0);
    }
    world.report_visible_actors(knight, &[goblin]).expect("glimpse");
    world.report_visible_actors(knight, &[]).expect("lost sight");
    for _ in 0..31 {
        world.step(1.0);
    }
    assert!(!world.agent(goblin).expect("agent").memory().contains(knight));
    assert!(world.agent(knight).expect("agent").memory().contains(goblin));

    world.body_mut(goblin).expect("body").location = at(800.0);
    world.step(0.5);

    assert!(world.agent(goblin).expect("agent").memory().is_tethered(knight));
    let record = world.agent(knight).expect("agent").memory().record(goblin).expect("remembered");
    assert!((record.last_seen_location.x - 800.0).abs() < f32::EPSILON);
}

#[test]
fn tethered_agents_notice_each_other_nearby() {
    let mut world = World::default();
    let goblin = spawn(&mut world, 1, ORCS, 0.0, TeamRole::AttackMelee1h);
    let knight = spawn(&mut world, 2, HUMANS, 50.0, TeamRole::AttackMelee1h);

    world.report_visible_actors(goblin, &[knight]).expect("perceive");
    world.step(0.5);
    let events = world.drain_events();
    assert!(events.contains(&WorldEvent::Nearby { agent: goblin, other: knight }));
    assert!(events.contains(&WorldEvent::Nearby { agent: knight, other: goblin }));

    // Edge-triggered: staying close does not repeat the notice.
    world.step(0.5);
    assert!(!world.drain_events().iter().any(|e| matches!(e, WorldEvent::Nearby { .. })));
}

#[test]
fn tether_keeps_remembered_position_current() {
    let mut world = World::default();
    let goblin = spawn(&mut world, 1, ORCS, 0.0, TeamRole::AttackMelee1h);
    let knight = spawn(&mut world, 2, HUMANS, 300.0, TeamRole::AttackMelee1h);

    world.report_visible_actors(goblin, &[knight]).expect("perceive");
    world.report_visible_actors(goblin, &[]).expect("lost sight");
    world.body_mut(knight).expect("body").location = at(600.0);
    world.step(0.5);

    let record = world.agent(goblin).expect("agent").memory().record(knight).expect("remembered");
    assert!((record.last_seen_location.x - 600.0).abs() < f32::EPSILON);
    assert!(!record.is_currently_perceived);
}

// ---------------------------------------------------------------------------
// Provocation
// ---------------------------------------------------------------------------

#[test]
fn heavy_hit_from_unknown_source_forces_engagement_once() {
    let mut world = World::default();
    let goblin = spawn(&mut world, 1, ORCS, 0.0, TeamRole::AttackMelee1h);
    let archer = actor(&mut world, 2, HUMANS, 700.0, 100.0);

    let outcome = world.notify_damaged(goblin, archer, 60.0).expect("damage");
    assert_eq!(outcome, Provocation::ForceEngage);
    assert_eq!(world.current_target(goblin), Some(archer));
    assert_eq!(world.combat_state(goblin), Some(CombatState::Engaging));
    assert!(world.agent(goblin).expect("agent").memory().contains(archer));

    assert_eq!(world.notify_damaged(goblin, archer, 60.0).expect("damage"), Provocation::Suppressed);
}

#[test]
fn light_hit_on_idle_agent_triggers_retaliation() {
    let mut world = World::default();
    let goblin = spawn(&mut world, 1, ORCS, 0.0, TeamRole::AttackMelee1h);
    let thief = actor(&mut world, 2, HUMANS, 100.0, 100.0);

    assert_eq!(world.notify_damaged(goblin, thief, 5.0).expect("damage"), Provocation::Recorded);
    assert_eq!(world.current_target(goblin), Some(thief));
    assert!(intents_for(&world.drain_events(), goblin).contains(&Intent::Pursue { target: thief }));
}

#[test]
fn taunt_without_damage_does_not_retaliate() {
    let mut world = World::default();
    let goblin = spawn(&mut world, 1, ORCS, 0.0, TeamRole::AttackMelee1h);
    let bard = actor(&mut world, 2, HUMANS, 100.0, 100.0);

    assert_eq!(world.notify_aggro(goblin, bard, 5.0).expect("aggro"), Provocation::Recorded);
    assert_eq!(world.current_target(goblin), None);
    assert_eq!(world.notify_aggro(goblin, bard, 30.0).expect("aggro"), Provocation::ForceEngage);
    assert_eq!(world.current_target(goblin), Some(bard));
}

#[test]
fn distant_target_breaks_the_leash() {
    let mut world = World::default();
    let goblin = spawn(&mut world, 1, ORCS, 0.0, TeamRole::AttackMelee1h);
    let archer = actor(&mut world, 2, HUMANS, 1200.0, 100.0);

    world.notify_damaged(goblin, archer, 5.0).expect("damage");
    world.step(1.0);
    assert_eq!(world.combat_state(goblin), Some(CombatState::Engaging));
    world.step(1.0);
    assert_eq!(world.combat_state(goblin), Some(CombatState::Disengaging));
    assert!(intents_for(&world.drain_events(), goblin).contains(&Intent::Disengage { from: archer }));

    world.step(1.0);
    assert_eq!(world.combat_state(goblin), Some(CombatState::Idle));
    assert_eq!(world.current_target(goblin), None);
    assert!(world.agent(goblin).expect("agent").combat().on_cooldown());
}

// ---------------------------------------------------------------------------
// Death
// ---------------------------------------------------------------------------

#[test]
fn killing_an_enemy_purges_it_everywhere() {
    let mut world = World::default();
    let goblin = spawn(&mut world, 1, ORCS, 0.0, TeamRole::AttackMelee1h);
    let hero = actor(&mut world, 2, HUMANS, 100.0, 100.0);

    world.report_visible_actors(goblin, &[hero]).expect("perceive");
    world.step(1.0);
    assert_eq!(world.current_target(goblin), Some(hero));

    world.kill(hero).expect("kill");
    let agent = world.agent(goblin).expect("agent");
    assert!(!agent.memory().contains(hero));
    assert!(agent.threat().entry(hero).is_none());
    assert_eq!(world.current_target(goblin), None);
    assert_eq!(world.combat_state(goblin), Some(CombatState::Idle));
    assert!(world.drain_events().contains(&WorldEvent::EnemyDead { agent: goblin, enemy: hero }));
}

#[test]
fn host_reported_death_is_reaped_on_step() {
    let mut world = World::default();
    let goblin = spawn(&mut world, 1, ORCS, 0.0, TeamRole::AttackMelee1h);
    let hero = actor(&mut world, 2, HUMANS, 100.0, 100.0);

    world.report_visible_actors(goblin, &[hero]).expect("perceive");
    world.body_mut(hero).expect("body").health = 0.0;
    world.step(0.1);
    assert!(!world.agent(goblin).expect("agent").memory().contains(hero));
}

#[test]
fn dead_agent_is_removed_from_its_squad_and_tethers() {
    let mut world = World::default();
    let a = spawn(&mut world, 1, ORCS, 0.0, TeamRole::AttackMelee1h);
    let b = spawn(&mut world, 2, ORCS, 10.0, TeamRole::FlankMelee);
    let knight = spawn(&mut world, 3, HUMANS, 200.0, TeamRole::AttackMelee1h);
    world.join(a, b).expect("join");
    world.report_visible_actors(knight, &[a]).expect("perceive");
    assert!(world.agent(a).expect("agent").memory().is_empty());
    assert!(world.agent(a).expect("agent").memory().is_tethered(knight));

    world.kill(a).expect("kill");
    assert!(!world.membership(b).expect("member").has_teammate(a));
    assert!(!world.agent(knight).expect("agent").memory().contains(a));
    assert!(world.agent(a).expect("agent").memory().tethers().is_empty());
}

// ---------------------------------------------------------------------------
// Squads
// ---------------------------------------------------------------------------

#[test]
fn pairwise_join_yields_exactly_one_leader() {
    let mut world = World::default();
    let captain = spawn(&mut world, 1, ORCS, 0.0, TeamRole::AttackMelee1h);
    let scout = spawn(&mut world, 2, ORCS, 10.0, TeamRole::FlankMelee);
    let archer = spawn(&mut world, 3, ORCS, 20.0, TeamRole::AttackRanged);

    world.join(scout, archer).expect("join");
    world.join(captain, scout).expect("join");
    world.join(archer, captain).expect("join");

    let leaders: Vec<EntityId> = [captain, scout, archer]
        .into_iter()
        .filter(|m| world.membership(*m).is_some_and(|t| t.is_leader()))
        .collect();
    assert_eq!(leaders, vec![captain]);
    assert_eq!(world.leader_of(archer), Some(captain));
}

#[test]
fn shared_memory_reaches_teammates_unperceived() {
    let mut world = World::default();
    let lookout = spawn(&mut world, 1, ORCS, 0.0, TeamRole::AttackMelee1h);
    let brute = spawn(&mut world, 2, ORCS, 10.0, TeamRole::FlankMelee);
    let hero = actor(&mut world, 3, HUMANS, 400.0, 100.0);
    world.join(lookout, brute).expect("join");

    world.report_visible_actors(lookout, &[hero]).expect("perceive");
    assert_eq!(world.share_data(lookout).expect("share"), 1);
    let record = world.agent(brute).expect("agent").memory().record(hero).expect("shared");
    assert!(!record.is_currently_perceived);
}

#[test]
fn shared_record_follows_the_enemy() {
    let mut world = World::default();
    let lookout = spawn(&mut world, 1, ORCS, 0.0, TeamRole::AttackMelee1h);
    let brute = spawn(&mut world, 2, ORCS, 10.0, TeamRole::FlankMelee);
    let knight = spawn(&mut world, 3, HUMANS, 400.0, TeamRole::AttackMelee1h);
    world.join(lookout, brute).expect("join");

    world.report_visible_actors(lookout, &[knight]).expect("perceive");
    world.body_mut(knight).expect("body").location = at(450.0);
    assert_eq!(world.share_data(lookout).expect("share"), 1);
    assert!(world.agent(knight).expect("agent").memory().is_tethered(brute));
    let record = world.agent(brute).expect("agent").memory().record(knight).expect("shared");
    assert!((record.last_seen_location.x - 450.0).abs() < f32::EPSILON);

    world.body_mut(knight).expect("body").location = at(700.0);
    world.step(0.5);
    let record = world.agent(brute).expect("agent").memory().record(knight).expect("shared");
    assert!((record.last_seen_location.x - 700.0).abs() < f32::EPSILON);
}

#[test]
fn joined_teammates_are_known_before_any_sync() {
    let mut world = World::default();
    let a = spawn(&mut world, 1, ORCS, 0.0, TeamRole::AttackMelee1h);
    let b = spawn(&mut world, 2, ORCS, 100.0, TeamRole::FlankMelee);
    world.join(a, b).expect("join");

    assert_eq!(world.nearest_teammate_to(a, &at(0.0), false).expect("nearest"), Some(b));
    assert_eq!(world.nearest_teammate_to(b, &at(100.0), false).expect("nearest"), Some(a));
    assert!((world.team_health(a).expect("health") - 100.0).abs() < f32::EPSILON);
}

#[test]
fn role_change_reaches_squad_and_combat() {
    let mut world = World::default();
    let grunt = spawn(&mut world, 1, ORCS, 0.0, TeamRole::FlankMelee);
    world.set_role(grunt, TeamRole::FlankRanged).expect("role");

    assert_eq!(world.membership(grunt).expect("member").role(), TeamRole::FlankRanged);
    let profile = world.agent(grunt).expect("agent").combat().profile();
    assert_eq!(profile.reach_style, AttackStyle::Ranged);

    let player = actor(&mut world, 2, ORCS, 0.0, 100.0);
    assert!(world.set_role(player, TeamRole::Arsonist).is_err());
}

#[test]
fn teammates_track_each_other_through_sync() {
    let mut world = World::default();
    let a = spawn(&mut world, 1, ORCS, 0.0, TeamRole::AttackMelee1h);
    let b = spawn(&mut world, 2, ORCS, 100.0, TeamRole::FlankMelee);
    world.join(a, b).expect("join");
    world.step(0.5);

    assert!(world.membership(a).expect("member").teammate(b).is_some());
    assert_eq!(world.nearest_teammate_to(a, &at(90.0), true).expect("nearest"), Some(b));
    assert_eq!(world.nearest_teammate_to(a, &at(10.0), true).expect("nearest"), Some(a));
    assert!((world.team_health(a).expect("health") - 100.0).abs() < f32::EPSILON);
}

#[test]
fn plain_actors_cannot_join_squads() {
    let mut world = World::default();
    let goblin = spawn(&mut world, 1, ORCS, 0.0, TeamRole::AttackMelee1h);
    let player = actor(&mut world, 2, ORCS, 0.0, 100.0);
    assert!(matches!(
        world.join(goblin, player),
        Err(VigilError::MissingCapability { capability: "team", .. })
    ));
    assert!(matches!(world.join(goblin, id(99)), Err(VigilError::EntityNotFound(_))));
}

// ---------------------------------------------------------------------------
// Structures
// ---------------------------------------------------------------------------

struct TwoHuts {
    left: EntityId,
    right: EntityId,
}

impl SpatialQuery for TwoHuts {
    fn cast_ray(&self, _origin: &Location, yaw_degrees: f32, _range: f32) -> Option<EntityId> {
        if yaw_degrees < 0.0 { Some(self.left) } else { Some(self.right) }
    }
}

fn hut(raw: u128, health: f32, x: f32) -> BuildingRecord {
    BuildingRecord {
        building: id(raw),
        health,
        max_health: 100.0,
        location: at(x),
        material: Material::Wood,
    }
}

#[test]
fn scan_then_select_the_weaker_closer_hut() {
    let mut world = World::default();
    let raider = id(1);
    world
        .spawn_agent(
            raider,
            AgentSpawn::new(Body::new(ORCS, at(0.0)), Personality::Goblin, TeamRole::Arsonist).with_building_memory(),
        )
        .expect("spawn");
    world.register_building(hut(10, 10.0, 100.0)).expect("hut");
    world.register_building(hut(11, 50.0, 500.0)).expect("hut");
    let huts = TwoHuts { left: id(10), right: id(11) };

    assert_eq!(world.scan_static_targets(raider, 5.0, &huts).expect("scan"), 0);
    assert_eq!(world.scan_static_targets(raider, 90.0, &huts).expect("scan"), 2);
    assert_eq!(world.select_static_target(raider).expect("select"), Some(id(10)));

    world.destroy_building(id(10)).expect("destroy");
    assert_eq!(world.agent(raider).expect("agent").static_target(), None);
    assert_eq!(world.select_static_target(raider).expect("select"), Some(id(11)));
}

#[test]
fn agents_without_building_memory_cannot_pick_structures() {
    let mut world = World::default();
    let goblin = spawn(&mut world, 1, ORCS, 0.0, TeamRole::AttackMelee1h);
    assert!(matches!(
        world.select_static_target(goblin),
        Err(VigilError::MissingCapability { capability: "building", .. })
    ));
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

#[test]
fn duplicate_registration_is_rejected() {
    let mut world = World::default();
    let goblin = spawn(&mut world, 1, ORCS, 0.0, TeamRole::AttackMelee1h);
    assert!(matches!(
        world.register_actor(goblin, Body::new(HUMANS, at(0.0))),
        Err(VigilError::DuplicateEntity(_))
    ));
    world.register_building(hut(5, 10.0, 0.0)).expect("hut");
    assert!(world.register_building(hut(5, 10.0, 0.0)).is_err());
}

#[test]
fn unknown_agents_are_host_errors() {
    let mut world = World::default();
    let player = actor(&mut world, 2, HUMANS, 0.0, 100.0);
    assert!(matches!(world.report_visible_actors(id(9), &[]), Err(VigilError::EntityNotFound(_))));
    assert!(matches!(
        world.notify_damaged(player, id(9), 1.0),
        Err(VigilError::MissingCapability { capability: "memory", .. })
    ));
}
