//! Scenario tests running action grids on top of a physics world.
//!
//! Every tick first advances the world, then the entity's grid, matching the
//! order the simulation driver uses.

use strider_actions::prelude::*;
use strider_physics::prelude::*;

const DT: f32 = 1.0 / 60.0;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Harness {
    world: PhysicsWorldHandler,
    events: EventBus,
    body: BodyHandle,
    grid: ActionGrid,
    frame: u64,
    despawn_requested: bool,
}

impl Harness {
    fn new(profile: Profile, grid: ActionGrid) -> Self {
        let mut world = PhysicsWorldHandler::new(WorldConfig::default()).unwrap();
        world
            .geometry_mut()
            .add_static_box(Vec2::new(0.0, -0.5), Vec2::new(50.0, 0.5));
        let body = world
            .create_body(BodyConfig::new(profile, Vec2::new(0.0, 0.5), Vec2::new(0.5, 0.5)))
            .unwrap();
        Self {
            world,
            events: EventBus::new(),
            body,
            grid,
            frame: 0,
            despawn_requested: false,
        }
    }

    fn tick(&mut self, intent: Intent) {
        self.world.tick(DT);
        let (body, config) = self.world.body_and_config_mut(self.body).unwrap();
        let mut ctx = ActionContext::new(body, config, &mut self.events, DT);
        ctx.intent = intent;
        ctx.frame = self.frame;
        self.grid.tick(&mut ctx);
        self.despawn_requested |= ctx.despawn_requested;
        self.frame += 1;
    }

    fn idle_ticks(&mut self, ticks: usize) {
        for _ in 0..ticks {
            self.tick(Intent::default());
        }
    }

    fn body(&self) -> &PhysicsBody {
        self.world.body(self.body).unwrap()
    }
}

fn player_grid() -> ActionGrid {
    let mut grid = ActionGrid::new();
    grid.add(AliveAction::new(3))
        .add(IdleAction::new())
        .add(MovementAction::new(4.0))
        .add(JumpAction::new(JumpSettings::default()))
        .add(AttackAction::default());
    grid
}

fn right() -> Intent {
    Intent {
        horizontal: 1.0,
        ..Intent::default()
    }
}

// ---------------------------------------------------------------------------
// Locomotion
// ---------------------------------------------------------------------------

#[test]
fn idle_and_movement_alternate() {
    let mut h = Harness::new(Profile::Player, player_grid());
    h.idle_ticks(5);
    assert!(h.grid.is_executing(IdleAction::NAME));
    assert!(!h.grid.is_executing(MovementAction::NAME));

    h.tick(right());
    assert!(h.grid.is_executing(MovementAction::NAME));
    assert!(!h.grid.is_executing(IdleAction::NAME));
    assert_eq!(h.body().speed_x(), 4.0);

    for _ in 0..30 {
        h.tick(right());
    }
    assert!(h.body().position().x > 1.5);
    assert!(!h.grid.is_executing(IdleAction::NAME));

    h.tick(Intent::default());
    assert!(!h.grid.is_executing(MovementAction::NAME));
    assert!(h.grid.is_executing(IdleAction::NAME));
    assert_eq!(h.body().speed_x(), 0.0);
}

#[test]
fn movement_blocked_by_wall_keeps_idle_out() {
    let mut h = Harness::new(Profile::Player, player_grid());
    h.world
        .geometry_mut()
        .add_static_box(Vec2::new(2.0, 2.0), Vec2::new(0.5, 2.0));
    h.idle_ticks(3);

    for _ in 0..60 {
        h.tick(right());
    }
    // Collisions zero the speed every tick but the direction is still held.
    assert!(h.grid.is_executing(MovementAction::NAME));
    assert!(!h.grid.is_executing(IdleAction::NAME));
    assert!((h.body().bounds().max().x - 1.5).abs() < 1e-2);
}

// ---------------------------------------------------------------------------
// Jump
// ---------------------------------------------------------------------------

#[test]
fn held_jump_reaches_full_height_and_lands() {
    let mut h = Harness::new(Profile::Player, player_grid());
    h.idle_ticks(5);
    assert!(h.body().is_grounded());

    let press = Intent {
        jump_pressed: true,
        jump_held: true,
        ..Intent::default()
    };
    let hold = Intent {
        jump_held: true,
        ..Intent::default()
    };

    h.tick(press);
    assert!(h.grid.is_executing(JumpAction::NAME));

    let mut apex: f32 = 0.0;
    let mut landed_at = None;
    for tick in 0..120 {
        h.tick(hold);
        apex = apex.max(h.body().bounds().min().y);
        if !h.grid.is_executing(JumpAction::NAME) {
            landed_at = Some(tick);
            break;
        }
    }

    assert!((apex - 2.5).abs() < 0.15, "apex {apex}");
    let landed_at = landed_at.expect("jump never finished");
    // 0.4 s up, 0.45 s down.
    assert!((40..=65).contains(&landed_at), "landed after {landed_at} ticks");
    assert!(h.body().is_grounded());
    assert_eq!(h.body().gravity_scale(), 1.0);
}

#[test]
fn released_jump_is_shorter() {
    let mut h = Harness::new(Profile::Player, player_grid());
    h.idle_ticks(5);

    h.tick(Intent {
        jump_pressed: true,
        jump_held: true,
        ..Intent::default()
    });
    for _ in 0..5 {
        h.tick(Intent {
            jump_held: true,
            ..Intent::default()
        });
    }
    h.tick(Intent::default());
    assert_eq!(h.body().speed_y(), 0.0);

    let mut apex: f32 = 0.0;
    for _ in 0..60 {
        h.tick(Intent::default());
        apex = apex.max(h.body().bounds().min().y);
    }
    assert!(apex < 1.5, "apex {apex}");
    assert!(!h.grid.is_executing(JumpAction::NAME));
}

#[test]
fn cannot_jump_in_air() {
    let mut h = Harness::new(Profile::Player, player_grid());
    h.world
        .instant_teleport(h.body, Vec2::new(0.0, 10.0))
        .unwrap();
    h.tick(Intent {
        jump_pressed: true,
        jump_held: true,
        ..Intent::default()
    });
    assert!(h.body().is_in_air());
    assert!(!h.grid.is_executing(JumpAction::NAME));
}

// ---------------------------------------------------------------------------
// Alive
// ---------------------------------------------------------------------------

#[test]
fn lethal_damage_stops_alive_and_requests_despawn() {
    let mut h = Harness::new(Profile::Player, player_grid());
    h.idle_ticks(2);
    assert_eq!(h.grid.is(IsQuery::Alive), QueryResult::Yes);
    assert_eq!(h.grid.is(IsQuery::Dead), QueryResult::No);
    assert_eq!(h.events.subscriber_count(), 1);

    let me = h.body;
    h.events.publish(GameEvent::DamageReceived {
        target: BodyHandle(me.0 + 100),
        source: BodyHandle(7),
        damage: 50,
    });
    h.events.publish(GameEvent::DamageReceived {
        target: me,
        source: BodyHandle(7),
        damage: 2,
    });
    h.idle_ticks(2);
    assert_eq!(h.grid.is(IsQuery::Alive), QueryResult::Yes);
    assert!(!h.despawn_requested);

    h.events.publish(GameEvent::DamageReceived {
        target: me,
        source: BodyHandle(7),
        damage: 1,
    });
    h.idle_ticks(2);

    assert!(!h.grid.is_executing(AliveAction::NAME));
    assert_eq!(h.grid.is(IsQuery::Alive), QueryResult::No);
    assert!(h.despawn_requested);
    assert_eq!(h.events.subscriber_count(), 0);
}

#[test]
fn dead_entity_never_starts_alive() {
    let mut grid = ActionGrid::new();
    grid.add(AliveAction::new(0)).add(IdleAction::new());
    let mut h = Harness::new(Profile::AI, grid);
    h.idle_ticks(3);
    assert_eq!(h.grid.is(IsQuery::Alive), QueryResult::No);
    assert!(!h.despawn_requested);
}

// ---------------------------------------------------------------------------
// Attack
// ---------------------------------------------------------------------------

#[test]
fn attack_publishes_area_and_terminates() {
    let mut h = Harness::new(Profile::Player, player_grid());
    let listener = h.events.subscribe();
    h.idle_ticks(3);

    h.tick(Intent {
        attack_pressed: true,
        ..Intent::default()
    });
    assert!(h.grid.is_executing(AttackAction::NAME));
    assert_eq!(h.grid.is(IsQuery::UsingWeapon), QueryResult::Yes);

    let areas: Vec<_> = listener
        .drain()
        .into_iter()
        .filter_map(|event| match event {
            GameEvent::AttackArea { source, area, mask, damage } => Some((source, area, mask, damage)),
            _ => None,
        })
        .collect();
    assert_eq!(areas.len(), 1);
    let (source, area, mask, damage) = areas[0];
    assert_eq!(source, h.body);
    assert_eq!(mask, CollisionLayers::AI);
    assert_eq!(damage, 1);
    assert!((area.center.x - (h.body().position().x + 1.0)).abs() < 1e-4);

    h.idle_ticks(10);
    assert!(h.grid.is_executing(AttackAction::NAME));
    h.idle_ticks(10);
    assert!(!h.grid.is_executing(AttackAction::NAME));
    assert_eq!(h.grid.is(IsQuery::UsingWeapon), QueryResult::No);
}

#[test]
fn attack_needs_permission() {
    // No idle or movement action answers Can(Attack).
    let mut grid = ActionGrid::new();
    grid.add(AliveAction::new(1)).add(AttackAction::default());
    let mut h = Harness::new(Profile::Player, grid);
    h.tick(Intent {
        attack_pressed: true,
        ..Intent::default()
    });
    assert!(!h.grid.is_executing(AttackAction::NAME));
}

// ---------------------------------------------------------------------------
// Patrol
// ---------------------------------------------------------------------------

#[test]
fn patrol_hops_onto_next_waypoint() {
    let mut grid = ActionGrid::new();
    grid.add(AliveAction::new(5)).add(PatrolAction::new(
        vec![Vec2::new(0.0, 0.5), Vec2::new(4.0, 0.5)],
        0.5,
    ));
    let mut h = Harness::new(Profile::AI, grid);

    h.idle_ticks(10);
    assert!(h.grid.is_executing(PatrolAction::NAME));
    assert!(h.body().position().x.abs() < 1e-3);

    let mut left_ground = false;
    for _ in 0..115 {
        h.tick(Intent::default());
        left_ground |= h.body().bounds().min().y > 1.0;
    }
    assert!(left_ground);
    let position = h.body().position();
    assert!((position - Vec2::new(4.0, 0.5)).norm() < 0.05, "at {position:?}");
    assert_eq!(h.body().velocity(), Vec2::zeros());
}

#[test]
fn patrol_excludes_idle() {
    let mut grid = ActionGrid::new();
    grid.add(PatrolAction::new(vec![Vec2::new(0.0, 0.5)], 1.0))
        .add(IdleAction::new());
    let mut h = Harness::new(Profile::AI, grid);
    h.idle_ticks(3);
    assert!(h.grid.is_executing(PatrolAction::NAME));
    assert!(!h.grid.is_executing(IdleAction::NAME));
}

#[test]
fn patrol_leaves_alive_running() {
    let mut grid = ActionGrid::new();
    grid.add(AliveAction::new(2)).add(PatrolAction::new(
        vec![Vec2::new(0.0, 0.5), Vec2::new(3.0, 0.5)],
        0.2,
    ));
    let mut h = Harness::new(Profile::AI, grid);

    for _ in 0..120 {
        h.tick(Intent::default());
        assert!(h.grid.is_executing(AliveAction::NAME));
        assert!(h.grid.is_executing(PatrolAction::NAME));
    }
    assert_eq!(h.grid.is(IsQuery::Alive), QueryResult::Yes);
    assert!(!h.despawn_requested);
    assert_eq!(h.events.subscriber_count(), 1);
}

#[test]
fn patrol_lands_exactly_on_waypoint_at_arrival() {
    let mut grid = ActionGrid::new();
    grid.add(AliveAction::new(5)).add(PatrolAction::new(
        vec![Vec2::new(0.0, 0.5), Vec2::new(4.0, 0.5)],
        0.5,
    ));
    let mut h = Harness::new(Profile::AI, grid);

    let mut travelling = false;
    let mut arrived = false;
    for _ in 0..150 {
        h.tick(Intent::default());
        let moving = h.body().velocity().x != 0.0;
        if travelling && !moving {
            // Same tick the hop ends, before any further physics step.
            assert_eq!(h.body().position(), Vec2::new(4.0, 0.5));
            arrived = true;
            break;
        }
        travelling |= moving;
    }
    assert!(arrived);
}
