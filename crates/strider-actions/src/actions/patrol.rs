//! Waypoint patrol made of ballistic hops.

use serde::{Deserialize, Serialize};
use strider_physics::{parabola, Vec2};

use crate::action::{Action, ActionInfo, ActionPriority, ActionStatus, ActionTags};
use crate::context::{ActionContext, ActionView};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PatrolPhase {
    /// Resting before the next hop.
    Waiting { remaining: f32 },
    /// In flight toward `destination`, landing in `remaining` seconds.
    Travelling { destination: Vec2, remaining: f32 },
}

/// Hops from waypoint to waypoint along a parabola, waiting `wait_time`
/// seconds between hops. On arrival the body is snapped onto the waypoint in
/// the same tick.
///
/// Runs alone: it refuses every other action, and preempts those of its own
/// class. Status actions keep running.
#[derive(Debug, Clone)]
pub struct PatrolAction {
    waypoints: Vec<Vec2>,
    wait_time: f32,
    apex_height: f32,
    index: usize,
    phase: PatrolPhase,
}

impl PatrolAction {
    pub const NAME: &'static str = "patrol";

    pub fn new(waypoints: Vec<Vec2>, wait_time: f32) -> Self {
        let wait_time = wait_time.max(0.0);
        Self {
            waypoints,
            wait_time,
            apex_height: 2.0,
            index: 0,
            phase: PatrolPhase::Waiting {
                remaining: wait_time,
            },
        }
    }

    pub fn with_apex_height(mut self, apex_height: f32) -> Self {
        self.apex_height = apex_height;
        self
    }

    pub fn phase(&self) -> PatrolPhase {
        self.phase
    }

    pub fn waypoints(&self) -> &[Vec2] {
        &self.waypoints
    }

    /// Advance to the following waypoint, wrapping around.
    fn next_destination(&mut self) -> Option<Vec2> {
        if self.waypoints.is_empty() {
            return None;
        }
        self.index = (self.index + 1) % self.waypoints.len();
        Some(self.waypoints[self.index])
    }

    fn launch(&mut self, ctx: &mut ActionContext<'_>) {
        let Some(destination) = self.next_destination() else {
            return;
        };
        let origin = ctx.body.position();
        let gravity = ctx.gravity.abs() * ctx.body.gravity_scale();

        match parabola::initial_velocity(origin, destination, self.apex_height, gravity) {
            Some((velocity, arrival)) => {
                ctx.body.set_velocity(velocity);
                self.phase = PatrolPhase::Travelling {
                    destination,
                    remaining: arrival,
                };
                tracing::trace!(body = %ctx.body.handle(), ?destination, arrival, "patrol hop");
            }
            None => {
                ctx.body.instant_teleport(destination);
                self.phase = PatrolPhase::Waiting {
                    remaining: self.wait_time,
                };
            }
        }
    }
}

impl Action for PatrolAction {
    fn info(&self) -> ActionInfo {
        ActionInfo::new(Self::NAME, ActionPriority::Movement).with_tags(ActionTags::LOCOMOTION)
    }

    fn can_execute(&self, _view: &ActionView<'_>) -> bool {
        !self.waypoints.is_empty()
    }

    fn can_continue_to_execute(&self, view: &ActionView<'_>) -> bool {
        self.can_execute(view)
    }

    fn can_execute_simultaneously(&self, _other: &ActionInfo) -> bool {
        false
    }

    fn start_execution(&mut self, _status: &mut ActionStatus, _ctx: &mut ActionContext<'_>) {
        self.phase = PatrolPhase::Waiting {
            remaining: self.wait_time,
        };
    }

    fn execute(&mut self, _status: &mut ActionStatus, ctx: &mut ActionContext<'_>) {
        match self.phase {
            PatrolPhase::Waiting { remaining } => {
                let remaining = remaining - ctx.dt;
                if remaining <= 0.0 {
                    self.launch(ctx);
                } else {
                    self.phase = PatrolPhase::Waiting { remaining };
                }
            }
            PatrolPhase::Travelling {
                destination,
                remaining,
            } => {
                let remaining = remaining - ctx.dt;
                if remaining <= 0.0 {
                    ctx.body.instant_teleport(destination);
                    ctx.body.set_velocity(Vec2::zeros());
                    self.phase = PatrolPhase::Waiting {
                        remaining: self.wait_time,
                    };
                } else {
                    self.phase = PatrolPhase::Travelling {
                        destination,
                        remaining,
                    };
                }
            }
        }
    }

    fn stop_execution(&mut self, _status: &mut ActionStatus, ctx: &mut ActionContext<'_>) {
        if matches!(self.phase, PatrolPhase::Travelling { .. }) {
            ctx.body.set_velocity(Vec2::zeros());
        }
    }
}

#[cfg(test)]
mod tests {
    use strider_physics::prelude::*;

    use super::*;
    use crate::events::EventBus;

    #[test]
    fn destinations_wrap_around() {
        let mut patrol = PatrolAction::new(vec![Vec2::new(0.0, 0.0), Vec2::new(4.0, 0.0)], 1.0);
        assert_eq!(patrol.next_destination(), Some(Vec2::new(4.0, 0.0)));
        assert_eq!(patrol.next_destination(), Some(Vec2::new(0.0, 0.0)));
        assert_eq!(patrol.next_destination(), Some(Vec2::new(4.0, 0.0)));
    }

    #[test]
    fn empty_path_has_no_destination() {
        let mut patrol = PatrolAction::new(Vec::new(), 1.0);
        assert_eq!(patrol.next_destination(), None);
    }

    #[test]
    fn refuses_every_other_action() {
        let patrol = PatrolAction::new(vec![Vec2::zeros()], 0.5);
        let idle = ActionInfo::new("idle", ActionPriority::Movement);
        let alive = ActionInfo::new("alive", ActionPriority::Status);
        assert!(!patrol.can_execute_simultaneously(&idle));
        assert!(!patrol.can_execute_simultaneously(&alive));
    }

    #[test]
    fn arrival_snaps_onto_waypoint_in_the_same_tick() {
        let mut world = PhysicsWorldHandler::new(WorldConfig::default()).unwrap();
        let handle = world
            .create_body(BodyConfig::new(Profile::AI, Vec2::new(3.9, 0.6), Vec2::new(0.4, 0.4)))
            .unwrap();
        let mut events = EventBus::new();
        let destination = Vec2::new(4.0, 0.4);

        let mut patrol = PatrolAction::new(vec![Vec2::zeros(), destination], 0.5);
        patrol.phase = PatrolPhase::Travelling {
            destination,
            remaining: 0.01,
        };
        let mut status = ActionStatus::default();
        {
            let (body, config) = world.body_and_config_mut(handle).unwrap();
            body.set_velocity(Vec2::new(1.0, -2.0));
            let mut ctx = ActionContext::new(body, config, &mut events, 1.0 / 60.0);
            patrol.execute(&mut status, &mut ctx);
        }

        let body = world.body(handle).unwrap();
        assert_eq!(body.position(), destination);
        assert!(body.pending_teleport().is_none());
        assert_eq!(body.velocity(), Vec2::zeros());
        assert_eq!(patrol.phase(), PatrolPhase::Waiting { remaining: 0.5 });
    }
}
