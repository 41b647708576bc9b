//! Per-entity priority arbitration.
//!
//! An [`ActionGrid`] owns every action of one entity, sorted once by
//! `(priority, order)`. Each tick runs three passes:
//!
//! 1. **continuation**: every executing action whose
//!    `can_continue_to_execute` fails is stopped, and the scan restarts from
//!    the first action.
//! 2. **start**: every inactive action whose `can_execute` holds is checked
//!    against all executing actions. If any of them refuses to run alongside
//!    the candidate, the candidate waits. Otherwise the candidate stops each
//!    executing action it cannot run alongside whose class sorts at or after
//!    its own, and starts. Actions of an earlier class are never preempted.
//! 3. **execute**: every executing action runs once and accrues the tick
//!    delta.
//!
//! `is`/`can` queries ask executing actions in sorted order and return the
//! first answer other than [`QueryResult::Undefined`]. No answer means
//! [`QueryResult::No`].

use std::fmt;

use crate::action::{Action, ActionInfo, ActionState, ActionStatus, CanQuery, IsQuery, QueryResult};
use crate::context::{ActionContext, ActionView};

struct Slot {
    action: Box<dyn Action>,
    info: ActionInfo,
    status: ActionStatus,
}

// ---------------------------------------------------------------------------
// GridQuery
// ---------------------------------------------------------------------------

/// Read-only `is`/`can` access to a grid's executing actions.
#[derive(Clone, Copy)]
pub struct GridQuery<'a> {
    slots: &'a [Slot],
}

impl<'a> GridQuery<'a> {
    pub fn is(&self, query: IsQuery) -> QueryResult {
        self.first_answer(|action| action.is(query))
    }

    pub fn can(&self, query: CanQuery) -> QueryResult {
        self.first_answer(|action| action.can(query))
    }

    fn first_answer(&self, ask: impl Fn(&dyn Action) -> QueryResult) -> QueryResult {
        self.slots
            .iter()
            .filter(|slot| slot.status.is_executing())
            .map(|slot| ask(slot.action.as_ref()))
            .find(|answer| *answer != QueryResult::Undefined)
            .unwrap_or(QueryResult::No)
    }
}

fn view<'a>(slots: &'a [Slot], index: usize, ctx: &'a ActionContext<'_>) -> ActionView<'a> {
    ActionView {
        body: &*ctx.body,
        intent: &ctx.intent,
        status: &slots[index].status,
        grid: GridQuery { slots },
        epsilon: ctx.epsilon,
    }
}

// ---------------------------------------------------------------------------
// ActionGrid
// ---------------------------------------------------------------------------

/// The action scheduler of one entity.
#[derive(Default)]
pub struct ActionGrid {
    slots: Vec<Slot>,
    sorted: bool,
}

impl ActionGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an action. Actions are normally all added before the first tick.
    pub fn add(&mut self, action: impl Action + 'static) -> &mut Self {
        self.add_boxed(Box::new(action))
    }

    pub fn add_boxed(&mut self, action: Box<dyn Action>) -> &mut Self {
        let info = action.info();
        self.slots.push(Slot {
            action,
            info,
            status: ActionStatus::default(),
        });
        self.sorted = false;
        self
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Sort by `(priority, order)` unless already sorted. Ties keep their
    /// insertion order.
    fn initialize(&mut self) {
        if !self.sorted {
            self.slots
                .sort_by_key(|slot| (slot.info.priority, slot.info.order));
            self.sorted = true;
        }
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    pub fn tick(&mut self, ctx: &mut ActionContext<'_>) {
        self.initialize();
        self.continuation_pass(ctx);
        self.start_pass(ctx);
        self.execute_pass(ctx);
    }

    fn continuation_pass(&mut self, ctx: &mut ActionContext<'_>) {
        let mut index = 0;
        while index < self.slots.len() {
            let slot = &self.slots[index];
            if slot.status.is_executing()
                && !slot
                    .action
                    .can_continue_to_execute(&view(&self.slots, index, ctx))
            {
                self.stop(index, ctx);
                index = 0;
                continue;
            }
            index += 1;
        }
    }

    fn start_pass(&mut self, ctx: &mut ActionContext<'_>) {
        for index in 0..self.slots.len() {
            let slot = &self.slots[index];
            if slot.status.is_executing()
                || !slot.action.can_execute(&view(&self.slots, index, ctx))
            {
                continue;
            }

            let candidate = slot.info;
            if let Some(blocker) = self.slots.iter().find(|other| {
                other.status.is_executing() && !other.action.can_execute_simultaneously(&candidate)
            }) {
                tracing::trace!(
                    action = candidate.name,
                    blocked_by = blocker.info.name,
                    "start blocked"
                );
                continue;
            }

            for other in 0..self.slots.len() {
                if other == index {
                    continue;
                }
                let executing = &self.slots[other];
                if executing.status.is_executing()
                    && executing.info.priority >= candidate.priority
                    && !self.slots[index]
                        .action
                        .can_execute_simultaneously(&executing.info)
                {
                    tracing::trace!(
                        action = candidate.name,
                        preempted = executing.info.name,
                        "preempting"
                    );
                    self.stop(other, ctx);
                }
            }

            self.start(index, ctx);
        }
    }

    fn execute_pass(&mut self, ctx: &mut ActionContext<'_>) {
        let dt = ctx.dt;
        for slot in &mut self.slots {
            if !slot.status.is_executing() {
                continue;
            }
            slot.action.execute(&mut slot.status, ctx);
            slot.status.execution_time += dt;
        }
    }

    fn start(&mut self, index: usize, ctx: &mut ActionContext<'_>) {
        let slot = &mut self.slots[index];
        slot.status.state = ActionState::Executing;
        slot.status.execution_time = 0.0;
        slot.status.terminated = false;
        slot.status.execution_frame = ctx.frame;
        slot.action.start_execution(&mut slot.status, ctx);
        tracing::trace!(
            action = slot.info.name,
            priority = %slot.info.priority,
            body = %ctx.body.handle(),
            "action started"
        );
    }

    fn stop(&mut self, index: usize, ctx: &mut ActionContext<'_>) {
        let slot = &mut self.slots[index];
        slot.status.state = ActionState::Inactive;
        slot.status.execution_time = 0.0;
        slot.action.stop_execution(&mut slot.status, ctx);
        tracing::trace!(
            action = slot.info.name,
            body = %ctx.body.handle(),
            "action stopped"
        );
    }

    /// Stop every executing action. The grid sorts itself again on the next
    /// tick.
    pub fn disable(&mut self, ctx: &mut ActionContext<'_>) {
        for index in 0..self.slots.len() {
            if self.slots[index].status.is_executing() {
                self.stop(index, ctx);
            }
        }
        self.sorted = false;
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn query(&self) -> GridQuery<'_> {
        GridQuery { slots: &self.slots }
    }

    pub fn is(&self, query: IsQuery) -> QueryResult {
        self.query().is(query)
    }

    pub fn can(&self, query: CanQuery) -> QueryResult {
        self.query().can(query)
    }

    /// Executing actions in evaluation order.
    pub fn executing(&self) -> impl Iterator<Item = &ActionInfo> + '_ {
        self.slots
            .iter()
            .filter(|slot| slot.status.is_executing())
            .map(|slot| &slot.info)
    }

    pub fn is_executing(&self, name: &str) -> bool {
        self.executing().any(|info| info.name == name)
    }

    /// Status of the first action called `name`.
    pub fn status(&self, name: &str) -> Option<&ActionStatus> {
        self.slots
            .iter()
            .find(|slot| slot.info.name == name)
            .map(|slot| &slot.status)
    }

    /// All actions with their status, in evaluation order once sorted.
    pub fn actions(&self) -> impl Iterator<Item = (&ActionInfo, &ActionStatus)> + '_ {
        self.slots.iter().map(|slot| (&slot.info, &slot.status))
    }
}

impl fmt::Display for ActionGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut any = false;
        for info in self.executing() {
            if any {
                writeln!(f)?;
            }
            write!(f, "[{}] - [{}]", info.priority, info.name)?;
            any = true;
        }
        if !any {
            write!(f, "--- None ---")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ActionGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionGrid")
            .field("actions", &self.slots.iter().map(|s| s.info.name).collect::<Vec<_>>())
            .field("sorted", &self.sorted)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
