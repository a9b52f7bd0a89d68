//! The path planner: one vtime of per-second locations.
//!
//! At every vtime boundary each avatar turns its `(current location, next
//! place)` pair into a schedule of exactly [`SECONDS_IN_VTIME`] per-second
//! locations, one of three shapes:
//!
//! - **stay**: the sampled destination equals the current cell -- the whole
//!   vtime is spent in place;
//! - **portal**: the destination's zone is not adjacent to the current one --
//!   half the vtime at the current cell, half at the destination;
//! - **walk**: a Manhattan route, with a three-minute pre-stay when leaving a
//!   city, `remaining / distance` seconds per unit step, and the leftover
//!   seconds spent at the destination.
//!
//! Alongside the schedule the planner records *breakpoints*: the
//! second-offset at which each newly entered cell first appears. Breakpoints
//! feed the simulator's system-write stream. The stay shape records none
//! (nothing new is entered), and neither does the residual padding at the
//! end of a walk.

use std::collections::{BTreeMap, VecDeque};

use rand::Rng;
use wander_world::location::LocRef;
use wander_world::time::{MINUTE, SECONDS_IN_VTIME};
use wander_world::world::World;
use wander_world::SceneRng;

// ---------------------------------------------------------------------------
// VtimePath
// ---------------------------------------------------------------------------

/// A planned vtime: per-second locations plus the breakpoint map.
///
/// `None` steps mean the avatar is offline for that second.
#[derive(Debug, Default)]
pub struct VtimePath {
    /// Exactly [`SECONDS_IN_VTIME`] entries, front is the next second.
    pub steps: VecDeque<Option<LocRef>>,
    /// Second-offset within the vtime at which each new cell first appears.
    pub breakpoints: BTreeMap<u32, LocRef>,
}

impl VtimePath {
    fn empty() -> Self {
        Self {
            steps: VecDeque::with_capacity(SECONDS_IN_VTIME as usize),
            breakpoints: BTreeMap::new(),
        }
    }

    /// A whole vtime offline.
    pub fn offline() -> Self {
        let mut path = Self::empty();
        path.steps.extend(std::iter::repeat(None).take(SECONDS_IN_VTIME as usize));
        path
    }

    /// A whole vtime at `loc`, with no breakpoints.
    pub fn stay(loc: LocRef) -> Self {
        let mut path = Self::empty();
        path.steps
            .extend(std::iter::repeat(Some(loc)).take(SECONDS_IN_VTIME as usize));
        path
    }

    /// Plan the route from `cur` to the sampled destination `dest`.
    ///
    /// Every randomized decision (the vertical-vs-horizontal step coin)
    /// draws from the scene PRNG, in walk order.
    pub fn plan(world: &World, cur: LocRef, dest: LocRef, rng: &mut SceneRng) -> Self {
        let path = if dest == cur {
            Self::stay(cur)
        } else {
            let cur_zone = world
                .location(cur)
                .zone()
                .expect("avatar locations always lie inside a zone");
            let dest_zone = world
                .location(dest)
                .zone()
                .expect("sampled destinations always lie inside a zone");
            if !world.zone(cur_zone).is_neighbor(dest_zone) {
                Self::portal(cur, dest)
            } else {
                Self::walk(world, cur, dest, rng)
            }
        };
        assert_eq!(
            path.steps.len(),
            SECONDS_IN_VTIME as usize,
            "planned path from {cur} to {dest} has the wrong length"
        );
        path
    }

    /// Half the vtime at `cur`, half at `dest`.
    fn portal(cur: LocRef, dest: LocRef) -> Self {
        let mut path = Self::empty();
        path.extend(cur, SECONDS_IN_VTIME / 2);
        path.extend(dest, SECONDS_IN_VTIME / 2);
        path
    }

    /// Manhattan walk from `cur` to `dest` through adjacent (or the same)
    /// zones.
    fn walk(world: &World, cur: LocRef, dest: LocRef, rng: &mut SceneRng) -> Self {
        let mut path = Self::empty();
        let mut remaining = SECONDS_IN_VTIME;

        if world.location(cur).is_city() {
            path.extend(cur, 3 * MINUTE);
            remaining -= 3 * MINUTE;
        }

        let (dist, mut xs, mut ys) = cur.manhattan_to(dest);
        let seconds_per_step = remaining / dist;
        let (mut x, mut y) = (cur.x, cur.y);

        while !xs.is_empty() || !ys.is_empty() {
            // with both queues non-empty the direction is a fair coin;
            // otherwise the non-empty queue advances without a draw
            if xs.is_empty() || (!ys.is_empty() && rng.gen_bool(0.5)) {
                y = ys.pop_front().expect("vertical queue is non-empty");
            } else {
                x = xs.pop_front().expect("horizontal queue is non-empty");
            }
            path.extend(LocRef::new(cur.continent, x, y), seconds_per_step);
            remaining -= seconds_per_step;
        }

        // residual padding at the final cell, without a breakpoint
        path.steps.extend(
            std::iter::repeat(Some(LocRef::new(cur.continent, x, y))).take(remaining as usize),
        );
        path
    }

    /// Append `seconds` copies of `loc` and record its breakpoint at the
    /// current offset.
    ///
    /// # Panics
    ///
    /// Panics if a breakpoint was already recorded at this offset (only
    /// possible when a walk's per-step budget truncates to zero, which the
    /// planner treats as corrupt map data).
    fn extend(&mut self, loc: LocRef, seconds: u32) {
        let offset = self.steps.len() as u32;
        let previous = self.breakpoints.insert(offset, loc);
        assert!(
            previous.is_none(),
            "duplicate path breakpoint at offset {offset}"
        );
        self.steps
            .extend(std::iter::repeat(Some(loc)).take(seconds as usize));
    }
}
