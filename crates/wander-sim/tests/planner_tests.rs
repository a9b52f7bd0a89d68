//! Integration tests for the path planner shapes: offline, stay, portal,
//! and Manhattan walks with and without the city pre-stay.
//!
//! Destinations are passed to the planner directly, so everything except the
//! walk's direction coins is deterministic; walk assertions hold for any
//! coin sequence.

mod common;

use common::{kal, Fixture, LONE, MONO};
use wander_sim::path::VtimePath;
use wander_world::config::SimConfig;
use wander_world::location::LocRef;
use wander_world::scene_rng;
use wander_world::time::SECONDS_IN_VTIME;

const VTIME: usize = SECONDS_IN_VTIME as usize;

#[test]
fn offline_path_is_all_none() {
    let path = VtimePath::offline();
    assert_eq!(path.steps.len(), VTIME);
    assert!(path.steps.iter().all(|step| step.is_none()));
    assert!(path.breakpoints.is_empty());
}

#[test]
fn stay_path_repeats_the_cell_without_breakpoints() {
    let fixture = Fixture::new();
    let world = fixture.world(SimConfig::default());
    let cell = kal(MONO.0, MONO.1);
    let mut rng = scene_rng(1);

    let path = VtimePath::plan(&world, cell, cell, &mut rng);
    assert_eq!(path.steps.len(), VTIME);
    assert!(path.steps.iter().all(|step| *step == Some(cell)));
    assert!(path.breakpoints.is_empty());
}

#[test]
fn portal_path_splits_the_vtime_in_half() {
    let fixture = Fixture::new();
    let world = fixture.world(SimConfig::default());
    let cur = kal(MONO.0, MONO.1); // meadow
    let dest = kal(25, 5); // hollow, not adjacent to meadow
    let mut rng = scene_rng(1);

    let path = VtimePath::plan(&world, cur, dest, &mut rng);
    assert_eq!(path.steps.len(), VTIME);
    for (offset, step) in path.steps.iter().enumerate() {
        let expected = if offset < VTIME / 2 { cur } else { dest };
        assert_eq!(*step, Some(expected), "wrong cell at offset {offset}");
    }
    let breakpoints: Vec<_> = path.breakpoints.iter().map(|(o, l)| (*o, *l)).collect();
    assert_eq!(breakpoints, [(0, cur), (VTIME as u32 / 2, dest)]);
}

#[test]
fn walk_from_open_ground_steps_every_85_seconds() {
    let fixture = Fixture::new();
    let world = fixture.world(SimConfig::default());
    let cur = kal(0, 0); // meadow, not a city
    let dest = kal(3, 4); // same zone, manhattan 7
    let mut rng = scene_rng(9);

    let path = VtimePath::plan(&world, cur, dest, &mut rng);
    assert_eq!(path.steps.len(), VTIME);

    // 7 unit steps, 600 / 7 = 85 seconds each, 5 residual seconds at dest
    let offsets: Vec<u32> = path.breakpoints.keys().copied().collect();
    assert_eq!(offsets, [0, 85, 170, 255, 340, 425, 510]);

    // the walk leaves the start cell immediately and ends at the destination
    assert_ne!(path.steps[0], Some(cur));
    for step in path.steps.iter().skip(510) {
        assert_eq!(*step, Some(dest));
    }

    // each breakpoint cell is one unit step from the previous cell
    let mut prev = cur;
    for cell in path.breakpoints.values() {
        let dx = prev.x.abs_diff(cell.x);
        let dy = prev.y.abs_diff(cell.y);
        assert_eq!(dx + dy, 1, "{prev} -> {cell} is not a unit step");
        prev = *cell;
    }
    assert_eq!(prev, dest);
}

#[test]
fn walk_traverses_exactly_dx_and_dy_steps() {
    let fixture = Fixture::new();
    let world = fixture.world(SimConfig::default());
    let cur = kal(0, 0);
    let dest = kal(3, 4);
    let mut rng = scene_rng(1234);

    let path = VtimePath::plan(&world, cur, dest, &mut rng);
    let horizontal = path
        .breakpoints
        .values()
        .zip(std::iter::once(&cur).chain(path.breakpoints.values()))
        .filter(|(next, prev)| next.x != prev.x)
        .count();
    assert_eq!(horizontal, 3);
    assert_eq!(path.breakpoints.len() - horizontal, 4);
}

#[test]
fn walk_leaving_a_city_prestays_three_minutes() {
    let fixture = Fixture::new();
    let world = fixture.world(SimConfig::default());
    let cur = kal(MONO.0, MONO.1); // the single-cell city "mono"
    let dest = kal(LONE.0, LONE.1); // ridge, adjacent to meadow; manhattan 9
    let mut rng = scene_rng(3);

    let path = VtimePath::plan(&world, cur, dest, &mut rng);
    assert_eq!(path.steps.len(), VTIME);

    // three minutes in place before walking out of the city
    for offset in 0..180 {
        assert_eq!(path.steps[offset], Some(cur), "moved early at {offset}");
    }
    assert_eq!(path.breakpoints.get(&0), Some(&cur));

    // 9 unit steps at 420 / 9 = 46 seconds each, starting at offset 180
    let offsets: Vec<u32> = path.breakpoints.keys().copied().collect();
    let expected: Vec<u32> = std::iter::once(0)
        .chain((0..9).map(|k| 180 + 46 * k))
        .collect();
    assert_eq!(offsets, expected);

    // 180 + 9 * 46 = 594, so the last 6 seconds pad at the destination
    for step in path.steps.iter().skip(594) {
        assert_eq!(*step, Some(dest));
    }
}

#[test]
fn walk_between_adjacent_zones_is_not_a_portal() {
    let fixture = Fixture::new();
    let world = fixture.world(SimConfig::default());
    let cur = kal(9, 3); // meadow edge, not a city
    let dest = kal(12, 3); // ridge, adjacent
    let mut rng = scene_rng(3);

    let path = VtimePath::plan(&world, cur, dest, &mut rng);
    // a portal would have exactly 2 breakpoints at 0 and 300; a 3-step walk
    // has 3, at 0, 200 and 400
    let offsets: Vec<u32> = path.breakpoints.keys().copied().collect();
    assert_eq!(offsets, [0, 200, 400]);
    assert_eq!(
        path.breakpoints.values().last(),
        Some(&LocRef::new(cur.continent, 12, 3))
    );
}
