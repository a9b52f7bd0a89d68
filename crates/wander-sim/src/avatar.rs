//! Avatars: the per-second state machines the simulator drives.
//!
//! An avatar owns its current location and guild, the two change logs that
//! script its future, and the pending path for the current vtime. Each call
//! to [`Avatar::step`] advances it by one second; at vtime boundaries (the
//! pending path runs out) it first adopts the next guild and rebuilds the
//! path via the planner.
//!
//! The avatar never touches other avatars directly: location and guild
//! membership sets are updated through the world and roster handles, keyed
//! by this avatar's [`AvatarId`].

use std::fmt::Write as _;

use wander_world::location::{AvatarId, LocRef};
use wander_world::place::PlaceRef;
use wander_world::time::SECONDS_IN_VTIME;
use wander_world::world::World;
use wander_world::SceneRng;

use crate::changes::ChangeLog;
use crate::guild::{GuildId, GuildRoster};
use crate::path::VtimePath;

// ---------------------------------------------------------------------------
// Avatar
// ---------------------------------------------------------------------------

/// One avatar's simulation state.
#[derive(Debug)]
pub struct Avatar {
    /// Trace object id, `AO_<aid>`.
    object_id: String,
    /// Trace device name, `A_<aid>`.
    device: String,
    clock: i64,

    guild: Option<GuildId>,
    guild_log: ChangeLog<GuildId>,

    location: Option<LocRef>,
    place_log: ChangeLog<PlaceRef>,

    /// Pending per-second locations for the current vtime (may hold `None`
    /// entries while offline).
    future_path: VtimePath,
    /// Guild transitions recorded at the last boundary: the guild left (if
    /// any) followed by the guild joined (if any).
    guild_updates: Vec<GuildId>,
}

impl Avatar {
    /// Build an avatar from its raw dataset id and its two filled change
    /// logs.
    pub fn new(aid: &str, place_log: ChangeLog<PlaceRef>, guild_log: ChangeLog<GuildId>) -> Self {
        Self {
            object_id: format!("AO_{aid}"),
            device: format!("A_{aid}"),
            clock: -1,
            guild: None,
            guild_log,
            location: None,
            place_log,
            future_path: VtimePath::default(),
            guild_updates: Vec::new(),
        }
    }

    /// The trace object id (`AO_<aid>`).
    pub fn object_id(&self) -> &str {
        &self.object_id
    }

    /// The trace device name (`A_<aid>`).
    pub fn device(&self) -> &str {
        &self.device
    }

    #[inline]
    pub fn clock(&self) -> i64 {
        self.clock
    }

    #[inline]
    pub fn location(&self) -> Option<LocRef> {
        self.location
    }

    #[inline]
    pub fn guild(&self) -> Option<GuildId> {
        self.guild
    }

    /// Guild transitions recorded at the last vtime boundary.
    pub fn guild_updates(&self) -> &[GuildId] {
        &self.guild_updates
    }

    /// Take this vtime's path breakpoints, leaving the map empty.
    pub(crate) fn take_breakpoints(&mut self) -> std::collections::BTreeMap<u32, LocRef> {
        std::mem::take(&mut self.future_path.breakpoints)
    }

    /// Advance one second.
    ///
    /// At a vtime boundary (empty pending path) this adopts the next guild,
    /// rebuilds the path from the next place, and only then takes the step.
    pub fn step(
        &mut self,
        my_id: AvatarId,
        world: &mut World,
        guilds: &mut GuildRoster,
        rng: &mut SceneRng,
    ) {
        if self.future_path.steps.is_empty() {
            assert!(
                (self.clock + 1) % SECONDS_IN_VTIME as i64 == 0,
                "{}: path ran out mid-vtime at clock {}",
                self.object_id,
                self.clock
            );
            self.update_guild(my_id, guilds);
            self.rebuild_future_path(my_id, world, rng);
        }

        let next = self
            .future_path
            .steps
            .pop_front()
            .expect("freshly planned paths are never empty");
        self.set_location(my_id, world, next);
        self.clock += 1;
    }

    /// Move to `loc`, maintaining the membership sets on both cells.
    pub fn set_location(&mut self, my_id: AvatarId, world: &mut World, loc: Option<LocRef>) {
        if self.location == loc {
            return;
        }
        if let Some(old) = self.location {
            world.location_mut(old).remove_avatar(my_id);
        }
        self.location = loc;
        if let Some(new) = self.location {
            world.location_mut(new).add_avatar(my_id);
        }
    }

    /// Adopt the next guild from the guild log, updating membership sets and
    /// recording the net transitions.
    fn update_guild(&mut self, my_id: AvatarId, guilds: &mut GuildRoster) {
        assert_eq!(
            (self.clock + 1) / SECONDS_IN_VTIME as i64,
            self.guild_log.vclock() + 1,
            "{}: guild log is out of sync with the avatar clock",
            self.object_id
        );
        self.guild_updates.clear();
        let next = self.guild_log.advance();

        if self.guild != next {
            if let Some(old) = self.guild.take() {
                guilds.get_mut(old).remove_member(my_id);
                self.guild_updates.push(old);
            }
            self.guild = next;
            if let Some(new) = self.guild {
                guilds.get_mut(new).add_member(my_id);
                self.guild_updates.push(new);
            }
        }
    }

    /// Rebuild the pending path for the upcoming vtime.
    ///
    /// Draw order per avatar: when coming online, the placement sample
    /// first; then the destination sample; then the walk's step coins.
    fn rebuild_future_path(&mut self, my_id: AvatarId, world: &mut World, rng: &mut SceneRng) {
        assert_eq!(
            (self.clock + 1) / SECONDS_IN_VTIME as i64,
            self.place_log.vclock() + 1,
            "{}: place log is out of sync with the avatar clock",
            self.object_id
        );
        self.future_path = match self.place_log.advance() {
            None => VtimePath::offline(),
            Some(place) => {
                if self.location.is_none() {
                    // just came online: place immediately, then plan from here
                    let spawn = place.random_location(world, None, rng);
                    self.set_location(my_id, world, Some(spawn));
                }
                let cur = self.location.expect("just placed");
                let dest = place.random_location(world, Some(cur), rng);
                VtimePath::plan(world, cur, dest, rng)
            }
        };
    }

    /// Emit this second's read set into `out`.
    ///
    /// The set is `{location} ∪ location.avatars ∪ ({guild} ∪ guild.members)`,
    /// one line per object. The avatar's own object is a WRITE when writes
    /// are enabled. Emission order is fixed for reproducibility: the
    /// location, the guild, then avatar objects in ascending id order.
    pub fn generate_io(
        &self,
        my_id: AvatarId,
        world: &World,
        guilds: &GuildRoster,
        avatars: &[Avatar],
        include_writes: bool,
        out: &mut String,
    ) {
        let Some(loc) = self.location else {
            return;
        };
        let cell = world.location(loc);
        let guild = self.guild.map(|id| guilds.get(id));

        let _ = writeln!(out, "{}, {}.0, {loc}, READ", self.device, self.clock);
        if let Some(guild) = guild {
            let _ = writeln!(
                out,
                "{}, {}.0, {}, READ",
                self.device,
                self.clock,
                guild.object_id()
            );
        }

        let mut readers = cell.avatars().clone();
        if let Some(guild) = guild {
            readers.extend(guild.members().iter().copied());
        }
        for reader in readers {
            let op = if include_writes && reader == my_id {
                "WRITE"
            } else {
                "READ"
            };
            let _ = writeln!(
                out,
                "{}, {}.0, {}, {op}",
                self.device,
                self.clock,
                avatars[reader.index()].object_id()
            );
        }
    }
}
