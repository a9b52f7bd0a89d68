//! Guilds and the per-scene guild arena.
//!
//! A guild only has to know which avatars are in it at all times; avatars
//! drive membership from their guild change logs at vtime boundaries.

use std::collections::BTreeSet;
use std::fmt;

use wander_world::location::AvatarId;

// ---------------------------------------------------------------------------
// GuildId
// ---------------------------------------------------------------------------

/// Index of a guild in the scene's guild arena.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GuildId(pub u32);

impl GuildId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for GuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GuildId({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// Guild
// ---------------------------------------------------------------------------

/// A guild: its trace object id and its current member set.
#[derive(Debug, Clone)]
pub struct Guild {
    object_id: String,
    members: BTreeSet<AvatarId>,
}

impl Guild {
    /// Build a guild from its raw dataset id; the object id becomes
    /// `GO_<gid>`.
    pub fn new(gid: &str) -> Self {
        Self {
            object_id: format!("GO_{gid}"),
            members: BTreeSet::new(),
        }
    }

    /// The trace object id (`GO_<gid>`).
    pub fn object_id(&self) -> &str {
        &self.object_id
    }

    /// Current members, in ascending id order.
    pub fn members(&self) -> &BTreeSet<AvatarId> {
        &self.members
    }

    pub fn add_member(&mut self, avatar: AvatarId) {
        self.members.insert(avatar);
    }

    pub fn remove_member(&mut self, avatar: AvatarId) {
        self.members.remove(&avatar);
    }
}

// ---------------------------------------------------------------------------
// GuildRoster
// ---------------------------------------------------------------------------

/// The scene's guild arena, in order of first appearance in the scene CSV.
#[derive(Debug, Default)]
pub struct GuildRoster {
    guilds: Vec<Guild>,
}

impl GuildRoster {
    pub fn new() -> Self {
        Self { guilds: Vec::new() }
    }

    /// Add a guild and return its id.
    pub fn push(&mut self, guild: Guild) -> GuildId {
        let id = GuildId(self.guilds.len() as u32);
        self.guilds.push(guild);
        id
    }

    #[inline]
    pub fn get(&self, id: GuildId) -> &Guild {
        &self.guilds[id.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, id: GuildId) -> &mut Guild {
        &mut self.guilds[id.index()]
    }

    pub fn len(&self) -> usize {
        self.guilds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guilds.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Guild> {
        self.guilds.iter()
    }
}
