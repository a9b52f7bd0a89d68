//! Grid cells and the handles that name them.
//!
//! A [`Location`] is one cell of a continent grid. It knows which zone and
//! (optionally) which city it lies in, and it tracks the set of avatars
//! currently standing on it. Locations are owned by their
//! [`Continent`](crate::continent::Continent) for the continent's whole
//! lifetime; everything else refers to them through the lightweight
//! [`LocRef`] handle.

use std::collections::{BTreeSet, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::city::CityId;
use crate::continent::ContinentName;
use crate::time::SECONDS_IN_VTIME;
use crate::zone::ZoneId;

// ---------------------------------------------------------------------------
// AvatarId
// ---------------------------------------------------------------------------

/// Index of an avatar in the simulator's avatar arena.
///
/// Avatars are created once per scene (in order of first appearance in the
/// scene CSV) and never removed, so a plain index is a stable handle.
/// Membership sets on [`Location`] and on guilds store these indices rather
/// than references, which is what breaks the location <-> avatar reference
/// cycle.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AvatarId(pub u32);

impl AvatarId {
    /// The arena index.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for AvatarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AvatarId({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// LocRef
// ---------------------------------------------------------------------------

/// A copyable handle to one grid cell: continent plus coordinates.
///
/// `Display` formats the handle as the trace object id, e.g. `LO_k_3_4` for
/// cell (3, 4) of the continent whose name starts with `k`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LocRef {
    pub continent: ContinentName,
    pub x: u32,
    pub y: u32,
}

impl LocRef {
    pub fn new(continent: ContinentName, x: u32, y: u32) -> Self {
        Self { continent, x, y }
    }

    /// Manhattan route to `dest`, as `(distance, xs, ys)`.
    ///
    /// `xs` holds the successive x coordinates of the unit steps toward
    /// `dest.x` (length `|dx|`), ordered first-to-last; `ys` likewise for y.
    /// For example `(0,2) -> (4,4)` yields `(6, [1,2,3,4], [3,4])`.
    ///
    /// # Panics
    ///
    /// Panics if the two cells are on different continents or the distance
    /// exceeds one vtime of unit steps.
    pub fn manhattan_to(self, dest: LocRef) -> (u32, VecDeque<u32>, VecDeque<u32>) {
        assert_eq!(
            self.continent, dest.continent,
            "{} and {} are not on the same continent",
            self, dest
        );
        let h_dist = self.x.abs_diff(dest.x);
        let v_dist = self.y.abs_diff(dest.y);
        assert!(
            h_dist + v_dist <= SECONDS_IN_VTIME,
            "manhattan distance between {} and {} is too big: {}",
            self,
            dest,
            h_dist + v_dist
        );

        let xs: VecDeque<u32> = if self.x <= dest.x {
            (self.x + 1..=dest.x).collect()
        } else {
            (dest.x..self.x).rev().collect()
        };
        let ys: VecDeque<u32> = if self.y <= dest.y {
            (self.y + 1..=dest.y).collect()
        } else {
            (dest.y..self.y).rev().collect()
        };
        (h_dist + v_dist, xs, ys)
    }
}

impl fmt::Display for LocRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LO_{}_{}_{}", self.continent.initial(), self.x, self.y)
    }
}

impl fmt::Debug for LocRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LocRef({} ({},{}))", self.continent, self.x, self.y)
    }
}

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

/// One grid cell: zone/city back-references plus the avatars standing on it.
///
/// The membership set is ordered so that read-set emission iterates avatars
/// deterministically.
#[derive(Debug, Clone)]
pub struct Location {
    x: u32,
    y: u32,
    zone: Option<ZoneId>,
    city: Option<CityId>,
    avatars: BTreeSet<AvatarId>,
}

impl Location {
    pub(crate) fn new(x: u32, y: u32) -> Self {
        Self {
            x,
            y,
            zone: None,
            city: None,
            avatars: BTreeSet::new(),
        }
    }

    #[inline]
    pub fn coords(&self) -> (u32, u32) {
        (self.x, self.y)
    }

    /// The zone this cell lies in, if any zone rectangle covers it.
    #[inline]
    pub fn zone(&self) -> Option<ZoneId> {
        self.zone
    }

    /// The city this cell lies in, if any city footprint covers it.
    #[inline]
    pub fn city(&self) -> Option<CityId> {
        self.city
    }

    #[inline]
    pub fn is_city(&self) -> bool {
        self.city.is_some()
    }

    /// Avatars currently on this cell, in ascending id order.
    pub fn avatars(&self) -> &BTreeSet<AvatarId> {
        &self.avatars
    }

    pub fn add_avatar(&mut self, avatar: AvatarId) {
        self.avatars.insert(avatar);
    }

    pub fn remove_avatar(&mut self, avatar: AvatarId) {
        self.avatars.remove(&avatar);
    }

    /// Empty the membership set (scene reset).
    pub fn reset(&mut self) {
        self.avatars.clear();
    }

    pub(crate) fn set_zone(&mut self, zone: ZoneId) {
        self.zone = Some(zone);
    }

    pub(crate) fn set_city(&mut self, city: CityId) {
        self.city = Some(city);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: u32, y: u32) -> LocRef {
        LocRef::new(ContinentName::Kalimdor, x, y)
    }

    #[test]
    fn object_id_formatting() {
        assert_eq!(at(3, 4).to_string(), "LO_k_3_4");
        assert_eq!(
            LocRef::new(ContinentName::EasternKingdoms, 0, 12).to_string(),
            "LO_e_0_12"
        );
    }

    #[test]
    fn manhattan_ascending() {
        let (d, xs, ys) = at(0, 2).manhattan_to(at(4, 4));
        assert_eq!(d, 6);
        assert_eq!(xs, [1, 2, 3, 4]);
        assert_eq!(ys, [3, 4]);
    }

    #[test]
    fn manhattan_descending() {
        let (d, xs, ys) = at(4, 4).manhattan_to(at(0, 2));
        assert_eq!(d, 6);
        assert_eq!(xs, [3, 2, 1, 0]);
        assert_eq!(ys, [3, 2]);
    }

    #[test]
    fn manhattan_mixed_directions() {
        let (d, xs, ys) = at(2, 7).manhattan_to(at(5, 3));
        assert_eq!(d, 7);
        assert_eq!(xs, [3, 4, 5]);
        assert_eq!(ys, [6, 5, 4, 3]);
    }

    #[test]
    fn manhattan_to_self_is_empty() {
        let (d, xs, ys) = at(9, 9).manhattan_to(at(9, 9));
        assert_eq!(d, 0);
        assert!(xs.is_empty());
        assert!(ys.is_empty());
    }

    #[test]
    #[should_panic(expected = "not on the same continent")]
    fn manhattan_across_continents_panics() {
        at(0, 0).manhattan_to(LocRef::new(ContinentName::Outland, 1, 1));
    }

    #[test]
    #[should_panic(expected = "too big")]
    fn manhattan_beyond_one_vtime_panics() {
        at(0, 0).manhattan_to(at(601, 0));
    }

    #[test]
    fn membership_set_is_ordered() {
        let mut loc = Location::new(0, 0);
        loc.add_avatar(AvatarId(3));
        loc.add_avatar(AvatarId(1));
        loc.add_avatar(AvatarId(2));
        loc.remove_avatar(AvatarId(2));
        let ids: Vec<_> = loc.avatars().iter().copied().collect();
        assert_eq!(ids, [AvatarId(1), AvatarId(3)]);
        loc.reset();
        assert!(loc.avatars().is_empty());
    }
}
