//! Fixed-size pools of world items kept around a moving anchor.
//!
//! A [`ProximityRelocator`] owns the positions of `count` pooled items.  One
//! relocation pass spreads them evenly across the horizontal window and
//! scatters them randomly within the vertical window, both relative to the
//! anchor.  The next pass happens only once the anchor has moved more than
//! `trigger_distance` away (vertically) from the lowest item, so relocation
//! costs O(count) per pass rather than per frame.
//!
//! ## State machine
//!
//! `Idle` → `Relocating` → `Idle`, repeated for the whole session.  The pool
//! never grows or shrinks after construction.
//!
//! ## ECS wiring
//!
//! | Entity | Components |
//! |--------|------------|
//! | pool | [`ItemPool`] (relocator + item entity list) |
//! | item | [`PooledItem`] (back-reference), `Transform`, `Visibility` |
//! | anchor | [`RelocationAnchor`], `Transform` |

use crate::constants::{
    COIN_TRIGGER_DISTANCE, COIN_X_MAX, COIN_X_MIN, COIN_Y_MAX, COIN_Y_MIN,
    REPAIR_KIT_TRIGGER_DISTANCE, REPAIR_KIT_X_MAX, REPAIR_KIT_X_MIN, REPAIR_KIT_Y_MAX,
    REPAIR_KIT_Y_MIN,
};
use crate::state::GameState;
use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Window around the anchor in which items are placed.
///
/// Every field is required when deserialized on its own.  Config files
/// override a pool's window through [`BoundsOverride`], which falls back to
/// that pool's own defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelocationBounds {
    pub x_min: f32,
    pub x_max: f32,
    pub y_min: f32,
    pub y_max: f32,
    /// Anchor-to-lowest-item vertical distance that triggers the next pass.
    pub trigger_distance: f32,
}

impl RelocationBounds {
    pub const REPAIR_KIT: Self = Self {
        x_min: REPAIR_KIT_X_MIN,
        x_max: REPAIR_KIT_X_MAX,
        y_min: REPAIR_KIT_Y_MIN,
        y_max: REPAIR_KIT_Y_MAX,
        trigger_distance: REPAIR_KIT_TRIGGER_DISTANCE,
    };

    pub const COIN: Self = Self {
        x_min: COIN_X_MIN,
        x_max: COIN_X_MAX,
        y_min: COIN_Y_MIN,
        y_max: COIN_Y_MAX,
        trigger_distance: COIN_TRIGGER_DISTANCE,
    };
}

/// A partial `[*_bounds]` table.  Absent keys keep the base window's value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoundsOverride {
    pub x_min: Option<f32>,
    pub x_max: Option<f32>,
    pub y_min: Option<f32>,
    pub y_max: Option<f32>,
    pub trigger_distance: Option<f32>,
}

impl BoundsOverride {
    pub fn apply(self, base: RelocationBounds) -> RelocationBounds {
        RelocationBounds {
            x_min: self.x_min.unwrap_or(base.x_min),
            x_max: self.x_max.unwrap_or(base.x_max),
            y_min: self.y_min.unwrap_or(base.y_min),
            y_max: self.y_max.unwrap_or(base.y_max),
            trigger_distance: self.trigger_distance.unwrap_or(base.trigger_distance),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ItemSlot {
    pub position: Vec2,
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelocatorPhase {
    #[default]
    Idle,
    Relocating,
}

#[derive(Debug, Clone)]
pub struct ProximityRelocator {
    slots: Vec<ItemSlot>,
    bounds: RelocationBounds,
    lowest_item_height: f32,
    phase: RelocatorPhase,
    passes: u32,
}

/// Interpolation factor for slot `index` of `count`.  A single slot sits at
/// the left edge of the window.
#[inline]
pub fn horizontal_fraction(index: usize, count: usize) -> f32 {
    if count <= 1 {
        0.0
    } else {
        index as f32 / (count - 1) as f32
    }
}

impl ProximityRelocator {
    /// `count` inactive slots at the origin.
    pub fn new(count: usize, bounds: RelocationBounds) -> Self {
        Self {
            slots: vec![ItemSlot::default(); count],
            bounds,
            lowest_item_height: 0.0,
            phase: RelocatorPhase::Idle,
            passes: 0,
        }
    }

    pub fn slots(&self) -> &[ItemSlot] {
        &self.slots
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[inline]
    pub fn bounds(&self) -> RelocationBounds {
        self.bounds
    }

    #[inline]
    pub fn lowest_item_height(&self) -> f32 {
        self.lowest_item_height
    }

    #[inline]
    pub fn phase(&self) -> RelocatorPhase {
        self.phase
    }

    /// Completed relocation passes.
    #[inline]
    pub fn passes(&self) -> u32 {
        self.passes
    }

    /// Mark slot `index` as collected.  Out-of-range indices are ignored.
    pub fn deactivate(&mut self, index: usize) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.active = false;
        }
    }

    /// Forget earlier passes so the next [`update`](Self::update) relocates
    /// every slot, wherever the anchor is.
    pub fn reset(&mut self) {
        self.passes = 0;
        self.phase = RelocatorPhase::Idle;
    }

    /// Whether the anchor has left the trigger window.  Always `false` for an
    /// empty pool.
    pub fn needs_relocation(&self, anchor_y: f32) -> bool {
        !self.slots.is_empty()
            && (anchor_y - self.lowest_item_height).abs() > self.bounds.trigger_distance
    }

    /// Reposition and reactivate every slot around `anchor`.
    pub fn relocate<R: Rng + ?Sized>(&mut self, anchor: Vec2, rng: &mut R) {
        self.phase = RelocatorPhase::Relocating;

        let count = self.slots.len();
        if count == 0 {
            self.phase = RelocatorPhase::Idle;
            return;
        }

        let b = self.bounds;
        let (y_lo, y_hi) = if b.y_min <= b.y_max {
            (b.y_min, b.y_max)
        } else {
            (b.y_max, b.y_min)
        };

        let mut lowest = f32::INFINITY;
        for (i, slot) in self.slots.iter_mut().enumerate() {
            let t = horizontal_fraction(i, count);
            let x = anchor.x + b.x_min + (b.x_max - b.x_min) * t;
            let y = anchor.y + rng.gen_range(y_lo..=y_hi);
            slot.position = Vec2::new(x, y);
            slot.active = true;
            lowest = lowest.min(y);
        }

        self.lowest_item_height = lowest;
        self.passes += 1;
        self.phase = RelocatorPhase::Idle;
    }

    /// One frame of the relocation loop: the first call always relocates,
    /// later calls only when the trigger distance is exceeded.  Returns
    /// whether a pass ran.
    pub fn update<R: Rng + ?Sized>(&mut self, anchor: Vec2, rng: &mut R) -> bool {
        if self.slots.is_empty() {
            return false;
        }
        if self.passes == 0 || self.needs_relocation(anchor.y) {
            self.relocate(anchor, rng);
            return true;
        }
        false
    }
}

// ── ECS ───────────────────────────────────────────────────────────────────────

/// The entity items are kept around (the player ship).
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct RelocationAnchor;

/// A pool of item entities driven by one relocator.
#[derive(Component, Debug, Clone)]
pub struct ItemPool {
    pub relocator: ProximityRelocator,
    pub items: Vec<Entity>,
}

/// Back-reference from an item entity to its pool slot.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PooledItem {
    pub pool: Entity,
    pub index: usize,
}

pub struct RelocationPlugin;

impl Plugin for RelocationPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            relocation_system.run_if(in_state(GameState::Playing)),
        )
        .add_systems(OnExit(GameState::GameOver), reset_relocators_system);
    }
}

/// Spawn a pool entity and `count` hidden item entities built from `template`.
pub fn spawn_item_pool<B: Bundle + Clone>(
    commands: &mut Commands,
    count: usize,
    bounds: RelocationBounds,
    template: B,
    pool_extra: impl Bundle,
) -> Entity {
    let pool = commands.spawn(pool_extra).id();
    let items: Vec<Entity> = (0..count)
        .map(|index| {
            commands
                .spawn((
                    template.clone(),
                    PooledItem { pool, index },
                    Transform::default(),
                    Visibility::Hidden,
                ))
                .id()
        })
        .collect();

    commands.entity(pool).insert(ItemPool {
        relocator: ProximityRelocator::new(count, bounds),
        items,
    });
    pool
}

/// A new run starts from the origin; every pool is placed around it again.
pub fn reset_relocators_system(mut q_pools: Query<&mut ItemPool>) {
    for mut pool in q_pools.iter_mut() {
        pool.relocator.reset();
    }
}

pub fn relocation_system(
    q_anchor: Query<&Transform, With<RelocationAnchor>>,
    mut q_pools: Query<&mut ItemPool>,
    mut q_items: Query<(&mut Transform, &mut Visibility), (With<PooledItem>, Without<RelocationAnchor>)>,
) {
    let Ok(anchor) = q_anchor.single() else {
        return;
    };
    let anchor = anchor.translation.truncate();
    let mut rng = rand::thread_rng();

    for mut pool in q_pools.iter_mut() {
        if !pool.relocator.update(anchor, &mut rng) {
            continue;
        }
        for (slot, entity) in pool.relocator.slots().iter().zip(pool.items.iter()) {
            let Ok((mut transform, mut visibility)) = q_items.get_mut(*entity) else {
                continue;
            };
            transform.translation = slot.position.extend(transform.translation.z);
            *visibility = if slot.active {
                Visibility::Inherited
            } else {
                Visibility::Hidden
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn bounds() -> RelocationBounds {
        RelocationBounds {
            x_min: -100.0,
            x_max: 200.0,
            y_min: 50.0,
            y_max: 300.0,
            trigger_distance: 400.0,
        }
    }

    fn assert_within_bounds(relocator: &ProximityRelocator, anchor: Vec2) {
        let b = relocator.bounds();
        for slot in relocator.slots() {
            let offset = slot.position - anchor;
            assert!(offset.x >= b.x_min - 1e-3 && offset.x <= b.x_max + 1e-3);
            assert!(offset.y >= b.y_min - 1e-3 && offset.y <= b.y_max + 1e-3);
            assert!(slot.active);
        }
    }

    #[test]
    fn relocated_items_stay_within_window() {
        let mut rng = StdRng::seed_from_u64(11);
        let anchor = Vec2::new(40.0, 1000.0);
        for count in [1, 2, 7] {
            let mut relocator = ProximityRelocator::new(count, bounds());
            relocator.relocate(anchor, &mut rng);
            assert_eq!(relocator.len(), count);
            assert_within_bounds(&relocator, anchor);
        }
    }

    #[test]
    fn single_item_sits_at_left_edge() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut relocator = ProximityRelocator::new(1, bounds());
        relocator.relocate(Vec2::ZERO, &mut rng);
        assert_eq!(relocator.slots()[0].position.x, -100.0);
    }

    #[test]
    fn items_are_spread_evenly_across_horizontal_window() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut relocator = ProximityRelocator::new(4, bounds());
        relocator.relocate(Vec2::ZERO, &mut rng);
        let expected = [-100.0, 0.0, 100.0, 200.0];
        for (slot, x) in relocator.slots().iter().zip(expected) {
            assert!((slot.position.x - x).abs() < 1e-3, "{} != {}", slot.position.x, x);
        }
    }

    #[test]
    fn lowest_height_tracks_minimum_item() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut relocator = ProximityRelocator::new(6, bounds());
        relocator.relocate(Vec2::new(0.0, 500.0), &mut rng);
        let min_y = relocator
            .slots()
            .iter()
            .map(|s| s.position.y)
            .fold(f32::INFINITY, f32::min);
        assert_eq!(relocator.lowest_item_height(), min_y);
        assert_eq!(relocator.phase(), RelocatorPhase::Idle);
    }

    #[test]
    fn update_relocates_only_past_trigger_distance() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut relocator = ProximityRelocator::new(3, bounds());

        assert!(relocator.update(Vec2::ZERO, &mut rng));
        assert_eq!(relocator.passes(), 1);

        let lowest = relocator.lowest_item_height();
        assert!(!relocator.update(Vec2::new(0.0, lowest + 399.0), &mut rng));
        assert_eq!(relocator.passes(), 1);

        assert!(relocator.update(Vec2::new(0.0, lowest + 401.0), &mut rng));
        assert_eq!(relocator.passes(), 2);
    }

    #[test]
    fn empty_pool_never_relocates() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut relocator = ProximityRelocator::new(0, bounds());
        assert!(!relocator.needs_relocation(1.0e6));
        assert!(!relocator.update(Vec2::new(0.0, 1.0e6), &mut rng));
        relocator.relocate(Vec2::ZERO, &mut rng);
        assert_eq!(relocator.passes(), 0);
    }

    #[test]
    fn deactivate_marks_slot_until_next_pass() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut relocator = ProximityRelocator::new(2, bounds());
        relocator.relocate(Vec2::ZERO, &mut rng);
        relocator.deactivate(1);
        relocator.deactivate(99);
        assert!(!relocator.slots()[1].active);
        relocator.relocate(Vec2::ZERO, &mut rng);
        assert!(relocator.slots()[1].active);
    }

    #[test]
    fn reset_relocates_collected_items_near_the_old_anchor() {
        let mut rng = StdRng::seed_from_u64(12);
        let mut relocator = ProximityRelocator::new(2, bounds());
        relocator.update(Vec2::new(0.0, 1_000.0), &mut rng);
        relocator.deactivate(0);

        // Back at the start, still inside the trigger window.
        let start = Vec2::new(0.0, relocator.lowest_item_height() - 100.0);
        assert!(!relocator.update(start, &mut rng));

        relocator.reset();
        assert!(relocator.update(start, &mut rng));
        assert!(relocator.slots().iter().all(|slot| slot.active));
        assert_within_bounds(&relocator, start);
    }

    #[test]
    fn inverted_vertical_bounds_are_tolerated() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut b = bounds();
        std::mem::swap(&mut b.y_min, &mut b.y_max);
        let mut relocator = ProximityRelocator::new(3, b);
        relocator.relocate(Vec2::ZERO, &mut rng);
        for slot in relocator.slots() {
            assert!(slot.position.y >= 50.0 && slot.position.y <= 300.0);
        }
    }
}
