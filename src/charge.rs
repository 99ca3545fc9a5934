//! Limited-use abilities: charge pools with timed recharge.
//!
//! A [`ChargePool`] holds up to `max_charges` discrete uses.  Spending one
//! starts a recharge process that restores one charge per `cooldown` until the
//! pool is full again, then stops by itself.  The process is a repeating
//! [`Timer`] stored in an `Option`, so there is never more than one per pool,
//! and cancelling it is just dropping the timer.
//!
//! ## Flow
//!
//! 1. Input writes an [`AbilityRequest`].
//! 2. [`ability_activation_system`] spends a charge from [`AbilityCharges`] and
//!    writes [`AbilityActivated`] plus a [`ChargeChanged`] with the new count.
//! 3. [`ability_recharge_system`] ticks every pool with the frame delta and
//!    writes one [`ChargeChanged`] per restored charge, in order.
//! 4. Entering `GameOver` cancels all recharges.

use crate::state::GameState;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::time::Duration;

/// A bounded pool of charges with a single cancellable recharge process.
///
/// Invariant: `0 <= charges <= max_charges`, and a recharge timer exists only
/// while `charges < max_charges`.
#[derive(Debug, Clone, Default)]
pub struct ChargePool {
    max_charges: u32,
    cooldown: Duration,
    current: u32,
    recharge: Option<Timer>,
    recharge_starts: u32,
}

/// Negative cooldowns become zero.  One too large for a `Duration` (such as
/// an infinite value from a config file) never finishes.
fn cooldown_duration(cooldown_secs: f32) -> Duration {
    Duration::try_from_secs_f32(cooldown_secs.max(0.0)).unwrap_or_else(|err| {
        warn!("Cooldown of {cooldown_secs}s is out of range ({err}); the pool will not recharge");
        Duration::MAX
    })
}

impl ChargePool {
    pub fn new(max_charges: u32, cooldown_secs: f32, start_charged: bool) -> Self {
        let mut pool = Self::default();
        pool.initialize(max_charges, cooldown_secs, start_charged);
        pool
    }

    /// Reset the pool.  Any running recharge is cancelled first; a pool that
    /// starts below capacity begins recharging immediately.
    pub fn initialize(&mut self, max_charges: u32, cooldown_secs: f32, start_charged: bool) {
        self.cancel_recharge();
        self.max_charges = max_charges;
        self.cooldown = cooldown_duration(cooldown_secs);
        self.current = if start_charged { max_charges } else { 0 };
        if self.current < self.max_charges {
            self.start_recharge();
        }
    }

    /// Change capacity and cooldown without refilling, e.g. after an upgrade.
    ///
    /// Current charges are clamped to the new capacity.  A running recharge
    /// keeps its elapsed progress and picks up the new cooldown.
    pub fn reconfigure(&mut self, max_charges: u32, cooldown_secs: f32) {
        self.max_charges = max_charges;
        self.cooldown = cooldown_duration(cooldown_secs);
        self.current = self.current.min(max_charges);

        if self.current >= self.max_charges {
            self.cancel_recharge();
        } else if let Some(timer) = self.recharge.as_mut() {
            timer.set_duration(self.cooldown);
        } else {
            self.start_recharge();
        }
    }

    #[inline]
    pub fn charges(&self) -> u32 {
        self.current
    }

    #[inline]
    pub fn max_charges(&self) -> u32 {
        self.max_charges
    }

    #[inline]
    pub fn cooldown_secs(&self) -> f32 {
        self.cooldown.as_secs_f32()
    }

    #[inline]
    pub fn has_charge(&self) -> bool {
        self.current > 0
    }

    #[inline]
    pub fn is_recharging(&self) -> bool {
        self.recharge.is_some()
    }

    /// How many recharge processes this pool has started over its lifetime.
    #[inline]
    pub fn recharge_starts(&self) -> u32 {
        self.recharge_starts
    }

    /// Progress towards the next charge in `[0, 1]`; `0.0` when idle.
    pub fn recharge_fraction(&self) -> f32 {
        self.recharge.as_ref().map_or(0.0, Timer::fraction)
    }

    /// Spend one charge.  Returns `false` without side effects when empty.
    pub fn use_charge(&mut self) -> bool {
        if self.current == 0 {
            return false;
        }
        self.current -= 1;
        if self.recharge.is_none() && self.current < self.max_charges {
            self.start_recharge();
        }
        true
    }

    /// Stop the recharge process.  Charges are left as they are.  Safe to call
    /// when nothing is running.
    pub fn cancel_recharge(&mut self) {
        self.recharge = None;
    }

    /// Advance the recharge process by `delta`.
    ///
    /// Returns the charge counts reached during this tick, lowest first; the
    /// range is empty when nothing was restored.  The timer is dropped as soon
    /// as the pool is full.
    pub fn tick(&mut self, delta: Duration) -> RangeInclusive<u32> {
        let before = self.current;
        let Some(timer) = self.recharge.as_mut() else {
            return 1..=0;
        };

        let restored = if self.cooldown.is_zero() {
            self.max_charges - self.current
        } else {
            timer.tick(delta);
            timer.times_finished_this_tick()
        };

        self.current = self
            .current
            .saturating_add(restored)
            .min(self.max_charges);
        if self.current >= self.max_charges {
            self.recharge = None;
        }

        (before + 1)..=self.current
    }

    fn start_recharge(&mut self) {
        self.recharge = Some(Timer::new(self.cooldown, TimerMode::Repeating));
        self.recharge_starts += 1;
    }
}

// ── Abilities ─────────────────────────────────────────────────────────────────

/// Player abilities backed by a charge pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Ability {
    Boost,
    EmergencyBrake,
}

impl Ability {
    pub const ALL: [Ability; 2] = [Ability::Boost, Ability::EmergencyBrake];

    #[inline]
    pub fn label(self) -> &'static str {
        match self {
            Ability::Boost => "BOOST",
            Ability::EmergencyBrake => "BRAKE",
        }
    }
}

/// Charge pools for every player ability.
///
/// Capacities and cooldowns are written by
/// [`crate::modules::sync_ability_charges`] from the upgrade tables.
#[derive(Resource, Debug, Clone, Default)]
pub struct AbilityCharges {
    pub boost: ChargePool,
    pub brake: ChargePool,
}

impl AbilityCharges {
    pub fn pool(&self, ability: Ability) -> &ChargePool {
        match ability {
            Ability::Boost => &self.boost,
            Ability::EmergencyBrake => &self.brake,
        }
    }

    pub fn pool_mut(&mut self, ability: Ability) -> &mut ChargePool {
        match ability {
            Ability::Boost => &mut self.boost,
            Ability::EmergencyBrake => &mut self.brake,
        }
    }
}

/// The charge count of `ability` changed to `charges`.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChargeChanged {
    pub ability: Ability,
    pub charges: u32,
}

/// Request to activate `ability` this frame.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbilityRequest {
    pub ability: Ability,
}

/// A charge was spent and `ability` should take effect.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbilityActivated {
    pub ability: Ability,
}

pub struct ChargePlugin;

impl Plugin for ChargePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AbilityCharges>()
            .add_message::<ChargeChanged>()
            .add_message::<AbilityRequest>()
            .add_message::<AbilityActivated>()
            .add_systems(
                Update,
                (ability_activation_system, ability_recharge_system)
                    .chain()
                    .run_if(in_state(GameState::Playing)),
            )
            .add_systems(OnEnter(GameState::GameOver), cancel_recharges_system);
    }
}

pub fn ability_activation_system(
    mut requests: MessageReader<AbilityRequest>,
    mut charges: ResMut<AbilityCharges>,
    mut changed: MessageWriter<ChargeChanged>,
    mut activated: MessageWriter<AbilityActivated>,
) {
    for request in requests.read() {
        let pool = charges.pool_mut(request.ability);
        if pool.use_charge() {
            changed.write(ChargeChanged {
                ability: request.ability,
                charges: pool.charges(),
            });
            activated.write(AbilityActivated {
                ability: request.ability,
            });
        }
    }
}

pub fn ability_recharge_system(
    time: Res<Time>,
    mut charges: ResMut<AbilityCharges>,
    mut changed: MessageWriter<ChargeChanged>,
) {
    for ability in Ability::ALL {
        for count in charges.pool_mut(ability).tick(time.delta()) {
            changed.write(ChargeChanged {
                ability,
                charges: count,
            });
        }
    }
}

pub fn cancel_recharges_system(mut charges: ResMut<AbilityCharges>) {
    for ability in Ability::ALL {
        charges.pool_mut(ability).cancel_recharge();
    }
}
