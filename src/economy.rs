//! In-game currency.
//!
//! Upgrades are priced in coins and paid through the [`Economy`] trait, so the
//! upgrade tables never touch the wallet resource directly and tests can use a
//! plain struct.

use bevy::prelude::*;

/// Something that can pay for upgrades.
pub trait Economy {
    fn balance(&self) -> u32;

    /// Deduct `amount` if affordable.  Returns `false` and leaves the balance
    /// untouched otherwise.
    fn try_decrease(&mut self, amount: u32) -> bool;

    fn increase(&mut self, amount: u32);
}

/// The player's coin balance.
#[derive(Resource, Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wallet {
    pub coins: u32,
}

impl Economy for Wallet {
    #[inline]
    fn balance(&self) -> u32 {
        self.coins
    }

    fn try_decrease(&mut self, amount: u32) -> bool {
        if self.coins < amount {
            return false;
        }
        self.coins -= amount;
        true
    }

    fn increase(&mut self, amount: u32) {
        self.coins = self.coins.saturating_add(amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_decrease_refuses_overdraft() {
        let mut wallet = Wallet { coins: 10 };
        assert!(!wallet.try_decrease(11));
        assert_eq!(wallet.coins, 10);
        assert!(wallet.try_decrease(10));
        assert_eq!(wallet.balance(), 0);
    }

    #[test]
    fn increase_saturates() {
        let mut wallet = Wallet { coins: u32::MAX - 1 };
        wallet.increase(5);
        assert_eq!(wallet.coins, u32::MAX);
    }
}
