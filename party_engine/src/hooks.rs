//! Policy hooks consulted by the controller.
//!
//! A hook returning `false` vetoes the operation and the world stays as it
//! was. The share-experience hook may rescale the amount instead.

use crate::domain::{Party, Player};

pub trait PartyHooks: Send + Sync {
    fn on_disband(&self, _party: &Party) -> bool {
        true
    }

    fn on_leave(&self, _party: &Party, _player: &Player) -> bool {
        true
    }

    fn on_join(&self, _party: &Party, _player: &Player) -> bool {
        true
    }

    fn on_share_experience(&self, _party: &Party, _amount: &mut u64) {}
}

/// Stock hooks: nothing is vetoed, amounts pass through.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl PartyHooks for AllowAll {}
