#![forbid(unsafe_code)]

/// Kernel v1. Behavioral changes that alter replay hashes require kernel_v2.
pub const KERNEL_VERSION: u32 = 1;

pub mod arithmetic;
pub mod domain;
pub mod errors;
pub mod events;
pub mod state;
pub mod proximity;
pub mod hooks;
pub mod notify;
pub mod eligibility;
pub mod visibility;
pub mod invitations;
pub mod membership;
pub mod corpse;
pub mod transitions;
pub mod invariants;
pub mod hashing;
pub mod engine;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod testkit;
