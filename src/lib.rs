//! Nacre - Liquid Staking Vault for CSPR (Odra)
//!
//! This crate implements a liquid-staking accounting core on Casper:
//! - sCSPR: receipt token (CEP-18, 18 decimals), minted/burned only by the vault
//! - Nacre: the vault - stake/unstake/withdraw with a 21-day unbonding queue,
//!   exchange-rate accounting, and delegator-driven batch validator operations
//! - StakingHub / RewardPool: external contract interfaces for the
//!   validator-delegation and reward-distribution subsystems
//!
//! ## Units
//! - CSPR: motes (U512), 1 CSPR = 1e9 motes - the chain-native scale
//! - sCSPR and the exchange rate: wad (U256), 18 decimals, 1 sCSPR = 1e18 wad
//!
//! The two scales never mix; conversion happens only in `math`.

#![cfg_attr(target_arch = "wasm32", no_std)]

extern crate alloc;

pub mod math;
pub mod staking_external;
pub mod tokens;
pub mod undelegation;
pub mod vault;
