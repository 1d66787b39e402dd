//! Nacre liquid-staking vault for CSPR on Casper Network.
//!
//! - Users stake CSPR and receive sCSPR at the current exchange rate
//! - Unstaking burns sCSPR and queues a time-locked undelegation request
//! - After the unbonding window (21 days + 2h buffer) the request can be
//!   withdrawn at the rate captured when it was queued
//! - An authorized delegator bot moves pooled CSPR between the vault and
//!   validators through the staking hub, all-or-nothing per batch
//!
//! ## Units
//! - CSPR: motes (U512), 1 CSPR = 1e9 motes
//! - sCSPR and the exchange rate: wad (U256), 18 decimals
//!
//! ## Pool accounting
//! The exchange rate is computed from explicitly tracked state
//! (`total_custody + total_delegated - reserved_for_unbonding`), never from
//! the purse balance, so direct CSPR donations cannot move the rate.

use crate::math;
use crate::staking_external::{RewardPoolContractRef, StakingHubContractRef};
use crate::tokens::SCSPRTokenContractRef;
use crate::undelegation::UndelegationRequest;
use alloc::vec::Vec;
use odra::casper_types::{U256, U512};
use odra::prelude::*;
use odra::ContractRef;

// ==========================================
// Constants
// ==========================================

/// Minimum stake = 0.5 CSPR
const MIN_STAKE_MOTES: u64 = 500_000_000;
/// Maximum queued undelegation requests per account
const MAX_UNDELEGATION_REQUESTS: u32 = 10;

// ==========================================
// Events
// ==========================================

pub mod events {
    use odra::prelude::*;
    use odra::casper_types::{U256, U512};

    #[odra::event]
    pub struct TokenStaked {
        pub account: Address,
        pub amount_motes: U512,
        pub minted_wad: U256,
        pub rate: U256,
    }

    #[odra::event]
    pub struct TokenUnstaked {
        pub account: Address,
        pub amount_wad: U256,
        pub payout_motes: U512,
        pub rate: U256,
    }

    #[odra::event]
    pub struct CsprWithdrawn {
        pub account: Address,
        pub amount_motes: U512,
    }

    #[odra::event]
    pub struct Delegated {
        pub validator: String,
        pub amount_motes: U512,
    }

    #[odra::event]
    pub struct Undelegated {
        pub validator: String,
        pub amount_motes: U512,
    }

    #[odra::event]
    pub struct Redelegated {
        pub from_validator: String,
        pub to_validator: String,
        pub amount_motes: U512,
    }

    #[odra::event]
    pub struct RewardsClaimed {
        pub amount_motes: U512,
    }

    #[odra::event]
    pub struct DelegatorSet {
        pub account: Address,
    }

    #[odra::event]
    pub struct DelegatorRemoved {
        pub account: Address,
    }

    #[odra::event]
    pub struct Paused {
        pub by: Address,
    }

    #[odra::event]
    pub struct Unpaused {
        pub by: Address,
    }
}

// ==========================================
// Errors
// ==========================================

#[odra::odra_error]
pub enum NacreError {
    BelowMinimumStake = 1,
    InsufficientBalance = 2,
    IndexOutOfRange = 3,
    UnbondingNotFinished = 4,
    NativeTransferFailed = 5,
    ArrayLengthMismatch = 6,
    DelegationFailed = 7,
    UndelegationFailed = 8,
    RedelegationFailed = 9,
    RewardClaimFailed = 10,
    Unauthorized = 11,
    ZeroAmount = 12,
    TooManyRequests = 13,
    InvalidValidatorKey = 14,
    InsufficientCustody = 15,
    ContractPaused = 16,
    Overflow = 17,
}

// ==========================================
// Contract
// ==========================================

#[odra::module(events = [
    events::TokenStaked,
    events::TokenUnstaked,
    events::CsprWithdrawn,
    events::Delegated,
    events::Undelegated,
    events::Redelegated,
    events::RewardsClaimed,
    events::DelegatorSet,
    events::DelegatorRemoved,
    events::Paused,
    events::Unpaused
], errors = NacreError)]
pub struct Nacre {
    // External contracts
    scspr: Var<Address>,
    staking_hub: Var<Address>,
    reward_pool: Var<Address>,

    // Per-user unbonding queue
    undelegations: Mapping<Address, Vec<UndelegationRequest>>,

    // Pool accounting (motes)
    total_custody: Var<U512>,           // CSPR held by the vault purse
    total_delegated: Var<U512>,         // CSPR moved to validators via the hub
    reserved_for_unbonding: Var<U512>,  // payouts owed to queued requests

    // Access control
    delegators: Mapping<Address, bool>,
    owner: Var<Address>,
    paused: Var<bool>,
}

#[odra::module]
impl Nacre {
    // ==========================================
    // Initialization
    // ==========================================

    /// Initialize the vault with the sCSPR token and the two validator-side
    /// contracts.
    pub fn init(&mut self, scspr: Address, staking_hub: Address, reward_pool: Address) {
        self.scspr.set(scspr);
        self.staking_hub.set(staking_hub);
        self.reward_pool.set(reward_pool);
        self.total_custody.set(U512::zero());
        self.total_delegated.set(U512::zero());
        self.reserved_for_unbonding.set(U512::zero());
        self.owner.set(self.env().caller());
        self.paused.set(false);
    }

    // ==========================================
    // User Functions
    // ==========================================

    /// Stake CSPR and receive sCSPR at the current exchange rate.
    #[odra(payable)]
    pub fn stake(&mut self) {
        self.require_not_paused();
        let caller = self.env().caller();
        let amount = self.env().attached_value();

        if amount < U512::from(MIN_STAKE_MOTES) {
            self.env().revert(NacreError::BelowMinimumStake);
        }

        // Rate before this deposit touches the pool
        let rate = self.current_rate();
        let deposit_wad = math::motes_to_wad(amount);
        let minted_wad = match math::wad_mul(deposit_wad, rate) {
            Some(minted) => minted,
            None => self.env().revert(NacreError::Overflow),
        };

        let custody = self.total_custody.get_or_default();
        self.total_custody.set(custody + amount);

        let mut scspr = self.scspr_ref();
        scspr.mint(caller, minted_wad);

        self.env().emit_event(events::TokenStaked {
            account: caller,
            amount_motes: amount,
            minted_wad,
            rate,
        });
    }

    /// Burn sCSPR and queue an undelegation request.
    ///
    /// The payout is fixed at the current rate; it becomes withdrawable once
    /// the unbonding window plus buffer has elapsed.
    pub fn unstake(&mut self, amount_wad: U256) {
        self.require_not_paused();
        let caller = self.env().caller();

        if amount_wad == U256::zero() {
            self.env().revert(NacreError::ZeroAmount);
        }

        let mut scspr = self.scspr_ref();
        let balance = scspr.balance_of(caller);
        if balance < amount_wad {
            self.env().revert(NacreError::InsufficientBalance);
        }

        let mut requests = self.undelegations.get_or_default(&caller);
        if requests.len() as u32 >= MAX_UNDELEGATION_REQUESTS {
            self.env().revert(NacreError::TooManyRequests);
        }

        let rate = self.current_rate();
        let request = UndelegationRequest {
            amount_wad,
            rate,
            requested_at: self.env().get_block_time(),
        };
        let payout_wad = match request.payout_wad() {
            Some(payout) => payout,
            None => self.env().revert(NacreError::Overflow),
        };
        let payout_motes = math::wad_to_motes(payout_wad);

        requests.push(request);
        self.undelegations.set(&caller, requests);

        // The payout leaves the pool now so the burn does not move the rate
        let reserved = self.reserved_for_unbonding.get_or_default();
        self.reserved_for_unbonding.set(reserved + payout_motes);

        scspr.burn(caller, amount_wad);

        self.env().emit_event(events::TokenUnstaked {
            account: caller,
            amount_wad,
            payout_motes,
            rate,
        });
    }

    /// Withdraw a matured undelegation request by index.
    ///
    /// Indices are positions in the account's current queue and shift on
    /// removal (swap-with-last); read `undelegation_requests` first.
    pub fn withdraw(&mut self, index: u32) {
        self.require_not_paused();
        let caller = self.env().caller();

        let mut requests = self.undelegations.get_or_default(&caller);
        if index as usize >= requests.len() {
            self.env().revert(NacreError::IndexOutOfRange);
        }

        let request = &requests[index as usize];
        let now = self.env().get_block_time();
        if !request.is_unlockable(now) {
            self.env().revert(NacreError::UnbondingNotFinished);
        }

        let payout_wad = match request.payout_wad() {
            Some(payout) => payout,
            None => self.env().revert(NacreError::Overflow),
        };
        let payout_motes = math::wad_to_motes(payout_wad);

        // The request must survive a failed payout, so check liquidity and
        // transfer before touching the queue
        if self.env().self_balance() < payout_motes {
            self.env().revert(NacreError::NativeTransferFailed);
        }
        self.env().transfer_tokens(&caller, &payout_motes);

        requests.swap_remove(index as usize);
        self.undelegations.set(&caller, requests);

        // Both counters were credited when the request was queued, so the
        // payout never exceeds them; saturate rather than guard.
        let custody = self.total_custody.get_or_default();
        self.total_custody.set(custody.saturating_sub(payout_motes));
        let reserved = self.reserved_for_unbonding.get_or_default();
        self.reserved_for_unbonding
            .set(reserved.saturating_sub(payout_motes));

        self.env().emit_event(events::CsprWithdrawn {
            account: caller,
            amount_motes: payout_motes,
        });
    }

    // ==========================================
    // Delegator Functions
    // ==========================================

    /// Delegate pooled CSPR to validators, all-or-nothing.
    ///
    /// `validators[i]` receives `amounts[i]` motes. Any single hub failure
    /// reverts the whole batch.
    pub fn delegate(&mut self, validators: Vec<String>, amounts: Vec<U512>) {
        self.require_delegator();
        self.check_batch(&validators, &amounts);

        let total = self.batch_total(&amounts);
        let custody = self.total_custody.get_or_default();
        if total > custody {
            self.env().revert(NacreError::InsufficientCustody);
        }

        let hub_addr = self.staking_hub_address();
        for (validator, amount) in validators.iter().zip(amounts.iter()) {
            let mut hub = StakingHubContractRef::new(self.env().clone(), hub_addr)
                .with_tokens(*amount);
            if !hub.delegate(validator.clone(), *amount) {
                self.env().revert(NacreError::DelegationFailed);
            }
            self.env().emit_event(events::Delegated {
                validator: validator.clone(),
                amount_motes: *amount,
            });
        }

        self.total_custody.set(custody - total);
        let delegated = self.total_delegated.get_or_default();
        self.total_delegated.set(delegated + total);
    }

    /// Undelegate CSPR from validators back into vault custody,
    /// all-or-nothing.
    pub fn undelegate(&mut self, validators: Vec<String>, amounts: Vec<U512>) {
        self.require_delegator();
        self.check_batch(&validators, &amounts);

        let total = self.batch_total(&amounts);
        let delegated = self.total_delegated.get_or_default();
        if total > delegated {
            self.env().revert(NacreError::InsufficientCustody);
        }

        let hub_addr = self.staking_hub_address();
        for (validator, amount) in validators.iter().zip(amounts.iter()) {
            let mut hub = StakingHubContractRef::new(self.env().clone(), hub_addr);
            if !hub.undelegate(validator.clone(), *amount) {
                self.env().revert(NacreError::UndelegationFailed);
            }
            self.env().emit_event(events::Undelegated {
                validator: validator.clone(),
                amount_motes: *amount,
            });
        }

        self.total_delegated.set(delegated - total);
        let custody = self.total_custody.get_or_default();
        self.total_custody.set(custody + total);
    }

    /// Move existing delegations between validators, all-or-nothing.
    /// Pool value is unchanged.
    pub fn redelegate(
        &mut self,
        from_validators: Vec<String>,
        to_validators: Vec<String>,
        amounts: Vec<U512>,
    ) {
        self.require_delegator();
        if from_validators.len() != amounts.len() || to_validators.len() != amounts.len() {
            self.env().revert(NacreError::ArrayLengthMismatch);
        }

        let hub_addr = self.staking_hub_address();
        for ((from, to), amount) in from_validators
            .iter()
            .zip(to_validators.iter())
            .zip(amounts.iter())
        {
            if from.is_empty() || to.is_empty() {
                self.env().revert(NacreError::InvalidValidatorKey);
            }
            if *amount == U512::zero() {
                self.env().revert(NacreError::ZeroAmount);
            }
            let mut hub = StakingHubContractRef::new(self.env().clone(), hub_addr);
            if !hub.redelegate(from.clone(), to.clone(), *amount) {
                self.env().revert(NacreError::RedelegationFailed);
            }
            self.env().emit_event(events::Redelegated {
                from_validator: from.clone(),
                to_validator: to.clone(),
                amount_motes: *amount,
            });
        }
    }

    /// Claim staking rewards for a set of validators into vault custody.
    /// Raises the exchange rate for all sCSPR holders.
    pub fn claim_rewards(&mut self, validators: Vec<String>) {
        self.require_delegator();
        for validator in &validators {
            if validator.is_empty() {
                self.env().revert(NacreError::InvalidValidatorKey);
            }
        }

        let pool_addr = match self.reward_pool.get() {
            Some(addr) => addr,
            None => self.env().revert(NacreError::RewardClaimFailed),
        };
        let mut pool = RewardPoolContractRef::new(self.env().clone(), pool_addr);
        let reward = match pool.claim_rewards(validators) {
            Some(reward) => reward,
            None => self.env().revert(NacreError::RewardClaimFailed),
        };

        if reward > U512::zero() {
            let custody = self.total_custody.get_or_default();
            self.total_custody.set(custody + reward);
        }

        self.env().emit_event(events::RewardsClaimed {
            amount_motes: reward,
        });
    }

    // ==========================================
    // View Functions
    // ==========================================

    /// Current exchange rate (18-decimal fixed point), recomputed from pool
    /// state on every call.
    pub fn exchange_rate(&self) -> U256 {
        self.current_rate()
    }

    /// Total pool value backing the receipt supply, in motes.
    pub fn total_pool_value(&self) -> U512 {
        let custody = self.total_custody.get_or_default();
        let delegated = self.total_delegated.get_or_default();
        let reserved = self.reserved_for_unbonding.get_or_default();
        (custody + delegated).saturating_sub(reserved)
    }

    /// All pending undelegation requests for an account.
    pub fn undelegation_requests(&self, account: Address) -> Vec<UndelegationRequest> {
        self.undelegations.get_or_default(&account)
    }

    /// Number of pending undelegation requests for an account.
    pub fn request_count(&self, account: Address) -> u32 {
        self.undelegations.get_or_default(&account).len() as u32
    }

    /// Milliseconds until a request unlocks; zero once withdrawable.
    pub fn unlock_remaining_ms(&self, account: Address, index: u32) -> u64 {
        let requests = self.undelegations.get_or_default(&account);
        if index as usize >= requests.len() {
            self.env().revert(NacreError::IndexOutOfRange);
        }
        requests[index as usize].remaining_ms(self.env().get_block_time())
    }

    /// CSPR held by the vault purse (tracked), in motes.
    pub fn total_custody(&self) -> U512 {
        self.total_custody.get_or_default()
    }

    /// CSPR delegated through the staking hub, in motes.
    pub fn total_delegated(&self) -> U512 {
        self.total_delegated.get_or_default()
    }

    /// Motes owed to queued undelegation requests.
    pub fn reserved_for_unbonding(&self) -> U512 {
        self.reserved_for_unbonding.get_or_default()
    }

    /// Actual purse balance (untracked, includes donations).
    pub fn liquid_balance(&self) -> U512 {
        self.env().self_balance()
    }

    /// sCSPR token address.
    pub fn scspr(&self) -> Option<Address> {
        self.scspr.get()
    }

    /// Whether an account is an authorized delegator.
    pub fn is_delegator(&self, account: Address) -> bool {
        self.delegators.get(&account).unwrap_or_default()
    }

    /// Contract owner.
    pub fn owner(&self) -> Option<Address> {
        self.owner.get()
    }

    /// Check if paused.
    pub fn is_paused(&self) -> bool {
        self.paused.get_or_default()
    }

    // ==========================================
    // Admin Functions
    // ==========================================

    /// Authorize an account to run delegation batches (owner only).
    pub fn set_delegator(&mut self, account: Address) {
        self.require_owner();
        self.delegators.set(&account, true);
        self.env().emit_event(events::DelegatorSet { account });
    }

    /// Revoke delegator authorization (owner only).
    pub fn remove_delegator(&mut self, account: Address) {
        self.require_owner();
        self.delegators.set(&account, false);
        self.env().emit_event(events::DelegatorRemoved { account });
    }

    /// Set staking hub address (owner only).
    pub fn set_staking_hub(&mut self, staking_hub: Address) {
        self.require_owner();
        self.staking_hub.set(staking_hub);
    }

    /// Set reward pool address (owner only).
    pub fn set_reward_pool(&mut self, reward_pool: Address) {
        self.require_owner();
        self.reward_pool.set(reward_pool);
    }

    /// Pause user entry points (owner only).
    pub fn pause(&mut self) {
        self.require_owner();
        if self.paused.get_or_default() {
            self.env().revert(NacreError::ContractPaused);
        }
        self.paused.set(true);
        self.env().emit_event(events::Paused {
            by: self.env().caller(),
        });
    }

    /// Unpause (owner only).
    pub fn unpause(&mut self) {
        self.require_owner();
        if !self.paused.get_or_default() {
            self.env().revert(NacreError::ContractPaused);
        }
        self.paused.set(false);
        self.env().emit_event(events::Unpaused {
            by: self.env().caller(),
        });
    }

    // ==========================================
    // Internal Functions
    // ==========================================

    fn require_not_paused(&self) {
        if self.paused.get_or_default() {
            self.env().revert(NacreError::ContractPaused);
        }
    }

    fn require_owner(&self) {
        if self.owner.get() != Some(self.env().caller()) {
            self.env().revert(NacreError::Unauthorized);
        }
    }

    fn require_delegator(&self) {
        let caller = self.env().caller();
        if !self.delegators.get(&caller).unwrap_or_default() {
            self.env().revert(NacreError::Unauthorized);
        }
    }

    fn current_rate(&self) -> U256 {
        let pool_value_wad = math::motes_to_wad(self.total_pool_value());
        let supply_wad = self.scspr_ref().total_supply();
        match math::exchange_rate(pool_value_wad, supply_wad) {
            Some(rate) => rate,
            None => self.env().revert(NacreError::Overflow),
        }
    }

    fn scspr_ref(&self) -> SCSPRTokenContractRef {
        let addr = match self.scspr.get() {
            Some(addr) => addr,
            None => self.env().revert(NacreError::Unauthorized),
        };
        SCSPRTokenContractRef::new(self.env().clone(), addr)
    }

    fn staking_hub_address(&self) -> Address {
        match self.staking_hub.get() {
            Some(addr) => addr,
            None => self.env().revert(NacreError::DelegationFailed),
        }
    }

    fn check_batch(&self, validators: &[String], amounts: &[U512]) {
        if validators.len() != amounts.len() {
            self.env().revert(NacreError::ArrayLengthMismatch);
        }
        for validator in validators {
            if validator.is_empty() {
                self.env().revert(NacreError::InvalidValidatorKey);
            }
        }
        for amount in amounts {
            if *amount == U512::zero() {
                self.env().revert(NacreError::ZeroAmount);
            }
        }
    }

    fn batch_total(&self, amounts: &[U512]) -> U512 {
        let mut total = U512::zero();
        for amount in amounts {
            total += *amount;
        }
        total
    }
}
