//! External contract interfaces for the validator-side subsystems.
//!
//! The vault never talks to the auction directly. Delegation traffic goes
//! through a staking hub contract and reward collection goes through a
//! reward pool contract. Both report success as a `bool` / `Option` so that
//! the vault can revert the whole entry point when any single call fails.

use odra::casper_types::U512;
use odra::prelude::*;

/// Staking hub interface.
///
/// Moves CSPR between the hub's custody and validator delegations. Validators
/// are identified by their hex-encoded public key.
#[odra::external_contract]
pub trait StakingHub {
    /// Delegate `amount` motes to `validator`. The motes are attached to the
    /// call by the caller.
    fn delegate(&mut self, validator: String, amount: U512) -> bool;

    /// Undelegate `amount` motes from `validator` and return them to the
    /// caller's purse.
    fn undelegate(&mut self, validator: String, amount: U512) -> bool;

    /// Move `amount` motes of an existing delegation from one validator to
    /// another without touching the caller's purse.
    fn redelegate(&mut self, from_validator: String, to_validator: String, amount: U512) -> bool;
}

/// Reward pool interface.
///
/// Collects accumulated staking rewards for a set of validators.
#[odra::external_contract]
pub trait RewardPool {
    /// Claim pending rewards for `validators`. On success the rewards are
    /// transferred to the caller's purse and the total is returned. `None`
    /// signals that the claim could not be performed.
    fn claim_rewards(&mut self, validators: Vec<String>) -> Option<U512>;
}

/// Deployable mocks used by the test suite and local demos.
pub mod mock {
    use super::*;

    /// Mock staking hub that keeps delegated motes in its own purse.
    ///
    /// A validator key can be marked as failing to exercise the vault's
    /// all-or-nothing batch behavior.
    #[odra::module]
    pub struct StakingHubMock {
        delegations: Mapping<String, U512>,
        fail_validator: Var<String>,
    }

    #[odra::module]
    impl StakingHubMock {
        /// Mark a validator key whose operations always fail.
        pub fn set_fail_validator(&mut self, validator: String) {
            self.fail_validator.set(validator);
        }

        /// Motes currently delegated to `validator`.
        pub fn delegated_amount(&self, validator: String) -> U512 {
            self.delegations.get_or_default(&validator)
        }

        /// Accepts the delegated motes as attached value.
        #[odra(payable)]
        pub fn delegate(&mut self, validator: String, amount: U512) -> bool {
            if self.is_failing(&validator) {
                return false;
            }
            let current = self.delegations.get_or_default(&validator);
            self.delegations.set(&validator, current + amount);
            true
        }

        pub fn undelegate(&mut self, validator: String, amount: U512) -> bool {
            if self.is_failing(&validator) {
                return false;
            }
            let current = self.delegations.get_or_default(&validator);
            if current < amount {
                return false;
            }
            self.delegations.set(&validator, current - amount);
            self.env().transfer_tokens(&self.env().caller(), &amount);
            true
        }

        pub fn redelegate(
            &mut self,
            from_validator: String,
            to_validator: String,
            amount: U512,
        ) -> bool {
            if self.is_failing(&from_validator) || self.is_failing(&to_validator) {
                return false;
            }
            let from_current = self.delegations.get_or_default(&from_validator);
            if from_current < amount {
                return false;
            }
            let to_current = self.delegations.get_or_default(&to_validator);
            self.delegations.set(&from_validator, from_current - amount);
            self.delegations.set(&to_validator, to_current + amount);
            true
        }

        fn is_failing(&self, validator: &str) -> bool {
            match self.fail_validator.get() {
                Some(failing) => failing == validator,
                None => false,
            }
        }
    }

    /// Mock reward pool funded up front with the motes it will pay out.
    #[odra::module]
    pub struct RewardPoolMock {
        next_reward: Var<U512>,
        fail: Var<bool>,
    }

    #[odra::module]
    impl RewardPoolMock {
        /// Fund the pool with motes to pay out as rewards.
        #[odra(payable)]
        pub fn fund(&mut self) {}

        /// Set the amount the next claim will pay out.
        pub fn set_next_reward(&mut self, amount: U512) {
            self.next_reward.set(amount);
        }

        /// Make the next claim fail.
        pub fn set_fail(&mut self, fail: bool) {
            self.fail.set(fail);
        }

        pub fn claim_rewards(&mut self, validators: Vec<String>) -> Option<U512> {
            // The argument name has to match the external trait for the call to
            // resolve; the mock pays from a single pot regardless of validators.
            let _ = validators;
            if self.fail.get_or_default() {
                return None;
            }
            let reward = self.next_reward.get_or_default();
            if reward > U512::zero() {
                self.next_reward.set(U512::zero());
                self.env().transfer_tokens(&self.env().caller(), &reward);
            }
            Some(reward)
        }
    }
}
