//! sCSPR - the CEP-18 receipt token.
//!
//! sCSPR represents a claim on staked CSPR plus accrued rewards. Only the
//! minter (the Nacre vault) can mint or burn; everything else is standard
//! CEP-18 behavior delegated to the odra-modules implementation.

use odra::casper_types::U256;
use odra::prelude::*;
use odra_modules::cep18::events::{
    Burn, DecreaseAllowance, IncreaseAllowance, Mint, SetAllowance, Transfer, TransferFrom,
};
use odra_modules::cep18_token::Cep18;

/// Additional events for sCSPR
pub mod events {
    use odra::prelude::*;

    #[odra::event]
    pub struct MinterSet {
        pub old_minter: Option<Address>,
        pub new_minter: Address,
    }
}

/// Errors for token operations (aligned with CEP-18 codes where applicable)
#[odra::odra_error]
pub enum TokenError {
    InsufficientBalance = 60001,
    InsufficientAllowance = 60002,
    CannotTargetSelfUser = 60003,
    Unauthorized = 60004,
}

/// sCSPR: liquid-staking receipt token - only the vault (minter) can mint/burn
#[odra::module(
    events = [
        Mint,
        Burn,
        SetAllowance,
        IncreaseAllowance,
        DecreaseAllowance,
        Transfer,
        TransferFrom,
        events::MinterSet
    ],
    errors = TokenError
)]
pub struct SCSPRToken {
    token: SubModule<Cep18>,
    minter: Var<Address>,
}

#[odra::module]
impl SCSPRToken {
    /// Initialize the token with the minter address.
    ///
    /// The minter is typically deployed as the deployer first and handed to
    /// the vault with `set_minter` once the vault address exists.
    pub fn init(&mut self, minter: Address) {
        self.token
            .init("sCSPR".to_string(), "Nacre Staked CSPR".to_string(), 18u8, U256::zero());
        self.minter.set(minter);
        self.env().emit_event(events::MinterSet {
            old_minter: None,
            new_minter: minter,
        });
    }

    /// Get current minter
    pub fn minter(&self) -> Option<Address> {
        self.minter.get()
    }

    /// Set new minter (only current minter can call)
    pub fn set_minter(&mut self, new_minter: Address) {
        let caller = self.env().caller();
        let current_minter = self.minter.get();
        if !self.is_authorized_minter(&caller) {
            self.env().revert(TokenError::Unauthorized);
        }
        self.minter.set(new_minter);
        self.env().emit_event(events::MinterSet {
            old_minter: current_minter,
            new_minter,
        });
    }

    /// Token name
    pub fn name(&self) -> String {
        self.token.name()
    }

    /// Token symbol
    pub fn symbol(&self) -> String {
        self.token.symbol()
    }

    /// Token decimals
    pub fn decimals(&self) -> u8 {
        self.token.decimals()
    }

    /// Total supply
    pub fn total_supply(&self) -> U256 {
        self.token.total_supply()
    }

    /// Balance of an address
    pub fn balance_of(&self, owner: Address) -> U256 {
        self.token.balance_of(&owner)
    }

    /// Allowance from owner to spender
    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.token.allowance(&owner, &spender)
    }

    /// Transfer tokens
    pub fn transfer(&mut self, recipient: Address, amount: U256) {
        self.token.transfer(&recipient, &amount);
    }

    /// Approve spender
    pub fn approve(&mut self, spender: Address, amount: U256) {
        self.token.approve(&spender, &amount);
    }

    /// Increase allowance
    pub fn increase_allowance(&mut self, spender: Address, amount: U256) {
        self.token.increase_allowance(&spender, &amount);
    }

    /// Decrease allowance
    pub fn decrease_allowance(&mut self, spender: Address, amount: U256) {
        self.token.decrease_allowance(&spender, &amount);
    }

    /// Transfer from (with allowance)
    pub fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256) {
        self.token.transfer_from(&owner, &recipient, &amount);
    }

    /// Mint tokens (only minter can call)
    pub fn mint(&mut self, to: Address, amount: U256) {
        let caller = self.env().caller();
        if !self.is_authorized_minter(&caller) {
            self.env().revert(TokenError::Unauthorized);
        }
        self.token.raw_mint(&to, &amount);
    }

    /// Burn tokens from a target address (only minter can call)
    pub fn burn(&mut self, from: Address, amount: U256) {
        let caller = self.env().caller();
        if !self.is_authorized_minter(&caller) {
            self.env().revert(TokenError::Unauthorized);
        }
        self.token.raw_burn(&from, &amount);
    }

    // Minter check; compares contract package hashes as well since the vault
    // may call through either its entity or package address on Casper 2.0.
    fn is_authorized_minter(&self, caller: &Address) -> bool {
        match self.minter.get() {
            Some(minter) => {
                if &minter == caller {
                    true
                } else if let (Some(minter_pkg), Some(caller_pkg)) = (
                    minter.as_contract_package_hash(),
                    caller.as_contract_package_hash(),
                ) {
                    minter_pkg == caller_pkg
                } else {
                    false
                }
            }
            None => false,
        }
    }
}
