//! Delegation Dispatcher Tests
//!
//! Tests for the delegator-gated batch operations
//! (delegate/undelegate/redelegate/claim_rewards), including the
//! all-or-nothing behavior on partial hub failures.

use odra::prelude::*;
use odra::host::{Deployer, HostRef, NoArgs};
use odra::casper_types::{U256, U512};

use nacre_casper::staking_external::mock::{
    RewardPoolMock, RewardPoolMockHostRef, StakingHubMock, StakingHubMockHostRef,
};
use nacre_casper::tokens::{SCSPRToken, SCSPRTokenHostRef, SCSPRTokenInitArgs};
use nacre_casper::vault::{Nacre, NacreHostRef, NacreInitArgs};

const MOTES_PER_CSPR: u64 = 1_000_000_000;
const WAD: u128 = 1_000_000_000_000_000_000;

fn cspr_to_motes(cspr: u64) -> U512 {
    U512::from(cspr) * U512::from(MOTES_PER_CSPR)
}

fn v(name: &str) -> String {
    name.to_string()
}

// ==========================================
// Helper: Deploy and fund the pool
// ==========================================

/// Deploys the contracts, stakes 1000 CSPR from account 1 and authorizes
/// account 3 as the delegator bot.
fn setup(
    env: &odra::host::HostEnv,
) -> (
    SCSPRTokenHostRef,
    NacreHostRef,
    StakingHubMockHostRef,
    RewardPoolMockHostRef,
) {
    let owner = env.get_account(0);
    let user = env.get_account(1);
    let bot = env.get_account(3);

    env.set_caller(owner);
    let scspr = SCSPRToken::deploy(env, SCSPRTokenInitArgs { minter: owner });
    let hub = StakingHubMock::deploy(env, NoArgs);
    let pool = RewardPoolMock::deploy(env, NoArgs);
    let nacre = Nacre::deploy(
        env,
        NacreInitArgs {
            scspr: scspr.address(),
            staking_hub: hub.address(),
            reward_pool: pool.address(),
        },
    );

    let mut scspr_mut = SCSPRTokenHostRef::new(scspr.address(), env.clone());
    scspr_mut.set_minter(nacre.address());

    let mut nacre_mut = NacreHostRef::new(nacre.address(), env.clone());
    nacre_mut.set_delegator(bot);

    env.set_caller(user);
    nacre_mut.with_tokens(cspr_to_motes(1000)).stake();

    (scspr, nacre, hub, pool)
}

// ==========================================
// Delegate
// ==========================================

#[test]
fn test_delegate_moves_custody_to_validators() {
    let env = odra_test::env();
    let (_, nacre, hub, _) = setup(&env);
    let bot = env.get_account(3);

    env.set_caller(bot);
    let mut nacre_mut = NacreHostRef::new(nacre.address(), env.clone());
    nacre_mut.delegate(
        vec![v("validator-one"), v("validator-two")],
        vec![cspr_to_motes(300), cspr_to_motes(200)],
    );

    assert_eq!(nacre_mut.total_custody(), cspr_to_motes(500));
    assert_eq!(nacre_mut.total_delegated(), cspr_to_motes(500));
    assert_eq!(nacre_mut.liquid_balance(), cspr_to_motes(500));

    let hub_ref = StakingHubMockHostRef::new(hub.address(), env.clone());
    assert_eq!(hub_ref.delegated_amount(v("validator-one")), cspr_to_motes(300));
    assert_eq!(hub_ref.delegated_amount(v("validator-two")), cspr_to_motes(200));

    // Pool value and rate are unchanged by moving custody around
    assert_eq!(nacre_mut.total_pool_value(), cspr_to_motes(1000));
    assert_eq!(nacre_mut.exchange_rate(), U256::from(WAD));
}

#[test]
fn test_delegate_all_or_nothing_on_partial_failure() {
    let env = odra_test::env();
    let (_, nacre, hub, _) = setup(&env);
    let owner = env.get_account(0);
    let bot = env.get_account(3);

    env.set_caller(owner);
    let mut hub_mut = StakingHubMockHostRef::new(hub.address(), env.clone());
    hub_mut.set_fail_validator(v("validator-two"));

    env.set_caller(bot);
    let mut nacre_mut = NacreHostRef::new(nacre.address(), env.clone());
    let result = nacre_mut.try_delegate(
        vec![v("validator-one"), v("validator-two")],
        vec![cspr_to_motes(300), cspr_to_motes(200)],
    );
    assert!(result.is_err());

    // The successful first sub-call was rolled back with the rest
    assert_eq!(nacre_mut.total_custody(), cspr_to_motes(1000));
    assert_eq!(nacre_mut.total_delegated(), U512::zero());
    let hub_ref = StakingHubMockHostRef::new(hub.address(), env.clone());
    assert_eq!(hub_ref.delegated_amount(v("validator-one")), U512::zero());
}

#[test]
#[should_panic(expected = "Unauthorized")]
fn test_delegate_by_non_delegator_reverts() {
    let env = odra_test::env();
    let (_, nacre, _, _) = setup(&env);
    let user = env.get_account(1);

    env.set_caller(user);
    let mut nacre_mut = NacreHostRef::new(nacre.address(), env.clone());
    nacre_mut.delegate(vec![v("validator-one")], vec![cspr_to_motes(100)]);
}

#[test]
#[should_panic(expected = "ArrayLengthMismatch")]
fn test_delegate_length_mismatch_reverts() {
    let env = odra_test::env();
    let (_, nacre, _, _) = setup(&env);
    let bot = env.get_account(3);

    env.set_caller(bot);
    let mut nacre_mut = NacreHostRef::new(nacre.address(), env.clone());
    nacre_mut.delegate(
        vec![v("validator-one"), v("validator-two")],
        vec![cspr_to_motes(100)],
    );
}

#[test]
#[should_panic(expected = "ZeroAmount")]
fn test_delegate_zero_amount_reverts() {
    let env = odra_test::env();
    let (_, nacre, _, _) = setup(&env);
    let bot = env.get_account(3);

    env.set_caller(bot);
    let mut nacre_mut = NacreHostRef::new(nacre.address(), env.clone());
    nacre_mut.delegate(vec![v("validator-one")], vec![U512::zero()]);
}

#[test]
#[should_panic(expected = "InvalidValidatorKey")]
fn test_delegate_empty_validator_reverts() {
    let env = odra_test::env();
    let (_, nacre, _, _) = setup(&env);
    let bot = env.get_account(3);

    env.set_caller(bot);
    let mut nacre_mut = NacreHostRef::new(nacre.address(), env.clone());
    nacre_mut.delegate(vec![String::new()], vec![cspr_to_motes(100)]);
}

#[test]
#[should_panic(expected = "InsufficientCustody")]
fn test_delegate_more_than_custody_reverts() {
    let env = odra_test::env();
    let (_, nacre, _, _) = setup(&env);
    let bot = env.get_account(3);

    env.set_caller(bot);
    let mut nacre_mut = NacreHostRef::new(nacre.address(), env.clone());
    nacre_mut.delegate(vec![v("validator-one")], vec![cspr_to_motes(1001)]);
}

// ==========================================
// Undelegate
// ==========================================

#[test]
fn test_undelegate_returns_motes_to_custody() {
    let env = odra_test::env();
    let (_, nacre, hub, _) = setup(&env);
    let bot = env.get_account(3);

    env.set_caller(bot);
    let mut nacre_mut = NacreHostRef::new(nacre.address(), env.clone());
    nacre_mut.delegate(vec![v("validator-one")], vec![cspr_to_motes(500)]);
    nacre_mut.undelegate(vec![v("validator-one")], vec![cspr_to_motes(200)]);

    assert_eq!(nacre_mut.total_custody(), cspr_to_motes(700));
    assert_eq!(nacre_mut.total_delegated(), cspr_to_motes(300));
    assert_eq!(nacre_mut.liquid_balance(), cspr_to_motes(700));

    let hub_ref = StakingHubMockHostRef::new(hub.address(), env.clone());
    assert_eq!(hub_ref.delegated_amount(v("validator-one")), cspr_to_motes(300));
}

#[test]
fn test_undelegate_all_or_nothing_on_partial_failure() {
    let env = odra_test::env();
    let (_, nacre, hub, _) = setup(&env);
    let owner = env.get_account(0);
    let bot = env.get_account(3);

    env.set_caller(bot);
    let mut nacre_mut = NacreHostRef::new(nacre.address(), env.clone());
    nacre_mut.delegate(
        vec![v("validator-one"), v("validator-two")],
        vec![cspr_to_motes(300), cspr_to_motes(200)],
    );

    env.set_caller(owner);
    let mut hub_mut = StakingHubMockHostRef::new(hub.address(), env.clone());
    hub_mut.set_fail_validator(v("validator-two"));

    env.set_caller(bot);
    let result = nacre_mut.try_undelegate(
        vec![v("validator-one"), v("validator-two")],
        vec![cspr_to_motes(300), cspr_to_motes(200)],
    );
    assert!(result.is_err());

    // Nothing moved
    assert_eq!(nacre_mut.total_custody(), cspr_to_motes(500));
    assert_eq!(nacre_mut.total_delegated(), cspr_to_motes(500));
    let hub_ref = StakingHubMockHostRef::new(hub.address(), env.clone());
    assert_eq!(hub_ref.delegated_amount(v("validator-one")), cspr_to_motes(300));
}

#[test]
#[should_panic(expected = "InsufficientCustody")]
fn test_undelegate_more_than_delegated_reverts() {
    let env = odra_test::env();
    let (_, nacre, _, _) = setup(&env);
    let bot = env.get_account(3);

    env.set_caller(bot);
    let mut nacre_mut = NacreHostRef::new(nacre.address(), env.clone());
    nacre_mut.delegate(vec![v("validator-one")], vec![cspr_to_motes(500)]);
    nacre_mut.undelegate(vec![v("validator-one")], vec![cspr_to_motes(501)]);
}

// ==========================================
// Redelegate
// ==========================================

#[test]
fn test_redelegate_moves_between_validators() {
    let env = odra_test::env();
    let (_, nacre, hub, _) = setup(&env);
    let bot = env.get_account(3);

    env.set_caller(bot);
    let mut nacre_mut = NacreHostRef::new(nacre.address(), env.clone());
    nacre_mut.delegate(vec![v("validator-one")], vec![cspr_to_motes(500)]);
    nacre_mut.redelegate(
        vec![v("validator-one")],
        vec![v("validator-two")],
        vec![cspr_to_motes(200)],
    );

    let hub_ref = StakingHubMockHostRef::new(hub.address(), env.clone());
    assert_eq!(hub_ref.delegated_amount(v("validator-one")), cspr_to_motes(300));
    assert_eq!(hub_ref.delegated_amount(v("validator-two")), cspr_to_motes(200));

    // Custody split is untouched
    assert_eq!(nacre_mut.total_custody(), cspr_to_motes(500));
    assert_eq!(nacre_mut.total_delegated(), cspr_to_motes(500));
}

#[test]
#[should_panic(expected = "RedelegationFailed")]
fn test_redelegate_to_failing_validator_reverts() {
    let env = odra_test::env();
    let (_, nacre, hub, _) = setup(&env);
    let owner = env.get_account(0);
    let bot = env.get_account(3);

    env.set_caller(bot);
    let mut nacre_mut = NacreHostRef::new(nacre.address(), env.clone());
    nacre_mut.delegate(vec![v("validator-one")], vec![cspr_to_motes(500)]);

    env.set_caller(owner);
    let mut hub_mut = StakingHubMockHostRef::new(hub.address(), env.clone());
    hub_mut.set_fail_validator(v("validator-two"));

    env.set_caller(bot);
    nacre_mut.redelegate(
        vec![v("validator-one")],
        vec![v("validator-two")],
        vec![cspr_to_motes(200)],
    );
}

#[test]
#[should_panic(expected = "ArrayLengthMismatch")]
fn test_redelegate_length_mismatch_reverts() {
    let env = odra_test::env();
    let (_, nacre, _, _) = setup(&env);
    let bot = env.get_account(3);

    env.set_caller(bot);
    let mut nacre_mut = NacreHostRef::new(nacre.address(), env.clone());
    nacre_mut.redelegate(
        vec![v("validator-one")],
        vec![v("validator-two"), v("validator-three")],
        vec![cspr_to_motes(100)],
    );
}

// ==========================================
// Claim rewards
// ==========================================

#[test]
fn test_claim_rewards_raises_exchange_rate() {
    let env = odra_test::env();
    let (_, nacre, _, pool) = setup(&env);
    let owner = env.get_account(0);
    let bot = env.get_account(3);

    env.set_caller(owner);
    let mut pool_mut = RewardPoolMockHostRef::new(pool.address(), env.clone());
    pool_mut.with_tokens(cspr_to_motes(100)).fund();
    pool_mut.set_next_reward(cspr_to_motes(100));

    env.set_caller(bot);
    let mut nacre_mut = NacreHostRef::new(nacre.address(), env.clone());
    nacre_mut.claim_rewards(vec![v("validator-one")]);

    assert_eq!(nacre_mut.total_custody(), cspr_to_motes(1100));
    assert_eq!(nacre_mut.total_pool_value(), cspr_to_motes(1100));
    // 1100 / 1000 = 1.1
    assert_eq!(
        nacre_mut.exchange_rate(),
        U256::from(WAD) + U256::from(WAD) / U256::from(10u64)
    );
}

#[test]
fn test_claim_rewards_zero_reward_is_a_no_op() {
    let env = odra_test::env();
    let (_, nacre, _, _) = setup(&env);
    let bot = env.get_account(3);

    env.set_caller(bot);
    let mut nacre_mut = NacreHostRef::new(nacre.address(), env.clone());
    nacre_mut.claim_rewards(vec![v("validator-one")]);

    assert_eq!(nacre_mut.total_custody(), cspr_to_motes(1000));
    assert_eq!(nacre_mut.exchange_rate(), U256::from(WAD));
}

#[test]
#[should_panic(expected = "RewardClaimFailed")]
fn test_claim_rewards_failure_reverts() {
    let env = odra_test::env();
    let (_, nacre, _, pool) = setup(&env);
    let owner = env.get_account(0);
    let bot = env.get_account(3);

    env.set_caller(owner);
    let mut pool_mut = RewardPoolMockHostRef::new(pool.address(), env.clone());
    pool_mut.set_fail(true);

    env.set_caller(bot);
    let mut nacre_mut = NacreHostRef::new(nacre.address(), env.clone());
    nacre_mut.claim_rewards(vec![v("validator-one")]);
}

#[test]
#[should_panic(expected = "InvalidValidatorKey")]
fn test_claim_rewards_empty_validator_reverts() {
    let env = odra_test::env();
    let (_, nacre, _, _) = setup(&env);
    let bot = env.get_account(3);

    env.set_caller(bot);
    let mut nacre_mut = NacreHostRef::new(nacre.address(), env.clone());
    nacre_mut.claim_rewards(vec![String::new()]);
}

// ==========================================
// Role management
// ==========================================

#[test]
#[should_panic(expected = "Unauthorized")]
fn test_removed_delegator_loses_access() {
    let env = odra_test::env();
    let (_, nacre, _, _) = setup(&env);
    let owner = env.get_account(0);
    let bot = env.get_account(3);

    let mut nacre_mut = NacreHostRef::new(nacre.address(), env.clone());

    env.set_caller(owner);
    assert!(nacre_mut.is_delegator(bot));
    nacre_mut.remove_delegator(bot);
    assert!(!nacre_mut.is_delegator(bot));

    env.set_caller(bot);
    nacre_mut.delegate(vec![v("validator-one")], vec![cspr_to_motes(100)]);
}

#[test]
#[should_panic(expected = "Unauthorized")]
fn test_set_delegator_by_non_owner_reverts() {
    let env = odra_test::env();
    let (_, nacre, _, _) = setup(&env);
    let user = env.get_account(1);

    env.set_caller(user);
    let mut nacre_mut = NacreHostRef::new(nacre.address(), env.clone());
    nacre_mut.set_delegator(user);
}
