//! Per-account undelegation requests (the unbonding queue).
//!
//! A request is created by `unstake`, locked for the unbonding window, and
//! destroyed by `withdraw`. Requests are held in a `Vec` per account and
//! removed by swap-with-last, so indices are NOT stable across removals.

use crate::math;
use odra::casper_types::U256;

/// Unbonding window before a request can be withdrawn: 21 days (ms).
pub const UNBONDING_PERIOD_MS: u64 = 21 * 24 * 60 * 60 * 1000;
/// Safety buffer on top of the unbonding window: 2 hours (ms).
pub const UNBONDING_BUFFER_MS: u64 = 2 * 60 * 60 * 1000;

/// A pending undelegation request.
///
/// The payout is locked to `rate` as captured at unstake time: later reward
/// accrual never changes an already-queued withdrawal.
#[odra::odra_type]
pub struct UndelegationRequest {
    /// sCSPR amount burned for this request (wad).
    pub amount_wad: U256,
    /// Exchange rate at request time (18-decimal fixed point).
    pub rate: U256,
    /// Block time when the request was created (ms).
    pub requested_at: u64,
}

impl UndelegationRequest {
    /// Block time at which this request becomes withdrawable.
    pub fn unlock_at(&self) -> u64 {
        self.requested_at
            .saturating_add(UNBONDING_PERIOD_MS)
            .saturating_add(UNBONDING_BUFFER_MS)
    }

    /// Whether the unbonding window (plus buffer) has fully elapsed.
    pub fn is_unlockable(&self, now: u64) -> bool {
        now >= self.unlock_at()
    }

    /// Milliseconds until this request unlocks; zero once unlockable.
    pub fn remaining_ms(&self, now: u64) -> u64 {
        self.unlock_at().saturating_sub(now)
    }

    /// Native value owed for this request, in wad: `amount / rate`, truncated.
    /// `None` on a zero rate or overflow - neither occurs for values the
    /// vault records.
    pub fn payout_wad(&self) -> Option<U256> {
        math::wad_div(self.amount_wad, self.rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::WAD;

    fn request(requested_at: u64) -> UndelegationRequest {
        UndelegationRequest {
            amount_wad: U256::from(100u64) * U256::from(WAD),
            rate: U256::from(WAD),
            requested_at,
        }
    }

    #[test]
    fn locked_strictly_before_deadline() {
        let req = request(1_000);
        let deadline = 1_000 + UNBONDING_PERIOD_MS + UNBONDING_BUFFER_MS;
        assert!(!req.is_unlockable(deadline - 1));
        assert_eq!(req.remaining_ms(deadline - 1), 1);
    }

    #[test]
    fn unlockable_exactly_at_deadline() {
        let req = request(1_000);
        let deadline = 1_000 + UNBONDING_PERIOD_MS + UNBONDING_BUFFER_MS;
        assert!(req.is_unlockable(deadline));
        assert!(req.is_unlockable(deadline + 1));
        assert_eq!(req.remaining_ms(deadline), 0);
    }

    #[test]
    fn payout_locked_to_request_rate() {
        // 150 sCSPR at rate 1.5 redeems 100 CSPR worth of wad
        let req = UndelegationRequest {
            amount_wad: U256::from(150u64) * U256::from(WAD),
            rate: U256::from(WAD) * U256::from(3u64) / U256::from(2u64),
            requested_at: 0,
        };
        assert_eq!(req.payout_wad(), Some(U256::from(100u64) * U256::from(WAD)));
    }

    #[test]
    fn payout_truncates_down() {
        // 1 wad at rate 3.0 floors to 0
        let req = UndelegationRequest {
            amount_wad: U256::one(),
            rate: U256::from(3u64) * U256::from(WAD),
            requested_at: 0,
        };
        assert_eq!(req.payout_wad(), Some(U256::zero()));
    }
}
