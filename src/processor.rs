//! Transaction orchestration for buy, sell and deflate
//!
//! Every operation runs the same state machine: validate, apply inflation,
//! compute the intended change, settle external effects, commit the ledger,
//! emit events. All computation happens on a staged copy of the ledger and
//! the fallible collaborator calls run only after every computational check
//! has passed, so a failure at any point leaves the ledger untouched.
//!
//! Escrow convention: by the time an operation body runs, the caller's funds
//! (collateral for buy, tokens for sell and deflate) are already held in the
//! processor's custody account in at least the authorized maximum; unused
//! portions are refunded within the operation.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::constants::RATE_DENOMINATOR;
use crate::error::{CurveError, CurveResult};
use crate::inflation::InflationScheduler;
use crate::ledger::Ledger;
use crate::math;
use crate::pricing::{InverseSolver, PriceEngine};
use crate::{AccountId, CurveParameters};

/// Balance-holding collaborator for one token (collateral or bonded).
/// All calls are fallible; a failure aborts the enclosing operation.
pub trait TokenLedger: Send + Sync {
    fn transfer(&self, to: &AccountId, amount: u128) -> anyhow::Result<()>;
    fn mint(&self, to: &AccountId, amount: u128) -> anyhow::Result<()>;
    fn burn(&self, from: &AccountId, amount: u128) -> anyhow::Result<()>;
}

/// Read-only source of curve configuration
pub trait ParameterStore: Send + Sync {
    fn load(&self) -> anyhow::Result<CurveParameters>;
}

/// Monotonic current-time source, in seconds
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

/// Wall-clock seconds since the Unix epoch
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0)
    }
}

/// Observability events, recorded after commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    Buy {
        buyer: AccountId,
        token_amount: u128,
        collateral_amount: u128,
    },
    Sell {
        seller: AccountId,
        token_amount: u128,
        collateral_amount: u128,
    },
    Deflate {
        burner: AccountId,
        amount: u128,
    },
    RevenueCollect {
        beneficiary: AccountId,
        token_amount: u128,
    },
}

/// Result of a settled buy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuyOutcome {
    /// Tokens minted to the buyer (fee excluded)
    pub minted: u128,
    /// Liquidity-spread fee minted to the beneficiary
    pub fee: u128,
    /// Collateral absorbed by the reserve
    pub cost: u128,
    /// Unused collateral returned to the buyer
    pub refund: u128,
}

/// Result of a settled sell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SellOutcome {
    /// Tokens burned from custody
    pub burned: u128,
    /// Collateral paid to the seller
    pub proceeds: u128,
    /// Unused escrowed tokens returned to the seller
    pub refunded_tokens: u128,
}

struct Shared {
    ledger: Ledger,
    events: Vec<Event>,
}

/// Orchestrates all state-mutating operations against one bonding-curve
/// instance. The ledger lives behind a per-instance exclusive lock held for
/// the whole of each operation.
pub struct TransactionProcessor {
    params: Arc<dyn ParameterStore>,
    collateral: Arc<dyn TokenLedger>,
    token: Arc<dyn TokenLedger>,
    clock: Arc<dyn Clock>,
    /// Account holding escrowed caller funds during an operation
    custody: AccountId,
    shared: Mutex<Shared>,
}

impl TransactionProcessor {
    pub fn new(
        params: Arc<dyn ParameterStore>,
        collateral: Arc<dyn TokenLedger>,
        token: Arc<dyn TokenLedger>,
        clock: Arc<dyn Clock>,
        custody: AccountId,
    ) -> Self {
        let created_at = clock.now();
        Self {
            params,
            collateral,
            token,
            clock,
            custody,
            shared: Mutex::new(Shared {
                ledger: Ledger::new(created_at),
                events: Vec::new(),
            }),
        }
    }

    /// Current ledger snapshot
    pub fn state(&self) -> Ledger {
        self.shared.lock().ledger
    }

    /// Takes all events recorded since the last drain, oldest first
    pub fn drain_events(&self) -> Vec<Event> {
        std::mem::take(&mut self.shared.lock().events)
    }

    /// Cost to mint `amount` tokens against the current ledger, without
    /// accruing inflation or mutating anything.
    pub fn buy_quote(&self, amount: u128) -> CurveResult<u128> {
        let params = self.load_params()?;
        let ledger = self.shared.lock().ledger;
        PriceEngine::new(&ledger, params.curve.as_ref()).buy_price(amount)
    }

    /// Refund for burning `amount` tokens against the current ledger
    pub fn sell_quote(&self, amount: u128) -> CurveResult<u128> {
        let params = self.load_params()?;
        let ledger = self.shared.lock().ledger;
        PriceEngine::new(&ledger, params.curve.as_ref()).sell_price(amount)
    }

    /// Mints `desired_amount` tokens to `buyer` for at most `max_collateral`
    /// collateral. Unused collateral is refunded; the liquidity-spread fee
    /// is minted to the beneficiary on top of the buyer's amount.
    pub fn buy(
        &self,
        buyer: AccountId,
        max_collateral: u128,
        desired_amount: u128,
    ) -> CurveResult<BuyOutcome> {
        let params = self.load_params()?;
        let mut shared = self.shared.lock();
        let now = self.clock.now();
        self.buy_locked(&mut shared, &params, now, buyer, max_collateral, desired_amount)
    }

    /// Spends `collateral_amount` on as many tokens as it buys at the
    /// curve's true marginal price. Dust between the budget and the actual
    /// cost is refunded.
    pub fn buy_by_collateral(
        &self,
        buyer: AccountId,
        collateral_amount: u128,
        min_amount_out: u128,
    ) -> CurveResult<BuyOutcome> {
        let params = self.load_params()?;
        let mut shared = self.shared.lock();
        let now = self.clock.now();

        // Invert against the post-inflation state the buy itself will price on
        let mut probe = shared.ledger;
        InflationScheduler::accrue(&mut probe, params.inflation_rate_numerator, now)?;
        let amount = InverseSolver::new(PriceEngine::new(&probe, params.curve.as_ref()))
            .buy_price_inv(collateral_amount)?;
        if amount == 0 {
            return Err(CurveError::ZeroAmountResult);
        }
        if amount < min_amount_out {
            return Err(CurveError::PriceLimitViolated {
                limit: min_amount_out,
                actual: amount,
            });
        }
        self.buy_locked(&mut shared, &params, now, buyer, collateral_amount, amount)
    }

    /// Burns `sell_amount` escrowed tokens and pays the curve's refund to
    /// `seller`. No spread fee applies on sell.
    pub fn sell(
        &self,
        seller: AccountId,
        min_collateral_out: u128,
        sell_amount: u128,
    ) -> CurveResult<SellOutcome> {
        let params = self.load_params()?;
        let mut shared = self.shared.lock();
        let now = self.clock.now();
        self.sell_locked(&mut shared, &params, now, seller, min_collateral_out, sell_amount, 0)
    }

    /// Burns however many escrowed tokens are needed to pay out
    /// `collateral_target`, refunding the unused remainder of
    /// `max_amount_in` to the seller.
    pub fn sell_by_collateral(
        &self,
        seller: AccountId,
        max_amount_in: u128,
        collateral_target: u128,
    ) -> CurveResult<SellOutcome> {
        let params = self.load_params()?;
        let mut shared = self.shared.lock();
        let now = self.clock.now();

        let mut probe = shared.ledger;
        InflationScheduler::accrue(&mut probe, params.inflation_rate_numerator, now)?;
        let amount = InverseSolver::new(PriceEngine::new(&probe, params.curve.as_ref()))
            .sell_price_inv(collateral_target)?;
        if amount == 0 {
            return Err(CurveError::ZeroAmountResult);
        }
        if amount > max_amount_in {
            return Err(CurveError::PriceLimitViolated {
                limit: max_amount_in,
                actual: amount,
            });
        }

        // The escrow refund does not abort the operation on failure, unlike
        // every other settlement call; see DESIGN.md.
        let unused = max_amount_in - amount;
        if unused > 0 {
            if let Err(err) = self.token.transfer(&seller, unused) {
                tracing::warn!(%err, seller = ?seller, unused, "escrow refund transfer failed");
            }
        }

        self.sell_locked(&mut shared, &params, now, seller, collateral_target, amount, unused)
    }

    /// Burns `amount` escrowed tokens and reduces supply without touching
    /// the collateral reserve. A pure supply-reduction donation: no
    /// inflation accrual, no timestamp advance, no configuration needed.
    pub fn deflate(&self, burner: AccountId, amount: u128) -> CurveResult<()> {
        let mut shared = self.shared.lock();
        let next_supply = shared.ledger.minted_supply.checked_sub(amount).ok_or(
            CurveError::InsufficientSupply {
                requested: amount,
                supply: shared.ledger.minted_supply,
            },
        )?;

        self.token
            .burn(&self.custody, amount)
            .map_err(CurveError::Settlement)?;

        shared.ledger.minted_supply = next_supply;
        shared.events.push(Event::Deflate { burner, amount });
        tracing::info!(burner = ?burner, amount, "deflate settled");
        Ok(())
    }

    fn load_params(&self) -> CurveResult<CurveParameters> {
        let params = self
            .params
            .load()
            .map_err(|err| CurveError::Configuration(err.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    /// Resolves the beneficiary when a reward mint will happen
    fn beneficiary_for(
        params: &CurveParameters,
        reward_pending: bool,
    ) -> CurveResult<Option<AccountId>> {
        match (params.beneficiary, reward_pending) {
            (Some(account), _) => Ok(Some(account)),
            (None, false) => Ok(None),
            (None, true) => Err(CurveError::Configuration(
                "beneficiary not set but a reward mint is due".into(),
            )),
        }
    }

    fn buy_locked(
        &self,
        shared: &mut Shared,
        params: &CurveParameters,
        now: u64,
        buyer: AccountId,
        max_collateral: u128,
        desired_amount: u128,
    ) -> CurveResult<BuyOutcome> {
        // Compute phase: everything on a staged copy
        let mut stage = shared.ledger;
        let accrued = InflationScheduler::accrue(&mut stage, params.inflation_rate_numerator, now)?;

        let fee = math::scale_by_fraction(
            desired_amount,
            params.spread_fee_numerator,
            RATE_DENOMINATOR,
        )?;
        let total_mint = desired_amount
            .checked_add(fee)
            .ok_or(CurveError::ArithmeticOverflow)?;
        let cost = PriceEngine::new(&stage, params.curve.as_ref()).buy_price(total_mint)?;
        if cost == 0 {
            return Err(CurveError::ZeroAmountResult);
        }
        if cost > max_collateral {
            return Err(CurveError::PriceLimitViolated {
                limit: max_collateral,
                actual: cost,
            });
        }
        let refund = max_collateral - cost;
        let beneficiary = Self::beneficiary_for(params, accrued > 0 || fee > 0)?;

        let mut next = stage;
        next.minted_supply = next
            .minted_supply
            .checked_add(total_mint)
            .ok_or(CurveError::ArithmeticOverflow)?;
        next.held_collateral = next
            .held_collateral
            .checked_add(cost)
            .ok_or(CurveError::ArithmeticOverflow)?;

        // Settle phase
        if accrued > 0 {
            if let Some(account) = beneficiary {
                self.token
                    .mint(&account, accrued)
                    .map_err(CurveError::Settlement)?;
            }
        }
        if refund > 0 {
            self.collateral
                .transfer(&buyer, refund)
                .map_err(CurveError::Settlement)?;
        }
        self.token
            .mint(&buyer, desired_amount)
            .map_err(CurveError::Settlement)?;
        if fee > 0 {
            if let Some(account) = beneficiary {
                self.token
                    .mint(&account, fee)
                    .map_err(CurveError::Settlement)?;
            }
        }

        // Commit, then emit
        shared.ledger = next;
        if let Some(account) = beneficiary {
            if accrued > 0 {
                shared.events.push(Event::RevenueCollect {
                    beneficiary: account,
                    token_amount: accrued,
                });
            }
            if fee > 0 {
                shared.events.push(Event::RevenueCollect {
                    beneficiary: account,
                    token_amount: fee,
                });
            }
        }
        shared.events.push(Event::Buy {
            buyer,
            token_amount: desired_amount,
            collateral_amount: cost,
        });
        tracing::info!(buyer = ?buyer, minted = desired_amount, fee, cost, refund, "buy settled");
        Ok(BuyOutcome {
            minted: desired_amount,
            fee,
            cost,
            refund,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn sell_locked(
        &self,
        shared: &mut Shared,
        params: &CurveParameters,
        now: u64,
        seller: AccountId,
        min_collateral_out: u128,
        sell_amount: u128,
        refunded_tokens: u128,
    ) -> CurveResult<SellOutcome> {
        let mut stage = shared.ledger;
        let accrued = InflationScheduler::accrue(&mut stage, params.inflation_rate_numerator, now)?;

        let proceeds = PriceEngine::new(&stage, params.curve.as_ref()).sell_price(sell_amount)?;
        if proceeds == 0 {
            return Err(CurveError::ZeroAmountResult);
        }
        if proceeds < min_collateral_out {
            return Err(CurveError::PriceLimitViolated {
                limit: min_collateral_out,
                actual: proceeds,
            });
        }
        let beneficiary = Self::beneficiary_for(params, accrued > 0)?;

        let mut next = stage;
        next.minted_supply = next
            .minted_supply
            .checked_sub(sell_amount)
            .ok_or(CurveError::ArithmeticOverflow)?;
        next.held_collateral = next
            .held_collateral
            .checked_sub(proceeds)
            .ok_or(CurveError::ArithmeticOverflow)?;

        if accrued > 0 {
            if let Some(account) = beneficiary {
                self.token
                    .mint(&account, accrued)
                    .map_err(CurveError::Settlement)?;
            }
        }
        self.token
            .burn(&self.custody, sell_amount)
            .map_err(CurveError::Settlement)?;
        self.collateral
            .transfer(&seller, proceeds)
            .map_err(CurveError::Settlement)?;

        shared.ledger = next;
        if accrued > 0 {
            if let Some(account) = beneficiary {
                shared.events.push(Event::RevenueCollect {
                    beneficiary: account,
                    token_amount: accrued,
                });
            }
        }
        shared.events.push(Event::Sell {
            seller,
            token_amount: sell_amount,
            collateral_amount: proceeds,
        });
        tracing::info!(seller = ?seller, burned = sell_amount, proceeds, "sell settled");
        Ok(SellOutcome {
            burned: sell_amount,
            proceeds,
            refunded_tokens,
        })
    }
}
