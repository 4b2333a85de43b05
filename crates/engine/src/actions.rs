//! Local simulation of CDP actions.
//!
//! The on-chain program is the authority for position state; these
//! transitions mirror what each action does so the service can show the
//! resulting position before the chain confirms it.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use sdai_common::error::AppError;
use sdai_common::types::{CdpAction, Position};

use crate::numeric::{ToDecimal, coerce_amount};

/// Share of borrowed stablecoin that ends up as collateral on BOOST,
/// and share of sold collateral value that reaches the debt on REPAY.
pub const SWAP_EFFICIENCY: Decimal = dec!(0.9);

/// Apply `action` with `amount` to a position snapshot.
///
/// `amount` is in collateral units for SUPPLY, WITHDRAW and REPAY, and in
/// stablecoin for BORROW, PAYBACK and BOOST. `price` is the current
/// collateral price, used by REPAY.
pub fn apply_action<T: ToDecimal + ?Sized>(
    position: &Position,
    action: CdpAction,
    amount: &T,
    price: Decimal,
    now: DateTime<Utc>,
) -> Result<Position, AppError> {
    let amount = coerce_amount(amount);
    if amount.is_zero() {
        return Err(AppError::Validation(
            "Amount must be greater than 0".to_string(),
        ));
    }

    let overflow = || AppError::Validation(format!("{} amount is too large", action));

    let (collateral, debt) = match action {
        CdpAction::Supply => (
            position.collateral_amount.checked_add(amount).ok_or_else(overflow)?,
            position.debt_amount,
        ),
        CdpAction::Withdraw => (
            position.collateral_amount.checked_sub(amount).ok_or_else(overflow)?,
            position.debt_amount,
        ),
        CdpAction::Borrow => (
            position.collateral_amount,
            position.debt_amount.checked_add(amount).ok_or_else(overflow)?,
        ),
        CdpAction::Payback => (
            position.collateral_amount,
            position.debt_amount.checked_sub(amount).ok_or_else(overflow)?,
        ),
        CdpAction::Boost => {
            let bought = amount.checked_mul(SWAP_EFFICIENCY).ok_or_else(overflow)?;
            (
                position.collateral_amount.checked_add(bought).ok_or_else(overflow)?,
                position.debt_amount.checked_add(amount).ok_or_else(overflow)?,
            )
        }
        CdpAction::Repay => {
            let repaid = amount
                .checked_mul(price)
                .and_then(|v| v.checked_mul(SWAP_EFFICIENCY))
                .ok_or_else(overflow)?;
            (
                position.collateral_amount.checked_sub(amount).ok_or_else(overflow)?,
                position.debt_amount.checked_sub(repaid).ok_or_else(overflow)?,
            )
        }
    };

    if collateral < Decimal::ZERO {
        return Err(AppError::Validation(format!(
            "{} would leave negative collateral",
            action
        )));
    }
    if debt < Decimal::ZERO {
        return Err(AppError::Validation(format!(
            "{} would leave negative debt",
            action
        )));
    }

    tracing::debug!(
        position_id = %position.id,
        action = %action,
        amount = %amount,
        "Applied CDP action"
    );

    Ok(Position {
        collateral_amount: collateral,
        debt_amount: debt,
        last_updated_at: now,
        ..position.clone()
    })
}
