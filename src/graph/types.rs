use rust_decimal::{Decimal, RoundingStrategy};

use crate::config::RATE_DECIMALS;
use crate::errors::{ConvertError, Result};

/// Round a rate or per-hop amount to the 4-decimal scale used everywhere
/// in the rate table (half away from zero).
pub fn round_rate(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(RATE_DECIMALS, RoundingStrategy::MidpointAwayFromZero)
}

/// Which of an edge's two stored rates a write applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDirection {
    /// currency_a -> currency_b
    Forward,
    /// currency_b -> currency_a
    Backward,
}

/// A bidirectional exchange rate between two currencies.
///
/// The two directions are stored independently so that different quotes
/// can apply each way, but a single-direction write always refreshes the
/// opposite slot with its rounded inverse. Both slots only ever move up:
/// a later, smaller quote for a direction is ignored (best rate wins).
#[derive(Debug, Clone)]
pub struct RateEdge {
    currency_a: String,
    currency_b: String,
    rate_a_to_b: Decimal,
    rate_b_to_a: Decimal,
    /// Cleared once the edge has been consumed by the route search.
    active: bool,
}

impl RateEdge {
    /// Create an edge from a single directional quote; the opposite rate
    /// is derived as the rounded inverse.
    pub fn new(from: &str, to: &str, rate: Decimal) -> Result<Self> {
        let mut edge = Self {
            currency_a: from.to_string(),
            currency_b: to.to_string(),
            rate_a_to_b: Decimal::ZERO,
            rate_b_to_a: Decimal::ZERO,
            active: true,
        };
        edge.set_rate(RateDirection::Forward, rate)?;
        Ok(edge)
    }

    pub fn touches(&self, currency: &str) -> bool {
        self.currency_a == currency || self.currency_b == currency
    }

    /// The currency on the other side of `currency`, if the edge involves it.
    pub fn other(&self, currency: &str) -> Option<&str> {
        if self.currency_a == currency {
            Some(&self.currency_b)
        } else if self.currency_b == currency {
            Some(&self.currency_a)
        } else {
            None
        }
    }

    /// The direction a `from -> other` conversion maps to, given the
    /// edge's stored slot order.
    pub fn direction_from(&self, currency: &str) -> Option<RateDirection> {
        if self.currency_a == currency {
            Some(RateDirection::Forward)
        } else if self.currency_b == currency {
            Some(RateDirection::Backward)
        } else {
            None
        }
    }

    /// Rate applied when converting out of `from`. A currency that matches
    /// neither side is a caller bug (chain/edge mismatch), not bad input.
    pub fn rate_from(&self, from: &str) -> Result<Decimal> {
        match self.direction_from(from) {
            Some(RateDirection::Forward) => Ok(self.rate_a_to_b),
            Some(RateDirection::Backward) => Ok(self.rate_b_to_a),
            None => Err(self.mismatch(from)),
        }
    }

    /// Error naming a currency that matches neither side of the edge.
    pub fn mismatch(&self, currency: &str) -> ConvertError {
        ConvertError::CurrencyMismatch {
            currency: currency.to_string(),
            pair_a: self.currency_a.clone(),
            pair_b: self.currency_b.clone(),
        }
    }

    /// Convert `amount` out of `from`, rounded to the 4-decimal scale.
    pub fn apply(&self, amount: Decimal, from: &str) -> Result<Decimal> {
        let rate = self.rate_from(from)?;
        let converted = amount
            .checked_mul(rate)
            .ok_or(ConvertError::AmountOverflow)?;
        Ok(round_rate(converted))
    }

    /// Record a directional quote.
    ///
    /// The rounded value is stored only if it is strictly greater than the
    /// rate currently held for that direction, then the opposite slot is
    /// offered the rounded inverse under the same only-if-greater rule.
    pub fn set_rate(&mut self, direction: RateDirection, value: Decimal) -> Result<()> {
        if value < Decimal::ZERO {
            return Err(ConvertError::NegativeRate(value));
        }

        let (slot, opposite) = match direction {
            RateDirection::Forward => (&mut self.rate_a_to_b, &mut self.rate_b_to_a),
            RateDirection::Backward => (&mut self.rate_b_to_a, &mut self.rate_a_to_b),
        };

        let rounded = round_rate(value);
        if rounded > *slot {
            *slot = rounded;
        }

        // A zero slot means the quote rounded away entirely; there is no
        // inverse to derive from it.
        if !slot.is_zero() {
            let inverse = round_rate(Decimal::ONE / *slot);
            if inverse > *opposite {
                *opposite = inverse;
            }
        }

        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Consume the edge. Monotonic: never reactivated within a run.
    pub fn deactivate(&mut self) {
        self.active = false;
    }
}
