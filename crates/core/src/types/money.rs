//! Monetary amounts backed by decimal arithmetic.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign, Mul, Sub};

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A monetary amount in the store currency's major units.
///
/// Wraps [`Decimal`] so money never passes through floating point. All
/// rounding is half-away-from-zero to two decimal places, matching how
/// amounts are presented to customers.
///
/// ## Examples
///
/// ```
/// use verdura_core::Money;
/// use rust_decimal::Decimal;
///
/// let price = Money::new(Decimal::new(1050, 2)); // 10.50
/// let line_total = price * 3;
/// assert_eq!(line_total, Money::new(Decimal::new(3150, 2)));
/// assert_eq!(line_total.minor_units(), Some(3150));
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero in the store currency.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new amount from a decimal value.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create an amount from whole currency units.
    #[must_use]
    pub fn from_major(units: i64) -> Self {
        Self(Decimal::from(units))
    }

    /// Get the underlying decimal value.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Round to two decimal places, half away from zero.
    #[must_use]
    pub fn round2(self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// The amount in minor units (cents), rounded half away from zero.
    ///
    /// Returns `None` if the amount does not fit in an `i64` once scaled,
    /// which no realistic order total does.
    #[must_use]
    pub fn minor_units(&self) -> Option<i64> {
        (self.0 * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
    }

    /// Percentage saved when a price moves from `old` to `new`, rounded to
    /// the nearest whole percent (half away from zero).
    ///
    /// Returns zero when `old` is not positive, since no meaningful
    /// percentage exists.
    #[must_use]
    pub fn percentage_drop(old: Self, new: Self) -> Decimal {
        if old.0 <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        ((old.0 - new.0) / old.0 * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.round2().0)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Mul<i32> for Money {
    type Output = Self;

    fn mul(self, quantity: i32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }
}

impl Mul<Decimal> for Money {
    type Output = Self;

    fn mul(self, rate: Decimal) -> Self {
        Self(self.0 * rate)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

// SQLx support (with postgres feature): stored as NUMERIC
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Money {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Money {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(amount))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Money {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
