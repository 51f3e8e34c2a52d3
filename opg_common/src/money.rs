use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Sub},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

pub const VND_CURRENCY_CODE: &str = "VND";
pub const USD_CURRENCY_CODE: &str = "USD";

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as a money amount: {0}")]
pub struct MoneyConversionError(String);

//--------------------------------------        Vnd          ---------------------------------------------------------
/// An amount of Vietnamese đồng, in whole đồng. The đồng has no minor unit in practice, so the gateway's
/// "minor unit" amount is simply `value * 100`.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Vnd(i64);

impl Vnd {
    pub fn value(&self) -> i64 {
        self.0
    }

    /// The amount expressed in the gateway's minor-unit convention (`vpc_Amount`).
    pub fn to_gateway_amount(&self) -> i64 {
        self.0 * 100
    }
}

impl From<i64> for Vnd {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Add for Vnd {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Vnd {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl AddAssign for Vnd {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Mul<i64> for Vnd {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Sum for Vnd {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl Display for Vnd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}₫", self.0)
    }
}

//--------------------------------------      UsdCents       ---------------------------------------------------------
/// An amount of US dollars, in cents.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct UsdCents(i64);

impl UsdCents {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_dollars(dollars: i64) -> Self {
        Self(dollars * 100)
    }

    /// Convert to whole đồng using the given VND-per-USD rate, rounding to the nearest đồng.
    pub fn to_vnd(&self, vnd_per_usd: f64) -> Vnd {
        #[allow(clippy::cast_possible_truncation)]
        Vnd::from((self.0 as f64 * vnd_per_usd / 100.0).round() as i64)
    }
}

impl From<i64> for UsdCents {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Add for UsdCents {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for UsdCents {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl AddAssign for UsdCents {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Mul<i64> for UsdCents {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Sum for UsdCents {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl TryFrom<u64> for UsdCents {
    type Error = MoneyConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(MoneyConversionError(format!("Value {value} is too large to convert to UsdCents")))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for UsdCents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let dollars = self.0 as f64 / 100.0;
        write!(f, "${dollars:0.2}")
    }
}
