use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use opg_common::{UsdCents, Vnd};
use rand::distributions::{Alphanumeric, DistString};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Conversion error: {0}")]
pub struct ConversionError(pub String);

//--------------------------------------   RegistrationId    ---------------------------------------------------------
/// A lightweight wrapper around the string id of a registration. The id doubles as the `vpc_MerchTxnRef` for the
/// primary payment flow, so it must be unique and unguessable.
#[derive(Clone, Debug, Type, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct RegistrationId(pub String);

impl RegistrationId {
    pub fn random() -> Self {
        Self(Alphanumeric.sample_string(&mut rand::thread_rng(), 32))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for RegistrationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<S: Into<String>> From<S> for RegistrationId {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

//--------------------------------------    PaymentStatus    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Type, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Done,
    Fail,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Done => write!(f, "done"),
            Self::Fail => write!(f, "fail"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "done" => Ok(Self::Done),
            "fail" => Ok(Self::Fail),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//-------------------------------------- RegistrationCategory ---------------------------------------------------------
/// The base category an attendee registers under. Combined with the gala-dinner flag, this selects the stored
/// option category (see [`RegistrationCategory::stored_category`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrationCategory {
    #[serde(rename = "ENT Doctors")]
    Doctor,
    #[serde(rename = "Student & Trainees")]
    Student,
}

pub const DOCTOR_CATEGORY: &str = "ENT Doctors";
pub const DOCTOR_AND_DINNER_CATEGORY: &str = "ENT Doctors + Gala Dinner";
pub const STUDENT_CATEGORY: &str = "Student & Trainees";
pub const STUDENT_AND_DINNER_CATEGORY: &str = "Student & Trainees + Gala Dinner";
/// The stand-alone gala dinner ticket. Its USD fee doubles as the per-person accompany surcharge.
pub const GALA_DINNER_ONLY_CATEGORY: &str = "Gala Dinner";

impl RegistrationCategory {
    /// The category string stored in the options table for this base category and dinner flag.
    pub fn stored_category(&self, attend_gala_dinner: bool) -> &'static str {
        match (self, attend_gala_dinner) {
            (Self::Doctor, false) => DOCTOR_CATEGORY,
            (Self::Doctor, true) => DOCTOR_AND_DINNER_CATEGORY,
            (Self::Student, false) => STUDENT_CATEGORY,
            (Self::Student, true) => STUDENT_AND_DINNER_CATEGORY,
        }
    }
}

impl FromStr for RegistrationCategory {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            DOCTOR_CATEGORY => Ok(Self::Doctor),
            STUDENT_CATEGORY => Ok(Self::Student),
            s => Err(ConversionError(format!("Unknown registration category: {s}"))),
        }
    }
}

impl Display for RegistrationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.stored_category(false))
    }
}

//-------------------------------------- RegistrationPeriod  ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrationPeriod {
    EarlyBird,
    Regular,
    OnSite,
}

impl Display for RegistrationPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EarlyBird => write!(f, "EarlyBird"),
            Self::Regular => write!(f, "Regular"),
            Self::OnSite => write!(f, "OnSite"),
        }
    }
}

//-------------------------------------- RegistrationOption  ---------------------------------------------------------
/// A purchasable tier. At most one active option exists for a given (category, subtype) pair; the table is seeded
/// once and is read-only during normal operation.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RegistrationOption {
    pub id: i64,
    pub category: String,
    /// The registration period ("EarlyBird", "Regular", "OnSite"), or None for tiers that do not vary by period.
    pub subtype: Option<String>,
    pub fee_usd: UsdCents,
    pub fee_vnd: Vnd,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------  AccompanyPerson    ---------------------------------------------------------
/// A guest attached to a registration. Stored as a JSON list on the registration row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccompanyPerson {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub middle_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub date_of_birth: String,
    #[serde(default)]
    pub payment_status: PaymentStatus,
}

//--------------------------------------    Registration     ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Registration {
    pub id: RegistrationId,
    pub registration_option_id: i64,
    pub registration_category: String,
    pub nationality: String,
    pub doctorate_degree: String,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub date_of_birth: String,
    pub institution: String,
    pub email: String,
    pub phone_number: String,
    pub sponsor: String,
    pub payment_status: PaymentStatus,
    pub accompany_persons: Json<Vec<AccompanyPerson>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Registration {
    pub fn full_name(&self) -> String {
        [self.first_name.as_str(), self.middle_name.as_str(), self.last_name.as_str()]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

//--------------------------------------   NewRegistration   ---------------------------------------------------------
/// An incoming registration request, before an id has been assigned or a fee resolved.
#[derive(Debug, Clone, Deserialize)]
pub struct NewRegistration {
    pub category: RegistrationCategory,
    pub attend_gala_dinner: bool,
    pub nationality: String,
    pub doctorate_degree: String,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub date_of_birth: String,
    pub institution: String,
    pub email: String,
    pub phone_number: String,
    pub sponsor: String,
    pub accompany_persons: Vec<AccompanyPerson>,
}

/// The nationality code that selects the home (VND / vn-locale) payment path.
pub const HOME_NATIONALITY: &str = "vn";

//--------------------------------------   AccompanyBatch    ---------------------------------------------------------
/// A batch of accompany persons awaiting payment, keyed by the add-on transaction id. The batch is written when
/// the add-on redirect URL is generated and read back when the matching `ACCOM` IPN callback arrives.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AccompanyBatch {
    pub transaction_id: String,
    pub registration_id: RegistrationId,
    pub persons: Json<Vec<AccompanyPerson>>,
    pub created_at: DateTime<Utc>,
}

/// Generates a fresh add-on transaction id: 16 random alphanumerics, the same entropy the `ORDER` tag uses.
pub fn new_transaction_id() -> String {
    Alphanumeric.sample_string(&mut rand::thread_rng(), 16)
}
