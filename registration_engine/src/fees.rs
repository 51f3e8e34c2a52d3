//! Fee determination.
//!
//! A registrant's fee is a function of their base category, their gala-dinner flag, the current registration
//! period and the number of accompanying persons. The category + dinner flag select a stored option category;
//! for the doctor tier the reference time additionally selects an EarlyBird/Regular/OnSite subtype. The fee
//! table itself lives in storage ([`crate::traits::OptionManagement`]); this module owns the mapping rules and
//! the resolved result.

use chrono::{DateTime, TimeZone, Utc};
use opg_common::{UsdCents, Vnd};

use crate::db_types::{RegistrationCategory, RegistrationOption, RegistrationPeriod, GALA_DINNER_ONLY_CATEGORY};

/// Fixed VND-per-USD rate used for *signed* amounts when a non-home registrant pays. Signed amounts must be
/// reproducible, so the live exchange-rate feed is never used here (it only drives display quotes).
pub const FIXED_VND_PER_USD: f64 = 25_000.0;

/// A stored option together with the total fee for the request, including the accompany-person surcharge.
#[derive(Debug, Clone)]
pub struct ResolvedFee {
    pub option: RegistrationOption,
    pub total_usd: UsdCents,
    pub total_vnd: Vnd,
    pub accompany_person_count: i64,
}

impl ResolvedFee {
    /// Combine a stored option with the per-person surcharge option. The surcharge applies per accompanying
    /// person, independent of the attendee's own dinner flag.
    pub fn new(option: RegistrationOption, surcharge: Option<&RegistrationOption>, accompany_person_count: i64) -> Self {
        let mut total_usd = option.fee_usd;
        let mut total_vnd = option.fee_vnd;
        if let Some(surcharge) = surcharge {
            total_usd += surcharge.fee_usd * accompany_person_count;
            total_vnd += surcharge.fee_vnd * accompany_person_count;
        }
        Self { option, total_usd, total_vnd, accompany_person_count }
    }

    /// A fee for the add-on flow: the surcharge option only, multiplied by the batch size. No base fee applies,
    /// since the owning registration has already been paid for.
    pub fn accompany_only(surcharge: RegistrationOption, accompany_person_count: i64) -> Self {
        let total_usd = surcharge.fee_usd * accompany_person_count;
        let total_vnd = surcharge.fee_vnd * accompany_person_count;
        Self { option: surcharge, total_usd, total_vnd, accompany_person_count }
    }
}

/// The stored (category, subtype) pair to look up for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionKey {
    pub category: &'static str,
    pub subtype: Option<RegistrationPeriod>,
}

/// Map a base category, dinner flag and reference time to the stored option key.
///
/// Only the doctor tier is period-priced; student fees are flat across the registration window.
pub fn option_key(
    category: RegistrationCategory,
    attend_gala_dinner: bool,
    reference_time: DateTime<Utc>,
) -> OptionKey {
    let subtype = match category {
        RegistrationCategory::Doctor => Some(registration_period(reference_time)),
        RegistrationCategory::Student => None,
    };
    OptionKey { category: category.stored_category(attend_gala_dinner), subtype }
}

/// The key of the stand-alone gala-dinner option used for the accompany-person surcharge.
pub fn surcharge_key() -> OptionKey {
    OptionKey { category: GALA_DINNER_ONLY_CATEGORY, subtype: None }
}

fn early_bird_end() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 8, 31, 23, 59, 59).unwrap()
}

fn regular_end() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 31, 23, 59, 59).unwrap()
}

fn on_site_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 11, 1, 0, 0, 0).unwrap()
}

/// Determine the registration period for a reference instant.
///
/// The cutovers are exclusive on the left: at exactly the early-bird cutover the period is already `Regular`,
/// and from the on-site start onwards it is `OnSite`. The window between the regular end and the on-site start
/// falls back to `Regular`.
pub fn registration_period(now: DateTime<Utc>) -> RegistrationPeriod {
    if now < early_bird_end() {
        RegistrationPeriod::EarlyBird
    } else if now < regular_end() {
        RegistrationPeriod::Regular
    } else if now >= on_site_start() {
        RegistrationPeriod::OnSite
    } else {
        RegistrationPeriod::Regular
    }
}
