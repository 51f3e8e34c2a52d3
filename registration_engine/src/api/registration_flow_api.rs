//! The registration flow API.
//!
//! `RegistrationFlowApi` is the single entry point the server uses: it resolves fees, builds signed payment
//! URLs, persists registrations and reconciles the gateway's IPN callbacks against stored state. It is generic
//! over the storage backend so that endpoint tests can drive it with mocks.

use chrono::Utc;
use log::*;
use opg_common::{UsdCents, Vnd};
use serde::Serialize;
use sqlx::types::Json;

use crate::{
    api::errors::RegistrationFlowError,
    db_types::{
        new_transaction_id,
        AccompanyBatch,
        AccompanyPerson,
        NewRegistration,
        PaymentStatus,
        Registration,
        RegistrationCategory,
        RegistrationId,
    },
    events::{EventProducers, PaymentConfirmedEvent},
    exchange_rate::ExchangeRateCache,
    fees::{option_key, surcharge_key, ResolvedFee},
    helpers::mask_email,
    onepay::{
        ipn::{IpnCallback, TransactionKind},
        request::{OnePayConfig, PaymentRequestBuilder},
    },
    traits::{
        AccompanyApiError,
        AccompanyManagement,
        OptionManagement,
        RegistrationApiError,
        RegistrationManagement,
    },
};

/// The outcome of a flow call that sends the client off to the gateway.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentRedirect {
    pub registration_id: RegistrationId,
    pub payment_url: String,
}

/// A fee quote for a prospective registrant. `vnd_per_usd` is the cached display rate; signed amounts never
/// use it.
#[derive(Debug, Clone, Serialize)]
pub struct OptionQuote {
    pub category: String,
    pub period: Option<String>,
    pub fee_usd: UsdCents,
    pub fee_vnd: Vnd,
    pub surcharge_usd: UsdCents,
    pub surcharge_vnd: Vnd,
    pub vnd_per_usd: f64,
}

/// What an IPN callback resolved to. Every variant is acknowledged to the gateway; the distinction only drives
/// logging and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IpnResolution {
    /// The registration's payment was confirmed by this callback.
    PaymentConfirmed(RegistrationId),
    /// The registration was marked as failed by this callback.
    PaymentFailed(RegistrationId),
    /// An accompany-person batch was merged into its registration.
    AccompanyConfirmed { registration_id: RegistrationId, count: usize },
    /// The callback matched a registration whose status had already left `pending`.
    Duplicate,
    /// The callback carried an unrecognised order tag, or reported a failed add-on payment.
    /// Acknowledged and dropped.
    Ignored,
}

#[derive(Clone)]
pub struct RegistrationFlowApi<B> {
    db: B,
    builder: PaymentRequestBuilder,
    rate_cache: ExchangeRateCache,
    producers: EventProducers,
}

impl<B> RegistrationFlowApi<B> {
    pub fn new(db: B, config: OnePayConfig, rate_cache: ExchangeRateCache, producers: EventProducers) -> Self {
        Self { db, builder: PaymentRequestBuilder::new(config), rate_cache, producers }
    }

    pub fn onepay_config(&self) -> &OnePayConfig {
        self.builder.config()
    }

    async fn emit_payment_confirmed(&self, registration: Registration) {
        let event = PaymentConfirmedEvent::new(registration);
        for producer in &self.producers.payment_confirmed_producer {
            producer.publish_event(event.clone()).await;
        }
    }
}

impl<B> RegistrationFlowApi<B>
where B: RegistrationManagement + OptionManagement
{
    /// Register an attendee and return the signed payment-redirect URL.
    ///
    /// An email with a completed registration is rejected. An email with an unpaid (pending or failed)
    /// registration supersedes it: the stale record is deleted and a fresh one takes its place, so abandoned
    /// checkouts never block a retry.
    pub async fn register(
        &self,
        new_registration: NewRegistration,
        client_ip: &str,
    ) -> Result<PaymentRedirect, RegistrationFlowError> {
        if let Some(existing) = self.db.fetch_registration_by_email(&new_registration.email).await? {
            if existing.payment_status == PaymentStatus::Done {
                info!("🚧️ Rejecting duplicate registration for {}", mask_email(&new_registration.email));
                return Err(RegistrationFlowError::EmailAlreadyRegistered(new_registration.email));
            }
            debug!("🚧️ Superseding unpaid registration [{}] for {}", existing.id, mask_email(&existing.email));
            self.db.delete_registration(&existing.id).await?;
        }

        let now = Utc::now();
        let key = option_key(new_registration.category, new_registration.attend_gala_dinner, now);
        let option = self.db.fetch_option(&key).await?;
        let accompany_count = new_registration.accompany_persons.len() as i64;
        let surcharge = match accompany_count {
            0 => None,
            _ => Some(self.db.fetch_option(&surcharge_key()).await?),
        };
        let fee = ResolvedFee::new(option.clone(), surcharge.as_ref(), accompany_count);

        let registration = build_registration(new_registration, option.id, now);
        let payment_url = self.builder.primary_payment_url(&registration, &fee, client_ip)?;
        self.db.insert_registration(registration.clone()).await?;
        info!(
            "🚧️ Registration [{}] created for {} ({}, {} accompany). Redirecting to gateway.",
            registration.id,
            mask_email(&registration.email),
            registration.registration_category,
            fee.accompany_person_count
        );
        Ok(PaymentRedirect { registration_id: registration.id, payment_url })
    }

    pub async fn fetch_registration(&self, id: &RegistrationId) -> Result<Registration, RegistrationFlowError> {
        let registration = self
            .db
            .fetch_registration_by_id(id)
            .await?
            .ok_or_else(|| RegistrationApiError::RegistrationNotFound(id.clone()))?;
        Ok(registration)
    }

    /// Quote the fee for a category and dinner flag at the current time, including the per-person surcharge and
    /// the cached display exchange rate.
    pub async fn quote_option(
        &self,
        category: RegistrationCategory,
        attend_gala_dinner: bool,
    ) -> Result<OptionQuote, RegistrationFlowError> {
        let now = Utc::now();
        let key = option_key(category, attend_gala_dinner, now);
        let option = self.db.fetch_option(&key).await?;
        let surcharge = self.db.fetch_option(&surcharge_key()).await?;
        let vnd_per_usd = self.rate_cache.vnd_per_usd(now).await;
        Ok(OptionQuote {
            category: option.category,
            period: option.subtype,
            fee_usd: option.fee_usd,
            fee_vnd: option.fee_vnd,
            surcharge_usd: surcharge.fee_usd,
            surcharge_vnd: surcharge.fee_vnd,
            vnd_per_usd,
        })
    }
}

impl<B> RegistrationFlowApi<B>
where B: RegistrationManagement + OptionManagement + AccompanyManagement
{
    /// Add accompany persons to an already-paid registration and return the add-on payment URL.
    ///
    /// The batch is parked under a fresh transaction id until the gateway confirms payment; only then is it
    /// merged into the registration (see [`Self::handle_ipn`]).
    pub async fn register_accompany_persons(
        &self,
        email: &str,
        persons: Vec<AccompanyPerson>,
        client_ip: &str,
    ) -> Result<PaymentRedirect, RegistrationFlowError> {
        if persons.is_empty() {
            return Err(RegistrationFlowError::EmptyAccompanyList);
        }
        let registration = self
            .db
            .fetch_registration_by_email(email)
            .await?
            .filter(|r| r.payment_status == PaymentStatus::Done)
            .ok_or_else(|| RegistrationFlowError::NoPaidRegistration(email.to_string()))?;

        let surcharge = self.db.fetch_option(&surcharge_key()).await?;
        let fee = ResolvedFee::accompany_only(surcharge, persons.len() as i64);
        let transaction_id = new_transaction_id();
        let persons = persons
            .into_iter()
            .map(|mut p| {
                p.payment_status = PaymentStatus::Pending;
                p
            })
            .collect::<Vec<_>>();
        let payment_url = self.builder.accompany_payment_url(&registration, &fee, &transaction_id, client_ip)?;
        let batch = AccompanyBatch {
            transaction_id: transaction_id.clone(),
            registration_id: registration.id.clone(),
            persons: Json(persons),
            created_at: Utc::now(),
        };
        self.db.save_batch(batch).await?;
        info!(
            "🚧️ Accompany batch [{transaction_id}] ({} persons) parked for registration [{}]",
            fee.accompany_person_count, registration.id
        );
        Ok(PaymentRedirect { registration_id: registration.id, payment_url })
    }

    /// Reconcile a verified IPN callback against stored state.
    ///
    /// The signature is checked first. A recognised order tag naming a registration or batch that does not
    /// exist is a not-found error; an unrecognised tag is acknowledged and dropped. A redelivered callback
    /// observes the guarded status transition fail and does nothing. The `PaymentConfirmedEvent` fires only
    /// when a transition to `done` actually applied.
    pub async fn handle_ipn(&self, callback: IpnCallback) -> Result<IpnResolution, RegistrationFlowError> {
        callback.verify_signature(self.builder.config().secure_secret.reveal())?;
        match callback.kind() {
            TransactionKind::Primary => self.reconcile_primary(&callback).await,
            TransactionKind::Accompany(transaction_id) => {
                self.reconcile_accompany(&callback, &transaction_id).await
            },
            TransactionKind::Unknown => {
                warn!(
                    "🔁️ IPN callback with unrecognised order info [{}] (txn ref [{}]). Ignoring.",
                    callback.order_info, callback.merch_txn_ref
                );
                Ok(IpnResolution::Ignored)
            },
        }
    }

    async fn reconcile_primary(&self, callback: &IpnCallback) -> Result<IpnResolution, RegistrationFlowError> {
        let id = RegistrationId::from(callback.merch_txn_ref.as_str());
        if self.db.fetch_registration_by_id(&id).await?.is_none() {
            warn!("🔁️ IPN callback for unknown registration [{id}]");
            return Err(RegistrationApiError::RegistrationNotFound(id).into());
        }
        if !callback.is_success() {
            let applied = self.db.try_transition_payment_status(&id, PaymentStatus::Fail).await?;
            info!(
                "🔁️ Payment for registration [{id}] failed (code {}, '{}'). Status {}.",
                callback.response_code,
                callback.message,
                if applied { "updated" } else { "unchanged" }
            );
            return Ok(if applied { IpnResolution::PaymentFailed(id) } else { IpnResolution::Duplicate });
        }
        let applied = self.db.try_transition_payment_status(&id, PaymentStatus::Done).await?;
        if !applied {
            debug!("🔁️ Redelivered IPN for registration [{id}]. No transition applied.");
            return Ok(IpnResolution::Duplicate);
        }
        // The primary amount covered any accompany persons submitted with the registration, so they are
        // confirmed together with the owner.
        let mut registration = self.fetch_registration(&id).await?;
        if registration.accompany_persons.0.iter().any(|p| p.payment_status != PaymentStatus::Done) {
            let persons = registration
                .accompany_persons
                .0
                .iter()
                .cloned()
                .map(|mut p| {
                    p.payment_status = PaymentStatus::Done;
                    p
                })
                .collect::<Vec<_>>();
            self.db.update_accompany_persons(&id, &persons).await?;
            registration.accompany_persons = Json(persons);
        }
        info!("🔁️ Payment confirmed for registration [{id}] ({})", mask_email(&registration.email));
        self.emit_payment_confirmed(registration).await;
        Ok(IpnResolution::PaymentConfirmed(id))
    }

    async fn reconcile_accompany(
        &self,
        callback: &IpnCallback,
        transaction_id: &str,
    ) -> Result<IpnResolution, RegistrationFlowError> {
        if !callback.is_success() {
            info!(
                "🔁️ Accompany payment [{transaction_id}] failed (code {}, '{}'). Batch left to expire.",
                callback.response_code, callback.message
            );
            return Ok(IpnResolution::Ignored);
        }
        let Some(batch) = self.db.fetch_batch(transaction_id).await? else {
            warn!("🔁️ IPN callback for unknown or expired accompany batch [{transaction_id}]");
            return Err(AccompanyApiError::BatchNotFound(transaction_id.to_string()).into());
        };
        let registration = self.fetch_registration(&batch.registration_id).await?;
        let mut persons = registration.accompany_persons.0.clone();
        let count = batch.persons.0.len();
        persons.extend(batch.persons.0.into_iter().map(|mut p| {
            p.payment_status = PaymentStatus::Done;
            p
        }));
        self.db.update_accompany_persons(&registration.id, &persons).await?;
        self.db.delete_batch(transaction_id).await?;
        info!(
            "🔁️ Accompany batch [{transaction_id}] ({count} persons) merged into registration [{}]",
            registration.id
        );
        Ok(IpnResolution::AccompanyConfirmed { registration_id: registration.id, count })
    }
}

fn build_registration(
    new_registration: NewRegistration,
    registration_option_id: i64,
    now: chrono::DateTime<Utc>,
) -> Registration {
    let persons = new_registration
        .accompany_persons
        .into_iter()
        .map(|mut p| {
            p.payment_status = PaymentStatus::Pending;
            p
        })
        .collect::<Vec<_>>();
    Registration {
        id: RegistrationId::random(),
        registration_option_id,
        registration_category: new_registration
            .category
            .stored_category(new_registration.attend_gala_dinner)
            .to_string(),
        nationality: new_registration.nationality,
        doctorate_degree: new_registration.doctorate_degree,
        first_name: new_registration.first_name,
        middle_name: new_registration.middle_name,
        last_name: new_registration.last_name,
        date_of_birth: new_registration.date_of_birth,
        institution: new_registration.institution,
        email: new_registration.email,
        phone_number: new_registration.phone_number,
        sponsor: new_registration.sponsor,
        payment_status: PaymentStatus::Pending,
        accompany_persons: Json(persons),
        created_at: now,
        updated_at: now,
    }
}
