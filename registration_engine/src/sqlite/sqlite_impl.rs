//! `SqliteDatabase` is the concrete storage backend for the registration engine.
use std::fmt::Debug;

use opg_common::{UsdCents, Vnd};
use sqlx::SqlitePool;

use super::db::{accompany, new_pool, options, registrations};
use crate::{
    db_types::{AccompanyBatch, AccompanyPerson, PaymentStatus, Registration, RegistrationId, RegistrationOption},
    fees::OptionKey,
    traits::{
        AccompanyApiError,
        AccompanyManagement,
        OptionApiError,
        OptionManagement,
        RegistrationApiError,
        RegistrationManagement,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl RegistrationManagement for SqliteDatabase {
    async fn insert_registration(&self, registration: Registration) -> Result<(), RegistrationApiError> {
        let mut conn = self.pool.acquire().await?;
        registrations::insert_registration(registration, &mut conn).await
    }

    async fn fetch_registration_by_id(
        &self,
        id: &RegistrationId,
    ) -> Result<Option<Registration>, RegistrationApiError> {
        let mut conn = self.pool.acquire().await?;
        registrations::fetch_registration_by_id(id, &mut conn).await
    }

    async fn fetch_registration_by_email(&self, email: &str) -> Result<Option<Registration>, RegistrationApiError> {
        let mut conn = self.pool.acquire().await?;
        registrations::fetch_registration_by_email(email, &mut conn).await
    }

    async fn try_transition_payment_status(
        &self,
        id: &RegistrationId,
        to: PaymentStatus,
    ) -> Result<bool, RegistrationApiError> {
        let mut conn = self.pool.acquire().await?;
        registrations::try_transition_payment_status(id, to, &mut conn).await
    }

    async fn update_accompany_persons(
        &self,
        id: &RegistrationId,
        persons: &[AccompanyPerson],
    ) -> Result<(), RegistrationApiError> {
        let mut conn = self.pool.acquire().await?;
        registrations::update_accompany_persons(id, persons, &mut conn).await
    }

    async fn delete_registration(&self, id: &RegistrationId) -> Result<(), RegistrationApiError> {
        let mut conn = self.pool.acquire().await?;
        registrations::delete_registration(id, &mut conn).await
    }
}

impl OptionManagement for SqliteDatabase {
    async fn fetch_option(&self, key: &OptionKey) -> Result<RegistrationOption, OptionApiError> {
        let mut conn = self.pool.acquire().await?;
        options::fetch_option(key, &mut conn).await
    }

    async fn insert_option(
        &self,
        category: &str,
        subtype: Option<&str>,
        fee_usd: UsdCents,
        fee_vnd: Vnd,
    ) -> Result<i64, OptionApiError> {
        let mut conn = self.pool.acquire().await?;
        options::insert_option(category, subtype, fee_usd, fee_vnd, &mut conn).await
    }
}

impl AccompanyManagement for SqliteDatabase {
    async fn save_batch(&self, batch: AccompanyBatch) -> Result<(), AccompanyApiError> {
        let mut conn = self.pool.acquire().await?;
        accompany::save_batch(batch, &mut conn).await
    }

    async fn fetch_batch(&self, transaction_id: &str) -> Result<Option<AccompanyBatch>, AccompanyApiError> {
        let mut conn = self.pool.acquire().await?;
        accompany::fetch_batch(transaction_id, &mut conn).await
    }

    async fn delete_batch(&self, transaction_id: &str) -> Result<(), AccompanyApiError> {
        let mut conn = self.pool.acquire().await?;
        accompany::delete_batch(transaction_id, &mut conn).await
    }
}
