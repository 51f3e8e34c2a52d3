use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{AccompanyPerson, PaymentStatus, Registration, RegistrationId},
    traits::RegistrationApiError,
};

pub async fn insert_registration(
    reg: Registration,
    conn: &mut SqliteConnection,
) -> Result<(), RegistrationApiError> {
    sqlx::query(
        r#"
            INSERT INTO registrations (
                id,
                registration_option_id,
                registration_category,
                nationality,
                doctorate_degree,
                first_name,
                middle_name,
                last_name,
                date_of_birth,
                institution,
                email,
                phone_number,
                sponsor,
                payment_status,
                accompany_persons,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
        "#,
    )
    .bind(&reg.id)
    .bind(reg.registration_option_id)
    .bind(&reg.registration_category)
    .bind(&reg.nationality)
    .bind(&reg.doctorate_degree)
    .bind(&reg.first_name)
    .bind(&reg.middle_name)
    .bind(&reg.last_name)
    .bind(&reg.date_of_birth)
    .bind(&reg.institution)
    .bind(&reg.email)
    .bind(&reg.phone_number)
    .bind(&reg.sponsor)
    .bind(reg.payment_status)
    .bind(&reg.accompany_persons)
    .bind(reg.created_at)
    .bind(reg.updated_at)
    .execute(conn)
    .await?;
    debug!("🗃️ Registration [{}] inserted", reg.id);
    Ok(())
}

pub async fn fetch_registration_by_id(
    id: &RegistrationId,
    conn: &mut SqliteConnection,
) -> Result<Option<Registration>, RegistrationApiError> {
    let reg = sqlx::query_as("SELECT * FROM registrations WHERE id = $1")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(reg)
}

pub async fn fetch_registration_by_email(
    email: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Registration>, RegistrationApiError> {
    let reg = sqlx::query_as("SELECT * FROM registrations WHERE email = $1 ORDER BY created_at DESC LIMIT 1")
        .bind(email)
        .fetch_optional(conn)
        .await?;
    Ok(reg)
}

/// Conditional status transition: only applies while the row is still `pending`. Returns whether the update
/// actually landed, which is how duplicate IPN deliveries are collapsed to a single effect.
pub async fn try_transition_payment_status(
    id: &RegistrationId,
    to: PaymentStatus,
    conn: &mut SqliteConnection,
) -> Result<bool, RegistrationApiError> {
    let result = sqlx::query(
        r#"
            UPDATE registrations
            SET payment_status = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND payment_status = $3
        "#,
    )
    .bind(to)
    .bind(id)
    .bind(PaymentStatus::Pending)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn update_accompany_persons(
    id: &RegistrationId,
    persons: &[AccompanyPerson],
    conn: &mut SqliteConnection,
) -> Result<(), RegistrationApiError> {
    let payload = sqlx::types::Json(persons);
    let result = sqlx::query(
        "UPDATE registrations SET accompany_persons = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2",
    )
    .bind(payload)
    .bind(id)
    .execute(conn)
    .await?;
    if result.rows_affected() == 0 {
        return Err(RegistrationApiError::RegistrationNotFound(id.clone()));
    }
    Ok(())
}

pub async fn delete_registration(id: &RegistrationId, conn: &mut SqliteConnection) -> Result<(), RegistrationApiError> {
    sqlx::query("DELETE FROM registrations WHERE id = $1").bind(id).execute(conn).await?;
    debug!("🗃️ Registration [{id}] deleted");
    Ok(())
}
