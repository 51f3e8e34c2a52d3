use opg_common::{UsdCents, Vnd};
use sqlx::SqliteConnection;

use crate::{db_types::RegistrationOption, fees::OptionKey, traits::OptionApiError};

pub async fn fetch_option(key: &OptionKey, conn: &mut SqliteConnection) -> Result<RegistrationOption, OptionApiError> {
    let subtype = key.subtype.map(|p| p.to_string());
    let option: Option<RegistrationOption> = sqlx::query_as(
        r#"
            SELECT * FROM registration_options
            WHERE category = $1 AND subtype IS $2 AND active = 1
            LIMIT 1
        "#,
    )
    .bind(key.category)
    .bind(&subtype)
    .fetch_optional(conn)
    .await?;
    option.ok_or_else(|| OptionApiError::OptionNotFound { category: key.category.to_string(), subtype })
}

pub async fn insert_option(
    category: &str,
    subtype: Option<&str>,
    fee_usd: UsdCents,
    fee_vnd: Vnd,
    conn: &mut SqliteConnection,
) -> Result<i64, OptionApiError> {
    let id = sqlx::query_scalar(
        r#"
            INSERT INTO registration_options (category, subtype, fee_usd, fee_vnd)
            VALUES ($1, $2, $3, $4)
            RETURNING id
        "#,
    )
    .bind(category)
    .bind(subtype)
    .bind(fee_usd)
    .bind(fee_vnd)
    .fetch_one(conn)
    .await?;
    Ok(id)
}
