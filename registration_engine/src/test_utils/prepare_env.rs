use std::path::Path;

use log::*;
use opg_common::{UsdCents, Vnd};
use sqlx::{migrate, migrate::MigrateDatabase, Sqlite};

use crate::{
    db_types::{
        DOCTOR_AND_DINNER_CATEGORY,
        DOCTOR_CATEGORY,
        GALA_DINNER_ONLY_CATEGORY,
        STUDENT_AND_DINNER_CATEGORY,
        STUDENT_CATEGORY,
    },
    traits::OptionManagement,
    SqliteDatabase,
};

pub async fn prepare_test_env(url: &str) {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    create_database(url).await;
    run_migrations(url).await;
}

pub fn random_db_path() -> String {
    let dir = std::env::temp_dir().join("opg_test_dbs");
    let _ = std::fs::create_dir_all(&dir);
    format!("sqlite://{}/registrations_{}.db", dir.display(), rand::random::<u64>())
}

pub async fn run_migrations(url: &str) {
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating connection to database");
    migrate!("./migrations").run(db.pool()).await.expect("Error running DB migrations");
    info!("🚀️ Migrations complete");
}

pub async fn create_database<P: AsRef<Path>>(path: P) {
    let p = path.as_ref().as_os_str().to_str().unwrap();
    if let Err(e) = Sqlite::drop_database(p).await {
        warn!("Error dropping database {p}: {e:?}");
    }
    Sqlite::create_database(p).await.expect("Error creating database");
    info!("Created Sqlite database {p}");
}

/// Seed the option table with the event's fee schedule. Periodized fees for doctors, flat fees for students,
/// and the stand-alone gala-dinner ticket used for accompany-person surcharges.
pub async fn seed_default_options(db: &SqliteDatabase) {
    let options: &[(&str, Option<&str>, i64, i64)] = &[
        (DOCTOR_CATEGORY, Some("EarlyBird"), 350, 1_800_000),
        (DOCTOR_CATEGORY, Some("Regular"), 400, 2_200_000),
        (DOCTOR_CATEGORY, Some("OnSite"), 450, 2_500_000),
        (DOCTOR_AND_DINNER_CATEGORY, Some("EarlyBird"), 400, 3_050_000),
        (DOCTOR_AND_DINNER_CATEGORY, Some("Regular"), 450, 3_450_000),
        (DOCTOR_AND_DINNER_CATEGORY, Some("OnSite"), 500, 3_750_000),
        (STUDENT_CATEGORY, None, 150, 900_000),
        (STUDENT_AND_DINNER_CATEGORY, None, 200, 2_150_000),
        (GALA_DINNER_ONLY_CATEGORY, None, 50, 1_250_000),
    ];
    for (category, subtype, usd, vnd) in options {
        db.insert_option(category, *subtype, UsdCents::from_dollars(*usd), Vnd::from(*vnd))
            .await
            .expect("Error seeding registration options");
    }
    info!("🚀️ Seeded {} registration options", options.len());
}
