use std::{future::Future, pin::Pin, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use registration_engine::{
    events::{EventHandlers, EventHooks, EventProducers, PaymentConfirmedEvent},
    exchange_rate::ExchangeRateCache,
    helpers::mask_email,
    SqliteDatabase,
};

use crate::{
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    routes::{health, AccompanyPersonsRoute, IpnRoute, RegisterRoute, RegistrationInfoRoute, RegistrationOptionRoute},
};

const EVENT_BUFFER_SIZE: usize = 100;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let mut hooks = EventHooks::default();
    hooks.on_payment_confirmed(confirmation_hook);
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let rates = ExchangeRateCache::new();
    let srv = create_server_instance(config, db, rates, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    rates: ExchangeRateCache,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let api = registration_engine::RegistrationFlowApi::new(
            db.clone(),
            config.onepay.clone(),
            rates.clone(),
            producers.clone(),
        );
        let options = ServerOptions::from_config(&config);
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("opg::access_log"))
            .app_data(web::Data::new(api))
            .app_data(web::Data::new(options))
            .service(health)
            .service(RegisterRoute::<SqliteDatabase>::new())
            .service(RegistrationOptionRoute::<SqliteDatabase>::new())
            .service(RegistrationInfoRoute::<SqliteDatabase>::new())
            .service(AccompanyPersonsRoute::<SqliteDatabase>::new())
            .service(IpnRoute::<SqliteDatabase>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}

/// The payment-confirmed hook. Mail delivery hangs off this seam; until a provider is wired in, the
/// confirmation is logged so operators can follow up manually.
fn confirmation_hook(event: PaymentConfirmedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>> {
    Box::pin(async move {
        let reg = event.registration;
        info!(
            "📧️ Payment confirmed for registration [{}]: {} <{}> ({}, {} accompany persons)",
            reg.id,
            reg.full_name(),
            mask_email(&reg.email),
            reg.registration_category,
            reg.accompany_persons.0.len()
        );
    })
}
