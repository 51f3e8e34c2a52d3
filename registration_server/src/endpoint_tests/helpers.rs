use actix_web::{http::StatusCode, test, test::TestRequest, web, App};
use chrono::{Duration, Utc};
use opg_common::{Secret, UsdCents, Vnd};
use registration_engine::{
    db_types::{PaymentStatus, Registration, RegistrationId, RegistrationOption},
    events::EventProducers,
    exchange_rate::ExchangeRateCache,
    onepay::request::OnePayConfig,
    RegistrationFlowApi,
};
use sqlx::types::Json;

use crate::{
    config::ServerOptions,
    endpoint_tests::mocks::MockBackend,
    routes::{
        health,
        AccompanyPersonsRoute,
        IpnRoute,
        RegisterRoute,
        RegistrationInfoRoute,
        RegistrationOptionRoute,
    },
};

pub const TEST_SECRET: &str = "6D0870955D6963D4BA9A2A84BAFE1BE8";

pub fn test_onepay_config() -> OnePayConfig {
    OnePayConfig {
        endpoint: "https://mtf.onepay.vn/paygate/vpcpay.op".into(),
        merchant_id: "TESTONEPAY".into(),
        access_code: "6BEB2546".into(),
        secure_secret: Secret::new(TEST_SECRET.into()),
        return_url: "https://event.example.com/verify".into(),
        callback_url: "https://event.example.com/onepay/ipn".into(),
    }
}

pub fn test_api(backend: MockBackend) -> RegistrationFlowApi<MockBackend> {
    let rates = ExchangeRateCache::with_rate(25_400.0, Utc::now() + Duration::days(1));
    RegistrationFlowApi::new(backend, test_onepay_config(), rates, EventProducers::default())
}

pub fn sample_registration(status: PaymentStatus) -> Registration {
    Registration {
        id: RegistrationId::from("regAAAABBBBCCCCDDDDEEEEFFFF11112"),
        registration_option_id: 1,
        registration_category: "ENT Doctors".into(),
        nationality: "vn".into(),
        doctorate_degree: "MD".into(),
        first_name: "Nguyen".into(),
        middle_name: "Van".into(),
        last_name: "An".into(),
        date_of_birth: "1980-01-01".into(),
        institution: "Hanoi Medical University".into(),
        email: "an.nguyen@example.com".into(),
        phone_number: "+84 90 123 4567".into(),
        sponsor: String::new(),
        payment_status: status,
        accompany_persons: Json(Vec::new()),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn sample_option(category: &str, subtype: Option<&str>, usd: i64, vnd: i64) -> RegistrationOption {
    RegistrationOption {
        id: 1,
        category: category.to_string(),
        subtype: subtype.map(String::from),
        fee_usd: UsdCents::from_dollars(usd),
        fee_vnd: Vnd::from(vnd),
        active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub async fn send_request(req: TestRequest, api: RegistrationFlowApi<MockBackend>) -> (StatusCode, String) {
    let _ = env_logger::try_init();
    let options = ServerOptions { use_x_forwarded_for: false, use_forwarded: false };
    let app = App::new()
        .app_data(web::Data::new(api))
        .app_data(web::Data::new(options))
        .service(health)
        .service(RegisterRoute::<MockBackend>::new())
        .service(RegistrationOptionRoute::<MockBackend>::new())
        .service(RegistrationInfoRoute::<MockBackend>::new())
        .service(AccompanyPersonsRoute::<MockBackend>::new())
        .service(IpnRoute::<MockBackend>::new());
    let service = test::init_service(app).await;
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let body = test::read_body(res).await;
    (status, String::from_utf8_lossy(&body).into_owned())
}
