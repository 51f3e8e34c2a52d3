//! End-to-end flow tests against a real SQLite store: registration, payment confirmation, accompany-person
//! add-ons and IPN redelivery.

use std::{
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use chrono::{Duration, Utc};
use opg_common::Secret;
use registration_engine::{
    db_types::{AccompanyPerson, NewRegistration, PaymentStatus, RegistrationCategory},
    events::{EventHandlers, EventHooks, EventProducers},
    exchange_rate::ExchangeRateCache,
    onepay::{
        ipn::IpnCallback,
        params::{ParamList, VPC_SECURE_HASH},
        request::OnePayConfig,
        signature::sign_params,
        OnePayError,
    },
    test_utils::prepare_env::{prepare_test_env, random_db_path, seed_default_options},
    traits::{AccompanyApiError, RegistrationApiError},
    IpnResolution,
    RegistrationFlowApi,
    RegistrationFlowError,
    SqliteDatabase,
};
use url::Url;

const TEST_SECRET: &str = "6D0870955D6963D4BA9A2A84BAFE1BE8";
const CLIENT_IP: &str = "203.0.113.7";

fn onepay_config() -> OnePayConfig {
    OnePayConfig {
        endpoint: "https://mtf.onepay.vn/paygate/vpcpay.op".into(),
        merchant_id: "TESTONEPAY".into(),
        access_code: "6BEB2546".into(),
        secure_secret: Secret::new(TEST_SECRET.into()),
        return_url: "https://event.example.com/verify".into(),
        callback_url: "https://event.example.com/onepay/ipn".into(),
    }
}

async fn new_api(url: &str, producers: EventProducers) -> (RegistrationFlowApi<SqliteDatabase>, SqliteDatabase) {
    prepare_test_env(url).await;
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating database");
    seed_default_options(&db).await;
    let rates = ExchangeRateCache::with_rate(25_400.0, Utc::now() + Duration::days(1));
    let api = RegistrationFlowApi::new(db.clone(), onepay_config(), rates, producers);
    (api, db)
}

fn new_registration(email: &str, accompany_count: usize) -> NewRegistration {
    let accompany_persons = (0..accompany_count)
        .map(|i| AccompanyPerson {
            first_name: "Tran".into(),
            middle_name: String::new(),
            last_name: format!("Guest{i}"),
            date_of_birth: "1985-05-05".into(),
            payment_status: PaymentStatus::Pending,
        })
        .collect();
    NewRegistration {
        category: RegistrationCategory::Doctor,
        attend_gala_dinner: true,
        nationality: "vn".into(),
        doctorate_degree: "MD".into(),
        first_name: "Nguyen".into(),
        middle_name: "Van".into(),
        last_name: "An".into(),
        date_of_birth: "1980-01-01".into(),
        institution: "Hanoi Medical University".into(),
        email: email.into(),
        phone_number: "+84 90 123 4567".into(),
        sponsor: String::new(),
        accompany_persons,
    }
}

fn signed_callback(merch_txn_ref: &str, order_info: &str, response_code: &str, secret: &str) -> IpnCallback {
    let mut params: ParamList = [
        ("vpc_MerchTxnRef", merch_txn_ref),
        ("vpc_OrderInfo", order_info),
        ("vpc_TxnResponseCode", response_code),
        ("vpc_Message", "Approved"),
        ("vpc_Amount", "345000000"),
    ]
    .into_iter()
    .collect();
    let hash = sign_params(&params, secret).expect("Error signing test callback");
    params.set(VPC_SECURE_HASH, hash);
    IpnCallback::from_query_pairs(params.iter().map(|(k, v)| (k.to_string(), v.to_string())))
        .expect("Error parsing test callback")
}

fn query_param(url: &str, key: &str) -> String {
    Url::parse(url)
        .expect("Invalid payment url")
        .query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
        .unwrap_or_default()
}

#[tokio::test]
async fn register_confirm_and_redeliver() {
    let confirmations = Arc::new(AtomicUsize::new(0));
    let observed = Arc::clone(&confirmations);
    let mut hooks = EventHooks::default();
    hooks.on_payment_confirmed(move |ev| {
        let confirmations = Arc::clone(&confirmations);
        Box::pin(async move {
            assert_eq!(ev.registration.email, "an.nguyen@example.com");
            confirmations.fetch_add(1, Ordering::SeqCst);
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    let handlers = EventHandlers::new(10, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;

    let (api, _db) = new_api(&random_db_path(), producers).await;
    let redirect = api.register(new_registration("an.nguyen@example.com", 1), CLIENT_IP).await.unwrap();
    assert_eq!(query_param(&redirect.payment_url, "vpc_MerchTxnRef"), redirect.registration_id.as_str());
    assert!(!query_param(&redirect.payment_url, "vpc_SecureHash").is_empty());

    let reg = api.fetch_registration(&redirect.registration_id).await.unwrap();
    assert_eq!(reg.payment_status, PaymentStatus::Pending);

    let order_info = query_param(&redirect.payment_url, "vpc_OrderInfo");
    let cb = signed_callback(redirect.registration_id.as_str(), &order_info, "0", TEST_SECRET);
    let resolution = api.handle_ipn(cb.clone()).await.unwrap();
    assert_eq!(resolution, IpnResolution::PaymentConfirmed(redirect.registration_id.clone()));

    let reg = api.fetch_registration(&redirect.registration_id).await.unwrap();
    assert_eq!(reg.payment_status, PaymentStatus::Done);
    assert_eq!(reg.accompany_persons.0.len(), 1);
    assert!(reg.accompany_persons.0.iter().all(|p| p.payment_status == PaymentStatus::Done));

    // a redelivered callback observes the guarded transition fail and changes nothing
    let resolution = api.handle_ipn(cb).await.unwrap();
    assert_eq!(resolution, IpnResolution::Duplicate);
    let reg = api.fetch_registration(&redirect.registration_id).await.unwrap();
    assert_eq!(reg.payment_status, PaymentStatus::Done);

    tokio::time::sleep(tokio::time::Duration::from_millis(250)).await;
    assert_eq!(observed.load(Ordering::SeqCst), 1, "exactly one confirmation event per registration");
}

#[tokio::test]
async fn failed_payment_allows_retry() {
    let (api, _db) = new_api(&random_db_path(), EventProducers::default()).await;
    let redirect = api.register(new_registration("binh.le@example.com", 0), CLIENT_IP).await.unwrap();
    let order_info = query_param(&redirect.payment_url, "vpc_OrderInfo");

    let cb = signed_callback(redirect.registration_id.as_str(), &order_info, "99", TEST_SECRET);
    let resolution = api.handle_ipn(cb).await.unwrap();
    assert_eq!(resolution, IpnResolution::PaymentFailed(redirect.registration_id.clone()));
    let reg = api.fetch_registration(&redirect.registration_id).await.unwrap();
    assert_eq!(reg.payment_status, PaymentStatus::Fail);

    // the failed registration is superseded by a fresh attempt
    let retry = api.register(new_registration("binh.le@example.com", 0), CLIENT_IP).await.unwrap();
    assert_ne!(retry.registration_id, redirect.registration_id);
    let err = api.fetch_registration(&redirect.registration_id).await.unwrap_err();
    assert!(matches!(
        err,
        RegistrationFlowError::RegistrationError(RegistrationApiError::RegistrationNotFound(_))
    ));
}

#[tokio::test]
async fn paid_email_cannot_register_twice() {
    let (api, _db) = new_api(&random_db_path(), EventProducers::default()).await;
    let redirect = api.register(new_registration("chi.pham@example.com", 0), CLIENT_IP).await.unwrap();
    let order_info = query_param(&redirect.payment_url, "vpc_OrderInfo");
    let cb = signed_callback(redirect.registration_id.as_str(), &order_info, "0", TEST_SECRET);
    api.handle_ipn(cb).await.unwrap();

    let err = api.register(new_registration("chi.pham@example.com", 0), CLIENT_IP).await.unwrap_err();
    assert!(matches!(err, RegistrationFlowError::EmailAlreadyRegistered(_)));
}

#[tokio::test]
async fn accompany_batch_merges_on_confirmation() {
    let (api, _db) = new_api(&random_db_path(), EventProducers::default()).await;
    let redirect = api.register(new_registration("dung.vo@example.com", 0), CLIENT_IP).await.unwrap();
    let order_info = query_param(&redirect.payment_url, "vpc_OrderInfo");
    let cb = signed_callback(redirect.registration_id.as_str(), &order_info, "0", TEST_SECRET);
    api.handle_ipn(cb).await.unwrap();

    let persons = vec![
        AccompanyPerson {
            first_name: "Tran".into(),
            middle_name: String::new(),
            last_name: "Mai".into(),
            date_of_birth: "1982-03-03".into(),
            payment_status: PaymentStatus::Pending,
        },
        AccompanyPerson {
            first_name: "Tran".into(),
            middle_name: String::new(),
            last_name: "Minh".into(),
            date_of_birth: "2010-07-07".into(),
            payment_status: PaymentStatus::Pending,
        },
    ];
    let add_on = api.register_accompany_persons("dung.vo@example.com", persons, CLIENT_IP).await.unwrap();
    assert_eq!(add_on.registration_id, redirect.registration_id);
    let txid = query_param(&add_on.payment_url, "vpc_MerchTxnRef");
    assert_eq!(query_param(&add_on.payment_url, "vpc_OrderInfo"), format!("ACCOM{txid}"));

    let cb = signed_callback(&txid, &format!("ACCOM{txid}"), "0", TEST_SECRET);
    let resolution = api.handle_ipn(cb.clone()).await.unwrap();
    assert_eq!(
        resolution,
        IpnResolution::AccompanyConfirmed { registration_id: redirect.registration_id.clone(), count: 2 }
    );
    let reg = api.fetch_registration(&redirect.registration_id).await.unwrap();
    assert_eq!(reg.payment_status, PaymentStatus::Done);
    assert_eq!(reg.accompany_persons.0.len(), 2);
    assert!(reg.accompany_persons.0.iter().all(|p| p.payment_status == PaymentStatus::Done));

    // the batch is gone, so a redelivery is a not-found error and merges nothing
    let err = api.handle_ipn(cb).await.unwrap_err();
    assert!(matches!(err, RegistrationFlowError::AccompanyError(AccompanyApiError::BatchNotFound(_))));
    let reg = api.fetch_registration(&redirect.registration_id).await.unwrap();
    assert_eq!(reg.accompany_persons.0.len(), 2);
}

#[tokio::test]
async fn callbacks_for_unknown_transactions_are_not_found_errors() {
    let (api, _db) = new_api(&random_db_path(), EventProducers::default()).await;

    // an ORDER tag whose txn ref matches no registration
    let cb = signed_callback("nosuchregistrationid", "ORDERab12cd34ef56gh78", "0", TEST_SECRET);
    let err = api.handle_ipn(cb).await.unwrap_err();
    assert!(matches!(
        err,
        RegistrationFlowError::RegistrationError(RegistrationApiError::RegistrationNotFound(_))
    ));

    // an ACCOM tag whose transaction id matches no pending batch
    let cb = signed_callback("aaaabbbbcccc0000", "ACCOMaaaabbbbcccc0000", "0", TEST_SECRET);
    let err = api.handle_ipn(cb).await.unwrap_err();
    assert!(matches!(err, RegistrationFlowError::AccompanyError(AccompanyApiError::BatchNotFound(_))));
}

#[tokio::test]
async fn accompany_requires_a_paid_registration() {
    let (api, _db) = new_api(&random_db_path(), EventProducers::default()).await;
    let redirect = api.register(new_registration("em.hoang@example.com", 0), CLIENT_IP).await.unwrap();

    let persons = vec![AccompanyPerson {
        first_name: "Le".into(),
        middle_name: String::new(),
        last_name: "Thu".into(),
        date_of_birth: "1990-09-09".into(),
        payment_status: PaymentStatus::Pending,
    }];
    // owner is still pending
    let err = api.register_accompany_persons("em.hoang@example.com", persons, CLIENT_IP).await.unwrap_err();
    assert!(matches!(err, RegistrationFlowError::NoPaidRegistration(_)));

    let order_info = query_param(&redirect.payment_url, "vpc_OrderInfo");
    let cb = signed_callback(redirect.registration_id.as_str(), &order_info, "0", TEST_SECRET);
    api.handle_ipn(cb).await.unwrap();
    let err = api.register_accompany_persons("em.hoang@example.com", Vec::new(), CLIENT_IP).await.unwrap_err();
    assert!(matches!(err, RegistrationFlowError::EmptyAccompanyList));
}

#[tokio::test]
async fn tampered_callback_changes_nothing() {
    let (api, _db) = new_api(&random_db_path(), EventProducers::default()).await;
    let redirect = api.register(new_registration("giang.do@example.com", 0), CLIENT_IP).await.unwrap();
    let order_info = query_param(&redirect.payment_url, "vpc_OrderInfo");

    // signed with the wrong merchant secret
    let cb = signed_callback(redirect.registration_id.as_str(), &order_info, "0", "00112233445566778899AABBCCDDEEFF");
    let err = api.handle_ipn(cb).await.unwrap_err();
    assert!(matches!(err, RegistrationFlowError::OnePayError(OnePayError::SignatureMismatch)));
    let reg = api.fetch_registration(&redirect.registration_id).await.unwrap();
    assert_eq!(reg.payment_status, PaymentStatus::Pending);
}
