use actix_web::{http::StatusCode, test::TestRequest};
use registration_engine::{
    db_types::PaymentStatus,
    onepay::{
        params::{ParamList, VPC_SECURE_HASH},
        signature::sign_params,
        IPN_ACK_BODY,
    },
};

use crate::endpoint_tests::{
    helpers::{sample_registration, send_request, test_api, TEST_SECRET},
    mocks::MockBackend,
};

fn signed_query(merch_txn_ref: &str, order_info: &str, response_code: &str, secret: &str) -> String {
    let mut params: ParamList = [
        ("vpc_MerchTxnRef", merch_txn_ref),
        ("vpc_OrderInfo", order_info),
        ("vpc_TxnResponseCode", response_code),
        ("vpc_Message", "Approved"),
        ("vpc_Amount", "180000000"),
    ]
    .into_iter()
    .collect();
    let hash = sign_params(&params, secret).expect("Error signing test callback");
    params.set(VPC_SECURE_HASH, hash);
    params.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("&")
}

#[actix_web::test]
async fn confirmed_payment_is_acknowledged() {
    let reg = sample_registration(PaymentStatus::Pending);
    let id = reg.id.clone();
    let mut backend = MockBackend::new();
    backend.expect_fetch_registration_by_id().times(2).returning(move |_| Ok(Some(reg.clone())));
    backend
        .expect_try_transition_payment_status()
        .times(1)
        .withf(|_, to| *to == PaymentStatus::Done)
        .returning(|_, _| Ok(true));

    let query = signed_query(id.as_str(), "ORDERab12cd34ef56gh78", "0", TEST_SECRET);
    let req = TestRequest::get().uri(&format!("/onepay/ipn?{query}"));
    let (status, body) = send_request(req, test_api(backend)).await;
    assert_eq!(status, StatusCode::OK, "unexpected response: {body}");
    assert_eq!(body, IPN_ACK_BODY);
}

#[actix_web::test]
async fn redelivered_callback_is_acknowledged_without_changes() {
    let reg = sample_registration(PaymentStatus::Done);
    let id = reg.id.clone();
    let mut backend = MockBackend::new();
    backend.expect_fetch_registration_by_id().times(1).returning(move |_| Ok(Some(reg.clone())));
    // the guarded transition fails because the registration is already done
    backend.expect_try_transition_payment_status().times(1).returning(|_, _| Ok(false));

    let query = signed_query(id.as_str(), "ORDERab12cd34ef56gh78", "0", TEST_SECRET);
    let req = TestRequest::get().uri(&format!("/onepay/ipn?{query}"));
    let (status, body) = send_request(req, test_api(backend)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, IPN_ACK_BODY);
}

#[actix_web::test]
async fn unknown_registration_is_a_not_found() {
    let mut backend = MockBackend::new();
    backend.expect_fetch_registration_by_id().times(1).returning(|_| Ok(None));

    let query = signed_query("nosuchregistrationid", "ORDERab12cd34ef56gh78", "0", TEST_SECRET);
    let req = TestRequest::get().uri(&format!("/onepay/ipn?{query}"));
    let (status, body) = send_request(req, test_api(backend)).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "unexpected response: {body}");
    assert!(body.contains(r#""code":"not_found""#), "unexpected response: {body}");
    assert_ne!(body, IPN_ACK_BODY);
}

#[actix_web::test]
async fn unknown_accompany_batch_is_a_not_found() {
    let mut backend = MockBackend::new();
    backend.expect_fetch_batch().times(1).returning(|_| Ok(None));

    let query = signed_query("aaaabbbbcccc0000", "ACCOMaaaabbbbcccc0000", "0", TEST_SECRET);
    let req = TestRequest::get().uri(&format!("/onepay/ipn?{query}"));
    let (status, body) = send_request(req, test_api(backend)).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "unexpected response: {body}");
    assert_ne!(body, IPN_ACK_BODY);
}

#[actix_web::test]
async fn unknown_order_tag_is_acknowledged() {
    // no storage expectations: unrecognised tags never touch the database
    let query = signed_query("sometxnref123456", "REFUND42", "0", TEST_SECRET);
    let req = TestRequest::get().uri(&format!("/onepay/ipn?{query}"));
    let (status, body) = send_request(req, test_api(MockBackend::new())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, IPN_ACK_BODY);
}

#[actix_web::test]
async fn tampered_callback_is_forbidden() {
    let query = signed_query("sometxnref123456", "ORDERab12cd34ef56gh78", "0", "00112233445566778899AABBCCDDEEFF");
    let req = TestRequest::get().uri(&format!("/onepay/ipn?{query}"));
    let (status, body) = send_request(req, test_api(MockBackend::new())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains(r#""code":"forbidden""#), "unexpected response: {body}");
    assert_ne!(body, IPN_ACK_BODY);
}

#[actix_web::test]
async fn missing_merch_txn_ref_is_a_bad_request() {
    let req = TestRequest::get().uri("/onepay/ipn?vpc_OrderInfo=ORDERx&vpc_TxnResponseCode=0");
    let (status, body) = send_request(req, test_api(MockBackend::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("vpc_MerchTxnRef"), "unexpected response: {body}");
}
