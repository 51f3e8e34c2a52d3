use actix_web::{http::StatusCode, test::TestRequest};
use registration_engine::db_types::PaymentStatus;
use serde_json::json;

use crate::endpoint_tests::{
    helpers::{sample_option, sample_registration, send_request, test_api},
    mocks::MockBackend,
};

fn registration_body() -> serde_json::Value {
    json!({
        "category": "ENT Doctors",
        "attend_gala_dinner": true,
        "nationality": "vn",
        "doctorate_degree": "MD",
        "first_name": "Nguyen",
        "middle_name": "Van",
        "last_name": "An",
        "date_of_birth": "1980-01-01",
        "institution": "Hanoi Medical University",
        "email": "an.nguyen@example.com",
        "phone_number": "+84 90 123 4567",
        "sponsor": "",
        "accompany_persons": []
    })
}

#[actix_web::test]
async fn health_check() {
    let (status, body) = send_request(TestRequest::get().uri("/health"), test_api(MockBackend::new())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
}

#[actix_web::test]
async fn register_returns_signed_payment_url() {
    let mut backend = MockBackend::new();
    backend.expect_fetch_registration_by_email().times(1).returning(|_| Ok(None));
    backend
        .expect_fetch_option()
        .times(1)
        .returning(|_| Ok(sample_option("ENT Doctors + Gala Dinner", Some("OnSite"), 500, 3_750_000)));
    backend.expect_insert_registration().times(1).returning(|_| Ok(()));

    let req = TestRequest::post().uri("/register").set_json(registration_body());
    let (status, body) = send_request(req, test_api(backend)).await;
    assert_eq!(status, StatusCode::OK, "unexpected response: {body}");
    assert!(body.contains("registration_id"));
    assert!(body.contains("vpc_SecureHash"));
    assert!(body.contains("vpc_Amount=375000000"));
}

#[actix_web::test]
async fn register_rejects_completed_email() {
    let mut backend = MockBackend::new();
    backend
        .expect_fetch_registration_by_email()
        .times(1)
        .returning(|_| Ok(Some(sample_registration(PaymentStatus::Done))));

    let req = TestRequest::post().uri("/register").set_json(registration_body());
    let (status, body) = send_request(req, test_api(backend)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("completed registration"), "unexpected response: {body}");
    assert!(body.contains("trace_id"));
}

#[actix_web::test]
async fn register_supersedes_unpaid_registration() {
    let mut backend = MockBackend::new();
    backend
        .expect_fetch_registration_by_email()
        .times(1)
        .returning(|_| Ok(Some(sample_registration(PaymentStatus::Fail))));
    backend.expect_delete_registration().times(1).returning(|_| Ok(()));
    backend
        .expect_fetch_option()
        .times(1)
        .returning(|_| Ok(sample_option("ENT Doctors + Gala Dinner", Some("OnSite"), 500, 3_750_000)));
    backend.expect_insert_registration().times(1).returning(|_| Ok(()));

    let req = TestRequest::post().uri("/register").set_json(registration_body());
    let (status, _) = send_request(req, test_api(backend)).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn registration_info_is_returned() {
    let mut backend = MockBackend::new();
    backend
        .expect_fetch_registration_by_id()
        .times(1)
        .returning(|_| Ok(Some(sample_registration(PaymentStatus::Done))));

    let reg = sample_registration(PaymentStatus::Done);
    let req = TestRequest::get().uri(&format!("/register/{}/registration-info", reg.id));
    let (status, body) = send_request(req, test_api(backend)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("an.nguyen@example.com"));
    assert!(body.contains(r#""payment_status":"done""#));
}

#[actix_web::test]
async fn missing_registration_is_a_404() {
    let mut backend = MockBackend::new();
    backend.expect_fetch_registration_by_id().times(1).returning(|_| Ok(None));

    let req = TestRequest::get().uri("/register/nosuchregistration/registration-info");
    let (status, body) = send_request(req, test_api(backend)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains(r#""code":"not_found""#));
}

#[actix_web::test]
async fn option_quote_includes_surcharge_and_rate() {
    let mut backend = MockBackend::new();
    // first call resolves the tier, second the gala-dinner surcharge
    let mut call = 0;
    backend.expect_fetch_option().times(2).returning(move |_| {
        call += 1;
        if call == 1 {
            Ok(sample_option("ENT Doctors", Some("OnSite"), 450, 2_500_000))
        } else {
            Ok(sample_option("Gala Dinner", None, 50, 1_250_000))
        }
    });

    let req = TestRequest::get().uri("/register/option?category=ENT%20Doctors");
    let (status, body) = send_request(req, test_api(backend)).await;
    assert_eq!(status, StatusCode::OK, "unexpected response: {body}");
    assert!(body.contains(r#""fee_vnd":2500000"#));
    assert!(body.contains(r#""surcharge_usd":5000"#));
    assert!(body.contains("25400"));
}

#[actix_web::test]
async fn option_quote_rejects_unknown_category() {
    let req = TestRequest::get().uri("/register/option?category=Accompany");
    let (status, body) = send_request(req, test_api(MockBackend::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Unknown registration category"));
}

#[actix_web::test]
async fn accompany_persons_require_paid_owner() {
    let mut backend = MockBackend::new();
    backend
        .expect_fetch_registration_by_email()
        .times(1)
        .returning(|_| Ok(Some(sample_registration(PaymentStatus::Pending))));

    let body = json!({
        "email": "an.nguyen@example.com",
        "accompany_persons": [
            { "first_name": "Tran", "last_name": "Mai", "date_of_birth": "1982-03-03" }
        ]
    });
    let req = TestRequest::post().uri("/register/accompany-persons").set_json(body);
    let (status, body) = send_request(req, test_api(backend)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("No completed registration"), "unexpected response: {body}");
}

#[actix_web::test]
async fn accompany_persons_get_an_add_on_url() {
    let mut backend = MockBackend::new();
    backend
        .expect_fetch_registration_by_email()
        .times(1)
        .returning(|_| Ok(Some(sample_registration(PaymentStatus::Done))));
    backend.expect_fetch_option().times(1).returning(|_| Ok(sample_option("Gala Dinner", None, 50, 1_250_000)));
    backend.expect_save_batch().times(1).returning(|_| Ok(()));

    let body = json!({
        "email": "an.nguyen@example.com",
        "accompany_persons": [
            { "first_name": "Tran", "last_name": "Mai", "date_of_birth": "1982-03-03" },
            { "first_name": "Tran", "last_name": "Minh", "date_of_birth": "2010-07-07" }
        ]
    });
    let req = TestRequest::post().uri("/register/accompany-persons").set_json(body);
    let (status, body) = send_request(req, test_api(backend)).await;
    assert_eq!(status, StatusCode::OK, "unexpected response: {body}");
    // 2 persons at 1,250,000 dong each
    assert!(body.contains("vpc_Amount=250000000"));
    assert!(body.contains("ACCOM"));
}
