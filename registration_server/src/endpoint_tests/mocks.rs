use mockall::mock;
use opg_common::{UsdCents, Vnd};
use registration_engine::{
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

mock! {
    pub Backend {}

    impl Clone for Backend {
        fn clone(&self) -> Self;
    }

    impl RegistrationManagement for Backend {
        async fn insert_registration(&self, registration: Registration) -> Result<(), RegistrationApiError>;
        async fn fetch_registration_by_id(&self, id: &RegistrationId) -> Result<Option<Registration>, RegistrationApiError>;
        async fn fetch_registration_by_email(&self, email: &str) -> Result<Option<Registration>, RegistrationApiError>;
        async fn try_transition_payment_status(&self, id: &RegistrationId, to: PaymentStatus) -> Result<bool, RegistrationApiError>;
        async fn update_accompany_persons(&self, id: &RegistrationId, persons: &[AccompanyPerson]) -> Result<(), RegistrationApiError>;
        async fn delete_registration(&self, id: &RegistrationId) -> Result<(), RegistrationApiError>;
    }

    impl OptionManagement for Backend {
        async fn fetch_option(&self, key: &OptionKey) -> Result<RegistrationOption, OptionApiError>;
        async fn insert_option<'a>(&self, category: &str, subtype: Option<&'a str>, fee_usd: UsdCents, fee_vnd: Vnd) -> Result<i64, OptionApiError>;
    }

    impl AccompanyManagement for Backend {
        async fn save_batch(&self, batch: AccompanyBatch) -> Result<(), AccompanyApiError>;
        async fn fetch_batch(&self, transaction_id: &str) -> Result<Option<AccompanyBatch>, AccompanyApiError>;
        async fn delete_batch(&self, transaction_id: &str) -> Result<(), AccompanyApiError>;
    }
}
