//! Signed payment-redirect URLs.
//!
//! No network traffic happens here. The builder assembles the gateway parameter set, signs it, and returns a URL
//! for the client to be redirected to. The gateway later reports the outcome through the IPN callback.

use opg_common::Secret;
use rand::distributions::{Alphanumeric, DistString};
use url::Url;

use crate::{
    db_types::{Registration, HOME_NATIONALITY},
    fees::{ResolvedFee, FIXED_VND_PER_USD},
    onepay::{
        params::{
            ParamList,
            VPC_ACCESS_CODE,
            VPC_AMOUNT,
            VPC_CALLBACK_URL,
            VPC_COMMAND,
            VPC_CURRENCY,
            VPC_LOCALE,
            VPC_MERCHANT,
            VPC_MERCH_TXN_REF,
            VPC_ORDER_INFO,
            VPC_RETURN_URL,
            VPC_SECURE_HASH,
            VPC_TICKET_NO,
            VPC_VERSION,
        },
        signature::sign_params,
        OnePayError,
    },
};

/// Order-info tag prefix for the primary registration flow.
pub const ORDER_INFO_PRIMARY_PREFIX: &str = "ORDER";
/// Order-info tag prefix for the accompany-person add-on flow.
pub const ORDER_INFO_ACCOMPANY_PREFIX: &str = "ACCOM";

const ORDER_TAG_ENTROPY: usize = 16;

/// Merchant-side OnePay settings. The secure secret is the hex-encoded HMAC key from the merchant portal.
#[derive(Debug, Clone, Default)]
pub struct OnePayConfig {
    /// The gateway's payment endpoint, e.g. `https://mtf.onepay.vn/paygate/vpcpay.op`
    pub endpoint: String,
    pub merchant_id: String,
    pub access_code: String,
    pub secure_secret: Secret<String>,
    /// Base of the user-facing result page; the registration id is appended as a path segment.
    pub return_url: String,
    /// Absolute URL of this server's IPN endpoint.
    pub callback_url: String,
}

#[derive(Debug, Clone)]
pub struct PaymentRequestBuilder {
    config: OnePayConfig,
}

impl PaymentRequestBuilder {
    pub fn new(config: OnePayConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OnePayConfig {
        &self.config
    }

    /// Build the signed redirect URL for a primary registration payment.
    ///
    /// `vpc_MerchTxnRef` is the registration id; the order-info tag is `ORDER` plus 16 random alphanumerics.
    pub fn primary_payment_url(
        &self,
        registration: &Registration,
        fee: &ResolvedFee,
        client_ip: &str,
    ) -> Result<String, OnePayError> {
        let tag = format!(
            "{ORDER_INFO_PRIMARY_PREFIX}{}",
            Alphanumeric.sample_string(&mut rand::thread_rng(), ORDER_TAG_ENTROPY)
        );
        let (amount, locale) = gateway_amount(&registration.nationality, fee);
        let params = self.payment_params(registration.id.as_str(), &tag, amount, locale, client_ip, registration);
        self.sign_and_encode(params)
    }

    /// Build the signed redirect URL for an accompany-person add-on payment.
    ///
    /// `vpc_MerchTxnRef` is the add-on transaction id, and the order-info tag embeds it as `ACCOM<id>` so the
    /// IPN reconciler can recover the pending batch.
    pub fn accompany_payment_url(
        &self,
        registration: &Registration,
        fee: &ResolvedFee,
        transaction_id: &str,
        client_ip: &str,
    ) -> Result<String, OnePayError> {
        let tag = format!("{ORDER_INFO_ACCOMPANY_PREFIX}{transaction_id}");
        let (amount, locale) = gateway_amount(&registration.nationality, fee);
        let params = self.payment_params(transaction_id, &tag, amount, locale, client_ip, registration);
        self.sign_and_encode(params)
    }

    fn payment_params(
        &self,
        merch_txn_ref: &str,
        order_info: &str,
        amount: i64,
        locale: &str,
        client_ip: &str,
        registration: &Registration,
    ) -> ParamList {
        let mut params = ParamList::with_capacity(13);
        params
            .set(VPC_VERSION, 2)
            .set(VPC_CURRENCY, opg_common::VND_CURRENCY_CODE)
            .set(VPC_COMMAND, "pay")
            .set(VPC_ACCESS_CODE, &self.config.access_code)
            .set(VPC_MERCHANT, &self.config.merchant_id)
            .set(VPC_LOCALE, locale)
            .set(VPC_RETURN_URL, format!("{}/{}", self.config.return_url, registration.id))
            .set(VPC_MERCH_TXN_REF, merch_txn_ref)
            .set(VPC_ORDER_INFO, order_info)
            .set(VPC_AMOUNT, amount)
            .set(VPC_TICKET_NO, client_ip)
            .set(VPC_CALLBACK_URL, &self.config.callback_url);
        params
    }

    fn sign_and_encode(&self, mut params: ParamList) -> Result<String, OnePayError> {
        let hash = sign_params(&params, self.config.secure_secret.reveal())?;
        params.set(VPC_SECURE_HASH, hash);
        let url = Url::parse_with_params(&self.config.endpoint, params.iter())
            .map_err(|e| OnePayError::InvalidEndpoint(e.to_string()))?;
        Ok(url.to_string())
    }
}

/// Select the signed amount (in the gateway's minor-unit convention) and locale for a registrant.
///
/// Home-country registrants pay the VND fee directly. Everyone else pays the USD fee converted at the fixed
/// rate, still denominated in VND on the wire (single merchant profile).
fn gateway_amount(nationality: &str, fee: &ResolvedFee) -> (i64, &'static str) {
    if nationality == HOME_NATIONALITY {
        (fee.total_vnd.to_gateway_amount(), "vn")
    } else {
        (fee.total_usd.to_vnd(FIXED_VND_PER_USD).to_gateway_amount(), "en")
    }
}
