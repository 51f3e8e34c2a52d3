//! Inbound IPN callback parsing and classification.
//!
//! The gateway reports transaction outcomes by calling back with the same `vpc_` parameter family it received,
//! plus `vpc_TxnResponseCode` and `vpc_Message`. This module turns the raw query pairs into a verified,
//! classified [`IpnCallback`]; the state transitions themselves live in the flow API.

use crate::onepay::{
    params::{ParamList, VPC_MERCH_TXN_REF, VPC_MESSAGE, VPC_ORDER_INFO, VPC_SECURE_HASH, VPC_TXN_RESPONSE_CODE},
    request::{ORDER_INFO_ACCOMPANY_PREFIX, ORDER_INFO_PRIMARY_PREFIX},
    signature::verify,
    OnePayError,
    TXN_RESPONSE_SUCCESS,
};

/// Which flow a callback belongs to, recovered from the order-info tag prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionKind {
    /// `ORDER*`: the primary registration payment. The merch txn ref is the registration id.
    Primary,
    /// `ACCOM<txid>`: an accompany-person add-on payment. Carries the recovered transaction id.
    Accompany(String),
    /// Any other tag. Acknowledged but ignored, so that new transaction types cannot break reconciliation.
    Unknown,
}

/// A parsed IPN callback. Construction does not verify the signature; call [`IpnCallback::verify_signature`]
/// before acting on it.
#[derive(Debug, Clone)]
pub struct IpnCallback {
    params: ParamList,
    pub merch_txn_ref: String,
    pub order_info: String,
    pub response_code: String,
    pub message: String,
    pub secure_hash: String,
}

impl IpnCallback {
    /// Parse the callback's flat query pairs. Fails if `vpc_MerchTxnRef` is missing or empty.
    pub fn from_query_pairs<I>(pairs: I) -> Result<Self, OnePayError>
    where I: IntoIterator<Item = (String, String)> {
        let params: ParamList = pairs.into_iter().collect();
        let merch_txn_ref = params.get(VPC_MERCH_TXN_REF).unwrap_or_default().to_string();
        if merch_txn_ref.is_empty() {
            return Err(OnePayError::MissingParameter(VPC_MERCH_TXN_REF));
        }
        let order_info = params.get(VPC_ORDER_INFO).unwrap_or_default().to_string();
        let response_code = params.get(VPC_TXN_RESPONSE_CODE).unwrap_or_default().to_string();
        let message = params.get(VPC_MESSAGE).unwrap_or_default().to_string();
        let secure_hash = params.get(VPC_SECURE_HASH).unwrap_or_default().to_string();
        Ok(Self { params, merch_txn_ref, order_info, response_code, message, secure_hash })
    }

    /// Recompute the signature over the received parameters (the received hash is excluded by canonicalization)
    /// and compare it to `vpc_SecureHash`.
    pub fn verify_signature(&self, hex_secret: &str) -> Result<(), OnePayError> {
        verify(&self.params, &self.secure_hash, hex_secret)
    }

    pub fn kind(&self) -> TransactionKind {
        if self.order_info.starts_with(ORDER_INFO_PRIMARY_PREFIX) {
            TransactionKind::Primary
        } else if let Some(txid) = self.order_info.strip_prefix(ORDER_INFO_ACCOMPANY_PREFIX) {
            TransactionKind::Accompany(txid.to_string())
        } else {
            TransactionKind::Unknown
        }
    }

    pub fn is_success(&self) -> bool {
        self.response_code == TXN_RESPONSE_SUCCESS
    }
}
