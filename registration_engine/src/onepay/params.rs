//! The ordered parameter list used for both signing and URL construction.
//!
//! OnePay's signature covers a *canonical* rendering of the parameters, so the set of parameters that is signed
//! and the set that ends up in the redirect URL must never drift apart. Everything therefore goes through one
//! [`ParamList`]: insert once, then ask for either the canonical string or the encoded query string.

use std::fmt::Display;

// Field names on the OnePay wire.
pub const VPC_VERSION: &str = "vpc_Version";
pub const VPC_CURRENCY: &str = "vpc_Currency";
pub const VPC_COMMAND: &str = "vpc_Command";
pub const VPC_ACCESS_CODE: &str = "vpc_AccessCode";
pub const VPC_MERCHANT: &str = "vpc_Merchant";
pub const VPC_LOCALE: &str = "vpc_Locale";
pub const VPC_RETURN_URL: &str = "vpc_ReturnURL";
pub const VPC_MERCH_TXN_REF: &str = "vpc_MerchTxnRef";
pub const VPC_ORDER_INFO: &str = "vpc_OrderInfo";
pub const VPC_AMOUNT: &str = "vpc_Amount";
pub const VPC_TICKET_NO: &str = "vpc_TicketNo";
pub const VPC_CALLBACK_URL: &str = "vpc_CallbackURL";
pub const VPC_SECURE_HASH: &str = "vpc_SecureHash";
pub const VPC_SECURE_HASH_TYPE: &str = "vpc_SecureHashType";
pub const VPC_TXN_RESPONSE_CODE: &str = "vpc_TxnResponseCode";
pub const VPC_MESSAGE: &str = "vpc_Message";

/// An ordered list of (key, value) parameters.
///
/// Insertion order is preserved for URL construction; [`ParamList::canonical_string`] applies the gateway's
/// filtering and sorting rules without disturbing the list itself.
#[derive(Debug, Clone, Default)]
pub struct ParamList(Vec<(String, String)>);

impl ParamList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    /// Append a parameter. If the key is already present, its value is replaced instead.
    pub fn set<K: Into<String>, V: Display>(&mut self, key: K, value: V) -> &mut Self {
        let key = key.into();
        let value = value.to_string();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The canonical string the secure hash is computed over.
    ///
    /// Only `vpc_`- and `user_`-prefixed keys participate, excluding `vpc_SecureHash` and `vpc_SecureHashType`.
    /// Empty values are dropped. The surviving pairs are sorted byte-wise ascending by key and joined as
    /// `key=value` with `&`. This exact ordering and filtering is the wire contract.
    pub fn canonical_string(&self) -> String {
        let mut pairs: Vec<(&str, &str)> = self
            .0
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .filter(|(k, v)| {
                (k.starts_with("vpc_") || k.starts_with("user_"))
                    && *k != VPC_SECURE_HASH
                    && *k != VPC_SECURE_HASH_TYPE
                    && !v.is_empty()
            })
            .collect();
        pairs.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
        pairs.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("&")
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for ParamList {
    fn from_iter<T: IntoIterator<Item = (&'a str, &'a str)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
    }
}

impl FromIterator<(String, String)> for ParamList {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
