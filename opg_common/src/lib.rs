mod helpers;
mod money;
mod secret;

pub use helpers::parse_boolean_flag;
pub use money::{MoneyConversionError, UsdCents, Vnd, USD_CURRENCY_CODE, VND_CURRENCY_CODE};
pub use secret::Secret;
