mod errors;
mod registration_flow_api;

pub use errors::RegistrationFlowError;
pub use registration_flow_api::{IpnResolution, OptionQuote, PaymentRedirect, RegistrationFlowApi};
