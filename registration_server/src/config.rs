use std::env;

use log::*;
use opg_common::{parse_boolean_flag, Secret};
use registration_engine::onepay::request::OnePayConfig;

const DEFAULT_OPG_HOST: &str = "127.0.0.1";
const DEFAULT_OPG_PORT: u16 = 8280;
/// The OnePay sandbox endpoint. Production deployments must override this with OPG_ONEPAY_ENDPOINT.
const DEFAULT_ONEPAY_ENDPOINT: &str = "https://mtf.onepay.vn/paygate/vpcpay.op";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_forwarded: bool,
    pub onepay: OnePayConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_OPG_HOST.to_string(),
            port: DEFAULT_OPG_PORT,
            database_url: String::default(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            onepay: OnePayConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("OPG_HOST").ok().unwrap_or_else(|| DEFAULT_OPG_HOST.into());
        let port = env::var("OPG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for OPG_PORT. {e} Using the default, {DEFAULT_OPG_PORT}, instead."
                    );
                    DEFAULT_OPG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_OPG_PORT);
        let database_url = env::var("OPG_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ OPG_DATABASE_URL is not set. Please set it to the URL for the registration database.");
            String::default()
        });
        let use_x_forwarded_for = parse_boolean_flag(env::var("OPG_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("OPG_USE_FORWARDED").ok(), false);
        let onepay = onepay_config_from_env();
        Self { host, port, database_url, use_x_forwarded_for, use_forwarded, onepay }
    }
}

fn onepay_config_from_env() -> OnePayConfig {
    let endpoint = env::var("OPG_ONEPAY_ENDPOINT").ok().unwrap_or_else(|| {
        info!("🪛️ OPG_ONEPAY_ENDPOINT is not set. Using the sandbox endpoint, {DEFAULT_ONEPAY_ENDPOINT}.");
        DEFAULT_ONEPAY_ENDPOINT.into()
    });
    let merchant_id = env::var("OPG_ONEPAY_MERCHANT_ID").ok().unwrap_or_else(|| {
        error!("🪛️ OPG_ONEPAY_MERCHANT_ID is not set. Payment URLs will be rejected by the gateway.");
        String::default()
    });
    let access_code = env::var("OPG_ONEPAY_ACCESS_CODE").ok().unwrap_or_else(|| {
        error!("🪛️ OPG_ONEPAY_ACCESS_CODE is not set. Payment URLs will be rejected by the gateway.");
        String::default()
    });
    let secure_secret = env::var("OPG_ONEPAY_SECURE_SECRET").ok().unwrap_or_else(|| {
        error!("🪛️ OPG_ONEPAY_SECURE_SECRET is not set. Signing and IPN verification will fail.");
        String::default()
    });
    let return_url = env::var("OPG_ONEPAY_RETURN_URL").ok().unwrap_or_else(|| {
        error!("🪛️ OPG_ONEPAY_RETURN_URL is not set. Registrants will not be returned to the result page.");
        String::default()
    });
    let callback_url = env::var("OPG_PUBLIC_URL")
        .map(|u| format!("{}/onepay/ipn", u.trim_end_matches('/')))
        .ok()
        .unwrap_or_else(|| {
            error!("🪛️ OPG_PUBLIC_URL is not set. The gateway will not be able to deliver IPN callbacks.");
            String::default()
        });
    OnePayConfig {
        endpoint,
        merchant_id,
        access_code,
        secure_secret: Secret::new(secure_secret),
        return_url,
        callback_url,
    }
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that is used to configure the server's behaviour. Generally we try to keep this
/// as small as possible, and exclude secrets to avoid passing sensitive information around the system.
#[derive(Clone, Copy, Debug)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { use_x_forwarded_for: config.use_x_forwarded_for, use_forwarded: config.use_forwarded }
    }
}
