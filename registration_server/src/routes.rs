//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. For this reason, any long, non-cpu-bound operation (e.g. I/O,
//! database operations, etc.) should be expressed as futures or asynchronous functions so that worker threads can
//! interleave other requests.

use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use log::*;
use registration_engine::{
    db_types::{NewRegistration, RegistrationCategory, RegistrationId},
    onepay::{ipn::IpnCallback, IPN_ACK_BODY},
    traits::{AccompanyManagement, OptionManagement, RegistrationManagement},
    RegistrationFlowApi,
};

use crate::{
    config::ServerOptions,
    data_objects::{AccompanyRequest, OptionQuoteParams},
    errors::ServerError,
    helpers::client_ip,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:path),+) => {
        paste::paste! { pub struct [<$name:camel Route>]<B>(core::marker::PhantomData<fn() -> B>);}
        paste::paste! { impl<B> [<$name:camel Route>]<B> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> B>)
            }
        }}
        paste::paste! { impl<B> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<B>
        where
            B: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<B>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------  Register  ----------------------------------------------------
route!(register => Post "/register" impl RegistrationManagement, OptionManagement);
/// Route handler for new registrations.
///
/// The request body is the registrant's details plus any accompany persons attending with them. On success the
/// response carries the registration id and the signed OnePay redirect URL; the registration stays `pending`
/// until the gateway's IPN callback confirms payment.
pub async fn register<B: RegistrationManagement + OptionManagement>(
    req: HttpRequest,
    options: web::Data<ServerOptions>,
    api: web::Data<RegistrationFlowApi<B>>,
    body: web::Json<NewRegistration>,
) -> Result<HttpResponse, ServerError> {
    let ip = client_ip(&req, options.get_ref());
    debug!("💻️ POST register from {ip}");
    let redirect = api.register(body.into_inner(), &ip).await?;
    Ok(HttpResponse::Ok().json(redirect))
}

route!(registration_info => Get "/register/{id}/registration-info" impl RegistrationManagement, OptionManagement);
pub async fn registration_info<B: RegistrationManagement + OptionManagement>(
    path: web::Path<String>,
    api: web::Data<RegistrationFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = RegistrationId::from(path.into_inner());
    debug!("💻️ GET registration info for [{id}]");
    let registration = api.fetch_registration(&id).await?;
    Ok(HttpResponse::Ok().json(registration))
}

route!(registration_option => Get "/register/option" impl RegistrationManagement, OptionManagement);
/// Route handler for the public fee-quote endpoint.
///
/// Returns the current fee for the given category and dinner flag, together with the per-person accompany
/// surcharge and the cached USD→VND display rate.
pub async fn registration_option<B: RegistrationManagement + OptionManagement>(
    params: web::Query<OptionQuoteParams>,
    api: web::Data<RegistrationFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let params = params.into_inner();
    let category = params
        .category
        .parse::<RegistrationCategory>()
        .map_err(|e| ServerError::InvalidRequest(e.to_string()))?;
    debug!("💻️ GET option quote for {} (dinner: {})", params.category, params.attend_gala_dinner);
    let quote = api.quote_option(category, params.attend_gala_dinner).await?;
    Ok(HttpResponse::Ok().json(quote))
}

//----------------------------------------------  Accompany  ---------------------------------------------------
route!(accompany_persons => Post "/register/accompany-persons" impl RegistrationManagement, OptionManagement, AccompanyManagement);
/// Route handler for the accompany-person add-on flow.
///
/// The owning registration is looked up by email and must already be paid. The submitted persons are parked in
/// a batch until the gateway confirms the add-on payment.
pub async fn accompany_persons<B: RegistrationManagement + OptionManagement + AccompanyManagement>(
    req: HttpRequest,
    options: web::Data<ServerOptions>,
    api: web::Data<RegistrationFlowApi<B>>,
    body: web::Json<AccompanyRequest>,
) -> Result<HttpResponse, ServerError> {
    let ip = client_ip(&req, options.get_ref());
    let body = body.into_inner();
    debug!("💻️ POST accompany persons ({}) from {ip}", body.accompany_persons.len());
    let redirect = api.register_accompany_persons(&body.email, body.accompany_persons, &ip).await?;
    Ok(HttpResponse::Ok().json(redirect))
}

//----------------------------------------------     IPN     ---------------------------------------------------
route!(ipn => Get "/onepay/ipn" impl RegistrationManagement, OptionManagement, AccompanyManagement);
/// Route handler for the gateway's IPN callback.
///
/// A verified callback that reconciles (including redeliveries and unrecognised order tags) gets the literal
/// acknowledgement body the gateway expects. An unverifiable callback gets a 403, and a callback naming a
/// registration or add-on transaction that does not exist gets a 404. Neither changes any state.
pub async fn ipn<B: RegistrationManagement + OptionManagement + AccompanyManagement>(
    query: web::Query<Vec<(String, String)>>,
    api: web::Data<RegistrationFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let callback = IpnCallback::from_query_pairs(query.into_inner())
        .map_err(|e| ServerError::InvalidRequestBody(e.to_string()))?;
    let resolution = api.handle_ipn(callback).await?;
    debug!("💻️ IPN callback resolved: {resolution:?}");
    Ok(HttpResponse::Ok().content_type("text/plain").body(IPN_ACK_BODY))
}
