//! # OnePay registration server
//! This crate hosts the HTTP surface of the event-registration gateway. It is responsible for:
//! * Accepting registration and accompany-person requests and returning signed OnePay redirect URLs.
//! * Listening for IPN callbacks from the gateway and handing them to the reconciler.
//! * Serving public fee quotes and registration lookups.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `POST /register`: Create a registration and receive the payment redirect URL.
//! * `GET /register/option`: Quote the fee for a category.
//! * `GET /register/{id}/registration-info`: Fetch a registration.
//! * `POST /register/accompany-persons`: Add accompany persons to a paid registration.
//! * `GET /onepay/ipn`: The gateway's IPN callback endpoint.

pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
