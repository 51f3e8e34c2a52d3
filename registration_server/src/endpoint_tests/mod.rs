mod helpers;
mod ipn;
mod mocks;
mod register;
