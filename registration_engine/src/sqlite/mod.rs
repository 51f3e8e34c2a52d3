//! SQLite backend for the registration engine.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
