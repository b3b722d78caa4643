//! Request handlers

pub mod account;
pub mod health;
pub mod identity;
pub mod profile;
