pub mod auth;
pub mod coordinator;
pub mod event;
pub mod export;
pub mod filter;
pub mod gateway;
pub mod participant;
pub mod registration;
pub mod roster;
pub mod selection;
pub mod session;
pub mod settings;
pub mod validation;

#[cfg(test)]
pub mod fake;
