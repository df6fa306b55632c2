//! Pool submission service.
//!
//! Gates create-pool requests on a connected wallet, validates the form,
//! submits through the signing bridge and classifies failures into
//! categories a user can act on.

pub mod api;
pub mod classifier;
pub mod config;
pub mod controller;
pub mod errors;
pub mod form;
pub mod gateway;
pub mod rpc;
pub mod validator;
pub mod wallet;

#[cfg(test)]
mod mock;
