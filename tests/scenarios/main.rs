//! End-to-end pipeline scenarios

#[path = "../helpers.rs"]
mod helpers;

mod failure_gating;
mod secrets;
mod service_startup;
