//! Ride passenger matching: eligibility, rule and semantic scoring, ranking, and the HTTP
//! surface that exposes them to ride hosts.

pub mod config;
pub mod error;
pub mod matching;
pub mod telemetry;
