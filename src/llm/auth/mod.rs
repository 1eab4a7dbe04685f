//! Credentials for Vertex AI

pub mod adc;

pub use adc::AuthenticationManager;
