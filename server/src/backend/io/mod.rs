//! Interface layer exposing the backend over HTTP.

pub mod rest;

pub use rest::*;
