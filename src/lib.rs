#![doc = include_str!("../README.md")]

pub mod api;
pub mod cli;
pub mod engine;
pub mod error;
pub mod runtime;
pub mod selectors;
pub mod services;
pub mod types;

pub use api::*;
pub use engine::*;
pub use error::*;
pub use services::*;
pub use types::*;
