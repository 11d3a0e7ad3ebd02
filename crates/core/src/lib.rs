pub mod application;
pub mod domain;
pub mod error;
pub mod normalizer;
pub mod ports;
pub mod reporter;
pub mod text;
pub mod utils;
