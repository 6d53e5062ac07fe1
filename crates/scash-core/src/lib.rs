//! # scash-core
//! Foundation types, chain parameters and trait seams for the SCASH wallet.

pub mod address;
pub mod constants;
pub mod error;
pub mod network;
pub mod traits;
pub mod types;
