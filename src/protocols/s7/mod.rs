//! Siemens S7: items of the cyclic data subscription service

mod cyc;
pub mod enums;

pub use cyc::*;
