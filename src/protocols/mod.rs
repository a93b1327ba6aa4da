//! Message definitions for the supported PLC protocols

pub mod cbus;
pub mod s7;
