//! Clipsal C-Bus: commands, application payloads and the ASCII request
//! framing used on the serial interface
//!
//! The entry points are [`CBusCommand`], the binary command carried inside
//! a frame, and [`RequestCommand`], the framed form:
//!
//! ```
//! use plcwire::protocols::cbus::{CBusOptions, RequestCommand};
//! use plcwire::DecodeWith;
//!
//! let request = RequestCommand::try_decode_with(b"\\0538007905g\r", CBusOptions::default()).unwrap();
//! assert!(request.alpha.is_some());
//! ```

pub mod enums;

mod cal;
mod command;
mod error_reporting;
mod header;
mod lighting;
mod metering;
mod request;
mod sal;
mod telephony;

pub use cal::*;
pub use command::*;
pub use error_reporting::*;
pub use header::*;
pub use lighting::*;
pub use metering::*;
pub use request::*;
pub use sal::*;
pub use telephony::*;
