//! SAP backend integration: request building, transport and reply extraction.

pub mod client;
pub mod convert;
pub mod envelope;
pub mod extract;
pub mod odata;
pub mod proxy;

pub use client::{HttpTransport, InvokeError, SapRequest, SapTransport};
pub use proxy::{Inputs, SapProxy};
