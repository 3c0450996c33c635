//! IDispatch (MS-OAUT 3.1.4)
//!
//! Late-bound automation interface. Interfaces such as a classifier module's
//! derive from it, so their clients embed a [`DispatchClient`] and their
//! servers inherit [`dispatch_interface`].

mod client;
mod protocol;
mod server;

pub use client::*;
pub use protocol::*;
pub use server::*;
