//! A client for the JSON-RPC 2.0 protocol.
//!
//! The [`Client`] builds requests, posts them through a [`Transport`] (HTTP by default), checks
//! that what comes back is a well-formed JSON-RPC response, and turns it into either the result
//! value or a [`JsonRpcError`].  A [`Batch`] records many calls, sends them as a single JSON array,
//! and matches the replies back to the [`BatchResponse`] placeholders the calls returned.
//!
//! ```no_run
//! # use jsonrpc_client::{Client, JsonRpcError};
//! # use serde_json::json;
//! # async fn example() -> Result<(), JsonRpcError> {
//! let client = Client::new("http://localhost:8080/rpc")?;
//! let sum = client.invoke("sum", vec![json!(1), json!(2), json!(4)]).await?;
//!
//! let mut subtract = None;
//! client
//!     .batch(|batch| {
//!         subtract = Some(batch.call("subtract", vec![json!(42), json!(23)])?);
//!         batch.notify("log", vec![json!("hello")])?;
//!         Ok(())
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

// Lets the `testing` module name this crate the same way whether it's compiled into the unit
// tests or included by the integration tests
#[cfg(test)]
extern crate self as jsonrpc_client;

/// The protocol version tag carried by every request and expected in every response.
pub const JSON_RPC_VERSION: &str = "2.0";

mod batch;
mod client;
mod config;
mod error;
mod id;
#[cfg(test)]
pub mod testing;
mod transport;
mod types;
pub mod validate;

pub use batch::{Batch, BatchResponse};
pub use client::{Client, ClientBuilder};
pub use config::{CallOptions, ClientConfig, DEFAULT_CONTENT_TYPE, TransportOptions};
pub use error::{ErrorKind, JsonRpcError, Result};
pub use id::{IdGenerator, RANDOM_ID_BOUND, RandomIdGenerator, SequentialIdGenerator, UuidIdGenerator};
#[cfg(feature = "http")]
pub use transport::HttpTransport;
pub use transport::{Transport, TransportResponse};
pub use types::{ErrorCode, ErrorObject, Id, JsonMap, JsonValue, Params, Request, Response, ResponsePayload, TwoPointZero};
