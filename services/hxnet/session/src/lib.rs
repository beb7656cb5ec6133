//! Request signing, pooled HTTP transport, error taxonomy, and job plugins for hxnet.
//!
//! This crate turns caller-supplied parameters into signed request URIs,
//! executes them over a small pool of persistent connections, and reduces
//! every failure to a typed [`ClientError`].
//!
//! ## Features
//!
//! - **Three request tiers**: raw, `cmd_id`-signed, and session-bound
//! - **Connection pool**: fixed slots, one in-flight request per connection
//! - **Typed errors**: transport categories, server errors, named exceptions
//! - **Jobs**: background automation sharing the client
//!
//! ## Example
//!
//! ```rust,no_run
//! use hxnet_session::{Client, Params, RequestTier, TransportConfig};
//!
//! # async fn example() -> Result<(), hxnet_session::ClientError> {
//! let config = TransportConfig {
//!     host: "game.example".to_string(),
//!     ..Default::default()
//! };
//! let client = Client::connect(&config, "/index.php", "salt")?;
//! client.set_session("token").await;
//!
//! let doc = client
//!     .call(RequestTier::Session, &Params::new().with("action", "world_load"))
//!     .await?;
//! println!("{} sections", doc.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod error;
pub mod job;
pub mod pool;
pub mod signer;
pub mod transport;

#[cfg(test)]
mod test_server;

// Re-export main types
pub use client::{Client, RequestTier};
pub use error::{ClientError, NamedException, UNKNOWN_KIND};
pub use job::{Job, JobContext, JobError, JobRegistry};
pub use pool::{ConnectionPool, PoolStats, PooledConnection, DEFAULT_POOL_SIZE};
pub use signer::{cmd_hash, Params, Signer, CMD_PARAM, SESSION_PARAM};
pub use transport::{Transport, TransportConfig, DEFAULT_USER_AGENT};
