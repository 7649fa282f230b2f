//! REST transport for Postchain nodes.
//!
//! Posts serialized GTX transactions, polls their status until a final
//! state, runs read-only queries and resolves blockchain RIDs from chain IIDs.
//!
//! # Example
//!
//! ```ignore
//! use postchain_rpc::RestClient;
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = RestClient::new("http://localhost:7740", Some(BRID)).unwrap();
//!     let mut tx = client.new_transaction().unwrap();
//!     tx.add_signer(pubkey.to_vec()).unwrap();
//!     tx.add_operation("transfer", vec![1000.into(), "alice".into()]).unwrap();
//!     tx.sign(&privkey, None).unwrap();
//!     tx.post_and_wait_confirmation().await.unwrap();
//! }
//! ```

pub mod client;
pub mod error;
pub mod query;
pub mod status;
pub mod transaction;

pub use client::{RestClient, RestConfig};
pub use error::RpcError;
pub use status::{StatusResponse, TxStatus};
pub use transaction::PostchainTransaction;
