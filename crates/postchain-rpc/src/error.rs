//! REST transport error types.

use postchain_tx::TxError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("HTTP error on {method} {url}: {source}")]
    Http {
        method: &'static str,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{method} {url} returned HTTP {status}: {body}")]
    HttpStatus {
        method: &'static str,
        url: String,
        status: u16,
        body: String,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no blockchain RID configured, set one or resolve it from a chain IID first")]
    MissingBlockchainRid,

    #[error("invalid transaction RID: {0}")]
    InvalidTxRid(String),

    #[error("transaction {tx_rid} was rejected (status '{status}')")]
    Rejected { tx_rid: String, status: String },

    #[error("node reported an exception: {0}")]
    NodeException(String),

    #[error("unexpected transaction status '{0}'")]
    UnexpectedStatus(String),

    #[error("transaction error: {0}")]
    Tx(#[from] TxError),
}
