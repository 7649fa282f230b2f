//! A [`Gtx`] bound to the client that will submit it.

use crate::client::RestClient;
use crate::error::RpcError;
use postchain_gtv::Gtv;
use postchain_tx::Gtx;

/// A transaction under construction, posted through its client.
pub struct PostchainTransaction<'a> {
    gtx: Gtx,
    client: &'a RestClient,
}

impl<'a> PostchainTransaction<'a> {
    /// Bind `gtx` to `client`.
    pub fn new(gtx: Gtx, client: &'a RestClient) -> Self {
        Self { gtx, client }
    }

    /// The underlying transaction.
    pub fn gtx(&self) -> &Gtx {
        &self.gtx
    }

    /// Unbind and return the transaction.
    pub fn into_gtx(self) -> Gtx {
        self.gtx
    }

    /// Append an operation call.
    pub fn add_operation(
        &mut self,
        name: impl Into<String>,
        args: Vec<Gtv>,
    ) -> Result<&mut Self, RpcError> {
        self.gtx.add_operation(name, args)?;
        Ok(self)
    }

    /// Register a signer.
    pub fn add_signer(&mut self, public_key: impl Into<Vec<u8>>) -> Result<&mut Self, RpcError> {
        self.gtx.add_signer(public_key)?;
        Ok(self)
    }

    /// Sign with `private_key`; the public key is derived when omitted.
    pub fn sign(
        &mut self,
        private_key: &[u8],
        public_key: Option<&[u8]>,
    ) -> Result<&mut Self, RpcError> {
        self.gtx.sign(private_key, public_key)?;
        Ok(self)
    }

    /// Attach an externally produced signature.
    pub fn add_signature(
        &mut self,
        public_key: &[u8],
        signature: impl Into<Vec<u8>>,
    ) -> Result<&mut Self, RpcError> {
        self.gtx.attach_signature(public_key, signature)?;
        Ok(self)
    }

    /// Digest every signer signs.
    pub fn digest_to_sign(&self) -> [u8; 32] {
        self.gtx.digest_to_sign()
    }

    /// Transaction RID as hex.
    pub fn tx_rid(&self) -> String {
        self.gtx.tx_rid()
    }

    /// Serialized hex payload.
    pub fn encode(&self) -> String {
        self.gtx.serialize()
    }

    /// Post without waiting. Consumes the handle and returns the RID to poll.
    pub async fn send(self) -> Result<String, RpcError> {
        self.client.post_transaction(&self.gtx.serialize()).await?;
        Ok(self.gtx.tx_rid())
    }

    /// Post and wait until the node confirms the transaction.
    pub async fn post_and_wait_confirmation(&self) -> Result<(), RpcError> {
        self.client
            .post_and_wait_confirmation(&self.gtx.serialize(), &self.gtx.tx_rid())
            .await
    }
}
