//! Mobile-money gateway seam.
//!
//! The engine only knows this trait; the concrete Daraja client lives in the
//! application crate. A thrown gateway error is a hard failure for the
//! calling operation: the ledger row is marked failed and the balance stays
//! untouched.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct GatewayError(pub String);

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Initiates an STK push for `amount_minor` against `phone`.
    ///
    /// Returns the gateway's correlation id. The actual confirmation arrives
    /// asynchronously through the callback endpoint.
    async fn stk_push(
        &self,
        phone: &str,
        amount_minor: i64,
        reference: &str,
    ) -> Result<String, GatewayError>;
}

/// Gateway used when no real credentials are configured: accepts every push
/// and echoes a sandbox correlation id.
#[derive(Clone, Copy, Debug, Default)]
pub struct SandboxGateway;

#[async_trait]
impl PaymentGateway for SandboxGateway {
    async fn stk_push(
        &self,
        _phone: &str,
        _amount_minor: i64,
        reference: &str,
    ) -> Result<String, GatewayError> {
        Ok(format!("SBX_{reference}"))
    }
}
