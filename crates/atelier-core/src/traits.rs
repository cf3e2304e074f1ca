use async_trait::async_trait;

use crate::Result;

/// Trait for model transports that can run a single generation call.
///
/// An oracle is opaque text-in/text-out: prompt assembly, credential
/// rotation, and retry policy all live above it. The credential is
/// passed per call so the key pool stays outside the transport.
#[async_trait]
pub trait ModelOracle: Send + Sync {
    /// Returns the unique identifier for this oracle.
    fn name(&self) -> &'static str;

    /// Runs one generation call using the given credential.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the service rejects it.
    /// The error message must carry whatever status and body detail the
    /// service returned, since failure classification reads it verbatim.
    async fn generate(&self, credential: &str, prompt: &str) -> Result<String>;
}
