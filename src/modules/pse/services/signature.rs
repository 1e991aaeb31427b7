use md5::{Digest, Md5};

/// Currency of the PSE rail; every intent and webhook settles in COP.
pub const CURRENCY_COP: &str = "COP";

/// Shared-secret signature scheme for the PSE gateway
///
/// The gateway's documented digest is an MD5 over caret-joined fields.
/// This is an external contract, not a security boundary owned here:
/// the gateway only recognizes this exact scheme.
///
/// Credentials are injected at construction and never logged.
#[derive(Clone)]
pub struct SignatureCodec {
    client_id: String,
    client_secret: String,
}

impl std::fmt::Debug for SignatureCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // keep the secret out of debug output
        f.debug_struct("SignatureCodec")
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

impl SignatureCodec {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Signature for an outbound payment intent, over the merchant
    /// payment reference.
    pub fn sign(&self, amount: &str, reference: &str) -> String {
        self.digest(reference, amount, CURRENCY_COP)
    }

    /// Verify an inbound webhook signature, recomputed over the
    /// gateway-assigned transaction id. Any mismatch is authoritative
    /// rejection.
    pub fn verify(
        &self,
        transaction_id: &str,
        amount: &str,
        currency_code: &str,
        provided_signature: &str,
    ) -> bool {
        self.digest(transaction_id, amount, currency_code) == provided_signature
    }

    fn digest(&self, correlation: &str, amount: &str, currency_code: &str) -> String {
        let input = format!(
            "{}^{}^{}^{}^{}",
            self.client_id, self.client_secret, correlation, amount, currency_code
        );
        let mut hasher = Md5::new();
        hasher.update(input.as_bytes());
        hex::encode(hasher.finalize())
    }
}
