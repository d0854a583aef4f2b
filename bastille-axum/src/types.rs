use bastille::CapabilityClaims;
use serde::Deserialize;

/// Query parameters carried by a signed capability URL.
#[derive(Debug, Clone, Deserialize)]
pub struct CapabilityParams {
    pub identifier: String,
    pub entropy: String,
    pub expires: i64,
    pub signature: String,
}

impl CapabilityParams {
    pub fn into_claims(self) -> CapabilityClaims {
        CapabilityClaims {
            identifier: self.identifier,
            entropy: self.entropy,
            expires: self.expires,
            signature: self.signature,
        }
    }
}
