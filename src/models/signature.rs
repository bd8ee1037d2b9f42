//! Digital signature data models and API request/response types.
//!
//! These types carry the output of the signature service: the signature
//! itself, the simulated ICP-Brasil certificate it was produced under, and
//! the report of the multi-stage electronic verification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Simulated ICP-Brasil A3 certificate.
///
/// Synthesized fresh at signing time; never persisted as a reusable
/// object. The `note` field marks it as a development-mode simulation so
/// downstream consumers cannot mistake it for a CA-issued certificate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateInfo {
    /// Issuer distinguished name, following ICP-Brasil conventions
    pub issuer: String,

    /// Subject distinguished name (holder doctor)
    pub subject: String,

    /// Serial number derived from issuance time plus random bytes
    pub serial_number: String,

    /// Start of the validity window
    pub valid_from: DateTime<Utc>,

    /// End of the validity window (three years after issuance)
    pub valid_until: DateTime<Utc>,

    /// X.509 key usage strings
    pub key_usage: Vec<String>,

    /// X.509 extended key usage strings
    pub extended_key_usage: Vec<String>,

    /// Compliance level label, "ICP-Brasil A3"
    pub compliance_level: String,

    /// ICP-Brasil certificate policy OID
    pub certificate_policy: String,

    /// Holder doctor id
    pub doctor_id: Uuid,

    /// CRM registration of the holder
    pub crm: String,

    /// State of the CRM registration
    pub crm_state: String,

    /// Marks the certificate as simulated (no real CA interaction)
    pub note: String,
}

/// Certificate info enriched at signing time with the cryptographic
/// parameters actually used and the signing instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedCertificateInfo {
    #[serde(flatten)]
    pub certificate: CertificateInfo,

    /// Signature algorithm, "RSA-PSS"
    pub signature_algorithm: String,

    /// Digest algorithm, "SHA-256"
    pub hash_algorithm: String,

    /// RSA modulus size in bits
    pub key_size: u32,

    /// PSS salt length in bytes
    pub salt_length: u32,

    /// Instant the signature was produced
    pub signed_at: DateTime<Utc>,
}

/// Result of signing a prescription.
///
/// The signature covers `"{document_hash}|{timestamp}"`, binding it to
/// both the exact document content and the exact signing instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureResult {
    /// RSA-PSS signature, base64 encoded
    pub signature: String,

    /// Algorithm label, "RSA-PSS"
    pub algorithm: String,

    /// Signing instant as an RFC 3339 string (the exact string signed)
    pub timestamp: String,

    /// Certificate the signature was produced under
    pub certificate_info: SignedCertificateInfo,

    /// SHA-256 of the signed document content, hex encoded
    pub document_hash: String,
}

/// Report of the multi-stage electronic verification.
///
/// `is_valid` is true only when every stage passed. Verification never
/// fails with an error: internal problems degrade to `is_valid = false`
/// with a note in `verification_details`.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    pub is_valid: bool,

    /// Signature and document hash are both present
    pub basic_verification: bool,

    /// Compliance level and policy OID match the ICP-Brasil A3 constants
    pub chain_of_trust: bool,

    /// Signing instant is within 24 hours of verification time
    pub timestamp_freshness: bool,

    /// Simulated revocation check outcome (true = not revoked)
    pub revocation_status: bool,

    /// Free-form metadata about the verification run
    pub verification_details: serde_json::Value,

    /// When the verification ran
    pub verified_at: DateTime<Utc>,
}

/// Freshly generated RSA key pair, PEM encoded.
#[derive(Debug, Serialize)]
pub struct KeyPair {
    /// SPKI PEM public key
    pub public_key: String,

    /// PKCS#8 PEM private key
    pub private_key: String,
}

/// Request to sign a prescription.
///
/// The caller supplies the document text, the doctor's private key and the
/// registration data the certificate is synthesized from.
#[derive(Debug, Deserialize)]
pub struct SignRequest {
    /// Plain text of the prescription
    pub document_content: String,

    /// Doctor's PKCS#8 PEM private key
    pub private_key: String,

    pub doctor_id: Uuid,

    pub patient_id: Uuid,

    pub doctor_name: String,

    pub crm: String,

    pub crm_state: String,
}

/// Response for the sign endpoint.
#[derive(Debug, Serialize)]
pub struct SignResponse {
    #[serde(flatten)]
    pub result: SignatureResult,

    /// SHA-256 fingerprint of the signature event, for audit logs
    pub audit_hash: String,
}

/// Request to verify a detached signature.
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub document_content: String,

    /// Base64 signature produced by the sign endpoint
    pub signature: String,

    /// SPKI PEM public key
    pub public_key: String,

    /// The RFC 3339 timestamp the signature was produced at
    pub timestamp: String,
}

/// Response for the verify endpoint.
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub valid: bool,
}

/// Request for the multi-stage electronic verification.
#[derive(Debug, Deserialize)]
pub struct ElectronicVerificationRequest {
    pub signature: String,

    pub document_hash: String,

    pub certificate_info: SignedCertificateInfo,
}

/// Request to authenticate against the (simulated) A3 hardware token.
#[derive(Debug, Deserialize)]
pub struct TokenAuthRequest {
    pub pin: String,

    pub certificate_id: String,
}

/// Response for the token authentication endpoint.
#[derive(Debug, Serialize)]
pub struct TokenAuthResponse {
    pub authenticated: bool,

    pub certificate_id: String,
}
