//! Webhook signature verification.
//!
//! GitHub signs each delivery with the shared secret and sends the HMAC in
//! `X-Hub-Signature-256` (`sha256=<hex>`) and, for older hooks, in
//! `X-Hub-Signature` (`sha1=<hex>`). Verification happens before any parsing.

use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;
type HmacSha1 = Hmac<Sha1>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    Sha256,
    Sha1,
}

impl SignatureAlgorithm {
    fn prefix(self) -> &'static str {
        match self {
            SignatureAlgorithm::Sha256 => "sha256=",
            SignatureAlgorithm::Sha1 => "sha1=",
        }
    }
}

/// Parses a signature header value into its algorithm and raw bytes.
///
/// Returns `None` for anything malformed. Never panics.
///
/// # Examples
///
/// ```
/// use merge_gate::webhooks::{SignatureAlgorithm, parse_signature_header};
///
/// let (algorithm, bytes) = parse_signature_header("sha1=abcd").unwrap();
/// assert_eq!(algorithm, SignatureAlgorithm::Sha1);
/// assert_eq!(bytes, vec![0xab, 0xcd]);
///
/// assert!(parse_signature_header("abcd1234").is_none());
/// assert!(parse_signature_header("md5=abcd").is_none());
/// assert!(parse_signature_header("sha256=xyz").is_none());
/// ```
pub fn parse_signature_header(header: &str) -> Option<(SignatureAlgorithm, Vec<u8>)> {
    [SignatureAlgorithm::Sha256, SignatureAlgorithm::Sha1]
        .into_iter()
        .find_map(|algorithm| {
            let hex_sig = header.strip_prefix(algorithm.prefix())?;
            hex::decode(hex_sig).ok().map(|bytes| (algorithm, bytes))
        })
}

/// Computes the HMAC of `payload` under `secret`.
pub fn compute_signature(algorithm: SignatureAlgorithm, payload: &[u8], secret: &[u8]) -> Vec<u8> {
    match algorithm {
        SignatureAlgorithm::Sha256 => {
            let mut mac =
                HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
            mac.update(payload);
            mac.finalize().into_bytes().to_vec()
        }
        SignatureAlgorithm::Sha1 => {
            let mut mac = HmacSha1::new_from_slice(secret).expect("HMAC can take key of any size");
            mac.update(payload);
            mac.finalize().into_bytes().to_vec()
        }
    }
}

/// Formats a signature as a header value, e.g. `sha256=<hex>`.
pub fn format_signature_header(algorithm: SignatureAlgorithm, signature: &[u8]) -> String {
    format!("{}{}", algorithm.prefix(), hex::encode(signature))
}

/// Verifies one signature header against the payload and secret.
///
/// The comparison is constant-time.
///
/// # Examples
///
/// ```
/// use merge_gate::webhooks::{
///     SignatureAlgorithm, compute_signature, format_signature_header, verify_signature,
/// };
///
/// let payload = b"Hello, World!";
/// let secret = b"my-secret-key";
/// let sig = compute_signature(SignatureAlgorithm::Sha256, payload, secret);
/// let header = format_signature_header(SignatureAlgorithm::Sha256, &sig);
///
/// assert!(verify_signature(payload, &header, secret));
/// assert!(!verify_signature(payload, &header, b"wrong-secret"));
/// ```
pub fn verify_signature(payload: &[u8], signature_header: &str, secret: &[u8]) -> bool {
    let Some((algorithm, expected)) = parse_signature_header(signature_header) else {
        return false;
    };
    match algorithm {
        SignatureAlgorithm::Sha256 => {
            let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
                return false;
            };
            mac.update(payload);
            mac.verify_slice(&expected).is_ok()
        }
        SignatureAlgorithm::Sha1 => {
            let Ok(mut mac) = HmacSha1::new_from_slice(secret) else {
                return false;
            };
            mac.update(payload);
            mac.verify_slice(&expected).is_ok()
        }
    }
}

/// Verifies a delivery given both signature headers.
///
/// `X-Hub-Signature-256` wins when present; `X-Hub-Signature` is only
/// consulted without it. A delivery with neither is rejected.
pub fn verify_delivery(
    payload: &[u8],
    sha256_header: Option<&str>,
    sha1_header: Option<&str>,
    secret: &[u8],
) -> bool {
    match (sha256_header, sha1_header) {
        (Some(header), _) => verify_signature(payload, header, secret),
        (None, Some(header)) => verify_signature(payload, header, secret),
        (None, None) => false,
    }
}
