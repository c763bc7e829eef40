//! Resolver records applied after registration.

use alloy::primitives::{hex, Address, Bytes};
use data_encoding::BASE32_NOPAD;

use crate::error::{OrchestratorError, OrchestratorResult};

/// Multicodec prefix (varint) for `ipfs-ns`.
const IPFS_NS: [u8; 2] = [0xe3, 0x01];
/// Multicodec prefix (varint) for `ipns-ns`.
const IPNS_NS: [u8; 2] = [0xe5, 0x01];
/// CIDv1 version byte followed by the `dag-pb` codec, used to upgrade CIDv0.
const CID_V1_DAG_PB: [u8; 2] = [0x01, 0x70];

/// Optional records requested for a label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordRequest {
    /// ETH address record (coin type 60).
    pub addr: Option<Address>,
    /// Text records as (key, value).
    pub texts: Vec<(String, String)>,
    /// Encoded contenthash bytes.
    pub contenthash: Option<Bytes>,
    /// Original contenthash URI, for logs.
    pub contenthash_uri: Option<String>,
}

impl RecordRequest {
    pub fn is_empty(&self) -> bool {
        self.addr.is_none() && self.texts.is_empty() && self.contenthash.is_none()
    }

    pub fn with_contenthash(mut self, uri: &str) -> OrchestratorResult<Self> {
        self.contenthash = Some(encode_contenthash(uri)?);
        self.contenthash_uri = Some(uri.to_string());
        Ok(self)
    }
}

/// Parse a `key=value` text record argument. The value may contain `=`.
pub fn parse_text_record(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{}'", arg)),
    }
}

/// One record transaction that failed after registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFailure {
    /// Which record, e.g. `resolver`, `addr`, `text:url`, `contenthash`.
    pub record: String,
    pub error: String,
}

/// Encode an `ipfs://`, `ipns://` or raw `0x…` content pointer as an
/// ENSIP-7 contenthash.
pub fn encode_contenthash(uri: &str) -> OrchestratorResult<Bytes> {
    let invalid = |reason: &str| OrchestratorError::PreconditionFailed(format!("invalid contenthash '{}': {}", uri, reason));

    if let Some(raw) = uri.strip_prefix("0x") {
        return hex::decode(raw).map(Bytes::from).map_err(|_| invalid("bad hex"));
    }

    let lower = uri.to_ascii_lowercase();
    let (prefix, cid) = if lower.starts_with("ipfs://") {
        (IPFS_NS, &uri[7..])
    } else if lower.starts_with("ipns://") {
        (IPNS_NS, &uri[7..])
    } else {
        return Err(invalid("use ipfs://, ipns:// or 0x-hex"));
    };
    let cid = cid.trim_end_matches('/');

    let cid_bytes = decode_cid(cid).ok_or_else(|| invalid("unsupported or malformed CID"))?;
    if prefix == IPNS_NS && cid_bytes.first() != Some(&0x01) {
        return Err(invalid("ipns:// needs a CIDv1 key"));
    }

    let mut out = Vec::with_capacity(2 + cid_bytes.len());
    out.extend_from_slice(&prefix);
    out.extend_from_slice(&cid_bytes);
    Ok(Bytes::from(out))
}

/// Decode a CID string to CIDv1 bytes.
fn decode_cid(cid: &str) -> Option<Vec<u8>> {
    if cid.len() == 46 && cid.starts_with("Qm") {
        // CIDv0: bare sha2-256 multihash.
        let multihash = bs58::decode(cid).into_vec().ok()?;
        if multihash.len() != 34 || multihash[0] != 0x12 || multihash[1] != 0x20 {
            return None;
        }
        let mut bytes = CID_V1_DAG_PB.to_vec();
        bytes.extend_from_slice(&multihash);
        return Some(bytes);
    }

    let (base, body) = cid.split_at(cid.char_indices().nth(1)?.0);
    let bytes = match base {
        "z" => bs58::decode(body).into_vec().ok()?,
        // Multibase `b` is lowercase RFC 4648 base32 without padding.
        "b" => BASE32_NOPAD
            .decode(body.to_ascii_uppercase().as_bytes())
            .ok()?,
        _ => return None,
    };
    (bytes.first() == Some(&0x01) && bytes.len() > 2).then_some(bytes)
}
