//! Label canonicalization and ENS hashing.
//!
//! A label is mapped to ASCII with UTS-46 (STD3 rules, non-transitional),
//! lower-cased, and must remain a single non-empty label. All hashing is done
//! on the canonical ASCII form, so `parse(parse(x)) == parse(x)`.

use alloy::primitives::{keccak256, B256, U256};
use serde::{Deserialize, Serialize};

use crate::error::{OrchestratorError, OrchestratorResult};

/// Top-level domain managed by the registrar controller.
pub const TLD: &str = "eth";

/// A canonical second-level `.eth` label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EnsLabel(String);

impl EnsLabel {
    /// Parse `label` or `label.eth` into canonical form.
    pub fn parse(input: &str) -> OrchestratorResult<Self> {
        let trimmed = input.trim();
        let bare = strip_tld(trimmed);

        if bare.is_empty() {
            return Err(OrchestratorError::invalid_label(input, "empty label"));
        }
        if bare.contains('.') {
            return Err(OrchestratorError::invalid_label(
                input,
                "only second-level .eth names are supported",
            ));
        }

        let ascii = idna::domain_to_ascii_strict(bare)
            .map_err(|e| OrchestratorError::invalid_label(input, format!("UTS-46 mapping failed: {:?}", e)))?
            .to_ascii_lowercase();

        // UTS-46 maps some full-stop lookalikes to '.', so re-check afterwards.
        if ascii.is_empty() || ascii.contains('.') {
            return Err(OrchestratorError::invalid_label(
                input,
                "label does not map to a single ASCII label",
            ));
        }

        Ok(Self(ascii))
    }

    /// Canonical ASCII label.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical full identifier, e.g. `example.eth`.
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.0, TLD)
    }

    /// keccak256 of the label bytes.
    pub fn label_hash(&self) -> B256 {
        keccak256(self.0.as_bytes())
    }

    /// EIP-137 namehash of the full identifier.
    pub fn node(&self) -> B256 {
        namehash(&self.full_name())
    }

    /// ERC-721 token id on the base registrar.
    pub fn token_id(&self) -> U256 {
        U256::from_be_bytes(self.label_hash().0)
    }
}

impl std::fmt::Display for EnsLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.full_name())
    }
}

impl TryFrom<String> for EnsLabel {
    type Error = OrchestratorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EnsLabel> for String {
    fn from(label: EnsLabel) -> Self {
        label.0
    }
}

fn strip_tld(name: &str) -> &str {
    let suffix_len = TLD.len() + 1;
    if name.len() > suffix_len {
        let (head, tail) = name.split_at(name.len() - suffix_len);
        if tail.eq_ignore_ascii_case(".eth") {
            return head;
        }
    }
    name
}

/// EIP-137 namehash.
pub fn namehash(name: &str) -> B256 {
    let mut node = B256::ZERO;
    if name.is_empty() {
        return node;
    }
    for label in name.rsplit('.') {
        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(node.as_slice());
        buf[32..].copy_from_slice(keccak256(label.as_bytes()).as_slice());
        node = keccak256(buf);
    }
    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::b256;
    use proptest::prelude::*;

    #[test]
    fn test_namehash_reference_vectors() {
        assert_eq!(namehash(""), B256::ZERO);
        assert_eq!(
            namehash("eth"),
            b256!("93cdeb708b7545dc668eb9280176169d1c33cfd8ed6f04690a0bcc88a93fc4ae")
        );
        assert_eq!(
            namehash("foo.eth"),
            b256!("de9b09fd7c5f901e23a3f19fecc54828e9c848539801e86591bd9801b019f84f")
        );
    }

    #[test]
    fn test_parse_variants() {
        let a = EnsLabel::parse("example").unwrap();
        let b = EnsLabel::parse("Example.ETH").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "example");
        assert_eq!(a.full_name(), "example.eth");
        assert_eq!(a.node(), namehash("example.eth"));
    }

    #[test]
    fn test_rejects_multi_level_and_empty() {
        assert!(matches!(
            EnsLabel::parse("sub.example.eth"),
            Err(OrchestratorError::InvalidLabel { .. })
        ));
        assert!(matches!(EnsLabel::parse(""), Err(OrchestratorError::InvalidLabel { .. })));
        assert!(matches!(EnsLabel::parse(".eth"), Err(OrchestratorError::InvalidLabel { .. })));
    }

    #[test]
    fn test_rejects_unmappable() {
        assert!(EnsLabel::parse("bad label").is_err());
        assert!(EnsLabel::parse("under_score").is_err());
    }

    #[test]
    fn test_unicode_maps_to_punycode() {
        let label = EnsLabel::parse("bücher").unwrap();
        assert_eq!(label.as_str(), "xn--bcher-kva");
        assert_eq!(EnsLabel::parse(label.as_str()).unwrap(), label);
    }

    #[test]
    fn test_numeric_label() {
        assert_eq!(EnsLabel::parse("1234.eth").unwrap().as_str(), "1234");
    }

    #[test]
    fn test_token_id_matches_label_hash() {
        let label = EnsLabel::parse("vitalik").unwrap();
        assert_eq!(label.token_id().to_be_bytes::<32>(), label.label_hash().0);
    }

    #[test]
    fn test_serde_revalidates() {
        let label: EnsLabel = serde_json::from_str("\"Example\"").unwrap();
        assert_eq!(label.as_str(), "example");
        assert!(serde_json::from_str::<EnsLabel>("\"a.b\"").is_err());
    }

    proptest! {
        #[test]
        fn parse_is_idempotent(input in "[a-zA-Z0-9-]{1,20}|[a-z]{1,5}[äöüéñ][a-z]{0,5}") {
            if let Ok(once) = EnsLabel::parse(&input) {
                let twice = EnsLabel::parse(once.as_str()).unwrap();
                prop_assert_eq!(once.clone(), twice);
                let thrice = EnsLabel::parse(&once.full_name()).unwrap();
                prop_assert_eq!(once, thrice);
            }
        }
    }
}
