//! Community string authentication.

use bytes::Bytes;
use subtle::ConstantTimeEq;

/// Accepted-community allow-list.
///
/// Matching is exact and byte-wise. Every candidate is compared in constant
/// time and the scan never stops early, so response timing says nothing
/// about which community (if any) was close.
#[derive(Clone, Default)]
pub struct CommunityValidator {
    accepted: Vec<Bytes>,
}

impl CommunityValidator {
    /// Create a validator accepting any of `communities`.
    ///
    /// An empty list rejects everything.
    pub fn new<I, C>(communities: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: AsRef<[u8]>,
    {
        Self {
            accepted: communities
                .into_iter()
                .map(|c| Bytes::copy_from_slice(c.as_ref()))
                .collect(),
        }
    }

    /// Check an offered community.
    pub fn validate(&self, community: &[u8]) -> bool {
        let mut matched = subtle::Choice::from(0u8);
        for candidate in &self.accepted {
            matched |= candidate.as_ref().ct_eq(community);
        }
        matched.into()
    }

    /// Number of accepted communities.
    pub fn len(&self) -> usize {
        self.accepted.len()
    }

    /// Check whether nothing is accepted.
    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }
}

// Never print community values
impl std::fmt::Debug for CommunityValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommunityValidator")
            .field("accepted", &format_args!("[{} redacted]", self.accepted.len()))
            .finish()
    }
}
