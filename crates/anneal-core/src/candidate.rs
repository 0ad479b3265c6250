//! Candidate and reference artifacts.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// The artifact under refinement.
///
/// The engine never looks inside `payload` — it is a handle the host
/// understands (a hypothesis, a render path, a serialized mesh). A candidate
/// is immutable once scored; the transformer produces the next version via
/// [`Candidate::next_revision`], never by mutating in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candidate {
    /// Stable identity shared by every revision of one refinement line.
    pub id: Uuid,

    /// Revision number, 0 for the seed candidate.
    pub revision: u32,

    /// SHA256 hex digest of the canonical payload bytes, for audit.
    pub digest: String,

    /// Opaque host payload.
    pub payload: serde_json::Value,
}

impl Candidate {
    /// Create the seed candidate for a new run.
    pub fn seed(payload: serde_json::Value) -> Self {
        let digest = payload_digest(&payload);
        Self {
            id: Uuid::new_v4(),
            revision: 0,
            digest,
            payload,
        }
    }

    /// Derive the successor revision with a new payload.
    ///
    /// Identity is preserved so a run's history reads as one refinement line.
    pub fn next_revision(&self, payload: serde_json::Value) -> Self {
        let digest = payload_digest(&payload);
        Self {
            id: self.id,
            revision: self.revision + 1,
            digest,
            payload,
        }
    }
}

/// The ground-truth artifact candidates are scored against. Read-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reference {
    /// SHA256 hex digest of the canonical payload bytes.
    pub digest: String,

    /// Opaque host payload.
    pub payload: serde_json::Value,
}

impl Reference {
    /// Wrap a host payload as a reference artifact.
    pub fn new(payload: serde_json::Value) -> Self {
        let digest = payload_digest(&payload);
        Self { digest, payload }
    }
}

/// SHA256 hex digest of a JSON payload's canonical bytes.
pub fn payload_digest(payload: &serde_json::Value) -> String {
    let bytes = serde_json::to_vec(payload).unwrap_or_default();
    hex::encode(Sha256::digest(&bytes))
}
