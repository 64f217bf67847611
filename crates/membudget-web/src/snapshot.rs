//! Serializable projection of an [`EditSession`] for WebSocket and REST
//! transport.
//!
//! The panel redraws from a snapshot after every move: handle positions
//! for the slider and the `{absolute, percentage}` breakdown for the labels.

use membudget::allocator::BoundaryVector;
use membudget::breakdown::Breakdown;
use membudget::session::{EditSession, Origin};
use serde::Serialize;

/// Serializable view of an edit session.
#[derive(Debug, Serialize)]
pub struct AllocationSnapshot {
    pub user: String,
    pub total: i64,
    pub min_gap: i64,
    /// All nine boundaries, endpoints included.
    pub boundaries: BoundaryVector,
    pub breakdown: Breakdown,
    /// Unsaved changes pending.
    pub dirty: bool,
    /// `"stored"`, `"default"`, or `"fallback"`.
    pub origin: &'static str,
}

impl AllocationSnapshot {
    pub fn from_session(session: &EditSession) -> Self {
        let origin = match session.origin() {
            Origin::Stored => "stored",
            Origin::Default => "default",
            Origin::Fallback => "fallback",
        };
        Self {
            user: session.user().to_string(),
            total: session.total(),
            min_gap: session.min_gap(),
            boundaries: *session.boundaries(),
            breakdown: session.breakdown(),
            dirty: session.is_dirty(),
            origin,
        }
    }
}
