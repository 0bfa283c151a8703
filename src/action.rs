//! Selected-action wrapper
//!
//! The engine never inspects the host's payload type; it only wraps it so a
//! Tagger node can stamp a category onto whatever a generator produced.

use crate::core::types::ActionTag;

/// An action selected by a decision cycle.
///
/// `A` is the host's opaque payload (a job, a task, an order id). The wrapper
/// is immutable once produced apart from tag stamping during the same
/// evaluation pass that created it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action<A> {
    payload: A,
    tag: Option<ActionTag>,
}

impl<A> Action<A> {
    pub fn new(payload: A) -> Self {
        Self { payload, tag: None }
    }

    pub fn payload(&self) -> &A {
        &self.payload
    }

    pub fn into_payload(self) -> A {
        self.payload
    }

    pub fn tag(&self) -> Option<&ActionTag> {
        self.tag.as_ref()
    }

    /// Stamp a category tag. The innermost Tagger wins: an already-tagged
    /// action keeps its tag.
    pub(crate) fn stamp(&mut self, tag: &ActionTag) {
        if self.tag.is_none() {
            self.tag = Some(tag.clone());
        }
    }
}
