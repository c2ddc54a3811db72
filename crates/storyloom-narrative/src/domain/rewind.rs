//! Rewind resolution over the token address space.

use storyloom_core::error::DomainError;
use storyloom_core::story::StoryNode;

/// Where a rewind lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewindPoint {
    /// Position of the owning node; everything after it is discarded.
    pub index: usize,
    /// The requested token, which becomes the next node's start.
    pub token: i64,
}

/// Finds the first node, scanning oldest to newest, whose inclusive range
/// contains `rewind_token`.
///
/// A token sitting on the boundary between two nodes belongs to the
/// earlier one.
///
/// # Errors
///
/// Returns `DomainError::InvalidRewindToken` if no node contains the token.
pub fn resolve(nodes: &[StoryNode], rewind_token: i64) -> Result<RewindPoint, DomainError> {
    nodes
        .iter()
        .position(|node| node.contains(rewind_token))
        .map(|index| RewindPoint {
            index,
            token: rewind_token,
        })
        .ok_or(DomainError::InvalidRewindToken(rewind_token))
}
