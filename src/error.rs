/// Errors reported by [`OSRBTreeMap`](crate::OSRBTreeMap) and its cursors.
///
/// None of these leave the map modified: an operation either completes or reports one of
/// these before touching the tree.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The key has no entry in the map.
    #[error("no entry found for key")]
    KeyNotFound,
    /// A rank at or beyond the number of entries.
    #[error("rank {rank} is out of bounds for a map of {len} entries")]
    RankOutOfBounds {
        /// The requested rank.
        rank: usize,
        /// Number of entries in the map.
        len: usize,
    },
    /// The cursor is past-the-end: it cannot be dereferenced, removed, or advanced.
    #[error("cursor is past the end of the map")]
    CursorAtEnd,
    /// The cursor is on the smallest entry (or the map is empty) and cannot move back.
    #[error("cursor is at the start of the map")]
    CursorAtStart,
    /// The cursors belong to different maps.
    #[error("cursors belong to different maps")]
    ForeignCursor,
}
