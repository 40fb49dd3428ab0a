use core::fmt;
use core::ptr;

use crate::Error;
use crate::raw::{Handle, RawRBTreeMap};

/// A position in an [`OSRBTreeMap`](super::OSRBTreeMap): either an entry or past-the-end.
///
/// Cursors step through the map in key order. Stepping forward from the largest entry lands
/// past-the-end; stepping backward from past-the-end lands on the largest entry. Stepping
/// beyond either end is an error and leaves the cursor where it was.
///
/// A `Cursor` borrows its map, so the map cannot be modified while the cursor is alive.
///
/// # Examples
///
/// ```
/// use osrb_tree::OSRBTreeMap;
///
/// let map = OSRBTreeMap::from([(1, "a"), (2, "b")]);
/// let mut cursor = map.begin();
/// assert_eq!(cursor.key(), Some(&1));
/// cursor.move_next().unwrap();
/// assert_eq!(cursor.key_value(), Ok((&2, &"b")));
/// cursor.move_next().unwrap();
/// assert!(cursor.is_end());
/// assert!(cursor.move_next().is_err());
/// ```
pub struct Cursor<'a, K, V> {
    pub(super) tree: &'a RawRBTreeMap<K, V>,
    pub(super) node: Option<Handle>,
}

impl<K, V> Clone for Cursor<'_, K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for Cursor<'_, K, V> {}

impl<'a, K, V> Cursor<'a, K, V> {
    pub(super) fn new(tree: &'a RawRBTreeMap<K, V>, node: Option<Handle>) -> Self {
        Self { tree, node }
    }

    /// Returns `true` if the cursor is past-the-end.
    #[must_use]
    pub fn is_end(&self) -> bool {
        self.node.is_none()
    }

    /// Returns the key at the cursor, or `None` past-the-end.
    #[must_use]
    pub fn key(&self) -> Option<&'a K> {
        self.node.map(|node| self.tree.key_value(node).0)
    }

    /// Returns the value at the cursor, or `None` past-the-end.
    #[must_use]
    pub fn value(&self) -> Option<&'a V> {
        self.node.map(|node| self.tree.key_value(node).1)
    }

    /// Returns the entry at the cursor.
    ///
    /// # Errors
    ///
    /// [`Error::CursorAtEnd`] if the cursor is past-the-end.
    pub fn key_value(&self) -> Result<(&'a K, &'a V), Error> {
        let node = self.node.ok_or(Error::CursorAtEnd)?;
        Ok(self.tree.key_value(node))
    }

    /// Returns the zero-based rank of the entry at the cursor, or `None` past-the-end.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use osrb_tree::OSRBTreeMap;
    ///
    /// let map = OSRBTreeMap::from([(10, ()), (20, ()), (30, ())]);
    /// assert_eq!(map.find(&20).rank(), Some(1));
    /// assert_eq!(map.end().rank(), None);
    /// ```
    #[must_use]
    pub fn rank(&self) -> Option<usize> {
        self.node.map(|node| self.tree.rank_of_node(node))
    }

    /// Moves to the next entry in key order, or past-the-end after the largest.
    ///
    /// # Errors
    ///
    /// [`Error::CursorAtEnd`] if the cursor is already past-the-end.
    pub fn move_next(&mut self) -> Result<(), Error> {
        let node = self.node.ok_or(Error::CursorAtEnd)?;
        self.node = self.tree.next(node);
        Ok(())
    }

    /// Moves to the previous entry in key order. From past-the-end this is the largest entry.
    ///
    /// # Errors
    ///
    /// [`Error::CursorAtStart`] if the cursor is on the smallest entry, or the map is empty.
    pub fn move_prev(&mut self) -> Result<(), Error> {
        self.node = Some(step_back(self.tree, self.node)?);
        Ok(())
    }

    /// Compares two cursor positions.
    ///
    /// # Errors
    ///
    /// [`Error::ForeignCursor`] if the cursors belong to different maps.
    ///
    /// # Examples
    ///
    /// ```
    /// use osrb_tree::{Error, OSRBTreeMap};
    ///
    /// let a = OSRBTreeMap::from([(1, ())]);
    /// let b = a.clone();
    /// assert_eq!(a.begin().try_eq(&a.find(&1)), Ok(true));
    /// assert_eq!(a.begin().try_eq(&b.begin()), Err(Error::ForeignCursor));
    /// ```
    pub fn try_eq(&self, other: &Cursor<'_, K, V>) -> Result<bool, Error> {
        if ptr::eq(self.tree, other.tree) {
            Ok(self.node == other.node)
        } else {
            Err(Error::ForeignCursor)
        }
    }
}

/// Cursors are equal when they belong to the same map and denote the same position.
/// Use [`Cursor::try_eq`] to detect cursors from different maps.
impl<K, V> PartialEq for Cursor<'_, K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.try_eq(other) == Ok(true)
    }
}

impl<K, V> Eq for Cursor<'_, K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Cursor<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cursor").field(&self.key_value().ok()).finish()
    }
}

/// A cursor with exclusive access to its map.
///
/// In addition to everything [`Cursor`] does, it can modify the value at the cursor and
/// remove the entry at the cursor.
///
/// # Examples
///
/// ```
/// use osrb_tree::OSRBTreeMap;
///
/// let mut map = OSRBTreeMap::from([(1, 10), (2, 20), (3, 30)]);
/// let mut cursor = map.find_mut(&2);
/// *cursor.value_mut().unwrap() += 1;
/// assert_eq!(cursor.remove_current(), Ok((2, 21)));
/// assert_eq!(cursor.key(), Some(&3));
/// assert_eq!(map.len(), 2);
/// ```
pub struct CursorMut<'a, K, V> {
    pub(super) tree: &'a mut RawRBTreeMap<K, V>,
    pub(super) node: Option<Handle>,
}

impl<'a, K, V> CursorMut<'a, K, V> {
    pub(super) fn new(tree: &'a mut RawRBTreeMap<K, V>, node: Option<Handle>) -> Self {
        Self { tree, node }
    }

    /// Returns `true` if the cursor is past-the-end.
    #[must_use]
    pub fn is_end(&self) -> bool {
        self.node.is_none()
    }

    /// Returns the key at the cursor, or `None` past-the-end.
    #[must_use]
    pub fn key(&self) -> Option<&K> {
        self.node.map(|node| self.tree.key_value(node).0)
    }

    /// Returns the value at the cursor, or `None` past-the-end.
    #[must_use]
    pub fn value(&self) -> Option<&V> {
        self.node.map(|node| self.tree.key_value(node).1)
    }

    /// Returns a mutable reference to the value at the cursor, or `None` past-the-end.
    pub fn value_mut(&mut self) -> Option<&mut V> {
        let node = self.node?;
        Some(self.tree.key_value_mut(node).1)
    }

    /// Returns the entry at the cursor.
    ///
    /// # Errors
    ///
    /// [`Error::CursorAtEnd`] if the cursor is past-the-end.
    pub fn key_value(&self) -> Result<(&K, &V), Error> {
        let node = self.node.ok_or(Error::CursorAtEnd)?;
        Ok(self.tree.key_value(node))
    }

    /// Returns the key and a mutable reference to the value at the cursor.
    ///
    /// # Errors
    ///
    /// [`Error::CursorAtEnd`] if the cursor is past-the-end.
    pub fn key_value_mut(&mut self) -> Result<(&K, &mut V), Error> {
        let node = self.node.ok_or(Error::CursorAtEnd)?;
        Ok(self.tree.key_value_mut(node))
    }

    /// Converts the cursor into a mutable reference to its value, borrowed for the
    /// cursor's whole lifetime.
    ///
    /// # Errors
    ///
    /// [`Error::CursorAtEnd`] if the cursor is past-the-end.
    pub fn into_value_mut(self) -> Result<&'a mut V, Error> {
        let node = self.node.ok_or(Error::CursorAtEnd)?;
        Ok(self.tree.key_value_mut(node).1)
    }

    /// Returns the zero-based rank of the entry at the cursor, or `None` past-the-end.
    #[must_use]
    pub fn rank(&self) -> Option<usize> {
        self.node.map(|node| self.tree.rank_of_node(node))
    }

    /// Moves to the next entry in key order, or past-the-end after the largest.
    ///
    /// # Errors
    ///
    /// [`Error::CursorAtEnd`] if the cursor is already past-the-end.
    pub fn move_next(&mut self) -> Result<(), Error> {
        let node = self.node.ok_or(Error::CursorAtEnd)?;
        self.node = self.tree.next(node);
        Ok(())
    }

    /// Moves to the previous entry in key order. From past-the-end this is the largest entry.
    ///
    /// # Errors
    ///
    /// [`Error::CursorAtStart`] if the cursor is on the smallest entry, or the map is empty.
    pub fn move_prev(&mut self) -> Result<(), Error> {
        self.node = Some(step_back(self.tree, self.node)?);
        Ok(())
    }

    /// Removes the entry at the cursor and returns it. The cursor moves to the entry that
    /// followed it, or past-the-end.
    ///
    /// # Errors
    ///
    /// [`Error::CursorAtEnd`] if the cursor is past-the-end; the map is not modified.
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn remove_current(&mut self) -> Result<(K, V), Error> {
        let node = self.node.ok_or(Error::CursorAtEnd)?;
        // Handles survive the removal of other nodes, so the successor is still valid after.
        let next = self.tree.next(node);
        let entry = self.tree.remove_node(node);
        self.node = next;
        Ok(entry)
    }

    /// Returns a read-only cursor at the same position.
    #[must_use]
    pub fn as_cursor(&self) -> Cursor<'_, K, V> {
        Cursor::new(self.tree, self.node)
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for CursorMut<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CursorMut").field(&self.key_value().ok()).finish()
    }
}

fn step_back<K, V>(tree: &RawRBTreeMap<K, V>, node: Option<Handle>) -> Result<Handle, Error> {
    match node {
        Some(node) => tree.prev(node),
        None => tree.last(),
    }
    .ok_or(Error::CursorAtStart)
}
