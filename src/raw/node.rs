use super::handle::Handle;
use super::size::Size;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Color {
    Red,
    Black,
}

/// Which child slot of a parent a node occupies.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Side {
    Left,
    Right,
}

impl Side {
    #[inline]
    pub(crate) const fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// The structural part of a node: everything a two-child erase exchanges between slots.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Links {
    pub(crate) parent: Option<Handle>,
    pub(crate) left: Option<Handle>,
    pub(crate) right: Option<Handle>,
    pub(crate) color: Color,
    // Number of nodes in the subtree rooted here, this node included.
    pub(crate) size: Size,
}

impl Links {
    /// Returns these links with every occurrence of `a` and `b` swapped.
    ///
    /// Used when two slots exchange positions: a link from one of them to the other must
    /// follow the exchange.
    #[inline]
    pub(crate) fn swap_handles(self, a: Handle, b: Handle) -> Self {
        let map = |h: Option<Handle>| match h {
            Some(h) if h == a => Some(b),
            Some(h) if h == b => Some(a),
            other => other,
        };
        Self {
            parent: map(self.parent),
            left: map(self.left),
            right: map(self.right),
            ..self
        }
    }
}

/// A tree node. The value lives in a separate arena, addressed by `value`.
pub(crate) struct Node<K> {
    key: K,
    value: Handle,
    links: Links,
}

impl<K> Node<K> {
    /// Creates a detached red leaf.
    pub(crate) fn new(key: K, value: Handle, parent: Option<Handle>) -> Self {
        Self {
            key,
            value,
            links: Links {
                parent,
                left: None,
                right: None,
                color: Color::Red,
                size: Size::ONE,
            },
        }
    }

    #[inline]
    pub(crate) fn key(&self) -> &K {
        &self.key
    }

    #[inline]
    pub(crate) fn value(&self) -> Handle {
        self.value
    }

    pub(crate) fn into_parts(self) -> (K, Handle) {
        (self.key, self.value)
    }

    #[inline]
    pub(crate) fn links(&self) -> Links {
        self.links
    }

    #[inline]
    pub(crate) fn set_links(&mut self, links: Links) {
        self.links = links;
    }

    #[inline]
    pub(crate) fn parent(&self) -> Option<Handle> {
        self.links.parent
    }

    #[inline]
    pub(crate) fn set_parent(&mut self, parent: Option<Handle>) {
        self.links.parent = parent;
    }

    #[inline]
    pub(crate) fn left(&self) -> Option<Handle> {
        self.links.left
    }

    #[inline]
    pub(crate) fn right(&self) -> Option<Handle> {
        self.links.right
    }

    #[inline]
    pub(crate) fn child(&self, side: Side) -> Option<Handle> {
        match side {
            Side::Left => self.links.left,
            Side::Right => self.links.right,
        }
    }

    #[inline]
    pub(crate) fn set_child(&mut self, side: Side, child: Option<Handle>) {
        match side {
            Side::Left => self.links.left = child,
            Side::Right => self.links.right = child,
        }
    }

    #[inline]
    pub(crate) fn color(&self) -> Color {
        self.links.color
    }

    #[inline]
    pub(crate) fn set_color(&mut self, color: Color) {
        self.links.color = color;
    }

    #[inline]
    pub(crate) fn is_red(&self) -> bool {
        self.links.color == Color::Red
    }

    #[inline]
    pub(crate) fn size(&self) -> Size {
        self.links.size
    }

    #[inline]
    pub(crate) fn set_size(&mut self, size: Size) {
        self.links.size = size;
    }
}
