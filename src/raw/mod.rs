mod arena;
mod handle;
mod node;
mod raw_rbtree_map;
mod size;

pub(crate) use handle::Handle;
pub(crate) use raw_rbtree_map::RawRBTreeMap;
