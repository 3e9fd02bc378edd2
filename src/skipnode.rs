use crate::arena::{AllocError, Handle};

// ////////////////////////////////////////////////////////////////////////////
// SkipNode
// ////////////////////////////////////////////////////////////////////////////

/// SkipNodes make up the skiplist. The list owns every node through its arena;
/// nodes only refer to one another through handles.
///
/// The node has a `level` which corresponds to how 'high' the node reaches. A
/// node of `level` n has (n + 1) links to next nodes, which are stored in a
/// vector.
///
/// There is a corresponding vector of link lengths which contains the distance
/// (in level-0 positions) between the current node and the next node. If
/// there's no next node, the length is the number of nodes after the current
/// one.
#[derive(Debug)]
pub(crate) struct SkipNode<K, V> {
    // Never `None`, with the sole exception being the head node.
    pub entry: Option<(K, V)>,
    // How high the node reaches.
    pub level: usize,
    // Links to the next node at the respective level. This vector *must* be of
    // length `self.level + 1`.
    pub links: Vec<Option<Handle>>,
    // The corresponding length of each link.
    pub links_len: Vec<usize>,
}

// ///////////////////////////////////////////////
// Inherent methods
// ///////////////////////////////////////////////

impl<K, V> SkipNode<K, V> {
    /// Create a new head node reaching `total_levels` levels.
    ///
    /// `total_levels` must be non-zero.
    pub fn head(total_levels: usize) -> Result<Self, AllocError> {
        Self::with_entry(None, total_levels - 1)
    }

    /// Create a new node with the given entry. All links default to `None`.
    pub fn new(key: K, value: V, level: usize) -> Result<Self, AllocError> {
        Self::with_entry(Some((key, value)), level)
    }

    fn with_entry(entry: Option<(K, V)>, level: usize) -> Result<Self, AllocError> {
        let mut links = Vec::new();
        links.try_reserve_exact(level + 1)?;
        links.resize(level + 1, None);
        let mut links_len = Vec::new();
        links_len.try_reserve_exact(level + 1)?;
        links_len.resize(level + 1, 0);
        Ok(SkipNode {
            entry,
            level,
            links,
            links_len,
        })
    }

    pub fn key(&self) -> Option<&K> {
        self.entry.as_ref().map(|(key, _)| key)
    }

    pub fn value(&self) -> Option<&V> {
        self.entry.as_ref().map(|(_, value)| value)
    }

    pub fn value_mut(&mut self) -> Option<&mut V> {
        self.entry.as_mut().map(|(_, value)| value)
    }

    pub fn item(&self) -> Option<(&K, &V)> {
        self.entry.as_ref().map(|(key, value)| (key, value))
    }

    /// Resets every link of the node, as if nothing followed it.
    pub fn unlink_all(&mut self) {
        self.links.fill(None);
        self.links_len.fill(0);
    }
}
