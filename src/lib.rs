//! # veb-rs
//!
//! An ordered set of integers over a bounded universe using a van Emde Boas tree.
//!
//! Insertion, membership and successor queries run in `O(log log U)` where `U`
//! is the universe size. Clusters are allocated lazily, so memory follows the
//! number of stored values rather than `U`.
//!
//! ## Example
//!
//! ```rust
//! use veb_rs::VebTree;
//!
//! let mut tree = VebTree::new(8)?;
//! tree.insert(1)?;
//! tree.insert(3)?;
//! tree.insert(7)?;
//!
//! assert!(tree.member(3)?);
//! assert!(!tree.member(4)?);
//! assert_eq!(tree.successor(1)?, Some(3));
//! assert_eq!(tree.successor(7)?, None);
//! assert_eq!(tree.iter().collect::<Vec<_>>(), vec![1, 3, 7]);
//! # Ok::<(), veb_rs::VebError>(())
//! ```

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::iter::FusedIterator;

use thiserror::Error;

// =============================================================================
// Configuration
// =============================================================================

/// Largest supported universe, as a bit width. Values are `u64`, so the widest
/// universe whose size is itself representable is `2^63`.
pub const MAX_UNIVERSE_BITS: u32 = 63;

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VebError {
    #[error("value {value} is outside the universe [0, {universe_size})")]
    OutOfRange { value: u64, universe_size: u64 },
    #[error("universe size {0} must be a power of two no smaller than 2")]
    InvalidUniverseSize(u64),
    #[error("universe bit width {0} must be in 1..=63")]
    InvalidUniverseBits(u32),
}

pub type Result<T> = std::result::Result<T, VebError>;

// =============================================================================
// Recursive node
// =============================================================================

/// One recursion level, covering the universe `[0, 2^bits)`.
///
/// `min` is never stored in a cluster; every other member lives in exactly one
/// cluster. A key is present in `clusters` iff `summary` contains it.
#[derive(Clone)]
struct Node {
    bits: u32,
    min: Option<u64>,
    max: Option<u64>,
    clusters: HashMap<u64, Node>,
    summary: Option<Box<Node>>,
}

impl Node {
    fn new(bits: u32) -> Self {
        debug_assert!((1..=MAX_UNIVERSE_BITS).contains(&bits));
        Self {
            bits,
            min: None,
            max: None,
            clusters: HashMap::new(),
            summary: None,
        }
    }

    #[inline]
    fn is_base(&self) -> bool {
        self.bits == 1
    }

    /// Width of the low part: `√U = 2^⌈bits/2⌉`. Clusters and the summary both
    /// use this width, so the split is asymmetric when `bits` is odd.
    #[inline]
    fn low_bits(&self) -> u32 {
        self.bits.div_ceil(2)
    }

    #[inline]
    fn high(&self, x: u64) -> u64 {
        x >> self.low_bits()
    }

    #[inline]
    fn low(&self, x: u64) -> u64 {
        x & ((1u64 << self.low_bits()) - 1)
    }

    #[inline]
    fn index(&self, high: u64, low: u64) -> u64 {
        (high << self.low_bits()) | low
    }

    /// Returns `true` if `x` was not already present.
    fn insert(&mut self, mut x: u64) -> bool {
        let (min, max) = match (self.min, self.max) {
            (Some(min), Some(max)) => (min, max),
            _ => {
                self.min = Some(x);
                self.max = Some(x);
                return true;
            }
        };
        if x == min || x == max {
            return false;
        }

        // The displaced minimum is the value that goes down a level.
        if x < min {
            self.min = Some(x);
            x = min;
        }
        if x > max {
            self.max = Some(x);
        }
        if self.is_base() {
            return true;
        }

        let high = self.high(x);
        let low = self.low(x);
        let child_bits = self.low_bits();
        match self.clusters.entry(high) {
            Entry::Occupied(mut cluster) => cluster.get_mut().insert(low),
            Entry::Vacant(slot) => {
                log::trace!(
                    "allocating cluster {high} (bits={child_bits}) at level bits={}",
                    self.bits
                );
                slot.insert(Node::new(child_bits)).insert(low);
                self.summary
                    .get_or_insert_with(|| {
                        log::trace!("allocating summary (bits={child_bits})");
                        Box::new(Node::new(child_bits))
                    })
                    .insert(high);
                true
            }
        }
    }

    fn member(&self, x: u64) -> bool {
        if self.min == Some(x) || self.max == Some(x) {
            return true;
        }
        if self.is_base() {
            return false;
        }
        self.clusters
            .get(&self.high(x))
            .is_some_and(|cluster| cluster.member(self.low(x)))
    }

    fn successor(&self, x: u64) -> Option<u64> {
        if self.is_base() {
            return (x == 0 && self.max == Some(1)).then_some(1);
        }
        if let Some(min) = self.min {
            if x < min {
                return Some(min);
            }
        }

        let high = self.high(x);
        let low = self.low(x);
        if let Some(cluster) = self.clusters.get(&high) {
            if cluster.max.is_some_and(|max| low < max) {
                return cluster.successor(low).map(|offset| self.index(high, offset));
            }
        }

        let next = self.summary.as_ref()?.successor(high)?;
        let offset = self.clusters.get(&next)?.min?;
        Some(self.index(next, offset))
    }

    /// Approximate heap bytes owned by this node and its descendants.
    fn heap_bytes(&self) -> usize {
        let table = self.clusters.capacity() * (std::mem::size_of::<(u64, Node)>() + 1);
        let children: usize = self.clusters.values().map(Node::heap_bytes).sum();
        let summary = self
            .summary
            .as_ref()
            .map_or(0, |s| std::mem::size_of::<Node>() + s.heap_bytes());
        table + children + summary
    }
}

// =============================================================================
// VebTree
// =============================================================================

/// An ordered set of `u64` values drawn from `[0, universe_size)`.
///
/// `universe_size` must be a power of two. Values outside the universe are
/// rejected with [`VebError::OutOfRange`].
#[derive(Clone)]
pub struct VebTree {
    root: Node,
    len: usize,
}

impl VebTree {
    pub fn new(universe_size: u64) -> Result<Self> {
        if universe_size < 2 || !universe_size.is_power_of_two() {
            return Err(VebError::InvalidUniverseSize(universe_size));
        }
        Self::with_bits(universe_size.trailing_zeros())
    }

    /// Creates a tree over the universe `[0, 2^bits)`.
    pub fn with_bits(bits: u32) -> Result<Self> {
        if !(1..=MAX_UNIVERSE_BITS).contains(&bits) {
            return Err(VebError::InvalidUniverseBits(bits));
        }
        log::debug!("new vEB tree: universe_size={} bits={bits}", 1u64 << bits);
        Ok(Self {
            root: Node::new(bits),
            len: 0,
        })
    }

    /// Builds a tree and inserts every value, failing on the first value
    /// outside the universe.
    pub fn from_values<I>(universe_size: u64, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = u64>,
    {
        let mut tree = Self::new(universe_size)?;
        for value in values {
            tree.insert(value)?;
        }
        Ok(tree)
    }

    #[inline]
    pub fn universe_size(&self) -> u64 {
        1u64 << self.root.bits
    }

    #[inline]
    pub fn universe_bits(&self) -> u32 {
        self.root.bits
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn min(&self) -> Option<u64> {
        self.root.min
    }

    #[inline]
    pub fn max(&self) -> Option<u64> {
        self.root.max
    }

    pub fn memory_usage(&self) -> usize {
        std::mem::size_of::<Self>() + self.root.heap_bytes()
    }

    #[inline]
    fn check(&self, value: u64) -> Result<()> {
        let universe_size = self.universe_size();
        if value >= universe_size {
            return Err(VebError::OutOfRange {
                value,
                universe_size,
            });
        }
        Ok(())
    }

    /// Inserts `value`. Returns `Ok(true)` if it was not already present.
    pub fn insert(&mut self, value: u64) -> Result<bool> {
        self.check(value)?;
        let inserted = self.root.insert(value);
        if inserted {
            self.len += 1;
        }
        Ok(inserted)
    }

    pub fn member(&self, value: u64) -> Result<bool> {
        self.check(value)?;
        Ok(self.root.member(value))
    }

    /// Like [`member`](Self::member), but values outside the universe are
    /// simply absent.
    pub fn contains(&self, value: u64) -> bool {
        value < self.universe_size() && self.root.member(value)
    }

    /// Smallest stored value strictly greater than `value`.
    pub fn successor(&self, value: u64) -> Result<Option<u64>> {
        self.check(value)?;
        Ok(self.root.successor(value))
    }

    /// Ascending iteration, one successor query per step.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            tree: self,
            next: self.root.min,
            remaining: self.len,
        }
    }
}

impl PartialEq for VebTree {
    fn eq(&self, other: &Self) -> bool {
        self.root.bits == other.root.bits && self.len == other.len && self.iter().eq(other.iter())
    }
}

impl Eq for VebTree {}

impl std::fmt::Debug for VebTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<'a> IntoIterator for &'a VebTree {
    type Item = u64;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct Iter<'a> {
    tree: &'a VebTree,
    next: Option<u64>,
    remaining: usize,
}

impl Iterator for Iter<'_> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        let current = self.next?;
        self.next = self.tree.root.successor(current);
        self.remaining -= 1;
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl FusedIterator for Iter<'_> {}
