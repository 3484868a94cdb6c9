//! Configuration for a layout build.

use core::ops::{Bound, RangeBounds};
use std::path::PathBuf;

/// Bounds on a value, built from any Rust range expression.
///
/// Used by [Config] to limit the lengths of byte buffers and sequences accepted from input.
///
/// # Examples
///
/// ```
/// use bincraft_layout::RangeCfg;
///
/// let cfg: RangeCfg<usize> = (..=1024).into();
/// assert!(cfg.contains(&1024));
/// assert!(!cfg.contains(&1025));
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct RangeCfg<T: Copy + PartialOrd> {
    start: Bound<T>,
    end: Bound<T>,
}

macro_rules! impl_range_from {
    ($($range:ty),+ $(,)?) => {
        $(
            impl<T: Copy + PartialOrd> From<$range> for RangeCfg<T> {
                fn from(r: $range) -> Self {
                    Self::new(r)
                }
            }
        )+
    };
}

impl_range_from!(
    core::ops::Range<T>,
    core::ops::RangeInclusive<T>,
    core::ops::RangeFrom<T>,
    core::ops::RangeTo<T>,
    core::ops::RangeToInclusive<T>,
);

impl<T: Copy + PartialOrd> From<core::ops::RangeFull> for RangeCfg<T> {
    fn from(_: core::ops::RangeFull) -> Self {
        Self::new(..)
    }
}

impl<T: Copy + PartialOrd> RangeCfg<T> {
    /// Creates a `RangeCfg` from any type implementing `RangeBounds<T>`.
    pub fn new(r: impl RangeBounds<T>) -> Self {
        Self {
            start: r.start_bound().cloned(),
            end: r.end_bound().cloned(),
        }
    }

    /// Returns true if the value is within this range.
    pub fn contains(&self, value: &T) -> bool {
        match &self.start {
            Bound::Included(s) if value < s => return false,
            Bound::Excluded(s) if value <= s => return false,
            _ => {}
        }
        match &self.end {
            Bound::Included(e) if value > e => return false,
            Bound::Excluded(e) if value >= e => return false,
            _ => {}
        }
        true
    }
}

impl<T: Copy + PartialOrd> RangeBounds<T> for RangeCfg<T> {
    fn start_bound(&self) -> Bound<&T> {
        self.start.as_ref()
    }

    fn end_bound(&self) -> Bound<&T> {
        self.end.as_ref()
    }
}

/// The order in which a block's unresolved fields are visited on each pass.
///
/// The built tree does not depend on this setting. It exists to check exactly that.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Scan {
    /// Visit fields in declaration order.
    #[default]
    Forward,
    /// Visit fields in reverse declaration order.
    Reverse,
}

/// Configuration for [crate::build].
#[derive(Clone, Debug)]
pub struct Config {
    /// Directory that relative `File` paths are resolved against.
    ///
    /// Front-ends set this to the directory of the file the input was loaded from.
    pub root_path: Option<PathBuf>,

    /// Accepted lengths for byte buffers, files, and sequences.
    pub max_len: RangeCfg<usize>,

    /// Maximum nesting depth of blocks and sequences below the root.
    pub max_depth: usize,

    /// Field visiting order within a pass.
    pub scan: Scan,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root_path: None,
            max_len: (..).into(),
            max_depth: 64,
            scan: Scan::Forward,
        }
    }
}

impl Config {
    /// Sets the directory that relative `File` paths are resolved against.
    pub fn with_root_path(mut self, root_path: impl Into<PathBuf>) -> Self {
        self.root_path = Some(root_path.into());
        self
    }

    /// Sets the accepted lengths for byte buffers, files, and sequences.
    pub fn with_max_len(mut self, max_len: impl Into<RangeCfg<usize>>) -> Self {
        self.max_len = max_len.into();
        self
    }

    /// Sets the field visiting order within a pass.
    pub fn with_scan(mut self, scan: Scan) -> Self {
        self.scan = scan;
        self
    }
}
