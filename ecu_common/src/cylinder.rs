//! Cylinder identifiers.
//!
//! The C source ORs two cylinder numbers into one byte (`12`, `34`, ...)
//! to mean "both together". Here that's an explicit sum type: `Cyl` is
//! the injector driver's argument type (so a paired variant cannot even
//! be passed to `open_injector`/`close_injector` — rejection becomes a
//! compile-time property instead of a runtime check), and `CoilTarget`
//! is the coil driver's argument type, which accepts either a single
//! cylinder or a wasted-spark pair.

use std::fmt;

/// One of the four cylinders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cyl {
    Cyl1,
    Cyl2,
    Cyl3,
    Cyl4,
}

impl Cyl {
    /// All four cylinders in order.
    pub const ALL: [Cyl; 4] = [Cyl::Cyl1, Cyl::Cyl2, Cyl::Cyl3, Cyl::Cyl4];

    /// 0-based index, used as the angle-event cookie.
    #[inline]
    pub const fn index(self) -> u8 {
        match self {
            Cyl::Cyl1 => 0,
            Cyl::Cyl2 => 1,
            Cyl::Cyl3 => 2,
            Cyl::Cyl4 => 3,
        }
    }

    /// Reconstruct a `Cyl` from its 0-based index. `None` if out of range.
    #[inline]
    pub const fn from_index(i: u8) -> Option<Cyl> {
        match i {
            0 => Some(Cyl::Cyl1),
            1 => Some(Cyl::Cyl2),
            2 => Some(Cyl::Cyl3),
            3 => Some(Cyl::Cyl4),
            _ => None,
        }
    }
}

impl fmt::Display for Cyl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CYL{}", self.index() + 1)
    }
}

/// The coil driver's argument: either one cylinder, or a wasted-spark
/// pair fired together (`CYL12`, `CYL34`, `CYL21`, `CYL43` — pair order
/// is preserved for display only, the two coils are driven identically
/// regardless of order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoilTarget {
    Single(Cyl),
    Pair(Cyl, Cyl),
}

impl CoilTarget {
    /// Iterate the cylinder(s) this target drives.
    pub fn cylinders(self) -> impl Iterator<Item = Cyl> {
        match self {
            CoilTarget::Single(c) => [Some(c), None].into_iter().flatten(),
            CoilTarget::Pair(a, b) => [Some(a), Some(b)].into_iter().flatten(),
        }
    }

    /// True if this target is a wasted-spark pair.
    #[inline]
    pub const fn is_pair(self) -> bool {
        matches!(self, CoilTarget::Pair(_, _))
    }
}

impl fmt::Display for CoilTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoilTarget::Single(c) => write!(f, "{c}"),
            CoilTarget::Pair(a, b) => write!(f, "{a}{b}"),
        }
    }
}
