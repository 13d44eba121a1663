//! Poll event bit sets.
//!
//! The bit values match the POSIX/NuttX `poll()` constants so that masks can
//! be passed through the file-operation layer unchanged.

use core::fmt;
use core::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not};

/// A set of poll events, used both as interest mask and as reported events.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PollEvents(u32);

impl PollEvents {
    /// Data is available for reading.
    pub const POLLIN: Self = Self(0x01);
    /// Urgent data is available.
    pub const POLLPRI: Self = Self(0x02);
    /// Writing will not block.
    pub const POLLOUT: Self = Self(0x04);
    /// An error condition is pending.
    pub const POLLERR: Self = Self(0x08);
    /// The device hung up.
    pub const POLLHUP: Self = Self(0x10);
    /// The descriptor is invalid.
    pub const POLLNVAL: Self = Self(0x20);

    const ALL: u32 = 0x3f;

    /// The empty set.
    #[inline]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Every defined event.
    #[inline]
    pub const fn all() -> Self {
        Self(Self::ALL)
    }

    /// Creates a set from raw bits; undefined bits are dropped.
    #[inline]
    pub const fn from_bits_truncate(bits: u32) -> Self {
        Self(bits & Self::ALL)
    }

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if every event in `other` is also in `self`.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` if `self` and `other` share any event.
    #[inline]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for PollEvents {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for PollEvents {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for PollEvents {
    type Output = Self;

    #[inline]
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl BitAndAssign for PollEvents {
    #[inline]
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0;
    }
}

impl Not for PollEvents {
    type Output = Self;

    #[inline]
    fn not(self) -> Self {
        Self(!self.0 & Self::ALL)
    }
}

impl fmt::Debug for PollEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(PollEvents, &str); 6] = [
            (PollEvents::POLLIN, "POLLIN"),
            (PollEvents::POLLPRI, "POLLPRI"),
            (PollEvents::POLLOUT, "POLLOUT"),
            (PollEvents::POLLERR, "POLLERR"),
            (PollEvents::POLLHUP, "POLLHUP"),
            (PollEvents::POLLNVAL, "POLLNVAL"),
        ];

        if self.is_empty() {
            return f.write_str("(empty)");
        }
        let mut first = true;
        for (flag, name) in NAMES {
            if self.contains(flag) {
                if !first {
                    f.write_str(" | ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}
