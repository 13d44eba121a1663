//! The file session passed into every device operation.

use core::ops::BitOr;

/// Identifies one open file session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileId(pub u64);

/// Open mode flags of a file session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpenFlags(u32);

impl OpenFlags {
    pub const RDONLY: Self = Self(0o0);
    pub const WRONLY: Self = Self(0o1);
    pub const RDWR: Self = Self(0o2);
    pub const NONBLOCK: Self = Self(0o4000);

    const ACCMODE: u32 = 0o3;

    /// Creates flags from raw bits.
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Returns the raw bits.
    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn readable(self) -> bool {
        self.0 & Self::ACCMODE != Self::WRONLY.0
    }

    pub const fn writable(self) -> bool {
        let mode = self.0 & Self::ACCMODE;
        mode == Self::WRONLY.0 || mode == Self::RDWR.0
    }

    pub const fn nonblocking(self) -> bool {
        self.0 & Self::NONBLOCK.0 != 0
    }
}

impl BitOr for OpenFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Seek origin for [`CDevOps::seek`](crate::CDevOps::seek).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekFrom {
    Start(u64),
    Current(i64),
    End(i64),
}

/// A client's open session on a device node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    id: FileId,
    flags: OpenFlags,
}

impl File {
    pub const fn new(id: FileId, flags: OpenFlags) -> Self {
        Self { id, flags }
    }

    #[inline]
    pub const fn id(&self) -> FileId {
        self.id
    }

    #[inline]
    pub const fn flags(&self) -> OpenFlags {
        self.flags
    }
}
