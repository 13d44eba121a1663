//! Error taxonomy for character device nodes.
//!
//! Every operation returns a [`CDevResult`]. The variants map onto the ArceOS
//! error stack so callers at the file-operation boundary see conventional
//! error codes instead of device-specific ones.

use core::fmt;

use axerrno::{AxError, LinuxError};

/// Errors reported by a character device node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CDevError {
    /// The device name is unavailable or the driver table refused it.
    Registration,
    /// All class-instance names of a device class are taken.
    NoSpace,
    /// `close` was called on a device with no open sessions.
    NotOpen,
    /// The poll-waiter table is at its ceiling, or growing it failed.
    Resource,
    /// A poll teardown named a waiter that is not registered.
    InvalidState,
    /// The data-path operation is not implemented by this device.
    NotSupported,
    /// A malformed argument, e.g. an empty or oversized device name.
    InvalidArgument,
    /// The name is not present in the driver table.
    NotRegistered,
}

/// Result type of device operations.
pub type CDevResult<T = ()> = Result<T, CDevError>;

impl CDevError {
    /// Returns the errno the file-operation layer reports for this error.
    pub const fn errno(self) -> LinuxError {
        match self {
            Self::Registration => LinuxError::EEXIST,
            Self::NoSpace => LinuxError::ENOSPC,
            Self::NotOpen => LinuxError::EBADF,
            Self::Resource => LinuxError::ENOMEM,
            Self::InvalidState | Self::InvalidArgument => LinuxError::EINVAL,
            Self::NotSupported => LinuxError::ENOSYS,
            Self::NotRegistered => LinuxError::ENOENT,
        }
    }

    /// Returns a short description of the error.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Registration => "device registration refused",
            Self::NoSpace => "no free class instance",
            Self::NotOpen => "device is not open",
            Self::Resource => "poll waiter table exhausted",
            Self::InvalidState => "poll waiter not registered",
            Self::NotSupported => "operation not supported",
            Self::InvalidArgument => "invalid argument",
            Self::NotRegistered => "name not registered",
        }
    }
}

impl fmt::Display for CDevError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<CDevError> for AxError {
    fn from(err: CDevError) -> Self {
        match err {
            CDevError::Registration => AxError::AlreadyExists,
            CDevError::NoSpace => AxError::StorageFull,
            CDevError::NotOpen => AxError::BadState,
            CDevError::Resource => AxError::NoMemory,
            CDevError::InvalidState | CDevError::InvalidArgument => AxError::InvalidInput,
            CDevError::NotSupported => AxError::Unsupported,
            CDevError::NotRegistered => AxError::NotFound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errno_mapping() {
        assert_eq!(CDevError::NotOpen.errno(), LinuxError::EBADF);
        assert_eq!(CDevError::NoSpace.errno(), LinuxError::ENOSPC);
        assert_eq!(CDevError::NotSupported.errno(), LinuxError::ENOSYS);
        assert_eq!(CDevError::Resource.errno(), LinuxError::ENOMEM);
        assert_eq!(CDevError::InvalidState.errno(), LinuxError::EINVAL);
    }

    #[test]
    fn test_axerror_conversion() {
        assert_eq!(AxError::from(CDevError::Registration), AxError::AlreadyExists);
        assert_eq!(AxError::from(CDevError::NotRegistered), AxError::NotFound);
        assert_eq!(AxError::from(CDevError::NotSupported), AxError::Unsupported);
    }
}
