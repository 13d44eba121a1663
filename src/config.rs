/// Hard ceiling on the number of poll waiters one device tracks.
pub const MAX_POLL_WAITERS: usize = 128;

/// Number of numbered instances tried by `register_class_devname`.
pub const CLASS_INSTANCES: u32 = 4;

/// Permission bits a device node is registered with by default.
pub const DEFAULT_MODE: u32 = 0o666;

/// Per-device configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CDevConfig {
    /// Permission bits passed to the driver table on registration.
    pub mode: u32,
    /// How many `{base}{index}` names are tried for a device class.
    pub class_instances: u32,
    /// Capacity ceiling of the poll-waiter table, never above [`MAX_POLL_WAITERS`].
    pub max_poll_waiters: usize,
}

impl CDevConfig {
    /// The default configuration.
    pub const fn new() -> Self {
        Self {
            mode: DEFAULT_MODE,
            class_instances: CLASS_INSTANCES,
            max_poll_waiters: MAX_POLL_WAITERS,
        }
    }

    /// Sets the registration permission bits.
    pub const fn with_mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the number of class instances tried.
    pub const fn with_class_instances(mut self, count: u32) -> Self {
        self.class_instances = count;
        self
    }

    /// Sets the poll-waiter ceiling, clamped to [`MAX_POLL_WAITERS`].
    pub const fn with_max_poll_waiters(mut self, max: usize) -> Self {
        self.max_poll_waiters = if max > MAX_POLL_WAITERS {
            MAX_POLL_WAITERS
        } else {
            max
        };
        self
    }
}

impl Default for CDevConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = CDevConfig::default();
        assert_eq!(config.mode, 0o666);
        assert_eq!(config.class_instances, 4);
        assert_eq!(config.max_poll_waiters, 128);
    }

    #[test]
    fn test_config_clamps_ceiling() {
        let config = CDevConfig::new().with_max_poll_waiters(1000);
        assert_eq!(config.max_poll_waiters, MAX_POLL_WAITERS);

        let config = CDevConfig::new().with_max_poll_waiters(8).with_mode(0o444);
        assert_eq!(config.max_poll_waiters, 8);
        assert_eq!(config.mode, 0o444);
    }
}
