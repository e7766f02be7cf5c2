//! Coordinator configuration.

use cmdring_core::{CommandAssembler, DEFAULT_TERMINATOR};

/// Tunables for a history coordinator.
#[derive(Debug, Clone)]
pub struct HistoryConfig {
    /// Byte that completes a command.
    pub terminator: u8,
    /// Upper bound on a single pending command, `None` for unbounded.
    ///
    /// A write that would grow a pending command past the cap fails
    /// with `HistoryError::OutOfMemory` and leaves the buffered bytes
    /// intact.
    pub max_command_bytes: Option<usize>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            terminator: DEFAULT_TERMINATOR,
            max_command_bytes: None,
        }
    }
}

impl HistoryConfig {
    /// Build an assembler configured for this history.
    pub(crate) fn assembler(&self) -> CommandAssembler {
        match self.max_command_bytes {
            Some(limit) => CommandAssembler::with_limit(self.terminator, limit),
            None => CommandAssembler::new(self.terminator),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HistoryConfig::default();
        assert_eq!(config.terminator, b'\n');
        assert!(config.max_command_bytes.is_none());
    }

    #[test]
    fn test_assembler_inherits_limit() {
        let config = HistoryConfig {
            terminator: b';',
            max_command_bytes: Some(4),
        };
        let mut assembler = config.assembler();

        assert!(assembler.append(b"ab").unwrap().is_none());
        assert!(assembler.append(b"cde").is_err());
    }
}
