// Error taxonomy for the generator.
//
// There are exactly two failure modes: asking for an index outside `0..N`,
// and constructing a generator from a configuration that would make
// derivation impossible (zero records, empty tables, dangling references).
// Both are reported synchronously to the caller; nothing is retried.

/// Errors surfaced by generator construction and lookups.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LatticeError {
    #[error("index {index} out of range: valid indices are 0..{total}")]
    IndexOutOfRange { index: i64, total: u32 },

    #[error("invalid configuration: {0}")]
    ConfigurationInvalid(String),
}

pub(crate) fn invalid(message: impl Into<String>) -> LatticeError {
    LatticeError::ConfigurationInvalid(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_message_names_valid_range() {
        let err = LatticeError::IndexOutOfRange {
            index: 144,
            total: 144,
        };
        assert_eq!(
            err.to_string(),
            "index 144 out of range: valid indices are 0..144"
        );
    }

    #[test]
    fn configuration_message_carries_detail() {
        let err = invalid("cyclic table 'elements' is empty");
        assert_eq!(
            err.to_string(),
            "invalid configuration: cyclic table 'elements' is empty"
        );
    }
}
