//! # msoracle-types
//!
//! Shared domain types used across the msoracle workspace: identities,
//! oracle samples and metadata, batch submission records and events.

pub mod events;
pub mod identity;
pub mod oracle;

pub use identity::{Address, AddressParseError};
pub use oracle::{OracleId, OracleMetadata, ProvideRequest, ProviderInfo, Sample};

/// A provided rate. Valid rates lie in `(0, VALUE_LIMIT)`.
pub type Rate = u128;

/// Exclusive upper bound for a provided rate (2^96).
pub const VALUE_LIMIT: Rate = 1 << 96;

/// Maximum length of an oracle symbol in bytes.
pub const MAX_SYMBOL_LEN: usize = 32;

/// Length of an [`Address`] in bytes.
pub const ADDRESS_LEN: usize = 20;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_limit_is_two_pow_96() {
        assert_eq!(VALUE_LIMIT, 79_228_162_514_264_337_593_543_950_336);
        assert_eq!(VALUE_LIMIT.trailing_zeros(), 96);
    }
}
