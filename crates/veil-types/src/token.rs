use thiserror::Error;

/// Prefix that marks callback data as a reveal request.
const REVEAL_PREFIX: &str = "info";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed reveal token: {0:?}")]
    Malformed(String),
}

/// Opaque token attached to the reveal button of a forwarded message.
///
/// Encodes `(user_id, send timestamp)` as `info_{user_id}_{timestamp}`, the
/// same pair the identity ledger keys on. The timestamp is rendered with the
/// default float formatting on both the encode and key paths, so a token built
/// from the same message always reproduces the stored reference key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevealToken {
    pub user_id: i64,
    pub timestamp: f64,
}

impl RevealToken {
    pub fn new(user_id: i64, timestamp: f64) -> Self {
        Self { user_id, timestamp }
    }

    /// Callback data for the reveal button.
    pub fn encode(&self) -> String {
        format!("{REVEAL_PREFIX}_{}_{}", self.user_id, self.timestamp)
    }

    /// Reference key under which the identity record is stored.
    pub fn ref_key(&self) -> String {
        format!("{}_{}", self.user_id, self.timestamp)
    }

    /// Parse callback data back into a token.
    pub fn parse(data: &str) -> Result<Self, TokenError> {
        let malformed = || TokenError::Malformed(data.to_string());

        let mut parts = data.splitn(3, '_');
        if parts.next() != Some(REVEAL_PREFIX) {
            return Err(malformed());
        }
        let user_id = parts
            .next()
            .and_then(|s| s.parse::<i64>().ok())
            .ok_or_else(malformed)?;
        let timestamp = parts
            .next()
            .and_then(|s| s.parse::<f64>().ok())
            .ok_or_else(malformed)?;

        Ok(Self { user_id, timestamp })
    }

    /// Whether callback data looks like a reveal token at all.
    pub fn matches(data: &str) -> bool {
        data.starts_with(REVEAL_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_parse_roundtrip() {
        let token = RevealToken::new(123456789, 1727241600.0);
        let parsed = RevealToken::parse(&token.encode()).unwrap();
        assert_eq!(parsed, token);
    }

    #[test]
    fn ref_key_is_encoded_token_without_prefix() {
        let token = RevealToken::new(42, 1727241600.5);
        assert_eq!(token.encode(), "info_42_1727241600.5");
        assert_eq!(token.ref_key(), "42_1727241600.5");
    }

    #[test]
    fn whole_second_timestamps_render_without_fraction() {
        let token = RevealToken::new(42, 1727241600.0);
        assert_eq!(token.ref_key(), "42_1727241600");
    }

    #[test]
    fn rejects_garbage() {
        assert!(RevealToken::parse("").is_err());
        assert!(RevealToken::parse("info_").is_err());
        assert!(RevealToken::parse("info_abc_123").is_err());
        assert!(RevealToken::parse("other_42_1727241600").is_err());
    }
}
