//! Status classification for retry decisions.

use reqwest::StatusCode;

/// Status codes retried when no whitelist is configured.
pub const DEFAULT_WHITELIST: [u16; 5] = [429, 500, 502, 503, 504];

/// Set of status codes considered transient.
///
/// Membership is exact equality; order and duplicates do not matter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusWhitelist {
    codes: Vec<u16>,
}

impl StatusWhitelist {
    /// Create a whitelist from status codes.
    pub fn new(codes: impl IntoIterator<Item = u16>) -> Self {
        let mut codes: Vec<u16> = codes.into_iter().collect();
        codes.sort_unstable();
        codes.dedup();
        Self { codes }
    }

    /// Whitelist that retries nothing.
    pub fn empty() -> Self {
        Self { codes: Vec::new() }
    }

    /// Check whether a status is retryable.
    pub fn contains(&self, status: StatusCode) -> bool {
        self.codes.binary_search(&status.as_u16()).is_ok()
    }

    /// The whitelisted codes in ascending order.
    pub fn codes(&self) -> &[u16] {
        &self.codes
    }

    /// Classify a response status.
    pub fn classify(&self, status: StatusCode) -> Classification {
        if status.as_u16() < 400 {
            Classification::Success
        } else if self.contains(status) {
            Classification::Retryable
        } else {
            Classification::Terminal
        }
    }
}

impl Default for StatusWhitelist {
    fn default() -> Self {
        Self::new(DEFAULT_WHITELIST)
    }
}

impl FromIterator<u16> for StatusWhitelist {
    fn from_iter<I: IntoIterator<Item = u16>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// How a single attempt's status is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Below 400, hand the response to the caller.
    Success,
    /// Whitelisted, retry if budget remains.
    Retryable,
    /// Error status outside the whitelist.
    Terminal,
}
