//! Capture request sequencing
//!
//! Capture requests may complete in any order. Each one is tagged with a
//! token when it is issued, and only a completion carrying the latest
//! token may replace the session's stream.

use std::fmt;

/// Identifies one capture request, increasing with issue order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Default)]
pub(crate) struct RequestSequencer {
    latest: u64,
}

impl RequestSequencer {
    pub fn issue(&mut self) -> RequestToken {
        self.latest += 1;
        RequestToken(self.latest)
    }

    pub fn is_latest(&self, token: RequestToken) -> bool {
        token.0 == self.latest
    }
}
