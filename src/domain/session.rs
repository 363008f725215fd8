//! Trading-session parameters used for anchor synthesis.

use chrono::{Duration, NaiveTime};

pub const DEFAULT_MARKET_OPEN: (u32, u32) = (9, 30);
pub const DEFAULT_ANCHOR_GRACE_MINUTES: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    pub market_open: NaiveTime,
    pub anchor_grace: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let (h, m) = DEFAULT_MARKET_OPEN;
        Self {
            market_open: NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN),
            anchor_grace: Duration::minutes(DEFAULT_ANCHOR_GRACE_MINUTES),
        }
    }
}

impl SessionConfig {
    /// True when `market_open + grace` runs past midnight.
    pub fn wraps_midnight(&self) -> bool {
        let (_, wrapped) = self.market_open.overflowing_add_signed(self.anchor_grace);
        wrapped != 0
    }

    /// market_open < t <= market_open + grace, within the same calendar day.
    ///
    /// The anchor shares the first bar's date, so a window that wraps past
    /// midnight is cut at the end of the day.
    pub fn within_anchor_window(&self, t: NaiveTime) -> bool {
        if self.wraps_midnight() {
            return t > self.market_open;
        }
        t > self.market_open && t <= self.market_open + self.anchor_grace
    }
}
