//! Flat per-period records persisted by `trafficdb-db`.
//!
//! Each record is built once per entity and period and handed to the matching
//! upsert. The `(date_from, date_to, <entity>)` triple is the row identity.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Traffic source category as reported by Metrika's `ym:s:trafficSource`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Organic,
    Direct,
    Social,
    Referral,
    Ad,
    Internal,
    Email,
}

impl Channel {
    pub const ALL: [Channel; 7] = [
        Channel::Organic,
        Channel::Direct,
        Channel::Social,
        Channel::Referral,
        Channel::Ad,
        Channel::Internal,
        Channel::Email,
    ];

    /// Identifier used by the vendor API.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Organic => "organic",
            Channel::Direct => "direct",
            Channel::Social => "social",
            Channel::Referral => "referral",
            Channel::Ad => "ad",
            Channel::Internal => "internal",
            Channel::Email => "email",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visits per [`Channel`] for one section URL and period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelTotals {
    pub organic: i32,
    pub direct: i32,
    pub social: i32,
    pub referral: i32,
    pub ad: i32,
    pub internal: i32,
    pub email: i32,
}

impl ChannelTotals {
    #[must_use]
    pub fn get(&self, channel: Channel) -> i32 {
        match channel {
            Channel::Organic => self.organic,
            Channel::Direct => self.direct,
            Channel::Social => self.social,
            Channel::Referral => self.referral,
            Channel::Ad => self.ad,
            Channel::Internal => self.internal,
            Channel::Email => self.email,
        }
    }

    /// Returns a copy with `channel` set to `visits`.
    #[must_use]
    pub fn with(mut self, channel: Channel, visits: i32) -> Self {
        let slot = match channel {
            Channel::Organic => &mut self.organic,
            Channel::Direct => &mut self.direct,
            Channel::Social => &mut self.social,
            Channel::Referral => &mut self.referral,
            Channel::Ad => &mut self.ad,
            Channel::Internal => &mut self.internal,
            Channel::Email => &mut self.email,
        };
        *slot = visits;
        self
    }
}

/// One row of `all_traffic_by_url`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrafficByUrlRecord {
    pub url: String,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub channels: ChannelTotals,
    pub google_traffic: i32,
    pub yandex_traffic: i32,
    /// Percentage, one decimal place.
    pub bounce_rate: Decimal,
    /// Pages per visit, two decimal places.
    pub page_depth: Decimal,
    /// Whole seconds.
    pub avg_visit: Decimal,
    pub visits: i32,
    pub month_year: String,
}

/// One row of `organic_pages_by_url`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganicPageRecord {
    pub base_url: String,
    pub page_url: String,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub bounce_rate: Decimal,
    pub visits: i32,
    /// Share of visits among the pages returned for the same section and period.
    pub traffic_share: Decimal,
    pub month_year: String,
}

/// One row of `search_queries_webmaster`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQueryRecord {
    pub query_text: String,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub shows: i32,
    pub clicks: i32,
    pub avg_show_position: Decimal,
    pub month_year: String,
}
