//! Clients for the Yandex Metrika and Yandex Webmaster APIs, plus the
//! normalization of their reports into `trafficdb-core` records.

pub mod error;
pub mod filter;
mod http;
pub mod metrika;
pub mod normalize;
pub mod types;
pub mod webmaster;

pub use error::{Service, YandexError};
pub use filter::Filter;
pub use metrika::MetrikaClient;
pub use normalize::{
    organic_page_record, search_query_record, traffic_record, BehaviorMetrics, LandingPage,
    QueryStat, SearchEngineSplit, SourceVisits,
};
pub use webmaster::WebmasterClient;
