// folio-api: Async transport for the portfolio data API (REST + realtime)

pub mod error;
pub mod realtime;
pub mod rest;
pub mod transport;

pub use error::Error;
pub use realtime::{ChangeType, ChannelState, RealtimeHandle, RealtimeMessage, ReconnectConfig};
pub use rest::RestClient;
pub use transport::TransportConfig;
