//! Paddock Client - HTTP access to the ZED Champions horse registry.

pub mod transport;
pub mod zed;

pub use transport::{HttpTransport, RawResponse, Transport};
pub use zed::{extract_horse_id, ZedClient};
