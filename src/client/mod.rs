pub mod relay;
pub mod resource_client;

pub use relay::{validate_gateway_url, HttpRelay, RelayResponse, RelayTransport};
pub use resource_client::{ResourceClient, UpstreamRawResponse};
