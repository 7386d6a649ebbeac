pub mod trait_def;
pub mod xrpc;

pub use trait_def::{NotificationSource, Page, Profile, UpstreamError, UpstreamResult};
pub use xrpc::{build_http_client, normalize_service_url, XrpcClient};
