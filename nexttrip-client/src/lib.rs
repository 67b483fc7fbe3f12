pub mod app_config;
pub mod error;
pub mod http;

pub use app_config::Config;
pub use error::ClientError;
pub use http::HttpBackendClient;
