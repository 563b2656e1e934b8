pub mod app_config;
pub mod http_sink;

pub use app_config::Config;
pub use http_sink::HttpSink;
