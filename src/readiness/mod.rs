pub mod http;
pub mod log;

pub use self::http::wait_healthy;
pub use self::log::ReadinessMarkers;
