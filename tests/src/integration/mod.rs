//! Cross-crate scenarios.

pub mod cursor_resume;
pub mod http_hubs;
pub mod relay_flows;
pub mod timeout_retry;
