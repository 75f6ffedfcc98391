pub mod failure_policy;
pub mod live_overlay_config;
pub mod live_overlay_use_case;
pub mod session_logger;
