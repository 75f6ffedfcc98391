pub mod capture_session;
pub mod domain;
pub mod error;
pub mod frame_admission;
pub mod infrastructure;
pub mod preview_output;
