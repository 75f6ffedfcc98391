pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod permission_gate;
