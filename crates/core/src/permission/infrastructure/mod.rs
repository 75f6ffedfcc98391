pub mod consent_file;
pub mod static_authorizer;
pub mod terminal_prompt_authorizer;
