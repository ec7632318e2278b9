pub mod list_placeholders;
pub mod list_regex_terms;
pub mod search;
pub mod show_config;
