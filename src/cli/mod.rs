pub mod app;
pub mod commands;
pub mod context;
pub mod dispatch;
pub mod env;
pub mod fingerprint;
pub mod info;
pub mod inputs;
pub mod output;
pub mod plan;
pub mod resolve;
pub mod runtime;
pub mod validate;
