pub mod app;
pub mod replay;
pub mod source;
pub mod trigger_server;
