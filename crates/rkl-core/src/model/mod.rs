// Document shapes read and written by the statistics pipeline.

pub mod daily;
pub mod date;
pub mod event;
pub mod game;
pub mod lineup;
pub mod season;
pub mod seasonal;
