// Shared foundation for the league statistics service: configuration,
// collection naming, document shapes, and the document store.

pub mod config;
pub mod db;
pub mod model;
pub mod naming;
pub mod store;
