#![doc = "The `taskdeck` library crate."]
#![doc = ""]
#![doc = "This crate contains the core business logic, domain models, authentication"]
#![doc = "mechanisms, routing configuration, and error handling for the taskdeck"]
#![doc = "server, plus the `client` module used by the `taskdeck-cli` binary."]
#![doc = "It is used by the server binary (`main.rs`) to construct and run the application."]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
