//! Paddock Store - JSON file persistence for collections and the API token.

pub mod file_store;
pub mod token_store;

pub use file_store::JsonFileStore;
pub use token_store::TokenStore;
