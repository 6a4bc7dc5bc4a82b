//! Access-control core: every allow/deny decision and every listing
//! filter lives here, between the request layer and the store.

pub mod policy;
pub mod scope;

pub use scope::PostScope;
