//! HTTP adapter for the remote document store.
//!
//! Implements `tulia_core::remote::DocumentStore` against the REST document
//! API: one collection per entity kind, addressed as `/v1/{collection}/{id}`,
//! with `:query`, `:batchUpdate`, and `:increment` operation endpoints.

mod client;

pub use client::HttpDocumentStore;
