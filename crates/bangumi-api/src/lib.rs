//! Bangumi REST resource wrappers
//!
//! Thin clients over the collection and user endpoints. These hold no token
//! state of their own: anything requiring authentication takes the
//! `CredentialProvider` capability from `bangumi-auth` by injection and
//! receives a valid Authorization header value per call, or the call never
//! happens. Responses are returned as raw `serde_json::Value`, mirroring
//! the API's loosely-shaped payloads.

pub mod collection;
pub mod error;
pub mod user;

pub use collection::{CollectionClient, CollectionStatus, Privacy, SubjectUpdate};
pub use error::{Error, Result};
pub use user::{ResponseGroup, SubjectType, UserClient, WatchingCategory};
