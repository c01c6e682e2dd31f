//! Murmur Sources - Clients for the external change sources.
//!
//! `NotionSource` implements the `DocumentSource` capability over the
//! Notion REST API; `MastodonClient` implements `MentionsFeed` and
//! `Publisher` over a Mastodon instance.

mod error;
mod mastodon;
mod notion;

pub use error::{SourceError, SourceResult};
pub use mastodon::MastodonClient;
pub use notion::NotionSource;
