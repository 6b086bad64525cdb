//! Core records the rest of the crate is written against.

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

/// Identity mirrored from the upstream auth layer. The service never stores
/// credentials, only the username it is handed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub created_at: OffsetDateTime,
}

/// Topical community posts can be filed under. The slug is the stable URL
/// handle; the title is free-form display text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRecord {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub created_at: OffsetDateTime,
}

/// A published post. Author and group display fields are carried alongside
/// the foreign keys so feed pages render without follow-up lookups.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostRecord {
    pub id: Uuid,
    pub author_id: Uuid,
    pub author_username: String,
    pub text: String,
    pub group_id: Option<Uuid>,
    pub group_title: Option<String>,
    pub group_slug: Option<String>,
    /// Opaque reference to an uploaded image, resolved by the asset tier.
    pub image: Option<String>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentRecord {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub author_username: String,
    pub text: String,
    pub created_at: OffsetDateTime,
}
