//! Access decisions for write routes and the subscriptions feed.
//!
//! Authentication itself lives upstream; this layer only decides what the
//! resolved identity may do and where to send it otherwise. Denials are
//! expressed as redirects, never as error pages.

use url::form_urlencoded;

use crate::domain::entities::{PostRecord, UserRecord};

/// Route of the upstream login page. Denied anonymous requests are bounced
/// here with the original path in the `next` parameter.
pub const LOGIN_ROUTE: &str = "/auth/login";

/// The caller as resolved from the request.
#[derive(Debug, Clone, PartialEq)]
pub enum Identity {
    User(UserRecord),
    Anonymous,
}

impl Identity {
    pub fn user(&self) -> Option<&UserRecord> {
        match self {
            Identity::User(user) => Some(user),
            Identity::Anonymous => None,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Identity::Anonymous)
    }
}

/// Tagged outcome of a capability check, consumed by the routing layer.
#[derive(Debug, Clone, PartialEq)]
pub enum Access {
    Granted(UserRecord),
    /// Anonymous caller: send to the login page, preserving the target.
    LoginRedirect { to: String },
    /// Signed in but not permitted: silently redirect elsewhere.
    Detour { to: String },
}

/// Login URL carrying the denied path, percent-encoded, as `next`.
pub fn login_redirect(next_path: &str) -> String {
    let query: String = form_urlencoded::Serializer::new(String::new())
        .append_pair("next", next_path)
        .finish();
    format!("{LOGIN_ROUTE}?{query}")
}

/// Any signed-in user passes; anonymous callers are sent to login.
pub fn require_user(identity: &Identity, next_path: &str) -> Access {
    match identity {
        Identity::User(user) => Access::Granted(user.clone()),
        Identity::Anonymous => Access::LoginRedirect {
            to: login_redirect(next_path),
        },
    }
}

/// Only the post's author passes. Other signed-in users are detoured to the
/// post itself; anonymous callers go to login.
pub fn require_author(identity: &Identity, post: &PostRecord, next_path: &str) -> Access {
    match identity {
        Identity::Anonymous => Access::LoginRedirect {
            to: login_redirect(next_path),
        },
        Identity::User(user) if user.id != post.author_id => Access::Detour {
            to: format!("/posts/{}", post.id),
        },
        Identity::User(user) => Access::Granted(user.clone()),
    }
}
