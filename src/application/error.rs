use std::error::Error as StdError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::application::feed::FeedError;
use crate::application::follows::FollowError;
use crate::application::posts::ComposeError;
use crate::infra::error::InfraError;

/// Structured error detail attached to a response for the logging
/// middleware. The public body never carries these messages.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = vec![error.to_string()];
        let mut cause = error.source();
        while let Some(err) = cause {
            messages.push(err.to_string());
            cause = err.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            messages: vec![message.into()],
            source,
            status,
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    public_message: &'static str,
    report: ErrorReport,
}

impl HttpError {
    pub fn new(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        Self::with_report(
            public_message,
            ErrorReport::from_message(source, status, detail),
        )
    }

    pub fn from_error(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        error: &dyn StdError,
    ) -> Self {
        Self::with_report(public_message, ErrorReport::from_error(source, status, error))
    }

    fn with_report(public_message: &'static str, report: ErrorReport) -> Self {
        Self {
            status: report.status,
            public_message,
            report,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let Self {
            status,
            public_message,
            report,
        } = self;
        let mut response = (status, public_message).into_response();
        report.attach(&mut response);
        response
    }
}

impl From<FeedError> for HttpError {
    fn from(error: FeedError) -> Self {
        const SOURCE: &str = "application::feed";
        match error {
            FeedError::UnknownGroup => HttpError::new(
                SOURCE,
                StatusCode::NOT_FOUND,
                "Unknown group",
                "Group slug did not match any known group",
            ),
            FeedError::UnknownAuthor => HttpError::new(
                SOURCE,
                StatusCode::NOT_FOUND,
                "Unknown author",
                "Username did not match any known author",
            ),
            FeedError::UnknownPost => HttpError::new(
                SOURCE,
                StatusCode::NOT_FOUND,
                "Unknown post",
                "Post id did not match any known post",
            ),
            FeedError::Repo(err) => HttpError::from_error(
                SOURCE,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                &err,
            ),
        }
    }
}

impl From<ComposeError> for HttpError {
    fn from(error: ComposeError) -> Self {
        const SOURCE: &str = "application::posts";
        match error {
            ComposeError::Text(err) => HttpError::from_error(
                SOURCE,
                StatusCode::BAD_REQUEST,
                "Text must not be empty",
                &err,
            ),
            ComposeError::UnknownGroup(slug) => HttpError::new(
                SOURCE,
                StatusCode::BAD_REQUEST,
                "Unknown group",
                format!("Group slug `{slug}` did not match any known group"),
            ),
            ComposeError::UnknownPost => HttpError::new(
                SOURCE,
                StatusCode::NOT_FOUND,
                "Unknown post",
                "Post id did not match any known post",
            ),
            ComposeError::NotAuthor => HttpError::new(
                SOURCE,
                StatusCode::FORBIDDEN,
                "Only the author may change a post",
                "Actor does not own the targeted post",
            ),
            ComposeError::Repo(err) => HttpError::from_error(
                SOURCE,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                &err,
            ),
        }
    }
}

impl From<FollowError> for HttpError {
    fn from(error: FollowError) -> Self {
        const SOURCE: &str = "application::follows";
        match error {
            FollowError::UnknownAuthor => HttpError::new(
                SOURCE,
                StatusCode::NOT_FOUND,
                "Unknown author",
                "Username did not match any known author",
            ),
            FollowError::Repo(err) => HttpError::from_error(
                SOURCE,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                &err,
            ),
        }
    }
}

/// Top-level error for startup and shutdown paths.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}
