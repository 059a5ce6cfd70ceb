use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use service::error::{Error as FeedLogError, FeedLogErrorKind};

extern crate log;
use log::*;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error(FeedLogError);

impl StdError for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        write!(fmt, "{self:?}")
    }
}

// List of possible StatusCode variants https://docs.rs/http/latest/http/status/struct.StatusCode.html#associatedconstant.UNPROCESSABLE_ENTITY
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self.0.error_kind {
            FeedLogErrorKind::ValidationError => {
                debug!("Rejected feed request: {}", self.0.message);
                (StatusCode::UNPROCESSABLE_ENTITY, "UNPROCESSABLE ENTITY").into_response()
            }
            FeedLogErrorKind::RecordNotFound => {
                (StatusCode::NOT_FOUND, "NOT FOUND").into_response()
            }
        }
    }
}

impl<E> From<E> for Error
where
    E: Into<FeedLogError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_log_errors_map_to_status_codes() {
        let response = Error::from(FeedLogError::validation("blank")).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let response = Error::from(FeedLogError::not_found("feed 9")).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
