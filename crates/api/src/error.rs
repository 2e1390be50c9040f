//! Translates a [`manhwa_catalogue::CatalogueError`] into the `{error: {...}}`
//! HTTP body shape from §7, via actix-web's `ResponseError`.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use manhwa_catalogue::CatalogueError;
use serde::Serialize;
use std::fmt;

#[derive(Debug)]
pub struct ApiError(pub CatalogueError);

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<CatalogueError> for ApiError {
    fn from(err: CatalogueError) -> Self {
        ApiError(err)
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: ErrorPayload<'a>,
}

#[derive(Serialize)]
struct ErrorPayload<'a> {
    message: &'a str,
    #[serde(rename = "appCode")]
    app_code: &'a str,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        let message = self.0.to_string();
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: ErrorPayload {
                message: &message,
                app_code: self.0.app_code(),
            },
        })
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
