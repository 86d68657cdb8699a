use actix_web::{cookie::Cookie, http::StatusCode, HttpRequest, HttpResponse, Responder};
use std::borrow::Cow;

#[derive(serde::Serialize)]
struct SuccessBody<T: serde::Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<Cow<'static, str>>,
}

/// Uniform success envelope: `{ "data": ..., "message": ... }` with an
/// explicit status code and optional cookies.
pub struct Success<T: serde::Serialize> {
    status: StatusCode,
    data: Option<T>,
    message: Option<Cow<'static, str>>,
    cookies: Vec<Cookie<'static>>,
}

impl<T: serde::Serialize> Success<T> {
    fn with_status(status: StatusCode, data: Option<T>) -> Self {
        Self { status, data, message: None, cookies: Vec::new() }
    }

    pub fn ok(data: T) -> Self {
        Self::with_status(StatusCode::OK, Some(data))
    }

    pub fn created(data: T) -> Self {
        Self::with_status(StatusCode::CREATED, Some(data))
    }

    pub fn no_content() -> Self {
        Self::with_status(StatusCode::NO_CONTENT, None)
    }

    pub fn message(mut self, msg: impl Into<Cow<'static, str>>) -> Self {
        self.message = Some(msg.into());
        self
    }

    pub fn cookie(mut self, cookie: Cookie<'static>) -> Self {
        self.cookies.push(cookie);
        self
    }
}

impl<T: serde::Serialize> Responder for Success<T> {
    type Body = actix_web::body::BoxBody;

    fn respond_to(self, _req: &HttpRequest) -> HttpResponse<Self::Body> {
        let mut response = HttpResponse::build(self.status);

        for cookie in self.cookies {
            response.cookie(cookie);
        }

        if self.status == StatusCode::NO_CONTENT {
            response.finish()
        } else {
            response.json(SuccessBody { data: self.data, message: self.message })
        }
    }
}
