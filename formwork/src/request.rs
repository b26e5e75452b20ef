//! Reading parameters out of an [`http::Request`].

use alloc::borrow::{Cow, ToOwned};

use http::header::CONTENT_TYPE;
use http::{HeaderMap, Method, Request};

use crate::{ParamSet, ParamSource, SourceError};

/// Largest form body that will be read, in bytes (10 MiB).
pub const MAX_BODY_SIZE: usize = 10 << 20;

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
const MULTIPART: &str = "multipart/form-data";

/// The query string, plus the body of `POST`, `PUT` and `PATCH` requests sent
/// as `application/x-www-form-urlencoded`. Body values come before query
/// values, so they win when a key appears in both.
///
/// Bodies of other media types are ignored, except `multipart/form-data`:
/// it fails with [`SourceError::UnsupportedMediaType`] and no query values
/// are returned, rather than silently dropping every body field. Callers that
/// want the query alone can read `uri().query()` with [`ParamSet::parse`].
impl<B: AsRef<[u8]>> ParamSource for Request<B> {
    fn param_set(&self) -> Result<Cow<'_, ParamSet>, SourceError> {
        let mut params = ParamSet::new();

        if [Method::POST, Method::PUT, Method::PATCH].contains(self.method()) {
            match media_type(self.headers()) {
                Some(media_type) if media_type.eq_ignore_ascii_case(FORM_URLENCODED) => {
                    let body = self.body().as_ref();
                    if body.len() > MAX_BODY_SIZE {
                        return Err(SourceError::BodyTooLarge {
                            limit: MAX_BODY_SIZE,
                        });
                    }
                    let body = core::str::from_utf8(body).map_err(|_| SourceError::InvalidUtf8 {
                        segment: "<request body>".to_owned(),
                    })?;
                    params = ParamSet::parse(body)?;
                    tracing::trace!(keys = params.len(), "read form body");
                }
                Some(media_type) if media_type.eq_ignore_ascii_case(MULTIPART) => {
                    return Err(SourceError::UnsupportedMediaType {
                        media_type: media_type.to_owned(),
                    });
                }
                _ => {}
            }
        }

        if let Some(query) = self.uri().query() {
            let query = ParamSet::parse(query)?;
            params.extend(query.pairs());
        }
        Ok(Cow::Owned(params))
    }
}

/// The media type of `Content-Type`, without its parameters.
fn media_type(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(CONTENT_TYPE)?.to_str().ok()?;
    value.split(';').next().map(str::trim)
}
