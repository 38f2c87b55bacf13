//! Update feed request handling.

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{Method, Request, Response, StatusCode};
use http_body_util::Full;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, error, instrument};
use uuid::Uuid;

use crate::ratelimit::AdmissionControl;
use crate::updates::UpdateSource;

/// Path of the update feed endpoint.
pub const UPDATE_PATH: &str = "/update";

/// Response body type produced by [`UpdateService`].
pub type ResponseBody = Full<Bytes>;

/// Handles requests for the update feed.
///
/// Every request to [`UPDATE_PATH`] is counted against the rate limiter before
/// anything else is checked, so rejected methods still use up quota. Other
/// paths are answered with 404 and never reach the limiter.
pub struct UpdateService<A: ?Sized, S: ?Sized> {
    admission: Arc<A>,
    source: Arc<S>,
}

impl<A: ?Sized, S: ?Sized> Clone for UpdateService<A, S> {
    fn clone(&self) -> Self {
        Self {
            admission: self.admission.clone(),
            source: self.source.clone(),
        }
    }
}

impl<A, S> UpdateService<A, S>
where
    A: AdmissionControl + ?Sized,
    S: UpdateSource + ?Sized,
{
    /// Create a new service from an admission policy and an update source.
    pub fn new(admission: Arc<A>, source: Arc<S>) -> Self {
        Self { admission, source }
    }

    /// Produce the response for one request from `peer`.
    #[instrument(
        skip_all,
        fields(
            request_id = %Uuid::new_v4(),
            method = %req.method(),
            path = %req.uri().path(),
            client = %client_identifier(&peer),
        )
    )]
    pub async fn handle<B>(&self, req: Request<B>, peer: SocketAddr) -> Response<ResponseBody> {
        if req.uri().path() != UPDATE_PATH {
            return text_response(StatusCode::NOT_FOUND, "404 page not found");
        }

        let client_id = client_identifier(&peer);
        if !self.admission.admit(&client_id) {
            debug!("Request rejected by rate limiter");
            return text_response(StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded");
        }

        if req.method() != Method::GET {
            return text_response(StatusCode::METHOD_NOT_ALLOWED, "Only GET method allowed");
        }

        let updates = match self.source.fetch_updates().await {
            Ok(updates) => updates,
            Err(e) => {
                error!(error = %e, "Failed to fetch updates");
                return text_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to get updates");
            }
        };

        match serde_json::to_vec(&updates) {
            Ok(mut body) => {
                body.push(b'\n');
                debug!(count = updates.len(), "Serving updates");
                let mut resp = Response::new(Full::new(Bytes::from(body)));
                resp.headers_mut()
                    .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                resp
            }
            Err(e) => {
                error!(error = %e, "Failed to encode updates");
                text_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to get updates")
            }
        }
    }
}

/// Derive the rate limit key for a connection: the peer IP without its port.
pub fn client_identifier(peer: &SocketAddr) -> String {
    peer.ip().to_string()
}

fn text_response(status: StatusCode, message: &'static str) -> Response<ResponseBody> {
    let mut resp = Response::new(Full::new(Bytes::from(format!("{}\n", message))));
    *resp.status_mut() = status;
    resp.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    resp
}
