//! Request ID middleware.
//!
//! Every request gets an id as early as possible so log lines from the
//! resolution, compilation and response stages can be correlated. An id
//! supplied by the caller in `x-request-id` is kept; otherwise a fresh
//! UUID is generated. The id is stored as a request extension and, when
//! absent, added to the request headers.

use axum::http::{HeaderValue, Request};
use std::fmt;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use uuid::Uuid;

/// Header carrying the request id.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Request id attached to each request as an extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestId(pub Uuid);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Layer installing [`RequestIdService`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestIdLayer;

impl<S> Layer<S> for RequestIdLayer {
    type Service = RequestIdService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestIdService { inner }
    }
}

/// Service that stamps requests with an id.
#[derive(Debug, Clone)]
pub struct RequestIdService<S> {
    inner: S,
}

impl<S, B> Service<Request<B>> for RequestIdService<S>
where
    S: Service<Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        let id = req
            .headers()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);

        req.extensions_mut().insert(RequestId(id));
        if !req.headers().contains_key(X_REQUEST_ID) {
            if let Ok(value) = HeaderValue::from_str(&id.to_string()) {
                req.headers_mut().insert(X_REQUEST_ID, value);
            }
        }

        self.inner.call(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use std::convert::Infallible;

    #[derive(Clone)]
    struct Capture;

    impl Service<Request<Body>> for Capture {
        type Response = Option<RequestId>;
        type Error = Infallible;
        type Future = std::future::Ready<Result<Self::Response, Infallible>>;

        fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Infallible>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: Request<Body>) -> Self::Future {
            std::future::ready(Ok(req.extensions().get::<RequestId>().copied()))
        }
    }

    #[tokio::test]
    async fn test_fresh_id_assigned() {
        let mut service = RequestIdLayer.layer(Capture);
        let req = Request::builder().body(Body::empty()).unwrap();
        let id = service.call(req).await.unwrap();
        assert!(id.is_some());
    }

    #[tokio::test]
    async fn test_caller_supplied_id_kept() {
        let mut service = RequestIdLayer.layer(Capture);
        let supplied = Uuid::new_v4();
        let req = Request::builder()
            .header(X_REQUEST_ID, supplied.to_string())
            .body(Body::empty())
            .unwrap();
        let id = service.call(req).await.unwrap();
        assert_eq!(id, Some(RequestId(supplied)));
    }
}
