//! Tower middleware stamping the headers every journal API call carries.
use http::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use http::{HeaderValue, Method, Request};
use std::task::{Context, Poll};
use tower_layer::Layer;
use tower_service::Service;

const JSON: &str = "application/json";

#[derive(Clone, Debug)]
pub struct ApiHeadersLayer {
    user_agent: String,
}

impl ApiHeadersLayer {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
        }
    }
}

impl Default for ApiHeadersLayer {
    fn default() -> Self {
        Self::new(format!("diario/{}", env!("CARGO_PKG_VERSION")))
    }
}

impl<S> Layer<S> for ApiHeadersLayer {
    type Service = ApiHeadersService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ApiHeadersService {
            inner,
            user_agent: self.user_agent.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ApiHeadersService<S> {
    inner: S,
    user_agent: String,
}

impl<S, ReqBody> Service<Request<ReqBody>> for ApiHeadersService<S>
where
    S: Service<Request<ReqBody>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let headers = req.headers_mut();
        if let Ok(val) = HeaderValue::from_str(&self.user_agent) {
            headers.insert(USER_AGENT, val);
        }
        headers
            .entry(ACCEPT)
            .or_insert(HeaderValue::from_static(JSON));

        let sends_body = req.method() == Method::POST || req.method() == Method::PUT;
        if sends_body && !req.headers().contains_key(CONTENT_TYPE) {
            req.headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static(JSON));
        }
        self.inner.call(req)
    }
}
