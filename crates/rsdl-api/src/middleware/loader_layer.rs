//! Install hook that gives every request its own loader context.

use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use axum::http::{Request, Response};
use rsdl_server::registry::{LoaderContext, ProviderRegistry, RequestScope, REQUEST_ID_HEADER};
use tower::{Layer, Service};
use tracing::trace;

/// Layer that installs an empty [`LoaderContext`] on every request.
///
/// Apply it globally (to the whole router) so every handler sees a context.
/// Installing twice is harmless: an existing context is kept.
#[derive(Clone, Debug)]
pub struct LoaderLayer {
    registry: Arc<ProviderRegistry>,
}

impl LoaderLayer {
    pub fn new(registry: impl Into<Arc<ProviderRegistry>>) -> Self {
        Self {
            registry: registry.into(),
        }
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }
}

impl<S> Layer<S> for LoaderLayer {
    type Service = LoaderService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        LoaderService {
            inner,
            registry: Arc::clone(&self.registry),
        }
    }
}

/// Service that attaches the per-request loader context.
#[derive(Clone, Debug)]
pub struct LoaderService<S> {
    inner: S,
    registry: Arc<ProviderRegistry>,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for LoaderService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    ReqBody: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<ReqBody>) -> Self::Future {
        if request.extensions().get::<Arc<LoaderContext>>().is_none() {
            let context = install(&self.registry, &request);
            trace!(
                target: "rsdl::http",
                scope = %context.scope().id(),
                request_id = context.scope().request_id(),
                "loader context installed"
            );
            request.extensions_mut().insert(context);
        }

        let mut inner = self.inner.clone();
        Box::pin(async move { inner.call(request).await })
    }
}

fn install<B>(registry: &Arc<ProviderRegistry>, request: &Request<B>) -> Arc<LoaderContext> {
    let mut scope = RequestScope::new();
    if let Some(request_id) = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        scope = scope.with_request_id(request_id);
    }
    Arc::new(LoaderContext::new(Arc::clone(registry), scope))
}
