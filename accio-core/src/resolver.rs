//! Resolver trait and closure adapter.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ResolveError;
use crate::request::{Context, FetchOptions};

/// Capability performing the actual network resolution of a request.
///
/// Resolvers are transport-agnostic: an HTTP client, a gRPC stub or an
/// in-memory fixture all fit. Failures are opaque to the orchestration core.
///
/// # Examples
///
/// ```rust
/// use accio_core::{Context, FetchOptions, ResolveError, Resolver};
/// use async_trait::async_trait;
/// use serde_json::{Value, json};
///
/// struct Fixture;
///
/// #[async_trait]
/// impl Resolver<Value> for Fixture {
///     async fn resolve(
///         &self,
///         endpoint: &str,
///         _options: &FetchOptions,
///         _context: &Context,
///     ) -> Result<Value, ResolveError> {
///         Ok(json!({ "endpoint": endpoint }))
///     }
/// }
/// ```
#[async_trait]
pub trait Resolver<Res>: Send + Sync {
    /// Resolves `endpoint` with the forwarded transport `options`.
    async fn resolve(
        &self,
        endpoint: &str,
        options: &FetchOptions,
        context: &Context,
    ) -> Result<Res, ResolveError>;
}

#[async_trait]
impl<Res, R> Resolver<Res> for Arc<R>
where
    R: Resolver<Res> + ?Sized,
{
    async fn resolve(
        &self,
        endpoint: &str,
        options: &FetchOptions,
        context: &Context,
    ) -> Result<Res, ResolveError> {
        (**self).resolve(endpoint, options, context).await
    }
}

#[async_trait]
impl<Res, R> Resolver<Res> for Box<R>
where
    R: Resolver<Res> + ?Sized,
{
    async fn resolve(
        &self,
        endpoint: &str,
        options: &FetchOptions,
        context: &Context,
    ) -> Result<Res, ResolveError> {
        (**self).resolve(endpoint, options, context).await
    }
}

/// Resolver backed by an async closure. See [`resolver_fn`].
#[derive(Clone)]
pub struct FnResolver<F> {
    f: F,
}

impl<F> std::fmt::Debug for FnResolver<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnResolver").finish_non_exhaustive()
    }
}

/// Builds a [`Resolver`] from an async closure taking owned arguments.
///
/// ```rust
/// use accio_core::{ResolveError, resolver_fn};
/// use serde_json::json;
///
/// let resolver = resolver_fn(|endpoint, _options, _context| async move {
///     Ok::<_, ResolveError>(json!({ "endpoint": endpoint }))
/// });
/// # let _ = resolver;
/// ```
pub fn resolver_fn<F, Fut, Res>(f: F) -> FnResolver<F>
where
    F: Fn(String, FetchOptions, Context) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Res, ResolveError>> + Send,
{
    FnResolver { f }
}

#[async_trait]
impl<F, Fut, Res> Resolver<Res> for FnResolver<F>
where
    F: Fn(String, FetchOptions, Context) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Res, ResolveError>> + Send,
    Res: Send,
{
    async fn resolve(
        &self,
        endpoint: &str,
        options: &FetchOptions,
        context: &Context,
    ) -> Result<Res, ResolveError> {
        (self.f)(endpoint.to_owned(), options.clone(), context.clone()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[tokio::test]
    async fn closure_receives_owned_arguments() {
        let resolver = resolver_fn(|endpoint, options: FetchOptions, context: Value| async move {
            Ok::<_, ResolveError>(json!({
                "endpoint": endpoint,
                "body": options.body,
                "domain": context["domain"],
            }))
        });
        let options = FetchOptions {
            body: Some(json!({"id": 1})),
            ..FetchOptions::default()
        };

        let shared: Arc<dyn Resolver<Value>> = Arc::new(resolver);
        let response = shared
            .resolve("/fetch/foo", &options, &json!({"domain": "flight"}))
            .await
            .unwrap();

        assert_eq!(
            response,
            json!({"endpoint": "/fetch/foo", "body": {"id": 1}, "domain": "flight"})
        );
    }
}
