//! Ordered provider fallback

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, warn};

use super::ports::GenerationError;

/// Boxed future returned by provider calls
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Providers tried in order until one succeeds: "A, then B, then the
/// declared terminal value"
pub struct ProviderChain<P: ?Sized> {
    providers: Vec<(String, Arc<P>)>,
}

impl<P: ?Sized> Default for ProviderChain<P> {
    fn default() -> Self {
        Self {
            providers: Vec::new(),
        }
    }
}

impl<P: ?Sized + Send + Sync> ProviderChain<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a provider at the lowest priority so far
    pub fn with(mut self, name: impl Into<String>, provider: Arc<P>) -> Self {
        self.providers.push((name.into(), provider));
        self
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.providers.iter().map(|(name, _)| name.as_str())
    }

    /// Result of the first provider that succeeds. When all fail, the
    /// last error is returned.
    pub async fn first_success<'a, T, F>(&'a self, call: F) -> Result<T, GenerationError>
    where
        F: Fn(&'a P) -> BoxFuture<'a, Result<T, GenerationError>>,
    {
        let mut last_error = GenerationError::NoProvider;
        for (name, provider) in &self.providers {
            debug!(provider = %name, "Trying provider");
            match call(provider.as_ref()).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!(provider = %name, error = %e, "Provider failed");
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }

    /// Like [`first_success`](Self::first_success) but never fails:
    /// `terminal` builds the declared fallback from the last error
    pub async fn or_terminal<'a, T, F, D>(&'a self, call: F, terminal: D) -> T
    where
        F: Fn(&'a P) -> BoxFuture<'a, Result<T, GenerationError>>,
        D: FnOnce(&GenerationError) -> T,
    {
        match self.first_success(call).await {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "All providers failed, using terminal fallback");
                terminal(&e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[async_trait]
    trait Echo: Send + Sync {
        async fn echo(&self, input: &str) -> Result<String, GenerationError>;
    }

    struct Working(&'static str);

    #[async_trait]
    impl Echo for Working {
        async fn echo(&self, input: &str) -> Result<String, GenerationError> {
            Ok(format!("{}:{}", self.0, input))
        }
    }

    struct Failing {
        calls: AtomicUsize,
        error: GenerationError,
    }

    #[async_trait]
    impl Echo for Failing {
        async fn echo(&self, _input: &str) -> Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(self.error.clone())
        }
    }

    fn failing(error: GenerationError) -> Arc<Failing> {
        Arc::new(Failing {
            calls: AtomicUsize::new(0),
            error,
        })
    }

    #[tokio::test]
    async fn falls_back_to_next_provider() {
        let first = failing(GenerationError::QuotaExceeded);
        let chain = ProviderChain::<dyn Echo>::new()
            .with("first", first.clone())
            .with("second", Arc::new(Working("b")));

        let out = chain.first_success(|p| p.echo("hi")).await.unwrap();

        assert_eq!(out, "b:hi");
        assert_eq!(first.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stops_at_first_success() {
        let second = failing(GenerationError::EmptyResponse);
        let chain = ProviderChain::<dyn Echo>::new()
            .with("first", Arc::new(Working("a")))
            .with("second", second.clone());

        assert_eq!(chain.first_success(|p| p.echo("x")).await.unwrap(), "a:x");
        assert_eq!(second.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn all_failing_returns_last_error() {
        let chain = ProviderChain::<dyn Echo>::new()
            .with("first", failing(GenerationError::QuotaExceeded))
            .with("second", failing(GenerationError::InvalidApiKey));

        let err = chain.first_success(|p| p.echo("x")).await.unwrap_err();
        assert!(matches!(err, GenerationError::InvalidApiKey));
    }

    #[tokio::test]
    async fn empty_chain_has_no_provider() {
        let chain = ProviderChain::<dyn Echo>::new();
        let err = chain.first_success(|p| p.echo("x")).await.unwrap_err();
        assert!(matches!(err, GenerationError::NoProvider));
    }

    #[tokio::test]
    async fn terminal_value_when_exhausted() {
        let chain =
            ProviderChain::<dyn Echo>::new().with("only", failing(GenerationError::QuotaExceeded));

        let out = chain
            .or_terminal(|p| p.echo("x"), |e| format!("fallback after {e}"))
            .await;
        assert!(out.starts_with("fallback after Upstream quota exceeded"));
    }
}
