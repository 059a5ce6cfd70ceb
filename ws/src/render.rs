//! The render callback injected at construction time.

use crate::connection::Marker;
use async_trait::async_trait;
use std::error::Error as StdError;
use std::future::Future;

pub type RenderError = Box<dyn StdError + Send + Sync>;

/// Produces the bytes to push to one client, given the last state it has seen.
///
/// Called concurrently from many send tasks, so implementations must not rely
/// on exclusive access to anything.
#[async_trait]
pub trait Render: Send + Sync + 'static {
    async fn render(&self, last_marker: Marker) -> Result<Vec<u8>, RenderError>;
}

#[async_trait]
impl<F, Fut> Render for F
where
    F: Fn(Marker) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<u8>, RenderError>> + Send + 'static,
{
    async fn render(&self, last_marker: Marker) -> Result<Vec<u8>, RenderError> {
        (self)(last_marker).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_closure_renders_through_trait() {
        let render = |marker: Marker| async move {
            Ok::<_, RenderError>(format!("seen:{marker}").into_bytes())
        };
        let bytes = Render::render(&render, 7).await.unwrap();
        assert_eq!(bytes, b"seen:7".to_vec());
    }

    #[tokio::test]
    async fn test_closure_error_is_returned() {
        let render = |_marker: Marker| async move {
            Err::<Vec<u8>, RenderError>("feed store unavailable".into())
        };
        let err = Render::render(&render, 1).await.unwrap_err();
        assert_eq!(err.to_string(), "feed store unavailable");
    }
}
