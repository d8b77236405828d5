//! Per-request logging.
//!
//! Emits an access line for every request and, when a response carries an
//! [`ErrorContext`] left by the error translator, an error line in the shape
//! `"<method> <url> - <message>"` with the resolved status and query string.

use std::time::Instant;

use axum::{extract::Request, http::header, middleware::Next, response::Response};

use super::error_handling::ErrorContext;

pub async fn request_logging(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let query = uri.query().unwrap_or("").to_string();
    // The body itself is a stream the handler consumes, so the error line
    // records its declared size rather than replaying the content.
    let body_bytes = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("0")
        .to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    if let Some(ctx) = response.extensions().get::<ErrorContext>() {
        tracing::error!(
            status_code = ctx.status_code.as_u16(),
            request_query = %query,
            request_body_bytes = %body_bytes,
            "{} {} - {}",
            method,
            uri,
            ctx.message
        );
    }

    tracing::debug!(
        status = response.status().as_u16(),
        latency_ms = start.elapsed().as_millis() as u64,
        "{} {} {}",
        method,
        uri.path(),
        response.status().as_u16()
    );

    response
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use axum::{
        body::Body,
        http::{Request, StatusCode},
        middleware::from_fn,
        routing::post,
        Router,
    };
    use tower::ServiceExt;
    use tracing_subscriber::fmt::MakeWriter;

    use super::request_logging;
    use crate::middleware::error_handling::AppError;

    #[derive(Clone, Default)]
    struct LogSink(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogSink {
        type Writer = LogSink;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[tokio::test]
    async fn error_line_carries_query_and_body_size() {
        let sink = LogSink::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(sink.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let app = Router::new()
            .route(
                "/boom",
                post(|| async { AppError::new("boom", StatusCode::BAD_REQUEST) }),
            )
            .layer(from_fn(request_logging));

        let request = Request::builder()
            .method("POST")
            .uri("/boom?source=test")
            .header("content-length", "17")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"field":"value"}"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let logs = String::from_utf8(sink.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("POST /boom?source=test - boom"), "{logs}");
        assert!(logs.contains("request_query=source=test"), "{logs}");
        assert!(logs.contains("request_body_bytes=17"), "{logs}");
    }
}
