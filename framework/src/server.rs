use crate::config::ServerConfig;
use crate::error::FrameworkError;
use crate::http::{collect_body, HttpResponse, Request, JSON_CONTENT_TYPE};
use crate::routing::RouteTable;
use bytes::Bytes;
use http_body_util::Full;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Headers added to every response in permissive (cross-origin) mode
pub const CORS_HEADERS: [(&str, &str); 3] = [
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Headers", "*"),
    ("Access-Control-Allow-Methods", "POST, GET, OPTIONS, DELETE, PUT"),
];

/// Upper bound on buffered request head bytes
const MAX_HEADER_BYTES: usize = 1 << 20;

/// Turns a request into a response using the route table
///
/// Owns the per-request policy: preflight short-circuit, route matching,
/// default content type and CORS headers. Body bytes pass through untouched.
pub struct Dispatcher {
    routes: RouteTable,
    permissive: bool,
}

impl Dispatcher {
    pub fn new(routes: RouteTable) -> Self {
        Self {
            routes,
            permissive: false,
        }
    }

    /// Enable permissive cross-origin mode
    pub fn permissive(mut self, enabled: bool) -> Self {
        self.permissive = enabled;
        self
    }

    pub fn is_permissive(&self) -> bool {
        self.permissive
    }

    /// Resolve, run and finalize one request
    pub async fn dispatch(&self, req: Request) -> HttpResponse {
        let response = self.resolve(req).await;
        self.finalize(response)
    }

    /// Apply the response header policy shared by every outgoing response
    pub fn finalize(&self, mut response: HttpResponse) -> HttpResponse {
        if self.permissive {
            for (name, value) in CORS_HEADERS {
                response.set_header(name, value);
            }
        }
        response
    }

    async fn resolve(&self, req: Request) -> HttpResponse {
        if self.permissive && req.method() == http::Method::OPTIONS {
            return HttpResponse::new().status(204);
        }

        let Some((route, params)) = self.routes.resolve(req.path()) else {
            info!(method = %req.method(), path = %req.path(), "could not resolve path");
            return HttpResponse::text("Not Found").status(404);
        };

        info!(method = %req.method(), path = %req.path(), "dispatch");
        let mut response = route
            .handler()
            .handle(req.with_params(params))
            .await
            // Both Ok and Err carry a finished response
            .unwrap_or_else(|e| e);

        if let Some(content_type) = route.default_content_type() {
            response.set_default_header("Content-Type", content_type);
        }
        response
    }
}

pub struct Server {
    dispatcher: Arc<Dispatcher>,
    host: String,
    port: u16,
    max_body_size: usize,
    read_timeout: Duration,
}

impl Server {
    pub fn from_config(routes: RouteTable, config: &ServerConfig) -> Self {
        Self {
            dispatcher: Arc::new(Dispatcher::new(routes).permissive(config.dev_mode)),
            host: config.host.clone(),
            port: config.port,
            max_body_size: config.max_body_size,
            read_timeout: config.read_timeout,
        }
    }

    fn get_addr(&self) -> Result<SocketAddr, FrameworkError> {
        let ip = self.host.parse().map_err(|e| {
            FrameworkError::Config(format!("invalid SERVER_HOST '{}': {}", self.host, e))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Serve until Ctrl-C
    pub async fn run(self) -> Result<(), FrameworkError> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "cannot listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Bind the configured address and serve until `shutdown` resolves
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), FrameworkError>
    where
        F: Future<Output = ()>,
    {
        let addr = self.get_addr()?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| FrameworkError::Config(format!("cannot bind {}: {}", addr, e)))?;
        self.serve(listener, shutdown).await
    }

    /// Serve connections from an already bound listener until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), FrameworkError>
    where
        F: Future<Output = ()>,
    {
        if let Ok(addr) = listener.local_addr() {
            info!(%addr, permissive = self.dispatcher.is_permissive(), "listening");
        }

        tokio::pin!(shutdown);
        loop {
            let (stream, peer) = tokio::select! {
                accepted = listener.accept() => accepted
                    .map_err(|e| FrameworkError::internal(format!("accept failed: {}", e)))?,
                _ = &mut shutdown => {
                    info!("shutting down");
                    return Ok(());
                }
            };

            let io = TokioIo::new(stream);
            let dispatcher = self.dispatcher.clone();
            let limit = self.max_body_size;
            let read_timeout = self.read_timeout;

            tokio::spawn(async move {
                let service = service_fn(move |req: hyper::Request<hyper::body::Incoming>| {
                    let dispatcher = dispatcher.clone();
                    async move { Ok::<_, Infallible>(handle_request(dispatcher, limit, req).await) }
                });

                let mut builder = http1::Builder::new();
                builder
                    .timer(TokioTimer::new())
                    .header_read_timeout(read_timeout)
                    .max_buf_size(MAX_HEADER_BYTES);

                // The response may already be partially sent; log and move on
                if let Err(err) = builder.serve_connection(io, service).await {
                    error!(%peer, error = %err, "error serving connection");
                }
            });
        }
    }
}

async fn handle_request(
    dispatcher: Arc<Dispatcher>,
    limit: usize,
    req: hyper::Request<hyper::body::Incoming>,
) -> hyper::Response<Full<Bytes>> {
    let (parts, body) = req.into_parts();

    let response = match collect_body(body, limit).await {
        Ok(bytes) => {
            let request = Request::new(http::Request::from_parts(parts, bytes));
            dispatcher.dispatch(request).await
        }
        Err(err) => {
            let mut response = HttpResponse::from(err);
            response.set_header("Content-Type", JSON_CONTENT_TYPE);
            dispatcher.finalize(response)
        }
    };

    response.into_hyper()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Response;
    use crate::testing::request;
    use pretty_assertions::assert_eq;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    async fn hello(_req: Request) -> Response {
        HttpResponse::bytes(r#"{"hello":"world"}"#).ok()
    }

    async fn explicit(_req: Request) -> Response {
        HttpResponse::text("plain").ok()
    }

    async fn failing(_req: Request) -> Response {
        Err(FrameworkError::validation("nope").into())
    }

    fn table() -> RouteTable {
        RouteTable::new()
            .bind("/hello", hello)
            .unwrap()
            .content_type("application/json")
            .bind("/explicit", explicit)
            .unwrap()
            .content_type("application/json")
            .bind("/failing", failing)
            .unwrap()
            .content_type("application/json")
            .into()
    }

    #[tokio::test]
    async fn unmatched_path_is_plain_not_found() {
        let dispatcher = Dispatcher::new(table());
        let response = dispatcher.dispatch(request("GET", "/nope")).await;

        assert_eq!(response.status_code(), 404);
        assert_eq!(response.body().as_ref(), b"Not Found");
        assert_eq!(response.header_value("content-type"), Some("text/plain"));
    }

    #[tokio::test]
    async fn injects_default_content_type() {
        let dispatcher = Dispatcher::new(table());
        let response = dispatcher.dispatch(request("GET", "/hello")).await;

        assert_eq!(response.status_code(), 200);
        assert_eq!(response.header_value("Content-Type"), Some("application/json"));
        assert_eq!(response.body().as_ref(), br#"{"hello":"world"}"#);
    }

    #[tokio::test]
    async fn explicit_content_type_wins() {
        let dispatcher = Dispatcher::new(table());
        let response = dispatcher.dispatch(request("GET", "/explicit")).await;

        assert_eq!(response.header_value("Content-Type"), Some("text/plain"));
        assert_eq!(response.headers().len(), 1);
    }

    #[tokio::test]
    async fn error_responses_are_finalized_too() {
        let dispatcher = Dispatcher::new(table());
        let response = dispatcher.dispatch(request("GET", "/failing")).await;

        assert_eq!(response.status_code(), 400);
        assert_eq!(response.header_value("Content-Type"), Some("application/json"));
    }

    #[tokio::test]
    async fn permissive_mode_answers_preflight() {
        let dispatcher = Dispatcher::new(table()).permissive(true);
        let response = dispatcher.dispatch(request("OPTIONS", "/anything")).await;

        assert_eq!(response.status_code(), 204);
        assert!(response.body().is_empty());
        assert_eq!(response.header_value("Access-Control-Allow-Origin"), Some("*"));
    }

    #[tokio::test]
    async fn permissive_mode_adds_cors_headers_everywhere() {
        let dispatcher = Dispatcher::new(table()).permissive(true);

        for path in ["/hello", "/nope"] {
            let response = dispatcher.dispatch(request("GET", path)).await;
            for (name, value) in CORS_HEADERS {
                assert_eq!(response.header_value(name), Some(value), "{path}");
            }
        }
    }

    #[tokio::test]
    async fn strict_mode_routes_options_like_any_method() {
        let dispatcher = Dispatcher::new(table());
        let response = dispatcher.dispatch(request("OPTIONS", "/nope")).await;

        assert_eq!(response.status_code(), 404);
        assert_eq!(response.header_value("Access-Control-Allow-Origin"), None);
    }

    #[tokio::test]
    async fn serves_over_tcp_until_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let config = ServerConfig::builder().dev_mode(false).build();
        let (stop, stopped) = tokio::sync::oneshot::channel::<()>();

        let server = tokio::spawn(Server::from_config(table(), &config).serve(listener, async {
            let _ = stopped.await;
        }));

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /hello HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut raw = String::new();
        stream.read_to_string(&mut raw).await.unwrap();

        assert!(raw.starts_with("HTTP/1.1 200 OK"), "{raw}");
        assert!(raw.to_ascii_lowercase().contains("content-type: application/json"));
        assert!(raw.ends_with(r#"{"hello":"world"}"#));

        stop.send(()).unwrap();
        server.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let config = ServerConfig::builder().max_body_size(8).build();
        let (stop, stopped) = tokio::sync::oneshot::channel::<()>();

        let server = tokio::spawn(Server::from_config(table(), &config).serve(listener, async {
            let _ = stopped.await;
        }));

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(
                b"POST /hello HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\nContent-Length: 16\r\n\r\n0123456789abcdef",
            )
            .await
            .unwrap();
        let mut raw = String::new();
        stream.read_to_string(&mut raw).await.unwrap();

        assert!(raw.starts_with("HTTP/1.1 413"), "{raw}");
        assert!(raw.to_ascii_lowercase().contains("content-type: application/json"), "{raw}");
        assert!(raw.ends_with(r#"{"message":"Request body exceeds 8 bytes"}"#), "{raw}");

        stop.send(()).unwrap();
        server.await.unwrap().unwrap();
    }
}
