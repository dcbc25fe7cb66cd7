//! Development server with live reload.
//!
//! Serves the output directory over HTTP and holds a WebSocket endpoint at
//! `/__livereload`. HTML responses get a small script injected before
//! `</body>` that opens the socket and reloads the page when the watcher
//! pushes a rebuild notification. The axum server runs on its own thread with
//! a dedicated tokio runtime so the synchronous watch loop stays in charge.

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::body::Body;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::broadcast;
use tower_http::services::ServeDir;

/// WebSocket path the injected client script connects to.
const RELOAD_PATH: &str = "/__livereload";

/// Script injected into served HTML pages.
const RELOAD_SNIPPET: &str = concat!(
    "<script>(function(){",
    "var s=new WebSocket('ws://'+location.host+'/__livereload');",
    "s.onmessage=function(){location.reload();};",
    "})();</script>",
);

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("cannot bind 127.0.0.1:{port}: {source}")]
    Bind {
        port: u16,
        source: std::io::Error,
    },
    #[error("cannot start server runtime: {0}")]
    Runtime(std::io::Error),
}

/// Handle to a running (or disabled) dev server.
#[derive(Debug)]
pub struct DevServer {
    addr: Option<SocketAddr>,
    reload_tx: broadcast::Sender<()>,
}

impl DevServer {
    /// Bind and serve `root` on `127.0.0.1:port` in a background thread.
    pub fn start(root: PathBuf, port: u16) -> Result<Self, ServeError> {
        let listener = std::net::TcpListener::bind(("127.0.0.1", port))
            .map_err(|source| ServeError::Bind { port, source })?;
        listener
            .set_nonblocking(true)
            .map_err(|source| ServeError::Bind { port, source })?;
        let addr = listener
            .local_addr()
            .map_err(|source| ServeError::Bind { port, source })?;

        let (reload_tx, _) = broadcast::channel(16);
        let tx = reload_tx.clone();

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .map_err(ServeError::Runtime)?;

        std::thread::Builder::new()
            .name("sitesmith-serve".to_string())
            .spawn(move || {
                runtime.block_on(async move {
                    let app = router(root, tx);
                    match tokio::net::TcpListener::from_std(listener) {
                        Ok(listener) => {
                            if let Err(e) = axum::serve(listener, app).await {
                                eprintln!("server error: {}", e);
                            }
                        }
                        Err(e) => eprintln!("server error: {}", e),
                    }
                });
            })
            .map_err(ServeError::Runtime)?;

        Ok(DevServer {
            addr: Some(addr),
            reload_tx,
        })
    }

    /// A handle that serves nothing and drops reload notifications.
    pub fn disabled() -> Self {
        let (reload_tx, _) = broadcast::channel(1);
        DevServer {
            addr: None,
            reload_tx,
        }
    }

    /// Address the server is listening on, if running.
    pub fn addr(&self) -> Option<SocketAddr> {
        self.addr
    }

    /// Notify connected browsers to reload. A no-op with no listeners.
    pub fn reload(&self) {
        let _ = self.reload_tx.send(());
    }
}

fn router(root: PathBuf, reload_tx: broadcast::Sender<()>) -> Router {
    Router::new()
        .route(RELOAD_PATH, get(reload_socket))
        .fallback_service(ServeDir::new(root))
        .layer(middleware::from_fn(inject_reload))
        .with_state(reload_tx)
}

/// WebSocket endpoint: push one text frame per rebuild notification.
async fn reload_socket(
    ws: WebSocketUpgrade,
    State(reload_tx): State<broadcast::Sender<()>>,
) -> impl IntoResponse {
    let rx = reload_tx.subscribe();
    ws.on_upgrade(move |socket| push_reloads(socket, rx))
}

async fn push_reloads(socket: WebSocket, mut rx: broadcast::Receiver<()>) {
    let (mut sink, mut stream) = socket.split();
    loop {
        tokio::select! {
            changed = rx.recv() => {
                match changed {
                    Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {
                        if sink.send(Message::Text("reload".to_string())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    _ => {}
                }
            }
        }
    }
    let _ = sink.close().await;
}

/// Response middleware: append the reload script to HTML documents.
async fn inject_reload(request: Request, next: Next) -> Response {
    let response = next.run(request).await;

    let is_html = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("text/html"))
        .unwrap_or(false);
    if !is_html {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(_) => return Response::from_parts(parts, Body::empty()),
    };

    let injected = match std::str::from_utf8(&bytes) {
        Ok(html) => inject_into_html(html).into_bytes(),
        Err(_) => bytes.to_vec(),
    };

    // length changed, let hyper recompute it
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(injected))
}

/// Insert the reload snippet before the closing body tag, or append when the
/// document has none.
fn inject_into_html(html: &str) -> String {
    match html.rfind("</body>") {
        Some(pos) => {
            let mut out = String::with_capacity(html.len() + RELOAD_SNIPPET.len());
            out.push_str(&html[..pos]);
            out.push_str(RELOAD_SNIPPET);
            out.push_str(&html[pos..]);
            out
        }
        None => {
            let mut out = html.to_string();
            out.push_str(RELOAD_SNIPPET);
            out
        }
    }
}
