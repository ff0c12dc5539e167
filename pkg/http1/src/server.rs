use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_std::net::{TcpListener, TcpStream};
use async_std::task;
use async_trait::async_trait;
use futures::stream::StreamExt;
use log::{debug, info};

use crate::conn::{ConnOptions, Connection};
use crate::errors::*;
use crate::request::Request;
use crate::response::Response;

/// The upper layer: receives each fully read request and produces the
/// response the connection will frame and send.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn handle_request(&self, request: Request) -> Response;
}

/// Wraps a plain async function as a request handler.
pub struct HandlerFn {
    value: Box<dyn (Fn(Request) -> Pin<Box<dyn Future<Output = Response> + Send>>) + Send + Sync>,
}

pub fn handler_fn<F, Fut>(f: F) -> HandlerFn
where
    F: (Fn(Request) -> Fut) + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    HandlerFn {
        value: Box::new(move |request| Box::pin(f(request))),
    }
}

#[async_trait]
impl RequestHandler for HandlerFn {
    async fn handle_request(&self, request: Request) -> Response {
        (self.value)(request).await
    }
}

/// Protocol slot of the connection dispatch. Only HTTP/1.x exists; further
/// variants would carry their own connection types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Protocol {
    Http1,
}

pub struct Server {
    options: ConnOptions,
    protocol: Protocol,
    handler: Arc<dyn RequestHandler>,
}

impl Server {
    pub fn new<H: 'static + RequestHandler>(handler: H) -> Self {
        Self {
            options: ConnOptions::default(),
            protocol: Protocol::Http1,
            handler: Arc::new(handler),
        }
    }

    pub fn with_options(mut self, options: ConnOptions) -> Self {
        self.options = options;
        self
    }

    /// Accepts connections forever, one task per connection.
    pub async fn run(&self, addr: &str) -> Result<()> {
        let listener = TcpListener::bind(addr).await?;
        info!("listening on {}", listener.local_addr()?);

        let mut incoming = listener.incoming();
        while let Some(stream) = incoming.next().await {
            self.accept(stream?);
        }

        Ok(())
    }

    fn accept(&self, stream: TcpStream) {
        // Keepalive turnarounds should not wait for writes to coalesce.
        let _ = stream.set_nodelay(true);

        let conn = match self.protocol {
            Protocol::Http1 => Connection::new(self.options.clone(), self.handler.clone()),
        };

        let peer = stream.peer_addr().ok();
        task::spawn(async move {
            debug!("accepted connection from {:?}", peer);
            let reader = stream.clone();
            if let Err(e) = conn.serve(Box::new(reader), Box::new(stream)).await {
                debug!("connection from {:?} failed: {}", peer, e);
            }
        });
    }
}
