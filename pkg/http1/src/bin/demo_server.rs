use http1::errors::*;
use http1::{handler_fn, FullBody, Request, Response, Server};

#[async_std::main]
async fn main() -> Result<()> {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Debug)
        .init()
        .map_err(|e| format_err!("logger init failed: {}", e))?;

    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:8080".to_string());

    let handler = handler_fn(|request: Request| async move {
        let mut response = Response::new(200);
        response.add_field("Content-Type", "text/plain");
        response.set_body(FullBody::new(
            format!("{} {}\n", request.method, request.target).into_bytes(),
        ));
        response
    });

    Server::new(handler).run(&addr).await
}
