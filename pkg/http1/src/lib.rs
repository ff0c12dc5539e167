//! An HTTP/1.x server connection core: incremental head parsing into a
//! growable header buffer, recognized-field dispatch, exact-length body
//! intake, response framing with chunked transfer encoding, and
//! keepalive/pipelining handling. Transport is abstracted behind the
//! Readable/Writeable traits so connections run the same over sockets or
//! the in-memory pipe.

pub mod errors;

mod body;
mod chunked;
mod conn;
mod fields;
mod io;
mod parser;
mod pipe;
mod request;
mod response;
mod server;
mod status;

pub use body::{Body, EmptyBody, FullBody, UnsizedBody};
pub use conn::{ConnOptions, Connection};
pub use io::{Readable, Writeable};
pub use parser::{Field, Version};
pub use pipe::{pipe, PipeReader, PipeWriter};
pub use request::Request;
pub use response::{Response, ResponseField};
pub use server::{handler_fn, HandlerFn, Protocol, RequestHandler, Server};
