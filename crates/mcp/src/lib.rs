pub mod http;
pub mod server;
pub mod stdio;
pub mod tools;
pub mod transport;

pub use http::{HttpHandler, HttpResponse};
pub use server::McpServer;
pub use stdio::serve_lines;
