use std::io::{self, BufRead, Write};

use crate::server::McpServer;

/// Answer one JSON-RPC message per input line until EOF.
///
/// Undecodable bytes are replaced rather than rejected, so a garbled line gets
/// a parse error and the loop keeps going. Only I/O errors end it early.
pub fn serve_lines(
    server: &mut McpServer,
    mut reader: impl BufRead,
    mut writer: impl Write,
) -> io::Result<()> {
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(());
        }

        let line = String::from_utf8_lossy(&buf);
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(resp) = server.handle_request(line) {
            writeln!(writer, "{}", resp)?;
            writer.flush()?;
        }
    }
}
