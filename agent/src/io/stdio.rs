use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use crate::handler::dispatch::Dispatcher;
use crate::protocol::errors;
use crate::protocol::messages::{JsonRpcErrorResponse, JsonRpcRequest};

/// Run the NDJSON stdio transport loop.
///
/// Reads JSON-RPC messages from stdin (one per line) and writes
/// responses to stdout. Logs go to stderr. Lines longer than `max_line`
/// bytes are rejected without being buffered.
pub async fn run_stdio_loop(dispatcher: Dispatcher, max_line: usize) -> anyhow::Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    serve(stdin, &mut stdout, &dispatcher, max_line).await
}

/// Serve requests from `reader` until EOF, one response line per request.
pub async fn serve<R, W>(
    mut reader: R,
    writer: &mut W,
    dispatcher: &Dispatcher,
    max_line: usize,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWriteExt + Unpin,
{
    let mut buf: Vec<u8> = Vec::new();
    let cap = u64::try_from(max_line).unwrap_or(u64::MAX).saturating_add(1);

    info!("Stdio transport loop started, waiting for input");

    loop {
        buf.clear();

        let bytes_read = (&mut reader).take(cap).read_until(b'\n', &mut buf).await?;
        if bytes_read == 0 {
            // EOF: the client closed the channel
            info!("Stdin closed, shutting down");
            break;
        }

        if buf.len() > max_line && buf.last() != Some(&b'\n') {
            discard_line(&mut reader).await?;
            warn!("Message exceeds {max_line} byte limit");
            let err = JsonRpcErrorResponse::new(
                serde_json::Value::Null,
                errors::PARSE_ERROR,
                format!("Message exceeds {max_line} byte size limit"),
            );
            write_response(writer, &serde_json::to_value(&err)?).await?;
            continue;
        }

        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line,
            Err(e) => {
                warn!("Request is not valid UTF-8: {e}");
                let err = JsonRpcErrorResponse::new(
                    serde_json::Value::Null,
                    errors::PARSE_ERROR,
                    "Parse error: request is not valid UTF-8",
                );
                write_response(writer, &serde_json::to_value(&err)?).await?;
                continue;
            }
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        // Requests may carry file content and passwords; log the size only.
        debug!("Received {} bytes", trimmed.len());

        let request: JsonRpcRequest = match serde_json::from_str(trimmed) {
            Ok(r) => r,
            Err(e) => {
                warn!("Failed to parse JSON-RPC request: {e}");
                let err = JsonRpcErrorResponse::new(
                    serde_json::Value::Null,
                    errors::PARSE_ERROR,
                    format!("Parse error: {e}"),
                );
                write_response(writer, &serde_json::to_value(&err)?).await?;
                continue;
            }
        };

        if request.jsonrpc != "2.0" {
            let err = JsonRpcErrorResponse::new(
                request.id,
                errors::INVALID_REQUEST,
                "Invalid JSON-RPC version (must be \"2.0\")",
            );
            write_response(writer, &serde_json::to_value(&err)?).await?;
            continue;
        }

        let response_json = dispatcher.dispatch(request).await.to_json()?;
        write_response(writer, &response_json).await?;
    }

    Ok(())
}

/// Skip the rest of the current line without keeping it in memory.
async fn discard_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> std::io::Result<()> {
    loop {
        let (consumed, found) = {
            let available = reader.fill_buf().await?;
            if available.is_empty() {
                return Ok(());
            }
            match available.iter().position(|b| *b == b'\n') {
                Some(idx) => (idx + 1, true),
                None => (available.len(), false),
            }
        };
        reader.consume(consumed);
        if found {
            return Ok(());
        }
    }
}

/// Write a JSON value as an NDJSON line to the writer.
async fn write_response<W: AsyncWriteExt + Unpin>(
    writer: &mut W,
    value: &serde_json::Value,
) -> anyhow::Result<()> {
    let mut line = serde_json::to_string(value)?;
    line.push('\n');
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}
