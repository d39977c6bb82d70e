//! Newline-delimited JSON-RPC over stdin/stdout
//!
//! One message (or batch) per line. Responses are written as single lines and
//! flushed immediately; notifications produce no output.

use std::io;

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{info, warn};

use crate::mcp::rpc::json_rpc_error;
use crate::mcp::server::handle_json_rpc_payload;
use crate::AppState;

pub async fn serve_stdio(state: AppState) -> io::Result<()> {
    info!("mcp stdio transport ready");
    serve_lines(&state, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await
}

/// Serves until the reader reaches EOF.
///
/// Lines are read as raw bytes, so a line that is not UTF-8 gets a parse error
/// reply instead of ending the loop.
pub async fn serve_lines<R, W>(state: &AppState, mut reader: R, mut writer: W) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line = Vec::new();

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            break;
        }

        let trimmed = line.trim_ascii();
        if trimmed.is_empty() {
            continue;
        }

        let response = match serde_json::from_slice::<Value>(trimmed) {
            Ok(payload) => handle_json_rpc_payload(state, payload).await,
            Err(err) => {
                warn!(error = %err, "discarding unparseable stdio message");
                Some(json_rpc_error(None, -32700, "Parse error"))
            }
        };

        if let Some(response) = response {
            let mut encoded =
                serde_json::to_vec(&response).expect("jsonrpc response serialization");
            encoded.push(b'\n');
            writer.write_all(&encoded).await?;
            writer.flush().await?;
        }
    }

    info!("mcp stdio input closed");
    Ok(())
}
