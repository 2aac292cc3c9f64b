//! Newline-delimited JSON request loop over stdio or TCP.
//!
//! Each line is one request `{"id", "method", "params"}`. Each answer is one
//! line, `{"id", "result"}` on success or `{"id", "error": {"kind", "message"}}`.
//! A bad line gets an error answer and the loop keeps reading.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread::JoinHandle;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;
use crate::provider::Provider;

/// One decoded request line.
#[derive(Debug, Deserialize)]
struct Request {
    /// Echoed back unchanged, `null` when absent.
    #[serde(default)]
    id: Value,
    /// Method name.
    method: String,
    /// Method parameters, `null` when absent.
    #[serde(default)]
    params: Value,
}

/// Error half of a response.
#[derive(Debug, Serialize)]
struct WireError {
    /// Machine-readable error kind.
    kind: &'static str,
    /// Human-readable message.
    message: String,
}

/// One encoded response line.
#[derive(Debug, Serialize)]
struct Response {
    /// Present on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<WireError>,
    /// Id of the request answered.
    id: Value,
    /// Present on success, possibly `null`.
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
}

impl Response {
    /// Response carrying `outcome`.
    fn new(id: Value, outcome: Result<Value, Error>) -> Self {
        return match outcome {
            Ok(result) => Self { error: None, id, result: Some(result) },
            Err(e) => Self { error: Some(WireError { kind: e.kind(), message: e.to_string() }), id, result: None },
        };
    }
}

/// Answer one request line. Bytes that are not UTF-8 fail decoding like any
/// other malformed line.
fn handle_line(provider: &Provider, line: &[u8]) -> Response {
    let request: Request = match serde_json::from_slice(line) {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(error = %e, "undecodable request");
            return Response::new(Value::Null, Err(Error::Json(e)));
        }
    };
    let outcome = provider.call(&request.method, &request.params);
    return Response::new(request.id, outcome);
}

/// Serve requests from `reader` until it ends, writing answers to `writer`.
///
/// # Errors
///
/// Returns `Error::Io` if reading or writing the stream fails, or
/// `Error::Json` if a response cannot be encoded.
pub fn serve_stream<R: BufRead, W: Write>(provider: &Provider, mut reader: R, mut writer: W) -> Result<(), Error> {
    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            return Ok(());
        }
        if line.trim_ascii().is_empty() {
            continue;
        }
        let response = handle_line(provider, &line);
        serde_json::to_writer(&mut writer, &response)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
    }
}

/// Serve requests on stdin, answering on stdout.
///
/// # Errors
///
/// See `serve_stream`.
pub fn serve_stdio(provider: &Provider) -> Result<(), Error> {
    tracing::info!("serving on stdio");
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    return serve_stream(provider, stdin.lock(), stdout.lock());
}

/// Listen on `127.0.0.1:port`, one thread per connection. Port `0` picks a
/// free port. The bound port is printed on stdout before accepting.
///
/// # Errors
///
/// Returns `Error::Io` if binding fails. A failed accept is logged and the
/// listener keeps going.
pub fn serve_tcp(provider: Provider, port: u16) -> Result<(), Error> {
    let listener = TcpListener::bind(("127.0.0.1", port))?;
    let bound = listener.local_addr()?.port();
    println!("{bound}");
    std::io::stdout().flush()?;
    tracing::info!(port = bound, "serving on tcp");

    let provider = Arc::new(provider);
    for stream in listener.incoming() {
        let _client = spawn_client(&provider, stream);
    }
    return Ok(());
}

/// Serve one accepted connection on its own thread. A failed accept is
/// logged and yields `None`.
fn spawn_client(provider: &Arc<Provider>, accepted: std::io::Result<TcpStream>) -> Option<JoinHandle<()>> {
    let stream = match accepted {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, "accept failed");
            return None;
        }
    };
    let peer = stream.peer_addr().map(|a| return a.to_string()).unwrap_or_default();
    let provider = Arc::clone(provider);
    return Some(std::thread::spawn(move || {
        tracing::debug!(%peer, "client connected");
        let outcome = stream
            .try_clone()
            .map_err(Error::Io)
            .and_then(|read_half| return serve_stream(&provider, BufReader::new(read_half), stream));
        match outcome {
            Ok(()) => tracing::debug!(%peer, "client disconnected"),
            Err(e) => tracing::warn!(%peer, error = %e, "connection failed"),
        }
    }));
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead as _, BufReader, Cursor, ErrorKind, Write as _};
    use std::net::{TcpListener, TcpStream};
    use std::sync::Arc;

    use serde_json::{Value, json};

    use super::{serve_stream, spawn_client};
    use crate::config::Config;
    use crate::provider::Provider;

    fn run(input: impl AsRef<[u8]>) -> Vec<Value> {
        let provider = Provider::new(Config::default(), None);
        let mut out = Vec::new();
        serve_stream(&provider, Cursor::new(input.as_ref().to_vec()), &mut out).unwrap();
        return String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| return serde_json::from_str(l).unwrap())
            .collect();
    }

    #[test]
    fn answers_each_line_in_order() {
        let input = concat!(
            r#"{"id": 1, "method": "echo", "params": {"echo": "hi"}}"#,
            "\n\n",
            r#"{"id": "b", "method": "version"}"#,
            "\n",
        );
        let responses = run(input);
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0], json!({"id": 1, "result": "hi"}));
        assert_eq!(responses[1]["id"], "b");
        assert_eq!(responses[1]["result"], env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn bad_lines_get_errors_and_the_loop_continues() {
        let input = concat!(
            "not json\n",
            r#"{"id": 2, "method": "add_provider", "params": {}}"#,
            "\n",
            r#"{"id": 3, "method": "get_current", "params": {"source": "x = 1", "row": 1, "column": 5}}"#,
            "\n",
        );
        let responses = run(input);
        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0]["id"], Value::Null);
        assert_eq!(responses[0]["error"]["kind"], "json");
        assert_eq!(responses[1]["error"]["kind"], "unknown_method");
        assert_eq!(responses[2]["result"]["type_tag"], "integer");
        assert!(responses[2].get("error").is_none());
    }

    #[test]
    fn invalid_utf8_line_is_answered_and_skipped() {
        let mut input = b"{\"id\": 1, \"method\": \"version\"}\n".to_vec();
        input.extend_from_slice(b"\xff\xfe garbage\n");
        input.extend_from_slice(b"{\"id\": 3, \"method\": \"version\"}\n");

        let responses = run(input);
        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0]["result"], env!("CARGO_PKG_VERSION"));
        assert_eq!(responses[1]["id"], Value::Null);
        assert_eq!(responses[1]["error"]["kind"], "json");
        assert_eq!(responses[2]["id"], 3);
        assert_eq!(responses[2]["result"], env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn null_result_is_kept() {
        let responses = run("{\"id\": 4, \"method\": \"echo\", \"params\": {\"echo\": null}}\n");
        assert_eq!(responses[0], json!({"id": 4, "result": null}));
    }

    #[test]
    fn parse_errors_are_reported() {
        let responses = run("{\"id\": 5, \"method\": \"analyze\", \"params\": {\"source\": \"def (:\"}}\n");
        assert_eq!(responses[0]["error"]["kind"], "parse_failed");
    }

    #[test]
    fn failed_accept_does_not_stop_later_clients() {
        let provider = Arc::new(Provider::new(Config::default(), None));
        let aborted = std::io::Error::from(ErrorKind::ConnectionAborted);
        assert!(spawn_client(&provider, Err(aborted)).is_none());

        let listener = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let mut client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (server_side, _) = listener.accept().unwrap();
        let worker = spawn_client(&provider, Ok(server_side)).unwrap();

        writeln!(client, r#"{{"id": 9, "method": "echo", "params": {{"echo": "still up"}}}}"#).unwrap();
        let mut line = String::new();
        BufReader::new(client.try_clone().unwrap()).read_line(&mut line).unwrap();
        assert_eq!(serde_json::from_str::<Value>(&line).unwrap(), json!({"id": 9, "result": "still up"}));

        drop(client);
        worker.join().unwrap();
    }
}
