//! `tiny_http`-backed portal HTTP service.
//!
//! `tiny_http` runs on both the host and ESP32 via `std::net`, so the same
//! adapter serves development and the device. Requests are drained with
//! `try_recv`, one per poll, to fit the portal's cooperative loop.

use std::io::Read;

use log::{debug, warn};
use tiny_http::{Header, Method, Response, Server};

use super::{PortalError, PortalHttp, PortalRequest, RouteHandler};

/// Largest form body the submit route will read.
const MAX_BODY_LEN: usize = 8 * 1024;

/// HTTP service adapter over [`tiny_http::Server`].
pub struct TinyHttpPortal {
    routes: Vec<(String, RouteHandler)>,
    catch_all: Option<RouteHandler>,
    server: Option<Server>,
}

impl TinyHttpPortal {
    /// Create an adapter with no routes and no listener.
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            catch_all: None,
            server: None,
        }
    }

    fn dispatch(&mut self, request: tiny_http::Request) {
        let mut exchange = HttpExchange::read_from(request);

        match self
            .routes
            .iter_mut()
            .find(|(path, _)| *path == exchange.path)
        {
            Some((_, handler)) => handler(&mut exchange),
            None => match self.catch_all.as_mut() {
                Some(handler) => handler(&mut exchange),
                None => debug!("no handler for {}", exchange.path),
            },
        }

        exchange.finish();
    }
}

impl Default for TinyHttpPortal {
    fn default() -> Self {
        Self::new()
    }
}

impl PortalHttp for TinyHttpPortal {
    fn register_route(&mut self, path: &str, handler: RouteHandler) -> Result<(), PortalError> {
        self.routes.push((path.to_string(), handler));
        Ok(())
    }

    fn register_catch_all(&mut self, handler: RouteHandler) -> Result<(), PortalError> {
        self.catch_all = Some(handler);
        Ok(())
    }

    fn start(&mut self, port: u16) -> Result<(), PortalError> {
        let addr = format!("0.0.0.0:{}", port);
        let server = Server::http(&addr).map_err(|e| {
            PortalError::HttpBind(std::io::Error::new(
                std::io::ErrorKind::AddrInUse,
                format!("{}", e),
            ))
        })?;
        self.server = Some(server);
        Ok(())
    }

    fn poll_once(&mut self) -> Result<(), PortalError> {
        let received = match self.server.as_ref() {
            Some(server) => server.try_recv().map_err(PortalError::Http)?,
            None => return Ok(()),
        };
        if let Some(request) = received {
            self.dispatch(request);
        }
        Ok(())
    }
}

/// One request/response cycle over a `tiny_http::Request`.
///
/// Parameters come from the query string and, for POSTs, from a bounded read
/// of the urlencoded body. The handler's response is buffered and sent when
/// the exchange finishes; send failures are logged, not fatal (the client
/// may simply have gone away).
struct HttpExchange {
    request: Option<tiny_http::Request>,
    path: String,
    params: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    response: Option<(u16, String, String)>,
}

impl HttpExchange {
    fn read_from(mut request: tiny_http::Request) -> Self {
        let (path, query) = split_path_query(request.url());
        let path = path.to_string();

        let mut params = Vec::new();
        if let Some(query) = query {
            parse_params(query, &mut params);
        }
        if *request.method() == Method::Post {
            let mut body = String::new();
            let mut reader = request.as_reader().take(MAX_BODY_LEN as u64);
            if reader.read_to_string(&mut body).is_ok() {
                parse_params(&body, &mut params);
            } else {
                debug!("discarding non-utf8 request body for {}", path);
            }
        }

        Self {
            request: Some(request),
            path,
            params,
            headers: Vec::new(),
            response: None,
        }
    }

    fn finish(mut self) {
        let Some(request) = self.request.take() else {
            return;
        };

        let (status, content_type, body) = self
            .response
            .take()
            .unwrap_or((404, "text/plain".to_string(), "Not Found".to_string()));

        let mut response = Response::from_string(body).with_status_code(status);
        match Header::from_bytes(&b"Content-Type"[..], content_type.as_bytes()) {
            Ok(header) => response.add_header(header),
            Err(()) => warn!("invalid content type '{}'", content_type),
        }
        for (name, value) in &self.headers {
            match Header::from_bytes(name.as_bytes(), value.as_bytes()) {
                Ok(header) => response.add_header(header),
                Err(()) => warn!("invalid response header '{}'", name),
            }
        }

        if let Err(e) = request.respond(response) {
            warn!("failed to send response: {}", e);
        }
    }
}

impl PortalRequest for HttpExchange {
    fn path(&self) -> &str {
        &self.path
    }

    fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn set_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }

    fn respond(&mut self, status: u16, content_type: &str, body: &str) {
        self.response = Some((status, content_type.to_string(), body.to_string()));
    }
}

/// Split a request URL into path and optional query string.
fn split_path_query(url: &str) -> (&str, Option<&str>) {
    match url.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (url, None),
    }
}

/// Parse `k=v&k2=v2` pairs, decoding `+` and percent escapes.
fn parse_params(raw: &str, out: &mut Vec<(String, String)>) {
    for pair in raw.split('&') {
        if pair.is_empty() {
            continue;
        }
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        out.push((percent_decode(key), percent_decode(value)));
    }
}

/// Decode application/x-www-form-urlencoded text.
///
/// Invalid escapes are kept literally rather than rejected; form values are
/// policy input, not protocol.
fn percent_decode(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' if i + 2 < bytes.len() => {
                let hi = (bytes[i + 1] as char).to_digit(16);
                let lo = (bytes[i + 2] as char).to_digit(16);
                match (hi, lo) {
                    (Some(hi), Some(lo)) => {
                        out.push((hi * 16 + lo) as u8);
                        i += 3;
                    }
                    _ => {
                        out.push(b'%');
                        i += 1;
                    }
                }
            }
            other => {
                out.push(other);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_path_query() {
        assert_eq!(split_path_query("/submit?a=1"), ("/submit", Some("a=1")));
        assert_eq!(split_path_query("/"), ("/", None));
        assert_eq!(split_path_query("/x?"), ("/x", Some("")));
    }

    #[test]
    fn test_percent_decode_plain() {
        assert_eq!(percent_decode("hello"), "hello");
    }

    #[test]
    fn test_percent_decode_escapes() {
        assert_eq!(percent_decode("a%20b"), "a b");
        assert_eq!(percent_decode("a+b"), "a b");
        assert_eq!(percent_decode("%2Fpath%3D"), "/path=");
    }

    #[test]
    fn test_percent_decode_invalid_escape_kept() {
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("%zz"), "%zz");
        assert_eq!(percent_decode("%4"), "%4");
    }

    #[test]
    fn test_parse_params_pairs() {
        let mut params = Vec::new();
        parse_params("ssid=Net+1&pass=p%40ss", &mut params);
        assert_eq!(
            params,
            vec![
                ("ssid".to_string(), "Net 1".to_string()),
                ("pass".to_string(), "p@ss".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_params_missing_value() {
        let mut params = Vec::new();
        parse_params("ssid=&pass&x=1", &mut params);
        assert_eq!(
            params,
            vec![
                ("ssid".to_string(), String::new()),
                ("pass".to_string(), String::new()),
                ("x".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn test_register_before_start() {
        let mut portal = TinyHttpPortal::new();
        portal
            .register_route("/", Box::new(|req| req.respond(200, "text/html", "ok")))
            .unwrap();
        portal
            .register_catch_all(Box::new(|req| req.respond(302, "text/html", "")))
            .unwrap();
        // Polling without a listener is a no-op, not an error.
        assert!(portal.poll_once().is_ok());
    }
}
