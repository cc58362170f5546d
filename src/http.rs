//! Wire-level http types: requests, responses, statuses

use std::collections::HashMap;
use std::string::FromUtf8Error;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use strum_macros::{Display, EnumString};
use tokio::io::{self, AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use url::Url;

macro_rules! define_status {
    ($($name:ident = ($code:expr, $desc:expr)),*) => {
        #[derive(Debug, Clone, Copy, PartialEq)]
        pub enum HttpStatus {
            $(
                $name,
            )*
        }

        impl HttpStatus {
            pub fn code(&self) -> u16 {
                match *self {
                    $(
                        HttpStatus::$name => $code,
                    )*
                }
            }

            pub fn description(&self) -> &'static str {
                match *self {
                    $(
                        HttpStatus::$name => $desc,
                    )*
                }
            }
        }
    }
}

define_status! {
    // 2xx Success
    Ok = (200, "OK"),
    NoContent = (204, "No Content"),

    // 3xx Redirection
    MovedPermanently = (301, "Moved Permanently"),
    Found = (302, "Found"),
    NotModified = (304, "Not Modified"),

    // 4xx Client Errors
    BadRequest = (400, "Bad Request"),
    Forbidden = (403, "Forbidden"),
    NotFound = (404, "Not Found"),
    MethodNotAllowed = (405, "Method Not Allowed"),
    PayloadTooLarge = (413, "Payload Too Large"),

    // 5xx Server Errors
    InternalServerError = (500, "Internal Server Error"),
    NotImplemented = (501, "Not Implemented"),
    ServiceUnavailable = (503, "Service Unavailable")
}

#[async_trait]
pub trait AsyncTryFrom<T>: Sized {
    type Error;

    async fn try_from(value: T) -> Result<Self, Self::Error>;
}

const HTTP_VERSION: &str = "HTTP/1.1";

#[derive(Default, Debug, Clone, Copy, EnumString, Display, Eq, PartialEq, Hash)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Head,
    Post,
    Put,
    Delete,
    Connect,
    Options,
    Trace,
    Patch,
}

#[derive(Debug)]
pub struct Request {
    method: Method,
    uri: String,
    version: String,
    headers: HashMap<String, String>,
    body: Vec<u8>,
    received_at: DateTime<Local>,
}

impl Request {
    pub fn new(method: Method, uri: String, version: String) -> Self {
        Self {
            method,
            uri,
            version,
            headers: HashMap::new(),
            body: Vec::new(),
            received_at: Local::now(),
        }
    }

    /// Return request method
    pub fn method(&self) -> Method {
        self.method
    }

    /// Raw request target as it appeared on the request line, query included
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Moment the request line was read off the socket
    pub fn received_at(&self) -> DateTime<Local> {
        self.received_at
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn body_string(&self) -> Result<String, FromUtf8Error> {
        String::from_utf8(self.body.to_vec())
    }

    /// Full request url; falls back to a `localhost` authority when the
    /// client sent no `Host` header so the parse cannot fail on the host part.
    pub fn url(&self) -> Url {
        let host = self.header("host").unwrap_or("localhost");
        Url::parse(&format!("http://{host}{}", self.uri))
            .unwrap_or_else(|_| Url::parse("http://localhost/").unwrap())
    }

    /// Url path with the query string stripped
    pub fn path(&self) -> String {
        self.url().path().to_string()
    }
}

fn invalid_request(msg: &'static str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send + 'static> AsyncTryFrom<BufReader<R>> for Request {
    type Error = io::Error;

    async fn try_from(value: BufReader<R>) -> Result<Self, Self::Error> {
        let mut lines = value.lines();

        let first_line = lines
            .next_line()
            .await?
            .ok_or_else(|| invalid_request("empty request"))?;
        let mut parts = first_line.split_whitespace();

        let verb = parts
            .next()
            .ok_or_else(|| invalid_request("missing verb"))?
            .to_uppercase()
            .parse::<Method>()
            .map_err(|_| invalid_request("unknown method"))?;
        let uri = parts
            .next()
            .ok_or_else(|| invalid_request("missing path"))?
            .to_string();
        let protocol = parts
            .next()
            .ok_or_else(|| invalid_request("missing protocol"))?
            .to_lowercase();

        let mut request = Request::new(verb, uri, protocol);

        while let Some(line) = lines.next_line().await? {
            if line.is_empty() {
                break;
            }

            if let Some((key, value)) = line.split_once(": ") {
                request.headers.insert(key.to_lowercase(), value.into());
            }
        }

        if let Some(len) = request.headers.get("content-length") {
            let len = len.parse().unwrap_or(0usize);
            request.body.resize(len, 0);

            lines.get_mut().read_exact(&mut request.body).await?;
        }

        Ok(request)
    }
}

#[derive(Debug)]
pub struct Response {
    status: HttpStatus,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

impl Response {
    pub fn new(status: HttpStatus) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    pub fn not_found() -> Self {
        Self::new(HttpStatus::NotFound)
    }

    pub fn html(body: &str) -> Self {
        let mut response = Self::new(HttpStatus::Ok);
        response.add_header(("Content-Type", "text/html; charset=utf-8"));
        response.add_body(body.as_bytes());

        response
    }

    pub fn json(value: &serde_json::Value) -> Self {
        let mut response = Self::new(HttpStatus::Ok);
        response.add_header(("Content-Type", "application/json"));
        response.add_body(value.to_string().as_bytes());

        response
    }

    pub fn status(&self) -> HttpStatus {
        self.status
    }

    pub fn add_header(&mut self, (k, value): (&str, &str)) {
        self.headers.insert(k.to_lowercase(), value.to_string());
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn add_body(&mut self, body: &[u8]) {
        self.body = body.to_vec();
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn as_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();

        let status_line = format!(
            "{} {} {}\r\n",
            HTTP_VERSION,
            self.status.code(),
            self.status.description()
        );
        bytes.extend_from_slice(status_line.as_bytes());

        for (k, v) in &self.headers {
            let line = format!("{k}: {v}\r\n");
            bytes.extend_from_slice(line.as_bytes());
        }

        let len_line = format!("Content-Length: {}\r\n\r\n", self.body.len());
        bytes.extend_from_slice(len_line.as_bytes());

        bytes.extend_from_slice(&self.body);

        bytes
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    async fn parse(raw: &str) -> Result<Request, io::Error> {
        let reader = BufReader::new(Cursor::new(raw.as_bytes().to_vec()));
        AsyncTryFrom::try_from(reader).await
    }

    #[test]
    fn test_method_parse_and_display() {
        assert_eq!("GET".parse::<Method>().unwrap(), Method::Get);
        assert_eq!("POST".parse::<Method>().unwrap(), Method::Post);
        assert_eq!(Method::Delete.to_string(), "DELETE");
        assert!("FETCH".parse::<Method>().is_err());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(HttpStatus::Ok.code(), 200);
        assert_eq!(HttpStatus::NotFound.code(), 404);
        assert_eq!(
            HttpStatus::InternalServerError.description(),
            "Internal Server Error"
        );
    }

    #[tokio::test]
    async fn test_parse_request_line_and_headers() {
        let request = parse("GET /about?tab=1 HTTP/1.1\r\nHost: example.com\r\n\r\n")
            .await
            .unwrap();

        assert_eq!(request.method(), Method::Get);
        assert_eq!(request.uri(), "/about?tab=1");
        assert_eq!(request.path(), "/about");
        assert_eq!(request.header("host"), Some("example.com"));
    }

    #[tokio::test]
    async fn test_parse_request_with_body() {
        let request = parse("POST /bad HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello")
            .await
            .unwrap();

        assert_eq!(request.method(), Method::Post);
        assert_eq!(request.body_string().unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_parse_rejects_garbage() {
        assert!(parse("").await.is_err());
        assert!(parse("FETCH / HTTP/1.1\r\n\r\n").await.is_err());
        assert!(parse("GET\r\n\r\n").await.is_err());
    }

    #[test]
    fn test_path_without_host_header() {
        let request = Request::new(Method::Get, "/help.html".into(), "http/1.1".into());
        assert_eq!(request.path(), "/help.html");
    }

    #[test]
    fn test_response_as_bytes() {
        let mut response = Response::new(HttpStatus::Ok);
        response.add_header(("Content-Type", "text/plain"));
        response.add_body(b"hi");

        let raw = String::from_utf8(response.as_bytes()).unwrap();
        assert!(raw.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(raw.contains("content-type: text/plain\r\n"));
        assert!(raw.contains("Content-Length: 2\r\n\r\nhi"));
    }

    #[test]
    fn test_json_response() {
        let response = Response::json(&serde_json::json!({"a": 1}));
        assert_eq!(response.status(), HttpStatus::Ok);
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(response.body(), br#"{"a":1}"#);
    }
}
