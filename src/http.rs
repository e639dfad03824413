//! HTTP Transport Module
//!
//! Thin blocking client used by every fetcher. Components talk to the
//! [`HttpClient`] trait so tests can drive them without the network.

use std::time::Duration;

use serde_json::Value;

use crate::error::FetchError;

/// Browser-like agent; the filings API blocks unknown clients
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; NJSchoolTracker/1.0)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
}

/// A single outgoing request
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
}

impl Request {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn header(mut self, key: &str, value: &str) -> Self {
        self.headers.push((key.to_string(), value.to_string()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Value of a query parameter, if it was set
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

pub trait HttpClient {
    /// GET and decode a JSON body. Non-2xx responses are errors.
    fn get_json(&self, request: &Request) -> Result<Value, FetchError>;

    /// GET a binary body. Non-2xx responses are errors.
    fn get_bytes(&self, request: &Request) -> Result<Vec<u8>, FetchError>;

    /// Issue the request and report the status code without judging it.
    fn status(&self, method: Method, request: &Request) -> Result<u16, FetchError>;
}

/// `reqwest` backed client
#[derive(Debug, Clone)]
pub struct BlockingClient {
    inner: reqwest::blocking::Client,
}

impl BlockingClient {
    pub fn new(user_agent: &str) -> Result<Self, FetchError> {
        let inner = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;
        Ok(Self { inner })
    }

    fn build(&self, method: Method, request: &Request) -> reqwest::blocking::RequestBuilder {
        let mut builder = match method {
            Method::Get => self.inner.get(&request.url),
            Method::Head => self.inner.head(&request.url),
        };
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        builder.timeout(request.timeout)
    }

    fn send_ok(&self, request: &Request) -> Result<reqwest::blocking::Response, FetchError> {
        let response = self.build(Method::Get, request).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(response)
    }
}

impl HttpClient for BlockingClient {
    fn get_json(&self, request: &Request) -> Result<Value, FetchError> {
        let body = self.send_ok(request)?.text()?;
        Ok(serde_json::from_str(&body)?)
    }

    fn get_bytes(&self, request: &Request) -> Result<Vec<u8>, FetchError> {
        let bytes = self.send_ok(request)?.bytes()?;
        Ok(bytes.to_vec())
    }

    fn status(&self, method: Method, request: &Request) -> Result<u16, FetchError> {
        let response = self.build(method, request).send()?;
        Ok(response.status().as_u16())
    }
}
