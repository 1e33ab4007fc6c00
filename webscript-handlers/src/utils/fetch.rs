// SPDX-FileCopyrightText: 2023 Marshall Wace <opensource@mwam.com>
// SPDX-License-Identifier: Apache-2.0
// SPDX-FileContributor: Tim Kendrick <t.kendrick@mwam.com> https://github.com/timkendrickmw
use std::str::FromStr;

use bytes::Bytes;
use futures::Future;
use http::{
    header::HeaderName, method::InvalidMethod, uri::InvalidUri, HeaderValue, Method, StatusCode,
};
use hyper::{client::HttpConnector, Body, Client, Request, Uri};
use hyper_tls::HttpsConnector;
use tokio::runtime::{self, Runtime};

#[derive(Eq, PartialEq, Hash, Clone, Debug)]
pub struct FetchRequest {
    pub url: String,
    pub method: String,
    pub headers: Vec<(HeaderName, HeaderValue)>,
    pub body: Option<Bytes>,
}
impl FetchRequest {
    pub fn get(url: impl Into<String>, headers: Vec<(HeaderName, HeaderValue)>) -> Self {
        Self {
            url: url.into(),
            method: String::from("GET"),
            headers,
            body: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct FetchResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

#[derive(Debug)]
pub enum FetchError {
    InvalidUri(InvalidUri, String),
    InvalidMethod(InvalidMethod, String),
    InvalidRequestBody(http::Error),
    NetworkError(hyper::Error),
    InvalidResponseBody(hyper::Error),
}
impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidUri(_, url) => write!(f, "Invalid HTTP URL: {}", url),
            Self::InvalidMethod(_, method) => write!(f, "Invalid HTTP method: {}", method),
            Self::InvalidRequestBody(err) => write!(f, "Invalid HTTP request body: {}", err),
            Self::NetworkError(err) => write!(f, "HTTP network error: {}", err),
            Self::InvalidResponseBody(err) => {
                write!(f, "Invalid HTTP response body: {}", err)
            }
        }
    }
}
impl std::error::Error for FetchError {}

/// Blocking HTTP transport used by the HTTP built-ins.
pub trait HttpClient: Send + Sync {
    fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, FetchError>;
}

/// [`HttpClient`] backed by a `hyper` client driven on a dedicated runtime.
///
/// Requests block the calling thread, so this must not be used from within an async context.
pub struct HyperHttpClient {
    client: Client<HttpsConnector<HttpConnector>, Body>,
    runtime: Runtime,
}
impl HyperHttpClient {
    pub fn new() -> Result<Self, std::io::Error> {
        let runtime = runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("webscript-http")
            .enable_all()
            .build()?;
        let client = {
            let _guard = runtime.enter();
            Client::builder().build::<_, Body>(HttpsConnector::new())
        };
        Ok(Self { client, runtime })
    }
}
impl HttpClient for HyperHttpClient {
    fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, FetchError> {
        let response = fetch(&self.client, &request)?;
        self.runtime.block_on(response)
    }
}

pub fn fetch<TConnect>(
    client: &Client<TConnect, Body>,
    request: &FetchRequest,
) -> Result<impl Future<Output = Result<FetchResponse, FetchError>>, FetchError>
where
    TConnect: hyper::client::connect::Connect + Clone + Send + Sync + 'static,
{
    let client = client.clone();
    let url = request
        .url
        .parse::<Uri>()
        .map_err(|err| FetchError::InvalidUri(err, request.url.clone()))?;
    let method = Method::from_str(request.method.as_str())
        .map_err(|err| FetchError::InvalidMethod(err, request.method.clone()))?;
    let http_request = Request::builder().method(method).uri(url);
    let http_request = request
        .headers
        .iter()
        .fold(http_request, |http_request, (key, value)| {
            http_request.header(key.clone(), value.clone())
        });
    let body = Body::from(request.body.clone().unwrap_or(Bytes::new()));
    let http_request = http_request
        .body(body)
        .map_err(FetchError::InvalidRequestBody)?;
    Ok(async move {
        let result = client
            .request(http_request)
            .await
            .map_err(FetchError::NetworkError)?;
        let status = result.status();
        let body = hyper::body::to_bytes(result.into_body())
            .await
            .map_err(FetchError::InvalidResponseBody)?;
        Ok(FetchResponse { status, body })
    })
}

#[cfg(test)]
mod tests {
    use super::{FetchError, FetchRequest, HttpClient, HyperHttpClient};

    #[test]
    fn invalid_urls() {
        let client = HyperHttpClient::new().unwrap();
        let result = client.fetch(FetchRequest::get("not a url", Vec::new()));
        assert!(matches!(result, Err(FetchError::InvalidUri(_, _))));
        assert_eq!(
            format!("{}", result.unwrap_err()),
            "Invalid HTTP URL: not a url"
        );
    }
}
