// SPDX-FileCopyrightText: 2023 Marshall Wace <opensource@mwam.com>
// SPDX-License-Identifier: Apache-2.0
// SPDX-FileContributor: Tim Kendrick <t.kendrick@mwam.com> https://github.com/timkendrickmw
// SPDX-FileContributor: Jordan Hall <j.hall@mwam.com> https://github.com/j-hall-mwam
use std::str::FromStr;

use http::{header::HeaderName, HeaderValue};
use metrics::{describe_counter, increment_counter, Unit};
use tracing::{debug, warn};
use webscript::{
    error::ERROR_CODE_HTTP,
    function::{uuid, Uuid},
    ApplicationTerm, ArgType, Arity, Bindings, Computer, ErrorInfo, Evaluation, Function,
    FunctionArity, FunctionError, Symbol, Term,
};

use crate::utils::fetch::{FetchRequest, HttpClient};

#[derive(Clone, Copy, Debug)]
pub struct HttpGetMetricNames {
    pub http_request_count: &'static str,
    pub http_error_count: &'static str,
}
impl HttpGetMetricNames {
    fn init(self) -> Self {
        describe_counter!(
            self.http_request_count,
            Unit::Count,
            "Total HTTP GET request count"
        );
        describe_counter!(
            self.http_error_count,
            Unit::Count,
            "Total failed HTTP GET request count"
        );
        self
    }
}
impl Default for HttpGetMetricNames {
    fn default() -> Self {
        Self {
            http_request_count: "webscript_http_request_count",
            http_error_count: "webscript_http_error_count",
        }
    }
}

const HTTP_GET_ARITY: FunctionArity<1, 0> = FunctionArity {
    required: [ArgType::Strict],
    optional: [],
    variadic: None,
};

/// Fetches a URL and returns the response body as a string.
///
/// Accepts a single options map: `{:url "http://..." :headers {"Accept" "text/plain"}}`. Transport
/// failures and non-success responses are returned as `HttpError` values.
pub struct HttpGet<TClient: HttpClient> {
    client: TClient,
    metric_names: HttpGetMetricNames,
}
impl<TClient: HttpClient> HttpGet<TClient> {
    pub const UUID: Uuid = uuid!("0d6f5e3a-8b1c-4f27-9e44-7a2c5b9d1e60");
    pub fn new(client: TClient, metric_names: HttpGetMetricNames) -> Self {
        Self {
            client,
            metric_names: metric_names.init(),
        }
    }
    fn fetch(&self, request: FetchRequest) -> Result<Term, ErrorInfo> {
        debug!(url = %request.url, "HTTP GET");
        increment_counter!(self.metric_names.http_request_count);
        let result = match self.client.fetch(request.clone()) {
            Err(err) => Err(format!("{}", err)),
            Ok(response) if !response.status.is_success() => Err(format!(
                "HTTP request {} failed with status {}",
                request.url, response.status
            )),
            Ok(response) => String::from_utf8(response.body.to_vec())
                .map(Term::String)
                .map_err(|_| format!("Invalid UTF-8 response body from {}", request.url)),
        };
        result.map_err(|message| {
            warn!(url = %request.url, error = %message, "HTTP GET failed");
            increment_counter!(self.metric_names.http_error_count);
            ErrorInfo::new(ERROR_CODE_HTTP, message)
        })
    }
}
impl<TClient: HttpClient> Function for HttpGet<TClient> {
    fn uid(&self) -> Uuid {
        Self::UUID
    }
    fn symbol(&self) -> Symbol {
        Symbol::parse("sys.net.http/get")
    }
    fn arity(&self) -> Arity {
        Arity::from(&HTTP_GET_ARITY)
    }
    fn apply(
        &self,
        application: &ApplicationTerm,
        bindings: &Bindings,
        _computer: &Computer,
    ) -> Result<Evaluation, FunctionError> {
        let request = parse_request(application.arg(0).unwrap_or(&Term::Nil))?;
        let result = self.fetch(request)?;
        Ok(Evaluation::function_result(application, result, bindings))
    }
}

fn parse_request(options: &Term) -> Result<FetchRequest, ErrorInfo> {
    let options = options.as_map().ok_or_else(|| {
        ErrorInfo::invalid_arguments(format!(
            "Expected HTTP request options, received {}",
            options
        ))
    })?;
    let url = match options.get(&Term::keyword("url")) {
        Some(Term::String(url)) => Ok(url.clone()),
        Some(url) => Err(ErrorInfo::invalid_arguments(format!(
            "Expected String for :url, received {}",
            url
        ))),
        None => Err(ErrorInfo::invalid_arguments(
            "HTTP request options must include :url",
        )),
    }?;
    let headers = match options.get(&Term::keyword("headers")) {
        None | Some(Term::Nil) => Ok(Vec::new()),
        Some(Term::Map(headers)) => headers
            .iter()
            .map(|(key, value)| parse_header(key, value))
            .collect(),
        Some(headers) => Err(ErrorInfo::invalid_arguments(format!(
            "Expected Map for :headers, received {}",
            headers
        ))),
    }?;
    Ok(FetchRequest::get(url, headers))
}

fn parse_header(key: &Term, value: &Term) -> Result<(HeaderName, HeaderValue), ErrorInfo> {
    let key = header_text(key);
    let value = header_text(value);
    let name = HeaderName::from_str(&key)
        .map_err(|_| ErrorInfo::invalid_arguments(format!("Invalid HTTP header name: {}", key)))?;
    let value = HeaderValue::from_str(&value).map_err(|_| {
        ErrorInfo::invalid_arguments(format!("Invalid value for HTTP header {}: {}", key, value))
    })?;
    Ok((name, value))
}

fn header_text(value: &Term) -> String {
    match value {
        Term::String(value) => value.clone(),
        Term::Keyword(value) => value.qualified_name(),
        value => value.to_text(),
    }
}
