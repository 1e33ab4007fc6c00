// SPDX-FileCopyrightText: 2023 Marshall Wace <opensource@mwam.com>
// SPDX-License-Identifier: Apache-2.0
// SPDX-FileContributor: Tim Kendrick <t.kendrick@mwam.com> https://github.com/timkendrickmw
// SPDX-FileContributor: Chris Campbell <c.campbell@mwam.com> https://github.com/c-campbell-mwam
use std::sync::Arc;

use webscript::Function;

pub mod stdlib;
pub mod utils;

pub use stdlib::{HttpGet, HttpGetMetricNames, ScriptContext, ScriptError, ScriptEval, ScriptHost};
pub use utils::fetch::{HttpClient, HyperHttpClient};

#[derive(Default, Clone, Copy, Debug)]
pub struct DefaultHandlersMetricNames {
    pub http_get: HttpGetMetricNames,
}

/// Built-ins that perform I/O on behalf of the evaluator
pub fn default_handlers(
    http_client: impl HttpClient + 'static,
    script_host: impl ScriptHost + 'static,
    metric_names: DefaultHandlersMetricNames,
) -> impl Iterator<Item = Arc<dyn Function>> {
    [
        Arc::new(HttpGet::new(http_client, metric_names.http_get)) as Arc<dyn Function>,
        Arc::new(ScriptEval::new(script_host)) as Arc<dyn Function>,
    ]
    .into_iter()
}
