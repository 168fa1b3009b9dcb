// Copyright 2025 Courier Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use http::StatusCode;

use courier_core::error::Result;
use courier_core::request::{Options, Request, Response};
use courier_core::transport::Transport;

use crate::sink::{
    MetricsSink, CALL_TIMER, LABEL_HTTP_STATUS, LABEL_OPERATION, LABEL_STATUS_GROUP, LABEL_TARGET,
    STATUS_COUNTER,
};

/// Decorates a [`Transport`] with metrics capture.
///
/// Every call attempt records one latency sample under the call's
/// operation/target labels, whatever the outcome. Calls that complete with a
/// status (a response of any status, or a coded failure) additionally
/// increment the status counter with `http_status` and `status_group` labels.
/// Uncoded transport failures record no counter. The request, response, and
/// failure content pass through untouched.
pub struct MeteredTransport {
    inner: Arc<dyn Transport>,
    sink: Arc<dyn MetricsSink>,
}

impl MeteredTransport {
    pub fn new(inner: Arc<dyn Transport>, sink: Arc<dyn MetricsSink>) -> Self {
        Self { inner, sink }
    }
}

#[async_trait]
impl Transport for MeteredTransport {
    async fn execute(&self, request: &Request, options: &Options) -> Result<Response> {
        let descriptor = request.descriptor();
        let start = Instant::now();

        let result = self.inner.execute(request, options).await;

        let base_labels = [
            (LABEL_OPERATION, descriptor.operation.as_str()),
            (LABEL_TARGET, descriptor.target.as_str()),
        ];
        self.sink
            .record_timer(CALL_TIMER, &base_labels, start.elapsed());

        let status = match &result {
            Ok(response) => Some(response.status()),
            Err(error) => error.status(),
        };
        if let Some(status) = status {
            self.record_status(&base_labels, status);
        }

        result
    }
}

impl MeteredTransport {
    fn record_status(&self, base_labels: &[(&str, &str); 2], status: StatusCode) {
        let code = status.as_u16().to_string();
        let group = format!("{}xx", status.as_u16() / 100);
        let labels = [
            base_labels[0],
            base_labels[1],
            (LABEL_HTTP_STATUS, code.as_str()),
            (LABEL_STATUS_GROUP, group.as_str()),
        ];
        self.sink.increment_counter(STATUS_COUNTER, &labels);
    }
}
