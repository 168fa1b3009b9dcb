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

use serde::{Deserialize, Serialize};

/// One counter series at snapshot time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterSample {
    pub name: String,
    pub labels: Vec<(String, String)>,
    pub value: u64,
}

/// One timer series at snapshot time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerSample {
    pub name: String,
    pub labels: Vec<(String, String)>,
    pub count: u64,
    pub total_us: u64,
    pub mean_us: u64,
    pub max_us: u64,
}

/// Complete, serializable view of a registry's series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub uptime_ms: u64,
    pub counters: Vec<CounterSample>,
    pub timers: Vec<TimerSample>,
}
