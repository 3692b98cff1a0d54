// Dweve Logbench - Log Analytics Benchmark Harness
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! End-to-end aggregation, sampling and trial tests.

use logbench_core::{LogbenchError, StatusCode};
use logbench_harness::{
    classify_file, merge_partials, Engine, FailurePolicy, HarnessConfig, HarnessRunner,
    ParallelEngine, ResourceSampler, RunStatus, SerialEngine, StatusAggregator,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

fn write_codes(dir: &Path, name: &str, codes: &[(u16, usize)]) -> PathBuf {
    let mut body = String::new();
    let mut ts = 0u64;
    for &(code, times) in codes {
        for _ in 0..times {
            body.push_str(&format!(
                "{{\"service\":\"payments\",\"timestamp\":{}.25,\"message\":\"HTTP Status Code: {}\"}}\n",
                ts, code
            ));
            ts += 1;
        }
    }
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    path
}

fn code(v: u16) -> StatusCode {
    StatusCode::new(v).unwrap()
}

#[test]
fn disjoint_files_merge_regardless_of_order() {
    let dir = TempDir::new().unwrap();
    let a = write_codes(dir.path(), "a.json", &[(200, 10)]);
    let b = write_codes(dir.path(), "b.json", &[(200, 5), (500, 1)]);

    let pa = classify_file(&a).unwrap();
    let pb = classify_file(&b).unwrap();
    let (ab, _) = merge_partials([&pa, &pb]);
    let (ba, _) = merge_partials([&pb, &pa]);
    assert_eq!(ab, ba);
    assert_eq!(ab.get(code(200)), 15);
    assert_eq!(ab.get(code(500)), 1);
    assert_eq!(ab.len(), 2);

    let aggregator = StatusAggregator::new(Some(2), FailurePolicy::Abort).unwrap();
    let report = aggregator.aggregate(&[b, a]).unwrap();
    assert_eq!(report.counts, ab);
    assert_eq!(report.counts.to_literal(), "{'200': 15, '500': 1}");
}

#[test]
fn conservation_across_many_files() {
    let dir = TempDir::new().unwrap();
    let mut expected = 0u64;
    for i in 0..12 {
        let n = i + 1;
        write_codes(
            dir.path(),
            &format!("part-{:05}.json", i),
            &[(200, n), (404, i % 3), (503, 1)],
        );
        expected += (n + i % 3 + 1) as u64;
    }

    for workers in [1, 3, 8] {
        let aggregator = StatusAggregator::new(Some(workers), FailurePolicy::Abort).unwrap();
        let report = aggregator.aggregate_dir(dir.path()).unwrap();
        assert_eq!(report.counts.total(), expected);
        assert_eq!(report.tally.matched, expected);
        assert_eq!(report.files, 12);
    }
}

#[test]
fn sampler_one_second_at_half_second_interval() {
    let (_, summary) = ResourceSampler::measure(Duration::from_millis(500), || {
        std::thread::sleep(Duration::from_secs(1));
    })
    .unwrap();

    assert!(
        (1..=3).contains(&summary.sample_count),
        "unexpected sample count {}",
        summary.sample_count
    );
    assert!(summary.rss_mb_max() >= 0.0);
    assert!(summary.cpu_percent_avg >= 0.0);
}

#[test]
fn trial_over_engines_appends_history() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("data");
    fs::create_dir(&data).unwrap();
    write_codes(&data, "a.json", &[(200, 3), (404, 2)]);

    let config = HarnessConfig::default()
        .with_results_dir(dir.path().join("results"))
        .with_sample_interval(Duration::from_millis(10))
        .with_workers(2);
    let runner = HarnessRunner::new("reference", config.clone()).unwrap();

    let engines: Vec<Box<dyn Engine>> = vec![
        Box::new(ParallelEngine::from_config(&config).unwrap()),
        Box::new(SerialEngine),
    ];
    for engine in &engines {
        let trial = runner.run_engine(engine.as_ref(), &data).unwrap();
        assert_eq!(trial.output.counts.to_literal(), "{'200': 3, '404': 2}");
        assert_eq!(trial.output.tally.records, 5);
    }

    let missing = dir.path().join("missing");
    let err = runner.run_engine(&SerialEngine, &missing).unwrap_err();
    assert!(matches!(err, LogbenchError::Input { .. }));

    let records = runner.history().load().unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.status == RunStatus::Ok));
    assert!(records.iter().all(|r| !r.dataset.ends_with("missing")));

    let err = runner
        .run_trial::<(), _>("crashing", || Err(LogbenchError::workload("engine exited")))
        .unwrap_err();
    assert_eq!(err, LogbenchError::workload("engine exited"));
    let records = runner.history().load().unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[2].status, RunStatus::Failed);
    assert_eq!(records[2].dataset, "crashing");
}
