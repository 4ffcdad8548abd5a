use junit_report::{Duration, ReportBuilder, TestCaseBuilder, TestSuiteBuilder};
use num_format::{Locale, ToFormattedString};
use prettytable::{Cell, Row, Table};

use crate::sim;
use crate::test::{Outcome, TESTS};

pub struct ScenarioReport {
    pub name: String,
    pub outcome: Outcome,
    pub message: String,
    pub time_secs: f64,
    pub sim_time_ns: u64,
}

/// What a session leaves behind: one record per scenario, in run order.
pub struct SessionSummary(Vec<ScenarioReport>);

impl SessionSummary {
    pub(crate) fn collect() -> Self {
        let tests = TESTS.get().expect("no session was run");
        let mut reports = Vec::with_capacity(tests.len());
        for test in tests.iter() {
            reports.push(test.with(|t| ScenarioReport {
                name: t.name.clone(),
                outcome: t.outcome,
                message: match t.result.as_ref() {
                    Some(Ok(val)) => val.to_string(),
                    Some(Err(e)) => e.to_string(),
                    None => "did not run".to_string(),
                },
                time_secs: t.time_secs,
                sim_time_ns: t.sim_time_ns,
            }));
        }
        Self(reports)
    }

    pub fn all_passed(&self) -> bool {
        !self.0.is_empty() && self.0.iter().all(|r| r.outcome == Outcome::Passed)
    }

    pub fn scenarios(&self) -> &[ScenarioReport] {
        &self.0
    }

    pub fn scenario(&self, name: &str) -> Option<&ScenarioReport> {
        self.0.iter().find(|r| r.name == name)
    }
}

pub(crate) fn print_summary(summary: &SessionSummary, wall_secs: f64) {
    let mut table = Table::new();
    table.add_row(Row::new(vec![
        Cell::new("scenario"),
        Cell::new("result"),
        Cell::new("sim time [ns]"),
        Cell::new("wall [s]"),
        Cell::new("detail"),
    ]));
    for r in summary.scenarios() {
        let result = match r.outcome {
            Outcome::Passed => "passed",
            Outcome::Failed => "FAILED",
            Outcome::Running => "FAILED (incomplete)",
            Outcome::NotStarted => "not run",
        };
        table.add_row(Row::new(vec![
            Cell::new(&r.name),
            Cell::new(result),
            Cell::new(&r.sim_time_ns.to_formatted_string(&Locale::en)),
            Cell::new(&format!("{:.3}", r.time_secs)),
            Cell::new(&r.message),
        ]));
    }
    table.printstd();

    let final_time = sim::now();
    sim::log(&format!(
        "simulated {} ns in {:.3} s ({:.0} ns/s)",
        final_time.to_formatted_string(&Locale::en),
        wall_secs,
        final_time as f64 / wall_secs.max(1e-9)
    ));
}

pub(crate) fn write_junit(suite: &str) {
    let tests = TESTS.get().expect("no session was run");
    let mut test_cases = Vec::new();
    for test in tests.iter() {
        let tc = test.with(|t| {
            match t.result.as_ref() {
                Some(Ok(_)) => TestCaseBuilder::success(&t.name, Duration::seconds_f64(t.time_secs)),
                Some(Err(e)) => TestCaseBuilder::failure(
                    &t.name,
                    Duration::seconds_f64(t.time_secs),
                    "failure",
                    &e.to_string(),
                ),
                None => TestCaseBuilder::failure(
                    &t.name,
                    Duration::seconds_f64(0.0),
                    "failure",
                    "did not run",
                ),
            }
            .build()
        });
        test_cases.push(tc);
    }

    let test_suite = TestSuiteBuilder::new(suite)
        .add_testcases(test_cases)
        .build();
    let report = ReportBuilder::new().add_testsuite(test_suite).build();
    let file = std::fs::File::create("results.xml").expect("could not create results.xml");
    report.write_xml(file).expect("could not write results.xml");
}
