use anyhow::{Context, Result};
use aquaforge_core::{
    analysis::{CrosscheckReport, Mismatch, StressReport},
    logger::OutcomeLogger,
};
use serde::Serialize;
use std::{fs, path::Path};

/// One `<testcase>` of a JUnit suite.
#[derive(Debug, Clone)]
pub struct CaseResult {
    pub name: String,
    pub failures: Vec<Mismatch>,
}

impl CaseResult {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

pub fn crosscheck_summary_markdown(report: &CrosscheckReport) -> String {
    let mut table = String::from(
        "| Tank | Planted | Filter | Percent Used | Efficiency | Turnover | Status |\n",
    );
    table.push_str("|------|---------|--------|--------------|------------|----------|--------|\n");

    for outcome in &report.outcomes {
        let status = if report.scenario_passed(&outcome.key) { "PASS" } else { "FAIL" };
        table.push_str(&format!(
            "| {}g | {} | {} | {:.2}% | {:.3} | {:.2} | {} |\n",
            outcome.gallons,
            if outcome.planted { "Yes" } else { "No" },
            outcome.filter_label,
            outcome.percent,
            outcome.relief,
            outcome.turnover,
            status
        ));
    }
    table
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn junit_xml(suite: &str, cases: &[CaseResult]) -> Result<String> {
    let failures = cases.iter().filter(|c| !c.passed()).count();
    let mut xml = format!(
        "<testsuite name=\"{}\" tests=\"{}\" failures=\"{}\">\n",
        escape_xml(suite),
        cases.len(),
        failures
    );
    for case in cases {
        let attrs = format!(
            "classname=\"{}\" name=\"{}\"",
            escape_xml(suite),
            escape_xml(&case.name)
        );
        if case.passed() {
            xml.push_str(&format!("    <testcase {} />\n", attrs));
            continue;
        }
        let message = case
            .failures
            .iter()
            .map(|m| format!("{}: {}", m.scenario, m.message))
            .collect::<Vec<_>>()
            .join("\n");
        let detail = serde_json::to_string_pretty(&case.failures)?;
        xml.push_str(&format!("    <testcase {}>\n", attrs));
        xml.push_str(&format!(
            "      <failure message=\"{}\"><![CDATA[{}]]></failure>\n",
            escape_xml(&message),
            detail.replace("]]>", "]]]]><![CDATA[>")
        ));
        xml.push_str("    </testcase>\n");
    }
    xml.push_str("</testsuite>\n");
    Ok(xml)
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("Failed to write {:?}", path))
}

fn write_text(path: &Path, text: &str) -> Result<()> {
    fs::write(path, text).with_context(|| format!("Failed to write {:?}", path))
}

/// Writes `summary.md`, `mismatches.json`, `junit.xml` and `outcomes.csv`.
pub fn write_crosscheck(report: &CrosscheckReport, output_dir: &Path) -> Result<()> {
    write_text(&output_dir.join("summary.md"), &crosscheck_summary_markdown(report))?;

    let mismatches: Vec<&Mismatch> = report.mismatches().collect();
    write_json(&output_dir.join("mismatches.json"), &mismatches)?;

    let cases: Vec<CaseResult> = report
        .guardrails
        .iter()
        .map(|g| CaseResult {
            name: g.name.clone(),
            failures: g.issues.clone(),
        })
        .collect();
    write_text(&output_dir.join("junit.xml"), &junit_xml("crosscheck", &cases)?)?;

    let log_path = output_dir.join("outcomes.csv");
    let mut logger = OutcomeLogger::new(&log_path.display().to_string())
        .with_context(|| format!("Failed to create outcome log: {:?}", log_path))?;
    logger.log_all(&report.outcomes)?;
    Ok(())
}

pub fn write_stress(report: &StressReport, output_dir: &Path) -> Result<()> {
    write_json(&output_dir.join("stress.json"), report)?;
    let case = CaseResult {
        name: format!("seed-{}", report.seed),
        failures: report.failures.clone(),
    };
    write_text(&output_dir.join("junit.xml"), &junit_xml("stress", &[case])?)
}

/// Writes one JSON document per scenario plus the combined mismatch list and JUnit suite.
pub fn write_evaluations<T: Serialize>(
    results: &[(String, T)],
    cases: &[CaseResult],
    output_dir: &Path,
) -> Result<()> {
    for (name, state) in results {
        write_json(&output_dir.join(format!("{}.json", name)), state)?;
    }
    let mismatches: Vec<&Mismatch> = cases.iter().flat_map(|c| c.failures.iter()).collect();
    write_json(&output_dir.join("mismatches.json"), &mismatches)?;
    write_text(&output_dir.join("junit.xml"), &junit_xml("scenarios", cases)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aquaforge_core::{analysis, planner::StockingEngine};
    use tempfile::tempdir;

    fn mismatch(scenario: &str, message: &str) -> Mismatch {
        Mismatch {
            check: "expected-status".to_string(),
            scenario: scenario.to_string(),
            expected: "ok".to_string(),
            got: "bad".to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_junit_counts_failures_and_escapes() {
        let cases = vec![
            CaseResult {
                name: "clean".to_string(),
                failures: vec![],
            },
            CaseResult {
                name: "shrimp & betta".to_string(),
                failures: vec![mismatch("nano", "status \"bad\" <expected ok>")],
            },
        ];
        let xml = junit_xml("scenarios", &cases).unwrap();
        assert!(xml.starts_with("<testsuite name=\"scenarios\" tests=\"2\" failures=\"1\">"));
        assert!(xml.contains("name=\"shrimp &amp; betta\""));
        assert!(xml.contains("nano: status &quot;bad&quot; &lt;expected ok&gt;"));
        assert!(xml.contains("<testcase classname=\"scenarios\" name=\"clean\" />"));
    }

    #[test]
    fn test_crosscheck_artifacts_are_written() {
        let engine = StockingEngine::builtin();
        let report = analysis::run_crosscheck(&engine).unwrap();
        let dir = tempdir().unwrap();
        write_crosscheck(&report, dir.path()).unwrap();

        let summary = fs::read_to_string(dir.path().join("summary.md")).unwrap();
        assert_eq!(summary.lines().count(), report.outcomes.len() + 2);
        assert!(summary.contains("| 20g | No | No filter |"));
        assert!(!summary.contains("FAIL"));

        let mismatches = fs::read_to_string(dir.path().join("mismatches.json")).unwrap();
        assert_eq!(mismatches.trim(), "[]");

        let log_path = dir.path().join("outcomes.csv").display().to_string();
        let tally = analysis::tally_outcome_log(&log_path).unwrap();
        assert_eq!(tally.rows, report.outcomes.len());
    }
}
