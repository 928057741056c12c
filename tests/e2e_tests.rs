//! End-to-end integration tests
//!
//! These tests validate the complete replay pipeline using predefined CSV
//! fixtures. Each fixture directory under tests/fixtures/ holds:
//! - `input.csv` - the command file
//! - `expected_balances.csv` - the balances report
//! - `expected_histories.csv` - the histories report
//!
//! Every fixture is replayed with both modes and both reports; the sequential
//! and concurrent modes must agree.

#[cfg(test)]
mod tests {
    use point_engine::cli::{ReplayMode, ReportKind};
    use point_engine::strategy::create_strategy;
    use std::fs;
    use std::io::Write;
    use std::path::Path;
    use tempfile::NamedTempFile;

    /// Replay `input.csv` of a fixture and compare with the expected report
    fn run_test_fixture(fixture_name: &str, mode: ReplayMode, report: ReportKind) {
        let fixture_dir = format!("tests/fixtures/{}", fixture_name);
        let input_path = format!("{}/input.csv", fixture_dir);
        let expected_path = match report {
            ReportKind::Balances => format!("{}/expected_balances.csv", fixture_dir),
            ReportKind::Histories => format!("{}/expected_histories.csv", fixture_dir),
        };

        assert!(
            Path::new(&input_path).exists(),
            "Input file not found: {}",
            input_path
        );
        assert!(
            Path::new(&expected_path).exists(),
            "Expected file not found: {}",
            expected_path
        );

        let strategy = create_strategy(mode, None);
        let mut temp_output = NamedTempFile::new().expect("Failed to create temp file");

        strategy
            .replay(Path::new(&input_path), report, &mut temp_output)
            .unwrap_or_else(|e| panic!("Failed to replay commands: {}", e));

        temp_output.flush().expect("Failed to flush temp file");

        let actual_output = fs::read_to_string(temp_output.path())
            .unwrap_or_else(|e| panic!("Failed to read temp output file: {}", e));
        let expected_output = fs::read_to_string(&expected_path)
            .unwrap_or_else(|e| panic!("Failed to read expected file {}: {}", expected_path, e));

        assert_eq!(
            actual_output, expected_output,
            "\n\nOutput mismatch for fixture: {} (mode: {:?}, report: {:?})\n\nActual output:\n{}\n\nExpected output:\n{}\n",
            fixture_name, mode, report, actual_output, expected_output
        );
    }

    #[rstest::rstest]
    #[case("end_to_end")]
    #[case("competing_uses")]
    #[case("invalid_amounts")]
    #[case("multiple_users")]
    #[case("unseen_user")]
    #[case("malformed_data")]
    fn test_fixtures(
        #[case] fixture: &str,
        #[values(ReplayMode::Sequential, ReplayMode::Concurrent)] mode: ReplayMode,
        #[values(ReportKind::Balances, ReportKind::Histories)] report: ReportKind,
    ) {
        run_test_fixture(fixture, mode, report);
    }
}
