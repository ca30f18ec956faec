use std::io::Write;
use std::process::{Command, Stdio};

const HEADER: &str = "id,timestamp,amount,status,payer,payee,rrn,remark";

fn run(args: &[&str]) -> (String, String, bool) {
    let output = Command::new(env!("CARGO_BIN_EXE_upi-desk"))
        .args(args)
        .env("RUST_LOG", "warn")
        .env_remove("UPI_DESK_PAGE_SIZE")
        .env_remove("UPI_DESK_LATENCY_MS")
        .env_remove("UPI_DESK_LANG")
        .output()
        .expect("failed to run binary");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn ids(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .skip(1)
        .map(|line| line.split(',').next().unwrap_or_default().to_string())
        .collect()
}

#[test]
fn filter_by_status() {
    let (stdout, stderr, success) = run(&[
        "filter",
        "tests/fixtures/transactions.csv",
        "--status",
        "FAILURE",
    ]);

    assert!(success);
    assert!(stderr.is_empty());
    assert_eq!(stdout.lines().next(), Some(HEADER));
    assert_eq!(ids(&stdout), vec!["3", "7"]);
}

#[test]
fn sort_and_page() {
    let (stdout, _, success) = run(&[
        "filter",
        "tests/fixtures/transactions.csv",
        "--sort",
        "amount",
        "--desc",
        "--page-size",
        "3",
        "--page",
        "2",
    ]);

    assert!(success);
    assert_eq!(ids(&stdout), vec!["1", "6", "4"]);
}

#[test]
fn out_of_range_page_clamps() {
    let (stdout, _, success) = run(&[
        "filter",
        "tests/fixtures/transactions.csv",
        "--page-size",
        "3",
        "--page",
        "40",
    ]);

    assert!(success);
    assert_eq!(ids(&stdout), vec!["7", "8"]);
}

#[test]
fn inclusive_date_range() {
    let (stdout, _, success) = run(&[
        "filter",
        "tests/fixtures/transactions.csv",
        "--from",
        "2024-05-02",
        "--to",
        "2024-05-03",
    ]);

    assert!(success);
    assert_eq!(ids(&stdout), vec!["3", "4", "5", "6"]);
}

#[test]
fn inverted_date_range_fails() {
    let (stdout, stderr, success) = run(&[
        "filter",
        "tests/fixtures/transactions.csv",
        "--from",
        "2024-05-03",
        "--to",
        "2024-05-02",
    ]);

    assert!(!success);
    assert!(stdout.is_empty());
    assert!(stderr.contains("date range is inverted"));
}

#[test]
fn no_match_prints_header_only() {
    let (stdout, stderr, success) = run(&[
        "filter",
        "tests/fixtures/transactions.csv",
        "--query",
        "nobody@nowhere",
    ]);

    assert!(success);
    assert_eq!(stdout, format!("{HEADER}\n"));
    assert!(stderr.contains("no matching transactions"));
}

#[test]
fn errors_warn_but_do_not_block() {
    let (stdout, stderr, success) = run(&["filter", "tests/fixtures/with_errors.csv"]);

    assert!(success);
    assert!(stderr.contains("unknown transaction status"));
    assert!(stderr.contains("invalid amount"));
    assert_eq!(ids(&stdout), vec!["1", "4"]);
}

#[test]
fn unknown_status_is_rejected() {
    let (stdout, stderr, success) = run(&[
        "filter",
        "tests/fixtures/transactions.csv",
        "--status",
        "FAILED",
    ]);

    assert!(!success);
    assert!(stdout.is_empty());
    assert!(stderr.contains("unknown transaction status 'FAILED'"));
}

#[test]
fn summary_overflow_is_an_error() {
    let (stdout, stderr, success) = run(&["summary", "tests/fixtures/overflow.csv"]);

    assert!(!success);
    assert!(stdout.is_empty());
    assert!(stderr.contains("overflowed"));
    assert!(!stderr.contains("panicked"));
}

#[test]
fn summary() {
    let (stdout, _, success) = run(&["summary", "tests/fixtures/transactions.csv"]);

    assert!(success);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec![
            "status,count,amount",
            "SUCCESS,4,435.50",
            "PENDING,1,60.00",
            "FAILURE,2,1299.00",
            "DEEMED,1,75.25",
            "TOTAL,8,1869.75",
            "success_rate,50.00",
        ]
    );
}

#[test]
fn qr_links() {
    let (stdout, _, success) = run(&["qr", "--vpa", "store@okaxis", "--name", "Corner Store"]);
    assert!(success);
    assert_eq!(
        stdout.trim_end(),
        "upi://pay?pa=store@okaxis&pn=Corner%20Store&cu=INR"
    );

    let (stdout, _, success) = run(&[
        "qr", "--vpa", "store@okaxis", "--name", "Store", "--amount", "150", "--note", "Table 4",
    ]);
    assert!(success);
    assert_eq!(
        stdout.trim_end(),
        "upi://pay?pa=store@okaxis&pn=Store&am=150.00&tn=Table%204&cu=INR"
    );
}

#[test]
fn qr_rejects_invalid_input() {
    let (_, stderr, success) = run(&["qr", "--vpa", "store", "--name", "Store"]);
    assert!(!success);
    assert!(stderr.contains("invalid VPA"));

    let (_, stderr, success) = run(&[
        "qr", "--vpa", "store@okaxis", "--name", "Store", "--amount", "0",
    ]);
    assert!(!success);
    assert!(stderr.contains("must be positive"));
}

#[test]
fn demo_output_feeds_filter() {
    let (stdout, _, success) = run(&["demo", "--count", "12", "--seed", "3"]);
    assert!(success);
    assert_eq!(stdout.lines().next(), Some(HEADER));
    assert_eq!(stdout.lines().count(), 13);

    let file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    std::fs::write(file.path(), &stdout).unwrap();
    let path = file.path().to_str().unwrap();

    let (filtered, _, success) = run(&["filter", path, "--status", "FAILURE"]);
    assert!(success);
    assert_eq!(ids(&filtered), vec!["3"]);
}

#[test]
fn settlements_days_out_of_range() {
    let (stdout, stderr, success) = run(&["settlements", "--merchant", "1", "--days", "200000000"]);

    assert!(!success);
    assert!(stdout.is_empty());
    assert!(!stderr.contains("panicked"));

    let (_, _, success) = run(&["settlements", "--merchant", "1", "--days", "0"]);
    assert!(!success);
}

#[test]
fn settlements_drill_down() {
    let (stdout, _, success) = run(&["settlements", "--merchant", "2", "--days", "4"]);
    assert!(success);

    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "date,sub_merchant,tx_count,total,status,utr");
    assert_eq!(lines.len(), 1 + 4);
    assert!(lines[1..].iter().all(|l| l.split(',').nth(1) == Some("2")));
}

fn run_otp(phone: &str, input: &str) -> (String, bool) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_upi-desk"))
        .args(["otp", "--phone", phone, "--seed", "1"])
        .env("RUST_LOG", "warn")
        .env("UPI_DESK_LATENCY_MS", "0")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to run binary");

    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();

    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        output.status.success(),
    )
}

#[test]
fn otp_verifies_after_a_wrong_attempt() {
    let (stdout, success) = run_otp("+919876543210", "000000\n834774\n");

    assert!(success);
    assert_eq!(
        stdout.lines().collect::<Vec<_>>(),
        vec!["sent 834774 to 9876543210", "incorrect, 2 left", "verified"]
    );
}

#[test]
fn otp_locks_after_three_wrong_attempts() {
    let (stdout, success) = run_otp("9876543210", "1\n2\n3\n834774\n");

    assert!(!success);
    assert_eq!(stdout.lines().count(), 3);
}
