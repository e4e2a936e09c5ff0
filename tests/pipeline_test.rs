// End-to-end reconciliation tests over in-memory tables and CSV files

use payment_recon::{
    load_table, reconcile, write_table, Cell, OutputFormat, ReconcileError, ReconciliationEngine,
    Table,
};
use std::fs;

fn columns(prefix: &str, n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("{}{}", prefix, i)).collect()
}

/// Payment table with the four referenced columns plus `extra` filler columns
fn wide_payment(rows: &[(&str, f64, &str, &str)], extra: usize) -> Table {
    let mut cols = vec![
        "REMARKS".to_string(),
        "AMOUNT".to_string(),
        "UTR NUMBER".to_string(),
        "REFERENCE NUMBER".to_string(),
    ];
    cols.extend(columns("P", extra));

    let rows = rows
        .iter()
        .map(|(remarks, amount, utr, reference)| {
            let mut row = vec![
                Cell::from(*remarks),
                Cell::Number(*amount),
                Cell::from(*utr),
                Cell::from(*reference),
            ];
            row.extend((0..extra).map(|i| Cell::from(format!("p{}", i).as_str())));
            row
        })
        .collect();

    Table::from_rows("payment", cols, rows).unwrap()
}

fn wide_bulk(keys: &[&str], extra: usize) -> Table {
    let mut cols = columns("B", extra);
    cols.push("Beneficiary Addr. Line 3".to_string());
    cols.push("Bulk Batch".to_string());

    let rows = keys
        .iter()
        .map(|k| {
            let mut row: Vec<Cell> = (0..extra)
                .map(|i| Cell::from(format!("b{}", i).as_str()))
                .collect();
            row.push(Cell::from(*k));
            row.push(Cell::from("BATCH-7"));
            row
        })
        .collect();

    Table::from_rows("bulk", cols, rows).unwrap()
}

fn wide_statement(narratives: &[&str]) -> Table {
    let cols = vec![
        "Date".to_string(),
        "Narrative".to_string(),
        "Value Dt".to_string(),
        "Withdrawal Amt.".to_string(),
    ];
    let rows = narratives
        .iter()
        .map(|n| {
            vec![
                Cell::from("01/04/2024"),
                Cell::from(*n),
                Cell::from("01/04/2024"),
                Cell::Number(100.0),
            ]
        })
        .collect();
    Table::from_rows("statement", cols, rows).unwrap()
}

#[test]
fn test_end_to_end_scenario() {
    let bulk = Table::from_text_rows("bulk", &["Beneficiary Addr. Line 3"], &[&["A1"]]).unwrap();
    let payment = Table::from_rows(
        "payment",
        vec![
            "REMARKS".to_string(),
            "AMOUNT".to_string(),
            "UTR NUMBER".to_string(),
            "REFERENCE NUMBER".to_string(),
        ],
        vec![vec![
            Cell::from("A1"),
            Cell::Number(100.0),
            Cell::from("- -"),
            Cell::from("R1"),
        ]],
    )
    .unwrap();
    let statement =
        Table::from_text_rows("statement", &["Narrative"], &[&["TXN/R1/DONE"]]).unwrap();

    let out = reconcile(&bulk, &payment, &statement).unwrap();

    let intermediate = out.intermediate.table();
    assert_eq!(intermediate.len(), 1);
    let utr = intermediate.require_column("UTR NUMBER").unwrap();
    assert_eq!(intermediate.rows()[0][utr], Cell::from("R1"));

    let final_table = out.final_table.table();
    assert_eq!(final_table.len(), 1);
    assert_eq!(final_table.columns()[0], "Narrative");
    assert_eq!(final_table.columns()[1], "utr1");
    assert_eq!(final_table.rows()[0][1], Cell::from("R1"));

    println!("✅ {}", out.report.summary());
}

#[test]
fn test_column_slicing_widths() {
    let bulk = wide_bulk(&["A1", "B2"], 6);
    let payment = wide_payment(&[("A1", 100.0, "U1", "R1"), ("B2", 50.0, "U2", "R2")], 10);
    let statement = wide_statement(&["NEFT/U1/X", "IMPS_U2"]);

    // 14 payment + 8 bulk = 22 joined columns
    let out = reconcile(&bulk, &payment, &statement).unwrap();

    let intermediate = out.intermediate.table();
    assert_eq!(intermediate.width(), 17);
    assert_eq!(intermediate.columns()[14], "B1");
    assert_eq!(intermediate.columns()[15], "B2");
    assert_eq!(intermediate.columns()[16], "Bulk Batch");
    assert_eq!(intermediate.rows()[0][16], Cell::from("BATCH-7"));

    let final_table = out.final_table.table();
    assert_eq!(final_table.width(), 9);
    assert_eq!(final_table.len(), 2);
    assert_eq!(final_table.columns()[4], "utr1");
}

#[test]
fn test_join_exclusivity() {
    let bulk = wide_bulk(&["A1", "C3"], 2);
    let payment = wide_payment(
        &[
            ("A1", 100.0, "U1", "R1"),
            ("B2", 50.0, "U2", "R2"),
            ("", 10.0, "U3", "R3"),
        ],
        2,
    );
    let statement = wide_statement(&["NEFT/U1/X", "NEFT/U2/X", "NOFORMATHERE", "NEFT/U9/X"]);

    let out = reconcile(&bulk, &payment, &statement).unwrap();

    let joined = out.intermediate.joined();
    let remarks = joined.require_column("REMARKS").unwrap();
    let address = joined.require_column("Beneficiary Addr. Line 3").unwrap();
    assert_eq!(joined.len(), 1);
    for row in joined.rows() {
        assert_eq!(row[remarks], row[address]);
    }

    let final_table = out.final_table.table();
    assert_eq!(final_table.len(), 1);
    let token = final_table.require_column("utr1").unwrap();
    assert_eq!(final_table.rows()[0][token], Cell::from("U1"));
    assert_eq!(out.report.final_stats.tokens_absent, 1);
}

#[test]
fn test_duplicate_pairs_after_bulk_join() {
    // Same (REMARKS, AMOUNT) twice in payments, plus a different amount
    let bulk = wide_bulk(&["A1"], 1);
    let payment = wide_payment(
        &[
            ("A1", 100.0, "U1", "R1"),
            ("A1", 100.0, "U2", "R2"),
            ("A1", 75.0, "U3", "R3"),
        ],
        1,
    );

    let engine = ReconciliationEngine::new();
    let out = engine.build_intermediate(&bulk, &payment).unwrap();

    assert_eq!(out.len(), 2);
    assert_eq!(out.stats.duplicates_removed, 1);
    let utrs: Vec<String> = out.utr_values().iter().map(|c| c.to_string()).collect();
    assert_eq!(utrs, vec!["U1", "U3"]);
}

#[test]
fn test_utr_beyond_projection_still_joins() {
    // UTR NUMBER sits at column 20 of the join, outside the first 16
    let mut cols = columns("P", 18);
    cols.extend(
        ["REMARKS", "AMOUNT", "UTR NUMBER", "REFERENCE NUMBER"]
            .iter()
            .map(|c| c.to_string()),
    );
    let mut row: Vec<Cell> = (0..18).map(|_| Cell::from("x")).collect();
    row.extend([Cell::from("A1"), Cell::Number(1.0), Cell::from("- -"), Cell::from("R1")]);
    let payment = Table::from_rows("payment", cols, vec![row]).unwrap();

    let bulk = wide_bulk(&["A1"], 0);
    let statement = wide_statement(&["TXN/R1/DONE"]);

    let out = reconcile(&bulk, &payment, &statement).unwrap();
    assert!(out.intermediate.table().column_index("UTR NUMBER").is_none());
    assert_eq!(out.final_table.len(), 1);
}

#[test]
fn test_schema_error_produces_no_output() {
    let bulk = wide_bulk(&["A1"], 1);
    let payment = wide_payment(&[("A1", 100.0, "U1", "R1")], 1);
    let statement = Table::from_text_rows("statement", &["Description"], &[&["TXN/U1/X"]]).unwrap();

    let err = reconcile(&bulk, &payment, &statement).unwrap_err();
    assert_eq!(err, ReconcileError::schema("statement", "Narrative"));
}

#[test]
fn test_csv_files_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let bulk_path = dir.path().join("bulk.csv");
    let payment_path = dir.path().join("payment.csv");
    let statement_path = dir.path().join("statement.csv");

    fs::write(&bulk_path, "Beneficiary Name,Beneficiary Addr. Line 3\nAcme,A1\nBeta,B2\n").unwrap();
    fs::write(
        &payment_path,
        "REMARKS,AMOUNT,UTR NUMBER,REFERENCE NUMBER,STATUS\nA1,100,- -,R1,Paid\nB2,50,U2,R2,Paid\nB2,50,U2,R2,Paid\n",
    )
    .unwrap();
    fs::write(
        &statement_path,
        "Date,Narrative,Withdrawal Amt.\n01/04/24,NEFT/R1/ACME,100\n02/04/24,IMPS_U2,50\n03/04/24,CHARGES,5\n",
    )
    .unwrap();

    let bulk = load_table(&bulk_path, "bulk").unwrap();
    let payment = load_table(&payment_path, "payment").unwrap();
    let statement = load_table(&statement_path, "statement").unwrap();

    let out = reconcile(&bulk, &payment, &statement).unwrap();
    assert_eq!(out.intermediate.len(), 2);
    assert_eq!(out.final_table.len(), 2);

    let (intermediate_file, final_file) = OutputFormat::Csv.file_names();
    let intermediate_path = dir.path().join(intermediate_file);
    let final_path = dir.path().join(final_file);
    write_table(out.intermediate.table(), &intermediate_path).unwrap();
    write_table(out.final_table.table(), &final_path).unwrap();

    let final_csv = fs::read_to_string(&final_path).unwrap();
    let mut lines = final_csv.lines();
    assert_eq!(
        lines.next(),
        Some("Date,Narrative,Withdrawal Amt.,utr1,REMARKS,AMOUNT,UTR NUMBER,REFERENCE NUMBER,STATUS")
    );
    assert_eq!(lines.next(), Some("01/04/24,NEFT/R1/ACME,100,R1,A1,100,R1,R1,Paid"));
    assert_eq!(lines.next(), Some("02/04/24,IMPS_U2,50,U2,B2,50,U2,R2,Paid"));
    assert_eq!(lines.next(), None);

    let report = serde_json::to_value(&out.report).unwrap();
    assert_eq!(report["intermediate"]["duplicates_removed"], 1);
    assert_eq!(report["final_rows"], 2);
}

#[cfg(feature = "xlsx")]
#[test]
fn test_xlsx_outputs_by_default() {
    use payment_recon::{FINAL_OUTPUT_FILE, INTERMEDIATE_OUTPUT_FILE};

    let dir = tempfile::tempdir().unwrap();
    let bulk = wide_bulk(&["A1"], 14);
    let payment = wide_payment(&[("A1", 100.0, "- -", "R1")], 1);
    let statement = wide_statement(&["NEFT/R1/ACME"]);

    let out = reconcile(&bulk, &payment, &statement).unwrap();

    let (intermediate_file, final_file) = OutputFormat::default().file_names();
    assert_eq!(intermediate_file, INTERMEDIATE_OUTPUT_FILE);
    assert_eq!(final_file, FINAL_OUTPUT_FILE);

    let intermediate_path = dir.path().join(intermediate_file);
    let final_path = dir.path().join(final_file);
    write_table(out.intermediate.table(), &intermediate_path).unwrap();
    write_table(out.final_table.table(), &final_path).unwrap();

    let intermediate = load_table(&intermediate_path, "intermediate").unwrap();
    assert_eq!(intermediate.width(), 17);
    assert_eq!(intermediate.rows()[0][1], Cell::Number(100.0));

    let final_table = load_table(&final_path, "final").unwrap();
    assert_eq!(final_table.columns(), out.final_table.table().columns());
    assert_eq!(final_table.width(), 9);
    assert_eq!(final_table.rows()[0][4], Cell::from("R1"));
}
