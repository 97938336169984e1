use std::path::Path;

use campus_rollup::RollupError;
use campus_rollup::config::RollupConfig;
use campus_rollup::io::destination::WorkbookDestination;
use campus_rollup::io::excel_read::{self, WorkbookSource};
use campus_rollup::io::grid::CellValue;
use campus_rollup::io::notify::RecordingNotifier;
use campus_rollup::model::{Level, RowRange, SourceRecord};
use campus_rollup::ports::{DestinationStore, SourceReader};
use campus_rollup::sync;
use rust_xlsxwriter::{Formula, Workbook};
use tempfile::tempdir;

const CONFIG: &str = r#"
[destination]
sheet = "Enrollment"

[layout]
es = [{ start = 4, end = 5 }]
ms = [{ start = 8, end = 9 }]

[[campuses.es]]
name = "Bernal #1"
source = "es-bernal"

[[campuses.es]]
name = "Holmgreen"
source = "es-holmgreen"

[[campuses.ms]]
name = "Holmgreen"
source = "ms-holmgreen"

[[campuses.ms]]
name = "Rhodes"
source = "ms-rhodes"
"#;

fn write_report(path: &Path) {
    let mut workbook = Workbook::new();
    let cover = workbook.add_worksheet();
    cover.set_name("Cover").expect("sheet named");
    cover.write_string(0, 0, "District enrollment").expect("cell written");

    let report = workbook.add_worksheet();
    report.set_name("Enrollment").expect("sheet named");
    report.write_string(0, 0, "Campus").expect("cell written");
    report.write_string(0, 1, "Enrolled").expect("cell written");
    report.write_string(3, 0, "Bernal #1").expect("cell written");
    report.write_string(4, 0, "Holmgreen").expect("cell written");
    report.write_string(6, 0, "Middle School").expect("cell written");
    report.write_number(6, 1, 123.0).expect("cell written");
    report.write_string(7, 0, "Holmgreen").expect("cell written");
    report.write_string(8, 0, "Rhodes").expect("cell written");
    report.write_number(8, 1, 55.0).expect("cell written");
    workbook.save(path).expect("report saved");
}

type CountRow<'a> = (&'a str, &'a str, Option<f64>);

fn write_counts(path: &Path, sheets: &[(&str, Vec<CountRow>)]) {
    let mut workbook = Workbook::new();
    for (name, rows) in sheets {
        let sheet = workbook.add_worksheet();
        sheet.set_name(*name).expect("sheet named");
        sheet.write_string(0, 0, "identifier").expect("cell written");
        sheet.write_string(0, 1, "campus").expect("cell written");
        sheet.write_string(0, 2, "count").expect("cell written");
        for (index, (identifier, campus, count)) in rows.iter().enumerate() {
            let row = index as u32 + 1;
            sheet.write_string(row, 0, *identifier).expect("cell written");
            sheet.write_string(row, 1, *campus).expect("cell written");
            if let Some(count) = count {
                sheet.write_number(row, 2, *count).expect("cell written");
            }
        }
    }
    workbook.save(path).expect("counts saved");
}

fn count_at(destination: &WorkbookDestination, row_number: u32) -> Option<CellValue> {
    destination
        .grid()
        .sheet("Enrollment")
        .and_then(|sheet| sheet.get(row_number - 1, 1))
        .cloned()
}

#[test]
fn workbook_source_reads_level_sheets() {
    let temp_dir = tempdir().expect("temporary directory");
    let counts_path = temp_dir.path().join("counts.xlsx");
    write_counts(
        &counts_path,
        &[(
            "ES",
            vec![
                ("es-bernal", "Bernal 1 - Tracey Sorrell", Some(17.0)),
                ("es-holmgreen", "Holmgreen - Michael Cline", None),
                ("", "Blank row", Some(3.0)),
            ],
        )],
    );

    let source = WorkbookSource::new(&counts_path);
    let records = source.read(Level::Es).expect("ES sheet read");
    assert_eq!(
        records,
        [
            SourceRecord::new("es-bernal", "Bernal 1 - Tracey Sorrell", 17),
            SourceRecord::new("es-holmgreen", "Holmgreen - Michael Cline", 0),
        ]
    );

    let missing = source.read(Level::Hs).expect("absent sheet is not an error");
    assert!(missing.is_empty());
}

#[test]
fn workbook_destination_reads_labels_and_buffers_writes() {
    let temp_dir = tempdir().expect("temporary directory");
    let report_path = temp_dir.path().join("report.xlsx");
    write_report(&report_path);

    let config = RollupConfig::from_toml(CONFIG).expect("config parsed");
    let mut destination =
        WorkbookDestination::open(&report_path, config.destination.clone()).expect("opened");
    assert!(destination.has_sheet());

    let labels = destination
        .read_labels(RowRange::new(4, 6))
        .expect("labels read");
    assert_eq!(
        labels,
        [
            (4, "Bernal #1".to_string()),
            (5, "Holmgreen".to_string()),
            (6, String::new()),
        ]
    );

    destination
        .write_counts(RowRange::new(4, 5), &[17, 4])
        .expect("counts written");
    assert_eq!(count_at(&destination, 4), Some(CellValue::Number(17.0)));

    let mismatched = destination.write_counts(RowRange::new(4, 5), &[1]);
    assert!(matches!(mismatched, Err(RollupError::InvalidWorkbook(_))));
}

#[test]
fn rollup_workbook_updates_report_and_keeps_other_sheets() {
    let temp_dir = tempdir().expect("temporary directory");
    let report_path = temp_dir.path().join("report.xlsx");
    let counts_path = temp_dir.path().join("counts.xlsx");
    let output_path = temp_dir.path().join("report-updated.xlsx");
    write_report(&report_path);
    write_counts(
        &counts_path,
        &[
            (
                "ES",
                vec![
                    ("es-bernal", "Bernal 1 - Tracey Sorrell", Some(17.0)),
                    ("es-holmgreen", "Holmgreen - Michael Cline", Some(4.0)),
                ],
            ),
            ("MS", vec![("ms-holmgreen", "Holmgreen", Some(9.0))]),
        ],
    );

    let config = RollupConfig::from_toml(CONFIG).expect("config parsed");
    let notifier = RecordingNotifier::new();
    let summary = sync::rollup_workbook(
        &config,
        &counts_path,
        &report_path,
        &output_path,
        Some(Level::Ms),
        &notifier,
    )
    .expect("rollup succeeds");

    assert_eq!(summary.updated_count, 1);
    assert_eq!(summary.missing_campuses, ["Rhodes"]);

    let grid = excel_read::read_grid(&output_path).expect("output read");
    let names: Vec<&str> = grid.sheets.iter().map(|sheet| sheet.name.as_str()).collect();
    assert_eq!(names, ["Cover", "Enrollment"]);

    let report = grid.sheet("Enrollment").expect("report sheet");
    assert_eq!(report.get(7, 1), Some(&CellValue::Number(9.0)));
    assert_eq!(report.get(8, 1), Some(&CellValue::Number(0.0)));
    assert_eq!(report.get(6, 1), Some(&CellValue::Number(123.0)), "outside MS rows");
    assert_eq!(report.get(3, 1), None, "ES rows untouched");
    assert_eq!(
        grid.sheet("Cover").and_then(|sheet| sheet.get(0, 0)),
        Some(&CellValue::Text("District enrollment".to_string()))
    );
}

#[test]
fn rollup_workbook_keeps_formulas_outside_processed_rows() {
    let temp_dir = tempdir().expect("temporary directory");
    let report_path = temp_dir.path().join("report.xlsx");
    let counts_path = temp_dir.path().join("counts.xlsx");
    let output_path = temp_dir.path().join("report-updated.xlsx");

    let mut workbook = Workbook::new();
    let report = workbook.add_worksheet();
    report.set_name("Enrollment").expect("sheet named");
    report.write_string(3, 0, "Bernal #1").expect("cell written");
    report.write_string(4, 0, "Holmgreen").expect("cell written");
    report.write_string(9, 0, "Total").expect("cell written");
    report
        .write_formula(9, 1, Formula::new("=SUM(B4:B5)").set_result("100"))
        .expect("formula written");
    workbook.save(&report_path).expect("report saved");
    write_counts(&counts_path, &[("ES", vec![("es-bernal", "Bernal 1", Some(17.0))])]);

    let config = RollupConfig::from_toml(CONFIG).expect("config parsed");
    sync::rollup_workbook(
        &config,
        &counts_path,
        &report_path,
        &output_path,
        Some(Level::Es),
        &RecordingNotifier::new(),
    )
    .expect("rollup succeeds");

    let grid = excel_read::read_grid(&output_path).expect("output read");
    let report = grid.sheet("Enrollment").expect("report sheet");
    assert_eq!(report.get(3, 1), Some(&CellValue::Number(17.0)));
    assert!(matches!(
        report.get(9, 1),
        Some(CellValue::Formula { formula, .. }) if formula == "SUM(B4:B5)"
    ));
}

#[test]
fn workbook_destination_rejects_row_zero() {
    let temp_dir = tempdir().expect("temporary directory");
    let report_path = temp_dir.path().join("report.xlsx");
    write_report(&report_path);

    let config = RollupConfig::from_toml(CONFIG).expect("config parsed");
    let mut destination =
        WorkbookDestination::open(&report_path, config.destination.clone()).expect("opened");

    let labels = destination.read_labels(RowRange::new(0, 1));
    assert!(matches!(labels, Err(RollupError::InvalidConfig(_))));
    let written = destination.write_counts(RowRange::new(0, 1), &[1, 2]);
    assert!(matches!(written, Err(RollupError::InvalidConfig(_))));
}

#[test]
fn workbook_source_reads_the_file_once() {
    let temp_dir = tempdir().expect("temporary directory");
    let counts_path = temp_dir.path().join("counts.xlsx");
    write_counts(
        &counts_path,
        &[
            ("ES", vec![("es-bernal", "Bernal 1", Some(17.0))]),
            ("MS", vec![("ms-rhodes", "Rhodes", Some(8.0))]),
        ],
    );

    let source = WorkbookSource::new(&counts_path);
    assert_eq!(source.read(Level::Es).expect("ES sheet read").len(), 1);
    std::fs::remove_file(&counts_path).expect("counts removed");

    let records = source.read(Level::Ms).expect("MS sheet kept in memory");
    assert_eq!(records, [SourceRecord::new("ms-rhodes", "Rhodes", 8)]);
}

#[test]
fn workbook_source_without_file_fails_every_level() {
    let temp_dir = tempdir().expect("temporary directory");
    let source = WorkbookSource::new(temp_dir.path().join("absent.xlsx"));

    for level in Level::ALL {
        let error = source.read(level).expect_err("no counts workbook");
        assert!(matches!(error, RollupError::SourceUnavailable(ref reason) if reason.contains("absent.xlsx")));
    }
}

#[test]
fn rollup_workbook_without_report_sheet_writes_nothing() {
    let temp_dir = tempdir().expect("temporary directory");
    let report_path = temp_dir.path().join("report.xlsx");
    let counts_path = temp_dir.path().join("counts.xlsx");
    let output_path = temp_dir.path().join("out.xlsx");
    write_report(&report_path);
    write_counts(&counts_path, &[("ES", vec![("es-bernal", "Bernal 1", Some(17.0))])]);

    let mut config = RollupConfig::from_toml(CONFIG).expect("config parsed");
    config.destination.sheet = "Totals".to_string();

    let error = sync::rollup_workbook(
        &config,
        &counts_path,
        &report_path,
        &output_path,
        None,
        &RecordingNotifier::new(),
    )
    .expect_err("missing report sheet");

    assert!(matches!(error, RollupError::DestinationMissing { .. }));
    assert!(!output_path.exists());
}

#[test]
fn config_file_is_loaded_from_disk() {
    let temp_dir = tempdir().expect("temporary directory");
    let config_path = temp_dir.path().join("rollup.toml");
    std::fs::write(&config_path, CONFIG).expect("config written");

    let config = RollupConfig::load(&config_path).expect("config loaded");
    assert_eq!(config.identity_map().campuses(Level::Ms).len(), 2);

    let missing = RollupConfig::load(&temp_dir.path().join("absent.toml"));
    assert!(matches!(missing, Err(RollupError::MissingInput(_))));
}
