use rosterflow::testing::*;
use rosterflow::{JobConfig, ReportFormat, RosterError, run};
use serde_json::json;

#[test]
fn packed_students_join_parquet_teachers() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let students = write_delimited(tmp.path().join("students.csv"), STUDENT_HEADER, &["A_B_1", "C_D_1"])?;
    let teachers = write_roster_parquet(tmp.path().join("teachers.parquet"), &[RosterRecord::new("E", "F", 1)])?;
    let output = tmp.path().join("report.json");

    let config = JobConfig::new([students, teachers], &output).with_work_dir(tmp.path().join("work"));
    let summary = run(&config)?;

    assert_eq!(summary.records, 2);
    assert_eq!(summary.report, output);
    assert!(summary.skipped.is_empty());
    assert_eq!(summary.converted[0].columns(), vec!["fname", "lname", "cid"]);
    assert_eq!(summary.converted[1].columns(), vec!["fname", "lname", "cid", "id"]);

    let mut report = read_report(&output)?;
    report.sort_by_key(|r| r["student name"].as_str().map(str::to_string));
    assert_eq!(
        report,
        vec![
            json!({"student name": "A B", "teacher name": "E F", "class ID": 1}),
            json!({"student name": "C D", "teacher name": "E F", "class ID": 1}),
        ]
    );
    Ok(())
}

#[test]
fn sorted_json_lines_report_with_skipped_input() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let students = write_student_csv(tmp.path().join("students.csv"), &sample_students())?;
    let notes = tmp.path().join("notes.xml");
    std::fs::write(&notes, "<notes/>")?;
    let teachers = write_roster_parquet(tmp.path().join("teachers.parquet"), &sample_teachers())?;

    let mut config = JobConfig::new([students, notes.clone(), teachers], tmp.path().join("r.jsonl"))
        .with_work_dir(tmp.path())
        .with_batch_size(1);
    config.report_format = ReportFormat::JsonLines;
    config.sort_report = true;
    config.parallel_conversion = true;
    config.partitions = Some(3);

    let summary = run(&config)?;
    assert_eq!(summary.skipped, vec![notes]);
    assert_eq!(summary.records, 5);

    let report = read_report(&summary.report)?;
    let rows: Vec<(String, String, i64)> = report
        .iter()
        .map(|r| {
            (
                r["student name"].as_str().unwrap().to_string(),
                r["teacher name"].as_str().unwrap().to_string(),
                r["class ID"].as_i64().unwrap(),
            )
        })
        .collect();
    let expected = [
        ("Alan Turing", "Barbara Liskov", 2),
        ("Alan Turing", "Donald Knuth", 2),
        ("Grace Hopper", "Barbara Liskov", 2),
        ("Grace Hopper", "Donald Knuth", 2),
        ("Edsger Dijkstra", "Leslie Lamport", 3),
    ];
    let expected: Vec<(String, String, i64)> = expected
        .iter()
        .map(|(s, t, c)| ((*s).to_string(), (*t).to_string(), *c))
        .collect();
    assert_eq!(rows, expected);
    Ok(())
}

#[test]
fn a_single_convertible_input_is_a_table_count_error() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let students = write_student_csv(tmp.path().join("students.csv"), &sample_students())?;
    let output = tmp.path().join("r.json");
    let config = JobConfig::new([students], &output).with_work_dir(tmp.path());

    let err = run(&config).unwrap_err();
    assert!(matches!(err, RosterError::TableCount { found: 1 }), "{err}");
    assert!(!output.exists());
    Ok(())
}

#[test]
fn missing_class_column_stops_before_the_report() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let students = write_delimited(tmp.path().join("students.csv"), "fname_lname", &["A_B"])?;
    let teachers = write_roster_parquet(tmp.path().join("teachers.parquet"), &sample_teachers())?;
    let output = tmp.path().join("r.json");
    let config = JobConfig::new([students, teachers], &output).with_work_dir(tmp.path());

    let err = run(&config).unwrap_err();
    assert!(
        matches!(err, RosterError::MissingJoinColumn { ref column, .. } if column == "cid"),
        "{err}"
    );
    assert!(!output.exists());
    Ok(())
}

#[test]
fn invalid_config_fails_before_any_work() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let students = write_student_csv(tmp.path().join("students.csv"), &sample_students())?;
    let config = JobConfig::new([students], tmp.path().join("r.json"))
        .with_work_dir(tmp.path())
        .with_batch_size(0);

    let err = run(&config).unwrap_err();
    assert!(matches!(err, RosterError::Config(_)), "{err}");
    assert!(!tmp.path().join("cleaned_students.parquet").exists());
    Ok(())
}

#[cfg(feature = "compression-gzip")]
#[test]
fn compressed_student_file_runs_end_to_end() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let plain = write_student_csv(tmp.path().join("plain.csv"), &sample_students())?;
    let students = gzip_file(&plain, tmp.path().join("students.csv.gz"))?;
    let teachers = write_roster_parquet(tmp.path().join("teachers.parquet"), &sample_teachers())?;

    let config = JobConfig::new([students, teachers], tmp.path().join("r.json"))
        .with_work_dir(tmp.path().join("work"));
    let summary = run(&config)?;
    assert_eq!(summary.records, 5);
    assert!(tmp.path().join("work/cleaned_students.parquet").exists());
    Ok(())
}

#[test]
fn names_are_reported_exactly_as_stored() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let students = write_delimited(
        tmp.path().join("students.csv"),
        STUDENT_HEADER,
        &["Li_Nan_1", "007_Infinity_1", "True_ Ng_1"],
    )?;
    let teachers = write_roster_parquet(tmp.path().join("teachers.parquet"), &[RosterRecord::new("E", "F", 1)])?;
    let output = tmp.path().join("report.json");
    let config = JobConfig::new([students, teachers], &output).with_work_dir(tmp.path().join("work"));

    run(&config)?;
    let names: Vec<String> = read_report(&output)?
        .iter()
        .map(|r| r["student name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Li Nan", "007 Infinity", "True  Ng"]);
    Ok(())
}

#[test]
fn colliding_table_names_fail_before_any_output() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let students = write_delimited(tmp.path().join("a/roster.csv"), STUDENT_HEADER, &["A_B_1"])?;
    let teachers = write_roster_parquet(tmp.path().join("b/roster.parquet"), &[RosterRecord::new("E", "F", 1)])?;
    let work = tmp.path().join("work");
    let output = tmp.path().join("report.json");
    let config = JobConfig::new([students, teachers], &output).with_work_dir(&work);

    let err = run(&config).unwrap_err();
    assert!(matches!(err, RosterError::Config(ref msg) if msg.contains("cleaned_roster")), "{err}");
    assert!(!work.join("cleaned_roster.parquet").exists());
    assert!(!output.exists());
    Ok(())
}
