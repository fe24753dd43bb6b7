use rosterflow::convert::orchestrator::{check_distinct_outputs, convert_all, convert_one};
use rosterflow::testing::*;
use rosterflow::{JobConfig, RosterError, UnsupportedPolicy};
use std::path::PathBuf;

fn file_name(p: &std::path::Path) -> String {
    p.file_name().unwrap().to_string_lossy().into_owned()
}

fn mixed_inputs(dir: &std::path::Path) -> anyhow::Result<Vec<PathBuf>> {
    let students = write_student_csv(dir.join("students.csv"), &sample_students())?;
    let notes = dir.join("notes.xml");
    std::fs::write(&notes, "<notes/>")?;
    let teachers = write_roster_parquet(dir.join("teachers.parquet"), &sample_teachers())?;
    Ok(vec![students, notes, teachers])
}

#[test]
fn unrecognized_inputs_are_skipped_and_order_kept() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let work = tmp.path().join("work");
    let inputs = mixed_inputs(tmp.path())?;
    let config = JobConfig::new(inputs.clone(), tmp.path().join("r.json")).with_work_dir(&work);

    let out = convert_all(&config)?;
    let names: Vec<String> = out.paths().iter().map(|p| file_name(p)).collect();
    assert_eq!(names, vec!["cleaned_students.parquet", "cleaned_teachers.parquet"]);
    assert_eq!(out.skipped, vec![inputs[1].clone()]);
    assert!(out.paths().iter().all(|p| p.starts_with(&work)));
    assert_parquet_columns(&out.files[0].path, &["fname", "lname", "cid"]);
    assert_parquet_columns(&out.files[1].path, &["fname", "lname", "cid", "id"]);
    Ok(())
}

#[test]
fn strict_policy_rejects_unrecognized_inputs() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let mut config = JobConfig::new(mixed_inputs(tmp.path())?, tmp.path().join("r.json"))
        .with_work_dir(tmp.path().join("work"));
    config.unsupported = UnsupportedPolicy::Error;

    let err = convert_all(&config).unwrap_err();
    match err {
        RosterError::UnsupportedFormat { path } => assert_eq!(file_name(&path), "notes.xml"),
        other => panic!("expected unsupported format, got {other}"),
    }
    Ok(())
}

#[test]
fn parallel_conversion_matches_sequential() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let mut inputs = Vec::new();
    for i in 0..6 {
        let rows: Vec<String> = (0..50).map(|r| format!("f{r}_l{r}_{i}")).collect();
        inputs.push(write_delimited(tmp.path().join(format!("part{i}.csv")), STUDENT_HEADER, &rows)?);
    }

    let seq = JobConfig::new(inputs.clone(), "r.json")
        .with_work_dir(tmp.path().join("seq"))
        .with_batch_size(7);
    let mut par = seq.clone().with_work_dir(tmp.path().join("par"));
    par.parallel_conversion = true;

    let a = convert_all(&seq)?;
    let b = convert_all(&par)?;
    let names_a: Vec<String> = a.paths().iter().map(|p| file_name(p)).collect();
    let names_b: Vec<String> = b.paths().iter().map(|p| file_name(p)).collect();
    assert_eq!(names_a, names_b);
    assert_eq!(names_a[0], "cleaned_part0.parquet");
    assert_eq!(names_a[5], "cleaned_part5.parquet");
    for (x, y) in a.files.iter().zip(&b.files) {
        assert_eq!(x.rows, y.rows);
        assert_eq!(x.columns(), y.columns());
        assert_parquet_shape(&y.path, 50, 8);
    }
    Ok(())
}

#[test]
fn convert_one_skips_unknown_extension() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("roster.txt");
    std::fs::write(&path, "fname_lname_cid\nA_B_1\n")?;
    let config = JobConfig::new([&path], "r.json").with_work_dir(tmp.path());
    assert!(convert_one(&path, &config)?.is_none());
    Ok(())
}

#[test]
fn inputs_sharing_a_stem_are_rejected() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let a = write_delimited(tmp.path().join("students.csv"), STUDENT_HEADER, &["A_B_1"])?;
    let b = write_delimited(tmp.path().join("students.v2.csv"), STUDENT_HEADER, &["C_D_1"])?;
    let work = tmp.path().join("work");
    for parallel in [false, true] {
        let mut config = JobConfig::new([&a, &b], "r.json").with_work_dir(&work);
        config.parallel_conversion = parallel;
        let err = convert_all(&config).unwrap_err();
        assert!(matches!(err, RosterError::Config(_)), "{err}");
    }
    assert!(!work.exists());
    Ok(())
}

#[test]
fn distinct_stems_in_other_directories_are_accepted() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let a = write_delimited(tmp.path().join("x/students.csv"), STUDENT_HEADER, &["A_B_1"])?;
    let b = write_roster_parquet(tmp.path().join("y/teachers.parquet"), &sample_teachers())?;
    let config = JobConfig::new([a, b], "r.json").with_work_dir(tmp.path().join("work"));
    assert!(check_distinct_outputs(&config).is_ok());
    Ok(())
}
