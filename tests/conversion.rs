use arrow::array::{Array, AsArray};
use rosterflow::config::ColumnarCodec;
use rosterflow::convert::normalize::{ChunkNormalizer, RawBatch};
use rosterflow::convert::writer::{ColumnarWriter, convert_delimited};
use rosterflow::io::parquet::read_all_batches;
use rosterflow::testing::*;
use rosterflow::RosterError;

fn packed_rows(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("first{i}_last{i}_{}", i % 3)).collect()
}

fn column_values(path: &std::path::Path, column: &str) -> anyhow::Result<Vec<String>> {
    let (_, batches) = read_all_batches(path)?;
    let mut out = Vec::new();
    for batch in batches {
        let col = batch.column_by_name(column).expect("column present");
        let strings = col.as_string::<i32>();
        out.extend((0..strings.len()).map(|i| strings.value(i).to_string()));
    }
    Ok(out)
}

#[test]
fn normalizer_fans_out_packed_rows() -> anyhow::Result<()> {
    let norm = ChunkNormalizer::from_header("students.csv", "fname_lname_cid", '_')?;
    let batch = RawBatch {
        rows: vec!["A_B_1".into(), "C_D_2".into()],
        lines: vec![2, 3],
    };
    let chunk = norm.normalize(&batch)?;
    assert_eq!(chunk.num_rows(), 2);
    assert_eq!(chunk.num_columns(), 3);
    assert_eq!(chunk.column(1).as_string::<i32>().value(0), "B");
    assert_eq!(chunk.column(2).as_string::<i32>().value(1), "2");
    // the raw batch is left alone
    assert_eq!(batch.rows[0], "A_B_1");
    Ok(())
}

#[test]
fn normalizer_rejects_duplicate_header_names() {
    let err = ChunkNormalizer::from_header("x.csv", "a_b_a", '_').unwrap_err();
    assert!(matches!(err, RosterError::SchemaViolation { .. }), "{err}");
}

#[test]
fn schema_and_rows_are_independent_of_batch_size() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let rows = packed_rows(7);
    let src = write_delimited(tmp.path().join("students.csv"), STUDENT_HEADER, &rows)?;

    let mut reference: Option<Vec<String>> = None;
    for (batch_size, groups) in [(1, 7), (3, 3), (7, 1), (100, 1)] {
        let dest = tmp.path().join(format!("out_{batch_size}.parquet"));
        let out = convert_delimited(&src, &dest, '_', batch_size, ColumnarCodec::Snappy)?;
        assert_eq!(out.columns(), vec!["fname", "lname", "cid"]);
        assert_eq!(out.rows, 7);
        assert_parquet_columns(&dest, &["fname", "lname", "cid"]);
        assert_parquet_shape(&dest, 7, groups);

        let lnames = column_values(&dest, "lname")?;
        match &reference {
            None => reference = Some(lnames),
            Some(r) => assert_eq!(&lnames, r),
        }
    }
    let expected: Vec<String> = (0..7).map(|i| format!("last{i}")).collect();
    assert_eq!(reference, Some(expected));
    Ok(())
}

#[test]
fn malformed_row_fails_without_leaving_output() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let src = write_delimited(
        tmp.path().join("students.csv"),
        STUDENT_HEADER,
        &["A_B_1", "C_D_2", "E_F", "G_H_4"],
    )?;
    let dest = tmp.path().join("cleaned_students.parquet");

    let err = convert_delimited(&src, &dest, '_', 2, ColumnarCodec::Snappy).unwrap_err();
    match err {
        RosterError::SchemaViolation { detail, .. } => assert!(detail.contains("E_F"), "{detail}"),
        other => panic!("expected schema violation, got {other}"),
    }
    assert!(!dest.exists());
    Ok(())
}

#[test]
fn header_only_file_yields_empty_output() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let src = write_delimited(tmp.path().join("students.csv"), STUDENT_HEADER, &[] as &[&str])?;
    let dest = tmp.path().join("cleaned_students.parquet");

    let out = convert_delimited(&src, &dest, '_', 100, ColumnarCodec::Snappy)?;
    assert_eq!(out.rows, 0);
    assert_parquet_columns(&dest, &["fname", "lname", "cid"]);
    assert_parquet_shape(&dest, 0, 0);
    Ok(())
}

#[test]
fn empty_file_has_no_header() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let src = tmp.path().join("empty.csv");
    std::fs::write(&src, "")?;
    let err = convert_delimited(&src, tmp.path().join("out.parquet"), '_', 10, ColumnarCodec::Snappy)
        .unwrap_err();
    assert!(matches!(err, RosterError::EmptyInput { .. }), "{err}");
    Ok(())
}

#[test]
fn writer_rejects_chunk_with_other_columns() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let dest = tmp.path().join("out.parquet");
    let fixed = ChunkNormalizer::from_header("a.csv", "fname_lname_cid", '_')?;
    let other = ChunkNormalizer::from_header("a.csv", "fname_cid", '_')?;

    let mut writer = ColumnarWriter::open(&dest, fixed.schema(), ColumnarCodec::Uncompressed)?;
    let good = fixed.normalize(&RawBatch {
        rows: vec!["A_B_1".into()],
        lines: vec![2],
    })?;
    writer.append(&good)?;

    let bad = other.normalize(&RawBatch {
        rows: vec!["A_1".into()],
        lines: vec![3],
    })?;
    let err = writer.append(&bad).unwrap_err();
    assert!(matches!(err, RosterError::SchemaViolation { .. }), "{err}");

    drop(writer);
    assert!(!dest.exists());
    Ok(())
}

#[test]
fn codecs_all_produce_readable_files() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let src = write_delimited(tmp.path().join("s.csv"), STUDENT_HEADER, &packed_rows(5))?;
    for codec in [
        ColumnarCodec::Snappy,
        ColumnarCodec::Zstd,
        ColumnarCodec::Gzip,
        ColumnarCodec::Uncompressed,
    ] {
        let dest = tmp.path().join(format!("{codec:?}.parquet"));
        convert_delimited(&src, &dest, '_', 2, codec)?;
        assert_parquet_shape(&dest, 5, 3);
    }
    Ok(())
}

#[cfg(feature = "compression-gzip")]
#[test]
fn gzip_input_converts_like_plain_text() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let plain = write_delimited(tmp.path().join("plain.csv"), STUDENT_HEADER, &packed_rows(4))?;
    let gz = gzip_file(&plain, tmp.path().join("students.csv.gz"))?;

    let dest = tmp.path().join("cleaned_students.parquet");
    let out = convert_delimited(&gz, &dest, '_', 3, ColumnarCodec::Snappy)?;
    assert_eq!(out.rows, 4);
    assert_eq!(column_values(&dest, "fname")?, vec!["first0", "first1", "first2", "first3"]);
    Ok(())
}

#[test]
fn reconversion_yields_same_schema_and_rows() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let src = write_delimited(tmp.path().join("students.csv"), STUDENT_HEADER, &packed_rows(9))?;
    let dest = tmp.path().join("cleaned_students.parquet");

    let first = convert_delimited(&src, &dest, '_', 4, ColumnarCodec::Snappy)?;
    let second = convert_delimited(&src, &dest, '_', 4, ColumnarCodec::Snappy)?;
    assert_eq!(first.schema, second.schema);
    assert_eq!(first.rows, second.rows);
    assert_parquet_shape(&dest, 9, 3);
    Ok(())
}

#[test]
fn fields_after_the_first_column_are_dropped() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let src = write_delimited(tmp.path().join("students.csv"), STUDENT_HEADER, &["A_B_1,junk", "C_D_2"])?;
    let dest = tmp.path().join("cleaned_students.parquet");

    let out = convert_delimited(&src, &dest, '_', 10, ColumnarCodec::Snappy)?;
    assert_eq!(out.rows, 2);
    assert_eq!(column_values(&dest, "cid")?, vec!["1", "2"]);
    assert_eq!(column_values(&dest, "fname")?, vec!["A", "C"]);
    Ok(())
}
