//! Splitting one packed row into its fields.

/// Split `row` on every occurrence of `sep`.
///
/// There is no limit on the number of splits and no quoting: `"A_B_1"` with `'_'`
/// yields `["A", "B", "1"]`, an empty row yields a single empty field, and adjacent
/// separators yield empty fields between them. Field-count checks happen in the
/// normalizer, not here.
#[must_use]
pub fn split_fields(row: &str, sep: char) -> Vec<&str> {
    row.split(sep).collect()
}

/// Canonical column names from the raw header label, split the same way as rows.
#[must_use]
pub fn header_columns(label: &str, sep: char) -> Vec<String> {
    split_fields(label.trim(), sep)
        .into_iter()
        .map(|name| name.trim().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_every_separator() {
        assert_eq!(split_fields("A_B_1", '_'), vec!["A", "B", "1"]);
        assert_eq!(split_fields("a__b_", '_'), vec!["a", "", "b", ""]);
    }

    #[test]
    fn empty_row_is_one_empty_field() {
        assert_eq!(split_fields("", '_'), vec![""]);
    }

    #[test]
    fn header_names_are_trimmed() {
        assert_eq!(header_columns(" fname_lname_cid\r", '_'), vec!["fname", "lname", "cid"]);
    }
}
