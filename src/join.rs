//! Inner equality join between the student and teacher tables.
//!
//! The join is the relational equivalent of
//!
//! ```sql
//! SELECT concat(st.fname, ' ', st.lname) AS `student name`,
//!        concat(te.fname, ' ', te.lname) AS `teacher name`,
//!        st.cid AS `class ID`
//! FROM student st JOIN teacher te ON st.cid = te.cid
//! ```
//!
//! [`partitioned_hash_join`] does the work: the right side is indexed by key once,
//! the left side is split into contiguous partitions that probe the index on the
//! session's workers, and partition outputs are concatenated in partition order.
//!
//! ### Notes
//! - Rows whose key is null, or present on one side only, produce nothing.
//! - Duplicate keys fan out: `m` left rows and `n` right rows sharing a key produce
//!   `m * n` records.
//! - This implementation happens to emit records in left order (then right order
//!   within a key). Callers that need an order should still sort explicitly.

use crate::error::{Result, RosterError};
use crate::session::Session;
use crate::table::RosterRow;
use crate::value::Value;
use rayon::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::Hash;
use tracing::info;

/// Which side of the join a table plays. Assigned by input position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TableRole {
    Student,
    Teacher,
}

impl TableRole {
    /// Role for the table at `position` in the converted file list.
    #[must_use]
    pub fn for_position(position: usize) -> Option<Self> {
        match position {
            0 => Some(Self::Student),
            1 => Some(Self::Teacher),
            _ => None,
        }
    }
}

/// One row of the join result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct JoinRecord {
    #[serde(rename = "student name")]
    pub student_name: Option<String>,
    #[serde(rename = "teacher name")]
    pub teacher_name: Option<String>,
    #[serde(rename = "class ID")]
    pub class_id: Value,
}

impl JoinRecord {
    /// Order by class ID, then student name, then teacher name.
    #[must_use]
    pub fn report_order(&self, other: &Self) -> Ordering {
        self.class_id
            .cmp(&other.class_id)
            .then_with(|| self.student_name.cmp(&other.student_name))
            .then_with(|| self.teacher_name.cmp(&other.teacher_name))
    }
}

/// Split `[0, len)` into at most `parts` contiguous, non-empty `(start, end)` ranges.
///
/// The remainder is spread over the first ranges so sizes differ by at most one.
fn split_ranges(len: usize, parts: usize) -> Vec<(usize, usize)> {
    let parts = parts.max(1).min(len.max(1));
    let base = len / parts;
    let rem = len % parts;

    let mut out = Vec::with_capacity(parts);
    let mut start = 0usize;
    for idx in 0..parts {
        let end = start + base + usize::from(idx < rem);
        if start < end {
            out.push((start, end));
        }
        start = end;
    }
    out
}

/// Inner equality join of `left` and `right` on the keys the two closures extract.
///
/// A `None` key never matches. Left partitions are probed in parallel on the current
/// rayon pool; output follows left order, then right order within each key.
pub fn partitioned_hash_join<L, R, K, O>(
    left: &[L],
    right: &[R],
    partitions: usize,
    left_key: impl Fn(&L) -> Option<K> + Sync,
    right_key: impl Fn(&R) -> Option<K> + Sync,
    emit: impl Fn(&L, &R) -> O + Sync,
) -> Vec<O>
where
    L: Sync,
    R: Sync,
    K: Eq + Hash + Send + Sync,
    O: Send,
{
    let mut index: HashMap<K, Vec<usize>> = HashMap::new();
    for (i, row) in right.iter().enumerate() {
        if let Some(k) = right_key(row) {
            index.entry(k).or_default().push(i);
        }
    }
    if index.is_empty() || left.is_empty() {
        return Vec::new();
    }

    let parts: Vec<Vec<O>> = split_ranges(left.len(), partitions)
        .into_par_iter()
        .map(|(start, end)| {
            let mut out = Vec::new();
            for l in &left[start..end] {
                let Some(k) = left_key(l) else { continue };
                if let Some(matches) = index.get(&k) {
                    out.extend(matches.iter().map(|&ri| emit(l, &right[ri])));
                }
            }
            out
        })
        .collect();
    parts.into_iter().flatten().collect()
}

/// Join the registered `student` and `teacher` tables on `cid`.
///
/// # Errors
/// Returns [`RosterError::UnknownTable`] if either name is not registered in `session`.
pub fn roster_join(session: &Session, student: &str, teacher: &str) -> Result<Vec<JoinRecord>> {
    let students = session.table(student)?;
    let teachers = session.table(teacher)?;
    let partitions = session.partitions();

    let records = session.install(|| {
        partitioned_hash_join(
            students.rows(),
            teachers.rows(),
            partitions,
            |s: &RosterRow| s.cid.join_key(),
            |t: &RosterRow| t.cid.join_key(),
            |s, t| JoinRecord {
                student_name: s.display_name(),
                teacher_name: t.display_name(),
                class_id: s.cid.clone(),
            },
        )
    });
    info!(
        student,
        teacher,
        students = students.len(),
        teachers = teachers.len(),
        records = records.len(),
        "joined tables"
    );
    Ok(records)
}

/// Assign roles to exactly two table names by position and run [`roster_join`].
///
/// # Errors
/// Returns [`RosterError::TableCount`] unless `tables` has exactly two entries.
pub fn join_by_position(session: &Session, tables: &[String]) -> Result<Vec<JoinRecord>> {
    let count = || RosterError::TableCount { found: tables.len() };
    let (mut student, mut teacher) = (None, None);
    for (position, name) in tables.iter().enumerate() {
        match TableRole::for_position(position).ok_or_else(count)? {
            TableRole::Student => student = Some(name),
            TableRole::Teacher => teacher = Some(name),
        }
    }
    let (Some(student), Some(teacher)) = (student, teacher) else {
        return Err(count());
    };
    roster_join(session, student, teacher)
}
