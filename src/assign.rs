use std::collections::BTreeMap;

use rand::{seq::SliceRandom, Rng};
use tracing::info;

use crate::{
    config::{GROUP_COLUMN, STUDENT_ID_COLUMN},
    error::{GraderError, Result},
    quota::{compute_quota_with, rng_from_seed, GraderSet},
    table::Table,
    types::{Assignment, Quota},
};

#[derive(Debug, Clone)]
pub struct AssignOptions {
    pub column: String,
    pub overwrite: bool,
    pub seed: Option<u64>,
    pub weights: Option<BTreeMap<String, f64>>,
}

impl Default for AssignOptions {
    fn default() -> Self {
        AssignOptions {
            column: String::from("grader"),
            overwrite: false,
            seed: None,
            weights: None,
        }
    }
}

/// Pairs each subject with a grader drawn from a shuffled pool that holds
/// every grader exactly as many times as its quota.
pub fn assign_students(subjects: &[String], quota: &Quota, seed: Option<u64>) -> Result<Assignment> {
    assign_students_with(&mut rng_from_seed(seed), subjects, quota)
}

pub(crate) fn assign_students_with<R: Rng>(
    rng: &mut R,
    subjects: &[String],
    quota: &Quota,
) -> Result<Assignment> {
    let mut pool: Vec<&str> = quota
        .iter()
        .flat_map(|(grader, count)| std::iter::repeat(grader).take(count))
        .collect();
    if pool.len() != subjects.len() {
        return Err(GraderError::QuotaMismatch {
            expected: subjects.len(),
            actual: pool.len(),
        });
    }
    pool.shuffle(rng);

    let pairs = subjects
        .iter()
        .cloned()
        .zip(pool.into_iter().map(String::from))
        .collect();
    Ok(Assignment::new(pairs))
}

/// Adds a grader column to a class list, one grader per student.
///
/// An existing column is left untouched unless `overwrite` is set, so a
/// distribution is only ever made once per sheet.
pub fn assign_graders(table: &Table, graders: &[String], options: &AssignOptions) -> Result<Table> {
    if table.has_column(&options.column) && !options.overwrite {
        info!(column = %options.column, "graders already assigned, keeping existing distribution");
        return Ok(table.clone());
    }
    let graders = GraderSet::new(graders.to_vec())?;
    let subjects: Vec<String> = table
        .column(STUDENT_ID_COLUMN)?
        .into_iter()
        .map(String::from)
        .collect();

    let mut rng = rng_from_seed(options.seed);
    let quota = compute_quota_with(&mut rng, &graders, subjects.len(), options.weights.as_ref())?;
    let assignment = assign_students_with(&mut rng, &subjects, &quota)?;
    log_quota(&quota);

    let column = assignment.iter().map(|(_, g)| g.to_string()).collect();
    Ok(table.with_column(&options.column, column))
}

/// Group variant: each group gets one grader and all of its members inherit it.
pub fn assign_graders_to_groups(
    table: &Table,
    graders: &[String],
    options: &AssignOptions,
) -> Result<Table> {
    if table.has_column(&options.column) && !options.overwrite {
        info!(column = %options.column, "graders already assigned, keeping existing distribution");
        return Ok(table.clone());
    }
    let graders = GraderSet::new(graders.to_vec())?;
    let ids = table.column(STUDENT_ID_COLUMN)?;
    let groups = table.column(GROUP_COLUMN)?;

    let mut distinct: Vec<String> = Vec::new();
    for (id, group) in ids.iter().zip(groups.iter()) {
        let group = group.trim();
        if group.is_empty() {
            return Err(GraderError::MissingGroup(id.to_string()));
        }
        if !distinct.iter().any(|g| g == group) {
            distinct.push(group.to_string());
        }
    }

    let mut rng = rng_from_seed(options.seed);
    let quota = compute_quota_with(&mut rng, &graders, distinct.len(), options.weights.as_ref())?;
    let assignment = assign_students_with(&mut rng, &distinct, &quota)?;
    log_quota(&quota);

    let by_group: BTreeMap<&str, &str> = assignment.iter().collect();
    let column = groups
        .iter()
        .map(|g| by_group.get(g.trim()).map(|s| s.to_string()).unwrap_or_default())
        .collect();
    Ok(table.with_column(&options.column, column))
}

fn log_quota(quota: &Quota) {
    for (grader, count) in quota.iter() {
        info!(grader, count, "assigned");
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::quota::compute_quota;

    fn graders(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn classlist(n: usize) -> Table {
        Table::new(
            vec![STUDENT_ID_COLUMN.into(), "Last Name".into(), GROUP_COLUMN.into()],
            (0..n)
                .map(|i| vec![format!("{}", 1000 + i), format!("L{}", i), format!("G{}", i % 4)])
                .collect(),
        )
    }

    #[test]
    fn assignment_matches_quota() {
        let g = graders(&["a", "b", "c"]);
        let subjects: Vec<String> = (0..11).map(|i| i.to_string()).collect();
        let quota = compute_quota(&g, subjects.len(), None, Some(4)).unwrap();
        let assignment = assign_students(&subjects, &quota, Some(4)).unwrap();
        assert_eq!(assignment.len(), 11);
        for (grader, count) in quota.iter() {
            assert_eq!(assignment.count_for(grader), count);
        }
        for s in subjects.iter() {
            assert!(assignment.grader_for(s).is_some());
        }
    }

    #[test]
    fn seeded_assignment_is_reproducible_and_varies_by_seed() {
        let g = graders(&["a", "b", "c"]);
        let subjects: Vec<String> = (0..30).map(|i| i.to_string()).collect();
        let quota = compute_quota(&g, 30, None, Some(1)).unwrap();
        let first = assign_students(&subjects, &quota, Some(1)).unwrap();
        assert_eq!(first, assign_students(&subjects, &quota, Some(1)).unwrap());
        let other = assign_students(&subjects, &quota, Some(2)).unwrap();
        assert_ne!(first, other);
    }

    #[test]
    fn pool_must_cover_every_subject() {
        let quota = compute_quota(&graders(&["a"]), 2, None, None).unwrap();
        let subjects = vec!["x".to_string()];
        assert!(matches!(
            assign_students(&subjects, &quota, None),
            Err(GraderError::QuotaMismatch { expected: 1, actual: 2 })
        ));
    }

    #[test]
    fn assign_graders_adds_balanced_column() {
        let options = AssignOptions {
            seed: Some(11),
            ..Default::default()
        };
        let out = assign_graders(&classlist(10), &graders(&["a", "b", "c"]), &options).unwrap();
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for g in out.column("grader").unwrap() {
            *counts.entry(g).or_default() += 1;
        }
        let max = counts.values().max().unwrap();
        let min = counts.values().min().unwrap();
        assert_eq!(counts.values().sum::<usize>(), 10);
        assert!(max - min <= 1);
    }

    #[test]
    fn existing_column_is_kept_without_overwrite() {
        let g = graders(&["a", "b"]);
        let first = assign_graders(&classlist(6), &g, &AssignOptions::default()).unwrap();
        let again = assign_graders(&first, &graders(&["x", "y"]), &AssignOptions::default()).unwrap();
        assert_eq!(first, again);

        let options = AssignOptions {
            overwrite: true,
            ..Default::default()
        };
        let replaced = assign_graders(&first, &graders(&["x"]), &options).unwrap();
        assert_eq!(replaced.headers(), first.headers());
        assert!(replaced.column("grader").unwrap().iter().all(|g| *g == "x"));
    }

    #[test]
    fn empty_class_gets_empty_column() {
        let out = assign_graders(&classlist(0), &graders(&["a"]), &AssignOptions::default()).unwrap();
        assert!(out.has_column("grader"));
        assert!(out.is_empty());
    }

    #[test]
    fn no_graders_is_rejected() {
        assert!(matches!(
            assign_graders(&classlist(3), &[], &AssignOptions::default()),
            Err(GraderError::NoGraders)
        ));
    }

    #[test]
    fn group_members_share_a_grader() {
        let options = AssignOptions {
            seed: Some(5),
            ..Default::default()
        };
        let out = assign_graders_to_groups(&classlist(12), &graders(&["a", "b"]), &options).unwrap();
        let groups = out.column(GROUP_COLUMN).unwrap();
        let assigned = out.column("grader").unwrap();
        let mut seen: HashMap<&str, &str> = HashMap::new();
        for (group, grader) in groups.iter().zip(assigned.iter()) {
            assert_eq!(*seen.entry(*group).or_insert(*grader), *grader);
        }
        let mut per_grader: HashMap<&str, usize> = HashMap::new();
        for grader in seen.values() {
            *per_grader.entry(*grader).or_default() += 1;
        }
        assert_eq!(per_grader.get("a"), Some(&2));
        assert_eq!(per_grader.get("b"), Some(&2));
    }

    #[test]
    fn group_variant_requires_groups() {
        let table = classlist(2).map_column(GROUP_COLUMN, |_| String::new()).unwrap();
        assert!(matches!(
            assign_graders_to_groups(&table, &graders(&["a"]), &AssignOptions::default()),
            Err(GraderError::MissingGroup(id)) if id == "1000"
        ));
    }
}
