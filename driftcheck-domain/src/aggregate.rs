use driftcheck_types::{Category, ClassifiedResult};
use std::collections::BTreeMap;

/// Classified results bucketed by category, each bucket sorted by address.
///
/// Built only after every worker has finished, so the ordering is
/// independent of completion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregation {
    buckets: BTreeMap<Category, Vec<ClassifiedResult>>,
    commands: Vec<String>,
}

impl Aggregation {
    pub fn from_results(results: Vec<ClassifiedResult>) -> Self {
        let mut buckets: BTreeMap<Category, Vec<ClassifiedResult>> =
            Category::ALL.iter().map(|c| (*c, Vec::new())).collect();

        for result in results {
            buckets.entry(result.category).or_default().push(result);
        }
        for bucket in buckets.values_mut() {
            bucket.sort_by(|a, b| {
                a.address
                    .cmp(&b.address)
                    .then_with(|| a.message.cmp(&b.message))
            });
        }

        let mut commands: Vec<String> = buckets
            .iter()
            .filter(|(category, _)| category.carries_command())
            .flat_map(|(_, bucket)| bucket.iter().filter_map(|r| r.command.clone()))
            .collect();
        commands.sort();

        Self { buckets, commands }
    }

    pub fn bucket(&self, category: Category) -> &[ClassifiedResult] {
        self.buckets.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Remediation commands, sorted lexicographically.
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    pub fn counts(&self) -> BTreeMap<Category, usize> {
        self.buckets.iter().map(|(c, b)| (*c, b.len())).collect()
    }

    pub fn total(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Buckets in category order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &[ClassifiedResult])> {
        self.buckets.iter().map(|(c, b)| (*c, b.as_slice()))
    }

    pub fn into_buckets(self) -> BTreeMap<Category, Vec<ClassifiedResult>> {
        self.buckets
    }
}
