// Catalog pipeline: filter -> search -> sort over an immutable record set
//
// Every function here is pure. The input slice is never reordered or mutated,
// so a view can be recomputed from the same source on every keystroke.

use crate::college::{CollegeRecord, CollegeType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info, warn};

// ============================================================================
// QUERY TYPES
// ============================================================================

/// Ordering applied after filtering and searching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum SortOrder {
    /// Keep the order the records were loaded in
    #[default]
    Input,
    /// Rank: low to high, unranked last
    RankAscending,
    /// Rank: high to low, unranked still last
    RankDescending,
    /// Best rated first
    Rating,
}

impl SortOrder {
    pub fn label(&self) -> &str {
        match self {
            SortOrder::Input => "Default",
            SortOrder::RankAscending => "Rank: Low to High",
            SortOrder::RankDescending => "Rank: High to Low",
            SortOrder::Rating => "Rating",
        }
    }

    /// Cycle used by the terminal UI sort key.
    pub fn next(&self) -> Self {
        match self {
            SortOrder::Input => SortOrder::RankAscending,
            SortOrder::RankAscending => SortOrder::RankDescending,
            SortOrder::RankDescending => SortOrder::Rating,
            SortOrder::Rating => SortOrder::Input,
        }
    }
}

/// Structured filter dimensions. A `None`/`false` field is inactive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Filters {
    pub state: Option<String>,
    pub category: Option<String>,
    pub quota: Option<String>,
    pub college_type: Option<CollegeType>,
    pub branch: Option<String>,
    pub hostel_required: bool,
    pub min_rating: Option<f64>,
    /// Match the search query against every text field, not just the name
    pub search_all_fields: bool,
}

impl Filters {
    /// True when no predicate is active (search scope does not count).
    pub fn is_empty(&self) -> bool {
        self.state.is_none()
            && self.category.is_none()
            && self.quota.is_none()
            && self.college_type.is_none()
            && self.branch.is_none()
            && !self.hostel_required
            && self.min_rating.is_none()
    }

    /// AND across every active predicate.
    pub fn matches(&self, college: &CollegeRecord) -> bool {
        if let Some(state) = &self.state {
            if !eq_ignore_case(&college.state, state) {
                return false;
            }
        }

        if let Some(category) = &self.category {
            if !eq_ignore_case(&college.category, category) {
                return false;
            }
        }

        if let Some(quota) = &self.quota {
            if !eq_ignore_case(&college.quota, quota) {
                return false;
            }
        }

        if let Some(college_type) = &self.college_type {
            if !eq_ignore_case(college.college_type.name(), college_type.name()) {
                return false;
            }
        }

        if let Some(branch) = &self.branch {
            if !college.branches.iter().any(|b| eq_ignore_case(b, branch)) {
                return false;
            }
        }

        if self.hostel_required && !college.hostel_available {
            return false;
        }

        if let Some(min) = self.min_rating {
            if college.rating < min {
                return false;
            }
        }

        true
    }
}

/// Everything the user has entered that shapes the displayed list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogQuery {
    pub query: String,
    pub sort_by_rank: bool,
    pub sort: SortOrder,
    pub filters: Filters,
}

impl CatalogQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, query: &str) -> Self {
        self.query = query.to_string();
        self
    }

    pub fn with_sort_by_rank(mut self, sort_by_rank: bool) -> Self {
        self.sort_by_rank = sort_by_rank;
        self
    }

    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_filters(mut self, filters: Filters) -> Self {
        self.filters = filters;
        self
    }

    /// An explicit sort order wins over the rank toggle.
    pub fn effective_sort(&self) -> SortOrder {
        match (self.sort, self.sort_by_rank) {
            (SortOrder::Input, true) => SortOrder::RankAscending,
            (sort, _) => sort,
        }
    }
}

// ============================================================================
// PIPELINE STAGES
// ============================================================================

/// Records satisfying every active filter, in input order.
pub fn filter(records: &[CollegeRecord], filters: &Filters) -> Vec<CollegeRecord> {
    filter_refs(records.iter(), filters).into_iter().cloned().collect()
}

/// Case-insensitive substring search. An empty query matches everything.
pub fn search(records: &[CollegeRecord], query: &str, all_fields: bool) -> Vec<CollegeRecord> {
    search_refs(records.iter().collect(), query, all_fields)
        .into_iter()
        .cloned()
        .collect()
}

/// Stable sort into a new vector.
pub fn sort(records: &[CollegeRecord], order: SortOrder) -> Vec<CollegeRecord> {
    sort_refs(records.iter().collect(), order)
        .into_iter()
        .cloned()
        .collect()
}

/// The rank toggle: ascending rank when set, input order otherwise.
pub fn sort_by_rank(records: &[CollegeRecord], by_rank: bool) -> Vec<CollegeRecord> {
    let order = if by_rank {
        SortOrder::RankAscending
    } else {
        SortOrder::Input
    };
    sort(records, order)
}

/// Full pipeline: filter, then search, then sort.
pub fn apply(records: &[CollegeRecord], query: &CatalogQuery) -> Vec<CollegeRecord> {
    let filtered = filter_refs(records.iter(), &query.filters);
    let searched = search_refs(filtered, &query.query, query.filters.search_all_fields);
    let sorted = sort_refs(searched, query.effective_sort());

    debug!(
        input = records.len(),
        output = sorted.len(),
        query = %query.query,
        "catalog view computed"
    );

    sorted.into_iter().cloned().collect()
}

fn filter_refs<'a>(
    records: impl Iterator<Item = &'a CollegeRecord>,
    filters: &Filters,
) -> Vec<&'a CollegeRecord> {
    if filters.is_empty() {
        return records.collect();
    }
    records.filter(|c| filters.matches(c)).collect()
}

fn search_refs<'a>(
    records: Vec<&'a CollegeRecord>,
    query: &str,
    all_fields: bool,
) -> Vec<&'a CollegeRecord> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return records;
    }
    records
        .into_iter()
        .filter(|c| matches_query(c, &needle, all_fields))
        .collect()
}

fn sort_refs(mut records: Vec<&CollegeRecord>, order: SortOrder) -> Vec<&CollegeRecord> {
    match order {
        SortOrder::Input => {}
        SortOrder::RankAscending => {
            records.sort_by(|a, b| compare_rank(a, b, false));
        }
        SortOrder::RankDescending => {
            records.sort_by(|a, b| compare_rank(a, b, true));
        }
        SortOrder::Rating => {
            records.sort_by(|a, b| b.rating.total_cmp(&a.rating));
        }
    }
    records
}

/// Unranked records always go last; `sort_by` keeps ties in input order.
fn compare_rank(a: &CollegeRecord, b: &CollegeRecord, descending: bool) -> Ordering {
    match (a.effective_rank(), b.effective_rank()) {
        (Some(x), Some(y)) if descending => y.cmp(&x),
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn matches_query(college: &CollegeRecord, needle: &str, all_fields: bool) -> bool {
    if college.name.to_lowercase().contains(needle) {
        return true;
    }
    if !all_fields {
        return false;
    }

    let fields = [
        college.location.as_str(),
        college.state.as_str(),
        college.category.as_str(),
        college.quota.as_str(),
        college.college_type.name(),
    ];
    fields
        .iter()
        .copied()
        .chain(college.branches.iter().map(String::as_str))
        .any(|field| field.to_lowercase().contains(needle))
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

// ============================================================================
// CATALOG (current working set)
// ============================================================================

/// Distinct values present in the working set, for filter pickers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Facets {
    pub states: Vec<String>,
    pub types: Vec<String>,
    pub quotas: Vec<String>,
    pub categories: Vec<String>,
    pub branches: Vec<String>,
}

/// The loaded record set. Replaced wholesale on every new upload.
#[derive(Debug, Clone)]
pub struct Catalog {
    records: Vec<CollegeRecord>,
    source: String,
    loaded_at: DateTime<Utc>,
}

impl Catalog {
    /// Build a catalog, keeping the first record for any repeated id.
    pub fn new(records: Vec<CollegeRecord>, source: impl Into<String>) -> Self {
        let source = source.into();
        let records = dedup_ids(records);
        info!(count = records.len(), source = %source, "catalog loaded");

        Catalog {
            records,
            source,
            loaded_at: Utc::now(),
        }
    }

    pub fn seeded() -> Self {
        Catalog::new(crate::college::seed_colleges(), "built-in")
    }

    /// Swap in a new working set. Nothing from the old set is kept.
    pub fn replace(&mut self, records: Vec<CollegeRecord>, source: impl Into<String>) {
        *self = Catalog::new(records, source);
    }

    pub fn records(&self) -> &[CollegeRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn get(&self, id: &str) -> Option<&CollegeRecord> {
        self.records.iter().find(|c| c.id == id)
    }

    /// Recompute the displayed list on demand.
    pub fn view(&self, query: &CatalogQuery) -> Vec<CollegeRecord> {
        apply(&self.records, query)
    }

    pub fn facets(&self) -> Facets {
        let mut states = BTreeSet::new();
        let mut types = BTreeSet::new();
        let mut quotas = BTreeSet::new();
        let mut categories = BTreeSet::new();
        let mut branches = BTreeSet::new();

        for college in &self.records {
            insert_non_empty(&mut states, &college.state);
            insert_non_empty(&mut types, college.college_type.name());
            insert_non_empty(&mut quotas, &college.quota);
            insert_non_empty(&mut categories, &college.category);
            for branch in &college.branches {
                insert_non_empty(&mut branches, branch);
            }
        }

        Facets {
            states: states.into_iter().collect(),
            types: types.into_iter().collect(),
            quotas: quotas.into_iter().collect(),
            categories: categories.into_iter().collect(),
            branches: branches.into_iter().collect(),
        }
    }
}

fn insert_non_empty(set: &mut BTreeSet<String>, value: &str) {
    let value = value.trim();
    if !value.is_empty() {
        set.insert(value.to_string());
    }
}

fn dedup_ids(records: Vec<CollegeRecord>) -> Vec<CollegeRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|c| {
            let fresh = seen.insert(c.id.clone());
            if !fresh {
                warn!(id = %c.id, name = %c.name, "duplicate college id dropped");
            }
            fresh
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
