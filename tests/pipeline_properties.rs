// End-to-end checks: spreadsheet import feeding the filter/search/sort pipeline

use college_finder::{
    apply, filter, import_delimited, load_catalog, search, seed_colleges, sort, sort_by_rank,
    validate_neet_mark, CatalogQuery, CollegeRecord, CollegeType, Filters, SortOrder,
};
use std::fs;
use std::path::PathBuf;

fn ids(records: &[CollegeRecord]) -> Vec<&str> {
    records.iter().map(|c| c.id.as_str()).collect()
}

fn temp_file(name: &str, contents: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("college-finder-it-{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

const SHEET: &str = "\
Name,Location,State,Type,Established Year,Rating,Fees,Branches,Rank,Notes
Alpha Medical College,Pune,Maharashtra,Medical,1950,4.5,\"₹50,000\",\"MBBS, MD\",300,first
Beta Institute of Technology,Mumbai,Maharashtra,Engineering,1960,4.1,,\"CSE, ECE\",120,
Gamma Nursing School,Lucknow,Uttar Pradesh,Nursing,1999,3.9,,B.Sc Nursing,,unranked
Delta Medical University,Kolkata,West Bengal,Medical,not a year,4.8,,MBBS,120,tie with beta
Epsilon Dental College,Vellore,Tamil Nadu,Dental,1985,4.0,,BDS,0,zero rank
";

#[test]
fn test_filter_never_invents_records() {
    let records = seed_colleges();
    let filters = Filters {
        state: Some("maharashtra".to_string()),
        ..Default::default()
    };

    for result in [
        filter(&records, &filters),
        search(&records, "college", false),
        apply(&records, &CatalogQuery::new().with_query("in").with_sort_by_rank(true)),
    ] {
        assert!(
            result.iter().all(|c| records.contains(c)),
            "Every output record comes from the input"
        );
    }
}

#[test]
fn test_empty_query_is_identity() {
    let records = seed_colleges();

    assert_eq!(search(&records, "", false), records);
    assert_eq!(search(&records, "   ", true), records);
    assert_eq!(filter(&records, &Filters::default()), records);
    assert_eq!(apply(&records, &CatalogQuery::default()), records);
    assert_eq!(sort_by_rank(&records, false), records, "byRank=false keeps input order");
}

#[test]
fn test_rank_sort_is_ordered_stable_and_idempotent() {
    let records = seed_colleges();
    let sorted = sort_by_rank(&records, true);

    let ranks: Vec<u32> = sorted.iter().filter_map(|c| c.effective_rank()).collect();
    assert!(ranks.windows(2).all(|w| w[0] <= w[1]), "Non-decreasing: {:?}", ranks);

    let unranked_from = sorted.iter().position(|c| !c.is_ranked()).unwrap();
    assert!(sorted[unranked_from..].iter().all(|c| !c.is_ranked()), "Unranked last");

    assert_eq!(sort_by_rank(&sorted, true), sorted, "Sorting twice changes nothing");
}

#[test]
fn test_rank_example_keeps_tie_order() {
    let records = vec![
        CollegeRecord::new("1", "A").with_rank(50),
        CollegeRecord::new("2", "B").with_rank(10),
        CollegeRecord::new("3", "C").with_rank(10),
    ];
    assert_eq!(ids(&sort_by_rank(&records, true)), vec!["2", "3", "1"]);
}

#[test]
fn test_med_example() {
    let records = vec![
        CollegeRecord::new("1", "Medical College"),
        CollegeRecord::new("2", "Engineering Institute"),
    ];
    assert_eq!(ids(&search(&records, "med", false)), vec!["1"]);
}

#[test]
fn test_import_rank_round_trip() {
    let report = import_delimited(SHEET.as_bytes(), b',').unwrap();
    assert_eq!(report.records.len(), 5);
    assert_eq!(report.ignored_columns, vec!["Notes".to_string()]);
    assert!(report.defaulted_cells >= 1, "'not a year' is defaulted, not fatal");

    let imported: Vec<Option<u32>> = report.records.iter().map(|c| c.effective_rank()).collect();
    assert_eq!(imported, vec![Some(300), Some(120), None, Some(120), None]);

    let sorted = sort_by_rank(&report.records, true);
    let names: Vec<&str> = sorted.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Beta Institute of Technology",
            "Delta Medical University",
            "Alpha Medical College",
            "Gamma Nursing School",
            "Epsilon Dental College",
        ],
        "Ranks sort exactly as in the column, blanks and zeros last in input order"
    );
}

#[test]
fn test_import_then_filter_and_search_all_fields() {
    let path = temp_file("colleges.csv", SHEET);
    let catalog = load_catalog(Some(&path)).unwrap();
    assert_eq!(catalog.source(), "colleges.csv");

    let medical = CatalogQuery::new().with_sort_by_rank(true).with_filters(Filters {
        college_type: Some(CollegeType::Medical),
        ..Default::default()
    });
    let view = catalog.view(&medical);
    assert_eq!(
        view.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
        vec!["Delta Medical University", "Alpha Medical College"]
    );

    let by_branch = CatalogQuery::new().with_query("ece").with_filters(Filters {
        search_all_fields: true,
        ..Default::default()
    });
    assert_eq!(catalog.view(&by_branch).len(), 1, "Branch text is searchable");
    assert!(
        catalog.view(&CatalogQuery::new().with_query("ece")).is_empty(),
        "Name only by default"
    );

    let alpha = view.iter().find(|c| c.name.starts_with("Alpha")).unwrap();
    assert_eq!(alpha.branches, vec!["MBBS".to_string(), "MD".to_string()]);
    assert_eq!(alpha.fees, "₹50,000");

    fs::remove_dir_all(path.parent().unwrap()).ok();
}

#[test]
fn test_rating_sort_overrides_toggle() {
    let records = seed_colleges();
    let query = CatalogQuery::new().with_sort_by_rank(true).with_sort(SortOrder::Rating);
    let view = apply(&records, &query);

    assert!(view.windows(2).all(|w| w[0].rating >= w[1].rating));
    assert_eq!(sort(&records, SortOrder::Rating), view);
}

#[test]
fn test_neet_mark_bounds() {
    for ok in ["0", "360", "720"] {
        assert!(validate_neet_mark(ok).is_ok(), "{} should pass", ok);
    }
    for bad in ["-1", "721", "", "abc"] {
        assert!(validate_neet_mark(bad).is_err(), "{:?} should fail", bad);
    }
}
