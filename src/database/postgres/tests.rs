use super::*;

#[test]
fn filter_builds_one_clause_per_term() {
    let terms = vec![
        "candidate".to_string(),
        "degree".to_string(),
        "college".to_string(),
    ];
    let filter = SubstringFilter::new(&terms);

    assert_eq!(
        filter.where_clause(1),
        "content ILIKE $1 OR content ILIKE $2 OR content ILIKE $3"
    );
    assert_eq!(filter.patterns(), ["%candidate%", "%degree%", "%college%"]);
}

#[test]
fn filter_respects_placeholder_offset() {
    let terms = vec!["alpha".to_string(), "beta".to_string()];
    let filter = SubstringFilter::new(&terms);

    assert_eq!(
        filter.where_clause(4),
        "content ILIKE $4 OR content ILIKE $5"
    );
}

#[test]
fn filter_with_no_terms_is_empty() {
    let filter = SubstringFilter::new(&[]);

    assert!(filter.is_empty());
    assert_eq!(filter.where_clause(1), "");
}

#[test]
fn single_term_has_no_or() {
    let terms = vec!["only".to_string()];
    let filter = SubstringFilter::new(&terms);

    assert_eq!(filter.where_clause(1), "content ILIKE $1");
}
