use poldiff::{parse_policy, Category, CategoryMask, DiffSession, Policy, TypeRename};
use std::path::Path;

fn load(name: &str) -> Policy {
    parse_policy(&Path::new("tests/fixtures").join(name))
        .unwrap_or_else(|e| panic!("failed to parse {name}: {e}"))
}

/// Rendered items of one category, sorted so the comparison ignores order.
fn rendered(session: &DiffSession<'_>, category: Category) -> Vec<String> {
    let mut lines: Vec<String> = session
        .items(category)
        .iter()
        .map(ToString::to_string)
        .collect();
    lines.sort();
    lines
}

#[test]
fn golden_parse_base_pair() {
    let original = load("base-1.0.yaml");
    let modified = load("base-1.1.yaml");

    assert_eq!(original.classes().count(), 2);
    assert_eq!(original.attributes().count(), 2);
    assert_eq!(original.type_count(), 5);
    assert_eq!(original.booleans().count(), 1);
    assert_eq!(modified.booleans().count(), 2);
    assert_eq!(modified.av_rules().len(), 5);
    assert_eq!(modified.syntax().len(), 4);
}

#[test]
fn golden_parse_mls_pair() {
    let original = load("mls-1.0.yaml");
    let modified = load("mls-1.1.yaml");

    assert!(original.is_mls());
    assert_eq!(original.sensitivities().count(), 2);
    assert_eq!(modified.sensitivities().count(), 3);
}

#[test]
fn golden_symbol_items_with_rename() {
    let original = load("base-1.0.yaml");
    let modified = load("base-1.1.yaml");
    let renames = [TypeRename::new("httpd_sys_content_t", "httpd_content_t")];

    let mut session = DiffSession::new(&original, &modified, &renames).expect("session");
    session.run(CategoryMask::SYMBOLS).expect("run");

    assert_eq!(
        rendered(&session, Category::Classes),
        vec!["* file (1 Added Permission)\n\t+ map"]
    );
    assert_eq!(
        rendered(&session, Category::Types),
        vec!["+ cache_t", "- legacy_t"]
    );
    assert_eq!(
        rendered(&session, Category::Attributes),
        vec!["* file_type (1 Added Type, 1 Removed Type)\n\t+ cache_t\n\t- legacy_t"]
    );
    assert_eq!(
        rendered(&session, Category::Booleans),
        vec![
            "* httpd_can_network (changed from false to true)",
            "+ httpd_enable_cgi",
        ]
    );
    assert!(rendered(&session, Category::Roles).is_empty());
    assert!(rendered(&session, Category::Users).is_empty());
}

#[test]
fn golden_diff_base_pair_totals() {
    let original = load("base-1.0.yaml");
    let modified = load("base-1.1.yaml");

    // Without the rename, httpd_sys_content_t and httpd_content_t are
    // unrelated: two added and two removed types, and every rule that
    // mentions one of them is reported as due to type.
    let mut session = DiffSession::new(&original, &modified, &[]).expect("session");
    session.run(CategoryMask::ALL).expect("run");
    let totals = session.stats_for(CategoryMask::ALL);
    assert_eq!(totals.total(), 15);
    assert_eq!(totals.added_due_to_type, 3);
    assert_eq!(totals.removed_due_to_type, 3);

    let renames = [TypeRename::new("httpd_sys_content_t", "httpd_content_t")];
    let mut session = DiffSession::new(&original, &modified, &renames).expect("session");
    session.run(CategoryMask::ALL).expect("run");
    let totals = session.stats_for(CategoryMask::ALL);
    assert_eq!(totals.total(), 10);
    assert_eq!(totals.added_due_to_type, 1);
    assert_eq!(totals.removed_due_to_type, 1);
}

#[test]
fn golden_diff_mls_pair() {
    let original = load("mls-1.0.yaml");
    let modified = load("mls-1.1.yaml");

    let mut session = DiffSession::new(&original, &modified, &[]).expect("session");
    session.run(CategoryMask::MLS | CategoryMask::USERS).expect("run");

    assert_eq!(session.stats(Category::Levels).unwrap().added, 1);
    assert_eq!(session.stats(Category::Users).unwrap().modified, 1);
    assert_eq!(session.stats(Category::RangeTransitions).unwrap().modified, 1);
    assert_eq!(session.stats_for(CategoryMask::ALL).total(), 3);
}
