//! Property-based tests for core diff types.
//!
//! Checks the counting and mask invariants across random inputs, and that
//! generated policies compare equal to themselves and to renamed copies.

use poldiff::diff::{
    Category, CategoryMask, DiffForm, DiffSession, Side, Stats, TypeMap, TypeRename,
};
use poldiff::model::{Policy, PolicyBuilder};
use proptest::prelude::*;
use std::collections::BTreeSet;

const FORMS: [DiffForm; 5] = [
    DiffForm::Added,
    DiffForm::Removed,
    DiffForm::Modified,
    DiffForm::AddedDueToType,
    DiffForm::RemovedDueToType,
];

/// Shape of a generated policy: type count, allow rules as
/// (source, target, permission bits) and boolean defaults.
#[derive(Debug, Clone)]
struct PolicyShape {
    types: usize,
    rules: Vec<(usize, usize, u8)>,
    booleans: Vec<bool>,
}

fn policy_shape() -> impl Strategy<Value = PolicyShape> {
    (2usize..8).prop_flat_map(|types| {
        (
            Just(types),
            prop::collection::vec((0..types, 0..types, 1u8..8), 0..12),
            prop::collection::vec(any::<bool>(), 0..4),
        )
            .prop_map(|(types, rules, booleans)| PolicyShape {
                types,
                rules,
                booleans,
            })
    })
}

/// Build a policy from a shape, naming type `renamed` differently.
fn build_policy(shape: &PolicyShape, renamed: Option<usize>) -> Policy {
    let name = |i: usize| {
        if Some(i) == renamed {
            "renamed_t".to_string()
        } else {
            format!("t{i}_t")
        }
    };
    let perms = ["read", "write", "getattr"];

    let mut builder = PolicyBuilder::new("generated")
        .class("file", None, &perms)
        .attribute("domain");
    for i in 0..shape.types {
        let attrs: &[&str] = if i % 2 == 0 { &["domain"] } else { &[] };
        builder = builder.type_(&name(i), attrs);
    }
    for (i, default) in shape.booleans.iter().enumerate() {
        builder = builder.boolean(&format!("bool_{i}"), *default);
    }
    for (source, target, bits) in &shape.rules {
        let selected: Vec<&str> = perms
            .iter()
            .enumerate()
            .filter(|(bit, _)| bits & (1 << bit) != 0)
            .map(|(_, p)| *p)
            .collect();
        builder = builder.allow(&name(*source), &name(*target), "file", &selected);
    }
    builder.build().expect("generated policy should be valid")
}

const FILE_PERMS: [&str; 6] = ["append", "getattr", "map", "open", "read", "write"];

/// Permissions selected by the low six bits of `bits`.
fn perm_set(bits: u8) -> BTreeSet<&'static str> {
    FILE_PERMS
        .iter()
        .enumerate()
        .filter(|(bit, _)| bits & (1 << bit) != 0)
        .map(|(_, p)| *p)
        .collect()
}

fn single_allow(perms: &BTreeSet<&str>) -> Policy {
    let perms: Vec<&str> = perms.iter().copied().collect();
    PolicyBuilder::new("perms")
        .class("file", None, &FILE_PERMS)
        .type_("a_t", &[])
        .type_("etc_t", &[])
        .allow("a_t", "etc_t", "file", &perms)
        .build()
        .expect("single-rule policy should be valid")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    #[test]
    fn stats_total_counts_every_record(forms in prop::collection::vec(0usize..5, 0..64)) {
        let mut stats = Stats::default();
        for &i in &forms {
            stats.record(FORMS[i]);
        }
        prop_assert_eq!(stats.total(), forms.len());
        prop_assert_eq!(stats.as_array().iter().sum::<usize>(), forms.len());
        prop_assert_eq!(stats.is_empty(), forms.is_empty());
    }

    #[test]
    fn stats_addition_is_componentwise(
        a in prop::collection::vec(0usize..5, 0..32),
        b in prop::collection::vec(0usize..5, 0..32),
    ) {
        let count = |forms: &[usize]| {
            let mut stats = Stats::default();
            for &i in forms {
                stats.record(FORMS[i]);
            }
            stats
        };
        let combined: Vec<usize> = a.iter().chain(&b).copied().collect();
        prop_assert_eq!(count(&a) + count(&b), count(&combined));
    }

    #[test]
    fn mask_contains_exactly_its_categories(selected in prop::collection::vec(any::<bool>(), 19)) {
        let chosen: Vec<Category> = Category::ALL
            .into_iter()
            .zip(&selected)
            .filter(|(_, keep)| **keep)
            .map(|(c, _)| c)
            .collect();
        let mask: CategoryMask = chosen.iter().copied().collect();

        prop_assert!(mask.validate().is_ok());
        prop_assert_eq!(mask.categories().collect::<Vec<_>>(), chosen.clone());
        for category in Category::ALL {
            prop_assert_eq!(mask.contains(category), chosen.contains(&category));
        }
        prop_assert_eq!(CategoryMask::from_bits(mask.bits()).unwrap(), mask);
    }

    #[test]
    fn unknown_mask_bits_rejected(bits in any::<u32>()) {
        let known = bits & CategoryMask::ALL.bits() == bits;
        prop_assert_eq!(CategoryMask::from_bits(bits).is_ok(), known);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn policy_has_no_differences_with_itself(shape in policy_shape()) {
        let policy = build_policy(&shape, None);
        let mut session = DiffSession::new(&policy, &policy, &[]).unwrap();
        session.run(CategoryMask::ALL).unwrap();
        prop_assert!(session.stats_for(CategoryMask::ALL).is_empty());
    }

    #[test]
    fn declared_rename_hides_the_rename(shape in policy_shape(), pick in any::<prop::sample::Index>()) {
        let renamed = pick.index(shape.types);
        let original = build_policy(&shape, None);
        let modified = build_policy(&shape, Some(renamed));
        let renames = [TypeRename::new(format!("t{renamed}_t"), "renamed_t")];

        let mut session = DiffSession::new(&original, &modified, &renames).unwrap();
        session.run(CategoryMask::ALL).unwrap();
        prop_assert!(session.stats_for(CategoryMask::ALL).is_empty());
    }

    #[test]
    fn undeclared_rename_shows_as_type_churn(shape in policy_shape(), pick in any::<prop::sample::Index>()) {
        let renamed = pick.index(shape.types);
        let original = build_policy(&shape, None);
        let modified = build_policy(&shape, Some(renamed));

        let mut session = DiffSession::new(&original, &modified, &[]).unwrap();
        session.run(CategoryMask::TYPES).unwrap();
        let stats = session.stats(Category::Types).unwrap();
        prop_assert_eq!((stats.added, stats.removed), (1, 1));
    }

    #[test]
    fn type_map_is_total(shape in policy_shape(), pick in any::<prop::sample::Index>()) {
        let renamed = pick.index(shape.types);
        let original = build_policy(&shape, None);
        let modified = build_policy(&shape, Some(renamed));
        let map = TypeMap::build(&original, &modified, &[]).unwrap();

        for (side, policy) in [(Side::Original, &original), (Side::Modified, &modified)] {
            for (id, _) in policy.types() {
                let pseudo = map.map_to_pseudo(id, side).unwrap();
                prop_assert!(map.pseudo_to_types(pseudo, side).contains(&id));
                prop_assert!(!map.is_hole(pseudo, side));
            }
        }
        // The renamed type is a hole on each side
        prop_assert_eq!(map.len(), shape.types + 1);
        prop_assert_eq!(map.holes(Side::Original), 1);
        prop_assert_eq!(map.holes(Side::Modified), 1);
    }

    #[test]
    fn repeated_runs_are_deterministic(shape in policy_shape(), pick in any::<prop::sample::Index>()) {
        let renamed = pick.index(shape.types);
        let original = build_policy(&shape, None);
        let modified = build_policy(&shape, Some(renamed));

        let render = || {
            let mut session = DiffSession::new(&original, &modified, &[]).unwrap();
            session.run(CategoryMask::ALL).unwrap();
            Category::ALL
                .into_iter()
                .flat_map(|c| session.items(c).iter().map(ToString::to_string).collect::<Vec<_>>())
                .collect::<Vec<_>>()
        };
        prop_assert_eq!(render(), render());
    }

    #[test]
    fn modified_rule_partitions_permissions(orig_bits in 1u8..64, mod_bits in 1u8..64) {
        let orig_perms = perm_set(orig_bits);
        let mod_perms = perm_set(mod_bits);
        let original = single_allow(&orig_perms);
        let modified = single_allow(&mod_perms);

        let mut session = DiffSession::new(&original, &modified, &[]).unwrap();
        session.run(CategoryMask::AVALLOW).unwrap();
        let items = session.items(Category::AvAllow);
        if orig_perms == mod_perms {
            prop_assert!(items.is_empty());
            return Ok(());
        }
        prop_assert_eq!(items.len(), 1);
        let rule = items[0].as_av_rule().unwrap();
        prop_assert_eq!(rule.form, DiffForm::Modified);

        let unchanged: BTreeSet<&str> = rule.perms.iter().map(String::as_str).collect();
        let added: BTreeSet<&str> = rule.added_perms.iter().map(String::as_str).collect();
        let removed: BTreeSet<&str> = rule.removed_perms.iter().map(String::as_str).collect();
        prop_assert!(unchanged.is_disjoint(&added));
        prop_assert!(unchanged.is_disjoint(&removed));
        prop_assert!(added.is_disjoint(&removed));

        let covered: BTreeSet<&str> = unchanged.iter().chain(&added).chain(&removed).copied().collect();
        let raw: BTreeSet<&str> = orig_perms.union(&mod_perms).copied().collect();
        prop_assert_eq!(covered, raw);
        let kept: BTreeSet<&str> = orig_perms.intersection(&mod_perms).copied().collect();
        prop_assert_eq!(unchanged, kept);
    }
}
