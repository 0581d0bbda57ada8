use papy_core::{missing_artifacts, unbound_artifacts};
use papy_test_helpers::fixtures::{at, ProjectFixture};
use proptest::collection::btree_set;
use proptest::prelude::*;
use std::collections::BTreeSet;

#[test]
fn test_unbound_leaves_only_artifact_without_source() {
    let fx = ProjectFixture::new(1, 1);
    for name in ["A", "B", "C"] {
        fx.artifact(0, name, at(1));
    }
    for name in ["A", "C"] {
        fx.script(0, name, at(1));
    }
    let project = fx.project();
    assert_eq!(
        unbound_artifacts(fx.output(0), &project.folders).unwrap(),
        vec!["b"]
    );
    assert!(missing_artifacts(&project.folders, &project.output_folders)
        .unwrap()
        .is_empty());
}

fn names() -> impl Strategy<Value = BTreeSet<String>> {
    btree_set("[a-z][a-z0-9_]{0,7}", 0..12)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_unbound_is_set_difference(
        artifacts in names(),
        sources_a in names(),
        sources_b in names(),
    ) {
        let fx = ProjectFixture::new(2, 1);
        for name in &artifacts {
            fx.artifact(0, name, at(1));
        }
        for name in &sources_a {
            fx.script(0, name, at(1));
        }
        for name in &sources_b {
            fx.script(1, name, at(1));
        }

        let expected: Vec<String> = artifacts
            .iter()
            .filter(|n| !sources_a.contains(*n) && !sources_b.contains(*n))
            .cloned()
            .collect();
        let project = fx.project();
        prop_assert_eq!(
            unbound_artifacts(fx.output(0), &project.folders).unwrap(),
            expected
        );

        let missing: Vec<String> = sources_a
            .union(&sources_b)
            .filter(|n| !artifacts.contains(*n))
            .cloned()
            .collect();
        prop_assert_eq!(
            missing_artifacts(&project.folders, &project.output_folders).unwrap(),
            missing
        );
    }
}
