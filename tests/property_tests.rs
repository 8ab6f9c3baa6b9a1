//! Property-based tests.
//!
//! These tests use proptest to check the language share arithmetic and the
//! walk order on randomly generated commit graphs.

use std::collections::{HashMap, HashSet};

use proptest::prelude::*;

use hubkit::core::types::{BranchName, Oid};
use hubkit::forge::mock::MockForge;
use hubkit::forge::schema::ApiCommitPointer;
use hubkit::forge::Forge;
use hubkit::history::{extract_hash, AncestryWalker, DuplicatePolicy, LooseReference, WalkOptions};
use hubkit::service::mapper::language_shares;

fn id(i: usize) -> String {
    format!("{:040x}", i + 1)
}

/// A DAG as parent lists: commit `i` only points at commits `> i`, so commit
/// 0 is the tip and the graph cannot contain a cycle.
fn dag() -> impl Strategy<Value = Vec<Vec<usize>>> {
    (1usize..9).prop_flat_map(|n| {
        let nodes: Vec<_> = (0..n)
            .map(|i| {
                let later = (i + 1)..n.max(i + 2);
                prop::collection::vec(later, 0..3).prop_map(move |mut parents| {
                    parents.retain(|&p| p < n);
                    parents.sort_unstable();
                    parents.dedup();
                    parents
                })
            })
            .collect();
        nodes
    })
}

fn preorder(graph: &[Vec<usize>], node: usize, out: &mut Vec<usize>) {
    out.push(node);
    for &parent in &graph[node] {
        preorder(graph, parent, out);
    }
}

fn forge_for(graph: &[Vec<usize>]) -> MockForge {
    let mut forge = MockForge::new();
    for (i, parents) in graph.iter().enumerate() {
        let parent_ids: Vec<String> = parents.iter().map(|&p| id(p)).collect();
        let parent_refs: Vec<&str> = parent_ids.iter().map(String::as_str).collect();
        forge = forge.with_commit("o", "r", &id(i), "c", "2024-01-01T00:00:00Z", &parent_refs);
    }
    forge
}

fn walk_ids(forge: &MockForge, policy: DuplicatePolicy) -> Vec<String> {
    let tip = LooseReference::branch_tip(&ApiCommitPointer {
        sha: Some(id(0)),
        url: Some(format!("{}/repos/o/r/commits/{}", forge.api_base(), id(0))),
    });
    let options = WalkOptions {
        duplicates: policy,
        ..WalkOptions::default()
    };
    let rt = tokio::runtime::Runtime::new().unwrap();
    let set = rt
        .block_on(AncestryWalker::new(forge, options).walk(&tip, "o", "r"))
        .unwrap();
    set.hashes().iter().map(|h| h.as_str().to_string()).collect()
}

proptest! {
    #[test]
    fn shares_sum_to_one(
        langs in prop::collection::hash_map("[A-Za-z]{1,8}", 0u64..1_000_000, 0..8)
    ) {
        let languages: HashMap<String, u64> = langs;
        let shares = language_shares(&languages);
        let total: u64 = languages.values().sum();

        if total == 0 {
            prop_assert!(shares.is_empty());
        } else {
            let sum: f64 = shares.iter().map(|l| l.share).sum();
            prop_assert!((sum - 1.0).abs() < 1e-9, "sum was {}", sum);
            for pair in shares.windows(2) {
                prop_assert!(pair[0].share >= pair[1].share);
            }
        }
    }

    #[test]
    fn walk_matches_recursive_preorder(graph in dag()) {
        let forge = forge_for(&graph);

        let mut expected = Vec::new();
        preorder(&graph, 0, &mut expected);
        let expected: Vec<String> = expected.into_iter().map(id).collect();

        prop_assert_eq!(walk_ids(&forge, DuplicatePolicy::PreserveMultiplicity), expected.clone());

        let mut seen = HashSet::new();
        let first_seen: Vec<String> = expected
            .into_iter()
            .filter(|h| seen.insert(h.clone()))
            .collect();
        prop_assert_eq!(walk_ids(&forge, DuplicatePolicy::DedupeByHash), first_seen);
    }

    #[test]
    fn each_commit_fetched_at_most_once(graph in dag()) {
        let forge = forge_for(&graph);
        walk_ids(&forge, DuplicatePolicy::PreserveMultiplicity);
        for i in 0..graph.len() {
            prop_assert!(forge.commit_fetches(&id(i)) <= 1);
        }
    }

    #[test]
    fn extracted_hash_matches_url_suffix(hex in "[0-9a-f]{40}") {
        let reference = LooseReference::parent(&ApiCommitPointer {
            sha: Some(hex.clone()),
            url: Some(format!("https://api.github.com/repos/o/r/git/commits/{}", hex)),
        });
        let hash = extract_hash(&reference, "https://api.github.com", "o", "r").unwrap();
        prop_assert_eq!(hash, Oid::new(hex).unwrap());
    }

    #[test]
    fn extra_path_segment_rejected(hex in "[0-9a-f]{40}", tail in "[a-z]{1,6}") {
        let reference = LooseReference::parent(&ApiCommitPointer {
            sha: None,
            url: Some(format!("https://api.github.com/repos/o/r/git/commits/{}/{}", hex, tail)),
        });
        prop_assert!(extract_hash(&reference, "https://api.github.com", "o", "r").is_err());
    }

    #[test]
    fn simple_branch_names_accepted(name in "[a-z][a-z0-9-]{0,20}(/[a-z][a-z0-9-]{0,20})?") {
        prop_assert!(BranchName::new(name).is_ok());
    }
}
