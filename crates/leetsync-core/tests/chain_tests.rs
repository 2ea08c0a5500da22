//! Tests for the commit chain against a real repository

use leetsync_core::artifact::SolutionArtifact;
use leetsync_core::chain::{CommitChain, CommitChainState, CommitUnit};
use leetsync_core::naming::Identity;
use leetsync_core::retry::RetryPolicy;
use leetsync_git::{LocalStore, ObjectId, RepositoryStore};
use leetsync_test_utils::git::{
    DEFAULT_BRANCH, branch_tip, commit_files, first_parent_chain, list_files, read_file,
    temp_bare_repo,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn setup() -> (TempDir, LocalStore) {
    let (temp, repo) = temp_bare_repo();
    (temp, LocalStore::from_repository(repo))
}

fn unit(folder: &str, index: u32, code: &str) -> CommitUnit {
    let identity = Identity {
        folder: folder.to_string(),
        solution_index: index,
        extension: "py",
    };
    CommitUnit {
        artifacts: vec![SolutionArtifact::solution(&identity, code)],
        message: format!("Add {}", identity.solution_path()),
    }
}

#[test]
fn test_units_form_linear_history() {
    let (_temp, store) = setup();
    let retry = RetryPolicy::immediate(1);
    let chain = CommitChain::new(&store, DEFAULT_BRANCH, false, &retry);

    let mut state = CommitChainState::from_tip(None);
    let mut created = Vec::new();
    for (n, folder) in ["0001_two_sum", "0002_add_two_numbers", "0003_longest"].iter().enumerate() {
        state = chain.apply(&state, &unit(folder, 1, &format!("# {n}"))).unwrap();
        created.push(state.parent.clone().unwrap());
    }

    let history = first_parent_chain(store.repository(), DEFAULT_BRANCH);
    let ids: Vec<ObjectId> = history.iter().map(|link| link.id.into()).collect();
    assert_eq!(ids, created);

    assert!(history[0].parents.is_empty());
    for pair in history.windows(2) {
        assert_eq!(pair[1].parents, vec![pair[0].id]);
    }
}

#[test]
fn test_each_tree_builds_on_previous_unit() {
    let (_temp, store) = setup();
    commit_files(store.repository(), DEFAULT_BRANCH, &[("README.md", "root")], "seed");
    let retry = RetryPolicy::immediate(1);
    let chain = CommitChain::new(&store, DEFAULT_BRANCH, false, &retry);

    let tip = store.branch_tip(DEFAULT_BRANCH).unwrap();
    let state = CommitChainState::from_tip(tip.as_ref());
    let state = chain.apply(&state, &unit("0001_two_sum", 1, "a")).unwrap();
    chain.apply(&state, &unit("0001_two_sum", 2, "b")).unwrap();

    assert_eq!(
        list_files(store.repository(), DEFAULT_BRANCH),
        [
            "0001_two_sum/solution_1.py",
            "0001_two_sum/solution_2.py",
            "README.md"
        ]
    );
    assert_eq!(
        read_file(store.repository(), DEFAULT_BRANCH, "0001_two_sum/solution_1.py").as_deref(),
        Some("a\n")
    );
}

#[test]
fn test_state_tracks_new_tip() {
    let (_temp, store) = setup();
    let retry = RetryPolicy::immediate(1);
    let chain = CommitChain::new(&store, DEFAULT_BRANCH, false, &retry);

    let state = chain
        .apply(&CommitChainState::default(), &unit("a", 1, "x"))
        .unwrap();
    let tip = store.branch_tip(DEFAULT_BRANCH).unwrap();
    assert_eq!(state, CommitChainState::from_tip(tip.as_ref()));
}

#[test]
fn test_concurrent_move_is_fatal() {
    let (_temp, store) = setup();
    commit_files(store.repository(), DEFAULT_BRANCH, &[("README.md", "root")], "seed");
    let retry = RetryPolicy::immediate(3);
    let chain = CommitChain::new(&store, DEFAULT_BRANCH, false, &retry);

    let tip = store.branch_tip(DEFAULT_BRANCH).unwrap();
    let state = CommitChainState::from_tip(tip.as_ref());
    let external = commit_files(
        store.repository(),
        DEFAULT_BRANCH,
        &[("other.txt", "x")],
        "external",
    );

    let err = chain.apply(&state, &unit("a", 1, "x")).unwrap_err();
    assert!(err.is_ref_conflict(), "unexpected error: {err:?}");
    assert_eq!(branch_tip(store.repository(), DEFAULT_BRANCH), Some(external));
}

#[test]
fn test_unborn_branch_created_elsewhere_is_fatal() {
    let (_temp, store) = setup();
    let retry = RetryPolicy::immediate(1);
    let chain = CommitChain::new(&store, DEFAULT_BRANCH, false, &retry);
    commit_files(store.repository(), DEFAULT_BRANCH, &[("other.txt", "x")], "external");

    let err = chain
        .apply(&CommitChainState::default(), &unit("a", 1, "x"))
        .unwrap_err();
    assert!(err.is_ref_conflict());
}

#[test]
fn test_forced_mode_overwrites_concurrent_move() {
    let (_temp, store) = setup();
    let seed = commit_files(store.repository(), DEFAULT_BRANCH, &[("README.md", "root")], "seed");
    let retry = RetryPolicy::immediate(1);
    let chain = CommitChain::new(&store, DEFAULT_BRANCH, true, &retry);

    let tip = store.branch_tip(DEFAULT_BRANCH).unwrap();
    let state = CommitChainState::from_tip(tip.as_ref());
    commit_files(store.repository(), DEFAULT_BRANCH, &[("other.txt", "x")], "external");

    let state = chain.apply(&state, &unit("a", 1, "x")).unwrap();

    let history = first_parent_chain(store.repository(), DEFAULT_BRANCH);
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, seed);
    assert_eq!(ObjectId::from(history[1].id), state.parent.unwrap());
    assert_eq!(read_file(store.repository(), DEFAULT_BRANCH, "other.txt"), None);
}
