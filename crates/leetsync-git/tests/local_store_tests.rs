//! Tests for the git2-backed repository store

use leetsync_git::{Error, LocalStore, ObjectId, RepositoryStore, TreeEntry};
use leetsync_test_utils::git::{
    branch_tip, commit_files, first_parent_chain, list_files, read_file, temp_bare_repo,
    worktree_repo,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn setup_bare() -> (TempDir, LocalStore) {
    let (temp, repo) = temp_bare_repo();
    (temp, LocalStore::from_repository(repo))
}

#[test]
fn test_open_missing_repository() {
    let temp = TempDir::new().unwrap();
    let result = LocalStore::open(temp.path().join("nope"));
    assert!(matches!(result, Err(Error::RepositoryNotFound { .. })));
}

#[test]
fn test_default_branch_follows_head() {
    let (_temp, store) = setup_bare();
    assert_eq!(store.default_branch().unwrap(), "main");
}

#[test]
fn test_unborn_branch_has_no_tip() {
    let (_temp, store) = setup_bare();
    assert_eq!(store.branch_tip("main").unwrap(), None);
}

#[test]
fn test_branch_tip_reports_commit_and_tree() {
    let (_temp, store) = setup_bare();
    let commit = commit_files(store.repository(), "main", &[("a.txt", "a")], "first");

    let tip = store.branch_tip("main").unwrap().unwrap();
    assert_eq!(tip.commit, ObjectId::from(commit));

    let tree_id = store.repository().find_commit(commit).unwrap().tree_id();
    assert_eq!(tip.tree, ObjectId::from(tree_id));
}

#[test]
fn test_create_tree_layers_on_base() {
    let (_temp, store) = setup_bare();
    commit_files(
        store.repository(),
        "main",
        &[("0001_two_sum/README.md", "# Two Sum"), ("README.md", "root")],
        "seed",
    );
    let tip = store.branch_tip("main").unwrap().unwrap();

    let tree = store
        .create_tree(
            Some(&tip.tree),
            &[TreeEntry::file("0001_two_sum/solution_1.py", "print(1)")],
        )
        .unwrap();

    let mut paths = store.list_paths(&tree).unwrap();
    paths.sort();
    assert_eq!(
        paths,
        vec![
            "0001_two_sum/README.md".to_string(),
            "0001_two_sum/solution_1.py".to_string(),
            "README.md".to_string(),
        ]
    );
}

#[test]
fn test_create_tree_without_base_starts_empty() {
    let (_temp, store) = setup_bare();
    let tree = store
        .create_tree(None, &[TreeEntry::file("0009_palindrome_number/solution_1.py", "x")])
        .unwrap();
    assert_eq!(
        store.list_paths(&tree).unwrap(),
        vec!["0009_palindrome_number/solution_1.py".to_string()]
    );
}

#[test]
fn test_create_tree_rejects_escaping_paths() {
    let (_temp, store) = setup_bare();
    let result = store.create_tree(None, &[TreeEntry::file("../outside.txt", "x")]);
    assert!(matches!(result, Err(Error::InvalidPath { .. })));
}

#[test]
fn test_commit_and_advance_branch() {
    let (_temp, store) = setup_bare();
    let tree = store
        .create_tree(None, &[TreeEntry::file("notes.md", "hello")])
        .unwrap();
    let commit = store.create_commit(&tree, &[], "first").unwrap();

    // Creating the commit alone must not move anything
    assert_eq!(branch_tip(store.repository(), "main"), None);

    store.update_branch("main", &commit, None, false).unwrap();
    assert_eq!(
        read_file(store.repository(), "main", "notes.md").as_deref(),
        Some("hello")
    );
}

#[test]
fn test_update_branch_rejects_stale_expectation() {
    let (_temp, store) = setup_bare();
    let first = ObjectId::from(commit_files(store.repository(), "main", &[("a", "1")], "one"));
    // Someone else advances the branch
    commit_files(store.repository(), "main", &[("b", "2")], "external");

    let tree = store
        .create_tree(None, &[TreeEntry::file("c", "3")])
        .unwrap();
    let ours = store.create_commit(&tree, &[first.clone()], "ours").unwrap();

    let result = store.update_branch("main", &ours, Some(&first), false);
    assert!(matches!(result, Err(Error::RefConflict { .. })), "got {result:?}");

    // Branch still carries the external commit
    let chain = first_parent_chain(store.repository(), "main");
    assert_eq!(chain.last().unwrap().message, "external");
}

#[test]
fn test_update_branch_rejects_creating_existing_branch() {
    let (_temp, store) = setup_bare();
    commit_files(store.repository(), "main", &[("a", "1")], "one");

    let tree = store.create_tree(None, &[TreeEntry::file("b", "2")]).unwrap();
    let commit = store.create_commit(&tree, &[], "orphan").unwrap();

    let result = store.update_branch("main", &commit, None, false);
    assert!(matches!(result, Err(Error::RefConflict { .. })));
}

#[test]
fn test_forced_update_overwrites_competing_write() {
    let (_temp, store) = setup_bare();
    let first = ObjectId::from(commit_files(store.repository(), "main", &[("a", "1")], "one"));
    commit_files(store.repository(), "main", &[("b", "2")], "external");

    let tree = store.create_tree(None, &[TreeEntry::file("c", "3")]).unwrap();
    let ours = store.create_commit(&tree, &[first.clone()], "ours").unwrap();

    store.update_branch("main", &ours, Some(&first), true).unwrap();
    let tip = store.branch_tip("main").unwrap().unwrap();
    assert_eq!(tip.commit, ours);
}

#[test]
fn test_history_pages_newest_first() {
    let (_temp, store) = setup_bare();
    for i in 0..5 {
        commit_files(store.repository(), "main", &[("f", &i.to_string())], &format!("commit {i}"));
    }
    let tip = store.branch_tip("main").unwrap().unwrap();

    let first_page = store.history(&tip.commit, 0, 2).unwrap();
    let messages: Vec<&str> = first_page.iter().map(|c| c.message.as_str()).collect();
    assert_eq!(messages, vec!["commit 4", "commit 3"]);

    let last_page = store.history(&tip.commit, 2, 2).unwrap();
    assert_eq!(last_page.len(), 1);
    assert_eq!(last_page[0].message, "commit 0");

    assert!(store.history(&tip.commit, 3, 2).unwrap().is_empty());
}

#[test]
fn test_worktree_follows_branch_update() {
    let temp = TempDir::new().unwrap();
    let repo = worktree_repo(temp.path());
    let store = LocalStore::from_repository(repo).with_author("Sync Bot", "bot@example.com");

    let tree = store
        .create_tree(None, &[TreeEntry::file("0001_two_sum/solution_1.py", "pass\n")])
        .unwrap();
    let commit = store.create_commit(&tree, &[], "Add solution").unwrap();
    store.update_branch("main", &commit, None, false).unwrap();

    let on_disk = std::fs::read_to_string(temp.path().join("0001_two_sum/solution_1.py")).unwrap();
    assert_eq!(on_disk, "pass\n");

    let author = store
        .repository()
        .find_commit(git2::Oid::from_str(commit.as_str()).unwrap())
        .unwrap()
        .author()
        .name()
        .map(str::to_string);
    assert_eq!(author.as_deref(), Some("Sync Bot"));
    assert_eq!(
        list_files(store.repository(), "main"),
        vec!["0001_two_sum/solution_1.py".to_string()]
    );
}

#[test]
fn test_uncommitted_edits_survive_branch_update() {
    let temp = TempDir::new().unwrap();
    let repo = worktree_repo(temp.path());
    let seed = commit_files(&repo, "main", &[("notes.md", "original\n")], "seed");
    repo.checkout_head(Some(git2::build::CheckoutBuilder::default().force()))
        .unwrap();
    std::fs::write(temp.path().join("notes.md"), "my uncommitted edit\n").unwrap();
    let store = LocalStore::from_repository(repo);

    let base = store.branch_tip("main").unwrap().unwrap();
    let tree = store
        .create_tree(
            Some(&base.tree),
            &[TreeEntry::file("0001_two_sum/solution_1.py", "pass\n")],
        )
        .unwrap();
    let commit = store
        .create_commit(&tree, &[base.commit.clone()], "Add solution")
        .unwrap();
    store
        .update_branch("main", &commit, Some(&ObjectId::from(seed)), false)
        .unwrap();

    let notes = std::fs::read_to_string(temp.path().join("notes.md")).unwrap();
    assert_eq!(notes, "my uncommitted edit\n");
    assert_eq!(
        branch_tip(store.repository(), "main").map(ObjectId::from),
        Some(commit)
    );
    assert_eq!(
        read_file(store.repository(), "main", "0001_two_sum/solution_1.py").as_deref(),
        Some("pass\n")
    );
}

#[test]
fn test_untracked_files_do_not_block_checkout() {
    let temp = TempDir::new().unwrap();
    let repo = worktree_repo(temp.path());
    std::fs::write(temp.path().join("scratch.txt"), "mine\n").unwrap();
    let store = LocalStore::from_repository(repo);

    let tree = store
        .create_tree(None, &[TreeEntry::file("0001_two_sum/solution_1.py", "pass\n")])
        .unwrap();
    let commit = store.create_commit(&tree, &[], "Add solution").unwrap();
    store.update_branch("main", &commit, None, false).unwrap();

    assert!(temp.path().join("0001_two_sum/solution_1.py").exists());
    let scratch = std::fs::read_to_string(temp.path().join("scratch.txt")).unwrap();
    assert_eq!(scratch, "mine\n");
}
