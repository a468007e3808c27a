// tests/process_tree.rs

mod common;
use crate::common::init_tracing;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use proptest::prelude::*;

use runasd::errors::RunAsError;
use runasd::process::mock::{FakeProcessManager, FakeProcessTable};
use runasd::process::{
    ProcessHandle, ProcessManager, SystemProcessManager, kill_descendants, resolve_launch_spec,
    split_arguments,
};

/// 1 ─┬─ 10 ─┬─ 100
///    │      └─ 101 ── 1000
///    └─ 11
/// 2 ── 20   (unrelated)
fn sample_table() -> FakeProcessTable {
    FakeProcessTable::new()
        .with_process(1, None)
        .with_process(10, Some(1))
        .with_process(100, Some(10))
        .with_process(101, Some(10))
        .with_process(1000, Some(101))
        .with_process(11, Some(1))
        .with_process(2, None)
        .with_process(20, Some(2))
}

#[test]
fn kills_every_descendant_children_first() {
    init_tracing();
    let table = sample_table();

    let killed = kill_descendants(&table, 1).unwrap();

    assert_eq!(killed, 5);
    assert_eq!(table.killed(), vec![100, 1000, 101, 10, 11]);

    let mut alive = table.alive();
    alive.sort();
    assert_eq!(alive, vec![1, 2, 20]);
}

#[test]
fn leaf_process_has_nothing_to_kill() {
    let table = sample_table();

    assert_eq!(kill_descendants(&table, 11).unwrap(), 0);
    assert!(table.killed().is_empty());
}

#[test]
fn pid_zero_is_skipped() {
    let table = FakeProcessTable::new().unreadable();

    assert_eq!(kill_descendants(&table, 0).unwrap(), 0);
}

#[test]
fn unreadable_process_list_is_a_permission_error() {
    let table = sample_table().unreadable();

    let err = kill_descendants(&table, 1).unwrap_err();

    assert!(matches!(err, RunAsError::Permission(_)), "got {err:?}");
}

#[test]
fn a_failed_kill_does_not_stop_the_walk() {
    init_tracing();
    let table = sample_table().failing_kill(10);

    let killed = kill_descendants(&table, 1).unwrap();

    assert_eq!(killed, 4);
    assert_eq!(table.killed(), vec![100, 1000, 101, 11]);
    assert!(table.alive().contains(&10));
}

#[test]
fn processes_that_vanished_are_not_counted() {
    let table = sample_table().vanishing(101);

    let killed = kill_descendants(&table, 1).unwrap();

    assert_eq!(killed, 4);
    assert!(!table.killed().contains(&101));
    assert!(!table.alive().contains(&101));
}

#[test]
fn cyclic_listing_terminates() {
    let table = FakeProcessTable::new()
        .with_process(5, Some(6))
        .with_process(6, Some(5))
        .with_process(7, Some(6));

    let killed = kill_descendants(&table, 5).unwrap();

    assert_eq!(killed, 2);
    assert_eq!(table.killed(), vec![7, 6]);
}

#[test]
fn terminate_with_children_walks_the_tree_then_kills_the_root() {
    init_tracing();
    let table = Arc::new(
        FakeProcessTable::new()
            .with_process(1000, None)
            .with_process(1500, Some(1000))
            .with_process(1501, Some(1500)),
    );
    let system = SystemProcessManager::with_table(table.clone());
    let fakes = FakeProcessManager::new();

    let mut process = fakes.create_process("/bin/app", "").unwrap();
    assert!(process.start().unwrap());

    system.terminate(process.as_mut(), true).unwrap();

    assert_eq!(table.killed(), vec![1501, 1500]);
    assert!(!process.is_started().unwrap());
}

#[test]
fn terminate_without_children_leaves_the_tree_alone() {
    let table = Arc::new(
        FakeProcessTable::new()
            .with_process(1000, None)
            .with_process(1500, Some(1000)),
    );
    let system = SystemProcessManager::with_table(table.clone());
    let fakes = FakeProcessManager::new();

    let mut process = fakes.create_process("/bin/app", "").unwrap();
    process.start().unwrap();

    system.terminate(process.as_mut(), false).unwrap();

    assert!(table.killed().is_empty());
    assert!(!process.is_started().unwrap());
}

#[test]
fn launch_spec_runs_from_the_executable_directory() {
    let spec = resolve_launch_spec("/opt/myapp/bin/myapp", "--port 8080").unwrap();

    assert_eq!(spec.program, std::path::PathBuf::from("/opt/myapp/bin/myapp"));
    assert_eq!(spec.working_dir, Some(std::path::PathBuf::from("/opt/myapp/bin")));
    assert_eq!(spec.args, vec!["--port", "8080"]);
}

#[test]
fn bare_program_name_is_looked_up_on_path() {
    let spec = resolve_launch_spec("sleep", "5").unwrap();

    assert_eq!(spec.program, std::path::PathBuf::from("sleep"));
    assert_eq!(spec.working_dir, None);
}

#[test]
fn executable_without_a_file_name_is_not_found() {
    for executable in ["", "/"] {
        let err = resolve_launch_spec(executable, "").unwrap_err();
        assert!(matches!(err, RunAsError::NotFound(_)), "{executable:?}: {err:?}");
    }
}

#[test]
fn quoted_arguments_stay_together() {
    assert_eq!(
        split_arguments(r#"--name "my app" -v 'two words' plain"#),
        vec!["--name", "my app", "-v", "two words", "plain"]
    );
    assert!(split_arguments("   ").is_empty());
}

// ---------------------------------------------------------------------------
// Property: random forests
// ---------------------------------------------------------------------------

/// Random forest: process `i` (pid `i + 1`) may only have a parent with a
/// smaller pid, so the listing is acyclic.
fn forest_strategy(max: usize) -> impl Strategy<Value = Vec<Option<u32>>> {
    (1..=max).prop_flat_map(|n| {
        proptest::collection::vec(proptest::option::of(any::<u32>()), n).prop_map(|raw| {
            raw.into_iter()
                .enumerate()
                .map(|(i, parent)| match (i, parent) {
                    (0, _) | (_, None) => None,
                    (i, Some(p)) => Some(p % i as u32 + 1),
                })
                .collect()
        })
    })
}

fn descendants(parents: &[Option<u32>], root: u32) -> HashSet<u32> {
    let mut children: HashMap<u32, Vec<u32>> = HashMap::new();
    for (i, parent) in parents.iter().enumerate() {
        if let Some(p) = parent {
            children.entry(*p).or_default().push(i as u32 + 1);
        }
    }

    let mut found = HashSet::new();
    let mut stack = vec![root];
    while let Some(pid) = stack.pop() {
        for child in children.get(&pid).into_iter().flatten() {
            if found.insert(*child) {
                stack.push(*child);
            }
        }
    }
    found
}

proptest! {
    #[test]
    fn kills_exactly_the_descendants_children_before_parents(
        parents in forest_strategy(40),
        root_index in any::<usize>(),
    ) {
        let root = (root_index % parents.len()) as u32 + 1;
        let table = parents
            .iter()
            .enumerate()
            .fold(FakeProcessTable::new(), |t, (i, parent)| t.with_process(i as u32 + 1, *parent));

        let killed = kill_descendants(&table, root).unwrap();
        let order = table.killed();

        let expected = descendants(&parents, root);
        prop_assert_eq!(killed, expected.len());
        prop_assert_eq!(order.iter().copied().collect::<HashSet<_>>(), expected);

        // Every process is killed after all of its own descendants.
        let position: HashMap<u32, usize> =
            order.iter().enumerate().map(|(i, pid)| (*pid, i)).collect();
        for pid in &order {
            for child in descendants(&parents, *pid) {
                prop_assert!(position[&child] < position[pid]);
            }
        }

        prop_assert!(table.alive().contains(&root));
    }
}
