//! Property-based tests of the task service against a reference model.
//!
//! Uses proptest to verify:
//! 1. After any sequence of create/update/delete, `list` equals the model.
//! 2. Rejected operations never change the collection.
//! 3. Created titles are trimmed and ids are unique.

#![allow(clippy::unwrap_used)]

use std::collections::HashSet;
use std::sync::Arc;

use proptest::prelude::*;
use tasklist_proto::task::{CreateTaskRequest, Task, TaskId, UpdateTaskRequest};
use tasklist_server::service::{TaskError, TaskService};
use tasklist_server::store::MemoryStore;

/// One step of a generated workload. Indices pick an existing task modulo
/// the current length; `None` targets an unknown id.
#[derive(Debug, Clone)]
enum Op {
    Create {
        title: String,
        description: Option<String>,
    },
    Update {
        target: Option<usize>,
        title: Option<String>,
        description: Option<String>,
        completed: Option<bool>,
    },
    Delete {
        target: Option<usize>,
    },
}

/// Titles include blank strings so validation failures are exercised.
fn arb_title() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9 ]{1,24}",
        Just(String::new()),
        Just("   ".to_string()),
    ]
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (arb_title(), proptest::option::of("[a-z ]{0,16}"))
            .prop_map(|(title, description)| Op::Create { title, description }),
        (
            proptest::option::of(0usize..16),
            proptest::option::of(arb_title()),
            proptest::option::of("[a-z ]{0,16}"),
            proptest::option::of(any::<bool>()),
        )
            .prop_map(|(target, title, description, completed)| Op::Update {
                target,
                title,
                description,
                completed,
            }),
        proptest::option::of(0usize..16).prop_map(|target| Op::Delete { target }),
    ]
}

fn pick(model: &[Task], target: Option<usize>) -> TaskId {
    match target {
        Some(i) if !model.is_empty() => model[i % model.len()].id.clone(),
        _ => TaskId::from("does-not-exist"),
    }
}

proptest! {
    #[test]
    fn list_matches_model(ops in prop::collection::vec(arb_op(), 1..40)) {
        let svc = TaskService::new(Arc::new(MemoryStore::new()));
        let mut model: Vec<Task> = Vec::new();
        let mut seen_ids = HashSet::new();

        for op in ops {
            match op {
                Op::Create { title, description } => {
                    let result = svc.create(CreateTaskRequest {
                        title: Some(title.clone()),
                        description: description.clone(),
                    });
                    if title.trim().is_empty() {
                        prop_assert!(matches!(result, Err(TaskError::Validation(_))));
                    } else {
                        let task = result.unwrap();
                        prop_assert_eq!(&task.title, title.trim());
                        prop_assert_eq!(&task.description, &description.unwrap_or_default());
                        prop_assert!(!task.completed);
                        prop_assert_eq!(task.created_at, task.updated_at);
                        prop_assert!(seen_ids.insert(task.id.clone()));
                        model.push(task);
                    }
                }
                Op::Update { target, title, description, completed } => {
                    let id = pick(&model, target);
                    let result = svc.update(&id, UpdateTaskRequest {
                        title: title.clone(),
                        description: description.clone(),
                        completed,
                    });
                    match model.iter_mut().find(|t| t.id == id) {
                        None => prop_assert!(matches!(result, Err(TaskError::NotFound(_)))),
                        Some(_) if title.as_deref().is_some_and(|t| t.trim().is_empty()) => {
                            prop_assert!(matches!(result, Err(TaskError::Validation(_))));
                        }
                        Some(entry) => {
                            let updated = result.unwrap();
                            prop_assert!(updated.updated_at > entry.updated_at);
                            prop_assert_eq!(updated.created_at, entry.created_at);
                            if let Some(title) = title {
                                entry.title = title.trim().to_string();
                            }
                            if let Some(description) = description {
                                entry.description = description;
                            }
                            if let Some(completed) = completed {
                                entry.completed = completed;
                            }
                            entry.updated_at = updated.updated_at;
                            prop_assert_eq!(&updated, &*entry);
                        }
                    }
                }
                Op::Delete { target } => {
                    let id = pick(&model, target);
                    let result = svc.delete(&id);
                    match model.iter().position(|t| t.id == id) {
                        None => prop_assert!(matches!(result, Err(TaskError::NotFound(_)))),
                        Some(index) => {
                            let expected = model.remove(index);
                            prop_assert_eq!(result.unwrap(), expected);
                        }
                    }
                }
            }
            prop_assert_eq!(svc.list().unwrap(), model.clone());
        }
    }
}
