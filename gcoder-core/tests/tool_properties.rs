mod common;

use anyhow::Result;
use common::TestEnv;
use gcoder_core::tools::{ToolErrorKind, names};
use serde_json::{Value, json};
use std::time::{Duration, Instant};

/// Arguments that make each builtin fail inside its own execution path.
fn failing_args(tool: &str) -> Value {
    match tool {
        names::READ => json!({"file_path": "missing.txt"}),
        names::WRITE => json!({"file_path": "blocker/inner.txt", "content": "x"}),
        names::EDIT => json!({"file_path": "missing.txt", "old_text": "a", "new_text": "b"}),
        names::GLOB => json!({"pattern": "[unclosed"}),
        names::BASH => json!({"command": "exit 3"}),
        names::GIT_STATUS | names::GIT_DIFF => json!({"path": "missing_dir"}),
        names::GIT_COMMIT => json!({"message": "m", "path": "missing_dir"}),
        names::GREP => json!({"pattern": "(unclosed"}),
        names::ANALYZE => json!({"file_path": "missing.py"}),
        names::MULTI_EDIT => json!({"edits": [{"file_path": "missing.txt", "old_text": "a", "new_text": "b"}]}),
        names::CREATE_PROJECT => json!({"project_name": "blocker", "files": []}),
        names::REFACTOR => json!({"operations": [{"type": "rename", "file_path": "missing.py", "old_name": "a", "new_name": "b"}]}),
        names::BACKUP => json!({"files": ["missing.txt"]}),
        _ => json!({}),
    }
}

#[tokio::test]
async fn every_builtin_turns_failures_into_results() -> Result<()> {
    let env = TestEnv::new()?;
    env.create_test_file("blocker", "a regular file, not a directory")?;

    for name in env.registry.available_tools() {
        let result = env.registry.execute_tool(&name, failing_args(&name)).await;
        assert!(!result.is_success(), "{name} should fail");
        assert!(
            result.error().is_some_and(|e| !e.is_empty()),
            "{name} should report an error"
        );
    }
    assert_eq!(
        env.sink.count("tool_executed"),
        env.registry.available_tools().len()
    );
    Ok(())
}

#[tokio::test]
async fn malformed_arguments_are_results_too() -> Result<()> {
    let env = TestEnv::new()?;
    for name in env.registry.available_tools() {
        let result = env.registry.execute_tool(&name, json!({"unexpected": 1})).await;
        if !result.is_success() {
            assert!(result.error().is_some_and(|e| !e.is_empty()), "{name}");
        }
    }
    Ok(())
}

#[tokio::test]
async fn unknown_tool_names_the_tool() -> Result<()> {
    let env = TestEnv::new()?;
    let result = env.registry.execute_tool("nonexistent", json!({})).await;

    assert!(!result.is_success());
    assert!(result.error().is_some_and(|e| e.contains("nonexistent")));
    assert_eq!(std::fs::read_dir(env.path())?.count(), 0);
    Ok(())
}

#[tokio::test]
async fn edit_replaces_every_occurrence() -> Result<()> {
    let env = TestEnv::new()?;
    env.create_test_file("notes.txt", "foo one\nfoo two\nfoo three\n")?;

    let result = env
        .registry
        .execute_tool(
            names::EDIT,
            json!({"file_path": "notes.txt", "old_text": "foo", "new_text": "bar"}),
        )
        .await;

    assert!(result.is_success());
    assert_eq!(result.metadata_value("replacements"), Some(&json!(3)));
    let content = env.read("notes.txt")?;
    assert_eq!(content.matches("foo").count(), 0);
    assert_eq!(content.matches("bar").count(), 3);
    Ok(())
}

#[tokio::test]
async fn edit_without_match_leaves_file_untouched() -> Result<()> {
    let env = TestEnv::new()?;
    let original = "line one\r\nline two\n";
    env.create_test_file("notes.txt", original)?;

    let result = env
        .registry
        .execute_tool(
            names::EDIT,
            json!({"file_path": "notes.txt", "old_text": "absent", "new_text": "x"}),
        )
        .await;

    assert!(!result.is_success());
    assert_eq!(result.error_kind(), Some(ToolErrorKind::PreconditionFailed));
    assert_eq!(std::fs::read(env.path().join("notes.txt"))?, original.as_bytes());
    Ok(())
}

#[tokio::test]
async fn multi_edit_succeeds_when_any_item_succeeds() -> Result<()> {
    let env = TestEnv::new()?;
    env.create_test_file("ok.txt", "alpha beta")?;

    let result = env
        .registry
        .execute_tool(
            names::MULTI_EDIT,
            json!({"edits": [
                {"file_path": "missing.txt", "old_text": "alpha", "new_text": "x"},
                {"file_path": "ok.txt", "old_text": "alpha", "new_text": "gamma"}
            ]}),
        )
        .await;

    assert!(result.is_success());
    assert_eq!(result.metadata_value("total_edits"), Some(&json!(2)));
    assert_eq!(result.metadata_value("successful_edits"), Some(&json!(1)));
    assert_eq!(env.read("ok.txt")?, "gamma beta");
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn bash_timeout_is_distinct_from_exit_failure() -> Result<()> {
    let env = TestEnv::new()?;

    let started = Instant::now();
    let timed_out = env
        .registry
        .execute_tool(names::BASH, json!({"command": "sleep 5", "timeout": 1}))
        .await;
    assert!(started.elapsed() < Duration::from_secs(4));
    assert_eq!(timed_out.error_kind(), Some(ToolErrorKind::Timeout));

    let exited = env
        .registry
        .execute_tool(names::BASH, json!({"command": "exit 2"}))
        .await;
    assert!(!exited.is_success());
    assert_ne!(exited.error_kind(), Some(ToolErrorKind::Timeout));
    Ok(())
}

#[tokio::test]
async fn bash_denylist_blocks_before_spawning() -> Result<()> {
    let env = TestEnv::new()?;
    env.create_test_file("keep.txt", "still here")?;

    let result = env
        .registry
        .execute_tool(names::BASH, json!({"command": "rm -rf /"}))
        .await;

    assert!(!result.is_success());
    assert_eq!(result.error_kind(), Some(ToolErrorKind::PolicyBlocked));
    assert_eq!(env.read("keep.txt")?, "still here");
    Ok(())
}

#[tokio::test]
async fn glob_is_sorted_and_repeatable() -> Result<()> {
    let env = TestEnv::new()?;
    for name in ["b.txt", "a.txt", "nested/c.txt", "skip.md"] {
        env.create_test_file(name, "x")?;
    }

    let first = env.registry.execute_tool(names::GLOB, json!({"pattern": "*.txt"})).await;
    let second = env.registry.execute_tool(names::GLOB, json!({"pattern": "*.txt"})).await;

    let items = first
        .content()
        .and_then(|c| c.as_sequence())
        .map(<[String]>::to_vec)
        .unwrap_or_default();
    assert!(!items.is_empty());
    let mut sorted = items.clone();
    sorted.sort();
    assert_eq!(items, sorted);
    assert_eq!(first.content(), second.content());
    assert!(items.iter().all(|p| p.ends_with(".txt")));
    Ok(())
}

#[tokio::test]
async fn create_project_twice_overwrites_files() -> Result<()> {
    let env = TestEnv::new()?;
    let args = |body: &str| {
        json!({
            "project_name": "demo",
            "files": [{"path": "main.py", "content": body}]
        })
    };

    let first = env.registry.execute_tool(names::CREATE_PROJECT, args("v1")).await;
    let second = env.registry.execute_tool(names::CREATE_PROJECT, args("v2")).await;

    assert!(first.is_success());
    assert!(second.is_success());
    assert_eq!(second.metadata_value("files_created"), Some(&json!(1)));
    assert_eq!(env.read("demo/main.py")?, "v2");
    Ok(())
}

#[tokio::test]
async fn grep_no_match_differs_from_bad_pattern() -> Result<()> {
    let env = TestEnv::new()?;
    env.create_test_file("src/lib.py", "def main():\n    pass\n")?;

    let empty = env
        .registry
        .execute_tool(names::GREP, json!({"pattern": "zzz_not_present"}))
        .await;
    assert!(empty.is_success());
    assert!(empty.content().and_then(|c| c.as_sequence()).is_some_and(<[String]>::is_empty));

    let broken = env
        .registry
        .execute_tool(names::GREP, json!({"pattern": "(unclosed"}))
        .await;
    assert!(!broken.is_success());
    assert!(broken.error().is_some_and(|e| !e.is_empty()));
    Ok(())
}
