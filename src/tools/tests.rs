use super::*;
use serde_json::json;
use std::fs;

fn call(name: &str, args: Value) -> ToolInvocation {
    ToolInvocation::new("call_1", name, args.to_string())
}

fn scratch() -> (tempfile::TempDir, ToolRegistry) {
    let dir = tempfile::tempdir().unwrap();
    let registry = ToolRegistry::with_builtins(dir.path().to_path_buf());
    (dir, registry)
}

#[test]
fn test_registry_with_builtins() {
    let registry = ToolRegistry::with_builtins(PathBuf::from("."));
    assert_eq!(
        registry.names(),
        vec![
            "read_file",
            "list_dir",
            "grep_search",
            "file_search",
            "edit_file",
            "delete_file",
            "run_terminal_cmd",
        ]
    );
    let specs = registry.specs();
    assert_eq!(specs.len(), 7);
    assert_eq!(specs[0].parameters["required"], json!(["path"]));
    assert_eq!(
        specs[6].parameters["required"],
        json!(["command", "is_background"])
    );
}

#[tokio::test]
async fn test_read_file_slice_and_whole() {
    let (dir, registry) = scratch();
    fs::write(dir.path().join("notes.txt"), "l1\nl2\nl3\nl4\n").unwrap();

    let result = registry
        .dispatch(&call("read_file", json!({"path": "notes.txt", "start": 2, "end": 3})))
        .await;
    assert!(result.is_ok());
    assert_eq!(result.call_id, "call_1");
    assert_eq!(result.payload["content"], "l2\nl3");

    let result = registry
        .dispatch(&call("read_file", json!({"path": "notes.txt"})))
        .await;
    assert_eq!(result.payload["content"], "l1\nl2\nl3\nl4\n");
}

#[tokio::test]
async fn test_read_file_nonexistent() {
    let (_dir, registry) = scratch();
    let result = registry
        .dispatch(&call("read_file", json!({"path": "nonexistent_file_xyz.txt"})))
        .await;
    assert_eq!(result.outcome, Outcome::Failure);
    assert_eq!(result.payload["ok"], false);
    assert_eq!(result.payload["kind"], "io");
}

#[tokio::test]
async fn test_read_file_missing_path_argument() {
    let (_dir, registry) = scratch();
    let result = registry.dispatch(&call("read_file", json!({}))).await;
    assert_eq!(result.payload["kind"], "invalid_arguments");
}

#[tokio::test]
async fn test_unparseable_arguments_become_empty_set() {
    let (_dir, registry) = scratch();
    let invocation = ToolInvocation::new("c", "file_search", "{\"query\": \"ma");
    let result = registry.dispatch(&invocation).await;
    assert!(result.is_ok());
    assert_eq!(result.payload["results"], json!([]));
}

#[tokio::test]
async fn test_list_dir_marks_directories() {
    let (dir, registry) = scratch();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("a.txt"), "").unwrap();

    let result = registry.dispatch(&call("list_dir", json!({"path": "."}))).await;
    assert!(result.is_ok());
    assert_eq!(result.payload["entries"], json!(["a.txt", "sub/"]));
}

#[tokio::test]
async fn test_list_dir_missing() {
    let (_dir, registry) = scratch();
    let result = registry
        .dispatch(&call("list_dir", json!({"path": "no/such/dir"})))
        .await;
    assert!(!result.is_ok());
    assert_eq!(result.payload["kind"], "io");
}

#[tokio::test]
async fn test_grep_search_requires_pattern() {
    let (_dir, registry) = scratch();
    let result = registry
        .dispatch(&call("grep_search", json!({"pattern": ""})))
        .await;
    assert!(!result.is_ok());
    assert_eq!(result.payload["error"], "invalid arguments: pattern required");
}

#[tokio::test]
async fn test_grep_search_no_match_is_success() {
    let (dir, registry) = scratch();
    fs::write(dir.path().join("a.txt"), "hello\n").unwrap();
    let result = registry
        .dispatch(&call("grep_search", json!({"pattern": "zzz_not_here"})))
        .await;
    assert!(result.is_ok());
    assert_eq!(result.payload["exit_code"], 1);
}

#[tokio::test]
async fn test_grep_search_finds_match() {
    let (dir, registry) = scratch();
    fs::write(dir.path().join("a.txt"), "first\nneedle here\n").unwrap();
    let result = registry
        .dispatch(&call("grep_search", json!({"pattern": "needle", "path": "a.txt"})))
        .await;
    assert!(result.is_ok());
    assert_eq!(result.payload["exit_code"], 0);
    assert!(result.payload["stdout"].as_str().unwrap().contains("2:needle here"));
}

#[tokio::test]
async fn test_file_search_substring_case_insensitive() {
    let (dir, registry) = scratch();
    fs::create_dir_all(dir.path().join("src/Parser")).unwrap();
    fs::write(dir.path().join("src/Parser/lexer.rs"), "").unwrap();
    fs::write(dir.path().join("README.md"), "").unwrap();

    let result = registry
        .dispatch(&call("file_search", json!({"query": "parser"})))
        .await;
    assert!(result.is_ok());
    let results = result.payload["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0].as_str().unwrap().ends_with("lexer.rs"));
}

#[tokio::test]
async fn test_file_search_caps_results() {
    let (dir, registry) = scratch();
    for i in 0..60 {
        fs::write(dir.path().join(format!("match_{i}.txt")), "").unwrap();
    }
    let result = registry
        .dispatch(&call("file_search", json!({"query": "MATCH_"})))
        .await;
    assert_eq!(result.payload["results"].as_array().unwrap().len(), 50);
}

#[tokio::test]
async fn test_file_search_empty_query() {
    let (dir, registry) = scratch();
    fs::write(dir.path().join("a.txt"), "").unwrap();
    let result = registry
        .dispatch(&call("file_search", json!({"query": ""})))
        .await;
    assert!(result.is_ok());
    assert_eq!(result.payload["results"], json!([]));
}

#[tokio::test]
async fn test_edit_file_replaces_and_creates_parents() {
    let (dir, registry) = scratch();
    let result = registry
        .dispatch(&call(
            "edit_file",
            json!({"target_file": "a/b/new.rs", "instructions": "create", "code_edit": "fn main() {}\n"}),
        ))
        .await;
    assert!(result.is_ok());
    assert_eq!(result.payload["mode"], "replaced");
    let written = fs::read_to_string(dir.path().join("a/b/new.rs")).unwrap();
    assert_eq!(written, "fn main() {}\n");
}

#[tokio::test]
async fn test_edit_file_appends_partial_snippet() {
    let (dir, registry) = scratch();
    fs::write(dir.path().join("lib.rs"), "fn old() {}").unwrap();
    let snippet = "// ... existing code ...\nfn added() {}";
    let result = registry
        .dispatch(&call(
            "edit_file",
            json!({"target_file": "lib.rs", "instructions": "add fn", "code_edit": snippet}),
        ))
        .await;
    assert_eq!(result.payload["mode"], "appended");
    let written = fs::read_to_string(dir.path().join("lib.rs")).unwrap();
    assert_eq!(written, format!("fn old() {{}}\n{snippet}\n"));
}

#[tokio::test]
async fn test_edit_file_rejects_empty_edit() {
    let (dir, registry) = scratch();
    let result = registry
        .dispatch(&call(
            "edit_file",
            json!({"target_file": "x.rs", "instructions": "nothing", "code_edit": "   "}),
        ))
        .await;
    assert!(!result.is_ok());
    assert_eq!(result.payload["kind"], "invalid_arguments");
    assert!(!dir.path().join("x.rs").exists());
}

#[tokio::test]
async fn test_delete_file_is_idempotent() {
    let (dir, registry) = scratch();
    fs::write(dir.path().join("gone.txt"), "bye").unwrap();

    let first = registry
        .dispatch(&call("delete_file", json!({"target_file": "gone.txt"})))
        .await;
    assert!(first.is_ok());
    assert_eq!(first.payload["existed"], true);
    assert!(!dir.path().join("gone.txt").exists());

    let second = registry
        .dispatch(&call("delete_file", json!({"target_file": "gone.txt"})))
        .await;
    assert!(second.is_ok());
    assert_eq!(second.payload["existed"], false);
}

#[tokio::test]
async fn test_run_command_foreground() {
    let (_dir, registry) = scratch();
    let result = registry
        .dispatch(&call(
            "run_terminal_cmd",
            json!({"command": "printf X", "is_background": false}),
        ))
        .await;
    assert!(result.is_ok());
    assert_eq!(result.payload["ok"], true);
    assert_eq!(result.payload["exit_code"], 0);
    assert_eq!(result.payload["stdout"], "X");
}

#[tokio::test]
async fn test_run_command_nonzero_exit_fails() {
    let (_dir, registry) = scratch();
    let result = registry
        .dispatch(&call(
            "run_terminal_cmd",
            json!({"command": "printf X; exit 1", "is_background": false}),
        ))
        .await;
    assert_eq!(result.outcome, Outcome::Failure);
    assert_eq!(result.payload["ok"], false);
    assert_eq!(result.payload["exit_code"], 1);
}

#[tokio::test]
async fn test_run_command_runs_in_root() {
    let (dir, registry) = scratch();
    fs::write(dir.path().join("marker.txt"), "").unwrap();
    let result = registry
        .dispatch(&call("run_terminal_cmd", json!({"command": "ls", "is_background": false})))
        .await;
    assert!(result.payload["stdout"].as_str().unwrap().contains("marker.txt"));
}

#[tokio::test]
async fn test_run_command_background_returns_pid() {
    let (_dir, registry) = scratch();
    let result = registry
        .dispatch(&call(
            "run_terminal_cmd",
            json!({"command": "sleep 0", "is_background": true}),
        ))
        .await;
    assert!(result.is_ok());
    assert!(result.payload["pid"].is_u64());
    assert!(result.payload.get("stdout").is_none());
}

#[tokio::test]
async fn test_run_command_requires_command() {
    let (_dir, registry) = scratch();
    let result = registry
        .dispatch(&call("run_terminal_cmd", json!({"is_background": false})))
        .await;
    assert!(!result.is_ok());
}

#[tokio::test]
async fn test_unknown_tool() {
    let (_dir, registry) = scratch();
    let result = registry.dispatch(&call("frobnicate", json!({}))).await;
    assert!(result.is_unknown_operation());
    assert_eq!(result.name, "frobnicate");
    assert_eq!(result.payload["unknown_tool"], true);
    assert_eq!(result.payload["name"], "frobnicate");
    assert_eq!(result.payload["ok"], false);
}

#[tokio::test]
async fn test_empty_name_is_unknown() {
    let (_dir, registry) = scratch();
    let result = registry
        .dispatch(&ToolInvocation::new("tool_0", "", ""))
        .await;
    assert!(result.is_unknown_operation());
    assert_eq!(result.call_id, "tool_0");
}

struct EchoTool {
    name: &'static str,
}

#[async_trait::async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "Echo the arguments back"
    }

    fn schema(&self) -> Value {
        json!({"type": "object", "properties": {"text": {"type": "string"}}})
    }

    async fn execute(&self, args: &Map<String, Value>) -> Result<ToolOutput, ToolError> {
        Ok(ToolOutput::success(json!({ "echo": args })))
    }
}

struct PanickingTool;

#[async_trait::async_trait]
impl Tool for PanickingTool {
    fn name(&self) -> &str {
        "explode"
    }

    fn description(&self) -> &str {
        "Always panics"
    }

    fn schema(&self) -> Value {
        json!({"type": "object"})
    }

    async fn execute(&self, _args: &Map<String, Value>) -> Result<ToolOutput, ToolError> {
        panic!("boom")
    }
}

struct CatchAll;

#[async_trait::async_trait]
impl UnknownToolHandler for CatchAll {
    async fn handle(&self, name: &str, _args: &Map<String, Value>) -> Result<ToolOutput, ToolError> {
        if name == "refuse" {
            return Err(ToolError::Failed("not handled here".into()));
        }
        Ok(ToolOutput::success(json!({ "handled": name })))
    }
}

#[tokio::test]
async fn test_registered_tool_is_advertised_and_dispatched() {
    let (_dir, mut registry) = scratch();
    registry.register(Box::new(EchoTool { name: "echo" }));

    assert_eq!(registry.names().len(), 8);
    assert_eq!(registry.names().last().map(String::as_str), Some("echo"));
    assert_eq!(registry.specs()[7].description, "Echo the arguments back");

    let result = registry.dispatch(&call("echo", json!({"text": "hi"}))).await;
    assert!(result.is_ok());
    assert_eq!(result.payload["echo"], json!({"text": "hi"}));
}

#[tokio::test]
async fn test_register_replaces_same_name_in_place() {
    let (_dir, mut registry) = scratch();
    registry.register(Box::new(EchoTool { name: "list_dir" }));

    assert_eq!(registry.specs().len(), 7);
    assert_eq!(registry.names()[1], "list_dir");
    assert_eq!(registry.specs()[1].description, "Echo the arguments back");
    let result = registry.dispatch(&call("list_dir", json!({"path": "."}))).await;
    assert_eq!(result.payload["echo"], json!({"path": "."}));
}

#[tokio::test]
async fn test_fallback_answers_unregistered_names() {
    let (_dir, mut registry) = scratch();
    registry.set_fallback(Box::new(CatchAll));

    let result = registry.dispatch(&call("frobnicate", json!({}))).await;
    assert!(!result.is_unknown_operation());
    assert!(result.is_ok());
    assert_eq!(result.payload["handled"], "frobnicate");
    assert!(!registry.names().contains(&"frobnicate".to_string()));

    let refused = registry.dispatch(&call("refuse", json!({}))).await;
    assert_eq!(refused.outcome, Outcome::Failure);
    assert_eq!(refused.payload["error"], "not handled here");
    assert_eq!(refused.payload["kind"], "failed");

    // Registered tools still win over the fallback.
    let listed = registry.dispatch(&call("list_dir", json!({"path": "."}))).await;
    assert!(listed.payload.get("entries").is_some());
}

#[tokio::test]
async fn test_panicking_tool_becomes_failure() {
    let (_dir, mut registry) = scratch();
    registry.register(Box::new(PanickingTool));

    let result = registry.dispatch(&call("explode", json!({}))).await;
    assert_eq!(result.outcome, Outcome::Failure);
    assert_eq!(result.payload["ok"], false);
    assert_eq!(result.payload["kind"], "failed");
    assert_eq!(result.payload["error"], "tool 'explode' panicked");
}

#[tokio::test]
async fn test_read_file_accepts_string_line_numbers() {
    let (dir, registry) = scratch();
    fs::write(dir.path().join("notes.txt"), "l1\nl2\nl3\n").unwrap();

    let result = registry
        .dispatch(&call("read_file", json!({"path": "notes.txt", "start": "2", "end": "2"})))
        .await;
    assert!(result.is_ok());
    assert_eq!(result.payload["content"], "l2");

    let result = registry
        .dispatch(&call("read_file", json!({"path": "notes.txt", "start": 0, "end": 2})))
        .await;
    assert_eq!(result.payload["content"], "l1\nl2");
}
