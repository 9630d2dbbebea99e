//! Structural tests for architectural boundary enforcement.
//!
//! These tests scan source files to verify that the layer boundaries
//! (domain → application → infra/commands/output) hold.

use std::path::{Path, PathBuf};

/// Collect all `.rs` files under a directory recursively.
fn collect_rs_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                files.extend(collect_rs_files(&path));
            } else if path.extension().and_then(|e| e.to_str()) == Some("rs") {
                files.push(path);
            }
        }
    }
    files
}

fn src_dir(sub: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("src").join(sub)
}

fn relative(file: &Path) -> String {
    file.strip_prefix(env!("CARGO_MANIFEST_DIR"))
        .unwrap_or(file)
        .display()
        .to_string()
}

/// Whether `line` opens a test-only item: `#[cfg(test)]`, `#[cfg(all(test, unix))]`, ...
fn is_test_gate(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("#[cfg(")
        && trimmed
            .split(|c: char| !c.is_alphanumeric() && c != '_')
            .any(|word| word == "test")
}

/// Non-comment lines outside test-gated items, with 1-based line numbers.
///
/// A gate covers everything up to the brace that closes the item it opens.
fn production_lines(path: &Path) -> Vec<(usize, String)> {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Vec::new();
    };
    let mut depth = 0i32;
    let mut gated_at: Option<i32> = None;
    let mut lines = Vec::new();
    for (i, line) in content.lines().enumerate() {
        if gated_at.is_none() && is_test_gate(line) {
            gated_at = Some(depth);
        }
        for ch in line.chars() {
            match ch {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if gated_at.is_some_and(|start| depth <= start) {
                        gated_at = None;
                    }
                }
                _ => {}
            }
        }
        let trimmed = line.trim();
        let comment = trimmed.starts_with("//") || trimmed.starts_with("/*") || trimmed.starts_with('*');
        if gated_at.is_none() && !comment && !is_test_gate(line) {
            lines.push((i + 1, line.to_string()));
        }
    }
    lines
}

/// Every production line under `dir` containing one of `needles`.
fn find_in(dir: &Path, needles: &[&str]) -> Vec<String> {
    let mut violations = Vec::new();
    for file in collect_rs_files(dir) {
        for (lineno, line) in production_lines(&file) {
            if let Some(needle) = needles.iter().find(|n| line.contains(*n)) {
                violations.push(format!("{}:{lineno}: `{needle}` in: {line}", relative(&file)));
            }
        }
    }
    violations
}

#[test]
fn domain_is_free_of_io_and_outer_layers() {
    let violations = find_in(
        &src_dir("domain"),
        &[
            "crate::infra",
            "crate::application",
            "crate::commands",
            "crate::output",
            "tokio::",
            "std::fs",
            "std::process",
            "std::net",
        ],
    );
    assert!(
        violations.is_empty(),
        "domain/ must stay pure:\n{}",
        violations.join("\n")
    );
}

#[test]
fn application_does_not_import_adapters_or_presentation() {
    let violations = find_in(
        &src_dir("application"),
        &["crate::infra", "crate::commands", "crate::output"],
    );
    assert!(
        violations.is_empty(),
        "application/ may only import domain and its own ports:\n{}",
        violations.join("\n")
    );
}

#[test]
fn infra_has_no_imports_from_commands_or_output() {
    let violations = find_in(&src_dir("infra"), &["crate::commands", "crate::output"]);
    assert!(
        violations.is_empty(),
        "infra/ must not import from commands/ or output/:\n{}",
        violations.join("\n")
    );
}

#[test]
fn infra_has_no_print_macros_outside_tests() {
    let violations = find_in(&src_dir("infra"), &["println!", "eprintln!"]);
    assert!(
        violations.is_empty(),
        "infra/ must not use println!/eprintln! outside #[cfg(test)]:\n{}",
        violations.join("\n")
    );
}

#[test]
fn services_take_ports_not_adapters() {
    let adapters = [
        "FileRegistry",
        "NixSignaller",
        "TokioProcessSpawner",
        "TokioCommandRunner",
        "WorkerHttpClient",
        "LoopbackPortProbe",
        "StdFs",
    ];
    let violations = find_in(&src_dir("application"), &adapters);
    assert!(
        violations.is_empty(),
        "application/ must depend on port traits, not concrete adapters:\n{}",
        violations.join("\n")
    );
}

#[test]
fn command_runner_is_only_built_by_infra_and_app() {
    let mut violations = Vec::new();
    for file in collect_rs_files(&src_dir("")) {
        let rel = relative(&file).replace('\\', "/");
        if rel.contains("/infra/") || rel.ends_with("app.rs") {
            continue;
        }
        for (lineno, line) in production_lines(&file) {
            if line.contains("TokioCommandRunner") {
                violations.push(format!("{rel}:{lineno}: {line}"));
            }
        }
    }
    assert!(
        violations.is_empty(),
        "TokioCommandRunner must be wired in app.rs:\n{}",
        violations.join("\n")
    );
}

#[test]
fn no_inline_json_branching_in_commands() {
    let mut violations = Vec::new();
    for file in collect_rs_files(&src_dir("commands")) {
        for (lineno, line) in production_lines(&file) {
            let trimmed = line.trim();
            if line.contains("json: bool")
                || trimmed.starts_with("if json")
                || trimmed.starts_with("if !json")
            {
                violations.push(format!("{}:{lineno}: {line}", relative(&file)));
            }
        }
    }
    assert!(
        violations.is_empty(),
        "Found inline JSON branching in commands/, use app.renderer() instead:\n{}",
        violations.join("\n")
    );
}

/// Command files that touch `AppContext` fields must receive `&AppContext`.
#[test]
fn command_handlers_accept_app_context() {
    let mut violations = Vec::new();
    for file in collect_rs_files(&src_dir("commands")) {
        let Ok(content) = std::fs::read_to_string(&file) else {
            continue;
        };
        let uses_app_fields = content.contains("app.output")
            || content.contains("app.registry")
            || content.contains("app.layout")
            || content.contains("app.fleet");
        if uses_app_fields && !content.contains("app: &AppContext") {
            violations.push(relative(&file));
        }
    }
    assert!(
        violations.is_empty(),
        "Command handlers that use AppContext fields must accept &AppContext:\n{}",
        violations.join("\n")
    );
}

/// Each file in `commands/` stays a thin adapter over application services.
#[test]
fn command_handlers_are_reasonably_sized() {
    let mut violations = Vec::new();
    for file in collect_rs_files(&src_dir("commands")) {
        let count = production_lines(&file)
            .iter()
            .filter(|(_, l)| !l.trim().is_empty())
            .count();
        if count > 125 {
            violations.push(format!("{}: {count} non-test lines (limit: 125)", relative(&file)));
        }
    }
    assert!(
        violations.is_empty(),
        "Command handler files exceed 125-line limit, extract logic to application services:\n{}",
        violations.join("\n")
    );
}
