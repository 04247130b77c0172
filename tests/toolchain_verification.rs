/// Toolchain Verification Tests
/// Compiler message translation, command construction and, when the tools
/// are installed, real compile-and-run round trips.

use mini_compiler::domain::diagnostics::{parse_compiler_messages, translate_failure, Diagnostic};
use mini_compiler::domain::language::Language;
use mini_compiler::infrastructure::build_service;
use mini_compiler::infrastructure::config::{Config, ToolchainConfig};
use mini_compiler::infrastructure::gcc::{build_command_spec, GccToolchain};
use mini_compiler::ports::Toolchain;
use tempfile::tempdir;

#[test]
fn test_translate_gcc_errors() {
    let stderr = "\
main.c: In function 'main':
main.c:2:13: error: 'y' undeclared (first use in this function)
    2 |     return y;
      |             ^
main.c:2:13: note: each undeclared identifier is reported only once for each function it appears in
main.c:3:1: warning: control reaches end of non-void function [-Wreturn-type]
";
    assert_eq!(
        parse_compiler_messages(stderr),
        vec![
            Diagnostic::new(2, "error: 'y' undeclared (first use in this function)"),
            Diagnostic::new(3, "warning: control reaches end of non-void function [-Wreturn-type]"),
        ]
    );
}

#[test]
fn test_unparseable_failure_is_one_line_zero_entry() {
    let stderr = "/usr/bin/ld: cannot find -lmissing\ncollect2: error: ld returned 1 exit status\n";
    let diagnostics = translate_failure(stderr);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].line, 0);
    assert!(diagnostics[0].message.contains("cannot find -lmissing"));
}

#[test]
fn test_command_spec() {
    let spec = build_command_spec(Language::C.toolchain_command(), &["-std=c99".to_string()]);
    assert_eq!(spec.program, "gcc");
    assert_eq!(spec.args, vec!["main.c", "-o", "main", "-std=c99"]);
}

#[test]
fn test_missing_toolchain_keeps_analysis() {
    let config = Config {
        toolchain: ToolchainConfig {
            c_compiler: "no-such-compiler-xyz".to_string(),
            ..Default::default()
        },
        ..Default::default()
    };
    let service = build_service(&config, true);
    let result = service
        .compile(Language::C, Some("int add(int a, int b) { return a + b; }"))
        .unwrap();

    assert_eq!(result.tree.as_ref().and_then(|t| t.as_shape()).unwrap().children.len(), 1);
    assert_eq!(result.symbols.len(), 3);
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].line, 0);
    assert!(result.diagnostics[0].message.contains("not found"));
}

#[test]
fn test_scratch_directories_are_cleaned_up() {
    let parent = tempdir().unwrap();
    let config = ToolchainConfig {
        c_compiler: "no-such-compiler-xyz".to_string(),
        temp_dir: Some(parent.path().to_path_buf()),
        ..Default::default()
    };
    GccToolchain::new(&config).execute("int main() { return 0; }");
    assert_eq!(std::fs::read_dir(parent.path()).unwrap().count(), 0);
}

#[test]
#[ignore] // Requires gcc to be installed
fn test_gcc_compile_error_lines() {
    let report = GccToolchain::new(&ToolchainConfig::default())
        .execute("int main() {\n    int x = 1\n    return x;\n}\n");
    assert_eq!(report.output, None);
    assert!(report.diagnostics.iter().any(|d| d.line > 0 && d.message.starts_with("error:")));
}

#[test]
#[ignore] // Requires gcc to be installed
fn test_gcc_runtime_failure_and_timeout() {
    let config = ToolchainConfig {
        run_timeout_secs: 1,
        ..Default::default()
    };
    let toolchain = GccToolchain::new(&config);

    let report = toolchain.execute("#include <stdio.h>\nint main() { printf(\"partial\\n\"); return 3; }");
    assert_eq!(report.output.as_deref(), Some("partial\n"));
    assert!(report.diagnostics.contains(&Diagnostic::general("program exited with status 3")));

    let report = toolchain
        .execute("#include <stdio.h>\nint main() { printf(\"spin\\n\"); fflush(stdout); for (;;) {} }");
    assert_eq!(report.output.as_deref(), Some("spin\n"));
    assert!(report.diagnostics.contains(&Diagnostic::general("execution timed out after 1s")));
}

#[test]
fn test_javascript_syntax_error_stops_before_node() {
    let config = Config {
        toolchain: ToolchainConfig {
            node: "no-such-node-xyz".to_string(),
            ..Default::default()
        },
        ..Default::default()
    };
    let service = build_service(&config, true);
    let result = service
        .compile(Language::JavaScript, Some("let a = 1;\nlet b = (a + ;\n"))
        .unwrap();
    assert_eq!(result.diagnostics[0].line, 2);
    assert!(result.diagnostics.iter().all(|d| d.message.starts_with("SyntaxError")));
    assert_eq!(result.execution_output, None);
}

#[test]
#[ignore] // Requires node 22 or later
fn test_node_runtime_error() {
    let service = build_service(&Config::default(), true);
    let result = service
        .compile(Language::JavaScript, Some("console.log('before');\nnull.field;\n"))
        .unwrap();
    assert_eq!(result.execution_output.as_deref(), Some("before\n"));
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].line, 2);
    assert!(result.diagnostics[0].message.starts_with("TypeError"));
}
