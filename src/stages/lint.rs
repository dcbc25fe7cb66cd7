//! Script lint stage.
//!
//! A gate, not a transform: scans every matched script against the configured
//! rule set, prints a formatted report, and fails the pipeline run when any
//! error-severity finding exists. Warnings are reported but non-fatal. The
//! stage writes no files.

use crate::config::Severity;
use crate::pipeline::{BuildContext, Stage, StageResult};
use std::fs;
use std::path::{Path, PathBuf};

/// A built-in rule: a token to search for outside comments and strings.
struct RuleDef {
    name: &'static str,
    token: &'static str,
    message: &'static str,
}

const BUILTIN_RULES: &[RuleDef] = &[
    RuleDef { name: "no-debugger", token: "debugger", message: "Unexpected 'debugger' statement" },
    RuleDef { name: "no-console", token: "console.", message: "Unexpected console statement" },
    RuleDef { name: "no-alert", token: "alert(", message: "Unexpected 'alert'" },
    RuleDef { name: "no-eval", token: "eval(", message: "eval can be harmful" },
];

/// A single lint finding.
#[derive(Debug, Clone)]
pub struct Finding {
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
    pub rule: &'static str,
    pub severity: Severity,
    pub message: &'static str,
}

/// Lints the scripts glob against `[lint.rules]`.
pub struct ScriptLint;

impl Stage for ScriptLint {
    fn name(&self) -> &'static str {
        "lint"
    }

    fn run(&self, ctx: &BuildContext) -> StageResult {
        if !ctx.config().settings.scripts {
            return StageResult::skipped(self.name());
        }

        let files = match super::scripts::script_files(ctx) {
            Ok(files) => files,
            Err(e) => return StageResult::failed(self.name(), e),
        };

        let mut findings = Vec::new();
        for file in &files {
            let source = match fs::read_to_string(file) {
                Ok(s) => s,
                Err(e) => {
                    return StageResult::failed(
                        self.name(),
                        format!("cannot read {}: {}", file.display(), e),
                    )
                }
            };
            findings.extend(lint_source(ctx, file, &source));
        }

        if !findings.is_empty() {
            eprint!("{}", format_report(&findings));
        }

        let errors = findings.iter().filter(|f| f.severity == Severity::Error).count();
        let warnings: Vec<String> = findings
            .iter()
            .filter(|f| f.severity == Severity::Warn)
            .map(|f| format!("{}:{}:{} {} ({})", f.file.display(), f.line, f.column, f.message, f.rule))
            .collect();

        if errors > 0 {
            StageResult::failed(
                self.name(),
                format!("{} lint error{}", errors, if errors == 1 { "" } else { "s" }),
            )
            .with_warnings(warnings)
        } else {
            StageResult::done(self.name(), vec![]).with_warnings(warnings)
        }
    }
}

/// Lint one source file, producing findings for enabled rules.
fn lint_source(ctx: &BuildContext, file: &Path, source: &str) -> Vec<Finding> {
    let sanitized = sanitize(source);
    let mut findings = Vec::new();

    for rule in BUILTIN_RULES {
        let severity = ctx
            .config()
            .lint
            .rules
            .get(rule.name)
            .copied()
            .unwrap_or(Severity::Off);
        if severity == Severity::Off {
            continue;
        }

        let bytes = sanitized.as_bytes();
        let mut offset = 0;
        while let Some(pos) = sanitized[offset..].find(rule.token) {
            let at = offset + pos;
            let end = at + rule.token.len();
            offset = end;

            // token must sit on identifier boundaries: `myalert(` and
            // `debuggers` are not findings, `window.alert(` is
            if at > 0 && is_word_byte(bytes[at - 1]) {
                continue;
            }
            let token_ends_word = rule.token.as_bytes().last().copied().is_some_and(is_word_byte);
            if token_ends_word && end < bytes.len() && is_word_byte(bytes[end]) {
                continue;
            }

            let (line, column) = line_col(&sanitized, at);
            findings.push(Finding {
                file: file.to_path_buf(),
                line,
                column,
                rule: rule.name,
                severity,
                message: rule.message,
            });
        }
    }

    findings.sort_by_key(|f| (f.line, f.column));
    findings
}

/// Blank out comments and string-literal bodies, preserving the text shape so
/// offsets still map to the original line/column.
fn sanitize(source: &str) -> String {
    #[derive(PartialEq)]
    enum S {
        Code,
        Str(char),
        Template,
        Line,
        Block,
    }

    let mut out = String::with_capacity(source.len());
    let mut state = S::Code;
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            S::Code => match c {
                '\'' | '"' => {
                    state = S::Str(c);
                    out.push(c);
                }
                '`' => {
                    state = S::Template;
                    out.push(c);
                }
                '/' if chars.peek() == Some(&'/') => {
                    chars.next();
                    out.push_str("  ");
                    state = S::Line;
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    out.push_str("  ");
                    state = S::Block;
                }
                _ => out.push(c),
            },
            S::Str(quote) => {
                if c == '\\' {
                    out.push(' ');
                    if chars.next().is_some() {
                        out.push(' ');
                    }
                } else if c == quote || c == '\n' {
                    out.push(c);
                    state = S::Code;
                } else {
                    out.push(' ');
                }
            }
            S::Template => {
                if c == '\\' {
                    out.push(' ');
                    if chars.next().is_some() {
                        out.push(' ');
                    }
                } else if c == '`' {
                    out.push(c);
                    state = S::Code;
                } else if c == '\n' {
                    out.push('\n');
                } else {
                    out.push(' ');
                }
            }
            S::Line => {
                if c == '\n' {
                    out.push('\n');
                    state = S::Code;
                } else {
                    out.push(' ');
                }
            }
            S::Block => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    out.push_str("  ");
                    state = S::Code;
                } else if c == '\n' {
                    out.push('\n');
                } else {
                    out.push(' ');
                }
            }
        }
    }

    out
}

/// Identifier-constituent byte for boundary checks.
fn is_word_byte(b: u8) -> bool {
    b == b'_' || b == b'$' || b.is_ascii_alphanumeric()
}

/// 1-indexed line and column for a byte offset.
fn line_col(text: &str, offset: usize) -> (usize, usize) {
    let before = &text[..offset];
    let line = before.matches('\n').count() + 1;
    let column = offset - before.rfind('\n').map(|p| p + 1).unwrap_or(0) + 1;
    (line, column)
}

/// Format findings grouped per file, eslint-stylish shaped.
pub fn format_report(findings: &[Finding]) -> String {
    let mut out = String::new();
    let mut current: Option<&Path> = None;

    for f in findings {
        if current != Some(f.file.as_path()) {
            if current.is_some() {
                out.push('\n');
            }
            out.push_str(&format!("{}\n", f.file.display()));
            current = Some(f.file.as_path());
        }
        let label = match f.severity {
            Severity::Error => "error",
            Severity::Warn => "warning",
            Severity::Off => continue,
        };
        out.push_str(&format!(
            "  {}:{}  {}  {}  {}\n",
            f.line, f.column, label, f.message, f.rule
        ));
    }

    let errors = findings.iter().filter(|f| f.severity == Severity::Error).count();
    let warnings = findings.iter().filter(|f| f.severity == Severity::Warn).count();
    let total = errors + warnings;
    if total > 0 {
        out.push_str(&format!(
            "\n{} problem{} ({} error{}, {} warning{})\n",
            total,
            if total == 1 { "" } else { "s" },
            errors,
            if errors == 1 { "" } else { "s" },
            warnings,
            if warnings == 1 { "" } else { "s" },
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_config;
    use crate::pipeline::StageStatus;
    use tempfile::TempDir;

    fn ctx_in(temp: &TempDir) -> BuildContext {
        BuildContext::new(default_config(), temp.path().to_path_buf())
    }

    fn write_src(temp: &TempDir, name: &str, content: &str) {
        let dir = temp.path().join("src");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_clean_source_passes() {
        let temp = TempDir::new().unwrap();
        write_src(&temp, "app.js", "var a = 1;\n");
        let result = ScriptLint.run(&ctx_in(&temp));
        assert_eq!(result.status, StageStatus::Done);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_error_rule_fails_stage() {
        let temp = TempDir::new().unwrap();
        write_src(&temp, "app.js", "debugger;\n");
        let result = ScriptLint.run(&ctx_in(&temp));
        assert!(result.status.is_failure());
    }

    #[test]
    fn test_warn_rule_passes_with_warnings() {
        let temp = TempDir::new().unwrap();
        write_src(&temp, "app.js", "console.log('hi');\n");
        let result = ScriptLint.run(&ctx_in(&temp));
        assert_eq!(result.status, StageStatus::Done);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_disabled_scripts_flag_skips_lint() {
        let temp = TempDir::new().unwrap();
        write_src(&temp, "app.js", "debugger;\n");

        let mut config = default_config();
        config.settings.scripts = false;
        let ctx = BuildContext::new(config, temp.path().to_path_buf());

        let result = ScriptLint.run(&ctx);
        assert_eq!(result.status, StageStatus::Skipped);
    }

    #[test]
    fn test_finding_in_comment_ignored() {
        let temp = TempDir::new().unwrap();
        write_src(&temp, "app.js", "// debugger lives here\n/* debugger */\nvar a = 1;\n");
        let result = ScriptLint.run(&ctx_in(&temp));
        assert_eq!(result.status, StageStatus::Done);
    }

    #[test]
    fn test_finding_in_string_ignored() {
        let temp = TempDir::new().unwrap();
        write_src(&temp, "app.js", "var s = 'call debugger now';\n");
        let result = ScriptLint.run(&ctx_in(&temp));
        assert_eq!(result.status, StageStatus::Done);
    }

    #[test]
    fn test_rule_severity_override() {
        let temp = TempDir::new().unwrap();
        write_src(&temp, "app.js", "console.log('hi');\n");

        let mut config = default_config();
        config.lint.rules.insert("no-console".to_string(), Severity::Error);
        let ctx = BuildContext::new(config, temp.path().to_path_buf());

        let result = ScriptLint.run(&ctx);
        assert!(result.status.is_failure());
    }

    #[test]
    fn test_token_inside_identifier_ignored() {
        let ctx = BuildContext::new(default_config(), PathBuf::from("."));
        let source = "myalert(1);\neconsole.log(2);\nvar debuggers = 0;\nmedieval(3);\n";
        let findings = lint_source(&ctx, Path::new("x.js"), source);
        assert!(findings.is_empty(), "{:?}", findings);
    }

    #[test]
    fn test_member_access_still_reported() {
        let ctx = BuildContext::new(default_config(), PathBuf::from("."));
        let findings = lint_source(&ctx, Path::new("x.js"), "window.alert('hi');\n");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule, "no-alert");
    }

    #[test]
    fn test_line_and_column_reported() {
        let ctx = BuildContext::new(default_config(), PathBuf::from("."));
        let findings = lint_source(&ctx, Path::new("x.js"), "var a = 1;\n  debugger;\n");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, 2);
        assert_eq!(findings[0].column, 3);
    }

    #[test]
    fn test_report_format() {
        let findings = vec![
            Finding {
                file: PathBuf::from("src/app.js"),
                line: 3,
                column: 1,
                rule: "no-debugger",
                severity: Severity::Error,
                message: "Unexpected 'debugger' statement",
            },
            Finding {
                file: PathBuf::from("src/app.js"),
                line: 7,
                column: 5,
                rule: "no-console",
                severity: Severity::Warn,
                message: "Unexpected console statement",
            },
        ];
        let report = format_report(&findings);
        assert!(report.contains("src/app.js"));
        assert!(report.contains("3:1  error"));
        assert!(report.contains("7:5  warning"));
        assert!(report.contains("2 problems (1 error, 1 warning)"));
    }

    #[test]
    fn test_sanitize_preserves_shape() {
        let src = "var s = 'abc'; // x\nvar t = 2;";
        let clean = sanitize(src);
        assert_eq!(src.len(), clean.len());
        assert_eq!(src.matches('\n').count(), clean.matches('\n').count());
        assert!(!clean.contains("abc"));
    }
}
