//! Script build stage.
//!
//! Concatenates every matched script, in the glob's enumeration order, into a
//! single `main.js`. Production mode additionally applies a compatibility
//! transpile pass and then a minify pass to each file, in that fixed order,
//! before concatenation. The output file is overwritten on every run.

use crate::pipeline::{BuildContext, Stage, StageResult};
use regex::Regex;
use std::fs;
use std::path::PathBuf;

/// Name of the concatenated bundle.
pub const BUNDLE_NAME: &str = "main.js";

/// Builds `main.js` from the scripts glob.
pub struct ScriptBuild;

impl Stage for ScriptBuild {
    fn name(&self) -> &'static str {
        "scripts"
    }

    fn run(&self, ctx: &BuildContext) -> StageResult {
        if !ctx.config().settings.scripts {
            return StageResult::skipped(self.name());
        }

        let pattern = ctx.resolve_glob(&ctx.config().paths.scripts.input);
        let files = match super::matched_files(&pattern) {
            Ok(files) => files,
            Err(e) => return StageResult::failed(self.name(), e),
        };

        if files.is_empty() {
            return StageResult::done(self.name(), vec![]);
        }

        let mut bundle = String::new();
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

            // Transpile before minify; the order is part of the contract.
            let processed = if ctx.is_production() {
                minify_js(&transpile_compat(&source))
            } else {
                source
            };

            bundle.push_str(&processed);
            if !bundle.ends_with('\n') {
                bundle.push('\n');
            }
        }

        let out_dir = ctx.resolve(&ctx.config().paths.scripts.output);
        if let Err(e) = fs::create_dir_all(&out_dir) {
            return StageResult::failed(
                self.name(),
                format!("cannot create {}: {}", out_dir.display(), e),
            );
        }

        let out_file = out_dir.join(BUNDLE_NAME);
        match fs::write(&out_file, bundle) {
            Ok(()) => StageResult::done(self.name(), vec![out_file]),
            Err(e) => StageResult::failed(
                self.name(),
                format!("cannot write {}: {}", out_file.display(), e),
            ),
        }
    }
}

/// Compatibility transpile pass: lower `const`/`let` declarations to `var`.
pub fn transpile_compat(source: &str) -> String {
    // Declarations start a statement: beginning of line or after ; { ( ,
    let re = Regex::new(r"(?m)(^|[;{(,]\s*|^\s*)(const|let)\b").unwrap();
    re.replace_all(source, "${1}var").into_owned()
}

/// Scanner state for [`minify_js`].
enum ScanState {
    Code,
    Str(char),
    Template,
    LineComment,
    BlockComment,
}

/// Light minification: strip comments (string- and template-literal aware),
/// trim indentation, drop blank lines. Line structure is preserved so
/// semicolon insertion semantics are unaffected.
pub fn minify_js(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut state = ScanState::Code;
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            ScanState::Code => match c {
                '\'' | '"' => {
                    state = ScanState::Str(c);
                    out.push(c);
                }
                '`' => {
                    state = ScanState::Template;
                    out.push(c);
                }
                '/' => match chars.peek() {
                    Some('/') => {
                        chars.next();
                        state = ScanState::LineComment;
                    }
                    Some('*') => {
                        chars.next();
                        state = ScanState::BlockComment;
                    }
                    _ => out.push(c),
                },
                _ => out.push(c),
            },
            ScanState::Str(quote) => {
                out.push(c);
                if c == '\\' {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                } else if c == quote || c == '\n' {
                    state = ScanState::Code;
                }
            }
            ScanState::Template => {
                out.push(c);
                if c == '\\' {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                } else if c == '`' {
                    state = ScanState::Code;
                }
            }
            ScanState::LineComment => {
                if c == '\n' {
                    out.push('\n');
                    state = ScanState::Code;
                }
            }
            ScanState::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    state = ScanState::Code;
                } else if c == '\n' {
                    // keep line numbers roughly stable across the strip
                    out.push('\n');
                }
            }
        }
    }

    out.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Files the script stages operate on, exposed for the lint stage.
pub(crate) fn script_files(ctx: &BuildContext) -> Result<Vec<PathBuf>, String> {
    super::matched_files(&ctx.resolve_glob(&ctx.config().paths.scripts.input))
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
    fn test_concat_preserves_enumeration_order() {
        let temp = TempDir::new().unwrap();
        write_src(&temp, "a.js", "const a=1;\n");
        write_src(&temp, "b.js", "const b=2;\n");

        let result = ScriptBuild.run(&ctx_in(&temp));
        assert_eq!(result.status, StageStatus::Done);

        let bundle = fs::read_to_string(temp.path().join("dist/js/main.js")).unwrap();
        assert_eq!(bundle, "const a=1;\nconst b=2;\n");
    }

    #[test]
    fn test_disabled_flag_writes_nothing() {
        let temp = TempDir::new().unwrap();
        write_src(&temp, "a.js", "const a=1;\n");

        let mut config = default_config();
        config.settings.scripts = false;
        let ctx = BuildContext::new(config, temp.path().to_path_buf());

        let result = ScriptBuild.run(&ctx);
        assert_eq!(result.status, StageStatus::Skipped);
        assert!(!temp.path().join("dist").exists());
    }

    #[test]
    fn test_empty_match_produces_no_output() {
        let temp = TempDir::new().unwrap();
        let result = ScriptBuild.run(&ctx_in(&temp));
        assert_eq!(result.status, StageStatus::Done);
        assert!(result.outputs.is_empty());
        assert!(!temp.path().join("dist/js/main.js").exists());
    }

    #[test]
    fn test_production_transpiles_and_minifies() {
        let temp = TempDir::new().unwrap();
        write_src(&temp, "a.js", "// header\nconst x = 1;\nlet y = 2;\n");

        let ctx = ctx_in(&temp).with_production(true);
        let result = ScriptBuild.run(&ctx);
        assert_eq!(result.status, StageStatus::Done);

        let bundle = fs::read_to_string(temp.path().join("dist/js/main.js")).unwrap();
        assert!(!bundle.contains("const "));
        assert!(!bundle.contains("let "));
        assert!(!bundle.contains("// header"));
        assert!(bundle.contains("var x = 1;"));
        assert!(bundle.contains("var y = 2;"));
    }

    #[test]
    fn test_output_overwritten_each_run() {
        let temp = TempDir::new().unwrap();
        write_src(&temp, "a.js", "const a=1;\n");

        let ctx = ctx_in(&temp);
        ScriptBuild.run(&ctx);
        write_src(&temp, "a.js", "const a=99;\n");
        ScriptBuild.run(&ctx);

        let bundle = fs::read_to_string(temp.path().join("dist/js/main.js")).unwrap();
        assert_eq!(bundle, "const a=99;\n");
    }

    #[test]
    fn test_transpile_lowers_declarations() {
        assert_eq!(transpile_compat("const a = 1;"), "var a = 1;");
        assert_eq!(transpile_compat("let b = 2;"), "var b = 2;");
        assert_eq!(transpile_compat("if (x) { const y = 3; }"), "if (x) { var y = 3; }");
        assert_eq!(transpile_compat("for (let i = 0;;) {}"), "for (var i = 0;;) {}");
    }

    #[test]
    fn test_transpile_keeps_identifiers() {
        // `constant` and property names must survive
        assert_eq!(transpile_compat("constant(letter);"), "constant(letter);");
        assert_eq!(transpile_compat("obj.consta = 1;"), "obj.consta = 1;");
    }

    #[test]
    fn test_minify_strips_line_comments() {
        let out = minify_js("var a = 1; // trailing\n// full line\nvar b = 2;");
        assert_eq!(out, "var a = 1;\nvar b = 2;");
    }

    #[test]
    fn test_minify_strips_block_comments() {
        let out = minify_js("var a = 1; /* gone */ var b = 2;\n/* multi\nline */var c = 3;");
        assert_eq!(out, "var a = 1;  var b = 2;\nvar c = 3;");
    }

    #[test]
    fn test_minify_keeps_slashes_in_strings() {
        let out = minify_js("var url = \"http://example.com\"; // comment");
        assert_eq!(out, "var url = \"http://example.com\";");
    }

    #[test]
    fn test_minify_keeps_template_literals() {
        let src = "var t = `line // not a comment\n  indented`;";
        let out = minify_js(src);
        assert!(out.contains("// not a comment"));
    }

    #[test]
    fn test_minify_drops_blank_lines_and_indent() {
        let out = minify_js("  var a = 1;\n\n\n    var b = 2;\n");
        assert_eq!(out, "var a = 1;\nvar b = 2;");
    }
}
