//! Style build stage.
//!
//! For each entry stylesheet (`.scss`/`.sass`/`.css`, partials excluded)
//! under the styles input tree:
//!
//! 1. `@import "name";` directives are expanded recursively, resolved against
//!    the importing file's directory and the configured include paths.
//! 2. The expanded sheet is compiled with lightningcss: vendor prefixes for
//!    the browser targets, expanded output with `/* from: ... */` source
//!    boundary comments -> `<stem>.css`.
//! 3. The same in-memory sheet is printed minified with comments stripped
//!    -> `<stem>.min.css`.
//!
//! Unresolvable imports (URLs, runtime imports) are left in place and
//! reported as warnings.

use crate::pipeline::{BuildContext, Stage, StageResult};
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Compiles stylesheet sources into expanded + minified CSS pairs.
pub struct StyleBuild;

/// A contiguous run of CSS attributed to one source file.
struct Fragment {
    origin: PathBuf,
    css: String,
}

impl Stage for StyleBuild {
    fn name(&self) -> &'static str {
        "styles"
    }

    fn run(&self, ctx: &BuildContext) -> StageResult {
        if !ctx.config().settings.styles {
            return StageResult::skipped(self.name());
        }

        let input_dir = ctx.resolve(&ctx.config().paths.styles.input);
        let entries = match entry_files(&input_dir) {
            Ok(entries) => entries,
            Err(e) => return StageResult::failed(self.name(), e),
        };

        if entries.is_empty() {
            return StageResult::done(self.name(), vec![]);
        }

        let out_dir = ctx.resolve(&ctx.config().paths.styles.output);
        if let Err(e) = fs::create_dir_all(&out_dir) {
            return StageResult::failed(
                self.name(),
                format!("cannot create {}: {}", out_dir.display(), e),
            );
        }

        let include_paths: Vec<PathBuf> = ctx
            .config()
            .paths
            .styles
            .include_paths
            .iter()
            .map(|p| ctx.resolve(p))
            .collect();

        let mut outputs = Vec::new();
        let mut warnings = Vec::new();

        for entry in &entries {
            let mut fragments = Vec::new();
            let mut stack = HashSet::new();
            if let Err(e) =
                collect_fragments(entry, &include_paths, &mut stack, &mut warnings, &mut fragments)
            {
                return StageResult::failed(self.name(), e);
            }

            let expanded = match print_expanded(ctx, &fragments) {
                Ok(css) => css,
                Err(e) => {
                    return StageResult::failed(
                        self.name(),
                        format!("{}: {}", entry.display(), e),
                    )
                }
            };

            let raw: String = fragments.iter().map(|f| f.css.as_str()).collect::<Vec<_>>().join("\n");
            let minified = match compile_css(&raw, true) {
                Ok(css) => css,
                Err(e) => {
                    return StageResult::failed(
                        self.name(),
                        format!("{}: {}", entry.display(), e),
                    )
                }
            };

            let stem = entry.file_stem().map(|s| s.to_string_lossy().into_owned());
            let stem = match stem {
                Some(s) => s,
                None => continue,
            };

            let expanded_path = out_dir.join(format!("{}.css", stem));
            let minified_path = out_dir.join(format!("{}.min.css", stem));

            for (path, content) in [(&expanded_path, &expanded), (&minified_path, &minified)] {
                if let Err(e) = fs::write(path, content) {
                    return StageResult::failed(
                        self.name(),
                        format!("cannot write {}: {}", path.display(), e),
                    );
                }
            }
            outputs.push(expanded_path);
            outputs.push(minified_path);
        }

        StageResult::done(self.name(), outputs).with_warnings(warnings)
    }
}

/// Entry stylesheets: `.scss`/`.sass`/`.css` under the input tree, excluding
/// partials (basename starting with `_`).
fn entry_files(input_dir: &Path) -> Result<Vec<PathBuf>, String> {
    let mut files = Vec::new();
    for ext in ["scss", "sass", "css"] {
        let pattern = format!("{}/**/*.{}", input_dir.display(), ext);
        files.extend(super::matched_files(&pattern)?);
    }
    files.retain(|p| {
        p.file_name()
            .map(|n| !n.to_string_lossy().starts_with('_'))
            .unwrap_or(false)
    });
    files.sort();
    Ok(files)
}

/// Split a stylesheet at its `@import` directives, recursing into resolvable
/// targets. Cycles are an error; unresolvable directives stay in place and
/// produce a warning.
fn collect_fragments(
    path: &Path,
    include_paths: &[PathBuf],
    stack: &mut HashSet<PathBuf>,
    warnings: &mut Vec<String>,
    out: &mut Vec<Fragment>,
) -> Result<(), String> {
    let canonical = path
        .canonicalize()
        .map_err(|e| format!("cannot resolve {}: {}", path.display(), e))?;
    if !stack.insert(canonical.clone()) {
        return Err(format!("circular @import involving {}", path.display()));
    }

    let source = fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    let base = path.parent().unwrap_or(Path::new("."));

    let directive = Regex::new(r#"(?m)^[ \t]*@import\s+["']([^"']+)["'][ \t]*;"#).unwrap();
    let mut cursor = 0;

    for m in directive.captures_iter(&source) {
        let whole = m.get(0).unwrap();
        let name = &m[1];

        let before = &source[cursor..whole.start()];
        push_fragment(out, path, before);
        cursor = whole.end();

        match resolve_import(name, base, include_paths) {
            Some(target) => {
                collect_fragments(&target, include_paths, stack, warnings, out)?;
            }
            None => {
                warnings.push(format!(
                    "{}: unresolved @import \"{}\" left in place",
                    path.display(),
                    name
                ));
                push_fragment(out, path, whole.as_str());
            }
        }
    }

    push_fragment(out, path, &source[cursor..]);
    stack.remove(&canonical);
    Ok(())
}

fn push_fragment(out: &mut Vec<Fragment>, origin: &Path, css: &str) {
    if !css.trim().is_empty() {
        out.push(Fragment { origin: origin.to_path_buf(), css: css.to_string() });
    }
}

/// Resolve an import name against the importing file's directory and the
/// configured include paths. Tries the literal name, `name.scss`,
/// `name.sass`, the `_name` partial forms and `name.css`. URLs are never
/// resolved.
fn resolve_import(name: &str, base: &Path, include_paths: &[PathBuf]) -> Option<PathBuf> {
    if name.starts_with("http://") || name.starts_with("https://") || name.starts_with("//") {
        return None;
    }

    let name_path = Path::new(name);
    let partial = name_path.file_name().map(|f| {
        let mut p = name_path.parent().unwrap_or(Path::new("")).to_path_buf();
        p.push(format!("_{}", f.to_string_lossy()));
        p
    });

    let mut roots = vec![base.to_path_buf()];
    roots.extend(include_paths.iter().cloned());

    for root in &roots {
        let mut candidates = vec![
            root.join(name_path),
            root.join(name_path).with_extension("scss"),
            root.join(name_path).with_extension("sass"),
        ];
        if let Some(ref partial) = partial {
            candidates.push(root.join(partial).with_extension("scss"));
            candidates.push(root.join(partial).with_extension("sass"));
        }
        candidates.push(root.join(name_path).with_extension("css"));
        for candidate in candidates {
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    None
}

/// Expanded artifact: each fragment compiled (prefixes applied) and preceded
/// by a source boundary comment.
fn print_expanded(ctx: &BuildContext, fragments: &[Fragment]) -> Result<String, String> {
    let mut out = String::new();
    for fragment in fragments {
        let compiled = compile_css(&fragment.css, false)
            .map_err(|e| format!("{}: {}", fragment.origin.display(), e))?;
        let shown = fragment
            .origin
            .strip_prefix(ctx.project_root())
            .unwrap_or(&fragment.origin);
        out.push_str(&format!("/* from: {} */\n{}\n", shown.display(), compiled.trim_end()));
    }
    Ok(out)
}

/// Default browser targets driving vendor prefixing and syntax lowering.
fn browser_targets() -> Targets {
    Targets::from(Browsers {
        chrome: Some(90 << 16),
        edge: Some(90 << 16),
        firefox: Some(88 << 16),
        safari: Some(14 << 16),
        ios_saf: Some(14 << 16),
        ..Browsers::default()
    })
}

/// One lightningcss pass: parse, lower/prefix for the targets, print.
fn compile_css(source: &str, minify: bool) -> Result<String, String> {
    let mut sheet =
        StyleSheet::parse(source, ParserOptions::default()).map_err(|e| e.to_string())?;
    sheet
        .minify(MinifyOptions { targets: browser_targets(), ..MinifyOptions::default() })
        .map_err(|e| e.to_string())?;
    let result = sheet
        .to_css(PrinterOptions { minify, targets: browser_targets(), ..PrinterOptions::default() })
        .map_err(|e| e.to_string())?;
    Ok(result.code)
}
