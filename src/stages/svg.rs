//! SVG sprite stage.
//!
//! Optimizes each SVG in the sprite source directory and combines them into a
//! single sprite document with one `<symbol>` per source file. Symbol ids are
//! prefixed `image-` to avoid collisions with page ids; `viewBox` attributes
//! are always preserved.

use crate::pipeline::{BuildContext, Stage, StageResult};
use regex::Regex;
use std::fs;
use std::path::Path;

/// Name of the combined sprite document.
pub const SPRITE_NAME: &str = "sprite.svg";

/// Builds `sprite.svg` from the sprite source directory (non-recursive).
pub struct SvgSprite;

impl Stage for SvgSprite {
    fn name(&self) -> &'static str {
        "svgs"
    }

    fn run(&self, ctx: &BuildContext) -> StageResult {
        if !ctx.config().settings.svgs {
            return StageResult::skipped(self.name());
        }

        let input_dir = ctx.resolve(&ctx.config().paths.svgs.input);
        let pattern = format!("{}/*.svg", input_dir.display());
        let files = match super::matched_files(&pattern) {
            Ok(files) => files,
            Err(e) => return StageResult::failed(self.name(), e),
        };

        if files.is_empty() {
            return StageResult::done(self.name(), vec![]);
        }

        let mut symbols = Vec::new();
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

            match to_symbol(file, &source) {
                Ok(symbol) => symbols.push(symbol),
                Err(e) => return StageResult::failed(self.name(), e),
            }
        }

        let out_dir = ctx.resolve(&ctx.config().paths.svgs.output);
        if let Err(e) = fs::create_dir_all(&out_dir) {
            return StageResult::failed(
                self.name(),
                format!("cannot create {}: {}", out_dir.display(), e),
            );
        }

        let sprite = format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\">\n{}\n</svg>\n",
            symbols.join("\n")
        );
        let out_file = out_dir.join(SPRITE_NAME);
        match fs::write(&out_file, sprite) {
            Ok(()) => StageResult::done(self.name(), vec![out_file]),
            Err(e) => StageResult::failed(
                self.name(),
                format!("cannot write {}: {}", out_file.display(), e),
            ),
        }
    }
}

/// Optimize one SVG document and wrap it as a `<symbol>` named after the
/// source file.
fn to_symbol(file: &Path, source: &str) -> Result<String, String> {
    let optimized = optimize(source);

    let root = Regex::new(r"(?si)<svg\b([^>]*)>(.*)</svg>").unwrap();
    let caps = root
        .captures(&optimized)
        .ok_or_else(|| format!("{}: no <svg> root element", file.display()))?;
    let attrs = caps.get(1).map(|m| m.as_str()).unwrap_or("");
    let inner = caps.get(2).map(|m| m.as_str()).unwrap_or("").trim();

    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .ok_or_else(|| format!("{}: no file stem", file.display()))?;

    let view_box = Regex::new(r#"viewBox\s*=\s*"([^"]*)""#)
        .unwrap()
        .captures(attrs)
        .map(|c| format!(" viewBox=\"{}\"", &c[1]))
        .unwrap_or_default();

    Ok(format!("<symbol id=\"image-{}\"{}>{}</symbol>", stem, view_box, inner))
}

/// Strip doctype, XML processing instructions, comments, metadata,
/// descriptions, titles and empty defs; round path data to 2 decimals.
fn optimize(source: &str) -> String {
    let mut svg = source.to_string();
    let removals = [
        r"(?s)<!--.*?-->",
        r"(?si)<!DOCTYPE[^>]*>",
        r"(?s)<\?.*?\?>",
        r"(?si)<metadata\b.*?</metadata>",
        r"(?si)<desc\b.*?</desc>",
        r"(?si)<title\b.*?</title>",
        r"(?si)<defs\b[^>]*>\s*</defs>",
    ];
    for pattern in removals {
        svg = Regex::new(pattern).unwrap().replace_all(&svg, "").into_owned();
    }

    let path_data = Regex::new(r#"\bd\s*=\s*"([^"]*)""#).unwrap();
    let svg = path_data
        .replace_all(&svg, |caps: &regex::Captures<'_>| {
            format!("d=\"{}\"", round_numbers(&caps[1]))
        })
        .into_owned();

    // collapse whitespace-only lines left by the removals
    svg.lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Round every decimal number in a path data string to 2 decimal places.
fn round_numbers(data: &str) -> String {
    let number = Regex::new(r"-?\d+\.\d+").unwrap();
    number
        .replace_all(data, |caps: &regex::Captures<'_>| {
            match caps[0].parse::<f64>() {
                Ok(v) => format_rounded(v),
                Err(_) => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Format with at most 2 decimals, trailing zeros trimmed.
fn format_rounded(v: f64) -> String {
    let rounded = (v * 100.0).round() / 100.0;
    let mut s = format!("{:.2}", rounded);
    while s.ends_with('0') {
        s.pop();
    }
    if s.ends_with('.') {
        s.pop();
    }
    s
}
