//! Typemap command handler.
//!
//! Shows how the types of two policies line up: which pseudo type each
//! concrete type belongs to, which renames were declared or inferred, and
//! which types exist on one side only.

use crate::config::DiffPaths;
use crate::diff::{DiffSession, PseudoValue, Side, TypeMap, TypeRename};
use crate::pipeline::{check_rename_names, parse_policy_pair, write_output, OutputTarget};
use crate::reports::ReportFormat;
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::fmt::Write;
use std::path::PathBuf;

/// A one-to-many or many-to-one remap from the command line: `a_t,b_t=c_t`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemapArg {
    pub orig_types: Vec<String>,
    pub mod_types: Vec<String>,
}

impl std::str::FromStr for RemapArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (orig, modified) = s
            .split_once('=')
            .ok_or_else(|| format!("expected ORIG[,ORIG...]=MOD[,MOD...], got '{s}'"))?;
        let split = |side: &str| -> Vec<String> {
            side.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect()
        };
        let arg = Self {
            orig_types: split(orig),
            mod_types: split(modified),
        };
        if arg.orig_types.is_empty() || arg.mod_types.is_empty() {
            return Err(format!("both sides of '{s}' need at least one type"));
        }
        Ok(arg)
    }
}

/// One row of the type map listing.
#[derive(Debug, Serialize)]
struct PseudoRow<'a> {
    pseudo: u32,
    original: Vec<&'a str>,
    modified: Vec<&'a str>,
}

impl<'a> PseudoRow<'a> {
    fn new(map: &'a TypeMap, pseudo: PseudoValue) -> Self {
        Self {
            pseudo: pseudo.get(),
            original: map.names_on(pseudo, Side::Original),
            modified: map.names_on(pseudo, Side::Modified),
        }
    }

    fn is_identity(&self) -> bool {
        self.original.len() == 1 && self.original == self.modified
    }
}

/// Options for the typemap command.
#[derive(Debug, Clone)]
pub struct TypemapOptions {
    pub paths: DiffPaths,
    pub renames: Vec<TypeRename>,
    pub remaps: Vec<RemapArg>,
    /// List identity mappings too
    pub all: bool,
    pub format: ReportFormat,
    pub output_file: Option<PathBuf>,
}

/// Run the typemap command
#[allow(clippy::needless_pass_by_value)]
pub fn run_typemap(options: TypemapOptions) -> Result<()> {
    if !matches!(options.format, ReportFormat::Text | ReportFormat::Json) {
        bail!("typemap supports text and json output, not {}", options.format);
    }

    let (original, modified) = parse_policy_pair(&options.paths, true)?;
    check_rename_names(&original, &modified, &options.renames)?;

    let mut session = DiffSession::new(&original, &modified, &options.renames)?;
    for remap in &options.remaps {
        let orig: Vec<&str> = remap.orig_types.iter().map(String::as_str).collect();
        let mods: Vec<&str> = remap.mod_types.iter().map(String::as_str).collect();
        session
            .add_remap(&orig, &mods)
            .with_context(|| format!("remap {}={}", orig.join(","), mods.join(",")))?;
    }
    let map = session.type_map()?;

    let content = match options.format {
        ReportFormat::Json => render_json(map)?,
        _ => render_text(map, options.all),
    };
    write_output(&content, &OutputTarget::from_option(options.output_file), true)
}

fn render_text(map: &TypeMap, all: bool) -> String {
    let rows: Vec<PseudoRow<'_>> = map.pseudo_values().map(|p| PseudoRow::new(map, p)).collect();
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Type map: {} pseudo types, {} original-only, {} modified-only",
        map.len(),
        map.holes(Side::Modified),
        map.holes(Side::Original)
    );

    let _ = writeln!(out, "\nRemap entries: {}", map.entries().len());
    for entry in map.entries() {
        let mut flags = Vec::new();
        if entry.inferred {
            flags.push("inferred");
        }
        if !entry.enabled {
            flags.push("disabled");
        }
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!(" ({})", flags.join(", "))
        };
        let _ = writeln!(
            out,
            "   {} -> {}{}",
            entry.orig_types.join(", "),
            entry.mod_types.join(", "),
            flags
        );
    }

    let _ = writeln!(out, "\nPseudo types:");
    for row in rows.iter().filter(|r| all || !r.is_identity()) {
        let side = |names: &[&str]| {
            if names.is_empty() {
                "(none)".to_string()
            } else {
                names.join(", ")
            }
        };
        let _ = writeln!(
            out,
            "   {:>5}  {} -> {}",
            row.pseudo,
            side(&row.original),
            side(&row.modified)
        );
    }
    out
}

fn render_json(map: &TypeMap) -> Result<String> {
    #[derive(Serialize)]
    struct TypeMapJson<'a> {
        pseudo_types: usize,
        original_only: usize,
        modified_only: usize,
        entries: &'a [crate::diff::RemapEntry],
        types: Vec<PseudoRow<'a>>,
    }

    let json = TypeMapJson {
        pseudo_types: map.len(),
        original_only: map.holes(Side::Modified),
        modified_only: map.holes(Side::Original),
        entries: map.entries(),
        types: map.pseudo_values().map(|p| PseudoRow::new(map, p)).collect(),
    };
    Ok(serde_json::to_string_pretty(&json)?)
}
