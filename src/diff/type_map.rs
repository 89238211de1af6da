//! Type equivalence across two policies.
//!
//! Type identifiers are local to a policy, so rules from two policies cannot
//! be compared by identifier. The type map assigns every primary type of
//! either policy a [`PseudoValue`] such that types considered "the same"
//! share one value. Equivalence comes from explicit [`RemapEntry`]
//! declarations first and from name/alias inference for everything else.
//!
//! A pseudo value with no concrete type on one side is a *hole* on that side:
//! the type only exists in the other policy.

use crate::error::{PolDiffError, Result};
use crate::model::{Policy, TypeId};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Canonical type number shared by both policies. Values start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PseudoValue(u32);

impl PseudoValue {
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    const fn slot(self) -> usize {
        self.0 as usize - 1
    }
}

impl fmt::Display for PseudoValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which of the two policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Original,
    Modified,
}

impl Side {
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Original => Self::Modified,
            Self::Modified => Self::Original,
        }
    }
}

/// A simple one-to-one rename declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TypeRename {
    /// Type name in the original policy
    pub original: String,
    /// Type name in the modified policy
    pub modified: String,
}

impl TypeRename {
    pub fn new(original: impl Into<String>, modified: impl Into<String>) -> Self {
        Self {
            original: original.into(),
            modified: modified.into(),
        }
    }
}

impl std::str::FromStr for TypeRename {
    type Err = String;

    /// Parse `original:modified`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((original, modified)) if !original.trim().is_empty() && !modified.trim().is_empty() => {
                Ok(Self::new(original.trim(), modified.trim()))
            }
            _ => Err(format!("expected ORIGINAL:MODIFIED, got '{s}'")),
        }
    }
}

impl fmt::Display for TypeRename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.original, self.modified)
    }
}

/// One equivalence declaration: these original types are those modified types.
///
/// Either side may list several types (a split or a merge) but not both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemapEntry {
    pub orig_types: Vec<String>,
    pub mod_types: Vec<String>,
    pub enabled: bool,
    /// Produced by inference rather than declared
    pub inferred: bool,
}

impl RemapEntry {
    /// An enabled, explicit entry.
    pub fn new(orig_types: Vec<String>, mod_types: Vec<String>) -> Self {
        Self {
            orig_types,
            mod_types,
            enabled: true,
            inferred: false,
        }
    }

    fn inferred(orig: &str, modified: &str) -> Self {
        Self {
            orig_types: vec![orig.to_string()],
            mod_types: vec![modified.to_string()],
            enabled: true,
            inferred: true,
        }
    }

    fn names(&self, side: Side) -> &[String] {
        match side {
            Side::Original => &self.orig_types,
            Side::Modified => &self.mod_types,
        }
    }
}

impl From<&TypeRename> for RemapEntry {
    fn from(rename: &TypeRename) -> Self {
        Self::new(vec![rename.original.clone()], vec![rename.modified.clone()])
    }
}

impl fmt::Display for RemapEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}",
            self.orig_types.join(", "),
            self.mod_types.join(", ")
        )
    }
}

/// Resolve a declared name to a primary type, rejecting aliases and attributes.
fn resolve_primary(policy: &Policy, name: &str, which: &str) -> Result<TypeId> {
    policy.primary_type(name).ok_or_else(|| {
        if policy.type_id(name).is_some() || policy.is_attribute(name) {
            PolDiffError::invalid_argument(format!("{name} is not a primary type"))
        } else {
            PolDiffError::invalid_argument(format!("{name} is not a type in the {which} policy"))
        }
    })
}

/// Check a single entry's shape and names.
pub fn validate_entry(original: &Policy, modified: &Policy, entry: &RemapEntry) -> Result<()> {
    if entry.orig_types.is_empty() || entry.mod_types.is_empty() {
        return Err(PolDiffError::invalid_argument(
            "a remap entry needs at least one type on each side",
        ));
    }
    if entry.orig_types.len() > 1 && entry.mod_types.len() > 1 {
        return Err(PolDiffError::invalid_argument(format!(
            "many-to-many remap {entry} is not allowed"
        )));
    }
    for name in &entry.orig_types {
        resolve_primary(original, name, "original")?;
    }
    for name in &entry.mod_types {
        resolve_primary(modified, name, "modified")?;
    }
    Ok(())
}

/// Check a list of entries, including conflicts between enabled entries.
pub fn validate_entries(original: &Policy, modified: &Policy, entries: &[RemapEntry]) -> Result<()> {
    let mut claimed_orig: HashMap<&str, usize> = HashMap::new();
    let mut claimed_mod: HashMap<&str, usize> = HashMap::new();
    for (index, entry) in entries.iter().enumerate() {
        validate_entry(original, modified, entry)?;
        if !entry.enabled {
            continue;
        }
        for (names, claimed) in [
            (&entry.orig_types, &mut claimed_orig),
            (&entry.mod_types, &mut claimed_mod),
        ] {
            for name in names {
                if claimed.insert(name.as_str(), index).is_some() {
                    return Err(PolDiffError::ambiguous_rename(name.clone()));
                }
            }
        }
    }
    Ok(())
}

/// The pseudo-type space for a pair of policies.
#[derive(Debug, Clone)]
pub struct TypeMap {
    entries: Vec<RemapEntry>,
    orig_to_pseudo: Vec<PseudoValue>,
    mod_to_pseudo: Vec<PseudoValue>,
    pseudo_to_orig: Vec<Vec<TypeId>>,
    pseudo_to_mod: Vec<Vec<TypeId>>,
    orig_names: Vec<String>,
    mod_names: Vec<String>,
}

/// Mutable state while the map is built.
struct Allocation {
    orig_to_pseudo: Vec<Option<PseudoValue>>,
    mod_to_pseudo: Vec<Option<PseudoValue>>,
    pseudo_to_orig: Vec<Vec<TypeId>>,
    pseudo_to_mod: Vec<Vec<TypeId>>,
}

impl Allocation {
    fn new(orig_count: usize, mod_count: usize) -> Self {
        Self {
            orig_to_pseudo: vec![None; orig_count],
            mod_to_pseudo: vec![None; mod_count],
            pseudo_to_orig: Vec::new(),
            pseudo_to_mod: Vec::new(),
        }
    }

    fn allocate(&mut self, orig: Vec<TypeId>, modified: Vec<TypeId>) -> PseudoValue {
        let pseudo = PseudoValue(self.pseudo_to_orig.len() as u32 + 1);
        for id in &orig {
            self.orig_to_pseudo[id.index()] = Some(pseudo);
        }
        for id in &modified {
            self.mod_to_pseudo[id.index()] = Some(pseudo);
        }
        self.pseudo_to_orig.push(orig);
        self.pseudo_to_mod.push(modified);
        pseudo
    }
}

impl TypeMap {
    /// Build the map from explicit remap entries plus inference.
    ///
    /// Disabled entries are kept (and reported by [`TypeMap::entries`]) but do
    /// not influence the mapping.
    pub fn build(original: &Policy, modified: &Policy, remaps: &[RemapEntry]) -> Result<Self> {
        validate_entries(original, modified, remaps)?;

        let mut orig_covered = vec![false; original.type_count()];
        let mut mod_covered = vec![false; modified.type_count()];
        let mut explicit: Vec<(Vec<TypeId>, Vec<TypeId>)> = Vec::new();
        for entry in remaps.iter().filter(|e| e.enabled) {
            let orig_ids = entry
                .names(Side::Original)
                .iter()
                .map(|n| resolve_primary(original, n, "original"))
                .collect::<Result<Vec<_>>>()?;
            let mod_ids = entry
                .names(Side::Modified)
                .iter()
                .map(|n| resolve_primary(modified, n, "modified"))
                .collect::<Result<Vec<_>>>()?;
            for id in &orig_ids {
                orig_covered[id.index()] = true;
            }
            for id in &mod_ids {
                mod_covered[id.index()] = true;
            }
            explicit.push((orig_ids, mod_ids));
        }

        let inferred = infer(original, modified, &mut orig_covered, &mut mod_covered);

        let mut alloc = Allocation::new(original.type_count(), modified.type_count());
        for (orig_ids, mod_ids) in explicit {
            alloc.allocate(orig_ids, mod_ids);
        }
        for (orig_id, mod_id) in &inferred {
            alloc.allocate(vec![*orig_id], vec![*mod_id]);
        }
        for (id, _) in original.types() {
            if alloc.orig_to_pseudo[id.index()].is_none() {
                alloc.allocate(vec![id], Vec::new());
            }
        }
        for (id, _) in modified.types() {
            if alloc.mod_to_pseudo[id.index()].is_none() {
                alloc.allocate(Vec::new(), vec![id]);
            }
        }

        let mut entries = remaps.to_vec();
        entries.extend(inferred.iter().map(|(o, m)| {
            RemapEntry::inferred(&original.type_name(*o), &modified.type_name(*m))
        }));

        let map = Self {
            entries,
            orig_to_pseudo: alloc.orig_to_pseudo.into_iter().flatten().collect(),
            mod_to_pseudo: alloc.mod_to_pseudo.into_iter().flatten().collect(),
            pseudo_to_orig: alloc.pseudo_to_orig,
            pseudo_to_mod: alloc.pseudo_to_mod,
            orig_names: original.types().map(|(_, t)| t.name.clone()).collect(),
            mod_names: modified.types().map(|(_, t)| t.name.clone()).collect(),
        };

        tracing::info!(
            "Type map: {} pseudo types ({} explicit entries, {} inferred, {} original-only, {} modified-only)",
            map.len(),
            remaps.iter().filter(|e| e.enabled).count(),
            inferred.len(),
            map.holes(Side::Modified),
            map.holes(Side::Original)
        );

        Ok(map)
    }

    /// Number of pseudo values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pseudo_to_orig.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pseudo_to_orig.is_empty()
    }

    /// All pseudo values in ascending order.
    pub fn pseudo_values(&self) -> impl Iterator<Item = PseudoValue> {
        (1..=self.len() as u32).map(PseudoValue)
    }

    /// Explicit entries followed by inferred ones.
    #[must_use]
    pub fn entries(&self) -> &[RemapEntry] {
        &self.entries
    }

    /// Pseudo value of a concrete type.
    ///
    /// Every type of the policy the map was built for has one; an identifier
    /// from some other policy is rejected.
    pub fn map_to_pseudo(&self, id: TypeId, side: Side) -> Result<PseudoValue> {
        let table = match side {
            Side::Original => &self.orig_to_pseudo,
            Side::Modified => &self.mod_to_pseudo,
        };
        table.get(id.index()).copied().ok_or_else(|| {
            PolDiffError::invalid_argument(format!(
                "type {id} is not part of the {side:?} policy's type map"
            ))
        })
    }

    /// Concrete types of a pseudo value on one side. Empty for a hole.
    #[must_use]
    pub fn pseudo_to_types(&self, pseudo: PseudoValue, side: Side) -> &[TypeId] {
        let table = match side {
            Side::Original => &self.pseudo_to_orig,
            Side::Modified => &self.pseudo_to_mod,
        };
        if pseudo.0 == 0 {
            return &[];
        }
        table.get(pseudo.slot()).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn is_hole(&self, pseudo: PseudoValue, side: Side) -> bool {
        self.pseudo_to_types(pseudo, side).is_empty()
    }

    /// Names of the concrete types of `pseudo` on `side`.
    #[must_use]
    pub fn names_on(&self, pseudo: PseudoValue, side: Side) -> Vec<&str> {
        let names = match side {
            Side::Original => &self.orig_names,
            Side::Modified => &self.mod_names,
        };
        self.pseudo_to_types(pseudo, side)
            .iter()
            .filter_map(|id| names.get(id.index()).map(String::as_str))
            .collect()
    }

    /// Name of the first type of `pseudo` on `side`, falling back to the other side.
    #[must_use]
    pub fn name_of(&self, pseudo: PseudoValue, side: Side) -> String {
        self.names_on(pseudo, side)
            .first()
            .map(|n| (*n).to_string())
            .or_else(|| {
                self.names_on(pseudo, side.other())
                    .first()
                    .map(|n| (*n).to_string())
            })
            .unwrap_or_else(|| format!("<pseudo {pseudo}>"))
    }

    /// Composite name covering both sides.
    ///
    /// A type known on one side only shows that side's names; a type with the
    /// same single name on both sides shows that name; anything else reads
    /// `"a, b -> c"`.
    #[must_use]
    pub fn display_name(&self, pseudo: PseudoValue) -> String {
        let orig = self.names_on(pseudo, Side::Original);
        let modified = self.names_on(pseudo, Side::Modified);
        match (orig.is_empty(), modified.is_empty()) {
            (true, true) => format!("<pseudo {pseudo}>"),
            (false, true) => orig.join(", "),
            (true, false) => modified.join(", "),
            (false, false) if orig.len() == 1 && orig == modified => orig[0].to_string(),
            (false, false) => format!("{} -> {}", orig.join(", "), modified.join(", ")),
        }
    }

    /// Number of pseudo values that are holes on `side`.
    #[must_use]
    pub fn holes(&self, side: Side) -> usize {
        self.pseudo_values().filter(|p| self.is_hole(*p, side)).count()
    }
}

/// Pair up types not covered by explicit entries.
///
/// Passes run in a fixed order and each only sees what earlier passes left
/// uncovered:
/// 1. identical primary names;
/// 2. an original name that is an alias in the modified policy;
/// 3. a modified name that is an alias in the original policy;
/// 4. identical non-empty alias sets.
fn infer(
    original: &Policy,
    modified: &Policy,
    orig_covered: &mut [bool],
    mod_covered: &mut [bool],
) -> Vec<(TypeId, TypeId)> {
    let mut pairs = Vec::new();
    let mut claim = |o: TypeId, m: TypeId, orig_covered: &mut [bool], mod_covered: &mut [bool]| {
        orig_covered[o.index()] = true;
        mod_covered[m.index()] = true;
        pairs.push((o, m));
    };

    let mut counts = [0usize; 4];

    for (o, sym) in original.types() {
        if orig_covered[o.index()] {
            continue;
        }
        if let Some(m) = modified.primary_type(&sym.name) {
            if !mod_covered[m.index()] {
                claim(o, m, orig_covered, mod_covered);
                counts[0] += 1;
            }
        }
    }

    for (o, sym) in original.types() {
        if orig_covered[o.index()] || !modified.is_alias(&sym.name) {
            continue;
        }
        if let Some(m) = modified.type_id(&sym.name) {
            if !mod_covered[m.index()] {
                claim(o, m, orig_covered, mod_covered);
                counts[1] += 1;
            }
        }
    }

    for (m, sym) in modified.types() {
        if mod_covered[m.index()] || !original.is_alias(&sym.name) {
            continue;
        }
        if let Some(o) = original.type_id(&sym.name) {
            if !orig_covered[o.index()] {
                claim(o, m, orig_covered, mod_covered);
                counts[2] += 1;
            }
        }
    }

    let mut by_aliases: HashMap<Vec<String>, TypeId> = HashMap::new();
    for (m, sym) in modified.types() {
        if mod_covered[m.index()] || sym.aliases.is_empty() {
            continue;
        }
        let mut aliases = sym.aliases.clone();
        aliases.sort();
        by_aliases.entry(aliases).or_insert(m);
    }
    for (o, sym) in original.types() {
        if orig_covered[o.index()] || sym.aliases.is_empty() {
            continue;
        }
        let mut aliases = sym.aliases.clone();
        aliases.sort();
        if let Some(m) = by_aliases.remove(&aliases) {
            if !mod_covered[m.index()] {
                claim(o, m, orig_covered, mod_covered);
                counts[3] += 1;
            }
        }
    }

    tracing::debug!(
        "Type inference: {} by name, {} by original name as alias, {} by modified name as alias, {} by alias set",
        counts[0],
        counts[1],
        counts[2],
        counts[3]
    );

    pairs
}
