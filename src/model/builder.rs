//! Build the sectioned script from classified objects
//!
//! Sections are emitted in a fixed order: drops, then functions, then
//! procedures. Drops must run before creates so a rename cannot collide,
//! and procedures may reference functions defined in the same script.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use super::{ClassifiedScript, DropKind, DropStatement, SqlObject};
use crate::parser::{ObjectKey, BATCH_TERMINATOR};

/// Banner preceding the drop section
pub const DROP_BANNER: &str = "-- DROP STATEMENTS --";
/// Banner preceding the function section
pub const FUNCTION_BANNER: &str = "-- FUNCTIONS --";
/// Banner preceding the procedure section
pub const PROCEDURE_BANNER: &str = "-- PROCEDURES --";

/// The three ordered, deduplicated sections of a sync script
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssembledScript {
    pub drops: Vec<DropStatement>,
    pub functions: Vec<SqlObject>,
    pub procedures: Vec<SqlObject>,
    /// Definitions discarded because a later one had the same key
    pub duplicates_removed: usize,
    /// Drops omitted because the same object is recreated further down
    pub drops_superseded: usize,
}

impl AssembledScript {
    pub fn is_empty(&self) -> bool {
        self.drops.is_empty() && self.functions.is_empty() && self.procedures.is_empty()
    }

    /// Render the sections as script text. An empty script renders as `""`.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let drops: Vec<String> = self.drops.iter().map(DropStatement::body).collect();
        push_section(&mut out, DROP_BANNER, drops.iter().map(String::as_str));
        push_section(
            &mut out,
            FUNCTION_BANNER,
            self.functions.iter().map(|f| f.body.as_str()),
        );
        push_section(
            &mut out,
            PROCEDURE_BANNER,
            self.procedures.iter().map(|p| p.body.as_str()),
        );
        out
    }
}

fn push_section<'a>(out: &mut String, banner: &str, bodies: impl Iterator<Item = &'a str>) {
    let mut bodies = bodies.peekable();
    if bodies.peek().is_none() {
        return;
    }

    out.push_str(banner);
    out.push_str("\n\n");
    for body in bodies {
        out.push_str(body.trim_end());
        out.push('\n');
        out.push_str(BATCH_TERMINATOR);
        out.push_str("\n\n");
    }
}

/// Regroup classified objects into sections.
///
/// Within each section the last definition of a key wins and takes the
/// position of that last occurrence. Drops of objects that are recreated in
/// the function or procedure section are left out.
pub fn build_sections(classified: &ClassifiedScript) -> AssembledScript {
    let (functions, function_dups) = dedup_last_wins(&classified.functions, |f| f.key.clone());
    let (procedures, procedure_dups) = dedup_last_wins(&classified.procedures, |p| p.key.clone());
    let (drops, _) = dedup_last_wins(&classified.drops, |d| (d.kind, d.key.clone()));

    let defined: HashSet<(DropKind, &ObjectKey)> = functions
        .iter()
        .chain(procedures.iter())
        .map(|o| (DropKind::from(o.kind), &o.key))
        .collect();

    let total_drops = drops.len();
    let drops: Vec<DropStatement> = drops
        .into_iter()
        .filter(|d| !defined.contains(&(d.kind, &d.key)))
        .collect();
    let drops_superseded = total_drops - drops.len();

    AssembledScript {
        drops,
        functions,
        procedures,
        duplicates_removed: function_dups + procedure_dups,
        drops_superseded,
    }
}

/// Keep only the last item per key, in the order of those last occurrences.
///
/// Returns the survivors and the number of items discarded.
fn dedup_last_wins<T, K, F>(items: &[T], key_of: F) -> (Vec<T>, usize)
where
    T: Clone,
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut last_index: HashMap<K, usize> = HashMap::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        last_index.insert(key_of(item), i);
    }

    let survivors: Vec<T> = items
        .iter()
        .enumerate()
        .filter(|(i, item)| last_index.get(&key_of(*item)) == Some(i))
        .map(|(_, item)| item.clone())
        .collect();
    let removed = items.len() - survivors.len();

    (survivors, removed)
}
