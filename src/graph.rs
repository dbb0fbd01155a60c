//! Builds the module dependency graph (the [`TaskTree`]) from a set of tasks.
//!
//! Construction enforces the two correctness invariants that must hold before any
//! subprocess is spawned: every module is defined at most once, and every `use`
//! resolves to either a defining source, a pre-built `.mod` in an include directory,
//! or one of the two well-known modules that are always or conditionally dropped
//! (`iso_c_binding`, `mpi`).

use crate::{
    error::{FcompileError, Result},
    hash::{hash_file, Hash},
    parser::parse_modules,
    types::{ModuleName, SourceId, Task},
};
use std::collections::{HashMap, HashSet};

/// An immutable, fully-resolved dependency graph over a set of compilation tasks.
#[derive(Debug)]
pub struct TaskTree {
    /// Modules defined by each source, in declaration order.
    pub src_mods: HashMap<SourceId, Vec<ModuleName>>,
    /// Reverse index: sources that `use` a given module.
    pub mod_uses: HashMap<ModuleName, Vec<SourceId>>,
    /// Current-run hashes of sources, args-salted.
    pub hashes: HashMap<String, Hash>,
    /// Line counts, used only for progress/ETA.
    pub line_nums: HashMap<SourceId, usize>,
    /// Scheduling priority: 1 plus the sum of children's priorities.
    pub priority: HashMap<SourceId, u64>,
    /// Transitive ancestors (sources that must precede a given source).
    pub ancestors: HashMap<SourceId, HashSet<SourceId>>,
}

const ISO_C_BINDING: &str = "iso_c_binding";
const MPI: &str = "mpi";

impl TaskTree {
    /// Parses, hashes and links every task in `tasks` into a [`TaskTree`].
    pub fn build(tasks: &HashMap<SourceId, Task>) -> Result<Self> {
        let mut src_mods: HashMap<SourceId, Vec<ModuleName>> = HashMap::new();
        let mut mod_defs: HashMap<ModuleName, SourceId> = HashMap::new();
        let mut src_deps: HashMap<SourceId, HashSet<ModuleName>> = HashMap::new();
        let mut hashes: HashMap<String, Hash> = HashMap::new();
        let mut line_nums: HashMap<SourceId, usize> = HashMap::new();

        for (src, task) in tasks {
            let file = std::fs::File::open(&task.source)?;
            let parsed = parse_modules(&task.source, file)?;
            let hash = hash_file(&task.source, Some(&task.args))?;

            for module in &parsed.defined_modules {
                if let Some(first) = mod_defs.get(module) {
                    return Err(FcompileError::ModuleMultipleDefined {
                        module: module.clone(),
                        first: first.clone(),
                        second: src.clone(),
                    });
                }
                mod_defs.insert(module.clone(), src.clone());
            }

            line_nums.insert(src.clone(), parsed.line_count);
            hashes.insert(src.as_str().to_owned(), hash);
            src_deps.insert(src.clone(), parsed.used_modules);
            src_mods.insert(src.clone(), parsed.defined_modules);
        }

        let iso_c_binding = ModuleName::new(ISO_C_BINDING);
        let mpi = ModuleName::new(MPI);
        let mpi_defined = mod_defs.contains_key(&mpi);

        for used in src_deps.values_mut() {
            used.remove(&iso_c_binding);
            if !mpi_defined {
                used.remove(&mpi);
            }
        }

        for (src, task) in tasks {
            if task.includes.is_empty() {
                continue;
            }
            let deps = src_deps.get_mut(src).unwrap();
            deps.retain(|module| {
                !task.includes.iter().any(|dir| dir.join(module.artifact_filename()).exists())
            });
        }

        for deps in src_deps.values() {
            for module in deps {
                if !mod_defs.contains_key(module) {
                    return Err(FcompileError::ModuleNotDefined(module.clone()));
                }
            }
        }

        let mut mod_uses: HashMap<ModuleName, Vec<SourceId>> = HashMap::new();
        for (src, deps) in &src_deps {
            for module in deps {
                mod_uses.entry(module.clone()).or_default().push(src.clone());
            }
        }

        // children(src) = downstream sources reachable through modules `src` defines.
        let children: HashMap<SourceId, Vec<SourceId>> = src_mods
            .iter()
            .map(|(src, mods)| {
                let mut out = Vec::new();
                for m in mods {
                    if let Some(users) = mod_uses.get(m) {
                        out.extend(users.iter().cloned());
                    }
                }
                (src.clone(), out)
            })
            .collect();
        let priority = compute_priority(&children);

        // parents(src) = sources directly required by src's uses.
        let parents: HashMap<SourceId, HashSet<SourceId>> = src_deps
            .iter()
            .map(|(src, deps)| {
                (src.clone(), deps.iter().map(|m| mod_defs[m].clone()).collect())
            })
            .collect();
        let ancestors = compute_ancestors(&parents);

        Ok(Self { src_mods, mod_uses, hashes, line_nums, priority, ancestors })
    }
}

/// `priority(node) = 1 + sum(priority(child) for child in children[node])`, memoized.
///
/// A node re-encountered while still being computed (a cycle) contributes 0 rather
/// than recursing forever; the source language forbids module cycles so this only
/// matters for malformed input, which need not produce a diagnostic here -- only
/// that construction terminates.
fn compute_priority(children: &HashMap<SourceId, Vec<SourceId>>) -> HashMap<SourceId, u64> {
    let mut priority = HashMap::new();
    let mut in_progress = HashSet::new();

    fn visit(
        node: &SourceId,
        children: &HashMap<SourceId, Vec<SourceId>>,
        priority: &mut HashMap<SourceId, u64>,
        in_progress: &mut HashSet<SourceId>,
    ) -> u64 {
        if let Some(p) = priority.get(node) {
            return *p;
        }
        if !in_progress.insert(node.clone()) {
            return 0;
        }
        let sum: u64 = children
            .get(node)
            .map(|cs| cs.iter().map(|c| visit(c, children, priority, in_progress)).sum())
            .unwrap_or(0);
        in_progress.remove(node);
        let p = 1 + sum;
        priority.insert(node.clone(), p);
        p
    }

    for node in children.keys() {
        visit(node, children, &mut priority, &mut in_progress);
    }
    priority
}

/// `ancestors(node) = parents[node] union ancestors(p) for p in parents[node]`, memoized.
fn compute_ancestors(
    parents: &HashMap<SourceId, HashSet<SourceId>>,
) -> HashMap<SourceId, HashSet<SourceId>> {
    let mut ancestors: HashMap<SourceId, HashSet<SourceId>> = HashMap::new();
    let mut in_progress = HashSet::new();

    fn visit(
        node: &SourceId,
        parents: &HashMap<SourceId, HashSet<SourceId>>,
        ancestors: &mut HashMap<SourceId, HashSet<SourceId>>,
        in_progress: &mut HashSet<SourceId>,
    ) -> HashSet<SourceId> {
        if let Some(a) = ancestors.get(node) {
            return a.clone();
        }
        if !in_progress.insert(node.clone()) {
            return HashSet::new();
        }
        let mut acc: HashSet<SourceId> = parents.get(node).cloned().unwrap_or_default();
        let direct: Vec<SourceId> = acc.iter().cloned().collect();
        for p in direct {
            acc.extend(visit(&p, parents, ancestors, in_progress));
        }
        in_progress.remove(node);
        ancestors.insert(node.clone(), acc.clone());
        acc
    }

    for node in parents.keys() {
        visit(node, parents, &mut ancestors, &mut in_progress);
    }
    ancestors
}
