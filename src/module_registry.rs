/*
 * ==========================================================================
 * VaultScript — Sandboxed Embedded Scripting Runtime
 * ==========================================================================
 *
 * This file is part of the VaultScript runtime.
 *
 * VaultScript is dual-licensed under the terms of:
 *   - The MIT License
 *   - The Apache License, Version 2.0
 *
 * You may choose either license to govern your use of this software.
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under these licenses is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * ==========================================================================
 */

//! Resolves, loads, caches, and cycle-detects `require`d source files —
//! Component 3 of the core.
//!
//! The registry itself only owns resolution policy (roots, allow/deny
//! globs) and the shared, Engine-lifetime module cache. Cycle detection
//! needs a per-call load stack, so it lives on the `Execution` that drives
//! a given `require` chain (see `execution.rs`); this module is the
//! read-mostly, lock-guarded side of the story that §5 calls out as the
//! only shared mutable state on an `Engine`.

use std::collections::{HashMap, VecDeque};
use std::path::{Component, Path, PathBuf};
use std::sync::RwLock;

use tracing::{debug, trace};

use crate::error::{ScriptError, ScriptResult};
use crate::span::Span;
use crate::value::Value;

/// A cached module: its exported-names hash plus the name list used for
/// "merge without overwriting" on an unaliased `require`.
#[derive(Clone)]
pub struct ModuleEntry {
    pub value: Value,
    pub export_names: Vec<String>,
}

pub struct ModuleRegistry {
    roots: Vec<PathBuf>,
    allow: Vec<String>,
    deny: Vec<String>,
    max_cached: usize,
    cache: RwLock<HashMap<String, ModuleEntry>>,
    order: RwLock<VecDeque<String>>,
}

impl ModuleRegistry {
    pub fn new(roots: Vec<PathBuf>, allow: Vec<String>, deny: Vec<String>, max_cached: usize) -> Self {
        Self {
            roots,
            allow,
            deny,
            max_cached,
            cache: RwLock::new(HashMap::new()),
            order: RwLock::new(VecDeque::new()),
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Resolve `rel_path` against `requiring_root` (or, failing that, each
    /// configured root in order), reject escapes and policy mismatches, and
    /// return the canonical cache key plus the root it resolved under.
    pub fn resolve(
        &self,
        requiring_root: &Path,
        rel_path: &str,
        span: Span,
    ) -> ScriptResult<(PathBuf, PathBuf)> {
        let mut candidates: Vec<&Path> = vec![requiring_root];
        candidates.extend(self.roots.iter().map(PathBuf::as_path));

        let mut last_err: Option<ScriptError> = None;
        for root in candidates {
            match self.resolve_under_root(root, rel_path, span) {
                Ok(resolved) => return Ok((resolved, root.to_path_buf())),
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err.unwrap_or_else(|| {
            ScriptError::module(format!("module not found: {rel_path}"), span)
        }))
    }

    fn resolve_under_root(&self, root: &Path, rel_path: &str, span: Span) -> ScriptResult<PathBuf> {
        let joined = normalize_join(root, rel_path);
        if !joined.starts_with(root) {
            return Err(ScriptError::module(
                format!("module path escapes its root: {rel_path}"),
                span,
            ));
        }
        let rel_for_policy = joined
            .strip_prefix(root)
            .unwrap_or(&joined)
            .to_string_lossy()
            .replace('\\', "/");
        if !self.is_allowed(&rel_for_policy) {
            return Err(ScriptError::module(
                format!("module path denied by policy: {rel_path}"),
                span,
            ));
        }
        Ok(joined)
    }

    fn is_allowed(&self, rel_path: &str) -> bool {
        if self.deny.iter().any(|pat| glob_match(pat, rel_path)) {
            return false;
        }
        if self.allow.is_empty() {
            return true;
        }
        self.allow.iter().any(|pat| glob_match(pat, rel_path))
    }

    pub fn cache_key(path: &Path) -> String {
        path.to_string_lossy().into_owned()
    }

    pub fn get_cached(&self, key: &str) -> Option<ModuleEntry> {
        let hit = self.cache.read().unwrap().get(key).cloned();
        if hit.is_some() {
            trace!(module = key, "module cache hit");
        }
        hit
    }

    pub fn insert(&self, key: String, entry: ModuleEntry) {
        let mut cache = self.cache.write().unwrap();
        let mut order = self.order.write().unwrap();
        if !cache.contains_key(&key) {
            order.push_back(key.clone());
            while order.len() > self.max_cached {
                if let Some(evicted) = order.pop_front() {
                    cache.remove(&evicted);
                    debug!(module = evicted, "evicted module from cache (max_cached_modules)");
                }
            }
        }
        debug!(module = key, "cached module");
        cache.insert(key, entry);
    }

    pub fn clear(&self) -> usize {
        let mut cache = self.cache.write().unwrap();
        let mut order = self.order.write().unwrap();
        let n = cache.len();
        cache.clear();
        order.clear();
        n
    }
}

fn normalize_join(root: &Path, rel: &str) -> PathBuf {
    let mut result = root.to_path_buf();
    for comp in Path::new(rel).components() {
        match comp {
            Component::Normal(p) => result.push(p),
            Component::ParentDir => {
                result.pop();
            }
            Component::CurDir => {}
            Component::RootDir | Component::Prefix(_) => {}
        }
    }
    result
}

/// Minimal glob matcher supporting `*` (any run of characters, including
/// none) and `?` (exactly one character). No brace/character-class syntax —
/// the policy lists in spec.md are described as "glob-like patterns", not a
/// full shell glob grammar.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let mut dp = vec![vec![false; t.len() + 1]; p.len() + 1];
    dp[0][0] = true;
    for i in 1..=p.len() {
        if p[i - 1] == '*' {
            dp[i][0] = dp[i - 1][0];
        }
    }
    for i in 1..=p.len() {
        for j in 1..=t.len() {
            dp[i][j] = match p[i - 1] {
                '*' => dp[i - 1][j] || dp[i][j - 1],
                '?' => dp[i - 1][j - 1],
                c => dp[i - 1][j - 1] && c == t[j - 1],
            };
        }
    }
    dp[p.len()][t.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_star_matches_any_suffix() {
        assert!(glob_match("policies/*.vs", "policies/discount.vs"));
        assert!(!glob_match("policies/*.vs", "lib/discount.vs"));
    }

    #[test]
    fn glob_exact_match_without_wildcards() {
        assert!(glob_match("lib/util.vs", "lib/util.vs"));
        assert!(!glob_match("lib/util.vs", "lib/util2.vs"));
    }

    #[test]
    fn resolve_rejects_escaping_root() {
        let registry = ModuleRegistry::new(vec![PathBuf::from("/scripts")], vec![], vec![], 10);
        let err = registry
            .resolve(Path::new("/scripts"), "../../etc/passwd", Span::UNKNOWN)
            .unwrap_err();
        assert!(err.to_string().contains("escapes"));
    }

    #[test]
    fn deny_wins_over_allow_on_overlapping_pattern() {
        let registry = ModuleRegistry::new(
            vec![PathBuf::from("/scripts")],
            vec!["*".to_string()],
            vec!["secret/*".to_string()],
            10,
        );
        assert!(registry
            .resolve(Path::new("/scripts"), "public.vs", Span::UNKNOWN)
            .is_ok());
        assert!(registry
            .resolve(Path::new("/scripts"), "secret/key.vs", Span::UNKNOWN)
            .is_err());
    }

    #[test]
    fn cache_evicts_oldest_beyond_max() {
        let registry = ModuleRegistry::new(vec![], vec![], vec![], 1);
        registry.insert(
            "a".to_string(),
            ModuleEntry {
                value: Value::Nil,
                export_names: vec![],
            },
        );
        registry.insert(
            "b".to_string(),
            ModuleEntry {
                value: Value::Nil,
                export_names: vec![],
            },
        );
        assert!(registry.get_cached("a").is_none());
        assert!(registry.get_cached("b").is_some());
    }
}
