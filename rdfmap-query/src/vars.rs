//! Property/variable bookkeeping.
//!
//! [`PropVarMap`] is the bijection between an entity's schema keys and the
//! query variables they were given. [`VarAllocator`] hands out variable names
//! for one whole query so no two entities ever collide.

use indexmap::IndexMap;
use rdfmap_sparql::ast::Var;
use std::collections::{HashMap, HashSet};

/// Ordered key → variable map with a reverse index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropVarMap {
    forward: IndexMap<String, Var>,
    reverse: HashMap<String, String>,
}

impl PropVarMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `key` to `var`, replacing any earlier mapping of either side.
    pub fn insert(&mut self, key: impl Into<String>, var: Var) {
        let key = key.into();
        if let Some(old) = self.forward.get(&key) {
            self.reverse.remove(old.as_str());
        }
        if let Some(old_key) = self.reverse.get(var.as_str()).cloned() {
            if old_key != key {
                self.forward.shift_remove(&old_key);
            }
        }
        self.reverse.insert(var.as_str().to_string(), key.clone());
        self.forward.insert(key, var);
    }

    pub fn var(&self, key: &str) -> Option<&Var> {
        self.forward.get(key)
    }

    /// Key mapped to the variable named `var` (without `?`).
    pub fn key(&self, var: &str) -> Option<&str> {
        self.reverse.get(var).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.forward.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Var)> {
        self.forward.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn vars(&self) -> impl Iterator<Item = &Var> {
        self.forward.values()
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

/// Per-query variable name registry.
#[derive(Debug, Clone, Default)]
pub struct VarAllocator {
    used: HashSet<String>,
    shared: HashSet<String>,
}

impl VarAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh variable named after `base`, suffixed `_n` on collision.
    pub fn alloc(&mut self, base: &str) -> Var {
        let base = sanitize(base);
        if self.used.insert(base.clone()) {
            return Var::new(&base);
        }
        let mut n = 1;
        loop {
            let candidate = format!("{}_{}", base, n);
            if self.used.insert(candidate.clone()) {
                return Var::new(&candidate);
            }
            n += 1;
        }
    }

    /// A shared variable used verbatim; repeated calls return the same name.
    pub fn reserve(&mut self, name: &str) -> Var {
        let name = sanitize(name);
        self.used.insert(name.clone());
        self.shared.insert(name.clone());
        Var::new(&name)
    }

    /// Join the shared variable named `base` if one was reserved, else allocate.
    ///
    /// Lets `"?eIri0"` in one entity resolve to entity 0's subject.
    pub fn alloc_or_join(&mut self, base: &str) -> Var {
        let name = sanitize(base);
        if self.shared.contains(&name) {
            return Var::new(&name);
        }
        self.alloc(&name)
    }

    pub fn is_used(&self, name: &str) -> bool {
        self.used.contains(name)
    }

    /// Whether `name` was reserved as a shared variable.
    pub fn is_shared(&self, name: &str) -> bool {
        self.shared.contains(&sanitize(name))
    }
}

/// Keep `[A-Za-z0-9_]`, map everything else to `_`.
fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .trim_start_matches(['?', '$', '@'])
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "v".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_suffixes_collisions() {
        let mut alloc = VarAllocator::new();
        // title at entity 1 and title1 at entity 0 both want "title1"
        assert_eq!(alloc.alloc("title1").as_str(), "title1");
        assert_eq!(alloc.alloc("title1").as_str(), "title1_1");
        assert_eq!(alloc.alloc("title1").as_str(), "title1_2");
        assert_eq!(alloc.alloc("dcterms:title0").as_str(), "dcterms_title0");
        assert_eq!(alloc.alloc("@type0").as_str(), "type0");
    }

    #[test]
    fn test_reserve_is_shared() {
        let mut alloc = VarAllocator::new();
        let a = alloc.reserve("?parent");
        let b = alloc.reserve("parent");
        assert_eq!(a, b);
        assert_eq!(alloc.alloc("parent").as_str(), "parent_1");
        assert_eq!(alloc.alloc_or_join("parent").as_str(), "parent");
        assert_eq!(alloc.alloc_or_join("other0").as_str(), "other0");
        assert_eq!(alloc.alloc_or_join("other0").as_str(), "other0_1");
        assert!(alloc.is_shared("?parent"));
        assert!(!alloc.is_shared("other0"));
    }

    #[test]
    fn test_prop_var_map_is_bijective() {
        let mut map = PropVarMap::new();
        map.insert("title", Var::new("title0"));
        map.insert("name", Var::new("name0"));
        assert_eq!(map.key("title0"), Some("title"));
        map.insert("title", Var::new("title0_1"));
        assert_eq!(map.key("title0"), None);
        assert_eq!(map.var("title").map(Var::as_str), Some("title0_1"));
        map.insert("label", Var::new("name0"));
        assert!(!map.contains_key("name"));
        assert_eq!(map.len(), 2);
    }
}
