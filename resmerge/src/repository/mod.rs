//! Read-side repository over merged resource sets.
//!
//! The repository flattens one or more sets into a `(namespace, type)` table
//! of named items, kept in set priority order (later sets append later, so
//! the last candidate for an identical configuration wins). Lookups never
//! mutate; the table is rebuilt wholesale from the sets after each merge,
//! behind a `parking_lot::RwLock` so readers stay concurrent.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::warn;

use crate::config::{find_matching_configurable, FolderConfiguration};
use crate::model::ResourceItem;
use crate::resources::ResourceType;
use crate::set::ResourceSet;

/// Hard ceiling on alias indirection when resolving file-backed resources.
const MAX_INDIRECTION: usize = 50;

type Table = HashMap<(String, ResourceType), BTreeMap<String, Vec<Arc<ResourceItem>>>>;

/// Queryable view over the live items of an ordered list of sets.
#[derive(Default)]
pub struct ResourceRepository {
    table: RwLock<Table>,
}

impl ResourceRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the table from sets in priority order (lowest first).
    ///
    /// Generated sets contribute just below their owning set. Removed items
    /// are excluded.
    pub fn update_from_sets(&self, sets: &[ResourceSet]) {
        let mut table: Table = HashMap::new();
        for set in sets {
            if let Some(generated) = set.generated_set() {
                Self::add_set(&mut table, generated);
            }
            Self::add_set(&mut table, set);
        }
        *self.table.write() = table;
    }

    fn add_set(table: &mut Table, set: &ResourceSet) {
        for items in set.data_map().values() {
            for item in items {
                if item.is_removed() {
                    continue;
                }
                table
                    .entry((item.namespace().to_string(), item.resource_type()))
                    .or_default()
                    .entry(item.name().to_string())
                    .or_default()
                    .push(Arc::clone(item));
            }
        }
    }

    /// Whether any live item exists under the given identity.
    pub fn has_resource_item(&self, namespace: &str, resource_type: ResourceType, name: &str) -> bool {
        self.table
            .read()
            .get(&(namespace.to_string(), resource_type))
            .is_some_and(|names| names.contains_key(name))
    }

    /// All live items of one type in a namespace, name-ordered.
    pub fn items_of_type(&self, namespace: &str, resource_type: ResourceType) -> Vec<Arc<ResourceItem>> {
        self.table
            .read()
            .get(&(namespace.to_string(), resource_type))
            .map(|names| names.values().flatten().cloned().collect())
            .unwrap_or_default()
    }

    /// All live items under one identity, in priority order (lowest first).
    pub fn get_resource_items(
        &self,
        namespace: &str,
        resource_type: ResourceType,
        name: &str,
    ) -> Vec<Arc<ResourceItem>> {
        self.table
            .read()
            .get(&(namespace.to_string(), resource_type))
            .and_then(|names| names.get(name))
            .cloned()
            .unwrap_or_default()
    }

    /// Resolves the single best item for a device configuration.
    ///
    /// Candidates under the same exact qualifier string collapse to the
    /// highest-priority one before best-match selection runs.
    pub fn get_configured_value(
        &self,
        namespace: &str,
        resource_type: ResourceType,
        name: &str,
        reference: &FolderConfiguration,
    ) -> Option<Arc<ResourceItem>> {
        let candidates = dedupe_by_qualifiers(self.get_resource_items(namespace, resource_type, name));
        find_matching_configurable(&candidates, reference).cloned()
    }

    /// Resolves every resource to its best item for one configuration.
    ///
    /// Names with no compatible candidate are absent from the result.
    pub fn get_configured_resources(
        &self,
        reference: &FolderConfiguration,
    ) -> BTreeMap<(String, ResourceType), BTreeMap<String, Arc<ResourceItem>>> {
        let table = self.table.read();
        let mut result = BTreeMap::new();
        for ((namespace, resource_type), names) in table.iter() {
            let mut resolved = BTreeMap::new();
            for (name, items) in names {
                let candidates = dedupe_by_qualifiers(items.clone());
                if let Some(best) = find_matching_configurable(&candidates, reference) {
                    resolved.insert(name.clone(), Arc::clone(best));
                }
            }
            if !resolved.is_empty() {
                result.insert((namespace.clone(), *resource_type), resolved);
            }
        }
        result
    }

    /// Resolves a file-backed resource to its file, following same-type
    /// alias values (`<drawable name="a">@drawable/b</drawable>`).
    ///
    /// Cycles and chains longer than [`MAX_INDIRECTION`] hops resolve to
    /// nothing, with a diagnostic.
    pub fn get_matching_files(
        &self,
        namespace: &str,
        resource_type: ResourceType,
        name: &str,
        reference: &FolderConfiguration,
    ) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        let mut current = name.to_string();

        for _ in 0..=MAX_INDIRECTION {
            if !seen.insert(current.clone()) {
                warn!(
                    %resource_type,
                    name,
                    via = %current,
                    "alias cycle while resolving resource"
                );
                return Vec::new();
            }
            let Some(item) =
                self.get_configured_value(namespace, resource_type, &current, reference)
            else {
                return Vec::new();
            };
            match item.value().and_then(|v| v.reference()) {
                Some((target_type, target)) if target_type == resource_type => {
                    current = target;
                }
                _ => return item.path().into_iter().collect(),
            }
        }

        warn!(
            %resource_type,
            name,
            limit = MAX_INDIRECTION,
            "alias chain exceeded the indirection limit"
        );
        Vec::new()
    }
}

/// Collapses candidates with identical qualifier strings, keeping the last
/// (highest-priority) one in place.
fn dedupe_by_qualifiers(items: Vec<Arc<ResourceItem>>) -> Vec<Arc<ResourceItem>> {
    let mut result: Vec<Arc<ResourceItem>> = Vec::with_capacity(items.len());
    for item in items {
        let qualifiers = item.qualifiers();
        match result.iter_mut().find(|i| i.qualifiers() == qualifiers) {
            Some(slot) => *slot = item,
            None => result.push(item),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
    }

    fn config(qualifiers: &str) -> FolderConfiguration {
        FolderConfiguration::from_qualifier_string(qualifiers).unwrap()
    }

    fn repository_over(root: &Path) -> ResourceRepository {
        let mut set = ResourceSet::new("main");
        set.add_source(root);
        set.scan().unwrap();
        let repository = ResourceRepository::new();
        repository.update_from_sets(std::slice::from_ref(&set));
        repository
    }

    #[test]
    fn test_best_match_across_locale_folders() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "values/strings.xml",
            r#"<resources><string name="g">default</string></resources>"#,
        );
        write(
            dir.path(),
            "values-en/strings.xml",
            r#"<resources><string name="g">english</string></resources>"#,
        );
        write(
            dir.path(),
            "values-en-rUS/strings.xml",
            r#"<resources><string name="g">american</string></resources>"#,
        );

        let repository = repository_over(dir.path());
        let resolve = |quals: &str| {
            repository
                .get_configured_value("", ResourceType::String, "g", &config(quals))
                .unwrap()
                .qualifiers()
        };

        assert_eq!(resolve("en-rUS"), "en-rUS");
        assert_eq!(resolve("en-rGB"), "en");
        assert_eq!(resolve("fr"), "");
    }

    #[test]
    fn test_has_and_items_of_type() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "values/strings.xml",
            r#"<resources><string name="a">1</string><string name="b">2</string></resources>"#,
        );

        let repository = repository_over(dir.path());
        assert!(repository.has_resource_item("", ResourceType::String, "a"));
        assert!(!repository.has_resource_item("", ResourceType::String, "zzz"));
        assert_eq!(repository.items_of_type("", ResourceType::String).len(), 2);
        assert!(repository.items_of_type("", ResourceType::Color).is_empty());
    }

    #[test]
    fn test_removed_items_are_invisible() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "values/strings.xml",
            r#"<resources><string name="a">1</string></resources>"#,
        );

        let mut set = ResourceSet::new("main");
        set.add_source(dir.path());
        set.scan().unwrap();
        set.data_map()["/string/a"][0].set_removed();

        let repository = ResourceRepository::new();
        repository.update_from_sets(std::slice::from_ref(&set));
        assert!(!repository.has_resource_item("", ResourceType::String, "a"));
    }

    #[test]
    fn test_alias_resolves_to_the_aliased_file() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "drawable/real.png", "png");
        write(
            dir.path(),
            "values/aliases.xml",
            r#"<resources><drawable name="alias">@drawable/real</drawable></resources>"#,
        );

        let repository = repository_over(dir.path());
        let files = repository.get_matching_files(
            "",
            ResourceType::Drawable,
            "alias",
            &FolderConfiguration::new(),
        );
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("drawable/real.png"));
    }

    #[test]
    fn test_alias_cycle_resolves_to_nothing() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "values/aliases.xml",
            r#"<resources>
                <drawable name="a">@drawable/b</drawable>
                <drawable name="b">@drawable/a</drawable>
            </resources>"#,
        );

        let repository = repository_over(dir.path());
        let files = repository.get_matching_files(
            "",
            ResourceType::Drawable,
            "a",
            &FolderConfiguration::new(),
        );
        assert!(files.is_empty());
    }

    #[test]
    fn test_alias_chain_over_the_limit_resolves_to_nothing() {
        let dir = TempDir::new().unwrap();
        let mut doc = String::from("<resources>");
        for i in 0..60 {
            doc.push_str(&format!(
                r#"<drawable name="d{i}">@drawable/d{}</drawable>"#,
                i + 1
            ));
        }
        doc.push_str("</resources>");
        write(dir.path(), "values/aliases.xml", &doc);
        write(dir.path(), "drawable/d60.png", "png");

        let repository = repository_over(dir.path());
        let reference = FolderConfiguration::new();

        // A short suffix of the chain still resolves.
        let files =
            repository.get_matching_files("", ResourceType::Drawable, "d55", &reference);
        assert_eq!(files.len(), 1);

        // The full chain exceeds the hop ceiling.
        let files = repository.get_matching_files("", ResourceType::Drawable, "d0", &reference);
        assert!(files.is_empty());
    }

    #[test]
    fn test_exact_qualifier_duplicates_keep_highest_priority() {
        let low_dir = TempDir::new().unwrap();
        let high_dir = TempDir::new().unwrap();
        write(
            low_dir.path(),
            "values/strings.xml",
            r#"<resources><string name="g">low</string></resources>"#,
        );
        write(
            high_dir.path(),
            "values/strings.xml",
            r#"<resources><string name="g">high</string></resources>"#,
        );

        let mut low = ResourceSet::new("low");
        low.add_source(low_dir.path());
        low.scan().unwrap();
        let mut high = ResourceSet::new("high");
        high.add_source(high_dir.path());
        high.scan().unwrap();

        let repository = ResourceRepository::new();
        repository.update_from_sets(&[low, high]);

        let best = repository
            .get_configured_value("", ResourceType::String, "g", &FolderConfiguration::new())
            .unwrap();
        assert_eq!(best.value().unwrap().body(), "high");
    }

    #[test]
    fn test_configured_resources_resolve_every_name_once() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "values/strings.xml",
            r#"<resources><string name="a">1</string></resources>"#,
        );
        write(
            dir.path(),
            "values-en/strings.xml",
            r#"<resources><string name="a">en</string><string name="b">only en</string></resources>"#,
        );

        let repository = repository_over(dir.path());
        let resolved = repository.get_configured_resources(&config("en"));
        let strings = &resolved[&("".to_string(), ResourceType::String)];
        assert_eq!(strings.len(), 2);
        assert_eq!(strings["a"].qualifiers(), "en");
        assert_eq!(strings["b"].qualifiers(), "en");
    }
}
