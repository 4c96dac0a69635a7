//! Writing merged resources to the output tree.
//!
//! [`MergedResourceWriter`] consumes one merge pass and materializes it:
//! file-based winners are compiled (concurrently, at the end of the pass),
//! values winners are bucketed per qualifier string and each dirty bucket is
//! rewritten as one `values*.xml` document. Untouched items cost nothing
//! beyond bookkeeping, which is what makes incremental merges cheap.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::blame::MergingLog;
use crate::compiler::{CompileRequest, ResourceCompiler};
use crate::error::MergeError;
use crate::merge::MergeConsumer;
use crate::model::{ResourceItem, ResourceValue};
use crate::preprocess::{NoOpPreprocessor, ResourcePreprocessor};
use crate::resources::ResourceType;
use crate::values::serialize_values_document;

const FILE_MAP_NAME: &str = "compile-file-map.properties";

/// Merge consumer that writes the merged resource tree.
pub struct MergedResourceWriter {
    root_folder: PathBuf,
    public_file: Option<PathBuf>,
    compiler: Arc<dyn ResourceCompiler>,
    preprocessor: Arc<dyn ResourcePreprocessor>,
    blame_log: Option<MergingLog>,
    pseudo_localize: bool,
    crunch_png: bool,
    file_map_path: PathBuf,
    /// Source path → compiled output path, persisted across sessions so
    /// removals can find outputs of compilers that rename files.
    compiled_file_map: BTreeMap<String, String>,
    /// Qualifier string → live values items seen this session.
    values_items: BTreeMap<String, Vec<Arc<ResourceItem>>>,
    /// Qualifier buckets whose merged document must be rewritten.
    dirty_qualifiers: BTreeSet<String>,
    compile_requests: Vec<CompileRequest>,
    /// (output to generate, claimed source) pairs, run before compilation.
    generation_queue: Vec<(PathBuf, PathBuf)>,
    pending_deletes: Vec<PathBuf>,
}

impl MergedResourceWriter {
    /// Creates a writer rooted at the merged output folder.
    pub fn new(root_folder: impl Into<PathBuf>, compiler: Arc<dyn ResourceCompiler>) -> Self {
        let root_folder = root_folder.into();
        let file_map_path = root_folder.join(FILE_MAP_NAME);
        Self {
            root_folder,
            public_file: None,
            compiler,
            preprocessor: Arc::new(NoOpPreprocessor),
            blame_log: None,
            pseudo_localize: false,
            crunch_png: false,
            file_map_path,
            compiled_file_map: BTreeMap::new(),
            values_items: BTreeMap::new(),
            dirty_qualifiers: BTreeSet::new(),
            compile_requests: Vec::new(),
            generation_queue: Vec::new(),
            pending_deletes: Vec::new(),
        }
    }

    /// Diverts `public` declarations into the given file.
    pub fn with_public_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.public_file = Some(path.into());
        self
    }

    /// Enables blame tracking through the given log.
    pub fn with_blame_log(mut self, log: MergingLog) -> Self {
        self.blame_log = Some(log);
        self
    }

    /// Asks the compiler for pseudo-localized variants of every output.
    pub fn with_pseudo_localize(mut self, enabled: bool) -> Self {
        self.pseudo_localize = enabled;
        self
    }

    /// Asks the compiler to crunch PNG outputs.
    pub fn with_png_crunch(mut self, enabled: bool) -> Self {
        self.crunch_png = enabled;
        self
    }

    /// Installs the preprocessor that generates queued outputs.
    pub fn with_preprocessor(mut self, preprocessor: Arc<dyn ResourcePreprocessor>) -> Self {
        self.preprocessor = preprocessor;
        self
    }

    /// Overrides where the source→output map is persisted.
    pub fn with_file_map_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_map_path = path.into();
        self
    }

    /// Finishes the session: generates queued outputs, runs all compiles,
    /// applies deletions, rewrites dirty values documents and persists the
    /// bookkeeping files.
    ///
    /// The first failure aborts, wrapped with the file being processed.
    pub async fn end(&mut self) -> Result<(), MergeError> {
        self.run_generation().await?;
        self.run_compilation().await?;
        self.apply_deletes().await?;
        self.write_values_documents().await?;
        self.write_public_file().await?;
        self.persist_file_map().await?;
        if let Some(log) = &mut self.blame_log {
            log.write()?;
        }
        info!(root = %self.root_folder.display(), "merge session written");
        Ok(())
    }

    async fn run_generation(&mut self) -> Result<(), MergeError> {
        let mut tasks = Vec::new();
        for (to_generate, source) in self.generation_queue.drain(..) {
            let preprocessor = Arc::clone(&self.preprocessor);
            tasks.push(tokio::task::spawn_blocking(move || {
                preprocessor.generate_file(&to_generate, &source)
            }));
        }
        for task in tasks {
            task.await
                .map_err(|e| MergeError::Internal(format!("generation task failed: {e}")))??;
        }
        Ok(())
    }

    async fn run_compilation(&mut self) -> Result<(), MergeError> {
        let mut pending = Vec::new();
        for request in self.compile_requests.drain(..) {
            let compiler = Arc::clone(&self.compiler);
            let input = request.input.clone();
            pending.push(async move { (input, compiler.compile(request).await) });
        }
        debug!(compiles = pending.len(), "compiling touched files");

        for (input, result) in futures::future::join_all(pending).await {
            if let Some(output) = result? {
                if let Some(log) = &mut self.blame_log {
                    log.log_copy(&input, &output);
                }
                self.compiled_file_map.insert(
                    input.display().to_string(),
                    output.display().to_string(),
                );
            }
        }
        Ok(())
    }

    async fn apply_deletes(&mut self) -> Result<(), MergeError> {
        for output in self.pending_deletes.drain(..) {
            match tokio::fs::remove_file(&output).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(MergeError::io(&output, e)),
            }
            if let Some(log) = &mut self.blame_log {
                log.log_remove(&output);
            }
        }
        Ok(())
    }

    async fn write_values_documents(&mut self) -> Result<(), MergeError> {
        for qualifiers in std::mem::take(&mut self.dirty_qualifiers) {
            let folder_name = values_folder_name(&qualifiers);
            let folder = self.root_folder.join(&folder_name);
            let output = folder.join(format!("{folder_name}.xml"));

            let mut items: Vec<Arc<ResourceItem>> = self
                .values_items
                .get(&qualifiers)
                .cloned()
                .unwrap_or_default();
            items.sort_by(|a, b| {
                (a.resource_type(), a.name()).cmp(&(b.resource_type(), b.name()))
            });

            let mut values: Vec<ResourceValue> = Vec::new();
            let mut live_entries = BTreeSet::new();
            for item in &items {
                if item.resource_type() == ResourceType::Public {
                    continue;
                }
                let Some(value) = item.value() else { continue };
                if let (Some(log), Some(source)) = (&mut self.blame_log, item.path()) {
                    let entry =
                        format!("{folder_name}/{}/{}", item.resource_type(), item.name());
                    log.log_source(entry.clone(), &source);
                    live_entries.insert(entry);
                }
                values.push(value);
            }
            if let Some(log) = &mut self.blame_log {
                log.prune_sources(&folder_name, &live_entries);
            }

            if values.is_empty() {
                debug!(bucket = %folder_name, "values bucket emptied, deleting output");
                match tokio::fs::remove_file(&output).await {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => return Err(MergeError::io(&output, e)),
                }
                continue;
            }

            tokio::fs::create_dir_all(&folder)
                .await
                .map_err(|e| MergeError::io(&folder, e))?;
            tokio::fs::write(&output, serialize_values_document(&values))
                .await
                .map_err(|e| MergeError::io(&output, e))?;
            debug!(bucket = %folder_name, entries = values.len(), "values bucket written");
        }
        Ok(())
    }

    async fn write_public_file(&mut self) -> Result<(), MergeError> {
        let Some(public_file) = &self.public_file else {
            return Ok(());
        };
        let mut lines = BTreeSet::new();
        for items in self.values_items.values() {
            for item in items {
                if item.resource_type() != ResourceType::Public {
                    continue;
                }
                let Some(declared_type) = item.value().and_then(|v| {
                    v.attribute("type").map(str::to_string)
                }) else {
                    continue;
                };
                lines.insert(format!("{declared_type} {}", flatten_name(item.name())));
            }
        }
        if lines.is_empty() {
            return Ok(());
        }
        if let Some(parent) = public_file.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| MergeError::io(parent, e))?;
        }
        let mut content = lines.into_iter().collect::<Vec<_>>().join("\n");
        content.push('\n');
        tokio::fs::write(public_file, content)
            .await
            .map_err(|e| MergeError::io(public_file, e))
    }

    async fn persist_file_map(&self) -> Result<(), MergeError> {
        if let Some(parent) = self.file_map_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| MergeError::io(parent, e))?;
        }
        let mut content = String::new();
        for (source, output) in &self.compiled_file_map {
            content.push_str(source);
            content.push('=');
            content.push_str(output);
            content.push('\n');
        }
        tokio::fs::write(&self.file_map_path, content)
            .await
            .map_err(|e| MergeError::io(&self.file_map_path, e))
    }

    fn load_file_map(&mut self) {
        self.compiled_file_map.clear();
        let Ok(content) = std::fs::read_to_string(&self.file_map_path) else {
            return;
        };
        for line in content.lines() {
            if let Some((source, output)) = line.split_once('=') {
                self.compiled_file_map
                    .insert(source.to_string(), output.to_string());
            }
        }
    }

    /// Builds a compile request carrying the session's processing flags.
    fn compile_request(&self, input: impl Into<PathBuf>, output_dir: PathBuf) -> CompileRequest {
        CompileRequest::new(input, output_dir)
            .with_pseudo_localize(self.pseudo_localize)
            .with_png_crunch(self.crunch_png)
    }

    /// The merged-tree output a source file maps to.
    fn output_for(&self, source: &Path) -> PathBuf {
        if let Some(output) = self.compiled_file_map.get(&source.display().to_string()) {
            return PathBuf::from(output);
        }
        let request = self.compile_request(source, self.root_folder.join(folder_name_of(source)));
        self.compiler.compile_output_for(&request)
    }
}

impl MergeConsumer for MergedResourceWriter {
    fn start(&mut self) -> Result<(), MergeError> {
        self.values_items.clear();
        self.dirty_qualifiers.clear();
        self.compile_requests.clear();
        self.generation_queue.clear();
        self.pending_deletes.clear();
        self.load_file_map();
        Ok(())
    }

    fn add_item(&mut self, item: &Arc<ResourceItem>) -> Result<(), MergeError> {
        if item.value().is_some() {
            let qualifiers = item.qualifiers();
            if item.is_touched() {
                self.dirty_qualifiers.insert(qualifiers.clone());
            }
            self.values_items
                .entry(qualifiers)
                .or_default()
                .push(Arc::clone(item));
            return Ok(());
        }

        if !item.is_touched() {
            return Ok(());
        }
        let Some(input) = item.path() else {
            return Err(MergeError::Internal(format!(
                "file item '{}' has no source path",
                item.name()
            )));
        };
        if item.is_generated() {
            let Some(source) = item.source().map(|f| f.path().to_path_buf()) else {
                return Err(MergeError::Internal(format!(
                    "generated item '{}' is detached from its source",
                    item.name()
                )));
            };
            self.generation_queue.push((input.clone(), source));
        }
        let output_dir = self.root_folder.join(folder_name_of(&input));
        let request = self.compile_request(input, output_dir);
        self.compile_requests.push(request);
        Ok(())
    }

    fn remove_item(
        &mut self,
        removed: &Arc<ResourceItem>,
        replaced_by: Option<&Arc<ResourceItem>>,
    ) -> Result<(), MergeError> {
        if removed.value().is_some() {
            self.dirty_qualifiers.insert(removed.qualifiers());
            return Ok(());
        }

        let Some(removed_path) = removed.path() else {
            return Ok(());
        };
        let removed_output = self.output_for(&removed_path);
        self.compiled_file_map
            .remove(&removed_path.display().to_string());

        // If the replacement writes to the same output, the new content
        // simply overwrites it.
        if let Some(replacement) = replaced_by {
            if replacement.value().is_none() {
                if let Some(replacement_path) = replacement.path() {
                    if self.output_for(&replacement_path) == removed_output {
                        debug!(
                            output = %removed_output.display(),
                            "removal superseded by replacement with same output"
                        );
                        return Ok(());
                    }
                }
            }
        }
        self.pending_deletes.push(removed_output);
        Ok(())
    }
}

/// `values` / `values-<qualifiers>` folder name for one bucket.
fn values_folder_name(qualifiers: &str) -> String {
    if qualifiers.is_empty() {
        "values".to_string()
    } else {
        format!("values-{qualifiers}")
    }
}

/// Output folder name for a file-based resource: its source folder's name.
fn folder_name_of(input: &Path) -> String {
    input
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .unwrap_or("raw")
        .to_string()
}

/// `public.txt` uses flattened names, matching generated symbol names.
fn flatten_name(name: &str) -> String {
    name.replace(['.', ':', '-'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::CopyCompiler;
    use crate::model::ResourceFile;
    use crate::config::FolderConfiguration;
    use tempfile::TempDir;

    fn string_item(name: &str, body: &str) -> Arc<ResourceItem> {
        ResourceItem::new(
            name,
            "",
            ResourceType::String,
            Some(ResourceValue::new(
                "string",
                vec![("name".to_string(), name.to_string())],
                body,
            )),
            None,
        )
    }

    fn writer(root: &Path) -> MergedResourceWriter {
        MergedResourceWriter::new(root, Arc::new(CopyCompiler))
    }

    #[tokio::test]
    async fn test_values_bucket_written_sorted_and_deterministic() {
        let out_a = TempDir::new().unwrap();
        let out_b = TempDir::new().unwrap();
        let items = [string_item("zebra", "z"), string_item("apple", "a")];

        for (out, order) in [(&out_a, [0, 1]), (&out_b, [1, 0])] {
            let mut w = writer(out.path());
            w.start().unwrap();
            for index in order {
                w.add_item(&items[index]).unwrap();
            }
            w.end().await.unwrap();
        }

        let content_a =
            std::fs::read_to_string(out_a.path().join("values/values.xml")).unwrap();
        let content_b =
            std::fs::read_to_string(out_b.path().join("values/values.xml")).unwrap();
        assert_eq!(content_a, content_b);
        let apple = content_a.find("apple").unwrap();
        let zebra = content_a.find("zebra").unwrap();
        assert!(apple < zebra);
    }

    #[tokio::test]
    async fn test_untouched_values_do_not_rewrite_the_bucket() {
        let out = TempDir::new().unwrap();
        let item = string_item("a", "1");

        let mut w = writer(out.path());
        w.start().unwrap();
        w.add_item(&item).unwrap();
        w.end().await.unwrap();
        let output = out.path().join("values/values.xml");
        assert!(output.exists());
        std::fs::remove_file(&output).unwrap();

        // Next session with the same, now untouched, item: nothing dirty.
        item.reset_status();
        w.start().unwrap();
        w.add_item(&item).unwrap();
        w.end().await.unwrap();
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_removed_values_entry_rewrites_bucket_without_it() {
        let out = TempDir::new().unwrap();
        let keep = string_item("keep", "1");
        let drop = string_item("drop", "2");

        let mut w = writer(out.path());
        w.start().unwrap();
        w.add_item(&keep).unwrap();
        w.add_item(&drop).unwrap();
        w.end().await.unwrap();

        keep.reset_status();
        drop.set_removed();
        w.start().unwrap();
        w.add_item(&keep).unwrap();
        w.remove_item(&drop, None).unwrap();
        w.end().await.unwrap();

        let content = std::fs::read_to_string(out.path().join("values/values.xml")).unwrap();
        assert!(content.contains("keep"));
        assert!(!content.contains("drop"));
    }

    #[tokio::test]
    async fn test_bucket_emptied_by_removals_deletes_the_output() {
        let out = TempDir::new().unwrap();
        let only = string_item("only", "1");

        let mut w = writer(out.path());
        w.start().unwrap();
        w.add_item(&only).unwrap();
        w.end().await.unwrap();
        let output = out.path().join("values/values.xml");
        assert!(output.exists());

        only.set_removed();
        w.start().unwrap();
        w.remove_item(&only, None).unwrap();
        w.end().await.unwrap();
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_touched_file_items_are_compiled() {
        let source_dir = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let drawable = source_dir.path().join("drawable");
        std::fs::create_dir_all(&drawable).unwrap();
        let source = drawable.join("icon.png");
        std::fs::write(&source, "png").unwrap();

        let file = ResourceFile::single_file(
            &source,
            ResourceItem::new("icon", "", ResourceType::Drawable, None, None),
            "",
            FolderConfiguration::new(),
        );
        let item = file.single_item().unwrap();

        let mut w = writer(out.path());
        w.start().unwrap();
        w.add_item(&item).unwrap();
        w.end().await.unwrap();

        assert!(out.path().join("drawable/icon.png").exists());
        let map = std::fs::read_to_string(out.path().join(FILE_MAP_NAME)).unwrap();
        assert!(map.contains("icon.png"));
    }

    #[tokio::test]
    async fn test_removed_file_output_is_deleted_unless_replaced_in_place() {
        let low_dir = TempDir::new().unwrap();
        let high_dir = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        for dir in [&low_dir, &high_dir] {
            std::fs::create_dir_all(dir.path().join("drawable")).unwrap();
        }
        let low_source = low_dir.path().join("drawable/icon.png");
        let high_source = high_dir.path().join("drawable/icon.png");
        std::fs::write(&low_source, "low").unwrap();
        std::fs::write(&high_source, "high").unwrap();

        let low_file = ResourceFile::single_file(
            &low_source,
            ResourceItem::new("icon", "", ResourceType::Drawable, None, None),
            "",
            FolderConfiguration::new(),
        );
        let high_file = ResourceFile::single_file(
            &high_source,
            ResourceItem::new("icon", "", ResourceType::Drawable, None, None),
            "",
            FolderConfiguration::new(),
        );
        let low_item = low_file.single_item().unwrap();
        let high_item = high_file.single_item().unwrap();

        // First session: the high-priority file wins and is written.
        let mut w = writer(out.path());
        w.start().unwrap();
        w.add_item(&high_item).unwrap();
        w.end().await.unwrap();
        let output = out.path().join("drawable/icon.png");
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "high");

        // Second session: high removed, low takes over the same output.
        high_item.set_removed();
        w.start().unwrap();
        w.remove_item(&high_item, Some(&low_item)).unwrap();
        w.add_item(&low_item).unwrap();
        w.end().await.unwrap();
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "low");

        // Third session: low removed too, nothing replaces it.
        low_item.set_removed();
        w.start().unwrap();
        w.remove_item(&low_item, None).unwrap();
        w.end().await.unwrap();
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_compile_requests_carry_the_session_flags() {
        struct RecordingCompiler {
            seen: Arc<parking_lot::Mutex<Vec<CompileRequest>>>,
        }
        impl ResourceCompiler for RecordingCompiler {
            fn compile(
                &self,
                request: CompileRequest,
            ) -> crate::compiler::BoxFuture<'static, Result<Option<PathBuf>, MergeError>>
            {
                let output = request.default_output();
                self.seen.lock().push(request);
                Box::pin(async move { Ok(Some(output)) })
            }
        }

        let source_dir = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let drawable = source_dir.path().join("drawable");
        std::fs::create_dir_all(&drawable).unwrap();
        let source = drawable.join("icon.png");
        std::fs::write(&source, "png").unwrap();

        let file = ResourceFile::single_file(
            &source,
            ResourceItem::new("icon", "", ResourceType::Drawable, None, None),
            "",
            FolderConfiguration::new(),
        );
        let item = file.single_item().unwrap();

        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let compiler = Arc::new(RecordingCompiler {
            seen: Arc::clone(&seen),
        });
        let mut w = MergedResourceWriter::new(out.path(), compiler)
            .with_pseudo_localize(true)
            .with_png_crunch(true);
        w.start().unwrap();
        w.add_item(&item).unwrap();
        w.end().await.unwrap();

        let requests = seen.lock();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].pseudo_localize);
        assert!(requests[0].crunch_png);
    }

    #[tokio::test]
    async fn test_rewritten_bucket_prunes_blame_of_removed_entries() {
        let out = TempDir::new().unwrap();
        let blame = TempDir::new().unwrap();
        let file = ResourceFile::xml_values(
            "res/values/strings.xml",
            vec![string_item("keep", "1"), string_item("drop", "2")],
            "",
            FolderConfiguration::new(),
        );
        let keep = file.items()[0].clone();
        let dropped = file.items()[1].clone();

        let mut w =
            writer(out.path()).with_blame_log(MergingLog::open(blame.path()).unwrap());
        w.start().unwrap();
        w.add_item(&keep).unwrap();
        w.add_item(&dropped).unwrap();
        w.end().await.unwrap();

        keep.reset_status();
        dropped.set_removed();
        w.start().unwrap();
        w.add_item(&keep).unwrap();
        w.remove_item(&dropped, None).unwrap();
        w.end().await.unwrap();

        let log = MergingLog::open(blame.path()).unwrap();
        assert!(log.source_of_entry("values/string/keep").is_some());
        assert!(log.source_of_entry("values/string/drop").is_none());
    }

    #[tokio::test]
    async fn test_public_declarations_divert_to_public_txt() {
        let out = TempDir::new().unwrap();
        let public_txt = out.path().join("public.txt");

        let public = ResourceItem::new(
            "my.fancy_name",
            "",
            ResourceType::Public,
            Some(ResourceValue::new(
                "public",
                vec![
                    ("name".to_string(), "my.fancy_name".to_string()),
                    ("type".to_string(), "string".to_string()),
                ],
                "",
            )),
            None,
        );

        let mut w = writer(out.path()).with_public_file(&public_txt);
        w.start().unwrap();
        w.add_item(&public).unwrap();
        w.add_item(&string_item("a", "1")).unwrap();
        w.end().await.unwrap();

        let public_content = std::fs::read_to_string(&public_txt).unwrap();
        assert_eq!(public_content, "string my_fancy_name\n");
        let values = std::fs::read_to_string(out.path().join("values/values.xml")).unwrap();
        assert!(!values.contains("public"));
    }
}
