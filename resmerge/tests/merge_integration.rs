//! End-to-end merge pipeline tests: scan, merge, write, then incremental
//! updates against the written output tree.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use resmerge::merge::snapshot::{load_snapshot, write_snapshot};
use resmerge::{CopyCompiler, MergedResourceWriter, ResourceMerger, ResourceSet};

fn write(root: &Path, relative: &str, content: &str) -> PathBuf {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

fn scanned_set(name: &str, root: &Path) -> ResourceSet {
    let mut set = ResourceSet::new(name);
    set.add_source(root);
    set.scan().unwrap();
    set
}

async fn merge_and_clean(merger: &mut ResourceMerger, writer: &mut MergedResourceWriter) {
    merger.merge_to(writer).unwrap();
    writer.end().await.unwrap();
    merger.post_merge_cleanup();
}

#[tokio::test]
async fn overlay_wins_then_removal_reemits_base_without_clean_build() {
    let base = TempDir::new().unwrap();
    let overlay = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();

    write(
        base.path(),
        "values/strings.xml",
        r#"<resources><string name="greeting">base</string></resources>"#,
    );
    let overlay_file = write(
        overlay.path(),
        "values/strings.xml",
        r#"<resources><string name="greeting">overlay</string></resources>"#,
    );

    let mut merger = ResourceMerger::new();
    merger.add_set(scanned_set("base", base.path()));
    merger.add_set(scanned_set("overlay", overlay.path()));
    let mut writer = MergedResourceWriter::new(out.path(), Arc::new(CopyCompiler));

    merge_and_clean(&mut merger, &mut writer).await;
    let values_file = out.path().join("values/values.xml");
    assert!(fs::read_to_string(&values_file).unwrap().contains("overlay"));

    // Remove the overlay definition and apply only the file event.
    fs::remove_file(&overlay_file).unwrap();
    merger.sets_mut()[1]
        .handle_removed_file(&overlay_file)
        .unwrap();

    merge_and_clean(&mut merger, &mut writer).await;
    let content = fs::read_to_string(&values_file).unwrap();
    assert!(content.contains("base"));
    assert!(!content.contains("overlay"));
}

#[tokio::test]
async fn unchanged_sources_write_nothing_on_the_next_merge() {
    let src = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write(
        src.path(),
        "values/strings.xml",
        r#"<resources><string name="a">1</string></resources>"#,
    );
    write(src.path(), "drawable/icon.png", "png");

    let mut merger = ResourceMerger::new();
    merger.add_set(scanned_set("main", src.path()));
    let mut writer = MergedResourceWriter::new(out.path(), Arc::new(CopyCompiler));

    merge_and_clean(&mut merger, &mut writer).await;
    let values_file = out.path().join("values/values.xml");
    let icon_file = out.path().join("drawable/icon.png");
    assert!(values_file.exists());
    assert!(icon_file.exists());

    // Wipe the outputs; a no-change merge must not regenerate them, since
    // nothing is touched.
    fs::remove_file(&values_file).unwrap();
    fs::remove_file(&icon_file).unwrap();

    merge_and_clean(&mut merger, &mut writer).await;
    assert!(!values_file.exists());
    assert!(!icon_file.exists());
}

#[tokio::test]
async fn changed_value_rewrites_only_its_qualifier_bucket() {
    let src = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let default_file = write(
        src.path(),
        "values/strings.xml",
        r#"<resources><string name="a">default</string></resources>"#,
    );
    write(
        src.path(),
        "values-en/strings.xml",
        r#"<resources><string name="a">english</string></resources>"#,
    );

    let mut merger = ResourceMerger::new();
    merger.add_set(scanned_set("main", src.path()));
    let mut writer = MergedResourceWriter::new(out.path(), Arc::new(CopyCompiler));

    merge_and_clean(&mut merger, &mut writer).await;
    let en_file = out.path().join("values-en/values-en.xml");
    assert!(en_file.exists());
    fs::remove_file(&en_file).unwrap();

    // Change only the default-bucket definition.
    write(
        src.path(),
        "values/strings.xml",
        r#"<resources><string name="a">updated</string></resources>"#,
    );
    merger.sets_mut()[0]
        .handle_changed_file(&default_file)
        .unwrap();

    merge_and_clean(&mut merger, &mut writer).await;
    let default_content = fs::read_to_string(out.path().join("values/values.xml")).unwrap();
    assert!(default_content.contains("updated"));
    // The untouched en bucket was not rewritten.
    assert!(!en_file.exists());
}

#[tokio::test]
async fn file_overlay_removal_restores_the_base_file() {
    let base = TempDir::new().unwrap();
    let overlay = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write(base.path(), "drawable/icon.png", "base pixels");
    let overlay_icon = write(overlay.path(), "drawable/icon.png", "overlay pixels");

    let mut merger = ResourceMerger::new();
    merger.add_set(scanned_set("base", base.path()));
    merger.add_set(scanned_set("overlay", overlay.path()));
    let mut writer = MergedResourceWriter::new(out.path(), Arc::new(CopyCompiler));

    merge_and_clean(&mut merger, &mut writer).await;
    let output = out.path().join("drawable/icon.png");
    assert_eq!(fs::read_to_string(&output).unwrap(), "overlay pixels");

    fs::remove_file(&overlay_icon).unwrap();
    merger.sets_mut()[1]
        .handle_removed_file(&overlay_icon)
        .unwrap();

    merge_and_clean(&mut merger, &mut writer).await;
    assert_eq!(fs::read_to_string(&output).unwrap(), "base pixels");
}

#[tokio::test]
async fn snapshot_resumes_incremental_merging_in_a_new_process() {
    let src = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let state = TempDir::new().unwrap();
    let snapshot = state.path().join("merger.xml");
    let strings = write(
        src.path(),
        "values/strings.xml",
        r#"<resources><string name="a">first</string></resources>"#,
    );

    // First "build": full scan, merge, snapshot.
    {
        let mut merger = ResourceMerger::new();
        merger.add_set(scanned_set("main", src.path()));
        let mut writer = MergedResourceWriter::new(out.path(), Arc::new(CopyCompiler));
        merge_and_clean(&mut merger, &mut writer).await;
        write_snapshot(&merger, &snapshot).unwrap();
    }

    // Second "build": load the snapshot, apply one change event, merge.
    write(
        src.path(),
        "values/strings.xml",
        r#"<resources><string name="a">second</string></resources>"#,
    );
    let mut merger = load_snapshot(&snapshot).unwrap();
    merger.sets_mut()[0].handle_changed_file(&strings).unwrap();

    let mut writer = MergedResourceWriter::new(out.path(), Arc::new(CopyCompiler));
    merge_and_clean(&mut merger, &mut writer).await;

    let content = fs::read_to_string(out.path().join("values/values.xml")).unwrap();
    assert!(content.contains("second"));
}
