use promptpack::config::PackConfig;
use promptpack::errors::{PackError, PatternSetKind};
use promptpack::file::VFile;
use promptpack::ingest::{LoadedSource, SourceKind};
use promptpack::tree::build_tree;
use promptpack::workspace::{SharedWorkspace, Workspace};

fn source(files: Vec<VFile>) -> LoadedSource {
    LoadedSource {
        kind: SourceKind::Folder,
        label: "project".to_string(),
        files,
    }
}

fn project() -> Workspace {
    let mut workspace = Workspace::new(PackConfig::default()).unwrap();
    workspace.load(source(vec![
        VFile::text("a.ts", "const a = 1;\n"),
        VFile::text("src/b.ts", "export const b = 2;\n"),
        VFile::text("src/c.ts", "export const c = 3;\n"),
        VFile::text("docs/guide.md", "# Guide\n"),
        VFile::new("assets/logo.png", &[0x89, 0x50, 0x4e, 0x47]),
    ]));
    workspace
}

#[tokio::test]
async fn test_load_selects_all_selectable_files() {
    let workspace = project();
    assert_eq!(
        workspace.selected_paths(),
        vec!["a.ts", "src/b.ts", "src/c.ts", "docs/guide.md"]
    );
    assert_eq!(workspace.active_path(), Some("a.ts"));
    assert!(workspace.is_stale());
    assert!(!workspace.auto_build_enabled());
    assert!(workspace.memory().is_empty());
    assert_eq!(workspace.source(), Some((SourceKind::Folder, "project")));
}

#[tokio::test]
async fn test_selection_memory_survives_filter_round_trip() {
    let mut workspace = project();
    workspace.toggle_file("src/b.ts", false).await.unwrap();

    workspace.add_exclude("src/**").await.unwrap();
    assert!(!workspace.is_selected("src/b.ts"));
    assert!(!workspace.is_selected("src/c.ts"));
    assert!(workspace.tree().find("src").is_none());
    assert_eq!(workspace.memory().intent("src/b.ts"), Some(false));

    workspace.remove_exclude("src/**").await.unwrap();
    assert!(!workspace.is_selected("src/b.ts"), "remembered intent must win");
    assert!(workspace.is_selected("src/c.ts"), "unknown intent defaults to selected");
    // Reconciliation never writes memory.
    assert_eq!(workspace.memory().len(), 1);
}

#[tokio::test]
async fn test_hidden_path_remembered_as_selected_returns_selected() {
    let mut workspace = project();
    workspace.toggle_file("src/c.ts", false).await.unwrap();
    workspace.toggle_file("src/c.ts", true).await.unwrap();
    workspace.set_include(vec!["*.ts".to_string()]).await.unwrap();
    assert_eq!(workspace.selected_paths(), vec!["a.ts"]);
    workspace.set_include(vec!["**/*".to_string()]).await.unwrap();
    assert!(workspace.is_selected("src/c.ts"));
}

#[tokio::test]
async fn test_folder_toggle_applies_to_descendants() {
    let mut workspace = project();
    assert!(workspace.folder_checked("src").unwrap());

    workspace.toggle_folder("src", false).await.unwrap();
    assert!(!workspace.is_selected("src/b.ts"));
    assert!(!workspace.is_selected("src/c.ts"));
    assert!(!workspace.folder_checked("src").unwrap());
    assert_eq!(workspace.memory().intent("src/c.ts"), Some(false));

    workspace.toggle_file("src/b.ts", true).await.unwrap();
    assert!(!workspace.folder_checked("src").unwrap(), "partially selected counts as unchecked");

    workspace.toggle_folder("", true).await.unwrap();
    assert!(workspace.folder_checked("").unwrap());
    assert_eq!(workspace.selection().len(), 4);
}

#[tokio::test]
async fn test_folder_operations_reject_files_and_unknown_paths() {
    let mut workspace = project();
    assert!(matches!(workspace.folder_checked("a.ts"), Err(PackError::UnknownPath(_))));
    assert!(matches!(
        workspace.toggle_folder("nope", true).await,
        Err(PackError::UnknownPath(_))
    ));
}

#[tokio::test]
async fn test_toggle_rejects_binary_and_unknown_files() {
    let mut workspace = project();
    workspace.set_exclude(Vec::new()).await.unwrap();
    assert!(matches!(
        workspace.toggle_file("assets/logo.png", true).await,
        Err(PackError::NotSelectable(_))
    ));
    assert!(matches!(
        workspace.toggle_file("missing.ts", true).await,
        Err(PackError::UnknownPath(_))
    ));
    assert!(!workspace.is_selected("assets/logo.png"));
}

#[tokio::test]
async fn test_select_all_and_none_write_memory() {
    let mut workspace = project();
    workspace.select_none().await;
    assert!(workspace.selection().is_empty());
    assert_eq!(workspace.active_path(), None);
    assert_eq!(workspace.memory().intent("docs/guide.md"), Some(false));

    // Select-none intent sticks through filter changes.
    workspace.add_exclude("docs/**").await.unwrap();
    workspace.remove_exclude("docs/**").await.unwrap();
    assert!(workspace.selection().is_empty());

    workspace.select_all().await;
    assert_eq!(workspace.selection().len(), 4);
    assert_eq!(workspace.active_path(), Some("a.ts"));
    assert_eq!(workspace.memory().intent("a.ts"), Some(true));
}

#[tokio::test]
async fn test_select_all_only_touches_visible_paths() {
    let mut workspace = project();
    workspace.toggle_file("docs/guide.md", false).await.unwrap();
    workspace.add_exclude("docs/**").await.unwrap();
    workspace.select_all().await;
    workspace.remove_exclude("docs/**").await.unwrap();
    assert!(!workspace.is_selected("docs/guide.md"));
}

#[tokio::test]
async fn test_pattern_mutation_boundary() {
    let mut workspace = project();
    assert!(matches!(
        workspace.add_include("**/*").await,
        Err(PackError::DuplicatePattern { set: PatternSetKind::Include, .. })
    ));
    assert!(matches!(workspace.add_exclude("   ").await, Err(PackError::EmptyPattern)));
    assert!(matches!(
        workspace.remove_exclude("never/**").await,
        Err(PackError::PatternNotFound { set: PatternSetKind::Exclude, .. })
    ));
    assert!(matches!(
        workspace
            .set_exclude(vec!["a/**".to_string(), "a/**".to_string()])
            .await,
        Err(PackError::DuplicatePattern { .. })
    ));

    // Invalid globs are stored, flagged, and match nothing.
    workspace.add_include("src/[oops").await.unwrap();
    let status = workspace.pattern_status(PatternSetKind::Include);
    assert_eq!(status.len(), 2);
    assert!(status[0].valid);
    assert_eq!(status[1].pattern, "src/[oops");
    assert!(!status[1].valid);
    assert_eq!(workspace.selection().len(), 4);
}

#[tokio::test]
async fn test_negated_exclude_keeps_matching_path() {
    let mut workspace = Workspace::new(PackConfig::default()).unwrap();
    workspace.load(source(vec![
        VFile::text("keep.ts", "k"),
        VFile::text("src/a.ts", "a"),
        VFile::text("other.ts", "o"),
    ]));
    workspace
        .set_exclude(vec!["!keep.ts".to_string(), "src/**".to_string()])
        .await
        .unwrap();
    assert_eq!(workspace.selected_paths(), vec!["keep.ts", "other.ts"]);
}

#[tokio::test]
async fn test_tree_is_rebuilt_from_scratch() {
    let mut workspace = project();
    workspace.add_exclude("docs/**").await.unwrap();
    workspace.remove_exclude("docs/**").await.unwrap();
    let fresh = build_tree(workspace.files(), workspace.include(), workspace.exclude());
    assert_eq!(workspace.tree(), &fresh);
}

#[tokio::test]
async fn test_active_path_falls_back_when_filtered_out() {
    let mut workspace = project();
    workspace.set_active_path(Some("src/c.ts")).unwrap();
    workspace.add_exclude("src/**").await.unwrap();
    assert_eq!(workspace.active_path(), Some("a.ts"));
    assert!(matches!(
        workspace.set_active_path(Some("nope.ts")),
        Err(PackError::UnknownPath(_))
    ));
    assert_eq!(workspace.activate_first_in_folder("docs").unwrap(), Some("docs/guide.md"));
}

#[tokio::test]
async fn test_filter_change_leaves_unset_active_path_unset() {
    let mut workspace = project();
    workspace.set_active_path(None).unwrap();
    workspace.add_exclude("docs/**").await.unwrap();
    assert_eq!(workspace.active_path(), None);
    assert!(!workspace.selection().is_empty());
}

#[tokio::test]
async fn test_large_folder_deselect_keeps_remaining_order() {
    let mut files: Vec<VFile> = (0..10_000)
        .map(|i| VFile::text(format!("gen/f{:05}.ts", i), "x"))
        .collect();
    files.push(VFile::text("keep/a.ts", "a"));
    files.push(VFile::text("keep/b.ts", "b"));
    let mut workspace = Workspace::new(PackConfig::default()).unwrap();
    workspace.load(source(files));

    workspace.toggle_folder("gen", false).await.unwrap();
    assert_eq!(workspace.selected_paths(), vec!["keep/a.ts", "keep/b.ts"]);
    assert_eq!(workspace.memory().intent("gen/f09999.ts"), Some(false));

    workspace.select_none().await;
    assert!(workspace.selection().is_empty());
}

#[tokio::test]
async fn test_reload_resets_memory() {
    let mut workspace = project();
    workspace.toggle_file("a.ts", false).await.unwrap();
    workspace.load(source(vec![VFile::text("a.ts", "fresh")]));
    assert!(workspace.memory().is_empty());
    assert_eq!(workspace.selected_paths(), vec!["a.ts"]);
}

#[tokio::test]
async fn test_shared_workspace_serializes_mutations() {
    let files: Vec<VFile> = (0..10)
        .map(|i| VFile::text(format!("f{}.ts", i), "x"))
        .collect();
    let mut workspace = Workspace::new(PackConfig::default()).unwrap();
    workspace.load(source(files));
    let shared = SharedWorkspace::new(workspace);

    let mut handles = Vec::new();
    for i in 0..10 {
        let shared = shared.clone();
        handles.push(tokio::spawn(async move {
            let path = format!("f{}.ts", i);
            shared.lock().await.toggle_file(&path, i % 2 == 0).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let snapshot = shared.snapshot().await;
    assert_eq!(snapshot.selected.len(), 5);
    assert!(snapshot.selected.iter().all(|p| {
        let n: usize = p.trim_start_matches('f').trim_end_matches(".ts").parse().unwrap();
        n % 2 == 0
    }));
}
