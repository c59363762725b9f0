use promptpack::config::PackConfig;
use promptpack::errors::PackError;
use promptpack::ingest::{load_folder, load_zip_file, FolderIngestor, Ingestor, SourceKind, ZipIngestor};
use promptpack::workspace::Workspace;
use std::io::{Cursor, Write};
use tempfile::TempDir;
use tokio::fs;
use tracing_test::traced_test;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, text) in entries {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(text.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

async fn create_project(dir: &TempDir) {
    let root = dir.path();
    fs::create_dir_all(root.join("src/components")).await.unwrap();
    fs::create_dir_all(root.join("node_modules/left-pad")).await.unwrap();
    fs::write(root.join("package.json"), "{\"name\":\"demo\"}").await.unwrap();
    fs::write(root.join("src/index.ts"), "export * from './components/button';\n").await.unwrap();
    fs::write(root.join("src/components/button.tsx"), "export const Button = () => null;\n")
        .await
        .unwrap();
    fs::write(root.join("node_modules/left-pad/index.js"), "module.exports = 1;").await.unwrap();
    fs::write(root.join("logo.png"), [0x89, 0x50, 0x4e, 0x47]).await.unwrap();
}

#[tokio::test]
#[traced_test]
async fn test_folder_ingest_feeds_workspace() {
    let dir = TempDir::new().unwrap();
    create_project(&dir).await;

    let ingestor = FolderIngestor {
        root: dir.path().to_path_buf(),
    };
    let loaded = ingestor.ingest().await.unwrap();
    assert_eq!(loaded.kind, SourceKind::Folder);
    assert_eq!(loaded.files.len(), 5);
    assert!(logs_contain("Loaded 5 files from folder"));

    let mut workspace = Workspace::new(PackConfig::default()).unwrap();
    workspace.load(loaded);
    assert_eq!(
        workspace.selected_paths(),
        vec!["package.json", "src/components/button.tsx", "src/index.ts"]
    );

    // Directories sort before files at every level.
    let top: Vec<&str> = workspace.tree().children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(top, vec!["src", "package.json"]);
    let src = workspace.tree().find("src").unwrap();
    let names: Vec<&str> = src.children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["components", "index.ts"]);
    assert!(src.expanded);
    assert!(src.find("components").unwrap().expanded);
    assert!(!src.find("components/button.tsx").unwrap().expanded);
}

#[tokio::test]
#[traced_test]
async fn test_zip_ingest_strips_root_and_feeds_workspace() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("upload.zip");
    let bytes = zip_bytes(&[
        ("demo-main/README.md", "# Demo\n"),
        ("demo-main/src/lib.rs", "pub fn f() {}\n"),
        ("demo-main/target/debug/out.txt", "build output"),
    ]);
    fs::write(&path, bytes).await.unwrap();

    let loaded = ZipIngestor { path: path.clone() }.ingest().await.unwrap();
    assert_eq!(loaded.kind, SourceKind::Zip);
    assert_eq!(loaded.label, "upload.zip");
    assert!(logs_contain("Loaded 3 files from ZIP archive upload.zip"));

    let mut workspace = Workspace::new(PackConfig::default()).unwrap();
    workspace.load(loaded);
    assert_eq!(workspace.selected_paths(), vec!["README.md", "src/lib.rs"]);
    assert_eq!(workspace.source(), Some((SourceKind::Zip, "upload.zip")));

    let bundle = workspace.build().await;
    assert_eq!(bundle.raw, "FILE:README.md\n# Demo\n\nFILE:src/lib.rs\npub fn f() {}");
}

#[tokio::test]
async fn test_missing_sources_are_errors() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        load_folder(&dir.path().join("missing")).await,
        Err(PackError::IoError(_))
    ));
    assert!(matches!(
        load_zip_file(&dir.path().join("missing.zip")).await,
        Err(PackError::IoError(_))
    ));

    let bogus = dir.path().join("bogus.zip");
    fs::write(&bogus, "definitely not a zip").await.unwrap();
    assert!(matches!(load_zip_file(&bogus).await, Err(PackError::ArchiveError(_))));
}
