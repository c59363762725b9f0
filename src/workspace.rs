use crate::bundle::{build_bundle, Bundle, PromptSpec};
use crate::config::{validate_budget, PackConfig};
use crate::errors::{PackError, PatternSetKind};
use crate::export::{Export, ExportTarget, MARKDOWN_FILENAME, RAW_FILENAME};
use crate::file::VFile;
use crate::filter::selectable_paths;
use crate::ingest::{LoadedSource, SourceKind};
use crate::matcher::is_valid_glob;
use crate::selection::{Selection, SelectionManager, SelectionMemory};
use crate::tree::{build_tree, TreeNode};
use crate::utils::{compact_text, export_name_for};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, MutexGuard};
use tracing::{debug, info};

const EVENT_CAPACITY: usize = 64;

/// Published after every mutation, once the workspace is consistent again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceEvent {
    Loaded { kind: SourceKind, label: String, files: usize },
    FiltersChanged { selectable: usize },
    SelectionChanged { selected: usize },
    Invalidated,
    Built { files: usize, total_tokens: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternStatus {
    pub pattern: String,
    pub valid: bool,
}

/// A read-only copy of the state observers render from.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkspaceSnapshot {
    pub source: Option<(SourceKind, String)>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub tree: TreeNode,
    pub selected: Vec<String>,
    pub active_path: Option<String>,
    pub model_preset: String,
    pub budget: u64,
    pub spec: Option<PromptSpec>,
    pub stale: bool,
    pub auto_build: bool,
}

/// Owns the file set, filters, selection and last build. Every mutation goes
/// through a method that leaves the state consistent before returning: the
/// tree and selectable set are recomputed, artifacts invalidated, and a
/// rebuild run when auto-build is on.
pub struct Workspace {
    files: Vec<Arc<VFile>>,
    source: Option<(SourceKind, String)>,
    include: Vec<String>,
    exclude: Vec<String>,
    tree: TreeNode,
    selectable: Vec<String>,
    selection: SelectionManager,
    active_path: Option<String>,
    model_preset: String,
    budget: u64,
    bundle: Option<Bundle>,
    stale: bool,
    auto_build: bool,
    events: broadcast::Sender<WorkspaceEvent>,
}

impl Workspace {
    pub fn new(config: PackConfig) -> Result<Self, PackError> {
        config.validate()?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Workspace {
            files: Vec::new(),
            source: None,
            include: config.include,
            exclude: config.exclude,
            tree: TreeNode::root(),
            selectable: Vec::new(),
            selection: SelectionManager::new(),
            active_path: None,
            model_preset: config.model_preset,
            budget: config.target_token_budget,
            bundle: None,
            stale: true,
            auto_build: false,
            events,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkspaceEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: WorkspaceEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    pub fn files(&self) -> &[Arc<VFile>] {
        &self.files
    }

    pub fn file(&self, path: &str) -> Option<&Arc<VFile>> {
        self.files.iter().find(|f| f.path == path)
    }

    pub fn source(&self) -> Option<(SourceKind, &str)> {
        self.source.as_ref().map(|(kind, label)| (*kind, label.as_str()))
    }

    pub fn tree(&self) -> &TreeNode {
        &self.tree
    }

    pub fn include(&self) -> &[String] {
        &self.include
    }

    pub fn exclude(&self) -> &[String] {
        &self.exclude
    }

    /// Filtered, non-binary paths in file order.
    pub fn selectable(&self) -> &[String] {
        &self.selectable
    }

    pub fn selection(&self) -> &Selection {
        self.selection.selection()
    }

    pub fn memory(&self) -> &SelectionMemory {
        self.selection.memory()
    }

    pub fn is_selected(&self, path: &str) -> bool {
        self.selection().contains(path)
    }

    pub fn selected_paths(&self) -> Vec<String> {
        self.selection().iter().map(str::to_owned).collect()
    }

    pub fn active_path(&self) -> Option<&str> {
        self.active_path.as_deref()
    }

    pub fn model_preset(&self) -> &str {
        &self.model_preset
    }

    pub fn budget(&self) -> u64 {
        self.budget
    }

    pub fn bundle(&self) -> Option<&Bundle> {
        self.bundle.as_ref()
    }

    pub fn spec(&self) -> Option<&PromptSpec> {
        self.bundle.as_ref().map(|b| &b.spec)
    }

    pub fn markdown(&self) -> Option<&str> {
        self.bundle.as_ref().map(|b| b.markdown.as_str())
    }

    pub fn raw(&self) -> Option<&str> {
        self.bundle.as_ref().map(|b| b.raw.as_str())
    }

    pub fn warnings(&self) -> &[String] {
        self.spec().map(|s| s.metadata.warnings.as_slice()).unwrap_or(&[])
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn auto_build_enabled(&self) -> bool {
        self.auto_build
    }

    pub fn snapshot(&self) -> WorkspaceSnapshot {
        WorkspaceSnapshot {
            source: self.source.clone(),
            include: self.include.clone(),
            exclude: self.exclude.clone(),
            tree: self.tree.clone(),
            selected: self.selected_paths(),
            active_path: self.active_path.clone(),
            model_preset: self.model_preset.clone(),
            budget: self.budget,
            spec: self.spec().cloned(),
            stale: self.stale,
            auto_build: self.auto_build,
        }
    }

    pub fn pattern_status(&self, set: PatternSetKind) -> Vec<PatternStatus> {
        self.patterns(set)
            .iter()
            .map(|p| PatternStatus {
                pattern: p.clone(),
                valid: is_valid_glob(p),
            })
            .collect()
    }

    // ---- loading ----

    /// Replaces the whole working set. Selection memory, the last build and
    /// the auto-build latch are reset; every selectable file starts selected.
    pub fn load(&mut self, source: LoadedSource) {
        let mut seen = HashSet::new();
        self.files = source
            .files
            .into_iter()
            .filter(|f| seen.insert(f.path.clone()))
            .map(Arc::new)
            .collect();
        self.source = Some((source.kind, source.label.clone()));
        self.bundle = None;
        self.auto_build = false;
        self.stale = true;

        self.recompute_filtered();
        self.selection.reset(&self.selectable);
        self.active_path = self.selection().first().map(str::to_owned);

        info!(
            "Loaded {} files from {} {} ({} selectable)",
            self.files.len(),
            source.kind,
            source.label,
            self.selectable.len()
        );
        self.emit(WorkspaceEvent::Loaded {
            kind: source.kind,
            label: source.label,
            files: self.files.len(),
        });
    }

    // ---- filters ----

    fn patterns(&self, set: PatternSetKind) -> &Vec<String> {
        match set {
            PatternSetKind::Include => &self.include,
            PatternSetKind::Exclude => &self.exclude,
        }
    }

    fn patterns_mut(&mut self, set: PatternSetKind) -> &mut Vec<String> {
        match set {
            PatternSetKind::Include => &mut self.include,
            PatternSetKind::Exclude => &mut self.exclude,
        }
    }

    /// Appends a pattern. Invalid globs are kept (and reported by
    /// [`Workspace::pattern_status`]); empty and duplicate ones are rejected.
    pub async fn add_pattern(&mut self, set: PatternSetKind, pattern: &str) -> Result<(), PackError> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Err(PackError::EmptyPattern);
        }
        if self.patterns(set).iter().any(|p| p == pattern) {
            return Err(PackError::DuplicatePattern {
                set,
                pattern: pattern.to_owned(),
            });
        }
        self.patterns_mut(set).push(pattern.to_owned());
        debug!("Added {} pattern {}", set, pattern);
        self.filters_changed().await;
        Ok(())
    }

    pub async fn remove_pattern(&mut self, set: PatternSetKind, pattern: &str) -> Result<(), PackError> {
        let patterns = self.patterns_mut(set);
        let Some(index) = patterns.iter().position(|p| p == pattern) else {
            return Err(PackError::PatternNotFound {
                set,
                pattern: pattern.to_owned(),
            });
        };
        patterns.remove(index);
        debug!("Removed {} pattern {}", set, pattern);
        self.filters_changed().await;
        Ok(())
    }

    /// Replaces a whole pattern list. Patterns are trimmed; blanks dropped.
    pub async fn set_patterns(&mut self, set: PatternSetKind, patterns: Vec<String>) -> Result<(), PackError> {
        let patterns: Vec<String> = patterns
            .into_iter()
            .map(|p| p.trim().to_owned())
            .filter(|p| !p.is_empty())
            .collect();
        crate::config::check_duplicates(set, &patterns)?;
        *self.patterns_mut(set) = patterns;
        self.filters_changed().await;
        Ok(())
    }

    pub async fn add_include(&mut self, pattern: &str) -> Result<(), PackError> {
        self.add_pattern(PatternSetKind::Include, pattern).await
    }

    pub async fn add_exclude(&mut self, pattern: &str) -> Result<(), PackError> {
        self.add_pattern(PatternSetKind::Exclude, pattern).await
    }

    pub async fn remove_include(&mut self, pattern: &str) -> Result<(), PackError> {
        self.remove_pattern(PatternSetKind::Include, pattern).await
    }

    pub async fn remove_exclude(&mut self, pattern: &str) -> Result<(), PackError> {
        self.remove_pattern(PatternSetKind::Exclude, pattern).await
    }

    pub async fn set_include(&mut self, patterns: Vec<String>) -> Result<(), PackError> {
        self.set_patterns(PatternSetKind::Include, patterns).await
    }

    pub async fn set_exclude(&mut self, patterns: Vec<String>) -> Result<(), PackError> {
        self.set_patterns(PatternSetKind::Exclude, patterns).await
    }

    fn recompute_filtered(&mut self) {
        self.tree = build_tree(&self.files, &self.include, &self.exclude);
        self.selectable = selectable_paths(&self.files, &self.include, &self.exclude);
    }

    async fn filters_changed(&mut self) {
        self.recompute_filtered();
        self.selection.reconcile(&self.selectable);

        let active_hidden = self
            .active_path
            .as_ref()
            .is_some_and(|p| !self.selectable.contains(p));
        if active_hidden {
            self.active_path = self.selection().first().map(str::to_owned);
        }

        self.emit(WorkspaceEvent::FiltersChanged {
            selectable: self.selectable.len(),
        });
        self.invalidate_and_maybe_rebuild().await;
    }

    // ---- selection ----

    fn require_selectable(&self, path: &str) -> Result<(), PackError> {
        if self.selectable.iter().any(|p| p == path) {
            return Ok(());
        }
        if self.file(path).is_none() {
            return Err(PackError::UnknownPath(path.to_owned()));
        }
        Err(PackError::NotSelectable(path.to_owned()))
    }

    fn require_folder(&self, path: &str) -> Result<&TreeNode, PackError> {
        self.tree
            .find(path)
            .filter(|node| node.is_dir())
            .ok_or_else(|| PackError::UnknownPath(path.to_owned()))
    }

    pub async fn toggle_file(&mut self, path: &str, on: bool) -> Result<(), PackError> {
        self.require_selectable(path)?;
        self.selection.toggle_file(path, on);
        self.selection_changed().await;
        Ok(())
    }

    /// Applies `on` to every selectable file below the folder at `path`.
    /// The empty path is the root.
    pub async fn toggle_folder(&mut self, path: &str, on: bool) -> Result<(), PackError> {
        let descendants = self.require_folder(path)?.descendant_files();
        self.selection.toggle_many(&descendants, on);
        self.selection_changed().await;
        Ok(())
    }

    pub fn folder_checked(&self, path: &str) -> Result<bool, PackError> {
        let folder = self.require_folder(path)?;
        Ok(self.selection.folder_checked(folder))
    }

    pub async fn select_all(&mut self) {
        let paths = self.selectable.clone();
        self.selection.toggle_many(&paths, true);
        self.active_path = paths.first().cloned();
        self.selection_changed().await;
    }

    pub async fn select_none(&mut self) {
        let paths = self.selectable.clone();
        self.selection.toggle_many(&paths, false);
        self.active_path = None;
        self.selection_changed().await;
    }

    async fn selection_changed(&mut self) {
        self.emit(WorkspaceEvent::SelectionChanged {
            selected: self.selection().len(),
        });
        self.invalidate_and_maybe_rebuild().await;
    }

    // ---- active file ----

    pub fn set_active_path(&mut self, path: Option<&str>) -> Result<(), PackError> {
        if let Some(path) = path {
            if self.file(path).is_none() {
                return Err(PackError::UnknownPath(path.to_owned()));
            }
        }
        self.active_path = path.map(str::to_owned);
        Ok(())
    }

    /// Makes the first selectable file below a folder active, if there is one.
    pub fn activate_first_in_folder(&mut self, path: &str) -> Result<Option<&str>, PackError> {
        let first = self.require_folder(path)?.descendant_files().into_iter().next();
        if first.is_some() {
            self.active_path = first;
        }
        Ok(self.active_path.as_deref())
    }

    // ---- configuration ----

    pub async fn set_model_preset(&mut self, preset: &str) {
        if self.model_preset == preset {
            return;
        }
        self.model_preset = preset.to_owned();
        self.invalidate_and_maybe_rebuild().await;
    }

    pub async fn set_budget(&mut self, budget: u64) -> Result<(), PackError> {
        validate_budget(budget)?;
        if self.budget != budget {
            self.budget = budget;
            self.invalidate_and_maybe_rebuild().await;
        }
        Ok(())
    }

    // ---- build ----

    async fn invalidate_and_maybe_rebuild(&mut self) {
        self.bundle = None;
        self.stale = true;
        self.emit(WorkspaceEvent::Invalidated);
        if self.auto_build {
            debug!("Auto-build is on, rebuilding");
            self.build().await;
        }
    }

    /// Builds the bundle from the current selection. Over-budget bundles are
    /// still built; the prompt spec carries the warning. After the first build every
    /// later change rebuilds automatically.
    pub async fn build(&mut self) -> &Bundle {
        let bundle = build_bundle(
            &self.files,
            self.selection.selection(),
            &self.model_preset,
            self.budget,
        )
        .await;

        let active_bundled = self
            .active_path
            .as_deref()
            .is_some_and(|p| bundle.spec.contains(p));
        if self.active_path.is_some() && !active_bundled {
            self.active_path = bundle.spec.files.first().map(|e| e.path.clone());
        }

        self.stale = false;
        self.auto_build = true;
        self.emit(WorkspaceEvent::Built {
            files: bundle.spec.files.len(),
            total_tokens: bundle.spec.metadata.total_tokens_estimate,
        });
        self.bundle.insert(bundle)
    }

    // ---- export ----

    pub fn export(&self, target: ExportTarget) -> Result<Export, PackError> {
        match target {
            ExportTarget::Markdown => Export::new(MARKDOWN_FILENAME, self.require_bundle()?.markdown.as_str()),
            ExportTarget::Raw => Export::new(RAW_FILENAME, self.require_bundle()?.raw.as_str()),
            ExportTarget::ActiveFile | ExportTarget::ActiveFileRaw => {
                let path = self
                    .active_path
                    .as_deref()
                    .ok_or_else(|| PackError::NothingToExport("no active file".to_owned()))?;
                let text = self.file(path).map(|f| f.text_or_empty()).unwrap_or("");
                if target == ExportTarget::ActiveFileRaw {
                    Export::new(export_name_for(path, ".raw.txt"), compact_text(text))
                } else {
                    Export::new(export_name_for(path, ".txt"), text)
                }
            }
        }
    }

    fn require_bundle(&self) -> Result<&Bundle, PackError> {
        self.bundle
            .as_ref()
            .ok_or_else(|| PackError::NothingToExport("build the bundle first".to_owned()))
    }
}

/// A workspace shared between tasks. Operations queue behind the one in
/// flight, so each caller sees the state the previous one left.
#[derive(Clone)]
pub struct SharedWorkspace {
    inner: Arc<Mutex<Workspace>>,
}

impl SharedWorkspace {
    pub fn new(workspace: Workspace) -> Self {
        SharedWorkspace {
            inner: Arc::new(Mutex::new(workspace)),
        }
    }

    pub async fn lock(&self) -> MutexGuard<'_, Workspace> {
        self.inner.lock().await
    }

    pub async fn snapshot(&self) -> WorkspaceSnapshot {
        self.lock().await.snapshot()
    }

    pub async fn build(&self) -> Bundle {
        self.lock().await.build().await.clone()
    }
}
