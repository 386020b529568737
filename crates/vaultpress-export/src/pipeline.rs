//! Note to post export.
//!
//! ```text
//! Idle -> Reading -> Transforming -> ConflictCheck -+-> Writing -> Done
//!                                                   +-> AwaitingChoice -> resolve()
//!                                                   +-> Aborted
//! ```
//!
//! When an earlier export of the note exists, [`ExportPipeline::export`]
//! returns [`ExportStep::AwaitingChoice`] and nothing has been written yet.
//! The caller asks the operator and hands the choice to
//! [`ExportPipeline::resolve`]. Link rewriting copies assets into the site,
//! so it runs only once the export is known to go ahead.

use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::instrument;
use vaultpress_core::{Error, ExportConfig, FrontMatter, Result, keys};
use vaultpress_parser::frontmatter::{get_attribute, parse, serialize, set_attribute, split_raw};
use vaultpress_parser::links::sanitize_title;
use vaultpress_parser::template::{DATE_FORMAT, TemplateContext, apply_template};
use vaultpress_tags::{DisabledTagSuggester, OpenAiTagSuggester, TagExtractor};
use vaultpress_vault::{AssetIndex, AtomicFileOps, FileOp, SourceDocument, remove_quietly};

use crate::conflict::{ConflictChoice, ConflictState, find_conflict};
use crate::identity::{ensure_identity, permalink_for};
use crate::rewriter::{AssetWarning, LinkRewriter};

/// Folder inside each exported directory that holds the posts
pub const POSTS_DIR: &str = "_posts";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    Reading,
    Transforming,
    ConflictCheck,
    AwaitingChoice,
    Writing,
    Aborted,
    Done,
}

/// What a finished export did
#[derive(Debug, Serialize)]
pub struct ExportReport {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub nano_id: Option<String>,
    pub conflict: ConflictState,
    /// Earlier post removed because the new one has a different file name
    pub replaced: Option<PathBuf>,
    pub source_updated: bool,
    pub copied_assets: Vec<PathBuf>,
    pub warnings: Vec<AssetWarning>,
    pub exported_at: String,
}

impl ExportReport {
    /// Pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::other(format!("Failed to serialize export report: {}", e)))
    }
}

/// Return value of [`ExportPipeline::export`]
#[derive(Debug)]
pub enum ExportStep {
    Done(ExportReport),
    /// An earlier post exists; call [`ExportPipeline::resolve`] to continue
    AwaitingChoice(PendingConflict),
}

/// Final result once any conflict is settled
#[derive(Debug)]
pub enum ExportOutcome {
    Written(ExportReport),
    /// The operator chose Cancel; nothing was written
    Cancelled,
}

impl ExportOutcome {
    pub fn report(&self) -> Option<&ExportReport> {
        match self {
            Self::Written(report) => Some(report),
            Self::Cancelled => None,
        }
    }
}

/// Everything computed before the conflict check
#[derive(Debug)]
struct PreparedExport {
    source: SourceDocument,
    source_had_block: bool,
    source_front_matter: FrontMatter,
    front_matter: FrontMatter,
    body: String,
    export_root: PathBuf,
    destination: PathBuf,
    now: DateTime<Local>,
}

/// A suspended export waiting for the operator
#[derive(Debug)]
pub struct PendingConflict {
    existing: PathBuf,
    prepared: PreparedExport,
}

impl PendingConflict {
    /// The earlier post
    pub fn existing_path(&self) -> &Path {
        &self.existing
    }

    /// Where a full overwrite would write
    pub fn destination(&self) -> &Path {
        &self.prepared.destination
    }

    pub fn title(&self) -> String {
        self.prepared.source.title()
    }

    pub fn state(&self) -> ConflictState {
        ConflictState::AwaitingChoice
    }
}

/// Asks the operator how to handle an existing post
#[async_trait]
pub trait ConflictPrompt: Send + Sync {
    async fn choose(&self, pending: &PendingConflict) -> ConflictChoice;
}

/// A fixed answer, for unattended runs
#[async_trait]
impl ConflictPrompt for ConflictChoice {
    async fn choose(&self, _pending: &PendingConflict) -> ConflictChoice {
        *self
    }
}

enum WriteMode {
    Fresh,
    OverwriteAll(PathBuf),
    BodyOnly(PathBuf),
}

/// Exports notes from one vault into the active target folder.
///
/// Exports take `&mut self`, so a pipeline runs one export at a time.
pub struct ExportPipeline {
    config: ExportConfig,
    vault_root: PathBuf,
    tags: Arc<dyn TagExtractor>,
    clock: Option<DateTime<Local>>,
    state: PipelineState,
}

impl ExportPipeline {
    /// Create a pipeline. The tag service client is built when the
    /// configuration enables it.
    pub fn new(config: ExportConfig, vault_root: impl Into<PathBuf>) -> Result<Self> {
        config.validate()?;

        let tags: Arc<dyn TagExtractor> = if config.tag_service.enabled {
            Arc::new(OpenAiTagSuggester::new(config.tag_service.clone())?)
        } else {
            Arc::new(DisabledTagSuggester)
        };

        Ok(Self {
            config,
            vault_root: vault_root.into(),
            tags,
            clock: None,
            state: PipelineState::Idle,
        })
    }

    /// Use a different tag source
    pub fn with_tag_extractor(mut self, tags: Arc<dyn TagExtractor>) -> Self {
        self.tags = tags;
        self
    }

    /// Pin the export time instead of reading the clock
    pub fn at(mut self, now: DateTime<Local>) -> Self {
        self.clock = Some(now);
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn vault_root(&self) -> &Path {
        &self.vault_root
    }

    /// Export a note, given relative to the vault root or as an absolute path
    /// inside it.
    #[instrument(skip(self, note), fields(note = %note.display()))]
    pub async fn export(&mut self, note: &Path) -> Result<ExportStep> {
        match self.begin(note).await {
            Ok(step) => Ok(step),
            Err(e) => Err(self.abort(e)),
        }
    }

    /// Continue a suspended export with the operator's choice
    #[instrument(skip(self, pending), fields(existing = %pending.existing.display(), choice = %choice))]
    pub async fn resolve(
        &mut self,
        pending: PendingConflict,
        choice: ConflictChoice,
    ) -> Result<ExportOutcome> {
        let PendingConflict { existing, prepared } = pending;

        let mode = match choice {
            ConflictChoice::Cancel => {
                log::info!(
                    "Export of {} cancelled, {} left as is",
                    prepared.source.relative_path().display(),
                    existing.display()
                );
                self.state = PipelineState::Done;
                return Ok(ExportOutcome::Cancelled);
            }
            ConflictChoice::OverwriteAll => WriteMode::OverwriteAll(existing),
            ConflictChoice::BodyOnly => WriteMode::BodyOnly(existing),
        };

        match self.write(prepared, mode).await {
            Ok(report) => Ok(ExportOutcome::Written(report)),
            Err(e) => Err(self.abort(e)),
        }
    }

    /// Export a note and settle any conflict through `prompt`
    pub async fn export_with<P>(&mut self, note: &Path, prompt: &P) -> Result<ExportOutcome>
    where
        P: ConflictPrompt + ?Sized,
    {
        match self.export(note).await? {
            ExportStep::Done(report) => Ok(ExportOutcome::Written(report)),
            ExportStep::AwaitingChoice(pending) => {
                let choice = prompt.choose(&pending).await;
                self.resolve(pending, choice).await
            }
        }
    }

    fn abort(&mut self, error: Error) -> Error {
        log::error!("Export aborted: {}", error);
        self.state = PipelineState::Aborted;
        error
    }

    async fn begin(&mut self, note: &Path) -> Result<ExportStep> {
        self.state = PipelineState::Reading;
        let export_root = self.config.reachable_target()?;
        let source = SourceDocument::load(&self.vault_root, note).await?;
        let source_had_block = split_raw(source.content()).is_some();
        let (source_front_matter, body) = parse(source.content())?;

        self.state = PipelineState::Transforming;
        let now = self.clock.unwrap_or_else(Local::now);
        let front_matter = self
            .build_front_matter(&source, &source_front_matter, &body, now)
            .await;

        let title = sanitize_title(&source.title());
        let posts_dir = export_root.join(source.relative_dir()).join(POSTS_DIR);
        let destination = posts_dir.join(format!("{}-{}.md", now.format(DATE_FORMAT), title));

        self.state = PipelineState::ConflictCheck;
        let existing = find_conflict(&posts_dir, &title).await?;

        let prepared = PreparedExport {
            source,
            source_had_block,
            source_front_matter,
            front_matter,
            body,
            export_root,
            destination,
            now,
        };

        match existing {
            Some(existing) => {
                log::info!("{} was exported before as {}", title, existing.display());
                self.state = PipelineState::AwaitingChoice;
                Ok(ExportStep::AwaitingChoice(PendingConflict { existing, prepared }))
            }
            None => Ok(ExportStep::Done(self.write(prepared, WriteMode::Fresh).await?)),
        }
    }

    /// Source front matter, or the template when the note has none; tags are
    /// filled in from the tag source when missing
    async fn build_front_matter(
        &self,
        source: &SourceDocument,
        source_front_matter: &FrontMatter,
        body: &str,
        now: DateTime<Local>,
    ) -> FrontMatter {
        let suggested = if source_front_matter.tags().is_empty() {
            self.tags.extract_tags(body).await
        } else {
            Vec::new()
        };

        let mut fm = if source_front_matter.is_empty() {
            let ctx = TemplateContext::for_file(source.relative_path(), now)
                .with_tags(suggested.clone());
            apply_template(&self.config.front_matter_template, &ctx)
        } else {
            source_front_matter.clone()
        };

        if fm.tags().is_empty() && !suggested.is_empty() {
            fm.set(keys::TAGS, suggested);
        }
        fm
    }

    async fn write(&mut self, prepared: PreparedExport, mode: WriteMode) -> Result<ExportReport> {
        self.state = PipelineState::Writing;

        let assets = AssetIndex::scan(&self.vault_root, &self.config.exclude_patterns)?;
        let rewriter = LinkRewriter::new(&prepared.export_root, &self.config.image_folder, &assets);
        let rewritten = rewriter.rewrite(&prepared.body).await;

        let mut fm = prepared.front_matter;
        let mut replaced = None;

        let (conflict, destination, content) = match mode {
            WriteMode::Fresh => {
                ensure_identity(&mut fm, None);
                let content = serialize(&fm, &rewritten.body)?;
                (ConflictState::NoConflict, prepared.destination, content)
            }
            WriteMode::OverwriteAll(existing) => {
                let existing_text = fs::read_to_string(&existing).await.map_err(Error::io)?;
                let existing_fm = existing_front_matter(&existing_text, &existing);
                ensure_identity(&mut fm, existing_fm.as_ref());
                if existing != prepared.destination {
                    replaced = Some(existing);
                }
                let content = serialize(&fm, &rewritten.body)?;
                (ConflictState::ResolvedOverwriteAll, prepared.destination, content)
            }
            WriteMode::BodyOnly(existing) => {
                let existing_text = fs::read_to_string(&existing).await.map_err(Error::io)?;
                let content = match split_raw(&existing_text) {
                    Some((block, _)) => {
                        // The block is kept as written; `fm` is only what the
                        // source mirror sees
                        fm = existing_front_matter(&existing_text, &existing).unwrap_or_default();
                        let mut content = block.to_string();
                        if !content.ends_with('\n') {
                            content.push('\n');
                        }
                        content.push_str(&rewritten.body);
                        content
                    }
                    None => {
                        log::info!(
                            "{} has no front matter, replacing the whole file",
                            existing.display()
                        );
                        ensure_identity(&mut fm, None);
                        serialize(&fm, &rewritten.body)?
                    }
                };
                (ConflictState::ResolvedBodyOnly, existing, content)
            }
        };

        let mut ops = rewritten.asset_ops();
        ops.push(FileOp::write(&destination, content));
        let mut source_updated = false;
        if self.config.mirror_to_source && !fm.is_empty() {
            let mirrored = mirror_front_matter(
                prepared.source.content(),
                prepared.source_had_block,
                &prepared.source_front_matter,
                &fm,
            )?;
            if mirrored != prepared.source.content() {
                ops.push(FileOp::write(prepared.source.absolute_path(), mirrored));
                source_updated = true;
            }
        }

        AtomicFileOps::scratch()?.execute_transaction(ops).await?;

        if let Some(old) = replaced.take()
            && remove_quietly(&old).await
        {
            replaced = Some(old);
        }

        log::info!(
            "Exported {} to {}",
            prepared.source.relative_path().display(),
            destination.display()
        );
        self.state = PipelineState::Done;

        Ok(ExportReport {
            source: prepared.source.absolute_path(),
            destination,
            nano_id: fm.nano_id().map(str::to_string),
            conflict,
            replaced,
            source_updated,
            copied_assets: rewritten.asset_paths(),
            warnings: rewritten.warnings,
            exported_at: prepared.now.to_rfc3339(),
        })
    }
}

/// Front matter of an earlier post.
///
/// When the block is there but its YAML does not parse, only the identity
/// is recovered, by matching the `nanoId` line.
fn existing_front_matter(text: &str, path: &Path) -> Option<FrontMatter> {
    split_raw(text)?;
    match parse(text) {
        Ok((fm, _)) => Some(fm),
        Err(e) => {
            log::warn!(
                "Front matter of {} does not parse, keeping only its nanoId: {}",
                path.display(),
                e
            );
            let nano_id = get_attribute(text, keys::NANO_ID)?;
            let nano_id = nano_id.as_str()?.to_string();
            let mut fm = FrontMatter::new();
            fm.set(keys::NANO_ID, nano_id.as_str());
            fm.set(keys::PERMALINK, permalink_for(&nano_id));
            Some(fm)
        }
    }
}

/// The source note with `fm` written into its front matter.
///
/// Only keys whose value changed are touched, so the rest of the block keeps
/// its formatting. A note without a block gets a new one.
fn mirror_front_matter(
    source_text: &str,
    had_block: bool,
    source_fm: &FrontMatter,
    fm: &FrontMatter,
) -> Result<String> {
    if !had_block {
        return serialize(fm, source_text);
    }

    let mut text = source_text.to_string();
    for (key, value) in fm.iter() {
        if source_fm.get(key) != Some(value) {
            text = set_attribute(&text, key, value)?;
        }
    }
    Ok(text)
}
