//! redpen Language Server Protocol implementation.
//!
//! Keeps the compiled engine hot in memory, pushes a diagnostic per finding
//! and offers a quick fix that applies the suggested replacement.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use dashmap::DashMap;
use redpen_core::{
    sanitize_mapped, Category, Config, CorrectionError, CorrectionResult, Engine, Severity,
};
use serde_json::{json, Map, Value};
use tokio::sync::RwLock;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService, Server};

const SOURCE: &str = "redpen";
const DEFAULT_CONFIG: &str = "redpen.yml";

/// Document state cached by the server.
struct DocumentState {
    content: String,
    version: i32,
}

#[derive(Clone, Default)]
struct CategoryFilter {
    only: HashSet<Category>,
    disable: HashSet<Category>,
}

impl CategoryFilter {
    fn allows(&self, category: Category) -> bool {
        if !self.only.is_empty() {
            return self.only.contains(&category);
        }
        !self.disable.contains(&category)
    }
}

/// `None` when the key is absent so a partial settings payload keeps the
/// current list; `null` or a non-array clears it.
fn parse_categories(value: Option<&Value>) -> Option<HashSet<Category>> {
    let value = value?;
    let Value::Array(items) = value else {
        return Some(HashSet::new());
    };
    Some(
        items
            .iter()
            .filter_map(Value::as_str)
            .filter_map(Category::parse)
            .collect(),
    )
}

/// Client settings shared by `initializationOptions` and
/// `workspace/didChangeConfiguration`.
#[derive(Default)]
struct Settings {
    config_path: Option<String>,
    extended: Option<bool>,
    only_categories: Option<HashSet<Category>>,
    disable_categories: Option<HashSet<Category>>,
}

impl Settings {
    fn from_map(map: &Map<String, Value>) -> Self {
        Self {
            config_path: map
                .get("configPath")
                .and_then(Value::as_str)
                .map(str::to_string),
            extended: map.get("extended").and_then(Value::as_bool),
            only_categories: parse_categories(map.get("onlyCategories")),
            disable_categories: parse_categories(map.get("disableCategories")),
        }
    }

    fn update_filter(&self, filter: &mut CategoryFilter) {
        if let Some(only) = &self.only_categories {
            filter.only = only.clone();
        }
        if let Some(disable) = &self.disable_categories {
            filter.disable = disable.clone();
        }
    }
}

/// redpen Language Server backend.
struct Backend {
    client: Client,
    engine: RwLock<Arc<Engine>>,
    documents: DashMap<Url, DocumentState>,
    workspace_root: RwLock<Option<PathBuf>>,
    config_path: RwLock<Option<PathBuf>>,
    extended: RwLock<bool>,
    category_filter: RwLock<CategoryFilter>,
}

impl Backend {
    fn new(client: Client, engine: Engine) -> Self {
        Self {
            client,
            engine: RwLock::new(Arc::new(engine)),
            documents: DashMap::new(),
            workspace_root: RwLock::new(None),
            config_path: RwLock::new(None),
            extended: RwLock::new(false),
            category_filter: RwLock::new(CategoryFilter::default()),
        }
    }

    async fn apply_settings(&self, settings: Settings) {
        if let Some(config_path) = settings.config_path.clone() {
            if config_path.trim().is_empty() {
                *self.config_path.write().await = None;
            } else {
                let configured = PathBuf::from(config_path);
                if configured.is_absolute() {
                    *self.config_path.write().await = Some(configured);
                } else if let Some(root) = self.workspace_root.read().await.clone() {
                    *self.config_path.write().await = Some(root.join(configured));
                }
            }
        }
        if let Some(extended) = settings.extended {
            *self.extended.write().await = extended;
        }
        settings.update_filter(&mut *self.category_filter.write().await);
    }

    async fn reload_engine(&self) -> anyhow::Result<()> {
        let configured = self.config_path.read().await.clone();
        let root = self.workspace_root.read().await.clone();
        let Some(resolved) = configured.or_else(|| root.map(|r| r.join(DEFAULT_CONFIG))) else {
            return Ok(());
        };

        let cfg = if resolved.exists() {
            Config::load(&resolved)?
        } else {
            Config::default()
        };

        let engine = Engine::new(cfg).context("failed to compile rule catalog")?;
        *self.engine.write().await = Arc::new(engine);
        *self.config_path.write().await = Some(resolved.clone());

        tracing::info!(path = %resolved.display(), "config loaded");
        self.client
            .log_message(
                MessageType::INFO,
                format!("redpen config loaded: {}", resolved.display()),
            )
            .await;

        Ok(())
    }

    async fn reload_and_refresh(&self) {
        if let Err(err) = self.reload_engine().await {
            self.client
                .log_message(
                    MessageType::ERROR,
                    format!("Failed to reload config: {err:#}"),
                )
                .await;
        }
        let uris: Vec<Url> = self.documents.iter().map(|e| e.key().clone()).collect();
        for uri in uris {
            self.publish_diagnostics(uri).await;
        }
    }

    /// Correct a document and return LSP diagnostics.
    async fn analyze_document(&self, uri: &Url) -> Vec<Diagnostic> {
        let Some(content) = self.documents.get(uri).map(|doc| doc.content.clone()) else {
            return vec![];
        };

        let engine = self.engine.read().await.clone();
        let outcome = if *self.extended.read().await {
            engine.correct_extended(&content)
        } else {
            engine.correct(&content)
        };
        let result = match outcome {
            Ok(result) => result,
            Err(err) => {
                self.client
                    .log_message(MessageType::LOG, format!("redpen skipped {uri}: {err}"))
                    .await;
                return vec![];
            }
        };

        let filter = self.category_filter.read().await.clone();
        to_lsp_diagnostics(&content, &result, &filter)
    }

    /// Publish diagnostics to the client.
    async fn publish_diagnostics(&self, uri: Url) {
        let diagnostics = self.analyze_document(&uri).await;
        let version = self.documents.get(&uri).map(|d| d.version);
        self.client
            .publish_diagnostics(uri, diagnostics, version)
            .await;
    }
}

fn byte_to_position(text: &str, byte_offset: usize) -> Position {
    let byte_offset = byte_offset.min(text.len());
    let mut line: u32 = 0;
    let mut last_newline = 0usize;
    for (idx, ch) in text.char_indices() {
        if idx >= byte_offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            last_newline = idx + 1;
        }
    }
    let character = text[last_newline..byte_offset].encode_utf16().count() as u32;
    Position { line, character }
}

fn lsp_severity(severity: Severity) -> DiagnosticSeverity {
    match severity {
        Severity::Error => DiagnosticSeverity::ERROR,
        Severity::Warning => DiagnosticSeverity::WARNING,
        Severity::Suggestion => DiagnosticSeverity::INFORMATION,
    }
}

/// Findings carry offsets into the sanitised text; map them back onto the
/// document the client holds.
fn to_lsp_diagnostics(
    content: &str,
    result: &CorrectionResult,
    filter: &CategoryFilter,
) -> Vec<Diagnostic> {
    let mapped = sanitize_mapped(content);
    result
        .errors
        .iter()
        .filter(|err| filter.allows(err.category))
        .map(|err| {
            let (start, end) = mapped.raw_span(err.start, err.end);
            to_lsp_diagnostic(err, content, start, end)
        })
        .collect()
}

fn to_lsp_diagnostic(err: &CorrectionError, content: &str, start: usize, end: usize) -> Diagnostic {
    Diagnostic {
        range: Range {
            start: byte_to_position(content, start),
            end: byte_to_position(content, end),
        },
        severity: Some(lsp_severity(err.severity)),
        code: Some(NumberOrString::String(err.rule.clone())),
        code_description: None,
        source: Some(SOURCE.to_string()),
        message: format!("[{}] {} → {}", err.category, err.explanation, err.suggestion),
        related_information: None,
        tags: None,
        data: Some(json!({ "suggestion": err.suggestion })),
    }
}

fn quick_fix(uri: &Url, diag: &Diagnostic) -> Option<CodeAction> {
    if diag.source.as_deref() != Some(SOURCE) {
        return None;
    }
    let suggestion = diag.data.as_ref()?.get("suggestion")?.as_str()?.to_string();

    let mut changes = HashMap::new();
    changes.insert(
        uri.clone(),
        vec![TextEdit {
            range: diag.range,
            new_text: suggestion.clone(),
        }],
    );

    Some(CodeAction {
        title: format!("Replace with '{suggestion}'"),
        kind: Some(CodeActionKind::QUICKFIX),
        diagnostics: Some(vec![diag.clone()]),
        edit: Some(WorkspaceEdit {
            changes: Some(changes),
            ..Default::default()
        }),
        command: None,
        is_preferred: Some(true),
        disabled: None,
        data: None,
    })
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        if let Some(root_uri) = params.root_uri.or_else(|| {
            params
                .workspace_folders
                .as_ref()
                .and_then(|folders| folders.first().map(|f| f.uri.clone()))
        }) {
            if let Ok(path) = root_uri.to_file_path() {
                *self.workspace_root.write().await = Some(path);
            }
        }

        if let Some(Value::Object(map)) = params.initialization_options {
            self.apply_settings(Settings::from_map(&map)).await;
        }

        if let Err(err) = self.reload_engine().await {
            self.client
                .log_message(
                    MessageType::ERROR,
                    format!("Failed to load config: {err:#}"),
                )
                .await;
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                code_action_provider: Some(CodeActionProviderCapability::Options(
                    CodeActionOptions {
                        code_action_kinds: Some(vec![CodeActionKind::QUICKFIX]),
                        work_done_progress_options: WorkDoneProgressOptions {
                            work_done_progress: None,
                        },
                        resolve_provider: Some(false),
                    },
                )),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "redpen Language Server".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "redpen LSP initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        let content = params.text_document.text;
        let version = params.text_document.version;

        self.documents
            .insert(uri.clone(), DocumentState { content, version });

        self.publish_diagnostics(uri).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;

        // FULL sync: the last change holds the whole document.
        if let Some(change) = params.content_changes.into_iter().last() {
            self.documents.insert(
                uri.clone(),
                DocumentState {
                    content: change.text,
                    version,
                },
            );
        }

        self.publish_diagnostics(uri).await;
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        let uri = params.text_document.uri;
        let saved_path = uri.to_file_path().ok();
        let config_path = self.config_path.read().await.clone();
        let is_config = saved_path
            .as_ref()
            .zip(config_path.as_ref())
            .is_some_and(|(a, b)| a == b);

        if is_config {
            self.reload_and_refresh().await;
        } else {
            self.publish_diagnostics(uri).await;
        }
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        if let Value::Object(map) = &params.settings {
            self.apply_settings(Settings::from_map(map)).await;
        }
        self.reload_and_refresh().await;
    }

    async fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        let config_path = self.config_path.read().await.clone();
        let should_reload = params.changes.iter().any(|change| match &config_path {
            Some(config_path) => change
                .uri
                .to_file_path()
                .is_ok_and(|path| &path == config_path),
            None => change.uri.path().ends_with(DEFAULT_CONFIG),
        });

        if should_reload {
            self.reload_and_refresh().await;
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        self.documents.remove(&params.text_document.uri);
        self.client
            .publish_diagnostics(params.text_document.uri, vec![], None)
            .await;
    }

    async fn code_action(&self, params: CodeActionParams) -> Result<Option<CodeActionResponse>> {
        let uri = &params.text_document.uri;
        if !self.documents.contains_key(uri) {
            return Ok(None);
        }

        let actions: Vec<CodeActionOrCommand> = params
            .context
            .diagnostics
            .iter()
            .filter_map(|diag| quick_fix(uri, diag))
            .map(CodeActionOrCommand::CodeAction)
            .collect();

        if actions.is_empty() {
            Ok(None)
        } else {
            Ok(Some(actions))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the protocol; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let engine = Engine::new(Config::default()).context("failed to compile rule catalog")?;

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(|client| Backend::new(client, engine));
    Server::new(stdin, stdout, socket).serve(service).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diagnostics(content: &str, filter: &CategoryFilter) -> Vec<Diagnostic> {
        let engine = Engine::new(Config::default()).unwrap();
        let result = engine.correct(content).unwrap();
        to_lsp_diagnostics(content, &result, filter)
    }

    #[test]
    fn positions_count_utf16_units() {
        let text = "a\nCafé 😀 teh";
        assert_eq!(byte_to_position(text, 0), Position { line: 0, character: 0 });
        let teh = text.find("teh").unwrap();
        assert_eq!(byte_to_position(text, teh), Position { line: 1, character: 8 });
        assert_eq!(
            byte_to_position(text, text.len() + 10),
            Position { line: 1, character: 11 }
        );
    }

    #[test]
    fn diagnostics_land_on_the_raw_document() {
        let content = "\r\n  She dont like it.\r\n";
        let diags = diagnostics(content, &CategoryFilter::default());
        assert_eq!(diags.len(), 1);
        let diag = &diags[0];
        assert_eq!(diag.range.start, Position { line: 1, character: 6 });
        assert_eq!(diag.range.end, Position { line: 1, character: 10 });
        assert_eq!(diag.code, Some(NumberOrString::String("dont".into())));
        assert_eq!(diag.severity, Some(DiagnosticSeverity::ERROR));
        assert_eq!(diag.source.as_deref(), Some(SOURCE));
    }

    #[test]
    fn category_filter_hides_findings() {
        let filter = CategoryFilter {
            only: HashSet::from([Category::Grammar]),
            ..CategoryFilter::default()
        };
        let diags = diagnostics("teh cat dont care", &filter);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, Some(NumberOrString::String("dont".into())));
    }

    #[test]
    fn quick_fix_replaces_range_with_suggestion() {
        let uri = Url::parse("file:///tmp/notes.txt").unwrap();
        let diags = diagnostics("teh end", &CategoryFilter::default());
        let action = quick_fix(&uri, &diags[0]).unwrap();
        assert_eq!(action.title, "Replace with 'the'");
        let changes = action.edit.unwrap().changes.unwrap();
        let edits = &changes[&uri];
        assert_eq!(edits[0].new_text, "the");
        assert_eq!(edits[0].range, diags[0].range);
    }

    #[test]
    fn foreign_diagnostics_get_no_fix() {
        let uri = Url::parse("file:///tmp/notes.txt").unwrap();
        let mut diag = diagnostics("teh end", &CategoryFilter::default()).remove(0);
        diag.source = Some("other".into());
        assert!(quick_fix(&uri, &diag).is_none());
    }

    #[test]
    fn settings_parse_client_options() {
        let value = json!({
            "configPath": "docs/redpen.yml",
            "extended": true,
            "onlyCategories": ["spelling", "tone"],
            "disableCategories": ["style"],
        });
        let settings = Settings::from_map(value.as_object().unwrap());
        assert_eq!(settings.config_path.as_deref(), Some("docs/redpen.yml"));
        assert_eq!(settings.extended, Some(true));
        assert_eq!(
            settings.only_categories,
            Some(HashSet::from([Category::Spelling]))
        );

        let mut filter = CategoryFilter::default();
        settings.update_filter(&mut filter);
        assert!(filter.allows(Category::Spelling));
        assert!(!filter.allows(Category::Grammar));
    }

    #[test]
    fn partial_settings_keep_category_filter() {
        let mut filter = CategoryFilter {
            only: HashSet::new(),
            disable: HashSet::from([Category::Style]),
        };
        let settings = Settings::from_map(json!({ "extended": true }).as_object().unwrap());
        settings.update_filter(&mut filter);
        assert!(!filter.allows(Category::Style));

        let settings =
            Settings::from_map(json!({ "disableCategories": [] }).as_object().unwrap());
        settings.update_filter(&mut filter);
        assert!(filter.allows(Category::Style));
    }
}
