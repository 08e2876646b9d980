//! # Emoji Art CLI
//!
//! Command-line host for an Emoji Art document.
//!
//! ## Usage
//!
//! ```bash
//! emoji-art show
//! emoji-art add 🌵 --x -40 --y 25 --size 60
//! emoji-art background --url https://example.com/desert.png
//! emoji-art drop --text "🎈 balloon" --x 120 --y 80 --zoom 2
//! ```
//!
//! Every command opens the document, applies at most one edit, waits for the
//! background to settle, writes pending changes and prints the resulting
//! state as JSON on stdout. Logs go to stderr.
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `DocumentConfig` - Built from `CliArgs`, environment fallbacks via clap
//! - `run` / `execute` - Drive a `DocumentController` for one command

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use emoji_art_core::{
    Background, DropAction, DropPayload, ElementId, Mutation, PaletteStore, Point, Size, Viewport,
};
use emoji_art_document::{DocumentConfig, DocumentController, DocumentState};
use serde_json::{json, Value};
use url::Url;

/// On-screen size of a dropped emoji at 100% zoom.
pub const DEFAULT_EMOJI_SIZE: f64 = 40.0;

/// File holding user palettes, next to the document.
pub const PALETTE_FILE_NAME: &str = "palettes.json";

/// Command-line arguments for emoji-art.
#[derive(Debug, Clone, Parser)]
#[command(name = "emoji-art")]
#[command(about = "Edit an emoji art document from the command line")]
#[command(version)]
pub struct CliArgs {
    /// Directory holding the document
    #[arg(long, env = "EMOJI_ART_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Document file name inside the data directory
    #[arg(long, default_value = emoji_art_document::config::DEFAULT_FILE_NAME)]
    pub file: String,

    /// Quiet period before edits are written, in milliseconds
    #[arg(long, env = "EMOJI_ART_AUTOSAVE_MS")]
    pub autosave_ms: Option<u64>,

    /// Timeout for background downloads, in seconds
    #[arg(long, env = "EMOJI_ART_FETCH_TIMEOUT_SECS")]
    pub fetch_timeout_secs: Option<u64>,

    /// What to do
    #[command(subcommand)]
    pub command: Command,
}

/// Document commands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print the document
    Show,

    /// Place an emoji at canvas coordinates
    #[command(allow_negative_numbers = true)]
    Add {
        /// A single emoji
        emoji: String,
        /// Horizontal canvas position
        #[arg(long, default_value_t = 0)]
        x: i32,
        /// Vertical canvas position
        #[arg(long, default_value_t = 0)]
        y: i32,
        /// Nominal size
        #[arg(long, default_value_t = 40)]
        size: i64,
    },

    /// Move an emoji by canvas deltas
    #[command(allow_negative_numbers = true)]
    Move {
        /// Element id
        id: ElementId,
        /// Horizontal delta
        dx: i32,
        /// Vertical delta
        dy: i32,
    },

    /// Scale an emoji
    Scale {
        /// Element id
        id: ElementId,
        /// Positive scale factor
        factor: f64,
    },

    /// Remove an emoji
    Remove {
        /// Element id
        id: ElementId,
    },

    /// Replace the background
    Background(BackgroundArgs),

    /// Drop content onto the view, as a drag-and-drop would
    Drop(DropArgs),

    /// Print the zoom that fits the background into a view
    Fit(ViewArgs),

    /// List emoji palettes
    Palettes {
        /// Add a palette before listing
        #[arg(long, num_args = 2, value_names = ["NAME", "EMOJIS"])]
        add: Option<Vec<String>>,
    },
}

/// Background source; exactly one must be given.
#[derive(Debug, Clone, Args)]
#[group(required = true, multiple = false)]
pub struct BackgroundArgs {
    /// Image URL (search-engine image links are unwrapped)
    #[arg(long)]
    pub url: Option<Url>,

    /// Local image embedded into the document
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Remove the background
    #[arg(long)]
    pub blank: bool,
}

impl BackgroundArgs {
    async fn background(&self) -> anyhow::Result<Background> {
        if let Some(url) = &self.url {
            return Ok(Background::remote(url.clone()));
        }
        if let Some(path) = &self.file {
            let bytes = read_file(path).await?;
            return Ok(Background::InlineData(bytes));
        }
        Ok(Background::Blank)
    }
}

/// Content dropped at a view position.
#[derive(Debug, Clone, Args)]
#[command(allow_negative_numbers = true)]
pub struct DropArgs {
    /// Dropped link
    #[arg(long)]
    pub url: Option<Url>,

    /// Dropped image file
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Dropped text; its first emoji is placed
    #[arg(long)]
    pub text: Option<String>,

    /// Horizontal view position
    #[arg(long, default_value_t = 400.0)]
    pub x: f64,

    /// Vertical view position
    #[arg(long, default_value_t = 300.0)]
    pub y: f64,

    /// View the drop happens in
    #[command(flatten)]
    pub view: ViewArgs,
}

impl DropArgs {
    async fn payloads(&self) -> anyhow::Result<Vec<DropPayload>> {
        let mut payloads = Vec::new();
        if let Some(url) = &self.url {
            payloads.push(DropPayload::Url(url.clone()));
        }
        if let Some(path) = &self.image {
            payloads.push(DropPayload::ImageData(read_file(path).await?));
        }
        if let Some(text) = &self.text {
            payloads.push(DropPayload::Text(text.clone()));
        }
        Ok(payloads)
    }
}

/// View geometry.
#[derive(Debug, Clone, Copy, Args)]
pub struct ViewArgs {
    /// View width in points
    #[arg(long, default_value_t = 800.0)]
    pub view_width: f64,

    /// View height in points
    #[arg(long, default_value_t = 600.0)]
    pub view_height: f64,

    /// Zoom scale of the view
    #[arg(long, default_value_t = 1.0)]
    pub zoom: f64,
}

impl ViewArgs {
    fn size(self) -> Size {
        Size::new(self.view_width, self.view_height)
    }

    fn viewport(self) -> Viewport {
        let mut viewport = Viewport::new();
        viewport.end_pinch(self.zoom);
        viewport
    }
}

impl From<&CliArgs> for DocumentConfig {
    fn from(args: &CliArgs) -> Self {
        let defaults = Self::default();
        Self {
            data_dir: args.data_dir.clone().unwrap_or(defaults.data_dir),
            file_name: args.file.clone(),
            autosave_interval: args
                .autosave_ms
                .map_or(defaults.autosave_interval, Duration::from_millis),
            fetch_timeout: args.fetch_timeout_secs.map(Duration::from_secs),
            ..defaults
        }
    }
}

/// Run one command against the configured document and return its output.
///
/// # Errors
///
/// Returns an error if the document cannot be opened or written, or if the
/// command is rejected.
pub async fn run(args: &CliArgs) -> anyhow::Result<Value> {
    let config = DocumentConfig::from(args);

    if let Command::Palettes { add } = &args.command {
        return palettes(&config.data_dir.join(PALETTE_FILE_NAME), add.as_deref()).await;
    }

    tracing::debug!("Opening {}", config.document_path().display());
    let doc = DocumentController::open(&config)
        .await
        .context("failed to start document")?;
    let output = execute(&doc, &args.command).await;
    let flushed = doc.flush().await;
    doc.shutdown().await?;
    flushed.context("failed to write document")?;
    output
}

/// Apply `command` to an open document.
///
/// # Errors
///
/// Returns an error if the command is rejected by the document model or an
/// input file cannot be read.
pub async fn execute(doc: &DocumentController, command: &Command) -> anyhow::Result<Value> {
    match command {
        Command::Show => {}
        Command::Add { emoji, x, y, size } => submit(
            doc,
            Mutation::Add {
                text: emoji.clone(),
                at: (*x, *y),
                size: *size,
            },
        )?,
        Command::Move { id, dx, dy } => submit(
            doc,
            Mutation::Move {
                id: *id,
                dx: *dx,
                dy: *dy,
            },
        )?,
        Command::Scale { id, factor } => submit(
            doc,
            Mutation::Resize {
                id: *id,
                factor: *factor,
            },
        )?,
        Command::Remove { id } => submit(doc, Mutation::Remove { id: *id })?,
        Command::Background(args) => submit(
            doc,
            Mutation::SetBackground {
                background: args.background().await?,
            },
        )?,
        Command::Drop(args) => {
            let payloads = args.payloads().await?;
            let action =
                DropPayload::classify(&payloads).context("nothing usable in the dropped content")?;
            submit(doc, drop_mutation(action, args))?;
        }
        Command::Fit(view) => return fit(doc, *view).await,
        Command::Palettes { .. } => anyhow::bail!("palettes are not part of the document"),
    }

    let state = doc.wait_for_fetch().await?;
    Ok(summary(&state))
}

/// Turn a classified drop into an edit at the drop location.
#[must_use]
pub fn drop_mutation(action: DropAction, args: &DropArgs) -> Mutation {
    match action {
        DropAction::SetBackground(background) => Mutation::SetBackground { background },
        DropAction::AddEmoji(text) => {
            let viewport = args.view.viewport();
            let at = viewport
                .transform(args.view.size())
                .to_canvas(Point::new(args.x, args.y));
            Mutation::Add {
                text,
                at,
                size: viewport.default_emoji_size(DEFAULT_EMOJI_SIZE),
            }
        }
    }
}

/// Validate against the current snapshot, then queue the edit.
fn submit(doc: &DocumentController, mutation: Mutation) -> anyhow::Result<()> {
    mutation.apply(&doc.canvas()).context("edit rejected")?;
    doc.apply(mutation);
    Ok(())
}

async fn fit(doc: &DocumentController, view: ViewArgs) -> anyhow::Result<Value> {
    let state = doc.wait_for_fetch().await?;
    let image = state
        .image
        .as_ref()
        .context("document has no background image")?;
    let mut viewport = view.viewport();
    viewport.zoom_to_fit(image.size(), view.size());
    Ok(json!({
        "image": { "width": image.width, "height": image.height },
        "view": { "width": view.view_width, "height": view.view_height },
        "zoom": viewport.zoom_scale(),
    }))
}

async fn palettes(path: &Path, add: Option<&[String]>) -> anyhow::Result<Value> {
    let mut store = match tokio::fs::read(path).await {
        Ok(bytes) => PaletteStore::from_json(&bytes)
            .with_context(|| format!("unreadable palettes in {}", path.display()))?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => PaletteStore::new("Default"),
        Err(e) => return Err(e).with_context(|| format!("failed to read {}", path.display())),
    };

    if let Some([name, emojis]) = add {
        let index = store.insert_palette(name, emojis, 0);
        tracing::info!("Added palette {name:?} at {index}");
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::write(path, store.to_json()?)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    Ok(json!({
        "name": store.name,
        "palettes": store.palettes(),
    }))
}

async fn read_file(path: &Path) -> anyhow::Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))
}

/// JSON summary of a document state.
#[must_use]
pub fn summary(state: &DocumentState) -> Value {
    let background = state.canvas.background();
    json!({
        "revision": state.revision,
        "background": {
            "kind": background.variant_name(),
            "url": background.url(),
        },
        "fetch": state.status,
        "image": state.image.as_ref().map(|i| json!({ "width": i.width, "height": i.height })),
        "elements": state.canvas.elements(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use emoji_art_document::{FetchError, ImageSource, MemoryStore};
    use std::sync::Arc;

    struct OfflineSource;

    #[async_trait]
    impl ImageSource for OfflineSource {
        async fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
            Err(FetchError::UnsupportedScheme(url.scheme().to_string()))
        }
    }

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(std::iter::once("emoji-art").chain(args.iter().copied()))
            .expect("parse")
    }

    async fn open() -> DocumentController {
        DocumentController::open_with(
            Arc::new(MemoryStore::new()),
            Arc::new(OfflineSource),
            Duration::from_secs(600),
        )
        .await
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut out = std::io::Cursor::new(Vec::new());
        image::RgbaImage::new(width, height)
            .write_to(&mut out, image::ImageFormat::Png)
            .expect("encode");
        out.into_inner()
    }

    #[test]
    fn test_config_from_args() {
        let args = parse(&[
            "--data-dir",
            "/tmp/art",
            "--file",
            "doc.json",
            "--autosave-ms",
            "250",
            "show",
        ]);
        let config = DocumentConfig::from(&args);
        assert_eq!(config.document_path(), PathBuf::from("/tmp/art/doc.json"));
        assert_eq!(config.autosave_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_negative_coordinates_parse() {
        let args = parse(&["add", "🌵", "--x", "-40", "--y", "-5"]);
        assert!(matches!(
            args.command,
            Command::Add { x: -40, y: -5, size: 40, .. }
        ));
    }

    #[test]
    fn test_background_requires_one_source() {
        assert!(CliArgs::try_parse_from(["emoji-art", "background"]).is_err());
        assert!(CliArgs::try_parse_from([
            "emoji-art",
            "background",
            "--blank",
            "--url",
            "https://example.com/a.png"
        ])
        .is_err());
    }

    #[tokio::test]
    async fn test_add_then_summary() {
        let doc = open().await;
        let args = parse(&["add", "🌵", "--x", "10", "--y", "-20", "--size", "48"]);
        let out = execute(&doc, &args.command).await.expect("execute");

        let elements = out["elements"].as_array().expect("elements");
        assert_eq!(elements.len(), 3);
        assert_eq!(elements[2]["text"], "🌵");
        assert_eq!(elements[2]["y"], -20);
        assert_eq!(out["background"]["kind"], "blank");
        assert_eq!(out["fetch"]["status"], "idle");
    }

    #[tokio::test]
    async fn test_rejected_edit_is_an_error() {
        let doc = open().await;
        let args = parse(&["add", "not emoji"]);
        assert!(execute(&doc, &args.command).await.is_err());

        let missing = ElementId::new().to_string();
        let args = parse(&["scale", &missing, "2"]);
        assert!(execute(&doc, &args.command).await.is_err());
        assert_eq!(doc.canvas().len(), 2);
    }

    #[tokio::test]
    async fn test_drop_text_lands_under_the_pointer() {
        let doc = open().await;
        let args = parse(&[
            "drop", "--text", "🎈 party", "--x", "500", "--y", "250", "--zoom", "2",
        ]);
        let out = execute(&doc, &args.command).await.expect("execute");

        let balloon = &out["elements"][2];
        assert_eq!(balloon["text"], "🎈");
        assert_eq!((balloon["x"].clone(), balloon["y"].clone()), (json!(50), json!(-25)));
        assert_eq!(balloon["size"], 20);
    }

    #[tokio::test]
    async fn test_file_background_and_fit() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("bg.png");
        std::fs::write(&file, png(400, 100)).expect("write");

        let doc = open().await;
        let path = file.to_str().expect("utf-8 path");
        let out = execute(&doc, &parse(&["background", "--file", path]).command)
            .await
            .expect("execute");
        assert_eq!(out["background"]["kind"], "inline_data");
        assert_eq!(out["image"]["width"], 400);

        let out = execute(&doc, &parse(&["fit"]).command).await.expect("fit");
        assert_eq!(out["zoom"], 2.0);
    }

    #[tokio::test]
    async fn test_unreachable_background_reports_failure() {
        let doc = open().await;
        let args = parse(&["background", "--url", "gopher://example.com/a.png"]);
        let out = execute(&doc, &args.command).await.expect("execute");
        assert_eq!(out["fetch"]["status"], "failed");
        assert_eq!(out["fetch"]["url"], "gopher://example.com/a.png");
        assert!(out["image"].is_null());
    }

    #[tokio::test]
    async fn test_palettes_persist_additions() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(PALETTE_FILE_NAME);

        let out = palettes(&path, None).await.expect("list");
        assert_eq!(out["palettes"][0]["name"], "Vehicles");
        assert!(!path.exists());

        let add = ["Desert".to_string(), "🌵🐪🌵".to_string()];
        palettes(&path, Some(&add)).await.expect("add");
        let out = palettes(&path, None).await.expect("list");
        assert_eq!(out["palettes"][0]["name"], "Desert");
        assert_eq!(out["palettes"][0]["emojis"], "🌵🐪");
    }
}
