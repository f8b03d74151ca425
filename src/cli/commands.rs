use std::fmt::Write as _;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use unicode_width::UnicodeWidthStr;

use crate::app::App;
use crate::config::AppConfig;
use crate::poi::{validate_new_tag, ChangeOrigin, EditPoiData, PoiDocument, Tag, TagList};

#[derive(Args, Debug, Clone)]
pub struct EditArgs {
    /// POI file to edit
    pub file: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    /// POI file to print
    pub file: PathBuf,
    /// Print the raw JSON document instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct NewArgs {
    /// Where to write the new POI file
    pub file: PathBuf,
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,
    #[arg(long, allow_hyphen_values = true)]
    pub lon: f64,
    /// Existing OSM node this edit modifies
    #[arg(long)]
    pub osm_id: Option<i64>,
    /// Initial tag as key=value (repeatable)
    #[arg(long = "tag", value_name = "KEY=VALUE")]
    pub tags: Vec<String>,
    #[arg(long)]
    pub comment: Option<String>,
    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum TagCommand {
    /// Append a tag (value "-" reads the value from stdin)
    Add(TagAddArgs),
    /// Change the key or value of the tag at a position
    Set(TagSetArgs),
    /// Remove the tag at a position
    Remove(TagRemoveArgs),
    /// List tags with their positions
    List(ShowArgs),
}

#[derive(Args, Debug, Clone)]
pub struct TagAddArgs {
    pub file: PathBuf,
    pub key: String,
    pub value: String,
}

#[derive(Args, Debug, Clone)]
pub struct TagSetArgs {
    pub file: PathBuf,
    /// 1-based position as printed by `tag list`
    pub index: usize,
    #[arg(long)]
    pub key: Option<String>,
    #[arg(long)]
    pub value: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct TagRemoveArgs {
    pub file: PathBuf,
    /// 1-based position as printed by `tag list`
    pub index: usize,
}

#[derive(Args, Debug, Clone)]
pub struct TagArgs {
    #[command(subcommand)]
    pub command: TagCommand,
}

pub fn edit(config: Arc<AppConfig>, args: EditArgs) -> Result<()> {
    if !args.file.exists() {
        bail!(
            "{} does not exist; create it with `poitags new {} --lat <LAT> --lon <LON>`",
            args.file.display(),
            args.file.display()
        );
    }
    let document = PoiDocument::load(&args.file)?;
    let mut app = App::new(config, args.file, document);
    app.run()
}

pub fn show(args: ShowArgs) -> Result<()> {
    let doc = PoiDocument::load(&args.file)?;
    if args.json {
        let json = serde_json::to_string_pretty(&doc).context("serialising POI document")?;
        println!("{json}");
    } else {
        print!("{}", format_tag_table(&doc));
    }
    Ok(())
}

pub fn new_document(args: NewArgs) -> Result<()> {
    let doc = build_new_document(&args)?;
    write_new_document(doc, &args.file, args.force)?;
    println!("Created {}", args.file.display());
    Ok(())
}

pub fn handle_tag_command(config: Arc<AppConfig>, args: TagArgs) -> Result<()> {
    match args.command {
        TagCommand::Add(args) => tag_add(&config, args),
        TagCommand::Set(args) => tag_set(&config, args),
        TagCommand::Remove(args) => tag_remove(args),
        TagCommand::List(args) => show(args),
    }
}

fn build_new_document(args: &NewArgs) -> Result<PoiDocument> {
    if !(-90.0..=90.0).contains(&args.lat) || !(-180.0..=180.0).contains(&args.lon) {
        bail!("coordinates out of range: {}, {}", args.lat, args.lon);
    }
    let mut doc = PoiDocument::new(args.lat, args.lon);
    if let Some(osm_id) = args.osm_id {
        doc.osm_id = Some(osm_id);
        doc.action = crate::poi::EditAction::Modify;
    }
    doc.comment = args.comment.clone();
    for raw in &args.tags {
        doc.tags.push(parse_tag_pair(raw)?);
    }
    Ok(doc)
}

fn write_new_document(mut doc: PoiDocument, path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    doc.save(path)
}

fn parse_tag_pair(raw: &str) -> Result<Tag> {
    let Some((key, value)) = raw.split_once('=') else {
        bail!("expected KEY=VALUE, got '{raw}'");
    };
    let tag = Tag::new(key.trim(), value.trim());
    validate_new_tag(&tag.key, &tag.value, &Default::default())
        .with_context(|| format!("invalid tag '{raw}'"))?;
    Ok(tag)
}

/// Loads the document, applies `f` to its tags as one host change, saves.
fn with_document_tags<F, T>(path: &Path, f: F) -> Result<T>
where
    F: FnOnce(&mut TagList) -> Result<T>,
{
    let mut doc = PoiDocument::load(path)?;
    let mut data = EditPoiData::new(TagList::from_tags(std::mem::take(&mut doc.tags)));
    let result = data.update_tags(ChangeOrigin::Host, f)?;
    doc.tags = data.tags().to_tags();
    doc.save(path)?;
    Ok(result)
}

fn tag_add(config: &AppConfig, args: TagAddArgs) -> Result<()> {
    let value = if args.value == "-" {
        read_stdin()?
            .context("value '-' needs the value piped on stdin")?
            .trim_end_matches(['\r', '\n'])
            .to_string()
    } else {
        args.value
    };
    let (key, value) = if config.editor.trim_input {
        (args.key.trim().to_string(), value.trim().to_string())
    } else {
        (args.key, value)
    };
    validate_new_tag(&key, &value, &config.editor.limits())
        .with_context(|| format!("refusing to add '{key}'"))?;

    let position = with_document_tags(&args.file, |tags| {
        tags.push(Tag::new(key.as_str(), value.as_str()));
        Ok(tags.len())
    })?;
    println!("Added {key}={value} at #{position}");
    Ok(())
}

fn tag_set(config: &AppConfig, args: TagSetArgs) -> Result<()> {
    if args.key.is_none() && args.value.is_none() {
        bail!("nothing to change: pass --key and/or --value");
    }
    let normalize = |text: &str| {
        if config.editor.trim_input {
            text.trim().to_string()
        } else {
            text.to_string()
        }
    };
    let tag = with_document_tags(&args.file, |tags| {
        let id = entry_at(tags, args.index)?;
        let current = tags.get(id).context("tag vanished while editing")?;
        let key = args.key.as_deref().map_or_else(|| current.key.clone(), normalize);
        let value = args
            .value
            .as_deref()
            .map_or_else(|| current.value.clone(), normalize);
        validate_new_tag(&key, &value, &config.editor.limits())
            .with_context(|| format!("refusing to change #{}", args.index))?;
        tags.set_key(id, &key);
        tags.set_value(id, &value);
        Ok(Tag::new(key, value))
    })?;
    println!("#{} is now {}={}", args.index, tag.key, tag.value);
    Ok(())
}

fn tag_remove(args: TagRemoveArgs) -> Result<()> {
    let removed = with_document_tags(&args.file, |tags| {
        let id = entry_at(tags, args.index)?;
        tags.remove(id).context("tag vanished while removing")
    })?;
    println!("Removed {}={}", removed.key, removed.value);
    Ok(())
}

fn entry_at(tags: &TagList, index: usize) -> Result<crate::poi::TagId> {
    if index == 0 || index > tags.len() {
        bail!("no tag at #{index} (document has {} tag(s))", tags.len());
    }
    Ok(tags.entries()[index - 1].id())
}

fn read_stdin() -> Result<Option<String>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .context("reading stdin")?;
    Ok(Some(buf))
}

fn format_tag_table(doc: &PoiDocument) -> String {
    let mut out = String::new();
    let _ = writeln!(&mut out, "{}  [{}]", doc.title(), doc.action);
    let _ = writeln!(
        &mut out,
        "edit {}  at {:.6}, {:.6}",
        doc.edit_id, doc.lat, doc.lon
    );
    if let Some(osm_id) = doc.osm_id {
        let _ = writeln!(&mut out, "osm node {osm_id}");
    }
    let saved = doc
        .modified_at
        .map(format_timestamp)
        .unwrap_or_else(|| "never".to_string());
    let _ = writeln!(&mut out, "saved {saved}");
    if doc.tags.is_empty() {
        out.push_str("(no tags)\n");
        return out;
    }

    let index_width = doc.tags.len().to_string().len();
    let key_width = doc
        .tags
        .iter()
        .map(|tag| tag.key.width())
        .max()
        .unwrap_or(0)
        .max("key".len());
    let _ = writeln!(
        &mut out,
        "{:>index_width$}  {}  value",
        "#",
        pad("key", key_width)
    );
    for (idx, tag) in doc.tags.iter().enumerate() {
        let _ = writeln!(
            &mut out,
            "{:>index_width$}  {}  {}",
            idx + 1,
            pad(&tag.key, key_width),
            tag.value
        );
    }
    out
}

fn pad(text: &str, width: usize) -> String {
    format!("{text}{}", " ".repeat(width.saturating_sub(text.width())))
}

fn format_timestamp(epoch: i64) -> String {
    OffsetDateTime::from_unix_timestamp(epoch)
        .map(|dt| dt.format(&Rfc3339).unwrap_or_else(|_| epoch.to_string()))
        .unwrap_or_else(|_| epoch.to_string())
}
