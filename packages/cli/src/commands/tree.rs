use crate::config::Config;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use outline_editor::{MarkdownTree, NodeId};
use std::fmt::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct TreeArgs {
    /// Markdown file to parse
    pub file: PathBuf,

    /// Print the exported tree as JSON
    #[arg(long)]
    pub json: bool,

    /// Also list wiki links and tags of each content node
    #[arg(long)]
    pub links: bool,
}

pub fn tree(args: TreeArgs, config: &Config) -> Result<()> {
    let mut tree = load(&args.file, config)?;

    if args.json {
        print_json(&tree)?;
    } else {
        print!("{}", render_outline(&mut tree, args.links)?);
    }
    Ok(())
}

pub(crate) fn load(file: &Path, config: &Config) -> Result<MarkdownTree> {
    let source = std::fs::read_to_string(file)
        .with_context(|| format!("Cannot read {}", file.display()))?;
    let document = outline_parser::parse_document(&source);
    Ok(MarkdownTree::with_config(document, config.tree_config()))
}

pub(crate) fn print_json(tree: &MarkdownTree) -> Result<()> {
    let document = tree.export(tree.root())?;
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}

/// Indented one-line-per-node view of the tree
pub(crate) fn render_outline(tree: &mut MarkdownTree, links: bool) -> Result<String> {
    let mut out = String::new();
    render_node(tree, tree.root(), 0, links, &mut out)?;
    Ok(out)
}

fn render_node(tree: &mut MarkdownTree, id: NodeId, depth: usize, links: bool, out: &mut String) -> Result<()> {
    let node = tree.node(id)?;
    let kind = node.kind();
    let mut line = format!("{}{}", "  ".repeat(depth), kind.as_str().cyan());

    if let Some(marker) = node.marker() {
        write!(line, " {}", format!("{marker:?}").dimmed())?;
    }
    if let Some(checked) = node.checked() {
        line.push_str(if checked { " [x]" } else { " [ ]" });
    }
    if let Some(content) = node.content() {
        let first_line = content.lines().next().unwrap_or_default();
        write!(line, " {first_line:?}")?;
    }
    let children: Vec<NodeId> = node.children().collect();

    if links && kind.has_inline() {
        for target in tree.links(id)? {
            write!(line, " {}", format!("[[{target}]]").blue())?;
        }
        for tag in tree.tags(id)? {
            write!(line, " {}", format!("#{tag}").magenta())?;
        }
    }
    out.push_str(&line);
    out.push('\n');

    for child in children {
        render_node(tree, child, depth + 1, links, out)?;
    }
    Ok(())
}
