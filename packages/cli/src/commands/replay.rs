use super::tree::{load, print_json, render_outline};
use crate::config::Config;
use crate::script::{run_step, Script, StepReport};
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use outline_editor::{Change, HistoryStep, MarkdownTree, NodeId};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// Markdown file to start from
    pub file: PathBuf,

    /// JSON script of steps to apply
    pub script: PathBuf,

    /// Print the resulting tree as JSON
    #[arg(long)]
    pub json: bool,

    /// Keep going after a failing step
    #[arg(long)]
    pub keep_going: bool,
}

type EventLog = Rc<RefCell<Vec<String>>>;

pub fn replay(args: ReplayArgs, config: &Config) -> Result<()> {
    let mut tree = load(&args.file, config)?;
    let content = std::fs::read_to_string(&args.script)
        .with_context(|| format!("Cannot read script {}", args.script.display()))?;
    let script: Script = serde_json::from_str(&content)
        .with_context(|| format!("Invalid script {}", args.script.display()))?;

    let events: EventLog = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    tree.set_delegate(move |tree: &MarkdownTree, node: NodeId, change: Change| {
        sink.borrow_mut().push(describe_event(tree, node, change));
    });

    println!(
        "{}",
        format!("▶ Replaying {} steps on {}", script.steps.len(), args.file.display())
            .bright_blue()
            .bold()
    );

    let mut failures = 0;
    for (index, step) in script.steps.iter().enumerate() {
        match run_step(&mut tree, step) {
            Ok(report) => println!("  {} {:>3} {}{}", "✓".green(), index, step.name(), describe_report(&report)),
            Err(e) => {
                failures += 1;
                eprintln!("  {} {:>3} {} - {}", "✗".red(), index, step.name(), e.to_string().red());
                if !args.keep_going {
                    return Err(e).with_context(|| format!("Step {index} ({}) failed", step.name()));
                }
            }
        }
        for line in events.borrow_mut().drain(..) {
            println!("        {line}");
        }
    }

    println!();
    if args.json {
        print_json(&tree)?;
    } else {
        print!("{}", render_outline(&mut tree, false)?);
    }

    if failures > 0 {
        println!("\n{} {} steps failed", "⚠️".yellow(), failures);
    }
    Ok(())
}

fn describe_report(report: &StepReport) -> String {
    match report {
        StepReport::Applied => String::new(),
        StepReport::Promoted(blocks) => format!(" (promoted to {blocks} blocks)").dimmed().to_string(),
        StepReport::History(HistoryStep::Applied { .. }) => String::new(),
        StepReport::History(HistoryStep::Empty) => " (nothing to do)".dimmed().to_string(),
        StepReport::History(HistoryStep::Blocked) => " (blocked by an edit spanning the scope)".yellow().to_string(),
    }
}

fn describe_event(tree: &MarkdownTree, node: NodeId, change: Change) -> String {
    let kind = tree
        .node(node)
        .map(|n| n.kind().as_str())
        .unwrap_or("?");
    let label = match change {
        Change::Connected => "+ connected".green(),
        Change::Disconnected => "- disconnected".red(),
        Change::Changed => "~ changed".yellow(),
    };
    format!("{label} {kind} {node}")
}
