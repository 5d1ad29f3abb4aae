//! mtree - parse, validate and inspect markdown syntax trees
//!
//! Usage:
//!   mtree [COMMAND] [OPTIONS] [FILE]
//!
//! Commands:
//!   parse     Print the syntax tree (default)
//!   validate  Check the document for diagnostics
//!   stats     Count node kinds

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser as ClapParser, Subcommand};
use marktree_core::{Node, Options, ParseResult, Parser};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, ClapParser)]
#[command(name = "mtree", version, about = "Markdown syntax tree inspector")]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    input: Input,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the syntax tree
    Parse(Input),
    /// Check the document for diagnostics
    Validate(Input),
    /// Count node kinds
    Stats(Input),
}

#[derive(Debug, Clone, Args)]
struct Input {
    /// Markdown file to read; stdin when omitted
    file: Option<PathBuf>,

    /// Enable GitHub flavored markdown (default)
    #[arg(long, overrides_with = "no_gfm")]
    gfm: bool,

    /// Disable GitHub flavored markdown
    #[arg(long = "no-gfm", overrides_with = "gfm")]
    no_gfm: bool,

    /// Follow CommonMark where it differs
    #[arg(long)]
    commonmark: bool,

    /// Mimic markdown.pl quirks
    #[arg(long)]
    pedantic: bool,

    /// Parse footnotes
    #[arg(long)]
    footnotes: bool,

    /// Do not parse YAML front matter
    #[arg(long = "no-yaml")]
    no_yaml: bool,

    /// Treat every line ending in a paragraph as a break
    #[arg(long)]
    breaks: bool,

    /// Drop positional information from the output
    #[arg(long = "no-position")]
    no_position: bool,

    /// Options as a JSON object, applied after the flags
    #[arg(long, value_name = "JSON")]
    options: Option<String>,

    /// Output JSON
    #[arg(short, long)]
    json: bool,

    /// Show positions in the outline and log at debug level
    #[arg(short, long)]
    verbose: bool,
}

impl Input {
    fn parser_options(&self) -> Result<Options> {
        let options = Options::default()
            .gfm(self.gfm || !self.no_gfm)
            .commonmark(self.commonmark)
            .pedantic(self.pedantic)
            .footnotes(self.footnotes)
            .yaml(!self.no_yaml)
            .breaks(self.breaks)
            .position(!self.no_position);

        match &self.options {
            None => Ok(options),
            Some(raw) => {
                let value: serde_json::Value =
                    serde_json::from_str(raw).context("`--options` is not valid JSON")?;
                Ok(options.merge_json(&value)?)
            }
        }
    }

    fn read(&self) -> Result<String> {
        match &self.file {
            Some(path) => fs::read_to_string(path)
                .with_context(|| format!("failed to read '{}'", path.display())),
            None => {
                let mut input = String::new();
                io::stdin()
                    .read_to_string(&mut input)
                    .context("failed to read stdin")?;
                Ok(input)
            }
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let (command, input) = match cli.command {
        None => (CommandKind::Parse, cli.input),
        Some(Command::Parse(input)) => (CommandKind::Parse, input),
        Some(Command::Validate(input)) => (CommandKind::Validate, input),
        Some(Command::Stats(input)) => (CommandKind::Stats, input),
    };

    init_logging(input.verbose);

    if let Err(e) = run(command, &input) {
        eprintln!("error: {:#}", e);
        process::exit(1);
    }
}

#[derive(Debug, Clone, Copy)]
enum CommandKind {
    Parse,
    Validate,
    Stats,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(command: CommandKind, input: &Input) -> Result<()> {
    let options = input.parser_options()?;
    let source = input.read()?;
    debug!(?command, bytes = source.len(), "read input");

    let mut parser = Parser::new(options);
    let result = parser.parse_with_recovery(&source);

    match command {
        CommandKind::Parse => cmd_parse(&result, input),
        CommandKind::Validate => cmd_validate(&result, input),
        CommandKind::Stats => cmd_stats(&result, &source, input),
    }
}

// =============================================================================
// Parse Command
// =============================================================================

fn cmd_parse(result: &ParseResult, input: &Input) -> Result<()> {
    for message in result.messages.iter() {
        eprintln!("warning: {}", message);
    }

    if input.json {
        let json = serde_json::to_string_pretty(&result.root).context("failed to serialize tree")?;
        println!("{}", json);
    } else {
        let mut out = String::new();
        write_outline(&result.root, 0, input.verbose, &mut out);
        print!("{}", out);
    }

    Ok(())
}

fn write_outline(node: &Node, depth: usize, verbose: bool, out: &mut String) {
    out.push_str(&"  ".repeat(depth));
    out.push_str(node.kind());

    match node {
        Node::Heading(heading) => out.push_str(&format!(" depth={}", heading.depth)),
        Node::List(list) => {
            out.push_str(&format!(" ordered={} loose={}", list.ordered, list.loose));
            if let Some(start) = list.start {
                out.push_str(&format!(" start={}", start));
            }
        }
        Node::ListItem(item) => {
            out.push_str(&format!(" loose={}", item.loose));
            if let Some(checked) = item.checked {
                out.push_str(&format!(" checked={}", checked));
            }
        }
        Node::Code(code) => {
            if let Some(lang) = &code.lang {
                out.push_str(&format!(" lang={}", lang));
            }
        }
        Node::Definition(definition) => {
            out.push_str(&format!(" [{}] {}", definition.identifier, definition.url));
        }
        Node::Link(link) => out.push_str(&format!(" {}", link.url)),
        Node::Image(image) => out.push_str(&format!(" {}", image.url)),
        Node::LinkReference(reference) => out.push_str(&format!(" [{}]", reference.identifier)),
        Node::ImageReference(reference) => out.push_str(&format!(" [{}]", reference.identifier)),
        Node::FootnoteReference(reference) => {
            out.push_str(&format!(" [^{}]", reference.identifier))
        }
        Node::FootnoteDefinition(definition) => {
            out.push_str(&format!(" [^{}]", definition.identifier))
        }
        _ => {}
    }

    if let Some(value) = node.value() {
        out.push_str(&format!(" {:?}", value));
    }

    if verbose {
        if let Some(position) = node.position() {
            out.push_str(&format!(
                " ({}:{}-{}:{})",
                position.start.line, position.start.column, position.end.line, position.end.column
            ));
        }
    }
    out.push('\n');

    for child in node.children().unwrap_or_default() {
        write_outline(child, depth + 1, verbose, out);
    }
}

// =============================================================================
// Validate Command
// =============================================================================

fn cmd_validate(result: &ParseResult, input: &Input) -> Result<()> {
    let fatal = result.has_fatal_errors();

    if input.json {
        let messages: Vec<_> = result
            .messages
            .iter()
            .map(|m| {
                serde_json::json!({
                    "message": m.message,
                    "position": m.position,
                    "fatal": m.fatal,
                })
            })
            .collect();
        println!("{}", serde_json::json!({"valid": !fatal, "messages": messages}));
    } else if result.messages.is_empty() {
        println!("Valid: no diagnostics");
    } else {
        for message in result.messages.iter() {
            let label = if message.fatal { "error" } else { "warning" };
            eprintln!("  - {}: {}", label, message);
        }
    }

    if fatal {
        bail!("document failed to parse");
    }
    Ok(())
}

// =============================================================================
// Stats Command
// =============================================================================

fn cmd_stats(result: &ParseResult, source: &str, input: &Input) -> Result<()> {
    let stats = DocumentStats::from_tree(&result.root, source);

    if input.json {
        println!(
            "{}",
            serde_json::json!({
                "nodes": stats.nodes,
                "kinds": stats.kinds,
                "chars": stats.chars,
                "lines": stats.lines,
                "messages": result.messages.len(),
            })
        );
        return Ok(());
    }

    println!("Document Statistics");
    println!("-------------------");
    println!("Nodes:          {}", stats.nodes);
    for (kind, count) in &stats.kinds {
        println!("  {:<16}{}", kind, count);
    }
    println!();
    println!("Size:");
    println!("  Characters:     {}", stats.chars);
    println!("  Lines:          {}", stats.lines);
    println!();
    println!("Diagnostics:    {}", result.messages.len());

    Ok(())
}

struct DocumentStats {
    nodes: usize,
    kinds: BTreeMap<&'static str, usize>,
    chars: usize,
    lines: usize,
}

impl DocumentStats {
    fn from_tree(root: &Node, source: &str) -> Self {
        let mut stats = Self {
            nodes: 0,
            kinds: BTreeMap::new(),
            chars: source.chars().count(),
            lines: source.lines().count(),
        };

        root.walk(&mut |node| {
            stats.nodes += 1;
            *stats.kinds.entry(node.kind()).or_insert(0) += 1;
        });
        stats
    }
}
