//! CLI command implementations.

use crate::config::{self, Config};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tangle_core::ExtractionBatch;
use tangle_graph::{
    ingest_batch, load_index, AdjacencyIndex, Connection, GroupBy, SledStore,
    TraversalDirection, TreeNode,
};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Resolved settings shared by every command.
pub struct Context {
    pub config: Config,
    pub json: bool,
}

impl Context {
    fn open_store(&self) -> Result<SledStore> {
        Ok(SledStore::open(&self.config.store_path)?)
    }

    fn index(&self) -> Result<AdjacencyIndex> {
        let store = self.open_store()?;
        Ok(load_index(&store, self.config.edge_kind)?)
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Initialize Tangle in a directory.
///
/// Later commands pick the config up from that directory or any
/// directory below it.
pub fn init(ctx: &Context, path: &Path) -> Result<()> {
    let config_path = config::local_path(path);
    let created = !config_path.exists();

    if created {
        Config::default().write(&config_path)?;
    }
    let store_path = Config::read(&config_path)?.store_path;

    if ctx.json {
        return print_json(&serde_json::json!({
            "config": config_path,
            "store": store_path,
            "created": created,
        }));
    }

    if !created {
        println!("{} Already initialized", "✓".green());
        return Ok(());
    }
    println!("{} Initialized Tangle in {}", "✓".green(), path.display());
    println!("  {} {}", "Store:".dimmed(), store_path.display());
    println!("  Run {} to load an extraction batch", "tangle load <batch.json>".cyan());

    Ok(())
}

/// Load an extraction batch into the store.
pub fn load(ctx: &Context, batch_path: &Path, append: bool) -> Result<()> {
    let batch = ExtractionBatch::from_path(batch_path)?;
    let total = batch.nodes.len() + batch.edges.len();
    let mut store = ctx.open_store()?;

    let bar = if ctx.json {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(total as u64)
    };
    bar.set_style(
        ProgressStyle::default_bar().template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} facts")?,
    );

    let report = ingest_batch(&mut store, batch, !append, |written| {
        bar.set_position(written as u64)
    })?;
    bar.finish_and_clear();

    if ctx.json {
        return print_json(&report);
    }

    println!(
        "{} Loaded {} nodes ({} new) and {} edges ({} new)",
        "✓".green(),
        (report.nodes_created + report.nodes_updated).to_string().cyan(),
        report.nodes_created,
        (report.edges_created + report.edges_updated).to_string().cyan(),
        report.edges_created
    );
    if report.unresolved > 0 {
        println!(
            "{} {} unresolved imports (see {})",
            "⚠".yellow(),
            report.unresolved,
            "tangle deps <id>".cyan()
        );
    }

    Ok(())
}

/// Show store status and graph statistics.
pub fn status(ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let index = load_index(&store, ctx.config.edge_kind)?;
    let stats = index.stats();

    if ctx.json {
        return print_json(&stats);
    }

    println!("{}", "Tangle Status".cyan().bold());
    println!();
    println!("  {} {}", "Store:".dimmed(), ctx.config.store_path.display());
    println!("  {} {}", "Edge kind:".dimmed(), ctx.config.edge_kind);
    println!("  {} {}", "Nodes:".dimmed(), stats.node_count);
    println!("  {} {}", "Edges:".dimmed(), stats.edge_count);
    println!("  {} {}", "Placeholders:".dimmed(), stats.placeholders);
    println!("  {} {}", "Isolated:".dimmed(), stats.isolated);
    println!("  {} {}", "Cycles:".dimmed(), stats.cycles);
    println!("  {} {}", "Unresolved:".dimmed(), stats.unresolved);
    println!(
        "  {} {:.2}",
        "Avg dependencies:".dimmed(),
        stats.average_dependencies
    );

    Ok(())
}

/// Show direct dependencies and dependents of a node.
pub fn deps(ctx: &Context, id: &str) -> Result<()> {
    let index = ctx.index()?;

    if ctx.json {
        let dependents: Vec<&str> = index.dependents(id).iter().map(|n| n.id.as_str()).collect();
        return print_json(&serde_json::json!({
            "id": id,
            "found": index.contains(id),
            "imports": index.imports_of(id),
            "unresolved": index.unresolved_of(id),
            "dependents": dependents,
        }));
    }

    if !index.contains(id) {
        println!("No node \"{}\"", id);
        return Ok(());
    }

    let imports = index.imports_of(id);
    println!("{} {}", "Imports".cyan().bold(), format!("({})", imports.len()).dimmed());
    for import in &imports {
        let subtype = import.subtype.map(|s| s.to_string()).unwrap_or_default();
        println!("  {} {}", import.target, subtype.dimmed());
    }

    let unresolved = index.unresolved_of(id);
    if !unresolved.is_empty() {
        println!();
        println!(
            "{} {}",
            "Unresolved".yellow().bold(),
            format!("({})", unresolved.len()).dimmed()
        );
        for specifier in unresolved {
            println!("  {}", specifier);
        }
    }

    let dependents = index.dependents(id);
    println!();
    println!(
        "{} {}",
        "Imported by".cyan().bold(),
        format!("({})", dependents.len()).dimmed()
    );
    for node in dependents {
        println!("  {}", node.id);
    }

    Ok(())
}

/// Search nodes by id or name.
pub fn find(ctx: &Context, query: &str, limit: Option<usize>) -> Result<()> {
    let index = ctx.index()?;
    let limit = limit.unwrap_or(ctx.config.limit);
    let matches: Vec<_> = index.search(query).into_iter().take(limit).collect();

    if ctx.json {
        return print_json(&matches);
    }

    if matches.is_empty() {
        println!("No matches found for \"{}\"", query);
        return Ok(());
    }

    println!("Found {} matches:\n", matches.len());
    for node in matches {
        let marker = if node.placeholder { " (placeholder)" } else { "" };
        println!(
            "  {} {}{}",
            node.kind.to_string().yellow(),
            node.id.cyan(),
            marker.dimmed()
        );
    }

    Ok(())
}

/// Walk the dependency chain from a node.
pub fn chain(ctx: &Context, id: &str, upstream: bool, depth: Option<usize>) -> Result<()> {
    let index = ctx.index()?;
    let direction = if upstream {
        TraversalDirection::Upstream
    } else {
        TraversalDirection::Downstream
    };
    let chain = index.chain(id, direction, depth.unwrap_or(ctx.config.depth));

    if ctx.json {
        return print_json(&chain);
    }

    let heading = match direction {
        TraversalDirection::Upstream => "Dependents of",
        TraversalDirection::Downstream => "Dependencies of",
    };
    println!("{} {}", heading.cyan().bold(), id);
    if chain.is_empty() {
        println!("  {}", "nothing within reach".dimmed());
        return Ok(());
    }

    for (depth, ids) in &chain.levels {
        println!("  {}", format!("depth {}", depth).yellow());
        for id in ids {
            println!("    {}", id);
        }
    }
    println!();
    println!("  {} {}", "Total:".dimmed(), chain.total());

    Ok(())
}

/// Check whether two nodes are connected.
pub fn connect(ctx: &Context, a: &str, b: &str, max_hops: Option<usize>) -> Result<()> {
    let index = ctx.index()?;
    let connection = index.connect(a, b, max_hops.unwrap_or(ctx.config.max_hops));

    if ctx.json {
        return print_json(&connection);
    }

    match &connection {
        Connection::Direct { direction } => {
            println!("{} Direct ({})", "✓".green(), direction);
        }
        Connection::Indirect {
            direction,
            path,
            hops,
        } => {
            println!("{} Indirect, {} hops ({})", "✓".green(), hops, direction);
            println!("  {}", path.join(" → "));
        }
        Connection::None => {
            println!("{} Not connected", "✗".red());
        }
    }

    Ok(())
}

/// Rank the most imported (or most importing) nodes.
pub fn top(ctx: &Context, limit: Option<usize>, outgoing: bool) -> Result<()> {
    let index = ctx.index()?;
    let limit = limit.unwrap_or(ctx.config.limit);
    let ranked = if outgoing {
        index.most_dependencies(limit)
    } else {
        index.most_referenced(limit)
    };

    if ctx.json {
        return print_json(&ranked);
    }

    let heading = if outgoing {
        "Most dependencies"
    } else {
        "Most referenced"
    };
    println!("{}", heading.cyan().bold());
    for (rank, node) in ranked.iter().enumerate() {
        println!(
            "  {:>3}. {} {}",
            rank + 1,
            node.id,
            format!("({})", node.count).dimmed()
        );
    }

    Ok(())
}

/// List nodes with no edges at all.
pub fn isolated(ctx: &Context) -> Result<()> {
    let index = ctx.index()?;
    let isolated = index.isolated();

    if ctx.json {
        return print_json(&isolated);
    }

    if isolated.is_empty() {
        println!("{} No isolated nodes", "✓".green());
        return Ok(());
    }
    println!("{} {} isolated nodes:", "⚠".yellow(), isolated.len());
    for id in isolated {
        println!("  {}", id);
    }

    Ok(())
}

/// Group nodes by directory and show cross-group coupling.
pub fn clusters(ctx: &Context, limit: Option<usize>, by: Option<GroupBy>) -> Result<()> {
    let index = ctx.index()?;
    let key = by.unwrap_or(ctx.config.group_by);
    let report = index.clusters(&key, limit.unwrap_or(ctx.config.limit));

    if ctx.json {
        return print_json(&report);
    }

    println!(
        "{} {}",
        "Groups".cyan().bold(),
        format!("({} total, {} ungrouped nodes)", report.total_groups, report.ungrouped).dimmed()
    );
    for group in &report.groups {
        println!("  {:>5}  {}", group.nodes, group.group);
    }

    println!();
    println!("{}", "Cross-group imports".cyan().bold());
    if report.couplings.is_empty() {
        println!("  {}", "none".dimmed());
    }
    for coupling in &report.couplings {
        println!(
            "  {:>5}  {} → {}",
            coupling.edges, coupling.from, coupling.to
        );
    }

    Ok(())
}

/// Print the dependency tree of a node.
pub fn tree(ctx: &Context, id: &str, depth: Option<usize>) -> Result<()> {
    let index = ctx.index()?;
    let tree = index.render_tree(id, depth.unwrap_or(ctx.config.depth));

    if ctx.json {
        return print_json(&tree);
    }

    match tree {
        Some(tree) => {
            print!("{}", render_tree_text(&tree));
            if tree.cycle_markers() > 0 {
                println!();
                println!(
                    "{} {} circular references",
                    "⚠".yellow(),
                    tree.cycle_markers()
                );
            }
        }
        None => println!("No node \"{}\"", id),
    }

    Ok(())
}

/// Renders a tree with box-drawing connectors, one node per line.
pub fn render_tree_text(root: &TreeNode) -> String {
    let mut out = format!("{}\n", root.id);
    for (i, child) in root.children.iter().enumerate() {
        write_branch(child, "", i + 1 == root.children.len(), &mut out);
    }
    out
}

fn write_branch(node: &TreeNode, prefix: &str, last: bool, out: &mut String) {
    let connector = if last { "└── " } else { "├── " };
    let suffix = if node.cyclic {
        " (circular)"
    } else if node.truncated {
        " …"
    } else {
        ""
    };
    out.push_str(&format!("{}{}{}{}\n", prefix, connector, node.id, suffix));

    let child_prefix = format!("{}{}", prefix, if last { "    " } else { "│   " });
    for (i, child) in node.children.iter().enumerate() {
        write_branch(child, &child_prefix, i + 1 == node.children.len(), out);
    }
}

/// List circular dependencies.
pub fn cycles(ctx: &Context) -> Result<()> {
    let index = ctx.index()?;
    let cycles = index.cycles();

    if ctx.json {
        return print_json(&cycles);
    }

    if cycles.is_empty() {
        println!("{} No circular dependencies", "✓".green());
        return Ok(());
    }
    println!("{} {} circular dependencies:", "⚠".yellow(), cycles.len());
    for cycle in &cycles {
        println!("  {}", cycle.nodes.join(" ↔ "));
    }

    Ok(())
}

/// Export a size-bounded graph for visualization.
pub fn project(
    ctx: &Context,
    max_nodes: Option<usize>,
    all: bool,
    output: Option<&Path>,
) -> Result<()> {
    let index = ctx.index()?;
    let bound = if all {
        None
    } else {
        Some(max_nodes.unwrap_or(ctx.config.max_nodes))
    };
    let projection = index.project(bound);
    let json = serde_json::to_string_pretty(&projection)?;

    match output {
        Some(path) => {
            fs::write(path, json)?;
            println!(
                "{} Exported {} of {} nodes to {}",
                "✓".green(),
                projection.nodes.len(),
                projection.total_nodes,
                path.display()
            );
        }
        None => println!("{}", json),
    }

    Ok(())
}
