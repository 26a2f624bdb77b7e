use kintree::cancel::CancelToken;
use kintree::error::KintreeError;
use kintree::kb::WikidataClient;
use kintree::render::person_line;
use kintree::resolver::EntityResolver;
use kintree::search::PersonSearch;
use kintree::tree::{NodeStatus, TreeExpander, TreeNode};
use kintree::Config;
use std::sync::Arc;
use std::time::Instant;

/// Parse CLI args: first positional is the query; optional --depth <n> and
/// --pick <n> (which search hit to expand, 0-based).
fn parse_args() -> anyhow::Result<(String, Option<usize>, usize)> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut query = None;
    let mut depth = None;
    let mut pick = 0usize;
    let mut next_depth = false;
    let mut next_pick = false;
    for arg in &args {
        if next_depth {
            depth = Some(arg.parse()?);
            next_depth = false;
            continue;
        }
        if next_pick {
            pick = arg.parse()?;
            next_pick = false;
            continue;
        }
        if arg == "--depth" {
            next_depth = true;
            continue;
        }
        if arg == "--pick" {
            next_pick = true;
            continue;
        }
        if arg.starts_with("--") {
            continue;
        }
        if query.is_none() {
            query = Some(arg.clone());
        }
    }
    let query = query.ok_or_else(|| {
        anyhow::anyhow!(
            "Usage: kintree <query> [--depth <n>] [--pick <n>]\nExample: kintree \"Charlemagne\" --depth 2"
        )
    })?;
    if query.trim().is_empty() {
        anyhow::bail!("Query cannot be empty");
    }
    Ok((query, depth, pick))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logger from environment variable or default to info level
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("RUST_LOG", "info")).init();

    let config = Config::load()?;
    let (query, depth_override, pick) = parse_args()?;
    let max_depth = depth_override.unwrap_or(config.tree.max_depth);
    if max_depth > 8 {
        anyhow::bail!("--depth must be at most 8 (fetch volume grows with the branching factor)");
    }

    log::info!("Starting kintree v{}", env!("CARGO_PKG_VERSION"));

    let client = Arc::new(WikidataClient::new(
        &config.api.endpoint,
        &config.api.language,
        config.api.timeout_secs,
        &config.api.user_agent,
    ));

    let search = PersonSearch::with_limit(client.clone(), config.search.limit);
    let token = CancelToken::new();

    let search_start = Instant::now();
    let hits = match search.search(&query, &token).await {
        Ok(hits) => hits,
        Err(KintreeError::Cancelled) => return Ok(()),
        Err(e) => {
            eprintln!("Search failed: {}", e);
            std::process::exit(1);
        }
    };
    let search_duration = search_start.elapsed();

    println!("\n╔══════════════════════════════════════════════════════════════════╗");
    println!("║ Kintree                                                          ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!("\nQuery: \"{}\"\n", query);

    if hits.is_empty() {
        println!("No results found.");
        return Ok(());
    }

    for (index, hit) in hits.iter().enumerate() {
        let marker = if index == pick { ">" } else { " " };
        println!("{} [{}] {} — {}", marker, hit.id, hit.label, hit.description);
    }

    let root_hit = hits.get(pick).unwrap_or(&hits[0]);

    let resolver = Arc::new(EntityResolver::new(client));
    let expander = TreeExpander::with_max_depth(resolver.clone(), max_depth);

    let expand_start = Instant::now();
    let root = expander.expand(&root_hit.id, &token).await;
    let expand_duration = expand_start.elapsed();

    println!();
    print_root(&root);

    let stats = resolver.stats();
    println!("\n──────────────────────────────────────────────────────────────────");
    println!("Entities cached: {}", resolver.len().await);
    println!("Cache hits: {}  misses: {}", stats.hits, stats.misses);
    println!("Search latency: {:?}", search_duration);
    println!("Expansion latency: {:?}", expand_duration);

    Ok(())
}

/// Print the root node with its ancestor and descendant subtrees.
fn print_root(root: &TreeNode) {
    match &root.status {
        NodeStatus::Ready(person) => {
            println!("{}", person_line(person));
            if let Some(url) = &person.wikipedia_url {
                println!("  {}", url);
            }

            println!("\nAncestors:");
            if root.parents.is_empty() {
                println!("  (none known)");
            } else {
                print_branches(root, Direction::Ancestors, 1);
            }

            println!("\nDescendants:");
            if root.children.is_empty() {
                println!("  (none known)");
            } else {
                print_branches(root, Direction::Descendants, 1);
            }
        }
        NodeStatus::Failed(_) => println!("✗ {} — couldn't load", root.id),
        // A cancelled root is dropped silently
        NodeStatus::Cancelled | NodeStatus::Pending => {}
    }
}

#[derive(Clone, Copy)]
enum Direction {
    Ancestors,
    Descendants,
}

/// Print one direction of a node's subtree, indented by generation.
/// Failed branches render a local marker; cancelled branches are skipped.
fn print_branches(node: &TreeNode, direction: Direction, indent: usize) {
    let pad = "  ".repeat(indent);
    let (nodes, label) = match direction {
        Direction::Ancestors => (&node.parents, "ancestors"),
        Direction::Descendants => (&node.children, "descendants"),
    };

    for relative in nodes {
        match &relative.status {
            NodeStatus::Ready(person) => {
                println!("{}• {}", pad, person_line(person));
                print_branches(relative, direction, indent + 1);

                let further = match direction {
                    Direction::Ancestors => relative.parent_count().unwrap_or(0),
                    Direction::Descendants => relative.child_count().unwrap_or(0),
                };
                let expanded = match direction {
                    Direction::Ancestors => &relative.parents,
                    Direction::Descendants => &relative.children,
                };
                if expanded.is_empty() && further > 0 {
                    println!("{}  ({} further {} known)", pad, further, label);
                }
            }
            NodeStatus::Failed(_) => {
                println!("{}✗ {} — couldn't load", pad, relative.id);
            }
            NodeStatus::Cancelled | NodeStatus::Pending => {}
        }
    }
}
