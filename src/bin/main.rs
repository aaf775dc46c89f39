//! Benchmark driver for `rbtree_str`.
//!
//! Inserts `N` random keys, looks up `N` random keys, then deletes every key again, timing each
//! phase and checking the tree's black depth after every deletion.
//!
//! ```bash
//! rbtree-bench 100000
//! rbtree-bench 50 --seed 7 --print-keys --dot tree.dot --log-level trace
//! ```

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{ensure, Context, Result};
use clap::Parser;
use log::{debug, info};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rbtree_str::RbTree;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

/// Red-black tree benchmark
#[derive(Parser, Debug)]
#[command(name = "rbtree-bench", version)]
struct Args {
    /// Number of random keys to generate
    #[arg(value_name = "N")]
    count: usize,

    /// Seed for the key generator; random when omitted
    #[arg(short, long)]
    seed: Option<u64>,

    /// Print every key and the keys within ["1", "2"]
    #[arg(short, long)]
    print_keys: bool,

    /// Write the tree as a Graphviz digraph after the insert phase
    #[arg(long, value_name = "FILE")]
    dot: Option<PathBuf>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(short, long, default_value = "warn", env = "RBTREE_LOG")]
    log_level: LevelFilter,
}

fn main() -> Result<()> {
    let args = Args::parse();

    TermLogger::init(
        args.log_level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )
    .context("failed to initialize logging")?;

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let keys = generate_keys(&mut rng, args.count);
    let mut tree: RbTree<&str> = RbTree::new();
    assert!(tree.is_empty());

    // Insert ------------------------------------------------------------------

    let start = Instant::now();
    let mut duplicates = 0;

    for key in &keys {
        if tree.insert(key, key).is_err() {
            duplicates += 1;
        }
    }

    println!("Insert: {:.3} ms", millis(start.elapsed()));
    println!("Duplicate keys: {duplicates}");
    println!("Tree size: {}", tree.size());

    let black_depth = tree
        .black_depth()
        .context("tree is unbalanced after inserting")?;
    println!("Black depth: {black_depth}");
    println!("Minimum: {}", tree.minimum().unwrap_or("(none)"));
    println!("Maximum: {}", tree.maximum().unwrap_or("(none)"));

    if let Some(path) = &args.dot {
        let mut graph = String::new();
        tree.dotgraph("rbtree", &mut graph)?;
        fs::write(path, graph).with_context(|| format!("failed to write {}", path.display()))?;
        info!("wrote tree graph to {}", path.display());
    }

    // Search ------------------------------------------------------------------

    let mut lapse = Duration::ZERO;
    let mut found = 0;

    if !keys.is_empty() {
        for _ in 0..args.count {
            let key = &keys[rng.gen_range(0..keys.len())];

            let start = Instant::now();
            let value = tree.get(key);
            lapse += start.elapsed();

            if value.is_some() {
                found += 1;
            }
        }
    }

    println!("Search: {:.3} ms", millis(lapse));
    println!("Found: {found}");

    // Inorder iteration -------------------------------------------------------

    if args.print_keys {
        println!("All values:");
        for (i, key) in tree.keys().iter().enumerate() {
            println!("[{i}] = {key}");
        }

        println!("Values in [1, 2]:");
        for (i, key) in tree.range("1", "2").iter().enumerate() {
            println!("[{i}] = {key}");
        }
    }

    // Deletion ----------------------------------------------------------------

    let start = Instant::now();
    let mut missing = 0;

    for key in &keys {
        match tree.delete(key) {
            Some(value) => debug_assert_eq!(value, key.as_str()),
            None => missing += 1,
        }

        if let Err(unbalanced) = tree.black_depth() {
            anyhow::bail!("tree is unbalanced after deleting {key:?}: {unbalanced}");
        }
    }

    println!("Delete: {:.3} ms", millis(start.elapsed()));
    debug!("{missing} deletions missed");

    ensure!(missing == duplicates, "{missing} deletions missed, expected {duplicates}");
    ensure!(tree.is_empty(), "tree still holds {} keys", tree.size());

    Ok(())
}

// Generates `n` decimal keys. Collisions are possible.
fn generate_keys(rng: &mut StdRng, n: usize) -> Vec<String> {
    (0..n)
        .map(|_| rng.gen_range(0..=i32::MAX).to_string())
        .collect()
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1e3
}
