use clap::Parser;
use weighted_tiles::render;
use weighted_tiles::solver::LayoutSolver;
use weighted_tiles::types::{Area, Configuration, CriteriaPair, Item, LayoutOptions};

#[derive(Parser)]
#[command(
    name = "weighted_tiles",
    about = "Weight-proportional 2D tile layout engine"
)]
struct Cli {
    /// Layout area dimensions (WxH, e.g. 400x300)
    #[arg(long)]
    area: String,

    /// Items as ID:WEIGHT (e.g. 1:4 2:2 3:1)
    #[arg(long = "items", num_args = 1..)]
    items: Vec<String>,

    /// Criteria pairs as NAME,NAME (default: the six built-in pairs)
    #[arg(long = "criteria", num_args = 1..)]
    criteria: Vec<String>,

    /// Maximum allowed h/w ratio per tile
    #[arg(long, default_value_t = 3.0)]
    max_ratio: f64,

    /// Per-item placement retry bound
    #[arg(long, default_value_t = 10_000)]
    max_attempts: u32,

    /// Print every ranked configuration instead of only the best
    #[arg(long)]
    all: bool,

    /// Show ASCII layout of the grid
    #[arg(long)]
    layout: bool,
}

fn parse_area(s: &str) -> Result<Area, String> {
    let parts: Vec<&str> = s.split('x').collect();
    if parts.len() != 2 {
        return Err(format!("invalid area '{}', expected WxH", s));
    }
    let width = parts[0]
        .parse::<u32>()
        .map_err(|_| format!("invalid width in '{}'", s))?;
    let height = parts[1]
        .parse::<u32>()
        .map_err(|_| format!("invalid height in '{}'", s))?;
    Ok(Area::new(width, height))
}

fn parse_item(s: &str) -> Result<Item, String> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 2 {
        return Err(format!("invalid item '{}', expected ID:WEIGHT", s));
    }
    let id = parts[0]
        .parse::<u64>()
        .map_err(|_| format!("invalid id in '{}'", s))?;
    let weight = parts[1]
        .parse::<u32>()
        .map_err(|_| format!("invalid weight in '{}'", s))?;
    Ok(Item { id, weight })
}

fn parse_pair(s: &str) -> Result<CriteriaPair, String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 2 {
        return Err(format!("invalid criteria pair '{}', expected NAME,NAME", s));
    }
    Ok([parts[0].trim().parse()?, parts[1].trim().parse()?])
}

fn print_configuration(conf: &Configuration) {
    println!(
        "Configuration {} [{}, {}]: {} empty units{}",
        conf.id,
        conf.criteria[0],
        conf.criteria[1],
        conf.empty_units,
        if conf.overflow_count > 0 {
            format!(" ({} overflowed)", conf.overflow_count)
        } else {
            String::new()
        }
    );
    for t in &conf.placed {
        println!(
            "  item {} (weight {}): ({},{})..({},{})",
            t.item.id, t.item.weight, t.x0, t.y0, t.x1, t.y1
        );
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(tracing::Level::WARN)
        .init();

    let cli = Cli::parse();

    let area = parse_area(&cli.area).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    let items: Vec<Item> = cli
        .items
        .iter()
        .map(|s| parse_item(s))
        .collect::<Result<Vec<_>, _>>()
        .unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        });

    let mut options = LayoutOptions {
        max_ratio: cli.max_ratio,
        max_attempts: cli.max_attempts,
        return_all: cli.all,
        ..LayoutOptions::default()
    };
    if !cli.criteria.is_empty() {
        options.criteria = cli
            .criteria
            .iter()
            .map(|s| parse_pair(s))
            .collect::<Result<Vec<_>, _>>()
            .unwrap_or_else(|e| {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            });
    }

    let solver = LayoutSolver::new(items, area, options);
    let layout = solver.solve().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    for conf in &layout.configurations {
        print_configuration(conf);
        if cli.layout {
            print!("{}", render::render_configuration(&layout.grid, conf));
        }
        println!();
    }

    println!(
        "Grid: {} cols x {} rows, unit side {}px, scale ratio {}",
        layout.grid.columns, layout.grid.rows, layout.grid.unit_side, layout.grid.scale_ratio,
    );
}
