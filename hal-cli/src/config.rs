use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use hal_map::{CoordGeo, Direction, NumberingOrigin, Session, ShopFilter};

pub const DEFAULT_STORE: &str = "hal-store.pb.z";

/// Operator tool for the Hal shop map.
#[derive(Parser, Debug)]
#[command(name = "hal", version, about)]
pub struct Cli {
    /// Snapshot file holding shops and programs
    #[arg(long, env = "HAL_STORE", default_value = DEFAULT_STORE, global = true)]
    pub store: PathBuf,

    /// Acting user
    #[arg(long, env = "HAL_USER", default_value = "", global = true)]
    pub user: String,

    /// Comma-separated users allowed to create and delete blocks
    #[arg(long, env = "HAL_ADMINS", value_delimiter = ',', global = true)]
    pub admins: Vec<String>,

    /// Verbosity (-v info, -vv debug, -vvv trace); RUST_LOG overrides it
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Partition a four-cornered region into numbered shops
    CreateBlock(CreateBlockArgs),
    /// Delete every shop generated for a block
    DeleteBlock {
        block_id: String,
    },
    /// List generated blocks, newest first
    Blocks,
    /// List shops ordered by number
    List(ListArgs),
    /// Print dashboard counters
    Stats {
        #[arg(long)]
        json: bool,
    },
    /// Edit one shop's details
    Edit(EditArgs),
    /// Manage the program list
    #[command(subcommand)]
    Programs(ProgramsCommand),
    /// Draw the map to a PNG file
    Render(RenderArgs),
}

#[derive(Args, Debug)]
pub struct CreateBlockArgs {
    /// Corner as LAT,LNG; give exactly four, in any order
    #[arg(long = "point", value_name = "LAT,LNG", value_parser = parse_point, required = true)]
    pub points: Vec<CoordGeo>,

    /// First shop number
    #[arg(long)]
    pub start: i64,

    /// Last shop number (inclusive)
    #[arg(long)]
    pub end: i64,

    /// horizontal (side by side) or vertical (stacked)
    #[arg(long, default_value_t = Direction::default())]
    pub direction: Direction,

    /// Corner numbering starts from: top-left or top-right
    #[arg(long, default_value_t = NumberingOrigin::default())]
    pub origin: NumberingOrigin,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// all, active, unused, unknown or program:<key>
    #[arg(long, default_value_t = ShopFilter::All)]
    pub filter: ShopFilter,

    /// Search name, number, tax number and phone
    #[arg(long, short, default_value = "")]
    pub query: String,

    #[arg(long)]
    pub json: bool,
}

/// Fields left out keep their current value.
#[derive(Args, Debug)]
pub struct EditArgs {
    pub id: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub no: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub tax_no: Option<String>,
    #[arg(long)]
    pub program: Option<String>,
    /// Mark the shop as not in use (true) or in use (false)
    #[arg(long)]
    pub inactive: Option<bool>,
}

#[derive(Subcommand, Debug)]
pub enum ProgramsCommand {
    List,
    Add {
        value: String,
        #[arg(long, default_value = "")]
        label: String,
        #[arg(long, default_value = "")]
        color: String,
    },
    /// Change a program's label or color; flags left out keep their value
    Edit {
        value: String,
        #[arg(long)]
        label: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    Remove {
        value: String,
    },
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Output PNG file path
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,

    #[arg(long, default_value_t = 1200)]
    pub width: u32,

    #[arg(long, default_value_t = 900)]
    pub height: u32,

    /// Only draw shops passing this filter
    #[arg(long, default_value_t = ShopFilter::All)]
    pub filter: ShopFilter,
}

fn parse_point(s: &str) -> Result<CoordGeo, String> {
    let (lat, lng) = s
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LNG, got '{s}'"))?;
    let lat: f64 = lat.trim().parse().map_err(|e| format!("bad latitude '{lat}': {e}"))?;
    let lng: f64 = lng.trim().parse().map_err(|e| format!("bad longitude '{lng}': {e}"))?;
    Ok(CoordGeo::new(lat, lng))
}

/// Settings resolved once from flags and environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store_path: PathBuf,
    pub session: Session,
    pub verbosity: u8,
}

impl AppConfig {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            store_path: cli.store.clone(),
            session: Session::from_admin_list(&cli.user, cli.admins.iter().map(String::as_str)),
            verbosity: cli.verbosity,
        }
    }

    /// Log filter used when RUST_LOG is not set.
    pub fn default_log_filter(&self) -> &'static str {
        match self.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
