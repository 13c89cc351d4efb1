use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use tracing::info;

use hal_map::actions;
use hal_map::filter::filter_shops;
use hal_map::store::DocumentStore;
use hal_map::{BlockPlan, BlockSummary, ProgramRegistry, Shop, ShopEdit};

use crate::config::{AppConfig, Command, CreateBlockArgs, EditArgs, ListArgs, ProgramsCommand, RenderArgs};
use crate::render::render_png;

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn format_millis(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn or_dash(s: &str) -> &str {
    if s.trim().is_empty() {
        "-"
    } else {
        s.trim()
    }
}

pub async fn run<S: DocumentStore>(store: &S, config: &AppConfig, command: Command) -> anyhow::Result<()> {
    match command {
        Command::CreateBlock(args) => create_block(store, config, args).await,
        Command::DeleteBlock { block_id } => {
            let deleted = actions::delete_block(store, &config.session, &block_id)
                .await
                .with_context(|| format!("deleting {block_id}"))?;
            println!("Deleted {deleted} shops of {}", block_id.trim());
            Ok(())
        }
        Command::Blocks => {
            let blocks = actions::list_blocks(store).await?;
            if blocks.is_empty() {
                println!("No blocks yet");
            }
            for block in &blocks {
                println!("{}", block_line(block));
            }
            Ok(())
        }
        Command::List(args) => list(store, args).await,
        Command::Stats { json } => {
            let stats = actions::shop_stats(store).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("Total shops:        {}", stats.total);
                println!("On AtlasPro:        {} ({}%)", stats.atlas, stats.rate);
                println!("Not in use:         {}", stats.inactive);
                println!("Missing details:    {}", stats.missing);
                println!("  without phone:    {}", stats.no_phone);
                println!("  without tax no:   {}", stats.no_tax);
            }
            Ok(())
        }
        Command::Edit(args) => edit(store, args).await,
        Command::Programs(cmd) => programs(store, cmd).await,
        Command::Render(args) => render(store, args).await,
    }
}

async fn create_block<S: DocumentStore>(store: &S, config: &AppConfig, args: CreateBlockArgs) -> anyhow::Result<()> {
    let plan = BlockPlan { start_no: args.start, end_no: args.end, direction: args.direction, origin: args.origin };
    let created = actions::create_block(store, &config.session, &args.points, &plan, now_ms())
        .await
        .context("creating block")?;
    info!("block {} stored", created.block_id);
    println!(
        "Created {} with {} shops ({}-{}, {}, numbered from {})",
        created.block_id,
        created.shops.len(),
        plan.start_no,
        plan.end_no,
        plan.direction,
        plan.origin
    );
    Ok(())
}

fn block_line(block: &BlockSummary) -> String {
    format!(
        "{:<24} {:<16} {:>4} shops  {}",
        block.block_id,
        block.title(),
        block.count,
        format_millis(block.created_at_ms)
    )
}

fn shop_line(shop: &Shop, programs: &ProgramRegistry) -> String {
    format!(
        "{:>5}  {:<28} {:<14} {:<16} {:<12}{}",
        or_dash(&shop.no),
        or_dash(&shop.name),
        programs.label_of(shop),
        or_dash(&shop.phone),
        or_dash(&shop.tax_no),
        if shop.inactive { "  (not in use)" } else { "" }
    )
}

async fn list<S: DocumentStore>(store: &S, args: ListArgs) -> anyhow::Result<()> {
    let shops = actions::list_shops(store).await?;
    let programs = actions::load_registry(store).await?;
    let shown = filter_shops(&shops, &args.filter, &args.query, &programs);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&shown)?);
        return Ok(());
    }
    for shop in &shown {
        println!("{}", shop_line(shop, &programs));
    }
    println!("{} of {} shops ({})", shown.len(), shops.len(), args.filter);
    Ok(())
}

async fn edit<S: DocumentStore>(store: &S, args: EditArgs) -> anyhow::Result<()> {
    let Some(current) = store.get_shop(&args.id).await? else {
        bail!("no shop with id {}", args.id);
    };
    let mut edit = ShopEdit::from_shop(&current);
    if let Some(name) = args.name {
        edit.name = name;
    }
    if let Some(no) = args.no {
        edit.no = no;
    }
    if let Some(phone) = args.phone {
        edit.phone = phone;
    }
    if let Some(tax_no) = args.tax_no {
        edit.tax_no = tax_no;
    }
    if let Some(program) = args.program {
        edit.program = program;
    }
    if let Some(inactive) = args.inactive {
        edit.inactive = inactive;
    }

    let shop = actions::edit_shop(store, &args.id, &edit, now_ms())
        .await
        .with_context(|| format!("saving {}", args.id))?;
    let programs = actions::load_registry(store).await?;
    println!("{}", shop_line(&shop, &programs));
    Ok(())
}

async fn programs<S: DocumentStore>(store: &S, cmd: ProgramsCommand) -> anyhow::Result<()> {
    match cmd {
        ProgramsCommand::List => {
            let registry = actions::load_registry(store).await?;
            for p in registry.programs() {
                println!("{:<16} {:<20} {}", p.value, p.label, p.color);
            }
        }
        ProgramsCommand::Add { value, label, color } => {
            let p = actions::add_program(store, &label, &value, &color).await?;
            println!("Added {} ({}, {})", p.value, p.label, p.color);
        }
        ProgramsCommand::Edit { value, label, color } => {
            let registry = actions::load_registry(store).await?;
            let Some(current) = registry.get(value.trim()) else {
                bail!("unknown program {:?}", value);
            };
            let label = label.unwrap_or_else(|| current.label.clone());
            let color = color.unwrap_or_else(|| current.color.clone());
            let p = actions::edit_program(store, &value, &label, &color).await?;
            println!("Updated {} ({}, {})", p.value, p.label, p.color);
        }
        ProgramsCommand::Remove { value } => {
            let p = actions::remove_program(store, &value).await?;
            println!("Removed {}", p.value);
        }
    }
    Ok(())
}

async fn render<S: DocumentStore>(store: &S, args: RenderArgs) -> anyhow::Result<()> {
    let shops = actions::list_shops(store).await?;
    let programs = actions::load_registry(store).await?;
    let shown: Vec<Shop> = filter_shops(&shops, &args.filter, "", &programs)
        .into_iter()
        .cloned()
        .collect();
    render_png(&args.output, args.width, args.height, &shown, &programs)
        .with_context(|| format!("rendering {}", args.output.display()))?;
    println!("Map with {} shops saved to {}", shown.len(), args.output.display());
    Ok(())
}
