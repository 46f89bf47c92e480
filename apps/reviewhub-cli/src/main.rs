use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use product_reviews::domain::error::DomainError;
use product_reviews::error::ProductReviewsError;
use product_reviews::model::{NewReview, NotificationId, NotificationKind, ProductQuery, ThemeMode};
use product_reviews::ProductReviews;
use runtime::{AppConfig, CliArgs};
use serde::Serialize;

/// ReviewHub - browse products, reviews and your wishlist from the terminal
#[derive(Parser)]
#[command(name = "reviewhub")]
#[command(about = "ReviewHub - browse products, reviews and your wishlist from the terminal")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend base URL (overrides config)
    #[arg(long)]
    base_url: Option<String>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check configuration
    Check,
    /// List products
    Products(ListArgs),
    /// Show one product
    Product { id: u64 },
    /// Catalog-wide statistics
    Stats(FilterArgs),
    /// List reviews of a product
    Reviews {
        product_id: u64,
        /// Only reviews with this star rating (1-5)
        #[arg(long)]
        rating: Option<u8>,
        /// Number of pages to fetch
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Post a review
    Review {
        product_id: u64,
        #[arg(long)]
        rating: u8,
        #[arg(long)]
        comment: String,
        #[arg(long)]
        name: Option<String>,
    },
    /// Toggle the helpful vote on a review
    Helpful { product_id: u64, review_id: u64 },
    /// Ask the assistant about a product's reviews
    Ask { product_id: u64, question: String },
    /// Manage the wishlist
    #[command(subcommand)]
    Wishlist(WishlistCommand),
    /// Manage notifications
    #[command(subcommand)]
    Notifications(NotificationCommand),
    /// Manage the local search history
    #[command(subcommand)]
    History(HistoryCommand),
    /// Show or change local preferences
    #[command(subcommand)]
    Prefs(PrefsCommand),
}

#[derive(Args)]
struct FilterArgs {
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    search: Option<String>,
}

#[derive(Args)]
struct ListArgs {
    #[command(flatten)]
    filter: FilterArgs,
    /// Number of pages to fetch
    #[arg(long, default_value_t = 1)]
    pages: u32,
}

#[derive(Subcommand)]
enum WishlistCommand {
    /// List wishlisted products
    List,
    /// Add products by id
    Add { ids: Vec<u64> },
    /// Remove products by id
    Remove { ids: Vec<u64> },
    /// Toggle one product
    Toggle { id: u64 },
    /// Remove everything
    Clear,
}

#[derive(Subcommand)]
enum NotificationCommand {
    List,
    /// Mark one notification as read
    Read { id: NotificationId },
    ReadAll,
    Add {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        message: String,
        #[arg(long)]
        product_id: Option<u64>,
    },
    Delete { id: NotificationId },
    Clear,
}

#[derive(Subcommand)]
enum HistoryCommand {
    List,
    Add { term: String },
    Remove { term: String },
    Clear,
}

#[derive(Subcommand)]
enum PrefsCommand {
    Show,
    Theme { mode: ThemeMode },
    Sort { sort: String },
    Grid { columns: u8 },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        base_url: cli.base_url.clone(),
        print_config: cli.print_config,
        verbose: cli.verbose,
    };

    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config.logging.as_ref().cloned().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, &config.home_dir());
    tracing::info!(base_url = %config.client.base_url, "ReviewHub CLI starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let app = ProductReviews::from_app_config(&config)?;
    run(&app, &config, command).await
}

/// Domain failures are reported with their caller-facing text.
fn user_error(e: DomainError) -> anyhow::Error {
    anyhow::Error::from(ProductReviewsError::from(e))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(app: &ProductReviews, config: &AppConfig, command: Commands) -> Result<()> {
    match command {
        Commands::Check => {
            tracing::info!("Checking configuration...");
            println!("Configuration check passed");
            println!("{}", config.to_yaml()?);
            Ok(())
        }
        Commands::Products(list) => {
            let prefs = app.preferences();
            if let Some(term) = list.filter.search.as_deref() {
                prefs.add_search_term(term).map_err(user_error)?;
            }
            let paginator = app.products(list.filter.category.as_deref(), list.filter.search.as_deref());
            let mut result = paginator.load_first().await?;
            for _ in 1..list.pages {
                if !result.has_more {
                    break;
                }
                result = paginator.load_next().await?;
            }
            let products = paginator.items();
            for product in &products {
                println!(
                    "{:>6}  {:<40} {:>9.2}  {}",
                    product.id,
                    product.name,
                    product.price,
                    product
                        .average_rating
                        .map(|r| format!("{r:.1}*"))
                        .unwrap_or_else(|| "-".to_string())
                );
            }
            println!(
                "{} of {} products (page {}{})",
                products.len(),
                result.total_elements,
                result.current_page + 1,
                if result.has_more { ", more available" } else { "" }
            );
            Ok(())
        }
        Commands::Product { id } => {
            let product = app.catalog().product(id).await.map_err(user_error)?;
            print_json(&product)
        }
        Commands::Stats(filter) => {
            let query = ProductQuery::default()
                .with_category(filter.category.as_deref())
                .with_search(filter.search.as_deref());
            let stats = app.catalog().global_stats(&query).await.map_err(user_error)?;
            print_json(&stats)
        }
        Commands::Reviews {
            product_id,
            rating,
            pages,
        } => {
            let feed = app.review_feed(product_id);
            let mut result = match rating {
                Some(_) => feed.set_rating_filter(rating).await,
                None => feed.load().await,
            }
            .map_err(user_error)?;
            for _ in 1..pages {
                if !result.has_more {
                    break;
                }
                result = feed.load_more().await.map_err(user_error)?;
            }
            let reviews = feed.items();
            for review in &reviews {
                let voted = review.id.is_some_and(|id| feed.has_voted(id));
                println!(
                    "[{}] {}* by {} ({} helpful{})",
                    review.id.map(|id| id.to_string()).unwrap_or_default(),
                    review.rating,
                    review.reviewer_name.as_deref().unwrap_or("Anonymous"),
                    review.helpful_count,
                    if voted { ", voted" } else { "" }
                );
                println!("    {}", review.comment);
            }
            println!("{} of {} reviews", reviews.len(), result.total_elements);
            Ok(())
        }
        Commands::Review {
            product_id,
            rating,
            comment,
            name,
        } => {
            let review = app
                .catalog()
                .post_review(
                    product_id,
                    NewReview {
                        reviewer_name: name,
                        rating,
                        comment,
                    },
                )
                .await
                .map_err(user_error)?;
            print_json(&review)
        }
        Commands::Helpful {
            product_id,
            review_id,
        } => {
            let feed = app.review_feed(product_id);
            feed.load().await.map_err(user_error)?;
            let review = feed.toggle_helpful(review_id).await.map_err(user_error)?;
            println!(
                "{} review {review_id} ({} helpful)",
                if feed.has_voted(review_id) { "Voted for" } else { "Removed vote from" },
                review.helpful_count
            );
            Ok(())
        }
        Commands::Ask {
            product_id,
            question,
        } => {
            let product = app.catalog().product(product_id).await.map_err(user_error)?;
            let session = app.assistant(product_id, &product.name);
            let answer = session.ask(&question).await.map_err(user_error)?;
            println!("{answer}");
            Ok(())
        }
        Commands::Wishlist(cmd) => wishlist(app, cmd).await,
        Commands::Notifications(cmd) => notifications(app, cmd).await,
        Commands::History(cmd) => {
            let prefs = app.preferences();
            match cmd {
                HistoryCommand::List => {}
                HistoryCommand::Add { term } => prefs.add_search_term(&term).map_err(user_error)?,
                HistoryCommand::Remove { term } => {
                    prefs.remove_search_term(&term).map_err(user_error)?
                }
                HistoryCommand::Clear => prefs.clear_search_history().map_err(user_error)?,
            }
            for term in prefs.search_history() {
                println!("{term}");
            }
            Ok(())
        }
        Commands::Prefs(cmd) => {
            let prefs = app.preferences();
            match cmd {
                PrefsCommand::Show => {}
                PrefsCommand::Theme { mode } => prefs.set_theme_mode(mode).map_err(user_error)?,
                PrefsCommand::Sort { sort } => prefs.set_sort_preference(&sort).map_err(user_error)?,
                PrefsCommand::Grid { columns } => {
                    prefs.set_grid_columns(columns).map_err(user_error)?
                }
            }
            print_json(&prefs.snapshot())
        }
    }
}

async fn wishlist(app: &ProductReviews, cmd: WishlistCommand) -> Result<()> {
    let wishlist = app.wishlist();
    wishlist.load().await.map_err(user_error)?;
    match cmd {
        WishlistCommand::List => {
            let page = wishlist.products_page(None).await.map_err(user_error)?;
            for product in &page.items {
                println!("{:>6}  {:<40} {:>9.2}", product.id, product.name, product.price);
            }
            println!("{} item(s) in wishlist", wishlist.count());
        }
        WishlistCommand::Add { ids } => {
            let mut products = Vec::with_capacity(ids.len());
            for id in ids {
                products.push(app.catalog().product(id).await.map_err(user_error)?);
            }
            let report = wishlist.add_multiple(&products).await.map_err(user_error)?;
            println!("{report}");
        }
        WishlistCommand::Remove { ids } => {
            let report = wishlist.remove_multiple(&ids).await.map_err(user_error)?;
            println!("{report}");
        }
        WishlistCommand::Toggle { id } => {
            let product = app.catalog().product(id).await.map_err(user_error)?;
            let added = wishlist.toggle(&product).await.map_err(user_error)?;
            println!(
                "{} {}",
                if added { "Added" } else { "Removed" },
                product.name
            );
        }
        WishlistCommand::Clear => {
            let report = wishlist.clear().await.map_err(user_error)?;
            println!("{report}");
        }
    }
    Ok(())
}

async fn notifications(app: &ProductReviews, cmd: NotificationCommand) -> Result<()> {
    let center = app.notifications();
    center.load().await.map_err(user_error)?;
    match cmd {
        NotificationCommand::List => {}
        NotificationCommand::Read { id } => center.mark_as_read(id).await.map_err(user_error)?,
        NotificationCommand::ReadAll => center.mark_all_as_read().await.map_err(user_error)?,
        NotificationCommand::Add {
            title,
            message,
            product_id,
        } => {
            center
                .add(NotificationKind::System, &title, &message, product_id)
                .await
                .map_err(user_error)?;
        }
        NotificationCommand::Delete { id } => center.delete(id).await.map_err(user_error)?,
        NotificationCommand::Clear => center.delete_all().await.map_err(user_error)?,
    }
    for n in center.items() {
        println!(
            "{} {:<10} {}  {}",
            if n.is_read { " " } else { "*" },
            n.id,
            n.created_at,
            n.title
        );
    }
    println!("{} unread", center.unread_count());
    Ok(())
}
