//! CLI entry point for daybook

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use daybook::commands::{self, list::ListKind, PostInput};
use daybook::{server, Daybook};

#[derive(Parser)]
#[command(name = "daybook")]
#[command(version)]
#[command(about = "A personal blog with one post a day, drafts and scheduled posts", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Post fields shared by new, edit and preview
#[derive(Args)]
struct PostArgs {
    /// Post title
    #[arg(short, long)]
    title: Option<String>,

    /// Post markup
    #[arg(short = 'm', long)]
    content: Option<String>,

    /// Read markup from a file (`-` for stdin)
    #[arg(short, long, conflicts_with = "content")]
    file: Option<PathBuf>,

    /// Attach an image file; repeat for more
    #[arg(short, long = "image")]
    images: Vec<PathBuf>,

    /// Publish on this local date (YYYY-MM-DD) instead of now
    #[arg(long)]
    date: Option<String>,

    /// Local publish time (HH:MM), 09:00 when only a date is given
    #[arg(long)]
    time: Option<String>,
}

impl From<PostArgs> for PostInput {
    fn from(args: PostArgs) -> Self {
        PostInput {
            title: args.title,
            content: args.content,
            file: args.file,
            images: args.images,
            date: args.date,
            time: args.time,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new site
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        folder: PathBuf,
    },

    /// Write a new post (published now unless --date or --draft is given)
    New {
        #[command(flatten)]
        post: PostArgs,

        /// Save as a draft
        #[arg(long, conflicts_with_all = ["date", "time"])]
        draft: bool,
    },

    /// Edit a draft, scheduled post or published post
    Edit {
        /// Id of the entry
        id: String,

        #[command(flatten)]
        post: PostArgs,

        /// Publish a draft or scheduled post now
        #[arg(long)]
        publish: bool,
    },

    /// Delete a post, draft or scheduled post
    Delete {
        /// Id of the entry
        id: String,
    },

    /// List published posts
    #[command(alias = "ls")]
    List,

    /// List drafts
    Drafts,

    /// List scheduled posts
    Scheduled,

    /// Render a preview without saving
    Preview {
        /// Start from a stored entry
        id: Option<String>,

        #[command(flatten)]
        post: PostArgs,

        /// Output file (defaults to public/preview.html)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Publish scheduled posts that are due
    Promote,

    /// Import posts from an older JSON export
    Import {
        /// Date-keyed map or {"posts": [...]} document
        file: PathBuf,
    },

    /// Generate static files
    #[command(alias = "g")]
    Generate,

    /// Start a local server
    #[command(alias = "s")]
    Server {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,

        /// Open browser automatically
        #[arg(short, long)]
        open: bool,
    },

    /// Clean the public folder
    Clean,

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "daybook=debug,info"
    } else {
        "daybook=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir().context("Cannot determine current directory")?,
    };

    match cli.command {
        Commands::Init { folder } => {
            let target_dir = if folder.is_absolute() {
                folder
            } else {
                base_dir.join(folder)
            };
            tracing::info!("Initializing site in {:?}", target_dir);
            commands::init::init_site(&target_dir)?;
            println!("Initialized empty Daybook site in {:?}", target_dir);
        }

        Commands::New { post, draft } => {
            let daybook = Daybook::new(&base_dir)?;
            commands::new::run(&daybook, &post.into(), draft)?;
        }

        Commands::Edit { id, post, publish } => {
            let daybook = Daybook::new(&base_dir)?;
            commands::edit::run(&daybook, &id, &post.into(), publish)?;
        }

        Commands::Delete { id } => {
            let daybook = Daybook::new(&base_dir)?;
            commands::delete::run(&daybook, &id)?;
        }

        Commands::List => {
            let daybook = Daybook::new(&base_dir)?;
            commands::list::run(&daybook, ListKind::Posts)?;
        }

        Commands::Drafts => {
            let daybook = Daybook::new(&base_dir)?;
            commands::list::run(&daybook, ListKind::Drafts)?;
        }

        Commands::Scheduled => {
            let daybook = Daybook::new(&base_dir)?;
            commands::list::run(&daybook, ListKind::Scheduled)?;
        }

        Commands::Preview { id, post, output } => {
            let daybook = Daybook::new(&base_dir)?;
            commands::preview::run(&daybook, id.as_deref(), &post.into(), output)?;
        }

        Commands::Promote => {
            let daybook = Daybook::new(&base_dir)?;
            commands::promote::run(&daybook)?;
        }

        Commands::Import { file } => {
            let daybook = Daybook::new(&base_dir)?;
            commands::import::run(&daybook, &file)?;
        }

        Commands::Generate => {
            let daybook = Daybook::new(&base_dir)?;
            tracing::info!("Generating static files...");
            daybook.generate()?;
            println!("Generated successfully!");
        }

        Commands::Server { port, ip, open } => {
            let daybook = Daybook::new(&base_dir)?;
            tracing::info!("Starting server at http://{}:{}", ip, port);
            server::start(&daybook, &ip, port, open).await?;
        }

        Commands::Clean => {
            let daybook = Daybook::new(&base_dir)?;
            tracing::info!("Cleaning public folder...");
            daybook.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::Version => {
            println!("daybook version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
