use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "shelf")]
#[command(about = "Manage the shelf book inventory over its HTTP API", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API root, e.g. http://localhost:5000/api
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Work with books
    #[command(subcommand)]
    Books(BooksCommand),
}

#[derive(Subcommand, Debug)]
pub enum BooksCommand {
    /// List books, newest first
    #[command(alias = "ls")]
    List {
        /// Match title, author, isbn or genre
        #[arg(short, long)]
        search: Option<String>,

        #[arg(short, long, default_value_t = 1)]
        page: u32,

        /// Books per page (server default when omitted)
        #[arg(short, long)]
        limit: Option<u32>,
    },

    /// Show one book
    Show { id: String },

    /// Create a book from a JSON file
    Add {
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Update the fields present in a JSON file
    Update {
        id: String,

        #[arg(short, long)]
        file: PathBuf,
    },

    /// Delete a book
    #[command(alias = "rm")]
    Delete { id: String },
}
