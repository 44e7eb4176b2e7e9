use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use robopedia::model::{NewsStatus, UserRole, UserStatus};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "robopedia",
    bin_name = "robopedia",
    version,
    disable_help_subcommand = true,
    after_help = "Backend and credentials come from robopedia.toml or ROBOPEDIA_* variables.\nRun with RUST_LOG=robopedia=debug for storage traces."
)]
#[command(about = "Manage the records of the robotics encyclopedia", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,

    /// Config file, read before the default locations
    #[arg(long, global = true, value_name = "FILE", help_heading = "Options")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Browse and edit robots
    #[command(subcommand)]
    Robots(RobotCommands),

    /// Browse and edit news articles
    #[command(subcommand)]
    News(NewsCommands),

    /// Manage admin panel accounts
    #[command(subcommand)]
    Users(UserCommands),

    /// Write a backup of every collection (gzip when the name ends in .gz)
    Export {
        /// Target file [default: robopedia-backup-<date>.json]
        file: Option<PathBuf>,
    },

    /// Restore a backup written by `export`
    Import { file: PathBuf },

    /// Retry saves that failed earlier in this session
    Flush,

    /// Store an image or document with the configured backend
    Upload { file: PathBuf },

    /// Show the most recent admin actions
    Activity {
        #[arg(short = 'n', long, default_value_t = 20)]
        count: usize,
    },

    /// Read or change site settings
    Settings {
        /// Setting to read or write; all settings when omitted
        key: Option<String>,

        /// New value (JSON, or a plain string)
        value: Option<String>,

        /// Remove the setting instead
        #[arg(long, requires = "key", conflicts_with = "value")]
        remove: bool,
    },

    /// Ask the site assistant
    Ask {
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum RobotCommands {
    /// List robots (bundled and custom)
    #[command(alias = "ls")]
    List {
        /// Only featured robots
        #[arg(long)]
        featured: bool,

        /// Only robots in this category
        #[arg(long)]
        category: Option<String>,
    },

    /// Show one robot by id or slug
    #[command(alias = "view")]
    Show { target: String },

    /// Add a robot
    #[command(alias = "new")]
    Create {
        #[arg(long)]
        name: String,

        #[command(flatten)]
        fields: RobotFields,
    },

    /// Change fields of a robot
    Update {
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        fields: RobotFields,
    },

    /// Delete a robot
    #[command(alias = "rm")]
    Delete { id: String },

    /// Search names, manufacturers, descriptions and tags
    Search {
        #[arg(num_args = 0..)]
        term: Vec<String>,
    },
}

#[derive(Args, Debug, Default)]
pub struct RobotFields {
    #[arg(long)]
    pub slug: Option<String>,

    #[arg(long)]
    pub manufacturer: Option<String>,

    #[arg(long)]
    pub year: Option<i32>,

    #[arg(long)]
    pub category: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub content: Option<String>,

    /// Specification entry, repeatable (e.g. --spec "height=1.5 m")
    #[arg(long = "spec", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub specs: Vec<(String, String)>,

    /// Feature, repeatable
    #[arg(long = "feature")]
    pub features: Vec<String>,

    /// Tag, repeatable
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Path or URL of the main image
    #[arg(long)]
    pub image: Option<String>,

    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub featured: Option<bool>,
}

#[derive(Subcommand, Debug)]
pub enum NewsCommands {
    /// List articles, newest first
    #[command(alias = "ls")]
    List {
        /// Only published articles
        #[arg(long)]
        published: bool,

        /// Only articles about this robot id
        #[arg(long)]
        robot: Option<String>,
    },

    /// Show one article by id or slug
    #[command(alias = "view")]
    Show { target: String },

    /// Add an article
    #[command(alias = "new")]
    Create {
        #[arg(long)]
        title: String,

        #[command(flatten)]
        fields: NewsFields,
    },

    /// Change fields of an article
    Update {
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[command(flatten)]
        fields: NewsFields,
    },

    /// Delete an article
    #[command(alias = "rm")]
    Delete { id: String },

    /// Search titles, summaries, authors and tags
    Search {
        #[arg(num_args = 0..)]
        term: Vec<String>,
    },
}

#[derive(Args, Debug, Default)]
pub struct NewsFields {
    #[arg(long)]
    pub slug: Option<String>,

    #[arg(long)]
    pub author: Option<String>,

    #[arg(long)]
    pub category: Option<String>,

    #[arg(long)]
    pub summary: Option<String>,

    #[arg(long)]
    pub content: Option<String>,

    /// Publish date, YYYY-MM-DD or RFC 3339
    #[arg(long, value_parser = parse_date)]
    pub date: Option<DateTime<Utc>>,

    /// Tag, repeatable
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Path or URL of the featured image
    #[arg(long)]
    pub image: Option<String>,

    /// Related robot id, repeatable
    #[arg(long = "robot")]
    pub robots: Vec<String>,

    #[arg(long, value_enum)]
    pub status: Option<StatusArg>,
}

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// List accounts
    #[command(alias = "ls")]
    List,

    /// Show one account by id or email
    Show { target: String },

    /// Add an account
    #[command(alias = "create")]
    Add {
        #[arg(long)]
        email: String,

        #[arg(long)]
        name: String,

        #[arg(long, env = "ROBOPEDIA_USER_PASSWORD", hide_env_values = true)]
        password: String,

        #[arg(long, value_enum, default_value_t = RoleArg::User)]
        role: RoleArg,
    },

    /// Change fields of an account
    Update {
        id: String,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        password: Option<String>,

        #[arg(long, value_enum)]
        role: Option<RoleArg>,

        #[arg(long, value_enum)]
        status: Option<UserStatusArg>,
    },

    /// Remove an account
    #[command(alias = "rm")]
    Remove { id: String },

    /// Search names and emails
    Search {
        #[arg(num_args = 0..)]
        term: Vec<String>,
    },

    /// Check a password and record the login
    Login {
        #[arg(long)]
        email: String,

        #[arg(long, env = "ROBOPEDIA_USER_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    Draft,
    Published,
}

impl From<StatusArg> for NewsStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Draft => NewsStatus::Draft,
            StatusArg::Published => NewsStatus::Published,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum RoleArg {
    Admin,
    User,
}

impl From<RoleArg> for UserRole {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Admin => UserRole::Admin,
            RoleArg::User => UserRole::User,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum UserStatusArg {
    Active,
    Inactive,
    Pending,
}

impl From<UserStatusArg> for UserStatus {
    fn from(arg: UserStatusArg) -> Self {
        match arg {
            UserStatusArg::Active => UserStatus::Active,
            UserStatusArg::Inactive => UserStatus::Inactive,
            UserStatusArg::Pending => UserStatus::Pending,
        }
    }
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{}'", raw)),
    }
}

fn parse_date(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("expected YYYY-MM-DD or an RFC 3339 timestamp, got '{}'", raw))
}
