//! # CLI Layer
//!
//! This module is **one possible client** for robopedia, not the application itself.
//!
//! The CLI layer is the **only** place in the workspace that:
//! - Knows about terminal I/O (stdout, stderr)
//! - Installs a `tracing` subscriber
//! - Chooses a concrete storage backend
//! - Writes audit lines to the activity log
//!
//! ## Responsibilities
//!
//! 1. **Argument Parsing**: clap derive types in [`super::setup`]
//! 2. **Context Setup**: config, bundled dataset, backend and API
//! 3. **Dispatch**: one generic `execute` over `RobopediaApi<B>`
//! 4. **Output**: views from [`super::render`]
//! 5. **Errors**: rejections and storage failures become `anyhow` errors and exit code 1

use super::render;
use super::setup::{
    Cli, Commands, NewsCommands, NewsFields, RobotCommands, RobotFields, UserCommands,
};
use anyhow::{bail, Context, Result};
use clap::Parser;
use robopedia::api::RobopediaApi;
use robopedia::commands::{export, CmdResult};
use robopedia::config::{BackendKind, RobopediaConfig};
use robopedia::dataset::StaticDataset;
use robopedia::model::{NewsDraft, NewsPatch, RobotDraft, RobotPatch, UserDraft, UserPatch};
use robopedia::record::Record;
use robopedia::store::fallback::FallbackBackend;
use robopedia::store::firestore::FirestoreBackend;
use robopedia::store::github::GithubBackend;
use robopedia::store::local::LocalBackend;
use robopedia::store::StorageBackend;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    let dataset = build_dataset(&config)?;
    debug!("Using {} backend, data dir {}", config.backend, config.data_dir.display());

    match config.backend {
        BackendKind::Local => {
            let backend = LocalBackend::new(config.data_dir.clone());
            execute(build_api(backend, dataset, &config), cli.command)
        }
        BackendKind::Github => {
            let remote = GithubBackend::new(config.github.clone())?;
            let backend = FallbackBackend::new(remote, LocalBackend::new(config.data_dir.clone()));
            let api = build_api(backend, dataset, &config)
                .with_asset_dir(config.github.images_dir.clone());
            execute(api, cli.command)
        }
        BackendKind::Firestore => {
            let remote = FirestoreBackend::new(config.firestore.clone())?;
            let backend = FallbackBackend::new(remote, LocalBackend::new(config.data_dir.clone()));
            execute(build_api(backend, dataset, &config), cli.command)
        }
    }
}

/// Logs go to stderr so they never mix with command output.
fn init_tracing(verbose: bool) {
    let default = if verbose { "robopedia=debug" } else { "robopedia=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn load_config(explicit: Option<&Path>) -> Result<RobopediaConfig> {
    let cwd = std::env::current_dir().context("Cannot read the working directory")?;
    let mut paths: Vec<PathBuf> = Vec::new();
    if let Some(path) = explicit {
        if !path.exists() {
            bail!("Config file not found: {}", path.display());
        }
        paths.push(path.to_path_buf());
    }
    paths.extend(RobopediaConfig::search_paths(&cwd));
    RobopediaConfig::load_from(&paths).context("Invalid configuration")
}

fn build_dataset(config: &RobopediaConfig) -> Result<StaticDataset> {
    let dataset = StaticDataset::bundled().context("Bundled dataset is corrupt")?;
    Ok(match config.admin_credentials() {
        Some((email, password)) => dataset.with_admin(email, password),
        None => dataset,
    })
}

fn build_api<B: StorageBackend>(
    backend: B,
    dataset: StaticDataset,
    config: &RobopediaConfig,
) -> RobopediaApi<B> {
    RobopediaApi::new(backend, dataset).with_activity_limit(config.activity_limit)
}

fn execute<B: StorageBackend>(mut api: RobopediaApi<B>, command: Commands) -> Result<()> {
    match command {
        Commands::Robots(cmd) => robots(&mut api, cmd),
        Commands::News(cmd) => news(&mut api, cmd),
        Commands::Users(cmd) => users(&mut api, cmd),
        Commands::Export { file } => {
            let path = file.unwrap_or_else(|| PathBuf::from(export::default_file_name()));
            let result = api.export(&path)?;
            render::print_messages(&result.messages);
            audit(&api, &format!("Exported backup to {}", path.display()));
            Ok(())
        }
        Commands::Import { file } => {
            let result = api.import(&file)?;
            render::print_messages(&result.messages);
            if !result.affected.is_empty() {
                audit(&api, &format!("Imported backup from {}", file.display()));
            }
            Ok(())
        }
        Commands::Flush => {
            let result = api.flush();
            render::print_messages(&result.messages);
            if !result.persisted {
                bail!("{} collection(s) could not be saved", result.affected.len());
            }
            Ok(())
        }
        Commands::Upload { file } => {
            let bytes = std::fs::read(&file)
                .with_context(|| format!("Cannot read {}", file.display()))?;
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "upload".to_string());
            let url = api.upload_asset(&name, &bytes)?;
            println!("{}", url);
            audit(&api, &format!("Uploaded file '{}'", name));
            Ok(())
        }
        Commands::Activity { count } => {
            print!("{}", render::render_activities(&api.recent_activities(count)));
            Ok(())
        }
        Commands::Settings { key, value, remove } => settings(&api, key, value, remove),
        Commands::Ask { message } => {
            println!("{}", api.assistant_reply(&message.join(" ")));
            Ok(())
        }
    }
}

fn robots<B: StorageBackend>(api: &mut RobopediaApi<B>, cmd: RobotCommands) -> Result<()> {
    match cmd {
        RobotCommands::List { featured, category } => {
            let all = match category {
                Some(category) => api.robots_by_category(&category),
                None => api.get_all_robots(),
            };
            let shown: Vec<_> = all.into_iter().filter(|r| !featured || r.featured).collect();
            print!("{}", render::render_robot_list(&shown));
        }
        RobotCommands::Show { target } => {
            let robot = api
                .get_robot_by_id(&target)
                .or_else(|| api.get_robot_by_slug(&target));
            match robot {
                Some(robot) => print!("{}", render::render_robot_detail(&robot)),
                None => bail!("Robot not found: {}", target),
            }
        }
        RobotCommands::Create { name, fields } => {
            let result = api.create_robot(robot_draft(name, fields))?;
            report(api, &result, "Created");
        }
        RobotCommands::Update { id, name, fields } => {
            match api.update_robot(&id, robot_patch(name, fields))? {
                Some(result) => report(api, &result, "Updated"),
                None => bail!("Robot not found: {}", id),
            }
        }
        RobotCommands::Delete { id } => match api.delete_robot(&id)? {
            Some(result) => report(api, &result, "Deleted"),
            None => bail!("Robot not found: {}", id),
        },
        RobotCommands::Search { term } => {
            let result = api.search_robots(&term.join(" "));
            print!("{}", render::render_robot_list(&result.listed));
        }
    }
    Ok(())
}

fn news<B: StorageBackend>(api: &mut RobopediaApi<B>, cmd: NewsCommands) -> Result<()> {
    match cmd {
        NewsCommands::List { published, robot } => {
            let all = match robot {
                Some(robot_id) => api.news_for_robot(&robot_id),
                None if published => api.published_news(),
                None => api.get_all_news(),
            };
            let shown: Vec<_> = all
                .into_iter()
                .filter(|a| !published || a.is_published())
                .collect();
            print!("{}", render::render_news_list(&shown));
        }
        NewsCommands::Show { target } => {
            let article = api
                .get_news_by_id(&target)
                .or_else(|| api.get_news_by_slug(&target));
            match article {
                Some(article) => print!("{}", render::render_news_detail(&article)),
                None => bail!("Article not found: {}", target),
            }
        }
        NewsCommands::Create { title, fields } => {
            let result = api.create_news(news_draft(title, fields))?;
            report(api, &result, "Created");
        }
        NewsCommands::Update { id, title, fields } => {
            match api.update_news(&id, news_patch(title, fields))? {
                Some(result) => report(api, &result, "Updated"),
                None => bail!("Article not found: {}", id),
            }
        }
        NewsCommands::Delete { id } => match api.delete_news(&id)? {
            Some(result) => report(api, &result, "Deleted"),
            None => bail!("Article not found: {}", id),
        },
        NewsCommands::Search { term } => {
            let result = api.search_news(&term.join(" "));
            print!("{}", render::render_news_list(&result.listed));
        }
    }
    Ok(())
}

fn users<B: StorageBackend>(api: &mut RobopediaApi<B>, cmd: UserCommands) -> Result<()> {
    match cmd {
        UserCommands::List => print!("{}", render::render_user_list(&api.get_all_users())),
        UserCommands::Show { target } => {
            let user = api
                .get_user_by_id(&target)
                .or_else(|| api.get_user_by_email(&target));
            match user {
                Some(user) => print!("{}", render::render_user_list(&[user])),
                None => bail!("User not found: {}", target),
            }
        }
        UserCommands::Add {
            email,
            name,
            password,
            role,
        } => {
            let draft = UserDraft {
                email: Some(email),
                name: Some(name),
                password: Some(password),
                role: Some(role.into()),
                ..Default::default()
            };
            let result = api.create_user(draft)?;
            report(api, &result, "Created");
        }
        UserCommands::Update {
            id,
            email,
            name,
            password,
            role,
            status,
        } => {
            let patch = UserPatch {
                email,
                name,
                password,
                role: role.map(Into::into),
                status: status.map(Into::into),
                ..Default::default()
            };
            match api.update_user(&id, patch)? {
                Some(result) => report(api, &result, "Updated"),
                None => bail!("User not found: {}", id),
            }
        }
        UserCommands::Remove { id } => match api.delete_user(&id)? {
            Some(result) => report(api, &result, "Deleted"),
            None => bail!("User not found: {}", id),
        },
        UserCommands::Search { term } => {
            let result = api.search_users(&term.join(" "));
            print!("{}", render::render_user_list(&result.listed));
        }
        UserCommands::Login { email, password } => match api.authenticate(&email, &password) {
            Some(user) => {
                println!("Signed in as {} <{}>", user.name, user.email);
                audit(api, &format!("User '{}' signed in", user.email));
            }
            None => bail!("Invalid email or password"),
        },
    }
    Ok(())
}

fn settings<B: StorageBackend>(
    api: &RobopediaApi<B>,
    key: Option<String>,
    value: Option<String>,
    remove: bool,
) -> Result<()> {
    let Some(key) = key else {
        print!("{}", render::render_settings(&api.settings()));
        return Ok(());
    };

    if remove {
        if !api.remove_setting(&key) {
            bail!("Could not remove setting '{}'", key);
        }
        println!("Removed {}", key);
        audit(api, &format!("Removed setting '{}'", key));
        return Ok(());
    }

    match value {
        None => match api.get_setting(&key) {
            Some(current) => println!("{}", current),
            None => bail!("Setting not found: {}", key),
        },
        Some(raw) => {
            let parsed = serde_json::from_str(&raw).unwrap_or(Value::String(raw));
            if !api.set_setting(&key, parsed)? {
                bail!("Could not save setting '{}'", key);
            }
            println!("Set {}", key);
            audit(api, &format!("Changed setting '{}'", key));
        }
    }
    Ok(())
}

fn report<B: StorageBackend, T: Record>(api: &RobopediaApi<B>, result: &CmdResult<T>, verb: &str) {
    render::print_messages(&result.messages);
    if let Some(line) = result.audit_line(verb) {
        audit(api, &line);
    }
}

fn audit<B: StorageBackend>(api: &RobopediaApi<B>, line: &str) {
    if !api.record_activity(line) {
        warn!("Activity not recorded: {}", line);
    }
}

fn robot_draft(name: String, fields: RobotFields) -> RobotDraft {
    RobotDraft {
        name: Some(name),
        slug: fields.slug,
        manufacturer: fields.manufacturer,
        year: fields.year,
        category: fields.category,
        description: fields.description,
        content: fields.content,
        specifications: non_empty_map(fields.specs),
        features: non_empty(fields.features),
        tags: non_empty(fields.tags),
        main_image: fields.image,
        featured: fields.featured,
        ..Default::default()
    }
}

fn robot_patch(name: Option<String>, fields: RobotFields) -> RobotPatch {
    RobotPatch {
        name,
        slug: fields.slug,
        manufacturer: fields.manufacturer,
        year: fields.year,
        category: fields.category,
        description: fields.description,
        content: fields.content,
        specifications: non_empty_map(fields.specs),
        features: non_empty(fields.features),
        tags: non_empty(fields.tags),
        main_image: fields.image,
        featured: fields.featured,
        ..Default::default()
    }
}

fn news_draft(title: String, fields: NewsFields) -> NewsDraft {
    NewsDraft {
        title: Some(title),
        slug: fields.slug,
        author: fields.author,
        category: fields.category,
        summary: fields.summary,
        content: fields.content,
        publish_date: fields.date,
        tags: non_empty(fields.tags),
        featured_image: fields.image,
        related_robots: non_empty(fields.robots),
        status: fields.status.map(Into::into),
        ..Default::default()
    }
}

fn news_patch(title: Option<String>, fields: NewsFields) -> NewsPatch {
    NewsPatch {
        title,
        slug: fields.slug,
        author: fields.author,
        category: fields.category,
        summary: fields.summary,
        content: fields.content,
        publish_date: fields.date,
        tags: non_empty(fields.tags),
        featured_image: fields.image,
        related_robots: non_empty(fields.robots),
        status: fields.status.map(Into::into),
        ..Default::default()
    }
}

// Repeatable flags that were not given leave the field untouched.
fn non_empty(items: Vec<String>) -> Option<Vec<String>> {
    (!items.is_empty()).then_some(items)
}

fn non_empty_map(pairs: Vec<(String, String)>) -> Option<BTreeMap<String, String>> {
    (!pairs.is_empty()).then(|| pairs.into_iter().collect())
}
