//! Command-line front end for the complaint service.
//!
//! Subcommands:
//! - `login` / `logout` / `register` / `whoami` - account session
//! - `complaints list|show|create|update` - browse and submit complaints
//! - `recent` - short preview of the latest complaints
//! - `dashboard` - complaint statistics (admins only)

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::complaints::{
    Attachment, ComplaintQuery, ComplaintUpdate, DetailState, NewComplaint,
    DEFAULT_PREVIEW_LIMIT,
};
use crate::models::{
    Complaint, ComplaintAction, ComplaintSort, ComplaintStatus, ComplaintSummary, DashboardStats,
    RegisterPayload, User, UserRole,
};
use crate::ComplaintDesk;

/// CLI arguments structure
#[derive(Parser, Debug)]
#[command(name = "complaintdesk")]
#[command(author, version, about = "Submit and track citizen complaints", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "complaintdesk.toml")]
    pub config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// API URL to connect to (overrides the config file)
    #[arg(long, env = "COMPLAINTDESK_API_URL")]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and remember the session
    Login {
        email: String,
        /// Read from stdin when not given
        #[arg(long, env = "COMPLAINTDESK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Create a new account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        /// Read from stdin when not given
        #[arg(long, env = "COMPLAINTDESK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        /// Date of birth (YYYY-MM-DD)
        #[arg(long)]
        dob: String,
        #[arg(long)]
        phone: Option<String>,
        /// CITIZEN (default) or ADMIN
        #[arg(long)]
        role: Option<UserRole>,
    },

    /// Show the logged-in account
    Whoami,

    /// Complaint commands
    #[command(subcommand)]
    Complaints(ComplaintsCommands),

    /// Show the most recent complaints
    Recent {
        #[arg(short = 'n', long, default_value_t = DEFAULT_PREVIEW_LIMIT)]
        limit: u32,
    },

    /// Show complaint statistics (admins only)
    Dashboard,
}

/// Complaints subcommands
#[derive(Subcommand, Debug)]
pub enum ComplaintsCommands {
    /// List complaints one page at a time
    List {
        /// Only show complaints with this status
        #[arg(short, long)]
        status: Option<ComplaintStatus>,
        #[arg(short, long, default_value_t = 1)]
        page: u32,
        /// Page size
        #[arg(long)]
        limit: Option<u32>,
        /// newest, oldest, title, -title, updatedAt, -updatedAt
        #[arg(long)]
        sort: Option<ComplaintSort>,
    },

    /// Show one complaint
    Show { id: String },

    /// Submit a new complaint
    Create {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Image to attach (repeatable)
        #[arg(long = "image")]
        images: Vec<PathBuf>,
    },

    /// Edit a complaint or change its status
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// START, REJECT, RESOLVE, CLOSE or REOPEN
        #[arg(long)]
        action: Option<ComplaintAction>,
        /// Attachment reference to delete (repeatable)
        #[arg(long = "remove-image")]
        remove_images: Vec<String>,
        /// Image to attach (repeatable)
        #[arg(long = "image")]
        images: Vec<PathBuf>,
    },
}

/// Run a CLI command against an already restored session.
pub async fn run_command(cli: &Cli, desk: &ComplaintDesk) -> Result<()> {
    match &cli.command {
        Commands::Login { email, password } => cmd_login(desk, email, password.as_deref()).await,
        Commands::Logout => cmd_logout(desk),
        Commands::Register {
            name,
            email,
            password,
            dob,
            phone,
            role,
        } => {
            let password = match password {
                Some(password) => password.clone(),
                None => prompt_password()?,
            };
            let payload = RegisterPayload {
                name: name.clone(),
                email: email.clone(),
                password,
                dob: dob.clone(),
                phone: phone.clone(),
                role: *role,
            };
            cmd_register(desk, &payload).await
        }
        Commands::Whoami => {
            let user = require_user(desk)?;
            print_user(&user);
            Ok(())
        }
        Commands::Complaints(sub) => match sub {
            ComplaintsCommands::List {
                status,
                page,
                limit,
                sort,
            } => {
                let query = ComplaintQuery::new()
                    .page(*page)
                    .status(*status)
                    .limit(*limit)
                    .sort(*sort);
                cmd_complaints_list(desk, query).await
            }
            ComplaintsCommands::Show { id } => cmd_complaints_show(desk, id).await,
            ComplaintsCommands::Create {
                title,
                description,
                images,
            } => cmd_complaints_create(desk, title, description, images).await,
            ComplaintsCommands::Update {
                id,
                title,
                description,
                action,
                remove_images,
                images,
            } => {
                let update = ComplaintUpdate {
                    title: title.clone(),
                    description: description.clone(),
                    action: *action,
                    remove_images: remove_images.clone(),
                    images: load_attachments(images).await?,
                };
                cmd_complaints_update(desk, id, update).await
            }
        },
        Commands::Recent { limit } => cmd_recent(desk, *limit).await,
        Commands::Dashboard => cmd_dashboard(desk).await,
    }
}

async fn cmd_login(desk: &ComplaintDesk, email: &str, password: Option<&str>) -> Result<()> {
    let password = match password {
        Some(password) => password.to_string(),
        None => prompt_password()?,
    };

    let user = desk
        .auth
        .login(email, &password)
        .await
        .map_err(|e| anyhow::anyhow!("Login failed: {}", e.user_message()))?;

    println!("Logged in as {} <{}>", user.name, user.email);
    Ok(())
}

fn cmd_logout(desk: &ComplaintDesk) -> Result<()> {
    desk.auth
        .logout()
        .map_err(|e| anyhow::anyhow!("Logout failed: {}", e))?;
    println!("Logged out.");
    Ok(())
}

async fn cmd_register(desk: &ComplaintDesk, payload: &RegisterPayload) -> Result<()> {
    let created = desk
        .auth
        .register(payload)
        .await
        .map_err(|e| anyhow::anyhow!("Registration failed: {}", e.user_message()))?;

    match created {
        Some(user) => println!("Registered {} <{}> ({})", user.name, user.email, user.role),
        None => println!("Registered {}", payload.email),
    }
    println!("Log in with: complaintdesk login {}", payload.email);
    Ok(())
}

async fn cmd_complaints_list(desk: &ComplaintDesk, query: ComplaintQuery) -> Result<()> {
    require_user(desk)?;

    let list = desk.complaint_list(query);
    list.refresh()
        .await
        .map_err(|e| anyhow::anyhow!("Could not load complaints: {}", e.user_message()))?;
    let snapshot = list.snapshot();

    if snapshot.complaints.is_empty() {
        match snapshot.status {
            Some(status) => println!("No {} complaints found.", status.label()),
            None => println!("No complaints found."),
        }
        return Ok(());
    }

    print_complaint_table(&snapshot.complaints);
    println!("Page {} / {}", snapshot.page, snapshot.total_pages);
    if snapshot.has_next() {
        println!("More: --page {}", snapshot.page + 1);
    }
    println!();
    Ok(())
}

async fn cmd_complaints_show(desk: &ComplaintDesk, id: &str) -> Result<()> {
    let user = require_user(desk)?;

    match desk.complaints.detail(id).await {
        DetailState::Loaded(complaint) => {
            print_complaint(desk, &complaint, user.role);
            Ok(())
        }
        DetailState::NotFound => anyhow::bail!("Complaint not found: {}", id),
        DetailState::Failed(message) => anyhow::bail!("Could not load complaint: {}", message),
        DetailState::Loading => Ok(()),
    }
}

async fn cmd_complaints_create(
    desk: &ComplaintDesk,
    title: &str,
    description: &str,
    images: &[PathBuf],
) -> Result<()> {
    require_user(desk)?;

    let form = NewComplaint {
        title: title.to_string(),
        description: description.to_string(),
        images: load_attachments(images).await?,
    };

    let complaint = desk
        .complaints
        .create(&form)
        .await
        .map_err(|e| anyhow::anyhow!("Could not submit complaint: {}", e.user_message()))?;

    println!("Complaint submitted: {}", complaint.id);
    println!("  Status: {}", complaint.status.label());
    if !complaint.images.is_empty() {
        println!("  Attachments: {}", complaint.images.len());
    }
    Ok(())
}

async fn cmd_complaints_update(
    desk: &ComplaintDesk,
    id: &str,
    update: ComplaintUpdate,
) -> Result<()> {
    let user = require_user(desk)?;
    if update.is_empty() {
        anyhow::bail!("Nothing to update. Pass --title, --description, --action or --image.");
    }

    let updated = desk
        .complaints
        .update(id, &update)
        .await
        .map_err(|e| anyhow::anyhow!("Could not update complaint: {}", e.user_message()))?;

    match updated {
        Some(complaint) => {
            println!("Complaint updated.");
            print_complaint(desk, &complaint, user.role);
        }
        None => println!("Complaint {} updated.", id),
    }
    Ok(())
}

async fn cmd_recent(desk: &ComplaintDesk, limit: u32) -> Result<()> {
    require_user(desk)?;

    let complaints = desk
        .complaints
        .recent(limit)
        .await
        .map_err(|e| anyhow::anyhow!("Could not load recent complaints: {}", e.user_message()))?;

    if complaints.is_empty() {
        println!("No complaints yet.");
        return Ok(());
    }
    print_complaint_table(&complaints);
    Ok(())
}

async fn cmd_dashboard(desk: &ComplaintDesk) -> Result<()> {
    require_user(desk)?;

    let stats = desk
        .complaints
        .dashboard()
        .await
        .map_err(|e| anyhow::anyhow!("Could not load dashboard: {}", e.user_message()))?;

    print_dashboard(&stats);
    Ok(())
}

/// Protected commands need a restored or fresh login.
fn require_user(desk: &ComplaintDesk) -> Result<User> {
    desk.auth
        .current_user()
        .context("Not logged in. Run `complaintdesk login <email>` first.")
}

async fn load_attachments(paths: &[PathBuf]) -> Result<Vec<Attachment>> {
    let mut attachments = Vec::with_capacity(paths.len());
    for path in paths {
        let attachment = Attachment::from_path(path)
            .await
            .with_context(|| format!("Failed to read attachment {}", path.display()))?;
        attachments.push(attachment);
    }
    Ok(attachments)
}

fn prompt_password() -> Result<String> {
    eprint!("Password: ");
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password")?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        anyhow::bail!("Password is required");
    }
    Ok(password)
}

fn print_user(user: &User) {
    println!();
    println!("Name:   {}", user.name);
    println!("Email:  {}", user.email);
    println!("Role:   {}", user.role);
    if let Some(phone) = &user.phone {
        println!("Phone:  {}", phone);
    }
    if let Some(dob) = user.dob {
        println!("Born:   {}", dob);
    }
    println!();
}

fn print_complaint_table(complaints: &[Complaint]) {
    println!();
    println!(
        "{:<24}  {:<36}  {:<12}  {:<16}",
        "ID", "TITLE", "STATUS", "CREATED"
    );
    println!("{}", "-".repeat(94));

    for complaint in complaints {
        println!(
            "{:<24}  {:<36}  {:<12}  {:<16}",
            truncate(&complaint.id, 24),
            truncate(&complaint.title, 36),
            complaint.status.label(),
            format_timestamp(complaint.created_at.as_deref()),
        );
    }
}

fn print_complaint(desk: &ComplaintDesk, complaint: &Complaint, role: UserRole) {
    println!();
    println!("=== Complaint: {} ===", complaint.title);
    println!();
    println!("ID:       {}", complaint.id);
    println!("Status:   {}", complaint.status.label());
    println!("Created:  {}", format_timestamp(complaint.created_at.as_deref()));
    println!("Updated:  {}", format_timestamp(complaint.updated_at.as_deref()));

    if !complaint.description.is_empty() {
        println!();
        println!("{}", complaint.description);
    }

    if !complaint.images.is_empty() {
        println!();
        println!("Attachments:");
        for reference in &complaint.images {
            println!("  {}", desk.complaints.client().attachment_url(reference));
        }
    }

    let actions = ComplaintAction::available(complaint.status, role);
    if !actions.is_empty() {
        println!();
        let names: Vec<&str> = actions.iter().map(|a| a.as_str()).collect();
        println!("Actions:  {}", names.join(", "));
    }
    println!();
}

fn print_dashboard(stats: &DashboardStats) {
    println!();
    println!("=== Complaint Dashboard ===");
    println!();
    println!("Total:            {}", stats.total_complaints);
    println!("Last 24h:         {}", stats.last_24h_complaints);
    println!("Completion rate:  {:.1}%", stats.completion_rate);

    println!();
    println!("By status:");
    for status in ComplaintStatus::ALL {
        println!("  {:<12} {}", status.label(), stats.count_for(status));
    }

    let aging = &stats.aging_buckets;
    println!();
    println!("Age:");
    println!("  {:<12} {}", "< 24h", aging.under_one_day);
    println!("  {:<12} {}", "1-3 days", aging.one_to_three_days);
    println!("  {:<12} {}", "3-7 days", aging.three_to_seven_days);
    println!("  {:<12} {}", "> 7 days", aging.over_seven_days);

    if !stats.complaints_per_day_7.is_empty() {
        println!();
        println!("Last 7 days:");
        for day in &stats.complaints_per_day_7 {
            println!("  {}  {}", day.date, day.count);
        }
    }

    print_summaries("Recent:", &stats.recent_complaints);
    print_summaries("Longest open:", &stats.longest_open_complaints);

    if !stats.top_users.is_empty() {
        println!();
        println!("Top submitters:");
        for entry in &stats.top_users {
            println!(
                "  {:<24} {}",
                truncate(entry.user_id.as_deref().unwrap_or("-"), 24),
                entry.count
            );
        }
    }
    println!();
}

fn print_summaries(heading: &str, complaints: &[ComplaintSummary]) {
    if complaints.is_empty() {
        return;
    }
    println!();
    println!("{}", heading);
    for complaint in complaints {
        println!(
            "  {:<24}  {:<36}  {:<12}  {}",
            truncate(&complaint.id, 24),
            truncate(&complaint.title, 36),
            complaint.status.map(|s| s.label()).unwrap_or("-"),
            format_timestamp(complaint.created_at.as_deref()),
        );
    }
}

/// Render a server timestamp as `YYYY-MM-DD HH:MM`, or the raw value if it
/// does not parse.
fn format_timestamp(value: Option<&str>) -> String {
    let Some(value) = value else {
        return "-".to_string();
    };
    if let Ok(parsed) = chrono::DateTime::parse_from_rfc3339(value) {
        return parsed.format("%Y-%m-%d %H:%M").to_string();
    }
    if let Ok(parsed) = value.parse::<chrono::NaiveDateTime>() {
        return parsed.format("%Y-%m-%d %H:%M").to_string();
    }
    value.to_string()
}

/// Truncate a string to max length with ellipsis
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
