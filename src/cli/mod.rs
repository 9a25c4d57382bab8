//! CLI module for the ShikshaVani terminal client.
//!
//! Every screen of the web client has a subcommand counterpart:
//! - `status` / `logout` / `open <path>` - Session inspection and routing
//! - `student ...` - Registration, class selection, subjects and feedback
//! - `faculty ...` - Profile, dashboard summary, classes, subjects,
//!   received feedback and the students roster
//! - `config check` - Validate configuration file
//!
//! Commands that map to a protected view run the route guard first, so a
//! command either works or says where to go instead.

pub mod format;

use anyhow::{anyhow, bail, Context as _, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use tracing::warn;

use crate::api::ApiResponse;
use crate::config::Config;
use crate::flows::auth::{AuthFlow, LoginForm, RegisterForm};
use crate::flows::classes::ClassesFlow;
use crate::flows::faculty::{ClassFilter, DashboardSummary, FeedbackReview, RosterFilter, StudentsRoster};
use crate::flows::feedback::{FeedbackForm, MyFeedback};
use crate::flows::profile::{FacultyProfileFlow, StudentProfileFlow};
use crate::flows::subjects::SubjectsFlow;
use crate::flows::{FlowError, FlowResult, ViewScope};
use crate::guard::{landing_route, navigate, DashboardTab, GuardDecision, Route};
use crate::session::Identity;
use crate::App;
use format::{format_date, format_utc_to_local, stars, truncate};

/// CLI arguments structure
#[derive(Parser, Debug)]
#[command(name = "shikshavani")]
#[command(author, version, about = "Terminal client for the ShikshaVani student feedback platform", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "shikshavani.toml")]
    pub config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Backend URL (overrides [api] base_url)
    #[arg(long, env = "SHIKSHAVANI_API_URL")]
    pub api_url: Option<String>,

    /// Session file (overrides [session] file)
    #[arg(long, env = "SHIKSHAVANI_SESSION_FILE")]
    pub session_file: Option<PathBuf>,

    /// Print results as {success, data, error} JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show who is signed in and where they land
    Status,

    /// Sign out and erase the stored session
    Logout,

    /// Check whether the current session may open a web route
    Open {
        /// Route path, e.g. /main or /faculty/dashboard/classes
        path: String,
    },

    /// Student commands
    #[command(subcommand)]
    Student(StudentCommands),

    /// Faculty commands
    #[command(subcommand)]
    Faculty(FacultyCommands),

    /// Configuration management commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
pub enum StudentCommands {
    /// Create a student account
    Register(RegisterArgs),

    /// Sign in as a student
    Login(LoginArgs),

    /// List faculties to choose from
    Faculties,

    /// List a faculty's classes
    Classes {
        /// Faculty ID
        faculty: i64,
    },

    /// Choose your faculty and class
    Setup {
        #[arg(long)]
        faculty: i64,
        #[arg(long)]
        class: i64,
    },

    /// List the subjects of your class
    Subjects,

    /// Rate a subject
    Submit {
        /// Subject ID
        #[arg(long)]
        subject: i64,
        /// 1 to 5
        #[arg(long)]
        rating: u8,
        #[arg(long)]
        message: String,
    },

    /// Show the feedback you have given
    Feedback,
}

#[derive(Subcommand, Debug)]
pub enum FacultyCommands {
    /// Create a faculty account
    Register(RegisterArgs),

    /// Sign in as faculty
    Login(LoginArgs),

    /// Set the name and email students see
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },

    /// Class, subject and feedback counts
    Summary,

    /// Manage classes
    #[command(subcommand)]
    Classes(ClassCommands),

    /// Manage subjects
    #[command(subcommand)]
    Subjects(SubjectCommands),

    /// Feedback received on your subjects
    Feedbacks,

    /// Students enrolled in your classes
    Students {
        /// Match against name or email
        #[arg(long, default_value = "")]
        search: String,
        /// Class name, or "all"
        #[arg(long, default_value = "all")]
        class: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ClassCommands {
    List,
    Add {
        name: String,
    },
    Rename {
        id: i64,
        name: String,
    },
    Delete {
        id: i64,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum SubjectCommands {
    List {
        /// Class ID (defaults to your first class)
        #[arg(long)]
        class: Option<i64>,
    },
    Add {
        name: String,
        #[arg(long)]
        class: Option<i64>,
    },
    Rename {
        id: i64,
        name: String,
        #[arg(long)]
        class: Option<i64>,
        /// Move the subject to this class
        #[arg(long)]
        to_class: Option<i64>,
    },
    Delete {
        id: i64,
        #[arg(long)]
        class: Option<i64>,
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Validate configuration file
    Check,
}

#[derive(clap::Args, Debug)]
pub struct LoginArgs {
    #[arg(long)]
    pub email: String,
    #[arg(long, env = "SHIKSHAVANI_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(clap::Args, Debug)]
pub struct RegisterArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long, env = "SHIKSHAVANI_PASSWORD", hide_env_values = true)]
    pub password: String,
    /// Defaults to --password
    #[arg(long)]
    pub confirm_password: Option<String>,
}

impl RegisterArgs {
    fn form(&self) -> RegisterForm {
        RegisterForm {
            name: self.name.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
            confirm_password: self
                .confirm_password
                .clone()
                .unwrap_or_else(|| self.password.clone()),
        }
    }
}

/// What a command runs against
struct Context {
    app: App,
    config: Config,
    scope: ViewScope,
    json: bool,
}

impl Context {
    fn new(config: Config, json: bool) -> Result<Self> {
        let app = App::from_config(&config)?;
        Ok(Self {
            app,
            config,
            scope: ViewScope::new(),
            json,
        })
    }

    /// Run the route guard for the view a command stands in for
    fn enter(&self, route: Route) -> Result<()> {
        match navigate(&self.app.session.state(), route) {
            GuardDecision::Allow => Ok(()),
            GuardDecision::Wait => bail!("Session is still being restored, try again"),
            GuardDecision::Redirect(to) => bail!(
                "Cannot open {}: continue at {} instead (run `{}`)",
                route,
                to,
                command_for(to)
            ),
        }
    }

    /// Print a flow result: JSON envelope or human output
    fn emit<T: Serialize>(&self, result: FlowResult<T>, render: impl FnOnce(&T)) -> Result<()> {
        if self.json {
            let failed = result.is_err();
            let response = ApiResponse::from(result);
            println!("{}", serde_json::to_string_pretty(&response)?);
            if failed {
                bail!("Request failed");
            }
            return Ok(());
        }

        let value = result.map_err(report)?;
        render(&value);
        Ok(())
    }
}

/// Turn a flow error into a readable message; validation failures list
/// every field.
fn report(err: FlowError) -> anyhow::Error {
    match &err {
        FlowError::Validation(errors) if errors.len() > 1 => {
            let lines: Vec<String> = errors
                .iter()
                .map(|(field, message)| format!("  {}: {}", field, message))
                .collect();
            anyhow!("Please fix the following:\n{}", lines.join("\n"))
        }
        _ => anyhow::Error::new(err),
    }
}

fn command_for(route: Route) -> &'static str {
    match route {
        Route::StudentLogin => "shikshavani student login",
        Route::StudentRegister => "shikshavani student register",
        Route::SelectFacultyClass => "shikshavani student setup --faculty <ID> --class <ID>",
        Route::StudentMain => "shikshavani student subjects",
        Route::FacultyLogin => "shikshavani faculty login",
        Route::FacultyRegister => "shikshavani faculty register",
        Route::FacultyProfileSetup => "shikshavani faculty profile --name <NAME> --email <EMAIL>",
        Route::FacultyDashboard(_) => "shikshavani faculty summary",
        Route::Home => "shikshavani status",
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin()
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Run the CLI command
pub async fn run_command(cli: &Cli, mut config: Config) -> Result<()> {
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }
    if let Some(file) = &cli.session_file {
        config.session.file = Some(file.clone());
    }

    if let Commands::Config(ConfigCommands::Check) = &cli.command {
        return cmd_config_check(cli, &config);
    }

    let ctx = Context::new(config, cli.json)?;

    // Ctrl+C drops whatever request is in flight
    let scope = ctx.scope.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted");
            scope.cancel();
        }
    });

    match &cli.command {
        Commands::Status => cmd_status(&ctx),
        Commands::Logout => cmd_logout(&ctx),
        Commands::Open { path } => cmd_open(&ctx, path),
        Commands::Student(command) => run_student(&ctx, command).await,
        Commands::Faculty(command) => run_faculty(&ctx, command).await,
        Commands::Config(ConfigCommands::Check) => Ok(()),
    }
}

// -------------------------------------------------------------------------
// Session commands
// -------------------------------------------------------------------------

fn cmd_status(ctx: &Context) -> Result<()> {
    let state = ctx.app.session.state();

    if ctx.json {
        let data = state.session().map(|session| {
            serde_json::json!({
                "role": session.identity.role(),
                "name": session.identity.name(),
                "email": session.identity.email(),
                "fully_registered": session.fully_registered,
                "landing": landing_route(session).path(),
            })
        });
        let response = ApiResponse::<Option<serde_json::Value>>::from(Ok::<_, FlowError>(data));
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    println!();
    println!("=== ShikshaVani ===");
    println!();
    println!("Server:     {}", ctx.config.api.base_url);
    println!("Session:    {}", ctx.config.session.path().display());
    println!();

    match state.session() {
        None => {
            println!("Not signed in.");
            println!();
            println!("Students: {}", command_for(Route::StudentLogin));
            println!("Faculty:  {}", command_for(Route::FacultyLogin));
        }
        Some(session) => {
            let registered = if session.fully_registered {
                "[OK] Complete"
            } else {
                "[!!] Incomplete"
            };
            println!("Role:       {}", session.identity.role());
            println!("Name:       {}", session.identity.name());
            println!("Email:      {}", session.identity.email());
            println!("Profile:    {}", registered);
            if let Identity::Student(student) = &session.identity {
                if let (Some(faculty_id), Some(class_id)) = (student.faculty_id, student.class_id) {
                    println!("Class:      {} (faculty {})", class_id, faculty_id);
                }
            }
            let landing = landing_route(session);
            println!();
            println!("Home view:  {}", landing);
            println!("Next:       {}", command_for(landing));
        }
    }

    println!();
    Ok(())
}

fn cmd_logout(ctx: &Context) -> Result<()> {
    let was_signed_in = ctx.app.session.state().session().is_some();
    AuthFlow::new(ctx.app.api.clone()).logout();
    ctx.emit(Ok(was_signed_in), |was_signed_in| {
        if *was_signed_in {
            println!("[OK] Signed out.");
        } else {
            println!("Not signed in.");
        }
    })
}

fn cmd_open(ctx: &Context, path: &str) -> Result<()> {
    let route = Route::parse(path);
    let decision = navigate(&ctx.app.session.state(), route);
    let outcome = match decision {
        GuardDecision::Allow => format!("allow {}", route),
        GuardDecision::Wait => "wait".to_string(),
        GuardDecision::Redirect(to) => format!("redirect {}", to),
    };
    ctx.emit(Ok(outcome), |_| match decision {
        GuardDecision::Allow => println!("[OK] {} is open to this session.", route),
        GuardDecision::Wait => println!("Session is still being restored."),
        GuardDecision::Redirect(to) => {
            println!("[!!] {} redirects to {}.", route, to);
            println!("     Run `{}`", command_for(to));
        }
    })
}

fn print_landing(path: &&str) {
    let route = Route::parse(path);
    println!("Next: {} (run `{}`)", route, command_for(route));
}

// -------------------------------------------------------------------------
// Student commands
// -------------------------------------------------------------------------

async fn run_student(ctx: &Context, command: &StudentCommands) -> Result<()> {
    match command {
        StudentCommands::Register(args) => {
            let flow = AuthFlow::new(ctx.app.api.clone());
            let result = flow.register_student(&ctx.scope, &args.form()).await;
            ctx.emit(result.map(|route| route.path()), |path| {
                println!("[OK] Registered as {}", args.name.trim());
                print_landing(path);
            })
        }
        StudentCommands::Login(args) => {
            let flow = AuthFlow::new(ctx.app.api.clone());
            let form = LoginForm::new(args.email.as_str(), args.password.as_str());
            let result = flow.login_student(&ctx.scope, &form).await;
            ctx.emit(result.map(|route| route.path()), |path| {
                println!("[OK] Signed in as {}", args.email);
                print_landing(path);
            })
        }
        StudentCommands::Faculties => {
            ctx.enter(Route::SelectFacultyClass)?;
            let flow = StudentProfileFlow::new(ctx.app.api.clone());
            let result = flow.load_faculties(&ctx.scope).await.map(|_| flow.faculties());
            ctx.emit(result, |faculties| {
                if faculties.is_empty() {
                    println!("No faculties found.");
                    return;
                }
                println!();
                println!("{:<8}  {:<40}", "ID", "NAME");
                println!("{}", "-".repeat(50));
                for faculty in faculties {
                    println!("{:<8}  {:<40}", faculty.id, truncate(&faculty.name, 40));
                }
                println!();
            })
        }
        StudentCommands::Classes { faculty } => {
            ctx.enter(Route::SelectFacultyClass)?;
            let flow = StudentProfileFlow::new(ctx.app.api.clone());
            let result = flow
                .select_faculty(&ctx.scope, Some(*faculty))
                .await
                .map(|_| flow.classes());
            ctx.emit(result, |classes| print_classes(classes))
        }
        StudentCommands::Setup { faculty, class } => {
            ctx.enter(Route::SelectFacultyClass)?;
            let flow = StudentProfileFlow::new(ctx.app.api.clone());
            flow.select_faculty(&ctx.scope, Some(*faculty))
                .await
                .map_err(report)?;
            if !flow.classes().iter().any(|c| c.id == *class) {
                bail!("Class {} is not offered by faculty {}", class, faculty);
            }
            flow.select_class(Some(*class));
            let result = flow.submit(&ctx.scope).await;
            ctx.emit(result.map(|route| route.path()), |path| {
                println!("[OK] Profile complete.");
                print_landing(path);
            })
        }
        StudentCommands::Subjects => {
            ctx.enter(Route::StudentMain)?;
            let form = FeedbackForm::new(ctx.app.api.clone());
            let result = form.load_subjects(&ctx.scope).await.map(|_| form.subjects());
            ctx.emit(result, |subjects| {
                if subjects.is_empty() {
                    println!("No subjects found for your class.");
                    return;
                }
                println!();
                println!("{:<8}  {:<40}", "ID", "SUBJECT");
                println!("{}", "-".repeat(50));
                for subject in subjects {
                    println!("{:<8}  {:<40}", subject.id, truncate(&subject.name, 40));
                }
                println!();
            })
        }
        StudentCommands::Submit {
            subject,
            rating,
            message,
        } => {
            ctx.enter(Route::StudentMain)?;
            let form = FeedbackForm::new(ctx.app.api.clone());
            form.load_subjects(&ctx.scope).await.map_err(report)?;
            let subject_name = form
                .subjects()
                .into_iter()
                .find(|s| s.id == *subject)
                .map(|s| s.name)
                .ok_or_else(|| anyhow!("Subject {} is not part of your class", subject))?;

            form.set_subject(Some(*subject));
            form.set_rating(*rating);
            form.set_message(message.as_str());
            let result = form.submit(&ctx.scope).await;
            ctx.emit(result, |feedback| {
                println!(
                    "[OK] Feedback submitted for {} ({})",
                    subject_name,
                    stars(feedback.rating)
                );
                if let Some(at) = &feedback.created_at {
                    println!("     Recorded {}", format_utc_to_local(at));
                }
            })
        }
        StudentCommands::Feedback => {
            ctx.enter(Route::StudentMain)?;
            let mine = MyFeedback::new(ctx.app.api.clone());
            let result = mine.load(&ctx.scope).await.map(|_| mine.items());
            ctx.emit(result, |items| {
                if items.is_empty() {
                    println!("You have not submitted any feedback yet.");
                    return;
                }
                println!();
                println!("{:<24}  {:<6}  {:<50}", "SUBJECT", "RATING", "COMMENT");
                println!("{}", "-".repeat(84));
                for item in items {
                    println!(
                        "{:<24}  {:<6}  {:<50}",
                        truncate(&item.subject_name, 24),
                        stars(item.rating),
                        truncate(item.comment.as_deref().unwrap_or("-"), 50)
                    );
                }
                println!();
            })
        }
    }
}

fn print_classes(classes: &[crate::models::Class]) {
    if classes.is_empty() {
        println!("No classes found.");
        return;
    }
    println!();
    println!("{:<8}  {:<40}", "ID", "CLASS");
    println!("{}", "-".repeat(50));
    for class in classes {
        println!("{:<8}  {:<40}", class.id, truncate(&class.name, 40));
    }
    println!();
}

fn print_subjects(subjects: &[crate::models::Subject]) {
    if subjects.is_empty() {
        println!("No subjects in this class.");
        return;
    }
    println!();
    println!("{:<8}  {:<40}", "ID", "SUBJECT");
    println!("{}", "-".repeat(50));
    for subject in subjects {
        println!("{:<8}  {:<40}", subject.id, truncate(&subject.name, 40));
    }
    println!();
}

// -------------------------------------------------------------------------
// Faculty commands
// -------------------------------------------------------------------------

async fn run_faculty(ctx: &Context, command: &FacultyCommands) -> Result<()> {
    match command {
        FacultyCommands::Register(args) => {
            let flow = AuthFlow::new(ctx.app.api.clone());
            let result = flow.register_faculty(&ctx.scope, &args.form()).await;
            ctx.emit(result.map(|route| route.path()), |path| {
                println!("[OK] Registered as {}", args.name.trim());
                print_landing(path);
            })
        }
        FacultyCommands::Login(args) => {
            let flow = AuthFlow::new(ctx.app.api.clone());
            let form = LoginForm::new(args.email.as_str(), args.password.as_str());
            let result = flow.login_faculty(&ctx.scope, &form).await;
            ctx.emit(result.map(|route| route.path()), |path| {
                println!("[OK] Signed in as {}", args.email);
                print_landing(path);
            })
        }
        FacultyCommands::Profile { name, email } => {
            ctx.enter(Route::FacultyProfileSetup)?;
            let flow = FacultyProfileFlow::new(ctx.app.api.clone());
            let mut form = flow.prefill().map_err(report)?;
            if let Some(name) = name {
                form.name = name.clone();
            }
            if let Some(email) = email {
                form.email = email.clone();
            }
            let result = flow.submit(&ctx.scope, &form).await;
            ctx.emit(result.map(|route| route.path()), |path| {
                println!("[OK] Profile saved: {} <{}>", form.name.trim(), form.email.trim());
                print_landing(path);
            })
        }
        FacultyCommands::Summary => {
            ctx.enter(Route::FacultyDashboard(DashboardTab::Home))?;
            let summary = DashboardSummary::new(ctx.app.api.clone());
            let result = summary.load(&ctx.scope).await;
            let name = ctx
                .app
                .session
                .faculty()
                .map(|f| f.display_name().to_string())
                .unwrap_or_default();
            ctx.emit(result, |counts| {
                println!();
                println!("Welcome, {}", name);
                println!();
                println!("  Classes:    {}", counts.classes);
                println!("  Subjects:   {}", counts.subjects);
                println!("  Feedbacks:  {}", counts.feedbacks);
                println!();
            })
        }
        FacultyCommands::Classes(command) => {
            ctx.enter(Route::FacultyDashboard(DashboardTab::Classes))?;
            run_classes(ctx, command).await
        }
        FacultyCommands::Subjects(command) => {
            ctx.enter(Route::FacultyDashboard(DashboardTab::Subjects))?;
            run_subjects(ctx, command).await
        }
        FacultyCommands::Feedbacks => {
            ctx.enter(Route::FacultyDashboard(DashboardTab::Feedbacks))?;
            let review = FeedbackReview::new(ctx.app.api.clone());
            let result = review.load(&ctx.scope).await.map(|_| review.items());
            ctx.emit(result, |items| {
                if items.is_empty() {
                    println!("No feedback received yet.");
                    return;
                }
                println!();
                for item in items {
                    println!("{}  {}", item.subject_name, stars(item.rating));
                    println!("  {}", item.message);
                    let when = item
                        .created_at
                        .as_deref()
                        .map(format_date)
                        .unwrap_or_else(|| "-".to_string());
                    println!("  By {} on {}", item.user_name, when);
                    println!();
                }
            })
        }
        FacultyCommands::Students { search, class } => {
            ctx.enter(Route::FacultyDashboard(DashboardTab::Students))?;
            let roster = StudentsRoster::new(ctx.app.api.clone());
            let filter = RosterFilter {
                search: search.clone(),
                class: ClassFilter::parse(class),
            };
            let result = roster.load(&ctx.scope).await.map(|_| roster.view(&filter));
            let class_names = roster.class_names();
            let caption = result.as_ref().map(|view| view.caption()).unwrap_or_default();
            ctx.emit(result.map(|view| view.shown), |shown| {
                println!();
                println!("{:<24}  {:<32}  {:<16}", "NAME", "EMAIL", "CLASS");
                println!("{}", "-".repeat(76));
                for student in shown {
                    println!(
                        "{:<24}  {:<32}  {:<16}",
                        truncate(&student.student_name, 24),
                        truncate(&student.student_email, 32),
                        truncate(&student.student_class_name, 16)
                    );
                }
                println!();
                println!("{}", caption);
                if !class_names.is_empty() {
                    println!("Classes: {}", class_names.join(", "));
                }
                println!();
            })
        }
    }
}

async fn run_classes(ctx: &Context, command: &ClassCommands) -> Result<()> {
    let flow = ClassesFlow::new(ctx.app.api.clone());
    match command {
        ClassCommands::List => {
            let result = flow.load(&ctx.scope).await.map(|_| flow.classes());
            ctx.emit(result, |classes| print_classes(classes))
        }
        ClassCommands::Add { name } => {
            flow.open_create();
            flow.set_name(name.as_str()).map_err(report)?;
            let result = flow.submit(&ctx.scope).await.map(|_| flow.classes());
            ctx.emit(result, |classes| {
                println!("[OK] Class \"{}\" created.", name.trim());
                print_classes(classes);
            })
        }
        ClassCommands::Rename { id, name } => {
            flow.load(&ctx.scope).await.map_err(report)?;
            let class = flow
                .classes()
                .into_iter()
                .find(|c| c.id == *id)
                .ok_or_else(|| anyhow!("Class {} not found", id))?;
            flow.open_edit(&class);
            flow.set_name(name.as_str()).map_err(report)?;
            let result = flow.submit(&ctx.scope).await.map(|_| flow.classes());
            ctx.emit(result, |classes| {
                println!("[OK] Class \"{}\" renamed to \"{}\".", class.name, name.trim());
                print_classes(classes);
            })
        }
        ClassCommands::Delete { id, yes } => {
            flow.load(&ctx.scope).await.map_err(report)?;
            let class = flow
                .classes()
                .into_iter()
                .find(|c| c.id == *id)
                .ok_or_else(|| anyhow!("Class {} not found", id))?;
            flow.request_delete(class.id);
            if !*yes && !confirm(&format!("Delete class \"{}\"?", class.name))? {
                flow.cancel_delete();
                println!("Cancelled.");
                return Ok(());
            }
            let result = flow.confirm_delete(&ctx.scope).await;
            ctx.emit(result, |_| println!("[OK] Class \"{}\" deleted.", class.name))
        }
    }
}

async fn run_subjects(ctx: &Context, command: &SubjectCommands) -> Result<()> {
    let flow = SubjectsFlow::new(ctx.app.api.clone());
    let class = match command {
        SubjectCommands::List { class }
        | SubjectCommands::Add { class, .. }
        | SubjectCommands::Rename { class, .. }
        | SubjectCommands::Delete { class, .. } => *class,
    };

    flow.load_classes(&ctx.scope).await.map_err(report)?;
    if let Some(class_id) = class {
        if !flow.classes().iter().any(|c| c.id == class_id) {
            bail!("Class {} not found", class_id);
        }
        if flow.selected_class() != Some(class_id) {
            flow.select_class(&ctx.scope, Some(class_id))
                .await
                .map_err(report)?;
        }
    }
    let class_name = flow
        .selected_class()
        .and_then(|id| flow.classes().into_iter().find(|c| c.id == id))
        .map(|c| c.name)
        .unwrap_or_else(|| "-".to_string());

    match command {
        SubjectCommands::List { .. } => {
            if flow.selected_class().is_none() {
                println!("Create a class first: shikshavani faculty classes add <NAME>");
                return Ok(());
            }
            println!("Class: {}", class_name);
            ctx.emit(Ok(flow.subjects()), |subjects| print_subjects(subjects))
        }
        SubjectCommands::Add { name, .. } => {
            flow.open_create();
            flow.set_name(name.as_str()).map_err(report)?;
            let result = flow.submit(&ctx.scope).await.map(|_| flow.subjects());
            ctx.emit(result, |subjects| {
                println!("[OK] Subject \"{}\" added to {}.", name.trim(), class_name);
                print_subjects(subjects);
            })
        }
        SubjectCommands::Rename {
            id, name, to_class, ..
        } => {
            let subject = flow
                .subjects()
                .into_iter()
                .find(|s| s.id == *id)
                .ok_or_else(|| anyhow!("Subject {} not found in {}", id, class_name))?;
            flow.open_edit(&subject);
            flow.set_name(name.as_str()).map_err(report)?;
            if to_class.is_some() {
                flow.set_class(*to_class).map_err(report)?;
            }
            let result = flow.submit(&ctx.scope).await.map(|_| flow.subjects());
            ctx.emit(result, |subjects| {
                println!("[OK] Subject \"{}\" saved as \"{}\".", subject.name, name.trim());
                print_subjects(subjects);
            })
        }
        SubjectCommands::Delete { id, yes, .. } => {
            let subject = flow
                .subjects()
                .into_iter()
                .find(|s| s.id == *id)
                .ok_or_else(|| anyhow!("Subject {} not found in {}", id, class_name))?;
            flow.request_delete(subject.id);
            if !*yes && !confirm(&format!("Delete subject \"{}\"?", subject.name))? {
                flow.cancel_delete();
                println!("Cancelled.");
                return Ok(());
            }
            let result = flow.confirm_delete(&ctx.scope).await;
            ctx.emit(result, |_| println!("[OK] Subject \"{}\" deleted.", subject.name))
        }
    }
}

// -------------------------------------------------------------------------
// Config
// -------------------------------------------------------------------------

fn cmd_config_check(cli: &Cli, config: &Config) -> Result<()> {
    let config_path = &cli.config;

    println!("Checking configuration file: {}", config_path.display());
    println!();

    if !config_path.exists() {
        println!("[!!] Configuration file not found: {}", config_path.display());
        println!("     Defaults and environment overrides are in effect.");
        println!();
    } else {
        // main already loaded it; load again so a broken file is reported here too
        if let Err(e) = Config::load(config_path) {
            println!("[!!] Configuration file is invalid!");
            println!();
            println!("Error: {:#}", e);
            bail!("Invalid configuration file");
        }
        println!("[OK] Configuration file parsed.");
        println!();
    }

    println!("=== Configuration Summary ===");
    println!();
    println!("API:");
    println!("  Base URL:     {}", config.api.base_url);
    println!("  Timeout:      {}s", config.api.timeout_secs);
    println!();
    println!("Session:");
    println!("  File:         {}", config.session.path().display());
    println!();
    println!("Logging:");
    println!("  Level:        {}", config.logging.level);
    println!();

    let problems = config.validate();
    if problems.is_empty() {
        println!("[OK] Configuration is valid!");
        println!();
        return Ok(());
    }

    println!("Problems:");
    for problem in &problems {
        println!("  [!] {}", problem);
    }
    println!();
    bail!("Invalid configuration ({} problem(s))", problems.len())
}
