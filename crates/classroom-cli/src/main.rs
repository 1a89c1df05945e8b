//! Classroom CLI
//!
//! Runs the chat relay and catalog server, a terminal chat client, and a
//! lesson browser over the catalog API.

use std::net::SocketAddr;
use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use classroom_core::{
    create_router, AppState, Catalog, ChatSession, Config, CourseFilter, CourseProvider,
    HttpCourseProvider, LessonViewer, Selection, StaticCourseProvider,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Default port for the relay and catalog server.
const DEFAULT_PORT: u16 = 8080;

/// Classroom - course chat and lesson player
#[derive(Parser, Debug)]
#[command(name = "classroom")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (default: classroom.json in current directory)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Subcommand to run
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the chat relay and the course catalog API
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Catalog JSON file to serve (default: empty catalog)
        #[arg(long, value_name = "FILE")]
        catalog: Option<String>,
    },

    /// Chat over the relay from the terminal
    Chat,

    /// Show a course's lessons with their unlock state
    Lessons {
        /// Course id
        course_id: String,

        /// Select a video for playback, as SECTION:VIDEO
        #[arg(long, value_name = "SECTION:VIDEO", value_parser = parse_selection)]
        select: Option<Selection>,

        /// Read from a local catalog file instead of the API
        #[arg(long, value_name = "FILE")]
        catalog: Option<String>,
    },

    /// List the user's enrolled courses
    Courses {
        /// Tab filter: all, ongoing or completed
        #[arg(short, long, default_value_t = CourseFilter::All)]
        filter: CourseFilter,

        /// User id (default: userId from config)
        #[arg(short, long)]
        user: Option<String>,

        /// Read from a local catalog file instead of the API
        #[arg(long, value_name = "FILE")]
        catalog: Option<String>,
    },

    /// Show an instructor's profile
    Teacher {
        /// Teacher id
        #[arg(default_value = "1")]
        teacher_id: String,

        /// Read from a local catalog file instead of the API
        #[arg(long, value_name = "FILE")]
        catalog: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(config = ?args.config, "Config file");

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(1)
        }
    }
}

/// Dispatches the subcommand.
async fn run(args: Args) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;

    match args.command {
        Command::Serve { port, catalog } => serve(config, port, catalog.as_deref()).await,
        Command::Chat => chat(&config).await,
        Command::Lessons {
            course_id,
            select,
            catalog,
        } => {
            let provider = provider(&config, catalog.as_deref())?;
            lessons(&config, provider.as_ref(), &course_id, select).await
        }
        Command::Courses {
            filter,
            user,
            catalog,
        } => {
            let provider = provider(&config, catalog.as_deref())?;
            let user_id = user.unwrap_or_else(|| config.user_id.clone());
            courses(provider.as_ref(), &user_id, filter).await
        }
        Command::Teacher {
            teacher_id,
            catalog,
        } => {
            let provider = provider(&config, catalog.as_deref())?;
            teacher(provider.as_ref(), &teacher_id).await
        }
    }
}

/// Loads configuration from the specified path or default location.
fn load_config(config_path: Option<&str>) -> anyhow::Result<Config> {
    match config_path {
        Some(path_str) => {
            let path = Path::new(path_str);
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: '{}'\n\nSuggestion: Check the path or remove the --config flag to use defaults",
                    path.display()
                );
            }
            Ok(Config::load_from_file(path)?)
        }
        None => Ok(Config::load()?),
    }
}

/// Loads a catalog file.
fn load_catalog(path: &str) -> anyhow::Result<Catalog> {
    Catalog::load_from_file(Path::new(path))
        .with_context(|| format!("Failed to load catalog '{path}'"))
}

/// Picks a local catalog when one is given, else the configured API.
fn provider(config: &Config, catalog: Option<&str>) -> anyhow::Result<Box<dyn CourseProvider>> {
    Ok(match catalog {
        Some(path) => Box::new(StaticCourseProvider::new(load_catalog(path)?)),
        None => Box::new(HttpCourseProvider::new(&config.api_base_url)),
    })
}

/// Parses `SECTION:VIDEO`.
fn parse_selection(s: &str) -> Result<Selection, String> {
    let (section, video) = s
        .split_once(':')
        .ok_or_else(|| format!("expected SECTION:VIDEO, got '{s}'"))?;
    let section = section
        .trim()
        .parse()
        .map_err(|e| format!("invalid section '{section}': {e}"))?;
    let video = video
        .trim()
        .parse()
        .map_err(|e| format!("invalid video '{video}': {e}"))?;
    Ok(Selection::new(section, video))
}

// ============================================================================
// Subcommands
// ============================================================================

/// Runs the relay and catalog server until Ctrl+C.
async fn serve(config: Config, port: u16, catalog: Option<&str>) -> anyhow::Result<()> {
    let catalog = catalog.map(load_catalog).transpose()?.unwrap_or_default();
    let courses = catalog.courses.len();
    let router = create_router(AppState::with_catalog(config, catalog));

    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        anyhow::anyhow!(
            "Failed to bind to {addr}: {e}\n\nSuggestion: Try a different port with --port"
        )
    })?;

    println!("Classroom server running on http://{addr}");
    println!("  Chat relay: ws://{addr}/ws");
    println!("  Catalog API: http://{addr}/api ({courses} courses)");
    println!("Press Ctrl+C to stop");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Received Ctrl+C, shutting down");
            }
        })
        .await?;
    Ok(())
}

/// Interactive terminal chat. Each stdin line is sent; received messages
/// are printed as they arrive.
async fn chat(config: &Config) -> anyhow::Result<()> {
    let (mut session, mut inbound) = ChatSession::connect(config).await?;
    session.toggle_open();

    println!("Connected to {} as {}", config.relay_endpoint, config.local_user.name);
    println!("Type a message and press Enter. Ctrl+D or Ctrl+C to quit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match session.send_message(&line) {
                    Ok(message) if message.delivery_failed() => {
                        println!("! not delivered: {}", message.text);
                    }
                    Ok(_) => {}
                    Err(e) => tracing::debug!(error = %e, "Skipped input line"),
                }
            }
            event = inbound.recv() => {
                let Some(event) = event else { break };
                if let Some(message) = session.handle_event(event) {
                    println!("{}: {}", message.sender_name(), message.text);
                }
                if let classroom_core::ConnectionState::Lost { reason } = session.connection() {
                    println!("Connection lost: {reason}");
                    break;
                }
            }
            Ok(()) = tokio::signal::ctrl_c() => break,
        }
    }

    tracing::info!(messages = session.transcript().len(), "Chat ended");
    session.close();
    Ok(())
}

/// Prints the lesson list with effective states.
async fn lessons(
    config: &Config,
    provider: &dyn CourseProvider,
    course_id: &str,
    select: Option<Selection>,
) -> anyhow::Result<()> {
    let mut viewer = LessonViewer::load(provider, course_id, config.unlock_threshold).await?;

    let Some(course) = viewer.course() else {
        println!("Course '{course_id}' not found");
        return Ok(());
    };
    print_course_header(course);

    if let Some(selection) = select {
        match viewer.select_video(selection.section, selection.video) {
            Ok(_) => {
                if let Some(url) = viewer.playback().current() {
                    println!("Now playing: {url}");
                }
            }
            Err(e) => println!("Cannot play: {e}"),
        }
        println!();
    }

    for (s, lesson) in viewer.gate().lessons().iter().enumerate() {
        println!("Section {s}: {}", lesson.title);
        for (v, video) in lesson.videos.iter().enumerate() {
            let state = viewer.gate().effective_state(s, v).unwrap_or_default();
            let marker = if viewer.gate().is_active(s, v) { ">" } else { " " };
            println!("  {marker} {s}:{v} [{state:>9}] {}", video.name);
        }
    }
    Ok(())
}

/// Prints the user's courses for a filter.
async fn courses(
    provider: &dyn CourseProvider,
    user_id: &str,
    filter: CourseFilter,
) -> anyhow::Result<()> {
    let courses = provider.fetch_user_courses(user_id, filter).await?;
    if courses.is_empty() {
        println!("No {filter} courses for user {user_id}");
        return Ok(());
    }
    for course in &courses {
        println!(
            "{:<12} {}  ({:.1}, {} reviews)",
            course.id, course.name, course.average_rating, course.total_rating
        );
    }
    Ok(())
}

/// Prints an instructor profile.
async fn teacher(provider: &dyn CourseProvider, teacher_id: &str) -> anyhow::Result<()> {
    let Some(teacher) = provider.fetch_teacher(teacher_id).await? else {
        println!("No teacher found with id {teacher_id}");
        return Ok(());
    };
    println!("{}", teacher.user_name);
    if let Some(ref image) = teacher.image {
        println!("  Image: {image}");
    }
    for (label, value) in [
        ("Email", &teacher.email),
        ("Phone", &teacher.phone),
        ("Address", &teacher.address),
    ] {
        if !value.is_empty() {
            println!("  {label}: {value}");
        }
    }
    if !teacher.description.is_empty() {
        println!();
        println!("{}", teacher.description);
    }
    Ok(())
}

/// Prints the course detail header.
fn print_course_header(course: &classroom_core::Course) {
    println!("{}", course.name);
    if !course.title.is_empty() {
        println!("  {}", course.title);
    }
    if let Some(ref instructor) = course.instructor {
        println!("  Instructor: {instructor}");
    }
    println!(
        "  Rating: {:.1} ({} reviews), {} lessons",
        course.average_rating, course.total_rating, course.total_lessons
    );
    if let Some(price) = course.price {
        println!("  Price: ${price:.2}");
    }
    println!();
}
