use anyhow::Context;
use clap::{Parser, Subcommand};
use coursedesk_client::domain::auth::{AuthError, AuthService, AuthServiceApi};
use coursedesk_client::domain::course::{CourseQuery, CourseService, CourseServiceApi};
use coursedesk_client::domain::document::{DocumentQuery, DocumentService, DocumentServiceApi};
use coursedesk_client::domain::mark::{MarkService, MarkServiceApi};
use coursedesk_client::domain::session::{
    FileCredentialStore, MemoryNavigator, Navigator, Session, SessionEvent,
};
use coursedesk_client::domain::shared::PageRequest;
use coursedesk_client::infrastructure::config::{Config, LogFormat};
use coursedesk_client::{ApiClient, ClientError};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "coursedesk", about = "Course and document management client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and store the token pair in the credential jar
    Login { email: String, password: String },
    /// Revoke the refresh token and clear the credential jar
    Logout,
    /// Show the signed-in user
    Profile,
    /// List courses
    Courses {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        limit: u32,
        #[arg(long)]
        search: Option<String>,
    },
    /// Ask for access to a course
    RequestAccess {
        course_id: String,
        #[arg(long)]
        message: Option<String>,
    },
    /// List documents, optionally for one course
    Documents {
        #[arg(long)]
        course: Option<String>,
    },
    /// List marks for a course
    Marks { course_id: String },
}

impl Command {
    /// Page the command is issued from, so expiry redirects behave like the web app
    fn origin_path(&self) -> &'static str {
        match self {
            Command::Login { .. } => "/login",
            _ => "/",
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    // Initialize logging
    init_logging(&config);

    tracing::debug!(api_url = %config.api_url, "Starting coursedesk client");

    let store = Arc::new(
        FileCredentialStore::open(&config.credentials_path)
            .with_context(|| format!("Failed to open {}", config.credentials_path.display()))?,
    );
    let navigator = Arc::new(MemoryNavigator::new(cli.command.origin_path()));
    let client = Arc::new(ApiClient::new(
        Arc::new(config),
        Session::new(store),
        navigator.clone(),
    )?);
    let mut events = client.subscribe();

    let result = run(cli.command, client.clone()).await;

    while let Ok(event) = events.try_recv() {
        if let SessionEvent::Expired {
            reason,
            redirected_to,
        } = event
        {
            tracing::warn!(reason = %reason, "Session expired");
            if let Some(path) = redirected_to {
                eprintln!("Session expired, please sign in again ({})", path);
            }
        }
    }

    if let Err(e) = result {
        tracing::error!(error = %e, path = %navigator.current_path(), "Command failed");
        if needs_sign_in(&e) {
            eprintln!("Not signed in, run `coursedesk login <email> <password>` first");
        }
        return Err(e);
    }

    Ok(())
}

async fn run(command: Command, client: Arc<ApiClient>) -> anyhow::Result<()> {
    match command {
        Command::Login { email, password } => {
            let user = AuthService::new(client).login(&email, &password).await?;
            println!("Signed in as {} ({})", user.name, user.role);
        }
        Command::Logout => {
            AuthService::new(client).logout().await?;
            println!("Signed out");
        }
        Command::Profile => {
            let profile = AuthService::new(client).profile().await?;
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
        Command::Courses {
            page,
            limit,
            search,
        } => {
            let courses = CourseService::new(client)
                .list_courses(CourseQuery {
                    page: PageRequest::new(page, limit),
                    search,
                    department: None,
                })
                .await?;
            for course in &courses.items {
                println!("{:<12} {:<10} {}", course.id, course.code, course.title);
            }
            println!("page {}/{} ({} total)", courses.page, courses.total_pages(), courses.total);
        }
        Command::RequestAccess { course_id, message } => {
            let request = CourseService::new(client)
                .request_access(&course_id, message)
                .await?;
            println!("Request {} is {}", request.id, request.status);
        }
        Command::Documents { course } => {
            let documents = DocumentService::new(client)
                .list_documents(DocumentQuery {
                    page: PageRequest::default(),
                    course_id: course,
                })
                .await?;
            for document in &documents.items {
                println!("{:<12} {}", document.id, document.title);
            }
        }
        Command::Marks { course_id } => {
            let marks = MarkService::new(client).list_marks(&course_id).await?;
            for mark in &marks {
                println!("{:<12} {:>6.1}", mark.student_id, mark.score);
            }
        }
    }

    Ok(())
}

/// Whether the failure means the stored session is gone or was never there
fn needs_sign_in(error: &anyhow::Error) -> bool {
    if let Some(e) = error.downcast_ref::<ClientError>() {
        return e.is_auth_failure();
    }
    matches!(
        error.downcast_ref::<AuthError>(),
        Some(AuthError::SessionExpired)
    )
}

fn init_logging(config: &Config) {
    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "coursedesk_client=info".into()),
            )
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "coursedesk_client=info".into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
            .init();
    }
}
