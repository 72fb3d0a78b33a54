//! Quizhub CLI - talks to the Quiz Master server from the terminal.
//!
//! This is the binary entry point. See the `quizhub` library for the core
//! functionality.

use anyhow::Result;
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use quizhub::{
    auth, BroadcastOptions, Config, DispatchOutcome, HttpClient, NotificationDispatcher,
    SessionStore, UserType,
};

/// Global allocator configured per M-MIMALLOC-APPS guideline.
/// mimalloc provides better multi-threaded performance than the system allocator.
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[command(name = "quizhub", version, about = "Quiz Master API client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and store the session.
    Login {
        /// Login name.
        #[arg(long)]
        username: String,
        /// Password.
        #[arg(long)]
        password: String,
        /// Sign in as the administrator account.
        #[arg(long)]
        admin: bool,
    },
    /// Clear the stored session.
    Logout,
    /// Show the stored session and whether notifications are available.
    Status,
    /// Send a notification, falling back across candidate routes.
    #[command(subcommand)]
    Notify(NotifyCommand),
}

#[derive(Subcommand)]
enum NotifyCommand {
    /// Announce a newly created quiz.
    Quiz {
        /// Id of the quiz.
        quiz_id: i64,
    },
    /// Announce a newly created subject.
    Subject {
        /// Id of the subject.
        subject_id: i64,
        /// Display name of the subject.
        #[arg(long)]
        name: String,
    },
    /// Announce a newly created chapter.
    Chapter {
        /// Id of the chapter.
        chapter_id: i64,
        /// Display name of the chapter.
        #[arg(long)]
        name: String,
        /// Id of the parent subject.
        #[arg(long)]
        subject_id: Option<i64>,
    },
    /// Notify all users about available quizzes.
    All {
        /// Email subject line.
        #[arg(long)]
        subject: Option<String>,
        /// Email body message.
        #[arg(long)]
        message: Option<String>,
        /// Days of upcoming quizzes to include.
        #[arg(long)]
        days_ahead: Option<u32>,
        /// Quiz to feature prominently.
        #[arg(long)]
        highlight_quiz_id: Option<i64>,
        /// Leave the upcoming-quiz digest out of the email.
        #[arg(long)]
        skip_quizzes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = Config::load()?;
    let session = SessionStore::new()?;
    let client = HttpClient::new(&config, session.clone())?;

    match cli.command {
        Command::Login {
            username,
            password,
            admin,
        } => {
            let user_type = if admin { UserType::Admin } else { UserType::User };
            let logged_in = auth::login(&client, &username, &password, user_type).await?;
            println!("Signed in as {} ({})", logged_in.username, logged_in.user_type);
        }
        Command::Logout => {
            auth::logout(&session)?;
            println!("Signed out.");
        }
        Command::Status => {
            match session.get() {
                Some(s) => println!("Signed in as {} ({})", s.username, s.user_type),
                None => println!("Not signed in."),
            }
            let dispatcher = NotificationDispatcher::new(client);
            let available = dispatcher.check_notification_system().await;
            println!(
                "Notification system: {}",
                if available { "available" } else { "unavailable" }
            );
        }
        Command::Notify(notify) => {
            let dispatcher = NotificationDispatcher::new(client);
            let outcome = run_notify(&dispatcher, notify).await;
            report_outcome(&outcome);
            if !outcome.succeeded {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

async fn run_notify(dispatcher: &NotificationDispatcher, command: NotifyCommand) -> DispatchOutcome {
    match command {
        NotifyCommand::Quiz { quiz_id } => dispatcher.notify_new_quiz(Some(quiz_id)).await,
        NotifyCommand::Subject { subject_id, name } => {
            dispatcher.notify_new_subject(Some(subject_id), &name).await
        }
        NotifyCommand::Chapter {
            chapter_id,
            name,
            subject_id,
        } => {
            dispatcher
                .notify_new_chapter(Some(chapter_id), &name, subject_id)
                .await
        }
        NotifyCommand::All {
            subject,
            message,
            days_ahead,
            highlight_quiz_id,
            skip_quizzes,
        } => {
            let options = BroadcastOptions {
                subject,
                message,
                include_quizzes: skip_quizzes.then_some(false),
                days_ahead,
                highlight_quiz_id,
            };
            dispatcher.notify_all_users(options).await
        }
    }
}

/// Prints the outcome, including the attempt log when something failed.
fn report_outcome(outcome: &DispatchOutcome) {
    if outcome.succeeded {
        println!("Notification sent.");
        if let Some(data) = &outcome.data {
            if let Some(message) = data.get("message").and_then(|m| m.as_str()) {
                println!("  {}", message);
            }
        }
    } else if let Some(error) = &outcome.error {
        eprintln!("Notification failed: {}", error);
    }

    for attempt in &outcome.attempts {
        match &attempt.error {
            Some(error) => eprintln!("  {} - {}", attempt.url, error),
            None => println!("  {} - ok", attempt.url),
        }
    }
}
