//! examdesk CLI: the command-line front-end for the exam platform.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::filter::LevelFilter;

mod commands;

#[derive(Parser)]
#[command(name = "examdesk", version, about = "Take, grade and manage exams from the terminal")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session token
    Login {
        /// Username or email
        #[arg(long)]
        user: String,

        #[arg(long)]
        password: String,
    },

    /// Create an account and log in
    Register {
        #[arg(long)]
        username: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,

        #[arg(long)]
        confirm_password: String,
    },

    /// Forget the stored session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Manage exams (admin)
    Exams {
        #[command(subcommand)]
        action: ExamsAction,
    },

    /// Manage the questions of an exam (admin)
    Questions {
        #[command(subcommand)]
        action: QuestionsAction,
    },

    /// Available exams and attempt history
    Dashboard {
        /// Which view to show: available, history
        #[arg(long, default_value = "available")]
        tab: String,
    },

    /// Answer an exam and submit it for grading
    Take {
        exam_id: u64,

        /// Answer as <question_id>=<answer>; repeat for each question
        #[arg(long = "answer", value_name = "QID=ANSWER")]
        answers: Vec<String>,
    },

    /// Review a graded attempt
    Review { attempt_id: u64 },
}

#[derive(Subcommand)]
pub enum ExamsAction {
    /// List every exam
    List,

    /// Create an exam
    Create {
        #[arg(long)]
        title: String,

        #[arg(long, default_value = "")]
        description: String,
    },

    /// Delete an exam and its questions
    Delete {
        exam_id: u64,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Activate or deactivate an exam
    Toggle { exam_id: u64 },
}

#[derive(Subcommand)]
pub enum QuestionsAction {
    /// List the questions of an exam
    List { exam_id: u64 },

    /// Add questions from a JSON array (file or stdin)
    Add {
        exam_id: u64,

        /// JSON file; reads stdin when omitted
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Delete a question
    Delete {
        exam_id: u64,
        question_id: u64,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Change fields of a question
    Edit {
        exam_id: u64,
        question_id: u64,

        #[arg(long)]
        text: Option<String>,

        #[arg(long)]
        subject: Option<String>,

        #[arg(long)]
        difficulty: Option<String>,

        #[arg(long)]
        marks: Option<u32>,

        /// Comma-separated options
        #[arg(long, value_delimiter = ',')]
        options: Option<Vec<String>>,

        #[arg(long)]
        correct_answer: Option<String>,

        #[arg(long)]
        context: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(
                    "examdesk=info"
                        .parse()
                        .unwrap_or_else(|_| LevelFilter::INFO.into()),
                ),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    let result = match cli.command {
        Commands::Login { user, password } => commands::auth::login(config, user, password).await,
        Commands::Register {
            username,
            email,
            password,
            confirm_password,
        } => commands::auth::register(config, username, email, password, confirm_password).await,
        Commands::Logout => commands::auth::logout(config),
        Commands::Whoami => commands::auth::whoami(config).await,
        Commands::Exams { action } => commands::exams::execute(config, action).await,
        Commands::Questions { action } => commands::questions::execute(config, action).await,
        Commands::Dashboard { tab } => commands::dashboard::execute(config, tab).await,
        Commands::Take { exam_id, answers } => commands::take::execute(config, exam_id, answers).await,
        Commands::Review { attempt_id } => commands::review::execute(config, attempt_id).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
