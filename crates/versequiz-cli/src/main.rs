//! versequiz CLI: exams, adaptive practice, and progress reports over a verse corpus.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use versequiz_core::model::QuestionType;

mod commands;

use commands::GlobalOpts;

#[derive(Parser)]
#[command(name = "versequiz", version, about = "Adaptive verse memorization quizzes")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// User whose history is read and recorded
    #[arg(long, global = true)]
    user: Option<String>,

    /// Verse corpus CSV (overrides config)
    #[arg(long, global = true)]
    verses: Option<PathBuf>,

    /// History store JSON (overrides config)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter config and sample corpus
    Init,

    /// Check the verse corpus for problems
    Validate,

    /// Take an exam of uniformly drawn verses
    Exam {
        /// Number of questions (5-100, capped by unique references)
        #[arg(long)]
        questions: Option<u32>,

        /// Question types (comma-separated, e.g. "cloze,multiple_choice")
        #[arg(long, value_delimiter = ',')]
        types: Vec<QuestionType>,

        /// Seed for reproducible question sets
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Practice with adaptive selection and immediate feedback
    Practice {
        /// Stop after this many answers
        #[arg(long)]
        limit: Option<usize>,

        /// Question types (comma-separated)
        #[arg(long, value_delimiter = ',')]
        types: Vec<QuestionType>,

        /// Seed for reproducible selection
        #[arg(long)]
        seed: Option<u64>,
    },

    /// List the most missed verses, or take an exam on them
    Worst {
        /// Start an exam over the listed verses
        #[arg(long)]
        quiz: bool,

        /// Question types (comma-separated)
        #[arg(long, value_delimiter = ',')]
        types: Vec<QuestionType>,

        /// Seed for reproducible question types
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Replay a saved exam
    Retake {
        /// Session id (see `versequiz stats`)
        session_id: String,

        /// Only the questions answered wrong or skipped
        #[arg(long)]
        wrong_only: bool,
    },

    /// Show accuracy, score trend, and recent sessions
    Stats {
        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Rank users by recent exam scores
    Leaderboard {
        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Show or change quiz settings
    Settings {
        /// Questions per exam
        #[arg(long)]
        questions: Option<u32>,

        /// Enabled question types (comma-separated)
        #[arg(long, value_delimiter = ',')]
        types: Vec<QuestionType>,
    },

    /// Delete all sessions, scores, and settings for the user
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },

    /// Remove a verse score, a session, or all verse scores
    Forget {
        /// Verse key, e.g. "John|3|16"
        #[arg(long)]
        verse: Option<String>,

        /// Session id
        #[arg(long)]
        session: Option<String>,

        /// Clear every verse score
        #[arg(long)]
        all_scores: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("versequiz=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let opts = GlobalOpts {
        config: cli.config,
        user: cli.user,
        verses: cli.verses,
        data: cli.data,
    };

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Validate => commands::validate::execute(opts),
        Commands::Exam {
            questions,
            types,
            seed,
        } => commands::exam::execute(opts, questions, types, seed),
        Commands::Practice { limit, types, seed } => {
            commands::practice::execute(opts, limit, types, seed)
        }
        Commands::Worst { quiz, types, seed } => commands::worst::execute(opts, quiz, types, seed),
        Commands::Retake {
            session_id,
            wrong_only,
        } => commands::retake::execute(opts, session_id, wrong_only),
        Commands::Stats { format } => commands::stats::execute(opts, format),
        Commands::Leaderboard { format } => commands::leaderboard::execute(opts, format),
        Commands::Settings { questions, types } => {
            commands::settings::execute(opts, questions, types)
        }
        Commands::Reset { yes } => commands::reset::execute(opts, yes),
        Commands::Forget {
            verse,
            session,
            all_scores,
        } => commands::forget::execute(opts, verse, session, all_scores),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
