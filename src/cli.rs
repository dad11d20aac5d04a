//! Answerbook CLI - inspect and grow the answer memory from a terminal
//!
//! Usage:
//!   answerbook init                         Create the data directory and stores
//!   answerbook ask "question"               Answer a question, asking if unknown
//!   answerbook match "question"             Show the best stored match
//!   answerbook normalize "text"             Show the normalized form
//!   answerbook score "a" "b"                Similarity of two questions
//!   answerbook get "question"               Stored answer for exact text
//!   answerbook put "question" "answer"      Store an answer
//!   answerbook list                         List stored answers
//!   answerbook stats                        Show statistics

use anyhow::Context;
use answerbook::{
    AnswerBook, AnswerBookConfig, AnswerOrigin, AnswerStore, Category, ConfidenceTier, FormField,
    LinePrompt, WatchedSelection, CONFIG_FILE_NAME,
};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "answerbook")]
#[command(about = "Answerbook - remembered answers for application forms")]
#[command(version)]
struct Cli {
    /// Path to data directory (overrides the config file)
    #[arg(short, long, env = "ANSWERBOOK_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Path to a JSON config file
    #[arg(short, long, env = "ANSWERBOOK_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data directory, empty stores and a default config
    Init,

    /// Answer a question from memory, asking for it when unknown
    Ask {
        /// Question text as shown on the form
        question: String,

        /// Field category
        #[arg(short = 't', long, value_enum, default_value = "text")]
        category: CliCategory,

        /// Option labels of a dropdown (repeatable)
        #[arg(short, long = "option")]
        options: Vec<String>,
    },

    /// Show the best stored match for a question
    Match {
        /// Question text
        question: String,

        /// Field category
        #[arg(short = 't', long, value_enum, default_value = "text")]
        category: CliCategory,

        /// Show every scored candidate
        #[arg(short, long)]
        all: bool,
    },

    /// Show the normalized comparison form of a question
    Normalize {
        /// Question text
        text: String,
    },

    /// Score two questions against each other
    Score {
        /// Incoming question
        a: String,
        /// Stored question
        b: String,
    },

    /// Show the stored answer for exact question text
    Get {
        /// Question text
        question: String,

        /// Field category
        #[arg(short = 't', long, value_enum, default_value = "text")]
        category: CliCategory,
    },

    /// Store an answer
    Put {
        /// Question text
        question: String,

        /// Answer text
        answer: String,

        /// Field category
        #[arg(short = 't', long, value_enum, default_value = "text")]
        category: CliCategory,
    },

    /// List stored answers
    List {
        /// Only this category
        #[arg(short = 't', long, value_enum)]
        category: Option<CliCategory>,

        /// Maximum entries per category
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },

    /// Show statistics
    Stats,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum CliCategory {
    Text,
    Binary,
    Choice,
}

impl From<CliCategory> for Category {
    fn from(cli: CliCategory) -> Self {
        match cli {
            CliCategory::Text => Category::FreeText,
            CliCategory::Binary => Category::Binary,
            CliCategory::Choice => Category::SingleChoice,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_ref(), cli.data_dir.as_ref())?;

    match cli.command {
        Commands::Init => cmd_init(&config),
        Commands::Ask {
            question,
            category,
            options,
        } => cmd_ask(&config, question, category.into(), options).await,
        Commands::Match {
            question,
            category,
            all,
        } => cmd_match(&config, question, category.into(), all),
        Commands::Normalize { text } => cmd_normalize(&config, text),
        Commands::Score { a, b } => cmd_score(&config, a, b),
        Commands::Get { question, category } => cmd_get(&config, question, category.into()),
        Commands::Put {
            question,
            answer,
            category,
        } => cmd_put(&config, question, answer, category.into()),
        Commands::List { category, limit } => cmd_list(&config, category.map(Into::into), limit),
        Commands::Stats => cmd_stats(&config),
    }
}

/// Filter used when `RUST_LOG` is unset
fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "answerbook=debug"
    } else {
        "answerbook=info"
    }
}

fn init_tracing(verbose: bool) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose))),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(
    config_path: Option<&PathBuf>,
    data_dir: Option<&PathBuf>,
) -> anyhow::Result<AnswerBookConfig> {
    let mut config = match config_path {
        Some(path) => AnswerBookConfig::from_file(path)?,
        None => {
            let candidate = data_dir
                .cloned()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(CONFIG_FILE_NAME);
            if candidate.exists() {
                AnswerBookConfig::from_file(&candidate)?
            } else {
                AnswerBookConfig::default()
            }
        }
    };

    if let Some(dir) = data_dir {
        config.data_dir = dir.clone();
    }
    Ok(config)
}

fn open_book(config: &AnswerBookConfig) -> anyhow::Result<AnswerBook> {
    AnswerBook::open(config).with_context(|| {
        format!(
            "cannot open answer stores in {} (run `answerbook init` first)",
            config.data_dir.display()
        )
    })
}

fn cmd_init(config: &AnswerBookConfig) -> anyhow::Result<()> {
    println!(
        "{}",
        format!("Initializing answer stores in {}", config.data_dir.display())
            .bold()
            .green()
    );

    std::fs::create_dir_all(&config.data_dir)?;

    let free_text = config.store_path(Category::FreeText);
    if free_text.exists() {
        println!("  {} {}", "Kept".yellow(), free_text.display());
    } else {
        AnswerStore::empty(&free_text, Category::FreeText).flush()?;
        println!("  {} {}", "Created".green(), free_text.display());
    }

    for category in [Category::Binary, Category::SingleChoice] {
        let store = AnswerStore::open(config.store_path(category), category)?;
        println!("  {} {}", "Ready".green(), store.path().display());
    }

    let config_path = config.data_dir.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        config.write_to(&config_path)?;
        println!("  {} {}", "Created".green(), config_path.display());
    }

    println!();
    println!("Next steps:");
    println!("  answerbook put \"How many years of experience with Rust?\" \"3\"");
    println!("  answerbook ask \"Years of Rust experience\"");

    Ok(())
}

async fn cmd_ask(
    config: &AnswerBookConfig,
    question: String,
    category: Category,
    options: Vec<String>,
) -> anyhow::Result<()> {
    let mut book = open_book(config)?;

    book = match category {
        Category::FreeText => book.with_prompt(LinePrompt::stdio()),
        Category::Binary => {
            if book.get_answer(&question, category).is_none() {
                println!("{}", "Type Yes or No if asked:".dimmed());
            }
            book.with_binary_probe(terminal_selection(Vec::new()))
        }
        Category::SingleChoice => {
            if !options.is_empty() {
                println!("{} {}", "Options:".dimmed(), options.join(" | "));
            }
            book.with_choice_probe(terminal_selection(options.clone()))
        }
    };

    let field = FormField::new(question, category).with_options(options);
    let answer = book.answer(&field).await?;

    println!("{} {}", "Answer:".bold(), answer.value.cyan());
    match answer.origin {
        AnswerOrigin::Exact => println!("  {}", "stored under this exact question".green()),
        AnswerOrigin::Reused {
            matched,
            similarity,
        } => println!(
            "  {} \"{}\" ({:.2})",
            "reused from".green(),
            matched,
            similarity
        ),
        AnswerOrigin::Resolved { nearest } => {
            println!("  {}", "new answer stored".yellow());
            if let Some(m) = nearest {
                println!(
                    "  {} \"{}\" ({:.2}, not reused)",
                    "closest was".dimmed(),
                    m.question,
                    m.similarity
                );
            }
        }
    }

    Ok(())
}

/// Publish terminal lines as the observed selection. With options, only a
/// line naming one of them counts.
fn terminal_selection(options: Vec<String>) -> WatchedSelection {
    let (tx, selection) = WatchedSelection::channel();

    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let line = line.trim();
            let value = if options.is_empty() {
                line.to_string()
            } else {
                match options.iter().find(|o| o.eq_ignore_ascii_case(line)) {
                    Some(option) => option.clone(),
                    None => {
                        eprintln!("{}", format!("\"{line}\" is not one of the options").red());
                        continue;
                    }
                }
            };
            if tx.send(Some(value)).is_err() {
                break;
            }
        }
    });

    selection
}

fn cmd_match(
    config: &AnswerBookConfig,
    question: String,
    category: Category,
    all: bool,
) -> anyhow::Result<()> {
    let book = open_book(config)?;
    let found = book.match_question(&question, category);
    let tier = book.tier(found.as_ref());

    let tier_label = match tier {
        ConfidenceTier::Exact | ConfidenceTier::Reusable => tier.to_string().green(),
        ConfidenceTier::Uncertain => tier.to_string().yellow(),
        ConfidenceTier::Unreliable => tier.to_string().red(),
    };

    match &found {
        Some(m) => {
            println!("{}", "Best match".bold().underline());
            println!("  Question:    {}", m.question);
            println!("  Similarity:  {:.4}", m.similarity);
            println!("  Tier:        {}", tier_label);
            if let Some(answer) = book.get_answer(&m.question, category) {
                println!("  Answer:      {}", answer.cyan());
            }
        }
        None => println!("{} ({})", "No match".yellow(), tier_label),
    }

    if all {
        let ranked = book.rank(&question, category);
        if !ranked.is_empty() {
            println!("\n{}", "Candidates:".bold());
            for (i, m) in ranked.iter().enumerate() {
                println!("  {}. {:.4}  {}", i + 1, m.similarity, m.question);
            }
        }
    }

    Ok(())
}

fn cmd_normalize(config: &AnswerBookConfig, text: String) -> anyhow::Result<()> {
    let book = open_book(config)?;
    println!("{}", book.normalize(&text));
    Ok(())
}

fn cmd_score(config: &AnswerBookConfig, a: String, b: String) -> anyhow::Result<()> {
    let book = open_book(config)?;
    println!("  a: {}", book.normalize(&a).dimmed());
    println!("  b: {}", book.normalize(&b).dimmed());
    println!("{} {:.4}", "Similarity:".bold(), book.score(&a, &b));
    Ok(())
}

fn cmd_get(config: &AnswerBookConfig, question: String, category: Category) -> anyhow::Result<()> {
    let book = open_book(config)?;
    match book.get_answer(&question, category) {
        Some(answer) => println!("{}", answer),
        None => println!("{}", format!("No {category} answer for \"{question}\"").red()),
    }
    Ok(())
}

fn cmd_put(
    config: &AnswerBookConfig,
    question: String,
    answer: String,
    category: Category,
) -> anyhow::Result<()> {
    let mut book = open_book(config)?;
    book.put_answer(question, category, answer)?;
    println!("{}", "Answer stored".green().bold());
    Ok(())
}

fn cmd_list(
    config: &AnswerBookConfig,
    category: Option<Category>,
    limit: usize,
) -> anyhow::Result<()> {
    let book = open_book(config)?;
    let categories: Vec<Category> = match category {
        Some(c) => vec![c],
        None => Category::ALL.to_vec(),
    };

    for category in categories {
        let store = book.store(category);
        println!(
            "{}",
            format!("{} ({} answers)", category, store.len()).bold()
        );
        if store.is_empty() {
            println!("  {}", "empty".dimmed());
        }
        for (question, answer) in store.iter().take(limit) {
            println!(
                "  {} {} {}",
                question.chars().take(70).collect::<String>(),
                "=>".dimmed(),
                answer.cyan()
            );
        }
        println!();
    }

    Ok(())
}

fn cmd_stats(config: &AnswerBookConfig) -> anyhow::Result<()> {
    let book = open_book(config)?;
    let keywords = book.matcher().keywords();

    println!("{}", "Answerbook Statistics".bold().underline());
    for category in Category::ALL {
        let store = book.store(category);
        let with_keyword = store.questions().filter(|q| keywords.contains_any(q)).count();
        println!(
            "  {:<14} {:>5} answers  ({} mention a keyword)  {}",
            category.to_string(),
            store.len(),
            with_keyword,
            store.path().display().to_string().dimmed()
        );
    }

    let m = book.matcher().config();
    println!("\n{}", "Matching:".bold());
    println!("  Acceptance floor: {:.2}", m.acceptance_floor);
    println!("  Reuse threshold:  {:.2}", m.reuse_threshold);
    println!("  Keyword boost:    {:.2}", m.keyword_boost);
    println!("  Keywords:         {}", keywords.len());

    Ok(())
}
