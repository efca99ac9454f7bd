//! Chartbrief CLI.
//!
//! `serve` runs the web form; `summarize` runs one summary end to end
//! from the terminal; `seed` loads the demo encounter; `templates`
//! manages the prompt template store.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use chartbrief::config::{self, AppConfig};
use chartbrief::db;
use chartbrief::models::PromptTemplate;
use chartbrief::seed;
use chartbrief::server;
use chartbrief::summary::{
    generate_summary, ChatCompletionClient, CompletionResult, SummaryJob, SummaryStyle,
};

#[derive(Parser)]
#[command(name = "chartbrief", version, about = "ER course summaries from clinical records")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the web form and JSON API.
    Serve {
        #[arg(long, default_value_t = 8734)]
        port: u16,
    },
    /// Generate one summary from the terminal.
    Summarize {
        patient_id: String,
        /// Inclusive start bound, 14-digit YYYYMMDDHHMMSS.
        #[arg(long)]
        start: Option<String>,
        /// Inclusive end bound, 14-digit YYYYMMDDHHMMSS.
        #[arg(long)]
        end: Option<String>,
        #[arg(long, default_value = "progress_summary")]
        template: String,
        /// Override the template with a custom instruction.
        #[arg(long)]
        instruction: Option<String>,
        /// Focus area, repeatable.
        #[arg(long = "focus")]
        focus_areas: Vec<String>,
        #[arg(long, value_enum, default_value_t = StyleArg::Bulleted)]
        style: StyleArg,
    },
    /// Load the demo encounter and stock templates.
    Seed,
    /// Manage prompt templates.
    Templates {
        #[command(subcommand)]
        command: TemplateCommand,
    },
}

#[derive(Subcommand)]
enum TemplateCommand {
    /// List stored templates.
    List,
    /// Create a new template (fails if the name exists).
    Create {
        name: String,
        content: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Overwrite an existing template's content.
    Update { name: String, content: String },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum StyleArg {
    Bulleted,
    Narrative,
}

impl From<StyleArg> for SummaryStyle {
    fn from(arg: StyleArg) -> Self {
        match arg {
            StyleArg::Bulleted => SummaryStyle::Bulleted,
            StyleArg::Narrative => SummaryStyle::Narrative,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env();

    match cli.command {
        Command::Serve { port } => {
            tracing::info!("chartbrief v{} starting", config::APP_VERSION);
            server::serve(config, port).await
        }
        Command::Summarize {
            patient_id,
            start,
            end,
            template,
            instruction,
            focus_areas,
            style,
        } => summarize_once(
            &config,
            &patient_id,
            start.as_deref(),
            end.as_deref(),
            &template,
            instruction.as_deref(),
            &focus_areas,
            style.into(),
        ),
        Command::Seed => {
            let conn = db::open_database(&config.db_path)
                .context("cannot open database")?;
            let inserted = seed::seed_demo_data(&conn)?;
            println!("Seeded {inserted} records into {}", config.db_path.display());
            Ok(())
        }
        Command::Templates { command } => run_template_command(&config, command),
    }
}

#[allow(clippy::too_many_arguments)]
fn summarize_once(
    config: &AppConfig,
    patient_id: &str,
    start: Option<&str>,
    end: Option<&str>,
    template: &str,
    instruction: Option<&str>,
    focus_areas: &[String],
    style: SummaryStyle,
) -> anyhow::Result<()> {
    let conn = db::open_database(&config.db_path).context("cannot open database")?;
    let records = db::fetch_patient_records(&conn, patient_id, start, end)?;
    let templates = db::load_templates(&conn)?;

    let backend =
        ChatCompletionClient::new(&config.api_base_url, config.api_key.clone(), &config.model)?;

    let job = SummaryJob {
        patient_id,
        records: &records,
        template_name: template,
        custom_instruction: instruction,
        focus_areas,
        style,
    };

    let outcome = generate_summary(&job, &templates, &backend)?;

    if outcome.used_fallback_template {
        eprintln!("warning: template '{template}' not found, default instruction used");
    }
    eprintln!(
        "rendered {} nursing / {} vitals / {} labs records",
        outcome.counts.nursing, outcome.counts.vitals, outcome.counts.labs
    );

    match outcome.result {
        CompletionResult::Success { summary } => {
            println!("{summary}");
            Ok(())
        }
        CompletionResult::Failure { diagnostic } => bail!("summary failed: {diagnostic}"),
    }
}

fn run_template_command(config: &AppConfig, command: TemplateCommand) -> anyhow::Result<()> {
    let conn = db::open_database(&config.db_path).context("cannot open database")?;
    match command {
        TemplateCommand::List => {
            let templates = db::load_templates(&conn)?;
            if templates.is_empty() {
                println!("no templates stored (run `chartbrief seed` for the stock set)");
            }
            for t in templates.iter() {
                println!(
                    "{}  [{}]",
                    t.name,
                    t.description.as_deref().unwrap_or("no description")
                );
            }
            Ok(())
        }
        TemplateCommand::Create {
            name,
            content,
            description,
        } => {
            db::create_template(
                &conn,
                &PromptTemplate {
                    name: name.clone(),
                    content,
                    description,
                },
            )?;
            println!("created template '{name}'");
            Ok(())
        }
        TemplateCommand::Update { name, content } => {
            db::update_template(&conn, &name, &content)?;
            println!("updated template '{name}'");
            Ok(())
        }
    }
}
