//! Thoughtweave CLI binary.
//!
//! Subcommands: `solve` (run the search on a problem), `config` (print the
//! effective configuration).

mod logging;

use clap::{Parser, Subcommand};
use thoughtweave::SearchConfig;
use thoughtweave_cli::{
    render_event, render_solution, solve_text, EffectiveConfig, ModelSettings, SearchArgs,
    APP_NAME,
};

#[derive(Parser, Debug)]
#[command(name = "thoughtweave")]
#[command(about = "Thoughtweave: gated tree search over LLM reasoning steps")]
struct Args {
    #[command(subcommand)]
    cmd: Command,

    /// Log to stderr and print search progress
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Solve a problem, e.g. `thoughtweave solve "A train travels 60 mph for 2 hours. How far?"`
    Solve {
        /// Problem text (all positional args are joined with spaces)
        #[arg(trailing_var_arg = true, required = true)]
        problem: Vec<String>,

        #[command(flatten)]
        search: SearchArgs,

        /// Model name (default: OPENAI_MODEL or gpt-4o-mini)
        #[arg(long, value_name = "NAME")]
        model: Option<String>,

        /// Print the full solution as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration (file, env and flags merged)
    Config {
        #[command(flatten)]
        search: SearchArgs,

        #[arg(long, value_name = "NAME")]
        model: Option<String>,

        #[arg(long)]
        json: bool,
    },
}

fn load_search(search: SearchArgs) -> Result<SearchConfig, Box<dyn std::error::Error>> {
    let file: SearchConfig = thoughtweave_config::load_section(APP_NAME, "search")?;
    Ok(search.apply(file)?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    thoughtweave_config::load_and_apply(APP_NAME, None)?;
    let args = Args::parse();
    logging::init(args.verbose)?;

    match args.cmd {
        Command::Config {
            search,
            model,
            json,
        } => {
            let effective = EffectiveConfig {
                search: load_search(search)?,
                model: ModelSettings::from_env(model),
                config_file: thoughtweave_config::config_path(APP_NAME)
                    .filter(|p| p.is_file())
                    .map(|p| p.display().to_string()),
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&effective)?);
            } else {
                println!("{}", effective.to_text());
            }
        }
        Command::Solve {
            problem,
            search,
            model,
            json,
        } => {
            let config = load_search(search)?;
            let llm = ModelSettings::from_env(model).build_client();

            let (events, printer) = if args.verbose {
                let (tx, mut rx) = tokio::sync::mpsc::channel(64);
                let printer = tokio::spawn(async move {
                    while let Some(event) = rx.recv().await {
                        eprintln!("{}", render_event(&event));
                    }
                });
                (Some(tx), Some(printer))
            } else {
                (None, None)
            };

            let result = solve_text(llm, &problem.join(" "), config, events).await;
            if let Some(printer) = printer {
                let _ = printer.await;
            }
            let solution = result?;

            if json {
                println!("{}", serde_json::to_string_pretty(&solution)?);
            } else {
                println!("{}", render_solution(&solution));
            }
        }
    }
    Ok(())
}
