use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use secrecy::SecretString;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use botscript::ast::BotDef;
use botscript::config::{self, LlmConfig, SecretConfig};
use botscript::engine::DialogueSession;
use botscript::io::{ConsoleIo, IoHandler};
use botscript::recognizer::llm::LlmRecognizer;
use botscript::recognizer::rule::RuleRecognizer;
use botscript::recognizer::IntentRecognizer;
use botscript::Error;

#[derive(Parser)]
#[command(author, version, about = "Run a customer-service bot script")]
struct Cli {
    /// Path to the bot script
    script: PathBuf,

    /// Classify intents with an LLM API instead of the built-in rule matcher
    #[arg(long)]
    llm: bool,

    /// Enable the debug channel (intent traces, recognizer diagnostics)
    #[arg(short, long)]
    debug: bool,

    /// Path to the recognizer config file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Path to the secret file holding the API key
    #[arg(short, long, default_value = "secret.json")]
    secret: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<(), Error> {
    let io = Arc::new(ConsoleIo::new(cli.debug));
    let recognizer = build_recognizer(cli)?;

    let bot = load_bot(&cli.script)?;
    println!("loaded bot '{}' from {}", bot.name, cli.script.display());
    println!("type 'help' for session commands");

    let mut session = DialogueSession::new(Arc::clone(&bot), Arc::clone(&recognizer), io.clone());
    session.start().await?;

    loop {
        if session.is_finished() {
            println!("conversation ended");
            break;
        }

        print!(">>> ");
        use std::io::Write;
        std::io::stdout()
            .flush()
            .map_err(|e| Error::Internal(e.to_string()))?;
        let line = match io.read_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => return Err(Error::Internal(e.to_string())),
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match input {
            "quit" | "exit" | "q" => break,
            "help" | "h" | "?" => {
                print_help();
                continue;
            }
            "state" => {
                print_state(&session, &bot);
                continue;
            }
            "vars" => {
                print_vars(&session);
                continue;
            }
            "reload" => {
                println!("reloading {}", cli.script.display());
                match load_bot(&cli.script) {
                    Ok(reloaded) => {
                        let mut fresh = DialogueSession::new(
                            Arc::clone(&reloaded),
                            Arc::clone(&recognizer),
                            io.clone(),
                        );
                        match fresh.start().await {
                            Ok(()) => session = fresh,
                            Err(e) => eprintln!("[error] {}", e),
                        }
                    }
                    Err(e) => eprintln!("[error] {}", e),
                }
                continue;
            }
            _ => {}
        }

        // a runtime error aborts this turn only; the session continues
        match session.turn(input).await {
            Ok(true) => {}
            Ok(false) => {
                println!("conversation ended");
                break;
            }
            Err(e) => eprintln!("[error] {}", e),
        }
    }

    Ok(())
}

fn load_bot(path: &PathBuf) -> Result<Arc<BotDef>, Error> {
    let source = std::fs::read_to_string(path)
        .map_err(|e| Error::Internal(format!("cannot read {}: {}", path.display(), e)))?;
    let mut program = botscript::compile(&source)?;
    // a script may declare several bots; the first one runs
    Ok(Arc::new(program.bots.remove(0)))
}

fn build_recognizer(cli: &Cli) -> Result<Arc<dyn IntentRecognizer>, Error> {
    if !cli.llm {
        return Ok(Arc::new(RuleRecognizer::new()));
    }

    let llm_config: LlmConfig = if cli.config.exists() {
        config::from_file(&cli.config)?
    } else {
        LlmConfig::default()
    };
    debug!(?llm_config, "recognizer config");

    let secret: SecretConfig = if cli.secret.exists() {
        config::from_file(&cli.secret)?
    } else {
        SecretConfig::default()
    };
    let api_key = {
        use secrecy::ExposeSecret;
        if secret.api_key.expose_secret().is_empty() {
            SecretString::new(std::env::var("OPENAI_API_KEY").unwrap_or_default())
        } else {
            secret.api_key
        }
    };

    Ok(Arc::new(LlmRecognizer::new(llm_config, api_key)))
}

fn print_help() {
    println!("session commands:");
    println!("  quit, exit, q  leave the session");
    println!("  help, h, ?     show this help");
    println!("  state          show the current state and its transitions");
    println!("  vars           show bot variables");
    println!("  reload         reload the script and restart the dialogue");
}

fn print_state(session: &DialogueSession, bot: &BotDef) {
    let name = session.current_state();
    println!("current state: {}", name);
    if let Some(state) = bot.state(name) {
        for transition in &state.transitions {
            let guard = if transition.guard.is_some() {
                " (guarded)"
            } else {
                ""
            };
            println!(
                "  when {} -> {}{}",
                transition.intent_name, transition.target_state, guard
            );
        }
    }
}

fn print_vars(session: &DialogueSession) {
    let variables = session.variables();
    let mut names: Vec<&String> = variables.keys().collect();
    names.sort();
    for name in names {
        println!("  {} = {}", name, variables[name].to_text());
    }
}
