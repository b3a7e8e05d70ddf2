//! VoiceDebate CLI - timed debate against an automated opponent
//!
//! Runs one debate session in the terminal. Typed lines stand in for the
//! microphone: `/talk` takes the floor, every line typed while the floor is
//! held becomes a finished utterance, `/stop` hands the floor back.

use clap::Parser;
use colored::Colorize;
use std::env;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::io::BufRead;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use voicedebate_core::{
    CaptureError, CaptureSink, Config, JsonFileReporter, LlmConfig, LlmEndpoint,
    LlmResponseGenerator, Participants, RotatingRebuttals, SessionController, SessionHandle,
    SessionSignal, SignalCallback, Side, Speaker, SpeechProvider, format_clock, is_low_time,
};

#[derive(Parser)]
#[command(
    name = "voicedebate",
    version,
    about = "VoiceDebate - argue a topic against an automated opponent",
    long_about = "A timed debate session with an automated opponent and moderator. \
                  The opponent can be backed by any OpenAI-compatible API."
)]
struct Cli {
    /// Path to a TOML session config
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the debate topic
    #[arg(short, long, value_name = "TOPIC")]
    topic: Option<String>,

    /// Debate length in seconds
    #[arg(short, long, value_name = "SECONDS")]
    duration: Option<u32>,

    /// Model for the opponent; without one the opponent uses canned rebuttals
    #[arg(short = 'm', long, value_name = "MODEL")]
    llm_model: Option<String>,

    /// Directory where finished debate results are saved as JSON
    #[arg(long, value_name = "DIR")]
    save_dir: Option<PathBuf>,

    /// Seed for scoring and moderator commentary
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Run without speech input (watch the opponent only)
    #[arg(long)]
    no_mic: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let mut config = match cli.config {
        Some(ref path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(topic) = cli.topic.clone() {
        config.topic.title = topic;
        config.topic.description = None;
    }
    if let Some(duration) = cli.duration {
        config.session.duration_secs = duration;
    }
    if let Some(model) = cli.llm_model.clone() {
        let llm = config.llm.take().unwrap_or_else(|| LlmConfig::new(&model));
        config.llm = Some(LlmConfig { model, ..llm });
    }

    let participants = config.participants.to_participants();
    print_header(&config, &participants);

    let mut builder = SessionController::builder(config.clone());

    let keyboard = KeyboardSpeech::default();
    if !cli.no_mic {
        builder = builder.speech(Box::new(keyboard.clone()));
    }
    if let Some(seed) = cli.seed {
        builder = builder.seed(seed);
    }
    if let Some(llm) = config.llm.clone() {
        let endpoint = api_endpoint();
        let fallback = RotatingRebuttals::new(config.opponent.rebuttals.clone());
        builder = builder.generator(Arc::new(LlmResponseGenerator::new(&endpoint, llm, fallback)?));
    }
    if let Some(ref dir) = cli.save_dir {
        builder = builder.reporter(Arc::new(JsonFileReporter::new(dir)));
    }

    let mut session = builder
        .build()?
        .with_callback(create_console_callback(participants.clone()));

    info!(
        session = %session.id(),
        llm = config.llm.is_some(),
        speech = !cli.no_mic,
        "session ready"
    );

    let handle = session.handle();
    tokio::spawn(read_commands(stdin_lines(), handle, keyboard, cli.no_mic));

    let result = session.run().await?;

    println!();
    println!("{}", "═".repeat(70).bright_blue());
    match result {
        Some(result) => {
            let winner = participants.get(result.winner);
            println!(
                "{}",
                format!("  {} wins the debate.", winner.name)
                    .bright_green()
                    .bold()
            );
            println!(
                "  {} {:.1}/10   {} {:.1}/10",
                participants.human.name.bright_cyan(),
                result.human_score,
                participants.opponent.name.bright_red(),
                result.opponent_score
            );
        }
        None => println!("{}", "  Debate abandoned.".yellow().bold()),
    }
    println!("{}", "═".repeat(70).bright_blue());
    println!();

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }
}

/// API configuration from the environment.
fn api_endpoint() -> LlmEndpoint {
    let api_base = env::var("OPENAI_API_BASE")
        .or_else(|_| env::var("OPENAI_BASE_URL"))
        .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());

    let api_key = env::var("OPENAI_API_KEY").unwrap_or_else(|_| {
        eprintln!(
            "{}",
            "Warning: OPENAI_API_KEY not set. The opponent may fall back to canned rebuttals."
                .yellow()
        );
        String::new()
    });

    LlmEndpoint::new(api_base, api_key)
}

fn print_header(config: &Config, participants: &Participants) {
    println!();
    println!("{}", "═".repeat(70).bright_blue());
    println!("{}", "  VoiceDebate".bright_blue().bold());
    println!("{}", "═".repeat(70).bright_blue());
    println!();
    println!("{} {}", "Topic:".bold(), config.topic.title.bright_white());
    if let Some(ref description) = config.topic.description {
        println!("  {}", description.dimmed());
    }
    println!(
        "{} {}",
        "Time:".bold(),
        format_clock(config.session.duration_secs)
    );
    println!(
        "{} {} vs {}",
        "Debaters:".bold(),
        participants.human.name.bright_cyan(),
        participants.opponent.name.bright_red()
    );
    println!();
    println!(
        "{}",
        "Commands: /talk to speak, /stop to yield, /end to finish early, /quit to leave".dimmed()
    );
    println!("{}", "─".repeat(70).dimmed());
}

/// Speech provider fed by the terminal. Lines typed while the floor is held
/// are delivered as finished utterances.
#[derive(Clone, Default)]
struct KeyboardSpeech {
    live: Arc<Mutex<Option<CaptureSink>>>,
}

impl KeyboardSpeech {
    /// Deliver a typed line. Returns false when nobody is listening.
    fn say(&self, line: &str) -> bool {
        match self.live.lock() {
            Ok(live) => live.as_ref().is_some_and(|sink| sink.finalize(line)),
            Err(_) => false,
        }
    }
}

impl SpeechProvider for KeyboardSpeech {
    fn name(&self) -> &str {
        "keyboard"
    }

    fn start(&mut self, sink: CaptureSink) -> Result<(), CaptureError> {
        let mut live = self
            .live
            .lock()
            .map_err(|_| CaptureError::Provider("keyboard state poisoned".to_string()))?;
        *live = Some(sink);
        Ok(())
    }

    fn stop(&mut self) {
        if let Ok(mut live) = self.live.lock() {
            live.take();
        }
    }
}

/// Read the terminal on a plain thread. It is never joined, so a pending
/// read does not keep the process alive once `main` returns.
fn stdin_lines() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

async fn read_commands(
    mut lines: mpsc::UnboundedReceiver<String>,
    handle: SessionHandle,
    keyboard: KeyboardSpeech,
    no_mic: bool,
) {
    while let Some(line) = lines.recv().await {
        let line = line.trim();
        let sent = match line {
            "" => continue,
            "/talk" if no_mic => {
                eprintln!("{}", "Speech input is disabled for this session.".yellow());
                continue;
            }
            "/talk" => handle.start_capture(),
            "/stop" => handle.stop_capture(),
            "/end" => handle.end_now(),
            "/quit" => {
                let _ = handle.teardown();
                break;
            }
            _ => {
                if !keyboard.say(line) {
                    eprintln!("{}", "Type /talk to take the floor first.".dimmed());
                }
                continue;
            }
        };
        if sent.is_err() {
            break;
        }
    }
}

/// Create a callback that prints session signals to the console.
fn create_console_callback(participants: Participants) -> SignalCallback {
    let capturing = AtomicBool::new(false);

    Box::new(move |signal| match signal {
        SessionSignal::PhaseChanged(phase) => {
            println!("{}", format!("  [{:?}]", phase).bright_magenta().bold());
        }
        SessionSignal::Tick { remaining } => {
            if remaining % 60 == 0 || (is_low_time(remaining) && remaining % 10 == 0) {
                let clock = format!("  ⏱ {} left", format_clock(remaining));
                if is_low_time(remaining) {
                    println!("{}", clock.red().bold());
                } else {
                    println!("{}", clock.dimmed());
                }
            }
        }
        SessionSignal::Transcript(entry) => {
            let name = match entry.speaker {
                Speaker::Moderator => entry.speaker.display_name().bright_magenta().bold(),
                Speaker::Human => participants.human.name.bright_cyan().bold(),
                Speaker::Opponent => participants.opponent.name.bright_red().bold(),
            };
            println!();
            println!("{} {}", "▶".bright_cyan(), name);
            // Word wrap and indent the content
            let wrapped = textwrap(&entry.text, 66);
            for line in wrapped.lines() {
                println!("  {}", line);
            }
        }
        SessionSignal::Feedback(feedback) => {
            let who = match feedback.side {
                Side::Human => &participants.human.name,
                Side::Opponent => &participants.opponent.name,
            };
            println!(
                "  {} {} {}",
                "✎".yellow(),
                format!("{} scored {:.1}:", who, feedback.score).yellow(),
                feedback.summary.dimmed()
            );
        }
        SessionSignal::Turn(turn) => {
            let now = turn.human_capturing();
            if capturing.swap(now, Ordering::Relaxed) == now {
                return;
            }
            if now {
                if turn.opponent_interrupted() {
                    println!("{}", "  (you cut in on the opponent)".dimmed());
                }
                println!("{}", "  🎙 You have the floor. Type your argument.".bright_cyan());
            } else {
                println!("{}", "  Floor released.".dimmed());
            }
        }
        SessionSignal::Warning(warning) => {
            eprintln!("{} {}", "Warning:".yellow().bold(), warning);
        }
        SessionSignal::ResultReady(_) => {
            // Handled in main
        }
    })
}

/// Simple text wrapping function.
fn textwrap(text: &str, width: usize) -> String {
    let mut result = String::new();
    let mut current_line_len = 0;

    for word in text.split_whitespace() {
        if current_line_len + word.len() + 1 > width && current_line_len > 0 {
            result.push('\n');
            current_line_len = 0;
        }
        if current_line_len > 0 {
            result.push(' ');
            current_line_len += 1;
        }
        result.push_str(word);
        current_line_len += word.len();
    }

    result
}
