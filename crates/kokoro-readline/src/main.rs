use std::borrow::Cow::{self, Borrowed, Owned};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::Parser;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

use kokoro_app::{
    CalendarController, GateOutcome, JournalEditor, MoodTrendController, NoticeBoard, NoticeKind,
    ProfileView, RefreshHub, SessionGate,
};
use kokoro_client::{AuthClient, ClientConfig, JournalClient, SessionStore};
use kokoro_core::auth::{AuthProvider, SignUpOutcome};
use kokoro_core::calendar::MonthGrid;
use kokoro_core::entry::{EntryStore, ImageUpload, Month, MoodScore, content_type_for_extension};
use kokoro_core::mood::{MoodBucket, MoodView};
use kokoro_core::validators;

type Repl = Editor<CliHelper, DefaultHistory>;

/// Slash commands with the argument shape hinted once the command is
/// typed out. An empty shape means the command takes no argument.
const COMMANDS: &[(&str, &str)] = &[
    ("/write", ""),
    ("/view", ""),
    ("/edit", ""),
    ("/delete", ""),
    ("/date", "YYYY-MM-DD"),
    ("/image", "path/to/photo.jpg"),
    ("/cal", "prev|next"),
    ("/mood", "prev|next"),
    ("/profile", ""),
    ("/logout", ""),
    ("/help", ""),
];

#[derive(Parser)]
#[command(name = "kokoro", about = "A mood journal for your terminal")]
struct Args {
    /// Path to a config file (defaults to ~/.config/kokoro/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// The redirect fragment from an OAuth callback, tokens included
    #[arg(long)]
    oauth_callback: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// Rustyline helper: completes slash commands, colors the command token,
/// and hints the expected argument once a command is typed out.
struct CliHelper;

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        if !line.starts_with('/') || line.contains(' ') {
            return Ok((0, vec![]));
        }
        let candidates: Vec<Pair> = COMMANDS
            .iter()
            .filter(|(name, _)| name.starts_with(line))
            .map(|(name, _)| Pair {
                display: name.to_string(),
                replacement: name.to_string(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if !line.starts_with('/') {
            return Borrowed(line);
        }
        // Only the command token gets color; arguments stay plain.
        match line.split_once(' ') {
            Some((cmd, rest)) => Owned(format!("{} {}", cmd.bright_cyan(), rest)),
            None => Owned(line.bright_cyan().to_string()),
        }
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Owned(hint.dimmed().to_string())
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if !line.starts_with('/') {
            return None;
        }
        match line.split_once(' ') {
            // A full command awaiting its argument: hint its shape.
            Some((cmd, "")) => COMMANDS
                .iter()
                .find(|(name, arg)| *name == cmd && !arg.is_empty())
                .map(|(_, arg)| arg.to_string()),
            Some(_) => None,
            // Mid-command: hint the rest of the closest command name.
            None => COMMANDS
                .iter()
                .find(|(name, _)| name.starts_with(line) && name.len() > line.len())
                .map(|(name, _)| name[line.len()..].to_string()),
        }
    }
}

impl Validator for CliHelper {}

enum LoginOutcome {
    /// Credentials were submitted; the optional value is a pasted OAuth
    /// redirect fragment for the gate to consume.
    Submitted(Option<String>),
    Quit,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| if args.verbose { "debug" } else { "warn" }.into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match &args.config {
        Some(path) => ClientConfig::from_file(path)?,
        None => ClientConfig::load()?,
    };
    let auth = Arc::new(AuthClient::new(&config, SessionStore::open_default()?));
    let gate = Arc::new(SessionGate::new(auth.clone()));

    let mut rl: Repl = Editor::new()?;
    rl.set_helper(Some(CliHelper));

    // ===== Session Gate =====
    // Nothing below renders until a session is established; every failed
    // resolution drops back to the login menu.
    let mut fragment = args.oauth_callback.clone();
    let session = loop {
        match gate.resolve(fragment.as_deref()).await {
            GateOutcome::Ready(session) | GateOutcome::AlreadyInitialized(session) => {
                break session;
            }
            GateOutcome::RedirectToLogin => match login_menu(&mut rl, auth.as_ref()).await? {
                LoginOutcome::Submitted(pasted) => fragment = pasted,
                LoginOutcome::Quit => {
                    println!("{}", "Goodbye!".bright_green());
                    return Ok(());
                }
            },
        }
    };

    // ===== Page Setup =====
    let entries: Arc<dyn EntryStore> = Arc::new(JournalClient::new(&config, auth.clone()));
    let notices = Arc::new(NoticeBoard::new());
    let hub = Arc::new(RefreshHub::new());
    let today = Local::now().date_naive();

    let editor = JournalEditor::new(entries.clone(), hub.clone(), notices.clone(), today);
    let calendar = Arc::new(CalendarController::new(
        entries.clone(),
        notices.clone(),
        today,
    ));
    let mood = Arc::new(MoodTrendController::new(
        entries.clone(),
        notices.clone(),
        Month::containing(today),
    ));
    hub.register("calendar", calendar.clone()).await;
    hub.register("mood", mood.clone()).await;

    let _ = editor.load_date(today).await;
    calendar.load().await;
    mood.load().await;
    drain_notices(&notices);

    // Watch for sign-out in the background; the loop below checks the flag.
    let signed_out = Arc::new(AtomicBool::new(false));
    tokio::spawn({
        let gate = gate.clone();
        let signed_out = signed_out.clone();
        async move {
            gate.await_sign_out().await;
            signed_out.store(true, Ordering::SeqCst);
        }
    });

    let profile = ProfileView::from_session(&session);
    println!("{}", "=== kokoro ===".bright_magenta().bold());
    println!(
        "{}",
        format!("signed in as {} - today is {}", profile.email, today).bright_black()
    );
    println!(
        "{}",
        "Type '/help' for commands, or 'quit' to exit.".bright_black()
    );
    println!();
    render_entry_state(&editor.state().await);

    // ===== Main REPL Loop =====
    loop {
        if signed_out.load(Ordering::SeqCst) {
            println!("{}", "Session ended. Goodbye!".yellow());
            break;
        }

        let readline = rl.readline("kokoro> ");
        match readline {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed == "quit" || trimmed == "exit" {
                    println!("{}", "Goodbye!".bright_green());
                    break;
                }
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&line);

                let (command, rest) = match trimmed.split_once(' ') {
                    Some((command, rest)) => (command, rest.trim()),
                    None => (trimmed, ""),
                };

                match command {
                    "/help" => print_help(),
                    "/view" => render_entry_state(&editor.state().await),
                    "/date" => match rest.parse::<NaiveDate>() {
                        Ok(date) => {
                            let _ = editor.load_date(date).await;
                            calendar.select(date).await;
                            render_entry_state(&editor.state().await);
                        }
                        Err(_) => {
                            println!("{}", "usage: /date YYYY-MM-DD".bright_black());
                        }
                    },
                    "/write" => {
                        let state = editor.state().await;
                        if state.current.is_some() && !state.editing {
                            println!(
                                "{}",
                                "An entry already exists for this date. Use '/edit' to change it."
                                    .yellow()
                            );
                        } else {
                            compose(&mut rl, &editor).await?;
                        }
                    }
                    "/edit" => {
                        if editor.start_editing().await {
                            compose(&mut rl, &editor).await?;
                        } else {
                            println!("{}", "No entry to edit on this date.".yellow());
                        }
                    }
                    "/delete" => {
                        if editor.state().await.current.is_none() {
                            println!("{}", "No entry to delete on this date.".yellow());
                        } else {
                            let answer = rl.readline("Delete this entry? (y/n) ")?;
                            if answer.trim().eq_ignore_ascii_case("y") {
                                let _ = editor.delete_current().await;
                            } else {
                                println!("{}", "Kept.".bright_black());
                            }
                        }
                    }
                    "/image" => {
                        if rest.is_empty() {
                            println!("{}", "usage: /image <path>".bright_black());
                        } else {
                            attach_image(&editor, Path::new(rest)).await;
                        }
                    }
                    "/cal" => {
                        match rest {
                            "prev" => calendar.prev_month().await,
                            "next" => calendar.next_month().await,
                            _ => {}
                        }
                        render_grid(&calendar.grid().await, calendar.streak().await);
                    }
                    "/mood" => {
                        match rest {
                            "prev" => mood.prev_month().await,
                            "next" => mood.next_month().await,
                            _ => {}
                        }
                        render_mood(mood.month().await, &mood.view().await);
                    }
                    "/profile" => render_profile(auth.as_ref()).await,
                    "/logout" => {
                        if let Err(e) = auth.sign_out().await {
                            eprintln!("{}", format!("Sign-out failed: {}", e).red());
                        }
                        println!("{}", "Signed out. Goodbye!".bright_green());
                        break;
                    }
                    _ => println!("{}", "Unknown command".bright_black()),
                }
                drain_notices(&notices);
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    Ok(())
}

/// Login menu shown when the gate finds no session.
async fn login_menu(rl: &mut Repl, auth: &AuthClient) -> Result<LoginOutcome> {
    println!("{}", "=== kokoro sign in ===".bright_magenta().bold());
    println!("  1) email + password");
    println!("  2) create an account");
    println!("  3) one-time sign-in link");
    println!("  4) sign in with Google");

    loop {
        let choice = rl.readline("choice> ")?;
        match choice.trim() {
            "1" => {
                let email = rl.readline("email: ")?;
                let password = rl.readline("password: ")?;
                let (email, password) = (email.trim(), password.trim());
                if let Err(e) = validators::validate_email(email)
                    .and_then(|_| validators::validate_password(password))
                {
                    println!("{}", e.to_string().red());
                    continue;
                }
                match auth.sign_in_with_password(email, password).await {
                    Ok(_) => return Ok(LoginOutcome::Submitted(None)),
                    Err(e) => println!("{}", format!("Sign-in failed: {}", e).red()),
                }
            }
            "2" => {
                let email = rl.readline("email: ")?;
                let password = rl.readline("password: ")?;
                let confirmation = rl.readline("confirm password: ")?;
                let (email, password) = (email.trim(), password.trim());
                if let Err(e) =
                    validators::validate_sign_up(email, password, confirmation.trim())
                {
                    println!("{}", e.to_string().red());
                    continue;
                }
                match auth.sign_up(email, password).await {
                    Ok(SignUpOutcome::Session(_)) => {
                        return Ok(LoginOutcome::Submitted(None));
                    }
                    Ok(SignUpOutcome::ConfirmationPending) => {
                        println!(
                            "{}",
                            "Account created. Check your inbox to confirm, then sign in."
                                .bright_green()
                        );
                    }
                    Err(e) => println!("{}", format!("Sign-up failed: {}", e).red()),
                }
            }
            "3" => {
                let email = rl.readline("email: ")?;
                let email = email.trim();
                if let Err(e) = validators::validate_email(email) {
                    println!("{}", e.to_string().red());
                    continue;
                }
                match auth.send_magic_link(email).await {
                    Ok(()) => println!(
                        "{}",
                        "Link sent. Open it, then paste the redirect fragment below."
                            .bright_green()
                    ),
                    Err(e) => println!("{}", format!("Could not send link: {}", e).red()),
                }
                let pasted = rl.readline("fragment (#access_token=...): ")?;
                return Ok(LoginOutcome::Submitted(Some(pasted.trim().to_string())));
            }
            "4" => {
                println!("Open this URL in a browser:");
                println!("{}", auth.authorize_url("google").bright_cyan());
                let pasted = rl.readline("fragment (#access_token=...): ")?;
                return Ok(LoginOutcome::Submitted(Some(pasted.trim().to_string())));
            }
            "quit" | "exit" => return Ok(LoginOutcome::Quit),
            _ => println!("{}", "Pick 1-4, or 'quit'.".bright_black()),
        }
    }
}

/// Prompts for content and mood, then saves through the editor.
async fn compose(rl: &mut Repl, editor: &JournalEditor) -> Result<()> {
    let content = rl.readline("How was your day? ")?;
    let score = loop {
        let raw = rl.readline("Mood (1-10): ")?;
        match raw.trim().parse::<u8>().map_err(|_| ()).and_then(|n| {
            MoodScore::new(n).map_err(|_| ())
        }) {
            Ok(score) => break score,
            Err(()) => println!("{}", "Enter a number from 1 to 10.".bright_black()),
        }
    };
    if let Ok(entry) = editor.submit(&content, score).await {
        println!(
            "{}",
            format!("{} {} saved", entry.mood_score.emoji(), entry.date).green()
        );
    }
    Ok(())
}

async fn attach_image(editor: &JournalEditor, path: &Path) {
    let content_type = path
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(content_type_for_extension);
    let Some(content_type) = content_type else {
        println!(
            "{}",
            "Unsupported image type: use JPEG, PNG, GIF or WebP.".red()
        );
        return;
    };
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            println!("{}", format!("Could not read {}: {}", path.display(), e).red());
            return;
        }
    };
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("image")
        .to_string();
    let upload = match ImageUpload::new(file_name, content_type, bytes) {
        Ok(upload) => upload,
        Err(e) => {
            println!("{}", e.to_string().red());
            return;
        }
    };
    if let Ok(url) = editor.attach_image(upload).await {
        println!("{}", format!("Image attached: {}", url).green());
    }
}

async fn render_profile(auth: &AuthClient) {
    match auth.current_session().await {
        Ok(Some(session)) => {
            let profile = ProfileView::from_session(&session);
            println!("{}", format!("({}) {}", profile.initial, profile.email).bold());
            match profile.member_since {
                Some(date) => println!("member since {}", date),
                None => println!("{}", "member since: unknown".bright_black()),
            }
        }
        Ok(None) => println!("{}", "Not signed in.".yellow()),
        Err(e) => eprintln!("{}", format!("Error: {}", e).red()),
    }
}

fn render_entry_state(state: &kokoro_app::editor::EditorState) {
    match &state.current {
        Some(entry) => {
            println!(
                "{}",
                format!(
                    "{} {} ({}/10)",
                    entry.date,
                    entry.mood_score.emoji(),
                    entry.mood_score.value()
                )
                .bold()
            );
            for line in entry.content.lines() {
                println!("  {}", line);
            }
            if let Some(url) = &entry.image_url {
                println!("  {}", format!("[image] {}", url).bright_cyan());
            }
        }
        None => println!(
            "{}",
            format!("No entry for {} yet. '/write' to add one.", state.selected_date)
                .bright_black()
        ),
    }
}

fn render_grid(grid: &MonthGrid, streak: Option<u32>) {
    println!("{}", format!("      {}", grid.month()).bold());
    println!("{}", "Su Mo Tu We Th Fr Sa".bright_black());

    let mut row: Vec<String> = vec!["  ".to_string(); grid.leading_blanks() as usize];
    for cell in grid.cells() {
        let day = format!("{:>2}", cell.day);
        let styled = match cell.mood_score.map(MoodBucket::for_score) {
            Some(MoodBucket::Low) => day.red(),
            Some(MoodBucket::Mid) => day.yellow(),
            Some(MoodBucket::Good) => day.green(),
            Some(MoodBucket::Great) => day.bright_green(),
            None if cell.has_entry => day.green(),
            None => day.normal(),
        };
        let styled = if cell.is_today { styled.bold().underline() } else { styled };
        let styled = if cell.selected { styled.reversed() } else { styled };
        row.push(styled.to_string());
        if row.len() == 7 {
            println!("{}", row.join(" "));
            row.clear();
        }
    }
    if !row.is_empty() {
        println!("{}", row.join(" "));
    }

    match streak {
        Some(days) => println!("{}", format!("current streak: {} days", days).bright_yellow()),
        None => println!("{}", "streak unavailable".bright_black()),
    }
}

fn render_mood(month: Month, view: &MoodView) {
    println!("{}", format!("      {}", month).bold());
    match view {
        MoodView::Empty => println!("{}", "no entries yet".bright_black()),
        MoodView::Chart { series, .. } => {
            for (offset, point) in series.points().iter().enumerate() {
                let day = offset + 1;
                match point {
                    Some(score) => {
                        let bar = "#".repeat(score.value() as usize);
                        let bar = match MoodBucket::for_score(*score) {
                            MoodBucket::Low => bar.red(),
                            MoodBucket::Mid => bar.yellow(),
                            MoodBucket::Good => bar.green(),
                            MoodBucket::Great => bar.bright_green(),
                        };
                        println!("{:>2} {} {}", day, bar, score.emoji());
                    }
                    None => println!("{:>2} {}", day, "-".bright_black()),
                }
            }
            println!("{}", view.average_label().bright_black());
        }
    }
}

fn drain_notices(notices: &NoticeBoard) {
    if let Some(notice) = notices.take() {
        match notice.kind {
            NoticeKind::Success => println!("{}", notice.message.green()),
            NoticeKind::Error => println!("{}", notice.message.red()),
        }
    }
}

fn print_help() {
    let lines = [
        ("/write", "write today's (or the selected date's) entry"),
        ("/view", "show the selected date's entry"),
        ("/edit", "edit the selected date's entry"),
        ("/delete", "delete the selected date's entry"),
        ("/date YYYY-MM-DD", "select a date"),
        ("/image <path>", "attach an image to the next save"),
        ("/cal [prev|next]", "show or navigate the calendar"),
        ("/mood [prev|next]", "show or navigate the mood chart"),
        ("/profile", "show account details"),
        ("/logout", "sign out"),
        ("quit", "exit"),
    ];
    for (command, what) in lines {
        println!("  {:<18} {}", command.bright_cyan(), what);
    }
}
