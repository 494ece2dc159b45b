use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Result, anyhow};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::api::ApiClient;
use crate::auth::UserCache;
use crate::chat::view;
use crate::chat::{
    ChatController, ChatEvent, ChatMessage, ChatObserver, Dialogs, SendOutcome, Sender,
    validate_chat_name,
};
use crate::core::{AppConfig, Route};

const HELP: &str = "\
/new                 start a new chat
/list                list chats
/open <n|id>         open a chat
/rename <n|id> <t>   rename a chat
/delete <n|id>       delete a chat
/image <prompt>      generate an image
/export <file>       write the page as HTML
/logout              sign out
/help                show this help
/quit                leave";

/// Prompts backed by the line editor.
struct TerminalDialogs<'a> {
    rl: &'a mut DefaultEditor,
}

impl Dialogs for TerminalDialogs<'_> {
    fn prompt_chat_name(&mut self) -> Option<String> {
        loop {
            match self.rl.readline("Chat name: ") {
                Ok(line) => match validate_chat_name(&line) {
                    Some(name) => return Some(name),
                    None => println!("Please enter a name (Ctrl-C to cancel)"),
                },
                Err(_) => return None,
            }
        }
    }

    fn confirm(&mut self, question: &str) -> bool {
        match self.rl.readline(&format!("{} [y/N] ", question)) {
            Ok(answer) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }
}

/// Prints streamed replies as they arrive. Whole transcripts are printed
/// by the loop itself.
#[derive(Default)]
struct TerminalPrinter {
    streaming: bool,
}

impl ChatObserver for TerminalPrinter {
    fn notify(&mut self, event: &ChatEvent) {
        match event {
            ChatEvent::MessageUpdated { fragment, .. } => {
                self.streaming = true;
                print!("{}", fragment);
                let _ = io::stdout().flush();
            }
            ChatEvent::LoadingChanged(false) if self.streaming => {
                self.streaming = false;
                println!();
            }
            ChatEvent::MessageAdded(msg) if msg.is_error => {
                eprintln!("! {}", msg.content);
            }
            ChatEvent::Redirect(Route::Auth) => {
                println!("Signed out. Run `teachable signin` to continue.");
            }
            _ => {}
        }
    }
}

enum Command<'a> {
    New,
    List,
    Open(&'a str),
    Rename(&'a str, &'a str),
    Delete(&'a str),
    Image(&'a str),
    Export(&'a str),
    Logout,
    Help,
    Quit,
    Unknown(&'a str),
    Message(&'a str),
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Self {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return Command::Message(line);
        };
        let (name, args) = rest.split_once(' ').unwrap_or((rest, ""));
        let args = args.trim();
        match name {
            "new" => Command::New,
            "list" => Command::List,
            "open" => Command::Open(args),
            "rename" => {
                let (target, title) = args.split_once(' ').unwrap_or((args, ""));
                Command::Rename(target, title.trim())
            }
            "delete" => Command::Delete(args),
            "image" => Command::Image(args),
            "export" => Command::Export(args),
            "logout" => Command::Logout,
            "help" => Command::Help,
            "quit" | "exit" => Command::Quit,
            _ => Command::Unknown(name),
        }
    }
}

fn print_message(msg: &ChatMessage) {
    match msg.sender {
        Sender::User => println!("you> {}", msg.content),
        Sender::Bot if msg.is_error => eprintln!("! {}", msg.content),
        Sender::Bot => println!("{}", msg.content),
    }
}

fn print_transcript(controller: &ChatController) {
    for msg in controller.transcript().iter() {
        print_message(msg);
    }
}

pub fn print_sessions(controller: &ChatController) {
    let state = controller.state();
    if state.sessions.is_empty() {
        println!("No chats yet");
        return;
    }
    for (i, session) in state.sessions.iter().enumerate() {
        let marker = if state.is_current(&session.id) { "*" } else { " " };
        println!(
            "{} {:>3}  {}  {}",
            marker,
            i + 1,
            session.title,
            view::session_date(&session.created_at)
        );
    }
}

/// A 1-based position in the list or a session id.
fn resolve_session(controller: &ChatController, target: &str) -> Option<String> {
    let sessions = &controller.state().sessions;
    if let Ok(n) = target.parse::<usize>() {
        if let Some(session) = n.checked_sub(1).and_then(|i| sessions.get(i)) {
            return Some(session.id.clone());
        }
    }
    controller
        .state()
        .find_session(target)
        .map(|session| session.id.clone())
}

fn export_page(controller: &ChatController, path: &str) -> Result<()> {
    let sidebar = view::render_sidebar(controller.state())?;
    let transcript = view::render_transcript(controller.transcript(), controller.state().is_loading)?;
    let page = format!(
        "<!DOCTYPE html>\n<html>\n<body>\n{}\n{}\n</body>\n</html>\n",
        sidebar, transcript
    );
    fs::write(path, page)?;
    Ok(())
}

fn save_image(config: &AppConfig, bytes: &[u8]) -> Result<PathBuf> {
    let name = format!("image-{}.png", chrono::Local::now().format("%Y%m%d%H%M%S"));
    let path = PathBuf::from(&config.storage_path).join(name);
    fs::write(&path, bytes)?;
    Ok(path)
}

/// Handle one line of input. Returns false when the loop should end.
async fn handle_line(
    line: &str,
    rl: &mut DefaultEditor,
    config: &AppConfig,
    cache: &UserCache,
    controller: &mut ChatController,
) -> Result<bool> {
    match Command::parse(line) {
        Command::Message("") => {}
        Command::Message(text) => {
            if controller.send_message(text).await == SendOutcome::Unauthorized {
                return Ok(false);
            }
        }
        Command::New => {
            let mut dialogs = TerminalDialogs { rl };
            match controller.create_session(&mut dialogs).await? {
                Some(chat) => {
                    println!("Created \"{}\"", chat.title);
                    print_transcript(controller);
                }
                None => println!("No chat created"),
            }
        }
        Command::List => {
            controller.load_sessions().await?;
            print_sessions(controller);
        }
        Command::Open(target) => match resolve_session(controller, target) {
            Some(id) => {
                controller.select_session(&id);
                print_transcript(controller);
            }
            None => println!("No chat {}", target),
        },
        Command::Rename(target, title) => match resolve_session(controller, target) {
            Some(id) => {
                controller.begin_rename(&id);
                if controller.rename_session(&id, title).await? {
                    println!("Renamed to \"{}\"", title);
                } else {
                    println!("Name unchanged");
                }
            }
            None => println!("No chat {}", target),
        },
        Command::Delete(target) => match resolve_session(controller, target) {
            Some(id) => {
                let mut dialogs = TerminalDialogs { rl };
                if controller.delete_session(&id, &mut dialogs).await? {
                    println!("Deleted");
                }
            }
            None => println!("No chat {}", target),
        },
        Command::Image(prompt) => {
            if let Some(bytes) = controller.generate_image(prompt).await {
                let path = save_image(config, &bytes)?;
                println!("Image saved to {}", path.display());
            }
        }
        Command::Export(path) => {
            if path.is_empty() {
                return Err(anyhow!("Usage: /export <file>"));
            }
            export_page(controller, path)?;
            println!("Wrote {}", path);
        }
        Command::Logout => {
            controller.logout(cache).await?;
            return Ok(false);
        }
        Command::Help => println!("{}", HELP),
        Command::Quit => return Ok(false),
        Command::Unknown(name) => println!("Unknown command /{}, try /help", name),
    }
    Ok(true)
}

pub async fn run(config: &AppConfig, api: ApiClient, cache: UserCache) -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    let mut controller =
        ChatController::new(api, &config.welcome_message).with_observer(TerminalPrinter::default());
    controller.init().await;

    if let Some(user) = cache.load() {
        println!("Signed in as {}", user.user.username);
    }
    print_transcript(&controller);

    loop {
        let readline = rl.readline(">>> ");
        match readline {
            Ok(line) => {
                let _ = rl.add_history_entry(line.as_str());
                match handle_line(&line, &mut rl, config, &cache, &mut controller).await {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => {
                        tracing::debug!("Command failed: {:?}", e);
                        println!("Error: {}", e);
                    }
                }
            }
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}
