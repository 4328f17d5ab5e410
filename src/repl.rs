use std::io::Write;
use std::path::{ Path, PathBuf };

use log::{ info, warn };
use tokio::io::{ AsyncBufReadExt, BufReader };

use crate::agent::ChatAgent;
use crate::config::task::TaskType;
use crate::error::{ BoxError, ChatError };
use crate::extract;
use crate::session::{ SessionDefaults, SessionState };

const HELP: &str = "\
Type a message to chat. Commands:
  /upload <path>    load a pdf, docx or txt file as context
  /file             show the loaded file content
  /prompt <text>    save the default prompt
  /prompt-clear     clear the default prompt
  /skip on|off      bypass the default prompt
  /task <label>     pick a task type (sets temperature)
  /tasks            list task types
  /history          show the chat history
  /clear            clear the chat history
  /help             show this help
  /quit             exit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Submit(String),
    Upload(PathBuf),
    ShowFile,
    SetPrompt(String),
    ClearPrompt,
    Skip(bool),
    Task(TaskType),
    Tasks,
    History,
    ClearHistory,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<Command, ChatError> {
    let trimmed = line.trim();
    if !trimmed.starts_with('/') {
        return Ok(Command::Submit(line.trim_end_matches(['\r', '\n']).to_string()));
    }

    let (name, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (trimmed, ""),
    };

    match (name, rest) {
        ("/upload", "") => Err(ChatError::Validation("Usage: /upload <path>".to_string())),
        ("/upload", path) => Ok(Command::Upload(PathBuf::from(path))),
        ("/file", _) => Ok(Command::ShowFile),
        ("/prompt", "") => Err(ChatError::Validation("Usage: /prompt <text>".to_string())),
        ("/prompt", text) => Ok(Command::SetPrompt(text.to_string())),
        ("/prompt-clear", _) => Ok(Command::ClearPrompt),
        ("/skip", "on") => Ok(Command::Skip(true)),
        ("/skip", "off") => Ok(Command::Skip(false)),
        ("/skip", _) => Err(ChatError::Validation("Usage: /skip on|off".to_string())),
        ("/task", label) => Ok(Command::Task(label.parse()?)),
        ("/tasks", _) => Ok(Command::Tasks),
        ("/history", _) => Ok(Command::History),
        ("/clear", _) => Ok(Command::ClearHistory),
        ("/help", _) => Ok(Command::Help),
        ("/quit", _) | ("/exit", _) => Ok(Command::Quit),
        _ => Err(ChatError::Validation(format!("Unknown command '{}'. Try /help", name))),
    }
}

/// Chats on stdin/stdout until `/quit` or end of input.
pub async fn run_repl(
    agent: &ChatAgent,
    defaults: &SessionDefaults,
    initial_file: Option<&Path>
) -> Result<(), BoxError> {
    let mut state = defaults.new_session();
    println!("Document Chat ({}). Type /help for commands.", agent.model());

    if let Some(path) = initial_file {
        upload(&mut state, path).await;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        match command {
            Command::Submit(input) => submit(agent, &mut state, &input).await?,
            Command::Upload(path) => upload(&mut state, &path).await,
            Command::ShowFile => {
                match state.file_context() {
                    Some(text) => println!("{}", text),
                    None => println!("No file loaded."),
                }
            }
            Command::SetPrompt(text) => {
                state.set_default_prompt(text);
                println!("Default prompt saved.");
            }
            Command::ClearPrompt => {
                state.clear_default_prompt();
                println!("Default prompt cleared.");
            }
            Command::Skip(skip) => {
                state.set_skip_default_prompt(skip);
                println!("Skip default prompt: {}", if skip { "on" } else { "off" });
            }
            Command::Task(task) => {
                state.select_task(task);
                println!("Task: {} (temperature {})", task, task.temperature());
            }
            Command::Tasks => {
                for task in TaskType::ALL {
                    let marker = if state.task() == Some(task) { "*" } else { " " };
                    println!("{} {} ({})", marker, task, task.temperature());
                }
            }
            Command::History => print_history(&state),
            Command::ClearHistory => {
                state.clear_history();
                println!("Chat history cleared.");
            }
            Command::Help => println!("{}", HELP),
            Command::Quit => break,
        }
    }

    info!("Terminal session ended with {} message(s) in history", state.history().len());
    Ok(())
}

async fn submit(agent: &ChatAgent, state: &mut SessionState, input: &str) -> Result<(), BoxError> {
    let mut printed = 0;
    let result = agent.submit(state, input, |partial| {
        print!("{}", &partial[printed..]);
        let _ = std::io::stdout().flush();
        printed = partial.len();
    }).await;

    match result {
        Ok(_) => println!(),
        Err(e) => {
            if printed > 0 {
                println!();
            }
            println!("{}", e);
        }
    }
    Ok(())
}

async fn upload(state: &mut SessionState, path: &Path) {
    let loaded = match extract::mime_for_path(path) {
        Ok(mime_type) => {
            match tokio::fs::read(path).await {
                Ok(data) => state.load_file(&data, mime_type),
                Err(e) => Err(ChatError::Extraction(format!("{}: {}", path.display(), e))),
            }
        }
        Err(e) => Err(e),
    };

    match loaded {
        Ok(0) => println!("File loaded but no text was found."),
        Ok(chars) => println!("File successfully loaded! ({} characters)", chars),
        Err(e) => {
            warn!("Upload of {} failed: {}", path.display(), e);
            state.clear_file_context();
            println!("{}", e);
        }
    }
}

fn print_history(state: &SessionState) {
    if state.history().is_empty() {
        println!("No chat history.");
        return;
    }
    let last = state.history().len() - 1;
    for (i, message) in state.history().iter().enumerate() {
        let role = message.role.as_str();
        let mut label = role.to_string();
        if let Some(first) = label.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        println!("{}:", label);
        println!("{}", message.content);
        if i < last {
            println!("---");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_lines_are_submissions() {
        assert_eq!(parse_command("Summarize").unwrap(), Command::Submit("Summarize".to_string()));
        assert_eq!(parse_command("").unwrap(), Command::Submit(String::new()));
    }

    #[test]
    fn commands_with_arguments() {
        assert_eq!(
            parse_command("/upload docs/a file.pdf").unwrap(),
            Command::Upload(PathBuf::from("docs/a file.pdf"))
        );
        assert_eq!(
            parse_command("/prompt Be terse").unwrap(),
            Command::SetPrompt("Be terse".to_string())
        );
        assert_eq!(parse_command("/skip on").unwrap(), Command::Skip(true));
        assert_eq!(
            parse_command("/task Creative Tasks/Poetry").unwrap(),
            Command::Task(TaskType::Creative)
        );
    }

    #[tokio::test]
    async fn failed_upload_drops_previous_file() {
        let mut state = SessionState::new();
        state.set_file_context("old document");
        upload(&mut state, Path::new("missing-dir/does-not-exist.txt")).await;
        assert_eq!(state.file_context(), None);

        state.set_file_context("old document");
        upload(&mut state, Path::new("picture.png")).await;
        assert_eq!(state.file_context(), None);
    }

    #[test]
    fn bad_commands_are_validation_errors() {
        for line in ["/upload", "/prompt", "/skip maybe", "/task Jokes", "/nope"] {
            let err = parse_command(line).unwrap_err();
            assert!(matches!(err, ChatError::Validation(_)), "{}", line);
        }
    }
}
