use clap::Parser;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Backend Args ---
    /// Base URL of the assistant backend (the chat endpoint is {api_url}/api/chat)
    #[arg(long, env = "PARTSELECT_API_URL", default_value = "http://localhost:8000")]
    pub api_url: String,

    /// Transport timeout per request in seconds. 0 disables the timeout.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "0")]
    pub request_timeout_secs: u64,

    // --- Page Context Args ---
    /// Only pages on this domain (or its subdomains) are attached as page context
    #[arg(long, env = "PAGE_CONTEXT_DOMAIN", default_value = "partselect.com")]
    pub allowed_domain: String,

    /// Page the session starts on (e.g., https://www.partselect.com/Models/WRS325SDHZ/)
    #[arg(long, env = "PAGE_URL")]
    pub page_url: Option<String>,

    /// Title of the starting page
    #[arg(long, env = "PAGE_TITLE")]
    pub page_title: Option<String>,

    // --- General App Args ---
    /// Enable debug logging/output
    #[arg(long, env = "DEBUG", default_value = "false")]
    pub debug: bool,
}

impl Args {
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

/// One line of interactive input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Send(String),
    /// 1-based index into the tail suggestions.
    Suggestion(usize),
    Open {
        url: String,
        title: Option<String>,
    },
    Close,
    Quit,
    Help,
    Empty,
}

pub fn parse_command(line: &str) -> Command {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Command::Empty;
    }

    if let Some(rest) = trimmed.strip_prefix('/') {
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };
        match name {
            "quit" | "exit" => {
                return Command::Quit;
            }
            "close" => {
                return Command::Close;
            }
            "help" => {
                return Command::Help;
            }
            "open" if !arg.is_empty() => {
                let (url, title) = match arg.split_once(char::is_whitespace) {
                    Some((url, title)) => (url, Some(title.trim().to_string())),
                    None => (arg, None),
                };
                return Command::Open {
                    url: url.to_string(),
                    title,
                };
            }
            _ => {}
        }
    }

    match trimmed.parse::<usize>() {
        Ok(n) if n > 0 => Command::Suggestion(n),
        _ => Command::Send(line.to_string()),
    }
}

pub const HELP: &str = "Type a question and press Enter.\n\
  N                  ask the N-th suggested question\n\
  /open <url> [title] switch the active page\n\
  /close             leave the active page\n\
  /quit              exit";
