/// Intent of one inbound chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    /// `/stop` stops every watch of the sender, `/stop <token>` just one.
    Stop { token: Option<String> },
    List,
    Help,
    Unknown(String),
    /// Plain text: a tracking number to register.
    Track(String),
}

/// Classifies raw chat text. Commands may carry a `@botname` suffix.
pub fn classify(text: &str) -> Command {
    let text = text.trim();
    let Some(rest) = text.strip_prefix('/') else {
        return Command::Track(text.to_string());
    };

    let (head, args) = match rest.split_once(char::is_whitespace) {
        Some((head, args)) => (head, args.trim()),
        None => (rest, ""),
    };
    let name = head.split('@').next().unwrap_or(head);

    match name.to_ascii_lowercase().as_str() {
        "start" => Command::Start,
        "stop" => Command::Stop {
            token: (!args.is_empty()).then(|| args.to_string()),
        },
        "list" => Command::List,
        "help" => Command::Help,
        _ => Command::Unknown(name.to_string()),
    }
}
