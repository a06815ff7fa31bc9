use chatgpt_plus_core::{ChatResult, ConfigEntry, SidecarStatus};
use chatgpt_plus_ipc::events::{response_event_type, Event, ResponseEventData};
use colored::*;
use pulldown_cmark::{CodeBlockKind, Event as MdEvent, HeadingLevel, Parser as MdParser, Tag};
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use syntect::util::{as_24_bit_terminal_escaped, LinesWithEndings};

/// Print a service result: the reply on success, the error otherwise
pub fn print_chat_result(result: &ChatResult) {
    if result.is_success() {
        let reply = result.message.as_deref().unwrap_or_default();
        println!("{}: {}", "ChatGPT".blue().bold(), render_markdown(reply).trim_end());
        return;
    }

    let error = result.error.as_deref().unwrap_or("Unknown error");
    println!("{} {}", "Error:".red().bold(), error);
    if let Some(message) = &result.message {
        println!("  {}", message.dimmed());
    }
}

pub fn print_status(status: &SidecarStatus) {
    if let Some(error) = &status.error {
        println!("{} {}", "Status unavailable:".red().bold(), error);
        return;
    }
    let logged_in = if status.is_logged_in() {
        "yes".green()
    } else {
        "no".red()
    };
    println!("{} {}", "Logged in:".cyan(), logged_in);
    println!(
        "{} {}",
        "Conversation:".cyan(),
        status.conversation_id.as_deref().unwrap_or("none")
    );
    if let Some(headless) = status.headless {
        println!("{} {}", "Headless:".cyan(), headless);
    }
}

pub fn print_event(event: &Event) {
    let time = event.time_fired.format("%H:%M:%S");
    if event.event_type == response_event_type() {
        if let Ok(data) = serde_json::from_value::<ResponseEventData>(event.data.clone()) {
            let outcome = if data.success { "ok".green() } else { "failed".red() };
            println!("[{}] {} {}", time, event.event_type.yellow(), outcome);
            println!("  {} {}", "message:".cyan(), data.message);
            println!("  {} {}", "response:".cyan(), data.response);
            return;
        }
    }
    println!("[{}] {} {}", time, event.event_type.yellow(), event.data);
}

pub fn print_entries(entries: &[ConfigEntry]) {
    if entries.is_empty() {
        println!("No config entries. Run `chatgpt-plus setup` to add one.");
        return;
    }
    for entry in entries {
        println!("{}  {}", entry.entry_id.bold(), entry.title);
        println!("  {} {}", "sidecar:".cyan(), entry.sidecar_url());
        println!(
            "  {} {}",
            "created:".cyan(),
            entry.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
}

/// Human readable text for a setup error code
pub fn setup_error_label(code: &str) -> &'static str {
    match code {
        "cannot_connect" => "Cannot connect to the sidecar. Check the URL and that the add-on is running.",
        "timeout" => "The sidecar did not answer in time.",
        "sidecar_not_ready" => "The sidecar is running but not ready yet.",
        "not_logged_in" => "The sidecar is not logged in to ChatGPT. Log in through the add-on first.",
        _ => "Unexpected error while checking the sidecar.",
    }
}

/// Render markdown for the terminal, highlighting fenced code
pub fn render_markdown(markdown: &str) -> String {
    let syntax_set = SyntaxSet::load_defaults_newlines();
    let theme_set = ThemeSet::load_defaults();
    let theme = theme_set.themes.get("base16-ocean.dark");

    let mut output = String::new();
    let mut code: Option<(String, String)> = None;
    let mut list_depth = 0usize;

    for event in MdParser::new(markdown) {
        match event {
            MdEvent::Start(Tag::Heading(level, ..)) => {
                let marker = if level == HeadingLevel::H1 { "##" } else { "#" };
                output.push_str(&format!("\n{} ", marker.bright_cyan().bold()));
            }
            MdEvent::End(Tag::Heading(..)) | MdEvent::End(Tag::Paragraph) => output.push('\n'),
            MdEvent::Start(Tag::Paragraph) if !output.is_empty() && list_depth == 0 => {
                output.push('\n')
            }
            MdEvent::Start(Tag::List(_)) => list_depth += 1,
            MdEvent::End(Tag::List(_)) => list_depth = list_depth.saturating_sub(1),
            MdEvent::Start(Tag::Item) => {
                output.push_str(&"  ".repeat(list_depth.saturating_sub(1)));
                output.push_str(&format!("{} ", "•".yellow()));
            }
            MdEvent::End(Tag::Item) if !output.ends_with('\n') => output.push('\n'),
            MdEvent::Start(Tag::CodeBlock(kind)) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(lang) => lang.to_string(),
                    CodeBlockKind::Indented => String::new(),
                };
                code = Some((lang, String::new()));
            }
            MdEvent::End(Tag::CodeBlock(_)) => {
                if let Some((lang, content)) = code.take() {
                    let rule = "─".repeat(40).dimmed().to_string();
                    output.push_str(&format!("\n{}\n{}\n", lang.cyan(), rule));
                    match theme {
                        Some(theme) => {
                            let syntax = syntax_set
                                .find_syntax_by_token(&lang)
                                .unwrap_or_else(|| syntax_set.find_syntax_plain_text());
                            let mut highlighter = HighlightLines::new(syntax, theme);
                            for line in LinesWithEndings::from(&content) {
                                let ranges = highlighter
                                    .highlight_line(line, &syntax_set)
                                    .unwrap_or_default();
                                output.push_str(&as_24_bit_terminal_escaped(&ranges, false));
                            }
                            output.push_str("\x1b[0m");
                        }
                        None => output.push_str(&content),
                    }
                    output.push_str(&format!("{}\n", rule));
                }
            }
            MdEvent::Text(text) => match code.as_mut() {
                Some((_, content)) => content.push_str(&text),
                None => output.push_str(&text),
            },
            MdEvent::Code(text) => {
                output.push_str(&format!("`{}`", text.on_bright_black().white()))
            }
            MdEvent::SoftBreak => output.push(' '),
            MdEvent::HardBreak => output.push('\n'),
            _ => {}
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_plain_text() {
        colored::control::set_override(false);
        assert_eq!(render_markdown("Hello there").trim(), "Hello there");
    }

    #[test]
    fn test_render_list_and_code() {
        colored::control::set_override(false);
        let rendered = render_markdown("Steps:\n\n- one\n- two\n\n`x`");
        assert!(rendered.contains("• one\n"));
        assert!(rendered.contains("• two\n"));
        assert!(rendered.contains("`x`"));
    }

    #[test]
    fn test_setup_error_labels() {
        assert!(setup_error_label("not_logged_in").contains("not logged in"));
        assert!(setup_error_label("something_else").starts_with("Unexpected"));
    }
}
