use futures::{ Stream, StreamExt };
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::models::chat::{ Message, PageContext, PartCard, Role };
use crate::session::{ Phase, SessionSnapshot };

const TITLE_SUFFIX: &str = " – PartSelect.com";
const TYPING_INDICATOR: &str = "Assistant: ...";
const NO_PAGE: &str = "(no PartSelect page open)";

/// Terminal stand-in for the markdown renderer: drops emphasis and heading
/// markers, turns list dashes into bullets.
pub fn plain_text(content: &str) -> String {
    content
        .lines()
        .map(|raw| {
            let line = raw.replace("**", "").replace("__", "").replace('`', "");
            if let Some(rest) = line.strip_prefix("- ") {
                return format!("  • {}", rest);
            }
            if line.starts_with('#') {
                return line.trim_start_matches('#').trim_start().to_string();
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_part_card(part: &PartCard) -> String {
    let mut out = format!("  ▸ {} (PartSelect #{})", part.name, part.ps_number);
    if let Some(oem) = &part.oem_part_number {
        out.push_str(&format!("\n    OEM: {}", oem));
    }
    match (&part.price, part.in_stock) {
        (Some(price), Some(true)) => out.push_str(&format!("\n    {} · in stock", price)),
        (Some(price), Some(false)) => out.push_str(&format!("\n    {} · out of stock", price)),
        (Some(price), None) => out.push_str(&format!("\n    {}", price)),
        (None, Some(false)) => out.push_str("\n    out of stock"),
        (None, _) => {}
    }
    out.push_str(&format!("\n    {}", part.link()));
    out
}

pub fn render_message(message: &Message) -> String {
    let mut sections = Vec::new();
    if !message.content.is_empty() {
        let speaker = match message.role {
            Role::User => "You",
            Role::Assistant => "Assistant",
        };
        sections.push(format!("{}: {}", speaker, plain_text(&message.content)));
    }
    sections.extend(message.parts.iter().map(render_part_card));
    sections.join("\n")
}

pub fn render_suggestions(suggestions: &[String]) -> Option<String> {
    if suggestions.is_empty() {
        return None;
    }
    let lines: Vec<String> = suggestions
        .iter()
        .enumerate()
        .map(|(i, s)| format!("  [{}] {}", i + 1, s))
        .collect();
    Some(lines.join("\n"))
}

pub fn page_banner(context: Option<&PageContext>) -> Option<String> {
    let context = context?;
    let label = match context.title.as_deref().filter(|t| !t.trim().is_empty()) {
        Some(title) => title.strip_suffix(TITLE_SUFFIX).unwrap_or(title).to_string(),
        None => "Viewing a PartSelect page".to_string(),
    };
    Some(format!("🔗 {}", label))
}

/// Banner line for every context change seen by `contexts`. Take the
/// receiver before starting the tracker so its first refresh is not missed.
pub fn banner_updates(
    contexts: watch::Receiver<Option<PageContext>>
) -> impl Stream<Item = String> + Send + Unpin {
    WatchStream::from_changes(contexts).map(|context| {
        page_banner(context.as_ref()).unwrap_or_else(|| NO_PAGE.to_string())
    })
}

/// Renders snapshots incrementally, emitting only what changed since the
/// previous call.
#[derive(Debug, Default)]
pub struct TranscriptRenderer {
    rendered: usize,
    typing_shown: bool,
}

impl TranscriptRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&mut self, snapshot: &SessionSnapshot) -> Option<String> {
        let messages = snapshot.conversation.messages();
        let mut blocks: Vec<String> = messages
            .iter()
            .skip(self.rendered)
            .map(render_message)
            .filter(|block| !block.is_empty())
            .collect();
        let advanced = messages.len() > self.rendered;
        self.rendered = messages.len();

        match snapshot.phase {
            Phase::Sending if !self.typing_shown => {
                blocks.push(TYPING_INDICATOR.to_string());
                self.typing_shown = true;
            }
            Phase::Idle => {
                self.typing_shown = false;
                if advanced {
                    if let Some(menu) = render_suggestions(snapshot.conversation.tail_suggestions()) {
                        blocks.push(menu);
                    }
                }
            }
            Phase::Sending => {}
        }

        if blocks.is_empty() {
            None
        } else {
            Some(blocks.join("\n"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ NavigationHost, PageContextTracker };
    use crate::session::{ transition, SessionEvent };
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    fn part(price: Option<&str>, in_stock: Option<bool>) -> PartCard {
        PartCard {
            ps_number: "11752778".to_string(),
            name: "Door Shelf Bin".to_string(),
            image_url: None,
            part_url: None,
            oem_part_number: Some("WPW10321304".to_string()),
            price: price.map(str::to_string),
            in_stock,
        }
    }

    #[test]
    fn plain_text_strips_markdown() {
        let text = "Hi! I'm the **PartSelect Assistant**.\n## Steps\n- Find the part";
        assert_eq!(
            plain_text(text),
            "Hi! I'm the PartSelect Assistant.\nSteps\n  • Find the part"
        );
    }

    #[test]
    fn part_card_shows_canonical_link_and_stock() {
        let rendered = render_part_card(&part(Some("$36.18"), Some(true)));
        assert!(rendered.contains("Door Shelf Bin (PartSelect #11752778)"));
        assert!(rendered.contains("OEM: WPW10321304"));
        assert!(rendered.contains("$36.18 · in stock"));
        assert!(rendered.ends_with("https://www.partselect.com/PS11752778.htm"));
    }

    #[test]
    fn parts_only_message_has_no_speaker_line() {
        let message = Message::assistant("", vec![part(None, None)], Vec::new());
        let rendered = render_message(&message);
        assert!(rendered.starts_with("  ▸ Door Shelf Bin"));
        assert!(!rendered.contains("Assistant:"));
    }

    #[test]
    fn banner_strips_site_suffix() {
        let context = PageContext {
            url: "https://www.partselect.com/Models/WRS325SDHZ/".to_string(),
            title: Some("WRS325SDHZ – PartSelect.com".to_string()),
        };
        assert_eq!(page_banner(Some(&context)).unwrap(), "🔗 WRS325SDHZ");

        let untitled = PageContext { title: None, ..context };
        assert_eq!(page_banner(Some(&untitled)).unwrap(), "🔗 Viewing a PartSelect page");
        assert_eq!(page_banner(None), None);
    }

    #[test]
    fn banner_treats_empty_title_as_absent() {
        let context = PageContext {
            url: "https://www.partselect.com/".to_string(),
            title: Some("  ".to_string()),
        };
        assert_eq!(page_banner(Some(&context)).unwrap(), "🔗 Viewing a PartSelect page");
    }

    #[tokio::test]
    async fn banner_shows_the_starting_page() {
        let host = Arc::new(
            NavigationHost::with_active(
                "https://www.partselect.com/Models/WRS325SDHZ/",
                Some("WRS325SDHZ – PartSelect.com")
            )
        );
        let tracker = PageContextTracker::new(host.clone(), "partselect.com");
        let mut banners = banner_updates(tracker.watch());
        tracker.start();
        tokio::time::sleep(Duration::from_millis(5)).await;

        let first = timeout(Duration::from_secs(2), banners.next()).await.unwrap();
        assert_eq!(first.as_deref(), Some("🔗 WRS325SDHZ"));

        host.navigate("https://www.example.com/", None);
        let next = timeout(Duration::from_secs(2), banners.next()).await.unwrap();
        assert_eq!(next.as_deref(), Some(NO_PAGE));
    }

    #[test]
    fn renderer_emits_increments_and_tail_menu() {
        let mut renderer = TranscriptRenderer::new();
        let initial = SessionSnapshot::initial();
        let first = renderer.render(&initial).unwrap();
        assert!(first.starts_with("Assistant: Hi! I'm the PartSelect Assistant."));
        assert!(first.contains("[1] How can I install part PS11752778?"));
        assert_eq!(renderer.render(&initial), None);

        let sending = transition(initial, SessionEvent::Submit {
            query: "hello".to_string(),
            context: None,
        }).state;
        assert_eq!(renderer.render(&sending).unwrap(), "You: hello\nAssistant: ...");
        assert_eq!(renderer.render(&sending), None);

        let idle = transition(
            sending,
            SessionEvent::Resolved(Message::assistant("Hi there", Vec::new(), Vec::new()))
        ).state;
        assert_eq!(renderer.render(&idle).unwrap(), "Assistant: Hi there");
    }
}
