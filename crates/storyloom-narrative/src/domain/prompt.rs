//! Prompt assembly.
//!
//! `assemble` is a pure function of its inputs: the same story, context and
//! action always yield byte-identical prompt text.

use storyloom_core::story::{ActionType, Story, StoryNode};

use super::context::ContextWindow;

const NARRATIVE_RULES: &[&str] = &[
    "Write strictly in the second person, addressing the protagonist as \"you\".",
    "Never mention or hint that you are an AI, a language model, a program, or a game.",
    "Never present menus, numbered options, lists of choices, or command syntax.",
    "Never ask the reader what they want to do next.",
    "Never decide the protagonist's next action for them.",
    "Write exactly two paragraphs of prose separated by a blank line.",
    "Stay consistent with everything that has already happened.",
];

const MATURE_ENABLED: &str = "Mature content is enabled: explicit violence, strong language and \
     sexual content are permitted when the story calls for them.";

const MATURE_DISABLED: &str = "Mature content is disabled: avoid explicit violence, sexual \
     content and graphic detail.";

/// Builds the generation request for one turn.
///
/// `action_text` is expected to be already trimmed; it is ignored for
/// SYSTEM and CONTINUE.
#[must_use]
pub fn assemble(
    story: &Story,
    context: &ContextWindow<'_>,
    action_type: ActionType,
    action_text: &str,
) -> String {
    let sections = [
        "You are the narrator of an interactive story.".to_owned(),
        rules_block(story),
        story_block(story),
        context_block(context),
        action_block(action_type, action_text),
    ];
    sections.join("\n\n")
}

fn rules_block(story: &Story) -> String {
    let mature = if story.mature_enabled {
        MATURE_ENABLED
    } else {
        MATURE_DISABLED
    };
    let mut lines = vec!["Rules:".to_owned()];
    lines.extend(NARRATIVE_RULES.iter().map(|rule| format!("- {rule}")));
    lines.push(format!("- {mature}"));
    lines.join("\n")
}

fn story_block(story: &Story) -> String {
    format!(
        "Story details:\n- Genre: {genre}\n- Protagonist: {protagonist}\n- Pronouns for the \
         protagonist when referred to in the third person: {pronouns}",
        genre = story.genre,
        protagonist = story.protagonist,
        pronouns = story.gender.pronouns(),
    )
}

fn context_block(context: &ContextWindow<'_>) -> String {
    match *context {
        ContextWindow::FullHistory([]) => {
            "Story so far:\n(The story has not begun yet.)".to_owned()
        }
        ContextWindow::FullHistory(nodes) => {
            format!("Full story so far:\n{}", history_text(nodes))
        }
        ContextWindow::SummaryWindow { summary, recent } => {
            let recent = if recent.is_empty() {
                "(Nothing since the summary.)".to_owned()
            } else {
                history_text(recent)
            };
            format!("Summary of earlier events:\n{summary}\n\nRecent events:\n{recent}")
        }
    }
}

fn history_text(nodes: &[StoryNode]) -> String {
    nodes
        .iter()
        .map(|node| node.generated_text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn action_block(action_type: ActionType, action_text: &str) -> String {
    match action_type {
        ActionType::System => "Task: Open the story. Establish the setting, the atmosphere and \
             the protagonist's situation. Take your time and do not rush into action.\n\n\
             Begin the story."
            .to_owned(),
        ActionType::Continue => "Task: Advance the plot naturally. The player has given no new \
             input, so let the world and its characters move the story forward.\n\n\
             Continue the story."
            .to_owned(),
        ActionType::Do => format!(
            "The player attempts: \"{action_text}\"\n\
             Task: Describe the consequences of this attempt. It may meet resistance or lead \
             to unexpected outcomes; success is never guaranteed.\n\n\
             Continue the story."
        ),
        ActionType::Say => format!(
            "The player says: \"{action_text}\"\n\
             Task: Describe how the world and the characters present react to these words.\n\n\
             Continue the story."
        ),
        ActionType::See => format!(
            "The player observes: \"{action_text}\"\n\
             Task: Describe what is perceived in sensory and atmospheric detail.\n\n\
             Continue the story."
        ),
        ActionType::Story => format!(
            "The player steers the narrative: \"{action_text}\"\n\
             Task: Interpret this intent and weave it into the story naturally, without \
             repeating it back verbatim.\n\n\
             Continue the story."
        ),
    }
}
