//! Prompt used to fold new narrative into the running summary.

/// Builds the summarization request for `new_text` on top of `current`.
#[must_use]
pub fn build(current: Option<&str>, new_text: &str) -> String {
    let existing = current
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("(none yet)");
    format!(
        "You maintain a running summary of an interactive story.\n\n\
         Rules:\n\
         - Keep every fact that matters for continuity: characters, places, objects, \
         open threads, and what the protagonist has done.\n\
         - Write in the second person, in plain prose, without headings or lists.\n\
         - Stay under 250 words.\n\
         - Output only the updated summary.\n\n\
         Current summary:\n{existing}\n\n\
         New events:\n{new_text}\n\n\
         Updated summary:"
    )
}
