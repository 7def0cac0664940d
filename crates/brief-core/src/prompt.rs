use crate::language::Language;
use crate::options::{DetailLevel, SummaryOptions};

/// System instruction sent alongside every summarization prompt.
pub const SYSTEM_PROMPT: &str = "You are a senior software engineer writing a file index. \
Answer with a single plain-text paragraph. Do not use Markdown, headings or lists.";

/// Leading instruction for each detail level. Medium carries no qualifier.
fn detail_phrase(level: DetailLevel) -> &'static str {
    match level {
        DetailLevel::Low => "Give a very brief overview of",
        DetailLevel::Medium => "Summarize",
        DetailLevel::High => "Give a detailed analysis of",
    }
}

/// Build the instruction for one file.
pub fn build_prompt(source: &str, language: Language, options: &SummaryOptions) -> String {
    let subject = if language.is_known() {
        format!("the following {} code", language.name())
    } else {
        "the following file".to_string()
    };

    let mut prompt = format!(
        "{} {}, describing its purpose and main responsibilities.\n",
        detail_phrase(options.detail_level),
        subject
    );
    prompt.push_str(&format!(
        "Keep the answer to approximately {} characters.\n\n",
        options.max_length
    ));
    prompt.push_str("```");
    if language.is_known() {
        prompt.push_str(&language.name().to_ascii_lowercase());
    }
    prompt.push('\n');
    prompt.push_str(source);
    if !source.ends_with('\n') {
        prompt.push('\n');
    }
    prompt.push_str("```\n");
    prompt
}
