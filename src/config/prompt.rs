use std::borrow::Cow;

pub const BASE_INSTRUCTIONS: &str =
    "You are a helpful assistant. Provide clear and concise answers. If you are writing a code make sure to summarize and provide a concise code, optimize the code output to the smartest and the shortest way with better readability and functionality";

pub const FILE_READER_INSTRUCTIONS: &str =
    "Answer only from the File Context below. Do not use outside knowledge. If the File Context does not contain the answer, reply exactly with:";

pub const FILE_READER_FALLBACK: &str = "I could not find the answer in the provided file.";

pub const TRUNCATION_MARKER: &str = "... (truncated)";

pub const DEFAULT_MAX_FILE_CONTEXT_CHARS: usize = 5000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptOptions {
    pub max_file_context_chars: usize,
    /// Restrict answers to the uploaded file and use the fixed fallback phrase otherwise.
    pub file_reader_mode: bool,
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self {
            max_file_context_chars: DEFAULT_MAX_FILE_CONTEXT_CHARS,
            file_reader_mode: false,
        }
    }
}

/// Cuts `text` to its first `max_chars` characters and appends [`TRUNCATION_MARKER`].
/// Text that already fits is borrowed unchanged.
pub fn truncate_context(text: &str, max_chars: usize) -> Cow<'_, str> {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => {
            let mut cut = String::with_capacity(byte_idx + TRUNCATION_MARKER.len());
            cut.push_str(&text[..byte_idx]);
            cut.push_str(TRUNCATION_MARKER);
            Cow::Owned(cut)
        }
        None => Cow::Borrowed(text),
    }
}

/// Builds the system message for one request.
///
/// Blocks are appended in a fixed order: base instructions, the file-reader
/// restriction (when enabled), the default prompt (unless skipped or empty),
/// then the file context (when non-empty).
pub fn compose(
    default_prompt: &str,
    file_context: Option<&str>,
    skip_default: bool,
    options: &PromptOptions
) -> String {
    let mut system_content = String::from(BASE_INSTRUCTIONS);

    if options.file_reader_mode {
        system_content.push_str("\n\n");
        system_content.push_str(FILE_READER_INSTRUCTIONS);
        system_content.push_str(" \"");
        system_content.push_str(FILE_READER_FALLBACK);
        system_content.push('"');
    }

    if !skip_default && !default_prompt.is_empty() {
        system_content.push_str("\n\nDefault Prompt:\n");
        system_content.push_str(default_prompt);
    }

    if let Some(context) = file_context.filter(|c| !c.is_empty()) {
        let context = truncate_context(context, options.max_file_context_chars);
        system_content.push_str("\n\nFile Context:\n");
        system_content.push_str(&context);
    }

    system_content
}
