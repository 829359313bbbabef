//! Prompt templates sent to the hosted models.

const CODEGEN_SYSTEM_PROMPT: &str =
    "You are a code generation assistant. Generate clean, runnable code with brief comments.";

const DIAGRAM_INSTRUCTION: &str =
    "Create a clear systems architecture diagram. Show components and arrows for data flow.";

const ARCHITECTURE_SUMMARY_REQUEST: &str =
    "Summarize code architecture: identify components, data flow, and interfaces.";

/// Wrap a user request for the code model.
pub fn build_codegen_prompt(user_prompt: &str) -> String {
    format!(
        "{}\n\nUser request:\n{}\n\nProvide only code when appropriate.",
        CODEGEN_SYSTEM_PROMPT, user_prompt
    )
}

/// Build the image-model prompt. When code was generated the prompt also
/// asks for its architecture.
pub fn build_diagram_prompt(user_prompt: &str, generated_code: Option<&str>) -> String {
    let mut context = user_prompt.to_string();
    if generated_code.is_some_and(|code| !code.is_empty()) {
        context.push_str("\n\n");
        context.push_str(ARCHITECTURE_SUMMARY_REQUEST);
    }
    format!("{}\nContext: {}", DIAGRAM_INSTRUCTION, context)
}
