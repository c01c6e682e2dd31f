//! Prompt assembly for context-grounded generation.

/// System prompt framing the model as the brand's social voice.
pub const SYSTEM_PROMPT: &str = "You are the social media voice of a small brand. \
Base everything you write on the provided context. \
Tone: warm, artisanal, modern. \
Keep it short, do not include hashtags, and do not invent facts \
that are not present in the context.";

/// Build the user prompt from retrieved context fragments and an
/// instruction. Fragments are numbered so the model can stay anchored.
pub fn build_generation_prompt(context_fragments: &[String], instruction: &str) -> String {
    let mut prompt = String::new();

    if !context_fragments.is_empty() {
        prompt.push_str("Context:\n");
        for (i, fragment) in context_fragments.iter().enumerate() {
            prompt.push_str(&format!("[Context {}]\n{}\n\n", i + 1, fragment));
        }
    }

    prompt.push_str(instruction);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_generation_prompt() {
        let context = vec![
            "We bake everything fresh daily.".to_string(),
            "All packaging is compostable.".to_string(),
        ];

        let prompt = build_generation_prompt(&context, "Write one short post.");

        assert!(prompt.contains("[Context 1]"));
        assert!(prompt.contains("[Context 2]"));
        assert!(prompt.contains("compostable"));
        assert!(prompt.ends_with("Write one short post."));
    }

    #[test]
    fn test_prompt_without_context() {
        let prompt = build_generation_prompt(&[], "Say hello.");
        assert_eq!(prompt, "Say hello.");
    }
}
