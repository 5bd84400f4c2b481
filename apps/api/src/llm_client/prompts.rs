// Shared prompt fragments.
// Each service that needs LLM calls defines its own prompts.rs alongside it.

/// System prompt fragment that enforces a bare-statement reply.
pub const PLAIN_TEXT_ONLY_SYSTEM: &str = "\
    Respond with the revised statement only. \
    Do NOT wrap it in quotes. \
    Do NOT use markdown. \
    Do NOT include explanations, labels, or character counts.";

/// Instruction that keeps revisions faithful to the source statement.
pub const FIDELITY_INSTRUCTION: &str = "\
    Keep every fact, number, and outcome from the original statement. \
    Do NOT invent metrics, units, or accomplishments.";
