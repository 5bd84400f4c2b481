//! LLM prompt constants for character-count correction.
//!
//! Both prompts ask for the bare revised statement. The enforcer strips any wrapping
//! quotes the model adds anyway.

// ────────────────────────────────────────────────────────────────────────────
// Expand prompt (statement below the window)
// ────────────────────────────────────────────────────────────────────────────

pub const EXPAND_SYSTEM: &str = "\
You are an editor of Air Force performance and award statements. Your task is to \
lengthen a statement to an exact character count without changing what it claims.";

pub const EXPAND_PROMPT_TEMPLATE: &str = "\
The statement below is {current_length} characters. It must be between {target_min} and \
{target_max} characters. ADD exactly {delta} characters.\n\
{context_line}\
\n\
STATEMENT: {statement}\n\
\n\
TECHNIQUES (use the fewest needed):\n\
1. Substitute short words with precise, longer equivalents (\"led\" → \"directed\")\n\
2. Expand scope already implied by the statement (unit, mission, beneficiary)\n\
3. Spell out abbreviations (\"mx\" → \"maintenance\", \"sq\" → \"squadron\")\n\
\n\
{fidelity}\n\
{plain_text}";

// ────────────────────────────────────────────────────────────────────────────
// Contract prompt (statement above the window)
// ────────────────────────────────────────────────────────────────────────────

pub const CONTRACT_SYSTEM: &str = "\
You are an editor of Air Force performance and award statements. Your task is to \
shorten a statement to an exact character count without dropping any result.";

pub const CONTRACT_PROMPT_TEMPLATE: &str = "\
The statement below is {current_length} characters. It must be between {target_min} and \
{target_max} characters. REMOVE exactly {delta} characters.\n\
{context_line}\
\n\
STATEMENT: {statement}\n\
\n\
TECHNIQUES (use the fewest needed):\n\
1. Substitute long words with shorter equivalents (\"directed\" → \"led\")\n\
2. Contract scope: drop filler phrases and redundant qualifiers\n\
3. Use standard abbreviations (\"maintenance\" → \"mx\", \"squadron\" → \"sq\", \"and\" → \"&\")\n\
\n\
{fidelity}\n\
{plain_text}";
