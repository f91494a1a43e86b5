//! Prompt composer for the style transformation stage.
//!
//! Pure string construction: fixed template, constant per-trait adjective
//! lists, intensities copied verbatim from the (load-validated) profile,
//! history inserted as-is with a trailing line holding the utterance to be
//! rewritten. Identical inputs always produce an identical prompt.

use timbre_core::message::HistoryTurn;
use timbre_core::profile::StyleProfile;

/// Adjectives describing the vibrancy dimension.
pub const ADJ_VIBRANCY: &str = "enthusiastic, joyful, cheerful, social, adventurous, curious, motivated, passionate, playful, talkative, welcoming, optimistic, active, inquisitive, communicative, humorous, determined, interested, explorative, caring, engaging, proactive, affectionate, creative, inspiring, brave, generous, responsive, suggestive, sensitive, open-minded, interactive, casual, verbal";

/// Adjectives describing the conscientiousness dimension.
pub const ADJ_CONSCIENTIOUSNESS: &str = "logical, precise, efficient, organized, informative, smart, knowledgeable, intellectual, functional, self-disciplined, thorough, objective, insightful, wise, formal, useful, stable, responsible, deep, articulate, consistent, diplomatic, helpful, mindful, considerate, not contradictory, complex, direct, philosophical, critical, understandable";

/// Adjectives describing the civility dimension.
pub const ADJ_CIVILITY: &str = "not offensive, not rude, not arrogant, respectful, polite, accepting, not harsh, not confrontational, humble, not irritable, tolerant, not patronizing, gentle, not stubborn, courteous, calm, agreeable, not angry, understanding, cooperative, careful, friendly, assertive, patient, confident, submissive, neutral, not narrow-minded, supportive, easygoing, not self-centered, not overbearing, reserved";

/// Adjectives describing the artificiality dimension.
pub const ADJ_ARTIFICIALITY: &str = "computerized, boring, emotionless, fake, robotic, annoying, not human-like, predictable, shallow, repetitive, vague, haphazard, dysfunctional, cold, confusing, creepy, simple, not realistic, inhibited, old-fashioned, dependent, self-aware";

/// Adjectives describing the neuroticism dimension.
pub const ADJ_NEUROTICISM: &str = "depressed, pessimistic, negative, fearful, complaining, frustrated, agitated, lonely, upset, shy, helpless, worried, moody, confused, scatterbrained, lost, preoccupied, absentminded, pensive, careless, nostalgic, defensive, deceitful, romantic";

/// The rewrite-instruction template. Placeholder tags are substituted by
/// [`compose`]; nothing else in the output varies.
const PROMPT_TEMPLATE: &str = r"## CONTEXT

### Personality Model:
Given is a unique personality profile based on five key dimensions: **Vibrancy**, **Conscientiousness**, **Civility**, **Artificiality**, and **Neuroticism**.

Each dimension has a set of associated adjectives:
- Vibrancy is described by the adjectives: <ADJ_VIBRANCY>
- Conscientiousness is described by the adjectives: <ADJ_CONSCIENTIOUSNESS>
- Civility is described by the adjectives: <ADJ_CIVILITY>
- Artificiality is described by the adjectives: <ADJ_ARTIFICIALITY>
- Neuroticism is described by the adjectives: <ADJ_NEUROTICISM>

### Personality Scale:
Each dimension has a certain intensity level from -2 (lowest) to +2 (highest).
- **Level -2:** the opposite of the trait is strongly present.
- **Level -1:** the opposite of the trait is mostly present.
- **Level 0:** the trait is neutral, neither implying nor contradicting the trait.
- **Level +1:** the trait is mostly present.
- **Level +2:** the trait is strongly present.

### Personality Profile:
The current personality settings are:
- Vibrancy: <INT_VIBRANCY>
- Conscientiousness: <INT_CONSCIENTIOUSNESS>
- Civility: <INT_CIVILITY>
- Artificiality: <INT_ARTIFICIALITY>
- Neuroticism: <INT_NEUROTICISM>

---

## TASK
Given a fictional conversation between <ROLE_A> and <ROLE_B>, rewrite the latest (and only the latest) utterance of <ROLE_B> such that the content, language, tone, and style of the utterance match the specified personality settings above.

---

## OUTPUT FORMAT
Avoid using the trait's adjectives in the rewritten sentence. Output only the rewritten utterance without additional punctuation, speaker tags, or explanations.

---

## ADDITIONAL DATA
<CONVERSATION_CONTEXT>
<CONVERSATION_HISTORY>";

/// Labels substituted into the template and history excerpt.
#[derive(Clone, Debug)]
pub struct ComposerOptions {
    /// Context line inserted under `## ADDITIONAL DATA`.
    pub context_label: String,
    /// Speaker label for user turns.
    pub user_label: String,
    /// Speaker label for assistant turns; also labels the trailing line.
    pub assistant_label: String,
}

impl Default for ComposerOptions {
    fn default() -> Self {
        Self {
            context_label: "Assessment Workbench - Learning Assistant".to_string(),
            user_label: "Student".to_string(),
            assistant_label: "AI Assistant".to_string(),
        }
    }
}

/// Render a history excerpt as `Label: text` lines, chronological order.
#[must_use]
pub fn format_history(history: &[HistoryTurn], options: &ComposerOptions) -> String {
    history
        .iter()
        .map(|turn| {
            let label = if turn.from_user {
                &options.user_label
            } else {
                &options.assistant_label
            };
            format!("{label}: {}", turn.text)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the full rewrite instruction for one utterance.
///
/// The profile is assumed resolved and load-validated; intensities are
/// copied verbatim. The original text lands on a synthesized trailing
/// history line labeled as the assistant's utterance, so the backend
/// rewrites exactly that line.
#[must_use]
pub fn compose(
    original_text: &str,
    profile: &StyleProfile,
    history: &[HistoryTurn],
    options: &ComposerOptions,
) -> String {
    let rendered_history = format_history(history, options);
    let full_history = format!(
        "{rendered_history}\n{}: {original_text}",
        options.assistant_label
    );

    PROMPT_TEMPLATE
        .replace("<ADJ_VIBRANCY>", ADJ_VIBRANCY)
        .replace("<ADJ_CONSCIENTIOUSNESS>", ADJ_CONSCIENTIOUSNESS)
        .replace("<ADJ_CIVILITY>", ADJ_CIVILITY)
        .replace("<ADJ_ARTIFICIALITY>", ADJ_ARTIFICIALITY)
        .replace("<ADJ_NEUROTICISM>", ADJ_NEUROTICISM)
        .replace("<INT_VIBRANCY>", &profile.vibrancy.to_string())
        .replace("<INT_CONSCIENTIOUSNESS>", &profile.conscientiousness.to_string())
        .replace("<INT_CIVILITY>", &profile.civility.to_string())
        .replace("<INT_ARTIFICIALITY>", &profile.artificiality.to_string())
        .replace("<INT_NEUROTICISM>", &profile.neuroticism.to_string())
        .replace("<ROLE_A>", &options.user_label)
        .replace("<ROLE_B>", &options.assistant_label)
        .replace("<CONVERSATION_CONTEXT>", &options.context_label)
        .replace("<CONVERSATION_HISTORY>", &full_history)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
