//! Reply Emotion Detection — map free text to a single emotion tag.
//!
//! Keyword-based (fast, no LLM call). Matching is substring containment on
//! the lower-cased text, not whole words, so punctuation such as `"!"` works
//! as a keyword. The order of `EMOTION_KEYWORDS` decides ties.

use super::Emotion;

// ── Keyword table ──────────────────────────────────────────

const EMOTION_KEYWORDS: &[(Emotion, &[&str])] = &[
    (
        Emotion::Happy,
        &[
            "happy", "joy", "great", "awesome", "wonderful", "love", "excited", "yay", "!",
            "haha", "lol",
        ],
    ),
    (
        Emotion::Sad,
        &[
            "sad",
            "sorry",
            "unfortunate",
            "disappointed",
            "miss",
            "crying",
            "tear",
        ],
    ),
    (
        Emotion::Surprised,
        &[
            "wow", "omg", "what", "really", "?!", "surprised", "shocked", "amazing",
        ],
    ),
    (
        Emotion::Angry,
        &["angry", "mad", "annoyed", "frustrated", "grr", "ugh", "hate"],
    ),
    (
        Emotion::Confused,
        &["confused", "hmm", "uh", "what", "huh", "understand", "??"],
    ),
    (
        Emotion::Worried,
        &["worried", "concerned", "anxious", "nervous", "hope", "careful"],
    ),
    (
        Emotion::Excited,
        &["excited", "can't wait", "amazing", "incredible", "!!!", "omg"],
    ),
];

/// Per-emotion scores, in keyword-table order.
fn score(text: &str) -> Vec<(Emotion, usize)> {
    let lower = text.to_lowercase();

    let mut scores: Vec<(Emotion, usize)> = EMOTION_KEYWORDS
        .iter()
        .map(|(emotion, keywords)| {
            let hits = keywords.iter().filter(|kw| lower.contains(*kw)).count();
            (*emotion, hits)
        })
        .collect();

    // Punctuation bonuses
    let bangs = text.matches('!').count();
    let questions = text.matches('?').count();
    let mut bump = |target: Emotion, by: usize| {
        if let Some(entry) = scores.iter_mut().find(|(e, _)| *e == target) {
            entry.1 += by;
        }
    };
    bump(Emotion::Excited, bangs);
    if questions > 0 && bangs > 0 {
        bump(Emotion::Surprised, 1);
    }
    if questions > 1 {
        bump(Emotion::Confused, 1);
    }

    scores
}

/// Detect the dominant emotion in `text`. Always returns a tag; `Neutral`
/// when nothing scores.
pub fn detect(text: &str) -> Emotion {
    let mut best = (Emotion::Neutral, 0usize);
    for (emotion, points) in score(text) {
        // Strictly greater: the first maximum in table order wins.
        if points > best.1 {
            best = (emotion, points);
        }
    }
    best.0
}

/// Whether the text is emphatic enough to warrant a full motion playback.
pub fn should_emphasize(text: &str) -> bool {
    text.contains("!!!") || text.matches('!').count() >= 3
}
