//! Lexicon-based compound polarity for product reviews.

/// Word valences on a -4..=4 scale. Keys are lowercase single words.
pub(crate) const LEXICON: &[(&str, f64)] = &[
    // Positive signals
    ("amazing", 2.8),
    ("awesome", 3.1),
    ("beautiful", 2.9),
    ("best", 3.2),
    ("comfortable", 1.8),
    ("convenient", 1.6),
    ("durable", 1.7),
    ("easy", 1.9),
    ("excellent", 2.7),
    ("fantastic", 2.6),
    ("fast", 1.2),
    ("fine", 0.8),
    ("good", 1.9),
    ("great", 3.1),
    ("happy", 2.7),
    ("impressed", 2.1),
    ("impressive", 2.3),
    ("like", 1.5),
    ("liked", 1.8),
    ("love", 3.2),
    ("loved", 2.9),
    ("nice", 1.8),
    ("perfect", 2.7),
    ("pleased", 1.9),
    ("premium", 1.4),
    ("recommend", 1.5),
    ("recommended", 1.6),
    ("reliable", 1.9),
    ("satisfied", 1.8),
    ("smooth", 1.4),
    ("solid", 1.3),
    ("sturdy", 1.4),
    ("superb", 3.1),
    ("value", 1.1),
    ("wonderful", 2.7),
    ("worth", 0.9),
    // Negative signals
    ("awful", -2.0),
    ("bad", -2.5),
    ("broke", -1.6),
    ("broken", -2.1),
    ("cheap", -0.9),
    ("complaint", -1.7),
    ("defective", -2.3),
    ("difficult", -1.5),
    ("disappointed", -2.1),
    ("disappointing", -2.2),
    ("faulty", -2.0),
    ("flimsy", -1.6),
    ("garbage", -2.5),
    ("hate", -2.7),
    ("horrible", -2.5),
    ("issue", -0.9),
    ("junk", -2.1),
    ("poor", -2.1),
    ("problem", -1.7),
    ("refund", -1.2),
    ("return", -0.6),
    ("returned", -1.0),
    ("slow", -1.1),
    ("terrible", -2.1),
    ("uncomfortable", -1.6),
    ("useless", -1.8),
    ("waste", -1.8),
    ("worse", -2.1),
    ("worst", -3.1),
    ("wrong", -2.1),
];

/// Intensifiers and dampeners that shift the next sentiment word.
const BOOSTERS: &[(&str, f64)] = &[
    ("absolutely", 0.293),
    ("extremely", 0.293),
    ("really", 0.293),
    ("so", 0.293),
    ("totally", 0.293),
    ("very", 0.293),
    ("barely", -0.293),
    ("kinda", -0.293),
    ("slightly", -0.293),
    ("somewhat", -0.293),
];

const NEGATIONS: &[&str] = &[
    "not", "no", "never", "none", "nothing", "nor", "neither", "without", "cannot", "hardly",
    "aint", "isnt", "wasnt", "dont", "doesnt", "didnt", "wont", "cant", "couldnt", "shouldnt",
];

const NEGATION_SCALAR: f64 = -0.74;
const BUT_BEFORE: f64 = 0.5;
const BUT_AFTER: f64 = 1.5;
const EXCLAMATION_BOOST: f64 = 0.292;
const MAX_EXCLAMATIONS: usize = 4;
const CAPS_EMPHASIS: f64 = 0.733;
const NORMALIZATION_ALPHA: f64 = 15.0;

/// Reviews scoring strictly above this are positive.
pub const POSITIVE_THRESHOLD: f64 = 0.05;
/// Reviews scoring strictly below this are negative.
pub const NEGATIVE_THRESHOLD: f64 = -0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Positive,
    Negative,
    Neutral,
}

/// Classify a compound score with strict fixed thresholds.
#[must_use]
pub fn classify(compound: f64) -> Polarity {
    if compound > POSITIVE_THRESHOLD {
        Polarity::Positive
    } else if compound < NEGATIVE_THRESHOLD {
        Polarity::Negative
    } else {
        Polarity::Neutral
    }
}

/// Produces a compound polarity in `[-1.0, 1.0]` for a piece of text.
pub trait PolarityScorer: Send + Sync {
    fn compound(&self, text: &str) -> f64;
}

/// Rule-based scorer over [`LEXICON`] with negation, boosters, contrastive
/// "but", capitalization, and exclamation emphasis.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexiconScorer;

impl PolarityScorer for LexiconScorer {
    fn compound(&self, text: &str) -> f64 {
        compound_score(text)
    }
}

fn valence(word: &str) -> Option<f64> {
    LEXICON
        .iter()
        .find(|(w, _)| *w == word)
        .map(|&(_, weight)| weight)
}

fn booster(word: &str) -> Option<f64> {
    BOOSTERS
        .iter()
        .find(|(w, _)| *w == word)
        .map(|&(_, weight)| weight)
}

fn is_negation(word: &str) -> bool {
    NEGATIONS.contains(&word)
}

/// Score `text`; `0.0` for empty or unknown text.
#[must_use]
pub fn compound_score(text: &str) -> f64 {
    let raw: Vec<&str> = text
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '\''))
        .filter(|w| !w.is_empty())
        .collect();
    let words: Vec<String> = raw
        .iter()
        .map(|w| w.to_lowercase().replace('\'', ""))
        .collect();
    let mixed_case = raw.iter().any(|w| w.chars().any(char::is_lowercase));

    let mut sentiments: Vec<f64> = Vec::with_capacity(words.len());
    for (i, word) in words.iter().enumerate() {
        let Some(mut v) = valence(word) else {
            sentiments.push(0.0);
            continue;
        };

        let shouting = raw[i].len() > 1 && raw[i].chars().all(|c| !c.is_lowercase());
        if mixed_case && shouting {
            v += CAPS_EMPHASIS.copysign(v);
        }

        for (distance, scale) in [(1, 1.0), (2, 0.95), (3, 0.9)] {
            let Some(prev) = i.checked_sub(distance).map(|j| words[j].as_str()) else {
                break;
            };
            if let Some(boost) = booster(prev) {
                // Boosters push away from zero, dampeners toward it.
                let scalar = if v < 0.0 { -boost } else { boost };
                v += scalar * scale;
            }
        }

        let negated = (1..=3)
            .filter_map(|d| i.checked_sub(d))
            .any(|j| is_negation(&words[j]));
        if negated {
            v *= NEGATION_SCALAR;
        }

        sentiments.push(v);
    }

    if let Some(but) = words.iter().position(|w| w == "but") {
        for (i, s) in sentiments.iter_mut().enumerate() {
            if i < but {
                *s *= BUT_BEFORE;
            } else if i > but {
                *s *= BUT_AFTER;
            }
        }
    }

    let mut sum: f64 = sentiments.iter().sum();
    if sum != 0.0 {
        let bangs = text.matches('!').count().min(MAX_EXCLAMATIONS);
        #[allow(clippy::cast_precision_loss)]
        let emphasis = bangs as f64 * EXCLAMATION_BOOST;
        sum += emphasis.copysign(sum);
    }

    normalize(sum)
}

fn normalize(sum: f64) -> f64 {
    (sum / (sum * sum + NORMALIZATION_ALPHA).sqrt()).clamp(-1.0, 1.0)
}
