//! Content loading and prompt templating.
//!
//! Card and question texts live in plain text files, one entry per
//! line, split into SFW and NSFW sets. Card texts may carry `{Name}`
//! placeholders filled with player names; question texts carry card
//! type placeholders like `{Person|Object}` resolved by drawing from
//! the session's card pools, and `{_}` for a literal blank.
//!
//! Everything here is pure with respect to the session state except
//! for the randomness it consumes.

use log::warn;
use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use std::fs;
use std::io;
use std::path::Path;

use crate::game::constants::QUESTION_COUNT;
use crate::game::entities::{Card, CardId, CardType, Question};

/// A category's text lines, split by audience.
#[derive(Clone, Debug, Default)]
struct ContentSet {
    sfw: Vec<String>,
    nsfw: Vec<String>,
}

impl ContentSet {
    /// SFW lines, with the NSFW lines mixed in when requested.
    fn lines(&self, nsfw: bool) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.sfw.len() + self.nsfw.len());
        if nsfw {
            lines.extend(self.nsfw.iter().cloned());
        }
        lines.extend(self.sfw.iter().cloned());
        lines
    }
}

/// All predefined card and question texts, loaded once at startup.
#[derive(Clone, Debug)]
pub struct ContentLibrary {
    persons: ContentSet,
    objects: ContentSet,
    places: ContentSet,
    activities: ContentSet,
    questions: ContentSet,
}

impl ContentLibrary {
    /// Loads every content file from `dir`. A missing SFW file is an
    /// error; a missing NSFW file just leaves that set empty.
    pub fn load(dir: &Path) -> io::Result<Self> {
        Ok(Self {
            persons: load_set(dir, "Persons")?,
            objects: load_set(dir, "Objects")?,
            places: load_set(dir, "Places")?,
            activities: load_set(dir, "Activities")?,
            questions: load_set(dir, "Questions")?,
        })
    }

    /// Builds a library directly from line lists, bypassing the
    /// filesystem. Used by the debug tooling and tests.
    #[must_use]
    pub fn from_lines(
        persons: Vec<String>,
        objects: Vec<String>,
        places: Vec<String>,
        activities: Vec<String>,
        questions: Vec<String>,
    ) -> Self {
        let set = |sfw| ContentSet {
            sfw,
            nsfw: Vec::new(),
        };
        Self {
            persons: set(persons),
            objects: set(objects),
            places: set(places),
            activities: set(activities),
            questions: set(questions),
        }
    }

    /// The full predefined card pool for one session, with `{Name}`
    /// placeholders substituted from `player_names`. Cards are returned
    /// unstamped; the session assigns their metadata.
    #[must_use]
    pub fn predefined_cards(&self, nsfw: bool, player_names: &[String]) -> Vec<Card> {
        let mut rng = rand::rng();
        let mut cards = Vec::new();

        let categories = [
            (CardType::Person, &self.persons),
            (CardType::Object, &self.objects),
            (CardType::Place, &self.places),
            (CardType::Activity, &self.activities),
        ];
        for (card_type, set) in categories {
            for text in set.lines(nsfw) {
                let text = substitute_player_names(&text, player_names, &mut rng);
                cards.push(Card::new(card_type, text));
            }
        }
        cards
    }

    /// Raw question lines for the requested audience; placeholders stay
    /// unresolved until the session's card pool is complete.
    #[must_use]
    pub fn question_texts(&self, nsfw: bool) -> Vec<String> {
        self.questions.lines(nsfw)
    }
}

fn load_set(dir: &Path, name: &str) -> io::Result<ContentSet> {
    Ok(ContentSet {
        sfw: load_lines(&dir.join(format!("SFW{name}.txt")))?,
        nsfw: match load_lines(&dir.join(format!("NSFW{name}.txt"))) {
            Ok(lines) => lines,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                warn!("no NSFW{name}.txt in content directory, set stays empty");
                Vec::new()
            }
            Err(err) => return Err(err),
        },
    })
}

/// Non-empty lines of a text file, carriage returns stripped.
fn load_lines(path: &Path) -> io::Result<Vec<String>> {
    let data = fs::read_to_string(path)?;
    Ok(data
        .lines()
        .map(|line| line.trim_end_matches('\r').to_string())
        .filter(|line| !line.is_empty())
        .collect())
}

/// Replaces every `{Word}` placeholder in a card text with a distinct
/// player name; names cycle when there are more placeholders than
/// players.
pub(crate) fn substitute_player_names(
    text: &str,
    player_names: &[String],
    rng: &mut impl Rng,
) -> String {
    if player_names.is_empty() {
        return text.to_string();
    }

    let mut shuffled: Vec<&String> = player_names.iter().collect();
    shuffled.shuffle(rng);
    let mut names = shuffled.iter().cycle();

    let mut result = text.to_string();
    for placeholder in placeholders(text) {
        if let Some(name) = names.next() {
            result = result.replacen(&placeholder, name.as_str(), 1);
        }
    }
    result
}

/// Resolves `QUESTION_COUNT` random prompts against the combined
/// user-authored and predefined pools. Unresolvable placeholders
/// degrade to a blank rather than dropping the prompt.
#[must_use]
pub(crate) fn build_questions(
    texts: &[String],
    user_cards: &[Card],
    predefined_cards: &[Card],
) -> Vec<Question> {
    let mut rng = rand::rng();
    let combined: Vec<&Card> = user_cards.iter().chain(predefined_cards.iter()).collect();

    let mut candidates: Vec<&String> = texts.iter().collect();
    candidates.shuffle(&mut rng);

    candidates
        .into_iter()
        .take(QUESTION_COUNT)
        .map(|raw| Question {
            text: resolve_question_text(raw, &combined, &mut rng),
            raw_text: raw.clone(),
        })
        .collect()
}

fn resolve_question_text(raw: &str, cards: &[&Card], rng: &mut impl Rng) -> String {
    // Literal blanks first, so `{_}` never parses as a type option.
    let mut text = raw.replace("{_}", "___");

    let mut used: Vec<CardId> = Vec::new();
    for placeholder in placeholders(&text) {
        let options: Vec<CardType> = placeholder[1..placeholder.len() - 1]
            .split('|')
            .filter_map(CardType::from_placeholder)
            .collect();

        let replacement = match draw_for_placeholder(&options, cards, &mut used, rng) {
            Some(card) => card.text.clone(),
            None => {
                warn!("no card available for placeholder {placeholder}");
                "___".to_string()
            }
        };
        text = text.replacen(&placeholder, &replacement, 1);
    }
    text
}

/// A random card matching one of the allowed types, distinct from the
/// cards already used within the same prompt.
fn draw_for_placeholder<'a>(
    options: &[CardType],
    cards: &[&'a Card],
    used: &mut Vec<CardId>,
    rng: &mut impl Rng,
) -> Option<&'a Card> {
    let eligible: Vec<&&Card> = cards
        .iter()
        .filter(|c| options.contains(&c.card_type) && !used.contains(&c.id))
        .collect();

    let card = eligible.choose(rng)?;
    used.push(card.id);
    Some(**card)
}

/// Brace-delimited placeholders (`{Person}`, `{Player|Person}`, ...)
/// in order of appearance. Only word characters and `|` may appear
/// between the braces.
fn placeholders(text: &str) -> Vec<String> {
    let mut found = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        if c != '{' {
            continue;
        }
        let mut end = None;
        for (i, inner) in chars.by_ref() {
            match inner {
                '}' => {
                    end = Some(i);
                    break;
                }
                c if c.is_alphanumeric() || c == '_' || c == '|' => {}
                _ => break,
            }
        }
        if let Some(end) = end {
            found.push(text[start..=end].to_string());
        }
    }
    found
}
