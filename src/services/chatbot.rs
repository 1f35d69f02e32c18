//! Keyword chatbot for the website widget.
//!
//! Rules are checked in order and the first rule with a matching keyword
//! answers. Single-word keywords must equal a whole word of the lowercased
//! message, so "uren" does not fire on "muren". Keywords with a space or
//! hyphen are matched as phrases. Anything unmatched is left to Gemini, or
//! gets the fallback reply when no model is configured.

use serde::{Deserialize, Serialize};

pub const MAX_MESSAGE_CHARS: usize = 2000;

pub const FALLBACK_REPLY: &str = "Bedankt voor uw bericht! Ik kan die vraag helaas niet meteen \
beantwoorden. Laat uw gegevens achter via het contactformulier of bel ons, dan neemt een \
van onze medewerkers zo snel mogelijk contact met u op.";

/// System instruction sent along with AI-answered chat messages
pub const AI_SYSTEM_PROMPT: &str = "Je bent de vriendelijke assistent van een Belgisch \
bouw- en renovatiebedrijf. Je beantwoordt vragen over isolatiewerken, renovatiewerken, \
dakwerken, gevelwerken en schilderwerken. Antwoord kort en in het Nederlands. Geef nooit \
bindende prijzen; verwijs voor een prijsindicatie naar de offertetool op de website.";

/// Where a chat reply came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReplySource {
    Keyword,
    Ai,
    Fallback,
}

impl ReplySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::Ai => "ai",
            Self::Fallback => "fallback",
        }
    }
}

struct KeywordRule {
    keywords: &'static [&'static str],
    reply: &'static str,
}

const RULES: &[KeywordRule] = &[
    KeywordRule {
        keywords: &["offerte", "offertes", "prijs", "prijzen", "kost", "kosten", "budget", "schatting"],
        reply: "U kunt via onze offertetool meteen een vrijblijvende prijsindicatie berekenen. \
Vul het type werken, de oppervlakte, de complexiteit en de gewenste timing in en u krijgt \
een schatting die 30 dagen geldig is.",
    },
    KeywordRule {
        keywords: &["isolatie", "isoleren", "spouwmuur", "zoldervloer"],
        reply: "Wij isoleren daken, spouwmuren, zoldervloeren en kelders. Goede isolatie \
verlaagt uw energiefactuur aanzienlijk en komt vaak in aanmerking voor premies.",
    },
    KeywordRule {
        keywords: &["dak", "daken", "dakwerk", "dakwerken", "lekkage", "goot", "dakgoot"],
        reply: "Voor dakwerken zoals nieuwe dakbedekking, dakisolatie of het herstellen \
van goten en lekkages komen wij graag langs voor een inspectie ter plaatse.",
    },
    KeywordRule {
        keywords: &["gevel", "gevels", "voegwerk", "gevelreiniging", "impregneren"],
        reply: "Wij verzorgen gevelrenovatie, voegwerk, gevelreiniging en impregnatie \
zodat uw woning weer jaren beschermd is.",
    },
    KeywordRule {
        keywords: &["schilder", "schilders", "schilderen", "verf", "verven", "schilderwerk", "schilderwerken"],
        reply: "Onze schilders werken zowel binnen als buiten, inclusief het voorbereiden \
van de ondergrond.",
    },
    KeywordRule {
        keywords: &["renovatie", "renoveren", "verbouwing", "verbouwen", "badkamer", "keuken"],
        reply: "Van een badkamer of keuken tot een totaalrenovatie: wij begeleiden uw \
project van ontwerp tot oplevering.",
    },
    KeywordRule {
        keywords: &["premie", "subsidie", "mijn verbouwpremie"],
        reply: "Voor veel isolatie- en renovatiewerken bestaan premies. Wij bezorgen u \
de nodige facturen en attesten om uw aanvraag in te dienen.",
    },
    KeywordRule {
        keywords: &["openingsuren", "open", "uren", "bereikbaar"],
        reply: "Wij zijn bereikbaar van maandag tot vrijdag tussen 8u en 17u. Buiten die \
uren kunt u altijd een bericht achterlaten.",
    },
    KeywordRule {
        keywords: &["contact", "contacteren", "telefoon", "bellen", "mail", "e-mail", "adres"],
        reply: "U kunt ons bereiken via het contactformulier op de website, per e-mail of \
telefonisch tijdens de kantooruren.",
    },
    KeywordRule {
        keywords: &["hallo", "hoi", "goedemorgen", "goedemiddag", "goedenavond", "dag"],
        reply: "Hallo! Waarmee kan ik u helpen? Stel gerust uw vraag over onze werken of \
vraag een prijsindicatie aan.",
    },
];

/// Look up a canned reply for the message, if any rule matches.
pub fn keyword_reply(message: &str) -> Option<&'static str> {
    let normalized = message.to_lowercase();
    let words: Vec<&str> = normalized
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    let matches = |kw: &str| {
        if kw.chars().all(char::is_alphanumeric) {
            words.contains(&kw)
        } else {
            normalized.contains(kw)
        }
    };

    RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|kw| matches(kw)))
        .map(|rule| rule.reply)
}

/// Validate a chat message, returning the trimmed text.
pub fn validate_message(message: &str) -> Result<&str, String> {
    let trimmed = message.trim();

    if trimmed.is_empty() {
        return Err("Message must not be empty".to_string());
    }
    if trimmed.chars().count() > MAX_MESSAGE_CHARS {
        return Err(format!(
            "Message must be at most {} characters",
            MAX_MESSAGE_CHARS
        ));
    }

    Ok(trimmed)
}
