//! Rule-based part-of-speech tagging and verb lemmatization.
//!
//! Closed word classes (adpositions, determiners, pronouns, auxiliaries,
//! conjunctions) are small fixed lists. Verbs are recognised against a
//! base-form lexicon of the action verbs that dominate resumes and job
//! descriptions, undoing regular inflection or looking up irregular forms.
//! Anything else is treated as a noun.

use std::borrow::Cow;

use phf::{phf_map, phf_set};

use crate::nlp::PartOfSpeech;

static ADPOSITIONS: phf::Set<&'static str> = phf_set! {
    "about", "above", "across", "after", "against", "along", "amid", "among",
    "around", "as", "at", "before", "behind", "below", "beneath", "beside",
    "between", "beyond", "by", "despite", "down", "during", "except", "for",
    "from", "in", "inside", "into", "like", "near", "of", "off", "on", "onto",
    "out", "outside", "over", "past", "per", "since", "through", "throughout",
    "to", "toward", "towards", "under", "underneath", "until", "up", "upon",
    "via", "with", "within", "without",
};

static DETERMINERS: phf::Set<&'static str> = phf_set! {
    "a", "all", "an", "another", "any", "both", "each", "either", "every",
    "neither", "no", "some", "such", "that", "the", "these", "this", "those",
    "what", "whatever", "which",
};

static PRONOUNS: phf::Set<&'static str> = phf_set! {
    "anyone", "anything", "everyone", "everything", "he", "her", "hers",
    "herself", "him", "himself", "his", "i", "it", "its", "itself", "me",
    "mine", "my", "myself", "nobody", "nothing", "our", "ours", "ourselves",
    "she", "someone", "something", "their", "theirs", "them", "themselves",
    "they", "us", "we", "who", "whom", "whose", "you", "your", "yours",
    "yourself", "yourselves",
};

static AUXILIARIES: phf::Set<&'static str> = phf_set! {
    "am", "are", "be", "been", "being", "can", "could", "did", "do", "does",
    "had", "has", "have", "having", "is", "may", "might", "must", "shall",
    "should", "was", "were", "will", "would",
};

static CONJUNCTIONS: phf::Set<&'static str> = phf_set! {
    "although", "and", "because", "but", "if", "nor", "or", "so", "than",
    "though", "unless", "whereas", "whether", "while", "yet",
};

static VERB_BASES: phf::Set<&'static str> = phf_set! {
    "achieve", "adapt", "administer", "advise", "align", "analyse", "analyze",
    "apply", "architect", "assess", "assist", "audit", "automate", "become",
    "begin", "bring", "build", "calculate", "choose", "coach", "code",
    "collaborate", "communicate", "compile", "complete", "conduct",
    "configure", "consult", "contribute", "coordinate", "create", "debug",
    "define", "deliver", "deploy", "design", "develop", "diagnose", "direct",
    "drive", "earn", "educate", "enable", "enhance", "ensure", "establish",
    "evaluate", "execute", "expand", "facilitate", "find", "gather",
    "generate", "get", "give", "go", "grow", "guide", "handle", "help",
    "hire", "hold", "identify", "implement", "improve", "include",
    "increase", "influence", "initiate", "innovate", "install", "integrate",
    "introduce", "investigate", "join", "keep", "know", "launch", "lead",
    "learn", "maintain", "make", "manage", "meet", "mentor", "migrate",
    "monitor", "motivate", "negotiate", "offer", "optimise", "optimize",
    "orchestrate", "organise", "organize", "oversee", "own", "participate",
    "partner", "perform", "pilot", "plan", "prefer", "prepare", "present",
    "prioritize", "produce", "program", "propose", "provide", "publish",
    "recommend", "redesign", "reduce", "refactor", "release", "report",
    "require", "resolve", "review", "run", "scale", "schedule", "secure",
    "see", "seek", "sell", "serve", "set", "ship", "simplify", "solve",
    "speak", "spearhead", "spend", "streamline", "strengthen", "study",
    "supervise", "support", "take", "teach", "test", "think", "track",
    "train", "transform", "troubleshoot", "understand", "upgrade", "use",
    "utilize", "validate", "verify", "win", "work", "write",
};

static IRREGULAR_VERBS: phf::Map<&'static str, &'static str> = phf_map! {
    "became" => "become",
    "began" => "begin",
    "begun" => "begin",
    "brought" => "bring",
    "built" => "build",
    "chose" => "choose",
    "chosen" => "choose",
    "drove" => "drive",
    "driven" => "drive",
    "found" => "find",
    "gave" => "give",
    "given" => "give",
    "gone" => "go",
    "got" => "get",
    "gotten" => "get",
    "grew" => "grow",
    "grown" => "grow",
    "held" => "hold",
    "kept" => "keep",
    "knew" => "know",
    "known" => "know",
    "learnt" => "learn",
    "led" => "lead",
    "made" => "make",
    "met" => "meet",
    "oversaw" => "oversee",
    "overseen" => "oversee",
    "ran" => "run",
    "saw" => "see",
    "seen" => "see",
    "sold" => "sell",
    "sought" => "seek",
    "spent" => "spend",
    "spoke" => "speak",
    "spoken" => "speak",
    "taken" => "take",
    "taught" => "teach",
    "thought" => "think",
    "took" => "take",
    "understood" => "understand",
    "went" => "go",
    "won" => "win",
    "wrote" => "write",
    "written" => "write",
};

/// Category of a word token (not whitespace or punctuation) and its lemma.
pub fn tag_word(word: &str) -> (PartOfSpeech, String) {
    let lower: Cow<'_, str> = if word.chars().any(char::is_uppercase) {
        Cow::Owned(word.to_lowercase())
    } else {
        Cow::Borrowed(word)
    };
    let key = lower.as_ref();

    let pos = if ADPOSITIONS.contains(key) {
        PartOfSpeech::Adposition
    } else if DETERMINERS.contains(key) {
        PartOfSpeech::Determiner
    } else if PRONOUNS.contains(key) {
        PartOfSpeech::Pronoun
    } else if AUXILIARIES.contains(key) {
        PartOfSpeech::Auxiliary
    } else if CONJUNCTIONS.contains(key) {
        PartOfSpeech::Conjunction
    } else if key.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',')
        && key.chars().any(|c| c.is_ascii_digit())
    {
        PartOfSpeech::Numeral
    } else if let Some(lemma) = verb_lemma(key) {
        return (PartOfSpeech::Verb, lemma);
    } else {
        PartOfSpeech::Noun
    };

    (pos, word.to_string())
}

/// Base form of `word` if it is an inflection of a known verb.
/// `word` must already be lowercase.
pub fn verb_lemma(word: &str) -> Option<String> {
    if let Some(base) = IRREGULAR_VERBS.get(word) {
        return Some((*base).to_string());
    }
    if VERB_BASES.contains(word) {
        return Some(word.to_string());
    }

    if let Some(stem) = word.strip_suffix("ies").or_else(|| word.strip_suffix("ied")) {
        let candidate = format!("{stem}y");
        if VERB_BASES.contains(candidate.as_str()) {
            return Some(candidate);
        }
    }
    if let Some(stem) = word.strip_suffix("ing").or_else(|| word.strip_suffix("ed")) {
        if let Some(base) = undo_suffix(stem) {
            return Some(base);
        }
    }
    if let Some(stem) = word.strip_suffix("es") {
        if VERB_BASES.contains(stem) {
            return Some(stem.to_string());
        }
    }
    if let Some(stem) = word.strip_suffix('s') {
        if !stem.ends_with('s') && VERB_BASES.contains(stem) {
            return Some(stem.to_string());
        }
    }
    None
}

/// Tries `stem`, `stem + "e"` and the un-doubled stem (`plann` -> `plan`).
fn undo_suffix(stem: &str) -> Option<String> {
    if stem.is_empty() {
        return None;
    }
    if VERB_BASES.contains(stem) {
        return Some(stem.to_string());
    }
    let with_e = format!("{stem}e");
    if VERB_BASES.contains(with_e.as_str()) {
        return Some(with_e);
    }
    let mut chars = stem.chars().rev();
    if let (Some(last), Some(prev)) = (chars.next(), chars.next()) {
        if last == prev && stem.len() > 2 {
            let undoubled = &stem[..stem.len() - last.len_utf8()];
            if VERB_BASES.contains(undoubled) {
                return Some(undoubled.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_classes() {
        assert_eq!(tag_word("of").0, PartOfSpeech::Adposition);
        assert_eq!(tag_word("The").0, PartOfSpeech::Determiner);
        assert_eq!(tag_word("they").0, PartOfSpeech::Pronoun);
        assert_eq!(tag_word("was").0, PartOfSpeech::Auxiliary);
        assert_eq!(tag_word("and").0, PartOfSpeech::Conjunction);
        assert_eq!(tag_word("2021").0, PartOfSpeech::Numeral);
    }

    #[test]
    fn test_regular_inflections_lemmatize() {
        assert_eq!(verb_lemma("managed").as_deref(), Some("manage"));
        assert_eq!(verb_lemma("managing").as_deref(), Some("manage"));
        assert_eq!(verb_lemma("designs").as_deref(), Some("design"));
        assert_eq!(verb_lemma("supervises").as_deref(), Some("supervise"));
        assert_eq!(verb_lemma("applied").as_deref(), Some("apply"));
        assert_eq!(verb_lemma("studies").as_deref(), Some("study"));
        assert_eq!(verb_lemma("deployed").as_deref(), Some("deploy"));
    }

    #[test]
    fn test_doubled_consonant() {
        assert_eq!(verb_lemma("running").as_deref(), Some("run"));
        assert_eq!(verb_lemma("planned").as_deref(), Some("plan"));
        assert_eq!(verb_lemma("programming").as_deref(), Some("program"));
    }

    #[test]
    fn test_irregular_forms() {
        assert_eq!(verb_lemma("led").as_deref(), Some("lead"));
        assert_eq!(verb_lemma("built").as_deref(), Some("build"));
        assert_eq!(verb_lemma("wrote").as_deref(), Some("write"));
    }

    #[test]
    fn test_unknown_words_are_nouns() {
        let (pos, lemma) = tag_word("Kubernetes");
        assert_eq!(pos, PartOfSpeech::Noun);
        assert_eq!(lemma, "Kubernetes");
        assert_eq!(tag_word("engineering").0, PartOfSpeech::Noun);
        assert_eq!(tag_word("string").0, PartOfSpeech::Noun);
        assert!(verb_lemma("access").is_none());
    }

    #[test]
    fn test_verb_lemma_is_lowercase() {
        let (pos, lemma) = tag_word("Developed");
        assert_eq!(pos, PartOfSpeech::Verb);
        assert_eq!(lemma, "develop");
    }

    #[test]
    fn test_base_form_is_its_own_lemma() {
        for base in VERB_BASES.iter() {
            assert_eq!(verb_lemma(base).as_deref(), Some(*base));
        }
    }
}
