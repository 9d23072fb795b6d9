//! English stopword lexicon.
//!
//! The base is the NLTK English list shipped by the `stop-words` crate
//! (`nltk` feature). On top of it sits [`EXTENDED_FUNCTION_WORDS`]: the
//! quantifiers, numerals, adverbs and light verbs that a broader English
//! stop list also treats as noise. Content nouns such as "system",
//! "research" or "work" are never stopwords.

use phf::phf_set;
use rustc_hash::FxHashSet;
use stop_words::{get, LANGUAGE};

static EXTENDED_FUNCTION_WORDS: phf::Set<&'static str> = phf_set! {
    "about", "above", "across", "afterwards", "almost", "alone", "along",
    "already", "also", "although", "always", "among", "amongst", "amount",
    "another", "anyhow", "anyone", "anything", "anyway", "anywhere", "around",
    "back", "became", "become", "becomes", "becoming", "beforehand", "behind",
    "beside", "besides", "beyond", "bottom", "ca", "call", "cannot", "could",
    "done", "due", "eight", "either", "eleven", "else", "elsewhere", "empty",
    "enough", "even", "ever", "every", "everyone", "everything", "everywhere",
    "except", "fifteen", "fifty", "first", "five", "former", "formerly",
    "forty", "four", "front", "full", "get", "give", "go", "hence",
    "hereafter", "hereby", "herein", "hereupon", "however", "hundred",
    "indeed", "keep", "last", "latter", "latterly", "least", "less", "made",
    "make", "many", "may", "meanwhile", "might", "mine", "moreover", "mostly",
    "move", "much", "must", "name", "namely", "neither", "never",
    "nevertheless", "next", "nine", "nobody", "none", "noone", "nothing",
    "nowhere", "often", "one", "onto", "others", "otherwise", "part", "per",
    "perhaps", "please", "put", "quite", "rather", "really", "regarding",
    "say", "see", "seem", "seemed", "seeming", "seems", "serious", "several",
    "show", "side", "since", "six", "sixty", "somehow", "someone",
    "something", "sometime", "sometimes", "somewhere", "still", "take", "ten",
    "thence", "thereafter", "thereby", "therefore", "therein", "thereupon",
    "third", "though", "three", "throughout", "thru", "thus", "together",
    "top", "toward", "towards", "twelve", "twenty", "two", "unless", "upon",
    "us", "used", "using", "various", "via", "well", "whatever", "whence",
    "whenever", "whereafter", "whereas", "whereby", "wherein", "whereupon",
    "wherever", "whether", "whither", "whoever", "whole", "whose", "within",
    "without", "would", "yet",
    "'d", "'ll", "'m", "'re", "'s", "'ve", "n't",
};

/// Case-insensitive stopword set.
#[derive(Debug, Clone)]
pub struct StopwordFilter {
    stopwords: FxHashSet<String>,
}

impl Default for StopwordFilter {
    fn default() -> Self {
        Self::english()
    }
}

impl StopwordFilter {
    /// NLTK English list plus the extended function words.
    pub fn english() -> Self {
        let stopwords = get(LANGUAGE::English)
            .into_iter()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .chain(EXTENDED_FUNCTION_WORDS.iter().map(|s| s.to_string()))
            .collect();
        Self { stopwords }
    }

    pub fn from_list(words: &[&str]) -> Self {
        Self {
            stopwords: words.iter().map(|w| w.to_lowercase()).collect(),
        }
    }

    /// Adds caller-supplied words (already trimmed) to the set.
    pub fn extend<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for word in words {
            let word = word.as_ref().trim();
            if !word.is_empty() {
                self.stopwords.insert(word.to_lowercase());
            }
        }
    }

    pub fn is_stopword(&self, word: &str) -> bool {
        if self.stopwords.contains(word) {
            return true;
        }
        // Skip the allocation for the common already-lowercase case.
        word.chars().any(char::is_uppercase) && self.stopwords.contains(&word.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.stopwords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stopwords.is_empty()
    }
}
