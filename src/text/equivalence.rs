use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

// First member of each group is its representative. Earlier groups win when a
// form appears more than once.
const EQUIVALENCE_GROUPS: &[&[&str]] = &[
    &["vs", "versus", "verses"],
    &["mr", "mister"],
    &["mrs", "missus", "misses"],
    &["ms", "miss", "miz"],
    &["dr", "doctor"],
    &["st", "saint", "street"],
    &["ave", "avenue"],
    &["blvd", "boulevard"],
    &["dept", "department"],
    &["govt", "government"],
    &["jr", "junior"],
    &["sr", "senior"],
    &["sgt", "sergeant"],
    &["capt", "captain"],
    &["lt", "lieutenant"],
    &["gen", "general"],
    &["prof", "professor"],
    &["rev", "reverend"],
    &["can't", "cannot", "can not"],
    &["won't", "will not"],
    &["don't", "do not"],
    &["doesn't", "does not"],
    &["didn't", "did not"],
    &["isn't", "is not"],
    &["aren't", "are not"],
    &["wasn't", "was not"],
    &["weren't", "were not"],
    &["hasn't", "has not"],
    &["haven't", "have not"],
    &["hadn't", "had not"],
    &["wouldn't", "would not"],
    &["couldn't", "could not"],
    &["shouldn't", "should not"],
    &["i'm", "i am"],
    &["i'll", "i will"],
    &["i've", "i have"],
    &["i'd", "i would", "i had"],
    &["we'd", "we would", "we had"],
    &["we're", "we are"],
    &["we've", "we have"],
    &["we'll", "we will"],
    &["they're", "they are"],
    &["they've", "they have"],
    &["they'll", "they will"],
    &["you're", "you are"],
    &["you've", "you have"],
    &["you'll", "you will"],
    &["he's", "he is", "he has"],
    &["she's", "she is", "she has"],
    &["it's", "it is", "it has"],
    &["that's", "that is", "that has"],
    &["there's", "there is", "there has"],
    &["here's", "here is", "here has"],
    &["what's", "what is", "what has"],
    &["who's", "who is", "who has"],
    &["let's", "let us"],
    &["1", "one"],
    &["2", "two"],
    &["3", "three"],
    &["4", "four"],
    &["5", "five"],
    &["6", "six"],
    &["7", "seven"],
    &["8", "eight"],
    &["9", "nine"],
    &["10", "ten"],
    &["11", "eleven"],
    &["12", "twelve"],
    &["13", "thirteen"],
    &["14", "fourteen"],
    &["15", "fifteen"],
    &["16", "sixteen"],
    &["17", "seventeen"],
    &["18", "eighteen"],
    &["19", "nineteen"],
    &["20", "twenty"],
    &["&", "and"],
    &["%", "percent"],
    &["ok", "okay"],
    &["gonna", "going to"],
    &["wanna", "want to"],
    &["gotta", "got to"],
    &["kinda", "kind of"],
    &["sorta", "sort of"],
];

const HOMOPHONE_GROUPS: &[&[&str]] = &[
    &["their", "there", "they're"],
    &["your", "you're"],
    &["its", "it's"],
    &["to", "too", "two"],
    &["by", "bye", "buy"],
    &["for", "four", "fore"],
    &["no", "know"],
    &["new", "knew", "gnu"],
    &["right", "write", "rite"],
    &["see", "sea"],
    &["be", "bee"],
    &["hear", "here"],
    &["our", "hour"],
    &["ate", "eight"],
    &["one", "won"],
    &["sun", "son"],
    &["would", "wood"],
    &["which", "witch"],
    &["wear", "where", "ware"],
    &["weather", "whether"],
    &["piece", "peace"],
    &["break", "brake"],
    &["wait", "weight"],
    &["great", "grate"],
    &["whole", "hole"],
    &["pair", "pear", "pare"],
    &["meet", "meat"],
    &["read", "red"],
    &["led", "lead"],
    &["bored", "board"],
    &["flower", "flour"],
    &["role", "roll"],
    &["through", "threw"],
    &["principal", "principle"],
    &["stationary", "stationery"],
    &["council", "counsel"],
];

const ORDINAL_GROUPS: &[&[&str]] = &[
    &["1st", "first"],
    &["2nd", "second"],
    &["3rd", "third"],
    &["4th", "fourth"],
    &["5th", "fifth"],
    &["6th", "sixth"],
    &["7th", "seventh"],
    &["8th", "eighth"],
    &["9th", "ninth"],
    &["10th", "tenth"],
    &["11th", "eleventh"],
    &["12th", "twelfth"],
    &["13th", "thirteenth"],
    &["14th", "fourteenth"],
    &["15th", "fifteenth"],
    &["16th", "sixteenth"],
    &["17th", "seventeenth"],
    &["18th", "eighteenth"],
    &["19th", "nineteenth"],
    &["20th", "twentieth"],
];

const TENS: [&str; 8] = [
    "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
];
const UNITS: [&str; 9] = [
    "one", "two", "three", "four", "five", "six", "seven", "eight", "nine",
];

// Resolving a representative can land on a form that has its own
// representative ("won" -> "one" -> "1"); stop after this many hops.
const MAX_RESOLVE_HOPS: usize = 8;

struct EquivalenceTable {
    canonical: HashMap<String, String>,
    members: HashMap<String, BTreeSet<String>>,
}

fn number_groups() -> Vec<Vec<String>> {
    let mut groups = Vec::new();
    for (t, tens) in TENS.iter().enumerate() {
        let base = (t as u32 + 2) * 10;
        if base > 20 {
            groups.push(vec![base.to_string(), tens.to_string()]);
        }
        for (u, unit) in UNITS.iter().enumerate() {
            let value = base + u as u32 + 1;
            groups.push(vec![
                value.to_string(),
                format!("{tens}-{unit}"),
                format!("{tens}{unit}"),
            ]);
        }
    }
    groups.push(vec![
        "100".to_string(),
        "hundred".to_string(),
        "one hundred".to_string(),
    ]);
    groups
}

impl EquivalenceTable {
    fn build() -> Self {
        let mut groups: Vec<Vec<String>> = Vec::new();
        for group in EQUIVALENCE_GROUPS.iter().chain(HOMOPHONE_GROUPS.iter()) {
            groups.push(group.iter().map(|w| w.to_string()).collect());
        }
        groups.extend(number_groups());
        for group in ORDINAL_GROUPS {
            groups.push(group.iter().map(|w| w.to_string()).collect());
        }

        let mut direct: HashMap<String, String> = HashMap::new();
        for group in &groups {
            let Some(head) = group.first() else { continue };
            for word in group {
                direct.entry(word.clone()).or_insert_with(|| head.clone());
            }
        }

        let mut canonical = HashMap::with_capacity(direct.len());
        for word in direct.keys() {
            let mut current = word.clone();
            for _ in 0..MAX_RESOLVE_HOPS {
                match direct.get(&current) {
                    Some(next) if *next != current => current = next.clone(),
                    _ => break,
                }
            }
            canonical.insert(word.clone(), current);
        }

        let mut members: HashMap<String, BTreeSet<String>> = HashMap::new();
        for (word, rep) in &canonical {
            members.entry(rep.clone()).or_default().insert(word.clone());
        }

        Self { canonical, members }
    }
}

fn table() -> &'static EquivalenceTable {
    static TABLE: OnceLock<EquivalenceTable> = OnceLock::new();
    TABLE.get_or_init(EquivalenceTable::build)
}

/// Representative form of the word's equivalence class; unknown words map to
/// themselves.
pub fn canonical_form(word: &str) -> String {
    table()
        .canonical
        .get(word)
        .cloned()
        .unwrap_or_else(|| word.to_string())
}

/// Every surface form sharing the word's representative, the word included.
pub fn all_equivalents(word: &str) -> BTreeSet<String> {
    let rep = canonical_form(word);
    let mut forms = table().members.get(&rep).cloned().unwrap_or_default();
    forms.insert(word.to_string());
    forms
}

/// Key used for alignment matching: representative form without apostrophes.
pub fn comparison_key(word: &str) -> String {
    canonical_form(word).replace('\'', "")
}

pub(crate) fn same_word(a: &str, b: &str) -> bool {
    comparison_key(a) == comparison_key(b)
}
