use crate::normalize::normalize_name;
use once_cell::sync::Lazy;

/// Equivalence classes of informal given-name variants. Membership is
/// bidirectional: any two names in a class are considered variations.
static NAME_VARIATIONS: Lazy<Vec<&'static [&'static str]>> = Lazy::new(|| {
    vec![
        &["michael", "mike", "mick", "mickey", "mikhail"],
        &["alexander", "alex", "aleks", "aleksander", "sasha", "alexandre"],
        &["alexa", "alexandra", "lexi"],
        &["anthony", "tony"],
        &["andrew", "andy", "drew", "andre", "andrei"],
        &["benjamin", "ben", "benny"],
        &["charles", "charlie", "chuck", "carlos"],
        &["christopher", "chris", "kris"],
        &["daniel", "dan", "danny", "danil", "danila"],
        &["david", "dave", "davey"],
        &["dominick", "dominic", "dom"],
        &["edward", "ed", "eddie", "eduardo", "edson"],
        &["francis", "frank", "frankie", "francisco"],
        &["frederick", "fred", "freddy"],
        &["gabriel", "gabe"],
        &["gregory", "greg"],
        &["henry", "hank", "enrique"],
        &["jacob", "jake"],
        &["james", "jim", "jimmy", "jamie"],
        &["jonathan", "jon", "john", "johnny"],
        &["joseph", "joe", "joey", "jose"],
        &["joshua", "josh"],
        &["kenneth", "ken", "kenny"],
        &["matthew", "matt", "mateusz", "matheus"],
        &["maurice", "mo"],
        &["nicholas", "nick", "nico", "nikolas"],
        &["patrick", "pat", "paddy"],
        &["peter", "pete", "petr", "pedro"],
        &["raymond", "ray"],
        &["richard", "rich", "rick", "ricky", "ricardo"],
        &["robert", "rob", "bob", "bobby", "roberto"],
        &["ronald", "ron", "ronnie"],
        &["samuel", "sam", "sammy"],
        &["sergei", "sergey", "serghei"],
        &["stephen", "steve", "steven", "stevie"],
        &["thomas", "tom", "tommy"],
        &["timothy", "tim", "timmy"],
        &["vincent", "vince", "vinny", "vicente"],
        &["william", "will", "bill", "billy", "willie"],
        &["zachary", "zach", "zak"],
    ]
});

const MIN_PREFIX_LEN: usize = 3;

/// Whether two given names are known variants of each other.
///
/// Checks identity, the static table, then a prefix fallback: one name being
/// a prefix of the other with the shorter at least 3 characters. The fallback
/// is deliberately permissive and existing matches depend on it; audit
/// matches via the reason strings rather than tightening it here.
pub fn are_variations(name1: &str, name2: &str) -> bool {
    let a = normalize_name(name1);
    let b = normalize_name(name2);

    if a.is_empty() || b.is_empty() {
        return false;
    }
    if a == b {
        return true;
    }

    for class in NAME_VARIATIONS.iter() {
        if class.contains(&a.as_str()) && class.contains(&b.as_str()) {
            return true;
        }
    }

    let (shorter, longer) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };
    shorter.len() >= MIN_PREFIX_LEN && longer.starts_with(shorter.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_variations_are_bidirectional() {
        assert!(are_variations("Mike", "Michael"));
        assert!(are_variations("Michael", "Mike"));
        assert!(are_variations("Alex", "Alexander"));
        assert!(are_variations("Bob", "Robert"));
    }

    #[test]
    fn identical_names_are_variations() {
        assert!(are_variations("Jon", "Jon"));
        assert!(are_variations("José", "Jose"));
    }

    #[test]
    fn unrelated_names_are_not_variations() {
        assert!(!are_variations("John", "Jane"));
        assert!(!are_variations("Conor", "Dustin"));
    }

    #[test]
    fn prefix_fallback_requires_three_chars() {
        // "Alexand" is not in the table but prefixes "Alexander"
        assert!(are_variations("Alexand", "Alexander"));
        // Two-character prefixes are too short to trust
        assert!(!are_variations("Al", "Alexander"));
    }

    #[test]
    fn empty_names_never_match() {
        assert!(!are_variations("", "Alex"));
        assert!(!are_variations("", ""));
    }
}
