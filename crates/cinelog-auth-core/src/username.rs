//! Random username generation
//!
//! Candidates are `<Adjective><Animal><number>` with the number below
//! 999 999. Every combination fits within [`Username::MAX_LEN`].

use cinelog_types::Username;
use rand::seq::SliceRandom;
use rand::Rng;

const ADJECTIVES: &[&str] = &[
    "Agile", "Alert", "Bold", "Bouncy", "Brave", "Bright", "Brilliant", "Calm", "Charming",
    "Cheerful", "Chill", "Clever", "Cool", "Creative", "Cunning", "Curious", "Daring",
    "Dazzling", "Eager", "Energetic", "Fancy", "Fast", "Fearless", "Fierce", "Friendly",
    "Funny", "Gallant", "Gentle", "Glorious", "Graceful", "Happy", "Heroic", "Honest", "Jolly",
    "Jovial", "Kind", "Lively", "Lucky", "Luminous", "Magical", "Majestic", "Mighty", "Nimble",
    "Noble", "Peaceful", "Playful", "Proud", "Quick", "Radiant", "Sassy", "Serene", "Sharp",
    "Silent", "Sly", "Smart", "Snappy", "Strong", "Stylish", "Sunny", "Swift", "Upbeat",
    "Valiant", "Vibrant", "Vivid", "Whimsical", "Wise", "Witty", "Zealous", "Zesty",
];

const ANIMALS: &[&str] = &[
    "Albatross", "Armadillo", "Badger", "Barracuda", "Bear", "Beaver", "Bison", "Buffalo",
    "Camel", "Caribou", "Cheetah", "Cobra", "Cougar", "Dolphin", "Dragon", "Dugong", "Eagle",
    "Eland", "Emu", "Falcon", "Fennec", "Ferret", "Flamingo", "Fox", "Gazelle", "Giraffe",
    "Gorilla", "Hawk", "Hedgehog", "Heron", "Ibex", "Iguana", "Impala", "Jackal", "Jaguar",
    "Kiwi", "Koala", "Kudu", "Lemur", "Leopard", "Lion", "Lynx", "Manatee", "Marmot", "Moose",
    "Narwhal", "Newt", "Ocelot", "Octopus", "Otter", "Panda", "Panther", "Penguin", "Platypus",
    "Quail", "Quokka", "Rabbit", "Raccoon", "Raven", "Reindeer", "Salmon", "Shark", "Swan",
    "Tapir", "Tiger", "Toucan", "Vicuna", "Viper", "Walrus", "Wolf", "Wombat", "Yak", "Zebra",
];

/// Exclusive upper bound of the numeric suffix
const SUFFIX_BOUND: u32 = 999_999;

/// Generates candidate usernames from fixed word lists
#[derive(Debug, Clone, Copy, Default)]
pub struct UsernameGenerator;

impl UsernameGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Draw a candidate using the thread-local RNG
    pub fn generate(&self) -> Username {
        self.generate_with(&mut rand::thread_rng())
    }

    /// Draw a candidate from the given RNG
    pub fn generate_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Username {
        let adjective = ADJECTIVES.choose(rng).copied().unwrap_or("Lucky");
        let animal = ANIMALS.choose(rng).copied().unwrap_or("Lemur");
        let number = rng.gen_range(0..SUFFIX_BOUND);

        // Word lists are ASCII and short enough that this always validates
        Username::parse(format!("{adjective}{animal}{number}"))
            .expect("generated username within length bounds")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn has_generated_shape(s: &str) -> bool {
        let letters = s.chars().take_while(char::is_ascii_alphabetic).count();
        let digits = &s[letters..];
        letters >= 2
            && (1..=6).contains(&digits.len())
            && digits.chars().all(|c| c.is_ascii_digit())
    }

    #[test]
    fn test_longest_combination_fits() {
        let adjective = ADJECTIVES.iter().map(|w| w.len()).max().unwrap();
        let animal = ANIMALS.iter().map(|w| w.len()).max().unwrap();
        assert!(adjective + animal + 6 <= Username::MAX_LEN);

        let adjective = ADJECTIVES.iter().map(|w| w.len()).min().unwrap();
        let animal = ANIMALS.iter().map(|w| w.len()).min().unwrap();
        assert!(adjective + animal + 1 >= Username::MIN_LEN);
    }

    #[test]
    fn test_word_lists_are_ascii_letters() {
        for word in ADJECTIVES.iter().chain(ANIMALS) {
            assert!(word.chars().all(|c| c.is_ascii_alphabetic()), "{word}");
        }
    }

    #[test]
    fn test_thread_rng_candidate_shape() {
        let name = UsernameGenerator::new().generate();
        assert!(has_generated_shape(name.as_str()), "{name}");
    }

    proptest! {
        #[test]
        fn prop_generated_usernames_match_pattern(seed in any::<u64>()) {
            let mut rng = StdRng::seed_from_u64(seed);
            let name = UsernameGenerator::new().generate_with(&mut rng);
            prop_assert!(has_generated_shape(name.as_str()), "{}", name);
            prop_assert!(name.as_str().len() <= Username::MAX_LEN);
        }
    }
}
