//! The fixed list of animated characters Toonspot can recognise.
//!
//! Order matters: when two labels score the same, the earlier one wins.
//! A few characters appear twice; both entries are kept so the reported
//! confidence is always read from the first occurrence.

/// Character labels, in scoring order.
pub const ANIMATED_CHARACTERS: &[&str] = &[
    "Mickey Mouse 🐭",
    "Donald Duck 🦆",
    "SpongeBob SquarePants 🍍",
    "Bugs Bunny 🥕",
    "Homer Simpson 🍩",
    "Bart Simpson 🎸",
    "Scooby-Doo 🐶",
    "Shrek 🐸",
    "Sonic the Hedgehog 🦔",
    "Tom and Jerry 🐱🐭",
    "Pikachu ⚡",
    "Optimus Prime 🚗",
    "Woody (Toy Story) 🤠",
    "Buzz Lightyear 🚀",
    "Daffy Duck 🦆",
    "Fred Flintstone 🦕",
    "George Jetson 👨‍🚀",
    "Winnie the Pooh 🍯",
    "Tigger 🐅",
    "Elsa (Frozen) ❄️",
    "Anna (Frozen) 👸",
    "Mufasa (The Lion King) 🦁",
    "Buzz Lightyear 🚀",
    "Lightning McQueen 🚗",
    "Bambi 🦌",
    "Dumbo 🐘",
    "Stitch (Lilo & Stitch) 👽",
    "Timon and Pumbaa 🦁🐗",
    "Peter Pan 🧚",
    "Ariel (The Little Mermaid) 🧜‍♀️",
    "Cinderella 👠",
    "Rapunzel (Tangled) 🌸",
    "Belle (Beauty and the Beast) 📚",
    "Olaf (Frozen) ⛄",
    "Scar (The Lion King) 🦁",
    "Jack Sparrow (Pirates of the Caribbean) 🏴‍☠️",
    "Meg Griffin (Family Guy) 👩",
    "Stewie Griffin (Family Guy) 👶",
    "South Park Boys (Cartman, Stan, Kyle, Kenny) 🎒",
    "Astro Boy 👦",
    "Goku (Dragon Ball) 🐉",
    "Naruto Uzumaki 🥷",
    "Sailor Moon 🌙",
    "Ash Ketchum ⚡",
    "Velma Dinkley (Scooby-Doo) 🔍",
    "Shaggy Rogers (Scooby-Doo) 🍕",
    "Kim Possible 🦸‍♀️",
    "Ron Stoppable 🍔",
    "Zuko (Avatar: The Last Airbender) 🔥",
    "Aang (Avatar: The Last Airbender) 🌪️",
    "Korra (The Legend of Korra) 🌊",
    "Sailor Mars 🔥",
    "Felix the Cat 🐱",
    "Courage the Cowardly Dog 🐶",
    "Popeye the Sailor Man 🥬",
    "Babar the Elephant 🐘",
    "Hello Kitty 🎀",
    "Puss in Boots 🥷",
    "Snoopy 🐶",
    "Charlie Brown ☁️",
    "Lola Bunny 🏀",
    "Bugs Bunny 🎺",
    "Foghorn Leghorn 🐔",
    "Porky Pig 🐖",
    "Daria Morgendorffer 📖",
    "Beavis 🌪️",
    "Butthead 🎸",
    "Lilo (Lilo & Stitch) 🌺",
    "Dr. Eggman (Sonic the Hedgehog) 🧑‍🔬",
    "Yzma (The Emperor's New Groove) 🌌",
    "Kronk (The Emperor's New Groove) 🍳",
    "WALL-E 🤖",
    "EVE 🤖",
    "Boo (Monsters, Inc.) 👶",
    "Mike Wazowski 👁️",
    "Sulley (Monsters, Inc.) 🐻",
    "Lightning McQueen 🚗",
    "Mater (Cars) 🚜",
    "Carl Fredricksen (Up) 🎈",
    "Russell (Up) 🦸‍♂️",
    "Rex (Toy Story) 🦖",
    "Jessie (Toy Story) 🤠",
    "Dory (Finding Nemo) 🐠",
    "Marlin (Finding Nemo) 🐟",
    "Gus Gus (Cinderella) 🐭",
    "Gollum (The Lord of the Rings: The Animated Series) 🧙‍♂️",
    "Jimmy Neutron 👨‍🔬",
    "Dexter (Dexter's Laboratory) 🥼",
    "Ed, Edd n Eddy 🍬",
    "Timmy Turner (The Fairly OddParents) 👦",
    "Cosmo and Wanda 👽🧚‍♀️",
    "Mabel Pines (Gravity Falls) 🎀",
    "Dipper Pines (Gravity Falls) 📖",
    "Steven Universe 🌌",
    "Garnet (Steven Universe) 💎",
    "Finn the Human (Adventure Time) 🐶",
    "Jake the Dog (Adventure Time) 🐕",
    "Marceline the Vampire Queen 🎸",
    "Danny Phantom 👻",
    "Mavis (Hotel Transylvania) 🧛‍♀️",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_count() {
        assert_eq!(ANIMATED_CHARACTERS.len(), 100);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let buzz = ANIMATED_CHARACTERS
            .iter()
            .filter(|l| **l == "Buzz Lightyear 🚀")
            .count();
        assert_eq!(buzz, 2);

        let mcqueen = ANIMATED_CHARACTERS
            .iter()
            .filter(|l| **l == "Lightning McQueen 🚗")
            .count();
        assert_eq!(mcqueen, 2);
    }

    #[test]
    fn test_labels_are_non_empty() {
        assert!(ANIMATED_CHARACTERS.iter().all(|l| !l.trim().is_empty()));
        assert_eq!(ANIMATED_CHARACTERS[0], "Mickey Mouse 🐭");
    }
}
