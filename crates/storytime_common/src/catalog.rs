//! Character and story-type catalog.
//!
//! Two immutable tables shared by prompt composition, illustration prompts
//! and the catalog endpoints that drive the UI grids.

use serde::Serialize;

/// Phrase used when the character id is not in the table.
pub const DEFAULT_CHARACTER_PHRASE: &str = "a brave hero";

/// Phrase used when the story type id is not in the table.
pub const DEFAULT_STORY_TYPE_PHRASE: &str = "an exciting adventure";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterEntry {
    pub id: &'static str,
    pub name: &'static str,
    pub emoji: &'static str,
    pub description: &'static str,
    /// Phrase inserted into the generation and illustration prompts.
    #[serde(skip)]
    pub phrase: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryTypeEntry {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    #[serde(skip)]
    pub phrase: &'static str,
}

pub static CHARACTERS: [CharacterEntry; 6] = [
    CharacterEntry {
        id: "princess",
        name: "Princess",
        emoji: "👑",
        description: "A brave and kind princess with magical powers",
        phrase: "a brave and kind princess with a beautiful dress and crown",
    },
    CharacterEntry {
        id: "knight",
        name: "Knight",
        emoji: "⚔️",
        description: "A courageous knight who protects the realm",
        phrase: "a courageous knight in shining armor who helps others",
    },
    CharacterEntry {
        id: "dragon",
        name: "Dragon",
        emoji: "🐉",
        description: "A friendly dragon who loves making friends",
        phrase: "a friendly, colorful dragon who loves making friends",
    },
    CharacterEntry {
        id: "wizard",
        name: "Wizard",
        emoji: "🧙‍♂️",
        description: "A wise wizard with amazing magical abilities",
        phrase: "a wise wizard with a long beard and magical powers",
    },
    CharacterEntry {
        id: "fairy",
        name: "Fairy",
        emoji: "🧚‍♀️",
        description: "A magical fairy who helps others with her powers",
        phrase: "a tiny magical fairy with sparkly wings and a wand",
    },
    CharacterEntry {
        id: "pirate",
        name: "Pirate",
        emoji: "🏴‍☠️",
        description: "An adventurous pirate searching for treasure",
        phrase: "a fun-loving pirate captain searching for friendship and adventure",
    },
];

pub static STORY_TYPES: [StoryTypeEntry; 6] = [
    StoryTypeEntry {
        id: "fairy-tale",
        name: "Fairy Tale",
        description: "Magical kingdoms and happy endings!",
        phrase: "a magical fairy tale with castles, magic, and a happy ending",
    },
    StoryTypeEntry {
        id: "adventure",
        name: "Adventure",
        description: "Exciting journeys and brave quests!",
        phrase: "an exciting adventure with exploration and discovery",
    },
    StoryTypeEntry {
        id: "mystery",
        name: "Mystery",
        description: "Solve puzzles and find clues!",
        phrase: "a fun mystery to solve with clues and surprises",
    },
    StoryTypeEntry {
        id: "friendship",
        name: "Friendship",
        description: "Stories about making friends!",
        phrase: "a heartwarming story about making friends and helping others",
    },
    StoryTypeEntry {
        id: "space",
        name: "Space",
        description: "Explore planets and meet aliens!",
        phrase: "a wonderful space adventure visiting planets and meeting friendly aliens",
    },
    StoryTypeEntry {
        id: "animals",
        name: "Animals",
        description: "Fun stories with animal friends!",
        phrase: "a delightful story featuring talking animals and nature",
    },
];

pub fn find_character(id: &str) -> Option<&'static CharacterEntry> {
    CHARACTERS.iter().find(|c| c.id == id)
}

pub fn find_story_type(id: &str) -> Option<&'static StoryTypeEntry> {
    STORY_TYPES.iter().find(|t| t.id == id)
}

/// Prompt phrase for a character, or the generic hero.
pub fn character_phrase(id: &str) -> &'static str {
    find_character(id)
        .map(|c| c.phrase)
        .unwrap_or(DEFAULT_CHARACTER_PHRASE)
}

/// Prompt phrase for a story type, or the generic adventure.
pub fn story_type_phrase(id: &str) -> &'static str {
    find_story_type(id)
        .map(|t| t.phrase)
        .unwrap_or(DEFAULT_STORY_TYPE_PHRASE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_phrases() {
        assert_eq!(
            character_phrase("dragon"),
            "a friendly, colorful dragon who loves making friends"
        );
        assert_eq!(
            story_type_phrase("space"),
            "a wonderful space adventure visiting planets and meeting friendly aliens"
        );
    }

    #[test]
    fn test_unknown_falls_back() {
        assert_eq!(character_phrase("robot"), DEFAULT_CHARACTER_PHRASE);
        assert_eq!(story_type_phrase("western"), DEFAULT_STORY_TYPE_PHRASE);
        // Lookups are exact
        assert_eq!(character_phrase("Princess"), DEFAULT_CHARACTER_PHRASE);
    }

    #[test]
    fn test_ids_unique() {
        for (i, a) in CHARACTERS.iter().enumerate() {
            assert!(CHARACTERS[i + 1..].iter().all(|b| b.id != a.id));
        }
        for (i, a) in STORY_TYPES.iter().enumerate() {
            assert!(STORY_TYPES[i + 1..].iter().all(|b| b.id != a.id));
        }
    }

    #[test]
    fn test_character_emojis() {
        assert_eq!(find_character("wizard").map(|c| c.emoji), Some("🧙‍♂️"));
        assert_eq!(find_character("fairy").map(|c| c.emoji), Some("🧚‍♀️"));
        assert_eq!(find_character("pirate").map(|c| c.emoji), Some("🏴‍☠️"));
    }

    #[test]
    fn test_catalog_json_hides_phrase() {
        let json = serde_json::to_value(CHARACTERS[0]).unwrap();
        assert_eq!(json["id"], "princess");
        assert!(json.get("phrase").is_none());
    }
}
