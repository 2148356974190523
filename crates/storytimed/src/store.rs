//! In-memory story and settings store.
//!
//! Holds every generated story plus the one parental settings record for the
//! lifetime of the process. The store itself is synchronous; the server wraps
//! it in `Arc<RwLock<_>>` so each mutating call is one critical section.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use storytime_common::{NewStory, ParentalSettings, SettingsUpdate, Story, StoryError};
use tokio::sync::RwLock;
use tracing::debug;

pub struct StoryStore {
    stories: BTreeMap<u64, Story>,
    next_story_id: u64,
    settings: ParentalSettings,
}

impl Default for StoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StoryStore {
    /// Empty store with default parental settings.
    pub fn new() -> Self {
        Self {
            stories: BTreeMap::new(),
            next_story_id: 1,
            settings: ParentalSettings::default(),
        }
    }

    /// Assign the next id, stamp the current time and store the story.
    pub fn create_story(&mut self, draft: NewStory) -> Story {
        self.create_story_at(draft, Utc::now())
    }

    /// Same as `create_story` with an explicit creation time.
    pub fn create_story_at(&mut self, draft: NewStory, created_at: DateTime<Utc>) -> Story {
        let id = self.next_story_id;
        self.next_story_id += 1;

        let story = draft.into_story(id, created_at);
        self.stories.insert(id, story.clone());
        debug!("[STORE] Created story {} ({})", id, story.title);
        story
    }

    /// All stories, most recent first. Equal timestamps fall back to the
    /// higher id first.
    pub fn list_stories(&self) -> Vec<Story> {
        let mut stories: Vec<Story> = self.stories.values().cloned().collect();
        stories.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        stories
    }

    /// Saved stories only, in the same order as `list_stories`.
    pub fn list_saved_stories(&self) -> Vec<Story> {
        self.list_stories()
            .into_iter()
            .filter(|s| s.is_saved)
            .collect()
    }

    pub fn get_story(&self, id: u64) -> Option<&Story> {
        self.stories.get(&id)
    }

    /// Flip `is_saved` and return the updated record.
    pub fn toggle_saved(&mut self, id: u64) -> Result<Story, StoryError> {
        let story = self.stories.get_mut(&id).ok_or(StoryError::NotFound(id))?;
        story.is_saved = !story.is_saved;
        debug!("[STORE] Story {} saved={}", id, story.is_saved);
        Ok(story.clone())
    }

    pub fn settings(&self) -> &ParentalSettings {
        &self.settings
    }

    /// Merge the given fields over the current settings.
    pub fn update_settings(&mut self, update: SettingsUpdate) -> ParentalSettings {
        self.settings.apply(update);
        self.settings.clone()
    }

    pub fn story_count(&self) -> usize {
        self.stories.len()
    }
}

/// Thread-safe shared store handle
pub type SharedStore = Arc<RwLock<StoryStore>>;

pub fn create_shared_store() -> SharedStore {
    Arc::new(RwLock::new(StoryStore::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use storytime_common::AgeGroup;

    fn draft(title: &str) -> NewStory {
        NewStory::new(title, "Once upon a time", "knight", "adventure")
    }

    #[test]
    fn test_create_assigns_increasing_ids() {
        let mut store = StoryStore::new();
        let a = store.create_story(draft("A"));
        let b = store.create_story(draft("B"));
        let c = store.create_story(draft("C"));
        assert_eq!(a.id, 1);
        assert!(a.id < b.id && b.id < c.id);
        assert!(!a.is_saved);
    }

    #[test]
    fn test_created_story_is_listed() {
        let mut store = StoryStore::new();
        let story = store.create_story(draft("Listed"));
        let listed = store.list_stories();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0], story);
        assert_eq!(store.get_story(story.id), Some(&story));
    }

    #[test]
    fn test_list_newest_first() {
        let mut store = StoryStore::new();
        let base = Utc::now();
        store.create_story_at(draft("middle"), base);
        store.create_story_at(draft("newest"), base + Duration::seconds(10));
        store.create_story_at(draft("oldest"), base - Duration::seconds(10));

        let titles: Vec<String> = store.list_stories().into_iter().map(|s| s.title).collect();
        assert_eq!(titles, vec!["newest", "middle", "oldest"]);
    }

    #[test]
    fn test_equal_timestamps_higher_id_first() {
        let mut store = StoryStore::new();
        let now = Utc::now();
        store.create_story_at(draft("first"), now);
        store.create_story_at(draft("second"), now);

        let ids: Vec<u64> = store.list_stories().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn test_toggle_twice_restores() {
        let mut store = StoryStore::new();
        let story = store.create_story(draft("Toggle"));

        let once = store.toggle_saved(story.id).unwrap();
        assert!(once.is_saved);
        assert_eq!(store.list_saved_stories().len(), 1);

        let twice = store.toggle_saved(story.id).unwrap();
        assert!(!twice.is_saved);
        assert!(store.list_saved_stories().is_empty());
        // Nothing else changed
        assert_eq!(twice.created_at, story.created_at);
        assert_eq!(twice.title, story.title);
    }

    #[test]
    fn test_toggle_missing_is_not_found() {
        let mut store = StoryStore::new();
        assert_eq!(store.toggle_saved(99), Err(StoryError::NotFound(99)));
    }

    #[test]
    fn test_settings_seeded() {
        let store = StoryStore::new();
        assert_eq!(store.settings(), &ParentalSettings::default());
    }

    #[test]
    fn test_update_settings_merges() {
        let mut store = StoryStore::new();
        store.update_settings(SettingsUpdate {
            age_group: Some(AgeGroup::Preschool),
            ..Default::default()
        });
        let updated = store.update_settings(SettingsUpdate {
            daily_time_limit: Some(30),
            ..Default::default()
        });

        assert_eq!(updated.daily_time_limit, 30);
        assert_eq!(updated.age_group, AgeGroup::Preschool);
        assert_eq!(updated.stories_per_day, 5);
        assert_eq!(store.settings(), &updated);
    }

    #[tokio::test]
    async fn test_concurrent_creates_unique_ids() {
        let store = create_shared_store();
        let mut handles = Vec::new();
        for i in 0..32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.write().await.create_story(draft(&format!("s{}", i))).id
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 32);
        assert_eq!(store.read().await.story_count(), 32);
    }
}
