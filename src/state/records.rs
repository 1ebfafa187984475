//! Session-owned master list of matches and the filtered views derived from it.

use time::Date;

use crate::dao::models::{Category, MatchRecord};

/// Master collection of match records for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordStore {
    records: Vec<MatchRecord>,
}

impl RecordStore {
    /// Master list made of `records`.
    pub fn new(records: Vec<MatchRecord>) -> Self {
        Self { records }
    }

    /// Block of blank records with ids `1..=count`, written when the list sheet is empty.
    pub fn seeded(count: u32, category: Category, date: Date) -> Self {
        Self {
            records: (1..=count)
                .map(|id| MatchRecord::blank(id, category, date))
                .collect(),
        }
    }

    /// Records in sheet order.
    pub fn records(&self) -> &[MatchRecord] {
        &self.records
    }

    /// Record with identity `id`.
    pub fn get(&self, id: u32) -> Option<&MatchRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    /// Look a record up by identity. Never index the master list by view position.
    pub fn get_mut(&mut self, id: u32) -> Option<&mut MatchRecord> {
        self.records.iter_mut().find(|record| record.id == id)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the list holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Keyword and category criteria of the list screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewFilter {
    /// Case-insensitive substring looked up in every field.
    pub search: Option<String>,
    /// `None` means every category.
    pub category: Option<Category>,
}

impl ViewFilter {
    /// Filter with a trimmed, lowercased keyword; blank means none.
    pub fn new(search: Option<String>, category: Option<Category>) -> Self {
        let search = search
            .map(|text| text.trim().to_lowercase())
            .filter(|text| !text.is_empty());
        Self { search, category }
    }

    /// Whether `record` passes both criteria.
    pub fn matches(&self, record: &MatchRecord) -> bool {
        if self
            .category
            .is_some_and(|category| category != record.category)
        {
            return false;
        }

        match &self.search {
            None => true,
            Some(needle) => record
                .rendered_fields()
                .iter()
                .any(|field| field.to_lowercase().contains(needle.as_str())),
        }
    }

    /// Derive the view of `store`, keeping master order.
    pub fn apply(&self, store: &RecordStore, generation: u64) -> View {
        View {
            generation,
            ids: store
                .records()
                .iter()
                .filter(|record| self.matches(record))
                .map(|record| record.id)
                .collect(),
        }
    }
}

/// Filtered subset presented to the user, as a position → record id mapping.
///
/// Kept with the session until the next view is computed so that edit batches,
/// which address rows by position, resolve to the record the user actually saw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    generation: u64,
    ids: Vec<u32>,
}

impl View {
    /// Counter distinguishing successive views of the same session.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Ids of the view, in view order.
    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    /// Record id shown at `position`.
    pub fn resolve(&self, position: usize) -> Option<u32> {
        self.ids.get(position).copied()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the view shows no rows.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Records of the view, in view order.
    pub fn rows<'a>(&'a self, store: &'a RecordStore) -> impl Iterator<Item = &'a MatchRecord> + 'a {
        self.ids.iter().filter_map(|id| store.get(*id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn store() -> RecordStore {
        let categories = [
            Category::U8,
            Category::U10,
            Category::U12,
            Category::U10,
            Category::U9,
        ];
        let records = categories
            .into_iter()
            .zip(1..)
            .map(|(category, id)| {
                let mut record = MatchRecord::blank(id, category, date!(2024 - 04 - 01));
                record.opponent = format!("Team {id}");
                record
            })
            .collect();
        RecordStore::new(records)
    }

    #[test]
    fn seeded_store_has_sequential_ids() {
        let store = RecordStore::seeded(100, Category::U12, date!(2024 - 01 - 01));
        assert_eq!(store.len(), 100);
        assert_eq!(store.records().first().map(|r| r.id), Some(1));
        assert_eq!(store.records().last().map(|r| r.id), Some(100));
        assert!(store.records().iter().all(|r| r.opponent.is_empty()));
    }

    #[test]
    fn empty_filter_keeps_everything_in_order() {
        let view = ViewFilter::default().apply(&store(), 1);
        assert_eq!(view.ids(), [1, 2, 3, 4, 5]);
    }

    #[test]
    fn category_filter_keeps_master_order() {
        let view = ViewFilter::new(None, Some(Category::U10)).apply(&store(), 1);
        assert_eq!(view.ids(), [2, 4]);
        assert_eq!(view.resolve(0), Some(2));
        assert_eq!(view.resolve(1), Some(4));
        assert_eq!(view.resolve(2), None);
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let mut store = store();
        store.get_mut(3).unwrap().venue = "Kawasaki Ground".into();
        let view = ViewFilter::new(Some("  KAWASAKI ".into()), None).apply(&store, 1);
        assert_eq!(view.ids(), [3]);

        let by_date = ViewFilter::new(Some("2024-04".into()), None).apply(&store, 2);
        assert_eq!(by_date.len(), 5);

        let by_category = ViewFilter::new(Some("u9".into()), None).apply(&store, 3);
        assert_eq!(by_category.ids(), [5]);
    }

    #[test]
    fn search_and_category_combine() {
        let view =
            ViewFilter::new(Some("team 4".into()), Some(Category::U10)).apply(&store(), 1);
        assert_eq!(view.ids(), [4]);
        let none = ViewFilter::new(Some("team 4".into()), Some(Category::U8)).apply(&store(), 1);
        assert!(none.is_empty());
    }

    #[test]
    fn blank_search_is_no_search() {
        assert_eq!(ViewFilter::new(Some("   ".into()), None).search, None);
    }

    #[test]
    fn view_rows_follow_view_order() {
        let store = store();
        let view = ViewFilter::new(None, Some(Category::U10)).apply(&store, 1);
        let opponents = view
            .rows(&store)
            .map(|record| record.opponent.as_str())
            .collect::<Vec<_>>();
        assert_eq!(opponents, ["Team 2", "Team 4"]);
    }
}
