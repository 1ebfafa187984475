use crate::state::{
    navigation::NavigationStateMachine,
    records::{RecordStore, View, ViewFilter},
};

/// Per-login context threaded through list, view and reconciliation calls.
#[derive(Debug, Default)]
pub struct Session {
    /// Master list, loaded lazily on the first list request.
    pub records: Option<RecordStore>,
    /// Last view handed to the client; edit batches resolve rows through it.
    pub view: Option<View>,
    /// Screen state of this session.
    pub navigation: NavigationStateMachine,
    generation: u64,
}

impl Session {
    /// Session with nothing loaded, on the list screen.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute a fresh view over the loaded records and retain it.
    ///
    /// Returns `None` while the records have not been loaded.
    pub fn refresh_view(&mut self, filter: &ViewFilter) -> Option<&View> {
        let records = self.records.as_ref()?;
        self.generation += 1;
        self.view = Some(filter.apply(records, self.generation));
        self.view.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::Category;
    use time::macros::date;

    #[test]
    fn views_get_increasing_generations() {
        let mut session = Session::new();
        assert!(session.refresh_view(&ViewFilter::default()).is_none());

        session.records = Some(RecordStore::seeded(3, Category::U8, date!(2024 - 01 - 01)));
        let first = session
            .refresh_view(&ViewFilter::default())
            .map(View::generation);
        let second = session
            .refresh_view(&ViewFilter::default())
            .map(View::generation);
        assert_eq!(first, Some(1));
        assert_eq!(second, Some(2));
        assert_eq!(session.view.as_ref().map(View::len), Some(3));
    }
}
