//! Page-level owner of one fetched resource collection.
//!
//! Every successful mutation re-fetches the whole collection; there is no
//! optimistic patching except for soft deletes, which flip `is_active` in
//! place so the record moves to the inactive view.

use std::cmp::Ordering;
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::notice::Notice;
use crate::resources::{Record, Removal, ResourceApi};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub column: String,
    pub direction: SortDirection,
}

/// Which side of a soft delete to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivityFilter {
    #[default]
    Active,
    Inactive,
    All,
}

impl ActivityFilter {
    fn admits(self, active: bool) -> bool {
        match self {
            ActivityFilter::Active => active,
            ActivityFilter::Inactive => !active,
            ActivityFilter::All => true,
        }
    }
}

/// A removal waiting for the user's confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRemoval {
    pub id: String,
    pub prompt: String,
    pub removal: Removal,
}

/// What the page should render for the list region.
#[derive(Debug, PartialEq)]
pub enum ListView<'a, R> {
    Loading,
    Failed(&'a str),
    Ready(Vec<&'a R>),
}

pub struct ListController<A: ResourceApi> {
    api: A,
    records: Vec<A::Record>,
    loaded: bool,
    error: Option<String>,
    search: String,
    sort: Option<SortSpec>,
    activity: ActivityFilter,
    pending_removal: Option<PendingRemoval>,
    notice: Option<Notice>,
}

impl<A: ResourceApi> ListController<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            records: Vec::new(),
            loaded: false,
            error: None,
            search: String::new(),
            sort: None,
            activity: ActivityFilter::default(),
            pending_removal: None,
            notice: None,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Fetch the full collection and replace local state.
    pub async fn load(&mut self) -> Result<(), ApiError> {
        debug!(kind = A::Record::KIND, "loading collection");
        match self.api.list().await {
            Ok(records) => {
                debug!(kind = A::Record::KIND, count = records.len(), "collection loaded");
                self.records = records;
                self.loaded = true;
                self.error = None;
                Ok(())
            }
            Err(err) => {
                warn!(kind = A::Record::KIND, error = %err, "collection failed to load");
                self.error = Some(err.user_message());
                Err(err)
            }
        }
    }

    pub async fn create(
        &mut self,
        input: &<A as ResourceApi>::Input,
    ) -> Result<Option<A::Record>, ApiError> {
        let created = self.api.create(input).await?;
        info!(
            kind = A::Record::KIND,
            id = created.as_ref().map(|r| r.id()).unwrap_or(""),
            "record created"
        );
        self.notice = Some(Notice::success(format!("{} created", capitalized(A::Record::KIND))));
        self.reload_after_mutation().await;
        Ok(created)
    }

    pub async fn update(
        &mut self,
        id: &str,
        input: &<A as ResourceApi>::Input,
    ) -> Result<Option<A::Record>, ApiError> {
        let updated = self.api.update(id, input).await?;
        info!(kind = A::Record::KIND, id, "record updated");
        self.notice = Some(Notice::success(format!("{} updated", capitalized(A::Record::KIND))));
        self.reload_after_mutation().await;
        Ok(updated)
    }

    /// A failed refresh after a successful mutation is surfaced on the list,
    /// not as a failure of the mutation.
    async fn reload_after_mutation(&mut self) {
        if let Err(err) = self.load().await {
            self.notice = Some(Notice::from_api_error(&err));
        }
    }

    /// Ask for confirmation before removing `id`.
    pub fn request_remove(&mut self, id: &str) -> Result<&PendingRemoval, ApiError> {
        let record = self.find(id)?;
        let pending = PendingRemoval {
            id: record.id().to_string(),
            prompt: record.removal_prompt(),
            removal: record.removal(),
        };
        Ok(self.pending_removal.insert(pending))
    }

    pub fn pending_removal(&self) -> Option<&PendingRemoval> {
        self.pending_removal.as_ref()
    }

    pub fn cancel_remove(&mut self) {
        self.pending_removal = None;
    }

    /// Carry out the confirmed removal. Does nothing without a pending one.
    /// A failed removal stays pending so the prompt can be confirmed again.
    pub async fn confirm_remove(&mut self) -> Result<(), ApiError> {
        let Some(pending) = self.pending_removal.take() else {
            return Ok(());
        };

        if let Err(err) = self.api.remove(&pending.id).await {
            warn!(kind = A::Record::KIND, id = %pending.id, error = %err, "remove failed");
            self.notice = Some(Notice::from_api_error(&err));
            self.pending_removal = Some(pending);
            return Err(err);
        }

        match pending.removal {
            Removal::Soft => {
                if let Some(record) = self.records.iter_mut().find(|r| r.id() == pending.id) {
                    record.set_active(false);
                }
                info!(kind = A::Record::KIND, id = %pending.id, "record deactivated");
                self.notice = Some(Notice::success(format!(
                    "{} deactivated",
                    capitalized(A::Record::KIND)
                )));
            }
            Removal::Hard => {
                info!(kind = A::Record::KIND, id = %pending.id, "record removed");
                self.notice = Some(Notice::success(format!(
                    "{} deleted",
                    capitalized(A::Record::KIND)
                )));
                self.reload_after_mutation().await;
            }
        }
        Ok(())
    }

    pub fn find(&self, id: &str) -> Result<&A::Record, ApiError> {
        self.records
            .iter()
            .find(|r| r.id() == id)
            .ok_or_else(|| ApiError::not_found(format!("{} {id}", A::Record::KIND)))
    }

    // -----------------------------------------------------------------------
    // Client-side derivations
    // -----------------------------------------------------------------------

    pub fn set_search(&mut self, term: &str) {
        self.search = term.trim().to_lowercase();
    }

    /// Sort by `column`; picking the current column again flips direction.
    pub fn sort_by(&mut self, column: &str) {
        self.sort = Some(match self.sort.take() {
            Some(current) if current.column == column => SortSpec {
                column: current.column,
                direction: current.direction.toggled(),
            },
            _ => SortSpec {
                column: column.to_string(),
                direction: SortDirection::Ascending,
            },
        });
    }

    pub fn sort(&self) -> Option<&SortSpec> {
        self.sort.as_ref()
    }

    pub fn set_activity_filter(&mut self, filter: ActivityFilter) {
        self.activity = filter;
    }

    /// Visible rows: activity filter, then search, then a stable sort.
    pub fn rows(&self) -> Vec<&A::Record> {
        let mut rows: Vec<&A::Record> = self
            .records
            .iter()
            .filter(|r| self.activity.admits(r.is_active()))
            .filter(|r| self.matches_search(r))
            .collect();

        if let Some(order) = &self.sort {
            rows.sort_by(|a, b| {
                let ord = match (a.sort_key(&order.column), b.sort_key(&order.column)) {
                    (Some(ka), Some(kb)) => ka.compare(&kb),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                };
                match order.direction {
                    SortDirection::Ascending => ord,
                    SortDirection::Descending => ord.reverse(),
                }
            });
        }
        rows
    }

    fn matches_search(&self, record: &A::Record) -> bool {
        self.search.is_empty()
            || record
                .search_fields()
                .iter()
                .any(|field| field.to_lowercase().contains(&self.search))
    }

    /// Loading until the first fetch settles; a failed fetch replaces the
    /// table with its message.
    pub fn view(&self) -> ListView<'_, A::Record> {
        if let Some(error) = &self.error {
            return ListView::Failed(error);
        }
        if !self.loaded {
            return ListView::Loading;
        }
        ListView::Ready(self.rows())
    }

    pub fn records(&self) -> &[A::Record] {
        &self.records
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    pub(crate) fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }
}

fn capitalized(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::resources::SortKey;
    use async_trait::async_trait;
    use serde::{Deserialize, Serialize};
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
    pub(crate) struct Dish {
        pub id: String,
        pub name: String,
        pub price: f64,
        pub active: bool,
        pub soft: bool,
    }

    impl Record for Dish {
        const KIND: &'static str = "dish";

        fn id(&self) -> &str {
            &self.id
        }
        fn search_fields(&self) -> Vec<String> {
            vec![self.name.clone(), format!("{:.2}", self.price)]
        }
        fn sort_key(&self, column: &str) -> Option<SortKey> {
            match column {
                "name" => Some(SortKey::text(&self.name)),
                "price" => Some(SortKey::Number(self.price)),
                _ => None,
            }
        }
        fn removal(&self) -> Removal {
            if self.soft {
                Removal::Soft
            } else {
                Removal::Hard
            }
        }
        fn is_active(&self) -> bool {
            self.active
        }
        fn set_active(&mut self, active: bool) {
            self.active = active;
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub(crate) struct DishInput {
        pub name: String,
        pub price: f64,
    }

    /// In-memory server: ids are assigned sequentially, failures are opt-in.
    #[derive(Clone, Default)]
    pub(crate) struct FakeDishes {
        pub store: Arc<Mutex<Vec<Dish>>>,
        pub fail_next: Arc<Mutex<Option<ApiError>>>,
        pub list_calls: Arc<AtomicUsize>,
        pub soft: bool,
    }

    impl FakeDishes {
        pub fn with(dishes: Vec<Dish>) -> Self {
            let fake = Self::default();
            *fake.store.lock().unwrap() = dishes;
            fake
        }

        pub fn fail_next(&self, err: ApiError) {
            *self.fail_next.lock().unwrap() = Some(err);
        }

        fn check_failure(&self) -> Result<(), ApiError> {
            match self.fail_next.lock().unwrap().take() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl ResourceApi for FakeDishes {
        type Record = Dish;
        type Input = DishInput;

        async fn list(&self) -> Result<Vec<Dish>, ApiError> {
            self.list_calls.fetch_add(1, AtomicOrdering::SeqCst);
            self.check_failure()?;
            Ok(self.store.lock().unwrap().clone())
        }

        async fn create(&self, input: &DishInput) -> Result<Option<Dish>, ApiError> {
            self.check_failure()?;
            let mut store = self.store.lock().unwrap();
            let dish = Dish {
                id: format!("d{}", store.len() + 1),
                name: input.name.clone(),
                price: input.price,
                active: true,
                soft: self.soft,
            };
            store.push(dish.clone());
            Ok(Some(dish))
        }

        async fn update(&self, id: &str, input: &DishInput) -> Result<Option<Dish>, ApiError> {
            self.check_failure()?;
            let mut store = self.store.lock().unwrap();
            let dish = store
                .iter_mut()
                .find(|d| d.id == id)
                .ok_or_else(|| ApiError::not_found(id))?;
            dish.name = input.name.clone();
            dish.price = input.price;
            Ok(Some(dish.clone()))
        }

        async fn remove(&self, id: &str) -> Result<(), ApiError> {
            self.check_failure()?;
            let mut store = self.store.lock().unwrap();
            if self.soft {
                if let Some(d) = store.iter_mut().find(|d| d.id == id) {
                    d.active = false;
                }
            } else {
                store.retain(|d| d.id != id);
            }
            Ok(())
        }
    }

    pub(crate) fn dish(id: &str, name: &str, price: f64) -> Dish {
        Dish {
            id: id.into(),
            name: name.into(),
            price,
            active: true,
            soft: false,
        }
    }

    fn names(rows: &[&Dish]) -> Vec<String> {
        rows.iter().map(|d| d.name.clone()).collect()
    }

    #[tokio::test]
    async fn load_replaces_state_and_is_idempotent() {
        let fake = FakeDishes::with(vec![dish("d1", "Soup", 4.0), dish("d2", "Pie", 6.0)]);
        let mut list = ListController::new(fake.clone());
        assert_eq!(list.view(), ListView::Loading);

        list.load().await.expect("first load");
        let first: Vec<Dish> = list.rows().into_iter().cloned().collect();
        list.load().await.expect("second load");
        let second: Vec<Dish> = list.rows().into_iter().cloned().collect();

        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert_eq!(fake.list_calls.load(AtomicOrdering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_load_renders_error_instead_of_table() {
        let fake = FakeDishes::default();
        fake.fail_next(ApiError::Server {
            status: 503,
            message: Some("Maintenance window".into()),
        });
        let mut list = ListController::new(fake);

        assert_eq!(list.view(), ListView::Loading);
        assert!(list.load().await.is_err());
        assert_eq!(list.view(), ListView::Failed("Maintenance window"));

        list.load().await.expect("manual retry succeeds");
        assert!(matches!(list.view(), ListView::Ready(_)));
    }

    #[tokio::test]
    async fn create_refetches_and_shows_submitted_values() {
        let fake = FakeDishes::default();
        let mut list = ListController::new(fake.clone());
        list.load().await.expect("load");

        list.create(&DishInput {
            name: "Ramen".into(),
            price: 11.5,
        })
        .await
        .expect("create");

        assert_eq!(fake.list_calls.load(AtomicOrdering::SeqCst), 2);
        let rows = list.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Ramen");
        assert_eq!(rows[0].price, 11.5);
        assert_eq!(
            list.take_notice().map(|n| n.message),
            Some("Dish created".to_string())
        );
    }

    #[tokio::test]
    async fn failed_mutation_keeps_collection_untouched() {
        let fake = FakeDishes::with(vec![dish("d1", "Soup", 4.0)]);
        let mut list = ListController::new(fake.clone());
        list.load().await.expect("load");

        fake.fail_next(ApiError::Rejected {
            message: "Name already used".into(),
            status_code: Some(409),
        });
        let err = list
            .update(
                "d1",
                &DishInput {
                    name: "Stew".into(),
                    price: 5.0,
                },
            )
            .await
            .expect_err("update fails");

        assert_eq!(err.user_message(), "Name already used");
        assert_eq!(list.rows()[0].name, "Soup");
        assert_eq!(fake.list_calls.load(AtomicOrdering::SeqCst), 1);
    }

    #[tokio::test]
    async fn removal_requires_confirmation() {
        let fake = FakeDishes::with(vec![dish("d1", "Soup", 4.0), dish("d2", "Pie", 6.0)]);
        let mut list = ListController::new(fake.clone());
        list.load().await.expect("load");

        let prompt = list.request_remove("d1").expect("pending").prompt.clone();
        assert!(prompt.contains("dish"));
        list.cancel_remove();
        list.confirm_remove().await.expect("no-op");
        assert_eq!(list.rows().len(), 2);

        list.request_remove("d1").expect("pending");
        list.confirm_remove().await.expect("remove");
        assert_eq!(names(&list.rows()), vec!["Pie"]);

        assert!(list.request_remove("missing").expect_err("unknown").is_not_found());
    }

    #[tokio::test]
    async fn failed_removal_stays_pending_for_another_try() {
        let fake = FakeDishes::with(vec![dish("d1", "Soup", 4.0)]);
        let mut list = ListController::new(fake.clone());
        list.load().await.expect("load");

        list.request_remove("d1").expect("pending");
        fake.fail_next(ApiError::Server {
            status: 503,
            message: Some("Try again shortly".into()),
        });
        assert!(list.confirm_remove().await.is_err());
        assert_eq!(list.pending_removal().map(|p| p.id.as_str()), Some("d1"));
        assert_eq!(
            list.take_notice().map(|n| n.message),
            Some("Try again shortly".to_string())
        );
        assert_eq!(list.rows().len(), 1);

        list.confirm_remove().await.expect("second attempt");
        assert!(list.pending_removal().is_none());
        assert!(list.rows().is_empty());
    }

    #[tokio::test]
    async fn soft_removal_moves_record_to_inactive_view() {
        let mut soup = dish("d1", "Soup", 4.0);
        soup.soft = true;
        let fake = FakeDishes {
            soft: true,
            ..FakeDishes::with(vec![soup, dish("d2", "Pie", 6.0)])
        };
        let mut list = ListController::new(fake.clone());
        list.load().await.expect("load");

        list.request_remove("d1").expect("pending");
        list.confirm_remove().await.expect("deactivate");

        assert_eq!(list.records().len(), 2, "record persists");
        assert_eq!(names(&list.rows()), vec!["Pie"]);
        list.set_activity_filter(ActivityFilter::Inactive);
        assert_eq!(names(&list.rows()), vec!["Soup"]);
        assert_eq!(fake.list_calls.load(AtomicOrdering::SeqCst), 1);
    }

    #[tokio::test]
    async fn search_is_case_insensitive_across_fields() {
        let fake = FakeDishes::with(vec![
            dish("d1", "Tomato Soup", 4.0),
            dish("d2", "Apple Pie", 6.25),
            dish("d3", "Soda", 2.0),
        ]);
        let mut list = ListController::new(fake);
        list.load().await.expect("load");

        list.set_search("  SO ");
        assert_eq!(names(&list.rows()), vec!["Tomato Soup", "Soda"]);

        list.set_search("6.25");
        assert_eq!(names(&list.rows()), vec!["Apple Pie"]);
    }

    #[tokio::test]
    async fn sort_toggles_direction_and_is_stable() {
        let fake = FakeDishes::with(vec![
            dish("d1", "Soup", 4.0),
            dish("d2", "Pie", 6.0),
            dish("d3", "Tea", 4.0),
            dish("d4", "Cake", 2.0),
        ]);
        let mut list = ListController::new(fake);
        list.load().await.expect("load");

        list.sort_by("price");
        assert_eq!(names(&list.rows()), vec!["Cake", "Soup", "Tea", "Pie"]);

        list.sort_by("price");
        assert_eq!(
            list.sort().map(|s| s.direction),
            Some(SortDirection::Descending)
        );
        assert_eq!(names(&list.rows()), vec!["Pie", "Soup", "Tea", "Cake"]);

        list.sort_by("name");
        assert_eq!(names(&list.rows()), vec!["Cake", "Pie", "Soup", "Tea"]);
    }
}
