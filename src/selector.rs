//! Dependent ("cascading") selects.
//!
//! A [`CascadingSelect`] holds the option set of a child control whose
//! options depend on a parent selection. Every parent change bumps a
//! generation counter; a fetch only applies its result if its generation is
//! still the latest when it resolves, so a slow response for an old parent
//! can never overwrite the options of a newer one.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::ApiError;

/// Wire value of the "visible at every branch" pseudo-option.
pub const GLOBAL: &str = "global";

/// Anything that can be rendered as an option in a select.
pub trait SelectOption: Clone + Send + Sync + 'static {
    fn option_id(&self) -> &str;
    fn option_label(&self) -> &str;
}

/// Loads the child options for a parent key.
#[async_trait]
pub trait ChildSource<P, C>: Send + Sync {
    async fn fetch_children(&self, parent: &P) -> Result<Vec<C>, ApiError>;
}

/// The current value of a select.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Choice {
    Global,
    Item(String),
}

impl Choice {
    pub fn item(id: impl Into<String>) -> Self {
        Choice::Item(id.into())
    }

    pub fn as_item(&self) -> Option<&str> {
        match self {
            Choice::Item(id) => Some(id),
            Choice::Global => None,
        }
    }

    pub fn wire_value(&self) -> &str {
        match self {
            Choice::Global => GLOBAL,
            Choice::Item(id) => id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectError {
    #[error("this selection is fixed for your account")]
    Locked,
    #[error("{0} is not one of the available options")]
    NotAnOption(String),
    #[error("\"all\" is not available here")]
    GlobalNotAllowed,
}

/// Outcome of a parent change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Refresh {
    Applied,
    /// A newer parent selection started before this fetch resolved.
    Superseded,
    Failed(String),
    Locked,
}

#[derive(Debug)]
struct SelectState<P, C> {
    parent: Option<P>,
    generation: u64,
    options: Vec<C>,
    selected: Option<Choice>,
    /// Selection hidden while the options of a new parent load.
    pending: Option<Choice>,
    loading: bool,
    error: Option<String>,
    locked: bool,
}

impl<P, C> Default for SelectState<P, C> {
    fn default() -> Self {
        Self {
            parent: None,
            generation: 0,
            options: Vec::new(),
            selected: None,
            pending: None,
            loading: false,
            error: None,
            locked: false,
        }
    }
}

/// Cheap-clone handle; clones share state.
pub struct CascadingSelect<P, C> {
    state: Arc<Mutex<SelectState<P, C>>>,
    source: Arc<dyn ChildSource<P, C>>,
    include_global: bool,
    label: &'static str,
}

impl<P, C> Clone for CascadingSelect<P, C> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            source: Arc::clone(&self.source),
            include_global: self.include_global,
            label: self.label,
        }
    }
}

impl<P, C> CascadingSelect<P, C>
where
    P: Clone + PartialEq + Send + Sync + std::fmt::Debug + 'static,
    C: SelectOption,
{
    pub fn new(label: &'static str, source: Arc<dyn ChildSource<P, C>>) -> Self {
        Self {
            state: Arc::new(Mutex::new(SelectState::default())),
            source,
            include_global: false,
            label,
        }
    }

    /// Offer the [`Choice::Global`] pseudo-option.
    pub fn with_global(mut self) -> Self {
        self.include_global = true;
        self
    }

    fn state(&self) -> MutexGuard<'_, SelectState<P, C>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Switch to `parent` and reload the option set.
    ///
    /// The current selection survives only if it belongs to the new set.
    pub async fn select_parent(&self, parent: P) -> Refresh {
        let generation = {
            let mut st = self.state();
            if st.locked {
                return Refresh::Locked;
            }
            if st.parent.as_ref() != Some(&parent) {
                if let Some(Choice::Item(_)) = st.selected {
                    st.pending = st.selected.take();
                }
            }
            st.parent = Some(parent.clone());
            st.generation += 1;
            st.loading = true;
            st.error = None;
            st.generation
        };

        debug!(select = self.label, parent = ?parent, generation, "loading child options");
        let result = self.source.fetch_children(&parent).await;

        let mut st = self.state();
        if st.generation != generation {
            debug!(
                select = self.label,
                generation,
                latest = st.generation,
                "discarding superseded child options"
            );
            return Refresh::Superseded;
        }
        st.loading = false;

        match result {
            Ok(options) => {
                let carried = st.pending.take().or_else(|| st.selected.take());
                st.selected = match carried {
                    Some(Choice::Item(id)) if options.iter().any(|o| o.option_id() == id) => {
                        Some(Choice::Item(id))
                    }
                    Some(Choice::Global) if self.include_global => Some(Choice::Global),
                    _ => None,
                };
                st.options = options;
                Refresh::Applied
            }
            Err(err) => {
                let message = err.user_message();
                warn!(select = self.label, parent = ?parent, error = %err, "child options failed to load");
                st.options.clear();
                st.pending = None;
                if let Some(Choice::Item(_)) = st.selected {
                    st.selected = None;
                }
                st.error = Some(message.clone());
                Refresh::Failed(message)
            }
        }
    }

    /// Set the selection. Item ids must be in the loaded option set.
    pub fn choose(&self, choice: Choice) -> Result<(), SelectError> {
        let mut st = self.state();
        if st.locked {
            return Err(SelectError::Locked);
        }
        match &choice {
            Choice::Global if !self.include_global => return Err(SelectError::GlobalNotAllowed),
            Choice::Global => {}
            Choice::Item(id) => {
                if st.loading || !st.options.iter().any(|o| o.option_id() == id.as_str()) {
                    return Err(SelectError::NotAnOption(id.clone()));
                }
            }
        }
        st.pending = None;
        st.selected = Some(choice);
        Ok(())
    }

    pub fn clear_selection(&self) -> Result<(), SelectError> {
        let mut st = self.state();
        if st.locked {
            return Err(SelectError::Locked);
        }
        st.selected = None;
        st.pending = None;
        Ok(())
    }

    /// Drop parent, options and selection; in-flight fetches are discarded.
    pub fn clear(&self) {
        let mut st = self.state();
        if st.locked {
            return;
        }
        let generation = st.generation + 1;
        *st = SelectState {
            generation,
            ..SelectState::default()
        };
    }

    /// Fix parent and child for a role-scoped user; the select turns read-only.
    pub fn lock_to(&self, parent: P, option: C) {
        let mut st = self.state();
        let generation = st.generation + 1;
        let selected = Some(Choice::Item(option.option_id().to_string()));
        *st = SelectState {
            parent: Some(parent),
            generation,
            options: vec![option],
            selected,
            pending: None,
            loading: false,
            error: None,
            locked: true,
        };
    }

    pub fn selected(&self) -> Option<Choice> {
        self.state().selected.clone()
    }

    pub fn selected_option(&self) -> Option<C> {
        let st = self.state();
        let id = st.selected.as_ref()?.as_item()?.to_string();
        st.options.iter().find(|o| o.option_id() == id).cloned()
    }

    pub fn parent(&self) -> Option<P> {
        self.state().parent.clone()
    }

    pub fn options(&self) -> Vec<C> {
        self.state().options.clone()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.state().options.iter().any(|o| o.option_id() == id)
    }

    pub fn is_loading(&self) -> bool {
        self.state().loading
    }

    pub fn is_locked(&self) -> bool {
        self.state().locked
    }

    pub fn includes_global(&self) -> bool {
        self.include_global
    }

    pub fn error(&self) -> Option<String> {
        self.state().error.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    struct Opt {
        id: String,
    }

    impl SelectOption for Opt {
        fn option_id(&self) -> &str {
            &self.id
        }
        fn option_label(&self) -> &str {
            &self.id
        }
    }

    fn opts(ids: &[&str]) -> Vec<Opt> {
        ids.iter().map(|id| Opt { id: id.to_string() }).collect()
    }

    /// Children per parent, with an optional artificial delay per parent.
    struct FakeSource {
        children: HashMap<String, Vec<Opt>>,
        delays: HashMap<String, Duration>,
    }

    impl FakeSource {
        fn new(children: &[(&str, &[&str])]) -> Self {
            Self {
                children: children
                    .iter()
                    .map(|(p, ids)| (p.to_string(), opts(ids)))
                    .collect(),
                delays: HashMap::new(),
            }
        }

        fn delayed(mut self, parent: &str, delay: Duration) -> Self {
            self.delays.insert(parent.to_string(), delay);
            self
        }
    }

    #[async_trait]
    impl ChildSource<String, Opt> for FakeSource {
        async fn fetch_children(&self, parent: &String) -> Result<Vec<Opt>, ApiError> {
            if let Some(delay) = self.delays.get(parent) {
                tokio::time::sleep(*delay).await;
            }
            self.children.get(parent).cloned().ok_or(ApiError::Network {
                url: "http://test".into(),
            })
        }
    }

    fn branch_select(source: FakeSource) -> CascadingSelect<String, Opt> {
        CascadingSelect::new("branch", Arc::new(source))
    }

    #[tokio::test]
    async fn parent_change_repopulates_and_clears_incompatible_child() {
        let select = branch_select(FakeSource::new(&[("A", &["B1", "B2"]), ("Z", &["B3"])]));

        assert_eq!(select.select_parent("A".into()).await, Refresh::Applied);
        assert_eq!(select.options(), opts(&["B1", "B2"]));

        select.choose(Choice::item("B1")).expect("B1 is an option");
        assert_eq!(select.select_parent("Z".into()).await, Refresh::Applied);

        assert_eq!(select.selected(), None);
        assert_eq!(select.options(), opts(&["B3"]));
    }

    #[tokio::test]
    async fn compatible_child_survives_parent_reload() {
        let select = branch_select(FakeSource::new(&[("A", &["B1"]), ("C", &["B1", "B4"])]));
        select.select_parent("A".into()).await;
        select.choose(Choice::item("B1")).expect("choose");

        select.select_parent("C".into()).await;
        assert_eq!(select.selected(), Some(Choice::item("B1")));
    }

    #[tokio::test]
    async fn child_is_hidden_while_new_parent_loads() {
        let source = FakeSource::new(&[("A", &["B1"]), ("Z", &["B3"])])
            .delayed("Z", Duration::from_millis(50));
        let select = branch_select(source);
        select.select_parent("A".into()).await;
        select.choose(Choice::item("B1")).expect("choose");

        let background = select.clone();
        let handle = tokio::spawn(async move { background.select_parent("Z".into()).await });
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(select.is_loading());
        assert_eq!(select.selected(), None);
        assert_eq!(handle.await.expect("join"), Refresh::Applied);
    }

    #[tokio::test]
    async fn stale_response_never_overwrites_newer_parent() {
        let source = FakeSource::new(&[("A", &["B1", "B2"]), ("Z", &["B3"])])
            .delayed("A", Duration::from_millis(60));
        let select = branch_select(source);

        let slow = select.clone();
        let fast = select.clone();
        let (slow_outcome, fast_outcome) = tokio::join!(
            async move { slow.select_parent("A".into()).await },
            async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                fast.select_parent("Z".into()).await
            }
        );

        assert_eq!(fast_outcome, Refresh::Applied);
        assert_eq!(slow_outcome, Refresh::Superseded);
        assert_eq!(select.parent().as_deref(), Some("Z"));
        assert_eq!(select.options(), opts(&["B3"]));
        assert!(!select.is_loading());
    }

    #[tokio::test]
    async fn failed_fetch_clears_children_and_reports() {
        let select = branch_select(FakeSource::new(&[("A", &["B1"])]));
        select.select_parent("A".into()).await;
        select.choose(Choice::item("B1")).expect("choose");

        let outcome = select.select_parent("missing".into()).await;
        assert!(matches!(outcome, Refresh::Failed(_)));
        assert!(select.options().is_empty());
        assert_eq!(select.selected(), None);
        assert!(select.error().is_some());
        assert_eq!(select.parent().as_deref(), Some("missing"));
    }

    #[tokio::test]
    async fn global_is_always_selectable_and_survives_parent_changes() {
        let source = FakeSource::new(&[("A", &["B1"]), ("Z", &["B3"])])
            .delayed("A", Duration::from_millis(40));
        let select = branch_select(source).with_global();

        let background = select.clone();
        let handle = tokio::spawn(async move { background.select_parent("A".into()).await });
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(select.is_loading());
        select.choose(Choice::Global).expect("global while loading");
        handle.await.expect("join");

        select.select_parent("Z".into()).await;
        assert_eq!(select.selected(), Some(Choice::Global));
    }

    #[tokio::test]
    async fn options_outside_the_set_are_rejected() {
        let select = branch_select(FakeSource::new(&[("A", &["B1"])]));
        assert_eq!(
            select.choose(Choice::item("B1")),
            Err(SelectError::NotAnOption("B1".into()))
        );
        assert_eq!(select.choose(Choice::Global), Err(SelectError::GlobalNotAllowed));

        select.select_parent("A".into()).await;
        assert_eq!(
            select.choose(Choice::item("B9")),
            Err(SelectError::NotAnOption("B9".into()))
        );
    }

    #[tokio::test]
    async fn locked_select_is_read_only() {
        let select = branch_select(FakeSource::new(&[("A", &["B1"])]));
        select.lock_to("R1".into(), Opt { id: "B7".into() });

        assert_eq!(select.select_parent("A".into()).await, Refresh::Locked);
        assert_eq!(select.choose(Choice::item("B7")), Err(SelectError::Locked));
        assert_eq!(select.selected(), Some(Choice::item("B7")));
        assert_eq!(select.parent().as_deref(), Some("R1"));
    }

    #[tokio::test]
    async fn clear_discards_in_flight_fetch() {
        let source = FakeSource::new(&[("A", &["B1"])]).delayed("A", Duration::from_millis(30));
        let select = branch_select(source);

        let background = select.clone();
        let handle = tokio::spawn(async move { background.select_parent("A".into()).await });
        tokio::time::sleep(Duration::from_millis(5)).await;
        select.clear();

        assert_eq!(handle.await.expect("join"), Refresh::Superseded);
        assert!(select.options().is_empty());
        assert_eq!(select.parent(), None);
    }
}
