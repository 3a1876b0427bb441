//! Filter state and fetch discipline for the reports pages.
//!
//! Numbers are rendered as delivered; the viewer never aggregates. A fetch
//! happens exactly once per change of the filter tuple.

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::resources::branches::BranchRef;
use crate::resources::reports::{ReportData, ReportQuery, ReportSource, ReportType};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ScopeFilter<T> {
    #[default]
    All,
    Only(T),
}

impl<T> ScopeFilter<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            ScopeFilter::All => None,
            ScopeFilter::Only(v) => Some(v),
        }
    }
}

/// Inclusive calendar range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ReportError> {
        if start > end {
            return Err(ReportError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn single_day(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReportFilter {
    pub report: ReportType,
    pub restaurant: ScopeFilter<String>,
    pub branch: ScopeFilter<BranchRef>,
    pub range: DateRange,
}

impl ReportFilter {
    pub fn to_query(&self) -> ReportQuery {
        ReportQuery {
            report: self.report,
            restaurant_id: self.restaurant.clone().into_option(),
            branch: self.branch.clone().into_option(),
            start_date: self.range.start,
            end_date: self.range.end,
        }
    }
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Start date {start} is after end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
    #[error("A branch filter needs a restaurant")]
    BranchWithoutRestaurant,
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl ReportError {
    pub fn user_message(&self) -> String {
        match self {
            ReportError::Api(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}

/// What [`ReportViewer::apply`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Fetched,
    Unchanged,
}

pub struct ReportViewer<S: ReportSource> {
    source: S,
    filter: Option<ReportFilter>,
    data: Option<ReportData>,
    error: Option<String>,
}

impl<S: ReportSource> ReportViewer<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            filter: None,
            data: None,
            error: None,
        }
    }

    /// Fetch for `filter` unless it equals the last tuple that loaded. The
    /// filter only counts as applied once its data has arrived, so a failed
    /// or abandoned fetch is repeated on the next call.
    pub async fn apply(&mut self, filter: ReportFilter) -> Result<Applied, ReportError> {
        if matches!(filter.branch, ScopeFilter::Only(_))
            && matches!(filter.restaurant, ScopeFilter::All)
        {
            return Err(ReportError::BranchWithoutRestaurant);
        }
        if self.filter.as_ref() == Some(&filter) {
            debug!(report = ?filter.report, "filter unchanged, keeping current data");
            return Ok(Applied::Unchanged);
        }

        let query = filter.to_query();
        debug!(report = ?query.report, params = ?query.params(), "fetching report");
        match self.source.fetch_report(&query).await {
            Ok(data) => {
                self.filter = Some(filter);
                self.data = Some(data);
                self.error = None;
                Ok(Applied::Fetched)
            }
            Err(err) => {
                warn!(report = ?query.report, error = %err, "report failed to load");
                self.filter = None;
                self.data = None;
                self.error = Some(err.user_message());
                Err(ReportError::Api(err))
            }
        }
    }

    pub fn filter(&self) -> Option<&ReportFilter> {
        self.filter.as_ref()
    }

    pub fn data(&self) -> Option<&ReportData> {
        self.data.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
