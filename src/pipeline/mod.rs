//! Filter, sort and paginate pipeline shared by every list page.
//!
//! A [`Query`] narrows a slice of records with a [`Filter`], optionally orders
//! the survivors with a stable [`Sort`] and cuts the result into fixed-size
//! pages. An empty result is a valid, empty page.

use std::collections::HashSet;
use std::hash::Hash;

use chrono::NaiveDate;
use tracing::debug;

mod error;
pub use error::PipelineError;

mod record;
pub use record::Record;

/// Search box, status chips and date pickers of a list page.
#[derive(Debug, Clone)]
pub struct Filter<S> {
    query: String,
    statuses: HashSet<S>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
}

impl<S> Default for Filter<S> {
    fn default() -> Self {
        Self {
            query: String::new(),
            statuses: HashSet::new(),
            from: None,
            to: None,
        }
    }
}

impl<S: Copy + Eq + Hash> Filter<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, text: impl Into<String>) -> Self {
        self.query = text.into();
        self
    }

    pub fn status(mut self, status: S) -> Self {
        self.statuses.insert(status);
        self
    }

    pub fn statuses(mut self, statuses: impl IntoIterator<Item = S>) -> Self {
        self.statuses.extend(statuses);
        self
    }

    pub fn from(mut self, day: NaiveDate) -> Self {
        self.from = Some(day);
        self
    }

    pub fn to(mut self, day: NaiveDate) -> Self {
        self.to = Some(day);
        self
    }

    /// Reject criteria that can never match, such as an inverted date range.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(PipelineError::InvertedRange { from, to });
            }
        }
        Ok(())
    }

    /// Whether `record` passes every criterion. `needle` is the lowercased query.
    fn matches<R: Record<Status = S>>(&self, record: &R, needle: &str) -> bool {
        if !self.statuses.is_empty() && !self.statuses.contains(&record.status()) {
            return false;
        }

        let day = record.date();
        if self.from.is_some_and(|from| day < from) || self.to.is_some_and(|to| day > to) {
            return false;
        }

        needle.is_empty()
            || record
                .search_fields()
                .iter()
                .any(|field| field.to_lowercase().contains(needle))
    }

    /// Records passing the filter, in their original order.
    pub fn apply<'a, R: Record<Status = S>>(
        &self,
        records: &'a [R],
    ) -> Result<Vec<&'a R>, PipelineError> {
        self.validate()?;
        let needle = self.query.trim().to_lowercase();
        Ok(records
            .iter()
            .filter(|record| self.matches(*record, &needle))
            .collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Date,
    Amount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn toggle(self) -> Self {
        match self {
            Direction::Asc => Direction::Desc,
            Direction::Desc => Direction::Asc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: SortField,
    pub direction: Direction,
}

impl Sort {
    pub fn new(field: SortField, direction: Direction) -> Self {
        Self { field, direction }
    }

    /// Stable: rows with equal keys keep their relative order in both directions.
    pub fn apply<R: Record>(&self, view: &mut [&R]) {
        view.sort_by(|a, b| {
            let ord = match self.field {
                SortField::Date => a.timestamp().cmp(&b.timestamp()),
                SortField::Amount => a.amount().cmp(&b.amount()),
            };
            match self.direction {
                Direction::Asc => ord,
                Direction::Desc => ord.reverse(),
            }
        });
    }
}

/// One page of a view.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based index of this page after clamping.
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

impl<T> Page<T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    size: usize,
}

impl Paginator {
    pub fn new(size: usize) -> Result<Self, PipelineError> {
        if size == 0 {
            return Err(PipelineError::ZeroPageSize);
        }
        Ok(Self { size })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of pages for `len` items; an empty view still has one page.
    pub fn total_pages(&self, len: usize) -> usize {
        len.div_ceil(self.size).max(1)
    }

    /// Page `index` (1-based) of `view`. Out-of-range indices clamp to the
    /// nearest valid page.
    pub fn page<T: Clone>(&self, view: &[T], index: usize) -> Page<T> {
        let total_pages = self.total_pages(view.len());
        let page = index.clamp(1, total_pages);
        let start = (page - 1) * self.size;
        let end = (start + self.size).min(view.len());

        Page {
            items: view[start..end].to_vec(),
            page,
            total_pages,
            total_items: view.len(),
        }
    }

    /// Every page of `view` in order.
    pub fn pages<'v, T: Clone>(self, view: &'v [T]) -> impl Iterator<Item = Page<T>> + 'v {
        (1..=self.total_pages(view.len())).map(move |index| self.page(view, index))
    }
}

/// Filter, sort and page size of one list view.
#[derive(Debug, Clone)]
pub struct Query<S> {
    pub filter: Filter<S>,
    pub sort: Option<Sort>,
    paginator: Paginator,
}

impl<S: Copy + Eq + Hash> Query<S> {
    pub fn new(page_size: usize) -> Result<Self, PipelineError> {
        Ok(Self {
            filter: Filter::default(),
            sort: None,
            paginator: Paginator::new(page_size)?,
        })
    }

    pub fn with_filter(mut self, filter: Filter<S>) -> Self {
        self.filter = filter;
        self
    }

    pub fn sorted_by(mut self, field: SortField, direction: Direction) -> Self {
        self.sort = Some(Sort::new(field, direction));
        self
    }

    pub fn paginator(&self) -> Paginator {
        self.paginator
    }

    /// The full filtered and sorted view, unpaginated.
    pub fn view<'a, R: Record<Status = S>>(
        &self,
        records: &'a [R],
    ) -> Result<Vec<&'a R>, PipelineError> {
        let mut view = self.filter.apply(records)?;
        if let Some(sort) = &self.sort {
            sort.apply(&mut view);
        }
        debug!(
            matched = view.len(),
            total = records.len(),
            "filter applied"
        );
        Ok(view)
    }

    /// Page `index` (1-based) of the view.
    pub fn run<'a, R: Record<Status = S>>(
        &self,
        records: &'a [R],
        index: usize,
    ) -> Result<Page<&'a R>, PipelineError> {
        let view = self.view(records)?;
        Ok(self.paginator.page(&view, index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Amount;
    use crate::model::{
        Contact, Settlement, SettlementStatus, SubMerchant, SubMerchantStatus, Ticket,
        TicketStatus, Transaction, TxId, TxLimits, TxStatus,
    };
    use chrono::NaiveDateTime;

    // test utils

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn at(d: u32, h: u32) -> NaiveDateTime {
        day(d).and_hms_opt(h, 30, 0).unwrap()
    }

    fn tx(id: TxId, d: u32, amount: i64, status: TxStatus) -> Transaction {
        Transaction {
            id,
            timestamp: at(d, (id % 24) as u32),
            amount: Amount::from_paise(amount),
            status,
            payer: format!("payer{id}@okhdfc"),
            payee: "store@okaxis".to_string(),
            rrn: format!("4100{id:08}"),
            remark: if id % 2 == 0 { "Groceries".to_string() } else { "Rent".to_string() },
        }
    }

    /// 15 transactions, ids 1..=15, three of them FAILURE.
    fn fifteen() -> Vec<Transaction> {
        (1..=15)
            .map(|id| {
                let status = match id {
                    3 | 8 | 13 => TxStatus::Failure,
                    5 | 10 => TxStatus::Pending,
                    _ => TxStatus::Success,
                };
                tx(id, (id % 10 + 1) as u32, 1_000 + id as i64 * 10, status)
            })
            .collect()
    }

    fn ids(items: &[&Transaction]) -> Vec<TxId> {
        items.iter().map(|t| t.id).collect()
    }

    // Filter

    #[test]
    fn empty_criteria_is_identity() {
        let records = fifteen();
        let view = Filter::new().apply(&records).unwrap();
        assert_eq!(ids(&view), (1..=15).collect::<Vec<_>>());
    }

    #[test]
    fn whitespace_query_matches_all() {
        let records = fifteen();
        let view = Filter::new().query("   ").apply(&records).unwrap();
        assert_eq!(view.len(), 15);
    }

    #[test]
    fn failure_filter_returns_exactly_three_in_order() {
        let records = fifteen();
        let query = Query::new(10)
            .unwrap()
            .with_filter(Filter::new().status(TxStatus::Failure));

        let page = query.run(&records, 1).unwrap();
        assert_eq!(ids(&page.items), vec![3, 8, 13]);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.total_items, 3);
    }

    #[test]
    fn status_membership() {
        let records = fifteen();
        let wanted = [TxStatus::Failure, TxStatus::Pending];
        let view = Filter::new().statuses(wanted).apply(&records).unwrap();

        for record in &records {
            let present = view.iter().any(|t| t.id == record.id);
            assert_eq!(present, wanted.contains(&record.status), "tx {}", record.id);
        }
    }

    #[test]
    fn text_search_is_case_insensitive_across_fields() {
        let records = fifteen();

        let by_remark = Filter::new().query("groCERies").apply(&records).unwrap();
        assert!(by_remark.iter().all(|t| t.id % 2 == 0));
        assert_eq!(by_remark.len(), 7);

        let by_payer = Filter::new().query("PAYER12@").apply(&records).unwrap();
        assert_eq!(ids(&by_payer), vec![12]);

        let by_rrn = Filter::new().query("410000000007").apply(&records).unwrap();
        assert_eq!(ids(&by_rrn), vec![7]);
    }

    #[test]
    fn date_range_is_inclusive_at_both_ends() {
        let records = vec![
            tx(1, 1, 100, TxStatus::Success),
            tx(2, 2, 100, TxStatus::Success),
            tx(3, 3, 100, TxStatus::Success),
            tx(4, 4, 100, TxStatus::Success),
            tx(5, 5, 100, TxStatus::Success),
        ];

        let view = Filter::new().from(day(2)).to(day(4)).apply(&records).unwrap();
        assert_eq!(ids(&view), vec![2, 3, 4]);
    }

    #[test]
    fn date_range_truncates_time_of_day() {
        let mut late = tx(1, 4, 100, TxStatus::Success);
        late.timestamp = day(4).and_hms_opt(23, 59, 59).unwrap();
        let mut early = tx(2, 2, 100, TxStatus::Success);
        early.timestamp = day(2).and_hms_opt(0, 0, 0).unwrap();

        let records = vec![late, early];
        let view = Filter::new().from(day(2)).to(day(4)).apply(&records).unwrap();
        assert_eq!(view.len(), 2);
    }

    #[test]
    fn single_day_range() {
        let records = fifteen();
        let view = Filter::new().from(day(4)).to(day(4)).apply(&records).unwrap();
        assert!(view.iter().all(|t| t.timestamp.date() == day(4)));
        assert_eq!(ids(&view), vec![3, 13]);
    }

    #[test]
    fn inverted_range_is_rejected() {
        let records = fifteen();
        let result = Filter::<TxStatus>::new().from(day(9)).to(day(2)).apply(&records);
        assert_eq!(
            result,
            Err(PipelineError::InvertedRange {
                from: day(9),
                to: day(2)
            })
        );
    }

    #[test]
    fn no_match_is_an_empty_page() {
        let records = fifteen();
        let query = Query::new(8)
            .unwrap()
            .with_filter(Filter::new().query("no such payer"));

        let page = query.run(&records, 3).unwrap();
        assert!(page.is_empty());
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.total_items, 0);
    }

    // Sort

    #[test]
    fn sort_by_amount_both_directions() {
        let records = fifteen();
        let asc = Query::new(20)
            .unwrap()
            .sorted_by(SortField::Amount, Direction::Asc)
            .view(&records)
            .unwrap();
        assert_eq!(ids(&asc), (1..=15).collect::<Vec<_>>());

        let desc = Query::new(20)
            .unwrap()
            .sorted_by(SortField::Amount, Direction::Desc)
            .view(&records)
            .unwrap();
        assert_eq!(ids(&desc), (1..=15).rev().collect::<Vec<_>>());
    }

    #[test]
    fn sort_is_stable_for_equal_keys() {
        let records = vec![
            tx(1, 1, 500, TxStatus::Success),
            tx(2, 1, 300, TxStatus::Success),
            tx(3, 1, 500, TxStatus::Failure),
            tx(4, 1, 300, TxStatus::Pending),
            tx(5, 1, 500, TxStatus::Deemed),
        ];

        let asc = Query::new(10)
            .unwrap()
            .sorted_by(SortField::Amount, Direction::Asc)
            .view(&records)
            .unwrap();
        assert_eq!(ids(&asc), vec![2, 4, 1, 3, 5]);

        let desc = Query::new(10)
            .unwrap()
            .sorted_by(SortField::Amount, Direction::Desc)
            .view(&records)
            .unwrap();
        assert_eq!(ids(&desc), vec![1, 3, 5, 2, 4]);
    }

    #[test]
    fn sort_by_date() {
        let records = vec![
            tx(1, 3, 100, TxStatus::Success),
            tx(2, 1, 100, TxStatus::Success),
            tx(3, 2, 100, TxStatus::Success),
        ];
        let view = Query::new(10)
            .unwrap()
            .sorted_by(SortField::Date, Direction::Desc)
            .view(&records)
            .unwrap();
        assert_eq!(ids(&view), vec![1, 3, 2]);
    }

    #[test]
    fn direction_toggles() {
        assert_eq!(Direction::Asc.toggle(), Direction::Desc);
        assert_eq!(Direction::Desc.toggle().toggle(), Direction::Desc);
    }

    // Pagination

    #[test]
    fn zero_page_size_is_rejected() {
        assert_eq!(Paginator::new(0), Err(PipelineError::ZeroPageSize));
        assert!(Query::<TxStatus>::new(0).is_err());
    }

    #[test]
    fn pages_concatenate_to_the_view() {
        let records = fifteen();
        let query = Query::new(4)
            .unwrap()
            .sorted_by(SortField::Date, Direction::Asc);
        let view = query.view(&records).unwrap();

        let pages: Vec<_> = query.paginator().pages(&view).collect();
        assert_eq!(pages.len(), 4);
        assert_eq!(pages[3].items.len(), 3);

        let joined: Vec<&Transaction> = pages.into_iter().flat_map(|p| p.items).collect();
        assert_eq!(ids(&joined), ids(&view));
    }

    #[test]
    fn out_of_range_page_clamps_to_last() {
        let records = fifteen();
        let query = Query::new(8).unwrap();

        let page = query.run(&records, 99).unwrap();
        assert_eq!(page.page, 2);
        assert_eq!(ids(&page.items), (9..=15).collect::<Vec<_>>());
        assert!(!page.has_next());
        assert!(page.has_previous());

        let first = query.run(&records, 0).unwrap();
        assert_eq!(first.page, 1);
        assert_eq!(first.items.len(), 8);
        assert!(first.has_next());
    }

    #[test]
    fn total_pages() {
        let paginator = Paginator::new(10).unwrap();
        assert_eq!(paginator.total_pages(0), 1);
        assert_eq!(paginator.total_pages(10), 1);
        assert_eq!(paginator.total_pages(11), 2);
    }

    // Other record types

    fn settlement(d: u32, merchant: u32, paise: i64, status: SettlementStatus) -> Settlement {
        Settlement {
            date: day(d),
            sub_merchant: merchant,
            tx_count: 12,
            total: Amount::from_paise(paise),
            status,
            utr: format!("UTR{d}{merchant}"),
        }
    }

    fn ticket(id: &str, subject: &str, rrn: Option<&str>, d: u32, status: TicketStatus) -> Ticket {
        Ticket {
            id: id.to_string(),
            subject: subject.to_string(),
            rrn: rrn.map(str::to_string),
            status,
            opened: at(d, 10),
            timeline: Vec::new(),
        }
    }

    fn sub_merchant(id: u32, d: u32) -> SubMerchant {
        SubMerchant {
            id,
            name: format!("Counter {id}"),
            contact: Contact {
                phone: "9876543210".to_string(),
                email: format!("counter{id}@example.in"),
            },
            vpa: format!("counter{id}@okaxis").parse().unwrap(),
            status: SubMerchantStatus::Active,
            limits: TxLimits {
                per_transaction: Amount::from_paise(10_000),
                daily: Amount::from_paise(100_000),
            },
            created: day(d),
        }
    }

    #[test]
    fn settlements_filter_by_day_status_and_utr() {
        let records = vec![
            settlement(1, 1, 500, SettlementStatus::Settled),
            settlement(2, 2, 300, SettlementStatus::Pending),
            settlement(3, 1, 300, SettlementStatus::Settled),
            settlement(4, 2, 900, SettlementStatus::Processing),
        ];

        let settled = Filter::new()
            .status(SettlementStatus::Settled)
            .from(day(2))
            .to(day(3))
            .apply(&records)
            .unwrap();
        assert_eq!(settled.len(), 1);
        assert_eq!(settled[0].date, day(3));

        let by_utr = Filter::new().query("utr22").apply(&records).unwrap();
        assert_eq!(by_utr.len(), 1);
        assert_eq!(by_utr[0].status, SettlementStatus::Pending);
    }

    #[test]
    fn settlements_sort_by_total_keeps_ties_in_order() {
        let records = vec![
            settlement(1, 1, 500, SettlementStatus::Settled),
            settlement(2, 2, 300, SettlementStatus::Pending),
            settlement(3, 1, 300, SettlementStatus::Settled),
            settlement(4, 2, 900, SettlementStatus::Processing),
        ];

        let view = Query::new(10)
            .unwrap()
            .sorted_by(SortField::Amount, Direction::Desc)
            .view(&records)
            .unwrap();
        let days: Vec<_> = view.iter().map(|s| s.date).collect();
        assert_eq!(days, vec![day(4), day(1), day(2), day(3)]);
    }

    #[test]
    fn sub_merchants_filter_by_creation_day() {
        let records = vec![sub_merchant(1, 1), sub_merchant(2, 3), sub_merchant(3, 5)];

        let view = Filter::new().from(day(3)).to(day(3)).apply(&records).unwrap();
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].id, 2);

        let by_email = Filter::new().query("COUNTER3@EXAMPLE").apply(&records).unwrap();
        assert_eq!(by_email.len(), 1);
        assert_eq!(by_email[0].id, 3);
    }

    #[test]
    fn tickets_search_rrn_and_filter_status() {
        let records = vec![
            ticket("T-1", "Refund not received", Some("410000000042"), 1, TicketStatus::Open),
            ticket("T-2", "Login issue", None, 2, TicketStatus::Closed),
            ticket("T-3", "QR not scanning", Some("410000000099"), 3, TicketStatus::InProgress),
        ];

        let by_rrn = Filter::new().query("000042").apply(&records).unwrap();
        assert_eq!(by_rrn.len(), 1);
        assert_eq!(by_rrn[0].id, "T-1");

        let open = Filter::new()
            .statuses([TicketStatus::Open, TicketStatus::InProgress])
            .apply(&records)
            .unwrap();
        let open_ids: Vec<_> = open.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(open_ids, vec!["T-1", "T-3"]);
    }

    #[test]
    fn tickets_without_amounts_keep_source_order() {
        let records = vec![
            ticket("T-1", "Refund not received", None, 3, TicketStatus::Open),
            ticket("T-2", "Login issue", None, 1, TicketStatus::Open),
            ticket("T-3", "QR not scanning", None, 2, TicketStatus::Open),
        ];

        for direction in [Direction::Asc, Direction::Desc] {
            let view = Query::new(10)
                .unwrap()
                .sorted_by(SortField::Amount, direction)
                .view(&records)
                .unwrap();
            let order: Vec<_> = view.iter().map(|t| t.id.as_str()).collect();
            assert_eq!(order, vec!["T-1", "T-2", "T-3"]);
        }

        let newest = Query::new(10)
            .unwrap()
            .sorted_by(SortField::Date, Direction::Desc)
            .run(&records, 1)
            .unwrap();
        let order: Vec<_> = newest.items.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(order, vec!["T-1", "T-3", "T-2"]);
    }

    #[test]
    fn missing_amounts_sort_before_present_ones() {
        assert!(None < Some(Amount::from_paise(i64::MIN)));
        let ticket = ticket("T-1", "Login issue", None, 1, TicketStatus::Open);
        let tx = tx(1, 1, 0, TxStatus::Success);
        assert!(ticket.amount() < tx.amount());
    }

    // Properties over generated records

    mod properties {
        use super::*;
        use proptest::prelude::*;

        /// Up to 60 transactions over five days with only four distinct
        /// amounts, so sort keys repeat.
        fn transactions() -> impl Strategy<Value = Vec<Transaction>> {
            proptest::collection::vec((0..4usize, 1..=5u32, 0..4i64), 0..60).prop_map(|rows| {
                rows.into_iter()
                    .enumerate()
                    .map(|(i, (status, d, amount))| {
                        tx(i as TxId + 1, d, amount * 100, TxStatus::ALL[status])
                    })
                    .collect()
            })
        }

        fn direction(descending: bool) -> Direction {
            if descending { Direction::Desc } else { Direction::Asc }
        }

        proptest! {
            #[test]
            fn empty_criteria_keep_every_record(records in transactions()) {
                let view = Filter::new().apply(&records).unwrap();
                let all: Vec<TxId> = records.iter().map(|t| t.id).collect();
                prop_assert_eq!(ids(&view), all);
            }

            #[test]
            fn status_filter_keeps_exactly_the_members(
                records in transactions(),
                wanted in proptest::sample::subsequence(TxStatus::ALL, 1..=4),
            ) {
                let view = Filter::new()
                    .statuses(wanted.iter().copied())
                    .apply(&records)
                    .unwrap();
                let expected: Vec<TxId> = records
                    .iter()
                    .filter(|t| wanted.contains(&t.status))
                    .map(|t| t.id)
                    .collect();
                prop_assert_eq!(ids(&view), expected);
            }

            #[test]
            fn pages_concatenate_to_the_view(
                records in transactions(),
                size in 1..20usize,
                descending in any::<bool>(),
            ) {
                let query = Query::new(size)
                    .unwrap()
                    .sorted_by(SortField::Date, direction(descending));
                let view = query.view(&records).unwrap();

                let pages: Vec<_> = query.paginator().pages(&view).collect();
                prop_assert_eq!(pages.len(), view.len().div_ceil(size).max(1));
                prop_assert!(pages.iter().all(|p| p.items.len() <= size));

                let joined: Vec<&Transaction> = pages.into_iter().flat_map(|p| p.items).collect();
                prop_assert_eq!(ids(&joined), ids(&view));
            }

            #[test]
            fn amount_sort_is_ordered_and_stable(
                records in transactions(),
                descending in any::<bool>(),
            ) {
                let view = Query::new(1)
                    .unwrap()
                    .sorted_by(SortField::Amount, direction(descending))
                    .view(&records)
                    .unwrap();
                prop_assert_eq!(view.len(), records.len());

                for pair in view.windows(2) {
                    let (a, b) = (pair[0], pair[1]);
                    if a.amount == b.amount {
                        prop_assert!(a.id < b.id);
                    } else if descending {
                        prop_assert!(a.amount > b.amount);
                    } else {
                        prop_assert!(a.amount < b.amount);
                    }
                }
            }
        }
    }
}
