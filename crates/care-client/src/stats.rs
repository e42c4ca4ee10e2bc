//! Display aggregations computed over lists already loaded from the cache.

use care_types::{Donation, Event, Role, User};
use chrono::{DateTime, Datelike, NaiveDate, Utc};

fn month_index(at: DateTime<Utc>) -> i32 {
    at.year() * 12 + at.month0() as i32
}

/// `(year, month)` of the calendar month `back` months before `now`.
pub fn month_of(now: DateTime<Utc>, back: u32) -> (i32, u32) {
    let index = month_index(now) - back as i32;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

fn month_label(year: i32, month: u32) -> String {
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|d| d.format("%b %Y").to_string())
        .unwrap_or_default()
}

fn in_month(at: Option<DateTime<Utc>>, now: DateTime<Utc>, back: u32) -> bool {
    at.is_some_and(|t| month_index(t) == month_index(now) - back as i32)
}

pub fn total_amount(donations: &[Donation]) -> f64 {
    donations.iter().map(|d| d.amount).sum()
}

pub fn average_amount(donations: &[Donation]) -> f64 {
    if donations.is_empty() {
        0.0
    } else {
        total_amount(donations) / donations.len() as f64
    }
}

/// Sum of donations made in the month `back` months before `now`.
pub fn month_total(donations: &[Donation], now: DateTime<Utc>, back: u32) -> f64 {
    donations
        .iter()
        .filter(|d| in_month(d.donated_at(), now, back))
        .map(|d| d.amount)
        .sum()
}

/// Percentage change; a zero baseline counts as 100% growth.
pub fn growth_percent(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        100.0
    } else {
        (current - previous) / previous * 100.0
    }
}

pub fn donation_growth(donations: &[Donation], now: DateTime<Utc>) -> f64 {
    growth_percent(month_total(donations, now, 0), month_total(donations, now, 1))
}

pub fn new_users_in_month(users: &[User], now: DateTime<Utc>, back: u32) -> usize {
    users
        .iter()
        .filter(|u| in_month(u.created_at(), now, back))
        .count()
}

pub fn user_growth(users: &[User], now: DateTime<Utc>) -> f64 {
    growth_percent(
        new_users_in_month(users, now, 0) as f64,
        new_users_in_month(users, now, 1) as f64,
    )
}

#[derive(Clone, Debug, PartialEq)]
pub struct MonthBucket {
    pub year: i32,
    pub month: u32,
    pub label: String,
    pub total: f64,
    pub count: usize,
}

/// Donation totals for the last `months` calendar months, oldest first.
pub fn monthly_totals(donations: &[Donation], now: DateTime<Utc>, months: u32) -> Vec<MonthBucket> {
    (0..months)
        .rev()
        .map(|back| {
            let (year, month) = month_of(now, back);
            let inMonth: Vec<&Donation> = donations
                .iter()
                .filter(|d| in_month(d.donated_at(), now, back))
                .collect();
            MonthBucket {
                year,
                month,
                label: month_label(year, month),
                total: inMonth.iter().map(|d| d.amount).sum(),
                count: inMonth.len(),
            }
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq)]
pub struct MonthActivity {
    pub label: String,
    pub new_users: usize,
    pub donations: f64,
    pub events: usize,
}

/// Per-month users joined, amount donated and events held, oldest first.
pub fn activity_by_month(
    users: &[User],
    events: &[Event],
    donations: &[Donation],
    now: DateTime<Utc>,
    months: u32,
) -> Vec<MonthActivity> {
    (0..months)
        .rev()
        .map(|back| {
            let (year, month) = month_of(now, back);
            MonthActivity {
                label: month_label(year, month),
                new_users: new_users_in_month(users, now, back),
                donations: month_total(donations, now, back),
                events: events
                    .iter()
                    .filter(|e| in_month(e.starts_at(), now, back))
                    .count(),
            }
        })
        .collect()
}

pub fn top_donations(donations: &[Donation], n: usize) -> Vec<&Donation> {
    let mut sorted: Vec<&Donation> = donations.iter().collect();
    sorted.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    sorted.truncate(n);
    sorted
}

pub fn top_events_by_volunteers(events: &[Event], n: usize) -> Vec<&Event> {
    let mut sorted: Vec<&Event> = events.iter().collect();
    sorted.sort_by(|a, b| b.volunteers.len().cmp(&a.volunteers.len()));
    sorted.truncate(n);
    sorted
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RoleCounts {
    pub total: usize,
    pub admins: usize,
    pub volunteers: usize,
    pub donors: usize,
}

impl RoleCounts {
    /// Share of all users holding `role`, in percent.
    pub fn share(&self, role: Role) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let count = match role {
            Role::Admin => self.admins,
            Role::Volunteer => self.volunteers,
            Role::Donor => self.donors,
        };
        count as f64 / self.total as f64 * 100.0
    }
}

pub fn role_counts(users: &[User]) -> RoleCounts {
    users.iter().fold(
        RoleCounts {
            total: users.len(),
            ..RoleCounts::default()
        },
        |mut counts, user| {
            match user.role {
                Some(Role::Admin) => counts.admins += 1,
                Some(Role::Volunteer) => counts.volunteers += 1,
                Some(Role::Donor) => counts.donors += 1,
                None => {}
            }
            counts
        },
    )
}

pub fn upcoming_events(events: &[Event], now: DateTime<Utc>) -> usize {
    events
        .iter()
        .filter(|e| e.starts_at().is_some_and(|t| t >= now))
        .count()
}

pub fn total_volunteer_signups(events: &[Event]) -> usize {
    events.iter().map(|e| e.volunteers.len()).sum()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DonorTier {
    Platinum,
    Gold,
    Silver,
    Bronze,
    Supporter,
}

impl DonorTier {
    pub fn for_amount(total: f64) -> Self {
        if total >= 10_000.0 {
            DonorTier::Platinum
        } else if total >= 5_000.0 {
            DonorTier::Gold
        } else if total >= 1_000.0 {
            DonorTier::Silver
        } else if total >= 500.0 {
            DonorTier::Bronze
        } else {
            DonorTier::Supporter
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DonorTier::Platinum => "Platinum",
            DonorTier::Gold => "Gold",
            DonorTier::Silver => "Silver",
            DonorTier::Bronze => "Bronze",
            DonorTier::Supporter => "Supporter",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DateFilter {
    #[default]
    All,
    Upcoming,
    Past,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventFilter {
    pub search: String,
    pub when: DateFilter,
    /// `None` matches every location
    pub location: Option<String>,
}

impl EventFilter {
    pub fn matches(&self, event: &Event, now: DateTime<Utc>) -> bool {
        let needle = self.search.trim().to_lowercase();
        let matchesSearch = needle.is_empty()
            || event.title.to_lowercase().contains(&needle)
            || event.location.to_lowercase().contains(&needle);

        // Unparseable dates are neither upcoming nor past.
        let matchesDate = match self.when {
            DateFilter::All => true,
            DateFilter::Upcoming => event.starts_at().is_some_and(|t| t >= now),
            DateFilter::Past => event.starts_at().is_some_and(|t| t < now),
        };

        let matchesLocation = self
            .location
            .as_deref()
            .map_or(true, |loc| event.location == loc);

        matchesSearch && matchesDate && matchesLocation
    }
}

pub fn filter_events<'a>(events: &'a [Event], filter: &EventFilter, now: DateTime<Utc>) -> Vec<&'a Event> {
    events.iter().filter(|e| filter.matches(e, now)).collect()
}

/// Locations in first-seen order, without duplicates.
pub fn distinct_locations(events: &[Event]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for event in events {
        if !event.location.is_empty() && !seen.contains(&event.location) {
            seen.push(event.location.clone());
        }
    }
    seen
}

/// Admin search over donations: donor email or name, plus an inclusive
/// date range. A bound excludes donations whose date cannot be read.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DonationFilter {
    pub search: String,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DonationFilter {
    pub fn matches(&self, donation: &Donation) -> bool {
        let needle = self.search.trim().to_lowercase();
        let matchesSearch = needle.is_empty()
            || donation.donor_email.to_lowercase().contains(&needle)
            || donation
                .donor_name
                .as_deref()
                .is_some_and(|n| n.to_lowercase().contains(&needle));

        if self.from.is_none() && self.to.is_none() {
            return matchesSearch;
        }
        let Some(day) = donation.donated_at().map(|t| t.date_naive()) else {
            return false;
        };
        matchesSearch
            && self.from.map_or(true, |from| day >= from)
            && self.to.map_or(true, |to| day <= to)
    }
}

/// Matching donations, newest first. Undated ones go last.
pub fn filter_donations<'a>(donations: &'a [Donation], filter: &DonationFilter) -> Vec<&'a Donation> {
    let mut matching: Vec<&Donation> = donations.iter().filter(|d| filter.matches(d)).collect();
    matching.sort_by_key(|d| std::cmp::Reverse(d.donated_at()));
    matching
}

/// Users whose name or email contains `search`, optionally limited to `role`.
pub fn filter_users<'a>(users: &'a [User], search: &str, role: Option<Role>) -> Vec<&'a User> {
    let needle = search.trim().to_lowercase();
    users
        .iter()
        .filter(|u| {
            needle.is_empty()
                || u.name.to_lowercase().contains(&needle)
                || u.email.to_lowercase().contains(&needle)
        })
        .filter(|u| role.map_or(true, |r| u.role == Some(r)))
        .collect()
}
