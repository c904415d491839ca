use chrono::{DateTime, Local, NaiveDate};

/// Represents an entity responsible for providing dates across the application.
/// Injecting it lets streak and statistics code run against a fixed "today" in
/// tests.
#[cfg_attr(test, mockall::automock)]
pub trait Clock: Sync + Send + 'static {
    fn now(&self) -> DateTime<Local>;

    fn today(&self) -> NaiveDate;
}

pub struct DefaultClock;

impl Clock for DefaultClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}
