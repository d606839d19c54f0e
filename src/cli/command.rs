use std::io::Write;

use anyhow::Result;
use chrono::NaiveDate;
use tracing::{debug, instrument};

use crate::{
    harvest::TimeEntrySource,
    shortcode::{store::ShortCodeStore, ShortCodeAllocator},
    utils::{
        clock::Clock,
        time::{month_start, week_start},
    },
};

use super::output::{grid::ScheduleGrid, list::write_list, write_legend};

pub const HELP: &str = "\
l|ld       list entries (for today)
lw         list entries (for week, Mon-Sun)
lm         list entries (for month, 1st-now)
gd         grid of entries (for today)
gw         grid of entries (for week, Mon-Sun)
gm         grid of entries (for month, 1st-now)
?|h        this help
q          quit";

const HINT: &str = "q to quit, h|? for help";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Day,
    Week,
    Month,
}

impl Period {
    /// Inclusive range of dates ending with `today`.
    pub fn range(self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        match self {
            Period::Day => (today, today),
            Period::Week => (week_start(today), today),
            Period::Month => (month_start(today), today),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    List,
    Grid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    Help,
    Report(ReportKind, Period),
    Unknown,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            "q" => Command::Quit,
            "h" | "?" => Command::Help,
            "l" | "ld" => Command::Report(ReportKind::List, Period::Day),
            "lw" => Command::Report(ReportKind::List, Period::Week),
            "lm" => Command::Report(ReportKind::List, Period::Month),
            "gd" => Command::Report(ReportKind::Grid, Period::Day),
            "gw" => Command::Report(ReportKind::Grid, Period::Week),
            "gm" => Command::Report(ReportKind::Grid, Period::Month),
            _ => Command::Unknown,
        }
    }
}

/// Everything a report command needs: where entries come from, the short codes and the notion
/// of "today".
pub struct Reporter<S, T> {
    allocator: ShortCodeAllocator<S>,
    source: T,
    clock: Box<dyn Clock>,
}

impl<S: ShortCodeStore, T: TimeEntrySource> Reporter<S, T> {
    pub fn new(allocator: ShortCodeAllocator<S>, source: T, clock: Box<dyn Clock>) -> Self {
        Self {
            allocator,
            source,
            clock,
        }
    }

    pub fn allocator(&self) -> &ShortCodeAllocator<S> {
        &self.allocator
    }

    /// Runs a single command. Returns `false` once the user asked to quit.
    pub async fn execute(&mut self, command: Command, out: &mut impl Write) -> Result<bool> {
        match command {
            Command::Quit => return Ok(false),
            Command::Help => writeln!(out, "{HELP}")?,
            Command::Report(kind, period) => {
                let (from, to) = period.range(self.clock.today());
                self.report(kind, from, to, out).await?;
            }
            Command::Unknown => writeln!(out, "{HINT}")?,
        }
        Ok(true)
    }

    #[instrument(skip(self, out))]
    pub async fn report(
        &mut self,
        kind: ReportKind,
        from: NaiveDate,
        to: NaiveDate,
        out: &mut impl Write,
    ) -> Result<()> {
        let entries = self.source.time_entries(from, to).await?;
        debug!("Retrieved {} entries", entries.len());

        let added = self
            .allocator
            .allocate(entries.iter().map(|v| v.triple()))
            .await?;
        if added > 0 {
            writeln!(
                out,
                "Wrote {} short codes to {} ({added} new)",
                self.allocator.map().len(),
                self.allocator.store().location()
            )?;
        }

        let annotated = self.allocator.annotate(entries);
        match kind {
            ReportKind::List => write_list(&annotated, out)?,
            ReportKind::Grid => ScheduleGrid::build(&annotated).render(out)?,
        }
        write_legend(&annotated, out)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use anyhow::{anyhow, Result};
    use chrono::NaiveDate;

    use crate::{
        entities::fixtures::{entry, time},
        harvest::MockTimeEntrySource,
        shortcode::{store::MockShortCodeStore, ShortCodeAllocator, ShortCodeError, ShortCodeMap},
        utils::{clock::FixedClock, logging::TEST_LOGGING},
    };

    use super::{Command, Period, ReportKind, Reporter, HELP};

    // Thursday
    const TODAY: NaiveDate = NaiveDate::from_ymd_opt(2024, 1, 4).unwrap();
    const TUESDAY: NaiveDate = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();

    fn reporter(
        source: MockTimeEntrySource,
        saves: usize,
    ) -> Reporter<MockShortCodeStore, MockTimeEntrySource> {
        let mut store = MockShortCodeStore::new();
        store.expect_save().times(saves).returning(|_| Ok(()));
        store
            .expect_location()
            .return_const(".clientprojecttask.json".to_string());
        Reporter::new(
            ShortCodeAllocator::new(ShortCodeMap::default(), store),
            source,
            Box::new(FixedClock(TODAY)),
        )
    }

    #[test]
    fn test_parse() {
        assert_eq!(Command::parse(" q "), Command::Quit);
        assert_eq!(Command::parse("?"), Command::Help);
        assert_eq!(Command::parse("l"), Command::Report(ReportKind::List, Period::Day));
        assert_eq!(Command::parse("lm"), Command::Report(ReportKind::List, Period::Month));
        assert_eq!(Command::parse("gw"), Command::Report(ReportKind::Grid, Period::Week));
        assert_eq!(Command::parse("start"), Command::Unknown);
        assert_eq!(Command::parse(""), Command::Unknown);
    }

    #[test]
    fn test_period_range() {
        assert_eq!(Period::Day.range(TODAY), (TODAY, TODAY));
        assert_eq!(
            Period::Week.range(TODAY),
            (NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), TODAY)
        );
        assert_eq!(
            Period::Month.range(TODAY),
            (NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), TODAY)
        );
    }

    #[tokio::test]
    async fn test_quit_and_help() -> Result<()> {
        let mut reporter = reporter(MockTimeEntrySource::new(), 0);
        let mut out = Vec::new();

        assert!(reporter.execute(Command::Help, &mut out).await?);
        assert!(!reporter.execute(Command::Quit, &mut out).await?);
        assert_eq!(String::from_utf8(out)?, format!("{HELP}\n"));
        Ok(())
    }

    #[tokio::test]
    async fn test_grid_report() -> Result<()> {
        *TEST_LOGGING;
        let mut source = MockTimeEntrySource::new();
        source
            .expect_time_entries()
            .withf(|from, to| *from == NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() && *to == TODAY)
            .times(1)
            .returning(|_, _| {
                Ok(vec![
                    entry(1, TUESDAY, Some((time(9, 0), time(10, 30))), 1.5, ("Acme Corp", "Website", "Design")),
                    entry(2, TUESDAY, Some((time(9, 30), time(9, 40))), 0.25, ("Acme Corp", "Website", "Dev")),
                    entry(3, TUESDAY, None, 1., ("Acme Corp", "Website", "Dev")),
                ])
            });
        let mut reporter = reporter(source, 1);
        let mut out = Vec::new();

        let proceed = reporter
            .execute(Command::Report(ReportKind::Grid, Period::Week), &mut out)
            .await?;

        assert!(proceed);
        let expected = concat!(
            "Wrote 2 short codes to .clientprojecttask.json (2 new)\n",
            "  |02 Tue  \n",
            "--+--------\n",
            "09|awde    \n",
            "  |awde awd\n",
            "10|awde    \n",
            "  |awde    \n",
            "\n",
            "awd 1.25 Acme Corp Website Dev\n",
            "awde 1.50 Acme Corp Website Design\n",
            "\n",
            "TOTAL: 2.75\n",
        );
        assert_eq!(String::from_utf8(out)?, expected);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_report_reuses_codes() -> Result<()> {
        let mut source = MockTimeEntrySource::new();
        source.expect_time_entries().times(2).returning(|_, _| {
            Ok(vec![entry(1, TODAY, None, 2., ("Acme Corp", "Website", "Design"))])
        });
        let mut reporter = reporter(source, 1);

        let mut first = Vec::new();
        reporter.execute(Command::parse("ld"), &mut first).await?;
        let mut second = Vec::new();
        reporter.execute(Command::parse("ld"), &mut second).await?;

        let second = String::from_utf8(second)?;
        assert!(second.starts_with("\n=== 2024-Jan-04 Thu ===\n- 2.00 awd note 1\n"));
        assert!(second.ends_with("awd 2.00 Acme Corp Website Design\n\nTOTAL: 2.00\n"));
        assert_eq!(reporter.allocator().map().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_report_without_entries() -> Result<()> {
        let mut source = MockTimeEntrySource::new();
        source.expect_time_entries().returning(|_, _| Ok(vec![]));
        let mut reporter = reporter(source, 0);

        let mut out = Vec::new();
        reporter.execute(Command::parse("gd"), &mut out).await?;
        assert_eq!(String::from_utf8(out)?, "  \n--\n\n\nTOTAL: 0.00\n");
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_error_propagates() -> Result<()> {
        let mut source = MockTimeEntrySource::new();
        source
            .expect_time_entries()
            .returning(|_, _| Err(anyhow!("connection refused")));
        let mut reporter = reporter(source, 0);

        let error = reporter
            .execute(Command::parse("lw"), &mut Vec::new())
            .await
            .expect_err("source failed");
        assert_eq!(error.to_string(), "connection refused");
        Ok(())
    }

    #[tokio::test]
    async fn test_exhausted_codes_fail_the_report() -> Result<()> {
        let mut source = MockTimeEntrySource::new();
        source.expect_time_entries().returning(|_, _| {
            Ok(vec![entry(1, TODAY, None, 1., ("Acme", "Website", "QA"))])
        });
        let mut reporter = reporter(source, 0);

        let mut out = Vec::new();
        let error = reporter
            .execute(Command::parse("gd"), &mut out)
            .await
            .expect_err("QA can't be coded");
        assert!(error.downcast_ref::<ShortCodeError>().is_some());
        assert!(out.is_empty());
        Ok(())
    }
}
