use std::io::{self, Write};

use chrono::{NaiveDate, NaiveTime};

use crate::{
    entities::AnnotatedEntry,
    utils::{sparse_table::SparseTable, time::hours_of_day},
};

/// Half-hour slot of a day. 0 is 00:00-00:30 and 47 is 23:30-24:00, although nothing keeps an
/// index inside that range.
pub type Bucket = i32;

/// Rounds to the nearest half hour, ties go to the even bucket.
pub fn bucket_of(time: NaiveTime) -> Bucket {
    (hours_of_day(time) * 2.).round_ties_even() as Bucket
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridColumn {
    pub date: NaiveDate,
    pub header: String,
    pub width: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridRow {
    pub bucket: Bucket,
    pub label: String,
}

/// Codes of every entry overlapping each (date, bucket), in the order the entries were placed.
pub fn place_entries(entries: &[AnnotatedEntry]) -> SparseTable<NaiveDate, Bucket, Vec<String>> {
    let mut ordered = entries
        .iter()
        .filter(|v| v.entry.span().is_some())
        .collect::<Vec<_>>();
    ordered.sort_by_key(|v| (v.entry.spent_date, v.entry.started_time));

    let mut codes = SparseTable::new();
    for annotated in ordered {
        let Some((start, end)) = annotated.entry.span() else {
            continue;
        };
        for bucket in bucket_of(start)..=bucket_of(end) {
            codes.update(annotated.entry.spent_date, bucket, |mut v: Vec<String>| {
                v.push(annotated.short_code.clone());
                v
            });
        }
    }
    codes
}

fn header(date: NaiveDate) -> String {
    date.format("%d %a").to_string()
}

fn row_label(bucket: Bucket) -> String {
    if bucket % 2 == 0 {
        format!("{:02}", bucket / 2)
    } else {
        "  ".to_string()
    }
}

/// Schedule of a range of days: one column per day with entries, one row per half hour that any
/// entry touches.
#[derive(Debug)]
pub struct ScheduleGrid {
    cells: SparseTable<NaiveDate, Bucket, String>,
    columns: Vec<GridColumn>,
    rows: Vec<GridRow>,
}

impl ScheduleGrid {
    pub fn build(entries: &[AnnotatedEntry]) -> Self {
        Self::from_codes(&place_entries(entries))
    }

    pub fn from_codes(codes: &SparseTable<NaiveDate, Bucket, Vec<String>>) -> Self {
        let mut dates = codes.row_keys().copied().collect::<Vec<_>>();
        dates.sort();

        let mut cells = SparseTable::new();
        let mut columns = Vec::with_capacity(dates.len());
        for date in dates {
            let header = header(date);
            let mut width = header.chars().count();
            for &bucket in codes.col_keys() {
                let joined = codes
                    .try_get(&date, &bucket)
                    .map(|v| v.join(" "))
                    .unwrap_or_default();
                width = width.max(joined.chars().count());
                cells.set(date, bucket, joined);
            }
            columns.push(GridColumn {
                date,
                header,
                width,
            });
        }

        let rows = codes
            .col_keys()
            .map(|&bucket| GridRow {
                bucket,
                label: row_label(bucket),
            })
            .collect();

        Self {
            cells,
            columns,
            rows,
        }
    }

    pub fn columns(&self) -> &[GridColumn] {
        &self.columns
    }

    pub fn rows(&self) -> &[GridRow] {
        &self.rows
    }

    /// Space separated codes in a cell, empty when nothing overlaps it.
    pub fn cell(&self, date: NaiveDate, bucket: Bucket) -> String {
        self.cells.get(&date, &bucket)
    }

    pub fn render(&self, out: &mut impl Write) -> io::Result<()> {
        write!(out, "  ")?;
        for column in &self.columns {
            write!(out, "|{:<width$}", column.header, width = column.width)?;
        }
        writeln!(out)?;

        write!(out, "--")?;
        for column in &self.columns {
            write!(out, "+{}", "-".repeat(column.width))?;
        }
        writeln!(out)?;

        for row in &self.rows {
            write!(out, "{}", row.label)?;
            for column in &self.columns {
                let cell = self.cell(column.date, row.bucket);
                write!(out, "|{:<width$}", cell, width = column.width)?;
            }
            writeln!(out)?;
        }
        Ok(())
    }
}
