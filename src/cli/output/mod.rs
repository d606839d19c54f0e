//! Text reports. Both the list and the grid report end with the same legend, see
//! [write_legend].

pub mod grid;
pub mod list;

use std::{
    collections::BTreeMap,
    io::{self, Write},
};

use crate::entities::AnnotatedEntry;

/// Sum of hours per short code, followed by the grand total. Names come from the first entry
/// with each code.
pub fn write_legend(entries: &[AnnotatedEntry], out: &mut impl Write) -> io::Result<()> {
    let mut by_code = BTreeMap::<&str, (&AnnotatedEntry, f64)>::new();
    for annotated in entries {
        by_code
            .entry(annotated.short_code.as_str())
            .or_insert((annotated, 0.))
            .1 += annotated.entry.hours;
    }

    writeln!(out)?;
    for (code, (first, hours)) in by_code {
        let entry = &first.entry;
        writeln!(
            out,
            "{code} {hours:.2} {} {} {}",
            entry.client.name, entry.project.name, entry.task.name
        )?;
    }

    writeln!(out)?;
    let total = entries.iter().fold(0., |total, v| total + v.entry.hours);
    writeln!(out, "TOTAL: {total:.2}")
}
