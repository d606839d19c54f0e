use std::{
    collections::BTreeMap,
    io::{self, Write},
};

use chrono::NaiveTime;

use crate::entities::AnnotatedEntry;

fn clock(time: Option<NaiveTime>) -> String {
    time.map(|v| v.format("%I%M%P").to_string()).unwrap_or_default()
}

/// Entries grouped per day, each day ordered by start time. Entries without a start come first.
pub fn write_list(entries: &[AnnotatedEntry], out: &mut impl Write) -> io::Result<()> {
    let mut by_date = BTreeMap::<_, Vec<&AnnotatedEntry>>::new();
    for annotated in entries {
        by_date.entry(annotated.entry.spent_date).or_default().push(annotated);
    }

    for (date, mut day) in by_date {
        day.sort_by_key(|v| v.entry.started_time);
        writeln!(out)?;
        writeln!(out, "=== {} ===", date.format("%Y-%b-%d %a"))?;
        for annotated in day {
            let entry = &annotated.entry;
            writeln!(
                out,
                "{}-{} {:.2} {} {}",
                clock(entry.started_time),
                clock(entry.ended_time),
                entry.hours,
                annotated.short_code,
                entry.notes.as_deref().unwrap_or_default(),
            )?;
        }
    }
    Ok(())
}
