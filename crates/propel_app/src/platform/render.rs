use std::io::{self, Write};

use propel_core::{IdeaRecord, PopupStatus, PopupViewModel};
use propel_engine::{GeneratedIdeas, HistoryEntry};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Writes the popup's current state. Status lines go to `out` as they change.
pub fn render_view(out: &mut impl Write, view: &PopupViewModel) -> io::Result<()> {
    match &view.status {
        PopupStatus::Ready => writeln!(out, "Ready."),
        PopupStatus::Requested => writeln!(out, "Reading page..."),
        PopupStatus::Processing { message } => writeln!(out, "{message}"),
        PopupStatus::Error { message } => writeln!(out, "Error: {message}"),
        PopupStatus::Ideas => render_ideas(out, &view.ideas),
    }
}

fn render_ideas(out: &mut impl Write, ideas: &[IdeaRecord]) -> io::Result<()> {
    for (index, idea) in ideas.iter().enumerate() {
        if index > 0 {
            writeln!(out)?;
        }
        writeln!(out, "{}. {}", index + 1, idea.name)?;
        writeln!(out, "   Problem:  {}", idea.problem)?;
        writeln!(out, "   Solution: {}", idea.solution)?;
    }
    Ok(())
}

pub fn render_history(out: &mut impl Write, entries: &[HistoryEntry]) -> io::Result<()> {
    if entries.is_empty() {
        return writeln!(out, "No ideas yet.");
    }
    for entry in entries {
        let star = if entry.starred() { "*" } else { " " };
        let name = entry.name.as_deref().unwrap_or("(untitled)");
        let when = entry
            .generated_at
            .map(|at| at.format(DATE_FORMAT).to_string())
            .unwrap_or_else(|| "-".to_string());
        let id = entry.id;
        writeln!(out, "{star} #{id:<5} {when:<16}  {name}")?;
        if let Some(source) = entry.source_url.as_deref() {
            writeln!(out, "         from {source}")?;
        }
    }
    Ok(())
}

pub fn render_generated(out: &mut impl Write, generated: &GeneratedIdeas) -> io::Result<()> {
    for idea in &generated.ideas {
        writeln!(out, "#{}", idea.id)?;
        if let Some(result) = idea.result.as_deref() {
            writeln!(out, "{}", result.trim_end())?;
        }
    }
    if let Some(credits) = generated.credits_remaining {
        writeln!(out, "Credits remaining: {credits}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use propel_core::{IdeaRecord, PopupStatus, PopupViewModel};
    use propel_engine::HistoryEntry;

    use super::{render_history, render_view};

    fn rendered(view: &PopupViewModel) -> String {
        let mut out = Vec::new();
        render_view(&mut out, view).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn ideas_are_numbered_with_problem_and_solution() {
        let view = PopupViewModel {
            status: PopupStatus::Ideas,
            ideas: vec![
                IdeaRecord {
                    name: "X".into(),
                    problem: "P".into(),
                    solution: "S".into(),
                },
                IdeaRecord {
                    name: "Y".into(),
                    problem: "Q".into(),
                    solution: "T".into(),
                },
            ],
            ..PopupViewModel::default()
        };
        let text = rendered(&view);
        assert!(text.starts_with("1. X\n   Problem:  P\n   Solution: S\n"));
        assert!(text.contains("\n2. Y\n"));
    }

    #[test]
    fn errors_and_progress_are_single_lines() {
        let error = PopupViewModel {
            status: PopupStatus::Error {
                message: "model overloaded".into(),
            },
            ..PopupViewModel::default()
        };
        assert_eq!(rendered(&error), "Error: model overloaded\n");

        let processing = PopupViewModel {
            status: PopupStatus::Processing {
                message: "Analyzing page content...".into(),
            },
            ..PopupViewModel::default()
        };
        assert_eq!(rendered(&processing), "Analyzing page content...\n");
    }

    #[test]
    fn history_marks_starred_entries_and_formats_dates() {
        let entries = vec![HistoryEntry {
            id: 7,
            name: Some("Fleet Fix".into()),
            problem: None,
            solution: None,
            source_url: Some("https://example.com/a".into()),
            result: None,
            is_starred: Some(true),
            generated_at: NaiveDate::from_ymd_opt(2024, 3, 9)
                .and_then(|d| d.and_hms_opt(14, 5, 0)),
        }];
        let mut out = Vec::new();
        render_history(&mut out, &entries).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("* #7     2024-03-09 14:05  Fleet Fix\n"));
        assert!(text.contains("from https://example.com/a"));
    }

    #[test]
    fn empty_history_says_so() {
        let mut out = Vec::new();
        render_history(&mut out, &[]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "No ideas yet.\n");
    }
}
