use chrono::{TimeZone, Utc};

use presshub_core::agency::Agency;
use presshub_core::types::{DomainError, Editor, Issue, Newspaper, Subscriber};

/// Populates an empty registry with the demo fixtures used during
/// development: four papers with two issues each, four editors and four
/// subscribers.
pub fn seed_demo_data(agency: &mut Agency) -> Result<(), DomainError> {
    for paper in [
        Newspaper::new(100, "The New York Times", 7, 13.14),
        Newspaper::new(101, "Heute", 1, 1.12),
        Newspaper::new(115, "Wall Street Journal", 1, 3.00),
        Newspaper::new(125, "National Geographic", 30, 34.00),
    ] {
        agency.add_newspaper(paper)?;
    }

    for editor in [
        Editor::new(100, "William Shakespeare"),
        Editor::new(101, "Agatha Christie"),
        Editor::new(102, "J. K. Rowling"),
        Editor::new(103, "Stephen King"),
    ] {
        agency.add_editor(editor)?;
    }

    for subscriber in [
        Subscriber::new(100, "Sophia Nguyen"),
        Subscriber::new(101, "Elijah Patel"),
        Subscriber::new(102, "Olivia Mitchell"),
        Subscriber::new(103, "Gabriel Taylor"),
    ] {
        agency.add_subscriber(subscriber)?;
    }

    let released = Utc
        .with_ymd_and_hms(2022, 4, 4, 0, 0, 0)
        .single()
        .unwrap_or_default();
    let pending = Utc
        .with_ymd_and_hms(2025, 5, 5, 0, 0, 0)
        .single()
        .unwrap_or_default();
    for paper_id in [100, 101, 115, 125] {
        if let Some(paper) = agency.get_newspaper_mut(paper_id) {
            paper.add_issue(Issue::new(100, "Vol. 1", released, true))?;
            paper.add_issue(Issue::new(102, "Vol. 2", pending, false))?;
        }
    }

    Ok(())
}
