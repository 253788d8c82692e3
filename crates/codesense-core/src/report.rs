//! Mapping a review record to display sections
//!
//! Pure functions only: the UI decides colors and layout, this module decides
//! what goes on screen and in which order.

use crate::normalize::{normalize, Mode};
use crate::review::{format_score, ReviewRecord};

/// Severity band for the overall score, used to pick colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Good,
    Warning,
    Poor,
}

impl ScoreBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreBand::Good => "good",
            ScoreBand::Warning => "warning",
            ScoreBand::Poor => "poor",
        }
    }
}

/// Classify a score. Out-of-range scores are classified like any other
/// number; NaN counts as poor.
pub fn classify(score: f64) -> ScoreBand {
    if score >= 8.0 {
        ScoreBand::Good
    } else if score >= 5.0 {
        ScoreBand::Warning
    } else {
        ScoreBand::Poor
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportSection {
    pub title: &'static str,
    pub kind: Mode,
    /// One element for narrative sections; empty when the field was blank.
    pub items: Vec<String>,
}

impl ReportSection {
    fn new(title: &'static str, kind: Mode, text: &str) -> Self {
        Self {
            title,
            kind,
            items: normalize(text, kind),
        }
    }
}

/// The five content sections, in display order.
pub fn sections(record: &ReviewRecord) -> Vec<ReportSection> {
    vec![
        ReportSection::new("Summary", Mode::Narrative, &record.summary),
        ReportSection::new("Readability Analysis", Mode::Narrative, &record.readability),
        ReportSection::new("Modularity & Structure", Mode::Narrative, &record.modularity),
        ReportSection::new("Potential Bugs & Issues", Mode::EnumeratedList, &record.bugs),
        ReportSection::new(
            "Actionable Improvement Suggestions",
            Mode::EnumeratedList,
            &record.suggestions,
        ),
    ]
}

/// Everything a front end needs to draw a finished review.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub file_name: String,
    pub score: f64,
    pub band: ScoreBand,
    pub sections: Vec<ReportSection>,
}

impl Report {
    pub fn build(file_name: &str, record: &ReviewRecord) -> Self {
        Self {
            file_name: file_name.to_string(),
            score: record.score,
            band: classify(record.score),
            sections: sections(record),
        }
    }

    pub fn title(&self) -> String {
        format!("Review Report for {}", self.file_name)
    }

    pub fn score_label(&self) -> String {
        format!("{}/10", format_score(self.score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ReviewRecord {
        ReviewRecord {
            score: 9.0,
            summary: "Clean.".into(),
            readability: "Excellent.".into(),
            modularity: "Good.".into(),
            bugs: "1. None found".into(),
            suggestions: "* Add type hints".into(),
        }
    }

    #[test]
    fn test_classify_thresholds() {
        assert_eq!(classify(8.0), ScoreBand::Good);
        assert_eq!(classify(7.9), ScoreBand::Warning);
        assert_eq!(classify(5.0), ScoreBand::Warning);
        assert_eq!(classify(4.9), ScoreBand::Poor);
        assert_eq!(classify(0.0), ScoreBand::Poor);
        assert_eq!(classify(10.0), ScoreBand::Good);
    }

    #[test]
    fn test_score_label_keeps_precision() {
        let mut r = record();
        r.score = 7.96;
        let report = Report::build("main.py", &r);
        assert_eq!(report.score_label(), "7.96/10");
        assert_eq!(report.band, ScoreBand::Warning);

        r.score = 1e20;
        assert_eq!(Report::build("main.py", &r).score_label(), "100000000000000000000/10");
    }

    #[test]
    fn test_classify_does_not_clamp() {
        assert_eq!(classify(42.0), ScoreBand::Good);
        assert_eq!(classify(-3.0), ScoreBand::Poor);
        assert_eq!(classify(f64::NAN), ScoreBand::Poor);
    }

    #[test]
    fn test_section_order_and_kinds() {
        let sections = sections(&record());
        let titles: Vec<_> = sections.iter().map(|s| s.title).collect();
        assert_eq!(
            titles,
            vec![
                "Summary",
                "Readability Analysis",
                "Modularity & Structure",
                "Potential Bugs & Issues",
                "Actionable Improvement Suggestions",
            ]
        );
        assert_eq!(sections[0].kind, Mode::Narrative);
        assert_eq!(sections[3].kind, Mode::EnumeratedList);
        assert_eq!(sections[3].items, vec!["None found"]);
        assert_eq!(sections[4].items, vec!["Add type hints"]);
    }

    #[test]
    fn test_blank_list_has_no_items() {
        let mut r = record();
        r.bugs = "\n".into();
        assert!(sections(&r)[3].items.is_empty());
    }

    #[test]
    fn test_report_header() {
        let report = Report::build("main.py", &record());
        assert_eq!(report.band, ScoreBand::Good);
        assert_eq!(report.title(), "Review Report for main.py");
        assert_eq!(report.score_label(), "9/10");
    }
}
