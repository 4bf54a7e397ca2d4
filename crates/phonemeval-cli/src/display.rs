//! Console rendering of confusion rankings and the classification report.

use phonemeval_ai::{ClassificationReport, ConfusedPair};

pub const DEFAULT_TOP: usize = 10;
pub const DEFAULT_PRECISION_THRESHOLD: f64 = 0.75;

/// Print the `top` most frequent confusions.
pub fn print_confused_pairs(pairs: &[ConfusedPair<'_>], top: usize) {
    print!("{}", render_confused_pairs(pairs, top));
}

/// Print every label whose precision is below `threshold`.
pub fn print_low_precision(report: &ClassificationReport, threshold: f64) {
    print!("{}", render_low_precision(report, threshold));
}

/// Print the full per-label table with accuracy and averages.
pub fn print_report(report: &ClassificationReport) {
    print!("{}", render_report(report));
}

fn render_confused_pairs(pairs: &[ConfusedPair<'_>], top: usize) -> String {
    let mut out = format!("🔎 Top {top} Most Confused Phoneme Pairs:\n");
    for p in pairs.iter().take(top) {
        out.push_str(&format!(
            "  - {} mistaken as {}: {} times\n",
            p.true_label, p.predicted_label, p.count
        ));
    }
    out
}

fn render_low_precision(report: &ClassificationReport, threshold: f64) -> String {
    let mut out = format!("⚠️ Phonemes with Lowest Precision (under {threshold}):\n");
    for m in report.low_precision(threshold) {
        out.push_str(&format!("  - {}: precision = {:.2}\n", m.label, m.precision));
    }
    out
}

fn render_report(report: &ClassificationReport) -> String {
    let width = report
        .labels
        .iter()
        .map(|m| m.label.len())
        .chain(["weighted avg".len()])
        .max()
        .unwrap_or(0);

    let mut out = format!(
        "{:>width$}  {:>9} {:>9} {:>9} {:>9}\n\n",
        "", "precision", "recall", "f1-score", "support"
    );
    for m in &report.labels {
        out.push_str(&format!(
            "{:>width$}  {:>9.2} {:>9.2} {:>9.2} {:>9}\n",
            m.label, m.precision, m.recall, m.f1, m.support
        ));
    }
    out.push('\n');
    out.push_str(&format!(
        "{:>width$}  {:>9} {:>9} {:>9.2} {:>9}\n",
        "accuracy", "", "", report.accuracy, report.weighted_avg.support
    ));
    for (name, avg) in [
        ("macro avg", &report.macro_avg),
        ("weighted avg", &report.weighted_avg),
    ] {
        out.push_str(&format!(
            "{:>width$}  {:>9.2} {:>9.2} {:>9.2} {:>9}\n",
            name, avg.precision, avg.recall, avg.f1, avg.support
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use phonemeval_ai::{ConfusionMatrix, LabelEncoder};

    fn report() -> (LabelEncoder, ConfusionMatrix) {
        let le = LabelEncoder::new(vec!["AA".into(), "IY".into(), "UW".into()]).unwrap();
        // AA always right; IY twice mistaken as UW, once right; UW once as IY.
        let cm = ConfusionMatrix::from_predictions(
            &[0, 0, 1, 1, 1, 2, 2],
            &[0, 0, 2, 2, 1, 1, 2],
            3,
        )
        .unwrap();
        (le, cm)
    }

    #[test]
    fn confused_pairs_lines() {
        let (le, cm) = report();
        let text = render_confused_pairs(&cm.confused_pairs(&le), 10);
        assert_eq!(
            text,
            "🔎 Top 10 Most Confused Phoneme Pairs:\n\
             \x20 - IY mistaken as UW: 2 times\n\
             \x20 - UW mistaken as IY: 1 times\n"
        );
    }

    #[test]
    fn confused_pairs_truncated_to_top() {
        let (le, cm) = report();
        let text = render_confused_pairs(&cm.confused_pairs(&le), 1);
        assert!(text.starts_with("🔎 Top 1 Most"));
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn low_precision_lines() {
        let (le, cm) = report();
        let report = ClassificationReport::from_confusion(&cm, &le);
        // IY: 1 of 2 predictions right; UW: 1 of 3.
        assert_eq!(
            render_low_precision(&report, 0.75),
            "⚠️ Phonemes with Lowest Precision (under 0.75):\n\
             \x20 - IY: precision = 0.50\n\
             \x20 - UW: precision = 0.33\n"
        );
    }

    #[test]
    fn report_table_has_rows_and_averages() {
        let (le, cm) = report();
        let text = render_report(&ClassificationReport::from_confusion(&cm, &le));
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].contains("precision") && lines[0].ends_with("support"));
        assert!(lines[2].trim_start().starts_with("AA"));
        assert!(text.contains("accuracy"));
        assert!(text.contains("macro avg"));
        assert!(lines.last().unwrap().trim_start().starts_with("weighted avg"));
    }
}
