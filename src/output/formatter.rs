use owo_colors::OwoColorize;
use rust_decimal::Decimal;
use serde_json::json;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::bonus::{FactorValue, NormalizedResult, TermBonus};
use crate::grading::Tier;
use crate::ledger::BonusRecord;

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Format a bonus with two decimals.
/// If incomplete is true, appends asterisk to indicate a fallback factor was used
pub fn format_bonus(bonus: Decimal, incomplete: bool) -> String {
    let formatted = format!("{:.2}", bonus);
    if incomplete {
        format!("{}*", formatted)
    } else {
        formatted
    }
}

fn format_factor(factor: &FactorValue) -> String {
    if factor.is_fallback() {
        format!("{} (fallback)", factor.value)
    } else {
        factor.value.to_string()
    }
}

fn paint_tier(tier: Tier, text: &str, use_colors: bool) -> String {
    if !use_colors {
        return text.to_string();
    }
    match tier {
        Tier::Best => text.green().bold().to_string(),
        Tier::Second => text.cyan().to_string(),
        Tier::Third => text.yellow().to_string(),
        Tier::Below => text.red().to_string(),
    }
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate subject to fit available width, accounting for Unicode
fn truncate_subject(subject: &str, max_width: usize) -> String {
    let chars: Vec<char> = subject.chars().collect();
    if chars.len() <= max_width {
        subject.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// Format results as a table with columns: Index, Subject, Score, Tier, Bonus
/// Index column: 3 chars (fits "99."), right-aligned
pub fn format_result_table(results: &[NormalizedResult], use_colors: bool) -> String {
    if results.is_empty() {
        return "No grades evaluated.".to_string();
    }

    // Fixed columns: index 3, score 6, tier 6, bonus 9, separators
    let fixed_width = 3 + 1 + 2 + 6 + 2 + 6 + 2 + 9;
    let subject_width = results
        .iter()
        .map(|r| r.subject.chars().count())
        .max()
        .unwrap_or(0);
    let subject_width = match get_terminal_width() {
        Some(width) if width > fixed_width + 10 => subject_width.min(width - fixed_width),
        Some(_) => subject_width.min(20),
        None => subject_width,
    };

    results
        .iter()
        .enumerate()
        .map(|(idx, result)| {
            let index_str = format!("{:>2}.", idx + 1);
            let subject = format!(
                "{:<width$}",
                truncate_subject(&result.subject, subject_width),
                width = subject_width
            );
            let score = format!("{:>6.1}", result.normalized);
            let tier = paint_tier(result.tier, &format!("{:<6}", result.tier.key()), use_colors);
            let bonus = format!("{:>9}", format_bonus(result.bonus, result.incomplete));

            if use_colors {
                format!(
                    "{} {}  {}  {}  {}",
                    index_str.dimmed(),
                    subject,
                    score,
                    tier,
                    bonus.bold()
                )
            } else {
                format!("{} {}  {}  {}  {}", index_str, subject, score, tier, bonus)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a single result with its factor breakdown (for quick grades and verbose mode)
pub fn format_result_detail(result: &NormalizedResult, use_colors: bool) -> String {
    let breakdown = &result.breakdown;
    let bucket = breakdown.level_bucket.as_deref().unwrap_or("(none)");
    let tier = paint_tier(result.tier, result.tier.key(), use_colors);
    let subject = if use_colors {
        result.subject.bold().to_string()
    } else {
        result.subject.clone()
    };

    format!(
        "{}\n  Normalized: {:.1}\n  Tier: {}\n  Tier multiplier: {}\n  Level scaling [{}]: {}\n  Core bonus: {}\n  Bonus: {}",
        subject,
        result.normalized,
        tier,
        format_factor(&breakdown.tier_multiplier),
        bucket,
        format_factor(&breakdown.level_scale),
        format_factor(&breakdown.core_bonus),
        format_bonus(result.bonus, result.incomplete),
    )
}

/// Format a term result: table, skipped entries and total
pub fn format_term(term: &TermBonus, use_colors: bool) -> String {
    let mut out = format_result_table(&term.per_entry, use_colors);

    if !term.skipped.is_empty() {
        out.push_str("\n\nSkipped:");
        for skipped in &term.skipped {
            let line = format!("\n  {} (row {}): {}", skipped.subject, skipped.index + 1, skipped.reason);
            if use_colors {
                out.push_str(&line.red().to_string());
            } else {
                out.push_str(&line);
            }
        }
    }

    let total = format!("Total bonus: {:.2}", term.total_bonus);
    out.push_str("\n\n");
    if use_colors {
        out.push_str(&total.bold().to_string());
    } else {
        out.push_str(&total);
    }
    out
}

/// Format a term result as pretty JSON for scripting
pub fn format_term_json(term: &TermBonus) -> String {
    let value = json!({
        "per_entry": term.per_entry,
        "skipped": term.skipped.iter().map(|s| json!({
            "index": s.index,
            "subject": s.subject,
            "reason": s.reason.to_string(),
        })).collect::<Vec<_>>(),
        "total_bonus": term.total_bonus,
    });
    serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
}

/// Format ledger records, one per line: id, child, subject, tier, bonus, status
pub fn format_ledger<'a, I>(records: I, use_colors: bool) -> String
where
    I: IntoIterator<Item = (u64, &'a BonusRecord)>,
{
    let lines: Vec<String> = records
        .into_iter()
        .map(|(id, record)| {
            let status = match record.settled_at {
                Some(at) => format!("settled {}", at.format("%Y-%m-%d")),
                None => "open".to_string(),
            };
            let line = format!(
                "#{:<4} {:<10} {:<16} {:<6} {:>9}  {}  {}",
                id,
                record.child.as_deref().unwrap_or("-"),
                truncate_subject(&record.subject, 16),
                record.tier.key(),
                format!("{:.2}", record.bonus),
                record.recorded_at.format("%Y-%m-%d"),
                status
            );
            if use_colors && record.is_settled() {
                line.dimmed().to_string()
            } else {
                line
            }
        })
        .collect();

    if lines.is_empty() {
        "No bonus records.".to_string()
    } else {
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bonus::{calculate_term_bonus, BonusConfig, RawGradeEntry};
    use crate::grading::{GradingSystemModel, ScaleKind};
    use crate::ledger::BonusLedger;
    use chrono::Utc;

    fn sample_term() -> TermBonus {
        let system = GradingSystemModel::new("de", ScaleKind::Numeric, 1.0, 6.0, false).unwrap();
        let table = BonusConfig::default().effective_table(None, None);
        let entries = vec![
            RawGradeEntry::new("math", "2", true),
            RawGradeEntry::new("physics", "?", false),
        ];
        calculate_term_bonus(&system, &table, 7, &entries)
    }

    #[test]
    fn test_format_bonus() {
        assert_eq!(format_bonus("3.2".parse().unwrap(), false), "3.20");
        assert_eq!(format_bonus(Decimal::ZERO, false), "0.00");
        assert_eq!(format_bonus("1.5".parse().unwrap(), true), "1.50*");
    }

    #[test]
    fn test_truncate_subject_short() {
        assert_eq!(truncate_subject("Math", 20), "Math");
    }

    #[test]
    fn test_truncate_subject_long() {
        assert_eq!(truncate_subject("Social studies and ethics", 15), "Social studi...");
    }

    #[test]
    fn test_truncate_subject_very_narrow() {
        assert_eq!(truncate_subject("Biology", 3), "Bio");
    }

    #[test]
    fn test_format_result_table_empty() {
        assert_eq!(format_result_table(&[], false), "No grades evaluated.");
    }

    #[test]
    fn test_format_term_plain() {
        let output = format_term(&sample_term(), false);
        assert!(output.contains(" 1. math"));
        assert!(output.contains("best"));
        // 0.8 * 1.5 * 1.5 + 2 = 3.80
        assert!(output.contains("3.80"));
        assert!(output.contains("Skipped:"));
        assert!(output.contains("physics (row 2)"));
        assert!(output.contains("Total bonus: 3.80"));
    }

    #[test]
    fn test_format_term_json() {
        let output = format_term_json(&sample_term());
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["per_entry"].as_array().unwrap().len(), 1);
        assert_eq!(value["skipped"][0]["subject"], "physics");
        assert_eq!(value["total_bonus"], "3.80");
    }

    #[test]
    fn test_format_result_detail() {
        let term = sample_term();
        let output = format_result_detail(&term.per_entry[0], false);
        assert!(output.starts_with("math"));
        assert!(output.contains("Normalized: 80.0"));
        assert!(output.contains("Level scaling [5-8]: 1.5"));
        assert!(output.contains("Bonus: 3.80"));
    }

    #[test]
    fn test_format_ledger() {
        let term = sample_term();
        let mut ledger = BonusLedger::new();
        let now = Utc::now();
        let id = ledger.record(None, Some("ben"), &term.per_entry[0], now);
        ledger.record(None, None, &term.per_entry[0], now);
        ledger.settle(id, now);

        let output = format_ledger(ledger.records().iter().map(|(id, r)| (*id, r)), false);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("#1"));
        assert!(lines[0].contains("ben"));
        assert!(lines[0].contains("settled"));
        assert!(lines[1].contains("open"));
    }

    #[test]
    fn test_format_ledger_empty() {
        let ledger = BonusLedger::new();
        assert_eq!(format_ledger(ledger.unsettled(None), false), "No bonus records.");
    }
}
