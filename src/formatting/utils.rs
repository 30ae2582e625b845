use std::collections::BTreeSet;

use colored::*;

use crate::orchestrator::OperationStatus;

pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

pub fn format_id_set(ids: &BTreeSet<String>) -> String {
    if ids.is_empty() {
        "none".to_string()
    } else {
        ids.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}

pub fn format_status(status: &OperationStatus) -> ColoredString {
    match status {
        OperationStatus::Success => "SUCCESS".green().bold(),
        OperationStatus::PartialSuccess { .. } => "PARTIAL SUCCESS".yellow().bold(),
        OperationStatus::Failure => "FAILED".red().bold(),
    }
}

pub fn yes_no(value: bool) -> ColoredString {
    if value {
        "yes".green()
    } else {
        "no".dimmed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
        assert_eq!(truncate("ééééé", 4), "é...");
    }

    #[test]
    fn test_format_id_set() {
        let empty = BTreeSet::new();
        assert_eq!(format_id_set(&empty), "none");
        let ids: BTreeSet<String> = ["T2", "T1"].iter().map(|s| s.to_string()).collect();
        assert_eq!(format_id_set(&ids), "T1, T2");
    }
}
