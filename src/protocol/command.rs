#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Ping,
    NormalizeUrl,
    ClassifyEntry,
    ExtractEntries,
    BuildTemplates,
    CalculateVersion,
    Unknown,
}

impl From<&str> for Command {
    fn from(s: &str) -> Self {
        match s {
            "ping" => Command::Ping,
            "normalize_url" => Command::NormalizeUrl,
            "classify_entry" => Command::ClassifyEntry,
            "extract_entries" => Command::ExtractEntries,
            "build_templates" => Command::BuildTemplates,
            "calculate_version" => Command::CalculateVersion,
            _ => Command::Unknown,
        }
    }
}
