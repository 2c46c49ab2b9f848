#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Ping,
    Translate,
    Languages,
    Stats,
    Contribute,
    ContributionsList,
    ContributionStatus,
    Unknown,
}

impl From<&str> for Command {
    fn from(s: &str) -> Self {
        match s {
            "ping" => Command::Ping,
            "translate" => Command::Translate,
            "languages" => Command::Languages,
            "stats" => Command::Stats,
            "contribute" => Command::Contribute,
            "contributions.list" => Command::ContributionsList,
            "contributions.status" => Command::ContributionStatus,
            _ => Command::Unknown,
        }
    }
}
