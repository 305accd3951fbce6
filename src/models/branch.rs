use serde::{Deserialize, Serialize};

/// Kind of a project branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BranchType {
    Main,
    Branch,
    PullRequest,
}

impl BranchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BranchType::Main => "MAIN",
            BranchType::Branch => "BRANCH",
            BranchType::PullRequest => "PULL_REQUEST",
        }
    }

    /// Only plain branches honour `exclude_from_purge`. Pull requests never do,
    /// and main branches are protected independently.
    pub fn honours_exclude_from_purge(&self) -> bool {
        matches!(self, BranchType::Branch)
    }
}

impl std::fmt::Display for BranchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BranchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MAIN" => Ok(BranchType::Main),
            "BRANCH" => Ok(BranchType::Branch),
            "PULL_REQUEST" => Ok(BranchType::PullRequest),
            _ => Err(format!("Invalid branch type: {}", s)),
        }
    }
}
