use serde::{Deserialize, Serialize};

/// Kind of a component row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Qualifier {
    /// A project, or a project copy when it lives inside a portfolio tree
    #[serde(rename = "TRK")]
    Project,
    /// An application (aggregates projects)
    #[serde(rename = "APP")]
    Application,
    /// A top-level portfolio
    #[serde(rename = "VW")]
    Portfolio,
    /// A sub-portfolio inside a portfolio tree
    #[serde(rename = "SVW")]
    SubPortfolio,
    #[serde(rename = "DIR")]
    Directory,
    #[serde(rename = "FIL")]
    File,
    #[serde(rename = "UTS")]
    TestFile,
}

impl Qualifier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Qualifier::Project => "TRK",
            Qualifier::Application => "APP",
            Qualifier::Portfolio => "VW",
            Qualifier::SubPortfolio => "SVW",
            Qualifier::Directory => "DIR",
            Qualifier::File => "FIL",
            Qualifier::TestFile => "UTS",
        }
    }

    /// Qualifiers that may head a component tree.
    pub fn is_root_kind(&self) -> bool {
        matches!(
            self,
            Qualifier::Project | Qualifier::Application | Qualifier::Portfolio
        )
    }
}

impl std::fmt::Display for Qualifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Qualifier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TRK" => Ok(Qualifier::Project),
            "APP" => Ok(Qualifier::Application),
            "VW" => Ok(Qualifier::Portfolio),
            "SVW" => Ok(Qualifier::SubPortfolio),
            "DIR" => Ok(Qualifier::Directory),
            "FIL" => Ok(Qualifier::File),
            "UTS" => Ok(Qualifier::TestFile),
            _ => Err(format!("Invalid qualifier: {}", s)),
        }
    }
}

/// Scope of a component row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentScope {
    #[serde(rename = "PRJ")]
    Project,
    #[serde(rename = "DIR")]
    Directory,
    #[serde(rename = "FIL")]
    File,
}

impl ComponentScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentScope::Project => "PRJ",
            ComponentScope::Directory => "DIR",
            ComponentScope::File => "FIL",
        }
    }
}

impl std::fmt::Display for ComponentScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ComponentScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PRJ" => Ok(ComponentScope::Project),
            "DIR" => Ok(ComponentScope::Directory),
            "FIL" => Ok(ComponentScope::File),
            _ => Err(format!("Invalid component scope: {}", s)),
        }
    }
}

/// A component of a portfolio tree, as handed to view maintenance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewComponent {
    pub uuid: String,
    pub scope: ComponentScope,
    pub qualifier: Qualifier,
    /// Set on project copies: the component the copy points at
    pub copy_component_uuid: Option<String>,
}

impl ViewComponent {
    /// Roots (projects, applications, portfolios) are never removed by view maintenance.
    pub fn is_root(&self) -> bool {
        self.scope == ComponentScope::Project
            && self.qualifier.is_root_kind()
            && !self.is_project_copy()
    }

    pub fn is_project_copy(&self) -> bool {
        self.copy_component_uuid.is_some()
    }
}
