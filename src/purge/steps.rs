//! Ordered deletion steps.
//!
//! Each cascade is a list of set-based statements run in order. `{ids}`
//! expands to the identifiers the step targets. Dependent rows always come
//! before the rows they hang off, and a row is only removed through its own
//! parent: an event-component-change goes with its event, never because the
//! component it mentions is deleted.

/// Which identifiers a step is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepTarget {
    /// The root (or the listed ids)
    Root,
    /// The root and its sub-portfolios
    RootAndSubviews,
}

#[derive(Debug, Clone, Copy)]
pub struct DeletionStep {
    pub name: &'static str,
    pub target: StepTarget,
    pub sql: &'static str,
}

const fn step(name: &'static str, sql: &'static str) -> DeletionStep {
    DeletionStep {
        name,
        target: StepTarget::Root,
        sql,
    }
}

const fn subview_step(name: &'static str, sql: &'static str) -> DeletionStep {
    DeletionStep {
        name,
        target: StepTarget::RootAndSubviews,
        sql,
    }
}

/// Identifiers a cascade runs against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetIds {
    pub root: Vec<String>,
    pub root_and_subviews: Vec<String>,
}

impl TargetIds {
    /// Both targets bound to the same ids.
    pub fn listed(ids: &[String]) -> Self {
        Self {
            root: ids.to_vec(),
            root_and_subviews: ids.to_vec(),
        }
    }

    pub fn for_target(&self, target: StepTarget) -> &[String] {
        match target {
            StepTarget::Root => &self.root,
            StepTarget::RootAndSubviews => &self.root_and_subviews,
        }
    }
}

/// Everything hanging off a branch or portfolio root, then the root itself.
pub const ROOT_CASCADE: &[DeletionStep] = &[
    // Component-scoped satellites
    step(
        "live_measures",
        "DELETE FROM measures WHERE branch_uuid IN ({ids}) OR component_uuid IN ({ids})",
    ),
    step(
        "file_sources",
        "DELETE FROM file_sources WHERE project_uuid IN ({ids})",
    ),
    step(
        "duplications_index",
        "DELETE FROM duplications_index WHERE analysis_uuid IN \
         (SELECT uuid FROM snapshots WHERE root_component_uuid IN ({ids}))",
    ),
    step(
        "scanner_analysis_cache",
        "DELETE FROM scanner_analysis_cache WHERE branch_uuid IN ({ids})",
    ),
    step(
        "webhook_deliveries",
        "DELETE FROM webhook_deliveries WHERE project_uuid IN ({ids}) OR webhook_uuid IN \
         (SELECT uuid FROM webhooks WHERE project_uuid IN ({ids}))",
    ),
    step(
        "webhooks",
        "DELETE FROM webhooks WHERE project_uuid IN ({ids})",
    ),
    step(
        "project_alm_settings",
        "DELETE FROM project_alm_settings WHERE project_uuid IN ({ids})",
    ),
    step(
        "project_badge_token",
        "DELETE FROM project_badge_token WHERE project_uuid IN ({ids})",
    ),
    step(
        "user_dismissed_messages",
        "DELETE FROM user_dismissed_messages WHERE project_uuid IN ({ids})",
    ),
    step(
        "project_links",
        "DELETE FROM project_links WHERE project_uuid IN ({ids})",
    ),
    subview_step(
        "user_roles",
        "DELETE FROM user_roles WHERE entity_uuid IN ({ids})",
    ),
    subview_step(
        "group_roles",
        "DELETE FROM group_roles WHERE entity_uuid IN ({ids})",
    ),
    subview_step(
        "properties",
        "DELETE FROM properties WHERE entity_uuid IN ({ids})",
    ),
    step(
        "new_code_periods",
        "DELETE FROM new_code_periods WHERE branch_uuid IN ({ids}) OR project_uuid IN ({ids})",
    ),
    subview_step(
        "report_subscriptions",
        "DELETE FROM report_subscriptions WHERE portfolio_uuid IN ({ids}) OR branch_uuid IN ({ids})",
    ),
    subview_step(
        "report_schedules",
        "DELETE FROM report_schedules WHERE portfolio_uuid IN ({ids}) OR branch_uuid IN ({ids})",
    ),
    step(
        "sca_vulnerabilities",
        "DELETE FROM sca_vulnerabilities WHERE sca_release_uuid IN \
         (SELECT uuid FROM sca_releases WHERE component_uuid IN ({ids}))",
    ),
    step(
        "sca_dependencies",
        "DELETE FROM sca_dependencies WHERE sca_release_uuid IN \
         (SELECT uuid FROM sca_releases WHERE component_uuid IN ({ids}))",
    ),
    step(
        "sca_releases",
        "DELETE FROM sca_releases WHERE component_uuid IN ({ids})",
    ),
    step(
        "sca_analyses",
        "DELETE FROM sca_analyses WHERE component_uuid IN ({ids})",
    ),
    step(
        "architecture_graphs",
        "DELETE FROM architecture_graphs WHERE branch_uuid IN ({ids})",
    ),
    // Issues
    step(
        "issue_changes",
        "DELETE FROM issue_changes WHERE issue_key IN \
         (SELECT kee FROM issues WHERE project_uuid IN ({ids}))",
    ),
    step(
        "new_code_reference_issues",
        "DELETE FROM new_code_reference_issues WHERE issue_key IN \
         (SELECT kee FROM issues WHERE project_uuid IN ({ids}))",
    ),
    step(
        "issues_impacts",
        "DELETE FROM issues_impacts WHERE issue_key IN \
         (SELECT kee FROM issues WHERE project_uuid IN ({ids}))",
    ),
    step("issues", "DELETE FROM issues WHERE project_uuid IN ({ids})"),
    // Events, by owner
    step(
        "event_component_changes",
        "DELETE FROM event_component_changes WHERE event_component_uuid IN ({ids}) \
         OR event_analysis_uuid IN (SELECT uuid FROM snapshots WHERE root_component_uuid IN ({ids})) \
         OR event_uuid IN (SELECT uuid FROM events WHERE component_uuid IN ({ids}))",
    ),
    step(
        "events",
        "DELETE FROM events WHERE component_uuid IN ({ids}) OR analysis_uuid IN \
         (SELECT uuid FROM snapshots WHERE root_component_uuid IN ({ids}))",
    ),
    // Background tasks, queued or finished
    step(
        "ce_task_input",
        "DELETE FROM ce_task_input WHERE task_uuid IN \
         (SELECT uuid FROM ce_activity WHERE entity_uuid IN ({ids}) OR component_uuid IN ({ids}) \
          UNION SELECT uuid FROM ce_queue WHERE entity_uuid IN ({ids}) OR component_uuid IN ({ids}))",
    ),
    step(
        "ce_scanner_context",
        "DELETE FROM ce_scanner_context WHERE task_uuid IN \
         (SELECT uuid FROM ce_activity WHERE entity_uuid IN ({ids}) OR component_uuid IN ({ids}) \
          UNION SELECT uuid FROM ce_queue WHERE entity_uuid IN ({ids}) OR component_uuid IN ({ids}))",
    ),
    step(
        "ce_task_characteristics",
        "DELETE FROM ce_task_characteristics WHERE task_uuid IN \
         (SELECT uuid FROM ce_activity WHERE entity_uuid IN ({ids}) OR component_uuid IN ({ids}) \
          UNION SELECT uuid FROM ce_queue WHERE entity_uuid IN ({ids}) OR component_uuid IN ({ids}))",
    ),
    step(
        "ce_task_message",
        "DELETE FROM ce_task_message WHERE task_uuid IN \
         (SELECT uuid FROM ce_activity WHERE entity_uuid IN ({ids}) OR component_uuid IN ({ids}) \
          UNION SELECT uuid FROM ce_queue WHERE entity_uuid IN ({ids}) OR component_uuid IN ({ids}))",
    ),
    step(
        "ce_activity",
        "DELETE FROM ce_activity WHERE entity_uuid IN ({ids}) OR component_uuid IN ({ids})",
    ),
    step(
        "ce_queue",
        "DELETE FROM ce_queue WHERE entity_uuid IN ({ids}) OR component_uuid IN ({ids})",
    ),
    // Analyses
    step(
        "project_measures",
        "DELETE FROM project_measures WHERE analysis_uuid IN \
         (SELECT uuid FROM snapshots WHERE root_component_uuid IN ({ids})) \
         OR component_uuid IN (SELECT uuid FROM components WHERE branch_uuid IN ({ids}))",
    ),
    step(
        "analysis_properties",
        "DELETE FROM analysis_properties WHERE analysis_uuid IN \
         (SELECT uuid FROM snapshots WHERE root_component_uuid IN ({ids}))",
    ),
    step(
        "snapshots",
        "DELETE FROM snapshots WHERE root_component_uuid IN ({ids})",
    ),
    // Tree and branch
    step(
        "components",
        "DELETE FROM components WHERE branch_uuid IN ({ids}) OR uuid IN ({ids})",
    ),
    step(
        "app_branch_project_branch",
        "DELETE FROM app_branch_project_branch \
         WHERE project_branch_uuid IN ({ids}) OR application_branch_uuid IN ({ids})",
    ),
    step(
        "portfolio_proj_branches",
        "DELETE FROM portfolio_proj_branches WHERE branch_uuid IN ({ids})",
    ),
    step(
        "project_branches",
        "DELETE FROM project_branches WHERE uuid IN ({ids})",
    ),
];

/// Membership rows and the project, application or portfolio row of an entity.
///
/// Runs after every branch of the entity went through [`ROOT_CASCADE`].
pub const ENTITY_CASCADE: &[DeletionStep] = &[
    step(
        "app_branch_project_branch",
        "DELETE FROM app_branch_project_branch \
         WHERE application_uuid IN ({ids}) OR project_uuid IN ({ids})",
    ),
    step(
        "app_projects",
        "DELETE FROM app_projects WHERE application_uuid IN ({ids}) OR project_uuid IN ({ids})",
    ),
    step(
        "portfolio_proj_branches",
        "DELETE FROM portfolio_proj_branches WHERE portfolio_project_uuid IN \
         (SELECT uuid FROM portfolio_projects WHERE portfolio_uuid IN ({ids}) OR project_uuid IN ({ids}))",
    ),
    step(
        "portfolio_projects",
        "DELETE FROM portfolio_projects WHERE portfolio_uuid IN ({ids}) OR project_uuid IN ({ids})",
    ),
    step(
        "project_branches",
        "DELETE FROM project_branches WHERE project_uuid IN ({ids})",
    ),
    step("projects", "DELETE FROM projects WHERE uuid IN ({ids})"),
];

/// Analyses and what is rooted at them.
pub const ANALYSIS_CASCADE: &[DeletionStep] = &[
    step(
        "event_component_changes",
        "DELETE FROM event_component_changes WHERE event_analysis_uuid IN ({ids}) \
         OR event_uuid IN (SELECT uuid FROM events WHERE analysis_uuid IN ({ids}))",
    ),
    step("events", "DELETE FROM events WHERE analysis_uuid IN ({ids})"),
    step(
        "project_measures",
        "DELETE FROM project_measures WHERE analysis_uuid IN ({ids})",
    ),
    step(
        "duplications_index",
        "DELETE FROM duplications_index WHERE analysis_uuid IN ({ids})",
    ),
    step(
        "analysis_properties",
        "DELETE FROM analysis_properties WHERE analysis_uuid IN ({ids})",
    ),
    step("snapshots", "DELETE FROM snapshots WHERE uuid IN ({ids})"),
];

/// Analyses kept by thinning lose their duplication data and are marked purged.
pub const ANALYSIS_PURGE_MARKING: &[DeletionStep] = &[
    step(
        "duplications_index",
        "DELETE FROM duplications_index WHERE analysis_uuid IN ({ids})",
    ),
    step(
        "snapshots_purge_status",
        "UPDATE snapshots SET purge_status = 1 WHERE uuid IN ({ids})",
    ),
];

/// Sub-portfolios and project copies removed from a portfolio tree.
pub const VIEW_COMPONENT_CASCADE: &[DeletionStep] = &[
    step(
        "properties",
        "DELETE FROM properties WHERE entity_uuid IN ({ids})",
    ),
    step(
        "live_measures",
        "DELETE FROM measures WHERE component_uuid IN ({ids})",
    ),
    step(
        "project_measures",
        "DELETE FROM project_measures WHERE component_uuid IN ({ids})",
    ),
    step("components", "DELETE FROM components WHERE uuid IN ({ids})"),
];

/// Derived data of components disabled by the latest analysis.
pub const DISABLED_COMPONENT_DATA: &[DeletionStep] = &[
    step(
        "file_sources",
        "DELETE FROM file_sources WHERE file_uuid IN ({ids})",
    ),
    step(
        "live_measures",
        "DELETE FROM measures WHERE component_uuid IN ({ids})",
    ),
];

/// Disabled components that no longer carry any issue.
pub const DISABLED_COMPONENT_CASCADE: &[DeletionStep] = &[
    step(
        "file_sources",
        "DELETE FROM file_sources WHERE file_uuid IN ({ids})",
    ),
    step(
        "live_measures",
        "DELETE FROM measures WHERE component_uuid IN ({ids})",
    ),
    step(
        "project_measures",
        "DELETE FROM project_measures WHERE component_uuid IN ({ids})",
    ),
    step("components", "DELETE FROM components WHERE uuid IN ({ids})"),
];

/// Issues and their dependent rows, by issue key.
pub const ISSUE_CASCADE: &[DeletionStep] = &[
    step(
        "issue_changes",
        "DELETE FROM issue_changes WHERE issue_key IN ({ids})",
    ),
    step(
        "new_code_reference_issues",
        "DELETE FROM new_code_reference_issues WHERE issue_key IN ({ids})",
    ),
    step(
        "issues_impacts",
        "DELETE FROM issues_impacts WHERE issue_key IN ({ids})",
    ),
    step("issues", "DELETE FROM issues WHERE kee IN ({ids})"),
];

/// Finished background tasks and their satellites, by task uuid.
pub const ACTIVITY_CASCADE: &[DeletionStep] = &[
    step(
        "ce_task_input",
        "DELETE FROM ce_task_input WHERE task_uuid IN ({ids})",
    ),
    step(
        "ce_scanner_context",
        "DELETE FROM ce_scanner_context WHERE task_uuid IN ({ids})",
    ),
    step(
        "ce_task_characteristics",
        "DELETE FROM ce_task_characteristics WHERE task_uuid IN ({ids})",
    ),
    step(
        "ce_task_message",
        "DELETE FROM ce_task_message WHERE task_uuid IN ({ids})",
    ),
    step("ce_activity", "DELETE FROM ce_activity WHERE uuid IN ({ids})"),
];

/// Scanner context payloads, by task uuid.
pub const SCANNER_CONTEXT_CASCADE: &[DeletionStep] = &[step(
    "ce_scanner_context",
    "DELETE FROM ce_scanner_context WHERE task_uuid IN ({ids})",
)];
