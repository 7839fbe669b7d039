//! Static catalog of department tables
//!
//! Each department owns a handful of schedule tables ("categories"). They all
//! share the same record lifecycle; what differs is the table name, the column
//! shown as the record's title, and how the table names the people a record
//! applies to.

use crate::backend::{row_str, Row};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Organisational unit owning a set of schedule tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Department {
    Bdm,
    Cluster6,
    Hitech,
}

impl Department {
    pub const ALL: [Department; 3] = [Department::Bdm, Department::Cluster6, Department::Hitech];

    pub fn slug(&self) -> &'static str {
        match self {
            Department::Bdm => "bdm",
            Department::Cluster6 => "cluster6",
            Department::Hitech => "hitech",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Department::Bdm => "BDM",
            Department::Cluster6 => "Cluster 6",
            Department::Hitech => "HiTech",
        }
    }

    /// Tables belonging to this department
    pub fn categories(&self) -> impl Iterator<Item = &'static TableSpec> + '_ {
        CATALOG.iter().filter(move |spec| spec.department == *self)
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Department {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace([' ', '-', '_'], "").as_str() {
            "bdm" => Ok(Department::Bdm),
            "cluster6" => Ok(Department::Cluster6),
            "hitech" => Ok(Department::Hitech),
            other => Err(format!("Unknown department: {}", other)),
        }
    }
}

/// Who a schedule record applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "column", rename_all = "snake_case")]
pub enum ResponsibleField {
    /// List of user ids, matched by membership
    ParticipantIds(&'static str),
    /// List of free-text names, matched by case-insensitive substring
    ParticipantNames(&'static str),
    /// Single free-text field, matched by case-insensitive substring
    ConductedBy(&'static str),
    /// Not tied to personnel
    Unassigned,
}

/// The person a schedule is being built for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: Uuid,
    /// Display name used for the free-text columns
    pub name: Option<String>,
}

impl Participant {
    pub fn new(id: Uuid, name: Option<String>) -> Self {
        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        Self { id, name }
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Values of a list column. A bare string is treated as a one-element list.
fn list_values(row: &Row, column: &str) -> Vec<String> {
    match row.get(column) {
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .filter_map(|v| match v {
                serde_json::Value::String(s) => Some(s.clone()),
                serde_json::Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Some(_) => row_str(row, column).into_iter().collect(),
        None => Vec::new(),
    }
}

impl ResponsibleField {
    /// Whether `row` names `participant`
    pub fn matches(&self, row: &Row, participant: &Participant) -> bool {
        match self {
            ResponsibleField::ParticipantIds(column) => {
                let id = participant.id.to_string();
                list_values(row, column)
                    .iter()
                    .any(|v| v.trim().eq_ignore_ascii_case(&id))
            }
            ResponsibleField::ParticipantNames(column) => match &participant.name {
                Some(name) => list_values(row, column)
                    .iter()
                    .any(|v| contains_ignore_case(v, name)),
                None => false,
            },
            ResponsibleField::ConductedBy(column) => match (&participant.name, row_str(row, column))
            {
                (Some(name), Some(value)) => contains_ignore_case(&value, name),
                _ => false,
            },
            ResponsibleField::Unassigned => false,
        }
    }

    /// Whether matching needs the participant's display name
    pub fn needs_name(&self) -> bool {
        matches!(
            self,
            ResponsibleField::ParticipantNames(_) | ResponsibleField::ConductedBy(_)
        )
    }
}

/// One department schedule table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSpec {
    pub department: Department,
    /// Category slug used in URLs
    pub key: &'static str,
    pub table: &'static str,
    pub label: &'static str,
    /// Column shown as the record's title
    pub title_column: &'static str,
    pub responsible: ResponsibleField,
    pub discussion_table: &'static str,
}

impl TableSpec {
    /// `department/category`, used as event scope and schedule source label
    pub fn scope(&self) -> String {
        format!("{}/{}", self.department.slug(), self.key)
    }
}

pub static CATALOG: &[TableSpec] = &[
    TableSpec {
        department: Department::Bdm,
        key: "meetings",
        table: "bdm_meetings",
        label: "Client Meetings",
        title_column: "agenda",
        responsible: ResponsibleField::ParticipantIds("attendee_ids"),
        discussion_table: "bdm_meeting_discussions",
    },
    TableSpec {
        department: Department::Bdm,
        key: "site-visits",
        table: "bdm_site_visits",
        label: "Site Visits",
        title_column: "client_name",
        responsible: ResponsibleField::ParticipantNames("team_members"),
        discussion_table: "bdm_site_visit_discussions",
    },
    TableSpec {
        department: Department::Bdm,
        key: "trainings",
        table: "bdm_trainings",
        label: "Trainings",
        title_column: "topic",
        responsible: ResponsibleField::ConductedBy("conducted_by"),
        discussion_table: "bdm_training_discussions",
    },
    TableSpec {
        department: Department::Cluster6,
        key: "activities",
        table: "cluster6_activities",
        label: "Activities",
        title_column: "activity",
        responsible: ResponsibleField::ParticipantNames("personnel"),
        discussion_table: "cluster6_activity_discussions",
    },
    TableSpec {
        department: Department::Cluster6,
        key: "deployments",
        table: "cluster6_deployments",
        label: "Deployments",
        title_column: "site",
        responsible: ResponsibleField::ParticipantIds("assigned_ids"),
        discussion_table: "cluster6_deployment_discussions",
    },
    TableSpec {
        department: Department::Cluster6,
        key: "reports",
        table: "cluster6_reports",
        label: "Reports",
        title_column: "subject",
        responsible: ResponsibleField::Unassigned,
        discussion_table: "cluster6_report_discussions",
    },
    TableSpec {
        department: Department::Hitech,
        key: "projects",
        table: "hitech_projects",
        label: "Projects",
        title_column: "project_name",
        responsible: ResponsibleField::ParticipantNames("team"),
        discussion_table: "hitech_project_discussions",
    },
    TableSpec {
        department: Department::Hitech,
        key: "events",
        table: "hitech_events",
        label: "Events",
        title_column: "event_name",
        responsible: ResponsibleField::ParticipantIds("participant_ids"),
        discussion_table: "hitech_event_discussions",
    },
    TableSpec {
        department: Department::Hitech,
        key: "workshops",
        table: "hitech_workshops",
        label: "Workshops",
        title_column: "workshop",
        responsible: ResponsibleField::ConductedBy("facilitator"),
        discussion_table: "hitech_workshop_discussions",
    },
];

/// Find the table for a department category
pub fn lookup(department: Department, key: &str) -> Option<&'static TableSpec> {
    CATALOG
        .iter()
        .find(|spec| spec.department == department && spec.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    fn row(value: serde_json::Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_department_parse_variants() {
        assert_eq!("BDM".parse::<Department>().unwrap(), Department::Bdm);
        assert_eq!("Cluster 6".parse::<Department>().unwrap(), Department::Cluster6);
        assert_eq!("cluster-6".parse::<Department>().unwrap(), Department::Cluster6);
        assert_eq!("HiTech".parse::<Department>().unwrap(), Department::Hitech);
        assert!("finance".parse::<Department>().is_err());
    }

    #[test]
    fn test_department_serde_matches_slug() {
        for d in Department::ALL {
            assert_eq!(serde_json::to_string(&d).unwrap(), format!("\"{}\"", d.slug()));
        }
    }

    #[test]
    fn test_catalog_tables_are_unique() {
        let tables: HashSet<_> = CATALOG.iter().map(|s| s.table).collect();
        let discussions: HashSet<_> = CATALOG.iter().map(|s| s.discussion_table).collect();
        assert_eq!(tables.len(), CATALOG.len());
        assert_eq!(discussions.len(), CATALOG.len());
        for d in Department::ALL {
            assert!(d.categories().count() > 0, "{} has no tables", d);
        }
    }

    #[test]
    fn test_lookup() {
        let spec = lookup(Department::Bdm, "trainings").unwrap();
        assert_eq!(spec.table, "bdm_trainings");
        assert_eq!(spec.scope(), "bdm/trainings");
        assert!(lookup(Department::Hitech, "trainings").is_none());
    }

    #[test]
    fn test_participant_ids_membership() {
        let me = Uuid::new_v4();
        let p = Participant::new(me, None);
        let field = ResponsibleField::ParticipantIds("attendee_ids");

        let hit = row(json!({"attendee_ids": [Uuid::new_v4().to_string(), me.to_string()]}));
        let miss = row(json!({"attendee_ids": [Uuid::new_v4().to_string()]}));
        let empty = row(json!({"attendee_ids": null}));
        assert!(field.matches(&hit, &p));
        assert!(!field.matches(&miss, &p));
        assert!(!field.matches(&empty, &p));
    }

    #[test]
    fn test_participant_names_case_insensitive_substring() {
        let p = Participant::new(Uuid::new_v4(), Some("Maria Santos".into()));
        let field = ResponsibleField::ParticipantNames("team_members");

        assert!(field.matches(&row(json!({"team_members": ["Engr. MARIA SANTOS", "Leo"]})), &p));
        assert!(!field.matches(&row(json!({"team_members": ["Maria", "Santos"]})), &p));
        // A bare string column still matches
        assert!(field.matches(&row(json!({"team_members": "maria santos (lead)"})), &p));
    }

    #[test]
    fn test_conducted_by_is_substring_not_exact() {
        let p = Participant::new(Uuid::new_v4(), Some("  jose rizal ".into()));
        let field = ResponsibleField::ConductedBy("conducted_by");

        assert!(field.matches(&row(json!({"conducted_by": "Dr. Jose Rizal and team"})), &p));
        assert!(!field.matches(&row(json!({"conducted_by": "Andres Bonifacio"})), &p));
    }

    #[test]
    fn test_name_fields_need_a_name() {
        let anonymous = Participant::new(Uuid::new_v4(), Some("   ".into()));
        assert!(anonymous.name.is_none());
        let field = ResponsibleField::ConductedBy("conducted_by");
        assert!(field.needs_name());
        assert!(!field.matches(&row(json!({"conducted_by": "anyone"})), &anonymous));
        assert!(!ResponsibleField::ParticipantIds("x").needs_name());
    }
}
