//! Entity plan
//!
//! The ordered list of entities a run walks through, and the resume rule
//! that picks where an interrupted run starts again.

use crate::catalog::Catalog;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use tracing::warn;

/// Bulk objects every account has
pub const BUILT_IN_BULK_OBJECTS: [&str; 2] = ["accounts", "contacts"];

/// Activity types exported through the activities endpoint
pub const ACTIVITY_TYPES: [&str; 9] = [
    "EmailOpen",
    "EmailClickthrough",
    "EmailSend",
    "Subscribe",
    "Unsubscribe",
    "Bounceback",
    "WebVisit",
    "PageView",
    "FormSubmit",
];

/// REST-listed entities: (stream, path, update field)
pub const SIMPLE_ASSETS: [(&str, &str, &str); 4] = [
    ("visitors", "/api/REST/2.0/data/visitors", "v_LastVisitDateAndTime"),
    ("campaigns", "/api/REST/2.0/assets/campaigns", "updatedAt"),
    ("emails", "/api/REST/2.0/assets/emails", "updatedAt"),
    ("forms", "/api/REST/2.0/assets/forms", "updatedAt"),
];

static WORD_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(.)([A-Z][a-z]+)").expect("word boundary pattern compiles"));
static LOWER_UPPER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("case boundary pattern compiles"));

/// `EmailClickthrough` -> `email_clickthrough`
pub fn camel_to_snake(name: &str) -> String {
    let first = WORD_BOUNDARY.replace_all(name, "${1}_${2}");
    LOWER_UPPER
        .replace_all(&first, "${1}_${2}")
        .to_lowercase()
}

/// Stream name of an activity type
pub fn activity_type_to_stream(activity_type: &str) -> String {
    format!("activity_{}", camel_to_snake(activity_type))
}

/// One entity to sync
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityDescriptor {
    /// A built-in bulk object (`accounts`, `contacts`)
    BuiltIn {
        /// Stream and API object name
        name: String,
    },
    /// One activity type exported from the activities endpoint
    Activity {
        /// Activity type (e.g. `EmailOpen`)
        activity_type: String,
        /// Derived stream name
        stream: String,
    },
    /// A custom object
    CustomObject {
        /// Remote object id
        id: String,
        /// Stream name
        stream: String,
    },
    /// A REST-listed entity paged by update time
    SimpleAsset {
        /// Stream name
        name: String,
        /// REST path
        path: String,
        /// Update-time field used for search and ordering
        search_field: String,
    },
}

impl EntityDescriptor {
    /// Built-in bulk object
    pub fn built_in(name: impl Into<String>) -> Self {
        Self::BuiltIn { name: name.into() }
    }

    /// Activity variant
    pub fn activity(activity_type: impl Into<String>) -> Self {
        let activity_type = activity_type.into();
        let stream = activity_type_to_stream(&activity_type);
        Self::Activity {
            activity_type,
            stream,
        }
    }

    /// Custom object variant
    pub fn custom_object(id: impl Into<String>, stream: impl Into<String>) -> Self {
        Self::CustomObject {
            id: id.into(),
            stream: stream.into(),
        }
    }

    /// REST asset
    pub fn simple_asset(
        name: impl Into<String>,
        path: impl Into<String>,
        search_field: impl Into<String>,
    ) -> Self {
        Self::SimpleAsset {
            name: name.into(),
            path: path.into(),
            search_field: search_field.into(),
        }
    }

    /// Stream name
    pub fn name(&self) -> &str {
        match self {
            Self::BuiltIn { name } | Self::SimpleAsset { name, .. } => name,
            Self::Activity { stream, .. } | Self::CustomObject { stream, .. } => stream,
        }
    }

    /// Whether the entity goes through the bulk export API
    pub fn is_bulk(&self) -> bool {
        !matches!(self, Self::SimpleAsset { .. })
    }

    /// Activity type, for activity variants
    pub fn activity_type(&self) -> Option<&str> {
        match self {
            Self::Activity { activity_type, .. } => Some(activity_type),
            _ => None,
        }
    }

    /// Field the incremental filter and bookmark track
    pub fn update_field(&self) -> &str {
        match self {
            Self::Activity { .. } => "CreatedAt",
            Self::BuiltIn { .. } | Self::CustomObject { .. } => "UpdatedAt",
            Self::SimpleAsset { search_field, .. } => search_field,
        }
    }

    /// Export definition endpoint for bulk entities
    pub fn export_path(&self) -> Option<String> {
        let object = match self {
            Self::BuiltIn { name } => name.clone(),
            Self::Activity { .. } => "activities".to_string(),
            Self::CustomObject { id, .. } => format!("customObjects/{id}"),
            Self::SimpleAsset { .. } => return None,
        };
        Some(format!("/api/bulk/2.0/{object}/exports"))
    }
}

/// The ordered entities of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityPlan {
    entities: Vec<EntityDescriptor>,
}

impl EntityPlan {
    /// Build the plan from the catalog
    ///
    /// Order: built-ins, activity types, custom objects (catalog order),
    /// then REST assets. Entities absent from the catalog are left out.
    pub fn build(catalog: &Catalog) -> Self {
        let mut entities = Vec::new();

        entities.extend(BUILT_IN_BULK_OBJECTS.iter().map(|n| EntityDescriptor::built_in(*n)));
        entities.extend(ACTIVITY_TYPES.iter().map(|t| EntityDescriptor::activity(*t)));

        let mut plan = Self { entities };
        plan.entities.retain(|e| catalog.get_stream(e.name()).is_some());

        for entry in catalog.custom_object_streams() {
            if let Some(id) = entry.custom_object_id() {
                plan.entities
                    .push(EntityDescriptor::custom_object(id, &entry.tap_stream_id));
            }
        }

        for (name, path, field) in SIMPLE_ASSETS {
            if catalog.get_stream(name).is_some() {
                plan.entities
                    .push(EntityDescriptor::simple_asset(name, path, field));
            }
        }

        plan
    }

    /// Plan from an explicit entity list
    pub fn from_entities(entities: Vec<EntityDescriptor>) -> Self {
        Self { entities }
    }

    /// Entities in order
    pub fn entities(&self) -> &[EntityDescriptor] {
        &self.entities
    }

    /// Whether an entity with this name is planned
    pub fn contains(&self, name: &str) -> bool {
        self.entities.iter().any(|e| e.name() == name)
    }

    /// Number of planned entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether nothing is planned
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// The entities to sync this run, in order
    ///
    /// Without a resume point every selected entity runs. With one, the
    /// entities before it are skipped, it runs regardless of selection, and
    /// selected entities after it run. A resume point naming no planned
    /// entity is ignored.
    pub fn schedule<'a>(
        &'a self,
        selected: &[&str],
        resume_from: Option<&str>,
    ) -> Vec<&'a EntityDescriptor> {
        let selected: HashSet<&str> = selected.iter().copied().collect();

        let mut resume = resume_from;
        if let Some(name) = resume {
            if !self.contains(name) {
                warn!("Resume point {name} is not in the plan, starting from the beginning");
                resume = None;
            }
        }

        let mut scheduled = Vec::new();
        for entity in &self.entities {
            match resume {
                Some(name) if entity.name() == name => {
                    resume = None;
                    scheduled.push(entity);
                }
                Some(_) => {}
                None if selected.contains(entity.name()) => scheduled.push(entity),
                None => {}
            }
        }
        scheduled
    }
}
