//! Named field access used by rewrite rules
//!
//! Rewrite rules address dependency fields by name. Instead of reflecting over
//! the struct, every addressable field is listed once here with a getter and a
//! setter. The table order is the order in which values are written back, so
//! a new `url` is in place before `scheme`/`host`/`path`/`port` adjust it.

use crate::dependency::error::DependencyError;
use crate::dependency::locator::Locator;
use crate::dependency::Dependency;

type Getter = fn(&Dependency) -> String;
type Setter = fn(&mut Dependency, &str) -> Result<(), DependencyError>;

pub struct FieldAccessor {
    pub name: &'static str,
    get: Getter,
    set: Setter,
}

impl FieldAccessor {
    pub fn get(&self, dep: &Dependency) -> String {
        (self.get)(dep)
    }

    pub fn set(&self, dep: &mut Dependency, value: &str) -> Result<(), DependencyError> {
        (self.set)(dep, value)
    }
}

fn locator_part(dep: &Dependency, part: fn(&Locator) -> &str) -> String {
    dep.url.as_ref().map(part).unwrap_or_default().to_string()
}

fn locator_mut(dep: &mut Dependency) -> &mut Locator {
    dep.url.get_or_insert_with(Locator::default)
}

pub static FIELDS: [FieldAccessor; 9] = [
    FieldAccessor {
        name: "import",
        get: |dep| dep.import.clone(),
        set: |dep, value| {
            dep.import = value.to_string();
            Ok(())
        },
    },
    FieldAccessor {
        name: "type",
        get: |dep| dep.source_type.clone(),
        set: |dep, value| {
            dep.source_type = value.to_string();
            Ok(())
        },
    },
    FieldAccessor {
        name: "branch",
        get: |dep| dep.branch.clone(),
        set: |dep, value| {
            dep.branch = value.to_string();
            Ok(())
        },
    },
    FieldAccessor {
        name: "tag",
        get: |dep| dep.tag.clone(),
        set: |dep, value| {
            dep.tag = value.to_string();
            Ok(())
        },
    },
    FieldAccessor {
        name: "url",
        get: |dep| dep.url.as_ref().map(Locator::to_string).unwrap_or_default(),
        set: |dep, value| {
            dep.url = if value.is_empty() {
                None
            } else {
                let locator =
                    Locator::parse(value).map_err(|source| DependencyError::InvalidUrl {
                        url: value.to_string(),
                        source,
                    })?;
                Some(locator)
            };
            Ok(())
        },
    },
    FieldAccessor {
        name: "scheme",
        get: |dep| locator_part(dep, |l| l.scheme.as_str()),
        set: |dep, value| {
            locator_mut(dep).scheme = value.to_string();
            Ok(())
        },
    },
    FieldAccessor {
        name: "host",
        get: |dep| locator_part(dep, |l| l.host.as_str()),
        set: |dep, value| {
            locator_mut(dep).host = value.to_string();
            Ok(())
        },
    },
    FieldAccessor {
        name: "path",
        get: |dep| locator_part(dep, |l| l.path.as_str()),
        set: |dep, value| {
            locator_mut(dep).path = value.to_string();
            Ok(())
        },
    },
    FieldAccessor {
        name: "port",
        get: |dep| locator_part(dep, |l| l.port.as_str()),
        set: |dep, value| {
            locator_mut(dep).port = value.to_string();
            Ok(())
        },
    },
];

/// Look up the accessor for a field name
pub fn field(name: &str) -> Option<&'static FieldAccessor> {
    FIELDS.iter().find(|f| f.name == name)
}
