//! Length-changing edits on lists at any depth.

use thiserror::Error;

use crate::path::Path;
use crate::reflect::{self, List, Reflect};
use crate::schema::Schema;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListError {
    #[error("no list at '{0}'")]
    NotFound(String),

    #[error("'{0}' is not a list")]
    NotAList(String),

    #[error("'{0}' is read-only")]
    ReadOnly(String),

    #[error("index {index} is out of range for '{path}' (length {len})")]
    OutOfRange { path: String, index: usize, len: usize },
}

/// Append one zero-valued element to the list at `path`. Returns the new
/// length.
pub fn add_item(schema: &Schema, value: &mut dyn Reflect, path: &Path) -> Result<usize, ListError> {
    let list = target(schema, value, path)?;
    list.push_default();
    tracing::debug!(path = %path, len = list.len(), "List item added");
    Ok(list.len())
}

/// Remove the element at `index` from the list at `path`, keeping the
/// order of the rest. Returns the new length.
pub fn remove_item(
    schema: &Schema,
    value: &mut dyn Reflect,
    path: &Path,
    index: usize,
) -> Result<usize, ListError> {
    let list = target(schema, value, path)?;
    let len = list.len();
    if !list.remove_at(index) {
        return Err(ListError::OutOfRange {
            path: path.to_string(),
            index,
            len,
        });
    }
    tracing::debug!(path = %path, index, len = list.len(), "List item removed");
    Ok(list.len())
}

fn target<'a>(
    schema: &Schema,
    value: &'a mut dyn Reflect,
    path: &Path,
) -> Result<&'a mut dyn List, ListError> {
    let addresses_item = path.last().is_some_and(|s| s.index.is_some());
    let node = schema
        .node_at(path)
        .ok_or_else(|| ListError::NotFound(path.to_string()))?;

    if !node.is_list() || addresses_item {
        return Err(ListError::NotAList(path.to_string()));
    }
    if node.meta.readonly {
        return Err(ListError::ReadOnly(path.to_string()));
    }

    reflect::list_mut(value, path).ok_or_else(|| ListError::NotFound(path.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Endpoint {
        url: String,
    }

    record!(Endpoint { url as "URL" });

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Service {
        name: String,
        endpoints: Vec<Endpoint>,
    }

    record!(Service {
        name as "Name",
        endpoints as "Endpoints",
    });

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Settings {
        host: String,
        services: Vec<Service>,
        pinned: Vec<String>,
    }

    record!(Settings {
        host as "Host",
        services as "Services",
        pinned as "Pinned" { readonly },
    });

    fn settings() -> Settings {
        Settings {
            host: "localhost".into(),
            services: vec![
                Service {
                    name: "a".into(),
                    endpoints: vec![Endpoint { url: "/a".into() }],
                },
                Service {
                    name: "b".into(),
                    endpoints: vec![],
                },
            ],
            pinned: vec!["x".into()],
        }
    }

    fn path(wire: &str) -> Path {
        Path::parse(wire).unwrap()
    }

    #[test]
    fn test_add_then_remove() {
        let schema = Schema::of::<Settings>().unwrap();
        let mut value = settings();
        let original = value.services.clone();

        assert_eq!(add_item(&schema, &mut value, &path("Services")).unwrap(), 3);
        assert_eq!(value.services[2], Service::default());

        assert_eq!(remove_item(&schema, &mut value, &path("Services"), 0).unwrap(), 2);
        assert_eq!(value.services, vec![original[1].clone(), Service::default()]);
    }

    #[test]
    fn test_nested_list() {
        let schema = Schema::of::<Settings>().unwrap();
        let mut value = settings();

        add_item(&schema, &mut value, &path("Services.1.Endpoints")).unwrap();
        assert_eq!(value.services[1].endpoints, vec![Endpoint::default()]);
        assert_eq!(value.services[0].endpoints.len(), 1);

        remove_item(&schema, &mut value, &path("Services.0.Endpoints"), 0).unwrap();
        assert!(value.services[0].endpoints.is_empty());
    }

    #[test]
    fn test_errors_leave_value_untouched() {
        let schema = Schema::of::<Settings>().unwrap();
        let mut value = settings();

        assert_eq!(
            remove_item(&schema, &mut value, &path("Services"), 2),
            Err(ListError::OutOfRange {
                path: "Services".into(),
                index: 2,
                len: 2
            })
        );
        assert!(matches!(
            add_item(&schema, &mut value, &path("Services.5.Endpoints")),
            Err(ListError::NotFound(_))
        ));
        assert!(matches!(
            add_item(&schema, &mut value, &path("Missing")),
            Err(ListError::NotFound(_))
        ));
        assert!(matches!(
            add_item(&schema, &mut value, &path("Host")),
            Err(ListError::NotAList(_))
        ));
        assert!(matches!(
            add_item(&schema, &mut value, &path("Services.0")),
            Err(ListError::NotAList(_))
        ));
        assert!(matches!(
            add_item(&schema, &mut value, &path("Pinned")),
            Err(ListError::ReadOnly(_))
        ));
        assert_eq!(value, settings());
    }
}
