use std::collections::HashMap;
use std::fmt;

/// The entity kinds that list endpoints can sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Movie,
    Person,
    Rating,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Movie => "movie",
            EntityKind::Person => "person",
            EntityKind::Rating => "rating",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
struct SortableFields {
    default_field: &'static str,
    sorted: Vec<&'static str>,
}

/// Whitelist of the field names each entity kind may be ordered by.
///
/// Built once at start-up and shared read-only between requests. The
/// strings handed out by [`SortRegistry::resolve`] are the registry's own
/// `&'static str`s, so a sort field that reaches the query layer can never
/// carry request text.
#[derive(Debug, Clone, Default)]
pub struct SortRegistry {
    kinds: HashMap<EntityKind, SortableFields>,
}

impl SortRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry used by the HTTP API.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(EntityKind::Movie, &["title", "released", "imdbRating", "score"]);
        registry.register(EntityKind::Person, &["name", "born", "movieCount"]);
        registry.register(EntityKind::Rating, &["rating", "timestamp"]);
        registry
    }

    /// Register the sortable fields of `kind`. The first field is the default.
    ///
    /// Panics when `fields` is empty or contains duplicates.
    pub fn register(&mut self, kind: EntityKind, fields: &[&'static str]) {
        let Some(&default_field) = fields.first() else {
            panic!("no sortable fields given for {}", kind);
        };

        let mut sorted = fields.to_vec();
        sorted.sort_unstable();
        let len = sorted.len();
        sorted.dedup();
        assert_eq!(len, sorted.len(), "duplicate sortable field for {}", kind);

        self.kinds.insert(kind, SortableFields { default_field, sorted });
    }

    fn fields(&self, kind: EntityKind) -> &SortableFields {
        match self.kinds.get(&kind) {
            Some(fields) => fields,
            None => panic!("sortable fields for {} were never registered", kind),
        }
    }

    pub fn default_field(&self, kind: EntityKind) -> &'static str {
        self.fields(kind).default_field
    }

    pub fn contains(&self, kind: EntityKind, name: &str) -> bool {
        self.lookup(kind, name).is_some()
    }

    fn lookup(&self, kind: EntityKind, name: &str) -> Option<&'static str> {
        let fields = self.fields(kind);
        fields
            .sorted
            .binary_search_by(|probe| (*probe).cmp(name))
            .ok()
            .map(|idx| fields.sorted[idx])
    }

    /// Map a requested sort field to a whitelisted one, falling back to the
    /// kind's default when the request is absent or unknown.
    pub fn resolve(&self, kind: EntityKind, requested: Option<&str>) -> &'static str {
        requested
            .and_then(|name| self.lookup(kind, name))
            .unwrap_or_else(|| self.default_field(kind))
    }
}
