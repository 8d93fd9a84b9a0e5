use catalog::DatasetStore;
use formats::{
    Edge, Node2D, Node3D, ParseError, ResourceKind, parse_edges, parse_nodes_2d, parse_nodes_3d,
};

use crate::request::LoadGeneration;

/// Network failure for one dataset resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub path: String,
    pub status: Option<u16>,
    pub message: String,
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "fetch of {} failed: HTTP {}", self.path, status),
            None => write!(f, "fetch of {} failed: {}", self.path, self.message),
        }
    }
}

impl std::error::Error for FetchError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    Fetch(FetchError),
    Parse(ParseError),
    Missing(ResourceKind),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Fetch(e) => e.fmt(f),
            LoadError::Parse(e) => e.fmt(f),
            LoadError::Missing(kind) => write!(f, "resource {kind} never arrived"),
        }
    }
}

impl std::error::Error for LoadError {}

/// Aggregate failure of one dataset load.
///
/// Any sub-resource failure aborts the whole load; views never see a
/// partial dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub dataset: String,
    pub errors: Vec<LoadError>,
}

impl std::fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "datasets failed to load for {} ({} error(s))",
            self.dataset,
            self.errors.len()
        )
    }
}

impl std::error::Error for LoadFailure {}

/// One resource the app must produce, from cache or network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRequest {
    pub kind: ResourceKind,
    pub storage_key: &'static str,
    pub path: String,
}

/// The complete in-memory dataset handed to the views.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetBundle {
    pub dataset: String,
    pub nodes_3d: Vec<Node3D>,
    pub nodes_2d: Vec<Node2D>,
    pub edges_top_k: Vec<Edge>,
    pub edges_full: Vec<Edge>,
}

/// Collects the four sub-resources of one load and enforces
/// all-or-nothing completion.
#[derive(Debug)]
pub struct DatasetAssembly {
    dataset: String,
    generation: LoadGeneration,
    nodes_3d: Option<Vec<Node3D>>,
    nodes_2d: Option<Vec<Node2D>>,
    edges_top_k: Option<Vec<Edge>>,
    edges_full: Option<Vec<Edge>>,
    errors: Vec<LoadError>,
}

impl DatasetAssembly {
    fn new(dataset: &str, generation: LoadGeneration) -> Self {
        Self {
            dataset: dataset.to_string(),
            generation,
            nodes_3d: None,
            nodes_2d: None,
            edges_top_k: None,
            edges_full: None,
            errors: Vec::new(),
        }
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub fn generation(&self) -> LoadGeneration {
        self.generation
    }

    /// The four resources to produce, in a fixed deterministic order.
    pub fn requests(&self) -> Vec<ResourceRequest> {
        ResourceKind::ALL
            .iter()
            .map(|&kind| ResourceRequest {
                kind,
                storage_key: kind.storage_key(),
                path: kind.path(&self.dataset),
            })
            .collect()
    }

    /// Feeds the raw JSON text of one resource into the assembly.
    ///
    /// Parse failures are recorded and surface through `finish()`; the
    /// assembly keeps accepting the remaining resources so one bad file
    /// reports alongside any others.
    pub fn provide_raw(&mut self, kind: ResourceKind, raw: &str) {
        let path = kind.path(&self.dataset);
        match kind {
            ResourceKind::Nodes3D => match parse_nodes_3d(&path, raw) {
                Ok(nodes) => self.nodes_3d = Some(nodes),
                Err(e) => self.errors.push(LoadError::Parse(e)),
            },
            ResourceKind::Nodes2D => match parse_nodes_2d(&path, raw) {
                Ok(nodes) => self.nodes_2d = Some(nodes),
                Err(e) => self.errors.push(LoadError::Parse(e)),
            },
            ResourceKind::EdgesTopK => match parse_edges(&path, raw) {
                Ok(edges) => self.edges_top_k = Some(edges),
                Err(e) => self.errors.push(LoadError::Parse(e)),
            },
            ResourceKind::EdgesFull => match parse_edges(&path, raw) {
                Ok(edges) => self.edges_full = Some(edges),
                Err(e) => self.errors.push(LoadError::Parse(e)),
            },
        }
    }

    pub fn record_fetch_failure(&mut self, error: FetchError) {
        self.errors.push(LoadError::Fetch(error));
    }

    /// Completes the load.
    ///
    /// Returns the bundle only when every resource arrived and parsed;
    /// otherwise one aggregate failure naming everything that went wrong,
    /// including resources that never arrived at all.
    pub fn finish(self) -> Result<DatasetBundle, LoadFailure> {
        let mut errors = self.errors;
        let recorded = |errors: &[LoadError], kind: ResourceKind| {
            errors.iter().any(|e| match e {
                LoadError::Fetch(f) => f.path == kind.path(&self.dataset),
                LoadError::Parse(p) => p.path == kind.path(&self.dataset),
                LoadError::Missing(k) => *k == kind,
            })
        };

        let missing: Vec<ResourceKind> = [
            (ResourceKind::Nodes3D, self.nodes_3d.is_none()),
            (ResourceKind::Nodes2D, self.nodes_2d.is_none()),
            (ResourceKind::EdgesTopK, self.edges_top_k.is_none()),
            (ResourceKind::EdgesFull, self.edges_full.is_none()),
        ]
        .into_iter()
        .filter(|(_, absent)| *absent)
        .map(|(kind, _)| kind)
        .collect();

        for kind in missing {
            if !recorded(&errors, kind) {
                errors.push(LoadError::Missing(kind));
            }
        }

        if !errors.is_empty() {
            return Err(LoadFailure {
                dataset: self.dataset,
                errors,
            });
        }

        Ok(DatasetBundle {
            dataset: self.dataset,
            nodes_3d: self.nodes_3d.unwrap_or_default(),
            nodes_2d: self.nodes_2d.unwrap_or_default(),
            edges_top_k: self.edges_top_k.unwrap_or_default(),
            edges_full: self.edges_full.unwrap_or_default(),
        })
    }
}

/// Hands out generation-tagged assemblies, newest-wins.
#[derive(Debug, Default)]
pub struct DatasetLoader {
    generation: u64,
}

impl DatasetLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new load, superseding any in-flight one.
    pub fn begin(&mut self, dataset: &str) -> DatasetAssembly {
        self.generation += 1;
        DatasetAssembly::new(dataset, LoadGeneration(self.generation))
    }

    /// Whether `assembly` is still the newest load. A stale assembly's
    /// results must be discarded, never rendered.
    pub fn is_current(&self, assembly: &DatasetAssembly) -> bool {
        assembly.generation.0 == self.generation
    }
}

/// Cache-first resolution of every resource in `assembly`.
///
/// Per resource: a store hit returns the cached payload; a miss calls
/// `fetch` and stores the body before feeding it in. Store write failures
/// are logged, not fatal; the data is already in memory.
pub fn resolve_with<F>(assembly: &mut DatasetAssembly, store: &mut dyn DatasetStore, mut fetch: F)
where
    F: FnMut(&str) -> Result<String, FetchError>,
{
    for req in assembly.requests() {
        match store.get(req.storage_key) {
            Ok(Some(cached)) => {
                assembly.provide_raw(req.kind, &cached);
                continue;
            }
            Ok(None) => {}
            Err(e) => log::warn!("store read for {} failed: {e}", req.storage_key),
        }

        match fetch(&req.path) {
            Ok(body) => {
                if let Err(e) = store.put(req.storage_key, &body) {
                    log::warn!("store write for {} failed: {e}", req.storage_key);
                }
                assembly.provide_raw(req.kind, &body);
            }
            Err(e) => assembly.record_fetch_failure(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DatasetLoader, FetchError, LoadError, resolve_with};
    use catalog::{DatasetStore, InMemoryStore};
    use formats::ResourceKind;

    fn body_for(path: &str) -> String {
        if path.contains("Node_3D") {
            r#"[{"id":"Node1","ChID":"1","x":0.0,"y":0.0,"z":0.0}]"#.to_string()
        } else if path.contains("Node_2D") {
            r#"[{"id":"Node1","ChID":"1","x":0.0,"y":0.0}]"#.to_string()
        } else {
            r#"[{"Source":1,"Target":2,"Weight":0.5,"Interaction":0}]"#.to_string()
        }
    }

    #[test]
    fn all_four_resources_assemble_into_a_bundle() {
        let mut loader = DatasetLoader::new();
        let mut store = InMemoryStore::new();
        let mut assembly = loader.begin("Bacillus_30C");

        resolve_with(&mut assembly, &mut store, |path| Ok(body_for(path)));

        let bundle = assembly.finish().expect("bundle");
        assert_eq!(bundle.dataset, "Bacillus_30C");
        assert_eq!(bundle.nodes_3d.len(), 1);
        assert_eq!(bundle.edges_full.len(), 1);
        // Every resource landed in the store for the next session.
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn one_failed_fetch_fails_the_whole_load() {
        let mut loader = DatasetLoader::new();
        let mut store = InMemoryStore::new();
        let mut assembly = loader.begin("Bacillus_30C");

        resolve_with(&mut assembly, &mut store, |path| {
            if path.contains("Edge_top10") {
                Err(FetchError {
                    path: path.to_string(),
                    status: Some(404),
                    message: String::new(),
                })
            } else {
                Ok(body_for(path))
            }
        });

        let failure = assembly.finish().unwrap_err();
        assert_eq!(failure.errors.len(), 1);
        assert!(matches!(failure.errors[0], LoadError::Fetch(_)));
    }

    #[test]
    fn malformed_resource_reports_parse_error() {
        let mut loader = DatasetLoader::new();
        let mut store = InMemoryStore::new();
        let mut assembly = loader.begin("Bacillus_30C");

        resolve_with(&mut assembly, &mut store, |path| {
            if path.contains("Node_2D") {
                Ok("{not valid".to_string())
            } else {
                Ok(body_for(path))
            }
        });

        let failure = assembly.finish().unwrap_err();
        assert!(matches!(failure.errors[0], LoadError::Parse(_)));
    }

    #[test]
    fn cache_hits_skip_the_fetcher() {
        let mut loader = DatasetLoader::new();
        let mut store = InMemoryStore::new();
        for kind in ResourceKind::ALL {
            store
                .put(kind.storage_key(), &body_for(&kind.path("Bacillus_30C")))
                .unwrap();
        }

        let mut assembly = loader.begin("Bacillus_30C");
        let mut fetches = 0usize;
        resolve_with(&mut assembly, &mut store, |path| {
            fetches += 1;
            Ok(body_for(path))
        });

        assert_eq!(fetches, 0);
        assert!(assembly.finish().is_ok());
    }

    #[test]
    fn a_newer_load_supersedes_the_old_one() {
        let mut loader = DatasetLoader::new();
        let old = loader.begin("Bacillus_30C");
        let new = loader.begin("Bacillus_42C45M");

        assert!(!loader.is_current(&old));
        assert!(loader.is_current(&new));
    }

    #[test]
    fn resources_that_never_arrive_are_named() {
        let mut loader = DatasetLoader::new();
        let assembly = loader.begin("Bacillus_30C");
        let failure = assembly.finish().unwrap_err();
        assert_eq!(failure.errors.len(), 4);
        assert!(failure
            .errors
            .iter()
            .all(|e| matches!(e, LoadError::Missing(_))));
    }
}
