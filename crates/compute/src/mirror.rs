use formats::Edge;

/// Identifies one run of the mirroring task.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskGeneration(pub u64);

/// Mirrors an upper-triangular edge list into a full symmetric matrix.
///
/// Every off-diagonal entry gains a twin with Source and Target swapped and
/// the same weight; diagonal entries are kept once. Output order is each
/// original entry immediately followed by its mirror, so the result is
/// deterministic for a given input.
pub fn mirror_edges(edges: &[Edge]) -> Vec<Edge> {
    let mut out = Vec::with_capacity(edges.len() * 2);
    for edge in edges {
        out.push(edge.clone());
        if edge.source != edge.target {
            out.push(Edge {
                source: edge.target,
                target: edge.source,
                weight: edge.weight,
                interaction: edge.interaction,
            });
        }
    }
    out
}

/// One offloaded mirroring request.
#[derive(Debug, Clone, PartialEq)]
pub struct MirrorRequest {
    pub generation: TaskGeneration,
    pub edges: Vec<Edge>,
}

/// The task boundary carries either the processed list or an error string,
/// never both.
#[derive(Debug, Clone, PartialEq)]
pub struct MirrorResponse {
    pub generation: TaskGeneration,
    pub result: Result<Vec<Edge>, String>,
}

/// Executes a request. Pure and synchronous; the caller decides where it
/// runs (spawned task, worker, test thread).
pub fn run_mirror(request: &MirrorRequest) -> MirrorResponse {
    MirrorResponse {
        generation: request.generation,
        result: Ok(mirror_edges(&request.edges)),
    }
}

/// Exactly-once bookkeeping for the fire-and-forget mirror task.
///
/// A dataset switch restarts the task; any response still in flight from
/// the previous run carries a stale generation and is rejected by
/// `accept`, so a slow old-dataset result can never populate the heatmap
/// after a newer dataset has rendered.
#[derive(Debug, Default)]
pub struct MirrorTask {
    generation: u64,
    delivered: bool,
}

impl MirrorTask {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> TaskGeneration {
        TaskGeneration(self.generation)
    }

    /// Terminates the current run and starts a fresh one.
    pub fn restart(&mut self) {
        self.generation += 1;
        self.delivered = false;
    }

    /// Builds the request for the current run.
    pub fn request(&self, edges: Vec<Edge>) -> MirrorRequest {
        MirrorRequest {
            generation: TaskGeneration(self.generation),
            edges,
        }
    }

    /// Accepts a response for the current run, once.
    ///
    /// Returns `None` for stale generations and for duplicate deliveries.
    pub fn accept(&mut self, response: MirrorResponse) -> Option<Result<Vec<Edge>, String>> {
        if response.generation.0 != self.generation || self.delivered {
            return None;
        }
        self.delivered = true;
        Some(response.result)
    }
}
