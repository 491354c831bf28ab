use log::debug;
use serde_json::Value;

use crate::error::DrawerError;

/// Ask the host to populate a drawer. Results must be handed back with the
/// same generation, anything older is discarded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchRequest {
    pub drawer: String,
    pub generation: u64,
    pub term: String,
}

#[derive(Clone, Debug)]
pub struct Drawer {
    id: String,
    open: bool,
    lazy: bool,
    results: Vec<Value>,
    notice: Option<String>,
    generation: u64,
    term: String,
}

impl Drawer {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn results(&self) -> &[Value] {
        &self.results
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn is_searching(&self) -> bool {
        self.notice.is_none() && self.results.is_empty() && self.generation > 0
    }
}

/// A set of drawers of which at most one is open.
///
/// Opening a drawer closes its siblings in the same call. A lazily
/// populated drawer with no results issues one search per open transition.
#[derive(Default)]
pub struct DrawerManager {
    drawers: Vec<Drawer>,
    generation: u64,
}

impl DrawerManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// `lazy` drawers search for their content when first opened
    pub fn register(&mut self, id: &str, lazy: bool) -> Result<(), DrawerError> {
        if self.find(id).is_some() {
            return Err(DrawerError::AlreadyRegistered { id: id.to_string() });
        }
        self.drawers.push(Drawer {
            id: id.to_string(),
            open: false,
            lazy,
            results: Vec::new(),
            notice: None,
            generation: 0,
            term: String::new(),
        });
        Ok(())
    }

    pub fn drawer(&self, id: &str) -> Option<&Drawer> {
        self.find(id).map(|index| &self.drawers[index])
    }

    pub fn open_drawer(&self) -> Option<&str> {
        self.drawers
            .iter()
            .find(|drawer| drawer.open)
            .map(|drawer| drawer.id.as_str())
    }

    pub fn open_count(&self) -> usize {
        self.drawers.iter().filter(|drawer| drawer.open).count()
    }

    /// Open `id` and close every sibling. Returns the search to run when the
    /// drawer needs populating.
    pub fn open(&mut self, id: &str) -> Result<Option<SearchRequest>, DrawerError> {
        let index = self.index(id)?;
        for (other, drawer) in self.drawers.iter_mut().enumerate() {
            if other != index && drawer.open {
                debug!("closing drawer {:?}", drawer.id);
                drawer.open = false;
            }
        }

        let drawer = &mut self.drawers[index];
        if drawer.open {
            return Ok(None);
        }
        debug!("opening drawer {:?}", drawer.id);
        drawer.open = true;

        if drawer.lazy && drawer.results.is_empty() {
            let term = drawer.term.clone();
            return Ok(Some(self.start_search(index, term)));
        }
        Ok(None)
    }

    pub fn close(&mut self, id: &str) -> Result<(), DrawerError> {
        let index = self.index(id)?;
        let drawer = &mut self.drawers[index];
        if drawer.open {
            debug!("closing drawer {:?}", drawer.id);
            drawer.open = false;
        }
        Ok(())
    }

    pub fn toggle(&mut self, id: &str) -> Result<Option<SearchRequest>, DrawerError> {
        let index = self.index(id)?;
        if self.drawers[index].open {
            self.close(id)?;
            Ok(None)
        } else {
            self.open(id)
        }
    }

    /// Search with a new term, superseding any search still running
    pub fn search(&mut self, id: &str, term: &str) -> Result<SearchRequest, DrawerError> {
        let index = self.index(id)?;
        Ok(self.start_search(index, term.to_string()))
    }

    /// Apply results of a search. Returns false, changing nothing, when a
    /// newer search has started since.
    pub fn apply_results(
        &mut self,
        id: &str,
        generation: u64,
        results: Vec<Value>,
    ) -> Result<bool, DrawerError> {
        let index = self.index(id)?;
        let drawer = &mut self.drawers[index];
        if drawer.generation != generation {
            debug!(
                "discarding results {} for drawer {:?}, current is {}",
                generation, drawer.id, drawer.generation
            );
            return Ok(false);
        }
        drawer.notice = if results.is_empty() {
            Some("No results found.".to_string())
        } else {
            None
        };
        drawer.results = results;
        Ok(true)
    }

    /// The host could not run a search. The drawer shows `reason` instead of
    /// results, unless a newer search has started since.
    pub fn search_failed(
        &mut self,
        id: &str,
        generation: u64,
        reason: &str,
    ) -> Result<bool, DrawerError> {
        let index = self.index(id)?;
        let drawer = &mut self.drawers[index];
        if drawer.generation != generation {
            return Ok(false);
        }
        debug!("search {} for drawer {:?} failed: {}", generation, drawer.id, reason);
        drawer.results.clear();
        drawer.notice = Some(reason.to_string());
        Ok(true)
    }

    fn start_search(&mut self, index: usize, term: String) -> SearchRequest {
        self.generation += 1;
        let drawer = &mut self.drawers[index];
        drawer.generation = self.generation;
        drawer.term = term.clone();
        drawer.results.clear();
        drawer.notice = None;
        SearchRequest {
            drawer: drawer.id.clone(),
            generation: self.generation,
            term,
        }
    }

    fn find(&self, id: &str) -> Option<usize> {
        self.drawers.iter().position(|drawer| drawer.id == id)
    }

    fn index(&self, id: &str) -> Result<usize, DrawerError> {
        self.find(id)
            .ok_or_else(|| DrawerError::UnknownDrawer { id: id.to_string() })
    }
}
