//! # Project Store
//!
//! Holds every open calculation project, its lifecycle state, and its
//! cached result. The store is the single owner of parameter models; the
//! shell mutates them only through [`ProjectStore::update`], which keeps
//! the dirty flag and the cache consistent, and observes changes through
//! subscribed callbacks instead of polling.
//!
//! Lifecycle: `Created → Editing → Validated → Calculated → Reported`,
//! with `Closed` reachable from any state. Any edit drops back to
//! `Editing` and invalidates the cached result.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::crane_db::CraneSpecStore;
use crate::dispatch::{self, CalculationResult};
use crate::errors::{CalcError, CalcResult};
use crate::params::{CalculationParams, ParameterModel, ProjectId};

/// Lifecycle state of one open project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectState {
    Created,
    Editing,
    Validated,
    Calculated,
    Reported,
    Closed,
}

/// Change notification sent to store observers.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    Added(ProjectId),
    Renamed { id: ProjectId, name: String },
    DirtyChanged { id: ProjectId, dirty: bool },
    Removed(ProjectId),
}

type Observer = Box<dyn Fn(&StoreEvent)>;

struct ProjectEntry {
    model: ParameterModel,
    state: ProjectState,
    cached: Option<CalculationResult>,
}

/// In-memory registry of open projects.
#[derive(Default)]
pub struct ProjectStore {
    entries: HashMap<ProjectId, ProjectEntry>,
    /// Insertion order, for stable listing in the side panel
    order: Vec<ProjectId>,
    observers: Vec<Observer>,
}

impl ProjectStore {
    pub fn new() -> Self {
        ProjectStore::default()
    }

    /// Register a change observer. Observers stay subscribed for the
    /// lifetime of the store.
    pub fn subscribe(&mut self, observer: impl Fn(&StoreEvent) + 'static) {
        self.observers.push(Box::new(observer));
    }

    fn notify(&self, event: StoreEvent) {
        for observer in &self.observers {
            observer(&event);
        }
    }

    /// Add a freshly created project.
    pub fn add(&mut self, model: ParameterModel) -> ProjectId {
        let id = model.id;
        self.entries.insert(
            id,
            ProjectEntry {
                model,
                state: ProjectState::Created,
                cached: None,
            },
        );
        self.order.push(id);
        self.notify(StoreEvent::Added(id));
        id
    }

    /// Add a project loaded from disk. Loaded projects start clean and
    /// editable.
    pub fn add_loaded(&mut self, model: ParameterModel) -> ProjectId {
        let id = self.add(model);
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.state = ProjectState::Editing;
            entry.model.dirty = false;
        }
        id
    }

    /// Project ids in insertion order.
    pub fn list(&self) -> &[ProjectId] {
        &self.order
    }

    pub fn get(&self, id: ProjectId) -> Option<&ParameterModel> {
        self.entries.get(&id).map(|e| &e.model)
    }

    pub fn state(&self, id: ProjectId) -> Option<ProjectState> {
        self.entries.get(&id).map(|e| e.state)
    }

    pub fn cached_result(&self, id: ProjectId) -> Option<&CalculationResult> {
        self.entries.get(&id).and_then(|e| e.cached.as_ref())
    }

    fn entry_mut(&mut self, id: ProjectId) -> CalcResult<&mut ProjectEntry> {
        self.entries
            .get_mut(&id)
            .ok_or_else(|| CalcError::internal(format!("unknown project {id}")))
    }

    /// Rename a project. Marks it dirty like any other edit.
    pub fn rename(&mut self, id: ProjectId, name: impl Into<String>) -> CalcResult<()> {
        let name = name.into();
        let entry = self.entry_mut(id)?;
        entry.model.display_name = name.clone();
        let became_dirty = !entry.model.dirty;
        entry.model.dirty = true;
        self.notify(StoreEvent::Renamed { id, name });
        if became_dirty {
            self.notify(StoreEvent::DirtyChanged { id, dirty: true });
        }
        Ok(())
    }

    /// Mutate a project's parameters.
    ///
    /// Every successful mutation marks the project dirty, drops any cached
    /// result, and puts it back into `Editing`.
    pub fn update(
        &mut self,
        id: ProjectId,
        mutate: impl FnOnce(&mut CalculationParams),
    ) -> CalcResult<()> {
        let entry = self.entry_mut(id)?;
        mutate(&mut entry.model.params);
        entry.cached = None;
        entry.state = ProjectState::Editing;
        let became_dirty = !entry.model.dirty;
        entry.model.dirty = true;
        if became_dirty {
            self.notify(StoreEvent::DirtyChanged { id, dirty: true });
        }
        Ok(())
    }

    /// Validate a project's parameters and advance it to `Validated`.
    pub fn validate(&mut self, id: ProjectId) -> CalcResult<()> {
        let entry = self.entry_mut(id)?;
        entry.model.validate()?;
        entry.state = ProjectState::Validated;
        Ok(())
    }

    /// Run the calculation and cache the result.
    ///
    /// On failure the project keeps the state it had before the attempt,
    /// so a recoverable lookup miss does not strand it half-advanced.
    pub fn calculate(
        &mut self,
        id: ProjectId,
        crane_store: &dyn CraneSpecStore,
    ) -> CalcResult<CalculationResult> {
        let previous = self
            .state(id)
            .ok_or_else(|| CalcError::internal(format!("unknown project {id}")))?;
        self.validate(id)?;

        let entry = self.entry_mut(id)?;
        match dispatch::calculate(&entry.model, crane_store) {
            Ok(result) => {
                entry.cached = Some(result.clone());
                entry.state = ProjectState::Calculated;
                Ok(result)
            }
            Err(e) => {
                entry.state = previous;
                Err(e)
            }
        }
    }

    /// Record that a report was produced from the cached result.
    pub fn mark_reported(&mut self, id: ProjectId) -> CalcResult<()> {
        let entry = self.entry_mut(id)?;
        if entry.state != ProjectState::Calculated {
            return Err(CalcError::internal(format!(
                "project {id} has no current calculation to report"
            )));
        }
        entry.state = ProjectState::Reported;
        Ok(())
    }

    /// Clear the dirty flag after a successful save.
    pub fn mark_saved(&mut self, id: ProjectId) -> CalcResult<()> {
        let entry = self.entry_mut(id)?;
        if entry.model.dirty {
            entry.model.dirty = false;
            self.notify(StoreEvent::DirtyChanged { id, dirty: false });
        }
        Ok(())
    }

    /// Close a project, returning whether it still had unsaved edits so
    /// the shell can prompt before the data is gone.
    pub fn close(&mut self, id: ProjectId) -> CalcResult<bool> {
        let entry = self
            .entries
            .remove(&id)
            .ok_or_else(|| CalcError::internal(format!("unknown project {id}")))?;
        self.order.retain(|other| *other != id);
        self.notify(StoreEvent::Removed(id));
        Ok(entry.model.dirty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crane_db::MemoryCraneStore;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_lifecycle_walk() {
        let mut store = ProjectStore::new();
        let crane_db = MemoryCraneStore::new();
        let id = store.add(ParameterModel::new_slope("Pit A"));
        assert_eq!(store.state(id), Some(ProjectState::Created));

        store.update(id, |params| {
            if let CalculationParams::Slope(m) = params {
                m.cohesion = 12.0;
            }
        })
        .unwrap();
        assert_eq!(store.state(id), Some(ProjectState::Editing));

        store.validate(id).unwrap();
        assert_eq!(store.state(id), Some(ProjectState::Validated));

        store.calculate(id, &crane_db).unwrap();
        assert_eq!(store.state(id), Some(ProjectState::Calculated));
        assert!(store.cached_result(id).is_some());

        store.mark_reported(id).unwrap();
        assert_eq!(store.state(id), Some(ProjectState::Reported));

        let was_dirty = store.close(id).unwrap();
        assert!(was_dirty);
        assert!(store.get(id).is_none());
    }

    #[test]
    fn test_edit_invalidates_cache() {
        let mut store = ProjectStore::new();
        let crane_db = MemoryCraneStore::new();
        let id = store.add(ParameterModel::new_slope("Pit A"));

        store.calculate(id, &crane_db).unwrap();
        assert!(store.cached_result(id).is_some());

        store.update(id, |params| {
            if let CalculationParams::Slope(m) = params {
                m.unit_weight = 19.0;
            }
        })
        .unwrap();
        assert!(store.cached_result(id).is_none());
        assert_eq!(store.state(id), Some(ProjectState::Editing));
    }

    #[test]
    fn test_failed_calculation_restores_state() {
        let mut store = ProjectStore::new();
        let crane_db = MemoryCraneStore::sample();
        let id = store.add(ParameterModel::new_truck_crane("Lift 3"));

        store.update(id, |params| {
            if let CalculationParams::TruckCrane(m) = params {
                m.manufacturer = "XCMG".to_string();
                m.model = "QY999".to_string();
            }
        })
        .unwrap();

        let err = store.calculate(id, &crane_db).unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(store.state(id), Some(ProjectState::Editing));
        assert!(store.cached_result(id).is_none());
    }

    #[test]
    fn test_reporting_requires_calculation() {
        let mut store = ProjectStore::new();
        let id = store.add(ParameterModel::new_slope("Pit A"));
        assert!(store.mark_reported(id).is_err());
    }

    #[test]
    fn test_observer_notifications() {
        let events: Rc<RefCell<Vec<StoreEvent>>> = Rc::default();
        let sink = Rc::clone(&events);

        let mut store = ProjectStore::new();
        store.subscribe(move |event| sink.borrow_mut().push(event.clone()));

        let id = store.add(ParameterModel::new_slope("Pit A"));
        store.rename(id, "Pit B").unwrap();
        store.mark_saved(id).unwrap();
        store.close(id).unwrap();

        let events = events.borrow();
        assert_eq!(events[0], StoreEvent::Added(id));
        assert_eq!(
            events[1],
            StoreEvent::Renamed {
                id,
                name: "Pit B".to_string()
            }
        );
        assert_eq!(events[2], StoreEvent::DirtyChanged { id, dirty: true });
        assert_eq!(events[3], StoreEvent::DirtyChanged { id, dirty: false });
        assert_eq!(events[4], StoreEvent::Removed(id));
    }

    #[test]
    fn test_listing_keeps_insertion_order() {
        let mut store = ProjectStore::new();
        let a = store.add(ParameterModel::new_slope("A"));
        let b = store.add(ParameterModel::new_truck_crane("B"));
        let c = store.add(ParameterModel::new_slope("C"));
        assert_eq!(store.list(), &[a, b, c]);

        store.close(b).unwrap();
        assert_eq!(store.list(), &[a, c]);
    }
}
