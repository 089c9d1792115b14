use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

use crate::config::HomeConfig;
use crate::merge::reconcile;
use crate::snapshot::Snapshot;
use crate::source::SnapshotSource;
use crate::thermostat::Thermostat;
use crate::Result;

type UpdateCallback = Box<dyn Fn(&NexiaHome) + Send + Sync>;

pub struct HomeBuilder {
    config: HomeConfig,
    update_callbacks: Vec<UpdateCallback>,
}

impl HomeBuilder {
    pub fn new() -> Self {
        Self::from_config(HomeConfig::default())
    }

    pub fn from_config(config: HomeConfig) -> Self {
        Self {
            config,
            update_callbacks: Vec::new(),
        }
    }

    pub fn house_id(mut self, id: i64) -> Self {
        self.config.house_id = Some(id);
        self
    }

    /// Called after every successful merge, once the new state is visible.
    pub fn on_update(mut self, f: impl Fn(&NexiaHome) + Send + Sync + 'static) -> Self {
        self.update_callbacks.push(Box::new(f));
        self
    }

    pub fn build(self) -> NexiaHome {
        NexiaHome {
            inner: Arc::new(HomeInner {
                config: self.config,
                update_callbacks: self.update_callbacks,
                state: RwLock::new(HomeState::default()),
            }),
        }
    }
}

impl Default for HomeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Root of the thermostat/zone graph for one Nexia account.
///
/// `NexiaHome` is a cheap handle; clones refer to the same home. Each merge
/// holds the home's write lock for its full duration, so concurrent readers of
/// the home never see a half-reconciled thermostat list.
#[derive(Clone)]
pub struct NexiaHome {
    inner: Arc<HomeInner>,
}

pub(crate) struct HomeInner {
    config: HomeConfig,
    update_callbacks: Vec<UpdateCallback>,
    state: RwLock<HomeState>,
}

#[derive(Default)]
struct HomeState {
    house_id: Option<i64>,
    name: Option<String>,
    thermostats: Vec<Thermostat>,
    last_update: Option<DateTime<Utc>>,
}

impl NexiaHome {
    pub fn new() -> Self {
        HomeBuilder::new().build()
    }

    pub fn builder() -> HomeBuilder {
        HomeBuilder::new()
    }

    pub(crate) fn from_inner(inner: Arc<HomeInner>) -> Self {
        Self { inner }
    }

    pub fn config(&self) -> &HomeConfig {
        &self.inner.config
    }

    /// Merges a full `houses` document into the graph.
    ///
    /// The document is parsed completely before anything is touched; on error
    /// the existing thermostats and zones are left as they were.
    pub fn update_from_snapshot(&self, document: &Value) -> Result<()> {
        let houses = Snapshot::parse_selected(document, self.inner.config.house_id)?.houses;

        let house_id = houses.first().and_then(|h| h.id);
        let name = houses.first().and_then(|h| h.name.clone());
        let incoming = houses.into_iter().flat_map(|h| h.thermostats);
        let owner = Arc::downgrade(&self.inner);

        {
            let mut state = self.inner.state.write();
            let counts = reconcile(
                &mut state.thermostats,
                incoming,
                |t| t.record.id,
                |thermostat, t| thermostat.apply(t),
                |t| Thermostat::new(t, owner.clone()),
            );
            state.house_id = house_id;
            state.name = name;
            state.last_update = Some(Utc::now());
            debug!(
                house = ?house_id,
                added = counts.added,
                updated = counts.updated,
                removed = counts.removed,
                "merged snapshot"
            );
        }

        for cb in &self.inner.update_callbacks {
            cb(self);
        }
        Ok(())
    }

    pub fn update_from_str(&self, body: &str) -> Result<()> {
        let document: Value = serde_json::from_str(body)?;
        self.update_from_snapshot(&document)
    }

    /// Fetches a document from `source` and merges it.
    pub fn refresh(&self, source: &mut impl SnapshotSource) -> Result<()> {
        let document = source.fetch_snapshot()?;
        self.update_from_snapshot(&document)
    }

    pub fn get_thermostat_ids(&self) -> Vec<i64> {
        self.inner
            .state
            .read()
            .thermostats
            .iter()
            .map(Thermostat::get_id)
            .collect()
    }

    pub fn get_thermostat_by_id(&self, id: i64) -> Option<Thermostat> {
        self.inner
            .state
            .read()
            .thermostats
            .iter()
            .find(|t| t.get_id() == id)
            .cloned()
    }

    pub fn has_thermostat(&self, id: i64) -> bool {
        self.inner.state.read().thermostats.iter().any(|t| t.get_id() == id)
    }

    pub fn thermostats(&self) -> Vec<Thermostat> {
        self.inner.state.read().thermostats.clone()
    }

    /// Id of the (first) merged house.
    pub fn house_id(&self) -> Option<i64> {
        self.inner.state.read().house_id
    }

    pub fn name(&self) -> Option<String> {
        self.inner.state.read().name.clone()
    }

    /// When the last successful merge finished; `None` before the first one.
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.inner.state.read().last_update
    }
}

impl Default for NexiaHome {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for NexiaHome {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for NexiaHome {}

impl fmt::Debug for NexiaHome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.read();
        f.debug_struct("NexiaHome")
            .field("house_id", &state.house_id)
            .field("name", &state.name)
            .field("thermostats", &state.thermostats)
            .field("last_update", &state.last_update)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use serde_json::json;

    fn document(houses: Value) -> Value {
        json!({"success": true, "result": {"_links": {}, "houses": houses}})
    }

    #[test]
    fn queries_before_first_merge() {
        let home = NexiaHome::new();
        assert!(home.get_thermostat_ids().is_empty());
        assert!(home.get_thermostat_by_id(1).is_none());
        assert!(home.last_update().is_none());
        assert!(home.name().is_none());
    }

    #[test]
    fn failed_parse_leaves_graph_untouched() {
        let home = NexiaHome::new();
        home.update_from_snapshot(&document(json!([{"id": 1, "thermostats": [{"id": 5}]}])))
            .unwrap();
        let stamp = home.last_update();

        let err = home
            .update_from_snapshot(&json!({"result": {"houses": [{"id": 1}]}}))
            .unwrap_err();
        assert!(matches!(err, Error::MissingKey("thermostats")));
        assert_eq!(home.get_thermostat_ids(), vec![5]);
        assert_eq!(home.last_update(), stamp);
    }

    #[test]
    fn all_houses_merged_in_order() {
        let home = NexiaHome::new();
        home.update_from_snapshot(&document(json!([
            {"id": 1, "name": "Main", "thermostats": [{"id": 5}, {"id": 6}]},
            {"id": 2, "name": "Lake", "thermostats": [{"id": 7}]}
        ])))
        .unwrap();
        assert_eq!(home.get_thermostat_ids(), vec![5, 6, 7]);
        assert_eq!(home.house_id(), Some(1));
        assert_eq!(home.name().as_deref(), Some("Main"));
    }

    #[test]
    fn configured_house_is_selected() {
        let home = NexiaHome::builder().house_id(2).build();
        home.update_from_snapshot(&document(json!([
            {"id": 1, "thermostats": [{"id": 5}]},
            {"id": 2, "name": "Lake", "thermostats": [{"id": 7}]}
        ])))
        .unwrap();
        assert_eq!(home.get_thermostat_ids(), vec![7]);
        assert_eq!(home.name().as_deref(), Some("Lake"));

        let err = home
            .update_from_snapshot(&document(json!([{"id": 1, "thermostats": []}])))
            .unwrap_err();
        assert!(matches!(err, Error::HouseNotFound(2)));
        assert_eq!(home.get_thermostat_ids(), vec![7]);

        home.update_from_snapshot(&document(json!([
            {"id": 1},
            {"id": 2, "thermostats": [{"id": 7}, {"id": 8}]}
        ])))
        .unwrap();
        assert_eq!(home.get_thermostat_ids(), vec![7, 8]);
    }

    #[test]
    fn thermostat_points_back_to_home() {
        let home = NexiaHome::new();
        home.update_from_snapshot(&document(json!([{"id": 1, "thermostats": [{"id": 5}]}])))
            .unwrap();
        let thermostat = home.get_thermostat_by_id(5).unwrap();
        assert_eq!(thermostat.home(), Some(home.clone()));
    }

    #[test]
    fn update_from_str_reports_bad_json() {
        let home = NexiaHome::new();
        let err = home.update_from_str("{not json").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }
}
