//! Saved route history
//!
//! A small JSON key-value file: the entries live as an array under the
//! `route_history` key. Other keys in the file are left untouched. There is
//! no schema version; unreadable files are logged and treated as empty.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use tracing::{info, warn};
use uuid::Uuid;

use super::display::{parse_clock, parse_distance_km, parse_duration_minutes};
use crate::defaults::default_departure;
use crate::types::{
    DriverAssignment, HistoryStatus, LegacyRouteRecord, Leg, Route, RouteHistoryEntry, Stop,
};

pub const HISTORY_KEY: &str = "route_history";

/// File-backed route history
pub struct RouteHistoryStore {
    path: PathBuf,
    entries: RwLock<Vec<RouteHistoryEntry>>,
}

impl RouteHistoryStore {
    /// Open the store at `path`, loading existing entries if present
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = Self::load_from_disk(&path).unwrap_or_default();
        if !entries.is_empty() {
            info!("Loaded {} saved routes from {}", entries.len(), path.display());
        }
        Self {
            path,
            entries: RwLock::new(entries),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get_all(&self) -> Vec<RouteHistoryEntry> {
        self.entries.read().clone()
    }

    /// Latest saved entry with this route id, optionally within one plan
    pub fn get(&self, plan_id: Option<Uuid>, id: &str) -> Option<RouteHistoryEntry> {
        self.entries
            .read()
            .iter()
            .filter(|e| matches_key(e, plan_id, id))
            .max_by_key(|e| e.saved_at)
            .cloned()
    }

    pub fn by_status(&self, status: HistoryStatus) -> Vec<RouteHistoryEntry> {
        self.entries
            .read()
            .iter()
            .filter(|e| e.status == status)
            .cloned()
            .collect()
    }

    /// Insert or replace a route. A route already saved from the same plan
    /// keeps its save date and status; a new one is stamped now and marked
    /// completed.
    pub fn save(&self, route: Route) -> Result<RouteHistoryEntry> {
        let mut entries = self.entries.write();
        let mut updated = entries.clone();

        let saved = match updated
            .iter_mut()
            .find(|e| e.route.plan_id == route.plan_id && e.route.id == route.id)
        {
            Some(entry) => {
                entry.route = route;
                entry.clone()
            }
            None => {
                let entry = RouteHistoryEntry {
                    route,
                    saved_at: Utc::now(),
                    status: HistoryStatus::Completed,
                };
                updated.push(entry.clone());
                entry
            }
        };

        self.commit(&mut entries, updated)?;
        Ok(saved)
    }

    /// Change the status of a saved route. Returns false if not found.
    pub fn set_status(&self, plan_id: Option<Uuid>, id: &str, status: HistoryStatus) -> Result<bool> {
        let mut entries = self.entries.write();
        let mut updated = entries.clone();
        let mut found = false;
        for entry in updated.iter_mut().filter(|e| matches_key(e, plan_id, id)) {
            entry.status = status;
            found = true;
        }
        if found {
            self.commit(&mut entries, updated)?;
        }
        Ok(found)
    }

    /// Delete matching entries. Returns how many were removed.
    pub fn delete(&self, plan_id: Option<Uuid>, id: &str) -> Result<usize> {
        let mut entries = self.entries.write();
        let updated: Vec<RouteHistoryEntry> = entries
            .iter()
            .filter(|e| !matches_key(e, plan_id, id))
            .cloned()
            .collect();
        let removed = entries.len() - updated.len();
        if removed > 0 {
            self.commit(&mut entries, updated)?;
        }
        Ok(removed)
    }

    /// Import routes exported by the browser dashboard. Every imported
    /// batch gets its own plan id. Records that do not start and end at the
    /// same depot are skipped.
    pub fn import_legacy(&self, records: Vec<LegacyRouteRecord>) -> Result<usize> {
        let plan_id = Uuid::new_v4();
        let imported: Vec<RouteHistoryEntry> = records
            .into_iter()
            .map(|record| legacy_to_entry(record, plan_id))
            .filter(|entry| {
                let closed = entry.route.is_closed_loop();
                if !closed {
                    warn!(
                        "Skipping imported route {} ({} stops): not a closed depot loop",
                        entry.route.id,
                        entry.route.stops.len()
                    );
                }
                closed
            })
            .collect();
        let count = imported.len();

        let mut entries = self.entries.write();
        let mut updated = entries.clone();
        updated.extend(imported);
        self.commit(&mut entries, updated)?;

        info!("Imported {} legacy routes as plan {}", count, plan_id);
        Ok(count)
    }

    /// Write `updated` to disk, then make it the in-memory state.
    fn commit(&self, entries: &mut Vec<RouteHistoryEntry>, updated: Vec<RouteHistoryEntry>) -> Result<()> {
        self.save_to_disk(&updated)?;
        *entries = updated;
        Ok(())
    }

    fn load_from_disk(path: &Path) -> Option<Vec<RouteHistoryEntry>> {
        if !path.exists() {
            return None;
        }
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read route history file: {}", e);
                return None;
            }
        };
        let mut root: Map<String, Value> = match serde_json::from_str(&content) {
            Ok(root) => root,
            Err(e) => {
                warn!("Failed to parse route history file: {}", e);
                return None;
            }
        };
        let value = root.remove(HISTORY_KEY)?;
        match serde_json::from_value(value) {
            Ok(entries) => Some(entries),
            Err(e) => {
                warn!("Failed to parse saved routes: {}", e);
                None
            }
        }
    }

    fn save_to_disk(&self, entries: &[RouteHistoryEntry]) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create {}", dir.display()))?;
            }
        }

        let mut root: Map<String, Value> = std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default();
        root.insert(
            HISTORY_KEY.to_string(),
            serde_json::to_value(entries).context("Failed to serialize route history")?,
        );

        let json = serde_json::to_string_pretty(&root).context("Failed to serialize route history")?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }
}

fn matches_key(entry: &RouteHistoryEntry, plan_id: Option<Uuid>, id: &str) -> bool {
    entry.route.id == id && plan_id.map_or(true, |p| entry.route.plan_id == p)
}

/// Place `time` on the first date at or after `previous`.
fn roll_forward(previous: NaiveDateTime, time: NaiveTime) -> NaiveDateTime {
    let candidate = previous.date().and_time(time);
    if candidate < previous {
        candidate + Days::new(1)
    } else {
        candidate
    }
}

fn legacy_to_entry(record: LegacyRouteRecord, plan_id: Uuid) -> RouteHistoryEntry {
    let date: NaiveDate = record.date.date_naive();
    let departure = date.and_time(parse_clock(&record.departure_time).unwrap_or_else(default_departure));

    let mut cursor = departure;
    let stops = record
        .stops
        .into_iter()
        .enumerate()
        .map(|(index, legacy)| {
            let arrival = legacy
                .calculated_arrival_time
                .as_deref()
                .and_then(parse_clock)
                .map(|t| roll_forward(cursor, t));
            if let Some(a) = arrival {
                cursor = a;
            }
            let start = legacy
                .calculated_start_time
                .as_deref()
                .and_then(parse_clock)
                .map(|t| roll_forward(cursor, t));
            if let Some(s) = start {
                cursor = s;
            }
            Stop {
                id: legacy.id,
                address: legacy.address,
                role: legacy.role,
                time_window: legacy.time_window,
                items: legacy.items,
                arrival,
                start,
                leg: legacy
                    .calculated_travel_time
                    .filter(|_| index > 0)
                    .map(Leg::imported),
            }
        })
        .collect();

    let driver = record.driver_name.map(|driver_name| DriverAssignment {
        driver_id: record.driver_id,
        driver_name,
    });

    RouteHistoryEntry {
        route: Route {
            plan_id,
            id: record.id,
            name: record.route_name,
            vehicle_id: record.vehicle_id,
            vehicle_name: record.vehicle_name,
            capacity: record.capacity.unwrap_or_else(|| "Unknown".to_string()),
            driver,
            stops,
            departure,
            total_distance_meters: parse_distance_km(&record.total_distance) * 1000,
            total_duration_seconds: parse_duration_minutes(&record.estimated_time) * 60,
            from: record.from,
            to: record.to,
            color: record.color,
        },
        saved_at: record.date,
        status: record.status,
    }
}

/// Read a legacy export file (a JSON array of dashboard route records)
pub fn read_legacy_file(path: &Path) -> Result<Vec<LegacyRouteRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse legacy route history in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::rollup::compute_stats;
    use crate::types::StopRole;

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("agriroute-history-{}", Uuid::new_v4()))
            .join("route_history.json")
    }

    fn route(plan_id: Uuid, id: &str) -> Route {
        Route {
            plan_id,
            id: id.to_string(),
            name: format!("Harvest.{}", id),
            vehicle_id: "1".to_string(),
            vehicle_name: "TN-01".to_string(),
            capacity: "Unknown".to_string(),
            driver: None,
            stops: vec![],
            departure: NaiveDate::from_ymd_opt(2026, 3, 2)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
            total_distance_meters: 10_000,
            total_duration_seconds: 3_600,
            from: "Depot".to_string(),
            to: "Depot".to_string(),
            color: None,
        }
    }

    #[test]
    fn test_missing_file_is_empty() {
        let store = RouteHistoryStore::open(temp_path());
        assert!(store.get_all().is_empty());
    }

    #[test]
    fn test_save_new_route_stamps_completed() {
        let store = RouteHistoryStore::open(temp_path());
        let entry = store.save(route(Uuid::new_v4(), "route-1")).unwrap();

        assert_eq!(entry.status, HistoryStatus::Completed);
        assert_eq!(store.get_all().len(), 1);
    }

    #[test]
    fn test_save_same_route_replaces() {
        let store = RouteHistoryStore::open(temp_path());
        let plan = Uuid::new_v4();
        let first = store.save(route(plan, "route-1")).unwrap();
        store.set_status(Some(plan), "route-1", HistoryStatus::Planned).unwrap();

        let mut updated = route(plan, "route-1");
        updated.total_distance_meters = 99_000;
        let second = store.save(updated).unwrap();

        assert_eq!(store.get_all().len(), 1);
        assert_eq!(second.saved_at, first.saved_at);
        assert_eq!(second.status, HistoryStatus::Planned);
        assert_eq!(second.route.total_distance_meters, 99_000);
    }

    #[test]
    fn test_same_route_id_from_different_plans_kept_apart() {
        let store = RouteHistoryStore::open(temp_path());
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        store.save(route(a, "route-1")).unwrap();
        store.save(route(b, "route-1")).unwrap();

        assert_eq!(store.get_all().len(), 2);
        assert_eq!(store.get(Some(a), "route-1").unwrap().route.plan_id, a);
        assert!(store.get(None, "route-1").is_some());
        assert!(store.get(None, "route-9").is_none());
    }

    #[test]
    fn test_persists_across_reopen() {
        let path = temp_path();
        let plan = Uuid::new_v4();
        {
            let store = RouteHistoryStore::open(&path);
            store.save(route(plan, "route-1")).unwrap();
            store.save(route(plan, "route-2")).unwrap();
        }

        let reopened = RouteHistoryStore::open(&path);
        assert_eq!(reopened.get_all().len(), 2);
        assert_eq!(reopened.get(Some(plan), "route-2").unwrap().route.name, "Harvest.route-2");
    }

    #[test]
    fn test_entries_live_under_namespaced_key_and_other_keys_survive() {
        let path = temp_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{"theme": "dark"}"#).unwrap();

        let store = RouteHistoryStore::open(&path);
        store.save(route(Uuid::new_v4(), "route-1")).unwrap();

        let root: Map<String, Value> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(root["theme"], "dark");
        assert_eq!(root[HISTORY_KEY].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_corrupt_file_treated_as_empty() {
        let path = temp_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "not json").unwrap();

        let store = RouteHistoryStore::open(&path);
        assert!(store.get_all().is_empty());
    }

    #[test]
    fn test_delete() {
        let store = RouteHistoryStore::open(temp_path());
        let plan = Uuid::new_v4();
        store.save(route(plan, "route-1")).unwrap();
        store.save(route(plan, "route-2")).unwrap();

        assert_eq!(store.delete(Some(plan), "route-1").unwrap(), 1);
        assert_eq!(store.delete(None, "route-1").unwrap(), 0);
        assert_eq!(store.get_all().len(), 1);
    }

    #[test]
    fn test_by_status() {
        let store = RouteHistoryStore::open(temp_path());
        let plan = Uuid::new_v4();
        store.save(route(plan, "route-1")).unwrap();
        store.save(route(plan, "route-2")).unwrap();
        store.set_status(None, "route-2", HistoryStatus::InProgress).unwrap();

        assert_eq!(store.by_status(HistoryStatus::Completed).len(), 1);
        assert_eq!(store.by_status(HistoryStatus::InProgress)[0].route.id, "route-2");
        assert!(!store.set_status(None, "route-7", HistoryStatus::Planned).unwrap());
    }

    #[test]
    fn test_import_legacy_records() {
        let json = r#"[
            {
                "id": "route-1", "routeName": "Harvest.1",
                "vehicleName": "TN-09", "vehicleId": "2",
                "driverId": "5", "driverName": "Ravi",
                "totalDistance": "10 km", "estimatedTime": "5h 30m",
                "departureTime": "10:00 PM", "arrivalTime": "1:00 AM",
                "from": "Chennai Depot", "to": "Chennai Depot",
                "stops": [
                    {"id": "stop-0-depot", "address": "Chennai", "type": "pickup",
                     "timeWindow": "8:00 - 9:00", "items": ["Depot"],
                     "calculatedArrivalTime": "-", "calculatedStartTime": "10:00 PM",
                     "calculatedTravelTime": 0},
                    {"id": "stop-0-0", "address": "Erode", "type": "pickup",
                     "timeWindow": "8:00 - 9:00", "items": ["100kg"],
                     "calculatedArrivalTime": "11:30 PM", "calculatedStartTime": "12:00 AM",
                     "calculatedTravelTime": 90},
                    {"id": "stop-0-depot-return", "address": "Chennai", "type": "delivery",
                     "timeWindow": "8:00 - 9:00", "items": ["Depot"],
                     "calculatedArrivalTime": "1:00 AM", "calculatedStartTime": "-",
                     "calculatedTravelTime": 60}
                ],
                "date": "2025-04-01T10:00:00Z", "status": "completed"
            },
            {
                "id": "route-2", "routeName": "Harvest.2",
                "totalDistance": "25 km", "estimatedTime": "45m",
                "departureTime": "9:00 AM",
                "stops": [
                    {"id": "stop-1-depot", "address": "Salem", "type": "pickup"},
                    {"id": "stop-1-0", "address": "Mettur", "type": "pickup"},
                    {"id": "stop-1-depot-return", "address": "Salem", "type": "delivery"}
                ],
                "date": "2025-04-01T10:00:00Z", "status": "planned"
            },
            {
                "id": "route-3", "routeName": "Harvest.3",
                "totalDistance": "99 km", "estimatedTime": "1h 0m",
                "date": "2025-04-01T10:00:00Z", "status": "completed"
            },
            {
                "id": "route-4", "routeName": "Harvest.4",
                "totalDistance": "99 km", "estimatedTime": "1h 0m",
                "stops": [
                    {"id": "stop-3-depot", "address": "Chennai", "type": "pickup"},
                    {"id": "stop-3-0", "address": "Erode", "type": "delivery"}
                ],
                "date": "2025-04-01T10:00:00Z", "status": "completed"
            }
        ]"#;
        let path = temp_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let export = path.with_file_name("export.json");
        std::fs::write(&export, json).unwrap();

        let store = RouteHistoryStore::open(&path);
        let records = read_legacy_file(&export).unwrap();
        assert_eq!(store.import_legacy(records).unwrap(), 2);

        let first = store.get(None, "route-1").unwrap().route;
        let day = |d: u32, h: u32, m: u32| {
            NaiveDate::from_ymd_opt(2025, 4, d).unwrap().and_hms_opt(h, m, 0).unwrap()
        };
        assert_eq!(first.departure, day(1, 22, 0));
        assert_eq!(first.stops[0].arrival, None);
        assert_eq!(first.stops[1].arrival, Some(day(1, 23, 30)));
        assert_eq!(first.stops[1].start, Some(day(2, 0, 0)));
        assert_eq!(first.stops[2].arrival, Some(day(2, 1, 0)));
        assert_eq!(first.stops[2].start, None);
        assert_eq!(first.stops[2].role, StopRole::Delivery);
        assert_eq!(first.driver.as_ref().unwrap().driver_name, "Ravi");
        assert_eq!(first.total_duration_seconds, 330 * 60);

        // Travel times become time-only legs; the depot stop has none
        assert_eq!(first.stops[0].leg, None);
        assert_eq!(first.stops[1].leg, Some(Leg::imported(90.0)));
        assert_eq!(first.stops[2].leg.unwrap().duration_seconds, 3_600);
        assert_eq!(first.estimated_leg_count(), 0);

        // Stopless and open routes were skipped
        assert!(store.get(None, "route-3").is_none());
        assert!(store.get(None, "route-4").is_none());

        let all: Vec<Route> = store.get_all().into_iter().map(|e| e.route).collect();
        let stats = compute_stats(&all);
        assert_eq!(stats.distance_km, 35);
        assert_eq!(stats.orders, 2);
        assert_eq!(store.by_status(HistoryStatus::Planned).len(), 1);
    }

    #[test]
    fn test_failed_write_leaves_entries_unchanged() {
        let dir = std::env::temp_dir().join(format!("agriroute-history-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let blocker = dir.join("not-a-dir");
        std::fs::write(&blocker, "file").unwrap();

        let plan = Uuid::new_v4();
        let mut store = RouteHistoryStore::open(dir.join("route_history.json"));
        store.save(route(plan, "route-1")).unwrap();

        // Parent of the history file is a regular file, so every write fails
        store.path = blocker.join("route_history.json");

        assert!(store.save(route(plan, "route-2")).is_err());
        assert!(store.set_status(Some(plan), "route-1", HistoryStatus::Planned).is_err());
        assert!(store.delete(Some(plan), "route-1").is_err());

        let entries = store.get_all();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].route.id, "route-1");
        assert_eq!(entries[0].status, HistoryStatus::Completed);
    }

    #[test]
    fn test_roll_forward() {
        let prev = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap().and_hms_opt(23, 0, 0).unwrap();
        let t = NaiveTime::from_hms_opt(0, 30, 0).unwrap();
        assert_eq!(roll_forward(prev, t).date(), NaiveDate::from_ymd_opt(2025, 4, 2).unwrap());
        let later = NaiveTime::from_hms_opt(23, 30, 0).unwrap();
        assert_eq!(roll_forward(prev, later).date(), prev.date());
    }
}
