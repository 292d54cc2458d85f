//! Daily quota on provider page requests.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub trait RequestBudget: Send + Sync {
    /// Counts one request, `false` when today's quota is already used up.
    fn try_consume(&self) -> bool;

    fn used_today(&self) -> u32;
}

/// Requests counted on one local calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    pub day: NaiveDate,
    pub count: u32,
}

impl DailyCount {
    pub fn new(day: NaiveDate) -> Self {
        Self { day, count: 0 }
    }

    /// `limit == 0` is unlimited. A new day resets the count.
    pub fn try_consume(&mut self, today: NaiveDate, limit: u32) -> bool {
        if self.day != today {
            *self = Self::new(today);
        }

        if limit != 0 && self.count >= limit {
            return false;
        }

        self.count += 1;
        true
    }

    pub fn used_on(&self, today: NaiveDate) -> u32 {
        if self.day == today { self.count } else { 0 }
    }
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Process-local budget, forgotten on exit.
#[derive(Debug)]
pub struct MemoryRequestBudget {
    limit: u32,
    state: Mutex<DailyCount>,
}

impl MemoryRequestBudget {
    pub fn new(limit: u32) -> Self {
        Self { limit, state: Mutex::new(DailyCount::new(local_today())) }
    }

    pub fn unlimited() -> Self {
        Self::new(0)
    }

    pub fn try_consume_on(&self, today: NaiveDate) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.try_consume(today, self.limit)
    }
}

impl RequestBudget for MemoryRequestBudget {
    fn try_consume(&self) -> bool {
        self.try_consume_on(local_today())
    }

    fn used_today(&self) -> u32 {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.used_on(local_today())
    }
}

/// Budget persisted as a small TOML file so the quota survives restarts.
#[derive(Debug)]
pub struct FileRequestBudget {
    path: PathBuf,
    limit: u32,
    lock: Mutex<()>,
}

impl FileRequestBudget {
    pub fn new(path: PathBuf, limit: u32) -> Self {
        Self { path, limit, lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    fn read(&self, today: NaiveDate) -> Result<DailyCount> {
        if !self.path.exists() {
            return Ok(DailyCount::new(today));
        }

        let contents = fs::read_to_string(&self.path).with_context(|| {
            format!("Failed to read request budget: {}", self.path.display())
        })?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse request budget: {}", self.path.display()))
    }

    fn write(&self, state: &DailyCount) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create request budget directory: {}", parent.display())
            })?;
        }

        let toml = toml::to_string(state).context("Failed to serialize request budget")?;

        fs::write(&self.path, toml)
            .with_context(|| format!("Failed to write request budget: {}", self.path.display()))
    }

    pub fn try_consume_on(&self, today: NaiveDate) -> Result<bool> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut state = self.read(today)?;
        let granted = state.try_consume(today, self.limit);
        if granted {
            self.write(&state)?;
        }

        Ok(granted)
    }

    pub fn used_on(&self, today: NaiveDate) -> Result<u32> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        Ok(self.read(today)?.used_on(today))
    }
}

impl RequestBudget for FileRequestBudget {
    fn try_consume(&self) -> bool {
        match self.try_consume_on(local_today()) {
            Ok(granted) => granted,
            Err(err) => {
                warn!("request budget unavailable, refusing request: {err:#}");
                false
            }
        }
    }

    fn used_today(&self) -> u32 {
        self.used_on(local_today()).unwrap_or_else(|err| {
            warn!("request budget unavailable: {err:#}");
            0
        })
    }
}
