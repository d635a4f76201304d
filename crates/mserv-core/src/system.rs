// Simulated host metrics for the system panel. Nothing here reads the real
// machine; values drift randomly within plausible bounds.
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystemSnapshot {
    /// Percent
    pub cpu: f64,
    /// GB
    pub ram: f64,
    /// Percent
    pub disk: f64,
    /// °C
    pub temperature: f64,
    /// MB/s
    pub network: f64,
    pub active_services: u32,
    pub total_services: u32,
}

impl Default for SystemSnapshot {
    fn default() -> Self {
        Self {
            cpu: 12.0,
            ram: 4.2,
            disk: 75.0,
            temperature: 34.0,
            network: 12.4,
            active_services: 18,
            total_services: 18,
        }
    }
}

impl SystemSnapshot {
    /// Share of services that are down, in percent
    pub fn services_down_percent(&self) -> f64 {
        if self.total_services == 0 {
            return 0.0;
        }
        100.0 - f64::from(self.active_services) / f64::from(self.total_services) * 100.0
    }

    pub fn status(&self) -> SystemStatus {
        SystemStatus {
            cpu: StatusLevel::from_thresholds(self.cpu, 70.0, 90.0),
            disk: StatusLevel::from_thresholds(self.disk, 80.0, 90.0),
            temperature: StatusLevel::from_thresholds(self.temperature, 50.0, 70.0),
            services: StatusLevel::from_thresholds(self.services_down_percent(), 20.0, 50.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StatusLevel {
    Good,
    Warning,
    Error,
}

impl StatusLevel {
    pub fn from_thresholds(value: f64, warning: f64, error: f64) -> Self {
        if value >= error {
            Self::Error
        } else if value >= warning {
            Self::Warning
        } else {
            Self::Good
        }
    }
}

/// Per-metric status for the gauges that have thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemStatus {
    pub cpu: StatusLevel,
    pub disk: StatusLevel,
    pub temperature: StatusLevel,
    pub services: StatusLevel,
}

impl SystemStatus {
    fn levels(&self) -> [StatusLevel; 4] {
        [self.cpu, self.disk, self.temperature, self.services]
    }

    pub fn count(&self, level: StatusLevel) -> usize {
        self.levels().iter().filter(|l| **l == level).count()
    }

    pub fn summary(&self) -> HealthSummary {
        let errors = self.count(StatusLevel::Error);
        let warnings = self.count(StatusLevel::Warning);

        if errors > 0 {
            HealthSummary {
                level: StatusLevel::Error,
                title: "Problèmes système détectés".to_string(),
                description: format!("{} problème(s) critique(s) à résoudre", errors),
            }
        } else if warnings > 0 {
            HealthSummary {
                level: StatusLevel::Warning,
                title: "Quelques avertissements".to_string(),
                description: format!("{} point(s) à surveiller", warnings),
            }
        } else {
            HealthSummary {
                level: StatusLevel::Good,
                title: "Système en bonne santé".to_string(),
                description: "Tous les services sont opérationnels".to_string(),
            }
        }
    }
}

/// The headline card above the gauges
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthSummary {
    pub level: StatusLevel,
    pub title: String,
    pub description: String,
}

impl fmt::Display for HealthSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.description)
    }
}

/// Random walk over a `SystemSnapshot`
pub struct SystemSimulator<R: Rng = StdRng> {
    snapshot: SystemSnapshot,
    rng: R,
}

impl SystemSimulator<StdRng> {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Reproducible sequence, for tests
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl Default for SystemSimulator<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> SystemSimulator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            snapshot: SystemSnapshot::default(),
            rng,
        }
    }

    pub fn snapshot(&self) -> &SystemSnapshot {
        &self.snapshot
    }

    /// Track the size of the loaded catalog; everything counts as up
    pub fn set_total_services(&mut self, total: u32) {
        self.snapshot.total_services = total;
        self.snapshot.active_services = total;
    }

    /// Advance one tick and return the new snapshot
    pub fn step(&mut self) -> &SystemSnapshot {
        let s = &mut self.snapshot;

        s.cpu = (s.cpu + variation(&mut self.rng, 3.0)).clamp(0.0, 100.0);
        s.ram = round_tenth(s.ram + variation(&mut self.rng, 0.5)).clamp(2.0, 16.0);
        s.disk = (s.disk + variation(&mut self.rng, 1.0)).clamp(30.0, 95.0);
        s.temperature = (s.temperature + variation(&mut self.rng, 2.0)).clamp(30.0, 75.0);
        s.network = round_tenth(s.network + variation(&mut self.rng, 2.0)).clamp(0.1, 100.0);

        if self.rng.gen_bool(0.1) {
            let diff: i64 = if self.rng.gen_bool(0.7) {
                0
            } else if self.rng.gen_bool(0.5) {
                -1
            } else {
                1
            };
            let floor = i64::from(s.total_services.saturating_sub(5));
            let active = (i64::from(s.active_services) + diff)
                .clamp(floor, i64::from(s.total_services));
            s.active_services = u32::try_from(active).unwrap_or(s.total_services);
        }

        &self.snapshot
    }
}

/// Uniform in `[-range, range]`
fn variation<R: Rng>(rng: &mut R, range: f64) -> f64 {
    rng.gen_range(-range..=range)
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
