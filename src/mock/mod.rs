//! In-memory adapters for tests and `--simulate` runs
//!
//! None of these touch hardware or the network. The actuator records every
//! command it receives and tracks how many `set` calls are in flight, which
//! lets tests assert that the command gate never lets two overlap.

use crate::climate::lock::Clock;
use crate::error::{ClimateError, Result};
use crate::hardware::{Actuator, SensorReading, SensorSource, WeatherReading, WeatherSource};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = to;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        let start = Utc
            .with_ymd_and_hms(2024, 1, 15, 12, 0, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        Self::new(start)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Scripted reading: a value or a simulated failure
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sample {
    Value { temperature: f64, humidity: f64 },
    Failure,
}

#[derive(Debug)]
struct SampleScript {
    queued: VecDeque<Sample>,
    steady: Sample,
}

impl SampleScript {
    fn new(steady: Sample) -> Self {
        Self {
            queued: VecDeque::new(),
            steady,
        }
    }

    /// Next queued sample, falling back to the steady one
    fn next(&mut self) -> Sample {
        self.queued.pop_front().unwrap_or(self.steady)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Indoor sensor returning scripted samples
#[derive(Debug, Clone)]
pub struct MockSensor {
    script: Arc<Mutex<SampleScript>>,
    reads: Arc<AtomicUsize>,
}

impl MockSensor {
    pub fn new(temperature: f64, humidity: f64) -> Self {
        Self {
            script: Arc::new(Mutex::new(SampleScript::new(Sample::Value {
                temperature,
                humidity,
            }))),
            reads: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Change the value returned once the queue is empty
    pub fn set(&self, temperature: f64, humidity: f64) {
        lock(&self.script).steady = Sample::Value {
            temperature,
            humidity,
        };
    }

    /// Make every read fail until [`MockSensor::set`] is called
    pub fn set_failing(&self) {
        lock(&self.script).steady = Sample::Failure;
    }

    /// Queue one sample ahead of the steady value
    pub fn push(&self, sample: Sample) {
        lock(&self.script).queued.push_back(sample);
    }

    pub fn fail_next(&self) {
        self.push(Sample::Failure);
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SensorSource for MockSensor {
    async fn read(&self) -> Result<SensorReading> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let sample = lock(&self.script).next();
        match sample {
            Sample::Value {
                temperature,
                humidity,
            } => Ok(SensorReading {
                temperature,
                humidity,
                taken_at: Utc::now(),
            }),
            Sample::Failure => Err(ClimateError::sensor("simulated sensor failure")),
        }
    }
}

/// Weather source returning scripted samples for any location
#[derive(Debug, Clone)]
pub struct MockWeather {
    script: Arc<Mutex<SampleScript>>,
    locations: Arc<Mutex<Vec<String>>>,
}

impl MockWeather {
    pub fn new(temperature: f64, humidity: f64) -> Self {
        Self {
            script: Arc::new(Mutex::new(SampleScript::new(Sample::Value {
                temperature,
                humidity,
            }))),
            locations: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn set(&self, temperature: f64, humidity: f64) {
        lock(&self.script).steady = Sample::Value {
            temperature,
            humidity,
        };
    }

    pub fn set_failing(&self) {
        lock(&self.script).steady = Sample::Failure;
    }

    pub fn fail_next(&self) {
        lock(&self.script).queued.push_back(Sample::Failure);
    }

    /// Location codes requested so far
    pub fn requested_locations(&self) -> Vec<String> {
        lock(&self.locations).clone()
    }
}

#[async_trait]
impl WeatherSource for MockWeather {
    async fn read(&self, location_code: &str) -> Result<WeatherReading> {
        lock(&self.locations).push(location_code.to_string());
        let sample = lock(&self.script).next();
        match sample {
            Sample::Value {
                temperature,
                humidity,
            } => Ok(WeatherReading {
                temperature,
                humidity,
                taken_at: Utc::now(),
            }),
            Sample::Failure => Err(ClimateError::weather("simulated weather outage")),
        }
    }
}

#[derive(Debug, Default)]
struct ActuatorInner {
    line: AtomicBool,
    commands: Mutex<Vec<bool>>,
    fail_next: AtomicBool,
    closed: AtomicBool,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    hold: AtomicBool,
    entered: Notify,
    release: Notify,
    set_delay: Mutex<Option<std::time::Duration>>,
}

/// Relay that records commands instead of driving a GPIO line
///
/// Clones share state, so a test can keep one handle while the gate owns
/// another.
#[derive(Debug, Clone, Default)]
pub struct MockActuator {
    inner: Arc<ActuatorInner>,
}

impl MockActuator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Physical line level
    pub fn line(&self) -> bool {
        self.inner.line.load(Ordering::SeqCst)
    }

    /// Every successfully applied command, in order
    pub fn commands(&self) -> Vec<bool> {
        lock(&self.inner.commands).clone()
    }

    /// Fail the next `set` call
    pub fn fail_next(&self) {
        self.inner.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Highest number of `set` calls that ever ran at the same time
    pub fn max_concurrent_sets(&self) -> usize {
        self.inner.max_in_flight.load(Ordering::SeqCst)
    }

    /// Make each `set` take at least `delay`, widening race windows
    pub fn set_delay(&self, delay: std::time::Duration) {
        *lock(&self.inner.set_delay) = Some(delay);
    }

    /// Park the next `set` call until [`MockActuator::release`]
    pub fn hold_next(&self) {
        self.inner.hold.store(true, Ordering::SeqCst);
    }

    /// Wait until a held `set` call has started
    pub async fn wait_until_held(&self) {
        self.inner.entered.notified().await;
    }

    pub fn release(&self) {
        self.inner.release.notify_one();
    }
}

#[async_trait]
impl Actuator for MockActuator {
    async fn set(&mut self, active: bool) -> Result<()> {
        let inner = &self.inner;
        let running = inner.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        inner.max_in_flight.fetch_max(running, Ordering::SeqCst);

        if inner.hold.swap(false, Ordering::SeqCst) {
            inner.entered.notify_one();
            inner.release.notified().await;
        }

        let delay = *lock(&inner.set_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let result = if inner.closed.load(Ordering::SeqCst) {
            Err(ClimateError::actuator("relay line is closed"))
        } else if inner.fail_next.swap(false, Ordering::SeqCst) {
            Err(ClimateError::actuator("simulated line write failure"))
        } else {
            inner.line.store(active, Ordering::SeqCst);
            lock(&inner.commands).push(active);
            Ok(())
        };

        inner.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn close(&mut self) -> Result<()> {
        self.inner.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
